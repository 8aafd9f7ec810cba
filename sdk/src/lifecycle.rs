//! Subscription lifecycle assessment
//!
//! Pure functions from subscription terms and a clock reading to a
//! status. The indexer ships its own snapshot of these fields but that
//! snapshot ages the moment it is served, so callers recompute locally
//! and only trust what the chain data implies.
//!
//! A subscription moves through at most three phases per billing period:
//! paid (nothing due yet), overdue (a payment is due and the merchant's
//! collection window is open), and expired (the window lapsed without a
//! payment). Termination is orthogonal: a terminated subscription keeps
//! its already-paid time but can never become due again.

use chrono::Utc;

use crate::types::{Subscription, SubscriptionStatus};

/// What a UI should offer the user next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextAction {
    /// A payment is due; paying within the window keeps the subscription
    Pay,
    /// Nothing to do until the next payment comes due
    Wait,
    /// The subscription is finished, no action can revive it
    Closed,
}

/// Everything the lifecycle engine can say about a subscription at one
/// instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleAssessment {
    /// Status under the precedence Expired, Terminated, PendingPayment,
    /// Active
    pub status: SubscriptionStatus,
    /// Unix second the next payment comes due
    pub next_payment_due: i64,
    /// Unix second the collection window closes
    pub must_pay_by: i64,
    /// Whether the service is currently usable
    pub is_active: bool,
    /// Last unix second the service is usable, absent once expired
    pub active_until: Option<i64>,
    /// What a UI should offer the user next
    pub next_action: NextAction,
    /// Whether termination is still meaningful
    pub can_terminate: bool,
}

/// Clamp a seconds count into the i64 timestamp domain
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
const fn secs_to_i64(secs: u64) -> i64 {
    if secs > i64::MAX as u64 {
        i64::MAX
    } else {
        secs as i64
    }
}

/// Unix second the next payment comes due
///
/// The due date after `n` payments is `start + period * (n + 1)`. A free
/// trial substitutes the first period, so with zero payments made the
/// first due date is `start + free_trial_secs`.
///
/// Saturates instead of overflowing for absurd inputs.
#[must_use]
pub fn next_payment_due(
    start_ts: i64,
    period_secs: u64,
    free_trial_secs: u64,
    payments_made: u32,
) -> i64 {
    if payments_made == 0 && free_trial_secs > 0 {
        return start_ts.saturating_add(secs_to_i64(free_trial_secs));
    }
    let periods_covered = u64::from(payments_made).saturating_add(1);
    let offset = period_secs.saturating_mul(periods_covered);
    start_ts.saturating_add(secs_to_i64(offset))
}

/// Unix second the merchant's collection window closes
///
/// The window runs from the due date; missing it expires the
/// subscription.
#[must_use]
pub fn must_pay_by(next_payment_due: i64, payment_period_secs: u64) -> i64 {
    next_payment_due.saturating_add(secs_to_i64(payment_period_secs))
}

/// Assess a subscription at a given unix second
///
/// # Examples
///
/// ```
/// use beaver_sdk::lifecycle::{assess, NextAction};
/// use beaver_sdk::types::SubscriptionStatus;
/// # use alloy_primitives::{Address, B256, U256};
/// # use beaver_sdk::types::{Product, Subscription};
/// # fn subscription() -> Subscription {
/// #     Subscription {
/// #         subscription_hash: B256::ZERO,
/// #         product: Product {
/// #             product_hash: B256::ZERO,
/// #             chain_id: 11_155_111,
/// #             merchant_address: Address::ZERO,
/// #             token_address: Address::ZERO,
/// #             token_symbol: "USDT".to_string(),
/// #             token_decimals: 6,
/// #             uint_amount: U256::from(10_000_000u64),
/// #             human_amount: 10.0,
/// #             period: 86_400,
/// #             free_trial_length: 0,
/// #             payment_period: 3_600,
/// #             metadata_cid: String::new(),
/// #             merchant_domain: String::new(),
/// #             product_name: String::new(),
/// #         },
/// #         user_address: Address::ZERO,
/// #         start_ts: 0,
/// #         payments_made: 0,
/// #         terminated: false,
/// #         metadata_cid: String::new(),
/// #         subscription_id: None,
/// #         user_id: None,
/// #         status: None,
/// #         is_active: None,
/// #         next_payment_at: None,
/// #     }
/// # }
/// let verdict = assess(&subscription(), 3_600);
/// assert_eq!(verdict.status, SubscriptionStatus::Active);
/// assert_eq!(verdict.next_action, NextAction::Wait);
/// ```
#[must_use]
pub fn assess(subscription: &Subscription, now: i64) -> LifecycleAssessment {
    let product = &subscription.product;
    let due = next_payment_due(
        subscription.start_ts,
        product.period,
        product.free_trial_length,
        subscription.payments_made,
    );
    let deadline = must_pay_by(due, product.payment_period);

    // Precedence matters: a lapsed window reads Expired even when the
    // subscription was also terminated.
    let status = if now > deadline {
        SubscriptionStatus::Expired
    } else if subscription.terminated {
        SubscriptionStatus::Terminated
    } else if now > due {
        SubscriptionStatus::PendingPayment
    } else {
        SubscriptionStatus::Active
    };

    // Usability outlives status: terminated and overdue subscriptions
    // keep their paid-for time until the relevant cutoff.
    let active_until = match status {
        SubscriptionStatus::Active | SubscriptionStatus::Terminated => Some(due),
        SubscriptionStatus::PendingPayment => Some(deadline),
        SubscriptionStatus::Expired => None,
    };
    let is_active = active_until.is_some_and(|cutoff| now <= cutoff);

    let next_action = match status {
        SubscriptionStatus::PendingPayment => NextAction::Pay,
        SubscriptionStatus::Active => NextAction::Wait,
        SubscriptionStatus::Expired | SubscriptionStatus::Terminated => {
            NextAction::Closed
        }
    };
    let can_terminate = matches!(
        status,
        SubscriptionStatus::Active | SubscriptionStatus::PendingPayment
    );

    LifecycleAssessment {
        status,
        next_payment_due: due,
        must_pay_by: deadline,
        is_active,
        active_until,
        next_action,
        can_terminate,
    }
}

/// Assess a subscription against the system clock
#[must_use]
pub fn assess_now(subscription: &Subscription) -> LifecycleAssessment {
    assess(subscription, Utc::now().timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Product;
    use alloy_primitives::{Address, B256, U256};

    fn subscription(
        period: u64,
        payment_period: u64,
        free_trial: u64,
        payments_made: u32,
        terminated: bool,
    ) -> Subscription {
        Subscription {
            subscription_hash: B256::ZERO,
            product: Product {
                product_hash: B256::ZERO,
                chain_id: 11_155_111,
                merchant_address: Address::ZERO,
                token_address: Address::ZERO,
                token_symbol: "USDT".to_string(),
                token_decimals: 6,
                uint_amount: U256::from(10_000_000u64),
                human_amount: 10.0,
                period,
                free_trial_length: free_trial,
                payment_period,
                metadata_cid: String::new(),
                merchant_domain: "merchant.example".to_string(),
                product_name: "Pro plan".to_string(),
            },
            user_address: Address::ZERO,
            start_ts: 0,
            payments_made,
            terminated,
            metadata_cid: String::new(),
            subscription_id: None,
            user_id: None,
            status: None,
            is_active: None,
            next_payment_at: None,
        }
    }

    #[test]
    fn test_active_before_first_due_date() {
        let sub = subscription(86_400, 3_600, 0, 0, false);
        let verdict = assess(&sub, 3_600);
        assert_eq!(verdict.status, SubscriptionStatus::Active);
        assert_eq!(verdict.next_payment_due, 86_400);
        assert_eq!(verdict.must_pay_by, 90_000);
        assert!(verdict.is_active);
        assert_eq!(verdict.active_until, Some(86_400));
        assert_eq!(verdict.next_action, NextAction::Wait);
        assert!(verdict.can_terminate);
    }

    #[test]
    fn test_pending_inside_collection_window() {
        let sub = subscription(86_400, 3_600, 0, 0, false);
        let verdict = assess(&sub, 86_401);
        assert_eq!(verdict.status, SubscriptionStatus::PendingPayment);
        assert!(verdict.is_active);
        assert_eq!(verdict.active_until, Some(90_000));
        assert_eq!(verdict.next_action, NextAction::Pay);
        assert!(verdict.can_terminate);
    }

    #[test]
    fn test_expired_after_window_lapses() {
        let sub = subscription(86_400, 3_600, 0, 0, false);
        let verdict = assess(&sub, 90_001);
        assert_eq!(verdict.status, SubscriptionStatus::Expired);
        assert!(!verdict.is_active);
        assert_eq!(verdict.active_until, None);
        assert_eq!(verdict.next_action, NextAction::Closed);
        assert!(!verdict.can_terminate);
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        let sub = subscription(86_400, 3_600, 0, 0, false);
        // Exactly at the due date the period is still paid for
        assert_eq!(assess(&sub, 86_400).status, SubscriptionStatus::Active);
        // Exactly at the deadline the window is still open
        assert_eq!(
            assess(&sub, 90_000).status,
            SubscriptionStatus::PendingPayment
        );
    }

    #[test]
    fn test_payments_push_the_due_date_forward() {
        let sub = subscription(86_400, 3_600, 0, 3, false);
        let verdict = assess(&sub, 100_000);
        // Three payments cover four periods from the start
        assert_eq!(verdict.next_payment_due, 345_600);
        assert_eq!(verdict.status, SubscriptionStatus::Active);
    }

    #[test]
    fn test_free_trial_substitutes_first_period() {
        let sub = subscription(86_400, 3_600, 604_800, 0, false);
        let verdict = assess(&sub, 600_000);
        assert_eq!(verdict.next_payment_due, 604_800);
        assert_eq!(verdict.status, SubscriptionStatus::Active);

        // Once a payment lands the ordinary schedule applies
        let paid = subscription(86_400, 3_600, 604_800, 1, false);
        assert_eq!(assess(&paid, 0).next_payment_due, 172_800);
    }

    #[test]
    fn test_terminated_keeps_paid_time() {
        let sub = subscription(86_400, 3_600, 0, 0, true);
        let verdict = assess(&sub, 50_000);
        assert_eq!(verdict.status, SubscriptionStatus::Terminated);
        assert!(verdict.is_active);
        assert_eq!(verdict.active_until, Some(86_400));
        assert_eq!(verdict.next_action, NextAction::Closed);
        assert!(!verdict.can_terminate);
    }

    #[test]
    fn test_terminated_loses_usability_past_due() {
        let sub = subscription(86_400, 3_600, 0, 0, true);
        let verdict = assess(&sub, 87_000);
        assert_eq!(verdict.status, SubscriptionStatus::Terminated);
        assert!(!verdict.is_active);
    }

    #[test]
    fn test_expired_wins_over_terminated() {
        let sub = subscription(86_400, 3_600, 0, 0, true);
        let verdict = assess(&sub, 90_001);
        assert_eq!(verdict.status, SubscriptionStatus::Expired);
        assert!(!verdict.is_active);
    }

    #[test]
    fn test_absurd_terms_saturate_instead_of_panicking() {
        let sub = subscription(u64::MAX, u64::MAX, 0, u32::MAX, false);
        let verdict = assess(&sub, i64::MAX);
        assert_eq!(verdict.next_payment_due, i64::MAX);
        assert_eq!(verdict.must_pay_by, i64::MAX);
        // now == deadline, so the window never reads as lapsed
        assert_ne!(verdict.status, SubscriptionStatus::Expired);
    }

    #[test]
    fn test_negative_start_is_fine() {
        let sub = subscription(86_400, 3_600, 0, 0, false);
        let shifted = Subscription {
            start_ts: -86_400,
            ..sub
        };
        let verdict = assess(&shifted, -1);
        assert_eq!(verdict.next_payment_due, 0);
        assert_eq!(verdict.status, SubscriptionStatus::Active);
    }
}
