//! Command implementations for the Beaver CLI
//!
//! This module contains the individual command implementations, each in
//! their own file for better organization and maintainability.

pub mod create_shortcut;
pub mod list_subs;
pub mod product_hash;
pub mod resolve;
pub mod show_sub;

// Re-export command execution functions for easy access
pub use create_shortcut::execute as execute_create_shortcut;
pub use list_subs::execute as execute_list_subs;
pub use product_hash::execute as execute_product_hash;
pub use resolve::execute as execute_resolve;
pub use show_sub::execute as execute_show_sub;
