//! Shared utilities for the Beaver CLI

pub mod formatting;
