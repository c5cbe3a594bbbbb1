//! Shared types and domain rules for the Stockroom inventory backend
//!
//! This crate holds the models and the pure workflow rules (role checks,
//! status transitions, stock ledger arithmetic). It performs no I/O, so the
//! backend services can load rows, apply these rules, and persist the result
//! inside their own transactions.

pub mod error;
pub mod fulfillment;
pub mod models;
pub mod types;
pub mod validation;

pub use error::*;
pub use models::*;
pub use types::*;
pub use validation::*;
