//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, state machine)
//! - `entitlement` - Entitlement records and the reconciliation engine
//! - `webhook` - Signature verification and provider payload normalization
//! - `visibility` - Team visibility policy

pub mod entitlement;
pub mod foundation;
pub mod visibility;
pub mod webhook;
