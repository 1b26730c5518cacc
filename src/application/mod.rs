//! Application layer - Commands, Queries, and Handlers.
//!
//! Handlers orchestrate the pure domain through ports. Writes go through
//! `ProcessWebhookHandler`; everything else is a read or a call-through.

pub mod handlers;

pub use handlers::*;
