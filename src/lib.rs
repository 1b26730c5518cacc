//! Entitlement Core - subscription entitlement reconciliation
//!
//! Keeps a single per-user entitlement in step with two billing providers
//! (a web checkout provider and a mobile app-store aggregator) by verifying,
//! normalizing, deduplicating and reconciling their webhooks under optimistic
//! concurrency. Also answers plan-gated feature checks and team visibility
//! queries.
//!
//! # Layers
//!
//! - `domain` - Pure types and rules (reconciliation engine, normalizer, policy)
//! - `ports` - Async traits for storage, idempotency, alerts, checkout
//! - `adapters` - Postgres, Redis, in-memory, Stripe, and HTTP implementations
//! - `application` - Command and query handlers
//! - `config` - Environment-driven configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
