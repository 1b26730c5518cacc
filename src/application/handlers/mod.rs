//! Command and query handlers, grouped by concern.

pub mod billing;
pub mod entitlement;
pub mod teams;

pub use billing::{
    BillingError, CheckoutUrls, CreateCheckoutCommand, CreateCheckoutHandler,
    CreatePortalCommand, CreatePortalHandler,
};
pub use entitlement::{
    CheckFeatureHandler, CheckFeatureQuery, EntitlementView, FeatureCheck,
    GetEntitlementHandler, GetEntitlementQuery, ProcessWebhookCommand, ProcessWebhookHandler,
    PruneLedgerHandler, RetryLimits, WebhookOutcome,
};
pub use teams::{
    CanViewHandler, CanViewQuery, CountVisibleHandler, CountVisibleQuery, VisibleCount,
};
