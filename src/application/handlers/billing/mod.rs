//! Billing handlers.
//!
//! Call-through to the web provider's hosted checkout and billing portal.

mod create_checkout;
mod create_portal;
mod errors;

pub use create_checkout::{CheckoutUrls, CreateCheckoutCommand, CreateCheckoutHandler};
pub use create_portal::{CreatePortalCommand, CreatePortalHandler};
pub use errors::BillingError;
