//! Stripe adapter for the web provider's hosted checkout and billing portal.
//!
//! Webhook verification and parsing live in the domain; this module only
//! makes outbound API calls.

mod checkout_gateway;
mod mock_checkout_gateway;

pub use checkout_gateway::{StripeCheckoutGateway, StripeConfig};
pub use mock_checkout_gateway::{GatewayCall, MockCheckoutGateway};
