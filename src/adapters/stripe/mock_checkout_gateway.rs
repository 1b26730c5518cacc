//! Mock checkout gateway for testing.
//!
//! Returns deterministic sessions, records every call and can be told to
//! fail the next request.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::ports::{CheckoutGateway, CheckoutRequest, CheckoutSession, GatewayError, PortalSession};

#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    Checkout(CheckoutRequest),
    Portal { customer_id: String, return_url: String },
}

#[derive(Default)]
struct MockState {
    calls: Vec<GatewayCall>,
    next_error: Option<GatewayError>,
}

#[derive(Default, Clone)]
pub struct MockCheckoutGateway {
    inner: Arc<Mutex<MockState>>,
}

impl MockCheckoutGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails the next call with `error`.
    pub fn fail_next(&self, error: GatewayError) {
        if let Ok(mut state) = self.inner.lock() {
            state.next_error = Some(error);
        }
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.inner
            .lock()
            .map(|state| state.calls.clone())
            .unwrap_or_default()
    }

    fn record(&self, call: GatewayCall) -> Result<(), GatewayError> {
        let mut state = self
            .inner
            .lock()
            .map_err(|_| GatewayError::provider("mock state poisoned"))?;
        state.calls.push(call);
        match state.next_error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CheckoutGateway for MockCheckoutGateway {
    async fn create_checkout_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession, GatewayError> {
        let id = format!("cs_mock_{}_{}", request.user_id, request.plan);
        self.record(GatewayCall::Checkout(request))?;
        Ok(CheckoutSession {
            url: format!("https://checkout.mock/{}", id),
            id,
        })
    }

    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<PortalSession, GatewayError> {
        self.record(GatewayCall::Portal {
            customer_id: customer_id.to_string(),
            return_url: return_url.to_string(),
        })?;
        Ok(PortalSession {
            url: format!("https://portal.mock/{}", customer_id),
        })
    }
}
