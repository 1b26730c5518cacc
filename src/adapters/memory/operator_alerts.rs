//! Operator alert sink that keeps alerts in memory.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::ports::{OperatorAlert, OperatorAlerts};

/// Records raised alerts so tests can assert on them.
#[derive(Default)]
pub struct RecordingOperatorAlerts {
    alerts: Mutex<Vec<OperatorAlert>>,
}

impl RecordingOperatorAlerts {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn raised(&self) -> Vec<OperatorAlert> {
        self.alerts.lock().await.clone()
    }
}

#[async_trait]
impl OperatorAlerts for RecordingOperatorAlerts {
    async fn raise(&self, alert: OperatorAlert) {
        self.alerts.lock().await.push(alert);
    }
}
