//! ProcessWebhookHandler - Command handler for provider webhook deliveries.
//!
//! Verify, normalize, claim, then reconcile with optimistic retry. The
//! returned outcome or error decides the HTTP status the provider sees.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::domain::entitlement::{
    reconcile, EntitlementEvent, Provider, ReconcileError, Reconciliation, SkipReason,
};
use crate::domain::webhook::{EventNormalizer, NormalizationError, SignatureVerifier, WebhookError};
use crate::ports::{
    EntitlementStore, IdempotencyLedger, OperatorAlert, OperatorAlerts, StoreError,
};

/// Command carrying one raw delivery.
#[derive(Debug, Clone)]
pub struct ProcessWebhookCommand {
    pub provider: Provider,
    /// Body exactly as received; the signature covers these bytes.
    pub payload: Vec<u8>,
    pub signature: Option<String>,
}

/// Acknowledged result of a delivery. Every variant answers 200.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WebhookOutcome {
    Applied { version: u64 },
    /// Older than what the slot already reflects.
    Stale,
    /// Event id already claimed.
    Duplicate,
    /// Outside the handled event set, or a no-op for the slot's state.
    Ignored,
    /// Refused by reconciliation and handed to an operator.
    Rejected,
    /// Retries exhausted without a user mapping.
    DeadLettered { dead_letter_id: Uuid },
}

/// Retry bounds for the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryLimits {
    /// Optimistic write attempts before answering 500.
    pub max_cas_attempts: u32,
    /// Deliveries without a user mapping before the event is dead-lettered.
    pub max_mapping_attempts: u32,
}

impl Default for RetryLimits {
    fn default() -> Self {
        Self {
            max_cas_attempts: 5,
            max_mapping_attempts: 5,
        }
    }
}

pub struct ProcessWebhookHandler {
    verifier: Arc<SignatureVerifier>,
    normalizer: Arc<EventNormalizer>,
    ledger: Arc<dyn IdempotencyLedger>,
    store: Arc<dyn EntitlementStore>,
    alerts: Arc<dyn OperatorAlerts>,
    limits: RetryLimits,
}

impl ProcessWebhookHandler {
    pub fn new(
        verifier: Arc<SignatureVerifier>,
        normalizer: Arc<EventNormalizer>,
        ledger: Arc<dyn IdempotencyLedger>,
        store: Arc<dyn EntitlementStore>,
        alerts: Arc<dyn OperatorAlerts>,
    ) -> Self {
        Self {
            verifier,
            normalizer,
            ledger,
            store,
            alerts,
            limits: RetryLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: RetryLimits) -> Self {
        self.limits = limits;
        self
    }

    #[tracing::instrument(skip(self, cmd), fields(provider = %cmd.provider))]
    pub async fn handle(&self, cmd: ProcessWebhookCommand) -> Result<WebhookOutcome, WebhookError> {
        let provider = cmd.provider;

        // 1. Authenticity
        if let Err(err) = self
            .verifier
            .verify(provider, &cmd.payload, cmd.signature.as_deref())
        {
            tracing::warn!(error = %err, "webhook signature rejected");
            return Err(err.into());
        }

        // 2. Canonical event
        let event = match self.normalizer.normalize(provider, &cmd.payload) {
            Ok(event) => event,
            Err(NormalizationError::UnrecognizedEventKind(kind)) => {
                tracing::info!(event_type = %kind, "webhook event ignored");
                return Ok(WebhookOutcome::Ignored);
            }
            Err(NormalizationError::MalformedPayload(reason)) => {
                tracing::warn!(reason = %reason, "malformed webhook payload");
                return Err(WebhookError::MalformedPayload(reason));
            }
            Err(NormalizationError::MissingUserMapping { event_id }) => {
                return self.missing_user_mapping(provider, event_id).await;
            }
        };

        tracing::debug!(
            event_id = %event.event_id,
            user_id = %event.user_id,
            kind = %event.kind,
            "webhook event normalized"
        );

        // 3. At-most-once claim
        if !self.ledger.try_acquire(provider, &event.event_id).await? {
            tracing::info!(event_id = %event.event_id, "duplicate webhook event");
            return Ok(WebhookOutcome::Duplicate);
        }

        // 4. Reconcile; transient failures give the claim back
        match self.apply(&event).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                if let Err(release_err) = self.ledger.release(provider, &event.event_id).await {
                    tracing::error!(
                        event_id = %event.event_id,
                        error = %release_err,
                        "failed to release idempotency claim"
                    );
                }
                Err(err)
            }
        }
    }

    async fn apply(&self, event: &EntitlementEvent) -> Result<WebhookOutcome, WebhookError> {
        for attempt in 1..=self.limits.max_cas_attempts {
            let record = self.store.get(&event.user_id).await.map_err(storage)?;

            let next = match reconcile(&record, event) {
                Ok(Reconciliation::Applied(next)) => next,
                Ok(Reconciliation::Skipped(reason)) => return Ok(self.skipped(event, reason)),
                Err(err) => return Ok(self.reject(event, err).await),
            };

            match self
                .store
                .compare_and_swap(&event.user_id, record.version, &next)
                .await
            {
                Ok(()) => {
                    tracing::info!(
                        event_id = %event.event_id,
                        user_id = %event.user_id,
                        kind = %event.kind,
                        version = next.version,
                        "entitlement event applied"
                    );
                    return Ok(WebhookOutcome::Applied {
                        version: next.version,
                    });
                }
                Err(StoreError::VersionConflict { expected, actual }) => {
                    tracing::debug!(
                        event_id = %event.event_id,
                        attempt,
                        expected,
                        actual,
                        "version conflict, retrying"
                    );
                }
                Err(err) => return Err(storage(err)),
            }
        }

        tracing::warn!(
            event_id = %event.event_id,
            user_id = %event.user_id,
            attempts = self.limits.max_cas_attempts,
            "reconciliation kept conflicting"
        );
        Err(WebhookError::ReconciliationFailed {
            attempts: self.limits.max_cas_attempts,
        })
    }

    fn skipped(&self, event: &EntitlementEvent, reason: SkipReason) -> WebhookOutcome {
        if reason == SkipReason::NotSeeded {
            // Provider sent subscription state ahead of the checkout that seeds the slot;
            // the seeded slot reads as active until a later subscription update arrives.
            tracing::warn!(
                event_id = %event.event_id,
                user_id = %event.user_id,
                status = ?event.payload.status,
                "subscription event arrived before checkout; status deferred to next update"
            );
        }
        tracing::info!(
            event_id = %event.event_id,
            user_id = %event.user_id,
            kind = %event.kind,
            reason = ?reason,
            "entitlement event skipped"
        );
        match reason {
            SkipReason::Stale => WebhookOutcome::Stale,
            SkipReason::SlotCanceled | SkipReason::NotSeeded => WebhookOutcome::Ignored,
        }
    }

    async fn reject(&self, event: &EntitlementEvent, err: ReconcileError) -> WebhookOutcome {
        tracing::warn!(
            event_id = %event.event_id,
            user_id = %event.user_id,
            error = %err,
            "entitlement event rejected"
        );
        self.alerts
            .raise(OperatorAlert::RejectedEvent {
                provider: event.provider,
                event_id: event.event_id.clone(),
                user_id: event.user_id.to_string(),
                reason: err.to_string(),
            })
            .await;
        WebhookOutcome::Rejected
    }

    async fn missing_user_mapping(
        &self,
        provider: Provider,
        event_id: String,
    ) -> Result<WebhookOutcome, WebhookError> {
        let attempt = self.ledger.record_attempt(provider, &event_id).await?;
        if attempt < self.limits.max_mapping_attempts {
            tracing::warn!(event_id = %event_id, attempt, "webhook event has no user mapping yet");
            return Err(WebhookError::MappingUnresolved { event_id, attempt });
        }

        // Claim so concurrent final deliveries dead-letter once
        if !self.ledger.try_acquire(provider, &event_id).await? {
            return Ok(WebhookOutcome::Duplicate);
        }

        let dead_letter_id = Uuid::new_v4();
        tracing::error!(
            event_id = %event_id,
            %dead_letter_id,
            attempts = attempt,
            "webhook event dead-lettered"
        );
        self.alerts
            .raise(OperatorAlert::DeadLetter {
                dead_letter_id,
                provider,
                event_id,
                attempts: attempt,
                reason: "no user mapping".to_string(),
            })
            .await;

        Ok(WebhookOutcome::DeadLettered { dead_letter_id })
    }
}

fn storage(err: StoreError) -> WebhookError {
    WebhookError::StorageUnavailable(err.to_string())
}
