//! Reconciliation engine.
//!
//! Applies one normalized event to one entitlement record. Pure: the caller
//! owns reading and compare-and-swap writing of the record.

use super::{
    EntitlementEvent, EntitlementRecord, EventKind, Plan, ProviderSlot, ReconcileError,
    SubscriptionStatus,
};
use crate::domain::foundation::StateMachine;

/// Why an event was accepted without changing the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Older than the newest event already applied to the slot.
    Stale,
    /// Slot already ended; only a new checkout reopens it.
    SlotCanceled,
    /// Creation notice arrived for a slot the checkout has not seeded yet.
    NotSeeded,
}

/// Result of reconciling an event against a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// New record, version incremented.
    Applied(EntitlementRecord),
    /// No-op. Version unchanged.
    Skipped(SkipReason),
}

/// Applies `event` to `record`.
///
/// Events strictly older than the slot's newest applied event are stale.
/// An equal timestamp applies.
pub fn reconcile(
    record: &EntitlementRecord,
    event: &EntitlementEvent,
) -> Result<Reconciliation, ReconcileError> {
    let current = record.slot(event.provider);

    if let Some(last) = current.last_applied_occurred_at {
        if event.occurred_at.is_before(&last) {
            return Ok(Reconciliation::Skipped(SkipReason::Stale));
        }
    }

    let next = match event.kind {
        EventKind::CheckoutCompleted => checkout_completed(current, event)?,
        _ if current.status == SubscriptionStatus::Canceled => {
            return Ok(Reconciliation::Skipped(SkipReason::SlotCanceled));
        }
        EventKind::SubscriptionCreated if current.status == SubscriptionStatus::NoSubscription => {
            return Ok(Reconciliation::Skipped(SkipReason::NotSeeded));
        }
        EventKind::SubscriptionCreated | EventKind::SubscriptionUpdated => {
            subscription_updated(owned_slot(current, event)?, event)?
        }
        EventKind::SubscriptionCanceled => {
            let mut slot = owned_slot(current, event)?;
            slot.status = transition(slot.status, SubscriptionStatus::Canceled, event)?;
            slot.cancel_at_period_end = false;
            if let Some(end) = event.payload.current_period_end {
                slot.current_period_end = Some(end);
            }
            slot
        }
        EventKind::PaymentSucceeded => {
            let mut slot = owned_slot(current, event)?;
            slot.status = transition(slot.status, SubscriptionStatus::Active, event)?;
            slot.current_period_end = match (slot.current_period_end, event.payload.current_period_end) {
                (Some(existing), Some(incoming)) => Some(existing.max(incoming)),
                (existing, incoming) => incoming.or(existing),
            };
            if let Some(plan) = event.payload.plan {
                slot.plan = plan;
            }
            slot
        }
        EventKind::PaymentFailed => {
            let mut slot = owned_slot(current, event)?;
            if slot.status.is_live() {
                slot.status = transition(slot.status, SubscriptionStatus::PastDue, event)?;
            }
            slot
        }
    };

    check_invariants(&next)?;

    let mut updated = record.clone();
    *updated.slot_mut(event.provider) = ProviderSlot {
        last_applied_occurred_at: Some(event.occurred_at),
        ..next
    };
    updated.version += 1;
    Ok(Reconciliation::Applied(updated))
}

fn checkout_completed(
    current: &ProviderSlot,
    event: &EntitlementEvent,
) -> Result<ProviderSlot, ReconcileError> {
    let payload = &event.payload;

    if current.status.is_seeded() {
        // Replayed or late checkout for the subscription already running.
        if payload.external_subscription_id.is_some()
            && current.owns_subscription(payload.external_subscription_id.as_deref())
        {
            return subscription_updated(current.clone(), event);
        }
        return Err(ReconcileError::InvalidTransition {
            from: current.status,
            kind: event.kind,
        });
    }

    let plan = payload.plan.ok_or_else(|| {
        ReconcileError::InvariantViolation("checkout completed without a plan".to_string())
    })?;
    let status = match payload.status {
        Some(SubscriptionStatus::Trialing) => SubscriptionStatus::Trialing,
        _ => SubscriptionStatus::Active,
    };

    Ok(ProviderSlot {
        status: transition(SubscriptionStatus::NoSubscription, status, event)?,
        plan,
        current_period_end: payload.current_period_end,
        cancel_at_period_end: payload.cancel_at_period_end.unwrap_or(false),
        external_customer_id: payload
            .external_customer_id
            .clone()
            .or_else(|| current.external_customer_id.clone()),
        external_subscription_id: payload.external_subscription_id.clone(),
        last_applied_occurred_at: current.last_applied_occurred_at,
    })
}

fn subscription_updated(
    mut slot: ProviderSlot,
    event: &EntitlementEvent,
) -> Result<ProviderSlot, ReconcileError> {
    let payload = &event.payload;
    if let Some(status) = payload.status {
        slot.status = transition(slot.status, status, event)?;
    }
    if let Some(plan) = payload.plan {
        slot.plan = plan;
    }
    if let Some(end) = payload.current_period_end {
        slot.current_period_end = Some(end);
    }
    if let Some(cancel) = payload.cancel_at_period_end {
        slot.cancel_at_period_end = cancel;
    }
    if let Some(customer) = &payload.external_customer_id {
        slot.external_customer_id = Some(customer.clone());
    }
    Ok(slot)
}

/// Returns a copy of the slot if the event targets the subscription it holds.
fn owned_slot(
    current: &ProviderSlot,
    event: &EntitlementEvent,
) -> Result<ProviderSlot, ReconcileError> {
    let subscription_id = event.payload.external_subscription_id.as_deref();
    if current.status == SubscriptionStatus::NoSubscription
        || !current.owns_subscription(subscription_id)
    {
        return Err(ReconcileError::UnknownSubscription {
            provider: event.provider,
            subscription_id: subscription_id.unwrap_or("<none>").to_string(),
        });
    }
    Ok(current.clone())
}

fn transition(
    from: SubscriptionStatus,
    to: SubscriptionStatus,
    event: &EntitlementEvent,
) -> Result<SubscriptionStatus, ReconcileError> {
    from.transition_to(to)
        .map_err(|_| ReconcileError::InvalidTransition { from, kind: event.kind })
}

fn check_invariants(slot: &ProviderSlot) -> Result<(), ReconcileError> {
    if slot.status.is_live() && slot.plan == Plan::Free {
        return Err(ReconcileError::InvariantViolation(format!(
            "{} slot on the free plan",
            slot.status
        )));
    }
    Ok(())
}
