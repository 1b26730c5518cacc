//! End-to-end webhook processing over the in-memory adapters.

use std::sync::Arc;

use futures::future::join_all;
use secrecy::SecretString;
use serde_json::json;

use entitlement_core::adapters::{
    InMemoryEntitlementStore, InMemoryIdempotencyLedger, RecordingOperatorAlerts,
};
use entitlement_core::application::{
    CheckFeatureHandler, CheckFeatureQuery, GetEntitlementHandler, GetEntitlementQuery,
    ProcessWebhookCommand, ProcessWebhookHandler, RetryLimits, WebhookOutcome,
};
use entitlement_core::domain::entitlement::{Feature, Plan, Provider, SubscriptionStatus};
use entitlement_core::domain::foundation::{Timestamp, UserId};
use entitlement_core::domain::webhook::{
    sign_header, EventNormalizer, PriceCatalog, SignatureVerifier, WebhookError,
};
use entitlement_core::ports::{EntitlementStore, OperatorAlert};

const WEB_SECRET: &str = "whsec_flow";
const MOBILE_SECRET: &str = "mobile_flow";

struct Service {
    handler: Arc<ProcessWebhookHandler>,
    store: Arc<InMemoryEntitlementStore>,
    ledger: Arc<InMemoryIdempotencyLedger>,
    alerts: Arc<RecordingOperatorAlerts>,
}

fn service() -> Service {
    let store = Arc::new(InMemoryEntitlementStore::new());
    let ledger = Arc::new(InMemoryIdempotencyLedger::new());
    let alerts = Arc::new(RecordingOperatorAlerts::new());
    let catalog = PriceCatalog::new()
        .with("price_pro", Plan::Pro)
        .with("price_max", Plan::Max)
        .with("app.max.monthly", Plan::Max);

    let handler = ProcessWebhookHandler::new(
        Arc::new(SignatureVerifier::new(
            SecretString::new(WEB_SECRET.to_string()),
            SecretString::new(MOBILE_SECRET.to_string()),
        )),
        Arc::new(EventNormalizer::new(catalog)),
        ledger.clone(),
        store.clone(),
        alerts.clone(),
    )
    .with_limits(RetryLimits {
        max_cas_attempts: 5,
        max_mapping_attempts: 2,
    });

    Service {
        handler: Arc::new(handler),
        store,
        ledger,
        alerts,
    }
}

fn signed(provider: Provider, payload: Vec<u8>) -> ProcessWebhookCommand {
    let secret = match provider {
        Provider::Web => WEB_SECRET,
        Provider::Mobile => MOBILE_SECRET,
    };
    let signature =
        sign_header(provider, secret, Timestamp::now().as_unix_secs(), &payload).unwrap();
    ProcessWebhookCommand {
        provider,
        payload,
        signature: Some(signature),
    }
}

fn web_checkout(event_id: &str, user: Option<&str>, created: i64) -> Vec<u8> {
    let mut object = json!({
        "id": "cs_1",
        "mode": "subscription",
        "customer": "cus_1",
        "subscription": "sub_1",
        "metadata": {"plan": "pro"}
    });
    if let Some(user) = user {
        object["client_reference_id"] = json!(user);
    }
    serde_json::to_vec(&json!({
        "id": event_id,
        "type": "checkout.session.completed",
        "created": created,
        "livemode": false,
        "data": {"object": object}
    }))
    .unwrap()
}

fn web_deleted(event_id: &str, created: i64) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "id": event_id,
        "type": "customer.subscription.deleted",
        "created": created,
        "livemode": false,
        "data": {"object": {
            "id": "sub_1",
            "status": "canceled",
            "metadata": {"user_id": "user-1"}
        }}
    }))
    .unwrap()
}

fn web_subscription(event_id: &str, event_type: &str, status: &str, created: i64) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "id": event_id,
        "type": event_type,
        "created": created,
        "livemode": false,
        "data": {"object": {
            "id": "sub_1",
            "customer": "cus_1",
            "status": status,
            "current_period_end": created + 14 * 86_400,
            "metadata": {"user_id": "user-1", "plan": "max"},
            "items": {"data": [{"price": {"id": "price_pro"}}]}
        }}
    }))
    .unwrap()
}

fn mobile(event_id: &str, event_type: &str, at_secs: i64, expires_secs: i64) -> Vec<u8> {
    serde_json::to_vec(&json!({"event": {
        "id": event_id,
        "type": event_type,
        "app_user_id": "user-1",
        "event_timestamp_ms": at_secs * 1000,
        "product_id": "app.max.monthly",
        "entitlement_ids": ["max"],
        "period_type": "NORMAL",
        "expiration_at_ms": expires_secs * 1000,
        "original_transaction_id": "txn_1"
    }}))
    .unwrap()
}

fn user() -> UserId {
    UserId::new("user-1").unwrap()
}

async fn effective_plan(service: &Service) -> (Plan, Option<Provider>) {
    let view = GetEntitlementHandler::new(service.store.clone())
        .handle(GetEntitlementQuery { user_id: user() })
        .await;
    (view.plan, view.source)
}

#[tokio::test]
async fn checkout_then_cancellation_returns_user_to_free() {
    let s = service();
    let now = Timestamp::now().as_unix_secs();

    let applied = s
        .handler
        .handle(signed(Provider::Web, web_checkout("evt_1", Some("user-1"), now - 60)))
        .await
        .unwrap();
    assert_eq!(applied, WebhookOutcome::Applied { version: 1 });
    assert_eq!(effective_plan(&s).await, (Plan::Pro, Some(Provider::Web)));

    let canceled = s
        .handler
        .handle(signed(Provider::Web, web_deleted("evt_2", now)))
        .await
        .unwrap();
    assert_eq!(canceled, WebhookOutcome::Applied { version: 2 });

    let record = s.store.get(&user()).await.unwrap();
    assert_eq!(record.web.status, SubscriptionStatus::Canceled);
    assert_eq!(effective_plan(&s).await.0, Plan::Free);
}

#[tokio::test]
async fn concurrent_duplicate_deliveries_apply_once() {
    let s = service();
    let body = web_checkout("evt_dup", Some("user-1"), Timestamp::now().as_unix_secs());

    let deliveries = (0..8).map(|_| {
        let handler = s.handler.clone();
        let cmd = signed(Provider::Web, body.clone());
        async move { handler.handle(cmd).await }
    });
    let outcomes: Vec<WebhookOutcome> = join_all(deliveries)
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();

    let applied = outcomes
        .iter()
        .filter(|o| matches!(o, WebhookOutcome::Applied { .. }))
        .count();
    assert_eq!(applied, 1);
    assert_eq!(outcomes.len() - applied, 7);
    assert!(outcomes
        .iter()
        .all(|o| matches!(o, WebhookOutcome::Applied { .. } | WebhookOutcome::Duplicate)));
    assert_eq!(s.store.get(&user()).await.unwrap().version, 1);
}

#[tokio::test]
async fn web_and_mobile_slots_merge_to_highest_plan() {
    let s = service();
    let now = Timestamp::now().as_unix_secs();

    s.handler
        .handle(signed(Provider::Web, web_checkout("evt_w1", Some("user-1"), now - 120)))
        .await
        .unwrap();
    let outcome = s
        .handler
        .handle(signed(Provider::Mobile, mobile("m_1", "INITIAL_PURCHASE", now - 60, now + 30 * 86_400)))
        .await
        .unwrap();
    assert_eq!(outcome, WebhookOutcome::Applied { version: 2 });
    assert_eq!(effective_plan(&s).await, (Plan::Max, Some(Provider::Mobile)));

    s.handler
        .handle(signed(Provider::Mobile, mobile("m_2", "EXPIRATION", now, now - 1)))
        .await
        .unwrap();
    assert_eq!(effective_plan(&s).await, (Plan::Pro, Some(Provider::Web)));

    let check = CheckFeatureHandler::new(GetEntitlementHandler::new(s.store.clone()))
        .handle(CheckFeatureQuery {
            user_id: user(),
            feature: Feature::UnlimitedPrompts,
        })
        .await;
    assert_eq!(check.plan, Plan::Pro);
    assert!(!check.degraded);
}

#[tokio::test]
async fn out_of_order_event_is_stale_and_leaves_record_unchanged() {
    let s = service();
    let now = Timestamp::now().as_unix_secs();

    s.handler
        .handle(signed(Provider::Web, web_checkout("evt_new", Some("user-1"), now)))
        .await
        .unwrap();
    let outcome = s
        .handler
        .handle(signed(Provider::Web, web_deleted("evt_old", now - 600)))
        .await
        .unwrap();

    assert_eq!(outcome, WebhookOutcome::Stale);
    let record = s.store.get(&user()).await.unwrap();
    assert_eq!(record.version, 1);
    assert_eq!(record.web.status, SubscriptionStatus::Active);
}

#[tokio::test]
async fn unmapped_event_is_retried_then_dead_lettered_once() {
    let s = service();
    let body = web_checkout("evt_orphan", None, Timestamp::now().as_unix_secs());

    let first = s.handler.handle(signed(Provider::Web, body.clone())).await;
    assert!(matches!(
        first,
        Err(WebhookError::MappingUnresolved { attempt: 1, .. })
    ));
    assert!(!s.ledger.is_claimed(Provider::Web, "evt_orphan").await);

    let second = s
        .handler
        .handle(signed(Provider::Web, body.clone()))
        .await
        .unwrap();
    assert!(matches!(second, WebhookOutcome::DeadLettered { .. }));

    let third = s.handler.handle(signed(Provider::Web, body)).await.unwrap();
    assert_eq!(third, WebhookOutcome::Duplicate);

    let alerts = s.alerts.raised().await;
    assert_eq!(alerts.len(), 1);
    assert!(matches!(
        &alerts[0],
        OperatorAlert::DeadLetter { attempts: 2, .. }
    ));
    assert_eq!(s.store.get(&user()).await.unwrap().version, 0);
}

#[tokio::test]
async fn storage_outage_releases_claim_for_redelivery() {
    let s = service();
    let body = web_checkout("evt_outage", Some("user-1"), Timestamp::now().as_unix_secs());

    s.store.set_unavailable(true);
    let err = s
        .handler
        .handle(signed(Provider::Web, body.clone()))
        .await
        .unwrap_err();
    assert!(err.is_retryable());
    assert!(!s.ledger.is_claimed(Provider::Web, "evt_outage").await);

    s.store.set_unavailable(false);
    let outcome = s.handler.handle(signed(Provider::Web, body)).await.unwrap();
    assert_eq!(outcome, WebhookOutcome::Applied { version: 1 });
}

#[tokio::test]
async fn trial_created_before_checkout_is_restored_by_next_update() {
    let s = service();
    let now = Timestamp::now().as_unix_secs();

    let early = s
        .handler
        .handle(signed(
            Provider::Web,
            web_subscription("evt_created", "customer.subscription.created", "trialing", now - 60),
        ))
        .await
        .unwrap();
    assert_eq!(early, WebhookOutcome::Ignored);

    s.handler
        .handle(signed(Provider::Web, web_checkout("evt_checkout", Some("user-1"), now - 30)))
        .await
        .unwrap();
    assert_eq!(
        s.store.get(&user()).await.unwrap().web.status,
        SubscriptionStatus::Active
    );

    s.handler
        .handle(signed(
            Provider::Web,
            web_subscription("evt_updated", "customer.subscription.updated", "trialing", now),
        ))
        .await
        .unwrap();
    let record = s.store.get(&user()).await.unwrap();
    assert_eq!(record.web.status, SubscriptionStatus::Trialing);
    assert_eq!(record.web.plan, Plan::Pro);
}
