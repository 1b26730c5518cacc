//! Entitlement Core server entry point.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use entitlement_core::adapters::http::{app_router, AppState};
use entitlement_core::adapters::{
    InMemoryEntitlementStore, InMemoryIdempotencyLedger, PostgresEntitlementStore,
    PostgresIdempotencyLedger, RedisIdempotencyLedger, StripeCheckoutGateway, StripeConfig,
    TracingOperatorAlerts,
};
use entitlement_core::application::{CheckoutUrls, PruneLedgerHandler};
use entitlement_core::config::AppConfig;
use entitlement_core::domain::webhook::{EventNormalizer, SignatureVerifier};
use entitlement_core::ports::{EntitlementStore, IdempotencyLedger};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config);

    let addr = config.server.socket_addr()?;
    let (store, ledger) = build_storage(&config).await?;

    let policy = config.teams.load_policy()?;
    tracing::info!(rules = policy.rule_count(), "team visibility policy loaded");

    let payment = &config.payment;
    let catalog = payment.price_catalog();

    let verifier = SignatureVerifier::new(
        payment.web_webhook_secret.clone(),
        payment.mobile_webhook_secret.clone(),
    )
    .with_tolerance(
        config.reconciliation.signature_tolerance_secs,
        config.reconciliation.future_skew_secs,
    );

    let mut stripe = StripeConfig::new(payment.web_api_key.clone());
    if let Some(base_url) = &payment.web_api_base_url {
        stripe = stripe.with_base_url(base_url.clone());
    }
    if payment.is_test_mode() {
        tracing::warn!("web provider is in test mode");
    }

    let state = AppState {
        store,
        ledger: ledger.clone(),
        alerts: Arc::new(TracingOperatorAlerts::new()),
        gateway: Arc::new(StripeCheckoutGateway::new(stripe)),
        verifier: Arc::new(verifier),
        normalizer: Arc::new(EventNormalizer::new(catalog.clone())),
        catalog: Arc::new(catalog),
        visibility: Arc::new(policy),
        retry_limits: config.reconciliation.retry_limits(),
        checkout_urls: CheckoutUrls {
            success_url: payment.checkout_success_url.clone(),
            cancel_url: payment.checkout_cancel_url.clone(),
        },
        portal_return_url: payment.portal_return_url.clone(),
    };

    spawn_ledger_pruning(
        PruneLedgerHandler::new(ledger, config.reconciliation.ledger_retention_days),
        Duration::from_secs(config.reconciliation.prune_interval_secs),
    );

    let router = app_router(state, config.server.request_timeout());

    tracing::info!(%addr, environment = ?config.server.environment, "starting server");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.server.json_logs() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_current_span(true)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .with_target(true)
            .init();
    }
}

/// Picks the store and ledger adapters from what is configured.
///
/// Redis, when configured, owns the ledger even if Postgres holds the store.
async fn build_storage(
    config: &AppConfig,
) -> Result<(Arc<dyn EntitlementStore>, Arc<dyn IdempotencyLedger>), BoxError> {
    let retention_days = config.reconciliation.ledger_retention_days;

    let (store, pg_ledger): (Arc<dyn EntitlementStore>, Option<Arc<dyn IdempotencyLedger>>) =
        match &config.database {
            Some(database) => {
                let pool = database.connect().await?;
                if database.run_migrations {
                    sqlx::migrate!("./migrations").run(&pool).await?;
                    tracing::info!("database migrations applied");
                }
                (
                    Arc::new(PostgresEntitlementStore::new(pool.clone())),
                    Some(Arc::new(PostgresIdempotencyLedger::new(pool))),
                )
            }
            None => {
                tracing::warn!("no database configured; entitlements are kept in memory");
                (Arc::new(InMemoryEntitlementStore::new()), None)
            }
        };

    let ledger: Arc<dyn IdempotencyLedger> = match (&config.redis, pg_ledger) {
        (Some(redis), _) => Arc::new(RedisIdempotencyLedger::connect(&redis.url, retention_days).await?),
        (None, Some(ledger)) => ledger,
        (None, None) => Arc::new(InMemoryIdempotencyLedger::new()),
    };

    Ok((store, ledger))
}

fn spawn_ledger_pruning(handler: PruneLedgerHandler, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            if let Err(err) = handler.handle().await {
                tracing::warn!(error = %err, "ledger pruning failed");
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
    tracing::info!("shutdown signal received");
}
