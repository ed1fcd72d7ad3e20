//! Composition root.
//!
//! Turns an [`AppConfig`] into a ready [`AppState`]: provider adapters for
//! every configured provider, the webhook verifier, and the storage backing
//! (PostgreSQL when configured, process memory otherwise).

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use thiserror::Error;

use crate::adapters::http::AppState;
use crate::adapters::providers::{
    BankTransferAdapter, CardAdapter, CryptoAdapter, RegionalAdapter, WalletAdapter,
};
use crate::adapters::{
    ExchangeRateApiSource, InMemoryIntentStore, InMemoryWebhookEventRepository,
    LoggingFulfillment, PostgresIntentStore, PostgresWebhookEventRepository,
};
use crate::application::{CurrencyConverter, OrchestratorDeps, PaymentOrchestrator, ProviderRegistry};
use crate::config::{AppConfig, ConfigError, DatabaseConfig, PaymentConfig};
use crate::domain::payment::ProviderKind;
use crate::domain::webhook::{RecentEventCache, WebhookVerifier};
use crate::ports::{IntentStore, WebhookEventRepository};

/// Event ids remembered in memory for cheap duplicate rejection.
const RECENT_EVENT_CAPACITY: usize = 10_000;
const RECENT_EVENT_WINDOW: Duration = Duration::from_secs(600);

const DEFAULT_WEBHOOK_RETENTION_DAYS: u32 = 30;
const RETENTION_SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("HTTP client setup failed: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Database connection failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Storage ports behind one backing.
#[derive(Clone)]
pub struct Storage {
    pub intents: Arc<dyn IntentStore>,
    pub webhook_events: Arc<dyn WebhookEventRepository>,
}

impl Storage {
    pub fn in_memory() -> Self {
        Self {
            intents: Arc::new(InMemoryIntentStore::new()),
            webhook_events: Arc::new(InMemoryWebhookEventRepository::new()),
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            intents: Arc::new(PostgresIntentStore::new(pool.clone())),
            webhook_events: Arc::new(PostgresWebhookEventRepository::new(pool)),
        }
    }
}

/// Connects the pool and applies the embedded migrations if enabled.
pub async fn connect_database(config: &DatabaseConfig) -> Result<PgPool, StartupError> {
    let pool = PgPoolOptions::new()
        .min_connections(config.min_connections)
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout())
        .connect(&config.url)
        .await?;

    if config.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("database migrations applied");
    }
    Ok(pool)
}

/// Builds an adapter for every provider with a configuration section.
pub fn build_registry(config: &AppConfig) -> Result<ProviderRegistry, StartupError> {
    let payment = &config.payment;
    let public_base_url = config.server.public_base_url();
    let timeout = Duration::from_secs(config.server.request_timeout_secs);
    let mut registry = ProviderRegistry::new();

    if let Some(card) = &payment.card {
        registry.register(Arc::new(CardAdapter::new(card, timeout)?));
    }
    if let Some(wallet) = &payment.wallet {
        registry.register(Arc::new(WalletAdapter::new(wallet, public_base_url, timeout)?));
    }
    if let Some(crypto) = &payment.crypto {
        registry.register(Arc::new(CryptoAdapter::new(crypto, public_base_url, timeout)?));
    }
    if let Some(regional) = &payment.regional {
        registry.register(Arc::new(RegionalAdapter::new(regional, timeout)?));
    }
    if let Some(bank) = &payment.bank_transfer {
        registry.register(Arc::new(BankTransferAdapter::new(bank.clone())));
    }

    tracing::info!(providers = ?registry.kinds(), "payment providers registered");
    Ok(registry)
}

/// Registers the callback signing secret of every configured provider.
pub fn build_verifier(payment: &PaymentConfig) -> WebhookVerifier {
    ProviderKind::ALL.into_iter().fold(
        WebhookVerifier::new(RecentEventCache::new(
            RECENT_EVENT_CAPACITY,
            RECENT_EVENT_WINDOW,
        )),
        |verifier, kind| match payment.webhook_secret(kind) {
            Some(secret) => verifier.with_secret(kind, secret.clone()),
            None => verifier,
        },
    )
}

/// Wires configuration, storage and adapters into the HTTP state.
pub fn build_state(config: &AppConfig, storage: Storage) -> Result<AppState, StartupError> {
    let registry = Arc::new(build_registry(config)?);
    let orchestrator = PaymentOrchestrator::new(OrchestratorDeps {
        store: storage.intents,
        webhook_events: storage.webhook_events,
        registry,
        verifier: Arc::new(build_verifier(&config.payment)),
        fulfillment: Arc::new(LoggingFulfillment),
        intent_ttl_secs: config.payment.intent_ttl_secs,
    });

    let rates = ExchangeRateApiSource::from_config(&config.currency)?;
    let converter = CurrencyConverter::new(Arc::new(rates), config.currency.cache_ttl_secs);

    Ok(AppState {
        orchestrator: Arc::new(orchestrator),
        converter: Arc::new(converter),
    })
}

/// Periodically deletes processed-webhook records past retention.
pub fn spawn_webhook_retention(
    events: Arc<dyn WebhookEventRepository>,
    database: Option<&DatabaseConfig>,
) -> tokio::task::JoinHandle<()> {
    let retention_days = database
        .map(|d| d.webhook_retention_days)
        .unwrap_or(DEFAULT_WEBHOOK_RETENTION_DAYS);

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(RETENTION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let cutoff = chrono::Utc::now() - chrono::Duration::days(i64::from(retention_days));
            match events.delete_before(cutoff).await {
                Ok(0) => {}
                Ok(deleted) => tracing::info!(deleted, "pruned processed webhook records"),
                Err(e) => tracing::warn!(error = %e, "webhook retention sweep failed"),
            }
        }
    })
}
