//! PostgreSQL implementation of IntentStore.
//!
//! The unique constraint on `idempotency_key` makes `insert_new` atomic
//! across processes. Status changes lock the row (`SELECT ... FOR UPDATE`)
//! so that concurrent writers to one intent are serialized.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::domain::foundation::{Currency, IdempotencyKey, IntentId, StateMachine, Timestamp};
use crate::domain::payment::{CheckoutDetails, IntentStatus, PaymentIntent, ProviderKind};
use crate::ports::{check_status_progression, InsertResult, IntentStore, IntentStoreError};

const KEY_CONSTRAINT: &str = "payment_intents_idempotency_key_key";

const SELECT_COLUMNS: &str = r#"
    SELECT id, idempotency_key, provider, method, country, amount_minor_units, currency,
           status, customer_email, metadata, external_id, checkout, failure_reason,
           created_at, updated_at
    FROM payment_intents
"#;

/// PostgreSQL implementation of the IntentStore port.
pub struct PostgresIntentStore {
    pool: PgPool,
}

impl PostgresIntentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn lock_status(
        tx: &mut Transaction<'_, Postgres>,
        id: &IntentId,
    ) -> Result<Option<IntentStatus>, IntentStoreError> {
        let status: Option<String> =
            sqlx::query_scalar("SELECT status FROM payment_intents WHERE id = $1 FOR UPDATE")
                .bind(id.as_uuid())
                .fetch_optional(&mut **tx)
                .await
                .map_err(|e| backend("lock intent", e))?;

        status
            .map(|s| s.parse::<IntentStatus>().map_err(IntentStoreError::Backend))
            .transpose()
    }
}

/// Database row representation of a payment intent.
#[derive(Debug, sqlx::FromRow)]
struct IntentRow {
    id: Uuid,
    idempotency_key: String,
    provider: String,
    method: Option<String>,
    country: Option<String>,
    amount_minor_units: i64,
    currency: String,
    status: String,
    customer_email: String,
    metadata: Json<BTreeMap<String, String>>,
    external_id: Option<String>,
    checkout: Json<CheckoutDetails>,
    failure_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<IntentRow> for PaymentIntent {
    type Error = IntentStoreError;

    fn try_from(row: IntentRow) -> Result<Self, Self::Error> {
        let invalid = |field: &str, err: String| {
            IntentStoreError::Backend(format!("invalid {} in stored intent: {}", field, err))
        };

        Ok(PaymentIntent {
            id: IntentId::from_uuid(row.id),
            idempotency_key: IdempotencyKey::new(row.idempotency_key)
                .map_err(|e| invalid("idempotency_key", e.to_string()))?,
            provider: row
                .provider
                .parse()
                .map_err(|e| invalid("provider", e))?,
            method: row
                .method
                .map(|m| m.parse())
                .transpose()
                .map_err(|e| invalid("method", e))?,
            country: row.country,
            amount_minor_units: row.amount_minor_units,
            currency: Currency::new(row.currency.trim())
                .map_err(|e| invalid("currency", e.to_string()))?,
            status: row.status.parse().map_err(|e| invalid("status", e))?,
            customer_email: row.customer_email,
            metadata: row.metadata.0,
            external_id: row.external_id,
            checkout: row.checkout.0,
            failure_reason: row.failure_reason,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn backend(action: &str, err: sqlx::Error) -> IntentStoreError {
    IntentStoreError::Backend(format!("failed to {}: {}", action, err))
}

fn is_key_conflict(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.constraint() == Some(KEY_CONSTRAINT))
}

#[async_trait]
impl IntentStore for PostgresIntentStore {
    async fn get_by_key(
        &self,
        key: &IdempotencyKey,
    ) -> Result<Option<PaymentIntent>, IntentStoreError> {
        let row: Option<IntentRow> =
            sqlx::query_as(&format!("{} WHERE idempotency_key = $1", SELECT_COLUMNS))
                .bind(key.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| backend("find intent by key", e))?;

        row.map(PaymentIntent::try_from).transpose()
    }

    async fn get_by_id(&self, id: &IntentId) -> Result<Option<PaymentIntent>, IntentStoreError> {
        let row: Option<IntentRow> = sqlx::query_as(&format!("{} WHERE id = $1", SELECT_COLUMNS))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| backend("find intent", e))?;

        row.map(PaymentIntent::try_from).transpose()
    }

    async fn get_by_external_id(
        &self,
        provider: ProviderKind,
        external_id: &str,
    ) -> Result<Option<PaymentIntent>, IntentStoreError> {
        let row: Option<IntentRow> = sqlx::query_as(&format!(
            "{} WHERE provider = $1 AND external_id = $2",
            SELECT_COLUMNS
        ))
        .bind(provider.as_str())
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| backend("find intent by external id", e))?;

        row.map(PaymentIntent::try_from).transpose()
    }

    async fn insert_new(&self, intent: &PaymentIntent) -> Result<InsertResult, IntentStoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO payment_intents (
                id, idempotency_key, provider, method, country, amount_minor_units, currency,
                status, customer_email, metadata, external_id, checkout, failure_reason,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            ON CONFLICT (idempotency_key) DO NOTHING
            "#,
        )
        .bind(intent.id.as_uuid())
        .bind(intent.idempotency_key.as_str())
        .bind(intent.provider.as_str())
        .bind(intent.method.map(|m| m.as_str()))
        .bind(&intent.country)
        .bind(intent.amount_minor_units)
        .bind(intent.currency.as_str())
        .bind(intent.status.as_str())
        .bind(&intent.customer_email)
        .bind(Json(&intent.metadata))
        .bind(&intent.external_id)
        .bind(Json(&intent.checkout))
        .bind(&intent.failure_reason)
        .bind(intent.created_at.as_datetime())
        .bind(intent.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| backend("insert intent", e))?;

        if result.rows_affected() == 1 {
            return Ok(InsertResult::Inserted);
        }

        match self.get_by_key(&intent.idempotency_key).await? {
            Some(existing) => Ok(InsertResult::AlreadyExists(existing)),
            None => Err(IntentStoreError::Backend(format!(
                "idempotency key '{}' conflicted but no intent holds it",
                intent.idempotency_key
            ))),
        }
    }

    async fn put(&self, intent: &PaymentIntent) -> Result<(), IntentStoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| backend("begin transaction", e))?;

        if let Some(current) = Self::lock_status(&mut tx, &intent.id).await? {
            check_status_progression(current, intent.status)?;
        }

        sqlx::query(
            r#"
            INSERT INTO payment_intents (
                id, idempotency_key, provider, method, country, amount_minor_units, currency,
                status, customer_email, metadata, external_id, checkout, failure_reason,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            ON CONFLICT (id) DO UPDATE SET
                status = EXCLUDED.status,
                external_id = EXCLUDED.external_id,
                checkout = EXCLUDED.checkout,
                failure_reason = EXCLUDED.failure_reason,
                metadata = EXCLUDED.metadata,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(intent.id.as_uuid())
        .bind(intent.idempotency_key.as_str())
        .bind(intent.provider.as_str())
        .bind(intent.method.map(|m| m.as_str()))
        .bind(&intent.country)
        .bind(intent.amount_minor_units)
        .bind(intent.currency.as_str())
        .bind(intent.status.as_str())
        .bind(&intent.customer_email)
        .bind(Json(&intent.metadata))
        .bind(&intent.external_id)
        .bind(Json(&intent.checkout))
        .bind(&intent.failure_reason)
        .bind(intent.created_at.as_datetime())
        .bind(intent.updated_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_key_conflict(&e) {
                IntentStoreError::KeyConflict(intent.idempotency_key.to_string())
            } else {
                backend("save intent", e)
            }
        })?;

        tx.commit()
            .await
            .map_err(|e| backend("commit intent", e))
    }

    async fn update_status(
        &self,
        id: &IntentId,
        status: IntentStatus,
    ) -> Result<PaymentIntent, IntentStoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| backend("begin transaction", e))?;

        let current = Self::lock_status(&mut tx, id)
            .await?
            .ok_or(IntentStoreError::NotFound(*id))?;
        current.transition_to(status)?;

        let row: IntentRow = sqlx::query_as(
            r#"
            UPDATE payment_intents SET status = $2, updated_at = $3
            WHERE id = $1
            RETURNING id, idempotency_key, provider, method, country, amount_minor_units,
                      currency, status, customer_email, metadata, external_id, checkout,
                      failure_reason, created_at, updated_at
            "#,
        )
        .bind(id.as_uuid())
        .bind(status.as_str())
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| backend("update intent status", e))?;

        tx.commit()
            .await
            .map_err(|e| backend("commit intent status", e))?;

        PaymentIntent::try_from(row)
    }
}
