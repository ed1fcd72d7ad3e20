//! PostgreSQL implementation of WebhookEventRepository.
//!
//! The `(provider, event_id)` primary key with `ON CONFLICT DO NOTHING`
//! resolves concurrent deliveries of one event to a single record.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::payment::ProviderKind;
use crate::ports::{SaveResult, WebhookEventRecord, WebhookEventRepository};

pub struct PostgresWebhookEventRepository {
    pool: PgPool,
}

impl PostgresWebhookEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProcessedWebhookRow {
    provider: String,
    event_id: String,
    event_type: String,
    processed_at: DateTime<Utc>,
    result: String,
    error_message: Option<String>,
    payload: serde_json::Value,
}

impl TryFrom<ProcessedWebhookRow> for WebhookEventRecord {
    type Error = DomainError;

    fn try_from(row: ProcessedWebhookRow) -> Result<Self, Self::Error> {
        Ok(WebhookEventRecord {
            provider: row.provider.parse::<ProviderKind>().map_err(storage_error)?,
            event_id: row.event_id,
            event_type: row.event_type,
            processed_at: row.processed_at,
            result: row.result.parse().map_err(storage_error)?,
            error_message: row.error_message,
            payload: row.payload,
        })
    }
}

fn storage_error(err: impl std::fmt::Display) -> DomainError {
    DomainError::new(ErrorCode::StorageError, err.to_string())
}

#[async_trait]
impl WebhookEventRepository for PostgresWebhookEventRepository {
    async fn find_by_event_id(
        &self,
        provider: ProviderKind,
        event_id: &str,
    ) -> Result<Option<WebhookEventRecord>, DomainError> {
        let row: Option<ProcessedWebhookRow> = sqlx::query_as(
            r#"
            SELECT provider, event_id, event_type, processed_at, result, error_message, payload
            FROM processed_webhooks
            WHERE provider = $1 AND event_id = $2
            "#,
        )
        .bind(provider.as_str())
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error(format!("Failed to find webhook event: {}", e)))?;

        row.map(WebhookEventRecord::try_from).transpose()
    }

    async fn save(&self, record: WebhookEventRecord) -> Result<SaveResult, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO processed_webhooks (
                provider, event_id, event_type, processed_at, result, error_message, payload
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (provider, event_id) DO NOTHING
            "#,
        )
        .bind(record.provider.as_str())
        .bind(&record.event_id)
        .bind(&record.event_type)
        .bind(record.processed_at)
        .bind(record.result.as_str())
        .bind(&record.error_message)
        .bind(&record.payload)
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error(format!("Failed to save webhook event: {}", e)))?;

        if result.rows_affected() == 0 {
            Ok(SaveResult::AlreadyExists)
        } else {
            Ok(SaveResult::Inserted)
        }
    }

    async fn delete_before(&self, timestamp: DateTime<Utc>) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM processed_webhooks WHERE processed_at < $1")
            .bind(timestamp)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error(format!("Failed to prune webhook events: {}", e)))?;

        Ok(result.rows_affected())
    }
}
