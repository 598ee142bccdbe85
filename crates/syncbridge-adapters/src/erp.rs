//! ERP database adapter (spec §4.3): a read-only Postgres source of
//! employee/job records, reached through a bounded `sqlx::PgPool` with a
//! per-checkout statement timeout set via a session GUC.

use crate::adapter::{read_only_write_error, DeleteOutcome, EntityAdapter, ListedRecord, WriteOutcome};
use crate::kind::AdapterKind;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::time::Duration;
use syncbridge_core::{EntityType, Settings, SyncError};

/// Maps an [`EntityType`] to the table the ERP exposes it under. Only the
/// types actually sourced from the ERP per spec §1 ("employee/job
/// database") have a mapping; asking for any other type is a caller bug.
fn table_for(entity_type: EntityType) -> Option<&'static str> {
    match entity_type {
        EntityType::Employee => Some("employees"),
        EntityType::Job => Some("jobs"),
        EntityType::Department => Some("departments"),
        EntityType::Title => Some("titles"),
        _ => None,
    }
}

pub struct ErpAdapter {
    pool: PgPool,
    statement_timeout: Duration,
}

impl ErpAdapter {
    pub async fn connect(settings: &Settings) -> Result<Self, SyncError> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.erp_pool_size)
            .acquire_timeout(settings.erp_acquire_timeout)
            .test_before_acquire(true)
            .connect(settings.erp_database_dsn.expose())
            .await
            .map_err(|err| SyncError::DependencyUnavailable {
                service: "erp".into(),
                message: err.to_string(),
            })?;

        Ok(Self {
            pool,
            statement_timeout: settings.erp_statement_timeout,
        })
    }

    /// Applies the per-statement timeout as a session GUC on the checked-out
    /// connection, per SPEC_FULL §4.3's "statement timeout set via a
    /// session GUC on checkout".
    async fn checkout(&self) -> Result<sqlx::pool::PoolConnection<sqlx::Postgres>, SyncError> {
        let mut conn = self.pool.acquire().await.map_err(|err| SyncError::DependencyUnavailable {
            service: "erp".into(),
            message: err.to_string(),
        })?;
        let statement = format!("SET statement_timeout = {}", self.statement_timeout.as_millis());
        sqlx::query(&statement)
            .execute(&mut *conn)
            .await
            .map_err(|err| SyncError::DependencyUnavailable {
                service: "erp".into(),
                message: err.to_string(),
            })?;
        Ok(conn)
    }

    fn map_row_error(err: sqlx::Error) -> SyncError {
        SyncError::DependencyUnavailable {
            service: "erp".into(),
            message: err.to_string(),
        }
    }
}

#[async_trait]
impl EntityAdapter for ErpAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Erp
    }

    async fn list_all(&self, entity_type: EntityType) -> Result<Vec<ListedRecord>, SyncError> {
        let table = table_for(entity_type).ok_or_else(|| SyncError::DataMissing {
            message: format!("erp has no table for {entity_type}"),
        })?;

        let mut conn = self.checkout().await?;
        let query = format!("SELECT id, payload FROM {table} ORDER BY id ASC");
        let rows = sqlx::query(&query)
            .fetch_all(&mut *conn)
            .await
            .map_err(Self::map_row_error)?;

        rows.into_iter()
            .map(|row| {
                let id: String = row.try_get("id").map_err(Self::map_row_error)?;
                let payload: Value = row.try_get("payload").map_err(Self::map_row_error)?;
                Ok(ListedRecord { id, payload })
            })
            .collect()
    }

    async fn get_by_id(&self, entity_type: EntityType, id: &str) -> Result<Option<Value>, SyncError> {
        let table = table_for(entity_type).ok_or_else(|| SyncError::DataMissing {
            message: format!("erp has no table for {entity_type}"),
        })?;

        let mut conn = self.checkout().await?;
        let query = format!("SELECT payload FROM {table} WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(Self::map_row_error)?;

        row.map(|row| row.try_get::<Value, _>("payload").map_err(Self::map_row_error))
            .transpose()
    }

    async fn upsert(&self, _entity_type: EntityType, _id: &str, _payload: &Value, _idempotency_key: &str) -> Result<WriteOutcome, SyncError> {
        Err(read_only_write_error(AdapterKind::Erp))
    }

    async fn delete(&self, _entity_type: EntityType, _id: &str) -> Result<DeleteOutcome, SyncError> {
        Err(read_only_write_error(AdapterKind::Erp))
    }
}
