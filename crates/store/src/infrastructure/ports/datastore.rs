//! Datastore driver port.

use async_trait::async_trait;
use townsquare_domain::{Row, TableSchema, Value};

use super::error::StoreError;

/// Durable storage for entity rows, keyed by table schema and surrogate id.
///
/// Rows never carry the identity column; it is passed and returned
/// separately.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DatastorePort: Send + Sync {
    /// Create the table if it does not exist yet.
    async fn ensure_table(&self, schema: &'static TableSchema) -> Result<(), StoreError>;

    /// Insert a new row and return the identity the datastore assigned.
    async fn insert(&self, schema: &'static TableSchema, row: Row) -> Result<i64, StoreError>;

    /// Overwrite every column of an existing row.
    async fn update(
        &self,
        schema: &'static TableSchema,
        id: i64,
        row: Row,
    ) -> Result<(), StoreError>;

    async fn fetch(&self, schema: &'static TableSchema, id: i64)
        -> Result<Option<Row>, StoreError>;

    /// Returns whether a row was removed.
    async fn delete(&self, schema: &'static TableSchema, id: i64) -> Result<bool, StoreError>;

    /// Rows whose `column` equals `value`, ordered by identity.
    async fn select_where(
        &self,
        schema: &'static TableSchema,
        column: &'static str,
        value: Value,
    ) -> Result<Vec<(i64, Row)>, StoreError>;
}
