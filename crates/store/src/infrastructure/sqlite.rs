//! SQLite-backed datastore driver.
//!
//! Scalars are stored natively, timestamps as RFC 3339 text and set-valued
//! columns as JSON arrays in TEXT columns. Declared limits are mirrored as
//! `NOT NULL` and `CHECK` constraints so the database rejects bad rows even
//! when the store skips entity validation.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::error::ErrorKind;
use sqlx::query::Query;
use sqlx::sqlite::{
    Sqlite, SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::Row as _;
use townsquare_domain::{
    format_timestamp, parse_timestamp, Column, ColumnType, Row, TableNaming, TableSchema, Value,
    ID_COLUMN,
};

use crate::infrastructure::config::StoreConfig;
use crate::infrastructure::ports::{DatastorePort, StoreError};

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// SQLite implementation of [`DatastorePort`].
pub struct SqliteDatastore {
    pool: SqlitePool,
    naming: TableNaming,
}

impl SqliteDatastore {
    /// Open (creating if needed) the database named by the configuration.
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(&config.database_url)
            .map_err(|e| StoreError::persistence("connect", e))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::persistence("connect", e))?;

        Ok(Self::from_pool(pool, config.table_naming))
    }

    /// A private in-memory database on a single long-lived connection.
    pub async fn in_memory(naming: TableNaming) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| StoreError::persistence("connect", e))?
            .foreign_keys(true);

        // Every connection to :memory: is a separate database, so the pool
        // must never open a second one or recycle the first.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::persistence("connect", e))?;

        Ok(Self::from_pool(pool, naming))
    }

    pub fn from_pool(pool: SqlitePool, naming: TableNaming) -> Self {
        Self { pool, naming }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn naming(&self) -> TableNaming {
        self.naming
    }

    fn table(&self, schema: &TableSchema) -> &'static str {
        schema.table_name(self.naming)
    }

    fn select_list(schema: &TableSchema) -> String {
        std::iter::once(quote(ID_COLUMN))
            .chain(schema.columns.iter().map(|c| quote(c.name)))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Quote an identifier. Several column names (`type`, `key`, `groups`) are
/// SQL keywords.
fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn sql_type(ty: ColumnType) -> &'static str {
    match ty {
        ColumnType::Integer => "INTEGER",
        ColumnType::Bool => "BOOLEAN",
        ColumnType::Text | ColumnType::Timestamp | ColumnType::IntegerSet | ColumnType::TextSet => {
            "TEXT"
        }
    }
}

fn column_definition(column: &Column, naming: TableNaming) -> String {
    let name = quote(column.name);
    let mut def = format!("{name} {}", sql_type(column.ty));

    if column.required {
        def.push_str(" NOT NULL");
        if column.ty == ColumnType::Text {
            def.push_str(&format!(" CHECK (length(trim({name})) > 0)"));
        }
    }
    if let (ColumnType::Text, Some(max)) = (column.ty, column.max_len) {
        def.push_str(&format!(" CHECK (length({name}) <= {max})"));
    }
    if column.non_negative {
        def.push_str(&format!(" CHECK ({name} >= 0)"));
    }
    if let Some(target) = column.references {
        def.push_str(&format!(
            " REFERENCES {}({})",
            quote(target.table_name(naming)),
            quote(ID_COLUMN)
        ));
    }
    def
}

/// `CREATE TABLE` plus one index per foreign key column.
pub fn create_table_sql(schema: &TableSchema, naming: TableNaming) -> Vec<String> {
    let table = schema.table_name(naming);
    let definitions = std::iter::once(format!(
        "{} INTEGER PRIMARY KEY AUTOINCREMENT",
        quote(ID_COLUMN)
    ))
    .chain(schema.columns.iter().map(|c| column_definition(c, naming)))
    .collect::<Vec<_>>()
    .join(",\n    ");

    let mut statements = vec![format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        quote(table),
        definitions
    )];
    for column in schema.columns.iter().filter(|c| c.references.is_some()) {
        statements.push(format!(
            "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
            quote(&format!("idx_{table}_{}", column.name)),
            quote(table),
            quote(column.name)
        ));
    }
    statements
}

fn bind_value(query: SqliteQuery<'_>, value: Value) -> Result<SqliteQuery<'_>, StoreError> {
    Ok(match value {
        Value::Null => query.bind(None::<String>),
        Value::Integer(v) => query.bind(v),
        Value::Text(v) => query.bind(v),
        Value::Bool(v) => query.bind(v),
        Value::Timestamp(v) => query.bind(format_timestamp(v)),
        Value::IntegerSet(v) => {
            query.bind(serde_json::to_string(&v).map_err(StoreError::serialization)?)
        }
        Value::TextSet(v) => {
            query.bind(serde_json::to_string(&v).map_err(StoreError::serialization)?)
        }
    })
}

/// SQLite `CHECK` constraints cannot look inside JSON arrays, so text-set
/// element limits are enforced here before a row is written.
fn check_set_elements(table: &str, schema: &TableSchema, row: &Row) -> Result<(), StoreError> {
    for column in schema.columns {
        let (Some(max), Some(Value::TextSet(items))) = (column.max_len, row.get(column.name))
        else {
            continue;
        };
        if let Some(item) = items.iter().find(|item| item.chars().count() > max) {
            return Err(StoreError::validation(format!(
                "{table}: {} element {item:?} exceeds {max} characters",
                column.name
            )));
        }
    }
    Ok(())
}

/// Values for every declared column in schema order; absent columns are NULL.
fn ordered_values(schema: &TableSchema, row: &Row) -> Vec<Value> {
    schema
        .columns
        .iter()
        .map(|c| row.get(c.name).cloned().unwrap_or(Value::Null))
        .collect()
}

fn decode_error(column: &str, e: impl std::fmt::Display) -> StoreError {
    StoreError::serialization(format!("column {column}: {e}"))
}

fn decode_column(row: &SqliteRow, column: &Column) -> Result<Value, StoreError> {
    let name = column.name;
    let value = match column.ty {
        ColumnType::Integer => row
            .try_get::<Option<i64>, _>(name)
            .map_err(|e| decode_error(name, e))?
            .map(Value::Integer),
        ColumnType::Bool => row
            .try_get::<Option<bool>, _>(name)
            .map_err(|e| decode_error(name, e))?
            .map(Value::Bool),
        ColumnType::Text => row
            .try_get::<Option<String>, _>(name)
            .map_err(|e| decode_error(name, e))?
            .map(Value::Text),
        ColumnType::Timestamp => row
            .try_get::<Option<String>, _>(name)
            .map_err(|e| decode_error(name, e))?
            .map(|s| parse_timestamp(&s).map(Value::Timestamp))
            .transpose()?,
        ColumnType::IntegerSet => row
            .try_get::<Option<String>, _>(name)
            .map_err(|e| decode_error(name, e))?
            .map(|s| {
                serde_json::from_str::<Vec<i64>>(&s)
                    .map(Value::IntegerSet)
                    .map_err(|e| decode_error(name, e))
            })
            .transpose()?,
        ColumnType::TextSet => row
            .try_get::<Option<String>, _>(name)
            .map_err(|e| decode_error(name, e))?
            .map(|s| {
                serde_json::from_str::<Vec<String>>(&s)
                    .map(Value::TextSet)
                    .map_err(|e| decode_error(name, e))
            })
            .transpose()?,
    };
    Ok(value.unwrap_or(Value::Null))
}

fn decode_row(schema: &TableSchema, row: &SqliteRow) -> Result<(i64, Row), StoreError> {
    let id: i64 = row
        .try_get(ID_COLUMN)
        .map_err(|e| decode_error(ID_COLUMN, e))?;
    let mut out = Row::new();
    for column in schema.columns {
        out.set(column.name, decode_column(row, column)?);
    }
    Ok((id, out))
}

/// Classify a driver error into the store taxonomy.
fn map_sqlx_error(operation: &'static str, table: &str, err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        match db.kind() {
            ErrorKind::ForeignKeyViolation | ErrorKind::UniqueViolation => {
                return StoreError::constraint(format!("{table}: {}", db.message()));
            }
            ErrorKind::NotNullViolation | ErrorKind::CheckViolation => {
                return StoreError::validation(format!("{table}: {}", db.message()));
            }
            _ => {}
        }
    }
    StoreError::persistence(operation, err)
}

#[async_trait]
impl DatastorePort for SqliteDatastore {
    async fn ensure_table(&self, schema: &'static TableSchema) -> Result<(), StoreError> {
        let table = self.table(schema);
        for statement in create_table_sql(schema, self.naming) {
            sqlx::query(&statement)
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_table", table, e))?;
        }
        tracing::debug!(table, "Ensured table");
        Ok(())
    }

    async fn insert(&self, schema: &'static TableSchema, row: Row) -> Result<i64, StoreError> {
        let table = self.table(schema);
        let columns = schema
            .columns
            .iter()
            .map(|c| quote(c.name))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; schema.columns.len()].join(", ");
        check_set_elements(table, schema, &row)?;
        let sql = format!(
            "INSERT INTO {} ({columns}) VALUES ({placeholders})",
            quote(table)
        );

        let mut query = sqlx::query(&sql);
        for value in ordered_values(schema, &row) {
            query = bind_value(query, value)?;
        }

        let result = query
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert", table, e))?;
        let id = result.last_insert_rowid();

        tracing::debug!(table, id, "Inserted row");
        Ok(id)
    }

    async fn update(
        &self,
        schema: &'static TableSchema,
        id: i64,
        row: Row,
    ) -> Result<(), StoreError> {
        let table = self.table(schema);
        let assignments = schema
            .columns
            .iter()
            .map(|c| format!("{} = ?", quote(c.name)))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {assignments} WHERE {} = ?",
            quote(table),
            quote(ID_COLUMN)
        );
        check_set_elements(table, schema, &row)?;

        let mut query = sqlx::query(&sql);
        for value in ordered_values(schema, &row) {
            query = bind_value(query, value)?;
        }

        let result = query
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("update", table, e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(schema.kind.name(), id));
        }

        tracing::debug!(table, id, "Updated row");
        Ok(())
    }

    async fn fetch(
        &self,
        schema: &'static TableSchema,
        id: i64,
    ) -> Result<Option<Row>, StoreError> {
        let table = self.table(schema);
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?",
            Self::select_list(schema),
            quote(table),
            quote(ID_COLUMN)
        );

        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("fetch", table, e))?;

        match row {
            Some(row) => {
                let (_, row) = decode_row(schema, &row)?;
                Ok(Some(row))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, schema: &'static TableSchema, id: i64) -> Result<bool, StoreError> {
        let table = self.table(schema);
        let sql = format!("DELETE FROM {} WHERE {} = ?", quote(table), quote(ID_COLUMN));

        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete", table, e))?;

        let deleted = result.rows_affected() > 0;
        tracing::debug!(table, id, deleted, "Deleted row");
        Ok(deleted)
    }

    async fn select_where(
        &self,
        schema: &'static TableSchema,
        column: &'static str,
        value: Value,
    ) -> Result<Vec<(i64, Row)>, StoreError> {
        let table = self.table(schema);
        if column != ID_COLUMN && schema.column(column).is_none() {
            return Err(StoreError::validation(format!(
                "{table} has no column {column}"
            )));
        }

        let predicate = if value.is_null() {
            format!("{} IS NULL", quote(column))
        } else {
            format!("{} = ?", quote(column))
        };
        let sql = format!(
            "SELECT {} FROM {} WHERE {predicate} ORDER BY {}",
            Self::select_list(schema),
            quote(table),
            quote(ID_COLUMN)
        );

        let mut query = sqlx::query(&sql);
        if !value.is_null() {
            query = bind_value(query, value)?;
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("select_where", table, e))?;

        tracing::debug!(table, column, count = rows.len(), "Selected rows");
        rows.iter().map(|row| decode_row(schema, row)).collect()
    }
}
