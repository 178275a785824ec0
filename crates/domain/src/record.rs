//! Row mapping and the timestamp lifecycle rule.
//!
//! Entities describe themselves through [`Record`]: a static table schema, a
//! row conversion in both directions, and the timestamp columns that the store
//! stamps on persistence. The stamping rule itself lives in
//! [`TimestampSlots::apply`] so that it is written exactly once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::EntityId;
use crate::schema::TableSchema;
use crate::value_objects::{IdSet, TagSet};

// =============================================================================
// Values and rows
// =============================================================================

/// A single column value as exchanged with the datastore driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Integer(i64),
    Text(String),
    Bool(bool),
    Timestamp(DateTime<Utc>),
    IntegerSet(Vec<i64>),
    TextSet(Vec<String>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::Text(_) => "text",
            Value::Bool(_) => "bool",
            Value::Timestamp(_) => "timestamp",
            Value::IntegerSet(_) => "integer set",
            Value::TextSet(_) => "text set",
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::Text(value.clone())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Timestamp(value)
    }
}

impl From<&IdSet> for Value {
    fn from(value: &IdSet) -> Self {
        Value::IntegerSet(value.to_vec())
    }
}

impl From<&TagSet> for Value {
    fn from(value: &TagSet) -> Self {
        Value::TextSet(value.to_vec())
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Column values of one entity, in schema order. The identity column is
/// carried separately.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(&'static str, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    /// Set a column, replacing any earlier value for it.
    pub fn set(&mut self, column: &'static str, value: impl Into<Value>) {
        let value = value.into();
        match self.columns.iter_mut().find(|(name, _)| *name == column) {
            Some(slot) => slot.1 = value,
            None => self.columns.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.columns.iter().map(|(name, value)| (*name, value))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    fn required(&self, column: &str) -> Result<&Value, DomainError> {
        match self.get(column) {
            Some(Value::Null) | None => Err(DomainError::parse(format!(
                "column {column} is missing"
            ))),
            Some(value) => Ok(value),
        }
    }

    fn mismatch(column: &str, expected: &str, found: &Value) -> DomainError {
        DomainError::parse(format!(
            "column {column}: expected {expected}, found {}",
            found.kind()
        ))
    }

    pub fn integer(&self, column: &str) -> Result<i64, DomainError> {
        match self.required(column)? {
            Value::Integer(v) => Ok(*v),
            other => Err(Self::mismatch(column, "integer", other)),
        }
    }

    pub fn opt_integer(&self, column: &str) -> Result<Option<i64>, DomainError> {
        match self.get(column) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.integer(column).map(Some),
        }
    }

    /// Required id column, converted to its typed id.
    pub fn id<I: EntityId>(&self, column: &str) -> Result<I, DomainError> {
        self.integer(column).map(I::from)
    }

    pub fn opt_id<I: EntityId>(&self, column: &str) -> Result<Option<I>, DomainError> {
        Ok(self.opt_integer(column)?.map(I::from))
    }

    /// Text column; a NULL reads back as the empty string.
    pub fn text(&self, column: &str) -> Result<String, DomainError> {
        match self.get(column) {
            None => Err(DomainError::parse(format!("column {column} is missing"))),
            Some(Value::Null) => Ok(String::new()),
            Some(Value::Text(v)) => Ok(v.clone()),
            Some(other) => Err(Self::mismatch(column, "text", other)),
        }
    }

    pub fn boolean(&self, column: &str) -> Result<bool, DomainError> {
        match self.required(column)? {
            Value::Bool(v) => Ok(*v),
            Value::Integer(v) => Ok(*v != 0),
            other => Err(Self::mismatch(column, "bool", other)),
        }
    }

    pub fn timestamp(&self, column: &str) -> Result<Option<DateTime<Utc>>, DomainError> {
        match self.get(column) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Timestamp(v)) => Ok(Some(*v)),
            Some(other) => Err(Self::mismatch(column, "timestamp", other)),
        }
    }

    pub fn id_set(&self, column: &str) -> Result<IdSet, DomainError> {
        match self.get(column) {
            None | Some(Value::Null) => Ok(IdSet::new()),
            Some(Value::IntegerSet(v)) => Ok(IdSet::from(v.clone())),
            Some(other) => Err(Self::mismatch(column, "integer set", other)),
        }
    }

    pub fn tag_set(&self, column: &str) -> Result<TagSet, DomainError> {
        match self.get(column) {
            None | Some(Value::Null) => Ok(TagSet::new()),
            Some(Value::TextSet(v)) => Ok(TagSet::from(v.clone())),
            Some(other) => Err(Self::mismatch(column, "text set", other)),
        }
    }
}

// =============================================================================
// Persistence state and timestamp stamping
// =============================================================================

/// Whether an entity has been written before.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistState {
    /// No identity assigned yet
    Unsaved,
    /// Identity assigned by an earlier successful persist
    Saved,
}

impl PersistState {
    pub fn of<I>(id: Option<I>) -> Self {
        if id.is_some() {
            PersistState::Saved
        } else {
            PersistState::Unsaved
        }
    }
}

type Slot<'a> = Option<&'a mut Option<DateTime<Utc>>>;

/// Mutable handles on the timestamp columns an entity wants stamped.
///
/// `on_create` is written only when the entity is [`PersistState::Unsaved`];
/// `on_write` is written on every persist, including the first.
#[derive(Debug)]
pub struct TimestampSlots<'a> {
    on_create: Slot<'a>,
    on_write: Slot<'a>,
}

/// Values of the slots before stamping, used to undo a failed persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StampSnapshot {
    on_create: Option<DateTime<Utc>>,
    on_write: Option<DateTime<Utc>>,
}

impl<'a> TimestampSlots<'a> {
    /// Entity carries no timestamp bookkeeping.
    pub fn none() -> Self {
        Self {
            on_create: None,
            on_write: None,
        }
    }

    /// Creation column plus a column refreshed on every write.
    pub fn created_updated(
        created: &'a mut Option<DateTime<Utc>>,
        updated: &'a mut Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            on_create: Some(created),
            on_write: Some(updated),
        }
    }

    /// Creation column only.
    pub fn created_only(created: &'a mut Option<DateTime<Utc>>) -> Self {
        Self {
            on_create: Some(created),
            on_write: None,
        }
    }

    pub fn snapshot(&self) -> StampSnapshot {
        StampSnapshot {
            on_create: self.on_create.as_deref().copied().flatten(),
            on_write: self.on_write.as_deref().copied().flatten(),
        }
    }

    pub fn restore(self, snapshot: StampSnapshot) {
        if let Some(slot) = self.on_create {
            *slot = snapshot.on_create;
        }
        if let Some(slot) = self.on_write {
            *slot = snapshot.on_write;
        }
    }

    /// Stamp `now` according to the lifecycle rule.
    ///
    /// The creation column is only touched for unsaved entities, so it is set
    /// exactly once; the write column is set on every call.
    pub fn apply(self, now: DateTime<Utc>, state: PersistState) {
        if state == PersistState::Unsaved {
            if let Some(slot) = self.on_create {
                *slot = Some(now);
            }
        }
        if let Some(slot) = self.on_write {
            *slot = Some(now);
        }
    }
}

// =============================================================================
// Record
// =============================================================================

/// An entity that can be persisted as one row.
pub trait Record: Sized + Send + Sync {
    type Id: EntityId;

    fn schema() -> &'static TableSchema;

    fn id(&self) -> Option<Self::Id>;

    fn set_id(&mut self, id: Option<Self::Id>);

    /// Timestamp columns governed by the lifecycle rule.
    fn timestamps(&mut self) -> TimestampSlots<'_>;

    /// Column values, excluding the identity column.
    fn to_row(&self) -> Row;

    fn from_row(id: Self::Id, row: &Row) -> Result<Self, DomainError>;

    /// Field constraints; defaults to the declared schema checks.
    fn validate(&self) -> Result<(), DomainError> {
        Self::schema().check(&self.to_row())
    }

    fn persist_state(&self) -> PersistState {
        PersistState::of(self.id())
    }
}
