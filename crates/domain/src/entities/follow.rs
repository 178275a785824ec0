//! Generic follow relation between any two kinds of entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::ContentFollowId;
use crate::record::{Record, Row, TimestampSlots};
use crate::schema::{Column, EntityKind, TableSchema};

/// `follower` follows `target`. Both ends are identified by a raw id plus a
/// type tag, so neither id is a foreign key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentFollow {
    pub id: Option<ContentFollowId>,
    pub follower_id: i64,
    pub follower_type: String,
    pub target_id: i64,
    pub target_type: String,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

static CONTENT_FOLLOW_SCHEMA: TableSchema = TableSchema {
    kind: EntityKind::ContentFollow,
    columns: &[
        Column::integer("follower_id").required(),
        Column::text("follower_type").required().max_len(31),
        Column::integer("target_id").required(),
        Column::text("target_type").required().max_len(31),
        Column::timestamp("created"),
        Column::timestamp("updated"),
    ],
};

impl ContentFollow {
    pub fn new(
        follower_id: i64,
        follower_type: impl Into<String>,
        target_id: i64,
        target_type: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            follower_id,
            follower_type: follower_type.into(),
            target_id,
            target_type: target_type.into(),
            created: None,
            updated: None,
        }
    }

    pub fn targets(&self, target_id: i64, target_type: &str) -> bool {
        self.target_id == target_id && self.target_type == target_type
    }
}

impl Record for ContentFollow {
    type Id = ContentFollowId;

    fn schema() -> &'static TableSchema {
        &CONTENT_FOLLOW_SCHEMA
    }

    fn id(&self) -> Option<ContentFollowId> {
        self.id
    }

    fn set_id(&mut self, id: Option<ContentFollowId>) {
        self.id = id;
    }

    fn timestamps(&mut self) -> TimestampSlots<'_> {
        TimestampSlots::created_updated(&mut self.created, &mut self.updated)
    }

    fn to_row(&self) -> Row {
        Row::new()
            .with("follower_id", self.follower_id)
            .with("follower_type", &self.follower_type)
            .with("target_id", self.target_id)
            .with("target_type", &self.target_type)
            .with("created", self.created)
            .with("updated", self.updated)
    }

    fn from_row(id: ContentFollowId, row: &Row) -> Result<Self, DomainError> {
        Ok(Self {
            id: Some(id),
            follower_id: row.integer("follower_id")?,
            follower_type: row.text("follower_type")?,
            target_id: row.integer("target_id")?,
            target_type: row.text("target_type")?,
            created: row.timestamp("created")?,
            updated: row.timestamp("updated")?,
        })
    }
}
