//! A profile's interactions with one content item

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::{ContentItemId, ContentItemParticipationId, ProfileId};
use crate::record::{Record, Row, TimestampSlots};
use crate::schema::{Column, EntityKind, TableSchema};

/// Per-profile interaction record for a content item.
///
/// `posted` takes the role of a creation column and `updated` is refreshed
/// on every write. The interaction columns (`liked`, `learned`, `hidden`,
/// `flagged`) are only ever set by the caller; persisting never touches them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItemParticipation {
    pub id: Option<ContentItemParticipationId>,
    pub item_id: ContentItemId,
    pub profile_id: ProfileId,
    pub profile_type: String,
    pub liked: Option<DateTime<Utc>>,
    pub learned: Option<DateTime<Utc>>,
    pub hidden: Option<DateTime<Utc>>,
    pub flagged: Option<DateTime<Utc>>,
    pub posted: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

static CONTENT_ITEM_PARTICIPATION_SCHEMA: TableSchema = TableSchema {
    kind: EntityKind::ContentItemParticipation,
    columns: &[
        Column::foreign_key("item_id", EntityKind::ContentItem),
        Column::foreign_key("profile_id", EntityKind::Profile),
        Column::text("profile_type").required().max_len(31),
        Column::timestamp("liked"),
        Column::timestamp("learned"),
        Column::timestamp("hidden"),
        Column::timestamp("flagged"),
        Column::timestamp("posted"),
        Column::timestamp("updated"),
    ],
};

impl ContentItemParticipation {
    pub fn new(item_id: ContentItemId, profile_id: ProfileId, profile_type: impl Into<String>) -> Self {
        Self {
            id: None,
            item_id,
            profile_id,
            profile_type: profile_type.into(),
            liked: None,
            learned: None,
            hidden: None,
            flagged: None,
            posted: None,
            updated: None,
        }
    }

    pub fn like(&mut self, at: DateTime<Utc>) {
        self.liked = Some(at);
    }

    pub fn unlike(&mut self) {
        self.liked = None;
    }

    pub fn learn(&mut self, at: DateTime<Utc>) {
        self.learned = Some(at);
    }

    pub fn hide(&mut self, at: DateTime<Utc>) {
        self.hidden = Some(at);
    }

    pub fn flag(&mut self, at: DateTime<Utc>) {
        self.flagged = Some(at);
    }

    pub fn is_liked(&self) -> bool {
        self.liked.is_some()
    }
}

impl Record for ContentItemParticipation {
    type Id = ContentItemParticipationId;

    fn schema() -> &'static TableSchema {
        &CONTENT_ITEM_PARTICIPATION_SCHEMA
    }

    fn id(&self) -> Option<ContentItemParticipationId> {
        self.id
    }

    fn set_id(&mut self, id: Option<ContentItemParticipationId>) {
        self.id = id;
    }

    fn timestamps(&mut self) -> TimestampSlots<'_> {
        TimestampSlots::created_updated(&mut self.posted, &mut self.updated)
    }

    fn to_row(&self) -> Row {
        Row::new()
            .with("item_id", self.item_id.as_i64())
            .with("profile_id", self.profile_id.as_i64())
            .with("profile_type", &self.profile_type)
            .with("liked", self.liked)
            .with("learned", self.learned)
            .with("hidden", self.hidden)
            .with("flagged", self.flagged)
            .with("posted", self.posted)
            .with("updated", self.updated)
    }

    fn from_row(id: ContentItemParticipationId, row: &Row) -> Result<Self, DomainError> {
        Ok(Self {
            id: Some(id),
            item_id: row.id("item_id")?,
            profile_id: row.id("profile_id")?,
            profile_type: row.text("profile_type")?,
            liked: row.timestamp("liked")?,
            learned: row.timestamp("learned")?,
            hidden: row.timestamp("hidden")?,
            flagged: row.timestamp("flagged")?,
            posted: row.timestamp("posted")?,
            updated: row.timestamp("updated")?,
        })
    }
}
