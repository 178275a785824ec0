//! Topics and topic follows

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::{ContentTopicFollowId, ContentTopicId, ProfileId};
use crate::record::{Record, Row, TimestampSlots};
use crate::schema::{Column, EntityKind, TableSchema};
use crate::value_objects::PageAttributes;

/// A subject that content items can be tagged with and profiles can follow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentTopic {
    pub id: Option<ContentTopicId>,
    pub page: PageAttributes,
    pub follower_count: i64,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

static CONTENT_TOPIC_SCHEMA: TableSchema = TableSchema {
    kind: EntityKind::ContentTopic,
    columns: &[
        PageAttributes::COLUMNS[0],
        PageAttributes::COLUMNS[1],
        PageAttributes::COLUMNS[2],
        PageAttributes::COLUMNS[3],
        Column::integer("follower_count").required().non_negative(),
        Column::timestamp("created"),
        Column::timestamp("updated"),
    ],
};

impl ContentTopic {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: None,
            page: PageAttributes::new(title),
            follower_count: 0,
            created: None,
            updated: None,
        }
    }

    pub fn with_page(mut self, page: PageAttributes) -> Self {
        self.page = page;
        self
    }
}

impl Record for ContentTopic {
    type Id = ContentTopicId;

    fn schema() -> &'static TableSchema {
        &CONTENT_TOPIC_SCHEMA
    }

    fn id(&self) -> Option<ContentTopicId> {
        self.id
    }

    fn set_id(&mut self, id: Option<ContentTopicId>) {
        self.id = id;
    }

    fn timestamps(&mut self) -> TimestampSlots<'_> {
        TimestampSlots::created_updated(&mut self.created, &mut self.updated)
    }

    fn to_row(&self) -> Row {
        let mut row = Row::new();
        self.page.write_to(&mut row);
        row.with("follower_count", self.follower_count)
            .with("created", self.created)
            .with("updated", self.updated)
    }

    fn from_row(id: ContentTopicId, row: &Row) -> Result<Self, DomainError> {
        Ok(Self {
            id: Some(id),
            page: PageAttributes::read_from(row)?,
            follower_count: row.integer("follower_count")?,
            created: row.timestamp("created")?,
            updated: row.timestamp("updated")?,
        })
    }
}

/// A profile following a topic. Only the creation instant is tracked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentTopicFollow {
    pub id: Option<ContentTopicFollowId>,
    pub topic_id: ContentTopicId,
    pub profile_id: ProfileId,
    pub profile_type: String,
    pub created: Option<DateTime<Utc>>,
}

static CONTENT_TOPIC_FOLLOW_SCHEMA: TableSchema = TableSchema {
    kind: EntityKind::ContentTopicFollow,
    columns: &[
        Column::foreign_key("topic_id", EntityKind::ContentTopic),
        Column::foreign_key("profile_id", EntityKind::Profile),
        Column::text("profile_type").required().max_len(31),
        Column::timestamp("created"),
    ],
};

impl ContentTopicFollow {
    pub fn new(
        topic_id: ContentTopicId,
        profile_id: ProfileId,
        profile_type: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            topic_id,
            profile_id,
            profile_type: profile_type.into(),
            created: None,
        }
    }
}

impl Record for ContentTopicFollow {
    type Id = ContentTopicFollowId;

    fn schema() -> &'static TableSchema {
        &CONTENT_TOPIC_FOLLOW_SCHEMA
    }

    fn id(&self) -> Option<ContentTopicFollowId> {
        self.id
    }

    fn set_id(&mut self, id: Option<ContentTopicFollowId>) {
        self.id = id;
    }

    fn timestamps(&mut self) -> TimestampSlots<'_> {
        TimestampSlots::created_only(&mut self.created)
    }

    fn to_row(&self) -> Row {
        Row::new()
            .with("topic_id", self.topic_id.as_i64())
            .with("profile_id", self.profile_id.as_i64())
            .with("profile_type", &self.profile_type)
            .with("created", self.created)
    }

    fn from_row(id: ContentTopicFollowId, row: &Row) -> Result<Self, DomainError> {
        Ok(Self {
            id: Some(id),
            topic_id: row.id("topic_id")?,
            profile_id: row.id("profile_id")?,
            profile_type: row.text("profile_type")?,
            created: row.timestamp("created")?,
        })
    }
}
