//! Content items and the records hanging off them
//!
//! # Relationships
//! - `ContentItem.owner_id -> Profile`
//! - `ContentItemTopic` joins `ContentItem` and `ContentTopic`
//! - `ContentItemHash`, `ContentItemEmbed` and `ContentItemComment` belong to one `ContentItem`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::DomainError;
use crate::ids::{
    ContentItemCommentId, ContentItemEmbedId, ContentItemHashId, ContentItemId,
    ContentItemTopicId, ContentTopicId, ProfileId,
};
use crate::record::{Record, Row, TimestampSlots};
use crate::schema::{Column, EntityKind, TableSchema};
use crate::value_objects::{IdSet, PageAttributes};

// =============================================================================
// ContentItem
// =============================================================================

/// A published piece of content owned by a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: Option<ContentItemId>,
    pub owner_id: ProfileId,
    pub owner_type: String,
    pub page: PageAttributes,
    pub url: String,
    /// Audience segments the item is visible to
    pub segments: IdSet,
    pub like_count: i64,
    pub comment_count: i64,
    pub learn_count: i64,
    /// Awaiting moderation
    pub pending: bool,
    pub private: bool,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

static CONTENT_ITEM_SCHEMA: TableSchema = TableSchema {
    kind: EntityKind::ContentItem,
    columns: &[
        Column::foreign_key("owner_id", EntityKind::Profile),
        Column::text("owner_type").max_len(31),
        PageAttributes::COLUMNS[0],
        PageAttributes::COLUMNS[1],
        PageAttributes::COLUMNS[2],
        PageAttributes::COLUMNS[3],
        Column::text("url").max_len(1024),
        Column::integer_set("segments"),
        Column::integer("like_count").required(),
        Column::integer("comment_count").required(),
        Column::integer("learn_count").required(),
        Column::boolean("pending").required(),
        Column::boolean("private").required(),
        Column::timestamp("created"),
        Column::timestamp("updated"),
    ],
};

impl ContentItem {
    pub fn new(owner_id: ProfileId, owner_type: impl Into<String>, page: PageAttributes) -> Self {
        Self {
            id: None,
            owner_id,
            owner_type: owner_type.into(),
            page,
            url: String::new(),
            segments: IdSet::new(),
            like_count: 0,
            comment_count: 0,
            learn_count: 0,
            pending: false,
            private: false,
            created: None,
            updated: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_segments(mut self, segments: IdSet) -> Self {
        self.segments = segments;
        self
    }

    pub fn is_public(&self) -> bool {
        !self.private && !self.pending
    }
}

impl Record for ContentItem {
    type Id = ContentItemId;

    fn schema() -> &'static TableSchema {
        &CONTENT_ITEM_SCHEMA
    }

    fn id(&self) -> Option<ContentItemId> {
        self.id
    }

    fn set_id(&mut self, id: Option<ContentItemId>) {
        self.id = id;
    }

    fn timestamps(&mut self) -> TimestampSlots<'_> {
        TimestampSlots::created_updated(&mut self.created, &mut self.updated)
    }

    fn to_row(&self) -> Row {
        let mut row = Row::new()
            .with("owner_id", self.owner_id.as_i64())
            .with("owner_type", &self.owner_type);
        self.page.write_to(&mut row);
        row.with("url", &self.url)
            .with("segments", &self.segments)
            .with("like_count", self.like_count)
            .with("comment_count", self.comment_count)
            .with("learn_count", self.learn_count)
            .with("pending", self.pending)
            .with("private", self.private)
            .with("created", self.created)
            .with("updated", self.updated)
    }

    fn from_row(id: ContentItemId, row: &Row) -> Result<Self, DomainError> {
        Ok(Self {
            id: Some(id),
            owner_id: row.id("owner_id")?,
            owner_type: row.text("owner_type")?,
            page: PageAttributes::read_from(row)?,
            url: row.text("url")?,
            segments: row.id_set("segments")?,
            like_count: row.integer("like_count")?,
            comment_count: row.integer("comment_count")?,
            learn_count: row.integer("learn_count")?,
            pending: row.boolean("pending")?,
            private: row.boolean("private")?,
            created: row.timestamp("created")?,
            updated: row.timestamp("updated")?,
        })
    }
}

// =============================================================================
// ContentItemTopic
// =============================================================================

/// Tags an item with a topic. Carries no timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItemTopic {
    pub id: Option<ContentItemTopicId>,
    pub item_id: ContentItemId,
    pub topic_id: ContentTopicId,
}

static CONTENT_ITEM_TOPIC_SCHEMA: TableSchema = TableSchema {
    kind: EntityKind::ContentItemTopic,
    columns: &[
        Column::foreign_key("item_id", EntityKind::ContentItem),
        Column::foreign_key("topic_id", EntityKind::ContentTopic),
    ],
};

impl ContentItemTopic {
    pub fn new(item_id: ContentItemId, topic_id: ContentTopicId) -> Self {
        Self {
            id: None,
            item_id,
            topic_id,
        }
    }
}

impl Record for ContentItemTopic {
    type Id = ContentItemTopicId;

    fn schema() -> &'static TableSchema {
        &CONTENT_ITEM_TOPIC_SCHEMA
    }

    fn id(&self) -> Option<ContentItemTopicId> {
        self.id
    }

    fn set_id(&mut self, id: Option<ContentItemTopicId>) {
        self.id = id;
    }

    fn timestamps(&mut self) -> TimestampSlots<'_> {
        TimestampSlots::none()
    }

    fn to_row(&self) -> Row {
        Row::new()
            .with("item_id", self.item_id.as_i64())
            .with("topic_id", self.topic_id.as_i64())
    }

    fn from_row(id: ContentItemTopicId, row: &Row) -> Result<Self, DomainError> {
        Ok(Self {
            id: Some(id),
            item_id: row.id("item_id")?,
            topic_id: row.id("topic_id")?,
        })
    }
}

// =============================================================================
// ContentItemHash
// =============================================================================

/// Fingerprint of an item's body, used to spot duplicate submissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItemHash {
    pub id: Option<ContentItemHashId>,
    pub item_id: ContentItemId,
    pub hash: String,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

static CONTENT_ITEM_HASH_SCHEMA: TableSchema = TableSchema {
    kind: EntityKind::ContentItemHash,
    columns: &[
        Column::foreign_key("item_id", EntityKind::ContentItem),
        Column::text("hash").required().max_len(64),
        Column::timestamp("created"),
        Column::timestamp("updated"),
    ],
};

impl ContentItemHash {
    pub fn new(item_id: ContentItemId, hash: impl Into<String>) -> Self {
        Self {
            id: None,
            item_id,
            hash: hash.into(),
            created: None,
            updated: None,
        }
    }

    /// Hash `body` with SHA-256, stored as lowercase hex.
    pub fn for_content(item_id: ContentItemId, body: impl AsRef<[u8]>) -> Self {
        let digest = Sha256::digest(body.as_ref());
        Self::new(item_id, hex::encode(digest))
    }

    pub fn matches(&self, body: impl AsRef<[u8]>) -> bool {
        hex::encode(Sha256::digest(body.as_ref())) == self.hash
    }
}

impl Record for ContentItemHash {
    type Id = ContentItemHashId;

    fn schema() -> &'static TableSchema {
        &CONTENT_ITEM_HASH_SCHEMA
    }

    fn id(&self) -> Option<ContentItemHashId> {
        self.id
    }

    fn set_id(&mut self, id: Option<ContentItemHashId>) {
        self.id = id;
    }

    fn timestamps(&mut self) -> TimestampSlots<'_> {
        TimestampSlots::created_updated(&mut self.created, &mut self.updated)
    }

    fn to_row(&self) -> Row {
        Row::new()
            .with("item_id", self.item_id.as_i64())
            .with("hash", &self.hash)
            .with("created", self.created)
            .with("updated", self.updated)
    }

    fn from_row(id: ContentItemHashId, row: &Row) -> Result<Self, DomainError> {
        Ok(Self {
            id: Some(id),
            item_id: row.id("item_id")?,
            hash: row.text("hash")?,
            created: row.timestamp("created")?,
            updated: row.timestamp("updated")?,
        })
    }
}

// =============================================================================
// ContentItemEmbed
// =============================================================================

/// oEmbed-style preview data for an item's link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItemEmbed {
    pub id: Option<ContentItemEmbedId>,
    pub item_id: ContentItemId,
    pub url: String,
    pub original_url: String,
    pub thumbnail_url: String,
    pub provider_name: String,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub thumbnail_width: Option<i64>,
    pub thumbnail_height: Option<i64>,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

static CONTENT_ITEM_EMBED_SCHEMA: TableSchema = TableSchema {
    kind: EntityKind::ContentItemEmbed,
    columns: &[
        Column::foreign_key("item_id", EntityKind::ContentItem),
        Column::text("url").required().max_len(1024),
        Column::text("original_url").max_len(1024),
        Column::text("thumbnail_url").max_len(1024),
        Column::text("provider_name").max_len(255),
        Column::integer("width"),
        Column::integer("height"),
        Column::integer("thumbnail_width"),
        Column::integer("thumbnail_height"),
        Column::timestamp("created"),
        Column::timestamp("updated"),
    ],
};

impl ContentItemEmbed {
    pub fn new(item_id: ContentItemId, url: impl Into<String>) -> Self {
        Self {
            id: None,
            item_id,
            url: url.into(),
            original_url: String::new(),
            thumbnail_url: String::new(),
            provider_name: String::new(),
            width: None,
            height: None,
            thumbnail_width: None,
            thumbnail_height: None,
            created: None,
            updated: None,
        }
    }

    pub fn with_size(mut self, width: i64, height: i64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_thumbnail(mut self, url: impl Into<String>, width: i64, height: i64) -> Self {
        self.thumbnail_url = url.into();
        self.thumbnail_width = Some(width);
        self.thumbnail_height = Some(height);
        self
    }
}

impl Record for ContentItemEmbed {
    type Id = ContentItemEmbedId;

    fn schema() -> &'static TableSchema {
        &CONTENT_ITEM_EMBED_SCHEMA
    }

    fn id(&self) -> Option<ContentItemEmbedId> {
        self.id
    }

    fn set_id(&mut self, id: Option<ContentItemEmbedId>) {
        self.id = id;
    }

    fn timestamps(&mut self) -> TimestampSlots<'_> {
        TimestampSlots::created_updated(&mut self.created, &mut self.updated)
    }

    fn to_row(&self) -> Row {
        Row::new()
            .with("item_id", self.item_id.as_i64())
            .with("url", &self.url)
            .with("original_url", &self.original_url)
            .with("thumbnail_url", &self.thumbnail_url)
            .with("provider_name", &self.provider_name)
            .with("width", self.width)
            .with("height", self.height)
            .with("thumbnail_width", self.thumbnail_width)
            .with("thumbnail_height", self.thumbnail_height)
            .with("created", self.created)
            .with("updated", self.updated)
    }

    fn from_row(id: ContentItemEmbedId, row: &Row) -> Result<Self, DomainError> {
        Ok(Self {
            id: Some(id),
            item_id: row.id("item_id")?,
            url: row.text("url")?,
            original_url: row.text("original_url")?,
            thumbnail_url: row.text("thumbnail_url")?,
            provider_name: row.text("provider_name")?,
            width: row.opt_integer("width")?,
            height: row.opt_integer("height")?,
            thumbnail_width: row.opt_integer("thumbnail_width")?,
            thumbnail_height: row.opt_integer("thumbnail_height")?,
            created: row.timestamp("created")?,
            updated: row.timestamp("updated")?,
        })
    }
}

// =============================================================================
// ContentItemComment
// =============================================================================

/// A comment on an item. The author may be any kind of profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItemComment {
    pub id: Option<ContentItemCommentId>,
    pub item_id: ContentItemId,
    pub author_id: i64,
    pub author_type: String,
    pub message: String,
    pub like_count: i64,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

static CONTENT_ITEM_COMMENT_SCHEMA: TableSchema = TableSchema {
    kind: EntityKind::ContentItemComment,
    columns: &[
        Column::foreign_key("item_id", EntityKind::ContentItem),
        Column::integer("author_id").required(),
        Column::text("author_type").required().max_len(31),
        Column::text("message").required(),
        Column::integer("like_count").required(),
        Column::timestamp("created"),
        Column::timestamp("updated"),
    ],
};

impl ContentItemComment {
    pub fn new(
        item_id: ContentItemId,
        author_id: i64,
        author_type: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            item_id,
            author_id,
            author_type: author_type.into(),
            message: message.into(),
            like_count: 0,
            created: None,
            updated: None,
        }
    }
}

impl Record for ContentItemComment {
    type Id = ContentItemCommentId;

    fn schema() -> &'static TableSchema {
        &CONTENT_ITEM_COMMENT_SCHEMA
    }

    fn id(&self) -> Option<ContentItemCommentId> {
        self.id
    }

    fn set_id(&mut self, id: Option<ContentItemCommentId>) {
        self.id = id;
    }

    fn timestamps(&mut self) -> TimestampSlots<'_> {
        TimestampSlots::created_updated(&mut self.created, &mut self.updated)
    }

    fn to_row(&self) -> Row {
        Row::new()
            .with("item_id", self.item_id.as_i64())
            .with("author_id", self.author_id)
            .with("author_type", &self.author_type)
            .with("message", &self.message)
            .with("like_count", self.like_count)
            .with("created", self.created)
            .with("updated", self.updated)
    }

    fn from_row(id: ContentItemCommentId, row: &Row) -> Result<Self, DomainError> {
        Ok(Self {
            id: Some(id),
            item_id: row.id("item_id")?,
            author_id: row.integer("author_id")?,
            author_type: row.text("author_type")?,
            message: row.text("message")?,
            like_count: row.integer("like_count")?,
            created: row.timestamp("created")?,
            updated: row.timestamp("updated")?,
        })
    }
}
