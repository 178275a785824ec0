//! Declarative table descriptors.
//!
//! Every entity declares one static [`TableSchema`]. The datastore driver builds
//! its DDL and column lists from it, and [`TableSchema::check`] is the field
//! validation collaborator run before a write.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::record::{Row, Value};

/// Name of the surrogate identity column on every table.
pub const ID_COLUMN: &str = "id";

/// Which set of table names to expose to the datastore.
///
/// `Legacy` keeps the two irregular names inherited from the first schema
/// (`content_type` for content items, the mixed-case participation table) so
/// an existing database can be opened without renaming tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableNaming {
    #[default]
    Standard,
    Legacy,
}

impl fmt::Display for TableNaming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableNaming::Standard => write!(f, "standard"),
            TableNaming::Legacy => write!(f, "legacy"),
        }
    }
}

impl FromStr for TableNaming {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" | "snake_case" => Ok(TableNaming::Standard),
            "legacy" | "compat" => Ok(TableNaming::Legacy),
            other => Err(DomainError::parse(format!("Unknown table naming: {other}"))),
        }
    }
}

/// Every entity kind the store knows how to persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Profile,
    ProfileOrganization,
    InviteCampaign,
    InviteBatch,
    InviteBatchRecipient,
    ProfileMember,
    ProfileSubCommunity,
    ContentTopic,
    ContentTopicFollow,
    ContentItem,
    ContentItemTopic,
    ContentItemParticipation,
    ContentItemHash,
    ContentFollow,
    ContentItemEmbed,
    ContentItemComment,
}

impl EntityKind {
    /// All kinds, parents before children, so tables can be created in order.
    pub const ALL: [EntityKind; 16] = [
        EntityKind::Profile,
        EntityKind::ProfileOrganization,
        EntityKind::InviteCampaign,
        EntityKind::InviteBatch,
        EntityKind::InviteBatchRecipient,
        EntityKind::ProfileMember,
        EntityKind::ProfileSubCommunity,
        EntityKind::ContentTopic,
        EntityKind::ContentTopicFollow,
        EntityKind::ContentItem,
        EntityKind::ContentItemTopic,
        EntityKind::ContentItemParticipation,
        EntityKind::ContentItemHash,
        EntityKind::ContentFollow,
        EntityKind::ContentItemEmbed,
        EntityKind::ContentItemComment,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Profile => "Profile",
            EntityKind::ProfileOrganization => "ProfileOrganization",
            EntityKind::InviteCampaign => "InviteCampaign",
            EntityKind::InviteBatch => "InviteBatch",
            EntityKind::InviteBatchRecipient => "InviteBatchRecipient",
            EntityKind::ProfileMember => "ProfileMember",
            EntityKind::ProfileSubCommunity => "ProfileSubCommunity",
            EntityKind::ContentTopic => "ContentTopic",
            EntityKind::ContentTopicFollow => "ContentTopicFollow",
            EntityKind::ContentItem => "ContentItem",
            EntityKind::ContentItemTopic => "ContentItemTopic",
            EntityKind::ContentItemParticipation => "ContentItemParticipation",
            EntityKind::ContentItemHash => "ContentItemHash",
            EntityKind::ContentFollow => "ContentFollow",
            EntityKind::ContentItemEmbed => "ContentItemEmbed",
            EntityKind::ContentItemComment => "ContentItemComment",
        }
    }

    pub fn table_name(&self, naming: TableNaming) -> &'static str {
        match (self, naming) {
            (EntityKind::ContentItem, TableNaming::Legacy) => "content_type",
            (EntityKind::ContentItemParticipation, TableNaming::Legacy) => {
                "ContentItemParticipation"
            }
            (EntityKind::Profile, _) => "profile",
            (EntityKind::ProfileOrganization, _) => "profile_organization",
            (EntityKind::InviteCampaign, _) => "invite_campaign",
            (EntityKind::InviteBatch, _) => "invite_batch",
            (EntityKind::InviteBatchRecipient, _) => "invite_batch_recipient",
            (EntityKind::ProfileMember, _) => "profile_member",
            (EntityKind::ProfileSubCommunity, _) => "profile_sub_community",
            (EntityKind::ContentTopic, _) => "content_topic",
            (EntityKind::ContentTopicFollow, _) => "content_topic_follow",
            (EntityKind::ContentItem, _) => "content_item",
            (EntityKind::ContentItemTopic, _) => "content_item_topic",
            (EntityKind::ContentItemParticipation, _) => "content_item_participation",
            (EntityKind::ContentItemHash, _) => "content_item_hash",
            (EntityKind::ContentFollow, _) => "content_follow",
            (EntityKind::ContentItemEmbed, _) => "content_item_embed",
            (EntityKind::ContentItemComment, _) => "content_item_comment",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Integer,
    Text,
    Bool,
    Timestamp,
    /// Unordered collection of integers (usually ids)
    IntegerSet,
    /// Unordered collection of strings
    TextSet,
}

/// One column of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
    /// Must be present; text must also be non-blank
    pub required: bool,
    /// Maximum length in characters for text, or for each element of a text set
    pub max_len: Option<usize>,
    /// Integer must be zero or greater
    pub non_negative: bool,
    /// Foreign key target
    pub references: Option<EntityKind>,
}

impl Column {
    const fn of(name: &'static str, ty: ColumnType) -> Self {
        Self {
            name,
            ty,
            required: false,
            max_len: None,
            non_negative: false,
            references: None,
        }
    }

    pub const fn integer(name: &'static str) -> Self {
        Self::of(name, ColumnType::Integer)
    }

    pub const fn text(name: &'static str) -> Self {
        Self::of(name, ColumnType::Text)
    }

    pub const fn boolean(name: &'static str) -> Self {
        Self::of(name, ColumnType::Bool)
    }

    pub const fn timestamp(name: &'static str) -> Self {
        Self::of(name, ColumnType::Timestamp)
    }

    pub const fn integer_set(name: &'static str) -> Self {
        Self::of(name, ColumnType::IntegerSet)
    }

    pub const fn text_set(name: &'static str) -> Self {
        Self::of(name, ColumnType::TextSet)
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn max_len(mut self, max: usize) -> Self {
        self.max_len = Some(max);
        self
    }

    pub const fn non_negative(mut self) -> Self {
        self.non_negative = true;
        self
    }

    pub const fn references(mut self, target: EntityKind) -> Self {
        self.references = Some(target);
        self
    }

    /// A required foreign key.
    pub const fn foreign_key(name: &'static str, target: EntityKind) -> Self {
        Self::integer(name).required().references(target)
    }

    fn check(&self, table: &str, value: Option<&Value>) -> Result<(), DomainError> {
        let value = match value {
            None | Some(Value::Null) => {
                if self.required {
                    return Err(DomainError::validation(format!(
                        "{table}.{} is required",
                        self.name
                    )));
                }
                return Ok(());
            }
            Some(value) => value,
        };

        match value {
            Value::Text(text) => {
                if self.required && text.trim().is_empty() {
                    return Err(DomainError::validation(format!(
                        "{table}.{} is required",
                        self.name
                    )));
                }
                self.check_len(table, text)?;
            }
            Value::TextSet(items) => {
                for item in items {
                    self.check_len(table, item)?;
                }
            }
            Value::Integer(n) if self.non_negative && *n < 0 => {
                return Err(DomainError::validation(format!(
                    "{table}.{} cannot be negative",
                    self.name
                )));
            }
            _ => {}
        }
        Ok(())
    }

    fn check_len(&self, table: &str, text: &str) -> Result<(), DomainError> {
        if let Some(max) = self.max_len {
            let len = text.chars().count();
            if len > max {
                return Err(DomainError::validation(format!(
                    "{table}.{} cannot exceed {max} characters (got {len})",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

/// Static description of one entity table.
#[derive(Debug)]
pub struct TableSchema {
    pub kind: EntityKind,
    /// Data columns, excluding the identity column
    pub columns: &'static [Column],
}

impl TableSchema {
    pub fn table_name(&self, naming: TableNaming) -> &'static str {
        self.kind.table_name(naming)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Check a row against the declared required-ness, maximum lengths and
    /// sign constraints.
    pub fn check(&self, row: &Row) -> Result<(), DomainError> {
        let table = self.kind.table_name(TableNaming::Standard);
        for column in self.columns {
            column.check(table, row.get(column.name))?;
        }
        Ok(())
    }
}
