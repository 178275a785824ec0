pub mod datetime;
pub mod entities;
pub mod error;
pub mod ids;
pub mod record;
pub mod schema;
pub mod value_objects;

pub use datetime::{format_timestamp, parse_timestamp, TIMESTAMP_PRECISION};

// Re-export all entities (explicit list in entities/mod.rs)
pub use entities::{
    all_schemas,
    ContentFollow, ContentItem, ContentItemComment, ContentItemEmbed, ContentItemHash,
    ContentItemParticipation, ContentItemTopic, ContentTopic, ContentTopicFollow, InviteBatch,
    InviteBatchRecipient, InviteCampaign, Profile, ProfileMember, ProfileOrganization,
    ProfileSubCommunity,
};

pub use error::DomainError;

pub use ids::{
    ContentFollowId, ContentItemCommentId, ContentItemEmbedId, ContentItemHashId, ContentItemId,
    ContentItemParticipationId, ContentItemTopicId, ContentTopicFollowId, ContentTopicId,
    EntityId, InviteBatchId, InviteBatchRecipientId, InviteCampaignId, ProfileId,
    ProfileMemberId, ProfileOrganizationId, ProfileSubCommunityId,
};

pub use record::{PersistState, Record, Row, StampSnapshot, TimestampSlots, Value};
pub use schema::{Column, ColumnType, EntityKind, TableNaming, TableSchema, ID_COLUMN};

pub use value_objects::{
    slugify, IdSet, InviteKey, PageAttributes, SetField, TagSet, INVITE_KEY_MAX_LEN,
};
