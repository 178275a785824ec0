//! Persisted entities
//!
//! Each entity implements [`crate::Record`] with its own static table schema.

use crate::record::Record;
use crate::schema::TableSchema;

mod content_item;
mod content_topic;
mod follow;
mod invite;
mod participation;
mod profile;

pub use content_item::{
    ContentItem, ContentItemComment, ContentItemEmbed, ContentItemHash, ContentItemTopic,
};
pub use content_topic::{ContentTopic, ContentTopicFollow};
pub use follow::ContentFollow;
pub use invite::{InviteBatch, InviteBatchRecipient, InviteCampaign};
pub use participation::ContentItemParticipation;
pub use profile::{Profile, ProfileMember, ProfileOrganization, ProfileSubCommunity};

/// Every table schema, parents before children.
pub fn all_schemas() -> [&'static TableSchema; 16] {
    [
        Profile::schema(),
        ProfileOrganization::schema(),
        InviteCampaign::schema(),
        InviteBatch::schema(),
        InviteBatchRecipient::schema(),
        ProfileMember::schema(),
        ProfileSubCommunity::schema(),
        ContentTopic::schema(),
        ContentTopicFollow::schema(),
        ContentItem::schema(),
        ContentItemTopic::schema(),
        ContentItemParticipation::schema(),
        ContentItemHash::schema(),
        ContentFollow::schema(),
        ContentItemEmbed::schema(),
        ContentItemComment::schema(),
    ]
}
