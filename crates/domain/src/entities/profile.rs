//! Profile entities - members, organizations and sub-communities
//!
//! # Relationships
//! - `ProfileOrganization.profile_id -> Profile`
//! - `ProfileMember.profile_id -> Profile`
//! - `ProfileSubCommunity.profile_id -> Profile`, `parent_id -> Profile`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::{ProfileId, ProfileMemberId, ProfileOrganizationId, ProfileSubCommunityId};
use crate::record::{Record, Row, TimestampSlots};
use crate::schema::{Column, EntityKind, TableSchema};
use crate::value_objects::{IdSet, InviteKey, TagSet};

// =============================================================================
// Profile
// =============================================================================

/// A participant on the platform: a person, an organization or a community.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Option<ProfileId>,
    /// Profile type tags (`member`, `organization`, ...), stored in column `type`
    pub profile_type: TagSet,
    pub follower_count: i64,
    pub groups: IdSet,
    pub created: Option<DateTime<Utc>>,
    /// Refreshed on every persist
    pub last_active: Option<DateTime<Utc>>,
}

static PROFILE_SCHEMA: TableSchema = TableSchema {
    kind: EntityKind::Profile,
    columns: &[
        Column::text_set("type").max_len(31),
        Column::integer("follower_count").required().non_negative(),
        Column::integer_set("groups"),
        Column::timestamp("created"),
        Column::timestamp("last_active"),
    ],
};

impl Profile {
    pub fn new(profile_type: TagSet) -> Self {
        Self {
            id: None,
            profile_type,
            follower_count: 0,
            groups: IdSet::new(),
            created: None,
            last_active: None,
        }
    }

    pub fn with_groups(mut self, groups: IdSet) -> Self {
        self.groups = groups;
        self
    }

    pub fn is_type(&self, tag: &str) -> bool {
        self.profile_type.contains_str(tag)
    }
}

impl Record for Profile {
    type Id = ProfileId;

    fn schema() -> &'static TableSchema {
        &PROFILE_SCHEMA
    }

    fn id(&self) -> Option<ProfileId> {
        self.id
    }

    fn set_id(&mut self, id: Option<ProfileId>) {
        self.id = id;
    }

    fn timestamps(&mut self) -> TimestampSlots<'_> {
        TimestampSlots::created_updated(&mut self.created, &mut self.last_active)
    }

    fn to_row(&self) -> Row {
        Row::new()
            .with("type", &self.profile_type)
            .with("follower_count", self.follower_count)
            .with("groups", &self.groups)
            .with("created", self.created)
            .with("last_active", self.last_active)
    }

    fn from_row(id: ProfileId, row: &Row) -> Result<Self, DomainError> {
        Ok(Self {
            id: Some(id),
            profile_type: row.tag_set("type")?,
            follower_count: row.integer("follower_count")?,
            groups: row.id_set("groups")?,
            created: row.timestamp("created")?,
            last_active: row.timestamp("last_active")?,
        })
    }
}

// =============================================================================
// ProfileOrganization
// =============================================================================

/// Organization details attached to a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileOrganization {
    pub id: Option<ProfileOrganizationId>,
    pub profile_id: ProfileId,
    pub name: String,
    pub url_name: String,
    pub description: String,
    pub image: String,
    pub active: bool,
    pub website: String,
    pub size: String,
    pub alt_names: TagSet,
    pub email_domains: TagSet,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

static PROFILE_ORGANIZATION_SCHEMA: TableSchema = TableSchema {
    kind: EntityKind::ProfileOrganization,
    columns: &[
        Column::foreign_key("profile_id", EntityKind::Profile),
        Column::text("name").required().max_len(255),
        Column::text("url_name").required().max_len(255),
        Column::text("description"),
        Column::text("image").max_len(255),
        Column::boolean("active").required(),
        Column::text("website").max_len(255),
        Column::text("size").max_len(63),
        Column::text_set("alt_names").max_len(255),
        Column::text_set("email_domains").max_len(255),
        Column::timestamp("created"),
        Column::timestamp("updated"),
    ],
};

impl ProfileOrganization {
    pub fn new(profile_id: ProfileId, name: impl Into<String>, url_name: impl Into<String>) -> Self {
        Self {
            id: None,
            profile_id,
            name: name.into(),
            url_name: url_name.into(),
            description: String::new(),
            image: String::new(),
            active: true,
            website: String::new(),
            size: String::new(),
            alt_names: TagSet::new(),
            email_domains: TagSet::new(),
            created: None,
            updated: None,
        }
    }

    pub fn with_email_domains(mut self, domains: TagSet) -> Self {
        self.email_domains = domains;
        self
    }

    pub fn with_alt_names(mut self, names: TagSet) -> Self {
        self.alt_names = names;
        self
    }

    /// Whether an email address belongs to one of the organization's domains.
    pub fn owns_email(&self, email: &str) -> bool {
        match email.rsplit_once('@') {
            Some((_, domain)) => self
                .email_domains
                .iter()
                .any(|d| d.eq_ignore_ascii_case(domain)),
            None => false,
        }
    }
}

impl Record for ProfileOrganization {
    type Id = ProfileOrganizationId;

    fn schema() -> &'static TableSchema {
        &PROFILE_ORGANIZATION_SCHEMA
    }

    fn id(&self) -> Option<ProfileOrganizationId> {
        self.id
    }

    fn set_id(&mut self, id: Option<ProfileOrganizationId>) {
        self.id = id;
    }

    fn timestamps(&mut self) -> TimestampSlots<'_> {
        TimestampSlots::created_updated(&mut self.created, &mut self.updated)
    }

    fn to_row(&self) -> Row {
        Row::new()
            .with("profile_id", self.profile_id.as_i64())
            .with("name", &self.name)
            .with("url_name", &self.url_name)
            .with("description", &self.description)
            .with("image", &self.image)
            .with("active", self.active)
            .with("website", &self.website)
            .with("size", &self.size)
            .with("alt_names", &self.alt_names)
            .with("email_domains", &self.email_domains)
            .with("created", self.created)
            .with("updated", self.updated)
    }

    fn from_row(id: ProfileOrganizationId, row: &Row) -> Result<Self, DomainError> {
        Ok(Self {
            id: Some(id),
            profile_id: row.id("profile_id")?,
            name: row.text("name")?,
            url_name: row.text("url_name")?,
            description: row.text("description")?,
            image: row.text("image")?,
            active: row.boolean("active")?,
            website: row.text("website")?,
            size: row.text("size")?,
            alt_names: row.tag_set("alt_names")?,
            email_domains: row.tag_set("email_domains")?,
            created: row.timestamp("created")?,
            updated: row.timestamp("updated")?,
        })
    }
}

// =============================================================================
// ProfileMember
// =============================================================================

/// A pending or accepted membership of a person in a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileMember {
    pub id: Option<ProfileMemberId>,
    pub profile_id: ProfileId,
    /// External identity the membership was granted to
    pub identity_id: i64,
    pub email: String,
    pub key: InviteKey,
    pub expired: bool,
    pub name: String,
    /// Invite batch the membership came from; informational, not a foreign key
    pub batch_id: i64,
    pub used: bool,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

static PROFILE_MEMBER_SCHEMA: TableSchema = TableSchema {
    kind: EntityKind::ProfileMember,
    columns: &[
        Column::foreign_key("profile_id", EntityKind::Profile),
        Column::integer("identity_id").required(),
        Column::text("email").required().max_len(255),
        Column::text("key").required().max_len(1024),
        Column::boolean("expired").required(),
        Column::text("name").max_len(127),
        Column::integer("batch_id").required(),
        Column::boolean("used").required(),
        Column::timestamp("created"),
        Column::timestamp("updated"),
    ],
};

impl ProfileMember {
    pub fn new(
        profile_id: ProfileId,
        identity_id: i64,
        email: impl Into<String>,
        batch_id: i64,
    ) -> Self {
        Self {
            id: None,
            profile_id,
            identity_id,
            email: email.into(),
            key: InviteKey::generate(),
            expired: false,
            name: String::new(),
            batch_id,
            used: false,
            created: None,
            updated: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// The key can still be redeemed.
    pub fn is_redeemable(&self) -> bool {
        !self.expired && !self.used
    }
}

impl Record for ProfileMember {
    type Id = ProfileMemberId;

    fn schema() -> &'static TableSchema {
        &PROFILE_MEMBER_SCHEMA
    }

    fn id(&self) -> Option<ProfileMemberId> {
        self.id
    }

    fn set_id(&mut self, id: Option<ProfileMemberId>) {
        self.id = id;
    }

    fn timestamps(&mut self) -> TimestampSlots<'_> {
        TimestampSlots::created_updated(&mut self.created, &mut self.updated)
    }

    fn to_row(&self) -> Row {
        Row::new()
            .with("profile_id", self.profile_id.as_i64())
            .with("identity_id", self.identity_id)
            .with("email", &self.email)
            .with("key", self.key.as_str())
            .with("expired", self.expired)
            .with("name", &self.name)
            .with("batch_id", self.batch_id)
            .with("used", self.used)
            .with("created", self.created)
            .with("updated", self.updated)
    }

    fn from_row(id: ProfileMemberId, row: &Row) -> Result<Self, DomainError> {
        Ok(Self {
            id: Some(id),
            profile_id: row.id("profile_id")?,
            identity_id: row.integer("identity_id")?,
            email: row.text("email")?,
            key: InviteKey::new(row.text("key")?)?,
            expired: row.boolean("expired")?,
            name: row.text("name")?,
            batch_id: row.integer("batch_id")?,
            used: row.boolean("used")?,
            created: row.timestamp("created")?,
            updated: row.timestamp("updated")?,
        })
    }
}

// =============================================================================
// ProfileSubCommunity
// =============================================================================

/// A community nested under a parent profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSubCommunity {
    pub id: Option<ProfileSubCommunityId>,
    pub profile_id: ProfileId,
    pub name: String,
    pub parent_name: String,
    pub parent_id: ProfileId,
    pub description: String,
    pub image: String,
    pub active: bool,
    pub private: bool,
    pub email_domains: TagSet,
    pub website: String,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

static PROFILE_SUB_COMMUNITY_SCHEMA: TableSchema = TableSchema {
    kind: EntityKind::ProfileSubCommunity,
    columns: &[
        Column::foreign_key("profile_id", EntityKind::Profile),
        Column::text("name").required().max_len(50),
        Column::text("parent_name").max_len(127),
        Column::foreign_key("parent_id", EntityKind::Profile),
        Column::text("description"),
        Column::text("image").max_len(255),
        Column::boolean("active").required(),
        Column::boolean("private").required(),
        Column::text_set("email_domains").max_len(64),
        Column::text("website").max_len(255),
        Column::timestamp("created"),
        Column::timestamp("updated"),
    ],
};

impl ProfileSubCommunity {
    pub fn new(profile_id: ProfileId, parent_id: ProfileId, name: impl Into<String>) -> Self {
        Self {
            id: None,
            profile_id,
            name: name.into(),
            parent_name: String::new(),
            parent_id,
            description: String::new(),
            image: String::new(),
            active: true,
            private: false,
            email_domains: TagSet::new(),
            website: String::new(),
            created: None,
            updated: None,
        }
    }

    pub fn as_private(mut self) -> Self {
        self.private = true;
        self
    }

    pub fn with_parent_name(mut self, parent_name: impl Into<String>) -> Self {
        self.parent_name = parent_name.into();
        self
    }
}

impl Record for ProfileSubCommunity {
    type Id = ProfileSubCommunityId;

    fn schema() -> &'static TableSchema {
        &PROFILE_SUB_COMMUNITY_SCHEMA
    }

    fn id(&self) -> Option<ProfileSubCommunityId> {
        self.id
    }

    fn set_id(&mut self, id: Option<ProfileSubCommunityId>) {
        self.id = id;
    }

    fn timestamps(&mut self) -> TimestampSlots<'_> {
        TimestampSlots::created_updated(&mut self.created, &mut self.updated)
    }

    fn to_row(&self) -> Row {
        Row::new()
            .with("profile_id", self.profile_id.as_i64())
            .with("name", &self.name)
            .with("parent_name", &self.parent_name)
            .with("parent_id", self.parent_id.as_i64())
            .with("description", &self.description)
            .with("image", &self.image)
            .with("active", self.active)
            .with("private", self.private)
            .with("email_domains", &self.email_domains)
            .with("website", &self.website)
            .with("created", self.created)
            .with("updated", self.updated)
    }

    fn from_row(id: ProfileSubCommunityId, row: &Row) -> Result<Self, DomainError> {
        Ok(Self {
            id: Some(id),
            profile_id: row.id("profile_id")?,
            name: row.text("name")?,
            parent_name: row.text("parent_name")?,
            parent_id: row.id("parent_id")?,
            description: row.text("description")?,
            image: row.text("image")?,
            active: row.boolean("active")?,
            private: row.boolean("private")?,
            email_domains: row.tag_set("email_domains")?,
            website: row.text("website")?,
            created: row.timestamp("created")?,
            updated: row.timestamp("updated")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn profile_row_round_trip() {
        let mut profile = Profile::new(["member"].into_iter().collect())
            .with_groups(IdSet::from(vec![4, 2]));
        profile.follower_count = 12;
        profile.created = Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let restored = Profile::from_row(ProfileId::new(1), &profile.to_row()).unwrap();
        assert_eq!(restored.id, Some(ProfileId::new(1)));
        assert_eq!(restored.groups, IdSet::from(vec![2, 4]));
        assert_eq!(restored.created, profile.created);
        assert!(restored.is_type("member"));
    }

    #[test]
    fn profile_rejects_negative_follower_count() {
        let mut profile = Profile::new(TagSet::new());
        profile.follower_count = -1;
        assert!(matches!(profile.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn profile_type_tags_are_length_limited() {
        let profile = Profile::new(["x".repeat(32)].into_iter().collect());
        assert!(profile.validate().is_err());
    }

    #[test]
    fn organization_requires_name() {
        let org = ProfileOrganization::new(ProfileId::new(1), "", "acme");
        let err = org.validate().unwrap_err();
        assert_eq!(
            err,
            DomainError::validation("profile_organization.name is required")
        );
    }

    #[test]
    fn organization_size_is_length_limited() {
        let mut org = ProfileOrganization::new(ProfileId::new(1), "Acme", "acme");
        org.size = "s".repeat(64);
        assert!(org.validate().is_err());
    }

    #[test]
    fn organization_matches_email_domains() {
        let org = ProfileOrganization::new(ProfileId::new(1), "Acme", "acme")
            .with_email_domains(["acme.org"].into_iter().collect());
        assert!(org.owns_email("jo@ACME.org"));
        assert!(!org.owns_email("jo@example.com"));
        assert!(!org.owns_email("not-an-email"));
    }

    #[test]
    fn member_starts_redeemable_with_generated_key() {
        let member = ProfileMember::new(ProfileId::new(1), 77, "jo@acme.org", 3);
        assert!(member.is_redeemable());
        assert_eq!(member.key.as_str().len(), 32);
        assert!(member.validate().is_ok());
    }

    #[test]
    fn sub_community_name_is_limited_to_fifty_chars() {
        let community =
            ProfileSubCommunity::new(ProfileId::new(1), ProfileId::new(2), "n".repeat(51));
        assert!(community.validate().is_err());
    }
}
