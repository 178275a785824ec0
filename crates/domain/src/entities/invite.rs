//! Invitation campaigns, batches and recipients
//!
//! # Relationships
//! - `InviteCampaign.owner_id -> ProfileOrganization` (optional)
//! - `InviteBatch.campaign_id -> InviteCampaign`
//! - `InviteBatchRecipient.batch_id -> InviteBatch`
//! - `InviteBatchRecipient.member_id -> Profile` (optional, set once the invite is accepted)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::{
    InviteBatchId, InviteBatchRecipientId, InviteCampaignId, ProfileId, ProfileOrganizationId,
};
use crate::record::{Record, Row, TimestampSlots};
use crate::schema::{Column, EntityKind, TableSchema};
use crate::value_objects::{IdSet, InviteKey, TagSet};

// =============================================================================
// InviteCampaign
// =============================================================================

/// A campaign grouping invitation batches, and what accepting grants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InviteCampaign {
    pub id: Option<InviteCampaignId>,
    pub owner_id: Option<ProfileOrganizationId>,
    pub name: String,
    /// Profiles an accepted invitee starts following
    pub follows: IdSet,
    pub segments: IdSet,
    pub memberships: IdSet,
    pub roles: TagSet,
    /// Campaign type, stored in column `type`
    pub campaign_type: String,
    pub active: bool,
    /// Can be joined through a shared link instead of a personal key
    pub linkable: bool,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

static INVITE_CAMPAIGN_SCHEMA: TableSchema = TableSchema {
    kind: EntityKind::InviteCampaign,
    columns: &[
        Column::integer("owner_id").references(EntityKind::ProfileOrganization),
        Column::text("name").required().max_len(255),
        Column::integer_set("follows"),
        Column::integer_set("segments"),
        Column::integer_set("memberships"),
        Column::text_set("roles").max_len(255),
        Column::text("type").max_len(60),
        Column::boolean("active").required(),
        Column::boolean("linkable").required(),
        Column::timestamp("created"),
        Column::timestamp("updated"),
    ],
};

impl InviteCampaign {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            owner_id: None,
            name: name.into(),
            follows: IdSet::new(),
            segments: IdSet::new(),
            memberships: IdSet::new(),
            roles: TagSet::new(),
            campaign_type: String::new(),
            active: true,
            linkable: false,
            created: None,
            updated: None,
        }
    }

    pub fn owned_by(mut self, owner_id: ProfileOrganizationId) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    pub fn with_roles(mut self, roles: TagSet) -> Self {
        self.roles = roles;
        self
    }

    pub fn with_follows(mut self, follows: IdSet) -> Self {
        self.follows = follows;
        self
    }
}

impl Record for InviteCampaign {
    type Id = InviteCampaignId;

    fn schema() -> &'static TableSchema {
        &INVITE_CAMPAIGN_SCHEMA
    }

    fn id(&self) -> Option<InviteCampaignId> {
        self.id
    }

    fn set_id(&mut self, id: Option<InviteCampaignId>) {
        self.id = id;
    }

    fn timestamps(&mut self) -> TimestampSlots<'_> {
        TimestampSlots::created_updated(&mut self.created, &mut self.updated)
    }

    fn to_row(&self) -> Row {
        Row::new()
            .with("owner_id", self.owner_id.map(|id| id.as_i64()))
            .with("name", &self.name)
            .with("follows", &self.follows)
            .with("segments", &self.segments)
            .with("memberships", &self.memberships)
            .with("roles", &self.roles)
            .with("type", &self.campaign_type)
            .with("active", self.active)
            .with("linkable", self.linkable)
            .with("created", self.created)
            .with("updated", self.updated)
    }

    fn from_row(id: InviteCampaignId, row: &Row) -> Result<Self, DomainError> {
        Ok(Self {
            id: Some(id),
            owner_id: row.opt_id("owner_id")?,
            name: row.text("name")?,
            follows: row.id_set("follows")?,
            segments: row.id_set("segments")?,
            memberships: row.id_set("memberships")?,
            roles: row.tag_set("roles")?,
            campaign_type: row.text("type")?,
            active: row.boolean("active")?,
            linkable: row.boolean("linkable")?,
            created: row.timestamp("created")?,
            updated: row.timestamp("updated")?,
        })
    }
}

// =============================================================================
// InviteBatch
// =============================================================================

/// One send-out of invitations within a campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InviteBatch {
    pub id: Option<InviteBatchId>,
    pub campaign_id: InviteCampaignId,
    pub groups: IdSet,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

static INVITE_BATCH_SCHEMA: TableSchema = TableSchema {
    kind: EntityKind::InviteBatch,
    columns: &[
        Column::foreign_key("campaign_id", EntityKind::InviteCampaign),
        Column::integer_set("groups"),
        Column::timestamp("created"),
        Column::timestamp("updated"),
    ],
};

impl InviteBatch {
    pub fn new(campaign_id: InviteCampaignId) -> Self {
        Self {
            id: None,
            campaign_id,
            groups: IdSet::new(),
            created: None,
            updated: None,
        }
    }

    pub fn with_groups(mut self, groups: IdSet) -> Self {
        self.groups = groups;
        self
    }
}

impl Record for InviteBatch {
    type Id = InviteBatchId;

    fn schema() -> &'static TableSchema {
        &INVITE_BATCH_SCHEMA
    }

    fn id(&self) -> Option<InviteBatchId> {
        self.id
    }

    fn set_id(&mut self, id: Option<InviteBatchId>) {
        self.id = id;
    }

    fn timestamps(&mut self) -> TimestampSlots<'_> {
        TimestampSlots::created_updated(&mut self.created, &mut self.updated)
    }

    fn to_row(&self) -> Row {
        Row::new()
            .with("campaign_id", self.campaign_id.as_i64())
            .with("groups", &self.groups)
            .with("created", self.created)
            .with("updated", self.updated)
    }

    fn from_row(id: InviteBatchId, row: &Row) -> Result<Self, DomainError> {
        Ok(Self {
            id: Some(id),
            campaign_id: row.id("campaign_id")?,
            groups: row.id_set("groups")?,
            created: row.timestamp("created")?,
            updated: row.timestamp("updated")?,
        })
    }
}

// =============================================================================
// InviteBatchRecipient
// =============================================================================

/// A single invitation sent to one email address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InviteBatchRecipient {
    pub id: Option<InviteBatchRecipientId>,
    pub member_id: Option<ProfileId>,
    pub batch_id: InviteBatchId,
    pub email: String,
    pub key: InviteKey,
    pub expired: bool,
    pub name: String,
    pub used: bool,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

static INVITE_BATCH_RECIPIENT_SCHEMA: TableSchema = TableSchema {
    kind: EntityKind::InviteBatchRecipient,
    columns: &[
        Column::integer("member_id").references(EntityKind::Profile),
        Column::foreign_key("batch_id", EntityKind::InviteBatch),
        Column::text("email").required().max_len(255),
        Column::text("key").required().max_len(1024),
        Column::boolean("expired").required(),
        Column::text("name").max_len(127),
        Column::boolean("used").required(),
        Column::timestamp("created"),
        Column::timestamp("updated"),
    ],
};

impl InviteBatchRecipient {
    pub fn new(batch_id: InviteBatchId, email: impl Into<String>) -> Self {
        Self {
            id: None,
            member_id: None,
            batch_id,
            email: email.into(),
            key: InviteKey::generate(),
            expired: false,
            name: String::new(),
            used: false,
            created: None,
            updated: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_key(mut self, key: InviteKey) -> Self {
        self.key = key;
        self
    }

    pub fn is_redeemable(&self) -> bool {
        !self.expired && !self.used
    }

    /// Mark the invite as used by the profile that accepted it.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Constraint` if the invite was already used or has
    /// expired.
    pub fn redeem(&mut self, member_id: ProfileId) -> Result<(), DomainError> {
        if !self.is_redeemable() {
            return Err(DomainError::constraint(format!(
                "invite for {} can no longer be redeemed",
                self.email
            )));
        }
        self.member_id = Some(member_id);
        self.used = true;
        Ok(())
    }
}

impl Record for InviteBatchRecipient {
    type Id = InviteBatchRecipientId;

    fn schema() -> &'static TableSchema {
        &INVITE_BATCH_RECIPIENT_SCHEMA
    }

    fn id(&self) -> Option<InviteBatchRecipientId> {
        self.id
    }

    fn set_id(&mut self, id: Option<InviteBatchRecipientId>) {
        self.id = id;
    }

    fn timestamps(&mut self) -> TimestampSlots<'_> {
        TimestampSlots::created_updated(&mut self.created, &mut self.updated)
    }

    fn to_row(&self) -> Row {
        Row::new()
            .with("member_id", self.member_id.map(|id| id.as_i64()))
            .with("batch_id", self.batch_id.as_i64())
            .with("email", &self.email)
            .with("key", self.key.as_str())
            .with("expired", self.expired)
            .with("name", &self.name)
            .with("used", self.used)
            .with("created", self.created)
            .with("updated", self.updated)
    }

    fn from_row(id: InviteBatchRecipientId, row: &Row) -> Result<Self, DomainError> {
        Ok(Self {
            id: Some(id),
            member_id: row.opt_id("member_id")?,
            batch_id: row.id("batch_id")?,
            email: row.text("email")?,
            key: InviteKey::new(row.text("key")?)?,
            expired: row.boolean("expired")?,
            name: row.text("name")?,
            used: row.boolean("used")?,
            created: row.timestamp("created")?,
            updated: row.timestamp("updated")?,
        })
    }
}
