use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Surrogate identity assigned by the datastore on first insert.
///
/// Entities hold `Option<Id>`: `None` until the first successful persist.
pub trait EntityId:
    Copy + Eq + fmt::Debug + fmt::Display + From<i64> + Into<i64> + Send + Sync + 'static
{
    fn get(self) -> i64 {
        self.into()
    }
}

macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl EntityId for $name {}

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<i64>().map(Self).map_err(|_| {
                    DomainError::invalid_id(format!(
                        "{} is not a valid {}",
                        s,
                        stringify!($name)
                    ))
                })
            }
        }
    };
}

// Profiles and communities
define_id!(ProfileId);
define_id!(ProfileOrganizationId);
define_id!(ProfileMemberId);
define_id!(ProfileSubCommunityId);

// Invitations
define_id!(InviteCampaignId);
define_id!(InviteBatchId);
define_id!(InviteBatchRecipientId);

// Topics
define_id!(ContentTopicId);
define_id!(ContentTopicFollowId);

// Content items and their children
define_id!(ContentItemId);
define_id!(ContentItemTopicId);
define_id!(ContentItemParticipationId);
define_id!(ContentItemHashId);
define_id!(ContentItemEmbedId);
define_id!(ContentItemCommentId);

// Generic follows
define_id!(ContentFollowId);
