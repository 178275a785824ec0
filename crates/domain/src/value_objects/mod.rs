//! Value objects - immutable types without identity

mod invite_key;
mod page;
mod sets;

pub use invite_key::{InviteKey, INVITE_KEY_MAX_LEN};
pub use page::{slugify, PageAttributes};
pub use sets::{IdSet, SetField, TagSet};
