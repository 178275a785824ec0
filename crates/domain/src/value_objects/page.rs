//! Page attributes embedded by value in publishable entities.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::record::Row;
use crate::schema::Column;
use crate::value_objects::TagSet;

/// Title, slug and menu placement shared by topics and content items.
///
/// Flattened into the owning row as `title`, `slug`, `description` and
/// `in_menus`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageAttributes {
    pub title: String,
    pub slug: String,
    pub description: String,
    /// Menu identifiers the page appears in
    pub in_menus: TagSet,
}

impl PageAttributes {
    /// Column declarations, in the order `write_to` emits them.
    pub const COLUMNS: [Column; 4] = [
        Column::text("title").required().max_len(500),
        Column::text("slug").max_len(2000),
        Column::text("description"),
        Column::text_set("in_menus").max_len(100),
    ];

    pub fn new(title: impl Into<String>) -> Self {
        let title = title.into();
        let slug = slugify(&title);
        Self {
            title,
            slug,
            description: String::new(),
            in_menus: TagSet::new(),
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn write_to(&self, row: &mut Row) {
        row.set("title", &self.title);
        row.set("slug", &self.slug);
        row.set("description", &self.description);
        row.set("in_menus", &self.in_menus);
    }

    pub fn read_from(row: &Row) -> Result<Self, DomainError> {
        Ok(Self {
            title: row.text("title")?,
            slug: row.text("slug")?,
            description: row.text("description")?,
            in_menus: row.tag_set("in_menus")?,
        })
    }
}

/// Lowercase ASCII slug: alphanumerics kept, every other run becomes one `-`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}
