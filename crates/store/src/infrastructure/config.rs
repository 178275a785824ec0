//! Store configuration loaded from the environment.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use townsquare_domain::TableNaming;

pub const DATABASE_URL_VAR: &str = "TOWNSQUARE_DATABASE_URL";
pub const TABLE_NAMING_VAR: &str = "TOWNSQUARE_TABLE_NAMING";
pub const VALIDATE_BEFORE_WRITE_VAR: &str = "TOWNSQUARE_VALIDATE_BEFORE_WRITE";
pub const MAX_CONNECTIONS_VAR: &str = "TOWNSQUARE_MAX_CONNECTIONS";

pub const DEFAULT_DATABASE_URL: &str = "sqlite:townsquare.db?mode=rwc";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub database_url: String,
    pub table_naming: TableNaming,
    /// Run entity validation before stamping and writing. When off, the
    /// datastore's own column constraints are the only check.
    pub validate_before_write: bool,
    pub max_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            table_naming: TableNaming::Standard,
            validate_before_write: true,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl StoreConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Values that are present but unparseable are logged and replaced by the
    /// default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let database_url = lookup(DATABASE_URL_VAR)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.database_url);

        Self {
            database_url,
            table_naming: parse_or(&lookup, TABLE_NAMING_VAR, defaults.table_naming),
            validate_before_write: lookup(VALIDATE_BEFORE_WRITE_VAR)
                .map(|raw| match parse_bool(&raw) {
                    Some(v) => v,
                    None => {
                        tracing::warn!(
                            var = VALIDATE_BEFORE_WRITE_VAR,
                            value = %raw,
                            "Invalid boolean, using default"
                        );
                        defaults.validate_before_write
                    }
                })
                .unwrap_or(defaults.validate_before_write),
            max_connections: parse_or(&lookup, MAX_CONNECTIONS_VAR, defaults.max_connections)
                .max(1),
        }
    }

    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = url.into();
        self
    }

    pub fn with_table_naming(mut self, naming: TableNaming) -> Self {
        self.table_naming = naming;
        self
    }

    pub fn with_validation(mut self, validate_before_write: bool) -> Self {
        self.validate_before_write = validate_before_write;
        self
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, var: &'static str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            tracing::warn!(var, value = %raw, error = %e, "Invalid value, using default");
            default
        }),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
