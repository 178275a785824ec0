//! Townsquare Store library.
//!
//! Persists the Townsquare entities, applying the creation/update timestamp
//! rule on every write.
//!
//! ## Structure
//!
//! - `entity_store` - `EntityStore`, the persist/load/delete entry point
//! - `infrastructure/` - Clock, configuration, ports and the SQLite driver

pub mod entity_store;
pub mod infrastructure;

pub use entity_store::EntityStore;
pub use infrastructure::clock::SystemClock;
pub use infrastructure::config::StoreConfig;
pub use infrastructure::ports::{ClockPort, DatastorePort, StoreError};
pub use infrastructure::sqlite::SqliteDatastore;
