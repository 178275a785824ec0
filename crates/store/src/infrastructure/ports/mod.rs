//! Port traits for infrastructure boundaries.
//!
//! Ports exist for:
//! - Row storage (SQLite today, any SQL store tomorrow)
//! - Clock (for testing)

mod datastore;
mod error;
mod testing;

pub use datastore::DatastorePort;
pub use error::StoreError;
pub use testing::ClockPort;

#[cfg(test)]
pub use datastore::MockDatastorePort;
#[cfg(test)]
pub use testing::MockClockPort;
