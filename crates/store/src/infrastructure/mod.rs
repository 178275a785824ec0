//! Infrastructure implementations.
//!
//! Contains port trait implementations for external dependencies.

pub mod clock;
pub mod config;
pub mod ports;
pub mod sqlite;

#[cfg(test)]
mod store_integration_tests;
