//! Persistence: the run record that lets the clock tell a first run from a
//! relaunch.
//!
//! # Invariants
//! - The record is only written after it was read or created successfully.
//! - A record with an unknown schema version is never overwritten.

pub mod store;

pub use store::{RUN_SCHEMA_VERSION, RunMeta, RunStore, StoreError};
