//! Test Helper Utilities
//!
//! Shared utilities for testing waypoint-engine

#![allow(dead_code)]

pub mod fake_generator;
pub mod store_utils;

pub use fake_generator::FakeGenerator;
pub use store_utils::{insert_legacy_entity, memory_store, test_engine, FlakyStore};
