//! # Waypoint Common Library
//!
//! Shared code for the Waypoint crates:
//! - Error and result types
//! - Canonicalization (slugs, quiz answer fingerprints)
//! - Domain models (roadmap entities, cached quiz results)
//! - Category taxonomy configuration
//! - Configuration loading

pub mod canonical;
pub mod config;
pub mod error;
pub mod models;
pub mod taxonomy;

pub use canonical::{fingerprint, slugify, Fingerprint, QuizAnswers, Slug};
pub use error::{Error, Result};
pub use taxonomy::{CareerRef, CategoryTaxonomy, MergedCategory};
