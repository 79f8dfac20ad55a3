//! Business logic services for waypoint-engine

pub mod category_engine;
pub mod engine;
pub mod generation_client;
pub mod identity_resolver;
pub mod inflight;
pub mod quiz_cache;

pub use category_engine::{CategoryEngine, Classification, ResolutionStage};
pub use engine::{EntityStats, QuizResolution, RoadmapEngine};
pub use generation_client::HttpGenerator;
pub use identity_resolver::{IdentityResolver, ResolutionOutcome, Resolved};
pub use inflight::{InflightLeases, Lease, LeaseOutcome};
pub use quiz_cache::{CacheResolution, QuizCache};
