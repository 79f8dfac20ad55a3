//! HTTP API handlers for waypoint-engine
//!
//! Thin JSON layer over [`crate::services::RoadmapEngine`].

pub mod categories;
pub mod health;
pub mod quiz;
pub mod roadmaps;

pub use categories::category_routes;
pub use health::health_routes;
pub use quiz::quiz_routes;
pub use roadmaps::roadmap_routes;
