//! veloride - Self-Hosted GPS Cycling Computer
//!
//! Real-time ride telemetry from an OS location provider: a sampling and
//! fusion loop, incremental ride metrics (distance, moving time, elevation
//! gain, power, calories), buffered persistence, and live status broadcast,
//! plus one-shot batch import of recorded GPX tracks.

pub mod import;
pub mod location;
pub mod metrics;
pub mod physics;
pub mod storage;
pub mod telemetry;

// Re-export commonly used types
pub use location::{Fix, LocationProvider, ProviderSource};
pub use storage::database::Database;
pub use telemetry::engine::{EngineHandle, TelemetryEngine};
pub use telemetry::tracker::RideTracker;
pub use telemetry::types::{LiveSnapshot, Ride, TrackPoint};
