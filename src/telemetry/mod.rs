//! Telemetry module: the live ride recording engine.

pub mod engine;
pub mod state;
pub mod tracker;
pub mod types;

pub use engine::{ControlError, EngineHandle, TelemetryEngine};
pub use state::{ControlAction, RideState, RideStatus};
pub use tracker::RideTracker;
pub use types::{LiveSnapshot, Ride, SignalStatus, TrackPoint};
