//! Metrics module for ride signal smoothing.

pub mod smoothing;

pub use smoothing::{AltitudeWindow, ElevationGainFilter, GradeFilter};
