//! Telemetry types: ride records, track points, and the live snapshot payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One recorded riding session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ride {
    /// Unique identifier
    pub id: Uuid,
    /// Ride start timestamp
    pub started_at: DateTime<Utc>,
    /// Ride end timestamp; `None` while the ride is active
    pub ended_at: Option<DateTime<Utc>>,
    /// Cumulative distance in kilometers
    pub distance_km: f64,
    /// Cumulative moving time in seconds
    pub moving_time_seconds: f64,
    /// Wall-clock span of the ride in seconds, set at finalization
    pub elapsed_time_seconds: f64,
    /// Cumulative elevation gain in meters
    pub elevation_gain_m: f64,
    /// Estimated calories burned
    pub calories: u32,
    /// Average speed in km/h, set at finalization
    pub avg_speed_kph: f64,
    /// Maximum speed in km/h
    pub max_speed_kph: f64,
    /// Exponentially-weighted running average power in watts
    pub avg_power_watts: u16,
}

impl Ride {
    /// Create a new active ride starting now.
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at,
            ended_at: None,
            distance_km: 0.0,
            moving_time_seconds: 0.0,
            elapsed_time_seconds: 0.0,
            elevation_gain_m: 0.0,
            calories: 0,
            avg_speed_kph: 0.0,
            max_speed_kph: 0.0,
            avg_power_watts: 0,
        }
    }

    /// Fold one instantaneous power reading into the running average.
    ///
    /// The average is exponentially weighted (`avg·0.95 + w·0.05`) and
    /// seeded directly by the first watt value.
    pub fn update_avg_power(&mut self, watts: u16) {
        self.avg_power_watts = if self.avg_power_watts == 0 {
            watts
        } else {
            (self.avg_power_watts as f64 * 0.95 + watts as f64 * 0.05) as u16
        };
    }
}

/// One accepted moving sample belonging to a ride.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackPoint {
    /// Owning ride
    pub ride_id: Uuid,
    /// Sample timestamp in epoch seconds
    pub timestamp: f64,
    /// GPS latitude
    pub latitude: f64,
    /// GPS longitude
    pub longitude: f64,
    /// Smoothed altitude in meters
    pub altitude_m: f64,
    /// Instantaneous speed in m/s
    pub speed_ms: f64,
    /// Instantaneous power estimate in watts
    pub power_watts: u16,
}

/// Signal condition reported in each live snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalStatus {
    /// Fix acquired and processed normally
    #[default]
    Connected,
    /// Fix acquired but the rider is stationary; ride totals are not advancing
    StationaryAutoPause,
    /// No usable fix this cycle
    NoSignal,
}

impl std::fmt::Display for SignalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalStatus::Connected => write!(f, "Connected"),
            SignalStatus::StationaryAutoPause => write!(f, "Auto-Pause"),
            SignalStatus::NoSignal => write!(f, "No Signal"),
        }
    }
}

/// Live status payload broadcast to subscribers once per cycle.
///
/// The shape is identical in every state; stationary and non-recording
/// cycles carry zeroed progress fields rather than a different payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveSnapshot {
    /// GPS latitude
    pub lat: f64,
    /// GPS longitude
    pub lon: f64,
    /// Current speed in km/h
    pub speed_kph: f64,
    /// Heading in degrees
    pub bearing: f64,
    /// Active ride distance in kilometers
    pub dist_km: f64,
    /// Instantaneous power in watts
    pub power_watts: u16,
    /// Active ride moving time in seconds
    pub moving_time_seconds: f64,
    /// Signal condition
    pub status: SignalStatus,
    /// Whether a ride is being recorded
    pub recording: bool,
    /// Whether the active ride is paused
    pub paused: bool,
}
