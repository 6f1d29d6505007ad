//! Database schema definitions for veloride.

/// SQL schema for creating all database tables.
pub const SCHEMA: &str = r#"
-- Rides table
CREATE TABLE IF NOT EXISTS rides (
    id TEXT PRIMARY KEY,
    started_at TEXT NOT NULL,
    ended_at TEXT,
    distance_km REAL NOT NULL DEFAULT 0,
    moving_time_seconds REAL NOT NULL DEFAULT 0,
    elapsed_time_seconds REAL NOT NULL DEFAULT 0,
    elevation_gain_m REAL NOT NULL DEFAULT 0,
    calories INTEGER NOT NULL DEFAULT 0,
    avg_speed_kph REAL NOT NULL DEFAULT 0,
    max_speed_kph REAL NOT NULL DEFAULT 0,
    avg_power_watts INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_rides_started_at ON rides(started_at);

-- Track points table
CREATE TABLE IF NOT EXISTS track_points (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    ride_id TEXT NOT NULL REFERENCES rides(id) ON DELETE CASCADE,
    timestamp REAL NOT NULL,
    latitude REAL NOT NULL,
    longitude REAL NOT NULL,
    altitude_m REAL NOT NULL,
    speed_ms REAL NOT NULL,
    power_watts INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_track_points_ride_id ON track_points(ride_id);
CREATE INDEX IF NOT EXISTS idx_track_points_timestamp ON track_points(ride_id, timestamp);
"#;

/// SQL for the schema version tracking table.
pub const SCHEMA_VERSION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);
"#;

/// Current schema version.
pub const CURRENT_VERSION: i32 = 1;
