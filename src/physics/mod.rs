//! Ride physics: great-circle distance, power estimation, calorie estimation.
//!
//! A simplified cycling power model converts ground speed and road grade
//! into a wattage estimate from gravity, rolling resistance, and
//! aerodynamic drag terms.

/// Physics constants
const RIDER_MASS_KG: f64 = 70.0;
const BIKE_MASS_KG: f64 = 14.0;
const CRR: f64 = 0.005; // Rolling resistance for road tires
const CDA: f64 = 0.32; // m² (hoods position)
const AIR_DENSITY: f64 = 1.225; // kg/m³ at sea level
const GRAVITY: f64 = 9.81; // m/s²

/// Grade is clamped to this magnitude before entering the power model.
pub const MAX_GRADE: f64 = 0.25;

/// Below this ground speed the power model reports zero output.
pub const MIN_POWER_SPEED_MS: f64 = 0.5;

/// Mechanical efficiency of a human rider (work out / energy in).
const HUMAN_EFFICIENCY: f64 = 0.24;

/// Joules per kilocalorie.
const JOULES_PER_KCAL: f64 = 4184.0;

/// Resting metabolic burn while riding, in kcal per moving second.
const BASE_BURN_KCAL_PER_S: f64 = 0.02;

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two coordinates in kilometers (haversine).
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();

    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);

    EARTH_RADIUS_KM * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Estimate instantaneous power in watts from ground speed and road grade.
///
/// Returns 0 below the speed floor and when the net force is negative
/// (coasting downhill; no regenerative power is modeled).
pub fn power_watts(speed_ms: f64, grade: f64) -> u16 {
    if speed_ms < MIN_POWER_SPEED_MS {
        return 0;
    }

    let total_mass = RIDER_MASS_KG + BIKE_MASS_KG;
    let safe_grade = grade.clamp(-MAX_GRADE, MAX_GRADE);

    let f_gravity = total_mass * GRAVITY * safe_grade;
    let f_rolling = total_mass * GRAVITY * CRR;
    let f_drag = 0.5 * AIR_DENSITY * CDA * speed_ms.powi(2);

    let total_force = f_gravity + f_rolling + f_drag;
    if total_force < 0.0 {
        return 0;
    }

    (total_force * speed_ms) as u16
}

/// Estimate calories burned from average power and moving time.
///
/// Metabolic cost is the mechanical work divided by human efficiency, plus
/// a small base burn proportional to moving time.
pub fn calories_kcal(avg_watts: f64, moving_time_seconds: f64) -> u32 {
    if moving_time_seconds <= 0.0 {
        return 0;
    }

    let work_joules = avg_watts * moving_time_seconds;
    let exercise_kcal = (work_joules / HUMAN_EFFICIENCY) / JOULES_PER_KCAL;
    let base_burn = BASE_BURN_KCAL_PER_S * moving_time_seconds;

    (exercise_kcal + base_burn) as u32
}
