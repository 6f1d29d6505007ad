//! Altitude smoothing and checkpoint-gated derivative filters.
//!
//! GPS altitude is noisy enough that grade and elevation gain computed from
//! raw consecutive fixes are useless. The window average flattens the
//! altitude signal, and the checkpoint filters only recompute their outputs
//! once the rider has moved far enough for the change to be real.

use std::collections::VecDeque;

use crate::physics;

/// Horizontal distance a rider must cover before grade is recomputed (km).
pub const GRADE_CHECKPOINT_KM: f64 = 0.02;

/// Smoothed altitude must exceed the anchor by this much before any
/// elevation gain is credited (meters).
pub const ELEVATION_GAIN_THRESHOLD_M: f64 = 1.5;

/// Sliding window average over raw altitude samples.
#[derive(Debug)]
pub struct AltitudeWindow {
    /// Buffer of recent values
    buffer: VecDeque<f64>,
    /// Window size in samples
    window_size: usize,
}

impl AltitudeWindow {
    /// Create a new altitude window with the given capacity.
    pub fn new(window_size: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(window_size),
            window_size,
        }
    }

    /// Create the default 5-sample window.
    pub fn five_sample() -> Self {
        Self::new(5)
    }

    /// Add a raw altitude and return the current smoothed value.
    pub fn add(&mut self, altitude_m: f64) -> f64 {
        self.buffer.push_back(altitude_m);
        if self.buffer.len() > self.window_size {
            self.buffer.pop_front();
        }

        self.buffer.iter().sum::<f64>() / self.buffer.len() as f64
    }

    /// Reset the window.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Get the number of samples in the window.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the window is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

/// Checkpoint anchor for the grade filter.
#[derive(Debug, Clone, Copy)]
struct GradeAnchor {
    lat: f64,
    lon: f64,
    altitude_m: f64,
}

/// Grade filter gated on horizontal distance from the last checkpoint.
///
/// Grade only updates once the current point is more than
/// [`GRADE_CHECKPOINT_KM`] from the anchor; inside that radius the previous
/// grade is held, which suppresses rise-over-nothing spikes from
/// near-stationary GPS jitter.
#[derive(Debug, Default)]
pub struct GradeFilter {
    anchor: Option<GradeAnchor>,
    grade: f64,
}

impl GradeFilter {
    /// Create a new grade filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the current position and smoothed altitude, returning the grade.
    pub fn update(&mut self, lat: f64, lon: f64, smoothed_alt_m: f64) -> f64 {
        match self.anchor {
            None => {
                self.anchor = Some(GradeAnchor {
                    lat,
                    lon,
                    altitude_m: smoothed_alt_m,
                });
                self.grade = 0.0;
            }
            Some(anchor) => {
                let run_km = physics::haversine_km(anchor.lat, anchor.lon, lat, lon);
                if run_km > GRADE_CHECKPOINT_KM {
                    self.grade = (smoothed_alt_m - anchor.altitude_m) / (run_km * 1000.0);
                    self.anchor = Some(GradeAnchor {
                        lat,
                        lon,
                        altitude_m: smoothed_alt_m,
                    });
                }
            }
        }

        self.grade
    }

    /// Get the current grade without updating.
    pub fn grade(&self) -> f64 {
        self.grade
    }

    /// Reset the filter state.
    pub fn reset(&mut self) {
        self.anchor = None;
        self.grade = 0.0;
    }
}

/// One-directional hysteresis filter for elevation gain.
///
/// Only upward excursions beyond [`ELEVATION_GAIN_THRESHOLD_M`] count, and
/// the anchor advances only on a qualifying event. Descending never
/// contributes and never moves the anchor.
#[derive(Debug, Default)]
pub struct ElevationGainFilter {
    anchor_m: Option<f64>,
}

impl ElevationGainFilter {
    /// Create a new elevation gain filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the current smoothed altitude, returning this cycle's gain delta.
    pub fn update(&mut self, smoothed_alt_m: f64) -> f64 {
        match self.anchor_m {
            None => {
                self.anchor_m = Some(smoothed_alt_m);
                0.0
            }
            Some(anchor) => {
                let rise = smoothed_alt_m - anchor;
                if rise > ELEVATION_GAIN_THRESHOLD_M {
                    self.anchor_m = Some(smoothed_alt_m);
                    rise
                } else {
                    0.0
                }
            }
        }
    }

    /// Reset the filter state.
    pub fn reset(&mut self) {
        self.anchor_m = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_altitude_window_mean() {
        let mut window = AltitudeWindow::five_sample();

        assert_eq!(window.add(100.0), 100.0);
        assert_eq!(window.add(102.0), 101.0);
        assert_eq!(window.add(104.0), 102.0);
    }

    #[test]
    fn test_altitude_window_evicts_oldest() {
        let mut window = AltitudeWindow::five_sample();

        for alt in [100.0, 100.0, 100.0, 100.0, 100.0] {
            window.add(alt);
        }
        // Sixth sample evicts the first: (100*4 + 110) / 5 = 102
        assert_eq!(window.add(110.0), 102.0);
        assert_eq!(window.len(), 5);
    }

    #[test]
    fn test_grade_first_sample_is_zero() {
        let mut filter = GradeFilter::new();
        assert_eq!(filter.update(48.2082, 16.3738, 200.0), 0.0);
    }

    #[test]
    fn test_grade_held_within_checkpoint_radius() {
        let mut filter = GradeFilter::new();
        filter.update(48.2082, 16.3738, 200.0);

        // ~550 m east: well beyond the 20 m gate, 10 m of rise
        let grade = filter.update(48.2082, 16.3812, 210.0);
        assert!(grade > 0.0);

        // A couple of meters of jitter: below the gate, grade held
        let held = filter.update(48.20821, 16.38121, 225.0);
        assert_eq!(held, grade);
        assert_eq!(filter.grade(), grade);
    }

    #[test]
    fn test_grade_recomputes_past_checkpoint() {
        let mut filter = GradeFilter::new();
        filter.update(0.0, 0.0, 100.0);

        // 0.001 deg longitude at the equator is ~111 m
        let grade = filter.update(0.0, 0.001, 111.0);
        // 11 m rise over ~111 m run
        assert!((grade - 0.099).abs() < 0.005, "unexpected grade: {grade}");
    }

    #[test]
    fn test_elevation_gain_below_threshold() {
        let mut filter = ElevationGainFilter::new();
        assert_eq!(filter.update(100.0), 0.0);
        assert_eq!(filter.update(101.0), 0.0);
        assert_eq!(filter.update(101.4), 0.0);
    }

    #[test]
    fn test_elevation_gain_accumulates_past_threshold() {
        let mut filter = ElevationGainFilter::new();
        filter.update(100.0);
        let delta = filter.update(102.0);
        assert!((delta - 2.0).abs() < 1e-9);

        // Anchor moved to 102; another 1.0 m is below the threshold
        assert_eq!(filter.update(103.0), 0.0);
    }

    #[test]
    fn test_elevation_gain_never_negative() {
        let mut filter = ElevationGainFilter::new();
        filter.update(100.0);
        assert_eq!(filter.update(90.0), 0.0);
        assert_eq!(filter.update(50.0), 0.0);

        // Descending never moved the anchor, so climbing back to 100
        // from the original anchor is not counted either until the
        // threshold above 100 is crossed.
        assert_eq!(filter.update(100.0), 0.0);
        let delta = filter.update(102.0);
        assert!((delta - 2.0).abs() < 1e-9);
    }
}
