//! GPX file parser for track import.

use super::{GpsPoint, ImportError};
use chrono::{DateTime, Utc};

/// Convert gpx Time to chrono DateTime
fn gpx_time_to_chrono(time: gpx::Time) -> Option<DateTime<Utc>> {
    // gpx::Time wraps time::OffsetDateTime, convert via string format
    let formatted = time.format().ok()?;
    DateTime::parse_from_rfc3339(&formatted)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse GPX file content to GPS points.
///
/// Points without a timestamp cannot be ordered and are skipped
/// individually rather than failing the whole file.
pub fn parse_gpx(content: &[u8]) -> Result<Vec<GpsPoint>, ImportError> {
    let content_str = std::str::from_utf8(content)
        .map_err(|e| ImportError::ParseError(format!("Invalid UTF-8: {}", e)))?;

    let gpx_data: gpx::Gpx = gpx::read(content_str.as_bytes())
        .map_err(|e| ImportError::ParseError(format!("GPX parse error: {}", e)))?;

    let mut points = Vec::new();
    let mut skipped = 0usize;

    // Extract points from tracks
    for track in &gpx_data.tracks {
        for segment in &track.segments {
            for point in &segment.points {
                match convert_waypoint(point) {
                    Some(gps_point) => points.push(gps_point),
                    None => skipped += 1,
                }
            }
        }
    }

    // If no tracks, try routes
    if points.is_empty() && skipped == 0 {
        for route in &gpx_data.routes {
            for point in &route.points {
                match convert_waypoint(point) {
                    Some(gps_point) => points.push(gps_point),
                    None => skipped += 1,
                }
            }
        }
    }

    if skipped > 0 {
        tracing::debug!(skipped, "Skipped track points without timestamps");
    }

    Ok(points)
}

/// Convert one GPX waypoint, rejecting points without a timestamp.
fn convert_waypoint(point: &gpx::Waypoint) -> Option<GpsPoint> {
    let timestamp = point.time.clone().and_then(gpx_time_to_chrono)?;

    Some(GpsPoint {
        latitude: point.point().y(),
        longitude: point.point().x(),
        elevation_m: point.elevation.unwrap_or(0.0),
        timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_GPX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test">
  <trk>
    <name>Morning Loop</name>
    <trkseg>
      <trkpt lat="45.5" lon="-122.5">
        <ele>100</ele>
        <time>2024-01-01T00:00:00Z</time>
      </trkpt>
      <trkpt lat="45.51" lon="-122.51">
        <ele>110</ele>
        <time>2024-01-01T00:01:00Z</time>
      </trkpt>
    </trkseg>
  </trk>
</gpx>"#;

    #[test]
    fn test_parse_gpx_basic() {
        let points = parse_gpx(SAMPLE_GPX.as_bytes()).unwrap();
        assert_eq!(points.len(), 2);
        assert!((points[0].latitude - 45.5).abs() < 0.001);
        assert!((points[0].longitude - (-122.5)).abs() < 0.001);
        assert_eq!(points[0].elevation_m, 100.0);
    }

    #[test]
    fn test_parse_gpx_skips_points_without_time() {
        let gpx = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test">
  <trk>
    <trkseg>
      <trkpt lat="45.5" lon="-122.5"><ele>100</ele></trkpt>
      <trkpt lat="45.51" lon="-122.51">
        <ele>110</ele>
        <time>2024-01-01T00:01:00Z</time>
      </trkpt>
    </trkseg>
  </trk>
</gpx>"#;
        let points = parse_gpx(gpx.as_bytes()).unwrap();
        assert_eq!(points.len(), 1);
    }

    #[test]
    fn test_parse_gpx_empty_file() {
        let empty = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test"></gpx>"#;
        let points = parse_gpx(empty.as_bytes()).unwrap();
        assert!(points.is_empty());
    }

    #[test]
    fn test_parse_gpx_garbage() {
        assert!(parse_gpx(b"definitely not xml").is_err());
    }
}
