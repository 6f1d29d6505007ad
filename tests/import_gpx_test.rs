//! Unit tests for GPX file parsing.

use veloride::import::gpx::parse_gpx;

const SAMPLE_GPX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test">
  <metadata>
    <name>Metadata Name</name>
  </metadata>
  <trk>
    <name>Track Name</name>
    <trkseg>
      <trkpt lat="45.5" lon="-122.5">
        <ele>100</ele>
        <time>2024-01-01T00:00:00Z</time>
      </trkpt>
      <trkpt lat="45.51" lon="-122.51">
        <ele>110</ele>
        <time>2024-01-01T00:01:00Z</time>
      </trkpt>
      <trkpt lat="45.52" lon="-122.52">
        <ele>120</ele>
        <time>2024-01-01T00:02:00Z</time>
      </trkpt>
    </trkseg>
  </trk>
</gpx>"#;

const ROUTE_GPX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test">
  <rte>
    <name>Route Name</name>
    <rtept lat="45.5" lon="-122.5">
      <ele>100</ele>
      <time>2024-01-01T00:00:00Z</time>
    </rtept>
    <rtept lat="45.51" lon="-122.51">
      <ele>110</ele>
      <time>2024-01-01T00:01:00Z</time>
    </rtept>
  </rte>
</gpx>"#;

#[test]
fn test_parse_gpx_track() {
    let points = parse_gpx(SAMPLE_GPX.as_bytes()).unwrap();
    assert_eq!(points.len(), 3);
    assert!((points[0].latitude - 45.5).abs() < 0.001);
    assert!((points[0].longitude - (-122.5)).abs() < 0.001);
    assert_eq!(points[0].elevation_m, 100.0);
}

#[test]
fn test_parse_gpx_route_fallback() {
    let points = parse_gpx(ROUTE_GPX.as_bytes()).unwrap();
    assert_eq!(points.len(), 2);
    assert!((points[0].latitude - 45.5).abs() < 0.001);
    assert_eq!(points[0].elevation_m, 100.0);
}

#[test]
fn test_parse_gpx_timestamps_ordered() {
    let points = parse_gpx(SAMPLE_GPX.as_bytes()).unwrap();
    for pair in points.windows(2) {
        assert!(pair[0].timestamp < pair[1].timestamp);
    }
}

#[test]
fn test_parse_gpx_missing_elevation_defaults_to_zero() {
    let gpx = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test">
  <trk>
    <trkseg>
      <trkpt lat="45.5" lon="-122.5">
        <time>2024-01-01T00:00:00Z</time>
      </trkpt>
    </trkseg>
  </trk>
</gpx>"#;
    let points = parse_gpx(gpx.as_bytes()).unwrap();
    assert_eq!(points.len(), 1);
    assert_eq!(points[0].elevation_m, 0.0);
}

#[test]
fn test_parse_gpx_empty_document() {
    let empty = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test"></gpx>"#;
    let points = parse_gpx(empty.as_bytes()).unwrap();
    assert!(points.is_empty());
}
