//! Flattens a parsed GPX document into one record per fix.

use chrono::{DateTime, NaiveDateTime};
use gpx::Time;
use tracing::{debug, warn};

use crate::reader::GpxDocument;

#[derive(Debug, Clone, PartialEq)]
pub struct TrackPoint {
    /// Index of the segment within its track. Restarts at 0 for every track,
    /// so files with several tracks share ids between them.
    pub segment_id: usize,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: Option<f64>,
    /// Wall-clock time as recorded, with any UTC offset dropped, not converted.
    pub timestamp: Option<NaiveDateTime>,
}

pub fn extract_points(document: &GpxDocument) -> Vec<TrackPoint> {
    let gpx = &document.gpx;
    let point_count: usize = gpx
        .tracks
        .iter()
        .flat_map(|t| &t.segments)
        .map(|s| s.points.len())
        .sum();
    let raw_times = if document.point_times.len() == point_count {
        Some(&document.point_times)
    } else {
        warn!(
            points = point_count,
            times = document.point_times.len(),
            "time text does not line up with points, using UTC times"
        );
        None
    };

    let mut points = Vec::with_capacity(point_count);
    for track in &gpx.tracks {
        for (segment_id, segment) in track.segments.iter().enumerate() {
            for waypoint in &segment.points {
                let timestamp = match raw_times {
                    Some(times) => times[points.len()].as_deref().and_then(wall_clock),
                    None => waypoint.time.as_ref().and_then(utc_wall_clock),
                };
                let location = waypoint.point();
                points.push(TrackPoint {
                    segment_id,
                    latitude: location.y(),
                    longitude: location.x(),
                    elevation: waypoint.elevation,
                    timestamp,
                });
            }
        }
    }

    debug!(
        tracks = gpx.tracks.len(),
        points = points.len(),
        "extracted track points"
    );
    points
}

/// `2025-01-20T09:00:00+09:00` becomes `2025-01-20 09:00:00`. Text without an
/// offset is taken as it is.
pub fn wall_clock(text: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }
    match NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(naive) => Some(naive),
        Err(e) => {
            warn!("unparsable GPX time {}: {}", text, e);
            None
        }
    }
}

fn utc_wall_clock(time: &Time) -> Option<NaiveDateTime> {
    match time.format() {
        Ok(formatted) => wall_clock(&formatted),
        Err(e) => {
            warn!("unformattable GPX time: {}", e);
            None
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crate::reader::read_gpx_str;

    pub(crate) fn parse(xml: &str) -> GpxDocument {
        read_gpx_str(xml).unwrap()
    }

    const TWO_TRACKS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <trk>
    <trkseg>
      <trkpt lat="36.8000" lon="138.7800"><ele>1500</ele><time>2025-01-20T09:00:00+09:00</time></trkpt>
      <trkpt lat="36.8010" lon="138.7810"><ele>1450</ele><time>2025-01-20T09:00:10+09:00</time></trkpt>
    </trkseg>
    <trkseg>
      <trkpt lat="36.8020" lon="138.7820"><ele>1200</ele><time>2025-01-20T09:10:00+09:00</time></trkpt>
    </trkseg>
  </trk>
  <trk>
    <trkseg>
      <trkpt lat="36.9000" lon="138.9000"><time>2025-01-20T11:00:00Z</time></trkpt>
      <trkpt lat="36.9010" lon="138.9010"><ele>900</ele></trkpt>
    </trkseg>
  </trk>
</gpx>"#;

    #[test]
    fn test_flattens_in_source_order() {
        let points = extract_points(&parse(TWO_TRACKS));
        assert_eq!(points.len(), 5);
        assert_eq!(points[0].latitude, 36.8000);
        assert_eq!(points[0].longitude, 138.7800);
        assert_eq!(points[1].elevation, Some(1450.0));
        assert_eq!(points[2].latitude, 36.8020);
    }

    #[test]
    fn test_segment_ids_restart_per_track() {
        let points = extract_points(&parse(TWO_TRACKS));
        let ids: Vec<usize> = points.iter().map(|p| p.segment_id).collect();
        assert_eq!(ids, vec![0, 0, 1, 0, 0]);
    }

    #[test]
    fn test_offset_is_stripped_not_converted() {
        let points = extract_points(&parse(TWO_TRACKS));
        let expected = NaiveDate::from_ymd_opt(2025, 1, 20)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        assert_eq!(points[0].timestamp, Some(expected));

        let utc = NaiveDate::from_ymd_opt(2025, 1, 20)
            .unwrap()
            .and_hms_opt(11, 0, 0)
            .unwrap();
        assert_eq!(points[3].timestamp, Some(utc));
    }

    #[test]
    fn test_mixed_offsets_keep_wall_clock() {
        let points = extract_points(&parse(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <trk>
    <trkseg>
      <trkpt lat="36.8000" lon="138.7800"><time>2025-01-20T09:00:00+09:00</time></trkpt>
      <trkpt lat="36.8010" lon="138.7810"><time>2025-01-20T00:00:10Z</time></trkpt>
      <trkpt lat="36.8020" lon="138.7820"><time>2025-01-20T09:00:20.250+09:00</time></trkpt>
    </trkseg>
  </trk>
</gpx>"#,
        ));
        let day = NaiveDate::from_ymd_opt(2025, 1, 20).unwrap();
        assert_eq!(points[0].timestamp, day.and_hms_opt(9, 0, 0));
        assert_eq!(points[1].timestamp, day.and_hms_opt(0, 0, 10));
        assert_eq!(points[2].timestamp, day.and_hms_milli_opt(9, 0, 20, 250));
    }

    #[test]
    fn test_wall_clock_parsing() {
        let day = NaiveDate::from_ymd_opt(2025, 1, 20).unwrap();
        assert_eq!(wall_clock("2025-01-20T09:00:00-05:00"), day.and_hms_opt(9, 0, 0));
        assert_eq!(wall_clock("2025-01-20T09:00:00"), day.and_hms_opt(9, 0, 0));
        assert_eq!(wall_clock("2025-01-20T09:00:00.5"), day.and_hms_milli_opt(9, 0, 0, 500));
        assert_eq!(wall_clock("yesterday"), None);
    }

    #[test]
    fn test_misaligned_times_fall_back_to_gpx_times() {
        let mut document = parse(TWO_TRACKS);
        document.point_times.clear();
        let points = extract_points(&document);
        let utc = NaiveDate::from_ymd_opt(2025, 1, 20)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(points[0].timestamp, Some(utc));
        assert_eq!(points[4].timestamp, None);
    }

    #[test]
    fn test_missing_fields_become_none() {
        let points = extract_points(&parse(TWO_TRACKS));
        assert_eq!(points[3].elevation, None);
        assert!(points[3].timestamp.is_some());
        assert_eq!(points[4].elevation, Some(900.0));
        assert_eq!(points[4].timestamp, None);
    }

    #[test]
    fn test_empty_document() {
        let document = parse(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <trk><trkseg></trkseg></trk>
</gpx>"#,
        );
        assert!(extract_points(&document).is_empty());
    }
}
