//! Lift / run labelling from each segment's net elevation change.

use std::collections::BTreeMap;

use crate::enricher::EnrichedPoint;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentClass {
    pub start_elevation: Option<f64>,
    pub end_elevation: Option<f64>,
    /// `end - start`; positive means the segment climbed.
    pub ele_drop: Option<f64>,
    pub is_lift: bool,
}

/// First and last elevation are taken in sequence order, skipping fixes that
/// carry no elevation. A segment that climbs by any positive amount is a lift;
/// flat, descending and elevation-less segments are runs.
pub fn classify_segments(points: &[EnrichedPoint]) -> BTreeMap<usize, SegmentClass> {
    let mut bounds: BTreeMap<usize, (Option<f64>, Option<f64>)> = BTreeMap::new();

    for p in points {
        let entry = bounds.entry(p.segment_id()).or_insert((None, None));
        if let Some(ele) = p.elevation() {
            if entry.0.is_none() {
                entry.0 = Some(ele);
            }
            entry.1 = Some(ele);
        }
    }

    bounds
        .into_iter()
        .map(|(segment_id, (start_elevation, end_elevation))| {
            let ele_drop = match (start_elevation, end_elevation) {
                (Some(start), Some(end)) => Some(end - start),
                _ => None,
            };
            let class = SegmentClass {
                start_elevation,
                end_elevation,
                ele_drop,
                is_lift: ele_drop.map_or(false, |drop| drop > 0.0),
            };
            (segment_id, class)
        })
        .collect()
}

/// Copy each point with its segment's label applied. Points whose segment is
/// absent from `classes` are treated as runs.
pub fn join_classification(
    points: &[EnrichedPoint],
    classes: &BTreeMap<usize, SegmentClass>,
) -> Vec<EnrichedPoint> {
    points
        .iter()
        .map(|p| EnrichedPoint {
            is_lift: classes
                .get(&p.segment_id())
                .map_or(false, |class| class.is_lift),
            ..p.clone()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ZeroDurationPolicy;
    use crate::enricher::enrich;
    use crate::enricher::tests::{pt, LatitudeMeters};
    use crate::extractor::TrackPoint;

    fn enriched(points: &[TrackPoint]) -> Vec<EnrichedPoint> {
        enrich(points, &LatitudeMeters, ZeroDurationPolicy::Undefined)
    }

    #[test]
    fn test_descent_is_run() {
        let points = enriched(&[
            pt(0, 0.0, 100.0, 0),
            pt(0, 5.0, 100.0, 10),
            pt(0, 10.0, 90.0, 20),
        ]);
        let classes = classify_segments(&points);
        let class = classes[&0];
        assert_eq!(class.start_elevation, Some(100.0));
        assert_eq!(class.end_elevation, Some(90.0));
        assert_eq!(class.ele_drop, Some(-10.0));
        assert!(!class.is_lift);
    }

    #[test]
    fn test_ascent_is_lift() {
        let points = enriched(&[pt(0, 0.0, 50.0, 0), pt(0, 40.0, 80.0, 60)]);
        let classes = classify_segments(&points);
        assert_eq!(classes[&0].ele_drop, Some(30.0));
        assert!(classes[&0].is_lift);
    }

    #[test]
    fn test_uses_endpoints_not_extremes() {
        // dips to 20 in the middle but ends higher than it started
        let points = enriched(&[
            pt(0, 0.0, 100.0, 0),
            pt(0, 5.0, 20.0, 10),
            pt(0, 10.0, 101.0, 20),
        ]);
        assert!(classify_segments(&points)[&0].is_lift);
    }

    #[test]
    fn test_flat_and_single_point_segments_are_runs() {
        let points = enriched(&[
            pt(0, 0.0, 100.0, 0),
            pt(0, 5.0, 120.0, 10),
            pt(0, 10.0, 100.0, 20),
            pt(1, 20.0, 300.0, 30),
        ]);
        let classes = classify_segments(&points);
        assert_eq!(classes[&0].ele_drop, Some(0.0));
        assert!(!classes[&0].is_lift);
        assert_eq!(classes[&1].start_elevation, classes[&1].end_elevation);
        assert_eq!(classes[&1].ele_drop, Some(0.0));
        assert!(!classes[&1].is_lift);
    }

    #[test]
    fn test_missing_elevations_are_skipped() {
        let mut raw = vec![
            pt(0, 0.0, 0.0, 0),
            pt(0, 5.0, 100.0, 10),
            pt(0, 10.0, 150.0, 20),
            pt(0, 15.0, 0.0, 30),
            pt(1, 30.0, 0.0, 40),
        ];
        raw[0].elevation = None;
        raw[3].elevation = None;
        raw[4].elevation = None;
        let classes = classify_segments(&enriched(&raw));

        assert_eq!(classes[&0].start_elevation, Some(100.0));
        assert_eq!(classes[&0].end_elevation, Some(150.0));
        assert!(classes[&0].is_lift);

        assert_eq!(classes[&1].ele_drop, None);
        assert!(!classes[&1].is_lift);
    }

    #[test]
    fn test_join_labels_every_point_of_segment() {
        let points = enriched(&[
            pt(0, 0.0, 100.0, 0),
            pt(0, 5.0, 90.0, 10),
            pt(1, 10.0, 90.0, 20),
            pt(1, 50.0, 200.0, 80),
            pt(1, 90.0, 300.0, 140),
            pt(2, 95.0, 300.0, 150),
            pt(2, 99.0, 280.0, 160),
        ]);
        let classes = classify_segments(&points);
        let joined = join_classification(&points, &classes);

        assert_eq!(joined.len(), points.len());
        let labels: Vec<bool> = joined.iter().map(|p| p.is_lift).collect();
        assert_eq!(labels, vec![false, false, true, true, true, false, false]);

        // the join leaves every other field alone
        for (before, after) in points.iter().zip(&joined) {
            assert_eq!(before.point, after.point);
            assert_eq!(before.distance_to_prev_m, after.distance_to_prev_m);
            assert_eq!(before.speed_mps, after.speed_mps);
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(classify_segments(&[]).is_empty());
        assert!(join_classification(&[], &BTreeMap::new()).is_empty());
    }
}
