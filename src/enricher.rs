//! Per-point kinematics: distance, elapsed time and speed relative to the
//! previous fix of the same segment.

use crate::config::ZeroDurationPolicy;
use crate::distance::SurfaceDistance;
use crate::extractor::TrackPoint;

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedPoint {
    pub point: TrackPoint,
    /// `None` on the first point of a segment (no predecessor), which is
    /// distinct from `Some(0.0)` (no movement).
    pub distance_to_prev_m: Option<f64>,
    pub time_diff_s: Option<f64>,
    pub speed_mps: Option<f64>,
    pub is_lift: bool,
}

impl EnrichedPoint {
    pub fn segment_id(&self) -> usize {
        self.point.segment_id
    }

    pub fn elevation(&self) -> Option<f64> {
        self.point.elevation
    }
}

/// Position of the point that `index` is derived from, if any: the previous
/// point in sequence, and only when it belongs to the same segment.
pub fn predecessor(points: &[TrackPoint], index: usize) -> Option<usize> {
    if index == 0 || index >= points.len() {
        return None;
    }
    let prev = index - 1;
    if points[prev].segment_id == points[index].segment_id {
        Some(prev)
    } else {
        None
    }
}

pub fn enrich(
    points: &[TrackPoint],
    distance: &dyn SurfaceDistance,
    zero_duration: ZeroDurationPolicy,
) -> Vec<EnrichedPoint> {
    (0..points.len())
        .map(|i| {
            let current = &points[i];
            let (distance_to_prev_m, time_diff_s) = match predecessor(points, i) {
                Some(p) => {
                    let prev = &points[p];
                    let d = distance.meters(
                        (prev.latitude, prev.longitude),
                        (current.latitude, current.longitude),
                    );
                    (Some(d), elapsed_seconds(prev, current))
                }
                None => (None, None),
            };

            EnrichedPoint {
                point: current.clone(),
                distance_to_prev_m,
                time_diff_s,
                speed_mps: speed(distance_to_prev_m, time_diff_s, zero_duration),
                is_lift: false,
            }
        })
        .collect()
}

/// Signed, so out-of-order fixes yield a negative interval rather than being
/// silently reordered.
fn elapsed_seconds(prev: &TrackPoint, current: &TrackPoint) -> Option<f64> {
    match (prev.timestamp, current.timestamp) {
        (Some(a), Some(b)) => Some((b - a).num_milliseconds() as f64 / 1000.0),
        _ => None,
    }
}

fn speed(
    distance_m: Option<f64>,
    time_diff_s: Option<f64>,
    zero_duration: ZeroDurationPolicy,
) -> Option<f64> {
    let (d, t) = (distance_m?, time_diff_s?);
    if t == 0.0 {
        return match zero_duration {
            ZeroDurationPolicy::Undefined => None,
            ZeroDurationPolicy::Zero => Some(0.0),
        };
    }
    Some(d / t)
}
