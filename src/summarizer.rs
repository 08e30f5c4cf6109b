//! Per-run statistics and distance profiles. Lifts are left out: only
//! descents count towards skiing performance.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::enricher::EnrichedPoint;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentSummary {
    pub segment_id: usize,
    pub point_count: usize,
    pub start_elevation: Option<f64>,
    pub end_elevation: Option<f64>,
    pub total_distance_m: f64,
    pub duration_s: Option<f64>,
    pub avg_speed_mps: Option<f64>,
    pub max_speed_mps: Option<f64>,
    /// Cumulative distance into the run where the top speed was first reached.
    pub max_speed_distance_m: Option<f64>,
    pub avg_gradient_pct: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileSample {
    pub cumulative_distance_m: f64,
    pub elevation: Option<f64>,
    pub speed_mps: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunProfile {
    pub segment_id: usize,
    pub samples: Vec<ProfileSample>,
}

impl RunProfile {
    pub fn total_distance_m(&self) -> f64 {
        self.samples
            .last()
            .map_or(0.0, |s| s.cumulative_distance_m)
    }
}

/// Non-lift points grouped by segment, in ascending segment order. Within a
/// group the input order is kept.
fn group_runs(points: &[EnrichedPoint]) -> BTreeMap<usize, Vec<&EnrichedPoint>> {
    let mut groups: BTreeMap<usize, Vec<&EnrichedPoint>> = BTreeMap::new();
    for p in points.iter().filter(|p| !p.is_lift) {
        groups.entry(p.segment_id()).or_default().push(p);
    }
    groups
}

fn profile_of(segment_id: usize, points: &[&EnrichedPoint]) -> RunProfile {
    let mut cumulative = 0.0;
    let samples = points
        .iter()
        .map(|p| {
            cumulative += p.distance_to_prev_m.unwrap_or(0.0);
            ProfileSample {
                cumulative_distance_m: cumulative,
                elevation: p.elevation(),
                speed_mps: p.speed_mps,
            }
        })
        .collect();
    RunProfile {
        segment_id,
        samples,
    }
}

pub fn run_profiles(points: &[EnrichedPoint]) -> Vec<RunProfile> {
    group_runs(points)
        .into_iter()
        .map(|(segment_id, group)| profile_of(segment_id, &group))
        .collect()
}

pub fn summarize_runs(points: &[EnrichedPoint]) -> Vec<SegmentSummary> {
    group_runs(points)
        .into_iter()
        .map(|(segment_id, group)| summarize_group(segment_id, &group))
        .collect()
}

fn summarize_group(segment_id: usize, group: &[&EnrichedPoint]) -> SegmentSummary {
    let profile = profile_of(segment_id, group);
    let total_distance_m = profile.total_distance_m();

    let start_elevation = group.iter().find_map(|p| p.elevation());
    let end_elevation = group.iter().rev().find_map(|p| p.elevation());

    let speeds: Vec<f64> = group.iter().filter_map(|p| p.speed_mps).collect();
    let avg_speed_mps = if speeds.is_empty() {
        None
    } else {
        Some(speeds.iter().sum::<f64>() / speeds.len() as f64)
    };

    // strict comparison keeps the first occurrence on ties
    let mut max_speed: Option<(f64, f64)> = None;
    for sample in &profile.samples {
        if let Some(speed) = sample.speed_mps {
            if max_speed.map_or(true, |(best, _)| speed > best) {
                max_speed = Some((speed, sample.cumulative_distance_m));
            }
        }
    }

    let avg_gradient_pct = if total_distance_m == 0.0 {
        Some(0.0)
    } else {
        match (start_elevation, end_elevation) {
            (Some(start), Some(end)) => Some((end - start) / total_distance_m * 100.0),
            _ => None,
        }
    };

    let first_time = group.iter().find_map(|p| p.point.timestamp);
    let last_time = group.iter().rev().find_map(|p| p.point.timestamp);
    let duration_s = match (first_time, last_time) {
        (Some(a), Some(b)) => Some((b - a).num_milliseconds() as f64 / 1000.0),
        _ => None,
    };

    SegmentSummary {
        segment_id,
        point_count: group.len(),
        start_elevation,
        end_elevation,
        total_distance_m,
        duration_s,
        avg_speed_mps,
        max_speed_mps: max_speed.map(|(speed, _)| speed),
        max_speed_distance_m: max_speed.map(|(_, at)| at),
        avg_gradient_pct,
    }
}
