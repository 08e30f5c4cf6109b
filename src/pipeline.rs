//! One complete analysis pass over a single track.
//!
//! extract -> enrich -> classify (joined back onto the points) -> summarize.
//! Each call builds its own values; nothing is shared between calls.

use std::collections::BTreeMap;

use tracing::info;

use crate::classifier::{classify_segments, join_classification, SegmentClass};
use crate::config::PipelineConfig;
use crate::distance::{self, SurfaceDistance};
use crate::enricher::{enrich, EnrichedPoint};
use crate::extractor::{extract_points, TrackPoint};
use crate::reader::GpxDocument;
use crate::summarizer::{run_profiles, summarize_runs, RunProfile, SegmentSummary};

#[derive(Debug, Clone)]
pub struct TrackAnalysis {
    /// Every fix in source order, with kinematics and the lift label applied.
    pub points: Vec<EnrichedPoint>,
    pub segments: BTreeMap<usize, SegmentClass>,
    /// Runs only, ascending by segment id.
    pub summaries: Vec<SegmentSummary>,
    pub profiles: Vec<RunProfile>,
}

impl TrackAnalysis {
    pub fn lift_count(&self) -> usize {
        self.segments.values().filter(|c| c.is_lift).count()
    }

    pub fn run_count(&self) -> usize {
        self.segments.len() - self.lift_count()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

pub fn analyze_track(document: &GpxDocument, config: &PipelineConfig) -> TrackAnalysis {
    let points = extract_points(document);
    let distance = distance::for_model(config.distance_model);
    analyze_points(&points, distance.as_ref(), config)
}

pub fn analyze_points(
    points: &[TrackPoint],
    distance: &dyn SurfaceDistance,
    config: &PipelineConfig,
) -> TrackAnalysis {
    let enriched = enrich(points, distance, config.zero_duration);
    let segments = classify_segments(&enriched);
    let points = join_classification(&enriched, &segments);
    let summaries = summarize_runs(&points);
    let profiles = run_profiles(&points);

    let analysis = TrackAnalysis {
        points,
        segments,
        summaries,
        profiles,
    };
    info!(
        points = analysis.points.len(),
        segments = analysis.segments.len(),
        lifts = analysis.lift_count(),
        runs = analysis.run_count(),
        "track analyzed"
    );
    analysis
}
