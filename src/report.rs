//! CSV tables and the per-track output directory.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use csv::Writer;
use serde::Serialize;
use tracing::info;

use crate::charts::{render_combined_chart, render_separate_charts};
use crate::config::RenderConfig;
use crate::enricher::EnrichedPoint;
use crate::error::{TrackError, TrackResult};
use crate::map::{render_map_html, speed_map};
use crate::pipeline::TrackAnalysis;
use crate::summarizer::SegmentSummary;

pub const POINTS_CSV: &str = "points.csv";
pub const SUMMARY_CSV: &str = "summary.csv";
pub const MAP_GEOJSON: &str = "map.geojson";
pub const MAP_HTML: &str = "map.html";
pub const COMBINED_SVG: &str = "runs_combined.svg";
pub const SEPARATE_SVG: &str = "runs_separate.svg";

#[derive(Debug, Serialize)]
struct PointRow {
    segment_id: usize,
    latitude: f64,
    longitude: f64,
    elevation: Option<f64>,
    time: Option<String>,
    time_diff_s: Option<f64>,
    distance_to_prev_m: Option<f64>,
    speed_mps: Option<f64>,
    is_lift: bool,
}

impl From<&EnrichedPoint> for PointRow {
    fn from(p: &EnrichedPoint) -> Self {
        PointRow {
            segment_id: p.point.segment_id,
            latitude: p.point.latitude,
            longitude: p.point.longitude,
            elevation: p.point.elevation,
            time: p
                .point
                .timestamp
                .map(|t| t.format("%Y-%m-%d %H:%M:%S%.3f").to_string()),
            time_diff_s: p.time_diff_s,
            distance_to_prev_m: p.distance_to_prev_m,
            speed_mps: p.speed_mps,
            is_lift: p.is_lift,
        }
    }
}

pub fn write_points_csv<W: Write>(points: &[EnrichedPoint], writer: W) -> TrackResult<()> {
    let mut wtr = Writer::from_writer(writer);
    if points.is_empty() {
        wtr.write_record([
            "segment_id",
            "latitude",
            "longitude",
            "elevation",
            "time",
            "time_diff_s",
            "distance_to_prev_m",
            "speed_mps",
            "is_lift",
        ])?;
    }
    for p in points {
        wtr.serialize(PointRow::from(p))?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn write_summary_csv<W: Write>(summaries: &[SegmentSummary], writer: W) -> TrackResult<()> {
    let mut wtr = Writer::from_writer(writer);
    if summaries.is_empty() {
        wtr.write_record([
            "segment_id",
            "point_count",
            "start_elevation",
            "end_elevation",
            "total_distance_m",
            "duration_s",
            "avg_speed_mps",
            "max_speed_mps",
            "max_speed_distance_m",
            "avg_gradient_pct",
        ])?;
    }
    for s in summaries {
        wtr.serialize(s)?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Files produced for one track.
#[derive(Debug, Default, Clone)]
pub struct OutputFiles {
    pub points_csv: PathBuf,
    pub summary_csv: PathBuf,
    pub map_geojson: Option<PathBuf>,
    pub map_html: Option<PathBuf>,
    pub charts: Vec<PathBuf>,
}

/// Write every artifact for one analysis into `dir`, which is owned by this
/// track alone.
pub fn write_track_outputs(
    analysis: &TrackAnalysis,
    dir: &Path,
    render: &RenderConfig,
) -> TrackResult<OutputFiles> {
    fs::create_dir_all(dir).map_err(|e| TrackError::io(dir, e))?;

    let mut outputs = OutputFiles {
        points_csv: dir.join(POINTS_CSV),
        summary_csv: dir.join(SUMMARY_CSV),
        ..OutputFiles::default()
    };

    let file = File::create(&outputs.points_csv).map_err(|e| TrackError::io(&outputs.points_csv, e))?;
    write_points_csv(&analysis.points, file)?;

    let file = File::create(&outputs.summary_csv).map_err(|e| TrackError::io(&outputs.summary_csv, e))?;
    write_summary_csv(&analysis.summaries, file)?;

    if render.write_map {
        let collection = speed_map(&analysis.points, render);
        let geojson_path = dir.join(MAP_GEOJSON);
        fs::write(&geojson_path, collection.to_string()).map_err(|e| TrackError::io(&geojson_path, e))?;

        let html_path = dir.join(MAP_HTML);
        let html = render_map_html(&analysis.points, &collection, render);
        fs::write(&html_path, html).map_err(|e| TrackError::io(&html_path, e))?;

        outputs.map_geojson = Some(geojson_path);
        outputs.map_html = Some(html_path);
    }

    if render.write_charts {
        let combined = dir.join(COMBINED_SVG);
        render_combined_chart(&analysis.profiles, &analysis.summaries, &combined, render)?;
        let separate = dir.join(SEPARATE_SVG);
        render_separate_charts(&analysis.profiles, &analysis.summaries, &separate, render)?;
        outputs.charts = vec![combined, separate];
    }

    info!(dir = %dir.display(), "wrote track outputs");
    Ok(outputs)
}
