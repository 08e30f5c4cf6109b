//! Elevation and speed profiles of each run against cumulative distance.
//!
//! Every render call creates its own drawing area on its own file and
//! presents it before returning, so no figure state outlives the call.

use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::debug;

use crate::config::RenderConfig;
use crate::error::{TrackError, TrackResult};
use crate::summarizer::{RunProfile, SegmentSummary};

type DrawResult<T> = Result<T, Box<dyn std::error::Error>>;

const ROW_HEIGHT: u32 = 300;

/// All runs overlaid: elevation on top, speed below.
pub fn render_combined_chart(
    profiles: &[RunProfile],
    summaries: &[SegmentSummary],
    path: &Path,
    render: &RenderConfig,
) -> TrackResult<()> {
    let root = SVGBackend::new(path, (render.chart_width, render.chart_height)).into_drawing_area();
    draw_combined(&root, profiles, summaries)
        .and_then(|_| root.present().map_err(Into::into))
        .map_err(|e| TrackError::Render(e.to_string()))?;
    debug!(path = %path.display(), runs = profiles.len(), "combined chart written");
    Ok(())
}

/// One row per run: elevation on the left, speed on the right.
pub fn render_separate_charts(
    profiles: &[RunProfile],
    summaries: &[SegmentSummary],
    path: &Path,
    render: &RenderConfig,
) -> TrackResult<()> {
    let row_height = (render.chart_height / 2).max(ROW_HEIGHT);
    let rows = profiles.len().max(1) as u32;
    let root = SVGBackend::new(path, (render.chart_width, row_height * rows)).into_drawing_area();
    draw_separate(&root, profiles, summaries)
        .and_then(|_| root.present().map_err(Into::into))
        .map_err(|e| TrackError::Render(e.to_string()))?;
    debug!(path = %path.display(), runs = profiles.len(), "separate charts written");
    Ok(())
}

fn draw_combined<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    profiles: &[RunProfile],
    summaries: &[SegmentSummary],
) -> DrawResult<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    if profiles.is_empty() {
        return draw_no_runs(root);
    }

    let x_max = profiles
        .iter()
        .map(RunProfile::total_distance_m)
        .fold(1.0, f64::max);
    let (_, height) = root.dim_in_pixel();
    let (upper, lower) = root.split_vertically(height / 2);

    let (ele_lo, ele_hi) = padded(profiles.iter().flat_map(elevations).map(|(_, e)| e));
    let mut chart = ChartBuilder::on(&upper)
        .caption("Elevation by run", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..x_max, ele_lo..ele_hi)?;
    chart
        .configure_mesh()
        .x_desc("Distance (m)")
        .y_desc("Elevation (m)")
        .draw()?;
    for (i, profile) in profiles.iter().enumerate() {
        let style = Palette99::pick(i).stroke_width(2);
        chart
            .draw_series(LineSeries::new(elevations(profile), style))?
            .label(format!("Run {}", profile.segment_id))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
    }
    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    let (_, speed_hi) = padded(profiles.iter().flat_map(speeds).map(|(_, s)| s));
    let mut chart = ChartBuilder::on(&lower)
        .caption("Speed by run", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..x_max, 0.0..speed_hi.max(1.0))?;
    chart
        .configure_mesh()
        .x_desc("Distance (m)")
        .y_desc("Speed (m/s)")
        .draw()?;
    for (i, profile) in profiles.iter().enumerate() {
        let style = Palette99::pick(i).stroke_width(2);
        let summary = summaries.iter().find(|s| s.segment_id == profile.segment_id);
        chart
            .draw_series(LineSeries::new(speeds(profile), style))?
            .label(format!(
                "Run {}: {}",
                profile.segment_id,
                speed_annotation(summary)
            ))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
    }
    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    Ok(())
}

fn draw_separate<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    profiles: &[RunProfile],
    summaries: &[SegmentSummary],
) -> DrawResult<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    if profiles.is_empty() {
        return draw_no_runs(root);
    }

    let panels = root.split_evenly((profiles.len(), 2));
    for (row, profile) in profiles.iter().enumerate() {
        let summary = summaries.iter().find(|s| s.segment_id == profile.segment_id);
        let x_max = profile.total_distance_m().max(1.0);
        let color = Palette99::pick(row);

        let (ele_lo, ele_hi) = padded(elevations(profile).into_iter().map(|(_, e)| e));
        let mut chart = ChartBuilder::on(&panels[row * 2])
            .caption(format!("Run {} elevation", profile.segment_id), ("sans-serif", 16))
            .margin(8)
            .x_label_area_size(30)
            .y_label_area_size(55)
            .build_cartesian_2d(0.0..x_max, ele_lo..ele_hi)?;
        chart
            .configure_mesh()
            .x_desc("Distance (m)")
            .y_desc("Elevation (m)")
            .draw()?;
        chart.draw_series(LineSeries::new(elevations(profile), color.stroke_width(2)))?;

        let (_, speed_hi) = padded(speeds(profile).into_iter().map(|(_, s)| s));
        let speed_hi = speed_hi.max(1.0);
        let mut chart = ChartBuilder::on(&panels[row * 2 + 1])
            .caption(
                format!("Run {} speed ({})", profile.segment_id, speed_annotation(summary)),
                ("sans-serif", 16),
            )
            .margin(8)
            .x_label_area_size(30)
            .y_label_area_size(55)
            .build_cartesian_2d(0.0..x_max, 0.0..speed_hi)?;
        chart
            .configure_mesh()
            .x_desc("Distance (m)")
            .y_desc("Speed (m/s)")
            .draw()?;
        chart.draw_series(LineSeries::new(speeds(profile), color.stroke_width(2)))?;

        if let Some(avg) = summary.and_then(|s| s.avg_speed_mps) {
            chart.draw_series(LineSeries::new(
                vec![(0.0, avg), (x_max, avg)],
                BLACK.mix(0.6).stroke_width(1),
            ))?;
        }
        if let Some(s) = summary {
            if let (Some(top), Some(at)) = (s.max_speed_mps, s.max_speed_distance_m) {
                chart.draw_series(std::iter::once(Circle::new((at, top), 5, RED.filled())))?;
                chart.draw_series(std::iter::once(Text::new(
                    format!("max {:.1} m/s", top),
                    (at, top),
                    ("sans-serif", 14).into_font(),
                )))?;
            }
        }
    }

    Ok(())
}

fn draw_no_runs<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>) -> DrawResult<()>
where
    DB::ErrorType: 'static,
{
    root.draw(&Text::new(
        "No runs in this track",
        (40, 40),
        ("sans-serif", 24).into_font(),
    ))?;
    Ok(())
}

fn elevations(profile: &RunProfile) -> Vec<(f64, f64)> {
    profile
        .samples
        .iter()
        .filter_map(|s| s.elevation.map(|e| (s.cumulative_distance_m, e)))
        .collect()
}

fn speeds(profile: &RunProfile) -> Vec<(f64, f64)> {
    profile
        .samples
        .iter()
        .filter_map(|s| s.speed_mps.map(|v| (s.cumulative_distance_m, v)))
        .collect()
}

fn speed_annotation(summary: Option<&SegmentSummary>) -> String {
    let fmt = |v: Option<f64>| v.map_or("n/a".to_string(), |v| format!("{:.1}", v));
    format!(
        "avg {} m/s, max {} m/s",
        fmt(summary.and_then(|s| s.avg_speed_mps)),
        fmt(summary.and_then(|s| s.max_speed_mps))
    )
}

/// Axis bounds with a 5% margin; a flat or empty series gets a unit band.
fn padded(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() {
        return (0.0, 1.0);
    }
    if hi - lo < f64::EPSILON {
        return (lo - 1.0, hi + 1.0);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad, hi + pad)
}
