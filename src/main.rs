use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Parser, ValueEnum, ValueHint};
use rayon::prelude::*;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ski_track_analyzer::config::load_config;
use ski_track_analyzer::reader::{collect_gpx_files, read_gpx_file};
use ski_track_analyzer::report::{write_track_outputs, OutputFiles};
use ski_track_analyzer::{
    analyze_track, AnalyzerConfig, DistanceModel, SegmentSummary, ZeroDurationPolicy,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Split ski GPX recordings into lifts and runs and summarize each run", long_about = None)]
struct Cli {
    /// GPX files or directories containing them
    #[arg(required = true, value_hint = ValueHint::AnyPath)]
    inputs: Vec<PathBuf>,

    /// Directory receiving one sub-directory of results per track
    #[arg(short, long, default_value = "ski_results", value_hint = ValueHint::DirPath)]
    output_dir: PathBuf,

    /// JSON config file; flags below override it
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Distance formula between consecutive fixes
    #[arg(long, value_enum)]
    distance: Option<DistanceOpt>,

    /// Speed reported for fixes sharing a timestamp with their predecessor
    #[arg(long, value_enum)]
    zero_duration: Option<ZeroDurationOpt>,

    /// Skip the map
    #[arg(long, action = ArgAction::SetTrue)]
    no_map: bool,

    /// Skip the charts
    #[arg(long, action = ArgAction::SetTrue)]
    no_charts: bool,

    /// Debug logging
    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum DistanceOpt {
    Geodesic,
    Haversine,
}

impl From<DistanceOpt> for DistanceModel {
    fn from(opt: DistanceOpt) -> Self {
        match opt {
            DistanceOpt::Geodesic => DistanceModel::Geodesic,
            DistanceOpt::Haversine => DistanceModel::Haversine,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ZeroDurationOpt {
    Undefined,
    Zero,
}

impl From<ZeroDurationOpt> for ZeroDurationPolicy {
    fn from(opt: ZeroDurationOpt) -> Self {
        match opt {
            ZeroDurationOpt::Undefined => ZeroDurationPolicy::Undefined,
            ZeroDurationOpt::Zero => ZeroDurationPolicy::Zero,
        }
    }
}

struct TrackOutcome {
    input: PathBuf,
    runs: Vec<SegmentSummary>,
    lifts: usize,
    outputs: OutputFiles,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let config = build_config(&cli)?;
    let files = collect_gpx_files(&cli.inputs).context("collecting input files")?;
    if files.is_empty() {
        return Err(anyhow!("no GPX files found in the given inputs"));
    }

    println!("\n⛷️  SKI TRACK ANALYZER");
    println!("=====================");
    println!("🔍 Found {} GPX file(s)", files.len());
    println!("⚡ Using parallel processing on {} cores", num_cpus::get());
    println!("📁 Output folder: {}\n", cli.output_dir.display());

    let jobs: Vec<(PathBuf, PathBuf)> = output_dirs(&files, &cli.output_dir)
        .into_iter()
        .zip(files.iter().cloned())
        .map(|(dir, file)| (file, dir))
        .collect();

    let results: Vec<(PathBuf, Result<TrackOutcome>)> = jobs
        .par_iter()
        .map(|(file, dir)| (file.clone(), process_track(file, dir, &config)))
        .collect();

    let mut processed = 0;
    let mut failed = 0;
    for (file, result) in &results {
        match result {
            Ok(outcome) => {
                processed += 1;
                print_track_summary(outcome);
            }
            Err(e) => {
                failed += 1;
                error!(file = %file.display(), "{:#}", e);
                println!("❌ {}: {:#}", file.display(), e);
            }
        }
    }

    println!("\n🎯 PROCESSING SUMMARY");
    println!("====================");
    println!("✅ Successful: {}", processed);
    println!("❌ Errors: {}", failed);

    if processed == 0 {
        return Err(anyhow!("no track could be analyzed"));
    }
    Ok(())
}

fn build_config(cli: &Cli) -> Result<AnalyzerConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AnalyzerConfig::default(),
    };
    if let Some(distance) = cli.distance {
        config.pipeline.distance_model = distance.into();
    }
    if let Some(policy) = cli.zero_duration {
        config.pipeline.zero_duration = policy.into();
    }
    if cli.no_map {
        config.render.write_map = false;
    }
    if cli.no_charts {
        config.render.write_charts = false;
    }
    Ok(config)
}

/// One directory per input, named after the file stem. A name already handed
/// out gets the first free numeric suffix, so no two tracks share an output
/// location even when a stem looks like a suffixed one.
fn output_dirs(files: &[PathBuf], root: &Path) -> Vec<PathBuf> {
    let mut taken: HashSet<PathBuf> = HashSet::new();
    files
        .iter()
        .map(|file| {
            let stem = file
                .file_stem()
                .map(|s| s.to_string_lossy().trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "track".to_string());
            let mut dir = root.join(&stem);
            let mut n = 1;
            while !taken.insert(dir.clone()) {
                n += 1;
                dir = root.join(format!("{}_{}", stem, n));
            }
            dir
        })
        .collect()
}

fn process_track(file: &Path, dir: &Path, config: &AnalyzerConfig) -> Result<TrackOutcome> {
    info!(file = %file.display(), "analyzing");
    let document = read_gpx_file(file)?;
    let analysis = analyze_track(&document, &config.pipeline);
    let outputs = write_track_outputs(&analysis, dir, &config.render)
        .with_context(|| format!("writing results to {}", dir.display()))?;

    Ok(TrackOutcome {
        input: file.to_path_buf(),
        lifts: analysis.lift_count(),
        runs: analysis.summaries,
        outputs,
    })
}

fn print_track_summary(outcome: &TrackOutcome) {
    println!(
        "🏔️  {}: {} run(s), {} lift(s)",
        outcome.input.display(),
        outcome.runs.len(),
        outcome.lifts
    );
    for run in &outcome.runs {
        let fmt = |v: Option<f64>| v.map_or("-".to_string(), |v| format!("{:.1}", v));
        println!(
            "   • run {:>3}: {:>7.0} m, avg {} m/s, max {} m/s, gradient {}%",
            run.segment_id,
            run.total_distance_m,
            fmt(run.avg_speed_mps),
            fmt(run.max_speed_mps),
            fmt(run.avg_gradient_pct)
        );
    }
    println!("   📊 {}", outcome.outputs.summary_csv.display());
    if let Some(html) = &outcome.outputs.map_html {
        println!("   🗺️  {}", html.display());
    }
    for chart in &outcome.outputs.charts {
        println!("   📈 {}", chart.display());
    }
}
