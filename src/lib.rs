//! Ski outing analysis from GPX recordings.
//!
//! A recording is split into its source segments, each fix gets distance,
//! elapsed time and speed relative to the previous fix of its segment, each
//! segment is labelled lift (net climb) or run, and the runs are summarized.
//! The results feed CSV reports, a speed-colored map and profile charts.

pub mod charts;
pub mod classifier;
pub mod config;
pub mod distance;
pub mod enricher;
pub mod error;
pub mod extractor;
pub mod map;
pub mod pipeline;
pub mod reader;
pub mod report;
pub mod summarizer;

pub use config::{AnalyzerConfig, DistanceModel, PipelineConfig, RenderConfig, ZeroDurationPolicy};
pub use enricher::EnrichedPoint;
pub use error::{TrackError, TrackResult};
pub use extractor::TrackPoint;
pub use pipeline::{analyze_track, TrackAnalysis};
pub use reader::GpxDocument;
pub use summarizer::{RunProfile, SegmentSummary};
