//! Errors raised at the ingestion and output boundaries.
//!
//! The analysis stages themselves never fail: missing or degenerate input is
//! carried through as `None` values instead.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported file type: {0} (expected .gpx)")]
    UnsupportedExtension(PathBuf),
    #[error("failed to parse GPX file: {0}")]
    Gpx(String),
    #[error("failed to scan GPX times: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("failed to write CSV report: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("rendering failed: {0}")]
    Render(String),
}

impl TrackError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TrackError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type TrackResult<T> = Result<T, TrackError>;
