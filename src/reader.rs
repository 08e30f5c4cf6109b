//! Ingestion boundary: locating and parsing GPX files.
//!
//! Parsing is attempted as-is first. If that fails the content gets a single
//! pass of minimal repairs (missing XML declaration, invalid XML characters,
//! truncated closing tags) and is parsed again. Repairs never touch
//! coordinates, elevations or times.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use gpx::Gpx;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{TrackError, TrackResult};

/// A parsed GPX file plus the literal `<time>` text of every track point, in
/// document order. `gpx` normalizes times to UTC while parsing, so the text is
/// the only place the recorded wall-clock time survives.
#[derive(Debug, Clone)]
pub struct GpxDocument {
    pub gpx: Gpx,
    pub point_times: Vec<Option<String>>,
}

pub fn is_gpx_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("gpx"))
}

pub fn read_gpx_file(path: &Path) -> TrackResult<GpxDocument> {
    if !is_gpx_path(path) {
        return Err(TrackError::UnsupportedExtension(path.to_path_buf()));
    }
    let bytes = fs::read(path).map_err(|e| TrackError::io(path, e))?;
    debug!(path = %path.display(), bytes = bytes.len(), "read GPX file");
    read_gpx_bytes(&bytes)
}

pub fn read_gpx_str(content: &str) -> TrackResult<GpxDocument> {
    read_gpx_bytes(content.as_bytes())
}

/// Parse the bytes as they are; only a failed parse decodes them to text for
/// the repair pass.
pub fn read_gpx_bytes(bytes: &[u8]) -> TrackResult<GpxDocument> {
    let first_error = match gpx::read(Cursor::new(bytes)) {
        Ok(gpx) => return document(gpx, bytes),
        Err(e) => e.to_string(),
    };
    warn!("standard GPX parsing failed: {}", first_error);

    let content = String::from_utf8_lossy(bytes);
    let repaired = apply_minimal_repairs(&content);
    if repaired.as_bytes() == bytes {
        return Err(TrackError::Gpx(first_error));
    }

    match gpx::read(Cursor::new(repaired.as_bytes())) {
        Ok(gpx) => {
            info!("GPX parsed after minimal repairs");
            document(gpx, repaired.as_bytes())
        }
        Err(e) => Err(TrackError::Gpx(format!(
            "{} (after repair: {})",
            first_error, e
        ))),
    }
}

fn document(gpx: Gpx, bytes: &[u8]) -> TrackResult<GpxDocument> {
    let point_times = scan_point_times(bytes)?;
    Ok(GpxDocument { gpx, point_times })
}

/// Raw text of the `<time>` child of each `<trkpt>`. Times nested deeper in a
/// point (extensions) are ignored.
fn scan_point_times(bytes: &[u8]) -> TrackResult<Vec<Option<String>>> {
    let mut reader = Reader::from_reader(bytes);
    let mut times: Vec<Option<String>> = Vec::new();
    // element depth below the open <trkpt>, if inside one
    let mut point_depth: Option<usize> = None;
    let mut in_time = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match point_depth {
                None => {
                    if e.local_name().as_ref() == b"trkpt" {
                        times.push(None);
                        point_depth = Some(0);
                    }
                }
                Some(depth) => {
                    in_time = depth == 0 && e.local_name().as_ref() == b"time";
                    point_depth = Some(depth + 1);
                }
            },
            Event::Empty(e) => {
                if point_depth.is_none() && e.local_name().as_ref() == b"trkpt" {
                    times.push(None);
                }
            }
            Event::Text(e) if in_time => {
                let text = String::from_utf8_lossy(e.as_ref());
                if let Some(slot) = times.last_mut() {
                    slot.get_or_insert_with(String::new).push_str(text.trim());
                }
            }
            Event::End(_) => {
                in_time = false;
                point_depth = match point_depth {
                    Some(0) | None => None,
                    Some(depth) => Some(depth - 1),
                };
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(times)
}

fn apply_minimal_repairs(content: &str) -> String {
    let mut repaired = remove_invalid_xml_chars(content.trim());

    if !repaired.starts_with("<?xml") {
        repaired = format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}", repaired);
    }

    close_truncated_tags(&repaired)
}

fn close_truncated_tags(content: &str) -> String {
    let mut repaired = content.to_string();
    if repaired.ends_with("</gpx>") || !repaired.contains("<gpx") {
        return repaired;
    }

    // a file cut off mid-point cannot be closed safely; drop the partial fix
    let open_trkpt = repaired.matches("<trkpt").count();
    let close_trkpt = repaired.matches("</trkpt>").count() + self_closing_points(&repaired);
    if open_trkpt > close_trkpt {
        if let Some(start) = repaired.rfind("<trkpt") {
            repaired.truncate(start);
        }
    }

    let open_trkseg = repaired.matches("<trkseg>").count();
    let close_trkseg = repaired.matches("</trkseg>").count();
    for _ in close_trkseg..open_trkseg {
        repaired.push_str("\n</trkseg>");
    }

    let open_trk = repaired.matches("<trk>").count();
    let close_trk = repaired.matches("</trk>").count();
    for _ in close_trk..open_trk {
        repaired.push_str("\n</trk>");
    }

    repaired.push_str("\n</gpx>");
    repaired
}

/// Number of `<trkpt .../>` elements. Other self-closing tags do not count.
fn self_closing_points(content: &str) -> usize {
    content
        .match_indices("<trkpt")
        .filter(|(start, _)| {
            let tag = &content[*start..];
            tag.find('>').map_or(false, |end| tag[..end].ends_with('/'))
        })
        .count()
}

fn remove_invalid_xml_chars(content: &str) -> String {
    content
        .chars()
        .filter(|&c| {
            matches!(c, '\t' | '\n' | '\r')
                || ('\u{20}'..='\u{D7FF}').contains(&c)
                || ('\u{E000}'..='\u{FFFD}').contains(&c)
                || ('\u{10000}'..='\u{10FFFF}').contains(&c)
        })
        .collect()
}

/// Expand files and directories into the list of GPX files to analyze, in a
/// stable order. Directories are walked recursively; explicit file arguments
/// are kept whatever their extension so that the reader can reject them.
pub fn collect_gpx_files(inputs: &[PathBuf]) -> TrackResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            for entry in WalkDir::new(input).sort_by_file_name() {
                let entry = entry.map_err(|e| {
                    let path = e.path().unwrap_or(input.as_path()).to_path_buf();
                    TrackError::io(path, e.into())
                })?;
                if entry.file_type().is_file() && is_gpx_path(entry.path()) {
                    files.push(entry.into_path());
                }
            }
        } else {
            files.push(input.clone());
        }
    }
    Ok(files)
}
