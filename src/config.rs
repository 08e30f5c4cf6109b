//! Analysis and rendering settings.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{TrackError, TrackResult};

/// Which surface distance formula the enricher uses between consecutive fixes.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DistanceModel {
    /// Karney geodesic on the WGS84 ellipsoid.
    #[default]
    Geodesic,
    /// Great-circle distance on a sphere of mean Earth radius.
    Haversine,
}

/// What speed a point gets when its timestamp equals its predecessor's.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ZeroDurationPolicy {
    /// Speed is left undefined, like a missing timestamp.
    #[default]
    Undefined,
    /// Speed is reported as 0 m/s.
    Zero,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub distance_model: DistanceModel,
    pub zero_duration: ZeroDurationPolicy,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    pub map_zoom: u8,
    pub line_weight: u32,
    pub lift_color: String,
    pub chart_width: u32,
    pub chart_height: u32,
    pub write_map: bool,
    pub write_charts: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            map_zoom: 16,
            line_weight: 4,
            lift_color: "#808080".to_string(),
            chart_width: 1280,
            chart_height: 720,
            write_map: true,
            write_charts: true,
        }
    }
}

/// Everything a single run of the tool needs, as read from a JSON config file.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub pipeline: PipelineConfig,
    pub render: RenderConfig,
}

/// Load a JSON config file. Missing keys fall back to their defaults.
pub fn load_config(path: &Path) -> TrackResult<AnalyzerConfig> {
    let text = fs::read_to_string(path).map_err(|e| TrackError::io(path, e))?;
    let config = serde_json::from_str(&text)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.pipeline.distance_model, DistanceModel::Geodesic);
        assert_eq!(config.pipeline.zero_duration, ZeroDurationPolicy::Undefined);
        assert_eq!(config.render.map_zoom, 16);
        assert_eq!(config.render.lift_color, "#808080");
    }

    #[test]
    fn test_enum_defaults() {
        assert_eq!(DistanceModel::default(), DistanceModel::Geodesic);
        assert_eq!(ZeroDurationPolicy::default(), ZeroDurationPolicy::Undefined);
        assert_eq!(
            serde_json::to_string(&PipelineConfig::default()).unwrap(),
            r#"{"distance_model":"geodesic","zero_duration":"undefined"}"#
        );
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: AnalyzerConfig =
            serde_json::from_str(r#"{"pipeline": {"zero_duration": "zero"}, "render": {"write_map": false}}"#)
                .unwrap();
        assert_eq!(config.pipeline.zero_duration, ZeroDurationPolicy::Zero);
        assert_eq!(config.pipeline.distance_model, DistanceModel::Geodesic);
        assert!(!config.render.write_map);
        assert!(config.render.write_charts);
        assert_eq!(config.render.chart_width, 1280);
    }

    #[test]
    fn test_load_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analyzer.json");
        fs::write(&path, r#"{"pipeline": {"distance_model": "haversine"}}"#).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.pipeline.distance_model, DistanceModel::Haversine);
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Path::new("/nonexistent/analyzer.json")).unwrap_err();
        assert!(matches!(err, TrackError::Io { .. }));
    }
}
