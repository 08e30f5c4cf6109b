//! Speed-colored track map: a GeoJSON collection with one two-point line per
//! consecutive pair of fixes in the same segment, and a standalone Leaflet
//! page that displays it.

use geojson::{Feature, FeatureCollection, Geometry, Value};
use serde_json::{json, Map, Value as JsonValue};

use crate::config::RenderConfig;
use crate::enricher::EnrichedPoint;

/// Color for run pairs whose speed could not be derived.
pub const NO_SPEED_COLOR: &str = "#000000";

/// Diverging blue -> light grey -> red ramp.
const COOLWARM: [(f64, [u8; 3]); 5] = [
    (0.00, [59, 76, 192]),
    (0.25, [141, 176, 254]),
    (0.50, [221, 221, 221]),
    (0.75, [244, 154, 123]),
    (1.00, [180, 4, 38]),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedRange {
    pub min: f64,
    pub max: f64,
}

impl SpeedRange {
    /// Position of `speed` on the scale in [0, 1]. A degenerate range maps
    /// everything to the low end.
    pub fn normalize(&self, speed: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return 0.0;
        }
        ((speed - self.min) / span).clamp(0.0, 1.0)
    }
}

/// Range over every defined speed in the table, lifts included.
pub fn speed_range(points: &[EnrichedPoint]) -> Option<SpeedRange> {
    points
        .iter()
        .filter_map(|p| p.speed_mps)
        .fold(None, |range, s| match range {
            None => Some(SpeedRange { min: s, max: s }),
            Some(r) => Some(SpeedRange {
                min: r.min.min(s),
                max: r.max.max(s),
            }),
        })
}

pub fn coolwarm(t: f64) -> [u8; 3] {
    let t = t.clamp(0.0, 1.0);
    for pair in COOLWARM.windows(2) {
        let (t0, c0) = pair[0];
        let (t1, c1) = pair[1];
        if t <= t1 {
            let f = (t - t0) / (t1 - t0);
            let mut out = [0u8; 3];
            for k in 0..3 {
                let v = c0[k] as f64 + (c1[k] as f64 - c0[k] as f64) * f;
                out[k] = v.round() as u8;
            }
            return out;
        }
    }
    COOLWARM[COOLWARM.len() - 1].1
}

pub fn to_hex(rgb: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2])
}

pub fn speed_color(speed: Option<f64>, range: Option<SpeedRange>) -> String {
    match (speed, range) {
        (Some(s), Some(r)) => to_hex(coolwarm(r.normalize(s))),
        _ => NO_SPEED_COLOR.to_string(),
    }
}

pub fn speed_map(points: &[EnrichedPoint], render: &RenderConfig) -> FeatureCollection {
    let range = speed_range(points);
    let features = points
        .windows(2)
        .filter(|pair| pair[0].segment_id() == pair[1].segment_id())
        .map(|pair| pair_feature(&pair[0], &pair[1], range, render))
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

fn pair_feature(
    from: &EnrichedPoint,
    to: &EnrichedPoint,
    range: Option<SpeedRange>,
    render: &RenderConfig,
) -> Feature {
    let coords = vec![
        vec![from.point.longitude, from.point.latitude],
        vec![to.point.longitude, to.point.latitude],
    ];
    let color = if to.is_lift {
        render.lift_color.clone()
    } else {
        speed_color(to.speed_mps, range)
    };

    let mut props = Map::new();
    props.insert("segment_id".to_string(), json!(to.segment_id()));
    props.insert("is_lift".to_string(), JsonValue::Bool(to.is_lift));
    props.insert(
        "speed_mps".to_string(),
        to.speed_mps.map_or(JsonValue::Null, |s| json!(s)),
    );
    props.insert("stroke".to_string(), JsonValue::String(color));
    props.insert("stroke-width".to_string(), json!(render.line_weight));

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::LineString(coords))),
        id: None,
        properties: Some(props),
        foreign_members: None,
    }
}

/// Mean position of all fixes.
pub fn map_center(points: &[EnrichedPoint]) -> Option<(f64, f64)> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let lat = points.iter().map(|p| p.point.latitude).sum::<f64>() / n;
    let lon = points.iter().map(|p| p.point.longitude).sum::<f64>() / n;
    Some((lat, lon))
}

pub fn render_map_html(
    points: &[EnrichedPoint],
    collection: &FeatureCollection,
    render: &RenderConfig,
) -> String {
    let ((lat, lon), zoom) = match map_center(points) {
        Some(center) => (center, render.map_zoom),
        None => ((0.0, 0.0), 2),
    };
    let legend = match speed_range(points) {
        Some(r) => format!(
            "<div class=\"legend\"><b>Speed (m/s)</b><div class=\"ramp\"></div>\
             <span>{:.1}</span><span style=\"float:right\">{:.1}</span></div>",
            r.min, r.max
        ),
        None => "<div class=\"legend\"><b>No speed data</b></div>".to_string(),
    };
    let ramp: Vec<String> = COOLWARM.iter().map(|(_, c)| to_hex(*c)).collect();

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Ski track</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<style>
html, body, #map {{ height: 100%; margin: 0; }}
.legend {{ position: absolute; bottom: 20px; right: 20px; z-index: 1000; background: white; padding: 6px 10px; width: 180px; font: 12px sans-serif; }}
.ramp {{ height: 10px; margin: 4px 0; background: linear-gradient(to right, {ramp}); }}
</style>
</head>
<body>
<div id="map"></div>
{legend}
<script>
var map = L.map('map').setView([{lat:.6}, {lon:.6}], {zoom});
L.tileLayer('https://{{s}}.tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png', {{
  maxZoom: 19,
  attribution: '&copy; OpenStreetMap contributors'
}}).addTo(map);
var track = {geojson};
L.geoJSON(track, {{
  style: function (f) {{ return {{ color: f.properties.stroke, weight: f.properties['stroke-width'] }}; }}
}}).addTo(map);
</script>
</body>
</html>
"#,
        ramp = ramp.join(", "),
        legend = legend,
        lat = lat,
        lon = lon,
        zoom = zoom,
        geojson = collection,
    )
}
