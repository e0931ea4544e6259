use std::borrow::Cow;

use foundation::math::Vec2;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Property keys tried, in order, for a feature's display name.
pub const NAME_KEYS: [&str; 4] = ["name", "name_ko", "CTP_KOR_NM", "SIG_KOR_NM"];

/// Polygonal geometry of one administrative boundary.
///
/// Rings are `(lon, lat)` vertex lists exactly as they appear in the source;
/// the first ring of each polygon is the outer ring, the rest are holes.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryGeometry {
    Polygon(Vec<Vec<Vec2>>),
    MultiPolygon(Vec<Vec<Vec<Vec2>>>),
}

impl BoundaryGeometry {
    /// Outer ring of every polygon part. Holes are dropped.
    pub fn outer_rings(&self) -> Vec<Vec<Vec2>> {
        match self {
            BoundaryGeometry::Polygon(rings) => rings.first().cloned().into_iter().collect(),
            BoundaryGeometry::MultiPolygon(polys) => {
                polys.iter().filter_map(|rings| rings.first().cloned()).collect()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryFeature {
    pub id: Option<String>,
    pub properties: Map<String, Value>,
    pub geometry: BoundaryGeometry,
}

impl BoundaryFeature {
    /// A property as text; numbers are rendered, everything else is `None`.
    pub fn property_text(&self, key: &str) -> Option<Cow<'_, str>> {
        match self.properties.get(key)? {
            Value::String(s) => Some(Cow::Borrowed(s.as_str())),
            Value::Number(n) => Some(Cow::Owned(n.to_string())),
            _ => None,
        }
    }

    /// First non-empty value among [`NAME_KEYS`].
    pub fn display_name(&self) -> Option<&str> {
        NAME_KEYS.iter().find_map(|key| {
            self.properties
                .get(*key)
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
        })
    }
}

/// Caller-supplied predicate deciding which features of a collection to keep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureFilter {
    /// Keep features whose `field` property starts with `prefix`.
    CodePrefix { field: String, prefix: String },
}

impl FeatureFilter {
    pub fn code_prefix(field: impl Into<String>, prefix: impl Into<String>) -> Self {
        FeatureFilter::CodePrefix {
            field: field.into(),
            prefix: prefix.into(),
        }
    }

    pub fn matches(&self, feature: &BoundaryFeature) -> bool {
        match self {
            FeatureFilter::CodePrefix { field, prefix } => feature
                .property_text(field)
                .is_some_and(|code| code.starts_with(prefix.as_str())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoundaryCollection {
    pub features: Vec<BoundaryFeature>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryError {
    Json(String),
    NotAFeatureCollection,
    InvalidFeature { index: usize, reason: String },
}

impl std::fmt::Display for BoundaryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoundaryError::Json(msg) => write!(f, "JSON parse error: {msg}"),
            BoundaryError::NotAFeatureCollection => {
                write!(f, "expected GeoJSON FeatureCollection")
            }
            BoundaryError::InvalidFeature { index, reason } => {
                write!(f, "invalid feature at index {index}: {reason}")
            }
        }
    }
}

impl std::error::Error for BoundaryError {}

impl BoundaryCollection {
    pub fn from_geojson_str(payload: &str) -> Result<Self, BoundaryError> {
        let value: Value =
            serde_json::from_str(payload).map_err(|e| BoundaryError::Json(e.to_string()))?;
        Self::from_geojson_value(&value)
    }

    /// Parse a FeatureCollection, keeping only Polygon and MultiPolygon features.
    ///
    /// Features with other geometry types (or a null geometry) are skipped;
    /// malformed polygon coordinates are an error.
    pub fn from_geojson_value(value: &Value) -> Result<Self, BoundaryError> {
        let obj = value
            .as_object()
            .ok_or(BoundaryError::NotAFeatureCollection)?;
        let ty = obj
            .get("type")
            .and_then(|v| v.as_str())
            .ok_or(BoundaryError::NotAFeatureCollection)?;
        if ty != "FeatureCollection" {
            return Err(BoundaryError::NotAFeatureCollection);
        }

        let features_val = obj
            .get("features")
            .and_then(|v| v.as_array())
            .ok_or(BoundaryError::NotAFeatureCollection)?;

        let mut features = Vec::with_capacity(features_val.len());
        for (index, feat_val) in features_val.iter().enumerate() {
            let feat_obj = feat_val
                .as_object()
                .ok_or(BoundaryError::InvalidFeature {
                    index,
                    reason: "feature must be an object".to_string(),
                })?;

            let id = match feat_obj.get("id") {
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            };

            let properties = feat_obj
                .get("properties")
                .and_then(|v| v.as_object())
                .cloned()
                .unwrap_or_default();

            let Some(geometry_val) = feat_obj.get("geometry").filter(|g| !g.is_null()) else {
                warn!(index, "skipping feature without geometry");
                continue;
            };
            let geometry = match parse_geometry(geometry_val)
                .map_err(|reason| BoundaryError::InvalidFeature { index, reason })?
            {
                Some(g) => g,
                None => {
                    warn!(index, "skipping non-polygonal feature");
                    continue;
                }
            };

            features.push(BoundaryFeature {
                id,
                properties,
                geometry,
            });
        }

        Ok(Self { features })
    }

    /// Drop every feature the filter rejects.
    pub fn retain_matching(&mut self, filter: &FeatureFilter) {
        self.features.retain(|f| filter.matches(f));
    }
}

/// `Ok(None)` for well-formed geometries that are not polygonal.
fn parse_geometry(value: &Value) -> Result<Option<BoundaryGeometry>, String> {
    let obj = value
        .as_object()
        .ok_or("geometry must be an object".to_string())?;
    let ty = obj
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or("geometry missing type".to_string())?;

    match ty {
        "Polygon" | "MultiPolygon" => {}
        _ => return Ok(None),
    }

    let coords = obj
        .get("coordinates")
        .ok_or("geometry missing coordinates".to_string())?;

    if ty == "Polygon" {
        Ok(Some(BoundaryGeometry::Polygon(parse_polygon(coords)?)))
    } else {
        Ok(Some(BoundaryGeometry::MultiPolygon(parse_multi_polygon(
            coords,
        )?)))
    }
}

fn parse_point(coords: &Value) -> Result<Vec2, String> {
    let arr = coords
        .as_array()
        .ok_or("position must be an array".to_string())?;
    if arr.len() < 2 {
        return Err("position must have [lon, lat]".to_string());
    }
    let lon = arr[0].as_f64().ok_or("lon must be a number".to_string())?;
    let lat = arr[1].as_f64().ok_or("lat must be a number".to_string())?;
    Ok(Vec2::new(lon, lat))
}

fn parse_ring(coords: &Value) -> Result<Vec<Vec2>, String> {
    let arr = coords
        .as_array()
        .ok_or("ring must be an array".to_string())?;
    let mut out = Vec::with_capacity(arr.len());
    for item in arr {
        out.push(parse_point(item)?);
    }
    Ok(out)
}

fn parse_polygon(coords: &Value) -> Result<Vec<Vec<Vec2>>, String> {
    let rings = coords
        .as_array()
        .ok_or("Polygon coordinates must be an array of rings".to_string())?;
    let mut out = Vec::with_capacity(rings.len());
    for ring in rings {
        out.push(parse_ring(ring)?);
    }
    Ok(out)
}

fn parse_multi_polygon(coords: &Value) -> Result<Vec<Vec<Vec<Vec2>>>, String> {
    let polys = coords
        .as_array()
        .ok_or("MultiPolygon coordinates must be an array of polygons".to_string())?;
    let mut out = Vec::with_capacity(polys.len());
    for poly in polys {
        out.push(parse_polygon(poly)?);
    }
    Ok(out)
}
