use std::collections::BTreeSet;

use geo::{Geometry, LineString, MultiPolygon};
use geojson::GeoJson;
use serde_json::{Map, Value};
use tracing::warn;

/// One boundary record: attribute columns plus an areal geometry.
///
/// Polygon features are normalized to single-part multipolygons so every
/// downstream stage handles one geometry type.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryFeature {
    pub properties: Map<String, Value>,
    pub geometry: MultiPolygon<f64>,
}

impl BoundaryFeature {
    /// Attribute value as display text. Numbers and booleans are stringified;
    /// null, missing and non-scalar values yield `None`.
    pub fn attribute(&self, column: &str) -> Option<String> {
        match self.properties.get(column)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoundaryCollection {
    pub features: Vec<BoundaryFeature>,
}

#[derive(Debug)]
pub enum BoundaryFileError {
    /// The payload is not valid JSON.
    Json(String),
    NotAFeatureCollection,
    /// Valid JSON that the GeoJSON reader rejects as a whole.
    GeoJson(String),
    InvalidFeature { index: usize, reason: String },
}

impl std::fmt::Display for BoundaryFileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoundaryFileError::Json(msg) => write!(f, "malformed JSON: {msg}"),
            BoundaryFileError::NotAFeatureCollection => {
                write!(f, "expected GeoJSON FeatureCollection")
            }
            BoundaryFileError::GeoJson(msg) => write!(f, "malformed GeoJSON: {msg}"),
            BoundaryFileError::InvalidFeature { index, reason } => {
                write!(f, "invalid feature at index {index}: {reason}")
            }
        }
    }
}

impl std::error::Error for BoundaryFileError {}

impl BoundaryCollection {
    pub fn from_geojson_str(payload: &str) -> Result<Self, BoundaryFileError> {
        let value: Value =
            serde_json::from_str(payload).map_err(|e| BoundaryFileError::Json(e.to_string()))?;
        Self::from_geojson_value(value)
    }

    /// Reads a FeatureCollection of Polygon/MultiPolygon features.
    ///
    /// Features with a null geometry are skipped with a warning; any other
    /// geometry type is an error.
    pub fn from_geojson_value(value: Value) -> Result<Self, BoundaryFileError> {
        if value.get("type").and_then(Value::as_str) != Some("FeatureCollection") {
            return Err(BoundaryFileError::NotAFeatureCollection);
        }
        let GeoJson::FeatureCollection(collection) = GeoJson::from_json_value(value)
            .map_err(|e| BoundaryFileError::GeoJson(e.to_string()))?
        else {
            return Err(BoundaryFileError::NotAFeatureCollection);
        };

        let mut features = Vec::with_capacity(collection.features.len());
        for (index, feature) in collection.features.into_iter().enumerate() {
            let Some(geometry) = feature.geometry else {
                warn!(index, "skipping boundary feature with null geometry");
                continue;
            };
            let geometry = areal_geometry(geometry)
                .map_err(|reason| BoundaryFileError::InvalidFeature { index, reason })?;
            features.push(BoundaryFeature {
                properties: feature.properties.unwrap_or_default(),
                geometry,
            });
        }

        Ok(Self { features })
    }

    /// Every attribute name used by at least one feature, sorted.
    pub fn columns(&self) -> BTreeSet<String> {
        self.features
            .iter()
            .flat_map(|f| f.properties.keys().cloned())
            .collect()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.features
            .iter()
            .any(|f| f.properties.contains_key(column))
    }
}

/// GeoJSON geometry object for a multipolygon (`[lon, lat]` coordinate order).
pub fn multipolygon_to_geojson_value(mp: &MultiPolygon<f64>) -> Value {
    let mut obj = Map::new();
    obj.insert(
        "type".to_string(),
        Value::String("MultiPolygon".to_string()),
    );
    let coords = mp
        .0
        .iter()
        .map(|poly| {
            let mut rings = Vec::with_capacity(1 + poly.interiors().len());
            rings.push(ring_coords(poly.exterior()));
            rings.extend(poly.interiors().iter().map(ring_coords));
            Value::Array(rings)
        })
        .collect();
    obj.insert("coordinates".to_string(), Value::Array(coords));
    Value::Object(obj)
}

fn ring_coords(ring: &LineString<f64>) -> Value {
    Value::Array(
        ring.0
            .iter()
            .map(|c| Value::Array(vec![Value::from(c.x), Value::from(c.y)]))
            .collect(),
    )
}

fn areal_geometry(geometry: geojson::Geometry) -> Result<MultiPolygon<f64>, String> {
    match Geometry::<f64>::try_from(geometry.value).map_err(|e| e.to_string())? {
        Geometry::Polygon(polygon) => Ok(polygon.into()),
        Geometry::MultiPolygon(multi) => Ok(multi),
        other => Err(format!(
            "unsupported boundary geometry type: {}",
            geometry_type_name(&other)
        )),
    }
}

fn geometry_type_name(geometry: &Geometry<f64>) -> &'static str {
    #[allow(unreachable_patterns)]
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::{BoundaryCollection, BoundaryFileError, multipolygon_to_geojson_value};
    use serde_json::json;

    fn square_feature(dept: &str, commune: &str, x0: f64) -> serde_json::Value {
        json!({
            "type": "Feature",
            "properties": { "ADM2_EN": dept, "ADM3_EN": commune, "POP": 1200 },
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[x0, 0.0], [x0 + 1.0, 0.0], [x0 + 1.0, 1.0], [x0, 1.0], [x0, 0.0]]]
            }
        })
    }

    #[test]
    fn parses_polygons_as_multipolygons() {
        let payload = json!({
            "type": "FeatureCollection",
            "features": [
                square_feature("Aïoun", "Beneamane", 0.0),
                square_feature("Aïoun", "Egjert", 1.0)
            ]
        });
        let coll = BoundaryCollection::from_geojson_value(payload).expect("parse");
        assert_eq!(coll.features.len(), 2);
        assert_eq!(coll.features[0].geometry.0.len(), 1);
        assert_eq!(coll.features[1].attribute("ADM3_EN").as_deref(), Some("Egjert"));
        assert_eq!(coll.features[1].attribute("POP").as_deref(), Some("1200"));
        assert_eq!(coll.features[1].attribute("MISSING"), None);
        assert!(coll.has_column("ADM2_EN"));
        assert!(!coll.has_column("ADM2_FR"));
        assert_eq!(
            coll.columns().into_iter().collect::<Vec<_>>(),
            vec!["ADM2_EN", "ADM3_EN", "POP"]
        );
    }

    #[test]
    fn rejects_non_collections_and_point_features() {
        let err = BoundaryCollection::from_geojson_str(r#"{"type":"Feature"}"#).unwrap_err();
        assert!(matches!(err, BoundaryFileError::NotAFeatureCollection));

        let payload = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {},
                "geometry": { "type": "Point", "coordinates": [1.0, 2.0] }
            }]
        });
        let err = BoundaryCollection::from_geojson_value(payload).unwrap_err();
        match err {
            BoundaryFileError::InvalidFeature { index, reason } => {
                assert_eq!(index, 0);
                assert!(reason.contains("Point"), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn malformed_json_is_not_blamed_on_a_feature() {
        let err = BoundaryCollection::from_geojson_str("{\"type\": \"FeatureCollection\",")
            .expect_err("truncated");
        assert!(matches!(err, BoundaryFileError::Json(_)), "{err}");
        assert!(err.to_string().starts_with("malformed JSON"), "{err}");
    }

    #[test]
    fn null_geometries_are_skipped() {
        let payload = json!({
            "type": "FeatureCollection",
            "features": [
                square_feature("A", "c1", 0.0),
                {
                    "type": "Feature",
                    "properties": { "ADM2_EN": "A", "ADM3_EN": "c2" },
                    "geometry": null
                },
                square_feature("A", "c3", 2.0)
            ]
        });
        let coll = BoundaryCollection::from_geojson_value(payload).expect("parse");
        let names: Vec<_> = coll
            .features
            .iter()
            .filter_map(|f| f.attribute("ADM3_EN"))
            .collect();
        assert_eq!(names, vec!["c1", "c3"]);
    }

    #[test]
    fn writes_multipolygon_geometry() {
        let payload = json!({
            "type": "FeatureCollection",
            "features": [square_feature("A", "c1", 0.0)]
        });
        let coll = BoundaryCollection::from_geojson_value(payload).expect("parse");
        let value = multipolygon_to_geojson_value(&coll.features[0].geometry);
        assert_eq!(value["type"], "MultiPolygon");
        assert_eq!(value["coordinates"][0][0][0], json!([0.0, 0.0]));
        assert_eq!(value["coordinates"][0][0].as_array().map(|r| r.len()), Some(5));
    }
}
