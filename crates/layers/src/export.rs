use formats::multipolygon_to_geojson_value;
use serde_json::{Map, Value, json};

use crate::compiler::CompiledMap;
use crate::labels::LabelAnchor;
use crate::layer::Layer;

/// Initial map viewport.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MapView {
    /// `[lat, lon]`
    pub center: [f64; 2],
    pub zoom: u8,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center: [20.0, -10.0],
            zoom: 6,
        }
    }
}

impl CompiledMap {
    /// Renderer-neutral JSON document.
    ///
    /// Layers become GeoJSON features in draw order; labels keep `[lat, lon]`
    /// order like the viewport center.
    pub fn to_geojson_value(&self, view: &MapView) -> Value {
        let mut doc = Map::new();
        doc.insert("center".to_string(), json!(view.center));
        doc.insert("zoom".to_string(), Value::from(view.zoom));
        doc.insert(
            "layers".to_string(),
            Value::Array(self.layers.iter().map(layer_feature).collect()),
        );
        doc.insert(
            "labels".to_string(),
            Value::Array(self.labels.iter().map(label_value).collect()),
        );
        Value::Object(doc)
    }
}

fn layer_feature(layer: &Layer) -> Value {
    json!({
        "type": "Feature",
        "properties": {
            "name": layer.name,
            "role": layer.role,
            "department": layer.department,
            "units": layer.units,
            "zOrder": layer.z_order,
            "style": layer.style.to_style_value(),
        },
        "geometry": multipolygon_to_geojson_value(&layer.geometry),
    })
}

fn label_value(label: &LabelAnchor) -> Value {
    json!({
        "text": label.text,
        "kind": label.kind,
        "position": [label.position.lat, label.position.lon],
        "style": label.style.to_style_value(),
    })
}

#[cfg(test)]
mod tests {
    use super::MapView;
    use crate::compiler::CompiledMap;
    use crate::labels::{LabelAnchor, LabelKind, LatLon};
    use crate::layer::{Layer, LayerRole};
    use crate::symbology::Symbology;
    use geo::{MultiPolygon, polygon};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample_map() -> CompiledMap {
        let symbology = Symbology::default();
        let triangle = MultiPolygon::new(vec![polygon![
            (x: -10.0, y: 16.0),
            (x: -9.0, y: 16.0),
            (x: -9.0, y: 17.0),
            (x: -10.0, y: 16.0),
        ]]);
        CompiledMap {
            layers: vec![
                Layer {
                    name: "All Communes".to_string(),
                    role: LayerRole::Base,
                    department: None,
                    units: vec!["Dhar".to_string()],
                    geometry: triangle,
                    style: symbology.base,
                    z_order: 0,
                },
                Layer {
                    name: "Bassiknou: selected communes".to_string(),
                    role: LayerRole::SelectedCommunes,
                    department: Some("bassiknou".to_string()),
                    units: Vec::new(),
                    geometry: MultiPolygon::new(Vec::new()),
                    style: symbology.selected,
                    z_order: 1,
                },
            ],
            labels: vec![LabelAnchor {
                position: LatLon::new(16.5, -9.5),
                text: "Dhar".to_string(),
                kind: LabelKind::Commune,
                style: symbology.commune_label,
            }],
        }
    }

    #[test]
    fn document_lists_layers_in_draw_order() {
        let doc = sample_map().to_geojson_value(&MapView::default());
        assert_eq!(doc["center"], json!([20.0, -10.0]));
        assert_eq!(doc["zoom"], json!(6));

        let layers = doc["layers"].as_array().expect("layers");
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0]["properties"]["role"], "base");
        assert_eq!(layers[0]["properties"]["department"], json!(null));
        assert_eq!(layers[0]["properties"]["style"]["color"], "#808080");
        assert_eq!(layers[0]["geometry"]["type"], "MultiPolygon");
        assert_eq!(
            layers[0]["geometry"]["coordinates"][0][0][1],
            json!([-9.0, 16.0])
        );

        assert_eq!(layers[1]["properties"]["role"], "selected_communes");
        assert_eq!(layers[1]["properties"]["zOrder"], json!(1));
        assert_eq!(layers[1]["geometry"]["coordinates"], json!([]));
    }

    #[test]
    fn labels_use_lat_lon_order() {
        let view = MapView {
            center: [16.0, -9.5],
            zoom: 7,
        };
        let doc = sample_map().to_geojson_value(&view);
        assert_eq!(doc["center"], json!([16.0, -9.5]));
        assert_eq!(
            doc["labels"],
            json!([{
                "text": "Dhar",
                "kind": "commune",
                "position": [16.5, -9.5],
                "style": { "fontSize": 10.0, "color": "#8b0000" }
            }])
        );
    }
}
