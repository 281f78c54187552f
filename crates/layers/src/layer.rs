use geo::MultiPolygon;
use serde::Serialize;

use crate::symbology::StyleSpec;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerRole {
    Base,
    UnselectedCommunes,
    SelectedCommunes,
    DepartmentOutline,
    Highlight,
}

/// A styled geometry ready for the renderer. Higher `z_order` draws on top.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub name: String,
    pub role: LayerRole,
    /// Department key for per-department layers.
    pub department: Option<String>,
    /// Display names of the units drawn, in draw order.
    pub units: Vec<String>,
    pub geometry: MultiPolygon<f64>,
    pub style: StyleSpec,
    pub z_order: u32,
}

impl Layer {
    pub fn is_empty(&self) -> bool {
        self.geometry.0.is_empty()
    }
}
