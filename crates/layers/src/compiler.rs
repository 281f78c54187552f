use boundaries::{CommuneKey, GeometryStore, dissolve};
use foundation::math::Projection;
use geo::MultiPolygon;
use selection::ResolvedSelection;
use tracing::{debug, warn};

use crate::labels::{LabelAnchor, LabelAnchorCalculator, LabelKind};
use crate::layer::{Layer, LayerRole};
use crate::symbology::{LabelStyle, StyleSpec, Symbology};

pub const BASE_LAYER_NAME: &str = "All Communes";
pub const HIGHLIGHT_LAYER_NAME: &str = "Selected Communes";

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CompileOptions {
    pub symbology: Symbology,
    /// Projection used for label centroids; `None` uses the native CRS.
    pub label_projection: Option<Projection>,
}

/// Ordered layers and labels for one selection state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledMap {
    pub layers: Vec<Layer>,
    pub labels: Vec<LabelAnchor>,
}

/// Turns a resolved selection into draw-ordered layers.
///
/// Output order:
/// 1. base layer with every commune in `all_communes`
/// 2. per selected department: unselected communes, selected communes,
///    dissolved outline (plus one department label)
/// 3. highlight layer with every selected commune, when there is one
/// 4. one label per highlighted commune
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LayerCompiler {
    options: CompileOptions,
}

impl LayerCompiler {
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn compile(
        &self,
        store: &GeometryStore,
        selection: &ResolvedSelection,
        all_communes: &[CommuneKey],
    ) -> CompiledMap {
        let symbology = self.options.symbology;
        let anchors = LabelAnchorCalculator::new(self.options.label_projection);
        let mut builder = LayerListBuilder::default();

        let (base_units, base_geometry) = collect_communes(store, all_communes.iter().cloned());
        builder.push(
            BASE_LAYER_NAME.to_string(),
            LayerRole::Base,
            None,
            base_units,
            base_geometry,
            symbology.base,
        );

        let mut labels = Vec::new();
        for part in selection.iter() {
            let dept = part.department.as_str();
            let dept_name = store.department_display_name(dept).unwrap_or(dept).to_string();
            let keys_for = |communes: &[String]| -> Vec<CommuneKey> {
                communes
                    .iter()
                    .map(|c| CommuneKey::new(dept, c.as_str()))
                    .collect()
            };

            let (units, geometry) = collect_communes(store, keys_for(&part.unselected_in_dept));
            builder.push(
                format!("{dept_name}: unselected communes"),
                LayerRole::UnselectedCommunes,
                Some(dept),
                units,
                geometry,
                symbology.unselected,
            );

            let (units, geometry) = collect_communes(store, keys_for(&part.selected_in_dept));
            builder.push(
                format!("{dept_name}: selected communes"),
                LayerRole::SelectedCommunes,
                Some(dept),
                units,
                geometry,
                symbology.selected,
            );

            let outline = dissolve(
                part.unselected_in_dept
                    .iter()
                    .chain(part.selected_in_dept.iter())
                    .filter_map(|c| store.commune(&CommuneKey::new(dept, c.as_str())))
                    .map(|c| &c.geometry),
            );
            if let Some(label) = label_for(
                &anchors,
                &outline,
                &dept_name,
                LabelKind::Department,
                symbology.department_label,
            ) {
                labels.push(label);
            }
            builder.push(
                format!("{dept_name}: outline"),
                LayerRole::DepartmentOutline,
                Some(dept),
                vec![dept_name.clone()],
                outline,
                symbology.department_outline,
            );
        }

        let highlighted = selection.highlighted();
        if !highlighted.is_empty() {
            let (units, geometry) = collect_communes(store, highlighted.iter().cloned());
            builder.push(
                HIGHLIGHT_LAYER_NAME.to_string(),
                LayerRole::Highlight,
                None,
                units,
                geometry,
                symbology.highlight,
            );

            for key in &highlighted {
                let Some(commune) = store.commune(key) else {
                    continue;
                };
                if let Some(label) = label_for(
                    &anchors,
                    &commune.geometry,
                    &commune.display_name,
                    LabelKind::Commune,
                    symbology.commune_label,
                ) {
                    labels.push(label);
                }
            }
        }

        let layers = builder.finish();
        debug!(
            layers = layers.len(),
            labels = labels.len(),
            departments = selection.len(),
            "compiled map layers"
        );
        CompiledMap { layers, labels }
    }
}

#[derive(Debug, Default)]
struct LayerListBuilder {
    layers: Vec<Layer>,
}

impl LayerListBuilder {
    fn push(
        &mut self,
        name: String,
        role: LayerRole,
        department: Option<&str>,
        units: Vec<String>,
        geometry: MultiPolygon<f64>,
        style: StyleSpec,
    ) {
        let z_order = self.layers.len() as u32;
        self.layers.push(Layer {
            name,
            role,
            department: department.map(str::to_string),
            units,
            geometry,
            style,
            z_order,
        });
    }

    fn finish(self) -> Vec<Layer> {
        self.layers
    }
}

// Concatenates member polygons without dissolving; unknown keys are skipped.
fn collect_communes<I>(store: &GeometryStore, keys: I) -> (Vec<String>, MultiPolygon<f64>)
where
    I: IntoIterator<Item = CommuneKey>,
{
    let mut units = Vec::new();
    let mut polygons = Vec::new();
    for key in keys {
        if let Some(commune) = store.commune(&key) {
            units.push(commune.display_name.clone());
            polygons.extend(commune.geometry.0.iter().cloned());
        }
    }
    (units, MultiPolygon::new(polygons))
}

fn label_for(
    anchors: &LabelAnchorCalculator,
    geometry: &MultiPolygon<f64>,
    text: &str,
    kind: LabelKind,
    style: LabelStyle,
) -> Option<LabelAnchor> {
    match anchors.anchor_for(geometry) {
        Ok(position) => Some(LabelAnchor {
            position,
            text: text.to_string(),
            kind,
            style,
        }),
        Err(error) => {
            warn!(unit = text, ?kind, %error, "skipping label for invalid geometry");
            None
        }
    }
}
