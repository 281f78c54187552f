use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use formats::BoundaryCollection;
use foundation::canonical_key;
use geo::{Area, BooleanOps, MultiPolygon, SimplifyVwPreserve};
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::unit::{Commune, CommuneKey, Department};

/// A permanently excluded commune: `(department name, commune name)`.
pub type Exclusion = (String, String);

/// Immutable, keyed view of a boundary dataset.
///
/// Communes are keyed by [`CommuneKey`] in a `BTreeMap`, so every traversal is
/// grouped by department and deterministic. Department geometry is not held
/// here; see [`GeometryStore::dissolve_department`].
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryStore {
    communes: BTreeMap<CommuneKey, Commune>,
    departments: BTreeMap<String, String>,
    source_hash: Option<String>,
    simplify_tolerance: Option<f64>,
}

impl GeometryStore {
    /// Reads a GeoJSON boundary file and builds the store.
    pub fn load(
        path: impl AsRef<Path>,
        adm2_column: &str,
        adm3_column: &str,
        exclusions: &[Exclusion],
        simplify_tolerance: Option<f64>,
    ) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| StoreError::NotFound {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let payload = std::str::from_utf8(&bytes)
            .map_err(|e| StoreError::InvalidDataset(format!("{}: utf8: {e}", path.display())))?;
        let collection = BoundaryCollection::from_geojson_str(payload)
            .map_err(|e| StoreError::InvalidDataset(format!("{}: {e}", path.display())))?;

        let mut store = Self::from_collection(
            &collection,
            adm2_column,
            adm3_column,
            exclusions,
            simplify_tolerance,
        )?;
        store.source_hash = Some(blake3::hash(&bytes).to_hex().to_string());

        debug!(
            path = %path.display(),
            communes = store.len(),
            departments = store.department_count(),
            "loaded boundary dataset"
        );
        Ok(store)
    }

    /// Builds the store from an already parsed collection.
    ///
    /// Exclusions are matched on canonical keys and applied before anything
    /// else sees the data. Features sharing a (department, commune) key are
    /// merged into one multipart commune.
    pub fn from_collection(
        collection: &BoundaryCollection,
        adm2_column: &str,
        adm3_column: &str,
        exclusions: &[Exclusion],
        simplify_tolerance: Option<f64>,
    ) -> Result<Self, StoreError> {
        for column in [adm2_column, adm3_column] {
            if !collection.has_column(column) {
                return Err(StoreError::Schema {
                    column: column.to_string(),
                    available: collection.columns().into_iter().collect(),
                });
            }
        }

        let excluded: BTreeSet<CommuneKey> = exclusions
            .iter()
            .map(|(dept, commune)| CommuneKey::new(canonical_key(dept), canonical_key(commune)))
            .collect();
        let tolerance = simplify_tolerance.filter(|t| t.is_finite() && *t > 0.0);

        let mut communes: BTreeMap<CommuneKey, Commune> = BTreeMap::new();
        let mut departments: BTreeMap<String, String> = BTreeMap::new();
        let mut excluded_count = 0usize;

        for (index, feature) in collection.features.iter().enumerate() {
            let (Some(dept_name), Some(commune_name)) = (
                feature.attribute(adm2_column),
                feature.attribute(adm3_column),
            ) else {
                warn!(index, "skipping boundary feature without department or commune name");
                continue;
            };

            let key = CommuneKey::new(canonical_key(&dept_name), canonical_key(&commune_name));
            if key.department.is_empty() || key.commune.is_empty() {
                warn!(index, "skipping boundary feature with blank department or commune name");
                continue;
            }
            if excluded.contains(&key) {
                excluded_count += 1;
                continue;
            }

            let geometry = match tolerance {
                Some(t) => simplify_preserving_topology(&feature.geometry, t),
                None => feature.geometry.clone(),
            };

            departments
                .entry(key.department.clone())
                .or_insert_with(|| dept_name.clone());

            match communes.entry(key) {
                Entry::Occupied(mut existing) => {
                    existing.get_mut().geometry.0.extend(geometry.0);
                }
                Entry::Vacant(slot) => {
                    let CommuneKey {
                        department,
                        commune,
                    } = slot.key().clone();
                    slot.insert(Commune {
                        key: commune,
                        display_name: commune_name,
                        parent_department_key: department,
                        geometry,
                    });
                }
            }
        }

        if excluded_count > 0 {
            debug!(excluded = excluded_count, "applied exclusion list");
        }

        Ok(Self {
            communes,
            departments,
            source_hash: None,
            simplify_tolerance: tolerance,
        })
    }

    pub fn len(&self) -> usize {
        self.communes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.communes.is_empty()
    }

    pub fn department_count(&self) -> usize {
        self.departments.len()
    }

    /// blake3 hex digest of the source file, when loaded from disk.
    pub fn source_hash(&self) -> Option<&str> {
        self.source_hash.as_deref()
    }

    pub fn simplify_tolerance(&self) -> Option<f64> {
        self.simplify_tolerance
    }

    /// All communes, grouped by department key then commune key.
    pub fn communes(&self) -> impl Iterator<Item = &Commune> {
        self.communes.values()
    }

    pub fn commune(&self, key: &CommuneKey) -> Option<&Commune> {
        self.communes.get(key)
    }

    pub fn communes_in<'a>(&'a self, department_key: &'a str) -> impl Iterator<Item = &'a Commune> {
        self.communes
            .range(CommuneKey::new(department_key, "")..)
            .take_while(move |(k, _)| k.department == department_key)
            .map(|(_, c)| c)
    }

    pub fn department_keys(&self) -> impl Iterator<Item = &str> {
        self.departments.keys().map(String::as_str)
    }

    pub fn department_display_name(&self, department_key: &str) -> Option<&str> {
        self.departments.get(department_key).map(String::as_str)
    }

    /// Dissolves every member commune of a department into one outline.
    pub fn dissolve_department(&self, department_key: &str) -> Option<Department> {
        let display_name = self.departments.get(department_key)?;
        let geometry = dissolve(self.communes_in(department_key).map(|c| &c.geometry));
        Some(Department {
            key: department_key.to_string(),
            display_name: display_name.clone(),
            geometry,
        })
    }
}

/// Geometric union of a set of areal geometries.
pub fn dissolve<'a, I>(geometries: I) -> MultiPolygon<f64>
where
    I: IntoIterator<Item = &'a MultiPolygon<f64>>,
{
    geometries
        .into_iter()
        .fold(None, |acc: Option<MultiPolygon<f64>>, geom| {
            Some(match acc {
                None => geom.clone(),
                Some(merged) => merged.union(geom),
            })
        })
        .unwrap_or_else(|| MultiPolygon::new(Vec::new()))
}

// Visvalingam-Whyatt with the topology-preserving variant. The tolerance is a
// distance, so the effective-area threshold is its square.
fn simplify_preserving_topology(geometry: &MultiPolygon<f64>, tolerance: f64) -> MultiPolygon<f64> {
    let simplified = geometry.simplify_vw_preserve(&(tolerance * tolerance));
    if simplified.0.len() != geometry.0.len() || simplified.unsigned_area() <= 0.0 {
        return geometry.clone();
    }
    simplified
}
