use std::collections::{BTreeMap, BTreeSet};

use crate::store::GeometryStore;
use crate::unit::CommuneKey;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedCommune {
    pub key: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartmentEntry {
    pub key: String,
    pub display_name: String,
    /// Member communes sorted by display name (ties broken by key).
    pub communes: Vec<IndexedCommune>,
}

impl DepartmentEntry {
    pub fn contains(&self, commune_key: &str) -> bool {
        self.communes.iter().any(|c| c.key == commune_key)
    }
}

/// Department → member commune mapping derived from a [`GeometryStore`].
///
/// Ordering contract:
/// - `departments()` yields departments by display name, then key.
/// - Communes inside a department are sorted by display name, then key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HierarchyIndex {
    departments: BTreeMap<String, DepartmentEntry>,
    display_order: Vec<String>,
    commune_departments: BTreeMap<String, Vec<String>>,
}

impl HierarchyIndex {
    pub fn build(store: &GeometryStore) -> Self {
        let mut departments: BTreeMap<String, DepartmentEntry> = BTreeMap::new();
        let mut commune_departments: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for commune in store.communes() {
            let dept_key = &commune.parent_department_key;
            let entry = departments
                .entry(dept_key.clone())
                .or_insert_with(|| DepartmentEntry {
                    key: dept_key.clone(),
                    display_name: store
                        .department_display_name(dept_key)
                        .unwrap_or(dept_key)
                        .to_string(),
                    communes: Vec::new(),
                });
            entry.communes.push(IndexedCommune {
                key: commune.key.clone(),
                display_name: commune.display_name.clone(),
            });
            // Store iteration is grouped by department, so each list stays
            // sorted and free of duplicates.
            commune_departments
                .entry(commune.key.clone())
                .or_default()
                .push(dept_key.clone());
        }

        for entry in departments.values_mut() {
            entry.communes.sort_by(|a, b| {
                a.display_name
                    .cmp(&b.display_name)
                    .then_with(|| a.key.cmp(&b.key))
            });
        }

        let mut display_order: Vec<&DepartmentEntry> = departments.values().collect();
        display_order.sort_by(|a, b| {
            a.display_name
                .cmp(&b.display_name)
                .then_with(|| a.key.cmp(&b.key))
        });
        let display_order = display_order.into_iter().map(|d| d.key.clone()).collect();

        Self {
            departments,
            display_order,
            commune_departments,
        }
    }

    /// Number of departments.
    pub fn len(&self) -> usize {
        self.departments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.departments.is_empty()
    }

    pub fn commune_count(&self) -> usize {
        self.departments.values().map(|d| d.communes.len()).sum()
    }

    /// Departments in display order.
    pub fn departments(&self) -> impl Iterator<Item = &DepartmentEntry> {
        self.display_order
            .iter()
            .filter_map(|key| self.departments.get(key))
    }

    pub fn department(&self, department_key: &str) -> Option<&DepartmentEntry> {
        self.departments.get(department_key)
    }

    pub fn communes_of(&self, department_key: &str) -> Option<&[IndexedCommune]> {
        self.departments
            .get(department_key)
            .map(|d| d.communes.as_slice())
    }

    pub fn contains_department(&self, department_key: &str) -> bool {
        self.departments.contains_key(department_key)
    }

    /// True if any department has a commune with this key.
    pub fn contains_commune(&self, commune_key: &str) -> bool {
        self.commune_departments.contains_key(commune_key)
    }

    /// Departments that contain a commune with this key, sorted by key.
    pub fn departments_of_commune(&self, commune_key: &str) -> &[String] {
        self.commune_departments
            .get(commune_key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every commune, departments in display order, communes in index order.
    pub fn all_commune_keys(&self) -> Vec<CommuneKey> {
        self.departments()
            .flat_map(|d| {
                d.communes
                    .iter()
                    .map(move |c| CommuneKey::new(d.key.clone(), c.key.clone()))
            })
            .collect()
    }

    /// Sorted, de-duplicated display names of the communes in the given
    /// departments. Unknown department keys contribute nothing.
    pub fn commune_options<S: AsRef<str>>(&self, department_keys: &[S]) -> Vec<String> {
        let names: BTreeSet<&str> = department_keys
            .iter()
            .filter_map(|k| self.departments.get(k.as_ref()))
            .flat_map(|d| d.communes.iter().map(|c| c.display_name.as_str()))
            .collect();
        names.into_iter().map(str::to_string).collect()
    }
}
