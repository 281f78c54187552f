use std::collections::BTreeSet;

use boundaries::{CommuneKey, HierarchyIndex};
use foundation::canonical_key;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How selection entries that name no unit in the index are treated.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionPolicy {
    /// Unknown names are dropped without error.
    #[default]
    Permissive,
    /// The first unknown name fails the whole resolution.
    Strict,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitLevel {
    Department,
    Commune,
}

impl std::fmt::Display for UnitLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnitLevel::Department => write!(f, "department"),
            UnitLevel::Commune => write!(f, "commune"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    UnknownKey { level: UnitLevel, key: String },
}

impl std::fmt::Display for SelectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionError::UnknownKey { level, key } => {
                write!(f, "unknown {level} in selection: {key:?}")
            }
        }
    }
}

impl std::error::Error for SelectionError {}

/// Raw selection as gathered by a UI: two ordered name lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub departments: Vec<String>,
    pub communes: Vec<String>,
}

impl Selection {
    pub fn new(departments: Vec<String>, communes: Vec<String>) -> Self {
        Self {
            departments,
            communes,
        }
    }

    pub fn resolve(
        &self,
        index: &HierarchyIndex,
        policy: SelectionPolicy,
    ) -> Result<ResolvedSelection, SelectionError> {
        resolve(&self.departments, &self.communes, index, policy)
    }
}

/// Partition of one selected department's communes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepartmentSelection {
    pub department: String,
    pub selected_in_dept: Vec<String>,
    pub unselected_in_dept: Vec<String>,
}

/// Hierarchy-consistent selection, in department input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedSelection {
    departments: Vec<DepartmentSelection>,
}

impl ResolvedSelection {
    pub fn is_empty(&self) -> bool {
        self.departments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.departments.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DepartmentSelection> {
        self.departments.iter()
    }

    pub fn get(&self, department_key: &str) -> Option<&DepartmentSelection> {
        self.departments
            .iter()
            .find(|d| d.department == department_key)
    }

    /// Every selected commune across departments, in resolution order.
    pub fn highlighted(&self) -> Vec<CommuneKey> {
        self.departments
            .iter()
            .flat_map(|d| {
                d.selected_in_dept
                    .iter()
                    .map(move |c| CommuneKey::new(d.department.clone(), c.clone()))
            })
            .collect()
    }
}

/// Resolves raw department/commune names against the index.
///
/// - Names are canonicalized before lookup; repeated departments keep their
///   first position.
/// - A commune counts as selected only inside selected departments that
///   contain it; selected communes elsewhere are ignored under either policy.
/// - Names absent from the index are dropped (`Permissive`) or reported
///   (`Strict`), departments checked first.
pub fn resolve<D, C>(
    selected_departments: &[D],
    selected_communes: &[C],
    index: &HierarchyIndex,
    policy: SelectionPolicy,
) -> Result<ResolvedSelection, SelectionError>
where
    D: AsRef<str>,
    C: AsRef<str>,
{
    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut department_keys: Vec<String> = Vec::with_capacity(selected_departments.len());
    for name in selected_departments {
        let key = canonical_key(name.as_ref());
        if seen.contains(&key) {
            continue;
        }
        if !index.contains_department(&key) {
            check_unknown(policy, UnitLevel::Department, key)?;
            continue;
        }
        seen.insert(key.clone());
        department_keys.push(key);
    }

    let mut commune_keys: BTreeSet<String> = BTreeSet::new();
    for name in selected_communes {
        let key = canonical_key(name.as_ref());
        if !index.contains_commune(&key) {
            check_unknown(policy, UnitLevel::Commune, key)?;
            continue;
        }
        commune_keys.insert(key);
    }

    let mut departments = Vec::with_capacity(department_keys.len());
    for department in department_keys {
        let members = index.communes_of(&department).unwrap_or(&[]);
        let (selected, unselected): (Vec<_>, Vec<_>) = members
            .iter()
            .map(|c| c.key.clone())
            .partition(|k| commune_keys.contains(k));
        departments.push(DepartmentSelection {
            department,
            selected_in_dept: selected,
            unselected_in_dept: unselected,
        });
    }

    Ok(ResolvedSelection { departments })
}

fn check_unknown(
    policy: SelectionPolicy,
    level: UnitLevel,
    key: String,
) -> Result<(), SelectionError> {
    match policy {
        SelectionPolicy::Permissive => {
            debug!(%level, key = %key, "dropping unknown selection entry");
            Ok(())
        }
        SelectionPolicy::Strict => Err(SelectionError::UnknownKey { level, key }),
    }
}
