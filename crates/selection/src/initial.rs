use boundaries::HierarchyIndex;
use foundation::canonical_key;

use crate::resolver::Selection;

/// Number of departments preselected when no defaults are configured.
pub const FALLBACK_DEPARTMENT_COUNT: usize = 2;

/// Selection shown before the user has made any choice.
///
/// Without configured departments the first two in display order are used.
/// Without configured communes every commune of the chosen departments is
/// selected.
pub fn initial_selection(
    index: &HierarchyIndex,
    default_departments: Option<&[String]>,
    default_communes: Option<&[String]>,
) -> Selection {
    let departments: Vec<String> = match default_departments {
        Some(names) if !names.is_empty() => names.to_vec(),
        _ => index
            .departments()
            .take(FALLBACK_DEPARTMENT_COUNT)
            .map(|d| d.display_name.clone())
            .collect(),
    };

    let communes = match default_communes {
        Some(names) => names.to_vec(),
        None => {
            let keys: Vec<String> = departments.iter().map(|d| canonical_key(d)).collect();
            index.commune_options(&keys)
        }
    };

    Selection::new(departments, communes)
}
