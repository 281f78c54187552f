/// Canonical key for an administrative unit name.
///
/// Keys are trimmed and lower-cased so that display formatting differences
/// (`" Aïoun"`, `"AÏOUN"`) resolve to the same unit.
pub fn canonical_key(name: &str) -> String {
    name.trim().to_lowercase()
}
