use geo::MultiPolygon;

/// Identity of a commune: canonical department key plus canonical commune key.
///
/// Commune names are only unique inside their department, so both parts take
/// part in ordering and equality. Ordering groups communes by department.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CommuneKey {
    pub department: String,
    pub commune: String,
}

impl CommuneKey {
    pub fn new(department: impl Into<String>, commune: impl Into<String>) -> Self {
        Self {
            department: department.into(),
            commune: commune.into(),
        }
    }
}

impl std::fmt::Display for CommuneKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.department, self.commune)
    }
}

/// Shared view over communes and departments.
pub trait AdministrativeUnit {
    fn key(&self) -> &str;
    fn display_name(&self) -> &str;
    fn geometry(&self) -> &MultiPolygon<f64>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Commune {
    pub key: String,
    pub display_name: String,
    pub parent_department_key: String,
    pub geometry: MultiPolygon<f64>,
}

impl Commune {
    pub fn commune_key(&self) -> CommuneKey {
        CommuneKey::new(self.parent_department_key.clone(), self.key.clone())
    }
}

impl AdministrativeUnit for Commune {
    fn key(&self) -> &str {
        &self.key
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn geometry(&self) -> &MultiPolygon<f64> {
        &self.geometry
    }
}

/// A department with its dissolved outline. Never stored; built on demand by
/// [`crate::GeometryStore::dissolve_department`].
#[derive(Debug, Clone, PartialEq)]
pub struct Department {
    pub key: String,
    pub display_name: String,
    pub geometry: MultiPolygon<f64>,
}

impl AdministrativeUnit for Department {
    fn key(&self) -> &str {
        &self.key
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn geometry(&self) -> &MultiPolygon<f64> {
        &self.geometry
    }
}
