use std::sync::Arc;

use boundaries::{LoadedBoundaries, StoreCache, StoreError};
use foundation::canonical_key;
use layers::{CompileOptions, CompiledMap, LayerCompiler, MapView};
use selection::{Selection, SelectionError, initial_selection};
use tracing::info;

use crate::config::{ConfigError, MapConfig};

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    Config(ConfigError),
    Store(StoreError),
    Selection(SelectionError),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::Config(e) => write!(f, "{e}"),
            PipelineError::Store(e) => write!(f, "{e}"),
            PipelineError::Selection(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<ConfigError> for PipelineError {
    fn from(e: ConfigError) -> Self {
        PipelineError::Config(e)
    }
}

impl From<StoreError> for PipelineError {
    fn from(e: StoreError) -> Self {
        PipelineError::Store(e)
    }
}

impl From<SelectionError> for PipelineError {
    fn from(e: SelectionError) -> Self {
        PipelineError::Selection(e)
    }
}

/// One country's map: config, loaded boundaries and a compiler.
#[derive(Debug, Clone)]
pub struct Atlas {
    config: MapConfig,
    boundaries: Arc<LoadedBoundaries>,
    compiler: LayerCompiler,
}

impl Atlas {
    pub fn open(config: MapConfig, cache: &StoreCache) -> Result<Self, PipelineError> {
        let label_projection = config.label_projection()?;
        let boundaries = cache.get_or_load(&config.store_key())?;
        info!(
            communes = boundaries.store.len(),
            departments = boundaries.index.len(),
            "boundaries ready"
        );
        let compiler = LayerCompiler::new(CompileOptions {
            symbology: config.symbology,
            label_projection,
        });
        Ok(Self {
            config,
            boundaries,
            compiler,
        })
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn boundaries(&self) -> &LoadedBoundaries {
        &self.boundaries
    }

    pub fn view(&self) -> MapView {
        self.config.view()
    }

    /// Department display names in display order.
    pub fn department_options(&self) -> Vec<String> {
        self.boundaries
            .index
            .departments()
            .map(|d| d.display_name.clone())
            .collect()
    }

    /// Commune display names offered for the given departments.
    pub fn commune_options<S: AsRef<str>>(&self, departments: &[S]) -> Vec<String> {
        let keys: Vec<String> = departments
            .iter()
            .map(|d| canonical_key(d.as_ref()))
            .collect();
        self.boundaries.index.commune_options(&keys)
    }

    pub fn initial_selection(&self) -> Selection {
        initial_selection(
            &self.boundaries.index,
            self.config.default_departments.as_deref(),
            self.config.default_communes.as_deref(),
        )
    }

    /// Selection from optional overrides. Departments without communes
    /// select every commune of those departments; no departments falls back
    /// to the initial selection.
    pub fn selection_for(
        &self,
        departments: Option<Vec<String>>,
        communes: Option<Vec<String>>,
    ) -> Selection {
        match (departments, communes) {
            (Some(departments), Some(communes)) => Selection::new(departments, communes),
            (Some(departments), None) => {
                let communes = self.commune_options(&departments);
                Selection::new(departments, communes)
            }
            (None, communes) => {
                let mut selection = self.initial_selection();
                if let Some(communes) = communes {
                    selection.communes = communes;
                }
                selection
            }
        }
    }

    pub fn compile(&self, selection: &Selection) -> Result<CompiledMap, PipelineError> {
        let LoadedBoundaries { store, index } = self.boundaries.as_ref();
        let resolved = selection.resolve(index, self.config.selection_policy)?;
        Ok(self
            .compiler
            .compile(store, &resolved, &index.all_commune_keys()))
    }
}

#[cfg(test)]
mod tests {
    use super::{Atlas, PipelineError};
    use crate::config::MapConfig;
    use boundaries::{StoreCache, StoreError};
    use layers::LayerRole;
    use pretty_assertions::assert_eq;
    use selection::{Selection, SelectionError};
    use std::path::Path;

    const SAMPLE: &str = include_str!("../../boundaries/testdata/hodh_sample.geojson");

    fn write_config(dir: &Path, extra: &str) -> MapConfig {
        std::fs::write(dir.join("hodh.geojson"), SAMPLE).expect("write dataset");
        let raw = format!(
            r#"{{ "shapefilePath": "hodh.geojson", "adm2Column": "ADM2_EN",
                 "adm3Column": "ADM3_EN", "exclusions": [["Aïoun", "Beneamane"]] {extra} }}"#
        );
        let path = dir.join("config.json");
        std::fs::write(&path, raw).expect("write config");
        MapConfig::from_path(&path).expect("config")
    }

    #[test]
    fn initial_selection_compiles_from_configured_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = write_config(
            dir.path(),
            r#", "defaultDepartments": ["Djiguenni", "Bassiknou"]"#,
        );
        let cache = StoreCache::new();
        let atlas = Atlas::open(config, &cache).expect("open");

        assert_eq!(
            atlas.department_options(),
            vec!["Aïoun", "Bassiknou", "Djiguenni"]
        );
        assert_eq!(atlas.commune_options(&["Aïoun"]), vec!["Aïoun", "Egjert", "Ten Hamadi"]);

        let selection = atlas.initial_selection();
        assert_eq!(selection.communes.len(), 7);
        let map = atlas.compile(&selection).expect("compile");
        assert_eq!(map.layers.len(), 1 + 3 * 2 + 1);
        assert_eq!(map.layers[0].units.len(), 10);
        assert_eq!(map.layers.last().map(|l| l.role), Some(LayerRole::Highlight));
        assert_eq!(map.labels.len(), 2 + 7);
    }

    #[test]
    fn overrides_pick_the_selection() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = write_config(dir.path(), "");
        let atlas = Atlas::open(config, &StoreCache::new()).expect("open");

        let fallback = atlas.selection_for(None, None);
        assert_eq!(fallback.departments, vec!["Aïoun", "Bassiknou"]);
        assert_eq!(fallback.communes.len(), 7);

        let depts_only = atlas.selection_for(Some(vec!["Djiguenni".into()]), None);
        assert_eq!(
            depts_only.communes,
            vec!["Djiguenni", "Feirenni", "Ghlig Ehl Beye"]
        );

        let explicit = atlas.selection_for(Some(vec!["Djiguenni".into()]), Some(Vec::new()));
        assert!(explicit.communes.is_empty());

        let communes_only = atlas.selection_for(None, Some(vec!["Dhar".into()]));
        assert_eq!(communes_only.departments, vec!["Aïoun", "Bassiknou"]);
        assert_eq!(communes_only.communes, vec!["Dhar"]);
    }

    #[test]
    fn shares_cached_boundaries_between_sessions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = write_config(dir.path(), "");
        let cache = StoreCache::new();
        let a = Atlas::open(config.clone(), &cache).expect("a");
        let b = Atlas::open(config, &cache).expect("b");
        assert_eq!(cache.load_count(), 1);
        assert!(std::ptr::eq(a.boundaries(), b.boundaries()));
    }

    #[test]
    fn strict_policy_surfaces_unknown_names() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = write_config(dir.path(), r#", "selectionPolicy": "strict""#);
        let atlas = Atlas::open(config, &StoreCache::new()).expect("open");
        let selection = Selection::new(vec!["Aïoun".into()], vec!["Beneamane".into()]);
        let err = atlas.compile(&selection).expect_err("strict");
        assert!(matches!(
            err,
            PipelineError::Selection(SelectionError::UnknownKey { .. })
        ));
    }

    #[test]
    fn missing_dataset_is_a_store_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = MapConfig::from_json_str(&format!(
            r#"{{ "shapefilePath": {:?}, "adm2Column": "D", "adm3Column": "C" }}"#,
            dir.path().join("missing.geojson")
        ))
        .expect("config");
        let err = Atlas::open(config, &StoreCache::new()).expect_err("missing");
        assert!(matches!(err, PipelineError::Store(StoreError::NotFound { .. })));
    }
}
