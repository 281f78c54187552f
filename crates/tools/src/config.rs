use std::fs;
use std::path::{Path, PathBuf};

use boundaries::{Exclusion, StoreKey};
use foundation::math::Projection;
use layers::{MapView, Symbology};
use selection::SelectionPolicy;
use serde::Deserialize;

/// Highest zoom level accepted for the initial viewport.
pub const MAX_ZOOM: u8 = 20;

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Io { path: PathBuf, reason: String },
    Parse(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io { path, reason } => {
                write!(f, "cannot read config {}: {reason}", path.display())
            }
            ConfigError::Parse(msg) => write!(f, "malformed config: {msg}"),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

fn default_center() -> [f64; 2] {
    MapView::default().center
}

fn default_zoom() -> u8 {
    MapView::default().zoom
}

/// Per-country map configuration, read from JSON with camelCase keys.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MapConfig {
    pub shapefile_path: PathBuf,
    pub adm2_column: String,
    pub adm3_column: String,
    /// `[department, commune]` pairs removed at load time.
    #[serde(default)]
    pub exclusions: Vec<Exclusion>,
    #[serde(default)]
    pub simplify_tolerance: Option<f64>,
    /// `[lat, lon]`
    #[serde(default = "default_center")]
    pub map_center: [f64; 2],
    #[serde(default = "default_zoom")]
    pub map_zoom: u8,
    #[serde(default)]
    pub default_departments: Option<Vec<String>>,
    #[serde(default)]
    pub default_communes: Option<Vec<String>>,
    /// Projection code for label centroids, e.g. `EPSG:32628`.
    #[serde(default)]
    pub label_projection: Option<String>,
    #[serde(default)]
    pub selection_policy: SelectionPolicy,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub symbology: Symbology,
}

impl MapConfig {
    /// Reads and validates a config file. A relative `shapefilePath` is
    /// resolved against the directory holding the config.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let mut config = Self::from_json_str(&raw)?;
        if config.shapefile_path.is_relative() {
            if let Some(dir) = path.parent() {
                config.shapefile_path = dir.join(&config.shapefile_path);
            }
        }
        Ok(config)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: MapConfig =
            serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shapefile_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("shapefilePath is empty".to_string()));
        }
        let columns = [
            ("adm2Column", &self.adm2_column),
            ("adm3Column", &self.adm3_column),
        ];
        for (name, column) in columns {
            if column.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{name} is empty")));
            }
        }
        if self.adm2_column == self.adm3_column {
            return Err(ConfigError::Invalid(
                "adm2Column and adm3Column must differ".to_string(),
            ));
        }
        if let Some(t) = self.simplify_tolerance {
            if !t.is_finite() || t < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "simplifyTolerance must be a non-negative number, got {t}"
                )));
            }
        }
        let [lat, lon] = self.map_center;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(ConfigError::Invalid(format!(
                "mapCenter [{lat}, {lon}] is not a valid [lat, lon]"
            )));
        }
        if self.map_zoom > MAX_ZOOM {
            return Err(ConfigError::Invalid(format!(
                "mapZoom {} exceeds {MAX_ZOOM}",
                self.map_zoom
            )));
        }
        self.label_projection()?;
        Ok(())
    }

    pub fn label_projection(&self) -> Result<Option<Projection>, ConfigError> {
        self.label_projection
            .as_deref()
            .map(Projection::from_code)
            .transpose()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn store_key(&self) -> StoreKey {
        StoreKey::new(
            self.shapefile_path.clone(),
            self.adm2_column.clone(),
            self.adm3_column.clone(),
            &self.exclusions,
            self.simplify_tolerance,
        )
    }

    pub fn view(&self) -> MapView {
        MapView {
            center: self.map_center,
            zoom: self.map_zoom,
        }
    }
}
