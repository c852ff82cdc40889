use crate::classes::LabelCase;
use crate::error::ConfigError;
use crate::handles::DEFAULT_HANDLE_TOLERANCE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub view: ViewConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub classes: ClassesConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewConfig {
    #[serde(default = "default_handle_tolerance")]
    pub handle_tolerance_px: f32,
    #[serde(default = "default_min_zoom")]
    pub min_zoom: f32,
    #[serde(default = "default_max_zoom")]
    pub max_zoom: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_export_format")]
    pub default_format: String,
    #[serde(default = "default_train_fraction")]
    pub train_fraction: f64,
    #[serde(default)]
    pub label_case: LabelCase,
    #[serde(default = "default_true")]
    pub bundle_images: bool,
    #[serde(default = "default_coco_category_start_id")]
    pub coco_category_start_id: u32,
    #[serde(default = "default_segmentation_epsilon")]
    pub segmentation_epsilon: f32,
    /// Visual filter applied to bundled images, if any.
    #[serde(default)]
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassesConfig {
    /// Explicit class mapping YAML. First-seen ids are used when unset.
    pub config_file: Option<String>,
}

// Default value functions
fn default_handle_tolerance() -> f32 {
    DEFAULT_HANDLE_TOLERANCE
}

fn default_min_zoom() -> f32 {
    0.05
}

fn default_max_zoom() -> f32 {
    64.0
}

fn default_export_format() -> String {
    "yolo".to_string()
}

fn default_train_fraction() -> f64 {
    0.8
}

fn default_true() -> bool {
    true
}

fn default_coco_category_start_id() -> u32 {
    1
}

fn default_segmentation_epsilon() -> f32 {
    1e-4
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            handle_tolerance_px: default_handle_tolerance(),
            min_zoom: default_min_zoom(),
            max_zoom: default_max_zoom(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            default_format: default_export_format(),
            train_fraction: default_train_fraction(),
            label_case: LabelCase::Original,
            bundle_images: true,
            coco_category_start_id: default_coco_category_start_id(),
            segmentation_epsilon: default_segmentation_epsilon(),
            filter: None,
        }
    }
}

/// Get the path to the config file
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let dirs = directories::ProjectDirs::from("", "", "annotator").ok_or(ConfigError::NoConfigDir)?;
    Ok(dirs.config_dir().join("config.toml"))
}

/// Load configuration from the default location, or return defaults if the
/// file is missing or broken.
pub fn load_config() -> AppConfig {
    match config_path() {
        Ok(path) if path.exists() => load_config_from(&path).unwrap_or_else(|e| {
            log::warn!("{e}. Using default config.");
            AppConfig::default()
        }),
        Ok(_) => AppConfig::default(),
        Err(e) => {
            log::warn!("{e}. Using default config.");
            AppConfig::default()
        }
    }
}

pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Save configuration to the default location
pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    save_config_to(config, &config_path()?)
}

pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let toml = toml::to_string_pretty(config)?;

    std::fs::write(path, toml).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
