//! Error types shared across the crate.
//!
//! Interactive editing never produces errors (invalid strokes are dropped).
//! Everything here belongs to persistence, configuration, and export.

use std::path::PathBuf;

/// A single annotation that cannot be encoded. Never fatal: the record is
/// skipped and counted in the export summary.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("degenerate bounding box ({width} x {height})")]
    DegenerateBox { width: f32, height: f32 },
    #[error("polygon has {0} usable vertices, need at least 3")]
    TooFewVertices(usize),
    #[error("polygon encloses no area")]
    ZeroArea,
    #[error("non-finite coordinate")]
    NonFiniteCoordinate,
    #[error("label '{0}' is not in the class mapping")]
    UnmappedLabel(String),
}

/// Missing or unreadable project data. Aborts the whole export.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("project '{0}' not found")]
    ProjectNotFound(String),
    #[error("image {0} not found")]
    ImageNotFound(u64),
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt data in {}: {detail}", path.display())]
    Corrupt { path: PathBuf, detail: String },
    #[error("persistence unavailable: {0}")]
    Unavailable(String),
}

impl ResourceError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ResourceError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn corrupt(path: impl Into<PathBuf>, detail: impl ToString) -> Self {
        ResourceError::Corrupt {
            path: path.into(),
            detail: detail.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Requested output format is not one of the supported encoders.
    #[error("unsupported export format '{0}' (expected yolo, yolo-seg or coco)")]
    UnsupportedFormat(String),
    #[error("invalid export options: {0}")]
    InvalidOptions(String),
    #[error("nothing to export: the project has no annotations")]
    NoAnnotations,
    #[error("failed to encode {file}: {detail}")]
    Encode { file: String, detail: String },
    #[error(transparent)]
    Resource(#[from] ResourceError),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("failed to serialize TOML config: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("failed to parse class mapping: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("could not determine the config directory")]
    NoConfigDir,
}
