//! Label names, class ids, and explicit class mapping files.

use crate::error::{ConfigError, ExportError, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelCase {
    #[default]
    Original,
    Upper,
    Lower,
}

impl FromStr for LabelCase {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "original" => Ok(LabelCase::Original),
            "upper" => Ok(LabelCase::Upper),
            "lower" => Ok(LabelCase::Lower),
            other => Err(ExportError::InvalidOptions(format!(
                "unknown label case mode '{other}'"
            ))),
        }
    }
}

/// Collapse whitespace runs into a single underscore, then apply the case mode.
/// Leading and trailing whitespace is dropped.
pub fn transform_label(label: &str, case: LabelCase) -> String {
    let joined = label.split_whitespace().collect::<Vec<_>>().join("_");
    match case {
        LabelCase::Original => joined,
        LabelCase::Upper => joined.to_uppercase(),
        LabelCase::Lower => joined.to_lowercase(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDefinition {
    pub id: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Largest class id an explicit mapping may use. `classes.txt` gets one line
/// per id up to the largest, so ids bound the size of the output.
pub const MAX_CLASS_ID: u32 = 9_999;

/// Caller-supplied label -> class id mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassMapping {
    pub classes: Vec<ClassDefinition>,
}

impl ClassMapping {
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        Self {
            classes: pairs
                .into_iter()
                .map(|(name, id)| ClassDefinition {
                    id,
                    name: name.into(),
                    color: None,
                })
                .collect(),
        }
    }

    pub fn max_id(&self) -> Option<u32> {
        self.classes.iter().map(|c| c.id).max()
    }

    /// Load a mapping from YAML. Accepts either a bare list of class entries
    /// or a document with a `classes:` key. `~` is expanded.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let expanded = shellexpand::tilde(path);
        let path = Path::new(expanded.as_ref());
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        if let Ok(classes) = serde_yaml::from_str::<Vec<ClassDefinition>>(content) {
            return Ok(Self { classes });
        }
        Ok(serde_yaml::from_str::<ClassMapping>(content)?)
    }

    pub fn save(&self, path: &str) -> Result<(), ConfigError> {
        let expanded = shellexpand::tilde(path);
        let path = Path::new(expanded.as_ref());
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Resolved label -> class id table for one export.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassTaxonomy {
    case: LabelCase,
    ids: HashMap<String, u32>,
    /// (id, name), ascending by id.
    names: Vec<(u32, String)>,
}

impl ClassTaxonomy {
    /// Ids in first-seen order starting at 0.
    pub fn first_seen<'a>(labels: impl IntoIterator<Item = &'a str>, case: LabelCase) -> Self {
        let mut ids = HashMap::new();
        let mut names = Vec::new();
        for label in labels {
            let name = transform_label(label, case);
            if !ids.contains_key(&name) {
                let id = names.len() as u32;
                ids.insert(name.clone(), id);
                names.push((id, name));
            }
        }
        Self { case, ids, names }
    }

    /// Ids taken from an explicit mapping. Mapping names go through the same
    /// label transform as annotation labels.
    pub fn from_mapping(mapping: &ClassMapping, case: LabelCase) -> Self {
        let mut ids = HashMap::new();
        let mut names: Vec<(u32, String)> = Vec::new();
        for class in &mapping.classes {
            let name = transform_label(&class.name, case);
            if ids.contains_key(&name) {
                log::warn!("Duplicate class name '{}' in mapping; keeping first id", name);
                continue;
            }
            ids.insert(name.clone(), class.id);
            names.push((class.id, name));
        }
        names.sort_by_key(|(id, _)| *id);
        names.dedup_by_key(|(id, _)| *id);
        Self { case, ids, names }
    }

    pub fn resolve<'a>(
        labels: impl IntoIterator<Item = &'a str>,
        case: LabelCase,
        mapping: Option<&ClassMapping>,
    ) -> Self {
        match mapping {
            Some(m) => Self::from_mapping(m, case),
            None => Self::first_seen(labels, case),
        }
    }

    pub fn class_id(&self, label: &str) -> Result<u32, ValidationError> {
        let name = transform_label(label, self.case);
        self.ids
            .get(&name)
            .copied()
            .ok_or(ValidationError::UnmappedLabel(name))
    }

    /// Class names indexed by id. Ids without a name become `class_<id>` so
    /// line numbers in `classes.txt` always equal class ids.
    pub fn names_by_id(&self) -> Vec<String> {
        let Some(max) = self.names.last().map(|(id, _)| *id) else {
            return Vec::new();
        };
        let mut out: Vec<String> = (0..=max).map(|id| format!("class_{id}")).collect();
        for (id, name) in &self.names {
            out[*id as usize] = name.clone();
        }
        out
    }

    /// (id, name) pairs that actually exist, ascending by id.
    pub fn entries(&self) -> &[(u32, String)] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
