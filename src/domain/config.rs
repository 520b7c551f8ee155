use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// The name of the configuration file at the root of a project.
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Project configuration, read from `config.yaml`.
///
/// Supplies the vocabulary used when filtering views of the standard: the
/// customers requirements may be written for, and the components they may be
/// scoped to. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Project metadata.
    #[serde(skip_serializing_if = "ProjectInfo::is_empty")]
    pub project: ProjectInfo,

    /// Customers known to the project. Customer folios are named after these.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub customers: Vec<String>,

    /// Components requirements can be scoped to.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<String>,

    #[serde(skip)]
    path: Option<PathBuf>,
}

/// The `project` section of the configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectInfo {
    /// Display name of the project.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Path to a logo image, relative to the configuration file.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub logo: String,
}

impl ProjectInfo {
    fn is_empty(&self) -> bool {
        self.name.is_empty() && self.logo.is_empty()
    }
}

/// Errors raised while reading or writing the configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read or written.
    #[error("failed to access config file {path}: {source}")]
    Io {
        /// The configuration file.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// The file is not valid configuration YAML.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// The configuration file.
        path: PathBuf,
        /// The underlying error.
        source: serde_yaml::Error,
    },

    /// The configuration could not be rendered as YAML.
    #[error("failed to encode config for {path}: {source}")]
    Encode {
        /// The configuration file.
        path: PathBuf,
        /// The underlying error.
        source: serde_yaml::Error,
    },
}

impl Config {
    /// Loads the configuration from a YAML file.
    ///
    /// An empty file yields the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid YAML for
    /// this structure.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str::<Self>(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?
        };

        config.customers = config.customers.iter().map(|c| c.to_lowercase()).collect();
        config.path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Saves the configuration as YAML to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized or the
    /// file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_yaml::to_string(self).map_err(|source| ConfigError::Encode {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The file the configuration was loaded from.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether `customer` is listed. Comparison ignores case.
    #[must_use]
    pub fn has_customer(&self, customer: &str) -> bool {
        let customer = customer.to_lowercase();
        self.customers.iter().any(|c| *c == customer)
    }

    /// Whether `component` is listed.
    #[must_use]
    pub fn has_component(&self, component: &str) -> bool {
        self.components.iter().any(|c| c == component)
    }

    /// The logo file, resolved against the configuration file's directory.
    ///
    /// Returns `None` if no logo is configured or the file does not exist.
    #[must_use]
    pub fn logo(&self) -> Option<PathBuf> {
        if self.project.logo.is_empty() {
            return None;
        }

        let logo = PathBuf::from(&self.project.logo);
        let logo = if logo.is_absolute() {
            logo
        } else {
            self.path.as_deref()?.parent()?.join(logo)
        };

        logo.is_file().then_some(logo)
    }
}
