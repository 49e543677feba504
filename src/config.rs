// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout for the optional `pyndex.toml` configuration file that
//! can sit at the top-level of an index root. Every key is optional, so an
//! index root without a configuration file behaves exactly like one with an
//! empty configuration file. File I/O is left to the caller to figure out.

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    str::FromStr,
};

/// Default name of configuration file at the top-level of an index root.
pub const CONFIG_FILE: &str = "pyndex.toml";

/// Index settings layout.
///
/// # General Layout
///
/// Index settings are composed of two basic parts: layout and workflow. The
/// layout section names the files that make up the static index itself. The
/// workflow section names the workflow dispatch files whose package choice
/// lists must follow the set of registered packages.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IndexSettings {
    /// File layout of index.
    pub layout: LayoutSettings,

    /// Workflow dispatch files to keep in sync.
    pub workflow: WorkflowSettings,
}

impl FromStr for IndexSettings {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut settings: IndexSettings =
            toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on every path field.
        settings.layout.index_file = expand_path(&settings.layout.index_file)?;
        settings.layout.template_file = expand_path(&settings.layout.template_file)?;
        settings.workflow.files = settings
            .workflow
            .files
            .iter()
            .map(|path| expand_path(path))
            .collect::<Result<Vec<_>>>()?;

        Ok(settings)
    }
}

impl Display for IndexSettings {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// File layout of index root.
///
/// Relative paths are resolved against the index root.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LayoutSettings {
    /// Name of root index, also used as the name of each package index.
    pub index_file: PathBuf,

    /// Template to materialize new package indexes from.
    pub template_file: PathBuf,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            index_file: PathBuf::from("index.html"),
            template_file: PathBuf::from("pkg_template.html"),
        }
    }
}

/// Workflow dispatch files whose package choice lists are kept in sync.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkflowSettings {
    /// Name of the workflow input holding the package choice list.
    pub input: String,

    /// Workflow files to edit.
    pub files: Vec<PathBuf>,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            input: "package_name".into(),
            files: vec![
                PathBuf::from(".github/workflows/delete.yml"),
                PathBuf::from(".github/workflows/update.yml"),
            ],
        }
    }
}

fn expand_path(path: &Path) -> Result<PathBuf> {
    Ok(PathBuf::from(
        shellexpand::full(path.to_string_lossy().as_ref())
            .map_err(ConfigError::ShellExpansion)?
            .into_owned(),
    ))
}

/// Configuration error types.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;
