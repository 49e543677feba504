// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Index store management and manipulation.
//!
//! Pyndex treats a directory holding a static "simple" index as an
//! __index store__. The index store houses the root index, one directory per
//! registered package, and the template used to materialize new package
//! indexes.
//!
//! # Index Store Layout
//!
//! ```text
//! <root>/
//! ├── index.html             root index
//! ├── pkg_template.html      package index template
//! ├── pyndex.toml            optional settings
//! └── public-hello/
//!     └── index.html         package index
//! ```
//!
//! The name of each package directory is the normalized name of the package
//! it houses. Thus, "Public_Hello" and "public-hello" always refer to the
//! same directory.
//!
//! # Consistency
//!
//! Each operation checks its preconditions against the root index before
//! touching anything, and performs every edit in memory before writing. That
//! includes the edits to workflow files, so a workflow file without a choice
//! list fails the operation before any index is written. Still,
//! a failure while writing the second document of an operation leaves the
//! first one written. Nothing here rolls that back.

use crate::{
    config::{IndexSettings, CONFIG_FILE},
    index::{
        package::VersionEntry, root::PackageEntry, IndexError, PackageIndex, PackageTemplate,
        RootIndex,
    },
    inputs::Request,
    name::PackageName,
    workflow::{ChoiceEdit, WorkflowDraft, WorkflowFile},
};

use mkdirp::mkdirp;
use std::{
    fs::{read_to_string, remove_dir_all, write},
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument, warn};

/// Package to register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPackage {
    /// Name of package.
    pub name: PackageName,

    /// First version to publish.
    pub version: String,

    /// Short description shown in root index.
    pub short_description: String,

    /// Long description shown in package index.
    pub long_description: String,

    /// Homepage of package.
    pub homepage: String,

    /// Download link of first version, without egg fragment.
    pub link: String,
}

/// Version of existing package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    /// Name of package.
    pub name: PackageName,

    /// Version to publish or update.
    pub version: String,

    /// Download link of version, without egg fragment.
    pub link: String,
}

/// Static index store.
#[derive(Debug, Clone)]
pub struct IndexStore {
    root: PathBuf,
    settings: IndexSettings,
}

impl IndexStore {
    /// Construct new index store at target root with given settings.
    ///
    /// Nothing is read until an operation is performed.
    pub fn new(root: impl Into<PathBuf>, settings: IndexSettings) -> Self {
        Self {
            root: root.into(),
            settings,
        }
    }

    /// Open index store at target root.
    ///
    /// Settings are read from target configuration file if given, or from
    /// `pyndex.toml` at the top-level of the root if it exists. Otherwise,
    /// default settings are used.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::ReadConfig`] if configuration file cannot be
    ///   read.
    /// - Return [`StoreError::Config`] if configuration file cannot be parsed.
    pub fn open(root: impl Into<PathBuf>, config: Option<&Path>) -> Result<Self> {
        let root = root.into();
        let config = match config {
            Some(path) => Some(path.to_path_buf()),
            None => Some(root.join(CONFIG_FILE)).filter(|path| path.exists()),
        };

        let settings = match config {
            Some(path) => {
                debug!("load settings: {:?}", path.display());
                read_to_string(&path)
                    .map_err(|err| StoreError::ReadConfig { source: err, path })?
                    .parse::<IndexSettings>()?
            }
            None => IndexSettings::default(),
        };

        Ok(Self::new(root, settings))
    }

    /// Root directory of index store.
    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    /// Settings in use.
    pub fn settings(&self) -> &IndexSettings {
        &self.settings
    }

    /// Path to root index.
    pub fn root_index_path(&self) -> PathBuf {
        self.root.join(&self.settings.layout.index_file)
    }

    /// Path to package index of target package.
    pub fn package_index_path(&self, name: &PackageName) -> PathBuf {
        self.package_dir(name).join(&self.settings.layout.index_file)
    }

    /// Path to directory of target package.
    pub fn package_dir(&self, name: &PackageName) -> PathBuf {
        self.root.join(name.directory())
    }

    /// Determine if package is registered in root index.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::Index`] if root index cannot be read.
    #[instrument(skip(self, name), fields(name = %name), level = "debug")]
    pub fn exists(&self, name: &PackageName) -> Result<bool> {
        Ok(self.open_root()?.contains(name))
    }

    /// Perform validated request.
    pub fn apply(&self, request: &Request) -> Result<()> {
        match request {
            Request::Register(package) => self.register(package),
            Request::Add(release) => self.add(release),
            Request::Update(release) => self.update(release),
            Request::Delete(name) => self.delete(name),
        }
    }

    /// Register new package.
    ///
    /// Appends a new entry to the root index, and materializes a new package
    /// index from the template. The package is also inserted into the choice
    /// lists of all configured workflow files.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::PackageExists`] if package is already registered.
    /// - Return [`StoreError::Template`] if template cannot be read.
    /// - Return [`StoreError::Index`] if root index cannot be read, edited, or
    ///   written.
    /// - Return [`StoreError::WritePackageIndex`] if package index cannot be
    ///   written.
    /// - Return [`StoreError::Workflow`] if workflow files cannot be edited.
    #[instrument(skip(self, package), fields(name = %package.name), level = "debug")]
    pub fn register(&self, package: &NewPackage) -> Result<()> {
        let mut root = self.open_root()?;
        if root.contains(&package.name) {
            return Err(StoreError::PackageExists(package.name.to_string()));
        }

        // INVARIANT: Render template before any write.
        //   - A missing template must leave the root index untouched.
        let template = PackageTemplate::open(self.root.join(&self.settings.layout.template_file))?;
        let content = template.render(package);
        let workflows =
            self.draft_workflows(|choices| choices.insert_choice(package.name.normalized()))?;

        root.append_package(&package.name, &package.version, &package.short_description)?;
        root.save()?;

        let package_dir = self.package_dir(&package.name);
        let package_index = self.package_index_path(&package.name);
        mkdirp(&package_dir).map_err(|err| StoreError::CreatePackageDir {
            source: err,
            path: package_dir,
        })?;
        write(&package_index, content).map_err(|err| StoreError::WritePackageIndex {
            source: err,
            path: package_index,
        })?;

        commit_workflows(workflows)?;

        info!("registered {} at version {}", package.name, package.version);
        Ok(())
    }

    /// Add new version to existing package.
    ///
    /// Appends a new version entry to the package index, and makes it the
    /// current version in both the root index and the package index.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::PackageMissing`] if package is not registered.
    /// - Return [`StoreError::VersionExists`] if version is already published.
    /// - Return [`StoreError::Index`] if either index cannot be read, edited,
    ///   or written.
    #[instrument(skip(self, release), fields(name = %release.name), level = "debug")]
    pub fn add(&self, release: &Release) -> Result<()> {
        let mut root = self.open_root()?;
        self.ensure_registered(&root, &release.name)?;

        let mut package = self.open_package(&release.name)?;
        if package.contains_version(&release.version) {
            return Err(StoreError::VersionExists {
                name: release.name.to_string(),
                version: release.version.clone(),
            });
        }

        root.set_version(&release.name, &release.version)?;
        package.append_version(&release.version, &release.link)?;
        root.save()?;
        package.save()?;

        info!("added {} version {}", release.name, release.version);
        Ok(())
    }

    /// Point existing version of package at new download link.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::PackageMissing`] if package is not registered.
    /// - Return [`StoreError::VersionMissing`] if version is not published.
    /// - Return [`StoreError::Index`] if either index cannot be read, or
    ///   package index cannot be written.
    #[instrument(skip(self, release), fields(name = %release.name), level = "debug")]
    pub fn update(&self, release: &Release) -> Result<()> {
        let root = self.open_root()?;
        self.ensure_registered(&root, &release.name)?;

        let mut package = self.open_package(&release.name)?;
        if !package.relink_version(&release.version, &release.link) {
            return Err(StoreError::VersionMissing {
                name: release.name.to_string(),
                version: release.version.clone(),
            });
        }
        package.save()?;

        info!("updated {} version {} link", release.name, release.version);
        Ok(())
    }

    /// Delete existing package.
    ///
    /// Removes the package directory along with the root index entry. The
    /// package is also removed from the choice lists of all configured
    /// workflow files.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::PackageMissing`] if package is not registered.
    /// - Return [`StoreError::RemovePackageDir`] if package directory cannot
    ///   be removed.
    /// - Return [`StoreError::Index`] if root index cannot be read, or
    ///   written.
    /// - Return [`StoreError::Workflow`] if workflow files cannot be edited.
    #[instrument(skip(self, name), fields(name = %name), level = "debug")]
    pub fn delete(&self, name: &PackageName) -> Result<()> {
        let mut root = self.open_root()?;
        self.ensure_registered(&root, name)?;
        let workflows = self.draft_workflows(|choices| choices.remove_choice(name.normalized()))?;

        let package_dir = self.package_dir(name);
        match remove_dir_all(&package_dir) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!("package directory {:?} already gone", package_dir.display());
            }
            Err(err) => {
                return Err(StoreError::RemovePackageDir {
                    source: err,
                    path: package_dir,
                })
            }
        }

        root.remove_package(name);
        root.save()?;

        commit_workflows(workflows)?;

        info!("deleted {name}");
        Ok(())
    }

    /// List all registered packages.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::Index`] if root index cannot be read.
    pub fn packages(&self) -> Result<Vec<PackageEntry>> {
        Ok(self.open_root()?.entries())
    }

    /// List all published versions of package.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::PackageMissing`] if package is not registered.
    /// - Return [`StoreError::Index`] if either index cannot be read.
    pub fn versions(&self, name: &PackageName) -> Result<Vec<VersionEntry>> {
        let root = self.open_root()?;
        self.ensure_registered(&root, name)?;

        Ok(self.open_package(name)?.versions())
    }

    fn open_root(&self) -> Result<RootIndex> {
        Ok(RootIndex::open(self.root_index_path())?)
    }

    fn open_package(&self, name: &PackageName) -> Result<PackageIndex> {
        Ok(PackageIndex::open(
            name.clone(),
            self.package_index_path(name),
        )?)
    }

    fn ensure_registered(&self, root: &RootIndex, name: &PackageName) -> Result<()> {
        if root.contains(name) {
            debug!("found {name} in root index");
            Ok(())
        } else {
            Err(StoreError::PackageMissing(name.to_string()))
        }
    }

    fn draft_workflows<E>(&self, editor: E) -> Result<Vec<WorkflowDraft>>
    where
        E: Fn(&mut ChoiceEdit),
    {
        let mut drafts = Vec::new();
        for path in &self.settings.workflow.files {
            let workflow = WorkflowFile::new(self.root.join(path), &self.settings.workflow.input);
            drafts.extend(workflow.draft(&editor)?);
        }

        Ok(drafts)
    }
}

fn commit_workflows(drafts: Vec<WorkflowDraft>) -> Result<()> {
    for draft in drafts {
        draft.commit()?;
    }

    Ok(())
}

/// All possible error types for index store interaction.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Package is already registered.
    #[error("package {0} already exists")]
    PackageExists(String),

    /// Package is not registered.
    #[error("package {0} does not exist")]
    PackageMissing(String),

    /// Version is already published.
    #[error("package {name} version {version} already exists")]
    VersionExists { name: String, version: String },

    /// Version is not published.
    #[error("package {name} version {version} does not exist")]
    VersionMissing { name: String, version: String },

    /// Configuration file cannot be read.
    #[error("failed to read settings at {:?}", path.display())]
    ReadConfig {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Package directory cannot be created.
    #[error("failed to create package directory at {:?}", path.display())]
    CreatePackageDir {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Package index cannot be written.
    #[error("failed to write package index at {:?}", path.display())]
    WritePackageIndex {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Package directory cannot be removed.
    #[error("failed to remove package directory at {:?}", path.display())]
    RemovePackageDir {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Configuration file cannot be parsed.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    /// Index document manipulation fails.
    #[error(transparent)]
    Index(#[from] IndexError),

    /// Template cannot be read.
    #[error(transparent)]
    Template(#[from] crate::index::template::TemplateError),

    /// Workflow choice list manipulation fails.
    #[error(transparent)]
    Workflow(#[from] crate::workflow::Error),
}

/// Friendly result alias :3
pub type Result<T, E = StoreError> = std::result::Result<T, E>;
