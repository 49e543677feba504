// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use pyndex::{
    inputs::ActionInputs,
    name::PackageName,
    store::{IndexStore, NewPackage, Release},
};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::{path::PathBuf, process::exit};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "\n  pyndex [options] <pyndex-command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    /// Path to top-level of static index.
    #[arg(short, long, value_name = "path", default_value = ".", global = true)]
    pub root: PathBuf,

    /// Path to settings file to use instead of pyndex.toml at index root.
    #[arg(short, long, value_name = "path", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn run(self) -> Result<()> {
        let store = IndexStore::open(&self.root, self.config.as_deref())?;
        match self.command {
            Command::Register(opts) => run_register(&store, opts),
            Command::Add(opts) => run_add(&store, opts),
            Command::Update(opts) => run_update(&store, opts),
            Command::Delete(opts) => run_delete(&store, opts),
            Command::List => run_list(&store),
            Command::Show(opts) => run_show(&store, opts),
            Command::Dispatch => run_dispatch(&store),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Register new package.
    #[command(override_usage = "pyndex register [options] <package_name>")]
    Register(RegisterOptions),

    /// Add new version to existing package.
    #[command(override_usage = "pyndex add [options] <package_name>")]
    Add(ReleaseOptions),

    /// Update download link of existing version.
    #[command(override_usage = "pyndex update [options] <package_name>")]
    Update(ReleaseOptions),

    /// Delete existing package.
    #[command(override_usage = "pyndex delete [options] <package_name>")]
    Delete(DeleteOptions),

    /// List registered packages.
    #[command(override_usage = "pyndex list [options]")]
    List,

    /// Show published versions of package.
    #[command(override_usage = "pyndex show [options] <package_name>")]
    Show(ShowOptions),

    /// Perform action named by PKG_ACTION with PKG_* environment inputs.
    #[command(override_usage = "pyndex dispatch [options]")]
    Dispatch,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct RegisterOptions {
    /// Name of package to register.
    #[arg(required = true, value_name = "package_name")]
    pub package_name: PackageName,

    /// First version to publish.
    #[arg(short, long, required = true, value_name = "version")]
    pub version: String,

    /// Download link of first version.
    #[arg(short, long, required = true, value_name = "url")]
    pub link: String,

    /// Short description shown in root index.
    #[arg(short, long, value_name = "summary", default_value = "")]
    pub short_description: String,

    /// Long description shown in package index.
    #[arg(short = 'L', long, value_name = "text", default_value = "")]
    pub long_description: String,

    /// Homepage of package.
    #[arg(short = 'H', long, value_name = "url", default_value = "")]
    pub homepage: String,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ReleaseOptions {
    /// Name of registered package.
    #[arg(required = true, value_name = "package_name")]
    pub package_name: PackageName,

    /// Version to publish or update.
    #[arg(short, long, required = true, value_name = "version")]
    pub version: String,

    /// Download link of version.
    #[arg(short, long, required = true, value_name = "url")]
    pub link: String,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct DeleteOptions {
    /// Name of packages to delete.
    #[arg(required = true, value_name = "package_name")]
    pub package_names: Vec<PackageName>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ShowOptions {
    /// Name of registered package.
    #[arg(required = true, value_name = "package_name")]
    pub package_name: PackageName,
}

fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_timer(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn run() -> Result<()> {
    Cli::parse().run()
}

fn run_register(store: &IndexStore, opts: RegisterOptions) -> Result<()> {
    store.register(&NewPackage {
        name: opts.package_name,
        version: opts.version,
        short_description: opts.short_description,
        long_description: opts.long_description,
        homepage: opts.homepage,
        link: opts.link,
    })?;

    Ok(())
}

fn run_add(store: &IndexStore, opts: ReleaseOptions) -> Result<()> {
    store.add(&Release {
        name: opts.package_name,
        version: opts.version,
        link: opts.link,
    })?;

    Ok(())
}

fn run_update(store: &IndexStore, opts: ReleaseOptions) -> Result<()> {
    store.update(&Release {
        name: opts.package_name,
        version: opts.version,
        link: opts.link,
    })?;

    Ok(())
}

fn run_delete(store: &IndexStore, opts: DeleteOptions) -> Result<()> {
    for package_name in opts.package_names {
        store.delete(&package_name)?;
    }

    Ok(())
}

fn run_list(store: &IndexStore) -> Result<()> {
    for entry in store.packages()? {
        println!("{:<30} {:<12} {}", entry.name, entry.version, entry.description);
    }

    Ok(())
}

fn run_show(store: &IndexStore, opts: ShowOptions) -> Result<()> {
    let name = opts.package_name;
    let versions = store.versions(&name)?;
    if versions.is_empty() {
        bail!("package {name} has no published versions");
    }

    for entry in versions {
        println!("{:<12} {}", entry.version, entry.link);
    }

    Ok(())
}

fn run_dispatch(store: &IndexStore) -> Result<()> {
    let request = ActionInputs::from_env().into_request()?;
    info!("dispatch {request:?}");
    store.apply(&request)?;

    Ok(())
}
