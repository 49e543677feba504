// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Static "simple" package index management.
//!
//! Pyndex maintains a PyPI-style package repository that is nothing more than
//! a tree of static HTML files committed to a repository and served by some
//! external host. The __root index__ at `index.html` lists every registered
//! package, and each package owns a __package index__ at
//! `<normalized-name>/index.html` that lists every published version along
//! with its download link.
//!
//! All mutation happens through [`IndexStore`], which parses the affected
//! documents, edits them in memory, and rewrites them in full. Nothing here
//! coordinates concurrent writers. The caller is expected to run one
//! invocation at a time, e.g., one workflow run at a time.
//!
//! # See Also
//!
//! 1. [PEP 503 - Simple Repository API](https://peps.python.org/pep-0503/)

pub mod config;
pub mod index;
pub mod inputs;
pub mod name;
pub mod store;
pub mod workflow;

pub use crate::{
    config::IndexSettings,
    inputs::{Action, ActionInputs, Request},
    name::{NameError, PackageName},
    store::{IndexStore, NewPackage, Release},
};
