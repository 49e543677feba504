// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Root index listing of all registered packages.

use crate::{
    index::{
        deep_clone, href, select_all, set_href, set_leading_text, set_text, HtmlDocument, Result,
    },
    name::PackageName,
};

use kuchikiki::{ElementData, NodeDataRef};
use std::path::PathBuf;

const VERSION_SPAN: usize = 1;
const DESCRIPTION_SPAN: usize = 2;

/// Entry of root index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageEntry {
    /// Normalized name taken from entry link.
    pub name: String,

    /// Display name of package.
    pub display_name: String,

    /// Current version.
    pub version: String,

    /// Short description.
    pub description: String,
}

/// Root index document.
#[derive(Debug, Clone)]
pub struct RootIndex {
    document: HtmlDocument,
}

impl RootIndex {
    /// Open root index at target path.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            document: HtmlDocument::open(path)?,
        })
    }

    /// Wrap already parsed document.
    pub fn from_document(document: HtmlDocument) -> Self {
        Self { document }
    }

    /// Determine if package is listed.
    pub fn contains(&self, name: &PackageName) -> bool {
        self.find(name).is_some()
    }

    /// List all package entries in document order.
    ///
    /// Anchors that do not point at a package directory are skipped.
    pub fn entries(&self) -> Vec<PackageEntry> {
        self.document
            .anchors()
            .iter()
            .filter_map(|anchor| {
                let link = href(anchor)?;
                let name = link.strip_suffix('/')?.to_owned();
                let spans = select_all(anchor.as_node(), "span");
                let text_of = |index: usize| {
                    spans
                        .get(index)
                        .map(|span| span.as_node().text_contents().trim().to_owned())
                        .unwrap_or_default()
                };
                let display_name = leading_text(anchor).unwrap_or_else(|| name.clone());

                Some(PackageEntry {
                    version: text_of(VERSION_SPAN),
                    description: text_of(DESCRIPTION_SPAN),
                    name,
                    display_name,
                })
            })
            .collect()
    }

    /// Append new package entry.
    ///
    /// Deep clones the last anchor in the document, overwrites its link,
    /// display name, version, and description, then places it right after the
    /// anchor it was cloned from.
    ///
    /// # Errors
    ///
    /// - Return [`IndexError::Malformed`] if document has no anchor to clone,
    ///   or the anchor lacks version and description spans.
    ///
    /// [`IndexError::Malformed`]: crate::index::IndexError::Malformed
    pub fn append_package(
        &mut self,
        name: &PackageName,
        version: &str,
        description: &str,
    ) -> Result<()> {
        let last = self
            .document
            .anchors()
            .pop()
            .ok_or_else(|| self.document.malformed("no package entry to copy"))?;

        let copy = deep_clone(last.as_node())
            .into_element_ref()
            .ok_or_else(|| self.document.malformed("package entry is not an element"))?;
        set_href(&copy, name.root_href());
        set_leading_text(copy.as_node(), name.display_name());
        self.set_span(&copy, VERSION_SPAN, version)?;
        self.set_span(&copy, DESCRIPTION_SPAN, description)?;

        last.as_node().insert_after(copy.as_node().clone());

        Ok(())
    }

    /// Change current version shown for package.
    ///
    /// # Errors
    ///
    /// - Return [`IndexError::Malformed`] if package is not listed, or its
    ///   entry lacks a version span.
    ///
    /// [`IndexError::Malformed`]: crate::index::IndexError::Malformed
    pub fn set_version(&mut self, name: &PackageName, version: &str) -> Result<()> {
        let anchor = self
            .find(name)
            .ok_or_else(|| self.document.malformed("package entry not found"))?;

        self.set_span(&anchor, VERSION_SPAN, version)
    }

    /// Remove package entry.
    ///
    /// Returns `false` if package was not listed to begin with.
    pub fn remove_package(&mut self, name: &PackageName) -> bool {
        match self.find(name) {
            Some(anchor) => {
                anchor.as_node().detach();
                true
            }
            None => false,
        }
    }

    /// Rewrite root index file in full.
    pub fn save(&self) -> Result<()> {
        self.document.save()
    }

    /// Underlying document.
    pub fn document(&self) -> &HtmlDocument {
        &self.document
    }

    fn find(&self, name: &PackageName) -> Option<NodeDataRef<ElementData>> {
        let target = name.root_href();
        self.document
            .anchors()
            .into_iter()
            .find(|anchor| href(anchor).as_deref() == Some(target.as_str()))
    }

    fn set_span(&self, anchor: &NodeDataRef<ElementData>, index: usize, text: &str) -> Result<()> {
        let spans = select_all(anchor.as_node(), "span");
        let span = spans
            .get(index)
            .ok_or_else(|| self.document.malformed("package entry is missing spans"))?;
        set_text(span.as_node(), text);

        Ok(())
    }
}

fn leading_text(anchor: &NodeDataRef<ElementData>) -> Option<String> {
    let child = anchor.as_node().first_child()?;
    let text = child.as_text()?.borrow().trim().to_owned();

    Some(text)
}
