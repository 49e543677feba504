// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Package index listing of all published versions of one package.
//!
//! Each version is an anchor whose link ends in an egg fragment, i.e.,
//! `#egg=<normalized-name>-<version>`. Anchors without an egg fragment, such
//! as a link back to the root index or to the homepage, are left alone.

use crate::{
    index::{deep_clone, href, select_all, set_href, set_text, HtmlDocument, Result},
    name::PackageName,
};

use kuchikiki::{ElementData, NodeDataRef};
use std::path::PathBuf;

const EGG_MARKER: &str = "#egg=";
const LATEST_VERSION_SPAN: usize = 1;

/// Published version of package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionEntry {
    /// Version string taken from egg fragment.
    pub version: String,

    /// Full download link, egg fragment included.
    pub link: String,
}

/// Package index document.
#[derive(Debug, Clone)]
pub struct PackageIndex {
    name: PackageName,
    document: HtmlDocument,
}

impl PackageIndex {
    /// Open package index of target package at target path.
    pub fn open(name: PackageName, path: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            name,
            document: HtmlDocument::open(path)?,
        })
    }

    /// Wrap already parsed document.
    pub fn from_document(name: PackageName, document: HtmlDocument) -> Self {
        Self { name, document }
    }

    /// Determine if version is already published.
    pub fn contains_version(&self, version: &str) -> bool {
        self.find_version(version).is_some()
    }

    /// List all published versions in document order.
    pub fn versions(&self) -> Vec<VersionEntry> {
        let prefix = format!("{}-", self.name.normalized());
        self.version_anchors()
            .iter()
            .filter_map(|anchor| {
                let link = href(anchor)?;
                let (_, egg) = link.rsplit_once(EGG_MARKER)?;
                let version = egg.strip_prefix(&prefix).unwrap_or(egg).to_owned();

                Some(VersionEntry { version, link })
            })
            .collect()
    }

    /// Append new version.
    ///
    /// Deep clones the last version anchor, points the clone at the new link,
    /// and places it right after the anchor it was cloned from. The latest
    /// version label is changed to the new version.
    ///
    /// # Errors
    ///
    /// - Return [`IndexError::Malformed`] if document has no version anchor to
    ///   clone, or no latest version label.
    ///
    /// [`IndexError::Malformed`]: crate::index::IndexError::Malformed
    pub fn append_version(&mut self, version: &str, link: &str) -> Result<()> {
        let last = self
            .version_anchors()
            .pop()
            .ok_or_else(|| self.document.malformed("no version entry to copy"))?;

        let copy = deep_clone(last.as_node())
            .into_element_ref()
            .ok_or_else(|| self.document.malformed("version entry is not an element"))?;
        set_href(&copy, self.versioned_link(version, link));
        last.as_node().insert_after(copy.as_node().clone());

        self.set_latest_version(version)
    }

    /// Point existing version at new download link.
    ///
    /// Returns `false` if no anchor carries the version's egg fragment.
    pub fn relink_version(&mut self, version: &str, link: &str) -> bool {
        match self.find_version(version) {
            Some(anchor) => {
                set_href(&anchor, self.versioned_link(version, link));
                true
            }
            None => false,
        }
    }

    /// Rewrite package index file in full.
    pub fn save(&self) -> Result<()> {
        self.document.save()
    }

    /// Underlying document.
    pub fn document(&self) -> &HtmlDocument {
        &self.document
    }

    fn versioned_link(&self, version: &str, link: &str) -> String {
        format!("{link}{}", self.name.egg(version))
    }

    fn version_anchors(&self) -> Vec<NodeDataRef<ElementData>> {
        self.document
            .anchors()
            .into_iter()
            .filter(|anchor| href(anchor).is_some_and(|link| link.contains(EGG_MARKER)))
            .collect()
    }

    fn find_version(&self, version: &str) -> Option<NodeDataRef<ElementData>> {
        let egg = self.name.egg(version);
        self.document
            .anchors()
            .into_iter()
            .find(|anchor| href(anchor).is_some_and(|link| link.ends_with(&egg)))
    }

    fn set_latest_version(&self, version: &str) -> Result<()> {
        let summary = self
            .document
            .select_first("body div")
            .and_then(|div| div.as_node().select_first("section").ok())
            .ok_or_else(|| self.document.malformed("missing summary section"))?;
        let spans = select_all(summary.as_node(), "span");
        let label = spans
            .get(LATEST_VERSION_SPAN)
            .ok_or_else(|| self.document.malformed("missing latest version label"))?;
        set_text(label.as_node(), version);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexError;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    const PACKAGE: &str = indoc! {r#"
        <!DOCTYPE html>
        <html>
          <body>
            <div class="container">
              <section class="summary">
                <h1>public-hello</h1>
                <span>Latest version:</span>
                <span class="version">0.1</span>
              </section>
              <section class="versions">
                <a href="../">Back</a>
                <a class="card" href="https://host/hello-0.1.tar.gz#egg=public-hello-0.1">public-hello</a>
              </section>
            </div>
          </body>
        </html>
    "#};

    fn package_index() -> PackageIndex {
        PackageIndex::from_document(
            PackageName::new("Public_Hello").unwrap(),
            HtmlDocument::parse("public-hello/index.html", PACKAGE),
        )
    }

    fn latest_version(index: &PackageIndex) -> String {
        index
            .document()
            .select_first("span.version")
            .unwrap()
            .as_node()
            .text_contents()
    }

    #[test]
    fn list_versions_skips_plain_links() {
        let index = package_index();
        assert_eq!(
            index.versions(),
            vec![VersionEntry {
                version: "0.1".into(),
                link: "https://host/hello-0.1.tar.gz#egg=public-hello-0.1".into(),
            }]
        );
    }

    #[test]
    fn append_version_updates_latest_label() -> anyhow::Result<()> {
        let mut index = package_index();
        assert!(!index.contains_version("0.2"));

        index.append_version("0.2", "https://host/hello-0.2.tar.gz")?;

        assert!(index.contains_version("0.2"));
        let versions: Vec<_> = index.versions().into_iter().map(|entry| entry.version).collect();
        assert_eq!(versions, vec!["0.1", "0.2"]);
        assert_eq!(latest_version(&index), "0.2");

        Ok(())
    }

    #[test]
    fn append_version_needs_entry_to_copy() {
        let mut index = PackageIndex::from_document(
            PackageName::new("foo").unwrap(),
            HtmlDocument::parse("foo/index.html", r#"<a href="../">Back</a>"#),
        );
        let result = index.append_version("1.0", "https://host/foo.tar.gz");
        assert!(matches!(result, Err(IndexError::Malformed { .. })));
    }

    #[test]
    fn relink_matching_version_only() {
        let mut index = package_index();
        assert!(index.relink_version("0.1", "https://mirror/hello-0.1.tar.gz"));
        assert!(!index.relink_version("9.9", "https://mirror/hello-9.9.tar.gz"));

        assert_eq!(
            index.versions()[0].link,
            "https://mirror/hello-0.1.tar.gz#egg=public-hello-0.1"
        );
    }
}
