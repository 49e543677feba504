// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Static index documents.
//!
//! A static "simple" index is made up of two kinds of HTML document: the
//! __root index__ that lists every registered package, and one
//! __package index__ per registered package that lists every published
//! version of that package.
//!
//! # Document Shape
//!
//! Both documents are expected to follow a small, fixed shape. The root index
//! holds one anchor per package whose link is the normalized package name
//! followed by a slash, e.g., `public-hello/`. Each anchor starts with the
//! display name of the package, and contains at least three spans where the
//! second holds the current version, and the third holds a short description.
//!
//! The package index holds one anchor per version whose link ends in an
//! __egg fragment__, e.g., `https://host/pkg.tar.gz#egg=public-hello-0.2`. The
//! first section of the page carries a summary whose second span holds the
//! latest version label.
//!
//! New entries are never built from scratch. Instead, the last entry of a
//! document is deep cloned, and the relevant fields of the clone are
//! overwritten. Thus, whatever styling the host site uses is preserved.
//!
//! # Document Rewrites
//!
//! Documents are always parsed in full, mutated in memory, and written back in
//! full. There is no partial write protection, and no locking.

pub mod package;
pub mod root;
pub mod template;

pub use crate::index::{package::PackageIndex, root::RootIndex, template::PackageTemplate};

use kuchikiki::{traits::TendrilSink, ElementData, NodeDataRef, NodeRef};
use std::{
    fs::{read_to_string, write},
    path::{Path, PathBuf},
};
use tracing::debug;

/// Parsed HTML document bound to a file path.
#[derive(Debug, Clone)]
pub struct HtmlDocument {
    path: PathBuf,
    root: NodeRef,
}

impl HtmlDocument {
    /// Parse HTML document from file.
    ///
    /// # Errors
    ///
    /// - Return [`IndexError::ReadDocument`] if file cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        debug!("parse document: {:?}", path.display());
        let content = read_to_string(&path).map_err(|err| IndexError::ReadDocument {
            source: err,
            path: path.clone(),
        })?;

        Ok(Self::parse(path, content))
    }

    /// Parse HTML document from string to be saved at target path later.
    pub fn parse(path: impl Into<PathBuf>, content: impl AsRef<str>) -> Self {
        Self {
            path: path.into(),
            root: kuchikiki::parse_html().one(content.as_ref()),
        }
    }

    /// Path document will be written to.
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// All anchor elements in document order.
    pub fn anchors(&self) -> Vec<NodeDataRef<ElementData>> {
        select_all(&self.root, "a")
    }

    /// First element matching CSS selector.
    pub fn select_first(&self, selector: &str) -> Option<NodeDataRef<ElementData>> {
        self.root.select_first(selector).ok()
    }

    /// Serialize document back into HTML.
    pub fn to_html(&self) -> Result<String> {
        let mut bytes = Vec::new();
        self.root
            .serialize(&mut bytes)
            .map_err(|err| IndexError::WriteDocument {
                source: err,
                path: self.path.clone(),
            })?;

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Rewrite document file in full.
    ///
    /// # Errors
    ///
    /// - Return [`IndexError::WriteDocument`] if file cannot be written.
    pub fn save(&self) -> Result<()> {
        debug!("write document: {:?}", self.path.display());
        write(&self.path, self.to_html()?).map_err(|err| IndexError::WriteDocument {
            source: err,
            path: self.path.clone(),
        })
    }

    pub(crate) fn malformed(&self, reason: &'static str) -> IndexError {
        IndexError::Malformed {
            path: self.path.clone(),
            reason,
        }
    }
}

/// Link of anchor element, if any.
pub fn href(anchor: &NodeDataRef<ElementData>) -> Option<String> {
    anchor.attributes.borrow().get("href").map(str::to_owned)
}

/// Overwrite link of anchor element.
pub fn set_href(anchor: &NodeDataRef<ElementData>, link: impl Into<String>) {
    anchor.attributes.borrow_mut().insert("href", link.into());
}

/// All elements under node matching CSS selector in document order.
pub fn select_all(node: &NodeRef, selector: &str) -> Vec<NodeDataRef<ElementData>> {
    node.select(selector)
        .map(|found| found.collect())
        .unwrap_or_default()
}

/// Replace all content of node with a single text node.
pub fn set_text(node: &NodeRef, text: impl Into<String>) {
    // INVARIANT: Collect first, detaching while walking siblings cuts the walk short.
    for child in node.children().collect::<Vec<_>>() {
        child.detach();
    }
    node.append(NodeRef::new_text(text.into()));
}

/// Replace leading text of node, leaving the rest of its content alone.
///
/// Inserts a new leading text node when the node does not start with one.
pub fn set_leading_text(node: &NodeRef, text: impl Into<String>) {
    let text = text.into();
    match node.first_child() {
        Some(child) => match child.as_text() {
            Some(content) => *content.borrow_mut() = text,
            None => child.insert_before(NodeRef::new_text(text)),
        },
        None => node.append(NodeRef::new_text(text)),
    }
}

/// Copy node along with all of its descendants.
///
/// Cloning a [`NodeRef`] only clones the reference, so the copy has to be
/// rebuilt node by node.
pub fn deep_clone(node: &NodeRef) -> NodeRef {
    let copy = NodeRef::new(node.data().clone());
    for child in node.children() {
        copy.append(deep_clone(&child));
    }

    copy
}

/// Index document error types.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// Document cannot be read.
    #[error("failed to read index document at {:?}", path.display())]
    ReadDocument {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Document cannot be written.
    #[error("failed to write index document at {:?}", path.display())]
    WriteDocument {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Document does not follow expected shape.
    #[error("malformed index document at {:?}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: &'static str },
}

/// Friendly result alias :3
pub type Result<T, E = IndexError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fragment(doc: &HtmlDocument) -> String {
        let body = doc.select_first("body").unwrap();
        let mut bytes = Vec::new();
        for child in body.as_node().children() {
            child.serialize(&mut bytes).unwrap();
        }
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn deep_clone_detaches_copy() {
        let doc = HtmlDocument::parse(
            "index.html",
            r#"<a href="one/">one<span>1.0</span></a>"#,
        );
        let anchor = doc.anchors().pop().unwrap();
        let copy = deep_clone(anchor.as_node());
        anchor.as_node().insert_after(copy.clone());

        set_leading_text(&copy, "two");
        let copy = copy.into_element_ref().unwrap();
        set_href(&copy, "two/");
        set_text(select_all(copy.as_node(), "span")[0].as_node(), "2.0");

        assert_eq!(
            fragment(&doc),
            r#"<a href="one/">one<span>1.0</span></a><a href="two/">two<span>2.0</span></a>"#
        );
    }

    #[test]
    fn set_leading_text_without_text() {
        let doc = HtmlDocument::parse("index.html", r#"<a href="x/"><span>1</span></a><a href="y/"></a>"#);
        let anchors = doc.anchors();
        set_leading_text(anchors[0].as_node(), "x");
        set_leading_text(anchors[1].as_node(), "y");

        assert_eq!(
            fragment(&doc),
            r#"<a href="x/">x<span>1</span></a><a href="y/">y</a>"#
        );
    }

    #[test]
    fn href_of_anchor() {
        let doc = HtmlDocument::parse("index.html", r#"<a href="x/">x</a><a name="top"></a>"#);
        let anchors = doc.anchors();
        assert_eq!(href(&anchors[0]), Some("x/".into()));
        assert_eq!(href(&anchors[1]), None);
    }
}
