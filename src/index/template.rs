// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Package index template.
//!
//! New package indexes are materialized from a plain text template by
//! substituting the following placeholders:
//!
//! - `_package_name` with the display name of the package.
//! - `_version` with the first version.
//! - `_link` with the download link plus the version's egg fragment.
//! - `_homepage` with the homepage of the package.
//! - `_long_description` with the long description of the package.
//!
//! All placeholders are substituted in one pass, so a value that happens to
//! contain a placeholder is never substituted again.
//!
//! Every substituted value is HTML escaped, the long description included.
//! Thus, markup inside of a long description is shown as plain text instead of
//! being rendered. Style long descriptions through the template instead.

use crate::{name::PackageName, store::NewPackage};

use regex::{Captures, Regex};
use std::{fs::read_to_string, path::PathBuf, sync::OnceLock};
use tracing::debug;

/// Template to materialize package indexes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageTemplate {
    content: String,
}

impl PackageTemplate {
    /// Read template from file.
    ///
    /// # Errors
    ///
    /// - Return [`TemplateError`] if file cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, TemplateError> {
        let path = path.into();
        debug!("read template: {:?}", path.display());
        let content = read_to_string(&path).map_err(|err| TemplateError {
            source: err,
            path,
        })?;

        Ok(Self { content })
    }

    /// Render package index for new package.
    pub fn render(&self, package: &NewPackage) -> String {
        let name: &PackageName = &package.name;
        let link = format!("{}{}", package.link, name.egg(&package.version));

        static PLACEHOLDERS: OnceLock<Regex> = OnceLock::new();
        let placeholders = PLACEHOLDERS.get_or_init(|| {
            Regex::new(r"_package_name|_version|_link|_homepage|_long_description").unwrap()
        });

        placeholders
            .replace_all(&self.content, |caps: &Captures<'_>| {
                let value = match &caps[0] {
                    "_package_name" => name.display_name(),
                    "_version" => package.version.as_str(),
                    "_link" => link.as_str(),
                    "_homepage" => package.homepage.as_str(),
                    _ => package.long_description.as_str(),
                };
                escape(value)
            })
            .into_owned()
    }
}

impl From<&str> for PackageTemplate {
    fn from(content: &str) -> Self {
        Self {
            content: content.to_owned(),
        }
    }
}

impl From<String> for PackageTemplate {
    fn from(content: String) -> Self {
        Self { content }
    }
}

/// Template file cannot be read.
#[derive(Debug, thiserror::Error)]
#[error("failed to read package template at {:?}", path.display())]
pub struct TemplateError {
    #[source]
    source: std::io::Error,
    path: PathBuf,
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn render_all_placeholders() {
        let template = PackageTemplate::from(indoc! {r#"
            <title>Links for _package_name</title>
            <span class="version">_version</span>
            <a href="_homepage">Homepage</a>
            <p>_long_description</p>
            <a class="card" href="_link">_package_name</a>
        "#});
        let package = NewPackage {
            name: PackageName::new("Public_Hello").unwrap(),
            version: "0.1".into(),
            short_description: "Hello".into(),
            long_description: "Say <hello> & wave".into(),
            homepage: "https://example.org/hello".into(),
            link: "https://host/hello-0.1.tar.gz".into(),
        };

        let expect = indoc! {r#"
            <title>Links for Public_Hello</title>
            <span class="version">0.1</span>
            <a href="https://example.org/hello">Homepage</a>
            <p>Say &lt;hello&gt; &amp; wave</p>
            <a class="card" href="https://host/hello-0.1.tar.gz#egg=public-hello-0.1">Public_Hello</a>
        "#};
        assert_eq!(template.render(&package), expect);
    }

    #[test]
    fn render_does_not_substitute_values() {
        let template = PackageTemplate::from("_package_name _version");
        let package = NewPackage {
            name: PackageName::new("my_version").unwrap(),
            version: "1.0".into(),
            short_description: String::new(),
            long_description: String::new(),
            homepage: String::new(),
            link: String::new(),
        };

        assert_eq!(template.render(&package), "my_version 1.0");
    }
}
