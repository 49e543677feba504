// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Package name handling.
//!
//! Package names are compared in their __normalized__ form only. Users may
//! register "Foo_Bar.Baz", but the index will always refer to it as
//! "foo-bar-baz" for directory names, root index links, and egg fragments.
//!
//! Only names that PEP 508 accepts are allowed in: ASCII letters, digits,
//! `-`, `_`, and `.`, starting and ending with a letter or digit. Since the
//! normalized name doubles as a directory name under the index root, this also
//! keeps every package directory inside of the index root.
//!
//! # See Also
//!
//! - [PEP 503 - Normalized Names](https://peps.python.org/pep-0503/#normalized-names)
//! - [PEP 508 - Names](https://peps.python.org/pep-0508/#names)

use regex::Regex;
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::PathBuf,
    str::FromStr,
    sync::OnceLock,
};

/// Normalize package name according to PEP 503.
///
/// Collapses runs of `-`, `_`, and `.` into a single `-`, and lower-cases the
/// result.
pub fn normalize(name: impl AsRef<str>) -> String {
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();
    let separators = SEPARATORS.get_or_init(|| Regex::new(r"[-_.]+").unwrap());

    separators
        .replace_all(name.as_ref(), "-")
        .to_lowercase()
}

/// Name of a package as given by the user, along with its normalized form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageName {
    display: String,
    normalized: String,
}

impl PackageName {
    /// Construct new package name.
    ///
    /// # Errors
    ///
    /// - Return [`NameError`] if name is not a valid package name.
    pub fn new(name: impl Into<String>) -> Result<Self, NameError> {
        let display = name.into();

        static VALID: OnceLock<Regex> = OnceLock::new();
        let valid = VALID.get_or_init(|| {
            Regex::new(r"^(?i:[a-z0-9]|[a-z0-9][a-z0-9._-]*[a-z0-9])$").unwrap()
        });
        if !valid.is_match(&display) {
            return Err(NameError(display));
        }

        let normalized = normalize(&display);
        Ok(Self {
            display,
            normalized,
        })
    }

    /// Name exactly as the user provided it.
    pub fn display_name(&self) -> &str {
        &self.display
    }

    /// PEP 503 normalized name.
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// Link used by the root index to refer to this package.
    pub fn root_href(&self) -> String {
        format!("{}/", self.normalized)
    }

    /// Directory housing the package index, relative to the index root.
    pub fn directory(&self) -> PathBuf {
        PathBuf::from(&self.normalized)
    }

    /// Egg fragment identifying a version of this package.
    pub fn egg(&self, version: impl AsRef<str>) -> String {
        format!("#egg={}-{}", self.normalized, version.as_ref())
    }
}

impl Display for PackageName {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(&self.normalized)
    }
}

impl FromStr for PackageName {
    type Err = NameError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::new(name)
    }
}

/// Package name contains characters outside of `[A-Za-z0-9._-]`, or does not
/// start and end with a letter or digit.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid package name {0:?}")]
pub struct NameError(pub String);

#[cfg(test)]
mod tests {
    use super::*;
    use simple_test_case::test_case;

    #[test_case("Foo_Bar.Baz", "foo-bar-baz"; "mixed separators")]
    #[test_case("friendly-bard", "friendly-bard"; "already normalized")]
    #[test_case("Friendly__.--Bard", "friendly-bard"; "separator runs")]
    #[test_case("FRIENDLY.BARD", "friendly-bard"; "upper case")]
    #[test_case("_private_", "-private-"; "leading and trailing separators")]
    #[test]
    fn normalize_package_name(input: &str, expect: &str) {
        assert_eq!(normalize(input), expect);
    }

    #[test_case("/tmp/escape"; "absolute path")]
    #[test_case("../escape"; "parent directory")]
    #[test_case("nested/name"; "path separator")]
    #[test_case("_private_"; "leading separator")]
    #[test_case("hello world"; "whitespace")]
    #[test_case(""; "empty")]
    #[test]
    fn reject_invalid_package_name(input: &str) {
        assert_eq!(PackageName::new(input), Err(NameError(input.into())));
    }

    #[test]
    fn package_name_derived_forms() -> Result<(), NameError> {
        let name: PackageName = "Public_Hello".parse()?;
        assert_eq!(name.display_name(), "Public_Hello");
        assert_eq!(name.normalized(), "public-hello");
        assert_eq!(name.root_href(), "public-hello/");
        assert_eq!(name.directory(), PathBuf::from("public-hello"));
        assert_eq!(name.egg("0.2"), "#egg=public-hello-0.2");
        assert_eq!(name.to_string(), "public-hello");
        assert_eq!(PackageName::new("a")?.normalized(), "a");

        Ok(())
    }
}
