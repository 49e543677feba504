// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Action inputs read from the environment.
//!
//! Workflow runners hand their inputs over through environment variables.
//! The action to perform is named by `PKG_ACTION`, and the package metadata
//! that action needs is named by the remaining `PKG_*` variables.

use crate::{
    name::{NameError, PackageName},
    store::{NewPackage, Release},
};

use std::{
    env,
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

/// Environment variable naming the action to perform.
pub const ACTION_VAR: &str = "PKG_ACTION";
/// Environment variable naming the package.
pub const NAME_VAR: &str = "PKG_NAME";
/// Environment variable naming the version.
pub const VERSION_VAR: &str = "PKG_VERSION";
/// Environment variable holding the short description.
pub const SHORT_DESC_VAR: &str = "PKG_SHORT_DESC";
/// Environment variable holding the long description.
pub const LONG_DESC_VAR: &str = "PKG_LONG_DESC";
/// Environment variable holding the homepage.
pub const HOMEPAGE_VAR: &str = "PKG_HOMEPAGE";
/// Environment variable holding the download link.
pub const LINK_VAR: &str = "PKG_LINK";

/// Action to perform on index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Register new package.
    Register,

    /// Add new version to existing package.
    Add,

    /// Update download link of existing version.
    Update,

    /// Delete existing package.
    Delete,
}

impl FromStr for Action {
    type Err = InputError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        match code.trim().to_ascii_uppercase().as_str() {
            "REGISTER" => Ok(Self::Register),
            "ADD" => Ok(Self::Add),
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            _ => Err(InputError::UnknownAction(code.to_owned())),
        }
    }
}

impl Display for Action {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        let code = match self {
            Self::Register => "REGISTER",
            Self::Add => "ADD",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        };
        fmt.write_str(code)
    }
}

/// Fully validated request for index mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Register(NewPackage),
    Add(Release),
    Update(Release),
    Delete(PackageName),
}

/// Raw action inputs.
///
/// Every field is optional, because each action only needs a subset of them.
/// Use [`ActionInputs::into_request`] to check that the action has everything
/// it needs.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ActionInputs {
    pub action: Option<String>,
    pub name: Option<String>,
    pub version: Option<String>,
    pub short_description: Option<String>,
    pub long_description: Option<String>,
    pub homepage: Option<String>,
    pub link: Option<String>,
}

impl ActionInputs {
    /// Read action inputs from current environment.
    ///
    /// Variables that are unset, or not valid unicode, are treated as absent.
    pub fn from_env() -> Self {
        let read = |key: &str| env::var(key).ok();

        Self {
            action: read(ACTION_VAR),
            name: read(NAME_VAR),
            version: read(VERSION_VAR),
            short_description: read(SHORT_DESC_VAR),
            long_description: read(LONG_DESC_VAR),
            homepage: read(HOMEPAGE_VAR),
            link: read(LINK_VAR),
        }
    }

    /// Validate inputs against requirements of requested action.
    ///
    /// Package name, version, and link are required by every action that
    /// uses them. Descriptions and homepage fall back to empty text.
    ///
    /// # Errors
    ///
    /// - Return [`InputError::MissingInput`] if a required variable is absent.
    /// - Return [`InputError::UnknownAction`] if action code is not known.
    /// - Return [`InputError::InvalidName`] if package name is not valid.
    pub fn into_request(self) -> Result<Request> {
        let action: Action = require(self.action, ACTION_VAR)?.parse()?;
        let name = PackageName::new(require(self.name, NAME_VAR)?.trim())?;

        let request = match action {
            Action::Register => Request::Register(NewPackage {
                name,
                version: require(self.version, VERSION_VAR)?,
                short_description: self.short_description.unwrap_or_default(),
                long_description: self.long_description.unwrap_or_default(),
                homepage: self.homepage.unwrap_or_default(),
                link: require(self.link, LINK_VAR)?,
            }),
            Action::Add | Action::Update => {
                let release = Release {
                    name,
                    version: require(self.version, VERSION_VAR)?,
                    link: require(self.link, LINK_VAR)?,
                };
                if action == Action::Add {
                    Request::Add(release)
                } else {
                    Request::Update(release)
                }
            }
            Action::Delete => Request::Delete(name),
        };

        Ok(request)
    }
}

fn require(value: Option<String>, key: &'static str) -> Result<String> {
    value
        .filter(|value| !value.trim().is_empty())
        .ok_or(InputError::MissingInput(key))
}

/// Action input error types.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    /// Required environment variable is not set.
    #[error("required input {0} is not set")]
    MissingInput(&'static str),

    /// Action code is not known.
    #[error("unknown action {0:?}, expected one of REGISTER, ADD, UPDATE, DELETE")]
    UnknownAction(String),

    /// Package name is not valid.
    #[error(transparent)]
    InvalidName(#[from] NameError),
}

/// Friendly result alias :3
type Result<T, E = InputError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use sealed_test::prelude::*;
    use simple_test_case::test_case;

    #[test_case("REGISTER", Action::Register; "register")]
    #[test_case("add", Action::Add; "lower case add")]
    #[test_case(" Update ", Action::Update; "padded update")]
    #[test_case("DELETE", Action::Delete; "delete")]
    #[test]
    fn parse_action_code(code: &str, expect: Action) {
        assert_eq!(code.parse::<Action>(), Ok(expect));
    }

    #[test]
    fn reject_unknown_action_code() {
        assert_eq!(
            "PUBLISH".parse::<Action>(),
            Err(InputError::UnknownAction("PUBLISH".into()))
        );
    }

    #[sealed_test(env = [
        ("PKG_ACTION", "REGISTER"),
        ("PKG_NAME", "Public_Hello"),
        ("PKG_VERSION", "0.1"),
        ("PKG_SHORT_DESC", "Hello"),
        ("PKG_LINK", "https://host/hello-0.1.tar.gz"),
    ])]
    fn register_request_from_env() -> anyhow::Result<()> {
        let result = ActionInputs::from_env().into_request()?;
        let expect = Request::Register(NewPackage {
            name: PackageName::new("Public_Hello")?,
            version: "0.1".into(),
            short_description: "Hello".into(),
            long_description: String::new(),
            homepage: String::new(),
            link: "https://host/hello-0.1.tar.gz".into(),
        });
        assert_eq!(result, expect);

        Ok(())
    }

    #[sealed_test(env = [
        ("PKG_ACTION", "UPDATE"),
        ("PKG_NAME", "public-hello"),
        ("PKG_VERSION", "0.1"),
    ])]
    fn update_request_needs_link() {
        let result = ActionInputs::from_env().into_request();
        assert_eq!(result, Err(InputError::MissingInput(LINK_VAR)));
    }

    #[sealed_test(env = [("PKG_ACTION", "DELETE"), ("PKG_NAME", "public-hello")])]
    fn delete_request_needs_name_only() -> anyhow::Result<()> {
        let result = ActionInputs::from_env().into_request()?;
        assert_eq!(result, Request::Delete(PackageName::new("public-hello")?));

        Ok(())
    }

    #[sealed_test(env = [("PKG_ACTION", "DELETE"), ("PKG_NAME", "/srv/www")])]
    fn reject_name_outside_index_root() {
        let result = ActionInputs::from_env().into_request();
        assert_eq!(
            result,
            Err(InputError::InvalidName(NameError("/srv/www".into())))
        );
    }

    #[test]
    fn missing_action_is_reported_first() {
        let result = ActionInputs::default().into_request();
        assert_eq!(result, Err(InputError::MissingInput(ACTION_VAR)));
    }
}
