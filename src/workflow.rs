// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Workflow dispatch choice list handling.
//!
//! Workflows that act on an already registered package, e.g., delete and
//! update, usually offer the package name as a __choice__ input so that the
//! user cannot trigger them on a package that does not exist:
//!
//! ```yaml
//! on:
//!   workflow_dispatch:
//!     inputs:
//!       package_name:
//!         type: choice
//!         options:
//!           - public-hello
//!           - friendly-bard
//! ```
//!
//! Pyndex keeps that choice list in step with the root index. Registering a
//! package inserts its normalized name, and deleting a package removes it.
//!
//! # Line Based Editing
//!
//! Workflow files are hand written, and usually carry comments. A YAML
//! serializer would throw all of that away. Thus, current choices are read
//! through a YAML parser, but only the lines of the `options:` block list are
//! rewritten. Everything else is written back exactly as it was read, line
//! endings included. Comments inside of the block list itself do not survive
//! a rewrite. Flow style lists, e.g., `options: [a, b]`, are not supported.
//!
//! Edits happen in two steps. [`WorkflowFile::draft`] reads the file and
//! performs the edit in memory, and [`WorkflowDraft::commit`] writes the
//! result. Thus, callers can find out whether a workflow file can be edited at
//! all before they touch anything else.

use serde_yaml::Value;
use std::{
    collections::BTreeSet,
    fs::{read_to_string, write},
    path::PathBuf,
};
use tracing::{debug, warn};

/// Manage package choice list in workflow file.
#[derive(Clone, Debug)]
pub struct WorkflowFile {
    path: PathBuf,
    input: String,
}

impl WorkflowFile {
    /// Construct new workflow file handle.
    ///
    /// Nothing is read until [`WorkflowFile::draft`] or [`WorkflowFile::edit`]
    /// is called.
    pub fn new(path: impl Into<PathBuf>, input: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            input: input.into(),
        }
    }

    /// Edit package choices in memory.
    ///
    /// Read current choices into [`ChoiceEdit`] instance, and directly edit
    /// each choice. Returns `None` if the workflow file does not exist, or if
    /// the edit changed nothing.
    ///
    /// # Errors
    ///
    /// - Return [`Error::ReadWorkflowFile`] if workflow file cannot be read.
    /// - Return [`Error::ParseWorkflowFile`] if workflow file is not valid
    ///   YAML.
    /// - Return [`Error::MissingChoices`] if workflow file has no block list
    ///   of options for the configured input.
    pub fn draft<E>(&self, editor: E) -> Result<Option<WorkflowDraft>>
    where
        E: FnOnce(&mut ChoiceEdit),
    {
        if !self.path.exists() {
            warn!("skip missing workflow file {:?}", self.path.display());
            return Ok(None);
        }

        let content = read_to_string(&self.path).map_err(|err| Error::ReadWorkflowFile {
            source: err,
            path: self.path.clone(),
        })?;

        let document: Value =
            serde_yaml::from_str(&content).map_err(|err| Error::ParseWorkflowFile {
                source: err,
                path: self.path.clone(),
            })?;

        let missing = || Error::MissingChoices {
            input: self.input.clone(),
            path: self.path.clone(),
        };
        let current = find_options(&document, &self.input).ok_or_else(missing)?;
        let block = ChoiceBlock::locate(&content, &self.input).ok_or_else(missing)?;

        let mut choices = ChoiceEdit::from_iter(current);
        editor(&mut choices);

        if !choices.changed {
            return Ok(None);
        }

        Ok(Some(WorkflowDraft {
            path: self.path.clone(),
            content: block.splice(&content, &choices),
        }))
    }

    /// Edit package choices, and write the results back into the workflow
    /// file.
    ///
    /// # Errors
    ///
    /// - Return [`Error::WriteWorkflowFile`] if choices cannot be written to
    ///   workflow file.
    /// - Return any error [`WorkflowFile::draft`] returns.
    pub fn edit<E>(&self, editor: E) -> Result<()>
    where
        E: FnOnce(&mut ChoiceEdit),
    {
        match self.draft(editor)? {
            Some(draft) => draft.commit(),
            None => Ok(()),
        }
    }
}

/// Edited workflow file waiting to be written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkflowDraft {
    path: PathBuf,
    content: String,
}

impl WorkflowDraft {
    /// Write edited workflow file in full.
    ///
    /// # Errors
    ///
    /// - Return [`Error::WriteWorkflowFile`] if workflow file cannot be
    ///   written.
    pub fn commit(&self) -> Result<()> {
        debug!("rewrite choices of {:?}", self.path.display());
        write(&self.path, &self.content).map_err(|err| Error::WriteWorkflowFile {
            source: err,
            path: self.path.clone(),
        })
    }
}

/// Package choice editor.
///
/// # Invariant
///
/// - No duplicate choices.
/// - Choices are always kept in sorted order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChoiceEdit {
    choices: BTreeSet<String>,
    changed: bool,
}

impl ChoiceEdit {
    /// Construct new choice editor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a choice.
    pub fn insert_choice(&mut self, choice: impl Into<String>) {
        if self.choices.insert(choice.into()) {
            self.changed = true;
        }
    }

    /// Remove a choice.
    pub fn remove_choice(&mut self, choice: impl AsRef<str>) {
        if self.choices.remove(choice.as_ref()) {
            self.changed = true;
        }
    }

    /// Iterate through current choices in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.choices.iter().map(String::as_str)
    }
}

impl<S> FromIterator<S> for ChoiceEdit
where
    S: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            choices: iter.into_iter().map(Into::into).collect(),
            changed: false,
        }
    }
}

/// Find options of first input with target name anywhere in document.
///
/// An `options:` key without any items counts as an empty list.
fn find_options(node: &Value, input: &str) -> Option<Vec<String>> {
    let mapping = node.as_mapping()?;
    if let Some(options) = mapping.get(input).and_then(|input| input.get("options")) {
        return match options {
            Value::Null => Some(Vec::new()),
            Value::Sequence(items) => Some(items.iter().filter_map(choice_text).collect()),
            _ => None,
        };
    }

    mapping.values().find_map(|value| find_options(value, input))
}

fn choice_text(item: &Value) -> Option<String> {
    match item {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Location of `options:` block list inside workflow file.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ChoiceBlock {
    /// Index of first line after `options:` key.
    start: usize,

    /// Index of first line after last list item.
    end: usize,

    /// Indentation of list items.
    indent: usize,
}

impl ChoiceBlock {
    fn locate(content: &str, input: &str) -> Option<Self> {
        let lines: Vec<&str> = content.lines().collect();
        let input_key = format!("{input}:");

        let input_line = lines.iter().position(|line| line.trim() == input_key)?;
        let input_indent = indentation(lines[input_line]);

        // INVARIANT: Options key must be nested under input key.
        let mut options_line = None;
        for (index, line) in lines.iter().enumerate().skip(input_line + 1) {
            if line.trim().is_empty() {
                continue;
            }
            if indentation(line) <= input_indent {
                break;
            }
            if line.trim() == "options:" {
                options_line = Some(index);
                break;
            }
        }
        let options_line = options_line?;
        let options_indent = indentation(lines[options_line]);

        let start = options_line + 1;
        let mut end = start;
        let mut indent = None;
        for (index, line) in lines.iter().enumerate().skip(start) {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            if !trimmed.starts_with("- ") || indentation(line) < options_indent {
                break;
            }
            indent.get_or_insert(indentation(line));
            end = index + 1;
        }

        Some(Self {
            start,
            end,
            indent: indent.unwrap_or(options_indent + 2),
        })
    }

    fn splice(&self, content: &str, choices: &ChoiceEdit) -> String {
        let lines: Vec<&str> = content.lines().collect();
        let newline = if content.contains("\r\n") { "\r\n" } else { "\n" };
        let padding = " ".repeat(self.indent);

        let mut out = String::with_capacity(content.len());
        for line in &lines[..self.start] {
            out.push_str(line);
            out.push_str(newline);
        }
        for choice in choices.iter() {
            out.push_str(&padding);
            out.push_str("- ");
            out.push_str(choice);
            out.push_str(newline);
        }
        for line in &lines[self.end..] {
            out.push_str(line);
            out.push_str(newline);
        }

        out
    }
}

fn indentation(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Workflow choice management error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Workflow file cannot be read from.
    #[error("failed to read from workflow file at {:?}", path.display())]
    ReadWorkflowFile {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Workflow file is not valid YAML.
    #[error("failed to parse workflow file at {:?}", path.display())]
    ParseWorkflowFile {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },

    /// Workflow file cannot be written to.
    #[error("failed to write to workflow file at {:?}", path.display())]
    WriteWorkflowFile {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Workflow file does not list choices for input.
    #[error("no block list of options for input {input:?} in {:?}", path.display())]
    MissingChoices { input: String, path: PathBuf },
}

/// Friendly result alias :3
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    const WORKFLOW: &str = indoc! {r#"
        name: Delete package

        on:
          workflow_dispatch:
            inputs:
              package_name:
                description: Package name
                required: true
                type: choice
                options:
                  - public-hello
                  - "friendly-bard"
              confirm:
                type: boolean

        jobs:
          delete:
            runs-on: ubuntu-latest
    "#};

    #[test]
    fn choice_edit_keeps_sorted_unique_choices() {
        let mut editor = ChoiceEdit::from_iter(["public-hello", "friendly-bard"]);

        editor.insert_choice("alpha");
        editor.insert_choice("public-hello");
        editor.remove_choice("friendly-bard");

        assert_eq!(editor.iter().collect::<Vec<_>>(), vec!["alpha", "public-hello"]);
        assert!(editor.changed);
    }

    #[test]
    fn locate_choice_block() -> anyhow::Result<()> {
        let block = ChoiceBlock::locate(WORKFLOW, "package_name").unwrap();
        assert_eq!(
            block,
            ChoiceBlock {
                start: 10,
                end: 12,
                indent: 10
            }
        );

        let document: Value = serde_yaml::from_str(WORKFLOW)?;
        assert_eq!(
            find_options(&document, "package_name"),
            Some(vec!["public-hello".into(), "friendly-bard".into()])
        );

        Ok(())
    }

    #[test]
    fn locate_choice_block_only_under_input() {
        let content = indoc! {r#"
            inputs:
              package_name:
                type: string
              other:
                options:
                  - a
        "#};
        assert_eq!(ChoiceBlock::locate(content, "package_name"), None);
    }

    #[test]
    fn splice_empty_choice_block() {
        let content = indoc! {r#"
            inputs:
              package_name:
                options:
              confirm:
                type: boolean
        "#};
        let block = ChoiceBlock::locate(content, "package_name").unwrap();
        let choices = ChoiceEdit::from_iter(["public-hello"]);

        let expect = indoc! {r#"
            inputs:
              package_name:
                options:
                  - public-hello
              confirm:
                type: boolean
        "#};
        assert_eq!(block.splice(content, &choices), expect);
    }

    #[sealed_test]
    fn edit_workflow_file() -> anyhow::Result<()> {
        write("delete.yml", WORKFLOW)?;
        let workflow = WorkflowFile::new("delete.yml", "package_name");

        workflow.edit(|choices| {
            choices.insert_choice("zebra");
            choices.remove_choice("public-hello");
        })?;

        let result = read_to_string("delete.yml")?;
        let expect = WORKFLOW.replace(
            "          - public-hello\n          - \"friendly-bard\"\n",
            "          - friendly-bard\n          - zebra\n",
        );
        assert_eq!(result, expect);

        Ok(())
    }

    #[sealed_test]
    fn edit_choices_with_comments() -> anyhow::Result<()> {
        let content = indoc! {r#"
            inputs:
              package_name:
                type: choice
                options:
                  # keep sorted
                  - public-hello  # first package

                  - zeta
              confirm:
                type: boolean
        "#};
        write("delete.yml", content)?;
        let workflow = WorkflowFile::new("delete.yml", "package_name");

        workflow.edit(|choices| choices.remove_choice("public-hello"))?;

        let expect = indoc! {r#"
            inputs:
              package_name:
                type: choice
                options:
                  - zeta
              confirm:
                type: boolean
        "#};
        assert_eq!(read_to_string("delete.yml")?, expect);

        Ok(())
    }

    #[sealed_test]
    fn edit_keeps_crlf_line_endings() -> anyhow::Result<()> {
        let content = "inputs:\r\n  package_name:\r\n    options:\r\n      - zeta\r\n# end\r\n";
        write("update.yml", content)?;
        let workflow = WorkflowFile::new("update.yml", "package_name");

        workflow.edit(|choices| choices.insert_choice("alpha"))?;

        assert_eq!(
            read_to_string("update.yml")?,
            "inputs:\r\n  package_name:\r\n    options:\r\n      - alpha\r\n      - zeta\r\n# end\r\n"
        );

        Ok(())
    }

    #[sealed_test]
    fn draft_leaves_file_alone() -> anyhow::Result<()> {
        write("delete.yml", WORKFLOW)?;
        let workflow = WorkflowFile::new("delete.yml", "package_name");

        let draft = workflow.draft(|choices| choices.insert_choice("zebra"))?;
        assert!(draft.is_some());
        assert_eq!(read_to_string("delete.yml")?, WORKFLOW);

        let draft = workflow.draft(|choices| choices.insert_choice("public-hello"))?;
        assert_eq!(draft, None);

        Ok(())
    }

    #[sealed_test]
    fn edit_missing_workflow_file_is_skipped() -> anyhow::Result<()> {
        let workflow = WorkflowFile::new("missing.yml", "package_name");
        workflow.edit(|choices| choices.insert_choice("zebra"))?;
        assert!(!std::path::Path::new("missing.yml").exists());

        Ok(())
    }

    #[sealed_test]
    fn edit_without_choices_fails() -> anyhow::Result<()> {
        write("update.yml", "on:\n  push:\n")?;
        let workflow = WorkflowFile::new("update.yml", "package_name");
        let result = workflow.edit(|choices| choices.insert_choice("zebra"));
        assert!(matches!(result, Err(Error::MissingChoices { .. })));

        write("update.yml", "on: [push\n")?;
        let result = workflow.edit(|choices| choices.insert_choice("zebra"));
        assert!(matches!(result, Err(Error::ParseWorkflowFile { .. })));

        Ok(())
    }
}
