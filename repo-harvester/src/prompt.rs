//! Terminal implementation of [`SelectionInput`].

use std::io;

use dialoguer::{theme::ColorfulTheme, Confirm, Input};
use repo_harvester_core::catalog::RepositoryDescriptor;
use repo_harvester_core::contract::SelectionInput;

use crate::report::print_catalog;

/// Asks on the controlling terminal.
pub struct TerminalInput {
    theme: ColorfulTheme,
}

impl TerminalInput {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Default for TerminalInput {
    fn default() -> Self {
        Self::new()
    }
}

fn to_io(e: dialoguer::Error) -> io::Error {
    io::Error::other(e.to_string())
}

impl SelectionInput for TerminalInput {
    fn wants_subset(&mut self, catalog: &[RepositoryDescriptor]) -> io::Result<bool> {
        Confirm::with_theme(&self.theme)
            .with_prompt(format!(
                "Found {} repositories. Select specific repositories instead of cloning all?",
                catalog.len()
            ))
            .default(false)
            .interact()
            .map_err(to_io)
    }

    fn indices(&mut self, catalog: &[RepositoryDescriptor]) -> io::Result<String> {
        println!("Available repositories:");
        print_catalog(catalog);
        Input::<String>::with_theme(&self.theme)
            .with_prompt("Enter the numbers of repositories to clone (comma-separated)")
            .interact_text()
            .map_err(to_io)
    }
}

/// Answers fixed in advance by `--all` or `--select`, for non-interactive runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresetInput {
    All,
    Indices(String),
}

impl SelectionInput for PresetInput {
    fn wants_subset(&mut self, _catalog: &[RepositoryDescriptor]) -> io::Result<bool> {
        Ok(matches!(self, PresetInput::Indices(_)))
    }

    fn indices(&mut self, _catalog: &[RepositoryDescriptor]) -> io::Result<String> {
        match self {
            PresetInput::Indices(raw) => Ok(raw.clone()),
            PresetInput::All => Ok(String::new()),
        }
    }
}
