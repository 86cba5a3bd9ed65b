//! Preset command menu.
//!
//! The menu file is line oriented: `caption|command`. Blank lines, lines
//! starting with `#`, lines without a separator and lines with an empty
//! caption or command are skipped. The menu is loaded once and shared
//! read-only between connections.

use std::fs;
use std::path::Path;
use thiserror::Error;

/// A single preset shown on the form page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub caption: String,
    pub command: String,
}

/// Errors raised while reading the menu file.
#[derive(Debug, Error)]
pub enum MenuError {
    #[error("failed to read menu file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Ordered list of presets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Menu {
    entries: Vec<MenuEntry>,
}

impl Menu {
    pub fn new(entries: Vec<MenuEntry>) -> Self {
        Self { entries }
    }

    /// Parse menu file contents, skipping malformed lines.
    pub fn parse(content: &str) -> Self {
        let entries = content
            .lines()
            .map(|line| line.trim_end_matches(['\r', '\n']))
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| {
                let (caption, command) = line.split_once('|')?;
                if caption.is_empty() || command.is_empty() {
                    return None;
                }
                Some(MenuEntry {
                    caption: caption.to_string(),
                    command: command.to_string(),
                })
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[MenuEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read and parse a menu file.
pub fn load_menu(path: &Path) -> Result<Menu, MenuError> {
    let content = fs::read_to_string(path).map_err(|source| MenuError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(Menu::parse(&content))
}

/// Read a menu file, falling back to an empty menu when it cannot be read.
pub fn load_menu_or_empty(path: &Path) -> Menu {
    match load_menu(path) {
        Ok(menu) => {
            tracing::info!(path = %path.display(), entries = menu.len(), "Menu loaded");
            menu
        }
        Err(e) => {
            tracing::warn!(error = %e, "Menu unavailable, serving the form without presets");
            Menu::default()
        }
    }
}
