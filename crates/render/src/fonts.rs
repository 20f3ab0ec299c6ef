use std::{
    fs,
    path::{Path, PathBuf},
};

use shared::error::BotError;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontEntry {
    pub id: String,
    pub path: PathBuf,
}

impl FontEntry {
    pub fn new(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
        }
    }
}

/// Ordered, immutable list of selectable fonts. The first entry is the
/// default font for new sessions.
#[derive(Debug, Clone)]
pub struct FontRegistry {
    entries: Vec<FontEntry>,
}

impl FontRegistry {
    /// Lists `directory` and keeps every regular file whose extension matches
    /// `extension` (case-insensitive, without the leading dot). Entries are
    /// ordered by file name so the default font does not depend on the
    /// filesystem's listing order.
    pub fn initialize(directory: &Path, extension: &str) -> Result<Self, BotError> {
        let wanted = extension.trim_start_matches('.');
        let listing = fs::read_dir(directory).map_err(|e| {
            BotError::configuration(format!(
                "failed to list fonts directory '{}': {e}",
                directory.display()
            ))
        })?;

        let mut entries = Vec::new();
        for dir_entry in listing {
            let dir_entry = dir_entry.map_err(|e| {
                BotError::configuration(format!(
                    "failed to read fonts directory '{}': {e}",
                    directory.display()
                ))
            })?;
            let path = dir_entry.path();
            if !path.is_file() {
                continue;
            }
            let matches_extension = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(wanted));
            if !matches_extension {
                continue;
            }
            let Some(id) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            entries.push(FontEntry::new(id, path.clone()));
        }
        entries.sort_by(|a, b| a.id.cmp(&b.id));

        let registry = Self::from_entries(entries).map_err(|_| {
            BotError::configuration(format!(
                "no .{wanted} fonts found in '{}'",
                directory.display()
            ))
        })?;
        info!(
            directory = %directory.display(),
            fonts = registry.entries.len(),
            "font registry initialized"
        );
        Ok(registry)
    }

    pub fn from_entries(entries: Vec<FontEntry>) -> Result<Self, BotError> {
        if entries.is_empty() {
            return Err(BotError::configuration("font registry cannot be empty"));
        }
        Ok(Self { entries })
    }

    pub fn list(&self) -> &[FontEntry] {
        &self.entries
    }

    /// The first `limit` entries, in registry order.
    pub fn page(&self, limit: usize) -> &[FontEntry] {
        &self.entries[..limit.min(self.entries.len())]
    }

    pub fn get(&self, font_id: &str) -> Result<&FontEntry, BotError> {
        self.entries
            .iter()
            .find(|entry| entry.id == font_id)
            .ok_or_else(|| BotError::not_found(format!("font '{font_id}' is not registered")))
    }

    pub fn default_entry(&self) -> &FontEntry {
        &self.entries[0]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[path = "tests/fonts_tests.rs"]
mod tests;
