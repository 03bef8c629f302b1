//! The format registry: in-memory model of every layout plus the
//! autosave-on-mutate hook into the store.
//!
//! Callers only see command methods; every structural mutation re-validates,
//! re-sorts, and persists. Write failures are reported through
//! [`FormatRegistry::last_status`], never as fatal errors - the in-memory
//! model stays correct even if unsaved.

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::builtin::BuiltinKind;
use super::definition::{ColumnSpec, FormatDefinition, DEFAULT_WIDTH, WIDTH_MAX, WIDTH_MIN};
use super::labels::LabelKey;
use super::letter::ColumnLetter;
use super::store::FormatStore;
use crate::models::ColumnKind;

/// Errors from registry commands.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Built-in layouts cannot be deleted or given sidecar files.
    #[error("'{name}' is a built-in format and cannot be modified this way")]
    BuiltinProtected { name: String },

    /// A format or column index was out of range.
    #[error("index {index} is out of range")]
    OutOfRange { index: usize },

    /// An import document contained no usable entries.
    #[error("no valid format entries found in {path}")]
    NothingToImport { path: PathBuf },

    /// An import document could not be read.
    #[error("failed to read format document {path}: {message}")]
    ImportFailed { path: PathBuf, message: String },
}

/// Result of deleting a format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Format removed and registry persisted.
    Removed,
    /// Format removed, but only built-ins remain; the caller decides
    /// whether to keep the primary document on disk.
    OnlyBuiltinsRemain { primary: PathBuf },
}

/// A typed single-field column edit.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnEdit {
    /// Reassign the column letter (normalized; re-sorts the layout).
    Letter(String),
    /// Change the column kind (sanitized; Empty clears the value).
    Kind(String),
    /// Replace the value (source index or formula template).
    Value(String),
    /// Set the width (clamped to [1, 200]).
    Width(f64),
    /// Set the header label (preset key or `custom:` text).
    Label(String),
}

/// Owns the set of named column layouts.
pub struct FormatRegistry {
    formats: Vec<FormatDefinition>,
    store: FormatStore,
    last_status: String,
}

impl FormatRegistry {
    /// Load the registry from a store.
    pub fn load(store: FormatStore) -> Self {
        let formats = store.load();
        tracing::info!("loaded {} format(s)", formats.len());
        Self {
            formats,
            store,
            last_status: String::new(),
        }
    }

    /// A registry without persistence (for tests and previews).
    pub fn in_memory() -> Self {
        Self::load(FormatStore::in_memory())
    }

    /// All definitions, built-ins first, then user formats in insertion
    /// order.
    pub fn list(&self) -> &[FormatDefinition] {
        &self.formats
    }

    /// All format names, in listing order.
    pub fn names(&self) -> Vec<String> {
        self.formats.iter().map(|f| f.name.clone()).collect()
    }

    /// Find a definition by name (case-insensitive).
    pub fn find(&self, name: &str) -> Option<&FormatDefinition> {
        self.formats.iter().find(|f| f.matches_name(name))
    }

    /// Get a definition by index.
    pub fn get(&self, index: usize) -> Option<&FormatDefinition> {
        self.formats.get(index)
    }

    /// The most recent persistence status message.
    pub fn last_status(&self) -> &str {
        &self.last_status
    }

    /// Where formats are persisted, if anywhere.
    pub fn storage_dir(&self) -> Option<&Path> {
        self.store.dir()
    }

    /// Whether no user-defined formats remain.
    pub fn only_builtins_left(&self) -> bool {
        self.formats
            .iter()
            .all(|f| BuiltinKind::is_builtin_name(&f.name))
    }

    /// Create a new format with the default column template under a
    /// disambiguated name; returns its index.
    pub fn create(&mut self, name: &str) -> usize {
        let name = self.unique_name(name, None);
        self.formats.push(FormatDefinition::new(
            name,
            FormatDefinition::default_columns("=C{r}*280"),
        ));
        self.autosave();
        self.formats.len() - 1
    }

    /// Deep-copy a format under a disambiguated name; returns the new
    /// index.
    pub fn duplicate(&mut self, index: usize) -> Result<usize, RegistryError> {
        let source = self
            .formats
            .get(index)
            .ok_or(RegistryError::OutOfRange { index })?;
        let mut copy = FormatDefinition::new(source.name.clone(), source.columns.clone());
        copy.name = self.unique_name(&source.name, None);
        self.formats.push(copy);
        self.autosave();
        Ok(self.formats.len() - 1)
    }

    /// Rename a format, recording the prior name as an alias so files
    /// saved under it remain discoverable.
    pub fn rename(&mut self, index: usize, new_name: &str) -> Result<(), RegistryError> {
        if index >= self.formats.len() {
            return Err(RegistryError::OutOfRange { index });
        }
        let unique = self.unique_name(new_name, Some(index));
        let format = &mut self.formats[index];
        let prior = format.name.clone();
        format.record_alias(&prior);
        format.name = unique;
        // A rename back to an old name must not keep it as an alias.
        let current = format.name.clone();
        format.aliases.retain(|a| !a.eq_ignore_ascii_case(&current));
        self.autosave();
        Ok(())
    }

    /// Delete a user format. Removes sidecar documents for the current
    /// name and every alias. When only built-ins remain afterwards, the
    /// caller chooses the fate of the primary document via
    /// [`Self::remove_primary_document`] / [`Self::keep_primary_document`].
    pub fn delete(&mut self, index: usize) -> Result<DeleteOutcome, RegistryError> {
        let format = self
            .formats
            .get(index)
            .ok_or(RegistryError::OutOfRange { index })?;
        if BuiltinKind::is_builtin_name(&format.name) {
            self.last_status =
                "Failed to delete: Den, Glacier, and Globe are built-in formats.".to_string();
            return Err(RegistryError::BuiltinProtected {
                name: format.name.clone(),
            });
        }

        let removed = self.formats.remove(index);
        let mut names: Vec<&str> = vec![removed.name.as_str()];
        names.extend(removed.aliases.iter().map(|a| a.as_str()));
        let removed_files = self.store.remove_sidecars(&names);
        for path in &removed_files {
            tracing::info!("removed sidecar {}", path.display());
        }

        if self.only_builtins_left() {
            if let Some(primary) = self.store.primary_path().filter(|p| p.exists()) {
                self.last_status = format!(
                    "Only built-in formats remain. Primary document kept at {} pending decision.",
                    primary.display()
                );
                return Ok(DeleteOutcome::OnlyBuiltinsRemain { primary });
            }
            self.last_status =
                "Only built-in formats remain. No format file found to delete.".to_string();
            return Ok(DeleteOutcome::Removed);
        }

        self.autosave();
        Ok(DeleteOutcome::Removed)
    }

    /// Remove the primary document from disk (after
    /// [`DeleteOutcome::OnlyBuiltinsRemain`]).
    pub fn remove_primary_document(&mut self) {
        match self.store.remove_primary() {
            Ok(true) => {
                self.last_status = "Deleted format file from disk.".to_string();
            }
            Ok(false) => {
                self.last_status = "No format file found to delete.".to_string();
            }
            Err(e) => {
                self.last_status = format!("Failed to delete format file: {}", e);
            }
        }
    }

    /// Keep the primary document, rewriting the remaining built-ins to it.
    pub fn keep_primary_document(&mut self) {
        self.autosave();
        if let Some(path) = self.store.primary_path() {
            self.last_status = format!(
                "Kept format file and saved built-in formats: {}",
                path.display()
            );
        }
    }

    /// Import formats from an external JSON document, appending them
    /// under disambiguated names. Returns the number added.
    pub fn import(&mut self, path: &Path) -> Result<usize, RegistryError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| RegistryError::ImportFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        let parsed = super::store::parse_external_document(&content).ok_or_else(|| {
            RegistryError::NothingToImport {
                path: path.to_path_buf(),
            }
        })?;
        if parsed.is_empty() {
            return Err(RegistryError::NothingToImport {
                path: path.to_path_buf(),
            });
        }

        let mut added = 0;
        for mut format in parsed {
            format.name = self.unique_name(&format.name, None);
            format.aliases.clear();
            self.formats.push(format);
            added += 1;
        }
        self.autosave();
        self.last_status = format!("Imported {} format(s) from {}", added, path.display());
        Ok(added)
    }

    /// Write one user format to its sidecar document.
    pub fn save_sidecar(&mut self, index: usize) -> Result<Option<PathBuf>, RegistryError> {
        let format = self
            .formats
            .get(index)
            .ok_or(RegistryError::OutOfRange { index })?;
        if BuiltinKind::is_builtin_name(&format.name) {
            return Err(RegistryError::BuiltinProtected {
                name: format.name.clone(),
            });
        }
        let written = match self.store.save_sidecar(format) {
            Ok(p) => p,
            Err(e) => {
                self.last_status = format!("Failed to save format: {}", e);
                return Ok(None);
            }
        };
        if let Some(path) = &written {
            self.last_status = format!("Saved format to {}", path.display());
        }
        self.autosave();
        Ok(written)
    }

    /// Append a data column at the lowest free letter; returns its index
    /// within the (re-sorted) column list.
    pub fn add_column(&mut self, index: usize) -> Result<usize, RegistryError> {
        let format = self
            .formats
            .get_mut(index)
            .ok_or(RegistryError::OutOfRange { index })?;
        let letter = format.next_free_letter();
        let spec = ColumnSpec {
            letter: letter.clone(),
            kind: ColumnKind::Data,
            value: String::new(),
            width: DEFAULT_WIDTH,
            label: LabelKey::none(),
        };
        format.columns.push(spec);
        format.sort_columns();
        let position = format
            .columns
            .iter()
            .position(|c| c.letter == letter)
            .unwrap_or(format.columns.len() - 1);
        self.autosave();
        Ok(position)
    }

    /// Remove a column.
    pub fn delete_column(&mut self, index: usize, column: usize) -> Result<(), RegistryError> {
        let format = self
            .formats
            .get_mut(index)
            .ok_or(RegistryError::OutOfRange { index })?;
        if column >= format.columns.len() {
            return Err(RegistryError::OutOfRange { index: column });
        }
        format.columns.remove(column);
        self.autosave();
        Ok(())
    }

    /// Apply a single-field edit to a column; returns the column's index
    /// after re-sorting.
    pub fn update_column(
        &mut self,
        index: usize,
        column: usize,
        edit: ColumnEdit,
    ) -> Result<usize, RegistryError> {
        let format = self
            .formats
            .get_mut(index)
            .ok_or(RegistryError::OutOfRange { index })?;
        if column >= format.columns.len() {
            return Err(RegistryError::OutOfRange { index: column });
        }

        let mut position = column;
        match edit {
            ColumnEdit::Letter(raw) => {
                let letter = ColumnLetter::normalize(&raw);
                format.columns[column].letter = letter.clone();
                format.sort_columns();
                position = format
                    .columns
                    .iter()
                    .position(|c| c.letter == letter)
                    .unwrap_or(column);
            }
            ColumnEdit::Kind(raw) => {
                let kind = ColumnKind::sanitize(&raw);
                let spec = &mut format.columns[column];
                spec.kind = kind;
                if kind == ColumnKind::Empty {
                    spec.value.clear();
                }
            }
            ColumnEdit::Value(raw) => {
                format.columns[column].value = raw;
            }
            ColumnEdit::Width(raw) => {
                format.columns[column].width = raw.clamp(WIDTH_MIN, WIDTH_MAX);
            }
            ColumnEdit::Label(raw) => {
                format.columns[column].label = LabelKey::sanitize(&raw);
            }
        }

        self.autosave();
        Ok(position)
    }

    /// Move a column to a new position, reassigning the occupied letters
    /// so they stay ascending and collision-free.
    pub fn move_column(
        &mut self,
        index: usize,
        from: usize,
        to: usize,
    ) -> Result<(), RegistryError> {
        let format = self
            .formats
            .get_mut(index)
            .ok_or(RegistryError::OutOfRange { index })?;
        let len = format.columns.len();
        if from >= len || to >= len {
            return Err(RegistryError::OutOfRange {
                index: from.max(to),
            });
        }
        if from == to {
            return Ok(());
        }

        let letters: Vec<ColumnLetter> =
            format.columns.iter().map(|c| c.letter.clone()).collect();
        let spec = format.columns.remove(from);
        format.columns.insert(to, spec);
        for (spec, letter) in format.columns.iter_mut().zip(letters) {
            spec.letter = letter;
        }
        self.autosave();
        Ok(())
    }

    /// Generate a registry-unique name by suffix-counter disambiguation.
    pub fn unique_name(&self, base: &str, skip_index: Option<usize>) -> String {
        let raw = base.trim();
        let raw = if raw.is_empty() { "New Format" } else { raw };
        let taken = |candidate: &str| {
            self.formats.iter().enumerate().any(|(i, f)| {
                Some(i) != skip_index && f.matches_name(candidate)
            })
        };
        if !taken(raw) {
            return raw.to_string();
        }
        let mut counter = 2;
        loop {
            let candidate = format!("{} {}", raw, counter);
            if !taken(&candidate) {
                return candidate;
            }
            counter += 1;
        }
    }

    /// Persist the whole model after a structural mutation.
    fn autosave(&mut self) {
        if let Err(e) = self.store.save_all(&self.formats) {
            self.last_status = format!("Failed to auto-save format file: {}", e);
            tracing::warn!("{}", self.last_status);
        }
    }
}
