//! On-disk persistence for format definitions.
//!
//! One primary JSON document holds every format; each user format may
//! additionally have a one-file "sidecar" document next to it. On load,
//! sidecars are merged into the primary set by name, primary winning.
//! Writes are atomic (temp file, then rename).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::builtin::{builtin_definitions, BuiltinKind};
use super::definition::FormatDefinition;

/// File name of the primary document inside the storage directory.
pub const PRIMARY_FILE_NAME: &str = "format_model.json";

/// Bundled fallback document used when the primary cannot be read.
const DEFAULT_DOCUMENT: &str = include_str!("default_formats.json");

/// Storage backend for the format registry.
///
/// `dir == None` means in-memory only (used by tests and by callers that
/// found no writable location); every write becomes a no-op.
#[derive(Debug, Clone)]
pub struct FormatStore {
    dir: Option<PathBuf>,
}

impl FormatStore {
    /// Pick the first candidate directory that can be created and written
    /// to, falling back to in-memory storage when none qualifies.
    pub fn new(candidates: &[PathBuf]) -> Self {
        for candidate in candidates {
            if dir_is_usable(candidate) {
                tracing::debug!("format store at {}", candidate.display());
                return Self {
                    dir: Some(candidate.clone()),
                };
            }
            tracing::warn!(
                "format storage candidate not writable: {}",
                candidate.display()
            );
        }
        tracing::warn!("no writable format storage; formats stay in memory");
        Self { dir: None }
    }

    /// A store rooted at one directory (created on demand).
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    /// A store with no persistence.
    pub fn in_memory() -> Self {
        Self { dir: None }
    }

    /// The storage directory, if one was found.
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Path of the primary document, if persistent.
    pub fn primary_path(&self) -> Option<PathBuf> {
        self.dir.as_ref().map(|d| d.join(PRIMARY_FILE_NAME))
    }

    /// Load all formats: primary document (with fallbacks), then sidecar
    /// documents merged in by name with primary precedence. Built-ins are
    /// guaranteed present and listed first.
    pub fn load(&self) -> Vec<FormatDefinition> {
        let mut formats = self.load_primary();
        ensure_builtins_first(&mut formats);
        self.merge_sidecars(&mut formats);
        formats
    }

    fn load_primary(&self) -> Vec<FormatDefinition> {
        if let Some(path) = self.primary_path() {
            if path.exists() {
                match fs::read_to_string(&path) {
                    Ok(content) => match parse_document(&content) {
                        Some(parsed) if !parsed.is_empty() => return parsed,
                        _ => {
                            tracing::warn!(
                                "primary format document unreadable, using bundled defaults: {}",
                                path.display()
                            );
                        }
                    },
                    Err(e) => {
                        tracing::warn!("failed to read {}: {}", path.display(), e);
                    }
                }
                return bundled_defaults();
            }
        }
        bundled_defaults()
    }

    fn merge_sidecars(&self, formats: &mut Vec<FormatDefinition>) {
        let Some(dir) = &self.dir else { return };
        let Ok(entries) = fs::read_dir(dir) else {
            return;
        };
        let mut sidecar_paths: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
                    && p.file_name().is_none_or(|n| n != PRIMARY_FILE_NAME)
            })
            .collect();
        sidecar_paths.sort();

        for path in sidecar_paths {
            let Ok(content) = fs::read_to_string(&path) else {
                continue;
            };
            let Some(parsed) = parse_document(&content) else {
                tracing::warn!("skipping unparseable sidecar: {}", path.display());
                continue;
            };
            for format in parsed {
                // Primary wins by name; a sidecar saved under a prior
                // name (now an alias) must not resurrect either.
                let shadowed = formats.iter().any(|f| {
                    f.matches_name(&format.name)
                        || f.aliases.iter().any(|a| a.eq_ignore_ascii_case(&format.name))
                });
                if shadowed {
                    tracing::debug!(
                        "sidecar entry '{}' shadowed by primary document",
                        format.name
                    );
                } else {
                    formats.push(format);
                }
            }
        }
    }

    /// Write the primary document atomically.
    pub fn save_all(&self, formats: &[FormatDefinition]) -> io::Result<()> {
        let Some(path) = self.primary_path() else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(formats).map_err(io::Error::other)?;
        atomic_write(&path, &json)
    }

    /// Write one format's sidecar document; returns the path written.
    pub fn save_sidecar(&self, format: &FormatDefinition) -> io::Result<Option<PathBuf>> {
        let Some(dir) = &self.dir else {
            return Ok(None);
        };
        let path = dir.join(safe_file_name(&format.name));
        let json = serde_json::to_string_pretty(format).map_err(io::Error::other)?;
        atomic_write(&path, &json)?;
        Ok(Some(path))
    }

    /// Remove any sidecar documents for the given names; returns the
    /// paths actually removed.
    pub fn remove_sidecars(&self, names: &[&str]) -> Vec<PathBuf> {
        let Some(dir) = &self.dir else {
            return Vec::new();
        };
        let mut removed = Vec::new();
        for name in names {
            let path = dir.join(safe_file_name(name));
            if path.exists() && fs::remove_file(&path).is_ok() {
                removed.push(path);
            }
        }
        removed
    }

    /// Remove the primary document; true if a file was deleted.
    pub fn remove_primary(&self) -> io::Result<bool> {
        let Some(path) = self.primary_path() else {
            return Ok(false);
        };
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path)?;
        Ok(true)
    }
}

/// Parse a document supplied from outside the store (the import path).
pub fn parse_external_document(content: &str) -> Option<Vec<FormatDefinition>> {
    parse_document(content)
}

/// Parse a format document: either a list of definitions or one bare
/// definition object. Entries are normalized; unusable entries dropped.
fn parse_document(content: &str) -> Option<Vec<FormatDefinition>> {
    let mut parsed: Vec<FormatDefinition> =
        match serde_json::from_str::<Vec<FormatDefinition>>(content) {
            Ok(list) => list,
            Err(_) => vec![serde_json::from_str::<FormatDefinition>(content).ok()?],
        };
    parsed.retain(|f| !f.name.trim().is_empty());
    for format in &mut parsed {
        format.name = format.name.trim().to_string();
        if format.columns.is_empty() {
            format.columns = FormatDefinition::default_columns("=C{r}*280");
        }
        format.sanitize();
    }
    Some(parsed)
}

fn bundled_defaults() -> Vec<FormatDefinition> {
    parse_document(DEFAULT_DOCUMENT)
        .filter(|f| !f.is_empty())
        .unwrap_or_else(builtin_definitions)
}

/// Make sure every built-in layout is present, in canonical order, ahead
/// of user formats.
fn ensure_builtins_first(formats: &mut Vec<FormatDefinition>) {
    let mut ordered = Vec::with_capacity(formats.len() + 3);
    for kind in BuiltinKind::all() {
        match formats.iter().position(|f| f.matches_name(kind.name())) {
            Some(pos) => ordered.push(formats.remove(pos)),
            None => ordered.push(kind.definition()),
        }
    }
    ordered.append(formats);
    *formats = ordered;
}

/// Sanitize a format name into a sidecar file name.
pub fn safe_file_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .filter(|c| !"<>:\"/\\|?*".contains(*c) && *c >= ' ')
        .collect();
    let cleaned = cleaned.trim().trim_end_matches(['.', ' ']);
    if cleaned.is_empty() {
        "format.json".to_string()
    } else {
        format!("{}.json", cleaned)
    }
}

/// Whether a directory exists (or can be created) and accepts writes.
fn dir_is_usable(dir: &Path) -> bool {
    if fs::create_dir_all(dir).is_err() {
        return false;
    }
    let probe = dir.join(".write_probe");
    match fs::File::create(&probe) {
        Ok(_) => {
            let _ = fs::remove_file(&probe);
            true
        }
        Err(_) => false,
    }
}

/// Write content to a file atomically via temp file + rename.
fn atomic_write(path: &Path, content: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, content)?;
    fs::rename(&temp_path, path)?;
    Ok(())
}
