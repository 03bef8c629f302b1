//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables;
//! each section can be updated independently for atomic section-level
//! updates.

use serde::{Deserialize, Serialize};

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Path-related settings.
    #[serde(default)]
    pub paths: PathSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Path configuration for format storage and output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Directory holding the format documents (primary + sidecars).
    #[serde(default = "default_formats_dir")]
    pub formats_dir: String,

    /// Default output folder offered for saves; empty means the source
    /// file's own folder.
    #[serde(default)]
    pub output_dir: String,

    /// Folder for log files.
    #[serde(default = "default_logs_dir")]
    pub logs_dir: String,
}

fn default_formats_dir() -> String {
    "formats".to_string()
}

fn default_logs_dir() -> String {
    ".logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            formats_dir: default_formats_dir(),
            output_dir: String::new(),
            logs_dir: default_logs_dir(),
        }
    }
}

impl PathSettings {
    /// Candidate directories for format storage, most preferred first.
    ///
    /// The configured directory leads; the platform data dir and a
    /// working-directory fallback follow, so storage degrades gracefully
    /// when the preferred location is not writable.
    pub fn format_store_candidates(&self) -> Vec<std::path::PathBuf> {
        let mut candidates = Vec::new();
        if !self.formats_dir.is_empty() {
            candidates.push(std::path::PathBuf::from(&self.formats_dir));
        }
        if let Some(home) = std::env::var_os("HOME") {
            candidates.push(
                std::path::PathBuf::from(home)
                    .join(".local")
                    .join("share")
                    .join("meterflow")
                    .join("formats"),
            );
        }
        candidates.push(std::path::PathBuf::from("formats"));
        candidates.dedup();
        candidates
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default log filter when RUST_LOG is unset.
    #[serde(default = "default_level")]
    pub level: String,

    /// Progress update step percentage for UI reporting.
    #[serde(default = "default_progress_step")]
    pub progress_step: u32,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_progress_step() -> u32 {
    5
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            progress_step: default_progress_step(),
        }
    }
}

/// Identifies one settings section for targeted updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSection {
    Paths,
    Logging,
}

impl ConfigSection {
    /// The TOML table name of this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            Self::Paths => "paths",
            Self::Logging => "logging",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings.paths.formats_dir, "formats");
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let settings: Settings =
            toml::from_str("[paths]\nformats_dir = \"custom\"\n").unwrap();
        assert_eq!(settings.paths.formats_dir, "custom");
        assert_eq!(settings.paths.logs_dir, ".logs");
        assert_eq!(settings.logging.progress_step, 5);
    }

    #[test]
    fn store_candidates_lead_with_configured_dir() {
        let paths = PathSettings {
            formats_dir: "/srv/meterflow/formats".to_string(),
            ..Default::default()
        };
        let candidates = paths.format_store_candidates();
        assert_eq!(
            candidates[0],
            std::path::PathBuf::from("/srv/meterflow/formats")
        );
        assert!(!candidates.is_empty());
    }
}
