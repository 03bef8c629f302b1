//! Semantic header labels for output columns.
//!
//! Each preset maps a short key to the pair written into the two header
//! rows: the technical register code and the friendly description. Custom
//! layouts may instead carry a free-form label under the `custom:` prefix.

use serde::{Deserialize, Serialize};

/// One entry of the preset label table.
#[derive(Debug, Clone, Copy)]
pub struct LabelPreset {
    /// Stable key stored in format documents.
    pub key: &'static str,
    /// Technical register code (first header row).
    pub code: &'static str,
    /// Friendly description (second header row).
    pub friendly: &'static str,
}

/// The fixed preset table of semantic labels.
pub const LABEL_PRESETS: &[LabelPreset] = &[
    LabelPreset { key: "clock", code: "0-0:1.0.0", friendly: "Clock" },
    LabelPreset { key: "edis_status", code: "0-0:96.240.12 [hex]", friendly: "EDIS status" },
    LabelPreset { key: "avg_demand", code: "1-1:1.5.0 [kW]", friendly: "Last average demand +A (QI+QIV)" },
    LabelPreset { key: "demand", code: "", friendly: "Demand" },
    LabelPreset { key: "import_total", code: "1-1:1.8.0 [Wh]", friendly: "Active energy import +A (QI+QIV)" },
    LabelPreset { key: "kwh", code: "", friendly: "kWh" },
    LabelPreset { key: "import_delta", code: "1-1:1.29.0 [Wh]", friendly: "Energy delta over capture period 1 +A (QI+QIV)" },
    LabelPreset { key: "export_total", code: "1-1:2.8.0 [Wh]", friendly: "Active energy export -A (QII+QIII)" },
    LabelPreset { key: "export_delta", code: "1-1:2.29.0 [Wh]", friendly: "Energy delta over capture period 1 -A (QII+QIII)" },
    LabelPreset { key: "reactive_import", code: "1-1:3.8.0 [varh]", friendly: "Reactive energy import +R (QI+QII)" },
    LabelPreset { key: "kvarh", code: "", friendly: "kVarh" },
    LabelPreset { key: "reactive_import_delta", code: "1-1:3.29.0 [varh]", friendly: "Energy delta over capture period 1 +R (QI+QII)" },
    LabelPreset { key: "reactive_export", code: "1-1:4.8.0 [varh]", friendly: "Reactive energy export -R (QIII+QIV)" },
    LabelPreset { key: "reactive_export_delta", code: "1-1:4.29.0 [varh]", friendly: "Energy delta over capture period 1 -R (QIII+QIV)" },
    LabelPreset { key: "rate1_energy", code: "1-1:15.8.1 [Wh]", friendly: "Active energy A (QI+QII+QIII+QIV) rate 1" },
    LabelPreset { key: "power_factor", code: "1-1:13.5.0", friendly: "Last average power factor" },
    LabelPreset { key: "abs_energy", code: "1-1:128.8.0 [Wh]", friendly: "Energy |AL1|+|AL2|+|AL3|" },
];

/// Prefix marking a free-form label value.
pub const CUSTOM_PREFIX: &str = "custom:";

/// A column's header label: a preset key, `custom:<text>`, or empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelKey(String);

/// A label resolved into its two header-row strings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedLabel {
    /// Technical code for the first header row (may be empty).
    pub code: String,
    /// Friendly text for the second header row (may be empty).
    pub friendly: String,
}

impl LabelKey {
    /// The empty label.
    pub fn none() -> Self {
        Self(String::new())
    }

    /// A preset label, if the key exists in the table.
    pub fn preset(key: &str) -> Option<Self> {
        LABEL_PRESETS
            .iter()
            .any(|p| p.key == key)
            .then(|| Self(key.to_string()))
    }

    /// A free-form label.
    pub fn custom(text: &str) -> Self {
        Self(format!("{}{}", CUSTOM_PREFIX, text))
    }

    /// Sanitize free-form input: preset keys and `custom:` values pass
    /// through, anything else collapses to the empty label.
    pub fn sanitize(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::none();
        }
        if trimmed.starts_with(CUSTOM_PREFIX) {
            return Self(trimmed.to_string());
        }
        Self::preset(trimmed).unwrap_or_else(Self::none)
    }

    /// Check whether this is the empty label.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The stored key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolve to the pair of header-row strings.
    pub fn resolve(&self) -> ResolvedLabel {
        if let Some(text) = self.0.strip_prefix(CUSTOM_PREFIX) {
            return ResolvedLabel {
                code: String::new(),
                friendly: text.to_string(),
            };
        }
        LABEL_PRESETS
            .iter()
            .find(|p| p.key == self.0)
            .map(|p| ResolvedLabel {
                code: p.code.to_string(),
                friendly: p.friendly.to_string(),
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_resolves_to_pair() {
        let label = LabelKey::preset("clock").unwrap();
        let resolved = label.resolve();
        assert_eq!(resolved.code, "0-0:1.0.0");
        assert_eq!(resolved.friendly, "Clock");
    }

    #[test]
    fn custom_resolves_to_friendly_only() {
        let resolved = LabelKey::custom("Site total").resolve();
        assert_eq!(resolved.code, "");
        assert_eq!(resolved.friendly, "Site total");
    }

    #[test]
    fn sanitize_rejects_unknown_keys() {
        assert!(LabelKey::sanitize("not_a_preset").is_empty());
        assert_eq!(
            LabelKey::sanitize("custom:whatever").as_str(),
            "custom:whatever"
        );
        assert_eq!(LabelKey::sanitize("kvarh").as_str(), "kvarh");
    }

    #[test]
    fn empty_label_resolves_blank() {
        let resolved = LabelKey::none().resolve();
        assert_eq!(resolved.code, "");
        assert_eq!(resolved.friendly, "");
    }

    #[test]
    fn preset_keys_are_unique() {
        for (i, a) in LABEL_PRESETS.iter().enumerate() {
            for b in &LABEL_PRESETS[i + 1..] {
                assert_ne!(a.key, b.key);
            }
        }
    }
}
