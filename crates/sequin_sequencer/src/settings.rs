// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sequencer settings.
//!
//! Settings are stored as pretty-printed RON next to the show files:
//! - Timing grid frequency used when loading sequences
//! - Location of the view registry
//! - Effect type names, in index order

use crate::effect::EffectTypeTable;
use crate::grid::TimingGrid;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Current settings format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Settings file name
pub const SETTINGS_FILE_NAME: &str = "sequencer.ron";

/// Error loading or saving settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// File could not be read or written
    #[error("Settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid RON for these settings
    #[error("Invalid settings file: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Settings could not be serialized
    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] ron::Error),

    /// File written by a newer version
    #[error("Settings version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version found in the file
        found: u32,
        /// Newest supported version
        supported: u32,
    },
}

/// Settings consumed when loading and flattening sequences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerSettings {
    /// Format version
    pub version: u32,
    /// Timing grid frequency in Hz
    pub frequency: f64,
    /// View registry XML file, relative paths resolve against the settings file
    pub views_file: Option<PathBuf>,
    /// Effect type names in index order
    pub effect_types: Vec<String>,
}

impl Default for SequencerSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            frequency: TimingGrid::DEFAULT_FREQUENCY,
            views_file: None,
            effect_types: EffectTypeTable::BUILTIN
                .iter()
                .map(|name| (*name).to_string())
                .collect(),
        }
    }
}

impl SequencerSettings {
    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        let mut settings: SequencerSettings = ron::from_str(&content)?;

        if settings.version > SETTINGS_FORMAT_VERSION {
            return Err(SettingsError::UnsupportedVersion {
                found: settings.version,
                supported: SETTINGS_FORMAT_VERSION,
            });
        }

        if let (Some(views), Some(dir)) = (settings.views_file.as_mut(), path.parent()) {
            if views.is_relative() {
                *views = dir.join(&*views);
            }
        }

        Ok(settings)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        let content = ron::ser::to_string_pretty(self, config)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Settings file path for a show directory
    pub fn settings_file_path(show_dir: &Path) -> PathBuf {
        show_dir.join(SETTINGS_FILE_NAME)
    }

    /// Timing grid for the configured frequency
    pub fn grid(&self) -> TimingGrid {
        TimingGrid::with_frequency(self.frequency)
    }

    /// Effect type table for the configured names
    pub fn effect_type_table(&self) -> EffectTypeTable {
        EffectTypeTable::new(self.effect_types.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::EffectTypeLookup;

    #[test]
    fn test_default_settings() {
        let settings = SequencerSettings::default();
        assert_eq!(settings.version, SETTINGS_FORMAT_VERSION);
        assert!((settings.grid().period() - 0.05).abs() < 1e-12);
        assert_eq!(settings.effect_type_table().effect_index("On"), Some(1));
    }

    #[test]
    fn test_serialization() {
        let settings = SequencerSettings {
            frequency: 40.0,
            ..SequencerSettings::default()
        };
        let ron_str =
            ron::ser::to_string_pretty(&settings, ron::ser::PrettyConfig::default()).unwrap();
        let loaded: SequencerSettings = ron::from_str(&ron_str).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let loaded: SequencerSettings = ron::from_str("(frequency: 50.0)").unwrap();
        assert_eq!(loaded.frequency, 50.0);
        assert_eq!(loaded.effect_types.len(), EffectTypeTable::BUILTIN.len());
        assert!(loaded.views_file.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("sequin-settings-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = SequencerSettings::settings_file_path(&dir);

        let settings = SequencerSettings {
            views_file: Some(PathBuf::from("views.xml")),
            ..SequencerSettings::default()
        };
        settings.save(&path).unwrap();

        let loaded = SequencerSettings::load(&path).unwrap();
        assert_eq!(loaded.views_file, Some(dir.join("views.xml")));
        assert_eq!(loaded.frequency, settings.frequency);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_newer_version_rejected() {
        let dir = std::env::temp_dir().join(format!("sequin-version-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(SETTINGS_FILE_NAME);
        std::fs::write(&path, "(version: 99)").unwrap();

        let result = SequencerSettings::load(&path);
        assert!(matches!(
            result,
            Err(SettingsError::UnsupportedVersion { found: 99, .. })
        ));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
