use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::models::Settings;
use crate::services::targets::sums_to_annual_target;
use crate::store::replace_file;

pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Self {
        SettingsStore { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file yields the built-in defaults.
    pub fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "settings file missing, using defaults");
            return Ok(Settings::default());
        }

        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Read settings {}", self.path.display()))?;
        let settings: Settings = serde_json::from_str(&raw)
            .with_context(|| format!("Parse settings {}", self.path.display()))?;

        if !sums_to_annual_target(&settings.quarter_values, settings.annual_target) {
            warn!(
                annual_target = settings.annual_target,
                quarter_total = settings.quarter_values.total(),
                "quarterly targets do not add up to the annual target"
            );
        }
        Ok(settings)
    }

    pub fn save(&self, settings: &Settings) -> Result<()> {
        let json = serde_json::to_string_pretty(settings)?;
        replace_file(&self.path, |tmp| {
            fs::write(tmp, json.as_bytes()).with_context(|| format!("Write {}", tmp.display()))
        })?;
        info!(
            path = %self.path.display(),
            annual_target = settings.annual_target,
            "settings saved"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QuarterTargets;
    use tempfile::TempDir;

    #[test]
    fn missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        let settings = store.load().unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.annual_target, 12_500_000.0);
        assert_eq!(settings.quarter_values.q2, 3_000_000.0);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        let settings = Settings {
            annual_target: 8_000_000.0,
            quarter_values: QuarterTargets {
                q1: 1_000_000.0,
                q2: 2_000_000.0,
                q3: 2_500_000.0,
                q4: 2_500_000.0,
            },
        };
        store.save(&settings).unwrap();
        assert_eq!(store.load().unwrap(), settings);
    }

    #[test]
    fn reads_the_established_file_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{"annual_target": 10000000.0, "quarter_values": {"Q1": 2000000, "Q2": 2400000, "Q3": 2800000, "Q4": 2800000}}"#,
        )
        .unwrap();
        let settings = SettingsStore::new(path).load().unwrap();
        assert_eq!(settings.annual_target, 10_000_000.0);
        assert_eq!(settings.quarter_values.q4, 2_800_000.0);
    }

    #[test]
    fn mismatched_quarters_are_kept() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        let settings = Settings {
            annual_target: 100.0,
            quarter_values: QuarterTargets {
                q1: 1.0,
                q2: 1.0,
                q3: 1.0,
                q4: 1.0,
            },
        };
        store.save(&settings).unwrap();
        assert_eq!(store.load().unwrap(), settings);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{not json").unwrap();
        assert!(SettingsStore::new(path).load().is_err());
    }
}
