// Visualizer settings
// User-facing knobs with their valid ranges, persisted as JSON

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::algorithms::AlgorithmChoice;
use crate::audio::AudioRange;
use crate::playback::{clamp_speed, DEFAULT_SPEED};
use crate::sandbox::SandboxLimits;
use crate::slicing::SliceDirection;

pub const MIN_SLICES: usize = 5;
pub const MAX_SLICES: usize = 400;
pub const DEFAULT_SLICES: usize = 20;

pub const MIN_ANIMATION_SCALE: u32 = 10;
pub const MAX_ANIMATION_SCALE: u32 = 300;

const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to get config directory")]
    NoConfigDir,
}

pub type SettingsResult<T> = Result<T, SettingsError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizerSettings {
    pub slice_count: usize,
    pub speed: u32,
    pub slice_direction: SliceDirection,
    pub algorithm: AlgorithmChoice,
    pub audio_range: Option<AudioRange>,
    /// Percent applied to tile display size
    pub animation_scale: u32,
    pub show_highlight: bool,
    pub show_border: bool,
    pub sandbox: SandboxLimits,
}

impl Default for VisualizerSettings {
    fn default() -> Self {
        Self {
            slice_count: DEFAULT_SLICES,
            speed: DEFAULT_SPEED,
            slice_direction: SliceDirection::Vertical,
            algorithm: AlgorithmChoice::default(),
            audio_range: None,
            animation_scale: 100,
            show_highlight: true,
            show_border: false,
            sandbox: SandboxLimits::default(),
        }
    }
}

impl VisualizerSettings {
    /// Create settings with every numeric knob clamped to its range
    pub fn new(
        slice_count: usize,
        speed: u32,
        slice_direction: SliceDirection,
        algorithm: AlgorithmChoice,
        audio_range: Option<AudioRange>,
        animation_scale: u32,
    ) -> Self {
        Self {
            slice_count: slice_count.clamp(MIN_SLICES, MAX_SLICES),
            speed: clamp_speed(speed),
            slice_direction,
            algorithm,
            audio_range,
            animation_scale: animation_scale.clamp(MIN_ANIMATION_SCALE, MAX_ANIMATION_SCALE),
            ..Self::default()
        }
    }

    /// Pull hand-edited values back into range
    pub fn normalized(self) -> Self {
        Self {
            slice_count: self.slice_count.clamp(MIN_SLICES, MAX_SLICES),
            speed: clamp_speed(self.speed),
            animation_scale: self
                .animation_scale
                .clamp(MIN_ANIMATION_SCALE, MAX_ANIMATION_SCALE),
            ..self
        }
    }
}

/// Interpret the free-text speed field
///
/// Empty input means the default speed, anything non-numeric leaves the
/// current value alone (`None`), numbers are clamped to the valid range.
pub fn parse_speed_input(input: &str) -> Option<u32> {
    let input = input.trim();
    if input.is_empty() {
        return Some(DEFAULT_SPEED);
    }
    if let Ok(value) = input.parse::<u64>() {
        return Some(clamp_speed(u32::try_from(value).unwrap_or(u32::MAX)));
    }
    // Negative numbers still land on the minimum
    input.parse::<i64>().ok().map(|_| clamp_speed(0))
}

/// Settings file on disk
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Store under the platform config directory
    pub fn open_default() -> SettingsResult<Self> {
        let config_dir = dirs::config_dir().ok_or(SettingsError::NoConfigDir)?;
        Ok(Self::in_dir(&config_dir.join("sortscape")))
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(SETTINGS_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read saved settings, or defaults when nothing was saved yet
    pub fn load(&self) -> SettingsResult<VisualizerSettings> {
        if !self.path.exists() {
            log::debug!("No settings at {:?}, using defaults", self.path);
            return Ok(VisualizerSettings::default());
        }

        let json = fs::read_to_string(&self.path)?;
        let settings: VisualizerSettings = serde_json::from_str(&json)?;
        Ok(settings.normalized())
    }

    pub fn save(&self, settings: &VisualizerSettings) -> SettingsResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, json)?;
        log::info!("Saved settings to {:?}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::Algorithm;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = VisualizerSettings::default();
        assert_eq!(settings.slice_count, 20);
        assert_eq!(settings.speed, 50);
        assert_eq!(settings.algorithm, AlgorithmChoice::BuiltIn(Algorithm::Bubble));
        assert!(settings.show_highlight);
        assert!(!settings.show_border);
    }

    #[test]
    fn test_new_clamps_values() {
        let settings = VisualizerSettings::new(
            1,
            500,
            SliceDirection::Horizontal,
            Algorithm::Heap.into(),
            None,
            5,
        );
        assert_eq!(settings.slice_count, MIN_SLICES);
        assert_eq!(settings.speed, 200);
        assert_eq!(settings.animation_scale, MIN_ANIMATION_SCALE);

        let settings = VisualizerSettings::new(
            10_000,
            0,
            SliceDirection::Vertical,
            AlgorithmChoice::default(),
            None,
            1000,
        );
        assert_eq!(settings.slice_count, MAX_SLICES);
        assert_eq!(settings.speed, 1);
        assert_eq!(settings.animation_scale, MAX_ANIMATION_SCALE);
    }

    #[test]
    fn test_parse_speed_input() {
        assert_eq!(parse_speed_input(""), Some(50));
        assert_eq!(parse_speed_input("  "), Some(50));
        assert_eq!(parse_speed_input("120"), Some(120));
        assert_eq!(parse_speed_input("0"), Some(1));
        assert_eq!(parse_speed_input("-7"), Some(1));
        assert_eq!(parse_speed_input("99999999999"), Some(200));
        assert_eq!(parse_speed_input("fast"), None);
    }

    #[test]
    fn test_load_missing_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::in_dir(&dir.path().join("nested"));
        assert_eq!(store.load().unwrap(), VisualizerSettings::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::in_dir(&dir.path().join("sortscape"));

        let mut settings = VisualizerSettings::new(
            64,
            140,
            SliceDirection::Horizontal,
            AlgorithmChoice::Custom("return;".to_string()),
            Some(AudioRange::new(1.5, 9.0)),
            150,
        );
        settings.show_border = true;
        store.save(&settings).unwrap();

        assert!(store.path().exists());
        assert_eq!(store.load().unwrap(), settings);
    }

    #[test]
    fn test_load_normalizes_and_fills_missing_fields() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::in_dir(dir.path());
        fs::write(store.path(), r#"{ "slice_count": 2, "speed": 999 }"#).unwrap();

        let settings = store.load().unwrap();
        assert_eq!(settings.slice_count, MIN_SLICES);
        assert_eq!(settings.speed, 200);
        assert_eq!(settings.animation_scale, 100);
        assert_eq!(settings.sandbox, SandboxLimits::default());
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::in_dir(dir.path());
        fs::write(store.path(), "not json").unwrap();

        assert!(matches!(store.load(), Err(SettingsError::Serialization(_))));
    }
}
