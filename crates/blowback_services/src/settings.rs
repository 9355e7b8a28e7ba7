//! Settings management
//!
//! Startup configuration read once from JSON. Every section has defaults so
//! a partial file (or no file at all) is valid.

use blowback_core::memory::{checked_megabytes, MemoryError};
use blowback_core::time::PacingPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming an explicit settings file.
pub const SETTINGS_ENV_VAR: &str = "BLOWBACK_SETTINGS";
/// Settings file looked up in the working directory.
pub const DEFAULT_SETTINGS_FILE: &str = "blowback.json";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Engine settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub window: WindowSettings,
    pub timing: TimingSettings,
    pub memory: MemorySettings,
    pub render: RenderSettings,
    pub shaders: ShaderSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Start in borderless fullscreen. `F` toggles it at runtime.
    pub fullscreen: bool,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "Blowback".to_string(),
            width: 1280,
            height: 720,
            fullscreen: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    /// Frames per second the loop holds to. Zero or less runs unpaced.
    pub target_hz: f64,
    /// Sleep before spinning. Only worth it with ~1ms scheduler granularity.
    pub coarse_sleep: bool,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            target_hz: 60.0,
            coarse_sleep: true,
        }
    }
}

impl TimingSettings {
    pub fn pacing_policy(&self) -> PacingPolicy {
        if self.target_hz.is_nan() || self.target_hz <= 0.0 {
            return PacingPolicy::Unlimited;
        }

        let policy = PacingPolicy::Fixed {
            target_hz: self.target_hz,
            coarse_sleep: self.coarse_sleep,
        };
        if policy.target_frame_duration().is_none() {
            tracing::warn!(
                target_hz = self.target_hz,
                "Target rate has no usable frame period, running unpaced"
            );
            return PacingPolicy::Unlimited;
        }
        policy
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemorySettings {
    pub permanent_mib: usize,
    pub transient_mib: usize,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            permanent_mib: 64,
            transient_mib: 16,
        }
    }
}

impl MemorySettings {
    pub fn permanent_bytes(&self) -> Result<usize, MemoryError> {
        checked_megabytes(self.permanent_mib)
    }

    pub fn transient_bytes(&self) -> Result<usize, MemoryError> {
        checked_megabytes(self.transient_mib)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub clear_color: [f64; 4],
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            clear_color: [0.8, 0.2, 0.5, 1.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderSettings {
    pub vertex: PathBuf,
    pub fragment: PathBuf,
}

impl Default for ShaderSettings {
    fn default() -> Self {
        Self {
            vertex: PathBuf::from("assets/shaders/sprite.vert.wgsl"),
            fragment: PathBuf::from("assets/shaders/sprite.frag.wgsl"),
        }
    }
}

impl Settings {
    pub fn from_json(path: &Path, text: &str) -> Result<Self, SettingsError> {
        serde_json::from_str(text).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(path, &text)
    }

    /// Resolve settings for startup.
    ///
    /// An explicit path (usually from [`SETTINGS_ENV_VAR`]) must exist. The
    /// default file is optional: when it is absent the built-in defaults are
    /// used.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, SettingsError> {
        if let Some(path) = explicit {
            tracing::info!(path = %path.display(), "Loading settings");
            return Self::load(path);
        }

        let default_path = Path::new(DEFAULT_SETTINGS_FILE);
        if default_path.exists() {
            tracing::info!(path = %default_path.display(), "Loading settings");
            Self::load(default_path)
        } else {
            tracing::info!("No settings file found, using defaults");
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_window_and_timing() {
        let settings = Settings::default();
        assert_eq!(settings.window.width, 1280);
        assert_eq!(settings.window.height, 720);
        assert_eq!(
            settings.timing.pacing_policy(),
            PacingPolicy::Fixed {
                target_hz: 60.0,
                coarse_sleep: true
            }
        );
        assert_eq!(settings.memory.permanent_bytes(), Ok(64 * 1024 * 1024));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let settings = Settings::from_json(
            Path::new("test.json"),
            r#"{ "timing": { "target_hz": 144.0 }, "window": { "title": "Test" } }"#,
        )
        .unwrap();

        assert_eq!(settings.timing.target_hz, 144.0);
        assert!(settings.timing.coarse_sleep);
        assert_eq!(settings.window.title, "Test");
        assert_eq!(settings.window.width, 1280);
        assert!(!settings.window.fullscreen);
        assert_eq!(settings.shaders, ShaderSettings::default());
    }

    #[test]
    fn test_zero_rate_runs_unpaced() {
        let timing = TimingSettings {
            target_hz: 0.0,
            coarse_sleep: false,
        };
        assert_eq!(timing.pacing_policy(), PacingPolicy::Unlimited);
    }

    #[test]
    fn test_tiny_rate_runs_unpaced() {
        let settings =
            Settings::from_json(Path::new("slow.json"), r#"{ "timing": { "target_hz": 1e-30 } }"#)
                .unwrap();
        let policy = settings.timing.pacing_policy();
        assert_eq!(policy, PacingPolicy::Unlimited);
        assert_eq!(policy.target_frame_duration(), None);
    }

    #[test]
    fn test_oversized_memory_is_an_error() {
        let settings = Settings::from_json(
            Path::new("huge.json"),
            r#"{ "memory": { "transient_mib": 18000000000000 } }"#,
        )
        .unwrap();
        assert!(matches!(
            settings.memory.transient_bytes(),
            Err(MemoryError::AllocationFailed { .. })
        ));
        assert_eq!(settings.memory.permanent_bytes(), Ok(64 * 1024 * 1024));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let err = Settings::from_json(Path::new("bad.json"), "{ not json").unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));
        assert!(err.to_string().contains("bad.json"));
    }

    #[test]
    fn test_missing_explicit_file_is_io_error() {
        let err = Settings::resolve(Some(Path::new("does/not/exist.json"))).unwrap_err();
        assert!(matches!(err, SettingsError::Io { .. }));
    }

    #[test]
    fn test_round_trips_through_json() {
        let settings = Settings::default();
        let text = serde_json::to_string(&settings).unwrap();
        assert_eq!(Settings::from_json(Path::new("mem.json"), &text).unwrap(), settings);
    }
}
