//! Rendering and encoding options.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FingerboardError, Result};

/// Options for one video render. Every field may be omitted from a JSON
/// config file; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VideoConfig {
    /// Frames per second
    pub fps: u32,
    /// Canvas width in pixels
    pub width: u32,
    /// Canvas height in pixels
    pub height: u32,
    /// Video length in seconds; derived from the timeline when absent
    pub explicit_duration: Option<f64>,
    /// TrueType/OpenType font for labels; the built-in font is used when absent
    pub font_path: Option<PathBuf>,
    /// Threads rendering frames in parallel
    pub workers: usize,
    /// ffmpeg executable
    pub ffmpeg: PathBuf,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            fps: Self::DEFAULT_FPS,
            width: Self::DEFAULT_WIDTH,
            height: Self::DEFAULT_HEIGHT,
            explicit_duration: None,
            font_path: None,
            workers: 1,
            ffmpeg: PathBuf::from("ffmpeg"),
        }
    }
}

impl VideoConfig {
    pub const DEFAULT_FPS: u32 = 30;
    pub const DEFAULT_WIDTH: u32 = 1280;
    pub const DEFAULT_HEIGHT: u32 = 720;

    /// Read a JSON config file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|err| {
            FingerboardError::Config(format!("cannot open config {}: {err}", path.display()))
        })?;
        let config: Self = serde_json::from_reader(BufReader::new(file)).map_err(|err| {
            FingerboardError::Config(format!("cannot read config {}: {err}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.fps == 0 {
            return Err(FingerboardError::Config("fps must be positive".into()));
        }
        if self.width == 0 || self.height == 0 {
            return Err(FingerboardError::Config(format!(
                "frame size {}x{} must be positive",
                self.width, self.height
            )));
        }
        if let Some(duration) = self.explicit_duration {
            if !duration.is_finite() || duration <= 0.0 {
                return Err(FingerboardError::Config(format!(
                    "duration {duration} must be a positive number of seconds"
                )));
            }
        }
        if self.workers == 0 {
            return Err(FingerboardError::Config("workers must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_valid() {
        let config = VideoConfig::default();
        assert_eq!((config.fps, config.width, config.height), (30, 1280, 720));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: VideoConfig = serde_json::from_str(r#"{"fps": 24, "explicit_duration": 5.5}"#).unwrap();
        assert_eq!(
            config,
            VideoConfig {
                fps: 24,
                explicit_duration: Some(5.5),
                ..VideoConfig::default()
            }
        );
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_json::from_str::<VideoConfig>(r#"{"frames_per_second": 24}"#).is_err());
    }

    #[test]
    fn invalid_values() {
        let invalid = [
            VideoConfig { fps: 0, ..VideoConfig::default() },
            VideoConfig { height: 0, ..VideoConfig::default() },
            VideoConfig { explicit_duration: Some(0.0), ..VideoConfig::default() },
            VideoConfig { explicit_duration: Some(f64::NAN), ..VideoConfig::default() },
            VideoConfig { workers: 0, ..VideoConfig::default() },
        ];
        for config in invalid {
            assert!(matches!(config.validate(), Err(FingerboardError::Config(_))), "{config:?}");
        }
    }

    #[test]
    fn missing_config_file() {
        let err = VideoConfig::from_json_file(Path::new("/nonexistent/fingerboard.json")).unwrap_err();
        assert!(matches!(err, FingerboardError::Config(_)));
    }
}
