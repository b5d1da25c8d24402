//! Underlay configuration
//!
//! Everything the host may want to tune without recompiling: texture asset
//! paths, background enablement and camera parameters. Loadable from TOML;
//! every field has a sensible default so an empty file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    /// The config file is not valid TOML
    #[error("cannot parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level underlay configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UnderlayConfig {
    /// Texture for the mesh layer; a procedural checkerboard is used when
    /// absent or unreadable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub texture_path: Option<PathBuf>,
    /// Background layer settings
    pub background: BackgroundConfig,
    /// Camera settings for the mesh layer
    pub camera: CameraConfig,
}

impl Default for UnderlayConfig {
    fn default() -> Self {
        Self {
            texture_path: None,
            background: BackgroundConfig::default(),
            camera: CameraConfig::default(),
        }
    }
}

impl UnderlayConfig {
    /// Load configuration from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }
}

/// Background layer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundConfig {
    /// Whether the background quad is created at all
    pub enabled: bool,
    /// Texture for the background; a procedural gradient is used when absent
    /// or unreadable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub texture_path: Option<PathBuf>,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            texture_path: None,
        }
    }
}

/// Camera parameters for the mesh layer's projection and view
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov_y_degrees: f32,
    /// Near clip plane
    pub near: f32,
    /// Far clip plane
    pub far: f32,
    /// Camera position; it always looks at the origin with +Y up
    pub eye: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 60.0,
            near: 0.1,
            far: 15000.0,
            eye: [0.0, 0.0, 10.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config: UnderlayConfig = toml::from_str("").unwrap();
        assert!(config.texture_path.is_none());
        assert!(config.background.enabled);
        assert_eq!(config.camera.fov_y_degrees, 60.0);
        assert_eq!(config.camera.far, 15000.0);
    }

    #[test]
    fn partial_toml_overrides_defaults() {
        let config: UnderlayConfig = toml::from_str(
            r#"
            texture_path = "assets/plate.png"

            [background]
            enabled = false

            [camera]
            fov_y_degrees = 45.0
            "#,
        )
        .unwrap();
        assert_eq!(
            config.texture_path.as_deref(),
            Some(Path::new("assets/plate.png"))
        );
        assert!(!config.background.enabled);
        assert_eq!(config.camera.fov_y_degrees, 45.0);
        // Unspecified camera fields keep their defaults.
        assert_eq!(config.camera.near, 0.1);
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = UnderlayConfig::default();
        let text = toml::to_string(&config).unwrap();
        let back: UnderlayConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.camera.eye, config.camera.eye);
        assert_eq!(back.background.enabled, config.background.enabled);
    }
}
