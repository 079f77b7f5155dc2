use crate::camera::CameraSettings;
use mapdata::{ResolveSettings, TextureRegistry};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Directory the standard texture set is expected in when none is configured.
pub const DEFAULT_TEXTURE_DIR: &str = "textures";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Viewer configuration.
///
/// Every field has a default, so a config file only needs the values it
/// changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub grid: ResolveSettings,
    pub camera: CameraSettings,
    /// Texture directory to scan. `None` registers the standard set under
    /// [`DEFAULT_TEXTURE_DIR`] without touching the filesystem.
    pub textures: Option<PathBuf>,
}

impl ViewerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let body = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&body)?;
        config.validate()?;
        log::debug!("Loaded viewer config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let flight = &self.camera.flight;
        if !(flight.blend > 0.0 && flight.blend <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "camera.flight.blend must be in (0, 1], got {}",
                flight.blend
            )));
        }
        if flight.arrival_threshold <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "camera.flight.arrival_threshold must be positive, got {}",
                flight.arrival_threshold
            )));
        }
        let orbit = &self.camera.orbit;
        if orbit.min_distance <= 0.0 || orbit.min_distance > orbit.max_distance {
            return Err(ConfigError::Invalid(format!(
                "camera.orbit distance range {}..{} is empty",
                orbit.min_distance, orbit.max_distance
            )));
        }
        if self.grid.min_thickness <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "grid.min_thickness must be positive, got {}",
                self.grid.min_thickness
            )));
        }
        Ok(())
    }

    /// Builds the texture registry this config describes.
    pub fn texture_registry(&self) -> Result<TextureRegistry, ConfigError> {
        match &self.textures {
            Some(dir) => TextureRegistry::scan(dir).map_err(|source| ConfigError::Io {
                path: dir.clone(),
                source,
            }),
            None => Ok(TextureRegistry::standard(Path::new(DEFAULT_TEXTURE_DIR))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::ResetPolicy;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ViewerConfig::default();
        assert_eq!(config.grid.height_scale, 5.0);
        assert_eq!(config.grid.min_thickness, 0.1);
        assert_eq!(config.camera.flight.blend, 0.05);
        assert_eq!(config.camera.flight.arrival_threshold, 0.1);
        assert_eq!(config.camera.flight.depth, 10.0);
        assert_eq!(config.camera.flight.tilt_degrees, 30.0);
        assert_eq!(config.camera.home.position, [0.0, 0.0, 20.0]);
        assert_eq!(config.camera.reset_policy, ResetPolicy::IgnoreWhileFlying);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"camera": {{"reset_policy": "cancel-flight", "flight": {{"blend": 0.2}}}}}}"#
        )
        .unwrap();
        let config = ViewerConfig::load(file.path()).unwrap();
        assert_eq!(config.camera.reset_policy, ResetPolicy::CancelFlight);
        assert_eq!(config.camera.flight.blend, 0.2);
        assert_eq!(config.camera.flight.depth, 10.0);
        assert_eq!(config.grid.height_scale, 5.0);
    }

    #[test]
    fn test_invalid_blend_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"camera": {{"flight": {{"blend": 0.0}}}}}}"#).unwrap();
        let err = ViewerConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = ViewerConfig::load(Path::new("/nonexistent/viewer.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_standard_registry_without_texture_dir() {
        let registry = ViewerConfig::default().texture_registry().unwrap();
        assert_eq!(registry.len(), 21);
    }
}
