// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene configuration.
//!
//! Settings are stored as RON and control node layout and how close a drop
//! has to land to a port to be accepted.

use crate::geometry::NodeGeometry;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Current scene configuration format version
pub const CONFIG_FORMAT_VERSION: u32 = 1;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read or written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed RON
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Serialization failed
    #[error("Serialization error: {0}")]
    Serialize(#[from] ron::Error),

    /// Written by a newer version
    #[error("Config version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version in the file
        found: u32,
        /// Highest version this build reads
        supported: u32,
    },
}

/// Scene configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Format version
    pub version: u32,
    /// Node body width
    pub node_width: f32,
    /// Height of the node title bar
    pub header_height: f32,
    /// Vertical distance between ports
    pub port_spacing: f32,
    /// Max distance from a port anchor at which a drop is accepted
    pub port_hit_radius: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_FORMAT_VERSION,
            node_width: 180.0,
            header_height: 24.0,
            port_spacing: 22.0,
            port_hit_radius: 9.0,
        }
    }
}

impl SceneConfig {
    /// Parse from a RON string
    pub fn from_ron_str(content: &str) -> Result<Self, ConfigError> {
        let config: SceneConfig = ron::from_str(content)?;

        if config.version > CONFIG_FORMAT_VERSION {
            return Err(ConfigError::UnsupportedVersion {
                found: config.version,
                supported: CONFIG_FORMAT_VERSION,
            });
        }

        Ok(config)
    }

    /// Load from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ron_str(&content)
    }

    /// Serialize to a pretty RON string
    pub fn to_ron(&self) -> Result<String, ConfigError> {
        let pretty = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }

    /// Save to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_ron()?)?;
        Ok(())
    }

    /// Node geometry described by this configuration
    pub fn node_geometry(&self) -> NodeGeometry {
        NodeGeometry {
            width: self.node_width,
            header_height: self.header_height,
            port_spacing: self.port_spacing,
            hit_radius: self.port_hit_radius,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SceneConfig::default();
        assert_eq!(config.version, CONFIG_FORMAT_VERSION);
        assert_eq!(config.node_geometry(), NodeGeometry::default());
    }

    #[test]
    fn test_serialization() {
        let config = SceneConfig {
            port_hit_radius: 14.0,
            ..SceneConfig::default()
        };
        let ron_str = config.to_ron().unwrap();
        let loaded = SceneConfig::from_ron_str(&ron_str).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let loaded = SceneConfig::from_ron_str("(port_hit_radius: 4.0)").unwrap();
        assert_eq!(loaded.port_hit_radius, 4.0);
        assert_eq!(loaded.node_width, SceneConfig::default().node_width);
    }

    #[test]
    fn test_newer_version_rejected() {
        let err = SceneConfig::from_ron_str("(version: 99)").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnsupportedVersion { found: 99, .. }
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = SceneConfig::load(Path::new("/nonexistent/linkweave/scene.ron")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
