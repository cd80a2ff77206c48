//! World tuning knobs, loadable from YAML.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Errors from reading a world configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },
}

/// Tuning constants for the walking world.
///
/// Every field defaults, so a partial file only overrides what it names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Ground position the player spawns over.
    pub player_start: [f32; 2],
    /// Uniform scale of the player hull.
    pub player_scale: f32,
    /// Height the player hovers above the tiles.
    pub hover_height: f32,
    /// Ground distance of one movement step.
    pub move_speed: f32,
    /// Frames a collision knockback lasts.
    pub recoil_frames: u32,
    /// Obstacle placement tuning.
    pub forest: ForestConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            player_start: [0.5, 0.5],
            player_scale: 0.25,
            hover_height: 0.01,
            move_speed: 0.05,
            recoil_frames: 8,
            forest: ForestConfig::default(),
        }
    }
}

impl WorldConfig {
    /// Read a YAML config file from disk.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Placement tuning for the seeded forest layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Seed mixed into every per-tile layout hash.
    pub seed: u64,
    /// Fewest trees a tile may carry.
    pub trees_min: u32,
    /// Most trees a tile may carry.
    pub trees_max: u32,
    /// Base uniform scale of a trunk.
    pub trunk_scale: f32,
    /// Relative scale jitter around `trunk_scale` (0.3 reads as +/-30%).
    pub size_variation: f32,
    /// Clearance kept between a site center and the tile edge.
    pub edge_margin: f32,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            trees_min: 1,
            trees_max: 4,
            trunk_scale: 0.8,
            size_variation: 0.3,
            edge_margin: 0.2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = WorldConfig::default();
        assert!(config.player_scale > 0.0);
        assert!(config.move_speed > 0.0);
        assert!(config.forest.trees_min <= config.forest.trees_max);
        assert!(config.forest.edge_margin < 0.5);
    }

    #[test]
    fn partial_yaml_keeps_defaults_elsewhere() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("world.yaml");
        std::fs::write(&path, "move_speed: 0.2\nforest:\n  seed: 7\n").unwrap();

        let config = WorldConfig::from_yaml_file(&path).unwrap();
        assert_eq!(config.move_speed, 0.2);
        assert_eq!(config.forest.seed, 7);
        assert_eq!(config.recoil_frames, WorldConfig::default().recoil_frames);
        assert_eq!(config.forest.trees_max, ForestConfig::default().trees_max);
    }

    #[test]
    fn missing_file_reports_the_path() {
        let err = WorldConfig::from_yaml_file("/definitely/not/here.yaml").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.yaml"));
    }

    #[test]
    fn config_round_trips_through_yaml() {
        let mut config = WorldConfig::default();
        config.player_start = [12.5, -3.0];
        config.forest.trees_max = 9;

        let text = serde_yaml::to_string(&config).unwrap();
        let back: WorldConfig = serde_yaml::from_str(&text).unwrap();
        assert_eq!(back.player_start, [12.5, -3.0]);
        assert_eq!(back.forest.trees_max, 9);
    }
}
