//! World configuration. Loaded from world.ron at startup.

use std::path::{Path, PathBuf};

use procgen::{QuadTerrainConfig, TerrainConfig};
use serde::{Deserialize, Serialize};

use crate::player::MoveDirection;

/// Where the walkable ground comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TerrainSource {
    /// Seeded multi-kilometre heightfield.
    Procedural(TerrainConfig),
    /// Small smoothed random quad terrain.
    Quad(QuadTerrainConfig),
    /// Quad terrain whose heights come from an image's red channel.
    Image {
        path: PathBuf,
        width: f64,
        depth: f64,
        resolution: f64,
        height_scale: f64,
    },
}

impl Default for TerrainSource {
    fn default() -> Self {
        Self::Procedural(TerrainConfig::default())
    }
}

/// How the player's ground height is resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroundQuery {
    /// Bilinear heightmap lookup (quad terrains are always triangle-exact).
    #[default]
    Interpolated,
    /// Triangle-exact lookup through the collision mesh.
    Exact,
}

/// Scripted walk run by the binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkConfig {
    #[serde(default = "default_walk_steps")]
    pub steps: u32,
    /// Simulated seconds per step.
    #[serde(default = "default_step_seconds")]
    pub step_seconds: f32,
    #[serde(default)]
    pub direction: MoveDirection,
    /// Turn applied before walking, in degrees (positive turns left).
    #[serde(default)]
    pub turn_degrees: f32,
    /// Switch camera mode before walking.
    #[serde(default)]
    pub toggle_view: bool,
}

fn default_walk_steps() -> u32 {
    60
}
fn default_step_seconds() -> f32 {
    1.0 / 60.0
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            steps: default_walk_steps(),
            step_seconds: default_step_seconds(),
            direction: MoveDirection::default(),
            turn_degrees: 0.0,
            toggle_view: false,
        }
    }
}

/// Persistent world settings. Loaded from `world.ron` in the current directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    #[serde(default)]
    pub terrain: TerrainSource,
    #[serde(default)]
    pub ground_query: GroundQuery,
    #[serde(default)]
    pub walk: WalkConfig,
}

impl WorldConfig {
    /// Load config from `world.ron`. If the file is missing or invalid, returns default config.
    pub fn load() -> Self {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        if let Ok(data) = std::fs::read_to_string(path) {
            match ron::from_str(&data) {
                Ok(c) => return c,
                Err(e) => log::warn!("Invalid config at {:?}: {}, using defaults", path, e),
            }
        } else {
            log::info!("No world config at {:?}, using defaults", path);
        }
        Self::default()
    }

    /// Save current config to `world.ron`. Logs on error.
    pub fn save(&self) {
        self.save_to(&config_path());
    }

    pub fn save_to(&self, path: &Path) {
        match ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()) {
            Ok(s) => {
                if let Err(e) = std::fs::write(path, s) {
                    log::warn!("Could not write config to {:?}: {}", path, e);
                }
            }
            Err(e) => log::warn!("Could not serialise config: {}", e),
        }
    }
}

fn config_path() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join("world.ron")
}
