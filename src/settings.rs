//! Runtime settings
//!
//! Loaded from a JSON file at startup; any field left out keeps its default.

use std::fs;
use std::path::{Path, PathBuf};

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{MAX_SUBSTEPS, TILES_ACROSS, VIEWPORT_HEIGHT, VIEWPORT_WIDTH};
use crate::sim::FollowMode;
use crate::tuning::Tuning;

/// Settings loading errors
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("could not read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Simulation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Viewport ===
    pub viewport_width: f32,
    pub viewport_height: f32,
    /// Tiles across the viewport width (sets the tile size)
    pub tiles_across: u32,

    // === Clock ===
    /// Catch-up cap: at most this many ticks per frame
    pub max_substeps: u32,

    // === Runtime toggles (initial values) ===
    /// Circle-circle positional separation
    pub separation: bool,
    /// Circle-circle velocity reflection
    pub bounce: bool,
    /// Faster falling in the platformer
    pub fast_fall: bool,
    /// Which player(s) the camera tracks
    pub follow_mode: FollowMode,

    pub tuning: Tuning,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            viewport_width: VIEWPORT_WIDTH,
            viewport_height: VIEWPORT_HEIGHT,
            tiles_across: TILES_ACROSS,

            max_substeps: MAX_SUBSTEPS,

            separation: true,
            bounce: true,
            fast_fall: false,
            follow_mode: FollowMode::First,

            tuning: Tuning::default(),
        }
    }
}

impl Settings {
    /// Viewport size as a vector
    pub fn viewport(&self) -> Vec2 {
        Vec2::new(self.viewport_width, self.viewport_height)
    }

    /// Tile size derived from the viewport width
    pub fn tile_size(&self) -> f32 {
        (self.viewport_width / self.tiles_across.max(1) as f32).floor()
    }

    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
