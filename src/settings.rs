//! Game settings and preferences
//!
//! Persisted separately from progress through the `Storage` trait.

use serde::{Deserialize, Serialize};

use crate::persistence::{Storage, load_or_default, save_or_warn};
use crate::sim::GameMode;

/// Spawn speed presets the player can pick mid-run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SpeedPreset {
    Slow,
    #[default]
    Medium,
    Fast,
}

impl SpeedPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpeedPreset::Slow => "slow",
            SpeedPreset::Medium => "medium",
            SpeedPreset::Fast => "fast",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "slow" => Some(SpeedPreset::Slow),
            "medium" | "med" => Some(SpeedPreset::Medium),
            "fast" => Some(SpeedPreset::Fast),
            _ => None,
        }
    }

    /// Spawn interval (ms) this preset selects in `mode`
    pub fn spawn_interval_ms(&self, mode: GameMode) -> f64 {
        match self {
            SpeedPreset::Slow => 3000.0,
            SpeedPreset::Medium => match mode {
                GameMode::Classic => 1500.0,
                GameMode::Challenge => 1200.0,
                GameMode::Zen => 2250.0,
            },
            SpeedPreset::Fast => 500.0,
        }
    }
}

/// Player preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Pop and achievement sounds
    pub sound_enabled: bool,
    /// Background music
    pub music_enabled: bool,
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            music_enabled: false,
            master_volume: 0.8,
        }
    }
}

impl Settings {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "bubble_pop_settings";

    pub fn load(storage: &dyn Storage) -> Self {
        load_or_default(storage, Self::STORAGE_KEY)
    }

    pub fn save(&self, storage: &mut dyn Storage) -> bool {
        save_or_warn(storage, Self::STORAGE_KEY, self)
    }

    /// Flip sound on/off and persist; returns the new state
    pub fn toggle_sound(&mut self, storage: &mut dyn Storage) -> bool {
        self.sound_enabled = !self.sound_enabled;
        self.save(storage);
        log::info!("Sound {}", if self.sound_enabled { "on" } else { "off" });
        self.sound_enabled
    }

    /// Flip music on/off and persist; returns the new state
    pub fn toggle_music(&mut self, storage: &mut dyn Storage) -> bool {
        self.music_enabled = !self.music_enabled;
        self.save(storage);
        log::info!("Music {}", if self.music_enabled { "on" } else { "off" });
        self.music_enabled
    }

    /// Effective sound-effect volume
    pub fn sfx_volume(&self) -> f32 {
        if self.sound_enabled {
            self.master_volume.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}
