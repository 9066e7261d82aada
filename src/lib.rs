//! Bubble Pop - a casual bubble popping game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (bubbles, placement, game loop)
//! - `platform`: Host collaborators (render surface, effects, frame clock)
//! - `persistence`: Key/value storage and the persisted progress record
//! - `settings`: Audio toggles and spawn speed preset
//! - `achievements`: Goals checked against stats snapshots
//! - `audio`: Sound cues and procedural Web Audio playback

pub mod achievements;
pub mod audio;
pub mod persistence;
pub mod platform;
pub mod settings;
pub mod sim;

pub use achievements::{AchievementBook, AchievementTracker, StatsSnapshot};
pub use persistence::{MemoryStorage, PersistenceError, Progress, Storage};
pub use platform::Host;
pub use settings::{Settings, SpeedPreset};
pub use sim::{BubbleKind, GameMode, GamePhase, GameState, tick};

use glam::Vec2;

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Game configuration constants
pub mod consts {
    /// Velocity multiplier applied on a wall bounce (negated and damped)
    pub const RESTITUTION: f32 = 0.8;
    /// Initial velocity components are drawn from [-MAX, MAX] units/ms
    pub const MAX_INITIAL_SPEED: f32 = 0.5;

    /// Keep spawned bubbles this far from the container edge
    pub const PLACEMENT_MARGIN: f32 = 20.0;
    /// Extra radius added to a candidate when testing overlap
    pub const PLACEMENT_TOLERANCE: f32 = 10.0;
    /// Candidate positions tried before accepting an overlapping one
    pub const PLACEMENT_ATTEMPTS: u32 = 10;

    /// Cosmetic delay before a popped bubble leaves the surface (ms)
    pub const POP_REMOVAL_DELAY_MS: f64 = 300.0;
    /// Sound intensity for pop cues
    pub const POP_SOUND_INTENSITY: f32 = 0.5;

    /// Particle burst sizes per bubble type
    pub const NORMAL_PARTICLES: u32 = 15;
    pub const GOLDEN_PARTICLES: u32 = 20;
    pub const RAINBOW_PARTICLES: u32 = 25;
    /// Chance a rainbow burst uses the multi-colour palette
    pub const MULTI_COLOR_CHANCE: f64 = 0.3;

    /// Spawn interval shrinks every this many pops
    pub const SPEED_UP_EVERY: u32 = 10;

    /// Challenge stack: rings, golden chance, and the key bubble slot
    pub const STACK_RINGS: u32 = 5;
    pub const STACK_GOLDEN_CHANCE: f64 = 0.1;
    pub const STACK_KEY_RING: u32 = 3;
    pub const STACK_KEY_INDEX: u32 = 0;

    /// Default container when the host has not reported one yet
    pub const DEFAULT_WIDTH: f32 = 800.0;
    pub const DEFAULT_HEIGHT: f32 = 600.0;
}
