//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time only advances through frame timestamps handed in by the host
//! - Seeded RNG only
//! - Stable iteration order (by bubble ID)
//! - No rendering or platform dependencies beyond the `Host` traits

pub mod bubble;
pub mod geometry;
pub mod registry;
pub mod state;
pub mod tick;

pub use bubble::{
    Bubble, BubbleKind, ParticleBurst, ParticleColor, PopEffect, PopEvent, PopInfo, RAINBOW_TINTS,
};
pub use geometry::{Circle, circles_overlap, weighted_choice};
pub use registry::{BubbleRegistry, SpawnOptions, TypeWeights};
pub use state::{
    Fragments, GameMode, GamePhase, GameState, ModeParams, PopOutcome, SessionStats,
};
pub use tick::{generate_bubble_stack, tick};
