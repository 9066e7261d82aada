//! Platform abstraction layer
//!
//! The simulation talks to its host only through these traits:
//! - `RenderSurface`: bubble sprites (attach, pop animation, detach)
//! - `EffectsDispatcher`: sounds and particle bursts, fire-and-forget
//! - `FrameClock`: current time and "call me next frame"
//!
//! Storage and achievements live in their own modules. All of them are
//! handed to the game together as a `Host` on every call that needs them.

pub mod headless;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use headless::{HeadlessHost, ManualClock, RecordingEffects, RecordingSurface};

use crate::achievements::AchievementTracker;
use crate::audio::SoundEffect;
use crate::persistence::Storage;
use crate::sim::{Bubble, ParticleBurst, PopEffect};

/// Where bubbles are drawn
pub trait RenderSurface {
    /// A new bubble entered play
    fn attach(&mut self, bubble: &Bubble);
    /// Start the pop animation for a bubble that just popped
    fn animate_pop(&mut self, id: u32, effect: PopEffect);
    /// Drop the sprite after `delay_ms`; 0 means immediately
    fn detach(&mut self, id: u32, delay_ms: f64);
}

/// Sound and particle output
pub trait EffectsDispatcher {
    fn play_effect(&mut self, sound: SoundEffect, intensity: f32);
    fn emit_particles(&mut self, burst: &ParticleBurst);
}

/// Display-refresh driven clock
pub trait FrameClock {
    /// Monotonic milliseconds, same timebase as delivered frame timestamps
    fn now(&self) -> f64;
    /// Ask for the next frame callback
    ///
    /// At most one frame is outstanding: a request made while one is still
    /// pending is merged into it, so the game never runs two frame chains.
    fn request_frame(&mut self);
}

/// Collaborators passed explicitly into the game
pub struct Host<'a> {
    pub surface: &'a mut dyn RenderSurface,
    pub effects: &'a mut dyn EffectsDispatcher,
    pub clock: &'a mut dyn FrameClock,
    pub storage: &'a mut dyn Storage,
    pub achievements: &'a mut dyn AchievementTracker,
}
