//! Headless collaborators
//!
//! Record what the game asked for instead of drawing or playing it. Used by
//! the native demo and by tests.

use std::collections::BTreeSet;

use super::{EffectsDispatcher, FrameClock, Host, RenderSurface};
use crate::achievements::AchievementBook;
use crate::audio::SoundEffect;
use crate::persistence::MemoryStorage;
use crate::sim::{Bubble, ParticleBurst, PopEffect};

/// Surface that tracks which sprites are on screen
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    /// Sprites currently attached (detach requests remove them at once)
    pub visible: BTreeSet<u32>,
    pub attached: Vec<u32>,
    pub pop_animations: Vec<(u32, PopEffect)>,
    pub detached: Vec<(u32, f64)>,
}

impl RenderSurface for RecordingSurface {
    fn attach(&mut self, bubble: &Bubble) {
        self.visible.insert(bubble.id);
        self.attached.push(bubble.id);
    }

    fn animate_pop(&mut self, id: u32, effect: PopEffect) {
        self.pop_animations.push((id, effect));
    }

    fn detach(&mut self, id: u32, delay_ms: f64) {
        self.visible.remove(&id);
        self.detached.push((id, delay_ms));
    }
}

/// Effects sink that keeps every request
#[derive(Debug, Clone, Default)]
pub struct RecordingEffects {
    pub sounds: Vec<(SoundEffect, f32)>,
    pub bursts: Vec<ParticleBurst>,
}

impl EffectsDispatcher for RecordingEffects {
    fn play_effect(&mut self, sound: SoundEffect, intensity: f32) {
        self.sounds.push((sound, intensity));
    }

    fn emit_particles(&mut self, burst: &ParticleBurst) {
        self.bursts.push(*burst);
    }
}

/// Clock driven by hand
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    pub now_ms: f64,
    /// A frame was requested and not yet delivered
    pub frame_pending: bool,
    /// Every `request_frame` call, merged or not
    pub total_requests: u32,
}

impl ManualClock {
    /// Deliver a pending frame, advancing time by `dt_ms`
    ///
    /// Returns the frame timestamp, or `None` if nothing was requested.
    pub fn next_frame(&mut self, dt_ms: f64) -> Option<f64> {
        if !self.frame_pending {
            return None;
        }
        self.frame_pending = false;
        self.now_ms += dt_ms;
        Some(self.now_ms)
    }
}

impl FrameClock for ManualClock {
    fn now(&self) -> f64 {
        self.now_ms
    }

    fn request_frame(&mut self) {
        self.frame_pending = true;
        self.total_requests += 1;
    }
}

/// All collaborators owned in one place
#[derive(Debug, Clone, Default)]
pub struct HeadlessHost {
    pub surface: RecordingSurface,
    pub effects: RecordingEffects,
    pub clock: ManualClock,
    pub storage: MemoryStorage,
    pub achievements: AchievementBook,
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow everything as a `Host`
    pub fn host(&mut self) -> Host<'_> {
        Host {
            surface: &mut self.surface,
            effects: &mut self.effects,
            clock: &mut self.clock,
            storage: &mut self.storage,
            achievements: &mut self.achievements,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_delivers_requested_frames() {
        let mut clock = ManualClock::default();
        assert_eq!(clock.next_frame(16.0), None);

        clock.request_frame();
        assert_eq!(clock.next_frame(16.0), Some(16.0));
        assert_eq!(clock.next_frame(16.0), None);
        assert_eq!(clock.total_requests, 1);
        assert_eq!(clock.now(), 16.0);
    }

    #[test]
    fn test_manual_clock_merges_requests() {
        let mut clock = ManualClock::default();
        clock.request_frame();
        clock.request_frame();

        assert_eq!(clock.next_frame(16.0), Some(16.0));
        assert_eq!(clock.next_frame(16.0), None);
        assert_eq!(clock.total_requests, 2);
    }
}
