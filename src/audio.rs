//! Audio cues for bubble pops
//!
//! Procedurally generated with the Web Audio API - no sound files needed.
//! The cue enum is available on every target so the simulation can name
//! sounds; playback only exists in the browser.

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundEffect {
    /// Normal bubble popped
    Pop,
    /// Golden bubble popped
    Chime,
    /// Rainbow bubble popped
    Magic,
    /// Achievement unlocked
    Achievement,
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::SoundEffect;

    /// Audio manager for the game
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        master_volume: f32,
        muted: bool,
    }

    impl Default for AudioManager {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AudioManager {
        pub fn new() -> Self {
            // May fail outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self {
                ctx,
                master_volume: 0.8,
                muted: false,
            }
        }

        /// Set master volume (0.0 - 1.0)
        pub fn set_master_volume(&mut self, vol: f32) {
            self.master_volume = vol.clamp(0.0, 1.0);
        }

        /// Mute/unmute all audio
        pub fn set_muted(&mut self, muted: bool) {
            self.muted = muted;
        }

        pub fn is_muted(&self) -> bool {
            self.muted
        }

        /// Play a cue at `intensity` (0.0 - 1.0) of the master volume
        pub fn play(&self, effect: SoundEffect, intensity: f32) {
            if self.muted {
                return;
            }
            let vol = self.master_volume * intensity.clamp(0.0, 1.0);
            if vol <= 0.0 {
                return;
            }

            let Some(ctx) = &self.ctx else { return };

            // Browsers suspend the context until a user gesture
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            match effect {
                SoundEffect::Pop => self.play_pop(ctx, vol),
                SoundEffect::Chime => self.play_chime(ctx, vol),
                SoundEffect::Magic => self.play_magic(ctx, vol),
                SoundEffect::Achievement => self.play_achievement(ctx, vol),
            }
        }

        /// Create an oscillator with gain envelope
        fn create_osc(
            &self,
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        /// Normal pop - short falling blip
        fn play_pop(&self, ctx: &AudioContext, vol: f32) {
            let Some((osc, gain)) = self.create_osc(ctx, 700.0, OscillatorType::Sine) else {
                return;
            };
            let t = ctx.current_time();

            gain.gain().set_value_at_time(vol * 0.6, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.08)
                .ok();
            osc.frequency().set_value_at_time(700.0, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(180.0, t + 0.08)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + 0.1).ok();
        }

        /// Golden pop - two bell partials
        fn play_chime(&self, ctx: &AudioContext, vol: f32) {
            for (freq, level) in [(1320.0, 0.35), (1980.0, 0.2)] {
                if let Some((osc, gain)) = self.create_osc(ctx, freq, OscillatorType::Sine) {
                    let t = ctx.current_time();
                    gain.gain().set_value_at_time(vol * level, t).ok();
                    gain.gain()
                        .exponential_ramp_to_value_at_time(0.01, t + 0.6)
                        .ok();
                    osc.start().ok();
                    osc.stop_with_when(t + 0.65).ok();
                }
            }
        }

        /// Rainbow pop - rising sparkle arpeggio
        fn play_magic(&self, ctx: &AudioContext, vol: f32) {
            for (i, freq) in [660.0, 880.0, 1100.0, 1320.0].iter().enumerate() {
                let delay = i as f64 * 0.05;
                if let Some((osc, gain)) = self.create_osc(ctx, *freq, OscillatorType::Triangle) {
                    let t = ctx.current_time() + delay;
                    gain.gain().set_value_at_time(vol * 0.25, t).ok();
                    gain.gain()
                        .exponential_ramp_to_value_at_time(0.01, t + 0.2)
                        .ok();
                    osc.start_with_when(t).ok();
                    osc.stop_with_when(t + 0.25).ok();
                }
            }
        }

        /// Achievement - celebratory
        fn play_achievement(&self, ctx: &AudioContext, vol: f32) {
            for (i, freq) in [500.0, 600.0, 700.0, 800.0, 1000.0].iter().enumerate() {
                let delay = i as f64 * 0.08;
                if let Some((osc, gain)) = self.create_osc(ctx, *freq, OscillatorType::Triangle) {
                    let t = ctx.current_time() + delay;
                    gain.gain().set_value_at_time(vol * 0.25, t).ok();
                    gain.gain()
                        .exponential_ramp_to_value_at_time(0.01, t + 0.25)
                        .ok();
                    osc.start_with_when(t).ok();
                    osc.stop_with_when(t + 0.3).ok();
                }
            }
        }
    }
}
