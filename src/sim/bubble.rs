//! Bubble entity
//!
//! A single drifting circle. Bubbles bounce inelastically off the container
//! walls, never off each other, and become inert once popped or removed.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::geometry::{Circle, random_choice, random_float};
use crate::audio::SoundEffect;
use crate::consts::*;

/// Bubble variants, in weighted-selection order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BubbleKind {
    #[default]
    Normal,
    Golden,
    Rainbow,
}

impl BubbleKind {
    pub const COUNT: usize = 3;
    pub const ALL: [BubbleKind; Self::COUNT] =
        [BubbleKind::Normal, BubbleKind::Golden, BubbleKind::Rainbow];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BubbleKind::Normal => "normal",
            BubbleKind::Golden => "golden",
            BubbleKind::Rainbow => "rainbow",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "normal" => Some(BubbleKind::Normal),
            "golden" | "gold" => Some(BubbleKind::Golden),
            "rainbow" => Some(BubbleKind::Rainbow),
            _ => None,
        }
    }

    /// Inclusive diameter range for randomly sized bubbles
    pub fn size_range(&self) -> (u32, u32) {
        match self {
            BubbleKind::Normal => (30, 150),
            BubbleKind::Golden => (50, 100),
            BubbleKind::Rainbow => (70, 120),
        }
    }

    /// Particles emitted when popped
    pub fn particle_count(&self) -> u32 {
        match self {
            BubbleKind::Normal => NORMAL_PARTICLES,
            BubbleKind::Golden => GOLDEN_PARTICLES,
            BubbleKind::Rainbow => RAINBOW_PARTICLES,
        }
    }

    /// Sound cue played on pop
    pub fn sound(&self) -> SoundEffect {
        match self {
            BubbleKind::Normal => SoundEffect::Pop,
            BubbleKind::Golden => SoundEffect::Chime,
            BubbleKind::Rainbow => SoundEffect::Magic,
        }
    }
}

/// Rainbow tints (0xRRGGBB), shared by bubble variants and particles
pub const RAINBOW_TINTS: [u32; 10] = [
    0xFF9A9E, // pink
    0xFAD0C4, // peach
    0xA1C4FD, // blue
    0xC2E9FB, // sky blue
    0xAFEEEE, // teal
    0x98FB98, // green
    0xFFECB3, // yellow
    0xEE82EE, // violet
    0xFFB6C1, // light pink
    0x87CEFA, // light blue
];

pub const NORMAL_PARTICLE_COLOR: u32 = 0xFFFFFF;
pub const GOLDEN_PARTICLE_COLOR: u32 = 0xFFD700;

/// Pop animation requested from the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopEffect {
    Pop,
    GoldenPop,
    RainbowPop,
    Explode,
    Spiral,
    Shatter,
}

impl PopEffect {
    const RAINBOW: [PopEffect; 4] = [
        PopEffect::RainbowPop,
        PopEffect::Explode,
        PopEffect::Spiral,
        PopEffect::Shatter,
    ];

    pub fn css_class(&self) -> &'static str {
        match self {
            PopEffect::Pop => "bubble-pop",
            PopEffect::GoldenPop => "bubble-pop-golden",
            PopEffect::RainbowPop => "bubble-pop-rainbow",
            PopEffect::Explode => "bubble-pop-explode",
            PopEffect::Spiral => "bubble-pop-spiral",
            PopEffect::Shatter => "bubble-pop-shatter",
        }
    }
}

/// Particle palette for a burst
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleColor {
    Solid(u32),
    /// Each particle picks its own tint
    Multi,
}

/// A particle burst request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleBurst {
    pub pos: Vec2,
    pub count: u32,
    pub color: ParticleColor,
}

/// What the game learns about a popped bubble
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopInfo {
    pub id: u32,
    pub kind: BubbleKind,
    pub size: f32,
    pub pos: Vec2,
}

/// Everything a single pop produces, returned once per bubble
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopEvent {
    pub info: PopInfo,
    pub effect: PopEffect,
    pub sound: SoundEffect,
    pub intensity: f32,
    pub particles: ParticleBurst,
    /// Cosmetic only; game state never waits on it
    pub removal_delay_ms: f64,
}

/// A bubble entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bubble {
    pub id: u32,
    /// Diameter
    pub size: f32,
    /// Stacking order, 1-5
    pub layer: u8,
    pub kind: BubbleKind,
    /// Tint index for rainbow bubbles (0 otherwise)
    pub variant: u8,
    pub pos: Vec2,
    /// Drift per millisecond
    pub vel: Vec2,
    popped: bool,
}

impl Bubble {
    /// Create a bubble with a random drift velocity
    pub fn new<R: Rng + ?Sized>(
        id: u32,
        size: f32,
        layer: u8,
        kind: BubbleKind,
        pos: Vec2,
        rng: &mut R,
    ) -> Self {
        let vel = Vec2::new(
            random_float(rng, -MAX_INITIAL_SPEED, MAX_INITIAL_SPEED),
            random_float(rng, -MAX_INITIAL_SPEED, MAX_INITIAL_SPEED),
        );
        let variant = if kind == BubbleKind::Rainbow {
            rng.random_range(0..RAINBOW_TINTS.len()) as u8
        } else {
            0
        };
        Self {
            id,
            size,
            layer,
            kind,
            variant,
            pos,
            vel,
            popped: false,
        }
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.size / 2.0
    }

    #[inline]
    pub fn is_popped(&self) -> bool {
        self.popped
    }

    /// Circle used by the registry's placement check
    #[inline]
    pub fn collision_circle(&self) -> Circle {
        Circle::new(self.pos, self.radius())
    }

    pub fn info(&self) -> PopInfo {
        PopInfo {
            id: self.id,
            kind: self.kind,
            size: self.size,
            pos: self.pos,
        }
    }

    /// Integrate position and bounce off the container walls
    ///
    /// Each axis is handled on its own: crossing a wall clamps the bubble
    /// tangent to it and reverses that velocity component, damped by
    /// `RESTITUTION`.
    pub fn advance(&mut self, dt_ms: f32, bounds: Vec2) {
        if self.popped {
            return;
        }

        self.pos += self.vel * dt_ms;

        let radius = self.radius();
        let (x, vx) = bounce_axis(self.pos.x, self.vel.x, radius, bounds.x);
        let (y, vy) = bounce_axis(self.pos.y, self.vel.y, radius, bounds.y);
        self.pos = Vec2::new(x, y);
        self.vel = Vec2::new(vx, vy);
    }

    /// Pop the bubble, returning its effects exactly once
    pub fn pop<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<PopEvent> {
        if self.popped {
            return None;
        }
        self.popped = true;

        let effect = match self.kind {
            BubbleKind::Normal => PopEffect::Pop,
            BubbleKind::Golden => PopEffect::GoldenPop,
            BubbleKind::Rainbow => *random_choice(rng, &PopEffect::RAINBOW),
        };

        let color = match self.kind {
            BubbleKind::Normal => ParticleColor::Solid(NORMAL_PARTICLE_COLOR),
            BubbleKind::Golden => ParticleColor::Solid(GOLDEN_PARTICLE_COLOR),
            BubbleKind::Rainbow => {
                if rng.random_bool(MULTI_COLOR_CHANCE) {
                    ParticleColor::Multi
                } else {
                    ParticleColor::Solid(*random_choice(rng, &RAINBOW_TINTS))
                }
            }
        };

        Some(PopEvent {
            info: self.info(),
            effect,
            sound: self.kind.sound(),
            intensity: POP_SOUND_INTENSITY,
            particles: ParticleBurst {
                pos: self.pos,
                count: self.kind.particle_count(),
                color,
            },
            removal_delay_ms: POP_REMOVAL_DELAY_MS,
        })
    }

    /// Retire the bubble without effects; true if it was still live
    pub fn remove(&mut self) -> bool {
        let was_live = !self.popped;
        self.popped = true;
        was_live
    }
}

/// Clamp one axis inside [radius, extent - radius], reflecting on contact
#[inline]
fn bounce_axis(pos: f32, vel: f32, radius: f32, extent: f32) -> (f32, f32) {
    if pos - radius < 0.0 {
        (radius, -vel * RESTITUTION)
    } else if pos + radius > extent {
        (extent - radius, -vel * RESTITUTION)
    } else {
        (pos, vel)
    }
}
