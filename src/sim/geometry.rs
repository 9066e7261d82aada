//! Geometry and random helpers for bubble placement
//!
//! Pure functions only. Overlap tests here are used for spawn placement,
//! bubbles never collide with each other while drifting.

use glam::Vec2;
use rand::Rng;

use super::bubble::BubbleKind;

/// A circle used for placement overlap checks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
}

impl Circle {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Same circle with its radius grown by `amount`
    #[inline]
    pub fn inflated(self, amount: f32) -> Self {
        Self {
            radius: self.radius + amount,
            ..self
        }
    }
}

/// True iff the centers are strictly closer than the sum of the radii
#[inline]
pub fn circles_overlap(a: &Circle, b: &Circle) -> bool {
    a.center.distance(b.center) < a.radius + b.radius
}

/// Pick a kind from cumulative weights against a draw in [0, 1)
///
/// Weights are walked in declaration order (normal, golden, rainbow) and the
/// first kind whose running total exceeds `draw` wins. Falls back to the
/// first declared kind when nothing matches.
pub fn weighted_choice(weights: &[f32; BubbleKind::COUNT], draw: f32) -> BubbleKind {
    let mut cumulative = 0.0;
    for kind in BubbleKind::ALL {
        cumulative += weights[kind.index()];
        if draw < cumulative {
            return kind;
        }
    }
    BubbleKind::ALL[0]
}

/// Uniform float in [min, max]; collapses to `min` when the range is empty
#[inline]
pub fn random_float<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    if max > min {
        rng.random_range(min..=max)
    } else {
        min
    }
}

/// Uniform integer in [min, max] inclusive; collapses to `min` when empty
#[inline]
pub fn random_int<R: Rng + ?Sized>(rng: &mut R, min: u32, max: u32) -> u32 {
    if max > min {
        rng.random_range(min..=max)
    } else {
        min
    }
}

/// Uniform choice from a non-empty slice
#[inline]
pub fn random_choice<'a, R: Rng + ?Sized, T>(rng: &mut R, items: &'a [T]) -> &'a T {
    &items[rng.random_range(0..items.len())]
}
