//! Bubble registry
//!
//! Owns every live bubble. A bubble leaves the registry the moment it is
//! popped or removed, so the live map never holds an inert entry.

use std::collections::BTreeMap;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::bubble::{Bubble, BubbleKind, PopEvent};
use super::geometry::{circles_overlap, random_float, random_int, weighted_choice, Circle};
use crate::consts::*;

/// Spawn weights per bubble kind
///
/// Treated as cumulative thresholds against a uniform draw, so they need
/// not sum to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeWeights([f32; BubbleKind::COUNT]);

impl Default for TypeWeights {
    fn default() -> Self {
        Self::new(0.8, 0.15, 0.05)
    }
}

impl TypeWeights {
    pub fn new(normal: f32, golden: f32, rainbow: f32) -> Self {
        let mut weights = Self([0.0; BubbleKind::COUNT]);
        weights.set(BubbleKind::Normal, normal);
        weights.set(BubbleKind::Golden, golden);
        weights.set(BubbleKind::Rainbow, rainbow);
        weights
    }

    #[inline]
    pub fn get(&self, kind: BubbleKind) -> f32 {
        self.0[kind.index()]
    }

    /// Set one weight; negative values are treated as zero
    pub fn set(&mut self, kind: BubbleKind, weight: f32) {
        self.0[kind.index()] = weight.max(0.0);
    }

    /// Overwrite the given kinds, keeping the rest
    pub fn merge<I>(&mut self, overrides: I)
    where
        I: IntoIterator<Item = (BubbleKind, f32)>,
    {
        for (kind, weight) in overrides {
            self.set(kind, weight);
        }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> BubbleKind {
        weighted_choice(&self.0, rng.random::<f32>())
    }
}

/// Optional overrides for `BubbleRegistry::create`
#[derive(Debug, Clone, Copy, Default)]
pub struct SpawnOptions {
    pub kind: Option<BubbleKind>,
    pub size: Option<f32>,
    pub layer: Option<u8>,
    pub pos: Option<Vec2>,
}

/// Owner of the live bubble set
#[derive(Debug, Clone)]
pub struct BubbleRegistry {
    /// Keyed by id so iteration order is stable
    bubbles: BTreeMap<u32, Bubble>,
    weights: TypeWeights,
    bounds: Vec2,
    rng: Pcg32,
    next_id: u32,
}

impl BubbleRegistry {
    pub fn new(seed: u64, bounds: Vec2) -> Self {
        Self {
            bubbles: BTreeMap::new(),
            weights: TypeWeights::default(),
            bounds,
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
        }
    }

    /// Allocate a new bubble ID
    fn next_bubble_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Container size (width, height)
    pub fn bounds(&self) -> Vec2 {
        self.bounds
    }

    pub fn set_bounds(&mut self, width: f32, height: f32) {
        self.bounds = Vec2::new(width.max(0.0), height.max(0.0));
    }

    pub fn rng(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    pub fn type_weights(&self) -> &TypeWeights {
        &self.weights
    }

    /// Merge new spawn weights into the current ones
    pub fn set_type_weights<I>(&mut self, overrides: I)
    where
        I: IntoIterator<Item = (BubbleKind, f32)>,
    {
        self.weights.merge(overrides);
    }

    /// Create and register a bubble, filling unset options randomly
    pub fn create(&mut self, options: SpawnOptions) -> &Bubble {
        let kind = match options.kind {
            Some(kind) => kind,
            None => self.weights.sample(&mut self.rng),
        };
        let size = match options.size {
            Some(size) => size,
            None => {
                let (min, max) = kind.size_range();
                random_int(&mut self.rng, min, max) as f32
            }
        };
        let pos = match options.pos {
            Some(pos) => pos,
            None => self.find_position(size / 2.0),
        };
        let layer = match options.layer {
            Some(layer) => layer.clamp(1, STACK_RINGS as u8),
            None => random_int(&mut self.rng, 1, 3) as u8,
        };

        let id = self.next_bubble_id();
        let bubble = Bubble::new(id, size, layer, kind, pos, &mut self.rng);
        log::debug!("Spawned {} bubble {} (size {}) at {:?}", kind.as_str(), id, size, pos);

        self.bubbles.entry(id).or_insert(bubble)
    }

    /// Best-effort non-overlapping position for a bubble of `radius`
    ///
    /// Tries `PLACEMENT_ATTEMPTS` candidates inside the container inset by
    /// `radius + PLACEMENT_MARGIN`. If every candidate overlaps a live bubble
    /// the last one is used anyway; placement never fails.
    pub fn find_position(&mut self, radius: f32) -> Vec2 {
        let inset = radius + PLACEMENT_MARGIN;
        let (min_x, max_x) = inset_range(inset, self.bounds.x);
        let (min_y, max_y) = inset_range(inset, self.bounds.y);

        let mut candidate = Vec2::new(min_x, min_y);
        for _ in 0..PLACEMENT_ATTEMPTS {
            candidate = Vec2::new(
                random_float(&mut self.rng, min_x, max_x),
                random_float(&mut self.rng, min_y, max_y),
            );
            let probe = Circle::new(candidate, radius).inflated(PLACEMENT_TOLERANCE);
            let clear = self
                .bubbles
                .values()
                .all(|b| !circles_overlap(&probe, &b.collision_circle()));
            if clear {
                return candidate;
            }
        }

        log::debug!(
            "No free spot after {} attempts, using last candidate {:?}",
            PLACEMENT_ATTEMPTS,
            candidate
        );
        candidate
    }

    /// Advance every live bubble by `dt_ms`
    pub fn advance_all(&mut self, dt_ms: f32) {
        let bounds = self.bounds;
        for bubble in self.bubbles.values_mut() {
            bubble.advance(dt_ms, bounds);
        }
    }

    /// Pop a live bubble, unregistering it before its effects are produced
    ///
    /// Returns `None` for unknown or already retired ids.
    pub fn pop(&mut self, id: u32) -> Option<PopEvent> {
        let mut bubble = self.bubbles.remove(&id)?;
        bubble.pop(&mut self.rng)
    }

    /// Remove every bubble without effects, returning the retired ids
    pub fn remove_all(&mut self) -> Vec<u32> {
        let retired = std::mem::take(&mut self.bubbles);
        retired
            .into_values()
            .filter_map(|mut bubble| bubble.remove().then_some(bubble.id))
            .collect()
    }

    pub fn count(&self) -> usize {
        self.bubbles.len()
    }

    pub fn get(&self, id: u32) -> Option<&Bubble> {
        self.bubbles.get(&id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.bubbles.contains_key(&id)
    }

    /// Live bubbles in id order
    pub fn iter(&self) -> impl Iterator<Item = &Bubble> {
        self.bubbles.values()
    }
}

/// Inclusive coordinate range for a centre inset from both edges
///
/// A container too small for the inset pins the centre to the middle.
fn inset_range(inset: f32, extent: f32) -> (f32, f32) {
    let min = inset;
    let max = extent - inset;
    if max >= min {
        (min, max)
    } else {
        let mid = extent / 2.0;
        (mid, mid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn registry() -> BubbleRegistry {
        BubbleRegistry::new(1234, Vec2::new(800.0, 600.0))
    }

    #[test]
    fn test_create_registers_bubble() {
        let mut reg = registry();
        let id = reg.create(SpawnOptions::default()).id;

        assert_eq!(reg.count(), 1);
        let bubble = reg.get(id).unwrap();
        assert!(!bubble.is_popped());
        assert!((1..=3).contains(&bubble.layer));
        let (min, max) = bubble.kind.size_range();
        assert!(bubble.size >= min as f32 && bubble.size <= max as f32);
        assert_eq!(bubble.size.fract(), 0.0);
    }

    #[test]
    fn test_create_honors_overrides() {
        let mut reg = registry();
        let b = reg.create(SpawnOptions {
            kind: Some(BubbleKind::Rainbow),
            size: Some(42.0),
            layer: Some(5),
            pos: Some(Vec2::new(10.0, 20.0)),
        });

        assert_eq!(b.kind, BubbleKind::Rainbow);
        assert_eq!(b.size, 42.0);
        assert_eq!(b.layer, 5);
        assert_eq!(b.pos, Vec2::new(10.0, 20.0));
    }

    #[test]
    fn test_ids_are_unique() {
        let mut reg = registry();
        let ids: BTreeSet<u32> = (0..20).map(|_| reg.create(SpawnOptions::default()).id).collect();
        assert_eq!(ids.len(), 20);
        assert_eq!(reg.count(), 20);
    }

    #[test]
    fn test_layer_override_is_clamped() {
        let mut reg = registry();
        let high = reg
            .create(SpawnOptions {
                layer: Some(9),
                ..Default::default()
            })
            .layer;
        let low = reg
            .create(SpawnOptions {
                layer: Some(0),
                ..Default::default()
            })
            .layer;
        assert_eq!(high, 5);
        assert_eq!(low, 1);
    }

    #[test]
    fn test_sizes_follow_kind() {
        let mut reg = registry();
        for kind in BubbleKind::ALL {
            for _ in 0..50 {
                let b = reg.create(SpawnOptions {
                    kind: Some(kind),
                    pos: Some(Vec2::splat(300.0)),
                    ..Default::default()
                });
                let (min, max) = kind.size_range();
                assert!(b.size >= min as f32 && b.size <= max as f32);
            }
        }
    }

    #[test]
    fn test_placement_avoids_overlap_when_room() {
        let mut reg = BubbleRegistry::new(77, Vec2::new(2000.0, 2000.0));
        let mut placed: Vec<Circle> = Vec::new();

        for _ in 0..12 {
            let b = reg.create(SpawnOptions {
                size: Some(40.0),
                ..Default::default()
            });
            let probe = b.collision_circle().inflated(PLACEMENT_TOLERANCE);
            for other in &placed {
                assert!(!circles_overlap(&probe, other));
            }
            placed.push(b.collision_circle());
        }
    }

    #[test]
    fn test_placement_stays_inside_inset() {
        let mut reg = registry();
        for _ in 0..50 {
            let b = reg.create(SpawnOptions::default());
            let inset = b.radius() + PLACEMENT_MARGIN;
            assert!(b.pos.x >= inset && b.pos.x <= 800.0 - inset);
            assert!(b.pos.y >= inset && b.pos.y <= 600.0 - inset);
        }
    }

    #[test]
    fn test_placement_falls_back_when_crowded() {
        // Container fits one bubble; later spawns must still succeed
        let mut reg = BubbleRegistry::new(5, Vec2::new(120.0, 120.0));
        for _ in 0..5 {
            reg.create(SpawnOptions {
                size: Some(60.0),
                ..Default::default()
            });
        }
        assert_eq!(reg.count(), 5);
    }

    #[test]
    fn test_tiny_container_centres_bubble() {
        let mut reg = BubbleRegistry::new(5, Vec2::new(50.0, 50.0));
        let b = reg.create(SpawnOptions {
            size: Some(100.0),
            ..Default::default()
        });
        assert_eq!(b.pos, Vec2::new(25.0, 25.0));
    }

    #[test]
    fn test_pop_unregisters_immediately() {
        let mut reg = registry();
        let a = reg.create(SpawnOptions::default()).id;
        let b = reg.create(SpawnOptions::default()).id;

        let event = reg.pop(a).expect("live bubble pops");
        assert_eq!(event.info.id, a);
        assert_eq!(reg.count(), 1);
        assert!(!reg.contains(a));
        assert!(reg.contains(b));

        // Second pop of the same id is ignored
        assert!(reg.pop(a).is_none());
        assert_eq!(reg.count(), 1);
    }

    #[test]
    fn test_remove_all_clears_without_events() {
        let mut reg = registry();
        for _ in 0..5 {
            reg.create(SpawnOptions::default());
        }
        let removed = reg.remove_all();
        assert_eq!(removed.len(), 5);
        assert_eq!(reg.count(), 0);
        assert!(reg.remove_all().is_empty());
    }

    #[test]
    fn test_advance_all_moves_every_bubble() {
        let mut reg = registry();
        for _ in 0..10 {
            reg.create(SpawnOptions::default());
        }
        let before: Vec<Vec2> = reg.iter().map(|b| b.pos).collect();
        reg.advance_all(16.0);
        let after: Vec<Vec2> = reg.iter().map(|b| b.pos).collect();

        let moved = before.iter().zip(&after).filter(|(a, b)| a != b).count();
        assert!(moved > 0);
        for b in reg.iter() {
            assert!(b.pos.x >= b.radius() && b.pos.x <= 800.0 - b.radius());
            assert!(b.pos.y >= b.radius() && b.pos.y <= 600.0 - b.radius());
        }
    }

    #[test]
    fn test_type_weights_merge() {
        let mut reg = registry();
        reg.set_type_weights([(BubbleKind::Golden, 0.5)]);

        let w = reg.type_weights();
        assert_eq!(w.get(BubbleKind::Normal), 0.8);
        assert_eq!(w.get(BubbleKind::Golden), 0.5);
        assert_eq!(w.get(BubbleKind::Rainbow), 0.05);

        reg.set_type_weights([(BubbleKind::Rainbow, -1.0)]);
        assert_eq!(reg.type_weights().get(BubbleKind::Rainbow), 0.0);
    }

    #[test]
    fn test_weights_drive_spawned_kinds() {
        let mut reg = registry();
        reg.set_type_weights([
            (BubbleKind::Normal, 0.0),
            (BubbleKind::Golden, 1.0),
            (BubbleKind::Rainbow, 0.0),
        ]);
        for _ in 0..20 {
            let b = reg.create(SpawnOptions {
                pos: Some(Vec2::splat(100.0)),
                ..Default::default()
            });
            assert_eq!(b.kind, BubbleKind::Golden);
        }
    }

    #[test]
    fn test_same_seed_same_bubbles() {
        let mut a = registry();
        let mut b = registry();
        for _ in 0..10 {
            let x = a.create(SpawnOptions::default()).clone();
            let y = b.create(SpawnOptions::default()).clone();
            assert_eq!(x.pos, y.pos);
            assert_eq!(x.size, y.size);
            assert_eq!(x.kind, y.kind);
        }
    }
}
