//! Frame tick
//!
//! Advances the simulation by whatever time the host's frame clock reports.
//! Spawning runs off an accumulated delta, never a wall-clock timer, so a
//! seed plus a sequence of frame timestamps reproduces a run exactly.

use rand::Rng;

use super::bubble::BubbleKind;
use super::registry::SpawnOptions;
use super::state::{GameMode, GamePhase, GameState};
use crate::consts::*;
use crate::platform::Host;
use crate::polar_to_cartesian;

/// Process one frame delivered at `timestamp` (ms)
///
/// Does nothing unless running and unpaused, so a frame requested before a
/// pause or stop is dropped on arrival. Returns whether the frame was used;
/// a used frame always re-arms the clock.
pub fn tick(state: &mut GameState, timestamp: f64, host: &mut Host) -> bool {
    if state.phase != GamePhase::Running {
        return false;
    }

    // rAF timestamps can trail the `now()` sampled on resume
    let delta = (timestamp - state.last_timestamp).max(0.0);
    state.last_timestamp = timestamp;

    state.registry.advance_all(delta as f32);
    if state.mode == GameMode::Zen {
        state.session.zen_time_ms += delta;
    }

    state.spawn_accumulator_ms += delta;
    if state.spawn_accumulator_ms >= state.params.spawn_interval_ms
        && state.registry.count() < state.params.max_bubbles
    {
        state.spawn_bubble(SpawnOptions::default(), host);
        state.spawn_accumulator_ms = 0.0;
    }

    host.clock.request_frame();
    true
}

/// Lay out the challenge stack: concentric rings around the container centre
///
/// Ring 1 is outermost with the most and largest bubbles; ring 5 sits on
/// top with the fewest. One rainbow key bubble takes a fixed slot, every
/// other bubble has a small chance of being golden. Returns the number of
/// bubbles spawned.
pub fn generate_bubble_stack(state: &mut GameState, host: &mut Host) -> usize {
    let center = state.registry.bounds() / 2.0;
    let mut spawned = 0;

    for ring in (1..=STACK_RINGS).rev() {
        let depth = STACK_RINGS - ring;
        let count = 5 + depth * 2;
        let ring_radius = 150.0 - (ring - 1) as f32 * 20.0;
        let distance = ring_radius * 0.8;
        let size = 30.0 + depth as f32 * 10.0;

        for i in 0..count {
            let angle = i as f32 / count as f32 * std::f32::consts::TAU;
            let pos = center + polar_to_cartesian(distance, angle);

            let is_key = ring == STACK_KEY_RING && i == STACK_KEY_INDEX;
            let kind = if is_key {
                BubbleKind::Rainbow
            } else if state.registry.rng().random_bool(STACK_GOLDEN_CHANCE) {
                BubbleKind::Golden
            } else {
                BubbleKind::Normal
            };

            let id = state.spawn_bubble(
                SpawnOptions {
                    kind: Some(kind),
                    size: Some(size),
                    layer: Some(ring as u8),
                    pos: Some(pos),
                },
                host,
            );
            if is_key {
                state.key_bubble = Some(id);
            }
            spawned += 1;
        }
    }

    spawned
}
