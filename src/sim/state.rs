//! Game loop controller state
//!
//! Modes, phase machine, counters and spawn tuning. Everything the frame
//! tick mutates lives here; collaborators arrive through `Host`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::bubble::{BubbleKind, PopEvent, PopInfo};
use super::registry::{BubbleRegistry, SpawnOptions, TypeWeights};
use crate::achievements::StatsSnapshot;
use crate::consts::*;
use crate::persistence::Progress;
use crate::platform::Host;
use crate::settings::SpeedPreset;

/// Game modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    #[default]
    Classic,
    Challenge,
    Zen,
}

impl GameMode {
    pub const ALL: [GameMode; 3] = [GameMode::Classic, GameMode::Challenge, GameMode::Zen];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Classic => "classic",
            GameMode::Challenge => "challenge",
            GameMode::Zen => "zen",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "classic" => Some(GameMode::Classic),
            "challenge" => Some(GameMode::Challenge),
            "zen" => Some(GameMode::Zen),
            _ => None,
        }
    }

    /// Starting tuning for this mode
    pub fn params(&self) -> ModeParams {
        match self {
            GameMode::Classic => ModeParams {
                spawn_interval_ms: 1000.0,
                max_bubbles: 50,
                speed_increase: 0.1,
                min_spawn_interval_ms: 300.0,
                weights: TypeWeights::new(0.8, 0.15, 0.05),
            },
            GameMode::Challenge => ModeParams {
                spawn_interval_ms: 800.0,
                max_bubbles: 100,
                speed_increase: 0.15,
                min_spawn_interval_ms: 200.0,
                weights: TypeWeights::new(0.7, 0.2, 0.1),
            },
            GameMode::Zen => ModeParams {
                spawn_interval_ms: 1500.0,
                max_bubbles: 30,
                speed_increase: 0.05,
                min_spawn_interval_ms: 500.0,
                weights: TypeWeights::new(0.9, 0.08, 0.02),
            },
        }
    }
}

/// Spawn tuning; seeded from the mode, then adapted by the speed-up rule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeParams {
    pub spawn_interval_ms: f64,
    pub max_bubbles: usize,
    /// Fraction the spawn interval shrinks by on each speed-up
    pub speed_increase: f64,
    pub min_spawn_interval_ms: f64,
    pub weights: TypeWeights,
}

impl ModeParams {
    /// Shrink the spawn interval by `speed_increase`, floored at the minimum
    pub fn speed_up(&mut self) {
        self.spawn_interval_ms =
            (self.spawn_interval_ms * (1.0 - self.speed_increase)).max(self.min_spawn_interval_ms);
    }
}

/// Controller phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    #[default]
    Stopped,
    Running,
    /// Running but frozen; only meaningful after a start
    Paused,
}

/// Fragment counters, one per bubble kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fragments {
    pub normal: u32,
    pub golden: u32,
    pub rainbow: u32,
}

impl Fragments {
    pub fn get(&self, kind: BubbleKind) -> u32 {
        match kind {
            BubbleKind::Normal => self.normal,
            BubbleKind::Golden => self.golden,
            BubbleKind::Rainbow => self.rainbow,
        }
    }

    pub fn add(&mut self, kind: BubbleKind) {
        let slot = match kind {
            BubbleKind::Normal => &mut self.normal,
            BubbleKind::Golden => &mut self.golden,
            BubbleKind::Rainbow => &mut self.rainbow,
        };
        *slot = slot.saturating_add(1);
    }

    pub fn total(&self) -> u32 {
        self.normal + self.golden + self.rainbow
    }
}

/// Per-session counters reported to achievements (never persisted)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SessionStats {
    pub daily_pops: u32,
    pub zen_time_ms: f64,
    pub challenges_completed: u32,
}

/// Result of a successful pop through the controller
#[derive(Debug, Clone, PartialEq)]
pub struct PopOutcome {
    pub event: PopEvent,
    /// Achievement ids unlocked by this pop
    pub unlocked: Vec<&'static str>,
}

/// Complete controller state
#[derive(Debug, Clone)]
pub struct GameState {
    /// RNG seed the registry was created with
    pub seed: u64,
    pub(crate) registry: BubbleRegistry,
    pub(crate) mode: GameMode,
    pub(crate) phase: GamePhase,
    pub(crate) params: ModeParams,
    pub(crate) spawn_accumulator_ms: f64,
    /// Timestamp of the last processed frame
    pub(crate) last_timestamp: f64,
    /// Pops this run; drives the speed-up
    pub(crate) popped_count: u32,
    pub(crate) score: u64,
    pub(crate) progress: Progress,
    pub(crate) session: SessionStats,
    /// Key rainbow bubble of the current challenge stack
    pub(crate) key_bubble: Option<u32>,
}

impl GameState {
    /// Create a stopped controller with the default container size
    pub fn new(seed: u64, progress: Progress) -> Self {
        Self {
            seed,
            registry: BubbleRegistry::new(seed, Vec2::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)),
            mode: GameMode::default(),
            phase: GamePhase::Stopped,
            params: GameMode::default().params(),
            spawn_accumulator_ms: 0.0,
            last_timestamp: 0.0,
            popped_count: 0,
            score: 0,
            progress,
            session: SessionStats::default(),
            key_bubble: None,
        }
    }

    pub fn registry(&self) -> &BubbleRegistry {
        &self.registry
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Running, paused or not
    pub fn is_running(&self) -> bool {
        self.phase != GamePhase::Stopped
    }

    pub fn is_paused(&self) -> bool {
        self.phase == GamePhase::Paused
    }

    pub fn params(&self) -> &ModeParams {
        &self.params
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn popped_count(&self) -> u32 {
        self.popped_count
    }

    pub fn fragments(&self) -> &Fragments {
        &self.progress.fragments
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    pub fn session(&self) -> &SessionStats {
        &self.session
    }

    pub fn key_bubble(&self) -> Option<u32> {
        self.key_bubble
    }

    /// Container resize
    pub fn set_bounds(&mut self, width: f32, height: f32) {
        self.registry.set_bounds(width, height);
    }

    /// Record today's login and persist; returns the streak
    pub fn record_login(&mut self, today: i64, host: &mut Host) -> u32 {
        let streak = self.progress.record_login(today);
        self.progress.save(host.storage);
        log::info!("Login streak: {} day(s)", streak);
        streak
    }

    /// Start (or restart) a run in `mode`
    pub fn start(&mut self, mode: GameMode, host: &mut Host) {
        if self.is_running() {
            log::info!("Switching mode {} -> {}", self.mode.as_str(), mode.as_str());
        }
        self.teardown(host);

        self.mode = mode;
        self.params = mode.params();
        let weights = self.params.weights;
        self.registry
            .set_type_weights(BubbleKind::ALL.map(|kind| (kind, weights.get(kind))));
        self.spawn_accumulator_ms = 0.0;
        self.popped_count = 0;
        self.score = 0;

        if mode == GameMode::Challenge {
            let spawned = super::tick::generate_bubble_stack(self, host);
            log::info!("Challenge stack: {} bubbles", spawned);
        }

        self.phase = GamePhase::Running;
        self.last_timestamp = host.clock.now();
        host.clock.request_frame();
        log::info!("Started {} mode", mode.as_str());
    }

    /// Freeze the run; false if not running or already paused
    pub fn pause(&mut self) -> bool {
        if self.phase != GamePhase::Running {
            return false;
        }
        self.phase = GamePhase::Paused;
        log::info!("Paused");
        true
    }

    /// Unfreeze a paused run; false unless paused
    pub fn resume(&mut self, host: &mut Host) -> bool {
        if self.phase != GamePhase::Paused {
            return false;
        }
        self.phase = GamePhase::Running;
        self.last_timestamp = host.clock.now();
        host.clock.request_frame();
        log::info!("Resumed");
        true
    }

    /// End the run and clear every bubble
    pub fn stop(&mut self, host: &mut Host) {
        if !self.is_running() {
            return;
        }
        self.teardown(host);
        self.phase = GamePhase::Stopped;
        log::info!("Stopped {} mode (score {})", self.mode.as_str(), self.score);
    }

    /// Remove every bubble without effects
    fn teardown(&mut self, host: &mut Host) {
        for id in self.registry.remove_all() {
            host.surface.detach(id, 0.0);
        }
        self.key_bubble = None;
    }

    /// Spawn one bubble and attach it to the surface; returns its id
    pub fn spawn_bubble(&mut self, options: SpawnOptions, host: &mut Host) -> u32 {
        let bubble = self.registry.create(options);
        host.surface.attach(bubble);
        bubble.id
    }

    /// Pop a live bubble on user activation
    ///
    /// Dispatches the pop animation, sound and particles, schedules the
    /// cosmetic detach, then updates scoring, progress and achievements.
    /// Unknown or already popped ids are ignored.
    pub fn pop_bubble(&mut self, id: u32, host: &mut Host) -> Option<PopOutcome> {
        let event = self.registry.pop(id)?;

        host.surface.animate_pop(id, event.effect);
        host.effects.play_effect(event.sound, event.intensity);
        host.effects.emit_particles(&event.particles);
        host.surface.detach(id, event.removal_delay_ms);

        self.on_bubble_pop(&event.info);
        if self.key_bubble == Some(id) {
            self.key_bubble = None;
            self.session.challenges_completed += 1;
            log::info!("Challenge completed ({} this session)", self.session.challenges_completed);
        }

        self.progress.save(host.storage);
        let unlocked = host.achievements.check(&self.stats_snapshot());

        Some(PopOutcome { event, unlocked })
    }

    /// Score a pop and apply the speed-up every `SPEED_UP_EVERY` pops
    pub fn on_bubble_pop(&mut self, info: &PopInfo) {
        self.score += info.size as u64;
        self.progress.fragments.add(info.kind);
        self.popped_count += 1;
        self.session.daily_pops += 1;

        if self.popped_count % SPEED_UP_EVERY == 0 {
            self.params.speed_up();
            log::info!("Speed up: spawn every {:.0}ms", self.params.spawn_interval_ms);
        }
    }

    /// Apply a speed preset; ignored while stopped
    pub fn set_speed(&mut self, preset: SpeedPreset) -> bool {
        if !self.is_running() {
            return false;
        }
        self.params.spawn_interval_ms = preset.spawn_interval_ms(self.mode);
        log::info!(
            "Speed {}: spawn every {:.0}ms",
            preset.as_str(),
            self.params.spawn_interval_ms
        );
        true
    }

    pub fn stats_snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            daily_pops: self.session.daily_pops,
            fragments: self.progress.fragments,
            zen_time_ms: self.session.zen_time_ms,
            login_streak: self.progress.login_streak,
            challenges_completed: self.session.challenges_completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SoundEffect;
    use crate::persistence::Storage;
    use crate::platform::HeadlessHost;
    use proptest::prelude::*;

    fn info(kind: BubbleKind, size: f32) -> PopInfo {
        PopInfo {
            id: 1,
            kind,
            size,
            pos: Vec2::ZERO,
        }
    }

    fn started(mode: GameMode) -> (GameState, HeadlessHost) {
        let mut hh = HeadlessHost::new();
        let mut state = GameState::new(42, Progress::default());
        state.start(mode, &mut hh.host());
        (state, hh)
    }

    #[test]
    fn test_mode_parsing() {
        for mode in GameMode::ALL {
            assert_eq!(GameMode::from_str(mode.as_str()), Some(mode));
        }
        assert_eq!(GameMode::from_str("arcade"), None);
    }

    #[test]
    fn test_speed_up_law() {
        let mut state = GameState::new(1, Progress::default());
        state.params = ModeParams {
            spawn_interval_ms: 1000.0,
            speed_increase: 0.1,
            min_spawn_interval_ms: 300.0,
            ..GameMode::Classic.params()
        };

        for _ in 0..10 {
            state.on_bubble_pop(&info(BubbleKind::Normal, 40.0));
        }
        assert!((state.params.spawn_interval_ms - 900.0).abs() < 1e-9);

        // Ten speed-ups: 1000 * 0.9^10, still above the floor
        for _ in 0..90 {
            state.on_bubble_pop(&info(BubbleKind::Normal, 40.0));
        }
        assert!((state.params.spawn_interval_ms - 1000.0 * 0.9f64.powi(10)).abs() < 1e-6);
        assert!((state.params.spawn_interval_ms - 348.678).abs() < 1e-3);
        assert_eq!(state.popped_count(), 100);

        // The twelfth speed-up would drop below 300, so it floors
        for _ in 0..20 {
            state.on_bubble_pop(&info(BubbleKind::Normal, 40.0));
        }
        assert_eq!(state.params.spawn_interval_ms, 300.0);
    }

    #[test]
    fn test_on_pop_scores_size_and_fragment() {
        let mut state = GameState::new(1, Progress::default());
        state.on_bubble_pop(&info(BubbleKind::Golden, 73.0));
        state.on_bubble_pop(&info(BubbleKind::Rainbow, 90.0));

        assert_eq!(state.score(), 163);
        assert_eq!(state.fragments().golden, 1);
        assert_eq!(state.fragments().rainbow, 1);
        assert_eq!(state.fragments().total(), 2);
        assert_eq!(state.session().daily_pops, 2);
    }

    #[test]
    fn test_start_seeds_mode_params() {
        let (state, hh) = started(GameMode::Zen);
        assert_eq!(state.phase(), GamePhase::Running);
        assert_eq!(state.params().spawn_interval_ms, 1500.0);
        assert_eq!(state.params().max_bubbles, 30);
        assert_eq!(state.registry().type_weights().get(BubbleKind::Normal), 0.9);
        assert_eq!(state.registry().count(), 0);
        assert!(hh.clock.frame_pending);
    }

    #[test]
    fn test_mode_switch_keeps_one_frame_chain() {
        let (mut state, mut hh) = started(GameMode::Classic);
        state.start(GameMode::Zen, &mut hh.host());
        assert_eq!(hh.clock.total_requests, 2);

        let timestamp = hh.clock.next_frame(16.0).unwrap();
        assert!(crate::sim::tick(&mut state, timestamp, &mut hh.host()));
        // The re-armed frame is the only one outstanding
        assert!(hh.clock.next_frame(16.0).is_some());
        assert!(hh.clock.next_frame(16.0).is_none());
    }

    #[test]
    fn test_pause_resume_state_machine() {
        let mut hh = HeadlessHost::new();
        let mut state = GameState::new(3, Progress::default());

        // Invalid-state calls are no-ops
        assert!(!state.pause());
        assert!(!state.resume(&mut hh.host()));
        state.stop(&mut hh.host());
        assert_eq!(state.phase(), GamePhase::Stopped);

        state.start(GameMode::Classic, &mut hh.host());
        assert!(!state.resume(&mut hh.host()));
        assert!(state.pause());
        assert!(!state.pause());
        assert!(state.is_running() && state.is_paused());

        hh.clock.now_ms = 5000.0;
        assert!(state.resume(&mut hh.host()));
        assert_eq!(state.last_timestamp, 5000.0);
        assert_eq!(state.phase(), GamePhase::Running);

        state.stop(&mut hh.host());
        assert!(!state.is_running());
        assert!(!state.pause());
    }

    #[test]
    fn test_restart_tears_down_and_resets() {
        let (mut state, mut hh) = started(GameMode::Classic);
        for _ in 0..4 {
            state.spawn_bubble(SpawnOptions::default(), &mut hh.host());
        }
        let first = state.registry().iter().next().map(|b| b.id).unwrap();
        state.pop_bubble(first, &mut hh.host()).unwrap();
        assert!(state.score() > 0);

        state.start(GameMode::Zen, &mut hh.host());
        assert_eq!(state.registry().count(), 0);
        assert_eq!(state.score(), 0);
        assert_eq!(state.popped_count(), 0);
        assert!(hh.surface.visible.is_empty());
        // Teardown detaches at once; only the popped bubble waited
        let delayed: Vec<_> = hh.surface.detached.iter().filter(|(_, d)| *d > 0.0).collect();
        assert_eq!(delayed, vec![&(first, 300.0)]);
        // Cumulative fragments survive a restart
        assert_eq!(state.fragments().total(), 1);
    }

    #[test]
    fn test_pop_bubble_dispatches_once() {
        let (mut state, mut hh) = started(GameMode::Classic);
        let id = state.spawn_bubble(
            SpawnOptions {
                kind: Some(BubbleKind::Golden),
                size: Some(60.0),
                ..Default::default()
            },
            &mut hh.host(),
        );

        let outcome = state.pop_bubble(id, &mut hh.host()).expect("live bubble pops");
        assert!(state.pop_bubble(id, &mut hh.host()).is_none());

        assert_eq!(outcome.event.info.kind, BubbleKind::Golden);
        assert_eq!(hh.effects.sounds, vec![(SoundEffect::Chime, 0.5)]);
        assert_eq!(hh.effects.bursts.len(), 1);
        assert_eq!(hh.surface.pop_animations.len(), 1);
        assert_eq!(state.registry().count(), 0);
        assert_eq!(state.score(), 60);
    }

    #[test]
    fn test_pop_persists_progress() {
        let (mut state, mut hh) = started(GameMode::Classic);
        let id = state.spawn_bubble(
            SpawnOptions {
                kind: Some(BubbleKind::Rainbow),
                ..Default::default()
            },
            &mut hh.host(),
        );
        state.pop_bubble(id, &mut hh.host());

        let saved = Progress::load(&hh.storage);
        assert_eq!(saved.fragments.rainbow, 1);
    }

    #[test]
    fn test_pop_reports_achievements() {
        let (mut state, mut hh) = started(GameMode::Classic);
        state.session.daily_pops = 99;
        let id = state.spawn_bubble(SpawnOptions::default(), &mut hh.host());

        let outcome = state.pop_bubble(id, &mut hh.host()).unwrap();
        assert_eq!(outcome.unlocked, vec!["ACH001"]);
        assert!(hh.achievements.is_unlocked("ACH001"));
    }

    #[test]
    fn test_set_speed_only_while_running() {
        let mut hh = HeadlessHost::new();
        let mut state = GameState::new(1, Progress::default());
        assert!(!state.set_speed(SpeedPreset::Fast));

        state.start(GameMode::Challenge, &mut hh.host());
        assert!(state.set_speed(SpeedPreset::Medium));
        assert_eq!(state.params().spawn_interval_ms, 1200.0);

        state.pause();
        assert!(state.set_speed(SpeedPreset::Slow));
        assert_eq!(state.params().spawn_interval_ms, 3000.0);
    }

    #[test]
    fn test_record_login_persists_streak() {
        let mut hh = HeadlessHost::new();
        let mut state = GameState::new(1, Progress::default());
        assert_eq!(state.record_login(20, &mut hh.host()), 1);
        assert_eq!(state.record_login(21, &mut hh.host()), 2);
        assert_eq!(state.stats_snapshot().login_streak, 2);

        let saved = Progress::load(&hh.storage);
        assert_eq!(saved.login_streak, 2);
        assert!(hh.storage.load(Progress::STORAGE_KEY).unwrap().is_some());
    }

    proptest! {
        #[test]
        fn prop_speed_up_monotonic_and_floored(mode_index in 0usize..3, pops in 0u32..500) {
            let mode = GameMode::ALL[mode_index];
            let mut state = GameState::new(7, Progress::default());
            state.params = mode.params();

            let mut last = state.params.spawn_interval_ms;
            for _ in 0..pops {
                state.on_bubble_pop(&info(BubbleKind::Normal, 30.0));
                let now = state.params.spawn_interval_ms;
                prop_assert!(now <= last);
                prop_assert!(now >= state.params.min_spawn_interval_ms);
                last = now;
            }
        }
    }
}
