//! Bubble Pop entry point
//!
//! Handles platform-specific initialization and wires the host to the game.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::{Rc, Weak};
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlElement};

    use bubble_pop::achievements::PersistentAchievements;
    use bubble_pop::audio::SoundEffect;
    use bubble_pop::persistence::{LocalStorage, day_from_unix_ms};
    use bubble_pop::platform::web::{ActivateHandler, DomSurface, FrameHandler, RafClock, WebEffects};
    use bubble_pop::platform::{EffectsDispatcher, Host};
    use bubble_pop::{AchievementBook, GameMode, GamePhase, GameState, Progress, Settings, SpeedPreset, tick};

    /// Game instance holding the controller and its browser collaborators
    struct Game {
        state: GameState,
        surface: DomSurface,
        effects: WebEffects,
        clock: RafClock,
        storage: LocalStorage,
        achievements: PersistentAchievements<LocalStorage>,
        settings: Settings,
        document: Document,
    }

    impl Game {
        /// Borrow the controller and a `Host` over the collaborators at once
        fn split(&mut self) -> (&mut GameState, Host<'_>) {
            let host = Host {
                surface: &mut self.surface,
                effects: &mut self.effects,
                clock: &mut self.clock,
                storage: &mut self.storage,
                achievements: &mut self.achievements,
            };
            (&mut self.state, host)
        }

        fn frame(&mut self, time: f64) {
            let (state, mut host) = self.split();
            if tick(state, time, &mut host) {
                self.surface.sync(self.state.registry());
                self.update_hud();
            }
        }

        fn activate(&mut self, id: u32) {
            self.achievements.book.set_now(js_sys::Date::now());
            let (state, mut host) = self.split();
            let Some(outcome) = state.pop_bubble(id, &mut host) else {
                return;
            };
            if !outcome.unlocked.is_empty() {
                self.effects.play_effect(SoundEffect::Achievement, 1.0);
                for id in &outcome.unlocked {
                    self.show_achievement(id);
                }
            }
            self.update_hud();
        }

        fn start(&mut self, mode: GameMode) {
            self.resize();
            let (state, mut host) = self.split();
            state.start(mode, &mut host);
            self.update_hud();
        }

        fn toggle_pause(&mut self) {
            let (state, mut host) = self.split();
            match state.phase() {
                GamePhase::Running => {
                    state.pause();
                }
                GamePhase::Paused => {
                    state.resume(&mut host);
                }
                GamePhase::Stopped => {}
            }
            self.update_hud();
        }

        fn stop(&mut self) {
            let (state, mut host) = self.split();
            state.stop(&mut host);
            self.update_hud();
        }

        fn toggle_sound(&mut self) {
            self.settings.toggle_sound(&mut self.storage);
            self.effects.apply_settings(&self.settings);
            self.update_hud();
        }

        fn toggle_music(&mut self) {
            self.settings.toggle_music(&mut self.storage);
            self.update_hud();
        }

        fn resize(&mut self) {
            let (w, h) = self.surface.size();
            if w > 0.0 && h > 0.0 {
                self.state.set_bounds(w, h);
            }
        }

        fn set_text(&self, id: &str, text: &str) {
            if let Some(el) = self.document.get_element_by_id(id) {
                el.set_text_content(Some(text));
            }
        }

        fn set_hidden(&self, id: &str, hidden: bool) {
            if let Some(el) = self.document.get_element_by_id(id) {
                let _ = el.class_list().toggle_with_force("hidden", hidden);
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let fragments = self.state.fragments();
            self.set_text("score", &self.state.score().to_string());
            self.set_text("fragments-normal", &fragments.normal.to_string());
            self.set_text("fragments-golden", &fragments.golden.to_string());
            self.set_text("fragments-rainbow", &fragments.rainbow.to_string());
            self.set_text("bubble-count", &self.state.registry().count().to_string());
            self.set_text("current-mode", self.state.mode().as_str());
            self.set_text(
                "pause-btn",
                if self.state.is_paused() { "Resume" } else { "Pause" },
            );
            self.set_text(
                "sound-toggle",
                if self.settings.sound_enabled { "Sound: on" } else { "Sound: off" },
            );
            self.set_text(
                "music-toggle",
                if self.settings.music_enabled { "Music: on" } else { "Music: off" },
            );
            self.set_hidden("pause-overlay", !self.state.is_paused());
            self.set_hidden("mode-menu", self.state.is_running());
        }

        fn show_achievement(&self, id: &str) {
            let Some(achievement) = AchievementBook::find(id) else {
                return;
            };
            self.set_text("achievement-title", achievement.title);
            self.set_text("achievement-description", achievement.description);
            self.set_hidden("achievement-toast", false);
        }
    }

    /// Hook a click listener to `#id`, if present
    fn on_click(document: &Document, id: &str, game: &Rc<RefCell<Game>>, action: fn(&mut Game)) {
        let Some(el) = document.get_element_by_id(id) else {
            log::warn!("Missing #{} button", id);
            return;
        };
        let game = game.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            action(&mut game.borrow_mut());
        });
        let _ = el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn element(document: &Document, id: &str) -> Result<HtmlElement, JsValue> {
        document
            .get_element_by_id(id)
            .ok_or_else(|| JsValue::from_str(&format!("missing #{}", id)))?
            .dyn_into::<HtmlElement>()
            .map_err(|_| JsValue::from_str(&format!("#{} is not an HTML element", id)))
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialized".into());
        }

        log::info!("Bubble Pop starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        let container = element(&document, "game-container")?;
        let particle_layer = element(&document, "particles").unwrap_or_else(|_| container.clone());

        let storage = LocalStorage;
        let settings = Settings::load(&storage);
        let progress = Progress::load(&storage);
        let seed = js_sys::Date::now() as u64;

        let game = Rc::new_cyclic(|weak: &Weak<RefCell<Game>>| {
            let on_activate: ActivateHandler = {
                let weak = weak.clone();
                Rc::new(move |id| {
                    if let Some(game) = weak.upgrade() {
                        game.borrow_mut().activate(id);
                    }
                })
            };
            let on_frame: FrameHandler = {
                let weak = weak.clone();
                Rc::new(move |time| {
                    if let Some(game) = weak.upgrade() {
                        game.borrow_mut().frame(time);
                    }
                })
            };

            let mut effects = WebEffects::new(document.clone(), particle_layer);
            effects.apply_settings(&settings);

            RefCell::new(Game {
                state: GameState::new(seed, progress),
                surface: DomSurface::new(document.clone(), container, on_activate),
                effects,
                clock: RafClock::new(on_frame),
                storage: LocalStorage,
                achievements: PersistentAchievements::load(LocalStorage),
                settings,
                document: document.clone(),
            })
        });

        {
            let mut g = game.borrow_mut();
            let today = day_from_unix_ms(js_sys::Date::now());
            let (state, mut host) = g.split();
            state.record_login(today, &mut host);
            g.resize();
            g.update_hud();
        }
        log::info!("Game initialized with seed: {}", seed);

        on_click(&document, "classic-mode", &game, |g| g.start(GameMode::Classic));
        on_click(&document, "challenge-mode", &game, |g| g.start(GameMode::Challenge));
        on_click(&document, "zen-mode", &game, |g| g.start(GameMode::Zen));
        on_click(&document, "pause-btn", &game, Game::toggle_pause);
        on_click(&document, "stop-btn", &game, Game::stop);
        on_click(&document, "sound-toggle", &game, Game::toggle_sound);
        on_click(&document, "music-toggle", &game, Game::toggle_music);
        on_click(&document, "achievement-toast", &game, |g| {
            g.set_hidden("achievement-toast", true)
        });
        for preset in [SpeedPreset::Slow, SpeedPreset::Medium, SpeedPreset::Fast] {
            let id = format!("speed-{}", preset.as_str());
            let Some(el) = document.get_element_by_id(&id) else {
                continue;
            };
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                game.borrow_mut().state.set_speed(preset);
            });
            let _ = el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        setup_auto_pause(&document, game.clone());
        setup_resize(game);

        log::info!("Bubble Pop running!");
        Ok(())
    }

    fn setup_auto_pause(document: &Document, game: Rc<RefCell<Game>>) {
        let document_clone = document.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                let mut g = game.borrow_mut();
                if g.state.phase() == GamePhase::Running {
                    g.state.pause();
                    g.update_hud();
                    log::info!("Auto-paused (tab hidden)");
                }
            }
        });
        let _ = document
            .add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_resize(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            game.borrow_mut().resize();
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run()
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Bubble Pop (native) starting...");
    log::info!("Native mode runs a headless demo - serve the wasm build for the real game");

    let seed = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(42);
    let summary = headless_demo(seed);
    println!(
        "\nClassic: {} pops for {} points; challenges completed: {}",
        summary.classic_pops, summary.classic_score, summary.challenges_completed
    );
    println!("Achievements unlocked: {:?}", summary.unlocked);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// What the headless demo ended with
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug)]
struct DemoSummary {
    classic_score: u64,
    classic_pops: u32,
    challenges_completed: u32,
    unlocked: Vec<&'static str>,
}

/// Play one minute of classic and one challenge stack with a scripted player
#[cfg(not(target_arch = "wasm32"))]
fn headless_demo(seed: u64) -> DemoSummary {
    use bubble_pop::persistence::day_from_unix_ms;
    use bubble_pop::platform::HeadlessHost;
    use bubble_pop::{GameMode, GameState, Progress, tick};

    const FRAME_MS: f64 = 16.0;
    const POP_EVERY_FRAMES: u32 = 45;
    const DEMO_FRAMES: u32 = 3750;

    let mut hh = HeadlessHost::new();
    let mut state = GameState::new(seed, Progress::load(&hh.storage));

    let now_ms = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0.0, |d| d.as_millis() as f64);
    state.record_login(day_from_unix_ms(now_ms), &mut hh.host());

    println!("\nClassic mode, seed {}", seed);
    state.start(GameMode::Classic, &mut hh.host());
    let mut unlocked = Vec::new();
    for frame in 1..=DEMO_FRAMES {
        let Some(timestamp) = hh.clock.next_frame(FRAME_MS) else {
            break;
        };
        tick(&mut state, timestamp, &mut hh.host());

        // The player always goes for the oldest bubble
        if frame % POP_EVERY_FRAMES == 0 {
            let oldest = state.registry().iter().next().map(|b| b.id);
            if let Some(outcome) = oldest.and_then(|id| state.pop_bubble(id, &mut hh.host())) {
                unlocked.extend(outcome.unlocked);
            }
        }
    }
    let classic_score = state.score();
    let classic_pops = state.popped_count();
    println!(
        "  score {}, popped {}, on screen {}, spawn interval {:.0}ms",
        state.score(),
        state.popped_count(),
        state.registry().count(),
        state.params().spawn_interval_ms
    );

    println!("\nChallenge mode");
    state.start(GameMode::Challenge, &mut hh.host());
    println!("  stack of {} bubbles", state.registry().count());
    if let Some(key) = state.key_bubble() {
        if let Some(outcome) = state.pop_bubble(key, &mut hh.host()) {
            unlocked.extend(outcome.unlocked);
        }
    }
    println!("  challenges completed: {}", state.session().challenges_completed);
    state.stop(&mut hh.host());

    let fragments = state.fragments();
    println!(
        "\nFragments: {} normal, {} golden, {} rainbow",
        fragments.normal, fragments.golden, fragments.rainbow
    );
    println!("Sounds played: {}", hh.effects.sounds.len());

    DemoSummary {
        classic_score,
        classic_pops,
        challenges_completed: state.session().challenges_completed,
        unlocked,
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn test_headless_demo_plays_both_modes() {
        let summary = headless_demo(7);

        // 3750 frames, one pop attempt every 45 frames, first spawn after 1s
        assert!(summary.classic_pops > 0 && summary.classic_pops <= 3750 / 45);
        assert!(summary.classic_score >= 30 * summary.classic_pops as u64);
        assert_eq!(summary.challenges_completed, 1);
    }

    #[test]
    fn test_headless_demo_is_deterministic() {
        let a = headless_demo(99);
        let b = headless_demo(99);
        assert_eq!(a.classic_score, b.classic_score);
        assert_eq!(a.classic_pops, b.classic_pops);
    }
}
