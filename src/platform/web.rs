//! Browser collaborators
//!
//! Bubbles are absolutely positioned divs, particles are short-lived divs
//! animated by CSS, the frame clock is requestAnimationFrame.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Event, HtmlElement, Performance};

use super::{EffectsDispatcher, FrameClock, RenderSurface};
use crate::audio::{AudioManager, SoundEffect};
use crate::settings::Settings;
use crate::sim::{
    Bubble, BubbleKind, BubbleRegistry, ParticleBurst, ParticleColor, PopEffect, RAINBOW_TINTS,
};

/// Called with the id of the bubble the player touched
pub type ActivateHandler = Rc<dyn Fn(u32)>;
/// Called with each delivered frame timestamp
pub type FrameHandler = Rc<dyn Fn(f64)>;

const ACTIVATE_EVENTS: [&str; 2] = ["mousedown", "touchstart"];
const PARTICLE_LIFETIME_MS: f64 = 1000.0;

/// Run `f` once after `delay_ms`
fn after(delay_ms: f64, f: impl FnOnce() + 'static) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let callback = Closure::once_into_js(f);
    let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
        callback.unchecked_ref(),
        delay_ms as i32,
    );
}

fn css_color(rgb: u32) -> String {
    format!("#{:06X}", rgb)
}

fn create_div(document: &Document, class: &str) -> Option<HtmlElement> {
    let element = document.create_element("div").ok()?.dyn_into::<HtmlElement>().ok()?;
    element.set_class_name(class);
    Some(element)
}

struct Sprite {
    element: HtmlElement,
    listener: Closure<dyn FnMut(Event)>,
}

/// Bubble sprites as DOM elements
pub struct DomSurface {
    document: Document,
    container: HtmlElement,
    sprites: BTreeMap<u32, Sprite>,
    on_activate: ActivateHandler,
}

impl DomSurface {
    pub fn new(document: Document, container: HtmlElement, on_activate: ActivateHandler) -> Self {
        Self {
            document,
            container,
            sprites: BTreeMap::new(),
            on_activate,
        }
    }

    /// Container size in CSS pixels
    pub fn size(&self) -> (f32, f32) {
        (
            self.container.client_width() as f32,
            self.container.client_height() as f32,
        )
    }

    /// Move every sprite to its bubble's current position
    pub fn sync(&self, registry: &BubbleRegistry) {
        for bubble in registry.iter() {
            if let Some(sprite) = self.sprites.get(&bubble.id) {
                place(&sprite.element, bubble);
            }
        }
    }
}

fn place(element: &HtmlElement, bubble: &Bubble) {
    let style = element.style();
    let r = bubble.radius();
    let _ = style.set_property("left", &format!("{}px", bubble.pos.x - r));
    let _ = style.set_property("top", &format!("{}px", bubble.pos.y - r));
}

impl RenderSurface for DomSurface {
    fn attach(&mut self, bubble: &Bubble) {
        let class = format!("bubble {}", bubble.kind.as_str());
        let Some(element) = create_div(&self.document, &class) else {
            log::warn!("Could not create sprite for bubble {}", bubble.id);
            return;
        };
        if bubble.kind == BubbleKind::Rainbow {
            let _ = element
                .class_list()
                .add_1(&format!("rainbow-{}", bubble.variant));
        }

        let style = element.style();
        let size = format!("{}px", bubble.size);
        let _ = style.set_property("width", &size);
        let _ = style.set_property("height", &size);
        let _ = style.set_property("z-index", &bubble.layer.to_string());
        place(&element, bubble);

        let id = bubble.id;
        let on_activate = self.on_activate.clone();
        let listener = Closure::<dyn FnMut(_)>::new(move |event: Event| {
            event.prevent_default();
            on_activate(id);
        });
        for name in ACTIVATE_EVENTS {
            let _ = element.add_event_listener_with_callback(name, listener.as_ref().unchecked_ref());
        }

        let _ = self.container.append_child(&element);
        self.sprites.insert(id, Sprite { element, listener });
    }

    fn animate_pop(&mut self, id: u32, effect: PopEffect) {
        if let Some(sprite) = self.sprites.get(&id) {
            let _ = sprite.element.class_list().add_1(effect.css_class());
        }
    }

    fn detach(&mut self, id: u32, delay_ms: f64) {
        let Some(Sprite { element, listener }) = self.sprites.remove(&id) else {
            return;
        };
        for name in ACTIVATE_EVENTS {
            let _ = element
                .remove_event_listener_with_callback(name, listener.as_ref().unchecked_ref());
        }
        if delay_ms <= 0.0 {
            element.remove();
        }
        // The listener may be the one running right now; drop it later
        after(delay_ms.max(0.0), move || {
            element.remove();
            drop(listener);
        });
    }
}

/// requestAnimationFrame clock
///
/// At most one frame is outstanding; extra requests before it arrives are
/// folded into it.
pub struct RafClock {
    on_frame: FrameHandler,
    pending: Rc<Cell<bool>>,
    performance: Option<Performance>,
}

impl RafClock {
    pub fn new(on_frame: FrameHandler) -> Self {
        Self {
            on_frame,
            pending: Rc::new(Cell::new(false)),
            performance: web_sys::window().and_then(|w| w.performance()),
        }
    }
}

impl FrameClock for RafClock {
    fn now(&self) -> f64 {
        self.performance.as_ref().map_or(0.0, |p| p.now())
    }

    fn request_frame(&mut self) {
        if self.pending.get() {
            return;
        }
        let Some(window) = web_sys::window() else {
            return;
        };

        let pending = self.pending.clone();
        let on_frame = self.on_frame.clone();
        let callback = Closure::once_into_js(move |time: f64| {
            pending.set(false);
            on_frame(time);
        });

        self.pending.set(true);
        if window
            .request_animation_frame(callback.unchecked_ref())
            .is_err()
        {
            log::warn!("requestAnimationFrame failed");
            self.pending.set(false);
        }
    }
}

/// Web Audio cues plus CSS particle bursts
pub struct WebEffects {
    document: Document,
    layer: HtmlElement,
    audio: AudioManager,
}

impl WebEffects {
    pub fn new(document: Document, layer: HtmlElement) -> Self {
        Self {
            document,
            layer,
            audio: AudioManager::new(),
        }
    }

    /// Follow the sound toggle and master volume
    pub fn apply_settings(&mut self, settings: &Settings) {
        self.audio.set_muted(!settings.sound_enabled);
        self.audio.set_master_volume(settings.sfx_volume());
    }
}

impl EffectsDispatcher for WebEffects {
    fn play_effect(&mut self, sound: SoundEffect, intensity: f32) {
        self.audio.play(sound, intensity);
    }

    fn emit_particles(&mut self, burst: &ParticleBurst) {
        for i in 0..burst.count {
            let Some(particle) = create_div(&self.document, "particle") else {
                return;
            };

            let color = match burst.color {
                ParticleColor::Solid(rgb) => rgb,
                ParticleColor::Multi => {
                    let pick = (js_sys::Math::random() * RAINBOW_TINTS.len() as f64) as usize;
                    RAINBOW_TINTS[pick.min(RAINBOW_TINTS.len() - 1)]
                }
            };

            // Spread evenly with a little jitter; CSS animates toward (--dx, --dy)
            let angle = (i as f64 / burst.count as f64 + js_sys::Math::random() * 0.1)
                * std::f64::consts::TAU;
            let distance = 40.0 + js_sys::Math::random() * 60.0;

            let style = particle.style();
            let _ = style.set_property("left", &format!("{}px", burst.pos.x));
            let _ = style.set_property("top", &format!("{}px", burst.pos.y));
            let _ = style.set_property("background-color", &css_color(color));
            let _ = style.set_property("--dx", &format!("{:.1}px", angle.cos() * distance));
            let _ = style.set_property("--dy", &format!("{:.1}px", angle.sin() * distance));

            let _ = self.layer.append_child(&particle);
            after(PARTICLE_LIFETIME_MS, move || particle.remove());
        }
    }
}
