//! Per-frame driver: behavior engine, active style, cross-fades and ripples.

use crate::audio::AudioFeatures;
use crate::behavior::{BehaviorEngine, Mode, VisualParameters};
use crate::gesture::{GestureEvent, GestureState};
use crate::overlay::RippleField;
use crate::scene::{paint::scale_rgb, ProceduralRenderer, Surface};
use crate::world::World;
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Faults are logged on the first occurrence and then once per this many.
const FAULT_LOG_EVERY: u64 = 120;

thread_local! {
    static GUARDED: Cell<bool> = const { Cell::new(false) };
}

/// True while the current thread is inside [`FaultGuard::run`]. The panic
/// hook stays quiet then and leaves reporting to the guard's throttle.
pub fn panic_is_guarded() -> bool {
    GUARDED.with(Cell::get)
}

/// Runs a fallible frame step and turns a panic into `None`.
#[derive(Debug, Default)]
pub struct FaultGuard {
    faults: u64,
}

impl FaultGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run<R>(&mut self, label: &str, f: impl FnOnce() -> R) -> Option<R> {
        let outer = GUARDED.with(|g| g.replace(true));
        let result = panic::catch_unwind(AssertUnwindSafe(f));
        GUARDED.with(|g| g.set(outer));
        match result {
            Ok(r) => Some(r),
            Err(payload) => {
                self.faults += 1;
                if self.faults == 1 || self.faults % FAULT_LOG_EVERY == 0 {
                    let msg = payload
                        .downcast_ref::<&str>()
                        .map(|s| (*s).to_string())
                        .or_else(|| payload.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "<non-string panic>".to_string());
                    warn!(style = label, faults = self.faults, "style fault: {msg}");
                }
                None
            }
        }
    }

    pub fn faults(&self) -> u64 {
        self.faults
    }
}

pub struct FrameOrchestrator {
    engine: BehaviorEngine,
    renderer: ProceduralRenderer,
    gesture: GestureState,
    ripples: RippleField,
    guard: FaultGuard,
    world: &'static World,
    front: Surface,
    scratch: Surface,
    fade_from: Surface,
    fade: Option<(Duration, Duration)>,
    crossfade: Duration,
    has_frame: bool,
    mode: Mode,
    params: VisualParameters,
}

impl FrameOrchestrator {
    pub fn new(seed: u64, world: &'static World, crossfade: Duration) -> Self {
        let mut renderer = ProceduralRenderer::new(seed);
        renderer.set_palette(world.base_color);
        renderer.activate_style(world.style);
        let engine = BehaviorEngine::new(world.category);
        let mode = engine.mode();
        let params = engine.params();
        Self {
            engine,
            renderer,
            gesture: GestureState::default(),
            ripples: RippleField::new(1.0),
            guard: FaultGuard::new(),
            world,
            front: Surface::new(0, 0),
            scratch: Surface::new(0, 0),
            fade_from: Surface::new(0, 0),
            fade: None,
            crossfade,
            has_frame: false,
            mode,
            params,
        }
    }

    pub fn resize(&mut self, width: usize, height: usize, density: f32) {
        if (width, height) != (self.front.width(), self.front.height()) {
            self.front.resize(width, height);
            self.scratch.resize(width, height);
            self.fade_from.resize(width, height);
            self.fade = None;
            self.has_frame = false;
            self.ripples.clear();
        }
        self.renderer.set_viewport(width, height, density);
        self.ripples.set_density(density);
    }

    /// Activates the world's style and starts a cross-fade from the current
    /// frame. Selecting the active world is a no-op.
    pub fn select_world(&mut self, world: &'static World) {
        if world.id == self.world.id {
            return;
        }
        info!(world = world.id, style = world.style.name(), "world selected");
        if self.has_frame && !self.crossfade.is_zero() {
            self.fade_from.copy_from(&self.front);
            self.fade = Some((Duration::ZERO, self.crossfade));
        }
        self.world = world;
        self.renderer.set_palette(world.base_color);
        self.renderer.activate_style(world.style);
        self.engine.set_category(world.category);
    }

    pub fn set_calm_bias(&mut self, bias: f32) {
        self.engine.set_calm_bias(bias);
    }

    pub fn handle_gesture(&mut self, event: GestureEvent, now: Instant) {
        if let GestureEvent::Tap { x, y } = event {
            self.ripples.spawn(x, y);
        }
        self.gesture.apply(event, now);
    }

    /// Advances one frame and returns the RGBA pixels to present.
    pub fn tick(&mut self, dt: f32, audio: &AudioFeatures) -> &[u8] {
        let dt = if dt.is_finite() { dt.clamp(0.0, 1.0) } else { 0.0 };
        let (mode, params) = self.engine.update(audio, &self.gesture);
        self.mode = mode;
        self.params = params;

        if !self.front.is_empty() {
            let renderer = &mut self.renderer;
            let scratch = &mut self.scratch;
            let gesture = &self.gesture;
            let drawn = self.guard.run(self.world.style.name(), || {
                renderer.update(dt, audio, gesture, &params);
                renderer.render(scratch);
            });

            match drawn {
                Some(()) => {
                    self.compose(dt);
                    self.ripples.paint(&mut self.front, self.world.base_color);
                    self.has_frame = true;
                }
                None if !self.has_frame => {
                    self.front.fill(scale_rgb(self.world.base_color, 0.15));
                }
                None => {}
            }
        }

        self.ripples.tick();
        self.gesture.decay();
        self.front.pixels()
    }

    fn compose(&mut self, dt: f32) {
        let Some((elapsed, total)) = self.fade else {
            std::mem::swap(&mut self.front, &mut self.scratch);
            return;
        };
        let elapsed = elapsed + Duration::from_secs_f32(dt);
        let t = elapsed.as_secs_f32() / total.as_secs_f32();
        if t >= 1.0 {
            self.fade = None;
            std::mem::swap(&mut self.front, &mut self.scratch);
        } else {
            blend_rgba(
                self.fade_from.pixels(),
                self.scratch.pixels(),
                t,
                self.front.pixels_mut(),
            );
            self.fade = Some((elapsed, total));
        }
    }

    pub fn status(&self) -> (Mode, VisualParameters) {
        (self.mode, self.params)
    }

    pub fn world(&self) -> &'static World {
        self.world
    }

    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    pub fn faults(&self) -> u64 {
        self.guard.faults()
    }

    pub fn gesture(&self) -> &GestureState {
        &self.gesture
    }

    pub fn ripples(&self) -> &RippleField {
        &self.ripples
    }

    pub fn renderer(&self) -> &ProceduralRenderer {
        &self.renderer
    }

    pub fn engine(&self) -> &BehaviorEngine {
        &self.engine
    }

    pub fn frame(&self) -> &Surface {
        &self.front
    }
}

fn blend_rgba(a: &[u8], b: &[u8], t: f32, out: &mut [u8]) {
    let t = t.clamp(0.0, 1.0);
    let it = 1.0 - t;
    for ((o, pa), pb) in out
        .chunks_exact_mut(4)
        .zip(a.chunks_exact(4))
        .zip(b.chunks_exact(4))
    {
        o[0] = (pa[0] as f32 * it + pb[0] as f32 * t) as u8;
        o[1] = (pa[1] as f32 * it + pb[1] as f32 * t) as u8;
        o[2] = (pa[2] as f32 * it + pb[2] as f32 * t) as u8;
        o[3] = 255;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_midpoint() {
        let a = [0u8, 0, 0, 255];
        let b = [200u8, 100, 50, 255];
        let mut out = [0u8; 4];
        blend_rgba(&a, &b, 0.5, &mut out);
        assert_eq!(out, [100, 50, 25, 255]);
    }
}
