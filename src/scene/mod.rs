//! Procedural scenes.
//!
//! Each style owns a fixed-size population that is created when the style is
//! activated and advanced every frame. Styles are variants of [`Scene`], so the
//! per-frame loop dispatches with a `match` instead of trait objects.

mod fluid;
mod moods;
mod nature;
pub mod paint;

pub use paint::{Blend, Surface};

use crate::audio::AudioFeatures;
use crate::behavior::VisualParameters;
use crate::gesture::GestureState;
use crate::noise::NoiseField;
use tracing::debug;

/// Width of the surface that gesture velocities are expressed against.
pub const REFERENCE_WIDTH: f32 = 1080.0;

const MIN_DT: f32 = 0.001;
const MAX_DT: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleId {
    LiquidDream,
    LiquidMarble,
    NeonPlasma,
    MercuryDance,
    ChromaticFlow,
    ForestLight,
    FireflyField,
    RainMeadow,
    WindValley,
    AuroraSky,
    CalmTide,
    PulseCore,
    NoiseBloom,
    StoryBeacon,
}

impl StyleId {
    pub const ALL: [StyleId; 14] = [
        Self::LiquidDream,
        Self::LiquidMarble,
        Self::NeonPlasma,
        Self::MercuryDance,
        Self::ChromaticFlow,
        Self::ForestLight,
        Self::FireflyField,
        Self::RainMeadow,
        Self::WindValley,
        Self::AuroraSky,
        Self::CalmTide,
        Self::PulseCore,
        Self::NoiseBloom,
        Self::StoryBeacon,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::LiquidDream => "liquid-dream",
            Self::LiquidMarble => "liquid-marble",
            Self::NeonPlasma => "neon-plasma",
            Self::MercuryDance => "mercury-dance",
            Self::ChromaticFlow => "chromatic-flow",
            Self::ForestLight => "forest-light",
            Self::FireflyField => "firefly-field",
            Self::RainMeadow => "rain-meadow",
            Self::WindValley => "wind-valley",
            Self::AuroraSky => "aurora-sky",
            Self::CalmTide => "calm-tide",
            Self::PulseCore => "pulse-core",
            Self::NoiseBloom => "noise-bloom",
            Self::StoryBeacon => "story-beacon",
        }
    }

    /// Fixed number of simulated entities.
    pub fn population(self) -> usize {
        match self {
            Self::LiquidDream => fluid::LIQUID_ORBS,
            Self::LiquidMarble => fluid::MARBLE_STRANDS,
            Self::NeonPlasma => fluid::PLASMA_GLOWS,
            Self::MercuryDance => fluid::MERCURY_BLOBS,
            Self::ChromaticFlow => fluid::CHROMA_RIBBONS,
            Self::ForestLight => nature::POLLEN,
            Self::FireflyField => nature::FIREFLIES,
            Self::RainMeadow => nature::RAINDROPS,
            Self::WindValley => nature::LEAVES,
            Self::AuroraSky => nature::STARS,
            Self::CalmTide => moods::TIDE_ORBS,
            Self::PulseCore => moods::SPARKS,
            Self::NoiseBloom => moods::PETALS,
            Self::StoryBeacon => moods::MOTES,
        }
    }
}

/// Generic simulated entity; each style gives the fields its own meaning.
/// Positions are normalized to the viewport, velocities to viewport per second.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Mote {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub size: f32,
    pub phase: f32,
    pub hue: f32,
    pub life: f32,
}

/// Per-frame simulation inputs.
pub(crate) struct StepCtx<'a> {
    pub dt: f32,
    pub t: f32,
    pub noise: &'a NoiseField,
    pub audio: AudioFeatures,
    pub params: VisualParameters,
    /// Normalized touch point while pressed.
    pub touch: Option<(f32, f32)>,
    /// Gesture velocity in viewport widths per second.
    pub swipe: (f32, f32),
    pub aspect: f32,
    pub rng: &'a mut fastrand::Rng,
}

impl StepCtx<'_> {
    /// Motion multiplier from the behavior engine.
    pub fn speed(&self) -> f32 {
        self.params.particle_speed.clamp(0.1, 6.0)
    }

    pub fn distortion(&self) -> f32 {
        self.params.distortion.clamp(0.0, 2.0)
    }
}

/// Per-frame paint inputs.
pub(crate) struct PaintCtx<'a> {
    pub t: f32,
    pub noise: &'a NoiseField,
    pub audio: AudioFeatures,
    pub params: VisualParameters,
    pub base: [u8; 3],
    pub w: f32,
    pub h: f32,
}

impl PaintCtx<'_> {
    /// Length in pixels of a fraction of the shorter viewport side.
    pub fn len(&self, frac: f32) -> f32 {
        frac * self.w.min(self.h)
    }

    pub fn px(&self, x: f32, y: f32) -> (f32, f32) {
        (x * self.w, y * self.h)
    }

    pub fn scale(&self) -> f32 {
        self.params.master_scale.clamp(0.2, 4.0)
    }

    /// Brightness multiplier in [0, 1].
    pub fn intensity(&self) -> f32 {
        (0.35 + self.params.color_intensity * 0.45).clamp(0.0, 1.0)
    }
}

pub(crate) enum Scene {
    Empty,
    LiquidDream(fluid::LiquidDream),
    LiquidMarble(fluid::LiquidMarble),
    NeonPlasma(fluid::NeonPlasma),
    MercuryDance(fluid::MercuryDance),
    ChromaticFlow(fluid::ChromaticFlow),
    ForestLight(nature::ForestLight),
    FireflyField(nature::FireflyField),
    RainMeadow(nature::RainMeadow),
    WindValley(nature::WindValley),
    AuroraSky(nature::AuroraSky),
    CalmTide(moods::CalmTide),
    PulseCore(moods::PulseCore),
    NoiseBloom(moods::NoiseBloom),
    StoryBeacon(moods::StoryBeacon),
}

impl Scene {
    fn spawn(id: StyleId, rng: &mut fastrand::Rng) -> Self {
        match id {
            StyleId::LiquidDream => Self::LiquidDream(fluid::LiquidDream::spawn(rng)),
            StyleId::LiquidMarble => Self::LiquidMarble(fluid::LiquidMarble::spawn(rng)),
            StyleId::NeonPlasma => Self::NeonPlasma(fluid::NeonPlasma::spawn(rng)),
            StyleId::MercuryDance => Self::MercuryDance(fluid::MercuryDance::spawn(rng)),
            StyleId::ChromaticFlow => Self::ChromaticFlow(fluid::ChromaticFlow::spawn(rng)),
            StyleId::ForestLight => Self::ForestLight(nature::ForestLight::spawn(rng)),
            StyleId::FireflyField => Self::FireflyField(nature::FireflyField::spawn(rng)),
            StyleId::RainMeadow => Self::RainMeadow(nature::RainMeadow::spawn(rng)),
            StyleId::WindValley => Self::WindValley(nature::WindValley::spawn(rng)),
            StyleId::AuroraSky => Self::AuroraSky(nature::AuroraSky::spawn(rng)),
            StyleId::CalmTide => Self::CalmTide(moods::CalmTide::spawn(rng)),
            StyleId::PulseCore => Self::PulseCore(moods::PulseCore::spawn(rng)),
            StyleId::NoiseBloom => Self::NoiseBloom(moods::NoiseBloom::spawn(rng)),
            StyleId::StoryBeacon => Self::StoryBeacon(moods::StoryBeacon::spawn(rng)),
        }
    }

    fn step(&mut self, ctx: &mut StepCtx<'_>) {
        match self {
            Self::Empty => {}
            Self::LiquidDream(s) => s.step(ctx),
            Self::LiquidMarble(s) => s.step(ctx),
            Self::NeonPlasma(s) => s.step(ctx),
            Self::MercuryDance(s) => s.step(ctx),
            Self::ChromaticFlow(s) => s.step(ctx),
            Self::ForestLight(s) => s.step(ctx),
            Self::FireflyField(s) => s.step(ctx),
            Self::RainMeadow(s) => s.step(ctx),
            Self::WindValley(s) => s.step(ctx),
            Self::AuroraSky(s) => s.step(ctx),
            Self::CalmTide(s) => s.step(ctx),
            Self::PulseCore(s) => s.step(ctx),
            Self::NoiseBloom(s) => s.step(ctx),
            Self::StoryBeacon(s) => s.step(ctx),
        }
    }

    fn paint(&self, surface: &mut Surface, ctx: &PaintCtx<'_>) {
        match self {
            Self::Empty => surface.fill([0, 0, 0]),
            Self::LiquidDream(s) => s.paint(surface, ctx),
            Self::LiquidMarble(s) => s.paint(surface, ctx),
            Self::NeonPlasma(s) => s.paint(surface, ctx),
            Self::MercuryDance(s) => s.paint(surface, ctx),
            Self::ChromaticFlow(s) => s.paint(surface, ctx),
            Self::ForestLight(s) => s.paint(surface, ctx),
            Self::FireflyField(s) => s.paint(surface, ctx),
            Self::RainMeadow(s) => s.paint(surface, ctx),
            Self::WindValley(s) => s.paint(surface, ctx),
            Self::AuroraSky(s) => s.paint(surface, ctx),
            Self::CalmTide(s) => s.paint(surface, ctx),
            Self::PulseCore(s) => s.paint(surface, ctx),
            Self::NoiseBloom(s) => s.paint(surface, ctx),
            Self::StoryBeacon(s) => s.paint(surface, ctx),
        }
    }

    fn motes(&self) -> &[Mote] {
        match self {
            Self::Empty => &[],
            Self::LiquidDream(s) => &s.orbs,
            Self::LiquidMarble(s) => &s.strands,
            Self::NeonPlasma(s) => &s.glows,
            Self::MercuryDance(s) => &s.blobs,
            Self::ChromaticFlow(s) => &s.ribbons,
            Self::ForestLight(s) => &s.pollen,
            Self::FireflyField(s) => &s.flies,
            Self::RainMeadow(s) => &s.drops,
            Self::WindValley(s) => &s.leaves,
            Self::AuroraSky(s) => &s.stars,
            Self::CalmTide(s) => &s.orbs,
            Self::PulseCore(s) => &s.sparks,
            Self::NoiseBloom(s) => &s.petals,
            Self::StoryBeacon(s) => &s.motes,
        }
    }
}

/// Drives one active style: owns its population, the noise field and the
/// scene clock.
pub struct ProceduralRenderer {
    noise: NoiseField,
    rng: fastrand::Rng,
    style: Option<StyleId>,
    scene: Scene,
    activations: u64,
    clock: f32,
    w: usize,
    h: usize,
    density: f32,
    palette: [u8; 3],
    audio: AudioFeatures,
    params: VisualParameters,
}

impl ProceduralRenderer {
    pub fn new(seed: u64) -> Self {
        Self {
            noise: NoiseField::new(seed),
            rng: fastrand::Rng::with_seed(seed ^ 0x5EED_0F_F1E1D),
            style: None,
            scene: Scene::Empty,
            activations: 0,
            clock: 0.0,
            w: 0,
            h: 0,
            density: 1.0,
            palette: [255, 255, 255],
            audio: AudioFeatures::default(),
            params: VisualParameters::default(),
        }
    }

    pub fn set_viewport(&mut self, width: usize, height: usize, density_scale: f32) {
        self.w = width;
        self.h = height;
        self.density = if density_scale.is_finite() && density_scale > 0.0 {
            density_scale
        } else {
            1.0
        };
    }

    pub fn viewport(&self) -> (usize, usize, f32) {
        (self.w, self.h, self.density)
    }

    pub fn set_palette(&mut self, base: [u8; 3]) {
        self.palette = base;
    }

    /// Spawns a fresh population when `id` differs from the active style.
    /// Returns whether a reseed happened.
    pub fn activate_style(&mut self, id: StyleId) -> bool {
        if self.style == Some(id) {
            return false;
        }
        self.scene = Scene::spawn(id, &mut self.rng);
        self.style = Some(id);
        self.activations += 1;
        debug!(style = id.name(), "style activated");
        true
    }

    pub fn style(&self) -> Option<StyleId> {
        self.style
    }

    /// How many populations have been spawned so far.
    pub fn activations(&self) -> u64 {
        self.activations
    }

    pub fn population(&self) -> usize {
        self.scene.motes().len()
    }

    pub fn motes(&self) -> &[Mote] {
        self.scene.motes()
    }

    pub fn clock(&self) -> f32 {
        self.clock
    }

    pub fn update(
        &mut self,
        dt: f32,
        audio: &AudioFeatures,
        gesture: &GestureState,
        params: &VisualParameters,
    ) {
        let dt = if dt.is_finite() { dt.clamp(MIN_DT, MAX_DT) } else { MIN_DT };
        self.audio = *audio;
        self.params = *params;
        let speed = params.particle_speed.clamp(0.1, 6.0);
        self.clock += dt * (0.5 + 0.5 * speed);

        let w = self.w.max(1) as f32;
        let h = self.h.max(1) as f32;
        let touch = gesture
            .touch()
            .map(|(x, y)| ((x / w).clamp(-0.5, 1.5), (y / h).clamp(-0.5, 1.5)));
        let swipe = (
            gesture.velocity_x / REFERENCE_WIDTH,
            gesture.velocity_y / REFERENCE_WIDTH,
        );

        let mut ctx = StepCtx {
            dt,
            t: self.clock,
            noise: &self.noise,
            audio: *audio,
            params: *params,
            touch,
            swipe,
            aspect: w / h,
            rng: &mut self.rng,
        };
        self.scene.step(&mut ctx);
    }

    pub fn render(&self, surface: &mut Surface) {
        if surface.is_empty() {
            return;
        }
        let ctx = PaintCtx {
            t: self.clock,
            noise: &self.noise,
            audio: self.audio,
            params: self.params,
            base: self.palette,
            w: surface.width() as f32,
            h: surface.height() as f32,
        };
        self.scene.paint(surface, &ctx);
    }
}

pub(crate) fn rand_range(rng: &mut fastrand::Rng, lo: f32, hi: f32) -> f32 {
    lo + rng.f32() * (hi - lo)
}

/// Frame-rate independent damping: `k` is the per-frame factor at 60 Hz.
#[inline]
pub(crate) fn damp(k: f32, dt: f32) -> f32 {
    k.powf(dt * 60.0)
}

#[inline]
pub(crate) fn wrap(v: f32, lo: f32, hi: f32) -> f32 {
    let span = hi - lo;
    if v < lo {
        v + span
    } else if v > hi {
        v - span
    } else {
        v
    }
}

/// Reflect the velocity and clamp the position back inside `[lo, hi]`.
#[inline]
pub(crate) fn reflect(p: &mut f32, v: &mut f32, lo: f32, hi: f32) {
    if *p < lo {
        *p = lo;
        *v = v.abs();
    } else if *p > hi {
        *p = hi;
        *v = -v.abs();
    }
}

/// Acceleration toward (positive `strength`) or away from (negative) the
/// touch point, fading linearly to zero at `radius`. Distances are measured
/// with x stretched by the aspect ratio so the radius is circular on screen.
pub(crate) fn touch_force(
    x: f32,
    y: f32,
    touch: Option<(f32, f32)>,
    radius: f32,
    strength: f32,
    aspect: f32,
) -> (f32, f32) {
    let Some((tx, ty)) = touch else {
        return (0.0, 0.0);
    };
    let dx = (tx - x) * aspect;
    let dy = ty - y;
    let d = (dx * dx + dy * dy).sqrt();
    if d >= radius || d < 1e-5 {
        return (0.0, 0.0);
    }
    let f = strength * (1.0 - d / radius) / d;
    (dx * f / aspect.max(1e-3), dy * f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touch_force_is_local_and_signed() {
        let (fx, _) = touch_force(0.5, 0.5, Some((0.6, 0.5)), 0.3, 1.0, 1.0);
        assert!(fx > 0.0);
        let (fx, _) = touch_force(0.5, 0.5, Some((0.6, 0.5)), 0.3, -1.0, 1.0);
        assert!(fx < 0.0);
        assert_eq!(touch_force(0.0, 0.0, Some((0.9, 0.9)), 0.3, 1.0, 1.0), (0.0, 0.0));
        assert_eq!(touch_force(0.0, 0.0, None, 0.3, 1.0, 1.0), (0.0, 0.0));
    }

    #[test]
    fn reflect_clamps_and_flips() {
        let (mut p, mut v) = (1.2f32, 0.4f32);
        reflect(&mut p, &mut v, 0.0, 1.0);
        assert_eq!((p, v), (1.0, -0.4));
    }
}
