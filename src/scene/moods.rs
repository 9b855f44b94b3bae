use super::paint::{hsv_to_rgb, lerp_rgb, scale_rgb};
use super::{damp, rand_range, touch_force, wrap, Blend, Mote, PaintCtx, StepCtx, Surface};
use std::f32::consts::TAU;

pub(crate) const TIDE_ORBS: usize = 12;
pub(crate) const SPARKS: usize = 24;
pub(crate) const PETALS: usize = 16;
pub(crate) const MOTES: usize = 40;
pub(crate) const BEACON_RINGS: usize = 5;

/// Black to base color to black, brightened by color intensity and a slow pulse.
fn backdrop(s: &mut Surface, ctx: &PaintCtx<'_>) {
    let pulse = (ctx.t * 2.0).sin() * 0.5 + 0.5;
    let alpha = (40.0 + ctx.params.color_intensity.clamp(0.0, 2.0) * 60.0 + pulse * 50.0) / 255.0;
    let mid = scale_rgb(ctx.base, alpha.clamp(0.0, 1.0));
    s.vertical_gradient(&[[0, 0, 0], mid, [0, 0, 0]]);
}

pub(crate) struct CalmTide {
    pub(crate) orbs: [Mote; TIDE_ORBS],
}

impl CalmTide {
    pub(crate) fn spawn(rng: &mut fastrand::Rng) -> Self {
        Self {
            orbs: std::array::from_fn(|_| Mote {
                x: rng.f32(),
                y: rng.f32(),
                size: rand_range(rng, 0.03, 0.07),
                phase: rng.f32() * 20.0,
                life: 1.0,
                ..Mote::default()
            }),
        }
    }

    pub(crate) fn step(&mut self, ctx: &mut StepCtx<'_>) {
        let spd = ctx.speed();
        let k = damp(0.95, ctx.dt);
        for o in &mut self.orbs {
            let z = ctx.t * 0.05 + o.phase;
            let nx = ctx.noise.value3(o.x, o.y, z) * 0.05;
            let ny = ctx.noise.value3(o.x + 20.0, o.y + 20.0, z) * 0.05;
            let (fx, fy) = touch_force(o.x, o.y, ctx.touch, 0.25, -0.5, ctx.aspect);
            o.vx = (o.vx + (nx + fx) * ctx.dt) * k;
            o.vy = (o.vy + (ny + fy) * ctx.dt) * k;
            o.x = wrap(o.x + (o.vx + nx * 0.2) * ctx.dt * spd, 0.0, 1.0);
            o.y = wrap(o.y + (o.vy + ny * 0.2) * ctx.dt * spd, 0.0, 1.0);
        }
    }

    pub(crate) fn paint(&self, s: &mut Surface, ctx: &PaintCtx<'_>) {
        backdrop(s, ctx);
        let (cx, cy) = ctx.px(0.5, 0.5);
        let swell = 1.0 + ctx.audio.bass * 0.2;
        let ring_color = lerp_rgb(ctx.base, [255, 255, 255], 0.3);
        for k in 0..4 {
            let r = ctx.len(0.1 * (k + 1) as f32) * swell * ctx.scale();
            let a = (0.35 - k as f32 * 0.07) * ctx.intensity();
            s.ring(cx, cy, r, 1.0, ring_color, a, Blend::Alpha);
        }
        for o in &self.orbs {
            let (x, y) = ctx.px(o.x, o.y);
            let r = ctx.len(o.size) * ctx.scale();
            s.glow(x, y, r, ctx.base, 0.5 * ctx.intensity(), Blend::Add);
        }
    }
}

/// Sparks thrown out of a pulsing core.
pub(crate) struct PulseCore {
    pub(crate) sparks: [Mote; SPARKS],
}

impl PulseCore {
    pub(crate) fn spawn(rng: &mut fastrand::Rng) -> Self {
        Self {
            sparks: std::array::from_fn(|_| Mote {
                x: 0.5,
                y: 0.5,
                life: rng.f32(),
                phase: rng.f32() * TAU,
                size: rand_range(rng, 0.01, 0.02),
                ..Mote::default()
            }),
        }
    }

    pub(crate) fn step(&mut self, ctx: &mut StepCtx<'_>) {
        let spd = ctx.speed();
        let (cx, cy) = ctx.touch.unwrap_or((0.5, 0.5));
        let emit = (ctx.params.spawn_rate.max(0.0) * ctx.dt * 2.0).min(1.0);
        let k = damp(0.98, ctx.dt);
        for sp in &mut self.sparks {
            if sp.life <= 0.0 {
                if ctx.rng.f32() < emit {
                    let ang = ctx.rng.f32() * TAU;
                    let v = rand_range(ctx.rng, 0.2, 0.6) * (1.0 + ctx.audio.bass);
                    sp.x = cx;
                    sp.y = cy;
                    sp.vx = ang.cos() * v / ctx.aspect.max(0.1);
                    sp.vy = ang.sin() * v;
                    sp.life = 1.0;
                }
                continue;
            }
            let (fx, fy) = touch_force(sp.x, sp.y, ctx.touch, 0.3, 3.0, ctx.aspect);
            sp.vx = (sp.vx + fx * ctx.dt) * k;
            sp.vy = (sp.vy + fy * ctx.dt) * k;
            sp.x += sp.vx * ctx.dt * spd;
            sp.y += sp.vy * ctx.dt * spd;
            sp.life -= ctx.dt * 0.8;
            if !(-0.1..=1.1).contains(&sp.x) || !(-0.1..=1.1).contains(&sp.y) {
                sp.life = 0.0;
            }
        }
    }

    pub(crate) fn paint(&self, s: &mut Surface, ctx: &PaintCtx<'_>) {
        backdrop(s, ctx);
        let bright = lerp_rgb(ctx.base, [255, 255, 255], 0.4);
        let a = ctx.intensity();

        let mut wave = [(0.0f32, 0.0f32); 48];
        for (i, p) in wave.iter_mut().enumerate() {
            let u = i as f32 / 47.0;
            let y = 0.5 + (u * 12.0 + ctx.t * 4.0).sin() * 0.08 * (0.3 + ctx.audio.bass);
            *p = ctx.px(u, y);
        }
        s.polyline(&wave, 1.0, ctx.base, 0.6 * a, Blend::Add);

        let (cx, cy) = ctx.px(0.5, 0.5);
        let half = ctx.len(0.15) * ctx.scale() * (1.0 + ctx.audio.bass * 0.3);
        let rot = ctx.t * (0.5 + ctx.params.particle_speed.clamp(0.0, 6.0) * 0.2);
        let mut square = [(0.0f32, 0.0f32); 5];
        for (i, p) in square.iter_mut().enumerate() {
            let ang = rot + i as f32 * TAU / 4.0 + TAU / 8.0;
            *p = (cx + ang.cos() * half, cy + ang.sin() * half);
        }
        s.polyline(&square, 1.0, bright, 0.8 * a, Blend::Alpha);
        s.glow(cx, cy, half * 0.6, ctx.base, 0.5 * a, Blend::Add);

        for sp in &self.sparks {
            if sp.life <= 0.0 {
                continue;
            }
            let (x, y) = ctx.px(sp.x, sp.y);
            let r = ctx.len(sp.size) * (1.0 + sp.life) * ctx.scale();
            let c = lerp_rgb(ctx.base, [255, 255, 255], sp.life * 0.5);
            s.glow(x, y, r, c, sp.life * a, Blend::Add);
        }
    }
}

/// Vertices of a breathing polygon; each one springs toward a noise-driven radius.
pub(crate) struct NoiseBloom {
    pub(crate) petals: [Mote; PETALS],
}

impl NoiseBloom {
    pub(crate) fn spawn(rng: &mut fastrand::Rng) -> Self {
        Self {
            petals: std::array::from_fn(|i| Mote {
                phase: i as f32 / PETALS as f32 * TAU,
                size: rand_range(rng, 0.15, 0.25),
                hue: rng.f32(),
                life: 1.0,
                ..Mote::default()
            }),
        }
    }

    pub(crate) fn step(&mut self, ctx: &mut StepCtx<'_>) {
        let spd = ctx.speed();
        let k = damp(0.9, ctx.dt);
        let dist = ctx.distortion();
        for p in &mut self.petals {
            let (sn, cs) = p.phase.sin_cos();
            let n = ctx.noise.value2(cs * 1.5 + ctx.t * 0.3, sn * 1.5);
            let target = 0.22 * (1.0 + n * 0.5 * (1.0 + dist) + ctx.audio.bass * 0.3);

            p.x = 0.5 + cs * p.size / ctx.aspect.max(0.1);
            p.y = 0.5 + sn * p.size;
            let (fx, fy) = touch_force(p.x, p.y, ctx.touch, 0.2, -2.0, ctx.aspect);
            let push = (fx * cs + fy * sn).abs();

            p.vx += ((target - p.size) * 8.0 + push) * ctx.dt;
            p.vx *= k;
            p.size = (p.size + p.vx * ctx.dt * spd).clamp(0.05, 0.6);
            p.hue = (p.hue + ctx.dt * 0.05).fract();
        }
    }

    pub(crate) fn paint(&self, s: &mut Surface, ctx: &PaintCtx<'_>) {
        backdrop(s, ctx);
        let (cx, cy) = ctx.px(0.5, 0.5);
        let rot = ctx.t * 0.1;
        let mut outer = [(0.0f32, 0.0f32); PETALS + 1];
        let mut inner = [(0.0f32, 0.0f32); PETALS];
        for (i, p) in self.petals.iter().enumerate() {
            let (sn, cs) = (p.phase + rot).sin_cos();
            let r = ctx.len(p.size) * ctx.scale();
            outer[i] = (cx + cs * r, cy + sn * r);
            inner[i] = (cx + cs * r * 0.55, cy + sn * r * 0.55);
        }
        outer[PETALS] = outer[0];

        let a = ctx.intensity();
        let accent = hsv_to_rgb(self.petals[0].hue, 0.7, 1.0);
        s.fill_polygon(&outer[..PETALS], ctx.base, 0.35 * a, Blend::Alpha);
        s.fill_polygon(&inner, accent, 0.3 * a, Blend::Add);
        s.polyline(&outer, 1.0, lerp_rgb(ctx.base, [255, 255, 255], 0.5), 0.8 * a, Blend::Alpha);
        for v in &outer[..PETALS] {
            s.disc(v.0, v.1, 1.0, accent, a, Blend::Add);
        }
    }
}

/// Drifting star motes around a beacon that sends out fading rings.
pub(crate) struct StoryBeacon {
    pub(crate) motes: [Mote; MOTES],
    pub(crate) rings: [Mote; BEACON_RINGS],
    timer: f32,
}

impl StoryBeacon {
    pub(crate) fn spawn(rng: &mut fastrand::Rng) -> Self {
        Self {
            motes: std::array::from_fn(|_| Mote {
                x: rng.f32(),
                y: rng.f32(),
                size: rand_range(rng, 0.0, 1.0),
                phase: rng.f32() * TAU,
                life: 1.0,
                ..Mote::default()
            }),
            rings: [Mote::default(); BEACON_RINGS],
            timer: 0.0,
        }
    }

    pub(crate) fn step(&mut self, ctx: &mut StepCtx<'_>) {
        let spd = ctx.speed();
        for m in &mut self.motes {
            // Nearer (larger) motes drift faster.
            m.vx = 0.005 + m.size * 0.02 + ctx.swipe.0 * 0.1;
            m.vy = ctx.noise.value2(m.x * 2.0, ctx.t * 0.05 + m.phase) * 0.005;
            m.x = wrap(m.x + m.vx * ctx.dt * spd, 0.0, 1.0);
            m.y = wrap(m.y + m.vy * ctx.dt * spd, 0.0, 1.0);
        }

        self.timer += ctx.dt * ctx.params.spawn_rate.max(0.0) * 0.3;
        if ctx.touch.is_some() {
            self.timer += ctx.dt;
        }
        if self.timer >= 1.0 {
            self.timer = 0.0;
            if let Some(slot) = self
                .rings
                .iter_mut()
                .min_by(|a, b| a.life.total_cmp(&b.life))
            {
                *slot = Mote {
                    life: 1.0,
                    ..Mote::default()
                };
            }
        }
        for r in &mut self.rings {
            if r.life > 0.0 {
                r.size += ctx.dt * 0.15 * spd;
                r.life = (r.life - ctx.dt * 0.25).max(0.0);
            }
        }
    }

    pub(crate) fn paint(&self, s: &mut Surface, ctx: &PaintCtx<'_>) {
        backdrop(s, ctx);
        s.wash([0, 0, 0], 0.35);
        let dust = lerp_rgb([200, 200, 220], ctx.base, 0.3);
        let a = ctx.intensity();
        for m in &self.motes {
            let (x, y) = ctx.px(m.x, m.y);
            s.disc(x, y, 0.5 + m.size, dust, (0.3 + 0.5 * m.size) * a, Blend::Alpha);
        }
        let (bx, by) = ctx.px(0.5, 0.62);
        for r in &self.rings {
            if r.life <= 0.0 {
                continue;
            }
            s.ring(bx, by, ctx.len(r.size) * ctx.scale(), 1.0, ctx.base, r.life * 0.6 * a, Blend::Alpha);
        }
        let core = ctx.len(0.03) * (1.0 + ctx.audio.bass * 0.8) * ctx.scale();
        s.glow(bx, by, core * 2.5, ctx.base, 0.8 * a, Blend::Add);
        s.disc(bx, by, core * 0.4, [255, 255, 255], a, Blend::Add);
    }
}
