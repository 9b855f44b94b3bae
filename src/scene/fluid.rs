use super::paint::{hex, hsv_to_rgb, lerp_rgb, scale_rgb};
use super::{damp, rand_range, reflect, touch_force, wrap, Blend, Mote, PaintCtx, StepCtx, Surface};

pub(crate) const LIQUID_ORBS: usize = 20;
pub(crate) const MARBLE_STRANDS: usize = 30;
pub(crate) const PLASMA_GLOWS: usize = 15;
pub(crate) const MERCURY_BLOBS: usize = 15;
pub(crate) const CHROMA_RIBBONS: usize = 8;

const MARBLE_STEPS: usize = 40;
const CHROMA_POINTS: usize = 20;

const CYAN: [u8; 3] = hex(0x00FFFF);
const MAGENTA: [u8; 3] = hex(0xFF00FF);

pub(crate) struct LiquidDream {
    pub(crate) orbs: [Mote; LIQUID_ORBS],
}

impl LiquidDream {
    pub(crate) fn spawn(rng: &mut fastrand::Rng) -> Self {
        Self {
            orbs: std::array::from_fn(|i| Mote {
                x: rng.f32(),
                y: rng.f32(),
                vx: rand_range(rng, -0.025, 0.025),
                vy: rand_range(rng, -0.025, 0.025),
                size: rand_range(rng, 0.12, 0.22),
                phase: rng.f32() * 100.0,
                hue: (i % 2) as f32,
                life: 1.0,
            }),
        }
    }

    pub(crate) fn step(&mut self, ctx: &mut StepCtx<'_>) {
        let spd = ctx.speed();
        let amp = 0.2 * (1.0 + ctx.distortion());
        let k = damp(0.95, ctx.dt);
        for o in &mut self.orbs {
            let z = ctx.t * 0.2 + o.phase;
            let nx = ctx.noise.value3(o.x * 1.5, o.y * 1.5, z);
            let ny = ctx.noise.value3(o.x * 1.5 + 100.0, o.y * 1.5 + 100.0, z);
            let (fx, fy) = touch_force(o.x, o.y, ctx.touch, 0.3, -2.0, ctx.aspect);
            o.vx = (o.vx + (nx * amp + fx + ctx.swipe.0 * 0.05) * ctx.dt) * k;
            o.vy = (o.vy + (ny * amp + fy + ctx.swipe.1 * 0.05) * ctx.dt) * k;
            o.x = wrap(o.x + o.vx * ctx.dt * spd, -0.2, 1.2);
            o.y = wrap(o.y + o.vy * ctx.dt * spd, -0.2, 1.2);
        }
    }

    pub(crate) fn paint(&self, s: &mut Surface, ctx: &PaintCtx<'_>) {
        s.vertical_gradient(&[
            hex(0x1A0033),
            lerp_rgb(hex(0x0D0033), ctx.base, 0.15),
            hex(0x000033),
        ]);
        let alpha = (150.0 / 255.0) * ctx.intensity();
        let pulse = 1.0 + ctx.audio.bass * 0.3;
        for o in &self.orbs {
            let (x, y) = ctx.px(o.x, o.y);
            let r = ctx.len(o.size) * pulse * ctx.scale();
            let c = if o.hue < 0.5 { CYAN } else { MAGENTA };
            s.glow(x, y, r, c, alpha, Blend::Add);
        }
    }
}

/// Domain-warped strands, like veins in marble.
pub(crate) struct LiquidMarble {
    pub(crate) strands: [Mote; MARBLE_STRANDS],
}

impl LiquidMarble {
    pub(crate) fn spawn(rng: &mut fastrand::Rng) -> Self {
        Self {
            strands: std::array::from_fn(|i| Mote {
                y: (i as f32 + 0.5) / MARBLE_STRANDS as f32 + rand_range(rng, -0.01, 0.01),
                phase: rng.f32() * 10.0,
                hue: i as f32 * 10.0 / 360.0,
                size: rand_range(rng, 0.004, 0.009),
                life: 1.0,
                ..Mote::default()
            }),
        }
    }

    pub(crate) fn step(&mut self, ctx: &mut StepCtx<'_>) {
        let spd = ctx.speed();
        for (i, st) in self.strands.iter_mut().enumerate() {
            let drift = ctx.noise.value2(i as f32 * 0.7, ctx.t * 0.1);
            st.vy = drift * 0.02 + ctx.swipe.1 * 0.02;
            st.y = wrap(st.y + st.vy * ctx.dt * spd, 0.0, 1.0);
            st.phase += ctx.dt * spd * 0.2;
        }
    }

    pub(crate) fn paint(&self, s: &mut Surface, ctx: &PaintCtx<'_>) {
        s.fill(lerp_rgb(hex(0x101010), ctx.base, 0.05));
        let warp = 0.2 * (1.0 + ctx.params.distortion.clamp(0.0, 2.0));
        let alpha = (180.0 / 255.0) * ctx.intensity();
        for st in &self.strands {
            let mut pts = [(0.0f32, 0.0f32); MARBLE_STEPS];
            for (k, p) in pts.iter_mut().enumerate() {
                let u = k as f32 / (MARBLE_STEPS - 1) as f32;
                let z = ctx.t * 0.2 + st.phase * 0.05;
                let wx = ctx.noise.value3(u * 3.0, st.y * 3.0, z);
                let wy = ctx.noise.value3(u * 3.0 + 31.0, st.y * 3.0 + 17.0, z);
                *p = ctx.px(u + wx * warp * 0.5, st.y + wy * warp);
            }
            let c = hsv_to_rgb(st.hue + ctx.t * 10.0 / 360.0, 0.55, 0.95);
            let th = ctx.len(st.size).max(1.0) * ctx.scale();
            s.polyline(&pts, th, c, alpha, Blend::Alpha);
        }
    }
}

pub(crate) struct NeonPlasma {
    pub(crate) glows: [Mote; PLASMA_GLOWS],
}

impl NeonPlasma {
    pub(crate) fn spawn(rng: &mut fastrand::Rng) -> Self {
        Self {
            glows: std::array::from_fn(|_| Mote {
                x: rng.f32(),
                y: rng.f32(),
                vx: rand_range(rng, -0.15, 0.15),
                vy: rand_range(rng, -0.15, 0.15),
                size: rand_range(rng, 0.06, 0.12),
                phase: rng.f32() * 6.0,
                hue: rng.f32(),
                life: 1.0,
            }),
        }
    }

    pub(crate) fn step(&mut self, ctx: &mut StepCtx<'_>) {
        let spd = ctx.speed();
        for g in &mut self.glows {
            let (fx, fy) = touch_force(g.x, g.y, ctx.touch, 0.25, 0.8, ctx.aspect);
            g.vx = (g.vx + fx * ctx.dt).clamp(-0.4, 0.4);
            g.vy = (g.vy + fy * ctx.dt).clamp(-0.4, 0.4);
            let nx = ctx.noise.value2(g.x * 2.0, ctx.t * 0.5) * 0.1;
            let ny = ctx.noise.value2(g.y * 2.0, ctx.t * 0.5 + 7.3) * 0.1;
            g.x += (g.vx + nx) * ctx.dt * spd;
            g.y += (g.vy + ny) * ctx.dt * spd;
            reflect(&mut g.x, &mut g.vx, 0.0, 1.0);
            reflect(&mut g.y, &mut g.vy, 0.0, 1.0);
            g.hue = (g.hue + ctx.dt * 0.02).fract();
        }
    }

    pub(crate) fn paint(&self, s: &mut Surface, ctx: &PaintCtx<'_>) {
        s.fill(lerp_rgb(hex(0x050010), ctx.base, 0.04));
        let pulse = 1.0 + ctx.audio.high * 0.5;
        let alpha = 0.65 * ctx.intensity();
        for g in &self.glows {
            let (x, y) = ctx.px(g.x, g.y);
            let r = ctx.len(g.size) * pulse * ctx.scale();
            let c = hsv_to_rgb(g.hue, 0.9, 1.0);
            s.glow(x, y, r, c, alpha, Blend::Add);
            s.glow(x, y, r * 0.3, [255, 255, 255], alpha * 0.5, Blend::Add);
        }
    }
}

/// Heavy silver blobs that gather under the finger.
pub(crate) struct MercuryDance {
    pub(crate) blobs: [Mote; MERCURY_BLOBS],
}

impl MercuryDance {
    pub(crate) fn spawn(rng: &mut fastrand::Rng) -> Self {
        Self {
            blobs: std::array::from_fn(|_| Mote {
                x: rand_range(rng, 0.1, 0.9),
                y: rand_range(rng, 0.1, 0.9),
                size: rand_range(rng, 0.07, 0.13),
                phase: rng.f32() * 50.0,
                life: 1.0,
                ..Mote::default()
            }),
        }
    }

    pub(crate) fn step(&mut self, ctx: &mut StepCtx<'_>) {
        let spd = ctx.speed();
        let k = damp(0.92, ctx.dt);
        for b in &mut self.blobs {
            let z = ctx.t * 0.15 + b.phase;
            let nx = ctx.noise.value3(b.x * 1.2, b.y * 1.2, z) * 0.3;
            let ny = ctx.noise.value3(b.x * 1.2 + 40.0, b.y * 1.2 + 40.0, z) * 0.3;
            let (fx, fy) = touch_force(b.x, b.y, ctx.touch, 0.5, 2.0, ctx.aspect);
            b.vx = (b.vx + (nx + fx) * ctx.dt) * k;
            b.vy = (b.vy + (ny + fy) * ctx.dt) * k;
            b.x += b.vx * ctx.dt * spd;
            b.y += b.vy * ctx.dt * spd;
            reflect(&mut b.x, &mut b.vx, 0.05, 0.95);
            reflect(&mut b.y, &mut b.vy, 0.05, 0.95);
        }
    }

    pub(crate) fn paint(&self, s: &mut Surface, ctx: &PaintCtx<'_>) {
        let tint = lerp_rgb(hex(0x0A0A0F), ctx.base, 0.2);
        s.vertical_gradient(&[hex(0x0A0A0F), tint, hex(0x0A0A0F)]);
        let pulse = 1.0 + ctx.audio.mid * 0.5;
        let v = ctx.intensity();
        for b in &self.blobs {
            let (x, y) = ctx.px(b.x, b.y);
            let r = ctx.len(b.size) * pulse * ctx.scale();
            s.glow(x, y, r * 1.3, scale_rgb([136, 136, 144], v), 1.0, Blend::Lighten);
            s.glow(x, y, r * 0.8, scale_rgb([255, 255, 255], v), 1.0, Blend::Lighten);
            s.disc(x - r * 0.25, y - r * 0.25, (r * 0.12).max(0.5), [255, 255, 255], 0.8 * v, Blend::Lighten);
        }
    }
}

/// Stacked hue-shifting ribbons.
pub(crate) struct ChromaticFlow {
    pub(crate) ribbons: [Mote; CHROMA_RIBBONS],
}

impl ChromaticFlow {
    pub(crate) fn spawn(rng: &mut fastrand::Rng) -> Self {
        Self {
            ribbons: std::array::from_fn(|i| Mote {
                y: (i as f32 + 0.5) / CHROMA_RIBBONS as f32,
                phase: rng.f32() * 10.0,
                hue: i as f32 * 40.0 / 360.0,
                size: rand_range(rng, 0.015, 0.03),
                life: 1.0,
                ..Mote::default()
            }),
        }
    }

    pub(crate) fn step(&mut self, ctx: &mut StepCtx<'_>) {
        let spd = ctx.speed();
        for (i, r) in self.ribbons.iter_mut().enumerate() {
            r.phase += ctx.dt * spd * 0.4;
            r.vy = ctx.noise.value2(i as f32 * 3.1, ctx.t * 0.05) * 0.03 + ctx.swipe.1 * 0.02;
            r.y = (r.y + r.vy * ctx.dt * spd).clamp(0.05, 0.95);
        }
    }

    pub(crate) fn paint(&self, s: &mut Surface, ctx: &PaintCtx<'_>) {
        s.fill(lerp_rgb(hex(0x080808), ctx.base, 0.08));
        let amp = 0.15 * (1.0 + ctx.params.distortion.clamp(0.0, 2.0));
        let alpha = (200.0 / 255.0) * ctx.intensity();
        let swell = 1.0 + ctx.audio.bass * 0.5;
        for (i, r) in self.ribbons.iter().enumerate() {
            let mut pts = [(0.0f32, 0.0f32); CHROMA_POINTS];
            for (k, p) in pts.iter_mut().enumerate() {
                let u = k as f32 / (CHROMA_POINTS - 1) as f32;
                let n = ctx.noise.value3(u * 2.0, i as f32, ctx.t * 0.4 + r.phase * 0.1);
                *p = ctx.px(u, r.y + n * amp);
            }
            let c = hsv_to_rgb(r.hue + ctx.t * 20.0 / 360.0, 0.8, 0.95);
            let th = ctx.len(r.size).max(1.0) * swell * ctx.scale();
            s.polyline(&pts, th, c, alpha, Blend::Alpha);
        }
    }
}
