use super::paint::{hex, hsv_to_rgb, lerp_rgb, scale_rgb};
use super::{damp, rand_range, touch_force, wrap, Blend, Mote, PaintCtx, StepCtx, Surface};
use std::f32::consts::TAU;

pub(crate) const POLLEN: usize = 16;
pub(crate) const FIREFLIES: usize = 35;
pub(crate) const RAINDROPS: usize = 60;
pub(crate) const SPLASHES: usize = 12;
pub(crate) const LEAVES: usize = 20;
pub(crate) const STARS: usize = 30;

const GROUND: f32 = 0.88;
/// 400 px on the reference width.
const FIREFLY_REACH: f32 = 400.0 / 1080.0;

pub(crate) struct ForestLight {
    pub(crate) pollen: [Mote; POLLEN],
}

impl ForestLight {
    pub(crate) fn spawn(rng: &mut fastrand::Rng) -> Self {
        Self {
            pollen: std::array::from_fn(|_| Mote {
                x: rng.f32(),
                y: rng.f32(),
                size: rand_range(rng, 0.004, 0.01),
                phase: rng.f32() * TAU,
                life: 1.0,
                ..Mote::default()
            }),
        }
    }

    pub(crate) fn step(&mut self, ctx: &mut StepCtx<'_>) {
        let spd = ctx.speed();
        for p in &mut self.pollen {
            let n = ctx.noise.value3(p.x * 2.0, p.y * 2.0, ctx.t * 0.1 + p.phase);
            let (fx, fy) = touch_force(p.x, p.y, ctx.touch, 0.2, -0.6, ctx.aspect);
            p.vx = n * 0.03 + fx * 0.2 + ctx.swipe.0 * 0.05;
            p.vy = -0.02 + n * 0.01 + fy * 0.2;
            p.x = wrap(p.x + p.vx * ctx.dt * spd, 0.0, 1.0);
            p.y = wrap(p.y + p.vy * ctx.dt * spd, 0.0, 1.0);
        }
    }

    pub(crate) fn paint(&self, s: &mut Surface, ctx: &PaintCtx<'_>) {
        s.vertical_gradient(&[lerp_rgb(hex(0x0B1F0E), ctx.base, 0.12), hex(0x050A06)]);
        let ray_color = lerp_rgb(ctx.base, [255, 250, 220], 0.6);
        let ray_alpha = (0.06 + ctx.audio.mid * 0.08) * ctx.intensity();
        for k in 0..5 {
            let x = (k as f32 + 0.5) / 5.0 + (ctx.t * 0.1 + k as f32).sin() * 0.05;
            s.line(
                ctx.px(x, -0.05),
                ctx.px(x + 0.25, 1.0),
                ctx.len(0.08),
                ray_color,
                ray_alpha,
                Blend::Add,
            );
        }
        let warm = lerp_rgb(ctx.base, [255, 240, 180], 0.5);
        for p in &self.pollen {
            let (x, y) = ctx.px(p.x, p.y);
            let twinkle = 0.6 + 0.4 * (ctx.t * 3.0 + p.phase).sin();
            let r = (ctx.len(p.size) * (1.0 + ctx.audio.high * 0.4) * ctx.scale()).max(0.6);
            s.disc(x, y, r, warm, 0.7 * twinkle * ctx.intensity(), Blend::Alpha);
        }
    }
}

pub(crate) struct FireflyField {
    pub(crate) flies: [Mote; FIREFLIES],
}

impl FireflyField {
    pub(crate) fn spawn(rng: &mut fastrand::Rng) -> Self {
        Self {
            flies: std::array::from_fn(|_| Mote {
                x: rng.f32(),
                y: rand_range(rng, 0.2, 1.0),
                vx: rand_range(rng, -0.02, 0.02),
                vy: rand_range(rng, -0.02, 0.02),
                size: rand_range(rng, 0.006, 0.012),
                phase: rng.f32() * TAU,
                life: 1.0,
                ..Mote::default()
            }),
        }
    }

    pub(crate) fn step(&mut self, ctx: &mut StepCtx<'_>) {
        let spd = ctx.speed();
        let k = damp(0.98, ctx.dt);
        for f in &mut self.flies {
            let z = ctx.t * 0.3 + f.phase;
            let nx = ctx.noise.value3(f.x * 3.0, f.y * 3.0, z) * 0.15;
            let ny = ctx.noise.value3(f.x * 3.0 + 9.0, f.y * 3.0 + 9.0, z) * 0.15;
            let (fx, fy) = touch_force(f.x, f.y, ctx.touch, FIREFLY_REACH, 1.2, ctx.aspect);
            f.vx = (f.vx + (nx + fx) * ctx.dt) * k;
            f.vy = (f.vy + (ny + fy) * ctx.dt) * k;
            f.x = wrap(f.x + f.vx * ctx.dt * spd, 0.0, 1.0);
            f.y = wrap(f.y + f.vy * ctx.dt * spd, 0.0, 1.0);
            f.life = 0.5 + 0.5 * (ctx.t * 2.0 + f.phase).sin();
        }
    }

    pub(crate) fn paint(&self, s: &mut Surface, ctx: &PaintCtx<'_>) {
        s.vertical_gradient(&[
            hex(0x02040A),
            lerp_rgb(hex(0x06120A), ctx.base, 0.08),
            hex(0x0A1A0A),
        ]);
        let boost = 0.6 + ctx.audio.high * 0.4;
        for f in &self.flies {
            let (x, y) = ctx.px(f.x, f.y);
            let a = f.life * boost * ctx.intensity();
            let r = ctx.len(f.size) * (2.0 + ctx.audio.bass) * ctx.scale();
            s.glow(x, y, r * 2.0, ctx.base, a * 0.6, Blend::Add);
            s.disc(x, y, (r * 0.35).max(0.5), [255, 255, 210], a, Blend::Add);
        }
    }
}

pub(crate) struct RainMeadow {
    pub(crate) drops: [Mote; RAINDROPS],
    pub(crate) splashes: [Mote; SPLASHES],
}

impl RainMeadow {
    pub(crate) fn spawn(rng: &mut fastrand::Rng) -> Self {
        Self {
            drops: std::array::from_fn(|_| Mote {
                x: rng.f32(),
                y: rand_range(rng, -0.2, GROUND),
                vy: rand_range(rng, 0.6, 1.0),
                size: rand_range(rng, 0.03, 0.06),
                life: 1.0,
                ..Mote::default()
            }),
            splashes: [Mote::default(); SPLASHES],
        }
    }

    pub(crate) fn step(&mut self, ctx: &mut StepCtx<'_>) {
        let spd = ctx.speed();
        let fall = (1.0 + ctx.audio.bass * 0.5) * spd;
        let wind = ctx.swipe.0 * 0.3 + ctx.noise.value2(ctx.t * 0.1, 3.0) * 0.05;
        let k = damp(0.9, ctx.dt);
        for d in &mut self.drops {
            let (fx, _) = touch_force(d.x, d.y, ctx.touch, 0.15, -1.5, ctx.aspect);
            d.vx = (d.vx + fx * ctx.dt) * k;
            d.x = wrap(d.x + (d.vx + wind) * ctx.dt, 0.0, 1.0);
            d.y += d.vy * fall * ctx.dt;
            if d.y > GROUND {
                let slot = self
                    .splashes
                    .iter()
                    .enumerate()
                    .min_by(|a, b| a.1.life.total_cmp(&b.1.life))
                    .map(|(i, _)| i)
                    .unwrap_or(0);
                self.splashes[slot] = Mote {
                    x: d.x,
                    y: GROUND + ctx.rng.f32() * 0.1,
                    life: 1.0,
                    ..Mote::default()
                };
                d.x = ctx.rng.f32();
                d.y = -ctx.rng.f32() * 0.2;
                d.vx = 0.0;
            }
        }
        for sp in &mut self.splashes {
            if sp.life > 0.0 {
                sp.size += ctx.dt * 0.15;
                sp.life = (sp.life - ctx.dt * 1.5).max(0.0);
            }
        }
    }

    pub(crate) fn paint(&self, s: &mut Surface, ctx: &PaintCtx<'_>) {
        s.vertical_gradient(&[
            lerp_rgb(hex(0x0A1020), ctx.base, 0.1),
            hex(0x101828),
            hex(0x0B1A10),
        ]);
        let ground = [
            ctx.px(0.0, GROUND),
            ctx.px(1.0, GROUND),
            ctx.px(1.0, 1.0),
            ctx.px(0.0, 1.0),
        ];
        s.fill_polygon(&ground, hex(0x0E2A12), 0.8, Blend::Alpha);

        let rain = lerp_rgb([170, 190, 220], ctx.base, 0.3);
        let a = 0.6 * ctx.intensity();
        for d in &self.drops {
            if d.y < 0.0 {
                continue;
            }
            let head = ctx.px(d.x, d.y);
            let tail = ctx.px(d.x - d.vx * 0.02, d.y - d.size * ctx.scale());
            s.line(tail, head, 1.0, rain, a, Blend::Alpha);
        }
        for sp in &self.splashes {
            if sp.life <= 0.0 {
                continue;
            }
            let (x, y) = ctx.px(sp.x, sp.y);
            s.ring(x, y, ctx.len(sp.size), 1.0, rain, sp.life * 0.5, Blend::Alpha);
        }
    }
}

pub(crate) struct WindValley {
    pub(crate) leaves: [Mote; LEAVES],
}

impl WindValley {
    pub(crate) fn spawn(rng: &mut fastrand::Rng) -> Self {
        Self {
            leaves: std::array::from_fn(|_| Mote {
                x: rng.f32(),
                y: rand_range(rng, 0.1, 0.9),
                vx: rand_range(rng, 0.02, 0.08),
                size: rand_range(rng, 0.015, 0.03),
                phase: rng.f32() * TAU,
                hue: rng.f32(),
                life: 1.0,
                ..Mote::default()
            }),
        }
    }

    pub(crate) fn step(&mut self, ctx: &mut StepCtx<'_>) {
        let spd = ctx.speed();
        for l in &mut self.leaves {
            let wind = 0.08 + ctx.noise.value2(ctx.t * 0.2, l.y * 2.0) * 0.1 + ctx.swipe.0 * 0.2;
            let (fx, fy) = touch_force(l.x, l.y, ctx.touch, 0.2, -1.0, ctx.aspect);
            l.vx += ((wind - l.vx) * 2.0 + fx) * ctx.dt;
            l.vy = (ctx.t * 2.0 + l.phase).sin() * 0.03 + 0.01 + fy * 0.2;
            l.phase += ctx.dt * (1.0 + l.vx.abs() * 5.0) * spd;
            l.x = wrap(l.x + l.vx * ctx.dt * spd, -0.1, 1.1);
            l.y = wrap(l.y + l.vy * ctx.dt * spd, -0.1, 1.1);
        }
    }

    pub(crate) fn paint(&self, s: &mut Surface, ctx: &PaintCtx<'_>) {
        s.vertical_gradient(&[
            hex(0x1B2A3A),
            lerp_rgb(hex(0x2E4A2E), ctx.base, 0.2),
            hex(0x1A2E14),
        ]);
        for k in 0..6 {
            let yk = (k as f32 + 0.5) / 6.0;
            let mut pts = [(0.0f32, 0.0f32); 16];
            for (i, p) in pts.iter_mut().enumerate() {
                let u = i as f32 / 15.0;
                let y = yk + ctx.noise.value2(u * 2.0 - ctx.t * 0.3, k as f32) * 0.03;
                *p = ctx.px(u, y);
            }
            s.polyline(&pts, 1.0, [220, 235, 220], 0.12 * ctx.intensity(), Blend::Alpha);
        }
        for l in &self.leaves {
            let (x, y) = ctx.px(l.x, l.y);
            let len = ctx.len(l.size) * 2.0 * ctx.scale();
            let (sn, cs) = l.phase.sin_cos();
            let (ax, ay) = (cs * len, sn * len);
            let (bx, by) = (-sn * len * 0.4, cs * len * 0.4);
            let leaf = [(x + ax, y + ay), (x + bx, y + by), (x - ax, y - ay), (x - bx, y - by)];
            let c = lerp_rgb(hsv_to_rgb(0.22 + l.hue * 0.1, 0.7, 0.8), ctx.base, 0.3);
            s.fill_polygon(&leaf, scale_rgb(c, ctx.intensity() + 0.2), 0.9, Blend::Alpha);
        }
    }
}

/// Sky rotation speed in viewport widths per second.
const STAR_DRIFT: f32 = 0.01;
const STAR_CEILING: f32 = 0.7;

pub(crate) struct AuroraSky {
    pub(crate) stars: [Mote; STARS],
}

impl AuroraSky {
    pub(crate) fn spawn(rng: &mut fastrand::Rng) -> Self {
        Self {
            stars: std::array::from_fn(|_| Mote {
                x: rng.f32(),
                y: rand_range(rng, 0.0, STAR_CEILING),
                size: rand_range(rng, 0.002, 0.006),
                phase: rng.f32() * TAU,
                life: 1.0,
                ..Mote::default()
            }),
        }
    }

    pub(crate) fn step(&mut self, ctx: &mut StepCtx<'_>) {
        let spd = ctx.speed();
        let k = damp(0.99, ctx.dt);
        for st in &mut self.stars {
            let z = ctx.t * 0.05 + st.phase;
            let nx = ctx.noise.value3(st.x * 2.0, st.y * 2.0, z) * STAR_DRIFT;
            let ny = ctx.noise.value3(st.x * 2.0 + 5.0, st.y * 2.0 + 5.0, z) * STAR_DRIFT * 0.3;
            let (fx, fy) = touch_force(st.x, st.y, ctx.touch, 0.2, 1.0, ctx.aspect);
            st.vx = (st.vx + (nx + ctx.swipe.0 * 0.02) * ctx.dt) * k;
            st.vy = (st.vy + (ny + ctx.swipe.1 * 0.02) * ctx.dt) * k;
            st.x = wrap(st.x + (st.vx + STAR_DRIFT * 0.2) * ctx.dt * spd, 0.0, 1.0);
            st.y = wrap(st.y + st.vy * ctx.dt * spd, 0.0, STAR_CEILING);

            let twinkle = 0.5 + 0.5 * (ctx.t * 1.5 + st.phase).sin();
            st.life = (twinkle + (fx.abs() + fy.abs()) * 0.5).clamp(0.0, 1.0);
        }
    }

    pub(crate) fn paint(&self, s: &mut Surface, ctx: &PaintCtx<'_>) {
        s.vertical_gradient(&[hex(0x000510), hex(0x02101A), hex(0x03140C)]);
        for st in &self.stars {
            let (x, y) = ctx.px(st.x, st.y);
            let r = ctx.len(st.size).max(0.5);
            s.disc(x, y, r, [235, 240, 255], st.life * 0.9, Blend::Add);
        }

        let curtains = [
            lerp_rgb(hsv_to_rgb(0.38, 0.8, 0.9), ctx.base, 0.4),
            hsv_to_rgb(0.48, 0.7, 0.8),
            hsv_to_rgb(0.75, 0.6, 0.7),
        ];
        let amp = 0.1 * (1.0 + ctx.params.distortion.clamp(0.0, 2.0));
        let height = 0.18 + ctx.audio.mid * 0.1;
        let alpha = (0.10 + ctx.audio.high * 0.1) * ctx.intensity();
        let cols = 48;
        let col_w = (ctx.w / cols as f32).max(1.0);
        for (k, c) in curtains.iter().enumerate() {
            for i in 0..cols {
                let u = i as f32 / (cols - 1) as f32;
                let y0 = 0.25
                    + k as f32 * 0.08
                    + ctx.noise.value2(u * 1.5 + k as f32 * 10.0, ctx.t * 0.1) * amp;
                let top = ctx.px(u, y0);
                let bottom = ctx.px(u, y0 + height * ctx.scale());
                s.line(top, bottom, col_w, *c, alpha, Blend::Add);
                s.glow(top.0, top.1, col_w * 1.5, *c, alpha, Blend::Add);
            }
        }
    }
}
