//! RGBA drawing surface and the few primitives the scenes need.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blend {
    Alpha,
    Add,
    Lighten,
}

#[derive(Clone, Default)]
pub struct Surface {
    w: usize,
    h: usize,
    px: Vec<u8>,
}

impl Surface {
    pub fn new(w: usize, h: usize) -> Self {
        let mut s = Self::default();
        s.resize(w, h);
        s
    }

    pub fn resize(&mut self, w: usize, h: usize) {
        self.w = w;
        self.h = h;
        self.px.clear();
        self.px.resize(w.saturating_mul(h).saturating_mul(4), 0);
        self.fill([0, 0, 0]);
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn height(&self) -> usize {
        self.h
    }

    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    pub fn pixels(&self) -> &[u8] {
        &self.px
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.px
    }

    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        if x >= self.w || y >= self.h {
            return [0, 0, 0, 0];
        }
        let i = (y * self.w + x) * 4;
        [self.px[i], self.px[i + 1], self.px[i + 2], self.px[i + 3]]
    }

    pub fn fill(&mut self, rgb: [u8; 3]) {
        for p in self.px.chunks_exact_mut(4) {
            p[0] = rgb[0];
            p[1] = rgb[1];
            p[2] = rgb[2];
            p[3] = 255;
        }
    }

    pub fn copy_from(&mut self, other: &Surface) {
        if self.w != other.w || self.h != other.h {
            self.resize(other.w, other.h);
        }
        self.px.copy_from_slice(&other.px);
    }

    /// Top-to-bottom gradient through evenly spaced stops.
    pub fn vertical_gradient(&mut self, stops: &[[u8; 3]]) {
        if stops.is_empty() || self.is_empty() {
            return;
        }
        let segs = (stops.len() - 1).max(1) as f32;
        let denom = (self.h.max(2) - 1) as f32;
        for y in 0..self.h {
            let t = y as f32 / denom * segs;
            let i = (t.floor() as usize).min(stops.len() - 1);
            let j = (i + 1).min(stops.len() - 1);
            let c = lerp_rgb(stops[i], stops[j], t - i as f32);
            let row = &mut self.px[y * self.w * 4..(y + 1) * self.w * 4];
            for p in row.chunks_exact_mut(4) {
                p[0] = c[0];
                p[1] = c[1];
                p[2] = c[2];
                p[3] = 255;
            }
        }
    }

    /// Blends one flat color over the whole surface.
    pub fn wash(&mut self, rgb: [u8; 3], alpha: f32) {
        let a = alpha.clamp(0.0, 1.0);
        if a <= 0.0 {
            return;
        }
        for p in self.px.chunks_exact_mut(4) {
            for k in 0..3 {
                p[k] = mix(p[k], rgb[k], a);
            }
        }
    }

    #[inline]
    pub fn blend(&mut self, x: i32, y: i32, rgb: [u8; 3], alpha: f32, mode: Blend) {
        if x < 0 || y < 0 || x as usize >= self.w || y as usize >= self.h {
            return;
        }
        let a = alpha.clamp(0.0, 1.0);
        if a <= 0.0 {
            return;
        }
        let i = (y as usize * self.w + x as usize) * 4;
        let p = &mut self.px[i..i + 4];
        match mode {
            Blend::Alpha => {
                for k in 0..3 {
                    p[k] = mix(p[k], rgb[k], a);
                }
            }
            Blend::Add => {
                for k in 0..3 {
                    p[k] = (p[k] as f32 + rgb[k] as f32 * a).min(255.0) as u8;
                }
            }
            Blend::Lighten => {
                for k in 0..3 {
                    p[k] = p[k].max((rgb[k] as f32 * a) as u8);
                }
            }
        }
        p[3] = 255;
    }

    /// Soft radial glow with quadratic falloff.
    pub fn glow(&mut self, cx: f32, cy: f32, radius: f32, rgb: [u8; 3], alpha: f32, mode: Blend) {
        let r = radius.max(0.75);
        let Some((x0, y0, x1, y1)) = self.clip_box(cx - r, cy - r, cx + r, cy + r) else {
            return;
        };
        let inv = 1.0 / r;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = x as f32 + 0.5 - cx;
                let dy = y as f32 + 0.5 - cy;
                let d = (dx * dx + dy * dy).sqrt() * inv;
                if d >= 1.0 {
                    continue;
                }
                let f = (1.0 - d) * (1.0 - d);
                self.blend(x, y, rgb, alpha * f, mode);
            }
        }
    }

    /// Filled circle with a one-pixel soft edge.
    pub fn disc(&mut self, cx: f32, cy: f32, radius: f32, rgb: [u8; 3], alpha: f32, mode: Blend) {
        let r = radius.max(0.5);
        let Some((x0, y0, x1, y1)) = self.clip_box(cx - r - 1.0, cy - r - 1.0, cx + r + 1.0, cy + r + 1.0)
        else {
            return;
        };
        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = x as f32 + 0.5 - cx;
                let dy = y as f32 + 0.5 - cy;
                let cover = (r + 0.5 - (dx * dx + dy * dy).sqrt()).clamp(0.0, 1.0);
                if cover > 0.0 {
                    self.blend(x, y, rgb, alpha * cover, mode);
                }
            }
        }
    }

    pub fn ring(
        &mut self,
        cx: f32,
        cy: f32,
        radius: f32,
        thickness: f32,
        rgb: [u8; 3],
        alpha: f32,
        mode: Blend,
    ) {
        let half = thickness.max(0.5) * 0.5;
        let outer = radius + half + 1.0;
        let Some((x0, y0, x1, y1)) = self.clip_box(cx - outer, cy - outer, cx + outer, cy + outer)
        else {
            return;
        };
        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = x as f32 + 0.5 - cx;
                let dy = y as f32 + 0.5 - cy;
                let d = ((dx * dx + dy * dy).sqrt() - radius).abs();
                let cover = (half + 0.5 - d).clamp(0.0, 1.0);
                if cover > 0.0 {
                    self.blend(x, y, rgb, alpha * cover, mode);
                }
            }
        }
    }

    pub fn line(
        &mut self,
        a: (f32, f32),
        b: (f32, f32),
        thickness: f32,
        rgb: [u8; 3],
        alpha: f32,
        mode: Blend,
    ) {
        let half = thickness.max(0.5) * 0.5;
        let pad = half + 1.0;
        let Some((x0, y0, x1, y1)) = self.clip_box(
            a.0.min(b.0) - pad,
            a.1.min(b.1) - pad,
            a.0.max(b.0) + pad,
            a.1.max(b.1) + pad,
        ) else {
            return;
        };
        let (ex, ey) = (b.0 - a.0, b.1 - a.1);
        let len2 = (ex * ex + ey * ey).max(1e-6);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let px = x as f32 + 0.5 - a.0;
                let py = y as f32 + 0.5 - a.1;
                let t = ((px * ex + py * ey) / len2).clamp(0.0, 1.0);
                let dx = px - ex * t;
                let dy = py - ey * t;
                let cover = (half + 0.5 - (dx * dx + dy * dy).sqrt()).clamp(0.0, 1.0);
                if cover > 0.0 {
                    self.blend(x, y, rgb, alpha * cover, mode);
                }
            }
        }
    }

    pub fn polyline(&mut self, pts: &[(f32, f32)], thickness: f32, rgb: [u8; 3], alpha: f32, mode: Blend) {
        for seg in pts.windows(2) {
            self.line(seg[0], seg[1], thickness, rgb, alpha, mode);
        }
    }

    /// Even-odd scanline fill.
    pub fn fill_polygon(&mut self, pts: &[(f32, f32)], rgb: [u8; 3], alpha: f32, mode: Blend) {
        if pts.len() < 3 || self.is_empty() {
            return;
        }
        let (mut min_y, mut max_y) = (f32::MAX, f32::MIN);
        for p in pts {
            min_y = min_y.min(p.1);
            max_y = max_y.max(p.1);
        }
        let y0 = min_y.floor().max(0.0) as i32;
        let y1 = max_y.ceil().min(self.h as f32 - 1.0) as i32;
        let mut xs: Vec<f32> = Vec::with_capacity(pts.len());
        for y in y0..=y1 {
            let sy = y as f32 + 0.5;
            xs.clear();
            for i in 0..pts.len() {
                let a = pts[i];
                let b = pts[(i + 1) % pts.len()];
                if (a.1 <= sy && b.1 > sy) || (b.1 <= sy && a.1 > sy) {
                    let t = (sy - a.1) / (b.1 - a.1);
                    xs.push(a.0 + (b.0 - a.0) * t);
                }
            }
            xs.sort_by(|a, b| a.total_cmp(b));
            for pair in xs.chunks_exact(2) {
                let xa = pair[0].round().max(0.0) as i32;
                let xb = pair[1].round().min(self.w as f32) as i32;
                for x in xa..xb {
                    self.blend(x, y, rgb, alpha, mode);
                }
            }
        }
    }

    fn clip_box(&self, x0: f32, y0: f32, x1: f32, y1: f32) -> Option<(i32, i32, i32, i32)> {
        if self.is_empty() || !(x0.is_finite() && y0.is_finite() && x1.is_finite() && y1.is_finite()) {
            return None;
        }
        let xa = x0.floor().max(0.0) as i32;
        let ya = y0.floor().max(0.0) as i32;
        let xb = x1.ceil().min(self.w as f32 - 1.0) as i32;
        let yb = y1.ceil().min(self.h as f32 - 1.0) as i32;
        (xa <= xb && ya <= yb).then_some((xa, ya, xb, yb))
    }
}

#[inline]
fn mix(a: u8, b: u8, t: f32) -> u8 {
    (a as f32 * (1.0 - t) + b as f32 * t) as u8
}

pub fn lerp_rgb(a: [u8; 3], b: [u8; 3], t: f32) -> [u8; 3] {
    let t = t.clamp(0.0, 1.0);
    [mix(a[0], b[0], t), mix(a[1], b[1], t), mix(a[2], b[2], t)]
}

pub fn scale_rgb(c: [u8; 3], k: f32) -> [u8; 3] {
    let k = k.max(0.0);
    [
        (c[0] as f32 * k).min(255.0) as u8,
        (c[1] as f32 * k).min(255.0) as u8,
        (c[2] as f32 * k).min(255.0) as u8,
    ]
}

pub const fn hex(c: u32) -> [u8; 3] {
    [(c >> 16) as u8, (c >> 8) as u8, c as u8]
}

/// Hue in turns (1.0 = 360 degrees).
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [u8; 3] {
    let h = fract01(h) * 6.0;
    let i = h.floor() as i32;
    let f = h - i as f32;
    let s = s.clamp(0.0, 1.0);
    let v = v.clamp(0.0, 1.0);
    let p = v * (1.0 - s);
    let q = v * (1.0 - f * s);
    let t = v * (1.0 - (1.0 - f) * s);
    let (r, g, b) = match i.rem_euclid(6) {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    [(r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8]
}

pub fn fract01(x: f32) -> f32 {
    let f = x - x.floor();
    if f < 0.0 { f + 1.0 } else { f }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_saturates_and_lighten_keeps_brighter() {
        let mut s = Surface::new(2, 1);
        s.fill([200, 10, 10]);
        s.blend(0, 0, [100, 100, 100], 1.0, Blend::Add);
        assert_eq!(s.pixel(0, 0), [255, 110, 110, 255]);
        s.blend(1, 0, [100, 5, 100], 1.0, Blend::Lighten);
        assert_eq!(s.pixel(1, 0), [200, 10, 100, 255]);
    }

    #[test]
    fn polygon_fill_covers_interior_only() {
        let mut s = Surface::new(10, 10);
        s.fill_polygon(&[(2.0, 2.0), (8.0, 2.0), (8.0, 8.0), (2.0, 8.0)], [255, 255, 255], 1.0, Blend::Alpha);
        assert_eq!(s.pixel(5, 5)[0], 255);
        assert_eq!(s.pixel(0, 0)[0], 0);
        assert_eq!(s.pixel(9, 9)[0], 0);
    }

    #[test]
    fn hue_wraps() {
        assert_eq!(hsv_to_rgb(0.0, 1.0, 1.0), hsv_to_rgb(1.0, 1.0, 1.0));
        assert_eq!(hsv_to_rgb(0.0, 1.0, 1.0), [255, 0, 0]);
    }
}
