use crate::scene::{Blend, Surface};

pub const RIPPLE_START_ALPHA: f32 = 180.0;
pub const RIPPLE_FADE: f32 = 8.0;
/// Radius growth per frame on the reference surface.
pub const RIPPLE_GROWTH: f32 = 20.0;
const MAX_RIPPLES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ripple {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    /// 0..=255 scale.
    pub alpha: f32,
}

/// Tap ripples drawn over every style.
#[derive(Debug, Clone)]
pub struct RippleField {
    ripples: Vec<Ripple>,
    density: f32,
}

impl RippleField {
    pub fn new(density: f32) -> Self {
        Self {
            ripples: Vec::with_capacity(MAX_RIPPLES),
            density: density.max(0.01),
        }
    }

    pub fn set_density(&mut self, density: f32) {
        self.density = density.max(0.01);
    }

    pub fn spawn(&mut self, x: f32, y: f32) {
        if self.ripples.len() == MAX_RIPPLES {
            self.ripples.remove(0);
        }
        self.ripples.push(Ripple {
            x,
            y,
            radius: 0.0,
            alpha: RIPPLE_START_ALPHA,
        });
    }

    /// One frame of growth and fade; faded ripples are dropped.
    pub fn tick(&mut self) {
        for r in &mut self.ripples {
            r.radius += RIPPLE_GROWTH * self.density;
            r.alpha -= RIPPLE_FADE;
        }
        self.ripples.retain(|r| r.alpha > 0.0);
    }

    pub fn paint(&self, surface: &mut Surface, rgb: [u8; 3]) {
        for r in &self.ripples {
            let thickness = (3.0 * self.density).max(1.0);
            surface.ring(r.x, r.y, r.radius, thickness, rgb, r.alpha / 255.0, Blend::Alpha);
        }
    }

    pub fn len(&self) -> usize {
        self.ripples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ripples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ripple> {
        self.ripples.iter()
    }

    pub fn clear(&mut self) {
        self.ripples.clear();
    }
}
