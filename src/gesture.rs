use std::time::Instant;

/// Velocity multiplier applied once per frame.
pub const VELOCITY_DECAY: f32 = 0.9;
/// Fraction of the distance back to 1.0 that pinch recovers per frame.
pub const PINCH_RECOVERY: f32 = 0.05;
const DRAG_VELOCITY_GAIN: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    Press { x: f32, y: f32 },
    Release,
    /// `dx`/`dy` are the movement since the previous drag sample.
    Drag { x: f32, y: f32, dx: f32, dy: f32 },
    Fling { vx: f32, vy: f32 },
    LongPress,
    Pinch { factor: f32 },
    Tap { x: f32, y: f32 },
}

/// Touch state. Positions are surface pixels; velocities are in pixels of a
/// 1080-wide reference surface per second so thresholds do not depend on the
/// terminal size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureState {
    pub last_x: f32,
    pub last_y: f32,
    pub is_pressed: bool,
    pub is_long_press: bool,
    pub velocity_x: f32,
    pub velocity_y: f32,
    pub pinch_scale: f32,
    pub last_interaction: Option<Instant>,
}

impl Default for GestureState {
    fn default() -> Self {
        Self {
            last_x: 0.0,
            last_y: 0.0,
            is_pressed: false,
            is_long_press: false,
            velocity_x: 0.0,
            velocity_y: 0.0,
            pinch_scale: 1.0,
            last_interaction: None,
        }
    }
}

impl GestureState {
    pub fn apply(&mut self, event: GestureEvent, now: Instant) {
        self.last_interaction = Some(now);
        match event {
            GestureEvent::Press { x, y } => {
                self.last_x = x;
                self.last_y = y;
                self.is_pressed = true;
            }
            GestureEvent::Release => {
                self.is_pressed = false;
                self.is_long_press = false;
            }
            GestureEvent::Drag { x, y, dx, dy } => {
                self.last_x = x;
                self.last_y = y;
                self.velocity_x = dx * DRAG_VELOCITY_GAIN;
                self.velocity_y = dy * DRAG_VELOCITY_GAIN;
            }
            GestureEvent::Fling { vx, vy } => {
                self.velocity_x = vx;
                self.velocity_y = vy;
            }
            GestureEvent::LongPress => {
                self.is_long_press = true;
            }
            GestureEvent::Pinch { factor } => {
                if factor.is_finite() && factor > 0.0 {
                    self.pinch_scale = (self.pinch_scale * factor).clamp(0.0, 10.0);
                }
            }
            GestureEvent::Tap { x, y } => {
                self.last_x = x;
                self.last_y = y;
            }
        }
    }

    /// Per-frame relaxation. Only the frame loop calls this.
    pub fn decay(&mut self) {
        self.velocity_x *= VELOCITY_DECAY;
        self.velocity_y *= VELOCITY_DECAY;
        self.pinch_scale += (1.0 - self.pinch_scale) * PINCH_RECOVERY;
    }

    pub fn speed(&self) -> f32 {
        self.velocity_x.abs() + self.velocity_y.abs()
    }

    /// Touch point while a finger is down.
    pub fn touch(&self) -> Option<(f32, f32)> {
        self.is_pressed.then_some((self.last_x, self.last_y))
    }
}
