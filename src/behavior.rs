use crate::audio::AudioFeatures;
use crate::gesture::GestureState;
use crate::world::{BehaviorProfile, Category};

pub const HISTORY_LEN: usize = 60;

const SWIPE_ENERGY: f32 = 0.001;
const SWIPE_MOD: f32 = 0.0005;
const CALM_FLOOR: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Mode {
    Idle,
    Calm,
    Active,
    Peak,
}

impl Mode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Calm => "calm",
            Self::Active => "active",
            Self::Peak => "peak",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualParameters {
    pub particle_speed: f32,
    pub spawn_rate: f32,
    pub color_intensity: f32,
    pub distortion: f32,
    pub master_scale: f32,
}

impl Default for VisualParameters {
    fn default() -> Self {
        Self {
            particle_speed: 0.6,
            spawn_rate: 0.8,
            color_intensity: 0.4,
            distortion: 0.1,
            master_scale: 0.9,
        }
    }
}

impl VisualParameters {
    /// Starting point for a mode before audio and touch are merged in.
    pub fn base(mode: Mode, category: Category, profile: &BehaviorProfile) -> Self {
        let m = profile.motion_speed;
        let (speed, spawn_rate, color_intensity, distortion, master_scale) = match mode {
            Mode::Idle => match category {
                Category::Fluid => (0.8 * m, 1.0, 0.6, 0.2, 1.0),
                Category::Calm => (0.5 * m, 0.8, 0.4, 0.05, 0.9),
                Category::Nature => (0.6 * m, 0.9, 0.5, 0.1, 0.9),
                _ => (0.6 * m, 0.8, 0.4, 0.1, 0.9),
            },
            Mode::Calm => (1.0 * m, 0.8, 0.6, 0.1, 1.0),
            Mode::Active => (2.0 * m, 2.0, 1.0, 0.3, 1.2),
            Mode::Peak => (4.0 * m, 5.0, 1.5, 0.8, 1.5),
        };
        Self {
            particle_speed: speed,
            spawn_rate,
            color_intensity,
            distortion,
            master_scale,
        }
    }
}

/// (peak, active) thresholds on the averaged energy.
pub fn thresholds(category: Category) -> (f32, f32) {
    match category {
        Category::Calm => (4.0, 1.5),
        Category::Energetic => (2.0, 0.8),
        _ => (3.0, 1.2),
    }
}

pub fn mode_for_energy(category: Category, avg_energy: f32) -> Mode {
    let (peak, active) = thresholds(category);
    if avg_energy > peak {
        Mode::Peak
    } else if avg_energy > active {
        Mode::Active
    } else if avg_energy > CALM_FLOOR {
        Mode::Calm
    } else {
        Mode::Idle
    }
}

/// Fuses audio and touch into a mode plus continuous parameters.
///
/// Energy is averaged over the last [`HISTORY_LEN`] frames before it is
/// thresholded, so single-frame spikes or dips do not flip the mode.
pub struct BehaviorEngine {
    category: Category,
    profile: BehaviorProfile,
    responsiveness_scale: f32,
    history: [f32; HISTORY_LEN],
    cursor: usize,
    last_energy: f32,
    mode: Mode,
    params: VisualParameters,
}

impl BehaviorEngine {
    pub fn new(category: Category) -> Self {
        let profile = category.profile();
        Self {
            category,
            profile,
            responsiveness_scale: 1.0,
            history: [0.0; HISTORY_LEN],
            cursor: 0,
            last_energy: 0.0,
            mode: Mode::Idle,
            params: VisualParameters::base(Mode::Idle, category, &profile),
        }
    }

    /// Switches to another category and starts from a clean history.
    pub fn set_category(&mut self, category: Category) {
        let scale = self.responsiveness_scale;
        *self = Self::new(category);
        self.responsiveness_scale = scale;
    }

    /// 0.0 leans energetic (x1.5), 1.0 leans calm (x0.5).
    pub fn set_calm_bias(&mut self, bias: f32) {
        self.responsiveness_scale = 1.5 - bias.clamp(0.0, 1.0);
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn params(&self) -> VisualParameters {
        self.params
    }

    pub fn last_energy(&self) -> f32 {
        self.last_energy
    }

    pub fn avg_energy(&self) -> f32 {
        self.history.iter().sum::<f32>() / HISTORY_LEN as f32
    }

    pub fn energy(&self, audio: &AudioFeatures, gesture: &GestureState) -> f32 {
        let p = &self.profile;
        let spectral = audio.bass * p.bass_weight
            + audio.mid * p.mid_weight
            + audio.high * p.high_freq_weight;
        let responsiveness = p.audio_responsiveness * self.responsiveness_scale;
        let press = if gesture.is_pressed {
            0.5 * p.gesture_impact
        } else {
            0.0
        };
        let swipe = gesture.speed() * SWIPE_ENERGY * p.gesture_impact;
        spectral * responsiveness + press + swipe
    }

    pub fn update(
        &mut self,
        audio: &AudioFeatures,
        gesture: &GestureState,
    ) -> (Mode, VisualParameters) {
        let energy = self.energy(audio, gesture);
        self.last_energy = energy;
        self.history[self.cursor] = if energy.is_finite() { energy } else { 0.0 };
        self.cursor = (self.cursor + 1) % HISTORY_LEN;

        self.mode = mode_for_energy(self.category, self.avg_energy());
        self.params = self.merge(
            VisualParameters::base(self.mode, self.category, &self.profile),
            audio,
            gesture,
        );
        (self.mode, self.params)
    }

    fn merge(
        &self,
        base: VisualParameters,
        audio: &AudioFeatures,
        gesture: &GestureState,
    ) -> VisualParameters {
        let p = &self.profile;
        let impact = p.gesture_impact;

        let audio_scale = audio.bass * p.bass_weight * 0.2;
        let pinch = gesture.pinch_scale.max(0.2);
        let swipe = gesture.speed() * SWIPE_MOD * impact;
        let press = if gesture.is_pressed { 0.2 * impact } else { 0.0 };
        let long_press = if gesture.is_long_press { 0.5 * impact } else { 0.0 };

        let mut distortion = base.distortion + audio.high * p.high_freq_weight * 0.5;
        if self.category == Category::Abstract {
            distortion += (gesture.velocity_x + gesture.velocity_y) * 0.001;
        }

        VisualParameters {
            master_scale: (base.master_scale + audio_scale + press + long_press) * pinch,
            particle_speed: (base.particle_speed + swipe)
                * if gesture.is_long_press { 0.5 } else { 1.0 },
            color_intensity: base.color_intensity + audio.mid * 0.5 + press,
            distortion,
            spawn_rate: base.spawn_rate + audio.amplitude * 3.0 + swipe * 10.0,
        }
    }
}
