//! Static world catalog and per-category behavior profiles.

use crate::scene::StyleId;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Calm,
    Energetic,
    Abstract,
    Nature,
    Fluid,
    Story,
}

impl Category {
    pub fn label(self) -> &'static str {
        match self {
            Self::Calm => "calm",
            Self::Energetic => "energetic",
            Self::Abstract => "abstract",
            Self::Nature => "nature",
            Self::Fluid => "fluid",
            Self::Story => "story",
        }
    }

    pub fn profile(self) -> BehaviorProfile {
        match self {
            Self::Calm => BehaviorProfile::new(0.2, 1.0, 0.5, 0.2, 0.4, 0.3, 0.1),
            Self::Energetic => BehaviorProfile::new(0.9, 1.5, 0.8, 1.0, 1.2, 1.0, 0.3),
            Self::Abstract => BehaviorProfile::new(0.5, 0.8, 1.0, 1.5, 0.8, 1.2, 0.4),
            Self::Nature => BehaviorProfile::new(0.3, 0.5, 1.2, 0.8, 0.6, 0.6, 0.5),
            Self::Fluid => BehaviorProfile::new(0.6, 1.2, 1.0, 0.6, 0.7, 0.9, 0.3),
            Self::Story => BehaviorProfile::new(0.4, 1.0, 1.0, 1.0, 0.5, 0.8, 0.2),
        }
    }
}

/// How strongly a category reacts to each input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BehaviorProfile {
    pub audio_responsiveness: f32,
    pub bass_weight: f32,
    pub mid_weight: f32,
    pub high_freq_weight: f32,
    pub motion_speed: f32,
    pub gesture_impact: f32,
    pub idle_intensity: f32,
}

impl BehaviorProfile {
    pub const fn new(
        audio_responsiveness: f32,
        bass_weight: f32,
        mid_weight: f32,
        high_freq_weight: f32,
        motion_speed: f32,
        gesture_impact: f32,
        idle_intensity: f32,
    ) -> Self {
        Self {
            audio_responsiveness,
            bass_weight,
            mid_weight,
            high_freq_weight,
            motion_speed,
            gesture_impact,
            idle_intensity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct World {
    pub id: &'static str,
    pub name: &'static str,
    pub category: Category,
    pub base_color: [u8; 3],
    pub style: StyleId,
    pub premium: bool,
}

impl World {
    pub fn profile(&self) -> BehaviorProfile {
        self.category.profile()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("unknown world id: {0}")]
    UnknownWorld(String),
}

const fn rgb(hex: u32) -> [u8; 3] {
    [(hex >> 16) as u8, (hex >> 8) as u8, hex as u8]
}

const fn world(
    id: &'static str,
    name: &'static str,
    category: Category,
    hex: u32,
    style: StyleId,
) -> World {
    World {
        id,
        name,
        category,
        base_color: rgb(hex),
        style,
        premium: matches!(category, Category::Story),
    }
}

pub static WORLDS: [World; 30] = [
    world("c1", "Echo Ocean", Category::Calm, 0x00E5FF, StyleId::CalmTide),
    world("c2", "Zen Garden", Category::Calm, 0x81C784, StyleId::CalmTide),
    world("c3", "Mist Flow", Category::Calm, 0xB0BEC5, StyleId::CalmTide),
    world("c4", "Night Tide", Category::Calm, 0x3F51B5, StyleId::CalmTide),
    world("c5", "Silent Horizon", Category::Calm, 0xE1F5FE, StyleId::CalmTide),
    world("e1", "Pulse City", Category::Energetic, 0xFF0055, StyleId::PulseCore),
    world("e2", "Neon Storm", Category::Energetic, 0x00E5FF, StyleId::PulseCore),
    world("e3", "Sonic Core", Category::Energetic, 0xFFD600, StyleId::PulseCore),
    world("e4", "Bass Reactor", Category::Energetic, 0xFF5722, StyleId::PulseCore),
    world("e5", "Electro Grid", Category::Energetic, 0x76FF03, StyleId::PulseCore),
    world("a1", "Nebula Dreams", Category::Abstract, 0x6C63FF, StyleId::NoiseBloom),
    world("a2", "Glitch Matrix", Category::Abstract, 0x00FF00, StyleId::NoiseBloom),
    world("a3", "Fractal Bloom", Category::Abstract, 0xFF4081, StyleId::NoiseBloom),
    world("a4", "Liquid Chaos", Category::Abstract, 0xFF9100, StyleId::NoiseBloom),
    world("a5", "Quantum Ink", Category::Abstract, 0x7C4DFF, StyleId::NoiseBloom),
    world("n1", "Forest Whisper", Category::Nature, 0x4CAF50, StyleId::ForestLight),
    world("n2", "Firefly Field", Category::Nature, 0xFFD600, StyleId::FireflyField),
    world("n3", "Rain Meadow", Category::Nature, 0x2196F3, StyleId::RainMeadow),
    world("n4", "Wind Valley", Category::Nature, 0x8BC34A, StyleId::WindValley),
    world("n5", "Aurora Sky", Category::Nature, 0x00E676, StyleId::AuroraSky),
    world("f1", "Liquid Dream", Category::Fluid, 0x00BCD4, StyleId::LiquidDream),
    world("f2", "Vapor Flow", Category::Fluid, 0x9C27B0, StyleId::LiquidMarble),
    world("f3", "Plasma Wave", Category::Fluid, 0xFF00FF, StyleId::NeonPlasma),
    world("f4", "Mercury Dance", Category::Fluid, 0xC0C0C0, StyleId::MercuryDance),
    world("f5", "Oil Canvas", Category::Fluid, 0xFF9800, StyleId::ChromaticFlow),
    world("s1", "Lone Voyager", Category::Story, 0xFFFFFF, StyleId::StoryBeacon),
    world("s2", "Silent City", Category::Story, 0xB0BEC5, StyleId::StoryBeacon),
    world("s3", "Ember Path", Category::Story, 0xFF6F00, StyleId::StoryBeacon),
    world("s4", "Forgotten World", Category::Story, 0x4E342E, StyleId::StoryBeacon),
    world("s5", "Last Signal", Category::Story, 0xF44336, StyleId::StoryBeacon),
];

pub fn lookup(id: &str) -> Result<&'static World, CatalogError> {
    let want = id.trim();
    WORLDS
        .iter()
        .find(|w| w.id.eq_ignore_ascii_case(want))
        .ok_or_else(|| CatalogError::UnknownWorld(want.to_string()))
}

/// Lookup that falls back to the first world.
pub fn world_or_default(id: &str) -> &'static World {
    lookup(id).unwrap_or(&WORLDS[0])
}

pub fn index_of(id: &str) -> usize {
    WORLDS.iter().position(|w| w.id == id).unwrap_or(0)
}

/// Neighbouring world in catalog order, wrapping at both ends.
pub fn step(current: &World, forward: bool) -> &'static World {
    let i = index_of(current.id);
    let n = WORLDS.len();
    let j = if forward { (i + 1) % n } else { (i + n - 1) % n };
    &WORLDS[j]
}
