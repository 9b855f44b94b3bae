use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "resonant-worlds",
    version,
    about = "Audio- and gesture-reactive procedural worlds for the terminal"
)]
pub struct Config {
    #[arg(long, value_enum, default_value_t = AudioSource::Auto)]
    pub source: AudioSource,

    /// Substring of the microphone device name.
    #[arg(long)]
    pub device: Option<String>,

    #[arg(long, value_enum, default_value_t = RendererMode::HalfBlock)]
    pub renderer: RendererMode,

    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    /// World id (c1..s5); overrides the stored selection for this run.
    #[arg(long)]
    pub world: Option<String>,

    /// Noise and spawn seed. Random when omitted.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Overrides the stored sensitivity for this run.
    #[arg(long)]
    pub sensitivity: Option<f32>,

    /// Settings file; defaults to the per-user config directory.
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Write logs here instead of stderr.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub list_devices: bool,

    #[arg(long, default_value_t = false)]
    pub list_worlds: bool,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub sync_updates: bool,

    #[arg(long, default_value_t = 600)]
    pub crossfade_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AudioSource {
    Auto,
    #[value(alias = "microphone")]
    Mic,
    #[value(alias = "system", alias = "music")]
    Playback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RendererMode {
    #[value(name = "half-block", alias = "halfblock", alias = "half_block", alias = "hb")]
    HalfBlock,
    #[value(alias = "hires", alias = "dots")]
    Braille,
}

impl RendererMode {
    /// Surface pixels per terminal cell (columns, rows).
    pub fn pixels_per_cell(self) -> (usize, usize) {
        match self {
            Self::HalfBlock => (1, 2),
            Self::Braille => (2, 4),
        }
    }
}
