mod analyzer;
mod capture;
mod source;

pub use analyzer::{fft_in_place, SpectralAnalyzer, FFT_SIZE};
pub use capture::{list_input_devices, AudioCapture};
pub use source::{choose_source, ActiveSource, AudioSupervisor, SourceKind, SourcePolicy};

use std::sync::atomic::{fence, AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// One analyzed snapshot. All energies are in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioFeatures {
    pub amplitude: f32,
    pub bass: f32,
    pub mid: f32,
    pub high: f32,
    pub is_silence: bool,
}

impl Default for AudioFeatures {
    fn default() -> Self {
        Self {
            amplitude: 0.0,
            bass: 0.0,
            mid: 0.0,
            high: 0.0,
            is_silence: true,
        }
    }
}

impl AudioFeatures {
    /// Applies the user sensitivity multiplier, keeping every energy in [0, 1].
    pub fn scaled(mut self, sensitivity: f32) -> Self {
        let s = sensitivity.clamp(0.0, 8.0);
        if (s - 1.0).abs() < 1e-3 {
            return self;
        }
        self.amplitude = (self.amplitude * s).clamp(0.0, 1.0);
        self.bass = (self.bass * s).clamp(0.0, 1.0);
        self.mid = (self.mid * s).clamp(0.0, 1.0);
        self.high = (self.high * s).clamp(0.0, 1.0);
        self
    }
}

/// Single-slot latest-value cell. One producer overwrites, any number of
/// readers take consistent snapshots without blocking.
pub struct AtomicAudioFeatures {
    seq: AtomicU64,
    amplitude: AtomicU32,
    bass: AtomicU32,
    mid: AtomicU32,
    high: AtomicU32,
    silence: AtomicU32,
    updated_ms: AtomicU64,
}

impl AtomicAudioFeatures {
    pub fn new() -> Self {
        Self {
            seq: AtomicU64::new(0),
            amplitude: AtomicU32::new(0),
            bass: AtomicU32::new(0),
            mid: AtomicU32::new(0),
            high: AtomicU32::new(0),
            silence: AtomicU32::new(1),
            updated_ms: AtomicU64::new(0),
        }
    }

    pub fn store(&self, f: AudioFeatures) {
        self.seq.fetch_add(1, Ordering::Relaxed); // odd => write in progress
        // Field stores stay after the odd count.
        fence(Ordering::Release);
        self.amplitude.store(f.amplitude.to_bits(), Ordering::Relaxed);
        self.bass.store(f.bass.to_bits(), Ordering::Relaxed);
        self.mid.store(f.mid.to_bits(), Ordering::Relaxed);
        self.high.store(f.high.to_bits(), Ordering::Relaxed);
        self.silence
            .store(if f.is_silence { 1 } else { 0 }, Ordering::Relaxed);
        self.updated_ms.store(now_ms(), Ordering::Relaxed);
        self.seq.fetch_add(1, Ordering::Release); // even => stable
    }

    pub fn load(&self) -> AudioFeatures {
        loop {
            let v1 = self.seq.load(Ordering::Acquire);
            if v1 & 1 == 1 {
                std::hint::spin_loop();
                continue;
            }

            let amplitude = f32::from_bits(self.amplitude.load(Ordering::Relaxed));
            let bass = f32::from_bits(self.bass.load(Ordering::Relaxed));
            let mid = f32::from_bits(self.mid.load(Ordering::Relaxed));
            let high = f32::from_bits(self.high.load(Ordering::Relaxed));
            let is_silence = self.silence.load(Ordering::Relaxed) != 0;

            fence(Ordering::Acquire);
            let v2 = self.seq.load(Ordering::Relaxed);
            if v1 == v2 {
                return AudioFeatures {
                    amplitude,
                    bass,
                    mid,
                    high,
                    is_silence,
                };
            }
        }
    }

    /// Publishes the silent snapshot.
    pub fn reset(&self) {
        self.store(AudioFeatures::default());
    }

    pub fn age_ms(&self) -> f32 {
        let t = self.updated_ms.load(Ordering::Relaxed);
        if t == 0 {
            return 0.0;
        }
        now_ms().saturating_sub(t) as f32
    }
}

impl Default for AtomicAudioFeatures {
    fn default() -> Self {
        Self::new()
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_millis(0))
        .as_millis() as u64
}
