use super::AudioFeatures;
use rustfft::num_complex::Complex;
use std::f32::consts::PI;

pub const FFT_SIZE: usize = 1024;

const BASS_MAX_HZ: f32 = 250.0;
const MID_MAX_HZ: f32 = 2000.0;
const HIGH_MAX_HZ: f32 = 8000.0;

const BASS_GAIN: f32 = 2.0;
const MID_GAIN: f32 = 1.5;
const HIGH_GAIN: f32 = 1.2;

const ATTACK: f32 = 0.5;
const RELEASE: f32 = 0.95;
const AMPLITUDE_BOOST: f32 = 1.5;
const SILENCE_FLOOR: f32 = 0.01;

/// Turns PCM chunks into smoothed band energies.
///
/// Samples accumulate in a fixed 1024-sample window; each time the window
/// fills, one spectral pass updates the bass/mid/high bands. Amplitude is
/// tracked per chunk so it reacts even between passes.
pub struct SpectralAnalyzer {
    window: Vec<f32>,
    fill: usize,
    hann: Vec<f32>,
    fft_buf: Vec<Complex<f32>>,
    mags: Vec<f32>,
    scratch: Vec<f32>,

    bass: f32,
    mid: f32,
    high: f32,
    amplitude: f32,
    passes: u64,
}

impl SpectralAnalyzer {
    pub fn new() -> Self {
        let n = FFT_SIZE;
        let denom = (n - 1) as f32;
        let hann = (0..n)
            .map(|i| 0.5 * (1.0 - ((2.0 * PI * i as f32) / denom).cos()))
            .collect::<Vec<_>>();

        Self {
            window: vec![0.0; n],
            fill: 0,
            hann,
            fft_buf: vec![Complex { re: 0.0, im: 0.0 }; n],
            mags: vec![0.0; n / 2],
            scratch: Vec::with_capacity(n),
            bass: 0.0,
            mid: 0.0,
            high: 0.0,
            amplitude: 0.0,
            passes: 0,
        }
    }

    /// 16-bit little-endian mono PCM. A trailing odd byte is ignored.
    pub fn process_pcm16le(&mut self, bytes: &[u8], sample_rate_hz: u32) -> AudioFeatures {
        let mut scratch = std::mem::take(&mut self.scratch);
        scratch.clear();
        scratch.extend(
            bytes
                .chunks_exact(2)
                .map(|b| i16::from_le_bytes([b[0], b[1]]) as f32 / 32768.0),
        );
        let out = self.process_f32(&scratch, sample_rate_hz);
        self.scratch = scratch;
        out
    }

    pub fn process_samples(&mut self, samples: &[i16], sample_rate_hz: u32) -> AudioFeatures {
        let mut scratch = std::mem::take(&mut self.scratch);
        scratch.clear();
        scratch.extend(samples.iter().map(|&s| s as f32 / 32768.0));
        let out = self.process_f32(&scratch, sample_rate_hz);
        self.scratch = scratch;
        out
    }

    /// Float samples in [-1, 1]. This is the path the capture thread uses.
    pub fn process_f32(&mut self, samples: &[f32], sample_rate_hz: u32) -> AudioFeatures {
        // An empty chunk still counts as a zero-energy step of the envelope.
        let rms = if samples.is_empty() {
            0.0
        } else {
            let acc: f32 = samples.iter().map(|s| s * s).sum();
            (acc / samples.len() as f32).sqrt()
        };

        let room = FFT_SIZE - self.fill;
        let take = samples.len().min(room);
        self.window[self.fill..self.fill + take].copy_from_slice(&samples[..take]);
        self.fill += take;

        if self.fill == FFT_SIZE {
            self.analyze(sample_rate_hz);
            self.fill = 0;
        }

        self.amplitude = smooth(self.amplitude, rms.clamp(0.0, 1.0));
        self.features()
    }

    pub fn features(&self) -> AudioFeatures {
        let boosted = (self.amplitude * AMPLITUDE_BOOST).clamp(0.0, 1.0);
        AudioFeatures {
            amplitude: boosted,
            bass: self.bass,
            mid: self.mid,
            high: self.high,
            is_silence: boosted < SILENCE_FLOOR,
        }
    }

    /// Number of spectral passes run so far.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    pub fn reset(&mut self) {
        self.window.fill(0.0);
        self.fill = 0;
        self.bass = 0.0;
        self.mid = 0.0;
        self.high = 0.0;
        self.amplitude = 0.0;
    }

    fn analyze(&mut self, sample_rate_hz: u32) {
        for (i, c) in self.fft_buf.iter_mut().enumerate() {
            c.re = self.window[i] * self.hann[i];
            c.im = 0.0;
        }
        fft_in_place(&mut self.fft_buf);
        for (m, c) in self.mags.iter_mut().zip(self.fft_buf.iter()) {
            *m = c.norm();
        }

        let sr = sample_rate_hz.max(1) as f32;
        let bin_hz = sr / FFT_SIZE as f32;
        let mut sums = [0.0f32; 3];
        let mut counts = [0u32; 3];
        for i in 1..self.mags.len() {
            let f = i as f32 * bin_hz;
            let band = if f < BASS_MAX_HZ {
                0
            } else if f < MID_MAX_HZ {
                1
            } else if f < HIGH_MAX_HZ {
                2
            } else {
                break;
            };
            sums[band] += self.mags[i];
            counts[band] += 1;
        }

        let avg = |b: usize| {
            if counts[b] == 0 {
                0.0
            } else {
                sums[b] / counts[b] as f32
            }
        };
        let bass = (avg(0) * BASS_GAIN).clamp(0.0, 1.0);
        let mid = (avg(1) * MID_GAIN).clamp(0.0, 1.0);
        let high = (avg(2) * HIGH_GAIN).clamp(0.0, 1.0);

        self.bass = smooth(self.bass, bass);
        self.mid = smooth(self.mid, mid);
        self.high = smooth(self.high, high);
        self.passes += 1;
    }
}

impl Default for SpectralAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn smooth(current: f32, target: f32) -> f32 {
    if target > current {
        current + (target - current) * ATTACK
    } else {
        current * RELEASE
    }
}

/// In-place iterative radix-2 FFT. `buf.len()` must be a power of two;
/// other lengths are left untouched.
pub fn fft_in_place(buf: &mut [Complex<f32>]) {
    let n = buf.len();
    if n < 2 || !n.is_power_of_two() {
        return;
    }

    let mut j = 0usize;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j ^= bit;
        if i < j {
            buf.swap(i, j);
        }
    }

    let mut len = 2usize;
    while len <= n {
        let half = len / 2;
        let step = -2.0 * PI / len as f32;
        for start in (0..n).step_by(len) {
            for k in 0..half {
                let (s, c) = (step * k as f32).sin_cos();
                let w = Complex { re: c, im: s };
                let u = buf[start + k];
                let v = buf[start + k + half] * w;
                buf[start + k] = u + v;
                buf[start + k + half] = u - v;
            }
        }
        len <<= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoothing_attacks_halfway_and_releases_slowly() {
        assert!((smooth(0.0, 1.0) - 0.5).abs() < 1e-6);
        assert!((smooth(0.8, 0.2) - 0.76).abs() < 1e-6);
    }

    #[test]
    fn overflow_samples_are_dropped() {
        let mut a = SpectralAnalyzer::new();
        a.process_f32(&vec![0.1; FFT_SIZE - 10], 44_100);
        a.process_f32(&vec![0.1; 50], 44_100);
        assert_eq!(a.passes(), 1);
        assert_eq!(a.fill, 0);
    }
}
