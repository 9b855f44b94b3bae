use proptest::prelude::*;
use resonant_worlds::audio::{fft_in_place, AudioFeatures, SpectralAnalyzer, FFT_SIZE};
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use std::f32::consts::PI;

const RATE: u32 = 44_100;
const CHUNK: usize = 512;

fn sine_chunk(freq: f32, amp: f32, start: usize, len: usize) -> Vec<i16> {
    (start..start + len)
        .map(|n| (amp * (2.0 * PI * freq * n as f32 / RATE as f32).sin()) as i16)
        .collect()
}

/// Feeds `windows` full analysis windows of a sine and returns the last features.
fn feed_sine(a: &mut SpectralAnalyzer, freq: f32, windows: usize) -> AudioFeatures {
    let mut last = a.features();
    for c in 0..windows * FFT_SIZE / CHUNK {
        last = a.process_samples(&sine_chunk(freq, 16_000.0, c * CHUNK, CHUNK), RATE);
    }
    last
}

#[test]
fn starts_silent() {
    let a = SpectralAnalyzer::new();
    assert_eq!(a.features(), AudioFeatures::default());
    assert!(a.features().is_silence);
}

#[test]
fn low_tone_lifts_bass_most() {
    let mut a = SpectralAnalyzer::new();
    let f = feed_sine(&mut a, 100.0, 8);
    assert_eq!(a.passes(), 8);
    assert!(!f.is_silence);
    assert!(f.bass > f.mid, "{f:?}");
    assert!(f.bass > f.high, "{f:?}");
    assert!(f.bass > 0.9);
}

#[test]
fn high_tone_lifts_high_most() {
    let mut a = SpectralAnalyzer::new();
    let f = feed_sine(&mut a, 5_000.0, 8);
    assert!(f.high > f.bass, "{f:?}");
    assert!(f.high > f.mid, "{f:?}");
}

#[test]
fn silence_decays_bands_and_sets_flag() {
    let mut a = SpectralAnalyzer::new();
    feed_sine(&mut a, 100.0, 8);
    let zeros = vec![0i16; CHUNK];

    let mut prev = a.features();
    let mut silent_after = None;
    for i in 0..200 {
        let f = a.process_samples(&zeros, RATE);
        assert!(f.bass <= prev.bass && f.mid <= prev.mid && f.high <= prev.high);
        assert!(f.amplitude <= prev.amplitude);
        if f.is_silence && silent_after.is_none() {
            silent_after = Some(i);
        }
        prev = f;
    }
    assert!(silent_after.is_some(), "never reported silence");
}

#[test]
fn empty_chunk_is_a_zero_energy_step() {
    let mut a = SpectralAnalyzer::new();
    feed_sine(&mut a, 440.0, 2);
    let before = a.features();
    let passes = a.passes();

    let after = a.process_samples(&[], RATE);
    assert!(before.amplitude > 0.0);
    assert!(
        (after.amplitude - before.amplitude * 0.95).abs() < 1e-4,
        "{} -> {}",
        before.amplitude,
        after.amplitude
    );
    assert_eq!((after.bass, after.mid, after.high), (before.bass, before.mid, before.high));
    assert_eq!(a.passes(), passes);

    let odd = a.process_pcm16le(&[0x7f], RATE);
    assert!(odd.amplitude < after.amplitude);
    assert!(a.process_pcm16le(&[], RATE).amplitude < odd.amplitude);
}

#[test]
fn pcm_bytes_match_samples() {
    let samples = sine_chunk(300.0, 12_000.0, 0, CHUNK);
    let mut bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
    bytes.push(0xAA);

    let mut a = SpectralAnalyzer::new();
    let mut b = SpectralAnalyzer::new();
    assert_eq!(a.process_pcm16le(&bytes, RATE), b.process_samples(&samples, RATE));
}

#[test]
fn fft_matches_rustfft() {
    let mut rng = fastrand::Rng::with_seed(9);
    let input: Vec<Complex<f32>> = (0..FFT_SIZE)
        .map(|_| Complex::new(rng.f32() * 2.0 - 1.0, 0.0))
        .collect();

    let mut ours = input.clone();
    fft_in_place(&mut ours);

    let mut reference = input;
    FftPlanner::<f32>::new()
        .plan_fft_forward(FFT_SIZE)
        .process(&mut reference);

    for (i, (a, b)) in ours.iter().zip(&reference).enumerate() {
        assert!((a - b).norm() < 1e-2, "bin {i}: {a} vs {b}");
    }
}

#[test]
fn fft_ignores_non_power_of_two() {
    let mut buf = vec![Complex::new(1.0f32, 0.0); 12];
    fft_in_place(&mut buf);
    assert!(buf.iter().all(|c| *c == Complex::new(1.0, 0.0)));
}

proptest! {
    #[test]
    fn features_stay_in_unit_range(chunks in prop::collection::vec(
        prop::collection::vec(any::<i16>(), 0..1500), 1..12)
    ) {
        let mut a = SpectralAnalyzer::new();
        for c in &chunks {
            let f = a.process_samples(c, RATE);
            for v in [f.amplitude, f.bass, f.mid, f.high] {
                prop_assert!((0.0..=1.0).contains(&v));
            }
        }
    }
}
