use super::{AtomicAudioFeatures, SourceKind, SpectralAnalyzer};
use anyhow::{anyhow, Context};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Sample, SampleFormat};
use ringbuf::traits::{Consumer as _, Producer as _, Split as _};
use ringbuf::HeapRb;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Samples handed to the analyzer per chunk.
const CHUNK: usize = 512;

/// Rates tried in order when a device has no usable default config.
const PREFERRED_RATES: [u32; 6] = [44_100, 48_000, 22_050, 16_000, 11_025, 8_000];

/// Name fragments that identify an input device carrying system playback.
pub(crate) const MONITOR_HINTS: [&str; 4] = ["monitor", "loopback", "stereo mix", "blackhole"];

pub fn list_input_devices() -> anyhow::Result<()> {
    let host = cpal::default_host();
    let devices = host
        .input_devices()
        .context("enumerate input devices")?;

    let mut out = io::stdout();
    writeln!(out, "Input devices:")?;
    for dev in devices {
        let name = dev.name().unwrap_or_else(|_| "<unknown>".to_string());
        let tag = if is_monitor_name(&name) { "  (playback)" } else { "" };
        writeln!(out, "  - {}{}", name, tag)?;
    }
    Ok(())
}

pub(crate) fn is_monitor_name(name: &str) -> bool {
    let n = name.to_lowercase();
    MONITOR_HINTS.iter().any(|h| n.contains(h))
}

/// A running input stream plus the analyzer thread that consumes it.
pub struct AudioCapture {
    stream: Option<cpal::Stream>,
    stop: Arc<AtomicBool>,
    failed: Arc<AtomicBool>,
    analyzer_handle: Option<thread::JoinHandle<()>>,
    kind: SourceKind,
    device_name: String,
    pub sample_rate_hz: u32,
}

impl AudioCapture {
    pub fn start(
        kind: SourceKind,
        device_query: Option<&str>,
        features: Arc<AtomicAudioFeatures>,
    ) -> anyhow::Result<Self> {
        let host = cpal::default_host();
        let device = match kind {
            SourceKind::Microphone => select_mic_input_device(&host, device_query)?,
            SourceKind::Playback => select_playback_device(&host)?,
        };
        let device_name = device.name().unwrap_or_else(|_| "<unknown>".to_string());
        let supported = pick_input_config(&device)?;
        let sample_rate_hz = supported.sample_rate().0;
        let channels = supported.channels() as usize;
        let config: cpal::StreamConfig = supported.clone().into();

        let rb_capacity = (sample_rate_hz as usize).saturating_mul(2);
        let rb = HeapRb::<f32>::new(rb_capacity);
        let (mut prod, mut cons) = rb.split();

        let stop = Arc::new(AtomicBool::new(false));
        let failed = Arc::new(AtomicBool::new(false));
        let stop_for_thread = Arc::clone(&stop);
        let failed_for_err = Arc::clone(&failed);

        let err_fn = move |err: cpal::StreamError| {
            warn!(error = %err, "audio stream error");
            failed_for_err.store(true, Ordering::Relaxed);
        };

        let stream = match supported.sample_format() {
            SampleFormat::F32 => device.build_input_stream(
                &config,
                move |data: &[f32], _| push_interleaved(data, channels, &mut prod),
                err_fn,
                None,
            )?,
            SampleFormat::I16 => device.build_input_stream(
                &config,
                move |data: &[i16], _| push_interleaved(data, channels, &mut prod),
                err_fn,
                None,
            )?,
            SampleFormat::U16 => device.build_input_stream(
                &config,
                move |data: &[u16], _| push_interleaved(data, channels, &mut prod),
                err_fn,
                None,
            )?,
            fmt => return Err(anyhow!("unsupported sample format: {fmt:?}")),
        };

        stream.play().context("start input stream")?;

        let analyzer_handle = thread::Builder::new()
            .name("audio-analyzer".to_string())
            .spawn(move || analyze_loop(&mut cons, sample_rate_hz, &stop_for_thread, &features))
            .context("spawn analyzer thread")?;

        info!(?kind, device = %device_name, sample_rate_hz, channels, "audio capture started");

        Ok(Self {
            stream: Some(stream),
            stop,
            failed,
            analyzer_handle: Some(analyzer_handle),
            kind,
            device_name,
            sample_rate_hz,
        })
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// True once the device reported a stream error.
    pub fn has_failed(&self) -> bool {
        self.failed.load(Ordering::Relaxed)
    }
}

impl Drop for AudioCapture {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(h) = self.analyzer_handle.take() {
            let _ = h.join();
        }
        if let Some(stream) = self.stream.take() {
            let _ = stream.pause();
        }
        debug!(kind = ?self.kind, device = %self.device_name, "audio capture stopped");
    }
}

fn select_mic_input_device(
    host: &cpal::Host,
    device_query: Option<&str>,
) -> anyhow::Result<cpal::Device> {
    let devices = host
        .input_devices()
        .context("enumerate input devices")?
        .collect::<Vec<_>>();

    let want = device_query.map(|s| s.to_lowercase());
    if let Some(want) = want.as_deref() {
        if let Some(dev) = devices.iter().find(|d| {
            d.name()
                .map(|n| n.to_lowercase().contains(want))
                .unwrap_or(false)
        }) {
            return Ok(dev.clone());
        }
        return Err(anyhow!("no input device matching: {want}"));
    }

    host.default_input_device()
        .ok_or_else(|| anyhow!("no default input device found"))
}

fn select_playback_device(host: &cpal::Host) -> anyhow::Result<cpal::Device> {
    host.input_devices()
        .context("enumerate input devices")?
        .find(|d| d.name().map(|n| is_monitor_name(&n)).unwrap_or(false))
        .ok_or_else(|| anyhow!("no playback monitor device found"))
}

/// True when some input device looks like a playback monitor.
pub(crate) fn playback_device_present() -> bool {
    let host = cpal::default_host();
    select_playback_device(&host).is_ok()
}

fn pick_input_config(device: &cpal::Device) -> anyhow::Result<cpal::SupportedStreamConfig> {
    if let Ok(cfg) = device.default_input_config() {
        return Ok(cfg);
    }
    let ranges = device
        .supported_input_configs()
        .context("query supported input configs")?
        .collect::<Vec<_>>();
    for rate in PREFERRED_RATES {
        if let Some(range) = ranges.iter().find(|r| {
            r.min_sample_rate().0 <= rate && rate <= r.max_sample_rate().0
        }) {
            return Ok(range.clone().with_sample_rate(cpal::SampleRate(rate)));
        }
    }
    Err(anyhow!("device supports none of the preferred sample rates"))
}

fn push_interleaved<T: Sample<Float = f32> + Copy>(
    data: &[T],
    channels: usize,
    prod: &mut ringbuf::HeapProd<f32>,
) {
    let channels = channels.max(1);
    for frame in data.chunks(channels) {
        let mut acc = 0.0f32;
        for s in frame {
            acc += (*s).to_float_sample();
        }
        let mono = acc / channels as f32;
        let _ = prod.try_push(mono);
    }
}

fn analyze_loop(
    cons: &mut ringbuf::HeapCons<f32>,
    sample_rate_hz: u32,
    stop: &AtomicBool,
    features: &AtomicAudioFeatures,
) {
    let mut analyzer = SpectralAnalyzer::new();
    let mut chunk = Vec::with_capacity(CHUNK);

    while !stop.load(Ordering::Relaxed) {
        let mut got_any = false;
        while let Some(s) = cons.try_pop() {
            got_any = true;
            chunk.push(s);
            if chunk.len() == CHUNK {
                features.store(analyzer.process_f32(&chunk, sample_rate_hz));
                chunk.clear();
            }
        }

        if !got_any {
            thread::sleep(Duration::from_millis(1));
        }
    }
}
