use super::capture::playback_device_present;
use super::{AtomicAudioFeatures, AudioCapture};
use crate::config::AudioSource;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Minimum spacing between two source switches.
pub const SWITCH_COOLDOWN: Duration = Duration::from_millis(2000);
/// Playback that stays silent this long hands over to the microphone.
const PLAYBACK_SILENCE_LIMIT: Duration = Duration::from_secs(8);
/// While on the microphone in auto mode, how often playback is retried.
const PLAYBACK_RETRY: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Microphone,
    Playback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveSource {
    Capturing(SourceKind),
    Silent,
}

impl ActiveSource {
    pub fn label(self) -> &'static str {
        match self {
            Self::Capturing(SourceKind::Microphone) => "mic",
            Self::Capturing(SourceKind::Playback) => "playback",
            Self::Silent => "silent",
        }
    }
}

/// Rate limiter for source switches.
#[derive(Debug, Clone)]
pub struct SourcePolicy {
    cooldown: Duration,
    last_switch: Option<Instant>,
}

impl SourcePolicy {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_switch: None,
        }
    }

    pub fn may_switch(&self, now: Instant) -> bool {
        match self.last_switch {
            None => true,
            Some(t) => now.saturating_duration_since(t) >= self.cooldown,
        }
    }

    pub fn record_switch(&mut self, now: Instant) {
        self.last_switch = Some(now);
    }
}

impl Default for SourcePolicy {
    fn default() -> Self {
        Self::new(SWITCH_COOLDOWN)
    }
}

/// Picks the source to open. `avoid` names a source that just failed or went
/// quiet; it is only chosen when nothing else is allowed.
pub fn choose_source(
    preference: AudioSource,
    mic_enabled: bool,
    playback_present: bool,
    avoid: Option<SourceKind>,
) -> ActiveSource {
    let mut candidates: Vec<SourceKind> = Vec::with_capacity(2);
    match preference {
        AudioSource::Auto => {
            if playback_present {
                candidates.push(SourceKind::Playback);
            }
            if mic_enabled {
                candidates.push(SourceKind::Microphone);
            }
        }
        AudioSource::Playback => {
            if playback_present {
                candidates.push(SourceKind::Playback);
            }
        }
        AudioSource::Mic => {
            if mic_enabled {
                candidates.push(SourceKind::Microphone);
            }
        }
    }

    if let Some(avoid) = avoid {
        if let Some(other) = candidates.iter().copied().find(|k| *k != avoid) {
            return ActiveSource::Capturing(other);
        }
        return ActiveSource::Silent;
    }
    candidates
        .first()
        .copied()
        .map(ActiveSource::Capturing)
        .unwrap_or(ActiveSource::Silent)
}

/// Owns the live capture and moves between microphone, playback and silence.
/// The features cell outlives every capture so readers never need re-wiring.
pub struct AudioSupervisor {
    preference: AudioSource,
    device_query: Option<String>,
    mic_enabled: bool,
    features: Arc<AtomicAudioFeatures>,
    capture: Option<AudioCapture>,
    active: ActiveSource,
    policy: SourcePolicy,
    silent_since: Option<Instant>,
    last_attempt: Option<Instant>,
}

impl AudioSupervisor {
    pub fn new(preference: AudioSource, device_query: Option<String>, mic_enabled: bool) -> Self {
        Self {
            preference,
            device_query,
            mic_enabled,
            features: Arc::new(AtomicAudioFeatures::new()),
            capture: None,
            active: ActiveSource::Silent,
            policy: SourcePolicy::default(),
            silent_since: None,
            last_attempt: None,
        }
    }

    pub fn features(&self) -> Arc<AtomicAudioFeatures> {
        Arc::clone(&self.features)
    }

    pub fn active(&self) -> ActiveSource {
        self.active
    }

    pub fn device_name(&self) -> Option<&str> {
        self.capture.as_ref().map(|c| c.device_name())
    }

    pub fn start(&mut self, now: Instant) {
        let pick = choose_source(
            self.preference,
            self.mic_enabled,
            self.playback_present(),
            None,
        );
        self.open(pick, now);
    }

    /// Device probing is skipped when playback can never be chosen.
    fn playback_present(&self) -> bool {
        self.preference != AudioSource::Mic && playback_device_present()
    }

    pub fn mic_enabled(&self) -> bool {
        self.mic_enabled
    }

    /// Records the flag without touching capture; the next `start` honours it.
    pub fn remember_mic_enabled(&mut self, on: bool) {
        self.mic_enabled = on;
    }

    pub fn stop(&mut self) {
        self.capture = None;
        self.active = ActiveSource::Silent;
        self.silent_since = None;
        self.features.reset();
    }

    pub fn set_mic_enabled(&mut self, on: bool, now: Instant) {
        if self.mic_enabled == on {
            return;
        }
        self.mic_enabled = on;
        let mic_live = self.active == ActiveSource::Capturing(SourceKind::Microphone);
        if (!on && mic_live) || (on && self.active == ActiveSource::Silent) {
            self.stop();
            self.start(now);
        }
    }

    /// Called once per frame; reacts to stream failures, prolonged playback
    /// silence and periodic playback retries, all behind the cooldown.
    pub fn poll(&mut self, now: Instant) {
        if !self.policy.may_switch(now) {
            return;
        }

        let failed = self.capture.as_ref().is_some_and(|c| c.has_failed());
        if failed {
            let avoid = self.capture.as_ref().map(|c| c.kind());
            warn!(source = self.active.label(), "audio source failed, falling back");
            self.capture = None;
            let pick = choose_source(
                self.preference,
                self.mic_enabled,
                self.playback_present(),
                avoid,
            );
            self.open(pick, now);
            return;
        }

        match self.active {
            ActiveSource::Capturing(SourceKind::Playback) => {
                let silent = self.features.load().is_silence;
                if !silent {
                    self.silent_since = None;
                    return;
                }
                let since = *self.silent_since.get_or_insert(now);
                if self.preference == AudioSource::Auto
                    && self.mic_enabled
                    && now.saturating_duration_since(since) >= PLAYBACK_SILENCE_LIMIT
                {
                    info!("playback silent, switching to microphone");
                    self.capture = None;
                    self.open(ActiveSource::Capturing(SourceKind::Microphone), now);
                }
            }
            ActiveSource::Capturing(SourceKind::Microphone) => {
                if self.preference != AudioSource::Auto || !self.retry_due(now) {
                    return;
                }
                if playback_device_present() {
                    self.capture = None;
                    self.open(ActiveSource::Capturing(SourceKind::Playback), now);
                } else {
                    self.last_attempt = Some(now);
                }
            }
            ActiveSource::Silent => {
                if self.retry_due(now) {
                    self.start(now);
                }
            }
        }
    }

    fn retry_due(&self, now: Instant) -> bool {
        self.last_attempt
            .is_none_or(|t| now.saturating_duration_since(t) >= PLAYBACK_RETRY)
    }

    fn open(&mut self, pick: ActiveSource, now: Instant) {
        self.last_attempt = Some(now);
        self.policy.record_switch(now);
        self.silent_since = None;

        let ActiveSource::Capturing(kind) = pick else {
            self.active = ActiveSource::Silent;
            self.features.reset();
            return;
        };

        match AudioCapture::start(kind, self.device_query.as_deref(), self.features()) {
            Ok(c) => {
                self.capture = Some(c);
                self.active = pick;
            }
            Err(err) => {
                warn!(?kind, error = %err, "audio source unavailable");
                let other = choose_source(
                    self.preference,
                    self.mic_enabled,
                    kind != SourceKind::Playback && self.playback_present(),
                    Some(kind),
                );
                let fallback = match other {
                    ActiveSource::Capturing(k) => {
                        AudioCapture::start(k, self.device_query.as_deref(), self.features())
                            .map_err(|e| warn!(kind = ?k, error = %e, "fallback source unavailable"))
                            .ok()
                    }
                    ActiveSource::Silent => None,
                };
                match fallback {
                    Some(c) => {
                        self.active = ActiveSource::Capturing(c.kind());
                        self.capture = Some(c);
                    }
                    None => {
                        self.active = ActiveSource::Silent;
                        self.features.reset();
                    }
                }
            }
        }
        info!(source = self.active.label(), "audio source selected");
    }
}
