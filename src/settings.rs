use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};
use thiserror::Error;
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub sensitivity: f32,
    pub mic_enabled: bool,
    pub selected_world: String,
    pub calm_bias: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sensitivity: 1.0,
            mic_enabled: true,
            selected_world: "c1".to_string(),
            calm_bias: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    Io(String),
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
}

impl Settings {
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let text = match std::fs::read_to_string(path) {
            Ok(v) => v,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(SettingsError::Io(err.to_string())),
        };
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, SettingsError> {
        let mut s = Self::default();
        for (line_idx, raw) in text.lines().enumerate() {
            let line_no = line_idx + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key_raw, value_raw)) = line.split_once('=') else {
                return Err(SettingsError::Parse {
                    line: line_no,
                    message: "expected <key>=<value>".to_string(),
                });
            };
            let key = key_raw.trim();
            let value = value_raw.trim();
            let bad = |message: &str| SettingsError::Parse {
                line: line_no,
                message: message.to_string(),
            };
            match key {
                "sensitivity" => {
                    let v = parse_f32(value).ok_or_else(|| bad("sensitivity must be a number"))?;
                    s.sensitivity = v.clamp(0.1, 4.0);
                }
                "mic_enabled" => {
                    s.mic_enabled =
                        parse_bool(value).ok_or_else(|| bad("mic_enabled must be true/false"))?;
                }
                "selected_world" => {
                    if value.is_empty() {
                        return Err(bad("selected_world must not be empty"));
                    }
                    s.selected_world = value.to_string();
                }
                "calm_bias" => {
                    let v = parse_f32(value).ok_or_else(|| bad("calm_bias must be a number"))?;
                    s.calm_bias = v.clamp(0.0, 1.0);
                }
                _ => {}
            }
        }
        Ok(s)
    }

    pub fn to_text(&self) -> String {
        format!(
            "# resonant_worlds settings v1\nsensitivity={:.2}\nmic_enabled={}\nselected_world={}\ncalm_bias={:.2}\n",
            self.sensitivity,
            if self.mic_enabled { "true" } else { "false" },
            self.selected_world,
            self.calm_bias,
        )
    }

    pub fn save(&self, path: Option<&Path>) -> Result<(), SettingsError> {
        let Some(path) = path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SettingsError::Io(e.to_string()))?;
        }
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, self.to_text()).map_err(|e| SettingsError::Io(e.to_string()))?;
        std::fs::rename(&tmp, path).map_err(|e| SettingsError::Io(e.to_string()))
    }
}

pub fn settings_storage_path() -> Option<PathBuf> {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg.trim().is_empty() {
            return Some(PathBuf::from(xdg).join("resonant_worlds").join("settings.txt"));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("resonant_worlds")
            .join("settings.txt"),
    )
}

/// Re-reads the settings file when its modification time changes.
pub struct SettingsWatcher {
    path: Option<PathBuf>,
    current: Settings,
    mtime: Option<SystemTime>,
    last_check: Option<Instant>,
}

impl SettingsWatcher {
    pub fn new(path: Option<PathBuf>, current: Settings) -> Self {
        let mtime = path.as_deref().and_then(modified);
        Self {
            path,
            current,
            mtime,
            last_check: None,
        }
    }

    pub fn current(&self) -> &Settings {
        &self.current
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Persists a locally edited snapshot and remembers its mtime so the
    /// write is not reported back as an external change.
    pub fn store(&mut self, next: Settings) {
        if let Err(err) = next.save(self.path.as_deref()) {
            warn!(error = %err, "could not save settings");
        }
        self.mtime = self.path.as_deref().and_then(modified);
        self.current = next;
    }

    /// Returns the new snapshot when the file changed on disk.
    pub fn poll(&mut self, now: Instant) -> Option<Settings> {
        if self
            .last_check
            .is_some_and(|t| now.saturating_duration_since(t) < POLL_INTERVAL)
        {
            return None;
        }
        self.last_check = Some(now);
        self.check()
    }

    /// Unthrottled variant of [`poll`](Self::poll).
    pub fn check(&mut self) -> Option<Settings> {
        let path = self.path.as_deref()?;
        let mtime = modified(path);
        if mtime == self.mtime {
            return None;
        }
        self.mtime = mtime;
        match Settings::load(Some(path)) {
            Ok(next) if next != self.current => {
                debug!(?next, "settings changed on disk");
                self.current = next.clone();
                Some(next)
            }
            Ok(_) => None,
            Err(err) => {
                warn!(error = %err, "ignoring unreadable settings file");
                None
            }
        }
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_f32(raw: &str) -> Option<f32> {
    raw.trim().parse::<f32>().ok().filter(|v| v.is_finite())
}
