use crate::audio::{AtomicAudioFeatures, AudioSupervisor};
use crate::config::{Config, RendererMode};
use crate::input::PointerTracker;
use crate::orchestrator::FrameOrchestrator;
use crate::render::{renderer_for, Frame, Renderer};
use crate::settings::{settings_storage_path, Settings, SettingsWatcher};
use crate::terminal::TerminalGuard;
use crate::world::{self, World};
use anyhow::Context;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::io::BufWriter;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

pub const SENSITIVITY_STEP: f32 = 0.1;
const PAUSED_FRAME: Duration = Duration::from_millis(100);

const HELP_TEXT: &str = "resonant worlds
q / Esc     quit
<- / ->     previous / next world
p           pause / resume
m           toggle microphone
+ / -       sensitivity
h           status line
?           this help
mouse       drag, hold, click for ripples
wheel       pinch";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Quit,
    PrevWorld,
    NextWorld,
    TogglePause,
    ToggleMic,
    Sensitivity(f32),
    ToggleStatus,
    ToggleHelp,
}

pub fn action_for_key(key: KeyEvent) -> Option<Action> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Action::Quit);
    }
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => Some(Action::Quit),
        KeyCode::Left => Some(Action::PrevWorld),
        KeyCode::Right => Some(Action::NextWorld),
        KeyCode::Char('p') | KeyCode::Char('P') => Some(Action::TogglePause),
        KeyCode::Char('m') | KeyCode::Char('M') => Some(Action::ToggleMic),
        KeyCode::Char('+') | KeyCode::Char('=') | KeyCode::Up => {
            Some(Action::Sensitivity(SENSITIVITY_STEP))
        }
        KeyCode::Char('-') | KeyCode::Char('_') | KeyCode::Down => {
            Some(Action::Sensitivity(-SENSITIVITY_STEP))
        }
        KeyCode::Char('h') | KeyCode::Char('H') => Some(Action::ToggleStatus),
        KeyCode::Char('?') | KeyCode::Char('/') => Some(Action::ToggleHelp),
        _ => None,
    }
}

/// Terminal geometry split into the visual area and the status rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub cols: u16,
    pub rows: u16,
    pub status_rows: u16,
    pub visual_rows: u16,
    pub pixel_width: usize,
    pub pixel_height: usize,
}

impl Layout {
    pub fn new(size: (u16, u16), show_status: bool, mode: RendererMode) -> Self {
        let (cols, rows) = size;
        let status_rows = if show_status && rows > 1 { 1 } else { 0 };
        let visual_rows = rows.saturating_sub(status_rows).max(1);
        let (cw, ch) = mode.pixels_per_cell();
        Self {
            cols,
            rows,
            status_rows,
            visual_rows,
            pixel_width: cols as usize * cw,
            pixel_height: visual_rows as usize * ch,
        }
    }

    /// Surface pixels relative to a 1080-wide reference, for size-independent
    /// stroke widths.
    pub fn density(&self) -> f32 {
        (self.pixel_width as f32 / crate::scene::REFERENCE_WIDTH).max(0.02)
    }
}

struct Session {
    watcher: SettingsWatcher,
    sensitivity: f32,
    supervisor: AudioSupervisor,
    features: Arc<AtomicAudioFeatures>,
    orchestrator: FrameOrchestrator,
    user_paused: bool,
    focus_lost: bool,
}

impl Session {
    fn paused(&self) -> bool {
        self.user_paused || self.focus_lost
    }

    /// Applies a pause change; capture only runs while visible.
    fn set_pause(&mut self, user: bool, focus: bool, now: Instant) {
        let was = self.paused();
        self.user_paused = user;
        self.focus_lost = focus;
        match (was, self.paused()) {
            (false, true) => {
                info!("paused");
                self.supervisor.stop();
            }
            (true, false) => {
                info!("resumed");
                self.supervisor.start(now);
            }
            _ => {}
        }
    }

    /// While paused capture is stopped, so the flag is only recorded and
    /// takes effect on resume.
    fn set_mic(&mut self, on: bool, now: Instant) {
        if self.paused() {
            self.supervisor.remember_mic_enabled(on);
        } else {
            self.supervisor.set_mic_enabled(on, now);
        }
    }

    fn select_world(&mut self, next: &'static World) {
        self.orchestrator.select_world(next);
        let mut s = self.watcher.current().clone();
        s.selected_world = next.id.to_string();
        self.watcher.store(s);
    }

    fn apply(&mut self, action: Action, now: Instant) {
        match action {
            Action::PrevWorld | Action::NextWorld => {
                let next = world::step(self.orchestrator.world(), action == Action::NextWorld);
                self.select_world(next);
            }
            Action::TogglePause => {
                let focus = self.focus_lost;
                self.set_pause(!self.user_paused, focus, now);
            }
            Action::ToggleMic => {
                let mut s = self.watcher.current().clone();
                s.mic_enabled = !s.mic_enabled;
                self.set_mic(s.mic_enabled, now);
                info!(mic_enabled = s.mic_enabled, "microphone toggled");
                self.watcher.store(s);
            }
            Action::Sensitivity(delta) => {
                let mut s = self.watcher.current().clone();
                s.sensitivity = (self.sensitivity + delta).clamp(0.1, 4.0);
                self.sensitivity = s.sensitivity;
                self.watcher.store(s);
            }
            Action::Quit | Action::ToggleStatus | Action::ToggleHelp => {}
        }
    }

    /// Reacts to an external settings edit without touching unrelated state.
    fn reload(&mut self, prev: &Settings, next: &Settings, now: Instant) {
        info!("settings reloaded");
        if next.selected_world != prev.selected_world {
            self.orchestrator
                .select_world(world::world_or_default(&next.selected_world));
        }
        if next.mic_enabled != prev.mic_enabled {
            self.set_mic(next.mic_enabled, now);
        }
        if next.calm_bias != prev.calm_bias {
            self.orchestrator.set_calm_bias(next.calm_bias);
        }
        if next.sensitivity != prev.sensitivity {
            self.sensitivity = next.sensitivity;
        }
    }
}

pub fn run(cfg: Config) -> anyhow::Result<()> {
    let settings_path = cfg.settings.clone().or_else(settings_storage_path);
    let settings = Settings::load(settings_path.as_deref()).unwrap_or_else(|err| {
        warn!(error = %err, "settings unreadable, using defaults");
        Settings::default()
    });

    let start_world = match cfg.world.as_deref() {
        Some(id) => world::lookup(id).with_context(|| format!("--world {id}"))?,
        None => world::world_or_default(&settings.selected_world),
    };
    let seed = cfg.seed.unwrap_or_else(|| fastrand::u64(..));
    info!(seed, world = start_world.id, "starting");

    let now = Instant::now();
    let mut supervisor = AudioSupervisor::new(cfg.source, cfg.device.clone(), settings.mic_enabled);
    supervisor.start(now);
    let features = supervisor.features();

    let mut orchestrator = FrameOrchestrator::new(
        seed,
        start_world,
        Duration::from_millis(cfg.crossfade_ms),
    );
    orchestrator.set_calm_bias(settings.calm_bias);

    let mut session = Session {
        sensitivity: cfg
            .sensitivity
            .map(|s| s.clamp(0.1, 4.0))
            .unwrap_or(settings.sensitivity),
        watcher: SettingsWatcher::new(settings_path, settings),
        supervisor,
        features,
        orchestrator,
        user_paused: false,
        focus_lost: false,
    };

    let _term = TerminalGuard::new()?;
    let mut out = BufWriter::new(TerminalGuard::stdout());
    let mut renderer: Box<dyn Renderer> = renderer_for(cfg.renderer);

    let mut show_status = true;
    let mut show_help = false;
    let mut size = crossterm::terminal::size().context("get terminal size")?;
    if size.0 < 4 || size.1 < 2 {
        return Err(anyhow::anyhow!(
            "terminal too small (need at least 4x2, got {}x{})",
            size.0,
            size.1
        ));
    }
    let mut layout = Layout::new(size, show_status, cfg.renderer);
    let mut pointer = PointerTracker::new(cfg.renderer.pixels_per_cell());
    resize(&mut session.orchestrator, &mut pointer, &layout);

    let target = Duration::from_secs_f32(1.0 / cfg.fps.clamp(1, 240) as f32);
    let mut fps = FpsCounter::new();
    let mut last_frame = Instant::now();

    loop {
        let now = Instant::now();

        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(k) => match action_for_key(k) {
                    Some(Action::Quit) => {
                        session.supervisor.stop();
                        return Ok(());
                    }
                    Some(Action::ToggleStatus) => show_status = !show_status,
                    Some(Action::ToggleHelp) => show_help = !show_help,
                    Some(a) => session.apply(a, now),
                    None => {}
                },
                Event::Mouse(m) if !session.paused() => {
                    for g in pointer.handle(m, now) {
                        session.orchestrator.handle_gesture(g, now);
                    }
                }
                Event::FocusLost => {
                    let user = session.user_paused;
                    session.set_pause(user, true, now);
                }
                Event::FocusGained => {
                    let user = session.user_paused;
                    session.set_pause(user, false, now);
                }
                Event::Resize(c, r) => size = (c, r),
                _ => {}
            }
        }

        // Resize events can be missed by some terminals.
        size = crossterm::terminal::size().unwrap_or(size);
        let next_layout = Layout::new(size, show_status, cfg.renderer);
        if next_layout != layout {
            layout = next_layout;
            resize(&mut session.orchestrator, &mut pointer, &layout);
        }

        let held = if session.paused() {
            pointer.cancel()
        } else {
            pointer.tick(now)
        };
        if let Some(g) = held {
            session.orchestrator.handle_gesture(g, now);
        }

        let prev = session.watcher.current().clone();
        if let Some(next) = session.watcher.poll(now) {
            session.reload(&prev, &next, now);
        }

        let dt = now.duration_since(last_frame).as_secs_f32();
        last_frame = now;

        let paused = session.paused();
        if !paused {
            session.supervisor.poll(now);
            let audio = session.features.load().scaled(session.sensitivity);
            session.orchestrator.tick(dt, &audio);
            fps.tick();
        }

        let status = if layout.status_rows > 0 {
            status_line(&session, fps.fps(), paused)
        } else {
            String::new()
        };
        let frame = Frame {
            term_cols: layout.cols,
            term_rows: layout.rows,
            visual_rows: layout.visual_rows,
            pixel_width: layout.pixel_width,
            pixel_height: layout.pixel_height,
            pixels_rgba: session.orchestrator.frame().pixels(),
            status: &status,
            status_rows: layout.status_rows,
            help: show_help.then_some(HELP_TEXT),
            sync_updates: cfg.sync_updates,
        };
        renderer.render(&frame, &mut out)?;

        let pace = if paused { PAUSED_FRAME } else { target };
        let elapsed = now.elapsed();
        if elapsed < pace {
            std::thread::sleep(pace - elapsed);
        }
    }
}

fn resize(orchestrator: &mut FrameOrchestrator, pointer: &mut PointerTracker, layout: &Layout) {
    orchestrator.resize(layout.pixel_width, layout.pixel_height, layout.density());
    pointer.set_surface(layout.pixel_width, layout.visual_rows);
}

fn status_line(session: &Session, fps: f32, paused: bool) -> String {
    let o = &session.orchestrator;
    let w = o.world();
    let (mode, p) = o.status();
    let source = match session.supervisor.device_name() {
        Some(dev) => format!("{} ({dev})", session.supervisor.active().label()),
        None => session.supervisor.active().label().to_string(),
    };
    format!(
        "{} {} | {} | {} e{:.2} | spd {:.2} spawn {:.2} col {:.2} dist {:.2} scale {:.2} | {} | sens {:.1} | {}",
        w.id,
        w.name,
        w.style.name(),
        mode.label(),
        o.engine().avg_energy(),
        p.particle_speed,
        p.spawn_rate,
        p.color_intensity,
        p.distortion,
        p.master_scale,
        source,
        session.sensitivity,
        if paused {
            "paused".to_string()
        } else {
            format!("{fps:.0} fps")
        },
    )
}

pub struct FpsCounter {
    last: Instant,
    frames: u32,
    fps: f32,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
            frames: 0,
            fps: 0.0,
        }
    }

    pub fn tick(&mut self) {
        self.frames += 1;
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f32();
        if dt >= 0.5 {
            self.fps = self.frames as f32 / dt;
            self.frames = 0;
            self.last = now;
        }
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{ActiveSource, AudioFeatures};
    use crate::config::AudioSource;

    fn mic_only_session(mic_enabled: bool) -> Session {
        let settings = Settings {
            mic_enabled,
            ..Settings::default()
        };
        let supervisor = AudioSupervisor::new(AudioSource::Mic, None, mic_enabled);
        Session {
            watcher: SettingsWatcher::new(None, settings),
            sensitivity: 1.0,
            features: supervisor.features(),
            supervisor,
            orchestrator: FrameOrchestrator::new(1, &world::WORLDS[0], Duration::ZERO),
            user_paused: false,
            focus_lost: false,
        }
    }

    #[test]
    fn mic_toggled_while_paused_holds_after_resume() {
        let now = Instant::now();
        let mut s = mic_only_session(true);
        s.apply(Action::TogglePause, now);
        assert!(s.paused());

        s.apply(Action::ToggleMic, now);
        assert!(!s.watcher.current().mic_enabled);
        assert!(!s.supervisor.mic_enabled());

        s.apply(Action::TogglePause, now);
        assert!(!s.paused());
        assert_eq!(s.supervisor.active(), ActiveSource::Silent);
        assert_eq!(s.features.load(), AudioFeatures::default());
    }

    #[test]
    fn settings_reload_while_paused_reaches_the_supervisor() {
        let now = Instant::now();
        let mut s = mic_only_session(true);
        s.set_pause(false, true, now);

        let prev = s.watcher.current().clone();
        let next = Settings {
            mic_enabled: false,
            ..prev.clone()
        };
        s.reload(&prev, &next, now);
        assert!(!s.supervisor.mic_enabled());

        s.set_pause(false, false, now);
        assert_eq!(s.supervisor.active(), ActiveSource::Silent);
    }
}
