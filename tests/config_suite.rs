use clap::Parser;
use resonant_worlds::audio::{
    choose_source, ActiveSource, AtomicAudioFeatures, AudioFeatures, SourceKind, SourcePolicy,
};
use resonant_worlds::config::{AudioSource, Config, RendererMode};
use resonant_worlds::settings::{Settings, SettingsError, SettingsWatcher};
use resonant_worlds::world::{self, Category, CatalogError, WORLDS};
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "resonant_worlds_{name}_{}_{}",
        std::process::id(),
        fastrand::u64(..)
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

// ── settings ────────────────────────────────────────────────────────────────

#[test]
fn settings_defaults() {
    let s = Settings::default();
    assert_eq!(s.sensitivity, 1.0);
    assert!(s.mic_enabled);
    assert_eq!(s.selected_world, "c1");
    assert_eq!(s.calm_bias, 0.5);
    assert_eq!(Settings::parse("").unwrap(), s);
}

#[test]
fn settings_parse_clamps_and_skips_unknown_keys() {
    let s = Settings::parse(
        "# comment\n\nsensitivity = 9\nmic_enabled=off\nselected_world= n3 \ncalm_bias=-2\ntheme=dark\n",
    )
    .unwrap();
    assert_eq!(s.sensitivity, 4.0);
    assert!(!s.mic_enabled);
    assert_eq!(s.selected_world, "n3");
    assert_eq!(s.calm_bias, 0.0);
}

#[test]
fn settings_parse_reports_line_numbers() {
    let err = Settings::parse("sensitivity=1\nmic_enabled=maybe\n").unwrap_err();
    assert!(matches!(err, SettingsError::Parse { line: 2, .. }), "{err}");
    let err = Settings::parse("no equals sign").unwrap_err();
    assert!(matches!(err, SettingsError::Parse { line: 1, .. }));
    assert!(Settings::parse("selected_world=").is_err());
}

#[test]
fn settings_save_then_load() {
    let dir = scratch_dir("save");
    let path = dir.join("nested").join("settings.txt");
    let s = Settings {
        sensitivity: 1.75,
        mic_enabled: false,
        selected_world: "f4".to_string(),
        calm_bias: 0.25,
    };
    s.save(Some(&path)).unwrap();
    assert_eq!(Settings::load(Some(&path)).unwrap(), s);
    assert!(!path.with_extension("tmp").exists());
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn missing_settings_file_gives_defaults() {
    let dir = scratch_dir("missing");
    let path = dir.join("absent.txt");
    assert_eq!(Settings::load(Some(&path)).unwrap(), Settings::default());
    assert_eq!(Settings::load(None).unwrap(), Settings::default());
    Settings::default().save(None).unwrap();
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn watcher_ignores_own_writes_and_sees_external_ones() {
    let dir = scratch_dir("watch");
    let path = dir.join("settings.txt");
    let mut w = SettingsWatcher::new(Some(path.clone()), Settings::default());
    assert_eq!(w.path(), Some(path.as_path()));

    let mut local = Settings::default();
    local.sensitivity = 2.0;
    w.store(local.clone());
    assert_eq!(w.current(), &local);
    assert_eq!(w.check(), None, "own write reported as a change");

    let external = Settings {
        selected_world: "e3".to_string(),
        ..local.clone()
    };
    std::fs::write(&path, external.to_text()).unwrap();
    let file = std::fs::File::options().write(true).open(&path).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(5))
        .unwrap();
    drop(file);

    assert_eq!(w.check(), Some(external.clone()));
    assert_eq!(w.current(), &external);
    assert_eq!(w.check(), None);
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn watcher_poll_is_throttled() {
    let dir = scratch_dir("poll");
    let path = dir.join("settings.txt");
    let mut w = SettingsWatcher::new(Some(path.clone()), Settings::default());
    let t0 = Instant::now();
    assert_eq!(w.poll(t0), None);

    let external = Settings {
        calm_bias: 0.9,
        ..Settings::default()
    };
    external.save(Some(&path)).unwrap();
    assert_eq!(w.poll(t0 + Duration::from_millis(100)), None);
    assert_eq!(w.poll(t0 + Duration::from_millis(600)), Some(external));
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn watcher_without_path_never_fires() {
    let mut w = SettingsWatcher::new(None, Settings::default());
    w.store(Settings::default());
    assert_eq!(w.check(), None);
}

// ── command line ────────────────────────────────────────────────────────────

#[test]
fn cli_defaults() {
    let cfg = Config::try_parse_from(["resonant-worlds"]).unwrap();
    assert_eq!(cfg.source, AudioSource::Auto);
    assert_eq!(cfg.renderer, RendererMode::HalfBlock);
    assert_eq!(cfg.fps, 60);
    assert_eq!(cfg.crossfade_ms, 600);
    assert!(cfg.sync_updates);
    assert!(cfg.world.is_none() && cfg.seed.is_none() && cfg.sensitivity.is_none());
    assert!(!cfg.list_devices && !cfg.list_worlds);
}

#[test]
fn cli_aliases_and_values() {
    let cfg = Config::try_parse_from([
        "resonant-worlds",
        "--source",
        "music",
        "--renderer",
        "dots",
        "--world",
        "n5",
        "--seed",
        "7",
        "--sync-updates",
        "false",
    ])
    .unwrap();
    assert_eq!(cfg.source, AudioSource::Playback);
    assert_eq!(cfg.renderer, RendererMode::Braille);
    assert_eq!(cfg.world.as_deref(), Some("n5"));
    assert_eq!(cfg.seed, Some(7));
    assert!(!cfg.sync_updates);

    let cfg = Config::try_parse_from(["resonant-worlds", "--renderer", "hb", "--source", "microphone"])
        .unwrap();
    assert_eq!(cfg.renderer, RendererMode::HalfBlock);
    assert_eq!(cfg.source, AudioSource::Mic);
    assert!(Config::try_parse_from(["resonant-worlds", "--renderer", "kitty"]).is_err());
}

#[test]
fn renderer_cell_geometry() {
    assert_eq!(RendererMode::HalfBlock.pixels_per_cell(), (1, 2));
    assert_eq!(RendererMode::Braille.pixels_per_cell(), (2, 4));
}

// ── source selection ────────────────────────────────────────────────────────

#[test]
fn auto_prefers_playback_then_mic() {
    use ActiveSource::{Capturing, Silent};
    use SourceKind::{Microphone, Playback};
    assert_eq!(choose_source(AudioSource::Auto, true, true, None), Capturing(Playback));
    assert_eq!(choose_source(AudioSource::Auto, true, false, None), Capturing(Microphone));
    assert_eq!(choose_source(AudioSource::Auto, false, false, None), Silent);
    assert_eq!(
        choose_source(AudioSource::Auto, true, true, Some(Playback)),
        Capturing(Microphone)
    );
    assert_eq!(choose_source(AudioSource::Auto, false, true, Some(Playback)), Silent);
}

#[test]
fn explicit_sources_never_fall_over() {
    use ActiveSource::{Capturing, Silent};
    use SourceKind::{Microphone, Playback};
    assert_eq!(choose_source(AudioSource::Mic, true, true, None), Capturing(Microphone));
    assert_eq!(choose_source(AudioSource::Mic, false, true, None), Silent);
    assert_eq!(choose_source(AudioSource::Playback, true, false, None), Silent);
    assert_eq!(
        choose_source(AudioSource::Playback, true, true, Some(Playback)),
        Silent
    );
}

#[test]
fn source_labels() {
    assert_eq!(ActiveSource::Capturing(SourceKind::Microphone).label(), "mic");
    assert_eq!(ActiveSource::Capturing(SourceKind::Playback).label(), "playback");
    assert_eq!(ActiveSource::Silent.label(), "silent");
}

#[test]
fn switch_cooldown() {
    let mut p = SourcePolicy::new(Duration::from_secs(2));
    let t0 = Instant::now();
    assert!(p.may_switch(t0));
    p.record_switch(t0);
    assert!(!p.may_switch(t0 + Duration::from_millis(1999)));
    assert!(p.may_switch(t0 + Duration::from_secs(2)));
}

// ── features cell ───────────────────────────────────────────────────────────

#[test]
fn features_cell_round_trips_latest_value() {
    let cell = AtomicAudioFeatures::new();
    assert_eq!(cell.load(), AudioFeatures::default());
    let f = AudioFeatures {
        amplitude: 0.4,
        bass: 0.9,
        mid: 0.3,
        high: 0.1,
        is_silence: false,
    };
    cell.store(f);
    assert_eq!(cell.load(), f);
    cell.reset();
    assert_eq!(cell.load(), AudioFeatures::default());
}

#[test]
fn features_cell_is_consistent_across_threads() {
    let cell = std::sync::Arc::new(AtomicAudioFeatures::new());
    let writer = {
        let cell = cell.clone();
        std::thread::spawn(move || {
            for i in 0..2000 {
                let v = (i % 100) as f32 / 100.0;
                cell.store(AudioFeatures {
                    amplitude: v,
                    bass: v,
                    mid: v,
                    high: v,
                    is_silence: false,
                });
            }
        })
    };
    for _ in 0..2000 {
        let f = cell.load();
        assert!(f.amplitude == f.bass && f.bass == f.mid && f.mid == f.high, "torn read {f:?}");
    }
    writer.join().unwrap();
}

#[test]
fn sensitivity_scales_and_clamps() {
    let f = AudioFeatures {
        amplitude: 0.5,
        bass: 0.6,
        mid: 0.2,
        high: 0.0,
        is_silence: false,
    };
    assert_eq!(f.scaled(1.0), f);
    let up = f.scaled(2.0);
    assert_eq!(up.amplitude, 1.0);
    assert_eq!(up.bass, 1.0);
    assert!((up.mid - 0.4).abs() < 1e-6);
    assert_eq!(up.high, 0.0);
    let down = f.scaled(0.5);
    assert!((down.bass - 0.3).abs() < 1e-6);
}

// ── catalog ─────────────────────────────────────────────────────────────────

#[test]
fn catalog_has_five_worlds_per_category() {
    assert_eq!(WORLDS.len(), 30);
    for category in [
        Category::Calm,
        Category::Energetic,
        Category::Abstract,
        Category::Nature,
        Category::Fluid,
        Category::Story,
    ] {
        assert_eq!(WORLDS.iter().filter(|w| w.category == category).count(), 5);
    }
    let mut ids: Vec<_> = WORLDS.iter().map(|w| w.id).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 30);
    assert!(WORLDS.iter().all(|w| w.premium == (w.category == Category::Story)));
}

#[test]
fn lookup_is_forgiving_about_case_and_spaces() {
    assert_eq!(world::lookup(" N3 ").unwrap().name, "Rain Meadow");
    assert_eq!(
        world::lookup("z9").unwrap_err(),
        CatalogError::UnknownWorld("z9".to_string())
    );
    assert_eq!(world::world_or_default("z9").id, "c1");
}

#[test]
fn stepping_wraps_both_ways() {
    let first = &WORLDS[0];
    let last = &WORLDS[WORLDS.len() - 1];
    assert_eq!(world::step(last, true).id, first.id);
    assert_eq!(world::step(first, false).id, last.id);
    assert_eq!(world::step(first, true).id, WORLDS[1].id);
    assert_eq!(world::index_of("s5"), 29);
}
