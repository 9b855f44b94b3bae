use std::time::{Duration, Instant};

use anyhow::Result;
use resonant_worlds::audio::AudioFeatures;
use resonant_worlds::gesture::GestureEvent;
use resonant_worlds::orchestrator::FrameOrchestrator;
use resonant_worlds::scene::StyleId;
use resonant_worlds::world::{World, WORLDS};

struct Args {
    frames: usize,
    switch_frames: usize,
    w: usize,
    h: usize,
    seed: u64,
    touch: bool,
    ci_smoke: bool,
    quick: bool,
    max_ms: f64,
}

fn parse_args() -> Args {
    let mut args = Args {
        frames: 180,
        switch_frames: 120,
        w: 160,
        h: 88,
        seed: 7,
        touch: true,
        ci_smoke: false,
        quick: false,
        max_ms: 20.0,
    };

    let argv = std::env::args().skip(1).collect::<Vec<_>>();
    let mut i = 0usize;
    while i < argv.len() {
        let k = argv[i].as_str();
        let v = argv.get(i + 1).map(|s| s.as_str());
        match (k, v) {
            ("--frames", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.frames = n.max(1);
                }
                i += 2;
            }
            ("--switch-frames", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.switch_frames = n.max(1);
                }
                i += 2;
            }
            ("--w", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.w = n.max(1);
                }
                i += 2;
            }
            ("--h", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.h = n.max(1);
                }
                i += 2;
            }
            ("--seed", Some(x)) => {
                if let Ok(n) = x.parse::<u64>() {
                    args.seed = n;
                }
                i += 2;
            }
            ("--touch", Some(x)) => {
                if let Some(v) = parse_bool(x) {
                    args.touch = v;
                }
                i += 2;
            }
            ("--ci-smoke", Some(x)) if !x.starts_with("--") => {
                args.ci_smoke = parse_bool(x).unwrap_or(true);
                i += 2;
            }
            ("--ci-smoke", _) => {
                args.ci_smoke = true;
                i += 1;
            }
            ("--quick", Some(x)) if !x.starts_with("--") => {
                args.quick = parse_bool(x).unwrap_or(true);
                i += 2;
            }
            ("--quick", _) => {
                args.quick = true;
                i += 1;
            }
            ("--max-ms", Some(x)) => {
                if let Ok(v) = x.parse::<f64>() {
                    args.max_ms = v.max(0.1);
                }
                i += 2;
            }
            _ => {
                i += 1;
            }
        }
    }

    if args.quick {
        args.frames = args.frames.min(60);
        args.switch_frames = args.switch_frames.min(48);
    }

    args
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Slowly swelling bands with a kick every 24 frames.
fn synth_audio(step: usize) -> AudioFeatures {
    let t = step as f32 / 60.0;
    let kick = if step % 24 == 0 { 0.35 } else { 0.0 };
    let bass = (((t * 1.9).sin() * 0.5 + 0.5) * 0.8 + kick).clamp(0.0, 1.0);
    let mid = ((t * 2.8 + 0.7).sin() * 0.5 + 0.5) * 0.6;
    let high = ((t * 5.2 + 1.3).sin() * 0.5 + 0.5) * 0.5;
    let amplitude = (0.1 + bass * 0.4 + mid * 0.3 + high * 0.2).clamp(0.0, 1.0);
    AudioFeatures {
        amplitude,
        bass,
        mid,
        high,
        is_silence: false,
    }
}

fn first_world_of(style: StyleId) -> Option<&'static World> {
    WORLDS.iter().find(|w| w.style == style)
}

fn lit(px: &[u8]) -> bool {
    px.chunks_exact(4).any(|p| p[0] != 0 || p[1] != 0 || p[2] != 0)
}

/// A drag sweep across the middle of the surface, tapping at the end.
fn drive_touch(o: &mut FrameOrchestrator, f: usize, args: &Args, now: Instant) {
    let phase = f % 90;
    let x = args.w as f32 * (0.2 + 0.6 * phase as f32 / 90.0);
    let y = args.h as f32 * 0.5;
    match phase {
        0 => o.handle_gesture(GestureEvent::Press { x, y }, now),
        1..=59 => o.handle_gesture(
            GestureEvent::Drag {
                x,
                y,
                dx: 6.0,
                dy: 0.0,
            },
            now,
        ),
        60 => o.handle_gesture(GestureEvent::Release, now),
        75 => o.handle_gesture(GestureEvent::Tap { x, y }, now),
        _ => {}
    }
}

fn bench_styles(args: &Args) -> Result<()> {
    let mut total_time = Duration::ZERO;
    let mut total_frames = 0usize;
    let mut black = Vec::<&str>::new();
    let mut slow = Vec::<(&str, f64)>::new();

    println!(
        "Style benchmark: styles={} frames/style={} size={}x{} touch={} quick={}",
        StyleId::ALL.len(),
        args.frames,
        args.w,
        args.h,
        args.touch,
        args.quick
    );

    for (idx, style) in StyleId::ALL.iter().copied().enumerate() {
        let Some(world) = first_world_of(style) else {
            println!("{:>2}. {:<16} (no world)", idx, style.name());
            continue;
        };
        let mut o = FrameOrchestrator::new(args.seed, world, Duration::ZERO);
        o.resize(args.w, args.h, args.w as f32 / 1080.0);

        let start = Instant::now();
        let mut lit_frames = 0usize;
        for f in 0..args.frames {
            if args.touch {
                drive_touch(&mut o, f, args, Instant::now());
            }
            if lit(o.tick(1.0 / 60.0, &synth_audio(f))) {
                lit_frames += 1;
            }
        }

        let elapsed = start.elapsed();
        total_time += elapsed;
        total_frames += args.frames;
        let ms = elapsed.as_secs_f64() * 1000.0 / args.frames as f64;
        let (mode, _) = o.status();
        println!(
            "{:>2}. {:<16} {:>8.3} ms/frame  lit={:>3}/{}  mode={:<6} faults={}",
            idx,
            style.name(),
            ms,
            lit_frames,
            args.frames,
            mode.label(),
            o.faults()
        );
        if lit_frames == 0 || o.faults() > 0 {
            black.push(style.name());
        }
        if args.ci_smoke && ms > args.max_ms {
            slow.push((style.name(), ms));
        }
    }

    let avg_ms = total_time.as_secs_f64() * 1000.0 / total_frames.max(1) as f64;
    let fps = if avg_ms > 0.0 { 1000.0 / avg_ms } else { 0.0 };
    println!("Style summary: {:>8.3} ms/frame avg  {:>7.2} FPS", avg_ms, fps);
    bench_world_cycle(args);

    if args.ci_smoke {
        if !black.is_empty() || !slow.is_empty() {
            eprintln!("CI smoke: FAIL");
            if !black.is_empty() {
                eprintln!("  black or faulting styles: {}", black.join(", "));
            }
            for (name, ms) in slow {
                eprintln!("  slow style: {} ({:.3} ms/frame > {:.3})", name, ms, args.max_ms);
            }
            anyhow::bail!("ci smoke failed");
        }
        println!("CI smoke: PASS (max_ms={:.3})", args.max_ms);
    }
    Ok(())
}

/// Walks the whole catalog with cross-fades on, one world every 12 frames.
fn bench_world_cycle(args: &Args) {
    let mut o = FrameOrchestrator::new(args.seed, &WORLDS[0], Duration::from_millis(200));
    o.resize(args.w, args.h, args.w as f32 / 1080.0);

    let frames = args.switch_frames.max(1);
    let start = Instant::now();
    let mut switches = 0usize;
    let mut fading = 0usize;
    for f in 0..frames {
        if f > 0 && f % 12 == 0 {
            let next = &WORLDS[(f / 12) % WORLDS.len()];
            o.select_world(next);
            switches += 1;
        }
        o.tick(1.0 / 60.0, &synth_audio(f));
        if o.is_fading() {
            fading += 1;
        }
    }
    let ms = start.elapsed().as_secs_f64() * 1000.0 / frames as f64;
    println!(
        "World cycle: {:>8.3} ms/frame  switches={:>2}  fading={:>3}/{}  final={}",
        ms,
        switches,
        fading,
        frames,
        o.world().id
    );
}

fn main() -> Result<()> {
    let args = parse_args();
    bench_styles(&args)
}
