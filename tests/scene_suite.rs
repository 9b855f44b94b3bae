use resonant_worlds::audio::AudioFeatures;
use resonant_worlds::behavior::VisualParameters;
use resonant_worlds::gesture::GestureState;
use resonant_worlds::overlay::{RippleField, RIPPLE_FADE, RIPPLE_START_ALPHA};
use resonant_worlds::scene::{ProceduralRenderer, StyleId, Surface};

const W: usize = 96;
const H: usize = 64;

fn has_non_black(px: &[u8]) -> bool {
    px.chunks_exact(4).any(|p| p[0] > 0 || p[1] > 0 || p[2] > 0)
}

fn loud() -> AudioFeatures {
    AudioFeatures {
        amplitude: 0.6,
        bass: 0.8,
        mid: 0.5,
        high: 0.4,
        is_silence: false,
    }
}

fn renderer(style: StyleId) -> ProceduralRenderer {
    let mut r = ProceduralRenderer::new(42);
    r.set_viewport(W, H, W as f32 / 1080.0);
    r.set_palette([0x00, 0xE5, 0xFF]);
    r.activate_style(style);
    r
}

fn run(r: &mut ProceduralRenderer, frames: usize, gesture: &GestureState) {
    let params = VisualParameters::default();
    for _ in 0..frames {
        r.update(1.0 / 60.0, &loud(), gesture, &params);
    }
}

#[test]
fn every_style_keeps_a_constant_population() {
    for style in StyleId::ALL {
        let mut r = renderer(style);
        assert_eq!(r.population(), style.population(), "{}", style.name());
        assert!((8..=60).contains(&r.population()), "{}", style.name());
        run(&mut r, 240, &GestureState::default());
        assert_eq!(r.population(), style.population(), "{}", style.name());
    }
}

#[test]
fn reseeds_exactly_once_per_new_style() {
    let mut r = ProceduralRenderer::new(1);
    assert_eq!(r.activations(), 0);
    assert!(r.activate_style(StyleId::CalmTide));
    assert!(!r.activate_style(StyleId::CalmTide));
    assert_eq!(r.activations(), 1);

    r.set_viewport(W, H, 0.1);
    run(&mut r, 10, &GestureState::default());
    let before = r.motes().to_vec();
    assert!(!r.activate_style(StyleId::CalmTide));
    assert_eq!(r.motes(), before.as_slice(), "same id must not reseed");

    assert!(r.activate_style(StyleId::FireflyField));
    assert_eq!(r.activations(), 2);
    assert_eq!(r.style(), Some(StyleId::FireflyField));
    assert_eq!(r.population(), StyleId::FireflyField.population());
}

#[test]
fn every_style_paints_a_visible_frame() {
    for style in StyleId::ALL {
        let mut r = renderer(style);
        run(&mut r, 30, &GestureState::default());
        let mut s = Surface::new(W, H);
        r.render(&mut s);
        assert!(has_non_black(s.pixels()), "{} rendered black", style.name());
        assert!(s.pixels().chunks_exact(4).all(|p| p[3] == 255));
    }
}

#[test]
fn rendering_into_an_empty_surface_is_a_no_op() {
    let mut r = renderer(StyleId::NeonPlasma);
    run(&mut r, 5, &GestureState::default());
    let mut s = Surface::new(0, 0);
    r.render(&mut s);
    assert!(s.pixels().is_empty());
}

#[test]
fn same_seed_same_motion() {
    let mut a = renderer(StyleId::WindValley);
    let mut b = renderer(StyleId::WindValley);
    run(&mut a, 90, &GestureState::default());
    run(&mut b, 90, &GestureState::default());
    assert_eq!(a.motes(), b.motes());
}

#[test]
fn swipes_move_the_population() {
    let swipe = GestureState {
        velocity_x: 900.0,
        velocity_y: 900.0,
        ..GestureState::default()
    };
    for style in [
        StyleId::LiquidDream,
        StyleId::LiquidMarble,
        StyleId::ForestLight,
        StyleId::RainMeadow,
        StyleId::WindValley,
        StyleId::AuroraSky,
        StyleId::StoryBeacon,
    ] {
        let mut still = renderer(style);
        let mut pushed = renderer(style);
        run(&mut still, 60, &GestureState::default());
        run(&mut pushed, 60, &swipe);
        assert_ne!(still.motes(), pushed.motes(), "{} ignored the swipe", style.name());
    }
}

#[test]
fn aurora_stars_drift_but_stay_in_the_sky() {
    let mut r = renderer(StyleId::AuroraSky);
    let start = r.motes().to_vec();
    run(&mut r, 120, &GestureState::default());
    let moved = r
        .motes()
        .iter()
        .zip(&start)
        .filter(|(a, b)| (a.x - b.x).abs() + (a.y - b.y).abs() > 1e-4)
        .count();
    assert_eq!(moved, start.len(), "every star should drift");
    assert!(r
        .motes()
        .iter()
        .all(|m| (0.0..=1.0).contains(&m.x) && (0.0..=0.7).contains(&m.y)));
}

#[test]
fn extreme_dt_is_clamped() {
    let mut r = renderer(StyleId::CalmTide);
    let params = VisualParameters::default();
    let g = GestureState::default();
    r.update(10.0, &loud(), &g, &params);
    r.update(f32::NAN, &loud(), &g, &params);
    assert!(r.clock() <= 0.05 * 4.0);
    assert!(r
        .motes()
        .iter()
        .all(|m| m.x.is_finite() && m.y.is_finite()));
}

// ── ripples ─────────────────────────────────────────────────────────────────

#[test]
fn ripple_fades_strictly_and_disappears_in_time() {
    let mut field = RippleField::new(1.0);
    field.spawn(10.0, 10.0);
    let bound = (RIPPLE_START_ALPHA / RIPPLE_FADE).ceil() as usize;
    assert_eq!(bound, 23);

    let mut last_alpha = f32::INFINITY;
    let mut last_radius = -1.0;
    let mut ticks = 0;
    loop {
        let Some(r) = field.iter().next().copied() else {
            break;
        };
        assert!(r.alpha < last_alpha, "alpha must strictly decrease");
        assert!(r.radius > last_radius);
        last_alpha = r.alpha;
        last_radius = r.radius;
        field.tick();
        ticks += 1;
        assert!(ticks <= bound, "ripple outlived {bound} ticks");
    }
    assert!(field.is_empty());
}

#[test]
fn ripple_growth_scales_with_density() {
    let mut field = RippleField::new(0.5);
    field.spawn(0.0, 0.0);
    field.tick();
    let r = field.iter().next().copied().unwrap();
    assert_eq!(r.radius, 10.0);
    assert_eq!(r.alpha, RIPPLE_START_ALPHA - RIPPLE_FADE);
}

#[test]
fn ripple_field_drops_oldest_when_full() {
    let mut field = RippleField::new(1.0);
    for i in 0..40 {
        field.spawn(i as f32, 0.0);
    }
    assert_eq!(field.len(), 32);
    assert_eq!(field.iter().next().map(|r| r.x), Some(8.0));
}

#[test]
fn ripple_paints_a_ring() {
    let mut field = RippleField::new(1.0);
    let mut s = Surface::new(64, 64);
    field.spawn(32.0, 32.0);
    field.tick();
    field.paint(&mut s, [255, 255, 255]);
    assert!(has_non_black(s.pixels()));
    assert_eq!(s.pixel(32, 32), [0, 0, 0, 255], "ring center stays clear");
}
