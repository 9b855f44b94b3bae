use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use resonant_worlds::app::{action_for_key, Action, Layout};
use resonant_worlds::config::RendererMode;
use resonant_worlds::gesture::GestureEvent;
use resonant_worlds::input::{PointerTracker, LONG_PRESS, PINCH_STEP};
use resonant_worlds::render::{BrailleRenderer, Frame, HalfBlockRenderer, Renderer};
use std::time::{Duration, Instant};

fn solid_pixels(w: usize, h: usize, r: u8, g: u8, b: u8) -> Vec<u8> {
    let mut buf = vec![0u8; w * h * 4];
    for px in buf.chunks_exact_mut(4) {
        px.copy_from_slice(&[r, g, b, 255]);
    }
    buf
}

fn gradient_pixels(w: usize, h: usize) -> Vec<u8> {
    let mut buf = vec![0u8; w * h * 4];
    for y in 0..h {
        for x in 0..w {
            let i = (y * w + x) * 4;
            let t = (x as f32 / w.max(1) as f32 * 255.0) as u8;
            buf[i..i + 4].copy_from_slice(&[t, 128, 255 - t, 255]);
        }
    }
    buf
}

fn make_frame<'a>(
    cols: u16,
    visual_rows: u16,
    pw: usize,
    ph: usize,
    pixels: &'a [u8],
    sync: bool,
) -> Frame<'a> {
    Frame {
        term_cols: cols,
        term_rows: visual_rows + 1,
        visual_rows,
        pixel_width: pw,
        pixel_height: ph,
        pixels_rgba: pixels,
        status: "c1 Echo Ocean | calm-tide | idle",
        status_rows: 1,
        help: None,
        sync_updates: sync,
    }
}

fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
    MouseEvent {
        kind,
        column,
        row,
        modifiers: KeyModifiers::NONE,
    }
}

// ── half-block ──────────────────────────────────────────────────────────────

#[test]
fn halfblock_renders_gradient_frame() {
    let (cols, rows) = (8u16, 4u16);
    let (pw, ph) = (cols as usize, rows as usize * 2);
    let pixels = gradient_pixels(pw, ph);
    let frame = make_frame(cols, rows, pw, ph, &pixels, true);
    let mut out = Vec::new();
    HalfBlockRenderer::new().render(&frame, &mut out).unwrap();
    let s = String::from_utf8_lossy(&out);
    assert!(s.contains("\x1b[?2026h"), "missing sync-begin");
    assert!(s.contains("\x1b[?2026l"), "missing sync-end");
    assert!(s.contains("\x1b[?7l") && s.contains("\x1b[?7h"), "autowrap not toggled");
    assert_eq!(s.matches('\u{2580}').count(), pw * rows as usize);
    assert!(s.contains("38;2;") && s.contains("48;2;"));
    assert!(s.contains("calm-tide"), "status line missing");
}

#[test]
fn halfblock_solid_frame_emits_color_once() {
    let (cols, rows) = (6u16, 3u16);
    let pixels = solid_pixels(6, 6, 10, 20, 30);
    let frame = make_frame(cols, rows, 6, 6, &pixels, false);
    let mut out = Vec::new();
    HalfBlockRenderer::new().render(&frame, &mut out).unwrap();
    let s = String::from_utf8_lossy(&out);
    assert_eq!(s.matches("38;2;10;20;30").count(), 1);
    assert!(!s.contains("\x1b[?2026h"));
}

#[test]
fn halfblock_skips_mismatched_geometry() {
    let pixels = solid_pixels(5, 5, 1, 1, 1);
    let frame = make_frame(8, 4, 5, 5, &pixels, false);
    let mut out = Vec::new();
    HalfBlockRenderer::new().render(&frame, &mut out).unwrap();
    assert!(out.is_empty());
}

#[test]
fn halfblock_reports_short_buffer() {
    let pixels = vec![0u8; 16];
    let frame = make_frame(4, 2, 4, 4, &pixels, false);
    let mut out = Vec::new();
    HalfBlockRenderer::new().render(&frame, &mut out).unwrap();
    assert!(String::from_utf8_lossy(&out).contains("pixel buffer too small"));
}

#[test]
fn renderer_names() {
    assert_eq!(HalfBlockRenderer::new().name(), "half-block");
    assert_eq!(BrailleRenderer::new().name(), "braille");
}

// ── braille ─────────────────────────────────────────────────────────────────

#[test]
fn braille_renders_dots_for_edges() {
    let (cols, rows) = (4u16, 2u16);
    let (pw, ph) = (8, 8);
    let mut pixels = solid_pixels(pw, ph, 0, 0, 0);
    // Bright left column of every cell.
    for y in 0..ph {
        for x in (0..pw).step_by(2) {
            let i = (y * pw + x) * 4;
            pixels[i..i + 3].copy_from_slice(&[250, 250, 250]);
        }
    }
    let frame = make_frame(cols, rows, pw, ph, &pixels, false);
    let mut out = Vec::new();
    BrailleRenderer::new().render(&frame, &mut out).unwrap();
    let s = String::from_utf8_lossy(&out);
    // Dots 1, 2, 3 and 7 form the left column.
    assert_eq!(s.matches('\u{2847}').count(), 8);
}

#[test]
fn braille_flat_frame_is_spaces() {
    let pixels = solid_pixels(4, 4, 90, 90, 90);
    let mut frame = make_frame(2, 1, 4, 4, &pixels, false);
    frame.status_rows = 0;
    let mut out = Vec::new();
    BrailleRenderer::new().render(&frame, &mut out).unwrap();
    let s = String::from_utf8_lossy(&out);
    assert!(!s.chars().any(|c| ('\u{2801}'..='\u{28FF}').contains(&c)));
    assert!(s.contains("48;2;90;90;90"));
}

#[test]
fn help_popup_is_drawn_over_frame() {
    let pixels = solid_pixels(20, 16, 0, 0, 0);
    let mut frame = make_frame(20, 8, 20, 16, &pixels, false);
    frame.term_rows = 9;
    frame.help = Some("keys\nq quit");
    let mut out = Vec::new();
    HalfBlockRenderer::new().render(&frame, &mut out).unwrap();
    let s = String::from_utf8_lossy(&out);
    assert!(s.contains("| q quit |"));
}

// ── layout and keys ─────────────────────────────────────────────────────────

#[test]
fn layout_reserves_status_row() {
    let l = Layout::new((80, 24), true, RendererMode::Braille);
    assert_eq!((l.status_rows, l.visual_rows), (1, 23));
    assert_eq!((l.pixel_width, l.pixel_height), (160, 92));
    let l = Layout::new((80, 24), false, RendererMode::HalfBlock);
    assert_eq!((l.status_rows, l.pixel_height), (0, 48));
}

#[test]
fn keys_map_to_actions() {
    let key = |c| KeyEvent::new(c, KeyModifiers::NONE);
    assert_eq!(action_for_key(key(KeyCode::Char('q'))), Some(Action::Quit));
    assert_eq!(action_for_key(key(KeyCode::Esc)), Some(Action::Quit));
    assert_eq!(action_for_key(key(KeyCode::Right)), Some(Action::NextWorld));
    assert_eq!(action_for_key(key(KeyCode::Left)), Some(Action::PrevWorld));
    assert_eq!(action_for_key(key(KeyCode::Char('m'))), Some(Action::ToggleMic));
    assert!(matches!(
        action_for_key(key(KeyCode::Char('-'))),
        Some(Action::Sensitivity(d)) if d < 0.0
    ));
    assert_eq!(
        action_for_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
        Some(Action::Quit)
    );
    assert_eq!(action_for_key(key(KeyCode::Char('z'))), None);
}

// ── pointer tracking ────────────────────────────────────────────────────────

#[test]
fn click_without_drag_is_a_tap() {
    let mut p = PointerTracker::new((2, 4));
    p.set_surface(160, 23);
    let now = Instant::now();
    let down = p.handle(mouse(MouseEventKind::Down(MouseButton::Left), 10, 5), now);
    assert_eq!(down, vec![GestureEvent::Press { x: 21.0, y: 22.0 }]);
    let up = p.handle(mouse(MouseEventKind::Up(MouseButton::Left), 10, 5), now);
    assert_eq!(
        up,
        vec![GestureEvent::Release, GestureEvent::Tap { x: 21.0, y: 22.0 }]
    );
}

#[test]
fn drag_scales_delta_to_reference_width() {
    let mut p = PointerTracker::new((1, 2));
    p.set_surface(108, 40);
    let now = Instant::now();
    p.handle(mouse(MouseEventKind::Down(MouseButton::Left), 10, 5), now);
    let ev = p.handle(mouse(MouseEventKind::Drag(MouseButton::Left), 12, 5), now);
    match ev.as_slice() {
        [GestureEvent::Drag { dx, dy, .. }] => {
            assert!((dx - 20.0).abs() < 1e-3, "dx={dx}");
            assert_eq!(*dy, 0.0);
        }
        other => panic!("unexpected {other:?}"),
    }
    let up = p.handle(mouse(MouseEventKind::Up(MouseButton::Left), 12, 5), now);
    assert_eq!(up, vec![GestureEvent::Release]);
}

#[test]
fn hold_becomes_long_press_once() {
    let mut p = PointerTracker::new((1, 2));
    p.set_surface(80, 23);
    let t0 = Instant::now();
    p.handle(mouse(MouseEventKind::Down(MouseButton::Left), 3, 3), t0);
    assert_eq!(p.tick(t0 + Duration::from_millis(100)), None);
    assert_eq!(p.tick(t0 + LONG_PRESS), Some(GestureEvent::LongPress));
    assert_eq!(p.tick(t0 + LONG_PRESS * 2), None);
    let up = p.handle(mouse(MouseEventKind::Up(MouseButton::Left), 3, 3), t0 + LONG_PRESS * 2);
    assert_eq!(up, vec![GestureEvent::Release]);
}

#[test]
fn scroll_is_pinch_and_status_row_ignored() {
    let mut p = PointerTracker::new((1, 2));
    p.set_surface(80, 23);
    let now = Instant::now();
    assert_eq!(
        p.handle(mouse(MouseEventKind::ScrollUp, 0, 0), now),
        vec![GestureEvent::Pinch { factor: PINCH_STEP }]
    );
    assert!(p
        .handle(mouse(MouseEventKind::Down(MouseButton::Left), 5, 23), now)
        .is_empty());
    assert!(!p.is_pressed());
}

#[test]
fn cancel_releases_a_held_contact_once() {
    let mut p = PointerTracker::new((1, 2));
    p.set_surface(80, 23);
    let t0 = Instant::now();
    p.handle(mouse(MouseEventKind::Down(MouseButton::Left), 3, 3), t0);
    assert_eq!(p.cancel(), Some(GestureEvent::Release));
    assert!(!p.is_pressed());
    assert_eq!(p.cancel(), None);
    assert_eq!(p.tick(t0 + LONG_PRESS * 2), None, "no long press after cancel");
    let up = p.handle(mouse(MouseEventKind::Up(MouseButton::Left), 3, 3), t0 + LONG_PRESS);
    assert!(up.is_empty(), "stray release must not tap");
}
