//! Terminal mouse events to gesture events.

use crate::gesture::GestureEvent;
use crate::scene::REFERENCE_WIDTH;
use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};
use std::time::{Duration, Instant};

pub const LONG_PRESS: Duration = Duration::from_millis(500);
pub const PINCH_STEP: f32 = 1.1;

#[derive(Debug, Clone, Copy)]
struct Contact {
    started: Instant,
    x: f32,
    y: f32,
    dragged: bool,
    long_sent: bool,
}

/// Tracks one pointer and emits gestures in surface pixel coordinates.
#[derive(Debug, Clone)]
pub struct PointerTracker {
    cell_w: f32,
    cell_h: f32,
    surface_w: f32,
    visual_rows: u16,
    contact: Option<Contact>,
}

impl PointerTracker {
    /// `pixels_per_cell` is the renderer's cell geometry.
    pub fn new(pixels_per_cell: (usize, usize)) -> Self {
        Self {
            cell_w: pixels_per_cell.0.max(1) as f32,
            cell_h: pixels_per_cell.1.max(1) as f32,
            surface_w: 1.0,
            visual_rows: u16::MAX,
            contact: None,
        }
    }

    pub fn set_surface(&mut self, surface_width: usize, visual_rows: u16) {
        self.surface_w = surface_width.max(1) as f32;
        self.visual_rows = visual_rows;
    }

    pub fn is_pressed(&self) -> bool {
        self.contact.is_some()
    }

    fn to_pixels(&self, column: u16, row: u16) -> (f32, f32) {
        (
            (column as f32 + 0.5) * self.cell_w,
            (row as f32 + 0.5) * self.cell_h,
        )
    }

    pub fn handle(&mut self, ev: MouseEvent, now: Instant) -> Vec<GestureEvent> {
        let (x, y) = self.to_pixels(ev.column, ev.row);
        match ev.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                // Presses on the status line are ignored.
                if ev.row >= self.visual_rows {
                    return Vec::new();
                }
                self.contact = Some(Contact {
                    started: now,
                    x,
                    y,
                    dragged: false,
                    long_sent: false,
                });
                vec![GestureEvent::Press { x, y }]
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                let scale = REFERENCE_WIDTH / self.surface_w;
                let Some(c) = self.contact.as_mut() else {
                    return Vec::new();
                };
                let (dx, dy) = ((x - c.x) * scale, (y - c.y) * scale);
                if dx == 0.0 && dy == 0.0 {
                    return Vec::new();
                }
                c.x = x;
                c.y = y;
                c.dragged = true;
                vec![GestureEvent::Drag { x, y, dx, dy }]
            }
            MouseEventKind::Up(MouseButton::Left) => {
                let Some(c) = self.contact.take() else {
                    return Vec::new();
                };
                let mut out = vec![GestureEvent::Release];
                if !c.dragged && !c.long_sent {
                    out.push(GestureEvent::Tap { x: c.x, y: c.y });
                }
                out
            }
            MouseEventKind::ScrollUp => vec![GestureEvent::Pinch { factor: PINCH_STEP }],
            MouseEventKind::ScrollDown => vec![GestureEvent::Pinch {
                factor: 1.0 / PINCH_STEP,
            }],
            _ => Vec::new(),
        }
    }

    /// Drops the current contact; returns the release it would have sent.
    pub fn cancel(&mut self) -> Option<GestureEvent> {
        self.contact.take().map(|_| GestureEvent::Release)
    }

    /// Emits a long press once the pointer has been held still long enough.
    pub fn tick(&mut self, now: Instant) -> Option<GestureEvent> {
        let c = self.contact.as_mut()?;
        if c.long_sent || c.dragged || now.duration_since(c.started) < LONG_PRESS {
            return None;
        }
        c.long_sent = true;
        Some(GestureEvent::LongPress)
    }
}
