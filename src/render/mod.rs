//! Cell encoders that turn the RGBA surface into ANSI output.

mod braille;
mod halfblock;

pub use braille::BrailleRenderer;
pub use halfblock::HalfBlockRenderer;

use crate::config::RendererMode;
use std::io::Write;

pub struct Frame<'a> {
    pub term_cols: u16,
    pub term_rows: u16,
    pub visual_rows: u16,
    pub pixel_width: usize,
    pub pixel_height: usize,
    pub pixels_rgba: &'a [u8],
    pub status: &'a str,
    pub status_rows: u16,
    pub help: Option<&'a str>,
    pub sync_updates: bool,
}

pub trait Renderer {
    fn name(&self) -> &'static str;
    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()>;
}

pub fn renderer_for(mode: RendererMode) -> Box<dyn Renderer> {
    match mode {
        RendererMode::HalfBlock => Box::new(HalfBlockRenderer::new()),
        RendererMode::Braille => Box::new(BrailleRenderer::new()),
    }
}

/// Remembers the last SGR colors so unchanged runs are not re-emitted.
#[derive(Debug, Default)]
pub(crate) struct ColorState {
    fg: Option<[u8; 3]>,
    bg: Option<[u8; 3]>,
}

impl ColorState {
    pub(crate) fn reset(&mut self) {
        self.fg = None;
        self.bg = None;
    }

    pub(crate) fn set(&mut self, out: &mut dyn Write, fg: [u8; 3], bg: [u8; 3]) -> std::io::Result<()> {
        if self.fg != Some(fg) {
            write!(out, "\x1b[38;2;{};{};{}m", fg[0], fg[1], fg[2])?;
            self.fg = Some(fg);
        }
        if self.bg != Some(bg) {
            write!(out, "\x1b[48;2;{};{};{}m", bg[0], bg[1], bg[2])?;
            self.bg = Some(bg);
        }
        Ok(())
    }
}

/// Checks the surface matches the cell grid. Returns false when there is
/// nothing to draw; a short buffer gets a message instead of a frame.
pub(crate) fn check_geometry(
    frame: &Frame<'_>,
    cell: (usize, usize),
    out: &mut dyn Write,
) -> anyhow::Result<bool> {
    let cols = frame.term_cols as usize;
    let rows = frame.visual_rows as usize;
    let (w, h) = (frame.pixel_width, frame.pixel_height);
    if cols == 0 || rows == 0 || w == 0 || h == 0 {
        return Ok(false);
    }
    if w != cols * cell.0 || h != rows * cell.1 {
        return Ok(false);
    }
    let need = w * h * 4;
    if frame.pixels_rgba.len() < need {
        begin(frame, out)?;
        out.write_all(b"\x1b[2J")?;
        write!(
            out,
            "pixel buffer too small (need {}, got {})",
            need,
            frame.pixels_rgba.len()
        )?;
        finish(frame, out)?;
        return Ok(false);
    }
    Ok(true)
}

pub(crate) fn begin(frame: &Frame<'_>, out: &mut dyn Write) -> std::io::Result<()> {
    if frame.sync_updates {
        out.write_all(b"\x1b[?2026h")?;
    }
    // Autowrap off while full-width rows are painted.
    out.write_all(b"\x1b[H\x1b[0m\x1b[?7l")
}

/// Status rows, optional help popup, then autowrap back on.
pub(crate) fn finish(frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
    let cols = frame.term_cols as usize;
    let mut lines = frame.status.lines();
    for i in 0..frame.status_rows as usize {
        write!(out, "\x1b[{};1H\x1b[0m\x1b[2K", frame.visual_rows as usize + i + 1)?;
        if let Some(line) = lines.next() {
            let clipped: String = line.chars().take(cols).collect();
            write!(out, "\x1b[38;2;200;208;222m{clipped}\x1b[0m")?;
        }
    }
    if let Some(text) = frame.help {
        draw_help_popup(out, frame.term_cols, frame.term_rows, text)?;
    }
    out.write_all(b"\x1b[?7h")?;
    if frame.sync_updates {
        out.write_all(b"\x1b[?2026l")?;
    }
    out.flush()?;
    Ok(())
}

/// Centered box over the frame; the first line is the title.
pub fn draw_help_popup(
    out: &mut dyn Write,
    term_cols: u16,
    term_rows: u16,
    text: &str,
) -> anyhow::Result<()> {
    let cols = term_cols as usize;
    let rows = term_rows as usize;
    if text.trim().is_empty() || cols < 8 || rows < 4 {
        return Ok(());
    }

    let max_inner = cols.saturating_sub(6).max(1);
    let lines: Vec<String> = text
        .lines()
        .map(|l| l.chars().take(max_inner).collect())
        .collect();
    let inner_w = lines
        .iter()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0)
        .clamp(1, max_inner);
    let box_w = inner_w + 4;
    let body_h = lines.len().min(rows.saturating_sub(3).max(1));
    let box_h = body_h + 2;
    let col0 = cols.saturating_sub(box_w) / 2 + 1;
    let row0 = rows.saturating_sub(box_h) / 2 + 1;
    let horiz = "-".repeat(box_w - 2);

    out.write_all(b"\x1b[0m\x1b[38;2;236;242;255m\x1b[48;2;10;14;24m")?;
    write!(out, "\x1b[{row0};{col0}H+{horiz}+")?;
    for (i, line) in lines.iter().take(body_h).enumerate() {
        let row = row0 + 1 + i;
        write!(out, "\x1b[{row};{col0}H| {line:<inner_w$} |")?;
    }
    write!(out, "\x1b[{};{col0}H+{horiz}+", row0 + box_h - 1)?;
    out.write_all(b"\x1b[0m")?;
    Ok(())
}

#[inline]
pub(crate) fn rgb_at(pixels: &[u8], idx: usize) -> [u8; 3] {
    [pixels[idx], pixels[idx + 1], pixels[idx + 2]]
}
