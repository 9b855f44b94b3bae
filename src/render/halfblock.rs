use crate::render::{begin, check_geometry, finish, rgb_at, ColorState, Frame, Renderer};
use std::io::Write;

const UPPER_HALF: char = '\u{2580}';

/// One cell shows two stacked pixels: top as foreground, bottom as background.
pub struct HalfBlockRenderer {
    colors: ColorState,
}

impl HalfBlockRenderer {
    pub fn new() -> Self {
        Self {
            colors: ColorState::default(),
        }
    }
}

impl Default for HalfBlockRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for HalfBlockRenderer {
    fn name(&self) -> &'static str {
        "half-block"
    }

    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
        if !check_geometry(frame, (1, 2), out)? {
            return Ok(());
        }
        let w = frame.pixel_width;
        let px = frame.pixels_rgba;

        begin(frame, out)?;
        self.colors.reset();
        for row in 0..frame.visual_rows as usize {
            let top = row * 2 * w;
            let bottom = top + w;
            for x in 0..w {
                let fg = rgb_at(px, (top + x) * 4);
                let bg = rgb_at(px, (bottom + x) * 4);
                self.colors.set(out, fg, bg)?;
                write!(out, "{UPPER_HALF}")?;
            }
            out.write_all(b"\r\n")?;
        }
        finish(frame, out)
    }
}
