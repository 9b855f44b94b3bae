use crate::render::{begin, check_geometry, finish, rgb_at, ColorState, Frame, Renderer};
use std::io::Write;

/// Dot bit for each pixel of the 2x4 cell, row-major.
const DOT_BITS: [u8; 8] = [0x01, 0x08, 0x02, 0x10, 0x04, 0x20, 0x40, 0x80];

/// 2x4 pixels per cell. Pixels brighter than the cell's mid luma become
/// dots in their average color; the rest average into the background.
pub struct BrailleRenderer {
    colors: ColorState,
}

impl BrailleRenderer {
    pub fn new() -> Self {
        Self {
            colors: ColorState::default(),
        }
    }
}

impl Default for BrailleRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for BrailleRenderer {
    fn name(&self) -> &'static str {
        "braille"
    }

    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
        if !check_geometry(frame, (2, 4), out)? {
            return Ok(());
        }
        let w = frame.pixel_width;
        let px = frame.pixels_rgba;

        begin(frame, out)?;
        self.colors.reset();
        for row in 0..frame.visual_rows as usize {
            for col in 0..frame.term_cols as usize {
                let mut rgb = [[0u8; 3]; 8];
                let mut lum = [0u16; 8];
                for (i, (c, l)) in rgb.iter_mut().zip(lum.iter_mut()).enumerate() {
                    let x = col * 2 + i % 2;
                    let y = row * 4 + i / 2;
                    *c = rgb_at(px, (y * w + x) * 4);
                    *l = luma(*c);
                }
                let (ch, fg, bg) = encode_cell(&rgb, &lum);
                self.colors.set(out, fg, bg)?;
                write!(out, "{ch}")?;
            }
            out.write_all(b"\r\n")?;
        }
        finish(frame, out)
    }
}

fn encode_cell(rgb: &[[u8; 3]; 8], lum: &[u16; 8]) -> (char, [u8; 3], [u8; 3]) {
    let lo = lum.iter().copied().min().unwrap_or(0);
    let hi = lum.iter().copied().max().unwrap_or(0);
    let thr = (lo + hi) / 2;

    let mut bits = 0u8;
    let mut on = Mean::default();
    let mut off = Mean::default();
    for i in 0..8 {
        if lum[i] > thr {
            bits |= DOT_BITS[i];
            on.add(rgb[i]);
        } else {
            off.add(rgb[i]);
        }
    }

    if bits == 0 {
        let c = off.get().unwrap_or([0, 0, 0]);
        return (' ', c, c);
    }
    let fg = on.get().unwrap_or([0, 0, 0]);
    let bg = off.get().unwrap_or(fg);
    let ch = char::from_u32(0x2800 + bits as u32).unwrap_or(' ');
    (ch, fg, bg)
}

#[derive(Default)]
struct Mean {
    sum: [u32; 3],
    n: u32,
}

impl Mean {
    fn add(&mut self, c: [u8; 3]) {
        for (s, v) in self.sum.iter_mut().zip(c) {
            *s += v as u32;
        }
        self.n += 1;
    }

    fn get(&self) -> Option<[u8; 3]> {
        (self.n > 0).then(|| self.sum.map(|s| (s / self.n) as u8))
    }
}

#[inline]
fn luma(c: [u8; 3]) -> u16 {
    // Rec.709 weights in 8.8 fixed point.
    ((c[0] as u32 * 54 + c[1] as u32 * 183 + c[2] as u32 * 19) >> 8) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_cell_is_blank() {
        let rgb = [[40, 40, 40]; 8];
        let lum = rgb.map(luma);
        let (ch, fg, bg) = encode_cell(&rgb, &lum);
        assert_eq!(ch, ' ');
        assert_eq!(fg, bg);
    }

    #[test]
    fn bright_top_left_sets_first_dot() {
        let mut rgb = [[0, 0, 0]; 8];
        rgb[0] = [255, 255, 255];
        let lum = rgb.map(luma);
        let (ch, fg, _) = encode_cell(&rgb, &lum);
        assert_eq!(ch, '\u{2801}');
        assert_eq!(fg, [255, 255, 255]);
    }
}
