use crate::render::{draw_overlay_popup, Frame, Renderer};
use std::io::Write;

const HALF_BLOCK: char = '\u{2580}';

type Rgb = (u8, u8, u8);

/// Two vertical pixels per cell: upper half as foreground, lower half as background.
pub struct HalfBlockRenderer {
    last_fg: Option<Rgb>,
    last_bg: Option<Rgb>,
}

impl HalfBlockRenderer {
    pub fn new() -> Self {
        Self {
            last_fg: None,
            last_bg: None,
        }
    }

    fn cell(&mut self, out: &mut dyn Write, top: Rgb, bottom: Rgb) -> std::io::Result<()> {
        if self.last_fg != Some(top) {
            write!(out, "\x1b[38;2;{};{};{}m", top.0, top.1, top.2)?;
            self.last_fg = Some(top);
        }
        if self.last_bg != Some(bottom) {
            write!(out, "\x1b[48;2;{};{};{}m", bottom.0, bottom.1, bottom.2)?;
            self.last_bg = Some(bottom);
        }
        write!(out, "{HALF_BLOCK}")
    }
}

impl Default for HalfBlockRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn rgb_at(pixels: &[u8], w: usize, x: usize, y: usize) -> Rgb {
    let i = (y * w + x) * 4;
    (pixels[i], pixels[i + 1], pixels[i + 2])
}

impl Renderer for HalfBlockRenderer {
    fn name(&self) -> &'static str {
        "halfblock"
    }

    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
        let cols = frame.term_cols as usize;
        let visual_rows = frame.visual_rows as usize;
        let w = frame.pixel_width;
        let h = frame.pixel_height;

        if cols == 0 || visual_rows == 0 || w != cols || h != visual_rows.saturating_mul(2) {
            return Ok(());
        }
        if frame.pixels_rgba.len() < w.saturating_mul(h).saturating_mul(4) {
            return Ok(());
        }

        if frame.sync_updates {
            out.write_all(b"\x1b[?2026h")?;
        }
        // Home, reset, autowrap off while painting full-width rows.
        out.write_all(b"\x1b[H\x1b[0m\x1b[?7l")?;
        self.last_fg = None;
        self.last_bg = None;

        for row in 0..visual_rows {
            for x in 0..cols {
                let top = rgb_at(frame.pixels_rgba, w, x, row * 2);
                let bottom = rgb_at(frame.pixels_rgba, w, x, row * 2 + 1);
                self.cell(out, top, bottom)?;
            }
            out.write_all(b"\r\n")?;
        }

        let mut hud_lines = frame.hud.lines();
        for i in 0..(frame.hud_rows as usize) {
            write!(out, "\x1b[{};1H\x1b[0m\x1b[2K", visual_rows + i + 1)?;
            if let Some(line) = hud_lines.next() {
                let line = line.chars().take(cols).collect::<String>();
                if frame.hud_focus == Some(i) {
                    write!(out, "\x1b[7m{line}\x1b[27m")?;
                } else {
                    write!(out, "{line}")?;
                }
            }
        }

        if let Some(text) = frame.overlay {
            draw_overlay_popup(out, frame.term_cols, frame.term_rows, text)?;
        }

        out.write_all(b"\x1b[?7h")?;
        if frame.sync_updates {
            out.write_all(b"\x1b[?2026l")?;
        }
        out.flush()?;
        Ok(())
    }
}
