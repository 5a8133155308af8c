//! Wave drawing: the renderer capability, its configuration, and the adapter that owns it.

mod ios9;
mod surface;

pub use ios9::Ios9Wave;
pub use surface::{RendererFactory, WaveSurface, AMPLITUDE_SEED, BASE_SPEED, WAVE_STYLE};

use crate::blend::{CompositeOp, Px};

/// One stacked wave layer.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveLayer {
    /// `"r, g, b"` or `"rgba(...)"`; `None` when the source colour was malformed.
    pub color: Option<String>,
    pub opacity: f64,
    pub support_line: bool,
}

impl CurveLayer {
    /// The transparent base line that leads every curve definition.
    pub fn support_line() -> Self {
        Self {
            color: Some("255,255,255".to_string()),
            opacity: 0.0,
            support_line: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WaveConfig {
    /// Surface size in layout pixels.
    pub width: f64,
    pub height: f64,
    /// Canvas pixels per layout pixel.
    pub ratio: f64,
    pub style: &'static str,
    pub amplitude: f64,
    pub speed: f64,
    pub autostart: bool,
    /// Stretch the canvas over the whole container.
    pub cover: bool,
    pub curve_definition: Vec<CurveLayer>,
    pub global_composite_operation: CompositeOp,
}

/// Capability interface of an externally driven wave drawer.
pub trait WaveRenderer {
    fn start(&mut self);
    fn stop(&mut self);
    fn set_amplitude(&mut self, value: f64);
    fn set_speed(&mut self, value: f64);
    fn dispose(&mut self);

    fn is_running(&self) -> bool;
    /// Advance the renderer's own animation by one display frame; no-op while stopped.
    fn draw_frame(&mut self, now_ms: f64);
    fn canvas(&self) -> &Canvas;
    fn config(&self) -> &WaveConfig;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    pub width: usize,
    pub height: usize,
    pixels: Vec<Px>,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Px::TRANSPARENT; width.saturating_mul(height)],
        }
    }

    pub fn clear(&mut self) {
        self.pixels.fill(Px::TRANSPARENT);
    }

    pub fn get(&self, x: usize, y: usize) -> Px {
        if x >= self.width || y >= self.height {
            return Px::TRANSPARENT;
        }
        self.pixels[y * self.width + x]
    }

    pub fn composite(&mut self, x: usize, y: usize, src: Px, op: CompositeOp) {
        if x >= self.width || y >= self.height || src.a <= 0.0 {
            return;
        }
        let i = y * self.width + x;
        self.pixels[i] = op.composite(self.pixels[i], src);
    }

    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|p| p.a <= 0.0)
    }
}
