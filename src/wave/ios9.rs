//! iOS9-style wave: each colour layer is a cluster of short-lived sine bumps that fade in,
//! drift with the controller speed, and respawn once they die out.

use super::{Canvas, CurveLayer, WaveConfig, WaveRenderer};
use crate::blend::{CompositeOp, Px};
use crate::color::{parse_color_string, Rgba};
use std::f64::consts::PI;

const GRAPH_X: f64 = 25.0;
const AMPLITUDE_FACTOR: f64 = 0.8;
const SPEED_FACTOR: f64 = 1.0;
const DEAD_PX: f64 = 2.0;
const ATT_FACTOR: f64 = 4.0;
const DESPAWN_FACTOR: f64 = 0.02;
const LAYER_ALPHA: f64 = 0.7;
const LERP_SPEED: f64 = 0.1;

const CURVE_COUNT_RANGE: (usize, usize) = (2, 5);
const AMPLITUDE_RANGE: (f64, f64) = (0.3, 1.0);
const OFFSET_RANGE: (f64, f64) = (-3.0, 3.0);
const WIDTH_RANGE: (f64, f64) = (1.0, 3.0);
const SPEED_RANGE: (f64, f64) = (0.5, 1.0);
const DESPAWN_TIMEOUT_RANGE: (f64, f64) = (500.0, 2000.0);

#[derive(Debug, Clone, Copy)]
struct SubCurve {
    phase: f64,
    amplitude: f64,
    final_amplitude: f64,
    despawn_timeout: f64,
    offset: f64,
    speed: f64,
    width: f64,
    verse: f64,
}

struct Curve {
    color: Option<Rgba>,
    alpha: f64,
    support_line: bool,
    spawn_at: Option<f64>,
    subs: Vec<SubCurve>,
    prev_max_y: f64,
}

impl Curve {
    fn new(layer: &CurveLayer) -> Self {
        let color = layer.color.as_deref().and_then(parse_color_string);
        if color.is_none() {
            log::warn!("wave layer has no usable colour ({:?}); it will not be drawn", layer.color);
        }
        Self {
            color,
            alpha: LAYER_ALPHA * layer.opacity.clamp(0.0, 1.0),
            support_line: layer.support_line,
            spawn_at: None,
            subs: Vec::new(),
            prev_max_y: 0.0,
        }
    }

    fn spawn(&mut self, now_ms: f64, rng: &mut fastrand::Rng) {
        self.spawn_at = Some(now_ms);
        let count = rng.usize(CURVE_COUNT_RANGE.0..CURVE_COUNT_RANGE.1);
        self.subs = (0..count)
            .map(|_| SubCurve {
                phase: 0.0,
                amplitude: 0.0,
                final_amplitude: range(rng, AMPLITUDE_RANGE),
                despawn_timeout: range(rng, DESPAWN_TIMEOUT_RANGE),
                offset: range(rng, OFFSET_RANGE),
                speed: range(rng, SPEED_RANGE),
                width: range(rng, WIDTH_RANGE),
                verse: if rng.bool() { 1.0 } else { -1.0 },
            })
            .collect();
    }

    fn y_relative(&self, i: f64) -> f64 {
        let n = self.subs.len();
        if n < 2 {
            return 0.0;
        }
        let sum = self
            .subs
            .iter()
            .enumerate()
            .map(|(ci, c)| {
                let t = 4.0 * (-1.0 + (ci as f64 / (n - 1) as f64) * 2.0) + c.offset;
                let x = i / c.width - t;
                (c.amplitude * (c.verse * x - c.phase).sin() * attenuation(x)).abs()
            })
            .sum::<f64>();
        sum / n as f64
    }
}

fn range(rng: &mut fastrand::Rng, (lo, hi): (f64, f64)) -> f64 {
    lo + rng.f64() * (hi - lo)
}

fn attenuation(x: f64) -> f64 {
    (ATT_FACTOR / (ATT_FACTOR + x * x)).powf(ATT_FACTOR)
}

pub struct Ios9Wave {
    config: WaveConfig,
    canvas: Canvas,
    curves: Vec<Curve>,
    rng: fastrand::Rng,
    amplitude: f64,
    speed: f64,
    target_amplitude: Option<f64>,
    target_speed: Option<f64>,
    running: bool,
    disposed: bool,
}

impl Ios9Wave {
    pub fn new(config: WaveConfig) -> Self {
        Self::with_rng(config, fastrand::Rng::new())
    }

    pub fn with_seed(config: WaveConfig, seed: u64) -> Self {
        Self::with_rng(config, fastrand::Rng::with_seed(seed))
    }

    fn with_rng(config: WaveConfig, rng: fastrand::Rng) -> Self {
        let ratio = config.ratio.max(0.0);
        let w = (config.width * ratio).round().max(1.0) as usize;
        let h = (config.height * ratio).round().max(1.0) as usize;
        let curves = config.curve_definition.iter().map(Curve::new).collect();
        let mut wave = Self {
            amplitude: config.amplitude,
            speed: config.speed,
            canvas: Canvas::new(w, h),
            curves,
            rng,
            target_amplitude: None,
            target_speed: None,
            running: false,
            disposed: false,
            config,
        };
        if wave.config.autostart {
            wave.start();
        }
        wave
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    fn height_max(&self) -> f64 {
        (self.canvas.height as f64 / 2.0 - 6.0).max(1.0)
    }

    fn lerp_controls(&mut self) {
        if let Some(target) = self.target_amplitude {
            self.amplitude = lerp(self.amplitude, target);
            if (self.amplitude - target).abs() < 1e-6 {
                self.amplitude = target;
                self.target_amplitude = None;
            }
        }
        if let Some(target) = self.target_speed {
            self.speed = lerp(self.speed, target);
            if (self.speed - target).abs() < 1e-6 {
                self.speed = target;
                self.target_speed = None;
            }
        }
    }

    fn draw_support_line(&mut self, idx: usize) {
        let curve = &self.curves[idx];
        let Some(color) = curve.color else {
            return;
        };
        let op = self.config.global_composite_operation;
        let y = self.height_max() as usize;
        let w = self.canvas.width;
        for x in 0..w {
            let t = x as f64 / w.max(1) as f64;
            // Gradient stops: transparent at the ends, half white between 10% and 90%.
            let ramp = if t < 0.1 {
                t / 0.1
            } else if t > 0.9 {
                (1.0 - t) / 0.1
            } else {
                1.0
            };
            let a = (curve.alpha * 0.5 * ramp * color.a as f64) as f32;
            self.canvas.composite(x, y, layer_px(color, a), op);
        }
    }

    fn draw_curve(&mut self, idx: usize, now_ms: f64) {
        let height_max = self.height_max();
        let speed = self.speed;
        let amplitude = self.amplitude;
        let op = self.config.global_composite_operation;

        let curve = &mut self.curves[idx];
        if curve.spawn_at.is_none() {
            curve.spawn(now_ms, &mut self.rng);
        }
        let spawn_at = curve.spawn_at.unwrap_or(now_ms);
        for c in curve.subs.iter_mut() {
            if spawn_at + c.despawn_timeout <= now_ms {
                c.amplitude -= DESPAWN_FACTOR;
            } else {
                c.amplitude += DESPAWN_FACTOR;
            }
            c.amplitude = c.amplitude.max(0.0).min(c.final_amplitude);
            c.phase = (c.phase + speed * c.speed * SPEED_FACTOR) % (2.0 * PI);
        }

        let w = self.canvas.width;
        let h = self.canvas.height as f64;
        let mut max_y = 0.0f64;
        let mut spans = Vec::with_capacity(w);
        for px in 0..w {
            let i = (px as f64 + 0.5) / w as f64 * (GRAPH_X * 2.0) - GRAPH_X;
            let y = AMPLITUDE_FACTOR
                * height_max
                * amplitude
                * curve.y_relative(i)
                * attenuation(i / GRAPH_X * 2.0);
            max_y = max_y.max(y);
            spans.push(y);
        }

        if let Some(color) = curve.color {
            let alpha = curve.alpha * color.a as f64;
            for (px, y) in spans.iter().enumerate() {
                let top = (height_max - y).max(0.0);
                let bottom = (height_max + y).min(h);
                fill_span(&mut self.canvas, px, top, bottom, color, alpha, op);
            }
        }

        if max_y < DEAD_PX && curve.prev_max_y > max_y {
            curve.spawn_at = None;
        }
        curve.prev_max_y = max_y;
    }
}

fn lerp(from: f64, to: f64) -> f64 {
    from * (1.0 - LERP_SPEED) + to * LERP_SPEED
}

fn layer_px(color: Rgba, a: f32) -> Px {
    Px {
        rgb: [
            color.r as f32 / 255.0,
            color.g as f32 / 255.0,
            color.b as f32 / 255.0,
        ],
        a,
    }
}

/// Fill one column between `top` and `bottom` with partial coverage on the edge pixels.
fn fill_span(
    canvas: &mut Canvas,
    x: usize,
    top: f64,
    bottom: f64,
    color: Rgba,
    alpha: f64,
    op: CompositeOp,
) {
    if bottom <= top {
        return;
    }
    let first = top.floor() as usize;
    let last = (bottom.ceil() as usize).min(canvas.height);
    for y in first..last {
        let y0 = y as f64;
        let coverage = (bottom.min(y0 + 1.0) - top.max(y0)).clamp(0.0, 1.0);
        if coverage <= 0.0 {
            continue;
        }
        canvas.composite(x, y, layer_px(color, (alpha * coverage) as f32), op);
    }
}

impl WaveRenderer for Ios9Wave {
    fn start(&mut self) {
        if self.disposed {
            return;
        }
        self.running = true;
    }

    fn stop(&mut self) {
        self.running = false;
        self.target_amplitude = None;
        self.target_speed = None;
    }

    fn set_amplitude(&mut self, value: f64) {
        self.target_amplitude = Some(value);
    }

    fn set_speed(&mut self, value: f64) {
        self.target_speed = Some(value);
    }

    fn dispose(&mut self) {
        self.stop();
        self.disposed = true;
        self.canvas.clear();
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn draw_frame(&mut self, now_ms: f64) {
        if !self.running {
            return;
        }
        self.lerp_controls();
        self.canvas.clear();
        for idx in 0..self.curves.len() {
            if self.curves[idx].support_line {
                self.draw_support_line(idx);
            } else {
                self.draw_curve(idx, now_ms);
            }
        }
    }

    fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    fn config(&self) -> &WaveConfig {
        &self.config
    }
}
