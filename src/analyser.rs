//! Byte-domain frequency analyser with the behaviour of a Web Audio `AnalyserNode`.

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

pub const FFT_SIZE: usize = 256;
pub const SMOOTHING: f32 = 0.8;
pub const MIN_DECIBELS: f32 = -100.0;
pub const MAX_DECIBELS: f32 = -30.0;

/// Anything that can hand out a frequency snapshot.
pub trait FrequencySource {
    fn frequency_bin_count(&self) -> usize;
    /// Fill `out` with the current magnitudes scaled to 0..=255.
    fn byte_frequency_data(&mut self, out: &mut [u8]);
}

pub struct Analyser {
    fft_size: usize,
    smoothing: f32,
    window: Vec<f32>,
    history: Vec<f32>,
    write_pos: usize,
    fft: Arc<dyn Fft<f32>>,
    fft_buf: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
}

impl Analyser {
    pub fn new(fft_size: usize, smoothing: f32) -> Self {
        let fft_size = fft_size.max(2);
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(fft_size);
        Self {
            fft_size,
            smoothing: smoothing.clamp(0.0, 1.0),
            window: blackman(fft_size),
            history: vec![0.0; fft_size],
            write_pos: 0,
            fft,
            fft_buf: vec![Complex { re: 0.0, im: 0.0 }; fft_size],
            smoothed: vec![0.0; fft_size / 2],
        }
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Append mono samples; only the latest `fft_size` are kept.
    pub fn push_samples(&mut self, samples: &[f32]) {
        for &s in samples {
            self.history[self.write_pos] = s;
            self.write_pos = (self.write_pos + 1) % self.fft_size;
        }
    }

    fn analyse(&mut self) {
        let n = self.fft_size;
        for i in 0..n {
            let s = self.history[(self.write_pos + i) % n];
            self.fft_buf[i] = Complex {
                re: s * self.window[i],
                im: 0.0,
            };
        }
        self.fft.process(&mut self.fft_buf);

        let k = self.smoothing;
        for (bin, c) in self.smoothed.iter_mut().zip(self.fft_buf.iter()) {
            let mag = c.norm() / n as f32;
            let mixed = k * *bin + (1.0 - k) * mag;
            *bin = if mixed.is_finite() { mixed } else { 0.0 };
        }
    }
}

impl Default for Analyser {
    fn default() -> Self {
        Self::new(FFT_SIZE, SMOOTHING)
    }
}

impl FrequencySource for Analyser {
    fn frequency_bin_count(&self) -> usize {
        self.fft_size / 2
    }

    fn byte_frequency_data(&mut self, out: &mut [u8]) {
        self.analyse();
        let range = MAX_DECIBELS - MIN_DECIBELS;
        for (dst, &mag) in out.iter_mut().zip(self.smoothed.iter()) {
            let db = if mag > 0.0 {
                20.0 * mag.log10()
            } else {
                f32::NEG_INFINITY
            };
            let scaled = 255.0 * (db - MIN_DECIBELS) / range;
            *dst = scaled.clamp(0.0, 255.0) as u8;
        }
    }
}

fn blackman(n: usize) -> Vec<f32> {
    let alpha = 0.16f32;
    let a0 = 0.5 * (1.0 - alpha);
    let a1 = 0.5f32;
    let a2 = 0.5 * alpha;
    (0..n)
        .map(|i| {
            let x = i as f32 / n as f32;
            a0 - a1 * (2.0 * PI * x).cos() + a2 * (4.0 * PI * x).cos()
        })
        .collect()
}
