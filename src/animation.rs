//! Frame-rate-normalised animation tick: feeds audio energy and a compensated speed into the
//! wave renderer once per display frame.

use crate::analyser::FrequencySource;
use crate::scheduler::{FrameHandle, Scheduler};
use crate::wave::{BASE_SPEED, WaveSurface};

pub const TARGET_FPS: f64 = 60.0;
pub const MIN_SPEED: f64 = 0.05;
pub const MAX_SPEED: f64 = 0.5;
/// Silence still leaves a visible ripple.
pub const MIN_AMPLITUDE: f64 = 0.1;
pub const AMPLITUDE_SCALE: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutput {
    /// Renderer was (re)started on this tick.
    pub started: bool,
    pub fps: f64,
    pub speed_multiplier: f64,
    pub normalized_speed: f64,
    /// Speed actually pushed, after clamping.
    pub speed: f64,
    pub amplitude: Option<f64>,
}

pub fn instantaneous_fps(elapsed_ms: f64) -> f64 {
    if elapsed_ms > 0.0 {
        1000.0 / elapsed_ms
    } else {
        TARGET_FPS
    }
}

pub fn speed_multiplier(fps: f64) -> f64 {
    TARGET_FPS / fps
}

pub fn clamp_speed(speed: f64) -> f64 {
    speed.clamp(MIN_SPEED, MAX_SPEED)
}

/// Mean byte magnitude mapped to 0..3, floored at [`MIN_AMPLITUDE`].
pub fn amplitude_from_bins(bins: &[u8]) -> f64 {
    if bins.is_empty() {
        return MIN_AMPLITUDE;
    }
    let sum = bins.iter().map(|&b| b as f64).sum::<f64>();
    let average = sum / bins.len() as f64;
    (average / 255.0 * AMPLITUDE_SCALE).max(MIN_AMPLITUDE)
}

#[derive(Debug, Default)]
pub struct AnimationLoop {
    last_frame_ms: Option<f64>,
    pending: Option<FrameHandle>,
    bins: Vec<u8>,
}

impl AnimationLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.pending.is_some()
    }

    pub fn last_frame_ms(&self) -> Option<f64> {
        self.last_frame_ms
    }

    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }

    /// Forget the last frame time so the next tick restarts the renderer.
    pub fn reset(&mut self) {
        self.last_frame_ms = None;
    }

    /// Cancel any outstanding request, reset, and schedule a fresh first tick.
    pub fn restart(&mut self, scheduler: &mut Scheduler) {
        self.cancel(scheduler);
        self.reset();
        self.pending = Some(scheduler.request_frame());
    }

    pub fn cancel(&mut self, scheduler: &mut Scheduler) {
        if let Some(handle) = self.pending.take() {
            scheduler.cancel_frame(handle);
        }
    }

    /// Run when the scheduler delivers `handle`. Stale handles are ignored.
    pub fn on_frame(
        &mut self,
        handle: FrameHandle,
        now_ms: f64,
        surface: &mut WaveSurface,
        source: Option<&mut dyn FrequencySource>,
        scheduler: &mut Scheduler,
    ) -> Option<TickOutput> {
        if self.pending != Some(handle) {
            return None;
        }
        self.pending = None;
        Some(self.tick(now_ms, surface, source, scheduler))
    }

    pub fn tick(
        &mut self,
        now_ms: f64,
        surface: &mut WaveSurface,
        source: Option<&mut dyn FrequencySource>,
        scheduler: &mut Scheduler,
    ) -> TickOutput {
        let started = self.last_frame_ms.is_none();
        let last = match self.last_frame_ms {
            Some(t) => t,
            None => {
                surface.start();
                now_ms
            }
        };

        let fps = instantaneous_fps(now_ms - last);
        let multiplier = speed_multiplier(fps);
        let normalized = BASE_SPEED * multiplier;

        let amplitude = source.map(|src| {
            self.bins.resize(src.frequency_bin_count(), 0);
            src.byte_frequency_data(&mut self.bins);
            let amp = amplitude_from_bins(&self.bins);
            surface.set_amplitude(amp);
            amp
        });

        let speed = clamp_speed(normalized);
        surface.set_speed(speed);

        self.last_frame_ms = Some(now_ms);
        self.pending = Some(scheduler.request_frame());

        TickOutput {
            started,
            fps,
            speed_multiplier: multiplier,
            normalized_speed: normalized,
            speed,
            amplitude,
        }
    }
}
