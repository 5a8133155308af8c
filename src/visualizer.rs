//! One overlay instance: owns the scene, the wave surface, the animation loop, its timers and
//! the audio session, and sequences them on control events.

use crate::animation::{AnimationLoop, TickOutput};
use crate::audio::{AudioError, AudioInput};
use crate::controls::{self, ControlEvent, ControlId, Controls, Trigger};
use crate::layout::{self, Geometry};
use crate::scene::Scene;
use crate::scheduler::{Scheduler, Task};
use crate::wave::WaveSurface;

/// Settle time between a control change and the renderer rebuild. Tunable; nothing depends
/// on the exact value.
pub const DEFAULT_REBUILD_DELAY_MS: f64 = 100.0;
pub const DEFAULT_STARTUP_DELAY_MS: f64 = 500.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timing {
    pub rebuild_delay_ms: f64,
    pub startup_delay_ms: f64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            rebuild_delay_ms: DEFAULT_REBUILD_DELAY_MS,
            startup_delay_ms: DEFAULT_STARTUP_DELAY_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioState {
    /// Acquisition not yet attempted or still pending.
    Waiting,
    Listening,
    /// Acquisition failed; idle animation only.
    Idle,
    Closed,
}

pub struct Visualizer {
    pub scene: Scene,
    pub controls: Controls,
    surface: WaveSurface,
    animation: AnimationLoop,
    scheduler: Scheduler,
    audio: Option<Box<dyn AudioInput>>,
    audio_state: AudioState,
    timing: Timing,
    pixel_ratio: f64,
    geometry: Option<Geometry>,
    last_tick: Option<TickOutput>,
    closed: bool,
}

impl Visualizer {
    pub fn new(scene: Scene, controls: Controls, surface: WaveSurface, timing: Timing) -> Self {
        Self {
            scene,
            controls,
            surface,
            animation: AnimationLoop::new(),
            scheduler: Scheduler::new(),
            audio: None,
            audio_state: AudioState::Waiting,
            timing,
            pixel_ratio: 1.0,
            geometry: None,
            last_tick: None,
            closed: false,
        }
    }

    /// Style, lay out and build the renderer, then schedule microphone start-up.
    pub fn initialize(&mut self, now_ms: f64) {
        self.apply_styles();
        self.initialize_wave();
        self.scheduler
            .set_timeout(now_ms, self.timing.startup_delay_ms, Task::StartAudio);
    }

    pub fn set_viewport(&mut self, width: f64, height: f64, pixel_ratio: f64) {
        self.scene.set_viewport(width, height);
        self.pixel_ratio = pixel_ratio.max(f64::EPSILON);
    }

    pub fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    fn apply_styles(&mut self) {
        self.scene
            .apply_styles(self.controls.bg_blend, self.controls.image_style);
    }

    /// Recompute geometry from the image's rendered box and rebuild the renderer in place.
    pub fn initialize_wave(&mut self) {
        let image = self.scene.image_rect();
        let geometry = layout::calculate(image.w, image.h, self.controls.image_style);
        self.scene.place_wave_container(&geometry);
        self.surface.reconfigure(
            &geometry,
            self.controls.curve_definition(),
            self.controls.canvas_blend,
            self.pixel_ratio,
        );
        self.geometry = Some(geometry);
        self.animation.reset();
    }

    /// Stop now, restyle now, rebuild after the settle delay.
    pub fn update_wave(&mut self, now_ms: f64) {
        self.surface.stop();
        self.apply_styles();
        self.scheduler
            .set_timeout(now_ms, self.timing.rebuild_delay_ms, Task::RebuildWave);
    }

    pub fn handle_event(&mut self, event: ControlEvent, now_ms: f64) -> Trigger {
        if let ControlEvent::Input(ControlId::Opacity(idx)) = event {
            self.controls.sync_label(idx);
        }
        let trigger = controls::route(event);
        if self.closed {
            return trigger;
        }
        match trigger {
            Trigger::Relayout => self.initialize_wave(),
            Trigger::Update => self.update_wave(now_ms),
        }
        trigger
    }

    /// Run due timers. Tasks the visualizer cannot perform itself are returned to the caller.
    pub fn run_due(&mut self, now_ms: f64) -> Vec<Task> {
        let mut external = Vec::new();
        for task in self.scheduler.due(now_ms) {
            match task {
                Task::RebuildWave => self.rebuild(),
                Task::StartAudio => external.push(task),
            }
        }
        external
    }

    fn rebuild(&mut self) {
        if self.closed {
            return;
        }
        self.initialize_wave();
        if self.audio.as_ref().is_some_and(|a| a.is_running()) {
            self.animation.restart(&mut self.scheduler);
        }
    }

    /// Outcome of microphone acquisition. Either way the animation loop starts; without a
    /// session it only drives the speed.
    pub fn attach_audio(&mut self, result: Result<Box<dyn AudioInput>, AudioError>) {
        match result {
            Ok(mut session) => {
                if self.closed {
                    session.close();
                    return;
                }
                log::info!("audio-reactive mode on ({})", session.label());
                self.audio = Some(session);
                self.audio_state = AudioState::Listening;
            }
            Err(err) => {
                log::error!("Error accessing microphone: {err}");
                if self.closed {
                    return;
                }
                self.audio_state = AudioState::Idle;
            }
        }
        self.animation.restart(&mut self.scheduler);
    }

    /// Service the display refresh: run the pending animation tick, then let the renderer draw.
    pub fn on_display_frame(&mut self, now_ms: f64) -> Option<TickOutput> {
        let tick = match self.scheduler.take_frame() {
            Some(handle) => {
                let source = self.audio.as_mut().map(|a| a.source());
                self.animation.on_frame(
                    handle,
                    now_ms,
                    &mut self.surface,
                    source,
                    &mut self.scheduler,
                )
            }
            None => None,
        };
        self.surface.draw_frame(now_ms);
        if tick.is_some() {
            self.last_tick = tick;
        }
        tick
    }

    /// Release everything this instance holds. Safe to call more than once.
    pub fn cleanup(&mut self) {
        self.animation.cancel(&mut self.scheduler);
        self.scheduler.cancel_all();
        self.surface.dispose();
        if let Some(mut session) = self.audio.take() {
            session.close();
        }
        if !self.closed {
            log::info!("visualizer torn down");
        }
        self.audio_state = AudioState::Closed;
        self.closed = true;
    }

    pub fn surface(&self) -> &WaveSurface {
        &self.surface
    }

    pub fn animation(&self) -> &AnimationLoop {
        &self.animation
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn geometry(&self) -> Option<Geometry> {
        self.geometry
    }

    pub fn audio_state(&self) -> AudioState {
        self.audio_state
    }

    pub fn has_audio(&self) -> bool {
        self.audio.is_some()
    }

    pub fn last_tick(&self) -> Option<TickOutput> {
        self.last_tick
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for Visualizer {
    fn drop(&mut self) {
        self.cleanup();
    }
}
