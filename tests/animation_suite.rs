use wave_overlay::analyser::FrequencySource;
use wave_overlay::animation::{
    amplitude_from_bins, clamp_speed, instantaneous_fps, AnimationLoop, MAX_SPEED, MIN_AMPLITUDE,
    MIN_SPEED,
};
use wave_overlay::blend::CompositeOp;
use wave_overlay::layout::{calculate, ImageStyle};
use wave_overlay::scheduler::{Scheduler, Task};
use wave_overlay::wave::{CurveLayer, WaveSurface};

struct Level(u8);

impl FrequencySource for Level {
    fn frequency_bin_count(&self) -> usize {
        128
    }

    fn byte_frequency_data(&mut self, out: &mut [u8]) {
        out.fill(self.0);
    }
}

fn live_surface() -> WaveSurface {
    let mut surface = WaveSurface::ios9();
    surface.reconfigure(
        &calculate(200.0, 100.0, ImageStyle::Default),
        vec![CurveLayer::support_line()],
        CompositeOp::SourceOver,
        0.1,
    );
    surface
}

#[test]
fn steady_sixty_fps_keeps_base_speed() {
    let mut surface = live_surface();
    let mut scheduler = Scheduler::new();
    let mut anim = AnimationLoop::new();

    let mut t = 1000.0;
    for i in 0..30 {
        let out = anim.tick(t, &mut surface, None, &mut scheduler);
        assert_eq!(out.started, i == 0);
        assert!((out.speed_multiplier - 1.0).abs() < 0.01, "tick {i}: {out:?}");
        assert!((out.speed - 0.2).abs() < 0.002, "tick {i}: {out:?}");
        t += 16.6;
    }
}

#[test]
fn slow_frames_are_clamped() {
    let mut surface = live_surface();
    let mut scheduler = Scheduler::new();
    let mut anim = AnimationLoop::new();

    let mut t = 500.0;
    for _ in 0..10 {
        let out = anim.tick(t, &mut surface, None, &mut scheduler);
        assert!(out.speed <= MAX_SPEED);
        t += 33.0;
    }

    // A long hiccup would otherwise push speed to 0.2 * 60 / 4 = 3.0.
    let out = anim.tick(t + 250.0, &mut surface, None, &mut scheduler);
    assert!(out.normalized_speed > MAX_SPEED);
    assert_eq!(out.speed, MAX_SPEED);
}

#[test]
fn very_fast_frames_hit_the_floor() {
    assert_eq!(clamp_speed(0.2 * 60.0 / 1000.0), MIN_SPEED);
    assert_eq!(instantaneous_fps(0.0), 60.0);
    assert!((instantaneous_fps(20.0) - 50.0).abs() < 1e-9);
}

#[test]
fn first_tick_starts_the_renderer() {
    let mut surface = live_surface();
    let mut scheduler = Scheduler::new();
    let mut anim = AnimationLoop::new();
    assert!(!surface.renderer().expect("built").is_running());

    let out = anim.tick(42.0, &mut surface, None, &mut scheduler);
    assert!(out.started);
    assert_eq!(out.fps, 60.0);
    assert!(surface.renderer().expect("built").is_running());
    assert_eq!(anim.last_frame_ms(), Some(42.0));
    assert!(anim.is_running());
    assert!(scheduler.frame_pending());
}

#[test]
fn silence_keeps_a_minimum_amplitude() {
    assert_eq!(amplitude_from_bins(&[0u8; 128]), MIN_AMPLITUDE);
    assert_eq!(amplitude_from_bins(&[]), MIN_AMPLITUDE);
    assert!((amplitude_from_bins(&[255u8; 128]) - 3.0).abs() < 1e-9);
    assert!((amplitude_from_bins(&[85u8; 128]) - 1.0).abs() < 1e-9);

    let mut surface = live_surface();
    let mut scheduler = Scheduler::new();
    let mut anim = AnimationLoop::new();
    let mut mic = Level(0);
    let out = anim.tick(10.0, &mut surface, Some(&mut mic), &mut scheduler);
    assert_eq!(out.amplitude, Some(MIN_AMPLITUDE));
}

#[test]
fn no_source_means_no_amplitude_push() {
    let mut surface = live_surface();
    let mut scheduler = Scheduler::new();
    let mut anim = AnimationLoop::new();
    let out = anim.tick(10.0, &mut surface, None, &mut scheduler);
    assert_eq!(out.amplitude, None);
}

#[test]
fn stale_frame_handles_are_ignored() {
    let mut surface = live_surface();
    let mut scheduler = Scheduler::new();
    let mut anim = AnimationLoop::new();

    anim.restart(&mut scheduler);
    let first = scheduler.take_frame().expect("frame requested");
    anim.restart(&mut scheduler);
    let second = scheduler.take_frame().expect("frame requested");

    assert!(anim
        .on_frame(first, 16.0, &mut surface, None, &mut scheduler)
        .is_none());
    let out = anim
        .on_frame(second, 16.0, &mut surface, None, &mut scheduler)
        .expect("current handle ticks");
    assert!(out.started);
}

#[test]
fn restart_leaves_a_single_pending_request() {
    let mut scheduler = Scheduler::new();
    let mut anim = AnimationLoop::new();
    anim.restart(&mut scheduler);
    let before = anim.pending();
    anim.restart(&mut scheduler);
    assert_ne!(anim.pending(), before);
    assert!(scheduler.take_frame().is_some());
    assert!(scheduler.take_frame().is_none());
    assert_eq!(anim.last_frame_ms(), None);
}

#[test]
fn cancel_clears_the_pending_request() {
    let mut scheduler = Scheduler::new();
    let mut anim = AnimationLoop::new();
    anim.restart(&mut scheduler);
    anim.cancel(&mut scheduler);
    assert!(!anim.is_running());
    assert!(!scheduler.frame_pending());
}

#[test]
fn timers_fire_in_due_order() {
    let mut scheduler = Scheduler::new();
    scheduler.set_timeout(0.0, 500.0, Task::StartAudio);
    scheduler.set_timeout(0.0, 100.0, Task::RebuildWave);
    let dropped = scheduler.set_timeout(0.0, 50.0, Task::RebuildWave);
    assert!(scheduler.clear_timeout(dropped));
    assert!(!scheduler.clear_timeout(dropped));

    assert!(scheduler.due(99.0).is_empty());
    assert_eq!(scheduler.due(600.0), vec![Task::RebuildWave, Task::StartAudio]);
    assert_eq!(scheduler.pending_timers(), 0);
}

#[test]
fn cancel_all_drops_frames_and_timers() {
    let mut scheduler = Scheduler::new();
    scheduler.request_frame();
    scheduler.set_timeout(0.0, 100.0, Task::RebuildWave);
    scheduler.cancel_all();
    assert!(!scheduler.frame_pending());
    assert_eq!(scheduler.pending_timers(), 0);
}
