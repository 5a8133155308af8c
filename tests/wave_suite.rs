use wave_overlay::analyser::{Analyser, FrequencySource, FFT_SIZE};
use wave_overlay::blend::{blend_over, BlendMode, CompositeOp, Px};
use wave_overlay::layout::{calculate, ImageStyle};
use wave_overlay::wave::{
    CurveLayer, Ios9Wave, WaveConfig, WaveRenderer, WaveSurface, AMPLITUDE_SEED, BASE_SPEED,
};

fn config(layers: Vec<CurveLayer>) -> WaveConfig {
    WaveConfig {
        width: 120.0,
        height: 80.0,
        ratio: 1.0,
        style: "ios9",
        amplitude: AMPLITUDE_SEED,
        speed: BASE_SPEED,
        autostart: false,
        cover: true,
        curve_definition: layers,
        global_composite_operation: CompositeOp::SourceOver,
    }
}

fn layer(color: Option<&str>, opacity: f64) -> CurveLayer {
    CurveLayer {
        color: color.map(str::to_string),
        opacity,
        support_line: false,
    }
}

fn run_frames(wave: &mut Ios9Wave, frames: usize) {
    for i in 0..frames {
        wave.draw_frame(i as f64 * 16.0);
    }
}

#[test]
fn ios9_draws_once_started() {
    let mut wave = Ios9Wave::with_seed(config(vec![layer(Some("255, 0, 0"), 1.0)]), 7);
    assert_eq!(wave.canvas().width, 120);
    assert_eq!(wave.canvas().height, 80);

    run_frames(&mut wave, 10);
    assert!(wave.canvas().is_blank(), "drew while stopped");

    wave.start();
    run_frames(&mut wave, 30);
    assert!(!wave.canvas().is_blank());
}

#[test]
fn ios9_dispose_clears_and_stays_stopped() {
    let mut wave = Ios9Wave::with_seed(config(vec![layer(Some("0, 255, 0"), 1.0)]), 3);
    wave.start();
    run_frames(&mut wave, 30);
    wave.dispose();
    assert!(!wave.is_running());
    assert!(wave.canvas().is_blank());

    wave.start();
    assert!(!wave.is_running());
}

#[test]
fn ios9_skips_layers_without_color_or_opacity() {
    let mut wave = Ios9Wave::with_seed(
        config(vec![
            CurveLayer::support_line(),
            layer(None, 1.0),
            layer(Some("0, 0, 255"), 0.0),
        ]),
        11,
    );
    wave.start();
    run_frames(&mut wave, 40);
    assert!(wave.canvas().is_blank());
}

#[test]
fn ios9_eases_towards_targets() {
    let mut wave = Ios9Wave::with_seed(config(vec![layer(Some("1, 2, 3"), 1.0)]), 5);
    wave.start();
    wave.set_amplitude(1.0);
    wave.set_speed(0.4);
    wave.draw_frame(0.0);
    assert!((wave.amplitude() - 2.8).abs() < 1e-9);
    assert!((wave.speed() - 0.22).abs() < 1e-9);

    run_frames(&mut wave, 400);
    assert!((wave.amplitude() - 1.0).abs() < 1e-4);
    assert!((wave.speed() - 0.4).abs() < 1e-4);
}

#[test]
fn ios9_autostart_runs_immediately() {
    let mut cfg = config(vec![layer(Some("1, 2, 3"), 1.0)]);
    cfg.autostart = true;
    assert!(Ios9Wave::new(cfg).is_running());
}

#[test]
fn surface_builds_fixed_configuration() {
    let mut surface = WaveSurface::ios9();
    assert!(!surface.is_live());
    // Guarded no-ops before the first reconfigure.
    surface.start();
    surface.set_amplitude(1.0);
    surface.set_speed(0.3);
    surface.stop();
    surface.dispose();

    let g = calculate(200.0, 100.0, ImageStyle::Circle);
    surface.reconfigure(
        &g,
        vec![CurveLayer::support_line(), layer(Some("1, 2, 3"), 0.5)],
        CompositeOp::Screen,
        0.5,
    );
    let r = surface.renderer().expect("renderer");
    let cfg = r.config();
    assert_eq!(cfg.style, "ios9");
    assert_eq!(cfg.amplitude, 3.0);
    assert_eq!(cfg.speed, 0.2);
    assert!(!cfg.autostart);
    assert!(cfg.cover);
    assert_eq!(cfg.width, g.wave_width);
    assert_eq!(cfg.height, g.container_max_height);
    assert_eq!(cfg.global_composite_operation, CompositeOp::Screen);
    assert_eq!(cfg.curve_definition.len(), 2);
    assert!(!r.is_running());

    surface.dispose();
    assert!(!surface.is_live());
}

#[test]
fn analyser_is_quiet_on_silence() {
    let mut analyser = Analyser::default();
    assert_eq!(analyser.fft_size(), FFT_SIZE);
    assert_eq!(analyser.frequency_bin_count(), 128);

    analyser.push_samples(&[0.0; 512]);
    let mut bins = [1u8; 128];
    analyser.byte_frequency_data(&mut bins);
    assert!(bins.iter().all(|&b| b == 0));
}

#[test]
fn analyser_peaks_at_the_tone_bin() {
    let mut analyser = Analyser::default();
    let tone = (0..FFT_SIZE)
        .map(|i| (2.0 * std::f32::consts::PI * 16.0 * i as f32 / FFT_SIZE as f32).sin())
        .collect::<Vec<_>>();
    let mut bins = [0u8; 128];
    for _ in 0..8 {
        analyser.push_samples(&tone);
        analyser.byte_frequency_data(&mut bins);
    }
    assert!(bins[16] > 200, "tone bin {}", bins[16]);
    assert!(bins[16] > bins[60].saturating_add(100));
}

#[test]
fn analyser_smoothing_carries_energy_between_calls() {
    let mut analyser = Analyser::default();
    let tone = (0..FFT_SIZE)
        .map(|i| (2.0 * std::f32::consts::PI * 8.0 * i as f32 / FFT_SIZE as f32).sin())
        .collect::<Vec<_>>();
    let mut bins = [0u8; 128];
    analyser.push_samples(&tone);
    analyser.byte_frequency_data(&mut bins);

    analyser.push_samples(&[0.0; FFT_SIZE]);
    analyser.byte_frequency_data(&mut bins);
    assert!(bins[8] > 0, "smoothed energy vanished");
}

#[test]
fn blend_modes_match_reference_values() {
    let grey = Px {
        rgb: [0.5, 0.25, 1.0],
        a: 1.0,
    };
    let white = Px::opaque(255, 255, 255);
    let black = Px::opaque(0, 0, 0);

    assert_eq!(blend_over(grey, white, BlendMode::Multiply).rgb, grey.rgb);
    assert_eq!(blend_over(grey, black, BlendMode::Screen).rgb, grey.rgb);
    assert_eq!(blend_over(grey, white, BlendMode::Normal).rgb, white.rgb);
    assert_eq!(blend_over(grey, Px::TRANSPARENT, BlendMode::Difference), grey);

    let diff = blend_over(grey, white, BlendMode::Difference);
    assert!((diff.rgb[0] - 0.5).abs() < 1e-6);
    assert!((diff.rgb[1] - 0.75).abs() < 1e-6);
    assert!(diff.rgb[2].abs() < 1e-6);
}

#[test]
fn luminosity_keeps_backdrop_hue() {
    let red = Px::opaque(255, 0, 0);
    let grey = Px {
        rgb: [0.3, 0.3, 0.3],
        a: 1.0,
    };
    let out = blend_over(red, grey, BlendMode::Luminosity);
    assert!(out.rgb[0] > out.rgb[1]);
    assert!((out.rgb[1] - out.rgb[2]).abs() < 1e-6);
}

#[test]
fn lighter_adds_and_saturates() {
    let a = Px {
        rgb: [0.6, 0.2, 0.0],
        a: 1.0,
    };
    let out = CompositeOp::Lighter.composite(a, a);
    assert!((out.rgb[0] - 1.0).abs() < 1e-6);
    assert!((out.rgb[1] - 0.4).abs() < 1e-6);
    assert_eq!(out.a, 1.0);
}

#[test]
fn composite_names_follow_canvas_vocabulary() {
    assert_eq!(CompositeOp::SourceOver.name(), "source-over");
    assert_eq!(CompositeOp::Lighter.name(), "lighter");
    assert_eq!(CompositeOp::ColorDodge.name(), "color-dodge");
    assert_eq!(BlendMode::HardLight.name(), "hard-light");
}
