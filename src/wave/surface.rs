use super::{CurveLayer, Ios9Wave, WaveConfig, WaveRenderer};
use crate::blend::CompositeOp;
use crate::layout::Geometry;

pub const WAVE_STYLE: &str = "ios9";
pub const AMPLITUDE_SEED: f64 = 3.0;
pub const BASE_SPEED: f64 = 0.2;

pub type RendererFactory = Box<dyn FnMut(WaveConfig) -> Box<dyn WaveRenderer>>;

/// Holds at most one live renderer and rebuilds it wholesale on every reconfigure.
pub struct WaveSurface {
    factory: RendererFactory,
    current: Option<Box<dyn WaveRenderer>>,
}

impl WaveSurface {
    pub fn new(factory: RendererFactory) -> Self {
        Self {
            factory,
            current: None,
        }
    }

    pub fn ios9() -> Self {
        Self::new(Box::new(|cfg: WaveConfig| Box::new(Ios9Wave::new(cfg)) as Box<dyn WaveRenderer>))
    }

    pub fn reconfigure(
        &mut self,
        geometry: &Geometry,
        curve_definition: Vec<CurveLayer>,
        composite: CompositeOp,
        ratio: f64,
    ) {
        if let Some(mut old) = self.current.take() {
            old.dispose();
        }

        let cfg = WaveConfig {
            width: geometry.wave_width,
            height: geometry.container_max_height,
            ratio,
            style: WAVE_STYLE,
            amplitude: AMPLITUDE_SEED,
            speed: BASE_SPEED,
            autostart: false,
            cover: true,
            curve_definition,
            global_composite_operation: composite,
        };
        log::debug!(
            "wave surface rebuilt: {:.0}x{:.0} op={}",
            cfg.width,
            cfg.height,
            composite.name()
        );
        self.current = Some((self.factory)(cfg));
    }

    pub fn start(&mut self) {
        if let Some(r) = self.current.as_mut() {
            r.start();
        }
    }

    pub fn stop(&mut self) {
        if let Some(r) = self.current.as_mut() {
            r.stop();
        }
    }

    pub fn set_amplitude(&mut self, value: f64) {
        if let Some(r) = self.current.as_mut() {
            r.set_amplitude(value);
        }
    }

    pub fn set_speed(&mut self, value: f64) {
        if let Some(r) = self.current.as_mut() {
            r.set_speed(value);
        }
    }

    pub fn dispose(&mut self) {
        if let Some(mut r) = self.current.take() {
            r.dispose();
        }
    }

    pub fn draw_frame(&mut self, now_ms: f64) {
        if let Some(r) = self.current.as_mut() {
            r.draw_frame(now_ms);
        }
    }

    pub fn renderer(&self) -> Option<&dyn WaveRenderer> {
        self.current.as_deref()
    }

    pub fn is_live(&self) -> bool {
        self.current.is_some()
    }
}
