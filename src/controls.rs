//! Live control values and the wiring from control events to relayout/rebuild triggers.

use crate::blend::{BlendMode, CompositeOp};
use crate::color::{color_string, hex_to_rgb};
use crate::layout::ImageStyle;
use crate::wave::CurveLayer;

pub const LAYER_COUNT: usize = 3;
pub const OPACITY_STEP: f64 = 0.1;

/// Picker palette the colour controls step through.
pub const SWATCHES: [&str; 12] = [
    "#ff3b6b", "#ff8a3b", "#ffd23b", "#8aff3b", "#3bffa1", "#3bf0ff", "#3b8aff", "#6b3bff",
    "#c23bff", "#ff3bd2", "#ffffff", "#7f7f7f",
];

#[derive(Debug, Clone, PartialEq)]
pub struct ColorLayer {
    /// Raw picker value; kept as typed even when malformed.
    pub color: String,
    pub opacity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Controls {
    pub layers: [ColorLayer; LAYER_COUNT],
    pub opacity_labels: [String; LAYER_COUNT],
    pub canvas_blend: CompositeOp,
    pub bg_blend: BlendMode,
    pub image_style: ImageStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlId {
    CanvasBlend,
    BgBlend,
    ImageStyle,
    Color(usize),
    Opacity(usize),
}

impl ControlId {
    /// Panel order used for keyboard focus.
    pub const ORDER: [ControlId; 9] = [
        ControlId::CanvasBlend,
        ControlId::BgBlend,
        ControlId::ImageStyle,
        ControlId::Color(0),
        ControlId::Opacity(0),
        ControlId::Color(1),
        ControlId::Opacity(1),
        ControlId::Color(2),
        ControlId::Opacity(2),
    ];

    pub fn label(self) -> String {
        match self {
            Self::CanvasBlend => "canvas blend".to_string(),
            Self::BgBlend => "bg blend".to_string(),
            Self::ImageStyle => "style".to_string(),
            Self::Color(i) => format!("color{}", i + 1),
            Self::Opacity(i) => format!("opacity{}", i + 1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    ImageLoaded,
    Resized,
    /// Committed change of a select or colour picker.
    Change(ControlId),
    /// Every movement of a slider.
    Input(ControlId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Recompute geometry and rebuild the renderer immediately.
    Relayout,
    /// Stop, restyle, and rebuild after the settle delay.
    Update,
}

/// Which trigger a control event fires. No debouncing: every slider tick is a full update.
pub fn route(event: ControlEvent) -> Trigger {
    match event {
        ControlEvent::ImageLoaded | ControlEvent::Resized => Trigger::Relayout,
        ControlEvent::Change(_) | ControlEvent::Input(_) => Trigger::Update,
    }
}

pub fn snap_opacity(value: f64) -> f64 {
    if !value.is_finite() {
        return 1.0;
    }
    (value.clamp(0.0, 1.0) / OPACITY_STEP).round() / (1.0 / OPACITY_STEP).round()
}

pub fn opacity_label(value: f64) -> String {
    format!("{value:.1}")
}

impl Controls {
    pub fn new(
        colors: [String; LAYER_COUNT],
        opacities: [f64; LAYER_COUNT],
        canvas_blend: CompositeOp,
        bg_blend: BlendMode,
        image_style: ImageStyle,
    ) -> Self {
        let opacities = opacities.map(snap_opacity);
        let mut colors = colors.into_iter();
        let layers = std::array::from_fn(|i| ColorLayer {
            color: colors.next().unwrap_or_default(),
            opacity: opacities[i],
        });
        Self {
            layers,
            opacity_labels: opacities.map(opacity_label),
            canvas_blend,
            bg_blend,
            image_style,
        }
    }

    /// Transparent support line followed by the three colour layers.
    pub fn curve_definition(&self) -> Vec<CurveLayer> {
        let mut out = Vec::with_capacity(LAYER_COUNT + 1);
        out.push(CurveLayer::support_line());
        out.extend(self.layers.iter().map(|layer| CurveLayer {
            color: color_string(&layer.color, 1.0),
            opacity: layer.opacity,
            support_line: false,
        }));
        out
    }

    pub fn set_opacity(&mut self, idx: usize, value: f64) -> Option<ControlEvent> {
        let layer = self.layers.get_mut(idx)?;
        layer.opacity = snap_opacity(value);
        Some(ControlEvent::Input(ControlId::Opacity(idx)))
    }

    pub fn set_color(&mut self, idx: usize, hex: &str) -> Option<ControlEvent> {
        let layer = self.layers.get_mut(idx)?;
        layer.color = hex.to_string();
        Some(ControlEvent::Change(ControlId::Color(idx)))
    }

    /// Refresh the numeric label next to a slider.
    pub fn sync_label(&mut self, idx: usize) {
        if let (Some(label), Some(layer)) = (self.opacity_labels.get_mut(idx), self.layers.get(idx)) {
            *label = opacity_label(layer.opacity);
        }
    }

    /// Move a control one notch. Returns the event the control fires.
    pub fn step(&mut self, id: ControlId, forward: bool) -> Option<ControlEvent> {
        match id {
            ControlId::CanvasBlend => {
                self.canvas_blend = cycle(&CompositeOp::all(), self.canvas_blend, forward);
                Some(ControlEvent::Change(id))
            }
            ControlId::BgBlend => {
                self.bg_blend = cycle(&BlendMode::all(), self.bg_blend, forward);
                Some(ControlEvent::Change(id))
            }
            ControlId::ImageStyle => {
                self.image_style = cycle(&[ImageStyle::Default, ImageStyle::Circle], self.image_style, forward);
                Some(ControlEvent::Change(id))
            }
            ControlId::Color(i) => {
                let current = hex_to_rgb(&self.layers.get(i)?.color).map(|c| c.to_hex());
                let pos = SWATCHES.iter().position(|s| Some(*s) == current.as_deref());
                let next = match (pos, forward) {
                    (Some(p), true) => (p + 1) % SWATCHES.len(),
                    (Some(p), false) => (p + SWATCHES.len() - 1) % SWATCHES.len(),
                    (None, _) => 0,
                };
                self.set_color(i, SWATCHES[next])
            }
            ControlId::Opacity(i) => {
                let current = self.layers.get(i)?.opacity;
                let delta = if forward { OPACITY_STEP } else { -OPACITY_STEP };
                self.set_opacity(i, current + delta)
            }
        }
    }

    pub fn describe(&self, id: ControlId) -> String {
        match id {
            ControlId::CanvasBlend => self.canvas_blend.name().to_string(),
            ControlId::BgBlend => self.bg_blend.name().to_string(),
            ControlId::ImageStyle => self.image_style.name().to_string(),
            ControlId::Color(i) => self
                .layers
                .get(i)
                .map(|l| l.color.clone())
                .unwrap_or_default(),
            ControlId::Opacity(i) => self.opacity_labels.get(i).cloned().unwrap_or_default(),
        }
    }
}

fn cycle<T: Copy + PartialEq>(all: &[T], current: T, forward: bool) -> T {
    let Some(pos) = all.iter().position(|v| *v == current) else {
        return current;
    };
    let n = all.len();
    let next = if forward { (pos + 1) % n } else { (pos + n - 1) % n };
    all[next]
}
