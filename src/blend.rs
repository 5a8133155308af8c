//! Compositing operators offered by the blend selectors and the per-pixel math behind them.
//!
//! Colours are straight (non-premultiplied) RGB in 0..1. Blending follows the W3C
//! compositing model: the source colour is first mixed with the blend result weighted by the
//! backdrop alpha, then composited with source-over (or additive `lighter`).

use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Px {
    pub rgb: [f32; 3],
    pub a: f32,
}

impl Px {
    pub const TRANSPARENT: Px = Px {
        rgb: [0.0; 3],
        a: 0.0,
    };

    pub fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self {
            rgb: [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0],
            a: 1.0,
        }
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8;
        [q(self.rgb[0]), q(self.rgb[1]), q(self.rgb[2]), q(self.a)]
    }
}

/// Container-level blend mode (`mix-blend-mode` in CSS terms).
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BlendMode {
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

impl BlendMode {
    pub const fn all() -> [Self; 16] {
        [
            Self::Normal,
            Self::Multiply,
            Self::Screen,
            Self::Overlay,
            Self::Darken,
            Self::Lighten,
            Self::ColorDodge,
            Self::ColorBurn,
            Self::HardLight,
            Self::SoftLight,
            Self::Difference,
            Self::Exclusion,
            Self::Hue,
            Self::Saturation,
            Self::Color,
            Self::Luminosity,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Multiply => "multiply",
            Self::Screen => "screen",
            Self::Overlay => "overlay",
            Self::Darken => "darken",
            Self::Lighten => "lighten",
            Self::ColorDodge => "color-dodge",
            Self::ColorBurn => "color-burn",
            Self::HardLight => "hard-light",
            Self::SoftLight => "soft-light",
            Self::Difference => "difference",
            Self::Exclusion => "exclusion",
            Self::Hue => "hue",
            Self::Saturation => "saturation",
            Self::Color => "color",
            Self::Luminosity => "luminosity",
        }
    }

    /// `B(Cb, Cs)` for this mode.
    pub fn blend(self, cb: [f32; 3], cs: [f32; 3]) -> [f32; 3] {
        match self {
            Self::Hue => set_lum(set_sat(cs, sat(cb)), lum(cb)),
            Self::Saturation => set_lum(set_sat(cb, sat(cs)), lum(cb)),
            Self::Color => set_lum(cs, lum(cb)),
            Self::Luminosity => set_lum(cb, lum(cs)),
            _ => std::array::from_fn(|i| self.blend_channel(cb[i], cs[i])),
        }
    }

    fn blend_channel(self, cb: f32, cs: f32) -> f32 {
        match self {
            Self::Normal => cs,
            Self::Multiply => cb * cs,
            Self::Screen => cb + cs - cb * cs,
            Self::Overlay => Self::HardLight.blend_channel(cs, cb),
            Self::Darken => cb.min(cs),
            Self::Lighten => cb.max(cs),
            Self::ColorDodge => {
                if cb <= 0.0 {
                    0.0
                } else if cs >= 1.0 {
                    1.0
                } else {
                    (cb / (1.0 - cs)).min(1.0)
                }
            }
            Self::ColorBurn => {
                if cb >= 1.0 {
                    1.0
                } else if cs <= 0.0 {
                    0.0
                } else {
                    1.0 - ((1.0 - cb) / cs).min(1.0)
                }
            }
            Self::HardLight => {
                if cs <= 0.5 {
                    cb * 2.0 * cs
                } else {
                    let s = 2.0 * cs - 1.0;
                    cb + s - cb * s
                }
            }
            Self::SoftLight => {
                if cs <= 0.5 {
                    cb - (1.0 - 2.0 * cs) * cb * (1.0 - cb)
                } else {
                    let d = if cb <= 0.25 {
                        ((16.0 * cb - 12.0) * cb + 4.0) * cb
                    } else {
                        cb.sqrt()
                    };
                    cb + (2.0 * cs - 1.0) * (d - cb)
                }
            }
            Self::Difference => (cb - cs).abs(),
            Self::Exclusion => cb + cs - 2.0 * cb * cs,
            Self::Hue | Self::Saturation | Self::Color | Self::Luminosity => cs,
        }
    }
}

/// Canvas-level compositing operation (`globalCompositeOperation`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CompositeOp {
    SourceOver,
    Lighter,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

impl CompositeOp {
    pub const fn all() -> [Self; 17] {
        [
            Self::SourceOver,
            Self::Lighter,
            Self::Multiply,
            Self::Screen,
            Self::Overlay,
            Self::Darken,
            Self::Lighten,
            Self::ColorDodge,
            Self::ColorBurn,
            Self::HardLight,
            Self::SoftLight,
            Self::Difference,
            Self::Exclusion,
            Self::Hue,
            Self::Saturation,
            Self::Color,
            Self::Luminosity,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::SourceOver => "source-over",
            Self::Lighter => "lighter",
            other => other.blend_mode().map(BlendMode::name).unwrap_or("lighter"),
        }
    }

    /// The separable/non-separable blend this op applies before source-over, if any.
    pub fn blend_mode(self) -> Option<BlendMode> {
        Some(match self {
            Self::SourceOver => BlendMode::Normal,
            Self::Lighter => return None,
            Self::Multiply => BlendMode::Multiply,
            Self::Screen => BlendMode::Screen,
            Self::Overlay => BlendMode::Overlay,
            Self::Darken => BlendMode::Darken,
            Self::Lighten => BlendMode::Lighten,
            Self::ColorDodge => BlendMode::ColorDodge,
            Self::ColorBurn => BlendMode::ColorBurn,
            Self::HardLight => BlendMode::HardLight,
            Self::SoftLight => BlendMode::SoftLight,
            Self::Difference => BlendMode::Difference,
            Self::Exclusion => BlendMode::Exclusion,
            Self::Hue => BlendMode::Hue,
            Self::Saturation => BlendMode::Saturation,
            Self::Color => BlendMode::Color,
            Self::Luminosity => BlendMode::Luminosity,
        })
    }

    pub fn composite(self, dst: Px, src: Px) -> Px {
        match self.blend_mode() {
            Some(mode) => blend_over(dst, src, mode),
            None => lighter(dst, src),
        }
    }
}

/// Blend `src` onto `dst` with `mode`, then source-over.
pub fn blend_over(dst: Px, src: Px, mode: BlendMode) -> Px {
    if src.a <= 0.0 {
        return dst;
    }
    let mixed = if dst.a > 0.0 && mode != BlendMode::Normal {
        let b = mode.blend(dst.rgb, src.rgb);
        std::array::from_fn(|i| (1.0 - dst.a) * src.rgb[i] + dst.a * b[i])
    } else {
        src.rgb
    };

    let out_a = src.a + dst.a * (1.0 - src.a);
    if out_a <= 0.0 {
        return Px::TRANSPARENT;
    }
    let rgb = std::array::from_fn(|i| {
        (src.a * mixed[i] + dst.a * dst.rgb[i] * (1.0 - src.a)) / out_a
    });
    Px { rgb, a: out_a }
}

fn lighter(dst: Px, src: Px) -> Px {
    let out_a = (src.a + dst.a).min(1.0);
    if out_a <= 0.0 {
        return Px::TRANSPARENT;
    }
    let rgb = std::array::from_fn(|i| {
        let premul = (src.a * src.rgb[i] + dst.a * dst.rgb[i]).min(1.0);
        (premul / out_a).min(1.0)
    });
    Px { rgb, a: out_a }
}

fn lum(c: [f32; 3]) -> f32 {
    0.3 * c[0] + 0.59 * c[1] + 0.11 * c[2]
}

fn clip_color(c: [f32; 3]) -> [f32; 3] {
    let l = lum(c);
    let n = c[0].min(c[1]).min(c[2]);
    let x = c[0].max(c[1]).max(c[2]);
    let mut out = c;
    if n < 0.0 && l - n > f32::EPSILON {
        out = std::array::from_fn(|i| l + (out[i] - l) * l / (l - n));
    }
    if x > 1.0 && x - l > f32::EPSILON {
        out = std::array::from_fn(|i| l + (out[i] - l) * (1.0 - l) / (x - l));
    }
    out
}

fn set_lum(c: [f32; 3], l: f32) -> [f32; 3] {
    let d = l - lum(c);
    clip_color([c[0] + d, c[1] + d, c[2] + d])
}

fn sat(c: [f32; 3]) -> f32 {
    c[0].max(c[1]).max(c[2]) - c[0].min(c[1]).min(c[2])
}

fn set_sat(c: [f32; 3], s: f32) -> [f32; 3] {
    let mut idx = [0usize, 1, 2];
    idx.sort_by(|&a, &b| c[a].total_cmp(&c[b]));
    let (min_i, mid_i, max_i) = (idx[0], idx[1], idx[2]);
    let mut out = [0.0f32; 3];
    if c[max_i] > c[min_i] {
        out[mid_i] = (c[mid_i] - c[min_i]) * s / (c[max_i] - c[min_i]);
        out[max_i] = s;
    }
    out
}
