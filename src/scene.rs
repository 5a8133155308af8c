//! The page the overlay lives on: host image, its wrapper, and the wave container.
//!
//! Sizes are layout pixels in a virtual viewport; the compositor maps them onto the terminal
//! pixel grid.

use crate::blend::{BlendMode, Px};
use crate::layout::{Geometry, ImageStyle};
use image::RgbaImage;
use std::path::{Path, PathBuf};

/// Fixed wrapper footprint for the round presentation.
pub const CIRCLE_FOOTPRINT: f64 = 400.0;
const IMAGE_MAX_WIDTH_FRACTION: f64 = 0.5;
const IMAGE_MAX_HEIGHT_FRACTION: f64 = 0.6;

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("failed to load image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("image {path} has zero size")]
    Empty { path: PathBuf },
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn center_y(&self) -> f64 {
        self.y + self.h * 0.5
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x < self.x + self.w && y >= self.y && y < self.y + self.h
    }
}

pub struct HostImage {
    pixels: RgbaImage,
    /// Presentation class toggled by the style applier.
    pub circle: bool,
}

impl HostImage {
    pub fn load(path: &Path) -> Result<Self, ImageError> {
        let decoded = image::open(path).map_err(|source| ImageError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        let pixels = decoded.to_rgba8();
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(ImageError::Empty {
                path: path.to_path_buf(),
            });
        }
        Ok(Self::from_rgba(pixels))
    }

    pub fn from_rgba(pixels: RgbaImage) -> Self {
        Self {
            pixels,
            circle: false,
        }
    }

    /// Soft portrait-shaped gradient used when no image is given.
    pub fn placeholder() -> Self {
        let (w, h) = (480u32, 640u32);
        let pixels = RgbaImage::from_fn(w, h, |x, y| {
            let u = x as f32 / w as f32 - 0.5;
            let v = y as f32 / h as f32 - 0.42;
            let d = (u * u + v * v * 0.6).sqrt();
            let glow = (1.0 - d * 1.8).clamp(0.0, 1.0);
            let band = ((y as f32 / h as f32) * 9.0).sin() * 0.04;
            let r = 0.10 + 0.55 * glow + band;
            let g = 0.12 + 0.35 * glow;
            let b = 0.22 + 0.45 * glow - band;
            let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0) as u8;
            image::Rgba([q(r), q(g), q(b), 255])
        });
        Self::from_rgba(pixels)
    }

    pub fn natural_size(&self) -> (f64, f64) {
        (self.pixels.width() as f64, self.pixels.height() as f64)
    }

    /// Nearest-neighbour lookup in normalised image coordinates.
    pub fn sample(&self, u: f64, v: f64) -> Px {
        let (w, h) = (self.pixels.width(), self.pixels.height());
        let x = ((u.clamp(0.0, 1.0) * w as f64) as u32).min(w - 1);
        let y = ((v.clamp(0.0, 1.0) * h as f64) as u32).min(h - 1);
        let p = self.pixels.get_pixel(x, y).0;
        Px {
            rgb: [p[0] as f32 / 255.0, p[1] as f32 / 255.0, p[2] as f32 / 255.0],
            a: p[3] as f32 / 255.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Wrapper {
    pub circle: bool,
    /// Explicit width/height overriding natural flow sizing.
    pub fixed_size: Option<(f64, f64)>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveContainer {
    pub blend: BlendMode,
    pub rect: Rect,
}

pub struct Scene {
    pub viewport: (f64, f64),
    pub image: HostImage,
    pub wrapper: Wrapper,
    pub container: WaveContainer,
}

impl Scene {
    pub fn new(image: HostImage, viewport_w: f64, viewport_h: f64) -> Self {
        Self {
            viewport: (viewport_w, viewport_h),
            image,
            wrapper: Wrapper::default(),
            container: WaveContainer {
                blend: BlendMode::Normal,
                rect: Rect::default(),
            },
        }
    }

    pub fn set_viewport(&mut self, w: f64, h: f64) {
        self.viewport = (w.max(1.0), h.max(1.0));
    }

    /// Container blend mode plus the circle presentation toggles.
    pub fn apply_styles(&mut self, container_blend: BlendMode, style: ImageStyle) {
        self.container.blend = container_blend;

        let circle = style.is_circle();
        self.image.circle = circle;
        self.wrapper.circle = circle;
        self.wrapper.fixed_size = if circle {
            Some((CIRCLE_FOOTPRINT, CIRCLE_FOOTPRINT))
        } else {
            None
        };
    }

    pub fn wrapper_rect(&self) -> Rect {
        let (w, h) = match self.wrapper.fixed_size {
            Some(size) => size,
            None => self.natural_image_size(),
        };
        let (vw, vh) = self.viewport;
        Rect {
            x: (vw - w) * 0.5,
            y: (vh - h) * 0.5,
            w,
            h,
        }
    }

    /// Rendered box of the host image.
    pub fn image_rect(&self) -> Rect {
        let wrapper = self.wrapper_rect();
        if self.image.circle && self.wrapper.fixed_size.is_some() {
            return wrapper;
        }
        let (w, h) = self.natural_image_size();
        Rect {
            x: wrapper.x,
            y: wrapper.y,
            w,
            h,
        }
    }

    pub fn place_wave_container(&mut self, geometry: &Geometry) {
        let image = self.image_rect();
        self.container.rect = Rect {
            x: image.x + geometry.left_offset,
            y: image.center_y() - geometry.container_max_height * 0.5,
            w: geometry.wave_width,
            h: geometry.container_max_height,
        };
    }

    /// Natural size scaled down to the viewport limits, never up.
    fn natural_image_size(&self) -> (f64, f64) {
        let (nw, nh) = self.image.natural_size();
        let (vw, vh) = self.viewport;
        let max_w = vw * IMAGE_MAX_WIDTH_FRACTION;
        let max_h = vh * IMAGE_MAX_HEIGHT_FRACTION;
        let scale = (max_w / nw).min(max_h / nh).min(1.0);
        (nw * scale, nh * scale)
    }
}
