//! Rasterise the page (background, host image, wave container) onto an RGBA pixel grid.

use crate::blend::{blend_over, BlendMode, Px};
use crate::scene::{Rect, Scene};
use crate::wave::WaveSurface;

pub const PAGE_BACKGROUND: (u8, u8, u8) = (14, 14, 22);

/// `scale` is grid pixels per layout pixel. `out` is resized to `grid_w * grid_h * 4`.
pub fn compose_page(
    scene: &Scene,
    surface: &WaveSurface,
    grid_w: usize,
    grid_h: usize,
    scale: f64,
    out: &mut Vec<u8>,
) {
    out.resize(grid_w.saturating_mul(grid_h).saturating_mul(4), 0);
    if grid_w == 0 || grid_h == 0 || scale <= 0.0 {
        return;
    }

    let background = Px::opaque(PAGE_BACKGROUND.0, PAGE_BACKGROUND.1, PAGE_BACKGROUND.2);
    let image_rect = scene.image_rect();
    let crop = if scene.image.circle {
        cover_crop(scene.image.natural_size(), image_rect)
    } else {
        Crop::FULL
    };
    let container = scene.container;
    let renderer = surface.renderer();

    for gy in 0..grid_h {
        for gx in 0..grid_w {
            let lx = (gx as f64 + 0.5) / scale;
            let ly = (gy as f64 + 0.5) / scale;

            let mut px = background;

            if image_rect.contains(lx, ly) {
                let u = (lx - image_rect.x) / image_rect.w;
                let v = (ly - image_rect.y) / image_rect.h;
                if !scene.image.circle || inside_ellipse(u, v) {
                    let src = scene.image.sample(crop.u0 + u * crop.du, crop.v0 + v * crop.dv);
                    px = blend_over(px, src, BlendMode::Normal);
                }
            }

            if let Some(r) = renderer {
                if container.rect.contains(lx, ly) {
                    let canvas = r.canvas();
                    let (cx, cy) = if r.config().cover {
                        (
                            (lx - container.rect.x) / container.rect.w * canvas.width as f64,
                            (ly - container.rect.y) / container.rect.h * canvas.height as f64,
                        )
                    } else {
                        (
                            (lx - container.rect.x) * r.config().ratio,
                            (ly - container.rect.y) * r.config().ratio,
                        )
                    };
                    if cx >= 0.0 && cy >= 0.0 {
                        let src = canvas.get(cx as usize, cy as usize);
                        px = blend_over(px, src, container.blend);
                    }
                }
            }

            let i = (gy * grid_w + gx) * 4;
            out[i..i + 4].copy_from_slice(&px.to_rgba8());
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Crop {
    u0: f64,
    v0: f64,
    du: f64,
    dv: f64,
}

impl Crop {
    const FULL: Crop = Crop {
        u0: 0.0,
        v0: 0.0,
        du: 1.0,
        dv: 1.0,
    };
}

/// Centre crop so the image covers `rect` without distortion.
fn cover_crop((nw, nh): (f64, f64), rect: Rect) -> Crop {
    if nw <= 0.0 || nh <= 0.0 || rect.w <= 0.0 || rect.h <= 0.0 {
        return Crop::FULL;
    }
    let image_aspect = nw / nh;
    let box_aspect = rect.w / rect.h;
    if image_aspect > box_aspect {
        let du = box_aspect / image_aspect;
        Crop {
            u0: (1.0 - du) * 0.5,
            v0: 0.0,
            du,
            dv: 1.0,
        }
    } else {
        let dv = image_aspect / box_aspect;
        Crop {
            u0: 0.0,
            v0: (1.0 - dv) * 0.5,
            du: 1.0,
            dv,
        }
    }
}

fn inside_ellipse(u: f64, v: f64) -> bool {
    let dx = u - 0.5;
    let dy = v - 0.5;
    dx * dx + dy * dy <= 0.25
}
