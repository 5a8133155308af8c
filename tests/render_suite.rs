use image::{Rgba, RgbaImage};
use wave_overlay::blend::{BlendMode, CompositeOp};
use wave_overlay::compose::{compose_page, PAGE_BACKGROUND};
use wave_overlay::layout::{calculate, ImageStyle};
use wave_overlay::render::{Frame, HalfBlockRenderer, Renderer};
use wave_overlay::scene::{HostImage, Scene};
use wave_overlay::wave::{CurveLayer, WaveSurface};

fn frame<'a>(pixels: &'a [u8], hud: &'a str, hud_focus: Option<usize>) -> Frame<'a> {
    Frame {
        term_cols: 2,
        term_rows: 3,
        visual_rows: 1,
        pixel_width: 2,
        pixel_height: 2,
        pixels_rgba: pixels,
        hud,
        hud_rows: 2,
        hud_focus,
        overlay: None,
        sync_updates: false,
    }
}

fn render(frame: &Frame<'_>) -> String {
    let mut out = Vec::new();
    HalfBlockRenderer::new()
        .render(frame, &mut out)
        .expect("render");
    String::from_utf8(out).expect("utf8")
}

fn pixel(buf: &[u8], grid_w: usize, x: usize, y: usize) -> [u8; 4] {
    let i = (y * grid_w + x) * 4;
    [buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]
}

fn solid(w: u32, h: u32, rgb: [u8; 3]) -> HostImage {
    HostImage::from_rgba(RgbaImage::from_pixel(w, h, Rgba([rgb[0], rgb[1], rgb[2], 255])))
}

const BG: [u8; 4] = [PAGE_BACKGROUND.0, PAGE_BACKGROUND.1, PAGE_BACKGROUND.2, 255];

#[test]
fn halfblock_maps_pixel_pairs_to_cells() {
    #[rustfmt::skip]
    let pixels = [
        255, 0, 0, 255,   0, 255, 0, 255,
        0, 0, 255, 255,   0, 255, 0, 255,
    ];
    let out = render(&frame(&pixels, "", None));
    assert!(out.contains("\x1b[38;2;255;0;0m"));
    assert!(out.contains("\x1b[48;2;0;0;255m"));
    assert!(out.contains("\x1b[38;2;0;255;0m\x1b[48;2;0;255;0m"));
    assert_eq!(out.matches('\u{2580}').count(), 2);
    assert!(out.starts_with("\x1b[H"));
    assert!(out.ends_with("\x1b[?7h"));
}

#[test]
fn halfblock_highlights_the_focused_hud_line() {
    let pixels = [0u8; 16];
    let out = render(&frame(&pixels, "blend\nstyle", Some(1)));
    // Lines are clipped to the terminal width.
    assert!(out.contains("\x1b[2Kbl"));
    assert!(!out.contains("blend"));
    assert!(out.contains("\x1b[7mst\x1b[27m"), "{out:?}");
    assert!(!out.contains("\x1b[7mbl"));
}

#[test]
fn halfblock_skips_mismatched_frames() {
    let pixels = [0u8; 8];
    let mut f = frame(&pixels, "", None);
    f.pixel_height = 1;
    assert!(render(&f).is_empty());
}

#[test]
fn sync_updates_wrap_the_frame() {
    let pixels = [0u8; 16];
    let mut f = frame(&pixels, "", None);
    f.sync_updates = true;
    let out = render(&f);
    assert!(out.starts_with("\x1b[?2026h"));
    assert!(out.ends_with("\x1b[?2026l"));
}

#[test]
fn overlay_popup_is_boxed() {
    let pixels = vec![0u8; 20 * 10 * 4];
    let f = Frame {
        term_cols: 20,
        term_rows: 8,
        visual_rows: 5,
        pixel_width: 20,
        pixel_height: 10,
        pixels_rgba: &pixels,
        hud: "",
        hud_rows: 3,
        hud_focus: None,
        overlay: Some("help"),
        sync_updates: false,
    };
    let out = render(&f);
    assert!(out.contains("| help |"));
    assert!(out.contains("+------+"));
}

#[test]
fn page_shows_image_centred_on_background() {
    let scene = Scene::new(solid(10, 10, [200, 10, 10]), 100.0, 100.0);
    let surface = WaveSurface::ios9();
    let mut buf = Vec::new();
    compose_page(&scene, &surface, 100, 100, 1.0, &mut buf);

    assert_eq!(buf.len(), 100 * 100 * 4);
    assert_eq!(pixel(&buf, 100, 0, 0), BG);
    assert_eq!(pixel(&buf, 100, 50, 50), [200, 10, 10, 255]);
    assert_eq!(pixel(&buf, 100, 44, 50), BG);
}

#[test]
fn circle_style_masks_the_corners() {
    let mut scene = Scene::new(solid(30, 10, [10, 200, 10]), 800.0, 800.0);
    scene.apply_styles(BlendMode::Normal, ImageStyle::Circle);
    let surface = WaveSurface::ios9();
    let mut buf = Vec::new();
    compose_page(&scene, &surface, 80, 80, 0.1, &mut buf);

    // Wrapper is a 400x400 box at (200, 200) layout px.
    assert_eq!(pixel(&buf, 80, 20, 20), BG);
    assert_eq!(pixel(&buf, 80, 40, 40), [10, 200, 10, 255]);
    assert_eq!(pixel(&buf, 80, 40, 21), [10, 200, 10, 255]);
}

#[test]
fn stopped_wave_leaves_the_page_untouched() {
    let mut scene = Scene::new(solid(10, 10, [90, 90, 90]), 100.0, 100.0);
    scene.apply_styles(BlendMode::Screen, ImageStyle::Default);
    let image = scene.image_rect();
    let g = calculate(image.w, image.h, ImageStyle::Default);
    scene.place_wave_container(&g);

    let mut surface = WaveSurface::ios9();
    surface.reconfigure(
        &g,
        vec![CurveLayer::support_line()],
        CompositeOp::Lighter,
        1.0,
    );
    let mut buf = Vec::new();
    compose_page(&scene, &surface, 100, 100, 1.0, &mut buf);
    assert_eq!(pixel(&buf, 100, 50, 50), [90, 90, 90, 255]);
    assert_eq!(pixel(&buf, 100, 50, 35), BG);
}

#[test]
fn empty_grid_is_a_no_op() {
    let scene = Scene::new(solid(4, 4, [1, 2, 3]), 100.0, 100.0);
    let mut buf = vec![7u8; 12];
    compose_page(&scene, &WaveSurface::ios9(), 0, 10, 1.0, &mut buf);
    assert!(buf.is_empty());
}
