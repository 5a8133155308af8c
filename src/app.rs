use crate::audio::{self, AudioError, AudioInput, PendingAcquisition};
use crate::compose::compose_page;
use crate::config::Config;
use crate::controls::{ControlEvent, ControlId, Controls};
use crate::render::{Frame, HalfBlockRenderer, Renderer};
use crate::scene::{HostImage, Scene};
use crate::scheduler::Task;
use crate::terminal::TerminalGuard;
use crate::visualizer::{AudioState, Timing, Visualizer};
use crate::wave::WaveSurface;
use anyhow::Context;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use std::io::BufWriter;
use std::time::{Duration, Instant};

/// Layout of the page on the terminal pixel grid for one terminal size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub cols: u16,
    pub rows: u16,
    pub visual_rows: u16,
    pub hud_rows: u16,
    pub grid_w: usize,
    pub grid_h: usize,
    pub page_w: f64,
    pub page_h: f64,
    /// Grid pixels per layout pixel.
    pub scale: f64,
}

impl Viewport {
    pub fn new(size: (u16, u16), show_hud: bool, page_width: f64) -> Self {
        let (cols, rows) = size;
        let hud_rows = hud_rows_for_size(size, show_hud);
        let visual_rows = rows.saturating_sub(hud_rows).max(1);
        let grid_w = cols.max(1) as usize;
        let grid_h = visual_rows as usize * 2;
        let page_w = page_width.max(1.0);
        let scale = grid_w as f64 / page_w;
        Self {
            cols,
            rows,
            visual_rows,
            hud_rows,
            grid_w,
            grid_h,
            page_w,
            page_h: grid_h as f64 / scale,
            scale,
        }
    }
}

fn hud_rows_for_size(size: (u16, u16), show_hud: bool) -> u16 {
    if !show_hud || size.1 <= 1 {
        return 0;
    }
    (size.1 - 1).min(3)
}

struct Panel {
    focus: usize,
    show_hud: bool,
    show_help: bool,
}

impl Panel {
    fn focused(&self) -> ControlId {
        ControlId::ORDER[self.focus % ControlId::ORDER.len()]
    }
}

enum KeyAction {
    Quit,
    Control(ControlEvent),
    Layout,
    None,
}

pub fn run(cfg: Config) -> anyhow::Result<()> {
    let image = match cfg.image.as_deref() {
        Some(path) => HostImage::load(path).context("load host image")?,
        None => HostImage::placeholder(),
    };
    let controls = Controls::new(
        [cfg.color1.clone(), cfg.color2.clone(), cfg.color3.clone()],
        [cfg.opacity1, cfg.opacity2, cfg.opacity3],
        cfg.canvas_blend,
        cfg.bg_blend,
        cfg.style,
    );
    let timing = Timing {
        rebuild_delay_ms: cfg.rebuild_delay_ms,
        startup_delay_ms: cfg.startup_delay_ms,
    };

    let _term = TerminalGuard::new()?;
    let mut out = BufWriter::new(TerminalGuard::stdout());
    let mut renderer = HalfBlockRenderer::new();

    let mut panel = Panel {
        focus: 0,
        show_hud: true,
        show_help: false,
    };
    let mut last_size = TerminalGuard::size()?;
    let mut view = Viewport::new(last_size, panel.show_hud, cfg.page_width);

    let scene = Scene::new(image, view.page_w, view.page_h);
    let mut vis = Visualizer::new(scene, controls, WaveSurface::ios9(), timing);
    vis.set_viewport(view.page_w, view.page_h, view.scale);

    let start = Instant::now();
    vis.initialize(0.0);
    vis.handle_event(ControlEvent::ImageLoaded, 0.0);
    log::info!(
        "started: {}x{} cells, page {:.0}x{:.0}",
        view.cols,
        view.rows,
        view.page_w,
        view.page_h
    );

    let mut pending: Option<PendingAcquisition> = None;
    let mut fps = FpsCounter::new();
    let mut pixels = Vec::new();

    loop {
        let frame_start = Instant::now();
        let now_ms = start.elapsed().as_secs_f64() * 1000.0;
        let mut relayout = false;

        while event::poll(Duration::from_millis(0))? {
            match event::read()? {
                Event::Key(k) if k.kind != KeyEventKind::Release => {
                    match handle_key(k.code, k.modifiers, &mut panel, &mut vis.controls) {
                        KeyAction::Quit => {
                            vis.cleanup();
                            return Ok(());
                        }
                        KeyAction::Control(ev) => {
                            vis.handle_event(ev, now_ms);
                        }
                        KeyAction::Layout => relayout = true,
                        KeyAction::None => {}
                    }
                }
                Event::Resize(c, r) => {
                    last_size = (c, r);
                    relayout = true;
                }
                _ => {}
            }
        }

        // Resize events can be missed in some terminals.
        let sz = crossterm::terminal::size()?;
        if sz != last_size {
            last_size = sz;
            relayout = true;
        }
        if relayout {
            view = Viewport::new(last_size, panel.show_hud, cfg.page_width);
            vis.set_viewport(view.page_w, view.page_h, view.scale);
            vis.handle_event(ControlEvent::Resized, now_ms);
        }

        for task in vis.run_due(now_ms) {
            if task == Task::StartAudio && pending.is_none() && !vis.has_audio() {
                pending = Some(if cfg.no_audio {
                    audio::refused(AudioError::Disabled)
                } else {
                    audio::acquire(cfg.device.clone())
                });
            }
        }
        if let Some(result) = pending.as_mut().and_then(PendingAcquisition::poll) {
            pending = None;
            vis.attach_audio(result.map(|s| Box::new(s) as Box<dyn AudioInput>));
        }

        vis.on_display_frame(now_ms);

        compose_page(
            &vis.scene,
            vis.surface(),
            view.grid_w,
            view.grid_h,
            view.scale,
            &mut pixels,
        );

        let hud = if panel.show_hud {
            build_hud(&vis, &panel, fps.fps())
        } else {
            String::new()
        };
        let frame = Frame {
            term_cols: view.cols,
            term_rows: view.rows,
            visual_rows: view.visual_rows,
            pixel_width: view.grid_w,
            pixel_height: view.grid_h,
            pixels_rgba: &pixels,
            hud: &hud,
            hud_rows: view.hud_rows,
            hud_focus: panel.show_hud.then_some(1),
            overlay: panel.show_help.then_some(help_popup_text()),
            sync_updates: cfg.sync_updates,
        };
        renderer.render(&frame, &mut out)?;
        fps.tick();

        let target = Duration::from_secs_f32(1.0 / cfg.fps.max(1) as f32);
        let elapsed = frame_start.elapsed();
        if elapsed < target {
            std::thread::sleep(target - elapsed);
        }
    }
}

fn handle_key(
    code: KeyCode,
    mods: KeyModifiers,
    panel: &mut Panel,
    controls: &mut Controls,
) -> KeyAction {
    if mods.contains(KeyModifiers::CONTROL) && matches!(code, KeyCode::Char('c')) {
        return KeyAction::Quit;
    }
    let n = ControlId::ORDER.len();
    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => KeyAction::Quit,
        KeyCode::Down | KeyCode::Tab => {
            panel.focus = (panel.focus + 1) % n;
            KeyAction::None
        }
        KeyCode::Up | KeyCode::BackTab => {
            panel.focus = (panel.focus + n - 1) % n;
            KeyAction::None
        }
        KeyCode::Right | KeyCode::Left => {
            let forward = code == KeyCode::Right;
            match controls.step(panel.focused(), forward) {
                Some(ev) => KeyAction::Control(ev),
                None => KeyAction::None,
            }
        }
        KeyCode::Char('i') | KeyCode::Char('I') => {
            panel.show_hud = !panel.show_hud;
            KeyAction::Layout
        }
        KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::F(1) => {
            panel.show_help = !panel.show_help;
            KeyAction::None
        }
        _ => KeyAction::None,
    }
}

fn build_hud(vis: &Visualizer, panel: &Panel, fps: f32) -> String {
    let c = &vis.controls;
    let layers = (0..c.layers.len())
        .map(|i| format!("c{} {} {}", i + 1, c.layers[i].color, c.opacity_labels[i]))
        .collect::<Vec<_>>()
        .join(" | ");
    let summary = format!(
        "canvas {} | bg {} | style {} | {}",
        c.canvas_blend.name(),
        c.bg_blend.name(),
        c.image_style.name(),
        layers
    );

    let focused = panel.focused();
    let focus_line = format!(
        "> {}: {}   (up/down select, left/right change)",
        focused.label(),
        c.describe(focused)
    );

    let audio = match vis.audio_state() {
        AudioState::Waiting => "waiting",
        AudioState::Listening => "listening",
        AudioState::Idle => "idle (no mic)",
        AudioState::Closed => "closed",
    };
    let (amp, speed) = vis
        .last_tick()
        .map(|t| (t.amplitude, t.speed))
        .unwrap_or((None, 0.0));
    let status = format!(
        "audio {} | amp {} | speed {:.2} | FPS {:.1} | i HUD | ? help | q quit",
        audio,
        amp.map(|a| format!("{a:.2}")).unwrap_or_else(|| "-".to_string()),
        speed,
        fps
    );

    [summary, focus_line, status].join("\n")
}

fn help_popup_text() -> &'static str {
    "Wave Overlay Keys\n\
up/down or tab  select control\n\
left/right  change selected control\n\
i  show/hide HUD\n\
? or h or F1  toggle this help\n\
q or esc  quit"
}

struct FpsCounter {
    last: Instant,
    frames: u32,
    fps: f32,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            last: Instant::now(),
            frames: 0,
            fps: 0.0,
        }
    }

    fn tick(&mut self) {
        self.frames += 1;
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f32();
        if dt >= 0.5 {
            self.fps = (self.frames as f32) / dt;
            self.frames = 0;
            self.last = now;
        }
    }

    fn fps(&self) -> f32 {
        self.fps
    }
}
