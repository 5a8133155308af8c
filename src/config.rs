use crate::blend::{BlendMode, CompositeOp};
use crate::layout::ImageStyle;
use crate::visualizer::{DEFAULT_REBUILD_DELAY_MS, DEFAULT_STARTUP_DELAY_MS};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "wave-overlay", version, about = "Audio-reactive wave overlay on an image, in the terminal")]
pub struct Config {
    /// Host image; a generated placeholder is used when omitted.
    #[arg(long)]
    pub image: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub list_devices: bool,

    /// Input device name substring.
    #[arg(long)]
    pub device: Option<String>,

    /// Skip the microphone and run the idle animation.
    #[arg(long, default_value_t = false)]
    pub no_audio: bool,

    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    #[arg(long, default_value = "#ff3b6b")]
    pub color1: String,

    #[arg(long, default_value = "#3bf0ff")]
    pub color2: String,

    #[arg(long, default_value = "#6b3bff")]
    pub color3: String,

    #[arg(long, default_value_t = 1.0)]
    pub opacity1: f64,

    #[arg(long, default_value_t = 0.8)]
    pub opacity2: f64,

    #[arg(long, default_value_t = 0.6)]
    pub opacity3: f64,

    #[arg(long, value_enum, default_value_t = CompositeOp::Lighter)]
    pub canvas_blend: CompositeOp,

    #[arg(long, value_enum, default_value_t = BlendMode::Screen)]
    pub bg_blend: BlendMode,

    #[arg(long, value_enum, default_value_t = ImageStyle::Default)]
    pub style: ImageStyle,

    /// Width of the virtual page in layout pixels; height follows the terminal aspect.
    #[arg(long, default_value_t = 1280.0)]
    pub page_width: f64,

    #[arg(long, default_value_t = DEFAULT_STARTUP_DELAY_MS)]
    pub startup_delay_ms: f64,

    #[arg(long, default_value_t = DEFAULT_REBUILD_DELAY_MS)]
    pub rebuild_delay_ms: f64,

    /// Log destination; defaults to wave_overlay.log in the temp directory.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub sync_updates: bool,
}

impl Config {
    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("wave_overlay.log"))
    }
}
