use anyhow::{Context, Result};
use clap::Parser;
use wave_overlay::config::Config;

fn main() -> Result<()> {
    let cfg = Config::parse();
    if cfg.list_devices {
        wave_overlay::audio::list_input_devices()?;
        return Ok(());
    }

    init_logging(&cfg)?;
    wave_overlay::app::run(cfg)
}

/// The alternate screen owns stdout/stderr, so logs go to a file.
fn init_logging(cfg: &Config) -> Result<()> {
    let path = cfg.log_path();
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}
