use anyhow::Result;
use clap::Parser;
use resonant_worlds::config::Config;
use resonant_worlds::{app, audio, logging, world};

fn main() -> Result<()> {
    let cfg = Config::parse();
    if cfg.list_devices {
        audio::list_input_devices()?;
        return Ok(());
    }
    if cfg.list_worlds {
        for w in &world::WORLDS {
            println!(
                "{:<3} {:<18} {:<9} {}{}",
                w.id,
                w.name,
                w.category.label(),
                w.style.name(),
                if w.premium { "  (premium)" } else { "" }
            );
        }
        return Ok(());
    }

    let _log_guard = logging::init(cfg.log_file.as_deref())?;
    app::run(cfg)
}
