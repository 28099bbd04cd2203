use anyhow::{Context, Result};
use clap::Parser;
use orbview::{app::ViewerApp, catalog::Catalog, config::ViewerConfig};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ViewerConfig::parse();
    let catalog = match &config.catalog {
        Some(path) => Catalog::load(path)?,
        None => {
            log::warn!("no catalog given, starting with an empty viewer");
            Catalog::default()
        }
    };

    let app = ViewerApp::new(config, catalog).context("failed to create the event loop")?;
    app.run()?;
    Ok(())
}
