use anyhow::Context;
use env_logger::Env;

use pawnview::{ViewerApp, ViewerSettings};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let settings = ViewerSettings::from_env();
    log::debug!("Starting with {:?}", settings);

    let app = ViewerApp::new(settings).context("failed to create event loop")?;
    app.run().context("event loop terminated with an error")?;
    Ok(())
}
