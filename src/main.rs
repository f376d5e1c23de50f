mod app;
mod audio;
mod config;
mod controller;
mod controls;
mod error;
mod input;
mod logging;
mod messages;
mod permission;
mod services;
mod view;

use app::App;
use config::Config;

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    // Before the config load so its messages are not lost
    let log = logging::init();
    tracing::info!("Starting recplay");

    let config = Config::load()?;
    config.validate()?;
    log.apply_level(&config.log_level);

    // LocalSet for !Send futures (the capture stream holds a cpal::Stream)
    let local = tokio::task::LocalSet::new();

    local
        .run_until(async move { App::new(config).await?.run().await })
        .await
}
