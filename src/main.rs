#![forbid(unsafe_code)]
mod cli;
mod components;
mod model;
mod services;
mod settings;
mod state_store;
mod termination;
mod ui_manager;
mod utils;

use std::sync::Arc;

use crate::services::upload_client::{HttpUploadClient, UploadTransport};
use crate::settings::upload_config::load_config;
use crate::state_store::StateStore;
use crate::termination::{create_termination, Interrupted};
use crate::ui_manager::UiManager;
use crate::utils::{initialize_logging, initialize_panic_handler};
use clap::Parser;
use cli::Cli;
use color_eyre::eyre;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    initialize_logging()?;
    initialize_panic_handler()?;
    let args = Cli::parse();

    let config = match load_config(args.config.clone()) {
        Ok(config) => config.with_overrides(args.overrides()),
        Err(e) => {
            eprintln!("Problem reading the configuration file: {}", e);
            return Ok(());
        }
    };
    let transport: Arc<dyn UploadTransport> = Arc::new(HttpUploadClient::new(config.upload_url()?)?);
    tracing::info!(
        "Uploading to {} (max {}MB, accepting {})",
        config.endpoint,
        config.max_size_mb,
        config.formats.extensions().join(", ")
    );

    let (terminator, mut interrupt_rx) = create_termination();
    let (state_store, state_rx) = StateStore::new();
    let (ui_manager, action_rx) = UiManager::new();

    tokio::try_join!(
        state_store.main_loop(
            terminator,
            action_rx,
            interrupt_rx.resubscribe(),
            config,
            transport
        ),
        ui_manager.main_loop(state_rx, interrupt_rx.resubscribe()),
    )?;

    if let Ok(reason) = interrupt_rx.recv().await {
        match reason {
            Interrupted::UserInt => tracing::info!("exited per user request"),
            Interrupted::OsSigInt => tracing::info!("exited because of an os sig int"),
        }
    } else {
        tracing::error!("exited because of an unexpected error");
    }

    Ok(())
}
