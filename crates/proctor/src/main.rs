//! Proctor: proctored answer recording with randomized identity snapshots.

mod app;
mod app_command;
mod command_reader;
mod config;
mod error;
mod export_writer;
mod recording_state;
#[cfg(test)]
mod tests;

pub(crate) use {
    app::App,
    app_command::AppCommand,
    command_reader::CommandReader,
    error::{AppError, Result as AppResult},
    export_writer::ExportWriter,
    recording_state::RecordingState,
};

use crate::config::Config;

use proctor_core::{MediaDevices, ProctorController, SessionEvent, TestPatternDevices};

use std::{process::ExitCode, sync::Arc, time::Duration};

use tokio::{
    io::BufReader,
    sync::{mpsc, watch},
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "proctor=debug,proctor_core=debug";

/// Application entry point.
fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    // Session timers, capture and the shell share one thread.
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {:?}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(run());

    // Stdin reads park a blocking thread that never wakes without input.
    runtime.shutdown_timeout(Duration::from_millis(100));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Proctor failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> AppResult<()> {
    let config = Config::load()?;
    config.validate()?;

    let devices: Arc<dyn MediaDevices> =
        Arc::new(TestPatternDevices::new(config.devices.test_pattern()));
    let (events_tx, events_rx) = mpsc::unbounded_channel::<SessionEvent>();
    let controller = ProctorController::new(devices, Arc::new(events_tx), config.session_settings());

    let exports = ExportWriter::new(config.output.export_dir.clone())?;

    let (command_tx, command_rx) = mpsc::channel(32);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let reader = CommandReader::new(command_tx);
    let input = tokio::spawn(async move {
        let stdin = BufReader::new(tokio::io::stdin());
        if let Err(e) = reader.run(stdin, shutdown_rx).await {
            error!(error = ?e, "Command reader error");
        }
    });

    info!("Commands: start, stop, retry, quit");

    let app = App {
        controller,
        exports,
        write_snapshots: config.output.write_snapshots,
        max_duration: config.max_duration(),
        state: RecordingState::Idle,
        command_rx,
        events_rx,
        shutdown_tx,
    };

    let result = app.run().await;
    input.abort();

    result
}
