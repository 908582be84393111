//! Line-oriented user commands.
//!
//! Reads `start`, `stop`, `retry` and `quit` from an input stream (stdin in
//! the binary) and forwards them to the main application over a channel.

use crate::{AppCommand, AppError, AppResult};

use std::panic::Location;

use error_location::ErrorLocation;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt},
    sync::{mpsc, watch},
};
use tracing::{debug, info, instrument, warn};

/// Forwards parsed input lines as [`AppCommand`]s.
pub struct CommandReader {
    command_tx: mpsc::Sender<AppCommand>,
}

impl CommandReader {
    /// Create a reader that sends into `command_tx`.
    pub fn new(command_tx: mpsc::Sender<AppCommand>) -> Self {
        Self { command_tx }
    }

    /// Run until shutdown is signalled or the input closes.
    ///
    /// End of input is treated as a quit request.
    #[instrument(skip_all)]
    pub async fn run<R>(&self, input: R, mut shutdown_rx: watch::Receiver<bool>) -> AppResult<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    info!("Command reader shutting down");
                    break;
                }
                line = lines.next_line() => {
                    match line? {
                        Some(line) => self.handle_line(&line).await?,
                        None => {
                            info!("Input closed, requesting shutdown");
                            self.send(AppCommand::Shutdown).await?;
                            break;
                        }
                    }
                }
            }
        }

        Ok(())
    }

    async fn handle_line(&self, line: &str) -> AppResult<()> {
        if line.trim().is_empty() {
            return Ok(());
        }

        match AppCommand::parse(line) {
            Some(command) => {
                debug!(%command, "Command received");
                self.send(command).await
            }
            None => {
                warn!(input = line.trim(), "Unknown command (expected start, stop, retry or quit)");
                Ok(())
            }
        }
    }

    async fn send(&self, command: AppCommand) -> AppResult<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|e| AppError::ChannelSendFailed {
                message: format!("Failed to send {}: {}", command, e),
                location: ErrorLocation::from(Location::caller()),
            })
    }
}
