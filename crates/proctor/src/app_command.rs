use std::fmt;

/// Commands sent from the command reader to the main application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Start recording the armed session.
    StartRecording,
    /// Stop the current recording and export it.
    StopRecording,
    /// Acquire the camera and microphone again.
    Retry,
    /// Request application shutdown.
    Shutdown,
}

impl AppCommand {
    /// Parse one line of user input. Case and surrounding whitespace are ignored.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "start" | "s" => Some(AppCommand::StartRecording),
            "stop" | "x" => Some(AppCommand::StopRecording),
            "retry" | "r" => Some(AppCommand::Retry),
            "quit" | "exit" | "q" => Some(AppCommand::Shutdown),
            _ => None,
        }
    }
}

impl fmt::Display for AppCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AppCommand::StartRecording => "start",
            AppCommand::StopRecording => "stop",
            AppCommand::Retry => "retry",
            AppCommand::Shutdown => "quit",
        };
        f.write_str(name)
    }
}
