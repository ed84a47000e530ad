//! Display sinks the front end writes to

use std::io::Write;

/// Trigger label while idle
pub const LABEL_IDLE: &str = "Start Recognition";

/// Trigger label while a capture session is open
pub const LABEL_LISTENING: &str = "Listening...";

/// Shown when the platform cannot capture speech
pub const UNSUPPORTED_MESSAGE: &str = "Speech recognition not supported on this platform.";

/// Prefix of every NLU failure shown to the user
pub const NLU_ERROR_PREFIX: &str = "Error occurred in NLU processing:";

/// Where recognized text, answers, and trigger state are shown
///
/// Each call replaces what the sink previously showed.
pub trait Surface: Send + Sync {
    /// Replace the "recognized text" sink
    fn show_recognized(&self, text: &str);

    /// Replace the "text to speak" sink
    fn show_answer(&self, text: &str);

    /// Replace the trigger label
    fn set_label(&self, label: &str);

    /// Permanently disable the trigger control
    fn disable_trigger(&self);
}

/// Surface that prints to the terminal
#[derive(Debug, Default)]
pub struct TerminalSurface;

impl TerminalSurface {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn print(line: &str) {
        let mut out = std::io::stdout().lock();
        // Closed stdout is ignored
        let _ = writeln!(out, "{line}");
        let _ = out.flush();
    }
}

impl Surface for TerminalSurface {
    fn show_recognized(&self, text: &str) {
        if !text.is_empty() {
            Self::print(&format!("> {text}"));
        }
    }

    fn show_answer(&self, text: &str) {
        if !text.is_empty() {
            Self::print(&format!("< {text}"));
        }
    }

    fn set_label(&self, label: &str) {
        Self::print(&format!("[{label}]"));
    }

    fn disable_trigger(&self) {
        Self::print("[disabled]");
    }
}
