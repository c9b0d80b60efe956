//! Game log sinks.
//!
//! The engine writes human-readable game log lines ("Player 0 draws a card")
//! to a `LogSink` supplied by the host. Engine diagnostics go through
//! `tracing` separately; the sink is for the game's own narrative.

use std::sync::Mutex;

use super::player::PlayerId;

/// Receiver of game log messages.
pub trait LogSink {
    /// Record one message. `source` is the player the line is about, if any.
    fn log(&self, source: Option<PlayerId>, message: &str);
}

/// Discards every message. The default sink.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullLogSink;

impl LogSink for NullLogSink {
    fn log(&self, _source: Option<PlayerId>, _message: &str) {}
}

/// Forwards messages to `tracing` at info level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn log(&self, source: Option<PlayerId>, message: &str) {
        match source {
            Some(player) => tracing::info!(target: "game_log", player = player.0, "{message}"),
            None => tracing::info!(target: "game_log", "{message}"),
        }
    }
}

/// Keeps messages in memory.
#[derive(Debug, Default)]
pub struct MemoryLogSink {
    lines: Mutex<Vec<(Option<PlayerId>, String)>>,
}

impl MemoryLogSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything logged so far.
    #[must_use]
    pub fn lines(&self) -> Vec<(Option<PlayerId>, String)> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// Messages only, in order.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.lines().into_iter().map(|(_, m)| m).collect()
    }
}

impl LogSink for MemoryLogSink {
    fn log(&self, source: Option<PlayerId>, message: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push((source, message.to_string()));
        }
    }
}

impl<T: LogSink + ?Sized> LogSink for std::sync::Arc<T> {
    fn log(&self, source: Option<PlayerId>, message: &str) {
        (**self).log(source, message);
    }
}
