//! Interactive progress subscriber
//!
//! Renders the orchestrator's event stream as a progress bar. One of
//! several valid sinks; headless runs use `NoopSink` instead.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::scanner::{ProgressEvent, ProgressSink};

pub struct TerminalSink {
    bar: ProgressBar,
}

impl TerminalSink {
    /// One bar step per configured server
    pub fn new(server_count: usize) -> Self {
        let bar = ProgressBar::new(server_count as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:30.cyan/dim}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("━━─");
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressSink for TerminalSink {
    fn emit(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::ServerConnected { server, tools } => {
                self.bar.inc(1);
                self.bar.set_message(format!("{}: {} tools", server, tools));
            }
            ProgressEvent::ServerError { server, .. } => {
                self.bar.inc(1);
                self.bar.set_message(format!("{}: connection failed", server));
            }
            ProgressEvent::ToolScanning { server, tool } => {
                self.bar.set_message(format!("{} / {}", server, tool));
            }
            ProgressEvent::ToolAnalyzed { .. } => {}
        }
    }
}

impl Drop for TerminalSink {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_accepts_full_event_sequence() {
        let sink = TerminalSink::new(2);
        sink.emit(ProgressEvent::ServerConnected {
            server: "a".to_string(),
            tools: 1,
        });
        sink.emit(ProgressEvent::ToolScanning {
            server: "a".to_string(),
            tool: "t".to_string(),
        });
        sink.emit(ProgressEvent::ToolAnalyzed {
            server: "a".to_string(),
            tool: "t".to_string(),
            flagged: false,
        });
        sink.emit(ProgressEvent::ServerError {
            server: "b".to_string(),
            message: "boom".to_string(),
        });
        sink.finish();
    }

    #[test]
    fn drop_clears_unfinished_bar() {
        let _sink = TerminalSink::new(1);
    }
}
