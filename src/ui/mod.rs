//! Terminal presentation
//!
//! Rendering of scan results and a progress subscriber for interactive
//! runs. The scan core has no dependency on anything here; it only pushes
//! events into the sink.

pub mod output;
pub mod progress;

pub use progress::TerminalSink;
