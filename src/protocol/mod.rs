//! # Line Protocol Module
//!
//! Implementation of the newline-delimited ASCII telemetry protocol carried
//! over the serial link.
//!
//! This module handles:
//! - Splitting the raw byte stream into text lines
//! - Classifying `REMOTE:` / `LOCAL:` coordinate lines
//! - Suppressing echoed `Distance:` lines
//! - Passing any other text through as a control message

pub mod line;
pub mod parser;

pub use line::LineSplitter;
pub use parser::{parse_line, Position, TelemetryLine};
