//! # Telemetry Module
//!
//! Turns parsed protocol lines into timestamped log events and persists them.
//!
//! This module handles:
//! - Holding the latest remote/local GPS fixes
//! - Computing distance and bearing once both fixes are known
//! - Formatting events as `[timestamp] message` lines
//! - Appending them to a per-run log file that is never overwritten

pub mod event;
pub mod logger;
pub mod session;

pub use event::{LogEvent, Severity};
pub use logger::{EventSink, LogSink};
pub use session::TelemetrySession;
