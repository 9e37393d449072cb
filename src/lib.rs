//! # GPS Range Logger Library
//!
//! Log the distance and bearing between a local and a remote GPS unit
//! reported over a serial link.
//!
//! This library provides the connection state machine, the line protocol
//! parser, the geodesy helpers and the append-only data log used by the
//! `gps-range-logger` binary.

pub mod config;
pub mod connection;
pub mod error;
pub mod geodesy;
pub mod protocol;
pub mod serial;
pub mod telemetry;
