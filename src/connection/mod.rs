//! # Connection Module
//!
//! Supervises the serial link to the telemetry device.
//!
//! This module handles:
//! - Discovering attached devices and resolving ambiguity via a port selector
//! - Opening the chosen device and streaming its lines into the session
//! - Detecting disconnects and polling for the same device to return
//! - Falling back to full discovery when it does not

pub mod manager;
pub mod state;

pub use manager::{ConnectionManager, ManagerSettings};
pub use state::{ConnectionEvent, ConnectionState, RetryPolicy, StateKind};
