//! Serial port communication module
//!
//! This module provides:
//! - Port name resolution and the fixed 9600 8N1 line configuration
//! - The blocking write/read pair used for each calculator exchange

pub mod port;

#[cfg(test)]
pub mod mock;

pub use port::{PortConfig, SerialConnection, Transport};
