//! Calculator session
//!
//! This module provides:
//! - The prompt/relay/record loop driven by [`SessionRunner`]
//! - The per-run exchange log

pub mod exchange;
pub mod runner;

pub use exchange::{ExchangeLog, DEFAULT_LOG_FILE};
pub use runner::{prompt_port_name, SessionRunner};
