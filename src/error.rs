//! Fatal session errors
//!
//! Only failures that end the session are represented here. Write and read
//! failures during an exchange are reported and swallowed by the runner.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Exit code for every fatal failure
pub const EXIT_FAILURE: i32 = 1;

/// Which half of the configure step was rejected by the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigureStage {
    Read,
    Apply,
}

impl fmt::Display for ConfigureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigureStage::Read => write!(f, "getting"),
            ConfigureStage::Apply => write!(f, "setting"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Error opening serial port {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: io::Error,
    },

    #[error("Error {stage} state: {source}")]
    Configure {
        stage: ConfigureStage,
        #[source]
        source: io::Error,
    },

    #[error("Error writing log file {}: {source}", path.display())]
    Log {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Console I/O error: {0}")]
    Console(#[source] io::Error),
}

impl SessionError {
    /// Process exit code for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            SessionError::Open { .. }
            | SessionError::Configure { .. }
            | SessionError::Log { .. }
            | SessionError::Console(_) => EXIT_FAILURE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_error_mentions_port_and_os_error() {
        let err = SessionError::Open {
            port: "COM7".to_string(),
            source: io::Error::from_raw_os_error(2),
        };
        let msg = err.to_string();
        assert!(msg.contains("COM7"));
        assert!(msg.contains("os error 2"));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_configure_error_names_stage() {
        let err = SessionError::Configure {
            stage: ConfigureStage::Read,
            source: io::Error::new(io::ErrorKind::Other, "rejected"),
        };
        assert_eq!(err.to_string(), "Error getting state: rejected");

        let err = SessionError::Configure {
            stage: ConfigureStage::Apply,
            source: io::Error::new(io::ErrorKind::Other, "rejected"),
        };
        assert_eq!(err.to_string(), "Error setting state: rejected");
        assert_eq!(err.exit_code(), 1);
    }
}
