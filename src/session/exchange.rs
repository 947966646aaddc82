//! Append-only exchange log
//!
//! One line per exchange, flushed as it is written. The file is recreated
//! for every session.

use crate::error::SessionError;
use chrono::Local;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Default log file, created in the working directory
pub const DEFAULT_LOG_FILE: &str = "Berechnung.txt";

const INPUT_LABEL: &str = "Benutzereingabe: ";
const RESULT_LABEL: &str = "Ergebniss: ";

/// One request/response pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub input: String,
    pub response: String,
}

impl Exchange {
    pub fn new(input: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            response: response.into(),
        }
    }

    /// Response without the peer's trailing line terminator
    pub fn result(&self) -> &str {
        self.response.trim_end_matches(|c| c == '\r' || c == '\n')
    }

    /// Result line shown to the operator
    pub fn result_line(&self) -> String {
        format!("{}{}", RESULT_LABEL, self.result())
    }
}

pub struct ExchangeLog<W: Write = BufWriter<File>> {
    writer: W,
    path: PathBuf,
    timestamps: bool,
}

impl ExchangeLog {
    /// Create the log file, truncating any previous session's content
    pub fn create(path: &Path, timestamps: bool) -> Result<Self, SessionError> {
        let file = File::create(path).map_err(|source| SessionError::Log {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Logging exchanges to {}", path.display());
        Ok(Self::from_writer(BufWriter::new(file), path, timestamps))
    }
}

impl<W: Write> ExchangeLog<W> {
    pub fn from_writer(writer: W, path: &Path, timestamps: bool) -> Self {
        Self {
            writer,
            path: path.to_path_buf(),
            timestamps,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    #[cfg(test)]
    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Append one exchange and flush it to disk
    pub fn record(&mut self, exchange: &Exchange) -> Result<(), SessionError> {
        let line = self.format_line(exchange);
        writeln!(self.writer, "{}", line)
            .and_then(|_| self.writer.flush())
            .map_err(|source| self.error(source))
    }

    /// Flush and release the log
    pub fn close(mut self) -> Result<(), SessionError> {
        self.writer.flush().map_err(|source| self.error(source))
    }

    fn format_line(&self, exchange: &Exchange) -> String {
        let mut line = String::new();
        if self.timestamps {
            let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
            line.push_str(&format!("[{}] ", timestamp));
        }
        line.push_str(INPUT_LABEL);
        line.push_str(&exchange.input);
        line.push(' ');
        line.push_str(&exchange.result_line());
        line
    }

    fn error(&self, source: std::io::Error) -> SessionError {
        SessionError::Log {
            path: self.path.clone(),
            source,
        }
    }
}
