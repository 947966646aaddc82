//! Serial port configuration and connection management
//!
//! Opens the operator-named port, applies the fixed line settings once and
//! performs the blocking write/read pair of each exchange.

use crate::error::{ConfigureStage, SessionError};
use log::{debug, info};
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{self, ErrorKind, Read, Write};
use std::time::Duration;

/// Baud rate expected by the calculator firmware
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Capacity of the receive buffer
pub const REPLY_BUFFER_SIZE: usize = 256;

/// Bytes actually used per read; a longer reply is truncated here
pub const MAX_REPLY_LEN: usize = REPLY_BUFFER_SIZE - 1;

/// Transport timeout used while emulating a blocking read
const BLOCKING_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Line parameters of the serial connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSettings {
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub stop_bits: StopBits,
    pub parity: Parity,
}

impl Default for LineSettings {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            data_bits: DataBits::Eight,
            stop_bits: StopBits::One,
            parity: Parity::None,
        }
    }
}

impl std::fmt::Display for LineSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data_bits = match self.data_bits {
            DataBits::Five => 5,
            DataBits::Six => 6,
            DataBits::Seven => 7,
            DataBits::Eight => 8,
        };
        let parity = match self.parity {
            Parity::None => 'N',
            Parity::Odd => 'O',
            Parity::Even => 'E',
        };
        let stop_bits = match self.stop_bits {
            StopBits::One => 1,
            StopBits::Two => 2,
        };
        write!(f, "{} {}{}{}", self.baud_rate, data_bits, parity, stop_bits)
    }
}

/// Configuration for serial port connection
#[derive(Debug, Clone)]
pub struct PortConfig {
    /// Port name as typed by the operator (e.g., COM3, ttyUSB0)
    pub port_name: String,
    /// Line settings applied by [`SerialConnection::configure`]
    pub line: LineSettings,
    /// Flow control (always none for the calculator)
    pub flow_control: FlowControl,
    /// Read timeout; `None` blocks until the peer answers
    pub read_timeout: Option<Duration>,
}

impl PortConfig {
    /// Create a new configuration with the default 9600 8N1 settings
    pub fn new(port_name: &str) -> Self {
        Self {
            port_name: port_name.trim().to_string(),
            line: LineSettings::default(),
            flow_control: FlowControl::None,
            read_timeout: None,
        }
    }

    /// Set the read timeout
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Platform device path for the port name
    pub fn device_path(&self) -> Option<String> {
        resolve_device_path(&self.port_name)
    }
}

/// Turn an operator-supplied port name into a platform device path.
///
/// Windows names are placed in the `\\.\` device namespace so that ports
/// above COM9 open too. Unix names without a directory are looked up in
/// `/dev`. Returns `None` for an empty name.
pub fn resolve_device_path(port_name: &str) -> Option<String> {
    let name = port_name.trim();
    if name.is_empty() {
        return None;
    }

    #[cfg(windows)]
    let path = if name.starts_with(r"\\.\") {
        name.to_string()
    } else {
        format!(r"\\.\{}", name)
    };

    #[cfg(not(windows))]
    let path = if name.contains('/') {
        name.to_string()
    } else {
        format!("/dev/{}", name)
    };

    Some(path)
}

/// Byte channel with readable and writable line settings.
///
/// Implemented for real serial ports and for the test mock.
pub trait Transport: Read + Write {
    /// Read the currently active line settings
    fn line_settings(&self) -> io::Result<LineSettings>;

    /// Apply line settings
    fn apply_line_settings(&mut self, settings: &LineSettings) -> io::Result<()>;
}

impl Transport for Box<dyn SerialPort> {
    fn line_settings(&self) -> io::Result<LineSettings> {
        Ok(LineSettings {
            baud_rate: self.baud_rate()?,
            data_bits: self.data_bits()?,
            stop_bits: self.stop_bits()?,
            parity: self.parity()?,
        })
    }

    fn apply_line_settings(&mut self, settings: &LineSettings) -> io::Result<()> {
        self.set_baud_rate(settings.baud_rate)?;
        self.set_data_bits(settings.data_bits)?;
        self.set_stop_bits(settings.stop_bits)?;
        self.set_parity(settings.parity)?;
        Ok(())
    }
}

/// Exclusive owner of an open serial channel
pub struct SerialConnection<T: Transport = Box<dyn SerialPort>> {
    transport: T,
    config: PortConfig,
}

impl SerialConnection {
    /// Open the configured port for exclusive read/write access
    pub fn open(config: PortConfig) -> Result<Self, SessionError> {
        let path = config.device_path().ok_or_else(|| SessionError::Open {
            port: config.port_name.clone(),
            source: io::Error::new(ErrorKind::InvalidInput, "empty port name"),
        })?;

        let port = serialport::new(path.as_str(), config.line.baud_rate)
            .flow_control(config.flow_control)
            .timeout(config.read_timeout.unwrap_or(BLOCKING_POLL_INTERVAL))
            .open()
            .map_err(|e| SessionError::Open {
                port: path.clone(),
                source: e.into(),
            })?;

        info!("Opened serial port {}", path);
        Ok(Self::from_transport(port, config))
    }
}

impl<T: Transport> SerialConnection<T> {
    /// Wrap an already opened transport
    pub fn from_transport(transport: T, config: PortConfig) -> Self {
        Self { transport, config }
    }

    /// Get the port configuration
    pub fn config(&self) -> &PortConfig {
        &self.config
    }

    /// Overwrite the transport's line settings with the configured ones.
    ///
    /// Returns the settings read back after applying them.
    pub fn configure(&mut self) -> Result<LineSettings, SessionError> {
        let mut settings = self
            .transport
            .line_settings()
            .map_err(|source| SessionError::Configure {
                stage: ConfigureStage::Read,
                source,
            })?;
        debug!("Previous line settings: {}", settings);

        settings.baud_rate = self.config.line.baud_rate;
        settings.data_bits = self.config.line.data_bits;
        settings.stop_bits = self.config.line.stop_bits;
        settings.parity = self.config.line.parity;

        self.transport
            .apply_line_settings(&settings)
            .map_err(|source| SessionError::Configure {
                stage: ConfigureStage::Apply,
                source,
            })?;

        let active = self
            .transport
            .line_settings()
            .map_err(|source| SessionError::Configure {
                stage: ConfigureStage::Read,
                source,
            })?;
        info!("Line settings: {}", active);
        Ok(active)
    }

    /// Write `line` followed by a newline and flush it
    pub fn send(&mut self, line: &str) -> io::Result<usize> {
        let mut message = String::with_capacity(line.len() + 1);
        message.push_str(line);
        message.push('\n');

        self.transport.write_all(message.as_bytes())?;
        self.transport.flush()?;
        debug!("Wrote {} bytes", message.len());
        Ok(message.len())
    }

    /// Perform one bounded read of at most [`MAX_REPLY_LEN`] bytes.
    ///
    /// No framing is applied: a reply split across reads or longer than the
    /// buffer is truncated. Without a read timeout, transport poll timeouts
    /// are retried so the call blocks until data arrives.
    pub fn receive(&mut self) -> io::Result<String> {
        let mut buffer = [0u8; REPLY_BUFFER_SIZE];

        loop {
            match self.transport.read(&mut buffer[..MAX_REPLY_LEN]) {
                Ok(n) => {
                    debug!("Read {} bytes", n);
                    return Ok(String::from_utf8_lossy(&buffer[..n]).into_owned());
                }
                Err(ref e)
                    if e.kind() == ErrorKind::TimedOut && self.config.read_timeout.is_none() =>
                {
                    continue;
                }
                Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    #[cfg(test)]
    pub fn transport(&self) -> &T {
        &self.transport
    }
}
