//! Scripted transport for tests

use super::port::{LineSettings, Transport};
use serialport::{DataBits, Parity, StopBits};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, ErrorKind, Read, Write};
use std::rc::Rc;

/// Shared record of I/O events, in the order they happened
pub type EventLog = Rc<RefCell<Vec<&'static str>>>;

pub struct MockTransport {
    pub settings: LineSettings,
    pub applied: Vec<LineSettings>,
    pub written: Vec<u8>,
    reads: VecDeque<io::Result<Vec<u8>>>,
    fail_writes: bool,
    fail_settings_read: bool,
    fail_settings_apply: bool,
    events: EventLog,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            settings: LineSettings {
                baud_rate: 19200,
                data_bits: DataBits::Seven,
                stop_bits: StopBits::Two,
                parity: Parity::Odd,
            },
            applied: Vec::new(),
            written: Vec::new(),
            reads: VecDeque::new(),
            fail_writes: false,
            fail_settings_read: false,
            fail_settings_apply: false,
            events: EventLog::default(),
        }
    }

    pub fn with_settings(mut self, settings: LineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_reply(mut self, reply: &str) -> Self {
        self.reads.push_back(Ok(reply.as_bytes().to_vec()));
        self
    }

    pub fn with_read_error(mut self, kind: ErrorKind) -> Self {
        self.reads.push_back(Err(io::Error::new(kind, "mock read failure")));
        self
    }

    pub fn with_events(mut self, events: EventLog) -> Self {
        self.events = events;
        self
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn failing_settings_read(mut self) -> Self {
        self.fail_settings_read = true;
        self
    }

    pub fn failing_settings_apply(mut self) -> Self {
        self.fail_settings_apply = true;
        self
    }

    pub fn written_str(&self) -> String {
        String::from_utf8_lossy(&self.written).into_owned()
    }
}

impl Read for MockTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.events.borrow_mut().push("read");
        match self.reads.pop_front() {
            Some(Ok(data)) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                Ok(n)
            }
            Some(Err(e)) => Err(e),
            None => Ok(0),
        }
    }
}

impl Write for MockTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.events.borrow_mut().push("write");
        if self.fail_writes {
            return Err(io::Error::new(ErrorKind::BrokenPipe, "mock write failure"));
        }
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Transport for MockTransport {
    fn line_settings(&self) -> io::Result<LineSettings> {
        if self.fail_settings_read {
            return Err(io::Error::new(ErrorKind::Other, "mock settings read failure"));
        }
        Ok(self.settings)
    }

    fn apply_line_settings(&mut self, settings: &LineSettings) -> io::Result<()> {
        if self.fail_settings_apply {
            return Err(io::Error::new(ErrorKind::Other, "mock settings apply failure"));
        }
        self.settings = *settings;
        self.applied.push(*settings);
        Ok(())
    }
}
