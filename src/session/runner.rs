//! Interactive prompt loop
//!
//! Reads one expression per iteration, relays it to the calculator, shows
//! the reply and records the exchange until the operator types the sentinel.

use super::exchange::{Exchange, ExchangeLog};
use crate::error::SessionError;
use crate::serial::{SerialConnection, Transport};
use colored::Colorize;
use log::debug;
use std::io::{self, BufRead, Write};

/// Input that ends the session
pub const SENTINEL: &str = "beenden";

pub const PORT_PROMPT: &str =
    "Bitte geben sie den COM-Port an, mit dem der arduino verbunden ist. zb. COM3:";

pub const INPUT_PROMPT: &str =
    "Bitte geben sie die Berechnung ein. (oder schreiben sie 'beenden' um das Programm zu schliessen.):";

pub const OPERATOR_HINT: &str =
    "Es stehen folgende Rechenoperatoren zur Auswahl. (+) (-) (*) (/) und nur Ganzzahlen:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    AwaitingInput,
    Exchanging(String),
    Terminated,
}

/// Drives the session over an open connection.
///
/// Owns the connection and the log; both are released when the runner is
/// dropped, whichever way the session ends.
pub struct SessionRunner<T, R, O, L>
where
    T: Transport,
    R: BufRead,
    O: Write,
    L: Write,
{
    connection: SerialConnection<T>,
    log: ExchangeLog<L>,
    input: R,
    output: O,
    exchanges: usize,
}

impl<T, R, O, L> SessionRunner<T, R, O, L>
where
    T: Transport,
    R: BufRead,
    O: Write,
    L: Write,
{
    pub fn new(connection: SerialConnection<T>, log: ExchangeLog<L>, input: R, output: O) -> Self {
        Self {
            connection,
            log,
            input,
            output,
            exchanges: 0,
        }
    }

    /// Run until the sentinel or end of input, then close the log.
    ///
    /// Returns the number of completed exchanges.
    pub fn run(mut self) -> Result<usize, SessionError> {
        self.drive()?;
        let exchanges = self.exchanges;
        self.log.close()?;
        Ok(exchanges)
    }

    fn drive(&mut self) -> Result<(), SessionError> {
        let mut state = SessionState::AwaitingInput;
        while state != SessionState::Terminated {
            state = self.step(state)?;
        }
        Ok(())
    }

    /// Advance the state machine by one transition
    pub fn step(&mut self, state: SessionState) -> Result<SessionState, SessionError> {
        match state {
            SessionState::AwaitingInput => self.await_input(),
            SessionState::Exchanging(input) => {
                self.exchange(input)?;
                Ok(SessionState::AwaitingInput)
            }
            SessionState::Terminated => Ok(SessionState::Terminated),
        }
    }

    fn await_input(&mut self) -> Result<SessionState, SessionError> {
        writeln!(self.output, "{}", INPUT_PROMPT)
            .and_then(|_| writeln!(self.output, "{}", OPERATOR_HINT))
            .and_then(|_| self.output.flush())
            .map_err(SessionError::Console)?;

        Ok(match read_line(&mut self.input)? {
            None => SessionState::Terminated,
            Some(line) if line == SENTINEL => SessionState::Terminated,
            Some(line) => SessionState::Exchanging(line),
        })
    }

    fn exchange(&mut self, input: String) -> Result<(), SessionError> {
        if let Err(e) = self.connection.send(&input) {
            report("Error writing to serial port", &e);
        }

        let response = match self.connection.receive() {
            Ok(response) => response,
            Err(e) => {
                report("Error reading from serial port", &e);
                String::new()
            }
        };

        let exchange = Exchange::new(input, response);
        self.log.record(&exchange)?;
        self.exchanges += 1;
        writeln!(self.output, "{}", exchange.result_line())
            .and_then(|_| self.output.flush())
            .map_err(SessionError::Console)
    }
}

/// Ask the operator for the port name. `None` on end of input.
pub fn prompt_port_name<R: BufRead, O: Write>(
    input: &mut R,
    output: &mut O,
) -> Result<Option<String>, SessionError> {
    writeln!(output, "{}", PORT_PROMPT)
        .and_then(|_| output.flush())
        .map_err(SessionError::Console)?;
    Ok(read_line(input)?.map(|line| line.trim().to_string()))
}

/// Read one line without its terminator. `None` on end of input.
fn read_line<R: BufRead>(input: &mut R) -> Result<Option<String>, SessionError> {
    let mut line = String::new();
    if input.read_line(&mut line).map_err(SessionError::Console)? == 0 {
        return Ok(None);
    }
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    Ok(Some(line))
}

/// Report a non-fatal transport failure
fn report(context: &str, err: &io::Error) {
    debug!("{}: {}", context, err);
    eprintln!("{} {}: {}", "[ERROR]".red().bold(), context, err);
}
