use mizu_core::{Booking, Resolution};
use std::io::{self, BufRead, BufReader, Stdin, Stdout, Write};
use std::sync::Mutex;

/// Answer to the disruption menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice {
    Resolve(Resolution),
    /// Anything other than "1" or "2", kept for the log line.
    Invalid(String),
}

impl Choice {
    pub fn parse(input: &str) -> Self {
        match input.trim() {
            "1" => Choice::Resolve(Resolution::Refund),
            "2" => Choice::Resolve(Resolution::Reschedule),
            other => Choice::Invalid(other.to_string()),
        }
    }
}

/// Where refund/reschedule decisions come from.
pub trait DecisionSource: Send + Sync {
    fn decide(&self, booking: &Booking) -> io::Result<Choice>;
}

/// Prints the menu and reads one line per disrupted booking.
pub struct TerminalPrompt<R, W> {
    io: Mutex<(R, W)>,
}

impl TerminalPrompt<BufReader<Stdin>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R, W> TerminalPrompt<R, W>
where
    R: BufRead + Send,
    W: Write + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            io: Mutex::new((reader, writer)),
        }
    }

    pub fn into_inner(self) -> (R, W) {
        match self.io.into_inner() {
            Ok(io) => io,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<R, W> DecisionSource for TerminalPrompt<R, W>
where
    R: BufRead + Send,
    W: Write + Send,
{
    fn decide(&self, booking: &Booking) -> io::Result<Choice> {
        let mut guard = self
            .io
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "prompt lock poisoned"))?;
        let (reader, writer) = &mut *guard;

        writeln!(
            writer,
            "Flight {} is disrupted (booking {}). What would you like to do?",
            booking.flight_number, booking.id
        )?;
        writeln!(writer, "1. Withdraw ticket and get a refund")?;
        writeln!(writer, "2. Reschedule to the next available flight")?;
        write!(writer, "Enter your choice (1 or 2): ")?;
        writer.flush()?;

        let mut line = String::new();
        reader.read_line(&mut line)?;
        Ok(Choice::parse(&line))
    }
}

/// Same answer for every booking, for unattended runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedDecision(pub Resolution);

impl DecisionSource for FixedDecision {
    fn decide(&self, _booking: &Booking) -> io::Result<Choice> {
        Ok(Choice::Resolve(self.0))
    }
}
