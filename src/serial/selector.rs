//! Interactive port selection on the console

use async_trait::async_trait;
use std::io::{self, BufRead, Write};
use tokio::sync::mpsc::{self, UnboundedReceiver};

use super::port_trait::PortSelector;
use crate::error::{Result, TelemetryError};

/// Asks the operator to type one of the listed port names
///
/// The candidate list is printed once per distinct list; an unknown answer
/// prints "Invalid choice, please try again." and the caller prompts again.
///
/// Answers arrive over a channel fed by a plain OS thread, so a read blocked
/// on the terminal never keeps the runtime from shutting down.
pub struct ConsolePortSelector<W = io::Stdout> {
    answers: UnboundedReceiver<io::Result<String>>,
    out: W,
    listed: Vec<String>,
}

impl ConsolePortSelector {
    /// Selector reading from standard input and writing to standard output
    pub fn stdio() -> Result<Self> {
        Self::spawn(io::BufReader::new(io::stdin()), io::stdout())
    }
}

impl<W: Write> ConsolePortSelector<W> {
    /// Selector fed by lines from `answers`
    pub fn new(answers: UnboundedReceiver<io::Result<String>>, out: W) -> Self {
        Self {
            answers,
            out,
            listed: Vec::new(),
        }
    }

    /// Read `input` line by line on a detached thread
    ///
    /// The thread ends at end of input, on a read error, or on the first
    /// line read after the selector has been dropped.
    pub fn spawn<B>(input: B, out: W) -> Result<Self>
    where
        B: BufRead + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        std::thread::Builder::new()
            .name("port-selector-input".to_string())
            .spawn(move || {
                for line in input.lines() {
                    let failed = line.is_err();
                    if tx.send(line).is_err() || failed {
                        break;
                    }
                }
            })?;
        Ok(Self::new(rx, out))
    }

    fn prompt(&mut self, candidates: &[String]) -> io::Result<()> {
        if self.listed != candidates {
            writeln!(self.out, "Available ports:")?;
            for name in candidates {
                writeln!(self.out, "{}", name)?;
            }
            self.listed = candidates.to_vec();
        }
        write!(self.out, "Enter selected port: ")?;
        self.out.flush()
    }
}

#[async_trait]
impl<W> PortSelector for ConsolePortSelector<W>
where
    W: Write + Send,
{
    async fn choose(&mut self, candidates: &[String]) -> Result<Option<String>> {
        self.prompt(candidates)?;

        let answer = self
            .answers
            .recv()
            .await
            .ok_or_else(|| TelemetryError::Selection("standard input closed".to_string()))??;
        let answer = answer.trim();

        if let Some(name) = candidates.iter().find(|name| name.as_str() == answer) {
            return Ok(Some(name.clone()));
        }

        writeln!(self.out, "Invalid choice, please try again.")?;
        Ok(None)
    }
}
