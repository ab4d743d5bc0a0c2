use std::io::{self, Write};

use serde::Serialize;

use crate::application::ProgressSink;
use crate::domain::{ProgressUpdate, UpdateError};

const BAR_WIDTH: usize = 30;
const SPINNER: [char; 4] = ['|', '/', '-', '\\'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Redrawn single-line bar
    Text,
    /// One JSON object per event
    Json,
}

/// Terminal progress sink
pub struct ConsoleProgress<W: Write + Send = io::Stderr> {
    out: W,
    mode: OutputMode,
    spinner: usize,
}

#[derive(Serialize)]
#[serde(untagged)]
enum JsonLine<'a> {
    Fraction { fraction: f64 },
    Indeterminate { indeterminate: bool },
    Finished { finished: bool, error: Option<&'a str> },
}

impl ConsoleProgress {
    pub fn stderr(mode: OutputMode) -> Self {
        Self::new(io::stderr(), mode)
    }
}

impl<W: Write + Send> ConsoleProgress<W> {
    pub fn new(out: W, mode: OutputMode) -> Self {
        Self {
            out,
            mode,
            spinner: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn render_text(&mut self, update: ProgressUpdate) -> io::Result<()> {
        match update {
            ProgressUpdate::Pulse => {
                let glyph = SPINNER[self.spinner % SPINNER.len()];
                self.spinner = self.spinner.wrapping_add(1);
                write!(self.out, "\r[{}] working...", glyph)?;
            }
            ProgressUpdate::Fraction(fraction) => {
                let filled = (fraction * BAR_WIDTH as f64).round() as usize;
                let filled = filled.min(BAR_WIDTH);
                write!(
                    self.out,
                    "\r[{}{}] {:5.1}%",
                    "#".repeat(filled),
                    "-".repeat(BAR_WIDTH - filled),
                    fraction * 100.0
                )?;
            }
        }
        self.out.flush()
    }

    fn write_json(&mut self, line: &JsonLine<'_>) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, line)?;
        writeln!(self.out)?;
        self.out.flush()
    }
}

impl<W: Write + Send> ProgressSink for ConsoleProgress<W> {
    fn update(&mut self, update: ProgressUpdate) {
        // A closed terminal must not abort the transfer.
        let _ = match self.mode {
            OutputMode::Text => self.render_text(update),
            OutputMode::Json => {
                let line = match update {
                    ProgressUpdate::Pulse => JsonLine::Indeterminate {
                        indeterminate: true,
                    },
                    ProgressUpdate::Fraction(fraction) => JsonLine::Fraction { fraction },
                };
                self.write_json(&line)
            }
        };
    }

    fn finished(&mut self, error: Option<&UpdateError>) {
        let _ = match self.mode {
            OutputMode::Text => match error {
                None => writeln!(self.out, "\ndone"),
                Some(e) => writeln!(self.out, "\nfailed: {}", e),
            },
            OutputMode::Json => {
                let message = error.map(|e| e.to_string());
                self.write_json(&JsonLine::Finished {
                    finished: true,
                    error: message.as_deref(),
                })
            }
        };
    }
}
