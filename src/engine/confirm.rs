//! Interactive confirmation.

use anyhow::{Context, Result};
use std::io::{BufRead, BufReader, Stdin, Stdout, Write};

use crate::strategy::Suggestions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Confirm,
    Decline,
    Regenerate,
}

impl Decision {
    /// Parse an answer; `None` for anything unrecognised.
    pub fn parse(answer: &str) -> Option<Self> {
        match answer.trim().to_lowercase().as_str() {
            "y" | "yes" => Some(Decision::Confirm),
            "n" | "no" => Some(Decision::Decline),
            "g" | "generate" | "r" | "regenerate" => Some(Decision::Regenerate),
            _ => None,
        }
    }
}

/// Asked once per generated suggestion set that has something to execute.
pub trait Confirmer: Send {
    fn decide(&mut self, suggestions: &Suggestions) -> Result<Decision>;
}

/// Prompts on a terminal (or any reader/writer pair).
pub struct PromptConfirmer<R, W> {
    input: R,
    output: W,
}

impl PromptConfirmer<BufReader<Stdin>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(std::io::stdin()), std::io::stdout())
    }
}

impl<R: BufRead + Send, W: Write + Send> PromptConfirmer<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead + Send, W: Write + Send> Confirmer for PromptConfirmer<R, W> {
    fn decide(&mut self, suggestions: &Suggestions) -> Result<Decision> {
        writeln!(self.output, "Proposed changes:")?;
        for line in suggestions.preview_lines() {
            writeln!(self.output, "  - {line}")?;
        }
        loop {
            write!(self.output, "Execute? [y]es / [n]o / [g]enerate new: ")?;
            self.output.flush()?;

            let mut answer = String::new();
            let read = self
                .input
                .read_line(&mut answer)
                .context("Failed to read confirmation")?;
            if read == 0 {
                // EOF
                return Ok(Decision::Decline);
            }
            match Decision::parse(&answer) {
                Some(decision) => return Ok(decision),
                None => writeln!(self.output, "Please answer y, n or g.")?,
            }
        }
    }
}
