use crate::config::McpServerConfig;
use crate::McpSyncError;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};

/// Automatic policy for name collisions during import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum AutoResolve {
    /// Keep the definition from the earliest store.
    First,
    /// Take the definition from the latest store.
    Last,
}

/// A server definition and the store it was found in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub source: String,
    pub config: McpServerConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    KeepIncumbent,
    TakeChallenger,
}

/// Decides between two different definitions of the same server.
pub trait ConflictResolver {
    /// # Errors
    ///
    /// Returns an error if no decision could be obtained (e.g. input closed).
    fn resolve(
        &mut self,
        name: &str,
        incumbent: &Candidate,
        challenger: &Candidate,
    ) -> anyhow::Result<Choice>;
}

#[derive(Debug, Clone, Copy)]
pub struct AutoResolver(pub AutoResolve);

impl ConflictResolver for AutoResolver {
    fn resolve(
        &mut self,
        _name: &str,
        _incumbent: &Candidate,
        _challenger: &Candidate,
    ) -> anyhow::Result<Choice> {
        Ok(match self.0 {
            AutoResolve::First => Choice::KeepIncumbent,
            AutoResolve::Last => Choice::TakeChallenger,
        })
    }
}

/// Asks the user to pick `1` or `2`, re-prompting until they do.
pub struct InteractiveResolver<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> InteractiveResolver<R, W> {
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> ConflictResolver for InteractiveResolver<R, W> {
    fn resolve(
        &mut self,
        name: &str,
        incumbent: &Candidate,
        challenger: &Candidate,
    ) -> anyhow::Result<Choice> {
        writeln!(self.output, "\nFound '{name}' server in multiple locations:")?;
        for (index, candidate) in [(1, incumbent), (2, challenger)] {
            let config = serde_json::to_string(&candidate.config)?;
            writeln!(self.output, "{index}. {}: {config}", candidate.source)?;
        }

        loop {
            write!(self.output, "Choose which to keep (1 or 2): ")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Err(McpSyncError::Cancelled.into());
            }
            match line.trim() {
                "1" => return Ok(Choice::KeepIncumbent),
                "2" => return Ok(Choice::TakeChallenger),
                _ => writeln!(self.output, "Invalid choice. Please enter 1 or 2.")?,
            }
        }
    }
}
