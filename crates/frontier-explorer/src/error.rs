//! Error types shared by the explorer and the puzzle parsers.

use thiserror::Error;

/// A line of puzzle input did not match the expected grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {reason}")]
pub struct ParseError {
    /// 1-based line number in the input text
    pub line: usize,
    pub reason: String,
}

impl ParseError {
    pub fn new(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}

/// A run of the explorer ended without producing an answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExploreError {
    /// The frontier emptied before any state reached the horizon.
    #[error("frontier exhausted after {generations} generations before horizon {horizon}")]
    Exhausted { horizon: u32, generations: u32 },

    /// A successor did not advance time by exactly one step.
    #[error("transition from time {from} produced a state at time {to}")]
    TimeSkew { from: u32, to: u32 },

    /// The goal never appeared in the frontier.
    #[error("goal unreachable: frontier emptied after {generations} generations")]
    Unreachable { generations: u32 },
}
