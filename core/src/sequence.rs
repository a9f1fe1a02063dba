//! Sequence processor: groups a leader line and its followers into one block
//!
//! ```text
//!            leader matches                 follower matches
//!   Idle ───────────────────▶ Buffering ◀──────────────────┐
//!    ▲                           │  └──────────────────────┘
//!    └───── no follower / eof ───┘  (flush buffer as a block)
//! ```
//!
//! The processor only holds state. Deciding what a line is (leader, follower
//! or neither) and rendering it happens in [`Processor`](crate::Processor).

use crate::line_matcher::match_line;
use crate::{MatchResult, Rule, RuleSet};

/// A completed sequence, ready to be emitted as one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flushed {
    /// Name of the rule that opened the sequence.
    pub leader: String,
    /// Leader output followed by follower outputs, in input order.
    pub lines: Vec<String>,
}

#[derive(Debug)]
struct ActiveSequence {
    leader: usize,
    leader_name: String,
    buffer: Vec<String>,
}

#[derive(Debug, Default)]
enum State {
    #[default]
    Idle,
    Buffering(ActiveSequence),
}

/// Idle/Buffering state machine.
///
/// # INV: One active sequence
///
/// Starting a sequence while another is buffering flushes the old one first;
/// blocks are never interleaved.
///
/// # Example
///
/// ```
/// use lognorm::SequenceProcessor;
///
/// let mut seq = SequenceProcessor::new();
/// assert!(seq.start(0, "question", "[q]".into()).is_none());
/// assert!(seq.append("  detail".into()));
///
/// let block = seq.flush().unwrap();
/// assert_eq!(block.leader, "question");
/// assert_eq!(block.lines, vec!["[q]", "  detail"]);
/// assert!(!seq.is_buffering());
/// ```
#[derive(Debug, Default)]
pub struct SequenceProcessor {
    state: State,
}

impl SequenceProcessor {
    /// A processor in the `Idle` state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a sequence led by rule `leader` (its index in the [`RuleSet`]).
    ///
    /// Returns the previous sequence if one was still buffering.
    pub fn start(
        &mut self,
        leader: usize,
        leader_name: impl Into<String>,
        first: String,
    ) -> Option<Flushed> {
        let previous = self.flush();
        self.state = State::Buffering(ActiveSequence {
            leader,
            leader_name: leader_name.into(),
            buffer: vec![first],
        });
        previous
    }

    /// Append a follower's output. Returns `false` (and drops nothing) when
    /// idle.
    pub fn append(&mut self, line: String) -> bool {
        match &mut self.state {
            State::Buffering(active) => {
                active.buffer.push(line);
                true
            }
            State::Idle => false,
        }
    }

    /// End the active sequence, if any, returning its block.
    pub fn flush(&mut self) -> Option<Flushed> {
        match std::mem::take(&mut self.state) {
            State::Buffering(active) => Some(Flushed {
                leader: active.leader_name,
                lines: active.buffer,
            }),
            State::Idle => None,
        }
    }

    /// Returns `true` while a sequence is open.
    #[must_use]
    pub fn is_buffering(&self) -> bool {
        matches!(self.state, State::Buffering(_))
    }

    /// Index of the active leader rule.
    #[must_use]
    pub fn active_leader(&self) -> Option<usize> {
        match &self.state {
            State::Buffering(active) => Some(active.leader),
            State::Idle => None,
        }
    }

    /// Number of lines buffered so far, leader included.
    #[must_use]
    pub fn buffered(&self) -> usize {
        match &self.state {
            State::Buffering(active) => active.buffer.len(),
            State::Idle => 0,
        }
    }

    /// Try the active leader's followers against `line`, in declared order.
    ///
    /// Returns the first follower that matches, or `None` when idle or when
    /// no follower matches.
    #[must_use]
    pub fn match_follower<'a>(
        &self,
        rules: &'a RuleSet,
        line: &str,
    ) -> Option<(&'a Rule, MatchResult)> {
        let spec = rules.get(self.active_leader()?)?.sequence()?;
        spec.followers()
            .iter()
            .find_map(|follower| match_line(follower, line).map(|m| (follower, m)))
    }
}
