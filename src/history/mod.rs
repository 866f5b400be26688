//! Permanent move history and replay verification.
//!
//! ## Collapse
//!
//! When a newly recorded move lands on the digest the board had *before*
//! the last entry, the last entry and the new move cancel out: the last
//! entry is removed and nothing is appended. A pick followed by a drop back
//! on its source leaves no trace in the permanent record.
//!
//! ## Replay
//!
//! [`History::verify_replay`] rebuilds a fresh board from the init string,
//! re-executes every entry and compares digests. A mismatch means execute,
//! undo or the digest has drifted and is reported, never swallowed.
//!
//! ## Text form
//!
//! Entries print as `<player> <seq> <move>` joined with ` , `, numbered
//! from 1. [`History::moves_from_text`] reads that form back.

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::board::Board;
use crate::core::{EngineError, EngineResult, PlayerId};
use crate::moves::{Move, Opcode};
use crate::rules::Rules;

const SEPARATOR: &str = " , ";

/// One permanent move and the digest it produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry<O> {
    pub mv: Move<O>,
    pub digest_after: u64,
    /// Logical time the move was recorded.
    pub timestamp: u64,
}

/// What [`History::record`] did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Recorded<O> {
    Appended,
    /// The new move undid the last entry, which was removed.
    Collapsed(HistoryEntry<O>),
    /// Ephemeral moves are never recorded.
    Skipped,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct History<O> {
    initial_digest: u64,
    entries: Vec<HistoryEntry<O>>,
    collapse: bool,
}

impl<O: Opcode> History<O> {
    #[must_use]
    pub fn new(initial_digest: u64, collapse: bool) -> Self {
        Self {
            initial_digest,
            entries: Vec::new(),
            collapse,
        }
    }

    /// Empty history for a freshly built board.
    #[must_use]
    pub fn for_board<R: Rules<Op = O>>(board: &Board<R>) -> Self {
        Self::new(board.digest(), board.config().collapse_history)
    }

    #[must_use]
    pub fn initial_digest(&self) -> u64 {
        self.initial_digest
    }

    #[must_use]
    pub fn entries(&self) -> &[HistoryEntry<O>] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn last(&self) -> Option<&HistoryEntry<O>> {
        self.entries.last()
    }

    /// Digest after the last entry, or the initial digest.
    #[must_use]
    pub fn last_digest(&self) -> u64 {
        self.entries
            .last()
            .map_or(self.initial_digest, |e| e.digest_after)
    }

    fn digest_before_last(&self) -> Option<u64> {
        match self.entries.len() {
            0 => None,
            1 => Some(self.initial_digest),
            n => Some(self.entries[n - 2].digest_after),
        }
    }

    /// Record a move the board just executed.
    pub fn record(&mut self, mv: Move<O>, digest_after: u64, timestamp: u64) -> Recorded<O> {
        if mv.is_ephemeral() {
            return Recorded::Skipped;
        }
        if self.collapse && self.digest_before_last() == Some(digest_after) {
            if let Some(removed) = self.entries.pop() {
                debug!(removed = %removed.mv, by = %mv, "history collapsed");
                return Recorded::Collapsed(removed);
            }
        }
        self.entries.push(HistoryEntry {
            mv: mv.without_index(),
            digest_after,
            timestamp,
        });
        Recorded::Appended
    }

    /// Remove the last entry (UI-level undo).
    pub fn pop(&mut self) -> Option<HistoryEntry<O>> {
        self.entries.pop()
    }

    /// How many recorded states, counting the initial one, have `digest`.
    #[must_use]
    pub fn repetitions(&self, digest: u64) -> usize {
        usize::from(self.initial_digest == digest)
            + self.entries.iter().filter(|e| e.digest_after == digest).count()
    }

    /// Entries with their 1-based sequence numbers.
    pub fn numbered(&self) -> impl Iterator<Item = Move<O>> + '_ {
        self.entries
            .iter()
            .zip(1u32..)
            .map(|(e, n)| e.mv.clone().with_index(n))
    }

    /// `<player> <seq> <move>` per entry, joined with ` , `.
    #[must_use]
    pub fn to_text(&self) -> String {
        self.numbered()
            .map(|mv| format!("{} {}", mv.player, mv))
            .collect::<Vec<_>>()
            .join(SEPARATOR)
    }

    /// Parse [`History::to_text`] output back into moves.
    pub fn moves_from_text(text: &str) -> EngineResult<Vec<Move<O>>> {
        text.split(SEPARATOR.trim())
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| {
                let (player, rest) = line
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| EngineError::malformed(line, "missing move after player"))?;
                let player = player
                    .parse::<PlayerId>()
                    .map_err(|reason| EngineError::malformed(line, reason))?;
                Move::parse(rest, player)
            })
            .collect()
    }

    /// Byte encoding of move text and digests, timestamps excluded.
    ///
    /// Two participants that agree on the permanent history produce
    /// identical bytes.
    pub fn canonical_bytes(&self) -> EngineResult<Vec<u8>> {
        let rows: Vec<(String, u64)> = self
            .numbered()
            .zip(&self.entries)
            .map(|(mv, e)| (format!("{} {}", mv.player, mv), e.digest_after))
            .collect();
        bincode::serialize(&(self.initial_digest, rows)).map_err(|e| EngineError::Encode(e.to_string()))
    }

    /// Rebuild `live` from scratch through this history and compare digests.
    ///
    /// Every entry's recorded digest is checked along the way, so the first
    /// divergent move is the one reported.
    pub fn verify_replay<R: Rules<Op = O>>(&self, live: &Board<R>) -> EngineResult<()> {
        let mut replay = Board::<R>::new(live.init().clone(), live.config().clone())?;
        replay.set_animate(false);

        let start = replay.digest();
        if start != self.initial_digest {
            error!(expected = self.initial_digest, actual = start, "initial digest mismatch");
            return Err(EngineError::DigestMismatch {
                expected: self.initial_digest,
                actual: start,
            });
        }

        for (n, entry) in self.entries.iter().enumerate() {
            replay.execute(&entry.mv)?;
            let actual = replay.digest();
            if actual != entry.digest_after {
                error!(entry = n + 1, mv = %entry.mv, expected = entry.digest_after, actual, "replay diverged");
                return Err(EngineError::DigestMismatch {
                    expected: entry.digest_after,
                    actual,
                });
            }
        }

        let expected = live.digest();
        let actual = replay.digest();
        if expected != actual {
            error!(expected, actual, entries = self.entries.len(), "replay does not reproduce live board");
            return Err(EngineError::DigestMismatch { expected, actual });
        }
        Ok(())
    }
}
