//! The move descriptor: an immutable, printable command value.
//!
//! ## Text form
//!
//! ```text
//! [seq] opcode operand...
//! ```
//!
//! `seq` is an optional leading move index. The opcode is looked up first in
//! the fixed control table (`Start`, `Edit`, `Resign`, `Done`,
//! `GameOverOnTime`) and then in the game's own [`Opcode::NAMES`]. The
//! sending player is not part of the text; the caller supplies it when
//! parsing.
//!
//! ## Equality
//!
//! Derived equality compares the sequence index too. [`Move::same_move`]
//! compares only what the move does (player, opcode and operands), which is
//! the equality the text round-trip law is stated in.

use std::fmt;
use std::fmt::Debug;
use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};

use crate::core::{EngineError, EngineResult, PlayerId};

use super::names::NameTable;
use super::text::{MoveReader, MoveWriter};

/// Per-game opcode set, a closed enum matched exhaustively by the game.
pub trait Opcode: Clone + Debug + PartialEq + Eq + Hash + 'static {
    /// Name table for this game's opcodes. Must not reuse control names.
    const NAMES: NameTable;

    fn code(&self) -> u16;

    /// Print operands (the opcode name is already written).
    fn write_operands(&self, w: &mut MoveWriter);

    /// Read operands for `code`. The caller checks for trailing tokens.
    fn read(code: u16, r: &mut MoveReader<'_>) -> EngineResult<Self>;

    /// Provisional move made during a simultaneous phase.
    fn is_ephemeral(&self) -> bool {
        false
    }

    /// False for local-only echo moves that never reach other players.
    fn is_transmitted(&self) -> bool {
        true
    }

    /// Permanent equivalent of an ephemeral move, or `None` to drop it.
    ///
    /// Must be a pure function of the opcode and its operands.
    fn to_synchronous(&self) -> Option<Self> {
        Some(self.clone())
    }

    fn name(&self) -> &'static str {
        Self::NAMES.name(self.code()).unwrap_or("?")
    }
}

const START: u16 = 1000;
const EDIT: u16 = 1001;
const RESIGN: u16 = 1002;
const DONE: u16 = 1003;
const GAME_OVER_ON_TIME: u16 = 1004;

/// Standardized control opcodes shared by every game.
pub const CONTROL_NAMES: NameTable = NameTable::new(&[
    ("Start", START),
    ("Edit", EDIT),
    ("Resign", RESIGN),
    ("Done", DONE),
    ("GameOverOnTime", GAME_OVER_ON_TIME),
]);

/// A control or a game opcode.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command<O> {
    /// Begin play with the given player to move.
    Start(PlayerId),
    /// Enter the free-edit puzzle phase.
    Edit,
    /// Offer resignation; a second `Resign` withdraws it.
    Resign,
    /// Commit the pending move.
    Done,
    /// The mover's opponent ran out of time.
    GameOverOnTime,
    Game(O),
}

impl<O: Opcode> Command<O> {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Command::Start(_) => "Start",
            Command::Edit => "Edit",
            Command::Resign => "Resign",
            Command::Done => "Done",
            Command::GameOverOnTime => "GameOverOnTime",
            Command::Game(op) => op.name(),
        }
    }

    #[must_use]
    pub fn is_control(&self) -> bool {
        !matches!(self, Command::Game(_))
    }

    #[must_use]
    pub fn is_ephemeral(&self) -> bool {
        matches!(self, Command::Game(op) if op.is_ephemeral())
    }

    #[must_use]
    pub fn is_transmitted(&self) -> bool {
        match self {
            Command::Game(op) => op.is_transmitted(),
            _ => true,
        }
    }

    #[must_use]
    pub fn to_synchronous(&self) -> Option<Self> {
        match self {
            Command::Game(op) => op.to_synchronous().map(Command::Game),
            other => Some(other.clone()),
        }
    }
}

/// A move: who does what, with an optional sequence index.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move<O> {
    pub index: Option<u32>,
    pub player: PlayerId,
    pub command: Command<O>,
}

impl<O: Opcode> Move<O> {
    #[must_use]
    pub fn new(player: PlayerId, command: Command<O>) -> Self {
        Self {
            index: None,
            player,
            command,
        }
    }

    #[must_use]
    pub fn game(player: PlayerId, op: O) -> Self {
        Self::new(player, Command::Game(op))
    }

    #[must_use]
    pub fn start(player: PlayerId, first: PlayerId) -> Self {
        Self::new(player, Command::Start(first))
    }

    #[must_use]
    pub fn done(player: PlayerId) -> Self {
        Self::new(player, Command::Done)
    }

    #[must_use]
    pub fn edit(player: PlayerId) -> Self {
        Self::new(player, Command::Edit)
    }

    #[must_use]
    pub fn resign(player: PlayerId) -> Self {
        Self::new(player, Command::Resign)
    }

    #[must_use]
    pub fn game_over_on_time(player: PlayerId) -> Self {
        Self::new(player, Command::GameOverOnTime)
    }

    #[must_use]
    pub fn with_index(mut self, index: u32) -> Self {
        self.index = Some(index);
        self
    }

    #[must_use]
    pub fn without_index(mut self) -> Self {
        self.index = None;
        self
    }

    /// Parse `[seq] opcode operand...` for `player`.
    ///
    /// ```
    /// use rust_tabletop::core::PlayerId;
    /// use rust_tabletop::games::jumper::JumperOp;
    /// use rust_tabletop::moves::{Command, Move};
    ///
    /// let mv = Move::<JumperOp>::parse("12 done", PlayerId::new(1)).unwrap();
    /// assert_eq!(mv.index, Some(12));
    /// assert_eq!(mv.command, Command::Done);
    /// assert_eq!(mv.to_text(), "12 Done");
    /// ```
    pub fn parse(text: &str, player: PlayerId) -> EngineResult<Self> {
        let mut tokens = text.split_whitespace().peekable();

        let index = match tokens.peek() {
            Some(tok) if tok.bytes().all(|b| b.is_ascii_digit()) => {
                let index = tok
                    .parse::<u32>()
                    .map_err(|_| EngineError::malformed(text, "sequence index out of range"))?;
                tokens.next();
                Some(index)
            }
            _ => None,
        };

        let name = tokens
            .next()
            .ok_or_else(|| EngineError::malformed(text, "missing opcode"))?;

        let mut reader = MoveReader::new(text, tokens);
        let command = match CONTROL_NAMES.code(name) {
            Some(START) => Command::Start(reader.player()?),
            Some(EDIT) => Command::Edit,
            Some(RESIGN) => Command::Resign,
            Some(DONE) => Command::Done,
            Some(GAME_OVER_ON_TIME) => Command::GameOverOnTime,
            Some(_) | None => {
                let code = O::NAMES
                    .code(name)
                    .ok_or_else(|| EngineError::UnknownOpcode(name.to_string()))?;
                Command::Game(O::read(code, &mut reader)?)
            }
        };
        reader.finish()?;

        Ok(Self {
            index,
            player,
            command,
        })
    }

    /// Print in wire form; the exact inverse of [`Move::parse`].
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut w = match self.index {
            Some(index) => MoveWriter::starting_with(index.to_string()),
            None => MoveWriter::new(),
        };
        w.word(self.command.name());
        match &self.command {
            Command::Start(first) => {
                w.player(*first);
            }
            Command::Game(op) => op.write_operands(&mut w),
            Command::Edit | Command::Resign | Command::Done | Command::GameOverOnTime => {}
        }
        w.finish()
    }

    /// Equality on what the move does, ignoring the sequence index.
    #[must_use]
    pub fn same_move(&self, other: &Self) -> bool {
        self.player == other.player && self.command == other.command
    }

    /// Hash of player and command, the identity undo checks against.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.player.hash(&mut hasher);
        self.command.hash(&mut hasher);
        hasher.finish()
    }

    #[must_use]
    pub fn is_ephemeral(&self) -> bool {
        self.command.is_ephemeral()
    }

    #[must_use]
    pub fn is_transmitted(&self) -> bool {
        self.command.is_transmitted()
    }

    /// Canonical permanent form; the index is cleared.
    #[must_use]
    pub fn to_synchronous(&self) -> Option<Self> {
        self.command
            .to_synchronous()
            .map(|command| Self::new(self.player, command))
    }

    #[must_use]
    pub fn opcode_name(&self) -> &'static str {
        self.command.name()
    }
}

impl<O: Opcode> fmt::Display for Move<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    enum Toy {
        Bid(u8),
        EBid(u8),
        Peek,
    }

    impl Opcode for Toy {
        const NAMES: NameTable = NameTable::new(&[("Bid", 1), ("EBid", 2), ("Peek", 3)]);

        fn code(&self) -> u16 {
            match self {
                Toy::Bid(_) => 1,
                Toy::EBid(_) => 2,
                Toy::Peek => 3,
            }
        }

        fn write_operands(&self, w: &mut MoveWriter) {
            match self {
                Toy::Bid(v) | Toy::EBid(v) => {
                    w.int(v);
                }
                Toy::Peek => {}
            }
        }

        fn read(code: u16, r: &mut MoveReader<'_>) -> EngineResult<Self> {
            Ok(match code {
                1 => Toy::Bid(r.int("card")?),
                2 => Toy::EBid(r.int("card")?),
                _ => Toy::Peek,
            })
        }

        fn is_ephemeral(&self) -> bool {
            matches!(self, Toy::EBid(_) | Toy::Peek)
        }

        fn is_transmitted(&self) -> bool {
            !matches!(self, Toy::Peek)
        }

        fn to_synchronous(&self) -> Option<Self> {
            match self {
                Toy::EBid(v) => Some(Toy::Bid(*v)),
                Toy::Peek => None,
                Toy::Bid(_) => Some(self.clone()),
            }
        }
    }

    const P0: PlayerId = PlayerId::new(0);

    #[test]
    fn test_parse_game_move_with_index() {
        let mv = Move::<Toy>::parse("7 ebid 4", P0).unwrap();
        assert_eq!(mv.index, Some(7));
        assert_eq!(mv.command, Command::Game(Toy::EBid(4)));
        assert_eq!(mv.to_text(), "7 EBid 4");
    }

    #[test]
    fn test_parse_controls() {
        let start = Move::<Toy>::parse("Start P1", P0).unwrap();
        assert_eq!(start.command, Command::Start(PlayerId::new(1)));
        assert_eq!(start.to_text(), "Start P1");

        for name in ["Edit", "Resign", "Done", "GameOverOnTime"] {
            let mv = Move::<Toy>::parse(name, P0).unwrap();
            assert!(mv.command.is_control());
            assert_eq!(mv.to_text(), name);
        }
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Move::<Toy>::parse("", P0),
            Err(EngineError::MalformedMove { .. })
        ));
        assert!(matches!(
            Move::<Toy>::parse("Jump 3", P0),
            Err(EngineError::UnknownOpcode(_))
        ));
        assert!(Move::<Toy>::parse("Bid", P0).is_err());
        assert!(Move::<Toy>::parse("Bid x", P0).is_err());
        assert!(Move::<Toy>::parse("Bid 3 4", P0).is_err());
        assert!(Move::<Toy>::parse("Done now", P0).is_err());
        assert!(Move::<Toy>::parse("99999999999 Done", P0).is_err());
    }

    #[test]
    fn test_same_move_ignores_index() {
        let a = Move::game(P0, Toy::Bid(3)).with_index(4);
        let b = Move::game(P0, Toy::Bid(3));
        assert_ne!(a, b);
        assert!(a.same_move(&b));
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert!(!a.same_move(&Move::game(PlayerId::new(1), Toy::Bid(3))));
    }

    #[test]
    fn test_classification_and_synchronous_form() {
        let ebid = Move::game(P0, Toy::EBid(2)).with_index(9);
        assert!(ebid.is_ephemeral());
        let sync = ebid.to_synchronous().unwrap();
        assert_eq!(sync, Move::game(P0, Toy::Bid(2)));
        assert!(!sync.is_ephemeral());

        let peek = Move::game(P0, Toy::Peek);
        assert!(!peek.is_transmitted());
        assert!(peek.to_synchronous().is_none());

        let done = Move::<Toy>::done(P0);
        assert!(done.is_transmitted());
        assert_eq!(done.to_synchronous(), Some(done.clone()));
    }
}
