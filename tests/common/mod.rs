//! A small take-away game shared by the integration tests.
//!
//! Players take 1-3 chips from one heap; whoever takes the last chip wins.
//! The move generator always offers all three sizes, so near the end of the
//! game it lists takes the heap cannot cover. Those fail partway through,
//! after some chips have already moved.

#![allow(dead_code)]

use std::cell::Cell as StdCell;

use serde::{Deserialize, Serialize};

use rust_tabletop::core::{EngineError, EngineResult, InitSpec, PhaseKind, PlayerId};
use rust_tabletop::{Board, CellId, Layout, Move, MoveReader, MoveWriter, Mutator, NameTable, Opcode, Rules, Token, ZoneId};

pub const HEAP: ZoneId = ZoneId(0);
pub const TAKEN: ZoneId = ZoneId(1);

thread_local! {
    static HEAP_SIZE: StdCell<Option<usize>> = const { StdCell::new(None) };
}

/// Build heaps of `size` chips regardless of the init seed, until cleared.
pub fn override_heap_size(size: Option<usize>) {
    HEAP_SIZE.with(|s| s.set(size));
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Chip(pub u8);

impl Token for Chip {
    fn digest_code(&self) -> u64 {
        u64::from(self.0) + 1
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeapPhase {
    Puzzle,
    Play,
    Confirm,
    Resign,
    GameOver,
}

impl PhaseKind for HeapPhase {
    fn puzzle() -> Self {
        HeapPhase::Puzzle
    }

    fn resign() -> Self {
        HeapPhase::Resign
    }

    fn game_over() -> Self {
        HeapPhase::GameOver
    }

    fn ordinal(self) -> u32 {
        match self {
            HeapPhase::Puzzle => 0,
            HeapPhase::Play => 1,
            HeapPhase::Confirm => 2,
            HeapPhase::Resign => 3,
            HeapPhase::GameOver => 4,
        }
    }

    fn done_state(self) -> bool {
        matches!(self, HeapPhase::Confirm | HeapPhase::Resign)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeapOp {
    /// Take `n` chips; zero passes.
    Take { n: u8 },
}

const TAKE: u16 = 1;

impl Opcode for HeapOp {
    const NAMES: NameTable = NameTable::new(&[("Take", TAKE)]);

    fn code(&self) -> u16 {
        TAKE
    }

    fn write_operands(&self, w: &mut MoveWriter) {
        let HeapOp::Take { n } = self;
        w.int(n);
    }

    fn read(_code: u16, r: &mut MoveReader<'_>) -> EngineResult<Self> {
        Ok(HeapOp::Take { n: r.int("chip count")? })
    }
}

#[derive(Clone, Debug)]
pub struct Heap {
    size: usize,
}

impl Heap {
    pub fn heap() -> CellId {
        CellId::new(HEAP, 'A', 1)
    }

    pub fn taken(player: PlayerId) -> CellId {
        CellId::new(TAKEN, player.letter(), 0)
    }

    pub fn remaining(board: &Board<Self>) -> usize {
        board.get_cell(Self::heap()).map_or(0, |c| c.height())
    }

    pub fn chips_of(board: &Board<Self>, player: PlayerId) -> usize {
        board.get_cell(Self::taken(player)).map_or(0, |c| c.height())
    }
}

pub fn take(player: PlayerId, n: u8) -> Move<HeapOp> {
    Move::game(player, HeapOp::Take { n })
}

impl Rules for Heap {
    type Token = Chip;
    type Phase = HeapPhase;
    type Op = HeapOp;
    type PlayerState = ();
    type Shared = ();

    const ZONES: NameTable = NameTable::new(&[("Heap", 0), ("Taken", 1)]);

    /// The init seed is the heap size.
    fn new(init: &InitSpec) -> EngineResult<Self> {
        if !init.variant.eq_ignore_ascii_case("heap") || !(2..=16).contains(&init.players) {
            return Err(EngineError::BadInit {
                text: init.to_string(),
                reason: "heap needs 2-16 players".to_string(),
            });
        }
        let size = HEAP_SIZE.with(StdCell::get).unwrap_or(init.seed as usize);
        Ok(Self { size })
    }

    fn layout(&self, init: &InitSpec, layout: &mut Layout<Chip>) -> EngineResult<()> {
        layout.add_cell(Self::heap());
        for p in PlayerId::all(init.players) {
            layout.add_cell(Self::taken(p));
        }
        for i in 0..self.size {
            layout.place(Self::heap(), Chip(i as u8))?;
        }
        Ok(())
    }

    fn initial_player_state(&self, _player: PlayerId) {}

    fn initial_shared(&self) {}

    fn start_phase(_board: &Board<Self>) -> HeapPhase {
        HeapPhase::Play
    }

    fn legal_in_phase(phase: HeapPhase, _op: &HeapOp) -> bool {
        phase == HeapPhase::Play
    }

    fn execute(m: &mut Mutator<'_, Self>, player: PlayerId, op: &HeapOp) -> EngineResult<()> {
        if m.board().turn() != player {
            return Err(EngineError::Rejected {
                mv: Move::game(player, *op).to_string(),
                reason: "not this player's turn".to_string(),
            });
        }
        let HeapOp::Take { n } = *op;
        for _ in 0..n {
            m.move_top(Self::heap(), Self::taken(player))?;
        }
        m.set_phase(HeapPhase::Confirm);
        Ok(())
    }

    fn on_done(m: &mut Mutator<'_, Self>, player: PlayerId) -> EngineResult<()> {
        m.bump_move_number();
        if Self::remaining(m.board()) == 0 {
            m.set_win(player, true);
            m.set_phase(HeapPhase::GameOver);
        } else {
            m.next_turn();
            m.set_phase(HeapPhase::Play);
        }
        Ok(())
    }

    fn legal_moves(board: &Board<Self>, player: PlayerId) -> Vec<Move<HeapOp>> {
        if board.turn() != player {
            return Vec::new();
        }
        match board.phase() {
            HeapPhase::Play => (1..=3).map(|n| take(player, n)).collect(),
            HeapPhase::Confirm => vec![Move::done(player)],
            _ => Vec::new(),
        }
    }

    fn evaluate(board: &Board<Self>, player: PlayerId) -> f64 {
        let mine = Self::chips_of(board, player) as f64;
        let others: usize = PlayerId::all(board.player_count())
            .filter(|&p| p != player)
            .map(|p| Self::chips_of(board, p))
            .sum();
        mine - others as f64
    }
}
