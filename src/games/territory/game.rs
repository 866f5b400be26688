//! Territory game implementation.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::board::{Board, CellId, Digestible, Digester, Layout, Token, ZoneId};
use crate::core::{EngineError, EngineResult, InitSpec, PhaseKind, PlayerId};
use crate::engine::Mutator;
use crate::moves::{Move, MoveReader, MoveWriter, NameTable, Opcode};
use crate::rules::Rules;

pub const BOARD: ZoneId = ZoneId(0);
pub const SUPPLY: ZoneId = ZoneId(1);
pub const PRISONERS: ZoneId = ZoneId(2);

/// Board edge length; columns `A..=E`, rows `1..=5`.
pub const SIZE: i32 = 5;

/// Stones each player puts down during setup.
pub const SETUP_STONES: u8 = 2;

/// Stones each player starts with, setup included.
pub const SUPPLY_STONES: usize = 12;

const NEIGHBORS: [(i32, i32); 4] = [(0, -1), (-1, 0), (1, 0), (0, 1)];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stone(pub PlayerId);

impl Token for Stone {
    fn digest_code(&self) -> u64 {
        u64::from(self.0 .0) + 1
    }
}

/// A player's progress through setup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Settler {
    pub placed: u8,
    pub setup_done: bool,
}

impl Digestible for Settler {
    fn digest_into(&self, d: &mut Digester) {
        d.mix(u64::from(self.placed));
        self.setup_done.digest_into(d);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerritoryPhase {
    Puzzle,
    /// Both players place their opening stones at once.
    Setup,
    Play,
    Confirm,
    Resign,
    GameOver,
}

impl PhaseKind for TerritoryPhase {
    fn puzzle() -> Self {
        TerritoryPhase::Puzzle
    }

    fn resign() -> Self {
        TerritoryPhase::Resign
    }

    fn game_over() -> Self {
        TerritoryPhase::GameOver
    }

    fn ordinal(self) -> u32 {
        match self {
            TerritoryPhase::Puzzle => 0,
            TerritoryPhase::Setup => 1,
            TerritoryPhase::Play => 2,
            TerritoryPhase::Confirm => 3,
            TerritoryPhase::Resign => 4,
            TerritoryPhase::GameOver => 5,
        }
    }

    fn done_state(self) -> bool {
        matches!(
            self,
            TerritoryPhase::Setup | TerritoryPhase::Confirm | TerritoryPhase::Resign
        )
    }

    fn simultaneous_turns_allowed(self) -> bool {
        self == TerritoryPhase::Setup
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerritoryOp {
    /// Put a stone from the supply on an empty point.
    Place { cell: CellId },
    Pass,
    /// Lock in the setup stones.
    SetupDone,
    /// Unsynchronized `Place` made during setup.
    EPlace { cell: CellId },
    /// Unsynchronized `SetupDone`.
    ESetupDone,
}

const PLACE: u16 = 1;
const PASS: u16 = 2;
const SETUP_DONE: u16 = 3;
const EPLACE: u16 = 4;
const ESETUP_DONE: u16 = 5;

impl Opcode for TerritoryOp {
    const NAMES: NameTable = NameTable::new(&[
        ("Place", PLACE),
        ("Pass", PASS),
        ("SetupDone", SETUP_DONE),
        ("EPlace", EPLACE),
        ("ESetupDone", ESETUP_DONE),
    ]);

    fn code(&self) -> u16 {
        match self {
            TerritoryOp::Place { .. } => PLACE,
            TerritoryOp::Pass => PASS,
            TerritoryOp::SetupDone => SETUP_DONE,
            TerritoryOp::EPlace { .. } => EPLACE,
            TerritoryOp::ESetupDone => ESETUP_DONE,
        }
    }

    fn write_operands(&self, w: &mut MoveWriter) {
        if let TerritoryOp::Place { cell } | TerritoryOp::EPlace { cell } = self {
            w.cell(&Territory::ZONES, *cell);
        }
    }

    fn read(code: u16, r: &mut MoveReader<'_>) -> EngineResult<Self> {
        Ok(match code {
            PLACE => TerritoryOp::Place {
                cell: r.cell(&Territory::ZONES)?,
            },
            PASS => TerritoryOp::Pass,
            SETUP_DONE => TerritoryOp::SetupDone,
            EPLACE => TerritoryOp::EPlace {
                cell: r.cell(&Territory::ZONES)?,
            },
            _ => TerritoryOp::ESetupDone,
        })
    }

    fn is_ephemeral(&self) -> bool {
        matches!(self, TerritoryOp::EPlace { .. } | TerritoryOp::ESetupDone)
    }

    fn to_synchronous(&self) -> Option<Self> {
        Some(match *self {
            TerritoryOp::EPlace { cell } => TerritoryOp::Place { cell },
            TerritoryOp::ESetupDone => TerritoryOp::SetupDone,
            other => other,
        })
    }
}

/// Connected stones of one owner and the empty points touching them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Group {
    pub stones: Vec<CellId>,
    pub liberties: usize,
}

/// Territory rules: two players on a 5x5 board.
#[derive(Clone, Debug)]
pub struct Territory;

impl Territory {
    #[must_use]
    pub fn point(col: char, row: i32) -> CellId {
        CellId::new(BOARD, col, row)
    }

    #[must_use]
    pub fn supply(player: PlayerId) -> CellId {
        CellId::new(SUPPLY, player.letter(), 0)
    }

    #[must_use]
    pub fn prisoners(player: PlayerId) -> CellId {
        CellId::new(PRISONERS, player.letter(), 0)
    }

    pub fn points() -> impl Iterator<Item = CellId> {
        (1..=SIZE).flat_map(|row| ('A'..='E').map(move |col| Self::point(col, row)))
    }

    /// Rows a player may use during setup: the two nearest its own edge.
    #[must_use]
    pub fn is_home(player: PlayerId, cell: CellId) -> bool {
        let rows = if player.index() == 0 { 1..=2 } else { SIZE - 1..=SIZE };
        Self::on_board(cell) && rows.contains(&cell.row)
    }

    fn on_board(cell: CellId) -> bool {
        cell.zone == BOARD && ('A'..='E').contains(&cell.col) && (1..=SIZE).contains(&cell.row)
    }

    fn neighbors(cell: CellId) -> impl Iterator<Item = CellId> {
        NEIGHBORS
            .into_iter()
            .filter_map(move |(dc, dr)| cell.offset(dc, dr))
            .filter(|&c| Self::on_board(c))
    }

    #[must_use]
    pub fn owner_at(board: &Board<Self>, cell: CellId) -> Option<PlayerId> {
        board.get_cell(cell).and_then(|c| c.top()).map(|s| s.0)
    }

    fn is_empty_point(board: &Board<Self>, cell: CellId) -> bool {
        Self::on_board(cell) && board.get_cell(cell).is_some_and(|c| c.is_empty())
    }

    #[must_use]
    pub fn settler(board: &Board<Self>, player: PlayerId) -> Settler {
        *board.player(player)
    }

    /// Consecutive passes so far.
    #[must_use]
    pub fn passes(board: &Board<Self>) -> u8 {
        *board.shared()
    }

    #[must_use]
    pub fn supply_left(board: &Board<Self>, player: PlayerId) -> usize {
        board.get_cell(Self::supply(player)).map_or(0, |c| c.height())
    }

    /// The group containing `start` under `occupant`, or an empty group if
    /// `start` is unoccupied.
    fn group_with(occupant: &impl Fn(CellId) -> Option<PlayerId>, start: CellId) -> Group {
        let Some(owner) = occupant(start) else {
            return Group::default();
        };
        let mut seen = FxHashSet::default();
        let mut liberties = FxHashSet::default();
        let mut stones = Vec::new();
        let mut stack = vec![start];
        seen.insert(start);
        while let Some(cell) = stack.pop() {
            stones.push(cell);
            for next in Self::neighbors(cell) {
                match occupant(next) {
                    None => {
                        liberties.insert(next);
                    }
                    Some(p) if p == owner && seen.insert(next) => stack.push(next),
                    Some(_) => {}
                }
            }
        }
        Group {
            stones,
            liberties: liberties.len(),
        }
    }

    #[must_use]
    pub fn group_at(board: &Board<Self>, cell: CellId) -> Group {
        Self::group_with(&|c| Self::owner_at(board, c), cell)
    }

    /// Whether `player` may put a stone on `cell`: the point is empty and
    /// the new stone either keeps a liberty or captures.
    #[must_use]
    pub fn can_place(board: &Board<Self>, player: PlayerId, cell: CellId) -> bool {
        if !Self::is_empty_point(board, cell) {
            return false;
        }
        let occupant = |c: CellId| if c == cell { Some(player) } else { Self::owner_at(board, c) };
        let captures = Self::neighbors(cell).any(|n| {
            matches!(occupant(n), Some(p) if p != player) && Self::group_with(&occupant, n).liberties == 0
        });
        captures || Self::group_with(&occupant, cell).liberties > 0
    }

    /// Stones on the board plus empty regions bordered only by `player`.
    #[must_use]
    pub fn area(board: &Board<Self>, player: PlayerId) -> usize {
        let mut seen = FxHashSet::default();
        let mut total = 0;
        for cell in Self::points() {
            match Self::owner_at(board, cell) {
                Some(p) if p == player => total += 1,
                Some(_) => {}
                None if seen.contains(&cell) => {}
                None => {
                    let mut region = 0;
                    let mut borders = FxHashSet::default();
                    let mut stack = vec![cell];
                    seen.insert(cell);
                    while let Some(c) = stack.pop() {
                        region += 1;
                        for n in Self::neighbors(c) {
                            match Self::owner_at(board, n) {
                                Some(p) => {
                                    borders.insert(p);
                                }
                                None => {
                                    if seen.insert(n) {
                                        stack.push(n);
                                    }
                                }
                            }
                        }
                    }
                    if borders.len() == 1 && borders.contains(&player) {
                        total += region;
                    }
                }
            }
        }
        total
    }

    fn check_turn(m: &Mutator<'_, Self>, player: PlayerId, op: &TerritoryOp) -> EngineResult<()> {
        if m.board().turn() == player {
            Ok(())
        } else {
            Err(EngineError::rejected(Move::game(player, *op), "not this player's turn"))
        }
    }

    fn setup_place(m: &mut Mutator<'_, Self>, player: PlayerId, cell: CellId, op: &TerritoryOp) -> EngineResult<()> {
        let reject = |reason: &str| EngineError::rejected(Move::game(player, *op), reason);
        let settler = Self::settler(m.board(), player);
        if settler.setup_done {
            return Err(reject("setup already finished"));
        }
        if settler.placed >= SETUP_STONES {
            return Err(reject("all setup stones placed"));
        }
        if !Self::is_home(player, cell) || !Self::is_empty_point(m.board(), cell) {
            return Err(reject("setup stones go on empty points in the home rows"));
        }
        m.move_top(Self::supply(player), cell)?;
        m.update_player(player, |s| s.placed += 1);
        Ok(())
    }

    fn setup_done(m: &mut Mutator<'_, Self>, player: PlayerId, op: &TerritoryOp) -> EngineResult<()> {
        let settler = Self::settler(m.board(), player);
        if settler.setup_done || settler.placed < SETUP_STONES {
            return Err(EngineError::rejected(
                Move::game(player, *op),
                format!("{} of {SETUP_STONES} setup stones placed", settler.placed),
            ));
        }
        m.update_player(player, |s| s.setup_done = true);
        Ok(())
    }

    /// Place a stone in play and remove the enemy groups it leaves without liberties.
    fn play_place(m: &mut Mutator<'_, Self>, player: PlayerId, cell: CellId, op: &TerritoryOp) -> EngineResult<()> {
        if !Self::can_place(m.board(), player, cell) {
            return Err(EngineError::rejected(Move::game(player, *op), "point is taken or has no liberties"));
        }
        m.move_top(Self::supply(player), cell)?;
        for n in Self::neighbors(cell) {
            if matches!(Self::owner_at(m.board(), n), Some(p) if p != player) {
                let group = Self::group_at(m.board(), n);
                if group.liberties == 0 {
                    for stone in &group.stones {
                        m.capture(*stone, Self::prisoners(player))?;
                    }
                    debug!(player = %player, stones = group.stones.len(), "group captured");
                }
            }
        }
        m.update_shared(|passes| *passes = 0);
        Ok(())
    }

    /// Score the board and end the game; equal areas share the win.
    fn finish(m: &mut Mutator<'_, Self>) {
        let n = m.board().player_count();
        let areas: Vec<usize> = PlayerId::all(n).map(|p| Self::area(m.board(), p)).collect();
        let best = areas.iter().copied().max().unwrap_or(0);
        for p in PlayerId::all(n).filter(|p| areas[p.index()] == best) {
            m.set_win(p, true);
        }
        debug!(?areas, "game scored");
        m.set_phase(TerritoryPhase::GameOver);
    }
}

impl Rules for Territory {
    type Token = Stone;
    type Phase = TerritoryPhase;
    type Op = TerritoryOp;
    type PlayerState = Settler;
    type Shared = u8;

    const ZONES: NameTable = NameTable::new(&[("Board", 0), ("Supply", 1), ("Prisoners", 2)]);

    fn new(init: &InitSpec) -> EngineResult<Self> {
        if !init.variant.eq_ignore_ascii_case("territory") {
            return Err(EngineError::BadInit {
                text: init.to_string(),
                reason: format!("not a territory variant: {}", init.variant),
            });
        }
        if init.players != 2 {
            return Err(EngineError::BadInit {
                text: init.to_string(),
                reason: "territory needs 2 players".to_string(),
            });
        }
        Ok(Self)
    }

    fn layout(&self, init: &InitSpec, layout: &mut Layout<Stone>) -> EngineResult<()> {
        for cell in Self::points() {
            layout.add_bounded_cell(cell, 1);
        }
        for p in PlayerId::all(init.players) {
            layout.add_cell(Self::supply(p)).add_cell(Self::prisoners(p));
            for _ in 0..SUPPLY_STONES {
                layout.place(Self::supply(p), Stone(p))?;
            }
        }
        Ok(())
    }

    fn initial_player_state(&self, _player: PlayerId) -> Settler {
        Settler::default()
    }

    fn initial_shared(&self) -> u8 {
        0
    }

    fn start_phase(board: &Board<Self>) -> TerritoryPhase {
        if board.players().all(|s| s.setup_done) {
            TerritoryPhase::Play
        } else {
            TerritoryPhase::Setup
        }
    }

    fn legal_in_phase(phase: TerritoryPhase, op: &TerritoryOp) -> bool {
        match phase {
            TerritoryPhase::Setup => *op != TerritoryOp::Pass,
            TerritoryPhase::Play => matches!(op, TerritoryOp::Place { .. } | TerritoryOp::Pass),
            _ => false,
        }
    }

    fn execute(m: &mut Mutator<'_, Self>, player: PlayerId, op: &TerritoryOp) -> EngineResult<()> {
        match (m.board().phase(), *op) {
            (TerritoryPhase::Setup, TerritoryOp::Place { cell } | TerritoryOp::EPlace { cell }) => {
                Self::setup_place(m, player, cell, op)
            }
            (TerritoryPhase::Setup, TerritoryOp::SetupDone | TerritoryOp::ESetupDone) => Self::setup_done(m, player, op),
            (TerritoryPhase::Play, TerritoryOp::Place { cell }) => {
                Self::check_turn(m, player, op)?;
                Self::play_place(m, player, cell, op)?;
                m.set_phase(TerritoryPhase::Confirm);
                Ok(())
            }
            (TerritoryPhase::Play, TerritoryOp::Pass) => {
                Self::check_turn(m, player, op)?;
                m.update_shared(|passes| *passes = passes.saturating_add(1));
                m.set_phase(TerritoryPhase::Confirm);
                Ok(())
            }
            _ => Err(EngineError::rejected(Move::game(player, *op), "not playable now")),
        }
    }

    fn on_done(m: &mut Mutator<'_, Self>, player: PlayerId) -> EngineResult<()> {
        let n = m.board().player_count();
        if m.board().phase() == TerritoryPhase::Setup {
            if let Some(waiting) = PlayerId::all(n).find(|&p| !Self::settler(m.board(), p).setup_done) {
                return Err(EngineError::rejected(
                    Move::<TerritoryOp>::done(player),
                    format!("{waiting} has not finished setup"),
                ));
            }
            m.bump_move_number();
            m.set_phase(TerritoryPhase::Play);
            return Ok(());
        }

        m.bump_move_number();
        let supplies_empty = PlayerId::all(n).all(|p| Self::supply_left(m.board(), p) == 0);
        if usize::from(Self::passes(m.board())) >= n || supplies_empty {
            Self::finish(m);
        } else {
            m.next_turn();
            m.set_phase(TerritoryPhase::Play);
        }
        Ok(())
    }

    fn legal_moves(board: &Board<Self>, player: PlayerId) -> Vec<Move<TerritoryOp>> {
        match board.phase() {
            TerritoryPhase::Setup => {
                let settler = Self::settler(board, player);
                if settler.setup_done {
                    if board.turn() == player && board.players().all(|s| s.setup_done) {
                        vec![Move::done(player)]
                    } else {
                        Vec::new()
                    }
                } else if settler.placed < SETUP_STONES {
                    Self::points()
                        .filter(|&c| Self::is_home(player, c) && Self::is_empty_point(board, c))
                        .map(|cell| Move::game(player, TerritoryOp::Place { cell }))
                        .collect()
                } else {
                    vec![Move::game(player, TerritoryOp::SetupDone)]
                }
            }
            TerritoryPhase::Play if board.turn() == player => {
                let mut moves: Vec<_> = if Self::supply_left(board, player) > 0 {
                    Self::points()
                        .filter(|&c| Self::can_place(board, player, c))
                        .map(|cell| Move::game(player, TerritoryOp::Place { cell }))
                        .collect()
                } else {
                    Vec::new()
                };
                moves.push(Move::game(player, TerritoryOp::Pass));
                moves
            }
            TerritoryPhase::Confirm if board.turn() == player => vec![Move::done(player)],
            _ => Vec::new(),
        }
    }

    fn mover(board: &Board<Self>) -> PlayerId {
        if board.phase() == TerritoryPhase::Setup {
            if let Some(p) = PlayerId::all(board.player_count()).find(|&p| !Self::has_committed(board, p)) {
                return p;
            }
        }
        board.turn()
    }

    fn has_committed(board: &Board<Self>, player: PlayerId) -> bool {
        board.phase() != TerritoryPhase::Setup || Self::settler(board, player).setup_done
    }

    fn evaluate(board: &Board<Self>, player: PlayerId) -> f64 {
        let mine = Self::area(board, player) as f64;
        let best_other = PlayerId::all(board.player_count())
            .filter(|&p| p != player)
            .map(|p| Self::area(board, p))
            .max()
            .unwrap_or(0);
        mine - best_other as f64
    }
}
