//! Jump-capture game implementation.

use serde::{Deserialize, Serialize};

use crate::board::{Board, CellId, Layout, Token, ZoneId};
use crate::core::{EngineError, EngineResult, InitSpec, PhaseKind, PlayerId};
use crate::engine::Mutator;
use crate::moves::{Move, MoveReader, MoveWriter, NameTable, Opcode};
use crate::rules::Rules;

pub const BOARD: ZoneId = ZoneId(0);
pub const RACK: ZoneId = ZoneId(1);
pub const CAPTURES: ZoneId = ZoneId(2);

/// Board edge length; columns `A..=E`, rows `1..=5`.
pub const SIZE: i32 = 5;

const DIRECTIONS: [(i32, i32); 8] = [(-1, -1), (0, -1), (1, -1), (-1, 0), (1, 0), (-1, 1), (0, 1), (1, 1)];

/// A stone owned by one player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stone(pub PlayerId);

impl Token for Stone {
    fn digest_code(&self) -> u64 {
        u64::from(self.0 .0) + 1
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JumperPhase {
    Puzzle,
    /// Players take turns placing stones from their racks.
    Place,
    /// Players slide or jump stones already on the board.
    Play,
    /// A move was made and awaits `Done`.
    Confirm,
    Resign,
    GameOver,
}

impl PhaseKind for JumperPhase {
    fn puzzle() -> Self {
        JumperPhase::Puzzle
    }

    fn resign() -> Self {
        JumperPhase::Resign
    }

    fn game_over() -> Self {
        JumperPhase::GameOver
    }

    fn ordinal(self) -> u32 {
        match self {
            JumperPhase::Puzzle => 0,
            JumperPhase::Place => 1,
            JumperPhase::Play => 2,
            JumperPhase::Confirm => 3,
            JumperPhase::Resign => 4,
            JumperPhase::GameOver => 5,
        }
    }

    fn done_state(self) -> bool {
        matches!(self, JumperPhase::Confirm | JumperPhase::Resign)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JumperOp {
    /// Lift the top stone of a cell.
    Pick { cell: CellId },
    /// Land the lifted stone.
    Drop { cell: CellId },
    /// Pick and drop in one move.
    Move { from: CellId, to: CellId },
}

const PICK: u16 = 1;
const DROP: u16 = 2;
const MOVE: u16 = 3;

impl Opcode for JumperOp {
    const NAMES: NameTable = NameTable::new(&[("Pick", PICK), ("Drop", DROP), ("Move", MOVE)]);

    fn code(&self) -> u16 {
        match self {
            JumperOp::Pick { .. } => PICK,
            JumperOp::Drop { .. } => DROP,
            JumperOp::Move { .. } => MOVE,
        }
    }

    fn write_operands(&self, w: &mut MoveWriter) {
        match self {
            JumperOp::Pick { cell } | JumperOp::Drop { cell } => {
                w.cell(&Jumper::ZONES, *cell);
            }
            JumperOp::Move { from, to } => {
                w.cell(&Jumper::ZONES, *from).cell(&Jumper::ZONES, *to);
            }
        }
    }

    fn read(code: u16, r: &mut MoveReader<'_>) -> EngineResult<Self> {
        Ok(match code {
            PICK => JumperOp::Pick {
                cell: r.cell(&Jumper::ZONES)?,
            },
            DROP => JumperOp::Drop {
                cell: r.cell(&Jumper::ZONES)?,
            },
            _ => JumperOp::Move {
                from: r.cell(&Jumper::ZONES)?,
                to: r.cell(&Jumper::ZONES)?,
            },
        })
    }
}

/// How a stone gets from one cell to another.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Slide,
    /// Jump over an enemy stone, capturing it.
    Jump { over: CellId },
}

/// Jump-capture rules: 2-4 players on a 5x5 board.
#[derive(Clone, Debug)]
pub struct Jumper {
    players: usize,
    stones: usize,
}

impl Jumper {
    #[must_use]
    pub fn board_cell(col: char, row: i32) -> CellId {
        CellId::new(BOARD, col, row)
    }

    #[must_use]
    pub fn rack(player: PlayerId) -> CellId {
        CellId::new(RACK, player.letter(), 0)
    }

    #[must_use]
    pub fn captures(player: PlayerId) -> CellId {
        CellId::new(CAPTURES, player.letter(), 0)
    }

    pub fn board_cells() -> impl Iterator<Item = CellId> {
        (1..=SIZE).flat_map(|row| ('A'..='E').map(move |col| Self::board_cell(col, row)))
    }

    fn on_board(cell: CellId) -> bool {
        cell.zone == BOARD
            && ('A'..='E').contains(&cell.col)
            && (1..=SIZE).contains(&cell.row)
    }

    fn owner_at(board: &Board<Self>, cell: CellId) -> Option<PlayerId> {
        board.get_cell(cell).and_then(|c| c.top()).map(|s| s.0)
    }

    fn is_empty_square(board: &Board<Self>, cell: CellId) -> bool {
        Self::on_board(cell) && board.get_cell(cell).is_some_and(|c| c.is_empty())
    }

    /// How `player`'s stone at `from` can reach `to`, treating `from` as vacated.
    #[must_use]
    pub fn step(board: &Board<Self>, player: PlayerId, from: CellId, to: CellId) -> Option<Step> {
        if !Self::on_board(from) || !Self::is_empty_square(board, to) {
            return None;
        }
        let dc = to.col as i32 - from.col as i32;
        let dr = to.row - from.row;
        match (dc.abs(), dr.abs()) {
            (0, 0) => None,
            (a, b) if a <= 1 && b <= 1 => Some(Step::Slide),
            (a, b) if (a == 2 || a == 0) && (b == 2 || b == 0) => {
                let over = from.offset(dc / 2, dr / 2)?;
                match Self::owner_at(board, over) {
                    Some(owner) if owner != player => Some(Step::Jump { over }),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Every cell `player`'s stone at `from` can move to.
    #[must_use]
    pub fn destinations(board: &Board<Self>, player: PlayerId, from: CellId) -> Vec<CellId> {
        DIRECTIONS
            .iter()
            .flat_map(|&(dc, dr)| [from.offset(dc, dr), from.offset(2 * dc, 2 * dr)])
            .flatten()
            .filter(|&to| Self::step(board, player, from, to).is_some())
            .collect()
    }

    /// Board cells holding `player`'s stones.
    #[must_use]
    pub fn stones_on_board(board: &Board<Self>, player: PlayerId) -> Vec<CellId> {
        board
            .zone(BOARD)
            .filter(|c| c.top() == Some(Stone(player)))
            .map(|c| c.id())
            .collect()
    }

    /// Stones on the board or still in the rack.
    #[must_use]
    pub fn stones_left(board: &Board<Self>, player: PlayerId) -> usize {
        let in_rack = board.get_cell(Self::rack(player)).map_or(0, |c| c.height());
        let in_hand = usize::from(board.picked().is_some_and(|f| f.token == Stone(player)));
        in_rack + in_hand + Self::stones_on_board(board, player).len()
    }

    fn racks_empty(board: &Board<Self>) -> bool {
        PlayerId::all(board.player_count())
            .all(|p| board.get_cell(Self::rack(p)).map_or(true, |c| c.is_empty()))
    }

    fn check_turn(m: &Mutator<'_, Self>, player: PlayerId, op: &JumperOp) -> EngineResult<()> {
        if m.board().phase().is_puzzle() || m.board().turn() == player {
            Ok(())
        } else {
            Err(EngineError::rejected(Move::game(player, *op), "not this player's turn"))
        }
    }

    /// Move a stone along a validated step, capturing if it jumps.
    fn apply_step(m: &mut Mutator<'_, Self>, player: PlayerId, step: Step) -> EngineResult<()> {
        if let Step::Jump { over } = step {
            m.capture(over, Self::captures(player))?;
        }
        Ok(())
    }
}

impl Rules for Jumper {
    type Token = Stone;
    type Phase = JumperPhase;
    type Op = JumperOp;
    type PlayerState = ();
    type Shared = ();

    const ZONES: NameTable = NameTable::new(&[("Board", 0), ("Rack", 1), ("Captures", 2)]);

    fn new(init: &InitSpec) -> EngineResult<Self> {
        if !init.variant.eq_ignore_ascii_case("jumper") {
            return Err(EngineError::BadInit {
                text: init.to_string(),
                reason: format!("not a jumper variant: {}", init.variant),
            });
        }
        if !(2..=4).contains(&init.players) {
            return Err(EngineError::BadInit {
                text: init.to_string(),
                reason: "jumper needs 2-4 players".to_string(),
            });
        }
        let stones = if init.players == 2 { 4 } else { 3 };
        Ok(Self {
            players: init.players,
            stones,
        })
    }

    fn layout(&self, _init: &InitSpec, layout: &mut Layout<Stone>) -> EngineResult<()> {
        for cell in Self::board_cells() {
            layout.add_bounded_cell(cell, 1);
        }
        for p in PlayerId::all(self.players) {
            layout.add_cell(Self::rack(p));
            for _ in 0..self.stones {
                layout.place(Self::rack(p), Stone(p))?;
            }
        }
        for p in PlayerId::all(self.players) {
            layout.add_cell(Self::captures(p));
        }
        Ok(())
    }

    fn initial_player_state(&self, _player: PlayerId) {}

    fn initial_shared(&self) {}

    fn start_phase(board: &Board<Self>) -> JumperPhase {
        if Self::racks_empty(board) {
            JumperPhase::Play
        } else {
            JumperPhase::Place
        }
    }

    fn legal_in_phase(phase: JumperPhase, _op: &JumperOp) -> bool {
        matches!(phase, JumperPhase::Puzzle | JumperPhase::Place | JumperPhase::Play)
    }

    fn execute(m: &mut Mutator<'_, Self>, player: PlayerId, op: &JumperOp) -> EngineResult<()> {
        Self::check_turn(m, player, op)?;
        let reject = |reason: &str| EngineError::rejected(Move::game(player, *op), reason);
        let phase = m.board().phase();

        match (phase, *op) {
            (JumperPhase::Puzzle, JumperOp::Pick { cell }) => {
                m.pick(cell)?;
            }
            (JumperPhase::Puzzle, JumperOp::Drop { cell }) => {
                m.drop_on(cell)?;
            }
            (JumperPhase::Puzzle, JumperOp::Move { from, to }) => {
                m.move_top(from, to)?;
            }

            (JumperPhase::Place, JumperOp::Pick { cell }) => {
                if cell != Self::rack(player) {
                    return Err(reject("stones are placed from the mover's own rack"));
                }
                m.pick(cell)?;
            }
            (JumperPhase::Place, JumperOp::Drop { cell }) => {
                let flight = m.board().picked().copied().ok_or(EngineError::NothingPicked)?;
                if cell == flight.source {
                    m.drop_on(cell)?;
                } else if Self::is_empty_square(m.board(), cell) {
                    m.drop_on(cell)?;
                    m.set_phase(JumperPhase::Confirm);
                } else {
                    return Err(reject("placement needs an empty square"));
                }
            }
            (JumperPhase::Place, JumperOp::Move { from, to }) => {
                if m.board().picked().is_some() {
                    return Err(EngineError::AlreadyPicked);
                }
                if from != Self::rack(player) || !Self::is_empty_square(m.board(), to) {
                    return Err(reject("placement goes from the mover's rack to an empty square"));
                }
                m.move_top(from, to)?;
                m.set_phase(JumperPhase::Confirm);
            }

            (JumperPhase::Play, JumperOp::Pick { cell }) => {
                if !Self::on_board(cell) || Self::owner_at(m.board(), cell) != Some(player) {
                    return Err(reject("only the mover's own stones can be lifted"));
                }
                m.pick(cell)?;
            }
            (JumperPhase::Play, JumperOp::Drop { cell }) => {
                let flight = m.board().picked().copied().ok_or(EngineError::NothingPicked)?;
                if cell == flight.source {
                    m.drop_on(cell)?;
                } else {
                    let step = Self::step(m.board(), player, flight.source, cell)
                        .ok_or_else(|| reject("not a slide or jump"))?;
                    Self::apply_step(m, player, step)?;
                    m.drop_on(cell)?;
                    m.set_phase(JumperPhase::Confirm);
                }
            }
            (JumperPhase::Play, JumperOp::Move { from, to }) => {
                if m.board().picked().is_some() {
                    return Err(EngineError::AlreadyPicked);
                }
                if Self::owner_at(m.board(), from) != Some(player) {
                    return Err(reject("only the mover's own stones can move"));
                }
                let step = Self::step(m.board(), player, from, to)
                    .ok_or_else(|| reject("not a slide or jump"))?;
                Self::apply_step(m, player, step)?;
                m.move_top(from, to)?;
                m.set_phase(JumperPhase::Confirm);
            }

            (JumperPhase::Confirm | JumperPhase::Resign | JumperPhase::GameOver, _) => {
                return Err(reject("no stone moves in this phase"));
            }
        }
        Ok(())
    }

    fn on_done(m: &mut Mutator<'_, Self>, player: PlayerId) -> EngineResult<()> {
        if m.board().turn() != player {
            return Err(EngineError::rejected(Move::<JumperOp>::done(player), "not this player's turn"));
        }
        m.bump_move_number();
        m.next_turn();

        let n = m.board().player_count();
        let left: Vec<usize> = PlayerId::all(n).map(|p| Self::stones_left(m.board(), p)).collect();
        if left.iter().any(|&l| l == 0) {
            let most = left.iter().copied().max().unwrap_or(0);
            for p in PlayerId::all(n).filter(|p| left[p.index()] == most) {
                m.set_win(p, true);
            }
            m.set_phase(JumperPhase::GameOver);
            return Ok(());
        }

        if Self::racks_empty(m.board()) {
            m.set_phase(JumperPhase::Play);
            let next = m.board().turn();
            if Self::legal_moves(m.board(), next).is_empty() {
                m.set_win(player, true);
                m.set_phase(JumperPhase::GameOver);
            }
        } else {
            m.set_phase(JumperPhase::Place);
        }
        Ok(())
    }

    fn is_legal_to_pick(board: &Board<Self>, player: PlayerId, cell: CellId) -> bool {
        if board.turn() != player || board.picked().is_some() {
            return false;
        }
        match board.phase() {
            JumperPhase::Place => cell == Self::rack(player) && board.get_cell(cell).is_some_and(|c| !c.is_empty()),
            JumperPhase::Play => Self::owner_at(board, cell) == Some(player) && Self::on_board(cell),
            _ => false,
        }
    }

    fn is_legal_to_drop(board: &Board<Self>, player: PlayerId, cell: CellId) -> bool {
        let Some(flight) = board.picked() else {
            return false;
        };
        if board.turn() != player {
            return false;
        }
        if cell == flight.source {
            return true;
        }
        match board.phase() {
            JumperPhase::Place => Self::is_empty_square(board, cell),
            JumperPhase::Play => Self::step(board, player, flight.source, cell).is_some(),
            _ => false,
        }
    }

    fn legal_moves(board: &Board<Self>, player: PlayerId) -> Vec<Move<JumperOp>> {
        if board.turn() != player {
            return Vec::new();
        }
        if let Some(flight) = board.picked() {
            let mut drops: Vec<CellId> = match board.phase() {
                JumperPhase::Place => Self::board_cells().filter(|&c| Self::is_empty_square(board, c)).collect(),
                JumperPhase::Play => Self::board_cells()
                    .filter(|&c| Self::step(board, player, flight.source, c).is_some())
                    .collect(),
                _ => Vec::new(),
            };
            drops.push(flight.source);
            return drops
                .into_iter()
                .map(|cell| Move::game(player, JumperOp::Drop { cell }))
                .collect();
        }
        match board.phase() {
            JumperPhase::Place => {
                let rack = Self::rack(player);
                if board.get_cell(rack).map_or(true, |c| c.is_empty()) {
                    return Vec::new();
                }
                Self::board_cells()
                    .filter(|&to| Self::is_empty_square(board, to))
                    .map(|to| Move::game(player, JumperOp::Move { from: rack, to }))
                    .collect()
            }
            JumperPhase::Play => Self::stones_on_board(board, player)
                .into_iter()
                .flat_map(|from| {
                    Self::destinations(board, player, from)
                        .into_iter()
                        .map(move |to| Move::game(player, JumperOp::Move { from, to }))
                })
                .collect(),
            JumperPhase::Confirm => vec![Move::done(player)],
            JumperPhase::Puzzle | JumperPhase::Resign | JumperPhase::GameOver => Vec::new(),
        }
    }

    fn evaluate(board: &Board<Self>, player: PlayerId) -> f64 {
        let mine = Self::stones_left(board, player) as f64;
        let best_other = PlayerId::all(board.player_count())
            .filter(|&p| p != player)
            .map(|p| Self::stones_left(board, p))
            .max()
            .unwrap_or(0) as f64;
        mine - best_other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EngineConfig;
    use crate::rules::GameResult;

    const P0: PlayerId = PlayerId::new(0);
    const P1: PlayerId = PlayerId::new(1);

    fn board() -> Board<Jumper> {
        Board::from_init_text("jumper 1 2", EngineConfig::default()).unwrap()
    }

    fn started() -> Board<Jumper> {
        let mut b = board();
        b.execute(&Move::start(P0, P0)).unwrap();
        b
    }

    fn c(col: char, row: i32) -> CellId {
        Jumper::board_cell(col, row)
    }

    fn place(b: &mut Board<Jumper>, player: PlayerId, to: CellId) {
        b.execute(&Move::game(player, JumperOp::Move { from: Jumper::rack(player), to }))
            .unwrap();
        b.execute(&Move::done(player)).unwrap();
    }

    #[test]
    fn test_layout() {
        let b = board();
        assert_eq!(b.zone(BOARD).count(), 25);
        assert_eq!(b.cell(Jumper::rack(P0)).unwrap().height(), 4);
        assert_eq!(b.cell(Jumper::rack(P1)).unwrap().height(), 4);
        assert_eq!(b.phase(), JumperPhase::Puzzle);
    }

    #[test]
    fn test_rejects_bad_init() {
        assert!(Board::<Jumper>::from_init_text("jumper 1 5", EngineConfig::default()).is_err());
        assert!(Board::<Jumper>::from_init_text("auction 1 2", EngineConfig::default()).is_err());
    }

    #[test]
    fn test_start_enters_place() {
        let b = started();
        assert_eq!(b.phase(), JumperPhase::Place);
        assert_eq!(b.turn(), P0);
        assert_eq!(b.legal_moves(P0).len(), 25);
        assert!(b.legal_moves(P1).is_empty());
    }

    #[test]
    fn test_place_then_done_passes_turn() {
        let mut b = started();
        b.execute(&Move::game(P0, JumperOp::Move { from: Jumper::rack(P0), to: c('C', 3) }))
            .unwrap();
        assert_eq!(b.phase(), JumperPhase::Confirm);
        assert_eq!(b.legal_moves(P0), vec![Move::done(P0)]);

        b.execute(&Move::done(P0)).unwrap();
        assert_eq!(b.phase(), JumperPhase::Place);
        assert_eq!(b.turn(), P1);
        assert_eq!(b.move_number(), 2);
    }

    #[test]
    fn test_placement_into_occupied_square_rejected() {
        let mut b = started();
        place(&mut b, P0, c('C', 3));
        let before = b.digest();
        let err = b
            .execute(&Move::game(P1, JumperOp::Move { from: Jumper::rack(P1), to: c('C', 3) }))
            .unwrap_err();
        assert!(matches!(err, EngineError::Rejected { .. }));
        assert_eq!(b.digest(), before);
    }

    #[test]
    fn test_wrong_player_rejected() {
        let mut b = started();
        let err = b
            .execute(&Move::game(P1, JumperOp::Pick { cell: Jumper::rack(P1) }))
            .unwrap_err();
        assert!(matches!(err, EngineError::Rejected { .. }));
    }

    #[test]
    fn test_pick_and_drop_legality_queries() {
        let mut b = started();
        assert!(b.is_legal_to_pick(P0, Jumper::rack(P0)));
        assert!(!b.is_legal_to_pick(P0, Jumper::rack(P1)));
        b.execute(&Move::game(P0, JumperOp::Pick { cell: Jumper::rack(P0) })).unwrap();
        assert!(b.is_legal_to_drop(P0, c('A', 1)));
        assert!(b.is_legal_to_drop(P0, Jumper::rack(P0)));
        assert!(!b.is_legal_to_drop(P0, Jumper::rack(P1)));
    }

    #[test]
    fn test_jump_captures() {
        let mut b = started();
        place(&mut b, P0, c('A', 1));
        place(&mut b, P1, c('B', 2));
        assert_eq!(
            Jumper::step(&b, P0, c('A', 1), c('C', 3)),
            Some(Step::Jump { over: c('B', 2) })
        );
        assert_eq!(Jumper::step(&b, P1, c('B', 2), c('C', 3)), Some(Step::Slide));
        assert_eq!(Jumper::step(&b, P0, c('A', 1), c('A', 4)), None);
    }

    #[test]
    fn test_play_phase_move_and_capture() {
        let mut b = started();
        // fill racks: P0 on row 1, P1 on row 5, then one P1 stone at B2
        let p0 = [c('A', 1), c('C', 1), c('E', 1), c('D', 1)];
        let p1 = [c('B', 2), c('A', 5), c('C', 5), c('E', 5)];
        for i in 0..4 {
            place(&mut b, P0, p0[i]);
            place(&mut b, P1, p1[i]);
        }
        assert_eq!(b.phase(), JumperPhase::Play);
        assert_eq!(b.turn(), P0);

        let effect = b
            .execute(&Move::game(P0, JumperOp::Move { from: c('A', 1), to: c('C', 3) }))
            .unwrap();
        assert_eq!(effect.captured.as_slice(), &[Stone(P1)]);
        assert_eq!(b.cell(Jumper::captures(P0)).unwrap().height(), 1);
        assert!(b.cell(c('B', 2)).unwrap().is_empty());
        assert_eq!(Jumper::stones_left(&b, P1), 3);
        assert!(Jumper::evaluate(&b, P0) > 0.0);
    }

    #[test]
    fn test_capturing_last_stone_wins() {
        let mut b = Board::<Jumper>::from_init_text("jumper 1 2", EngineConfig::default()).unwrap();
        // puzzle setup: one stone each, racks emptied
        for p in [P0, P1] {
            for _ in 0..3 {
                b.execute(&Move::game(p, JumperOp::Move { from: Jumper::rack(p), to: Jumper::captures(p) }))
                    .unwrap();
            }
        }
        b.execute(&Move::game(P0, JumperOp::Move { from: Jumper::rack(P0), to: c('A', 1) }))
            .unwrap();
        b.execute(&Move::game(P1, JumperOp::Move { from: Jumper::rack(P1), to: c('B', 2) }))
            .unwrap();
        b.execute(&Move::start(P0, P0)).unwrap();
        assert_eq!(b.phase(), JumperPhase::Play);

        b.execute(&Move::game(P0, JumperOp::Move { from: c('A', 1), to: c('C', 3) }))
            .unwrap();
        b.execute(&Move::done(P0)).unwrap();
        assert_eq!(b.phase(), JumperPhase::GameOver);
        assert_eq!(b.result(), Some(GameResult::Winner(P0)));
    }

    #[test]
    fn test_move_text_round_trip() {
        let mv = Move::game(P0, JumperOp::Move { from: Jumper::rack(P0), to: c('C', 3) });
        assert_eq!(mv.to_text(), "Move Rack A 0 Board C 3");
        let parsed = Move::<JumperOp>::parse(&mv.to_text(), P0).unwrap();
        assert!(parsed.same_move(&mv));
    }

    #[test]
    fn test_opcode_names_do_not_clash_with_controls() {
        assert!(JumperOp::NAMES.is_bijective());
        assert!(JumperOp::NAMES.is_disjoint(&crate::moves::CONTROL_NAMES));
        assert!(Jumper::ZONES.is_bijective());
    }
}
