//! Route game implementation.

use serde::{Deserialize, Serialize};

use crate::board::{Board, CellId, Digestible, Digester, Layout, Token, ZoneId};
use crate::core::{EngineError, EngineResult, InitSpec, PhaseKind, PlayerId, Revision};
use crate::engine::Mutator;
use crate::moves::{Move, MoveReader, MoveWriter, NameTable, Opcode};
use crate::rules::Rules;

use super::train::{advance_simulated_time, Train};

pub const STATION: ZoneId = ZoneId(0);
pub const BAG: ZoneId = ZoneId(1);

pub const STATIONS: u8 = 6;
pub const PARCELS_PER_STATION: usize = 2;
/// Longest single run of the train.
pub const MAX_RUN: u8 = 3;

/// A parcel waiting at a station, worth its value when collected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parcel(pub u8);

impl Token for Parcel {
    fn digest_code(&self) -> u64 {
        u64::from(self.0) + 1
    }
}

/// Where a player is relative to the train.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rider {
    Walking(u8),
    /// On the platform, boarding when the train stops here.
    Waiting(u8),
    Riding,
}

impl Digestible for Rider {
    fn digest_into(&self, d: &mut Digester) {
        match *self {
            Rider::Walking(s) => d.mix(u64::from(s)),
            Rider::Waiting(s) => d.mix(100 + u64::from(s)),
            Rider::Riding => d.mix(200),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoutePhase {
    Puzzle,
    Play,
    Confirm,
    Resign,
    GameOver,
}

impl PhaseKind for RoutePhase {
    fn puzzle() -> Self {
        RoutePhase::Puzzle
    }

    fn resign() -> Self {
        RoutePhase::Resign
    }

    fn game_over() -> Self {
        RoutePhase::GameOver
    }

    fn ordinal(self) -> u32 {
        match self {
            RoutePhase::Puzzle => 0,
            RoutePhase::Play => 1,
            RoutePhase::Confirm => 2,
            RoutePhase::Resign => 3,
            RoutePhase::GameOver => 4,
        }
    }

    fn done_state(self) -> bool {
        matches!(self, RoutePhase::Confirm | RoutePhase::Resign)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RouteOp {
    /// Walk to a neighbouring station.
    Walk { to: u8 },
    /// Wait on the platform for the train.
    Wait,
    /// Get off at the train's station and collect a parcel there.
    Exit,
    /// Advance the train by `dt` hops.
    Run { dt: u8 },
}

const WALK: u16 = 1;
const WAIT: u16 = 2;
const EXIT: u16 = 3;
const RUN: u16 = 4;

impl Opcode for RouteOp {
    const NAMES: NameTable = NameTable::new(&[("Walk", WALK), ("Wait", WAIT), ("Exit", EXIT), ("Run", RUN)]);

    fn code(&self) -> u16 {
        match self {
            RouteOp::Walk { .. } => WALK,
            RouteOp::Wait => WAIT,
            RouteOp::Exit => EXIT,
            RouteOp::Run { .. } => RUN,
        }
    }

    fn write_operands(&self, w: &mut MoveWriter) {
        match self {
            RouteOp::Walk { to } => {
                w.col(station_col(*to));
            }
            RouteOp::Run { dt } => {
                w.int(dt);
            }
            RouteOp::Wait | RouteOp::Exit => {}
        }
    }

    fn read(code: u16, r: &mut MoveReader<'_>) -> EngineResult<Self> {
        Ok(match code {
            WALK => {
                let col = r.col()?;
                let to = u8::try_from(u32::from(col).saturating_sub(u32::from('A'))).unwrap_or(u8::MAX);
                RouteOp::Walk { to }
            }
            WAIT => RouteOp::Wait,
            EXIT => RouteOp::Exit,
            _ => RouteOp::Run { dt: r.int("run length")? },
        })
    }
}

fn station_col(station: u8) -> char {
    char::from(b'A'.saturating_add(station))
}

/// Route rules: 1-4 players share one train along a line of stations.
#[derive(Clone, Debug)]
pub struct Route {
    players: usize,
    revision: Revision,
}

impl Route {
    #[must_use]
    pub fn station(index: u8) -> CellId {
        CellId::new(STATION, station_col(index), 0)
    }

    #[must_use]
    pub fn bag(player: PlayerId) -> CellId {
        CellId::new(BAG, player.letter(), 0)
    }

    #[must_use]
    pub fn revision(&self) -> Revision {
        self.revision
    }

    #[must_use]
    pub fn train(board: &Board<Self>) -> Train {
        *board.shared()
    }

    /// Total value of `player`'s collected parcels.
    #[must_use]
    pub fn score(board: &Board<Self>, player: PlayerId) -> u32 {
        board
            .get_cell(Self::bag(player))
            .map_or(0, |c| c.tokens().iter().map(|p| u32::from(p.0)).sum())
    }

    fn parcels_left(board: &Board<Self>) -> usize {
        board.zone(STATION).map(|c| c.height()).sum()
    }

    fn check_op(board: &Board<Self>, player: PlayerId, op: &RouteOp) -> Result<(), &'static str> {
        if board.turn() != player {
            return Err("not this player's turn");
        }
        match (*board.player(player), *op) {
            (Rider::Walking(s) | Rider::Waiting(s), RouteOp::Walk { to }) => {
                if to < STATIONS && s.abs_diff(to) == 1 {
                    Ok(())
                } else {
                    Err("can only walk to a neighbouring station")
                }
            }
            (Rider::Walking(_), RouteOp::Wait) => Ok(()),
            (_, RouteOp::Wait) => Err("already waiting or riding"),
            (Rider::Riding, RouteOp::Exit) => Ok(()),
            (_, RouteOp::Exit) => Err("not on the train"),
            (_, RouteOp::Run { dt }) if (1..=MAX_RUN).contains(&dt) => Ok(()),
            (_, RouteOp::Run { .. }) => Err("run length out of range"),
            (Rider::Riding, RouteOp::Walk { .. }) => Err("cannot walk while riding"),
        }
    }
}

impl Rules for Route {
    type Token = Parcel;
    type Phase = RoutePhase;
    type Op = RouteOp;
    type PlayerState = Rider;
    type Shared = Train;

    const ZONES: NameTable = NameTable::new(&[("Station", 0), ("Bag", 1)]);

    fn new(init: &InitSpec) -> EngineResult<Self> {
        if !init.variant.eq_ignore_ascii_case("route") {
            return Err(EngineError::BadInit {
                text: init.to_string(),
                reason: format!("not a route variant: {}", init.variant),
            });
        }
        if !(1..=4).contains(&init.players) {
            return Err(EngineError::BadInit {
                text: init.to_string(),
                reason: "route needs 1-4 players".to_string(),
            });
        }
        Ok(Self {
            players: init.players,
            revision: init.revision,
        })
    }

    fn layout(&self, _init: &InitSpec, layout: &mut Layout<Parcel>) -> EngineResult<()> {
        for s in 0..STATIONS {
            layout.add_cell(Self::station(s));
            // the first station starts empty
            if s == 0 {
                continue;
            }
            for _ in 0..PARCELS_PER_STATION {
                let value = layout.rng().gen_range_usize(1..6) as u8;
                layout.place(Self::station(s), Parcel(value))?;
            }
        }
        for p in PlayerId::all(self.players) {
            layout.add_cell(Self::bag(p));
        }
        Ok(())
    }

    fn initial_player_state(&self, _player: PlayerId) -> Rider {
        Rider::Walking(0)
    }

    fn initial_shared(&self) -> Train {
        Train::default()
    }

    fn start_phase(_board: &Board<Self>) -> RoutePhase {
        RoutePhase::Play
    }

    fn legal_in_phase(phase: RoutePhase, _op: &RouteOp) -> bool {
        phase == RoutePhase::Play
    }

    fn execute(m: &mut Mutator<'_, Self>, player: PlayerId, op: &RouteOp) -> EngineResult<()> {
        Self::check_op(m.board(), player, op).map_err(|reason| EngineError::rejected(Move::game(player, *op), reason))?;

        match *op {
            RouteOp::Walk { to } => {
                let from = match *m.board().player(player) {
                    Rider::Walking(s) | Rider::Waiting(s) => s,
                    Rider::Riding => to,
                };
                m.update_player(player, |r| *r = Rider::Walking(to));
                m.animate(Self::station(from), Self::station(to));
            }
            RouteOp::Wait => {
                m.update_player(player, |r| {
                    if let Rider::Walking(s) = *r {
                        *r = Rider::Waiting(s);
                    }
                });
            }
            RouteOp::Exit => {
                let here = Self::train(m.board()).station;
                m.update_player(player, |r| *r = Rider::Walking(here));
                if !m.board().cell(Self::station(here))?.is_empty() {
                    m.capture(Self::station(here), Self::bag(player))?;
                }
            }
            RouteOp::Run { dt } => {
                let before = Self::train(m.board());
                let revision = m.rules().revision;
                let (after, visited) = advance_simulated_time(before, dt, STATIONS, revision);
                m.update_shared(|t| *t = after);

                let mut stops = Vec::with_capacity(visited.len() + 1);
                stops.push(before.station);
                stops.extend(&visited);
                for p in PlayerId::all(m.board().player_count()) {
                    if let Rider::Waiting(s) = *m.board().player(p) {
                        if stops.contains(&s) {
                            m.update_player(p, |r| *r = Rider::Riding);
                        }
                    }
                }
                if let Some(&last) = visited.last() {
                    m.animate(Self::station(before.station), Self::station(last));
                }
            }
        }
        m.set_phase(RoutePhase::Confirm);
        Ok(())
    }

    fn on_done(m: &mut Mutator<'_, Self>, player: PlayerId) -> EngineResult<()> {
        if m.board().turn() != player {
            return Err(EngineError::rejected(Move::<RouteOp>::done(player), "not this player's turn"));
        }
        m.bump_move_number();
        m.next_turn();
        if Self::parcels_left(m.board()) == 0 {
            let n = m.board().player_count();
            let scores: Vec<u32> = PlayerId::all(n).map(|p| Self::score(m.board(), p)).collect();
            let best = scores.iter().copied().max().unwrap_or(0);
            for p in PlayerId::all(n).filter(|p| scores[p.index()] == best) {
                m.set_win(p, true);
            }
            m.set_phase(RoutePhase::GameOver);
        } else {
            m.set_phase(RoutePhase::Play);
        }
        Ok(())
    }

    fn legal_moves(board: &Board<Self>, player: PlayerId) -> Vec<Move<RouteOp>> {
        if board.turn() != player {
            return Vec::new();
        }
        match board.phase() {
            RoutePhase::Play => {
                let mut ops = Vec::new();
                match *board.player(player) {
                    Rider::Walking(s) | Rider::Waiting(s) => {
                        if s > 0 {
                            ops.push(RouteOp::Walk { to: s - 1 });
                        }
                        if s + 1 < STATIONS {
                            ops.push(RouteOp::Walk { to: s + 1 });
                        }
                        if matches!(board.player(player), Rider::Walking(_)) {
                            ops.push(RouteOp::Wait);
                        }
                    }
                    Rider::Riding => ops.push(RouteOp::Exit),
                }
                ops.extend((1..=MAX_RUN).map(|dt| RouteOp::Run { dt }));
                ops.into_iter().map(|op| Move::game(player, op)).collect()
            }
            RoutePhase::Confirm => vec![Move::done(player)],
            _ => Vec::new(),
        }
    }

    fn evaluate(board: &Board<Self>, player: PlayerId) -> f64 {
        let mine = f64::from(Self::score(board, player));
        let best_other = PlayerId::all(board.player_count())
            .filter(|&p| p != player)
            .map(|p| Self::score(board, p))
            .max()
            .unwrap_or(0);
        mine - f64::from(best_other)
    }
}
