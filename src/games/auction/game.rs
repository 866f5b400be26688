//! Sealed-bid auction implementation.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::board::{Board, CellId, Layout, Token, ZoneId};
use crate::core::{EngineError, EngineResult, InitSpec, PhaseKind, PlayerId};
use crate::engine::Mutator;
use crate::moves::{Move, MoveReader, MoveWriter, NameTable, Opcode};
use crate::rules::Rules;

pub const PILE: ZoneId = ZoneId(0);
pub const PRIZE: ZoneId = ZoneId(1);
pub const HAND: ZoneId = ZoneId(2);
pub const BID: ZoneId = ZoneId(3);
pub const SPENT: ZoneId = ZoneId(4);
pub const WON: ZoneId = ZoneId(5);

/// Highest bid card; every player holds `1..=MAX_BID`.
pub const MAX_BID: u8 = 15;

/// Prize values in the pile: five penalties and ten rewards.
pub const PRIZE_VALUES: [i8; 15] = [-5, -4, -3, -2, -1, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tile {
    Prize(i8),
    Card { owner: PlayerId, value: u8 },
}

impl Token for Tile {
    fn digest_code(&self) -> u64 {
        match *self {
            Tile::Prize(v) => 10_000 + (i64::from(v) + 100) as u64,
            Tile::Card { owner, value } => (u64::from(owner.0) + 1) * 100 + u64::from(value),
        }
    }
}

impl Tile {
    fn prize_value(self) -> i32 {
        match self {
            Tile::Prize(v) => i32::from(v),
            Tile::Card { .. } => 0,
        }
    }

    fn card_value(self) -> Option<u8> {
        match self {
            Tile::Card { value, .. } => Some(value),
            Tile::Prize(_) => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuctionPhase {
    Puzzle,
    /// The current player turns up the next prize.
    SelectPrize,
    /// Everyone picks a bid card at once.
    Bidding,
    Resign,
    GameOver,
}

impl PhaseKind for AuctionPhase {
    fn puzzle() -> Self {
        AuctionPhase::Puzzle
    }

    fn resign() -> Self {
        AuctionPhase::Resign
    }

    fn game_over() -> Self {
        AuctionPhase::GameOver
    }

    fn ordinal(self) -> u32 {
        match self {
            AuctionPhase::Puzzle => 0,
            AuctionPhase::SelectPrize => 1,
            AuctionPhase::Bidding => 2,
            AuctionPhase::Resign => 3,
            AuctionPhase::GameOver => 4,
        }
    }

    fn done_state(self) -> bool {
        matches!(self, AuctionPhase::Bidding | AuctionPhase::Resign)
    }

    fn simultaneous_turns_allowed(self) -> bool {
        self == AuctionPhase::Bidding
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuctionOp {
    /// Turn up the top of the pile.
    Reveal,
    /// Put the hand card with this value in the bid slot.
    Bid { value: u8 },
    /// Take the bid card back into hand.
    Retract,
    /// Unsynchronized `Bid` made during the bidding round.
    EBid { value: u8 },
    /// Unsynchronized `Retract`.
    ERetract,
}

const REVEAL: u16 = 1;
const BID_OP: u16 = 2;
const RETRACT: u16 = 3;
const EBID: u16 = 4;
const ERETRACT: u16 = 5;

impl Opcode for AuctionOp {
    const NAMES: NameTable = NameTable::new(&[
        ("Reveal", REVEAL),
        ("Bid", BID_OP),
        ("Retract", RETRACT),
        ("EBid", EBID),
        ("ERetract", ERETRACT),
    ]);

    fn code(&self) -> u16 {
        match self {
            AuctionOp::Reveal => REVEAL,
            AuctionOp::Bid { .. } => BID_OP,
            AuctionOp::Retract => RETRACT,
            AuctionOp::EBid { .. } => EBID,
            AuctionOp::ERetract => ERETRACT,
        }
    }

    fn write_operands(&self, w: &mut MoveWriter) {
        if let AuctionOp::Bid { value } | AuctionOp::EBid { value } = self {
            w.int(value);
        }
    }

    fn read(code: u16, r: &mut MoveReader<'_>) -> EngineResult<Self> {
        Ok(match code {
            REVEAL => AuctionOp::Reveal,
            BID_OP => AuctionOp::Bid { value: r.int("bid value")? },
            RETRACT => AuctionOp::Retract,
            EBID => AuctionOp::EBid { value: r.int("bid value")? },
            _ => AuctionOp::ERetract,
        })
    }

    fn is_ephemeral(&self) -> bool {
        matches!(self, AuctionOp::EBid { .. } | AuctionOp::ERetract)
    }

    fn to_synchronous(&self) -> Option<Self> {
        Some(match *self {
            AuctionOp::EBid { value } => AuctionOp::Bid { value },
            AuctionOp::ERetract => AuctionOp::Retract,
            other => other,
        })
    }
}

/// Winner of one round, or `None` when every bid is tied.
///
/// Tied bids cancel each other. Of the bids left, the highest takes a
/// positive prize and the lowest takes a negative one.
#[must_use]
pub fn resolve_bids(bids: &[(PlayerId, u8)], prize: i32) -> Option<PlayerId> {
    let unique = bids
        .iter()
        .filter(|(_, v)| bids.iter().filter(|(_, w)| w == v).count() == 1);
    if prize < 0 {
        unique.min_by_key(|(_, v)| *v).map(|(p, _)| *p)
    } else {
        unique.max_by_key(|(_, v)| *v).map(|(p, _)| *p)
    }
}

/// Sealed-bid auction rules for 2-5 players.
#[derive(Clone, Debug)]
pub struct Auction {
    players: usize,
}

impl Auction {
    #[must_use]
    pub fn pile() -> CellId {
        CellId::new(PILE, 'A', 0)
    }

    #[must_use]
    pub fn prize() -> CellId {
        CellId::new(PRIZE, 'A', 0)
    }

    #[must_use]
    pub fn hand(player: PlayerId) -> CellId {
        CellId::new(HAND, player.letter(), 0)
    }

    #[must_use]
    pub fn bid(player: PlayerId) -> CellId {
        CellId::new(BID, player.letter(), 0)
    }

    #[must_use]
    pub fn spent(player: PlayerId) -> CellId {
        CellId::new(SPENT, player.letter(), 0)
    }

    #[must_use]
    pub fn won(player: PlayerId) -> CellId {
        CellId::new(WON, player.letter(), 0)
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.players
    }

    /// Sum of the prizes `player` has taken.
    #[must_use]
    pub fn score(board: &Board<Self>, player: PlayerId) -> i32 {
        board
            .get_cell(Self::won(player))
            .map_or(0, |c| c.tokens().iter().map(|t| t.prize_value()).sum())
    }

    /// Value of everything currently up for auction.
    #[must_use]
    pub fn prize_value(board: &Board<Self>) -> i32 {
        board
            .get_cell(Self::prize())
            .map_or(0, |c| c.tokens().iter().map(|t| t.prize_value()).sum())
    }

    /// `player`'s bid card, if one is in the slot.
    #[must_use]
    pub fn bid_of(board: &Board<Self>, player: PlayerId) -> Option<u8> {
        board.get_cell(Self::bid(player))?.top()?.card_value()
    }

    /// Card values left in `player`'s hand, ascending.
    #[must_use]
    pub fn hand_values(board: &Board<Self>, player: PlayerId) -> Vec<u8> {
        let mut values: Vec<u8> = board
            .get_cell(Self::hand(player))
            .map(|c| c.tokens().iter().filter_map(|t| t.card_value()).collect())
            .unwrap_or_default();
        values.sort_unstable();
        values
    }

    fn bid_card(m: &mut Mutator<'_, Self>, player: PlayerId, value: u8, op: &AuctionOp) -> EngineResult<()> {
        let hand = Self::hand(player);
        let height = m
            .board()
            .cell(hand)?
            .tokens()
            .iter()
            .position(|t| t.card_value() == Some(value))
            .ok_or_else(|| EngineError::rejected(Move::game(player, *op), format!("no {value} in hand")))?;
        if !m.board().cell(Self::bid(player))?.is_empty() {
            return Err(EngineError::rejected(Move::game(player, *op), "already bid"));
        }
        let card = m.take(hand, height)?;
        m.push(Self::bid(player), card)?;
        m.animate(hand, Self::bid(player));
        Ok(())
    }

    fn retract_card(m: &mut Mutator<'_, Self>, player: PlayerId, op: &AuctionOp) -> EngineResult<()> {
        if m.board().cell(Self::bid(player))?.is_empty() {
            return Err(EngineError::rejected(Move::game(player, *op), "nothing to retract"));
        }
        // hands stay sorted, so a retracted card goes back where it came from
        let card = m.take_top(Self::bid(player))?;
        let value = card.card_value();
        let height = m
            .board()
            .cell(Self::hand(player))?
            .tokens()
            .iter()
            .filter(|t| t.card_value() < value)
            .count();
        m.insert(Self::hand(player), height, card)?;
        m.animate(Self::bid(player), Self::hand(player));
        Ok(())
    }

    /// Award the prize, clear the bids and move to the next round.
    fn settle(m: &mut Mutator<'_, Self>) -> EngineResult<()> {
        let n = m.board().player_count();
        let bids: Vec<(PlayerId, u8)> = PlayerId::all(n)
            .filter_map(|p| Self::bid_of(m.board(), p).map(|v| (p, v)))
            .collect();
        let prize = Self::prize_value(m.board());

        match resolve_bids(&bids, prize) {
            Some(winner) => {
                while !m.board().cell(Self::prize())?.is_empty() {
                    m.capture(Self::prize(), Self::won(winner))?;
                }
                debug!(winner = %winner, prize, "prize awarded");
            }
            None => debug!(prize, "all bids tied; prize carries over"),
        }
        for p in PlayerId::all(n) {
            m.move_top(Self::bid(p), Self::spent(p))?;
        }

        m.bump_move_number();
        m.next_turn();
        if m.board().cell(Self::pile())?.is_empty() {
            let scores: Vec<i32> = PlayerId::all(n).map(|p| Self::score(m.board(), p)).collect();
            let best = scores.iter().copied().max().unwrap_or(0);
            for p in PlayerId::all(n).filter(|p| scores[p.index()] == best) {
                m.set_win(p, true);
            }
            m.set_phase(AuctionPhase::GameOver);
        } else {
            m.set_phase(AuctionPhase::SelectPrize);
        }
        Ok(())
    }
}

impl Rules for Auction {
    type Token = Tile;
    type Phase = AuctionPhase;
    type Op = AuctionOp;
    type PlayerState = ();
    type Shared = ();

    const ZONES: NameTable = NameTable::new(&[
        ("Pile", 0),
        ("Prize", 1),
        ("Hand", 2),
        ("Bid", 3),
        ("Spent", 4),
        ("Won", 5),
    ]);

    fn new(init: &InitSpec) -> EngineResult<Self> {
        if !init.variant.eq_ignore_ascii_case("auction") {
            return Err(EngineError::BadInit {
                text: init.to_string(),
                reason: format!("not an auction variant: {}", init.variant),
            });
        }
        if !(2..=5).contains(&init.players) {
            return Err(EngineError::BadInit {
                text: init.to_string(),
                reason: "auction needs 2-5 players".to_string(),
            });
        }
        Ok(Self { players: init.players })
    }

    fn layout(&self, _init: &InitSpec, layout: &mut Layout<Tile>) -> EngineResult<()> {
        layout.add_cell(Self::pile()).add_cell(Self::prize());

        let mut prizes: Vec<Tile> = PRIZE_VALUES.iter().map(|&v| Tile::Prize(v)).collect();
        layout.rng().shuffle(&mut prizes);
        for tile in prizes {
            layout.place(Self::pile(), tile)?;
        }

        for p in PlayerId::all(self.players) {
            layout
                .add_cell(Self::hand(p))
                .add_bounded_cell(Self::bid(p), 1)
                .add_cell(Self::spent(p))
                .add_cell(Self::won(p));
            for value in 1..=MAX_BID {
                layout.place(Self::hand(p), Tile::Card { owner: p, value })?;
            }
        }
        Ok(())
    }

    fn initial_player_state(&self, _player: PlayerId) {}

    fn initial_shared(&self) {}

    fn start_phase(board: &Board<Self>) -> AuctionPhase {
        if PlayerId::all(board.player_count()).any(|p| Self::bid_of(board, p).is_some()) {
            AuctionPhase::Bidding
        } else {
            AuctionPhase::SelectPrize
        }
    }

    fn legal_in_phase(phase: AuctionPhase, op: &AuctionOp) -> bool {
        match phase {
            AuctionPhase::SelectPrize => *op == AuctionOp::Reveal,
            AuctionPhase::Bidding => *op != AuctionOp::Reveal,
            AuctionPhase::Puzzle | AuctionPhase::Resign | AuctionPhase::GameOver => false,
        }
    }

    fn execute(m: &mut Mutator<'_, Self>, player: PlayerId, op: &AuctionOp) -> EngineResult<()> {
        match *op {
            AuctionOp::Reveal => {
                if m.board().turn() != player {
                    return Err(EngineError::rejected(Move::game(player, *op), "not this player's turn"));
                }
                m.move_top(Self::pile(), Self::prize())?;
                m.set_phase(AuctionPhase::Bidding);
                Ok(())
            }
            AuctionOp::Bid { value } | AuctionOp::EBid { value } => Self::bid_card(m, player, value, op),
            AuctionOp::Retract | AuctionOp::ERetract => Self::retract_card(m, player, op),
        }
    }

    fn on_done(m: &mut Mutator<'_, Self>, player: PlayerId) -> EngineResult<()> {
        let n = m.board().player_count();
        if let Some(missing) = PlayerId::all(n).find(|&p| Self::bid_of(m.board(), p).is_none()) {
            return Err(EngineError::rejected(
                Move::<AuctionOp>::done(player),
                format!("{missing} has not bid"),
            ));
        }
        Self::settle(m)
    }

    fn legal_moves(board: &Board<Self>, player: PlayerId) -> Vec<Move<AuctionOp>> {
        match board.phase() {
            AuctionPhase::SelectPrize if board.turn() == player => {
                vec![Move::game(player, AuctionOp::Reveal)]
            }
            AuctionPhase::Bidding => {
                if !Self::has_committed(board, player) {
                    Self::hand_values(board, player)
                        .into_iter()
                        .map(|value| Move::game(player, AuctionOp::Bid { value }))
                        .collect()
                } else if board.turn() == player
                    && PlayerId::all(board.player_count()).all(|p| Self::has_committed(board, p))
                {
                    vec![Move::done(player)]
                } else {
                    Vec::new()
                }
            }
            _ => Vec::new(),
        }
    }

    fn mover(board: &Board<Self>) -> PlayerId {
        if board.phase() == AuctionPhase::Bidding {
            if let Some(p) = PlayerId::all(board.player_count()).find(|&p| !Self::has_committed(board, p)) {
                return p;
            }
        }
        board.turn()
    }

    fn has_committed(board: &Board<Self>, player: PlayerId) -> bool {
        board.phase() != AuctionPhase::Bidding || Self::bid_of(board, player).is_some()
    }

    fn concealed_cells(_board: &Board<Self>, _viewer: PlayerId) -> Vec<CellId> {
        vec![Self::pile()]
    }

    fn evaluate(board: &Board<Self>, player: PlayerId) -> f64 {
        let mine = Self::score(board, player);
        let best_other = PlayerId::all(board.player_count())
            .filter(|&p| p != player)
            .map(|p| Self::score(board, p))
            .max()
            .unwrap_or(0);
        f64::from(mine - best_other)
    }
}
