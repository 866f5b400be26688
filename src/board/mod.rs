//! The generic board.
//!
//! A `Board<R>` is created once per game and mutated in place for the whole
//! session. It owns:
//!
//! - the cells and their token stacks (layout fixed at construction)
//! - whose turn it is and the current phase
//! - per-player state (`R::PlayerState`) and shared game state (`R::Shared`)
//! - per-player win flags
//! - at most one token in flight between a pick and its drop
//! - the undo log, the animation hint list and the shuffle-record stack
//!
//! Mutation happens only through `execute`/`undo` (see `engine`) and the
//! robot-only re-randomization below. Reads are free.

pub mod cell;
pub mod digest;
pub mod layout;
pub mod token;

pub use cell::{Cell, CellId, InFlight, ZoneId};
pub use digest::{fmix64, Digestible, Digester};
pub use layout::Layout;
pub use token::Token;

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::core::{EngineConfig, EngineError, EngineResult, GameRng, InitSpec, PhaseKind, PlayerId, PlayerMap};
use crate::engine::UndoLog;
use crate::moves::Move;
use crate::rules::{GameResult, Rules};

/// One recorded re-randomization of concealed cells.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ShuffleRecord {
    cells: Vec<usize>,
    perm: Vec<usize>,
}

/// Game board parameterized by its rules.
#[derive(Clone, Debug)]
pub struct Board<R: Rules> {
    pub(crate) rules: R,
    pub(crate) init: InitSpec,
    pub(crate) config: EngineConfig,
    pub(crate) cells: Vec<Cell<R::Token>>,
    pub(crate) index: FxHashMap<CellId, usize>,
    pub(crate) turn: PlayerId,
    pub(crate) phase: R::Phase,
    pub(crate) players: PlayerMap<R::PlayerState>,
    pub(crate) shared: R::Shared,
    pub(crate) wins: PlayerMap<bool>,
    pub(crate) picked: Option<InFlight<R::Token>>,
    pub(crate) move_number: u32,
    pub(crate) resign_from: Option<R::Phase>,
    pub(crate) log: UndoLog<R>,
    pub(crate) animations: Vec<(CellId, CellId)>,
    pub(crate) animate: bool,
    shuffles: Vec<ShuffleRecord>,
}

impl<R: Rules> Board<R> {
    /// Build a fresh board in the puzzle phase with player 0 to move.
    pub fn new(init: InitSpec, config: EngineConfig) -> EngineResult<Self> {
        let rules = R::new(&init)?;
        let mut layout = Layout::new(init.seed);
        rules.layout(&init, &mut layout)?;

        let players = PlayerMap::new(init.players, |p| rules.initial_player_state(p));
        let shared = rules.initial_shared();
        let animate = config.animate;

        Ok(Self {
            rules,
            cells: layout.cells,
            index: layout.index,
            turn: PlayerId::new(0),
            phase: R::Phase::puzzle(),
            players,
            shared,
            wins: PlayerMap::with_value(init.players, false),
            picked: None,
            move_number: 1,
            resign_from: None,
            log: UndoLog::new(),
            animations: Vec::new(),
            animate,
            shuffles: Vec::new(),
            init,
            config,
        })
    }

    /// Parse an init string and build the board.
    pub fn from_init_text(text: &str, config: EngineConfig) -> EngineResult<Self> {
        Self::new(text.parse()?, config)
    }

    // === Accessors ===

    #[must_use]
    pub fn rules(&self) -> &R {
        &self.rules
    }

    #[must_use]
    pub fn init(&self) -> &InitSpec {
        &self.init
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.init.players
    }

    #[must_use]
    pub fn turn(&self) -> PlayerId {
        self.turn
    }

    #[must_use]
    pub fn phase(&self) -> R::Phase {
        self.phase
    }

    #[must_use]
    pub fn player(&self, player: PlayerId) -> &R::PlayerState {
        &self.players[player]
    }

    #[must_use]
    pub fn players(&self) -> &PlayerMap<R::PlayerState> {
        &self.players
    }

    #[must_use]
    pub fn shared(&self) -> &R::Shared {
        &self.shared
    }

    #[must_use]
    pub fn wins(&self) -> &PlayerMap<bool> {
        &self.wins
    }

    #[must_use]
    pub fn is_winner(&self, player: PlayerId) -> bool {
        self.wins[player]
    }

    #[must_use]
    pub fn picked(&self) -> Option<&InFlight<R::Token>> {
        self.picked.as_ref()
    }

    #[must_use]
    pub fn move_number(&self) -> u32 {
        self.move_number
    }

    /// Phase to return to if a pending resignation is withdrawn.
    #[must_use]
    pub fn resign_from(&self) -> Option<R::Phase> {
        self.resign_from
    }

    pub fn cell(&self, id: CellId) -> EngineResult<&Cell<R::Token>> {
        self.cell_index(id).map(|idx| &self.cells[idx])
    }

    #[must_use]
    pub fn get_cell(&self, id: CellId) -> Option<&Cell<R::Token>> {
        self.index.get(&id).map(|&idx| &self.cells[idx])
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell<R::Token>> {
        self.cells.iter()
    }

    /// Cells of one zone, in layout order.
    pub fn zone(&self, zone: ZoneId) -> impl Iterator<Item = &Cell<R::Token>> {
        self.cells.iter().filter(move |c| c.id().zone == zone)
    }

    pub(crate) fn cell_index(&self, id: CellId) -> EngineResult<usize> {
        self.index.get(&id).copied().ok_or(EngineError::UnknownCell(id))
    }

    /// Number of moves on the undo log.
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.log.depth()
    }

    /// Serial of the most recently executed move still on the undo log.
    #[must_use]
    pub fn top_serial(&self) -> Option<u64> {
        self.log.top().map(|mark| mark.serial)
    }

    /// Total undo records held, across all moves.
    #[must_use]
    pub fn undo_records(&self) -> usize {
        self.log.len()
    }

    // === Digest ===

    /// Content digest: cells, per-player state, shared state, win flags,
    /// the in-flight token, and finally phase and turn.
    #[must_use]
    pub fn digest(&self) -> u64 {
        let mut d = Digester::new(self.config.digest_seed);

        for cell in &self.cells {
            let key = d.next_key();
            for (height, token) in cell.tokens().iter().enumerate() {
                let slot = key.wrapping_add((height as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15));
                d.mix_keyed(slot, token.digest_code());
            }
        }

        for (_, state) in self.players.iter() {
            state.digest_into(&mut d);
        }
        self.shared.digest_into(&mut d);
        for (_, won) in self.wins.iter() {
            won.digest_into(&mut d);
        }

        match &self.picked {
            None => d.mix(0),
            Some(flight) => {
                d.mix(flight.token.digest_code().wrapping_add(1));
                d.mix(self.index.get(&flight.source).map_or(u64::MAX, |&i| i as u64));
                d.mix(flight.height as u64);
            }
        }

        d.mix(u64::from(self.phase.ordinal()));
        d.mix(u64::from(self.turn.0));
        d.finish()
    }

    // === Queries delegated to the rules ===

    #[must_use]
    pub fn legal_moves(&self, player: PlayerId) -> Vec<Move<R::Op>> {
        R::legal_moves(self, player)
    }

    #[must_use]
    pub fn is_legal_to_pick(&self, player: PlayerId, cell: CellId) -> bool {
        R::is_legal_to_pick(self, player, cell)
    }

    #[must_use]
    pub fn is_legal_to_drop(&self, player: PlayerId, cell: CellId) -> bool {
        R::is_legal_to_drop(self, player, cell)
    }

    #[must_use]
    pub fn result(&self) -> Option<GameResult> {
        R::result(self)
    }

    // === Animation hints ===

    /// Drain the `(from, to)` pairs recorded since the last call.
    pub fn take_animations(&mut self) -> Vec<(CellId, CellId)> {
        std::mem::take(&mut self.animations)
    }

    pub fn set_animate(&mut self, animate: bool) {
        self.animate = animate;
        if !animate {
            self.animations.clear();
        }
    }

    // === Re-randomization (robot boards only) ===

    /// Depth of the shuffle-record stack.
    #[must_use]
    pub fn shuffle_depth(&self) -> usize {
        self.shuffles.len()
    }

    /// Redistribute the tokens of `cells` at random, keeping every stack
    /// height. The permutation is recorded so [`Board::unshuffle`] can
    /// restore the exact prior contents.
    pub fn shuffle_cells(&mut self, cells: &[CellId], rng: &mut GameRng) -> EngineResult<()> {
        let idxs = cells
            .iter()
            .map(|&id| self.cell_index(id))
            .collect::<EngineResult<Vec<_>>>()?;
        let pool = self.gather(&idxs);
        let perm = rng.permutation(pool.len());
        let shuffled: Vec<R::Token> = perm.iter().map(|&i| pool[i]).collect();
        self.scatter(&idxs, &shuffled);
        trace!(tokens = pool.len(), depth = self.shuffles.len() + 1, "re-randomized concealed cells");
        self.shuffles.push(ShuffleRecord { cells: idxs, perm });
        Ok(())
    }

    /// Undo the most recent [`Board::shuffle_cells`].
    pub fn unshuffle(&mut self) -> EngineResult<()> {
        let record = self.shuffles.pop().ok_or(EngineError::NothingToUndo)?;
        let shuffled = self.gather(&record.cells);
        let mut restored = shuffled.clone();
        for (pos, &src) in record.perm.iter().enumerate() {
            restored[src] = shuffled[pos];
        }
        self.scatter(&record.cells, &restored);
        Ok(())
    }

    fn gather(&self, idxs: &[usize]) -> Vec<R::Token> {
        idxs.iter()
            .flat_map(|&i| self.cells[i].tokens().iter().copied())
            .collect()
    }

    fn scatter(&mut self, idxs: &[usize], tokens: &[R::Token]) {
        let mut offset = 0;
        for &i in idxs {
            let height = self.cells[i].height();
            self.cells[i].replace_all(tokens[offset..offset + height].iter().copied());
            offset += height;
        }
    }
}
