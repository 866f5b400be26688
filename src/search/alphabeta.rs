//! Depth-limited negamax with alpha-beta pruning.
//!
//! Scores are from the point of view of the player to move at each node.
//! When a move does not change the mover (a multi-step turn, or a
//! simultaneous phase where the same player is still uncommitted), the
//! child score is taken as-is instead of negated. With more than two
//! players every other seat is treated as one opponent.
//!
//! A speculative move the board rejects ends that line: it is skipped
//! (scored as negative infinity) and counted in `SearchStats::illegal_lines`.

use std::time::Instant;

use tracing::debug;

use crate::core::{EngineResult, PlayerId};
use crate::moves::Move;
use crate::rules::{GameResult, Rules};

use super::board::SearchBoard;
use super::config::SearchConfig;
use super::stats::SearchStats;

/// Score of a won game; shorter wins score higher.
pub const WIN_SCORE: f64 = 1.0e6;

#[derive(Clone, Debug)]
pub struct AlphaBeta {
    config: SearchConfig,
    stats: SearchStats,
}

impl AlphaBeta {
    #[must_use]
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            stats: SearchStats::default(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    #[must_use]
    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    /// Best move for the current mover and its score.
    ///
    /// Leaves `sb` exactly as it found it.
    pub fn best_move<R: Rules>(&mut self, sb: &mut SearchBoard<R>) -> EngineResult<Option<(Move<R::Op>, f64)>> {
        let start = Instant::now();
        self.stats.reset();

        let me = sb.mover();
        let depth = self.config.depth.max(1);
        let mut alpha = f64::NEG_INFINITY;
        let mut best: Option<(Move<R::Op>, f64)> = None;

        for mv in sb.legal_moves() {
            let Some(score) = self.child_score(sb, &mv, me, depth - 1, alpha, f64::INFINITY)? else {
                continue;
            };
            if best.as_ref().map_or(true, |(_, s)| score > *s) {
                best = Some((mv, score));
            }
            alpha = alpha.max(score);
        }

        self.stats.time_us = start.elapsed().as_micros() as u64;
        sb.verify_balanced()?;
        debug!(
            nodes = self.stats.nodes,
            cutoffs = self.stats.cutoffs,
            illegal = self.stats.illegal_lines,
            best = ?best.as_ref().map(|(mv, s)| (mv.to_text(), *s)),
            "alpha-beta finished"
        );
        Ok(best)
    }

    /// Score of `mv` for `me`, or `None` if the board rejected it.
    fn child_score<R: Rules>(
        &mut self,
        sb: &mut SearchBoard<R>,
        mv: &Move<R::Op>,
        me: PlayerId,
        depth: u32,
        alpha: f64,
        beta: f64,
    ) -> EngineResult<Option<f64>> {
        if let Err(err) = sb.make_move(mv) {
            if err.is_protocol_violation() {
                return Err(err);
            }
            self.stats.illegal_lines += 1;
            return Ok(None);
        }
        let outcome = if sb.mover() == me {
            self.negamax(sb, depth, alpha, beta)
        } else {
            self.negamax(sb, depth, -beta, -alpha).map(|v| -v)
        };
        sb.unmake_move(mv)?;
        outcome.map(Some)
    }

    fn negamax<R: Rules>(&mut self, sb: &mut SearchBoard<R>, depth: u32, mut alpha: f64, beta: f64) -> EngineResult<f64> {
        self.stats.nodes += 1;
        self.stats.reached(sb.depth());

        let me = sb.mover();
        if let Some(result) = sb.result() {
            return Ok(terminal_score(&result, me, sb.depth()));
        }
        if depth == 0 {
            return Ok(sb.evaluate(me));
        }

        let mut best = f64::NEG_INFINITY;
        for mv in sb.legal_moves() {
            let Some(score) = self.child_score(sb, &mv, me, depth - 1, alpha, beta)? else {
                continue;
            };
            best = best.max(score);
            alpha = alpha.max(score);
            if alpha >= beta {
                self.stats.cutoffs += 1;
                break;
            }
        }

        if best == f64::NEG_INFINITY {
            // no playable line from here
            return Ok(sb.evaluate(me));
        }
        Ok(best)
    }
}

fn terminal_score(result: &GameResult, me: PlayerId, ply: usize) -> f64 {
    let ply = ply as f64;
    match result {
        GameResult::Draw => 0.0,
        r if r.is_winner(me) => WIN_SCORE - ply,
        _ => -WIN_SCORE + ply,
    }
}
