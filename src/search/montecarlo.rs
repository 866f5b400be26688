//! Flat Monte Carlo with UCB1 arm selection.
//!
//! Each root move is an arm. Every iteration picks an arm by UCB1,
//! optionally re-randomizes the viewer's concealed cells, plays the arm's
//! move followed by uniformly random moves, scores the end position for the
//! searching player and unwinds everything.

use std::time::Instant;

use tracing::debug;

use crate::core::{EngineResult, GameRng, PlayerId};
use crate::moves::Move;
use crate::rules::{GameResult, Rules};

use super::board::SearchBoard;
use super::config::SearchConfig;
use super::stats::SearchStats;

/// Running reward for one root move.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Arm {
    pub visits: u32,
    pub total: f64,
}

impl Arm {
    #[must_use]
    pub fn mean(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.total / f64::from(self.visits)
        }
    }

    fn record(&mut self, reward: f64) {
        self.visits += 1;
        self.total += reward;
    }
}

/// UCB1: `Q(a) + c * sqrt(ln(N) / n(a))`, unvisited arms first.
#[must_use]
pub fn select_ucb1(arms: &[Arm], exploration: f64) -> usize {
    let parent: u32 = arms.iter().map(|a| a.visits).sum();
    let ln_parent = f64::from(parent.max(1)).ln();

    arms.iter()
        .enumerate()
        .map(|(i, arm)| {
            let exploration = if arm.visits == 0 {
                f64::INFINITY
            } else {
                exploration * (ln_parent / f64::from(arm.visits)).sqrt()
            };
            (i, arm.mean() + exploration)
        })
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

#[derive(Clone, Debug)]
pub struct MonteCarlo {
    config: SearchConfig,
    stats: SearchStats,
    rng: GameRng,
    arms: Vec<Arm>,
}

impl MonteCarlo {
    #[must_use]
    pub fn new(config: SearchConfig) -> Self {
        let rng = GameRng::new(config.seed);
        Self {
            config,
            stats: SearchStats::default(),
            rng,
            arms: Vec::new(),
        }
    }

    #[must_use]
    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    /// Arm statistics of the last search, in `legal_moves` order.
    #[must_use]
    pub fn arms(&self) -> &[Arm] {
        &self.arms
    }

    /// Most-visited root move for the current mover.
    ///
    /// Leaves `sb` exactly as it found it.
    pub fn best_move<R: Rules>(&mut self, sb: &mut SearchBoard<R>) -> EngineResult<Option<Move<R::Op>>> {
        let start = Instant::now();
        self.stats.reset();
        self.arms.clear();

        let me = sb.mover();
        let mut moves = sb.legal_moves();
        match moves.len() {
            0 => return Ok(None),
            1 => return Ok(moves.pop()),
            _ => {}
        }

        self.arms = vec![Arm::default(); moves.len()];
        for _ in 0..self.config.iterations {
            let idx = select_ucb1(&self.arms, self.config.exploration_constant);
            self.stats.nodes += 1;

            if self.config.rerandomize {
                sb.re_randomize(&mut self.rng)?;
            }
            let reward = self.playout(sb, &moves[idx], me);
            if self.config.rerandomize {
                sb.undo_re_randomize()?;
            }
            self.arms[idx].record(reward?.unwrap_or(0.0));
        }

        self.stats.time_us = start.elapsed().as_micros() as u64;
        sb.verify_balanced()?;

        let best = self
            .arms
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| {
                a.visits
                    .cmp(&b.visits)
                    .then(a.mean().partial_cmp(&b.mean()).unwrap_or(std::cmp::Ordering::Equal))
            })
            .map(|(i, _)| i)
            .unwrap_or(0);
        debug!(
            rollouts = self.stats.rollouts,
            illegal = self.stats.illegal_lines,
            best = %moves[best],
            mean = self.arms[best].mean(),
            "monte carlo finished"
        );
        Ok(Some(moves.swap_remove(best)))
    }

    /// Play `first` then random moves; `None` if `first` was rejected.
    fn playout<R: Rules>(&mut self, sb: &mut SearchBoard<R>, first: &Move<R::Op>, me: PlayerId) -> EngineResult<Option<f64>> {
        if let Err(err) = sb.make_move(first) {
            if err.is_protocol_violation() {
                return Err(err);
            }
            self.stats.illegal_lines += 1;
            return Ok(None);
        }

        let mut line = vec![first.clone()];
        let mut failure = None;
        while line.len() < self.config.rollout_depth as usize && sb.result().is_none() {
            let moves = sb.legal_moves();
            let Some(mv) = self.rng.choose(&moves).cloned() else {
                break;
            };
            match sb.make_move(&mv) {
                Ok(()) => line.push(mv),
                Err(err) if err.is_protocol_violation() => {
                    failure = Some(err);
                    break;
                }
                Err(_) => {
                    self.stats.illegal_lines += 1;
                    break;
                }
            }
        }

        self.stats.rollouts += 1;
        self.stats.reached(sb.depth());
        let reward = match sb.result() {
            Some(result) => reward_for(&result, me),
            None => 0.5 + 0.5 * (sb.evaluate(me) / 10.0).tanh(),
        };

        for mv in line.iter().rev() {
            sb.unmake_move(mv)?;
        }
        match failure {
            Some(err) => Err(err),
            None => Ok(Some(reward)),
        }
    }
}

fn reward_for(result: &GameResult, me: PlayerId) -> f64 {
    match result {
        GameResult::Draw => 0.5,
        r if r.is_winner(me) => 1.0,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ucb1_prefers_unvisited() {
        let arms = [
            Arm { visits: 10, total: 9.0 },
            Arm::default(),
            Arm { visits: 3, total: 0.0 },
        ];
        assert_eq!(select_ucb1(&arms, 1.4), 1);
    }

    #[test]
    fn test_ucb1_exploits_with_zero_exploration() {
        let arms = [
            Arm { visits: 10, total: 2.0 },
            Arm { visits: 10, total: 8.0 },
        ];
        assert_eq!(select_ucb1(&arms, 0.0), 1);
    }

    #[test]
    fn test_arm_mean() {
        let mut arm = Arm::default();
        assert_eq!(arm.mean(), 0.0);
        arm.record(1.0);
        arm.record(0.0);
        assert_eq!(arm.mean(), 0.5);
    }
}
