//! Robot search.
//!
//! ## Overview
//!
//! Robots search a private clone of the live board:
//!
//! - **SearchBoard**: clone, strip uncommitted ephemeral moves, make/unmake
//!   with digest self-checks, re-randomize hidden cells
//! - **AlphaBeta**: depth-limited negamax for perfect-information games
//! - **MonteCarlo**: flat UCB1 rollouts for hidden-information games
//!
//! ## Usage
//!
//! ```rust
//! use rust_tabletop::core::{EngineConfig, PlayerId};
//! use rust_tabletop::games::jumper::Jumper;
//! use rust_tabletop::search::{AlphaBeta, SearchConfig};
//! use rust_tabletop::Session;
//!
//! let mut session = Session::<Jumper>::from_init_text("jumper 1 2", EngineConfig::default()).unwrap();
//! session.perform_text("Start P0", PlayerId::new(0)).unwrap();
//!
//! let mut robot = session.prepare_robot(PlayerId::new(0)).unwrap();
//! let mut search = AlphaBeta::new(SearchConfig::default().with_depth(2));
//! let (best, _score) = search.best_move(&mut robot).unwrap().unwrap();
//! session.perform(best).unwrap();
//! ```

pub mod alphabeta;
pub mod board;
pub mod config;
pub mod montecarlo;
pub mod stats;

pub use alphabeta::{AlphaBeta, WIN_SCORE};
pub use board::SearchBoard;
pub use config::SearchConfig;
pub use montecarlo::{select_ucb1, Arm, MonteCarlo};
pub use stats::SearchStats;
