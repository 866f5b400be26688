//! Robot search integration tests.

mod common;

use common::{take, Heap};
use rust_tabletop::core::{EngineConfig, EngineError, GameRng, PlayerId};
use rust_tabletop::games::auction::{Auction, AuctionOp, AuctionPhase};
use rust_tabletop::games::jumper::{Jumper, JumperOp};
use rust_tabletop::games::route::Route;
use rust_tabletop::search::WIN_SCORE;
use rust_tabletop::{AlphaBeta, Board, Move, MonteCarlo, SearchBoard, SearchConfig, Session};

const P0: PlayerId = PlayerId::new(0);
const P1: PlayerId = PlayerId::new(1);

fn jumper_session() -> Session<Jumper> {
    let mut session = Session::<Jumper>::from_init_text("jumper 1 2", EngineConfig::default()).unwrap();
    session.perform(Move::start(P0, P0)).unwrap();
    session
}

/// P0 at A1 and P1 at B2, one stone each, P0 to move.
fn last_stone_position() -> Board<Jumper> {
    let mut board = Board::<Jumper>::from_init_text("jumper 1 2", EngineConfig::default()).unwrap();
    for p in [P0, P1] {
        for _ in 0..3 {
            board
                .execute(&Move::game(p, JumperOp::Move { from: Jumper::rack(p), to: Jumper::captures(p) }))
                .unwrap();
        }
    }
    board
        .execute(&Move::game(P0, JumperOp::Move { from: Jumper::rack(P0), to: Jumper::board_cell('A', 1) }))
        .unwrap();
    board
        .execute(&Move::game(P1, JumperOp::Move { from: Jumper::rack(P1), to: Jumper::board_cell('B', 2) }))
        .unwrap();
    board.execute(&Move::start(P0, P0)).unwrap();
    board
}

fn auction_session() -> Session<Auction> {
    let mut session = Session::<Auction>::from_init_text("auction 21 2", EngineConfig::default()).unwrap();
    session.perform(Move::start(P0, P0)).unwrap();
    session.perform(Move::game(P0, AuctionOp::Reveal)).unwrap();
    session
}

/// Two chips left and P0 to move; the generator still lists `Take 3`.
fn heap_robot() -> SearchBoard<Heap> {
    let mut board = Board::<Heap>::from_init_text("heap 2 2", EngineConfig::default()).unwrap();
    board.execute(&Move::start(P0, P0)).unwrap();
    SearchBoard::from_board(board, P0)
}

// =============================================================================
// Search Board Tests
// =============================================================================

#[test]
fn test_make_unmake_restores_digest() {
    let session = jumper_session();
    let mut robot = session.prepare_robot(P0).unwrap();
    let start = robot.board().digest();
    assert_eq!(robot.start_digest(), start);

    let moves = robot.legal_moves();
    for mv in &moves {
        robot.make_move(mv).unwrap();
        assert_eq!(robot.depth(), 1);
        robot.unmake_move(mv).unwrap();
    }
    assert_eq!(robot.board().digest(), start);
    robot.verify_balanced().unwrap();
}

#[test]
fn test_robot_confirms_its_own_move() {
    let session = jumper_session();
    let mut robot = session.prepare_robot(P0).unwrap();
    let mv = robot.legal_moves().remove(0);
    robot.make_move(&mv).unwrap();
    assert_eq!(robot.board().turn(), P1, "Done was executed on the mover's behalf");
    assert_eq!(robot.mover(), P1);
    robot.unmake_move(&mv).unwrap();
    assert_eq!(robot.board().turn(), P0);
}

#[test]
fn test_unmake_wrong_move_is_refused() {
    let session = jumper_session();
    let mut robot = session.prepare_robot(P0).unwrap();
    let moves = robot.legal_moves();
    robot.make_move(&moves[0]).unwrap();
    let err = robot.unmake_move(&moves[1]).unwrap_err();
    assert!(matches!(err, EngineError::UndoOutOfOrder { .. }));
    robot.unmake_move(&moves[0]).unwrap();
}

#[test]
fn test_robot_board_is_private() {
    let session = jumper_session();
    let live = session.board().digest();
    let mut robot = session.prepare_robot(P0).unwrap();
    let mv = robot.legal_moves().remove(0);
    robot.make_move(&mv).unwrap();
    assert_eq!(session.board().digest(), live);
}

#[test]
fn test_prepare_strips_uncommitted_bids() {
    let mut session = auction_session();
    session.perform(Move::game(P0, AuctionOp::EBid { value: 12 })).unwrap();

    let robot = session.prepare_robot(P1).unwrap();
    assert_eq!(Auction::bid_of(robot.board(), P0), None);
    assert_eq!(robot.mover(), P0);
    assert_eq!(Auction::bid_of(session.board(), P0), Some(12));
}

#[test]
fn test_re_randomize_round_trip() {
    let session = auction_session();
    let mut robot = session.prepare_robot(P1).unwrap();
    let start = robot.board().digest();
    let mut rng = GameRng::new(99);

    robot.re_randomize(&mut rng).unwrap();
    assert_eq!(robot.board().cell(Auction::pile()).unwrap().height(), 14);
    assert_eq!(robot.board().shuffle_depth(), 1);
    robot.undo_re_randomize().unwrap();
    assert_eq!(robot.board().shuffle_depth(), 0);
    assert_eq!(robot.board().digest(), start);
}

#[test]
fn test_re_randomize_must_unwind_in_order() {
    let session = auction_session();
    let mut robot = session.prepare_robot(P1).unwrap();
    let mut rng = GameRng::new(3);
    let mv = Move::game(P0, AuctionOp::Bid { value: 1 });

    robot.re_randomize(&mut rng).unwrap();
    robot.make_move(&mv).unwrap();
    assert!(robot.undo_re_randomize().is_err());
    robot.unmake_move(&mv).unwrap();
    robot.undo_re_randomize().unwrap();
    robot.verify_balanced().unwrap();
}

// =============================================================================
// Alpha-Beta Tests
// =============================================================================

#[test]
fn test_alpha_beta_returns_legal_move() {
    let mut session = jumper_session();
    let mut robot = session.prepare_robot(P0).unwrap();
    let mut search = AlphaBeta::new(SearchConfig::default().with_depth(2));

    let (best, _) = search.best_move(&mut robot).unwrap().unwrap();
    assert!(session.board().legal_moves(P0).contains(&best));
    assert!(search.stats().nodes > 0);
    assert_eq!(robot.board().digest(), robot.start_digest());

    session.perform(best).unwrap();
}

#[test]
fn test_alpha_beta_finds_winning_capture() {
    let board = last_stone_position();
    let mut robot = SearchBoard::from_board(board, P0);
    let mut search = AlphaBeta::new(SearchConfig::default().with_depth(3));

    let (best, score) = search.best_move(&mut robot).unwrap().unwrap();
    assert_eq!(
        best,
        Move::game(P0, JumperOp::Move { from: Jumper::board_cell('A', 1), to: Jumper::board_cell('C', 3) })
    );
    assert!(score > WIN_SCORE / 2.0);
}

#[test]
fn test_alpha_beta_no_moves() {
    let board = Board::<Jumper>::from_init_text("jumper 1 2", EngineConfig::default()).unwrap();
    let mut robot = SearchBoard::from_board(board, P0);
    let mut search = AlphaBeta::new(SearchConfig::default());
    assert!(search.best_move(&mut robot).unwrap().is_none());
}

#[test]
fn test_alpha_beta_on_route() {
    let mut board = Board::<Route>::from_init_text("route 4 2 1", EngineConfig::default()).unwrap();
    board.execute(&Move::start(P0, P0)).unwrap();
    let mut robot = SearchBoard::from_board(board, P0);
    let mut search = AlphaBeta::new(SearchConfig::default().with_depth(3));
    assert!(search.best_move(&mut robot).unwrap().is_some());
    robot.verify_balanced().unwrap();
}

#[test]
fn test_alpha_beta_skips_rejected_lines() {
    let mut robot = heap_robot();
    assert!(robot.legal_moves().contains(&take(P0, 3)));

    let mut search = AlphaBeta::new(SearchConfig::default().with_depth(3));
    let (best, score) = search.best_move(&mut robot).unwrap().unwrap();
    assert_eq!(best, take(P0, 2), "taking the last two chips wins");
    assert!(score > 0.0);
    assert!(search.stats().illegal_lines > 0);
    assert_eq!(robot.board().digest(), robot.start_digest());
    assert_eq!(robot.depth(), 0);
}

// =============================================================================
// Monte Carlo Tests
// =============================================================================

#[test]
fn test_monte_carlo_skips_rejected_lines() {
    let mut robot = heap_robot();
    let mut search = MonteCarlo::new(SearchConfig::default().with_iterations(30).with_seed(4));
    let best = search.best_move(&mut robot).unwrap().unwrap();

    assert!([take(P0, 1), take(P0, 2)].contains(&best));
    assert!(search.stats().illegal_lines > 0);
    assert_eq!(robot.board().digest(), robot.start_digest());
    assert_eq!(robot.depth(), 0);
}

#[test]
fn test_monte_carlo_bids_from_hand() {
    let session = auction_session();
    let mut robot = session.prepare_robot(P0).unwrap();
    let mut search = MonteCarlo::new(SearchConfig::default().with_iterations(60).with_rollout_depth(20));

    let best = search.best_move(&mut robot).unwrap().unwrap();
    assert!(matches!(best.command, rust_tabletop::Command::Game(AuctionOp::Bid { .. })));
    assert_eq!(best.player, P0);
    assert!(search.stats().rollouts > 0);
    assert_eq!(search.arms().iter().map(|a| a.visits).sum::<u32>(), 60);
    assert_eq!(robot.board().digest(), robot.start_digest());
}

#[test]
fn test_monte_carlo_deterministic_with_seed() {
    let session = auction_session();
    let config = SearchConfig::default().with_iterations(40).with_rollout_depth(10).with_seed(5);

    let mut first = MonteCarlo::new(config.clone());
    let mut second = MonteCarlo::new(config);
    let a = first.best_move(&mut session.prepare_robot(P0).unwrap()).unwrap();
    let b = second.best_move(&mut session.prepare_robot(P0).unwrap()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_monte_carlo_single_move_shortcut() {
    let mut session = auction_session();
    session.perform(Move::game(P0, AuctionOp::Bid { value: 4 })).unwrap();
    session.perform(Move::game(P1, AuctionOp::Bid { value: 6 })).unwrap();
    assert_eq!(session.board().phase(), AuctionPhase::Bidding);

    let mut robot = session.prepare_robot(P0).unwrap();
    let mut search = MonteCarlo::new(SearchConfig::default());
    assert_eq!(search.best_move(&mut robot).unwrap(), Some(Move::done(P0)));
    assert_eq!(search.stats().rollouts, 0);
}
