//! Execute/undo integration tests using the jumper game.

mod common;

use common::{take, Heap, HeapPhase};
use rust_tabletop::core::{EngineConfig, EngineError, PlayerId};
use rust_tabletop::games::jumper::{Jumper, JumperOp, JumperPhase, Stone};
use rust_tabletop::{Board, GameResult, Move};

const P0: PlayerId = PlayerId::new(0);
const P1: PlayerId = PlayerId::new(1);

fn lenient() -> EngineConfig {
    EngineConfig::default().with_strict(false)
}

fn started(config: EngineConfig) -> Board<Jumper> {
    let mut board = Board::<Jumper>::from_init_text("jumper 1 2", config).unwrap();
    board.execute(&Move::start(P0, P0)).unwrap();
    board
}

fn pick(cell: rust_tabletop::CellId) -> Move<JumperOp> {
    Move::game(P0, JumperOp::Pick { cell })
}

fn drop_on(cell: rust_tabletop::CellId) -> Move<JumperOp> {
    Move::game(P0, JumperOp::Drop { cell })
}

// =============================================================================
// Undo Tests
// =============================================================================

#[test]
fn test_pick_drop_undo_restores_each_digest() {
    let mut board = started(EngineConfig::default());
    let d0 = board.digest();

    let lift = pick(Jumper::rack(P0));
    let land = drop_on(Jumper::board_cell('C', 3));

    board.execute(&lift).unwrap();
    let d_picked = board.digest();
    assert_ne!(d_picked, d0);

    board.execute(&land).unwrap();
    let d1 = board.digest();
    assert_ne!(d1, d_picked);
    assert_eq!(board.phase(), JumperPhase::Confirm);

    board.undo(&land).unwrap();
    assert_eq!(board.digest(), d_picked);
    assert!(board.picked().is_some());

    board.undo(&lift).unwrap();
    assert_eq!(board.digest(), d0);
    assert!(board.picked().is_none());
    assert_eq!(board.undo_depth(), 1, "only Start should remain");
}

#[test]
fn test_long_sequence_unwinds_to_start() {
    let mut board = started(EngineConfig::default());
    let d0 = board.digest();
    let mut made = Vec::new();
    let mut digests = vec![d0];

    for _ in 0..12 {
        let mover = board.turn();
        let Some(mv) = board.legal_moves(mover).into_iter().last() else {
            break;
        };
        board.execute(&mv).unwrap();
        digests.push(board.digest());
        made.push(mv);
    }
    assert!(made.len() >= 8);

    for mv in made.iter().rev() {
        digests.pop();
        board.undo(mv).unwrap();
        assert_eq!(Some(&board.digest()), digests.last());
    }
    assert_eq!(board.digest(), d0);
    assert_eq!(board.move_number(), 1);
}

#[test]
fn test_undo_out_of_order_is_reported() {
    let mut board = started(lenient());
    let first = Move::game(P0, JumperOp::Move { from: Jumper::rack(P0), to: Jumper::board_cell('A', 1) });
    board.execute(&first).unwrap();
    let done = Move::done(P0);
    board.execute(&done).unwrap();
    let before = board.digest();

    let err = board.undo(&first).unwrap_err();
    assert!(matches!(err, EngineError::UndoOutOfOrder { .. }));
    assert_eq!(board.digest(), before);

    board.undo(&done).unwrap();
    board.undo(&first).unwrap();
}

#[test]
fn test_undo_on_empty_log() {
    let mut board = Board::<Jumper>::from_init_text("jumper 1 2", lenient()).unwrap();
    let err = board.undo(&Move::start(P0, P0)).unwrap_err();
    assert!(matches!(err, EngineError::NothingToUndo));
}

#[test]
fn test_rejected_move_leaves_no_trace() {
    let mut board = started(EngineConfig::default());
    let depth = board.undo_depth();
    let records = board.undo_records();
    let before = board.digest();

    // not P1's turn
    let err = board
        .execute(&Move::game(P1, JumperOp::Pick { cell: Jumper::rack(P1) }))
        .unwrap_err();
    assert!(matches!(err, EngineError::Rejected { .. }));
    assert_eq!(board.digest(), before);
    assert_eq!(board.undo_depth(), depth);
    assert_eq!(board.undo_records(), records);
}

// =============================================================================
// Protocol Violation Tests
// =============================================================================

#[test]
#[should_panic(expected = "protocol violation")]
fn test_strict_board_panics_on_illegal_transition() {
    let mut board = started(EngineConfig::default().with_strict(true));
    // Done outside a done-state
    let _ = board.execute(&Move::done(P0));
}

#[test]
fn test_lenient_board_reports_illegal_transition() {
    let mut board = started(lenient());
    let before = board.digest();
    let err = board.execute(&Move::done(P0)).unwrap_err();
    assert!(matches!(err, EngineError::IllegalTransition { .. }));
    assert!(err.is_protocol_violation());
    assert_eq!(board.digest(), before);
}

#[test]
fn test_start_with_unknown_player_rejected() {
    let mut board = Board::<Jumper>::from_init_text("jumper 1 2", lenient()).unwrap();
    let err = board.execute(&Move::start(P0, PlayerId::new(3))).unwrap_err();
    assert!(matches!(err, EngineError::IllegalTransition { .. }));
}

// =============================================================================
// Control Opcode Tests
// =============================================================================

#[test]
fn test_resign_toggles_and_done_concedes() {
    let mut board = started(EngineConfig::default());
    board.execute(&Move::resign(P0)).unwrap();
    assert_eq!(board.phase(), JumperPhase::Resign);
    assert_eq!(board.resign_from(), Some(JumperPhase::Place));

    board.execute(&Move::resign(P0)).unwrap();
    assert_eq!(board.phase(), JumperPhase::Place);
    assert_eq!(board.resign_from(), None);

    board.execute(&Move::resign(P0)).unwrap();
    board.execute(&Move::done(P0)).unwrap();
    assert_eq!(board.phase(), JumperPhase::GameOver);
    assert_eq!(board.result(), Some(GameResult::Winner(P1)));
}

#[test]
fn test_game_over_on_time_awards_current_player() {
    let mut board = started(EngineConfig::default());
    board.execute(&Move::game_over_on_time(P1)).unwrap();
    assert_eq!(board.phase(), JumperPhase::GameOver);
    assert!(board.is_winner(P0));
    assert!(!board.is_winner(P1));
}

#[test]
fn test_edit_clears_win_flags() {
    let mut board = started(EngineConfig::default());
    board.execute(&Move::game_over_on_time(P0)).unwrap();
    assert!(board.result().is_some());

    board.execute(&Move::edit(P0)).unwrap();
    assert_eq!(board.phase(), JumperPhase::Puzzle);
    assert!(board.result().is_none());
    assert!(!board.is_winner(P0));
}

#[test]
fn test_undo_of_game_over_restores_play() {
    let mut board = started(EngineConfig::default());
    let before = board.digest();
    let mv = Move::game_over_on_time(P1);
    board.execute(&mv).unwrap();
    board.undo(&mv).unwrap();
    assert_eq!(board.digest(), before);
    assert_eq!(board.phase(), JumperPhase::Place);
    assert!(board.result().is_none());
}

#[test]
fn test_edit_returns_stone_in_flight() {
    let mut board = started(EngineConfig::default());
    let rack_height = board.cell(Jumper::rack(P0)).unwrap().height();
    board.execute(&pick(Jumper::rack(P0))).unwrap();
    assert_eq!(board.picked().map(|f| f.token), Some(Stone(P0)));

    board.execute(&Move::edit(P0)).unwrap();
    assert!(board.picked().is_none());
    assert_eq!(board.cell(Jumper::rack(P0)).unwrap().height(), rack_height);
}

// =============================================================================
// Digest Tests
// =============================================================================

#[test]
fn test_digest_depends_on_turn_and_phase() {
    let a = Board::<Jumper>::from_init_text("jumper 1 2", EngineConfig::default()).unwrap();
    let mut b = a.clone();
    assert_eq!(a.digest(), b.digest());

    b.execute(&Move::start(P0, P1)).unwrap();
    assert_ne!(a.digest(), b.digest());
}

#[test]
fn test_digest_separates_phase_from_turn_with_many_players() {
    let mut waiting = Board::<Heap>::from_init_text("heap 5 12", EngineConfig::default()).unwrap();
    waiting.execute(&Move::start(P0, PlayerId::new(10))).unwrap();

    let mut passed = Board::<Heap>::from_init_text("heap 5 12", EngineConfig::default()).unwrap();
    passed.execute(&Move::start(P0, P0)).unwrap();
    passed.execute(&take(P0, 0)).unwrap();

    assert_eq!((waiting.phase(), waiting.turn()), (HeapPhase::Play, PlayerId::new(10)));
    assert_eq!((passed.phase(), passed.turn()), (HeapPhase::Confirm, P0));
    assert_eq!(Heap::remaining(&waiting), Heap::remaining(&passed));
    assert_ne!(waiting.digest(), passed.digest());
}

#[test]
fn test_digest_seed_changes_digest() {
    let a = Board::<Jumper>::from_init_text("jumper 1 2", EngineConfig::default()).unwrap();
    let b = Board::<Jumper>::from_init_text("jumper 1 2", EngineConfig::default().with_digest_seed(7)).unwrap();
    assert_ne!(a.digest(), b.digest());
}

// =============================================================================
// Animation Tests
// =============================================================================

#[test]
fn test_animation_hints() {
    let mut board = started(EngineConfig::default().with_animation(true));
    board.take_animations();

    board.execute(&pick(Jumper::rack(P0))).unwrap();
    assert!(board.take_animations().is_empty());

    board.execute(&drop_on(Jumper::rack(P0))).unwrap();
    assert!(board.take_animations().is_empty(), "dropping back on the source does not animate");

    board.execute(&pick(Jumper::rack(P0))).unwrap();
    board.execute(&drop_on(Jumper::board_cell('B', 2))).unwrap();
    assert_eq!(
        board.take_animations(),
        vec![(Jumper::rack(P0), Jumper::board_cell('B', 2))]
    );
}

#[test]
fn test_animation_can_be_disabled() {
    let mut board = started(EngineConfig::default().with_animation(false));
    board
        .execute(&Move::game(P0, JumperOp::Move { from: Jumper::rack(P0), to: Jumper::board_cell('B', 2) }))
        .unwrap();
    assert!(board.take_animations().is_empty());
}

#[test]
fn test_rejected_move_drops_its_animation_hints() {
    let mut board = Board::<Heap>::from_init_text("heap 2 2", EngineConfig::default().with_animation(true)).unwrap();
    board.execute(&Move::start(P0, P0)).unwrap();
    board.take_animations();
    let before = board.digest();

    let err = board.execute(&take(P0, 3)).unwrap_err();
    assert_eq!(err, EngineError::EmptyCell(Heap::heap()));
    assert!(board.take_animations().is_empty());
    assert_eq!(Heap::remaining(&board), 2);
    assert_eq!(board.digest(), before);

    board.execute(&take(P0, 2)).unwrap();
    assert_eq!(board.take_animations(), vec![(Heap::heap(), Heap::taken(P0)); 2]);
}
