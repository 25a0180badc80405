use super::*;
use crate::rules::MoveInput;
use cozy_chess::Square;

fn played(board: &mut RulesBoard, from: Square, to: Square) -> PlayedMove {
    board.try_move(MoveInput::new(from, to)).expect("legal move")
}

/// Timeline with 1.e4 e5 2.Nf3 recorded, cursor at the tip.
fn sample() -> Timeline {
    let mut board = RulesBoard::startpos();
    let mut timeline = Timeline::new();
    timeline.record(played(&mut board, Square::E2, Square::E4));
    timeline.record(played(&mut board, Square::E7, Square::E5));
    timeline.record(played(&mut board, Square::G1, Square::F3));
    timeline
}

#[test]
fn record_advances_cursor() {
    let timeline = sample();
    assert_eq!(timeline.len(), 3);
    assert_eq!(timeline.cursor(), 3);
    assert!(timeline.at_tip());
}

#[test]
fn navigation_clamps_at_both_ends() {
    let mut timeline = sample();
    assert_eq!(timeline.navigate(NavStep::Prev), 2);
    assert_eq!(timeline.navigate(NavStep::First), 0);
    assert_eq!(timeline.navigate(NavStep::Prev), 0);
    assert_eq!(timeline.navigate(NavStep::Next), 1);
    assert_eq!(timeline.navigate(NavStep::Last), 3);
    assert_eq!(timeline.navigate(NavStep::Next), 3);
}

#[test]
fn seek_rejects_out_of_range() {
    let mut timeline = sample();
    let err = timeline.seek(4).unwrap_err();
    assert_eq!(err, GameError::NavigationOutOfRange { index: 4, len: 3 });
    // Cursor untouched by the failed seek.
    assert_eq!(timeline.cursor(), 3);
}

#[test]
fn replay_reproduces_positions() {
    let mut board = RulesBoard::startpos();
    let mut timeline = Timeline::new();
    let mut fens = vec![board.fen()];
    for (from, to) in [
        (Square::E2, Square::E4),
        (Square::E7, Square::E5),
        (Square::G1, Square::F3),
        (Square::B8, Square::C6),
    ] {
        timeline.record(played(&mut board, from, to));
        fens.push(board.fen());
    }

    for (ply, fen) in fens.iter().enumerate() {
        assert_eq!(&timeline.position_at(ply).unwrap().fen(), fen);
    }
}

#[test]
fn record_while_rewound_truncates_redo_tail() {
    let mut timeline = sample();
    timeline.navigate(NavStep::First);
    timeline.navigate(NavStep::Next); // after 1.e4

    let mut board = timeline.position().unwrap();
    let reply = played(&mut board, Square::C7, Square::C5);
    timeline.record(reply);

    assert_eq!(timeline.len(), 2);
    assert_eq!(timeline.cursor(), 2);
    assert_eq!(timeline.history()[1].san, "c5");
    assert!(timeline.at_tip());
}

#[test]
fn last_shown_follows_cursor() {
    let mut timeline = sample();
    assert_eq!(timeline.last_shown().unwrap().san, "Nf3");
    timeline.navigate(NavStep::First);
    assert!(timeline.last_shown().is_none());
}

#[test]
fn custom_start_position_replays_from_it() {
    let fen = "8/P7/8/8/8/8/7k/K7 w - - 0 1";
    let mut timeline = Timeline::with_start(fen).unwrap();
    let mut board = RulesBoard::from_fen(fen).unwrap();
    timeline.record(played(&mut board, Square::A7, Square::A8));
    assert_eq!(timeline.position().unwrap().fen(), board.fen());
    assert_eq!(timeline.position_at(0).unwrap().fen(), fen);
}
