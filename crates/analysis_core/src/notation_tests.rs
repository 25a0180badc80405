use super::*;
use cozy_chess::Rank;

fn board(fen: &str) -> Board {
    Board::from_fen(fen, false).unwrap()
}

#[test]
fn uci_round_trip_for_plain_move() {
    let b = Board::default();
    let mv = move_from_uci(&b, "e2e4").expect("e2e4 parses");
    assert_eq!(mv.from, Square::E2);
    assert_eq!(mv.to, Square::E4);
    assert_eq!(move_to_uci(&b, mv), "e2e4");
}

#[test]
fn uci_castling_uses_king_destination() {
    let b = board("rnbqk1nr/pppp1ppp/8/2b1p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4");
    let mv = move_from_uci(&b, "e1g1").expect("standard castle text parses");
    // Internally the oracle encodes the rook square.
    assert_eq!(mv.to, Square::H1);
    assert_eq!(move_to_uci(&b, mv), "e1g1");

    // The oracle's own encoding is accepted too.
    let same = move_from_uci(&b, "e1h1").expect("rook-square castle text parses");
    assert_eq!(same, mv);
}

#[test]
fn uci_promotion_suffix() {
    let b = board("8/P7/8/8/8/8/7k/K7 w - - 0 1");
    let mv = move_from_uci(&b, "a7a8q").expect("promotion parses");
    assert_eq!(mv.promotion, Some(Piece::Queen));
    assert_eq!(move_to_uci(&b, mv), "a7a8q");
}

#[test]
fn rejects_illegal_uci() {
    let b = Board::default();
    assert!(move_from_uci(&b, "e2e5").is_none());
    assert!(move_from_uci(&b, "junk").is_none());
}

#[test]
fn san_disambiguates_by_file() {
    let b = board("k7/8/8/8/8/8/8/KN3N2 w - - 0 1");
    let mv = Move {
        from: Square::B1,
        to: Square::D2,
        promotion: None,
    };
    assert_eq!(san(&b, mv), "Nbd2");
}

#[test]
fn san_disambiguates_by_rank() {
    // Rooks on a1 and a5 both reach a3.
    let b = board("7k/8/8/R7/8/8/8/R3K3 w - - 0 1");
    let mv = Move {
        from: Square::A1,
        to: Square::A3,
        promotion: None,
    };
    assert_eq!(san(&b, mv), "R1a3");
}

#[test]
fn san_mate_suffix() {
    let b = board("r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4");
    let mv = move_from_uci(&b, "h5f7").unwrap();
    assert_eq!(san(&b, mv), "Qxf7#");
}

#[test]
fn parse_san_round_trips_generated_san() {
    let b = board("r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4");
    for mv in crate::rules::collect_legal(&b) {
        let text = san(&b, mv);
        assert_eq!(parse_san(&b, &text), Some(mv), "round trip for {text}");
    }
}

#[test]
fn parse_san_castles() {
    let b = board("rnbqk1nr/pppp1ppp/8/2b1p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4");
    let mv = parse_san(&b, "O-O").expect("kingside castle parses");
    assert_eq!(mv.from.rank(), Rank::First);
    assert_eq!(parse_san(&b, "0-0"), Some(mv));
}

#[test]
fn parse_san_promotion_with_and_without_equals() {
    let b = board("8/P7/8/8/8/8/7k/K7 w - - 0 1");
    let with_eq = parse_san(&b, "a8=N").expect("a8=N parses");
    assert_eq!(with_eq.promotion, Some(Piece::Knight));
    assert_eq!(parse_san(&b, "a8N"), Some(with_eq));
}

#[test]
fn parse_san_rejects_ambiguous_and_unknown() {
    let b = board("k7/8/8/8/8/8/8/KN3N2 w - - 0 1");
    assert!(parse_san(&b, "Nd2").is_none());
    assert!(parse_san(&b, "Nbd2").is_some());
    assert!(parse_san(&b, "Qd8").is_none());
    assert!(parse_san(&b, "").is_none());
}

#[test]
fn parse_san_strips_annotations() {
    let b = Board::default();
    let mv = parse_san(&b, "e4!?").expect("annotated move parses");
    assert_eq!(mv.to, Square::E4);
}
