//! Move legality for the chessroom engine.
//!
//! This module computes, for the piece on a given square, every destination
//! it may move to under full chess rules:
//!
//! - Piece movement patterns (King, Queen, Rook, Bishop, Knight, Pawn)
//! - Castling (kingside and queenside, with all conditions)
//! - En passant captures
//! - Pawn promotion destinations
//! - Check detection and prevention (no move may leave own king in check)
//! - Game status classification (playing / check / checkmate / draw)
//!
//! Castling rights are read off the `has_moved` flags of the king and rook;
//! the en passant window is derived from the last entry of the move history.
//! Everything here is pure computation over a board snapshot — applying a
//! move is [`crate::apply`]'s job.

use crate::apply;
use crate::types::*;
use std::collections::BTreeSet;

/// Direction vectors for sliding pieces.
const ROOK_DIRS: [(i8, i8); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
const BISHOP_DIRS: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];
const QUEEN_DIRS: [(i8, i8); 8] = [
    (-1, 0), (1, 0), (0, -1), (0, 1),
    (-1, -1), (-1, 1), (1, -1), (1, 1),
];

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-2, -1), (-2, 1), (-1, -2), (-1, 2),
    (1, -2), (1, 2), (2, -1), (2, 1),
];

// ---------------------------------------------------------------------------
// Attack detection
// ---------------------------------------------------------------------------

/// Returns `true` if the given square is attacked by any piece of `attacker_color`.
///
/// This is used for:
/// - Check detection (is the king attacked?)
/// - Castling validation (king must not pass through or land on attacked squares)
///
/// Attack computation deliberately ignores the self-check exclusion —
/// filtering attackers by their own king safety here would recurse forever.
pub fn is_square_attacked(board: &Board, sq: Square, attacker_color: Color) -> bool {
    // Knight attacks
    for &(df, dr) in &KNIGHT_OFFSETS {
        if let Some(from) = sq.offset(df, dr)
            && let Some(piece) = board.get(from)
            && piece.color == attacker_color
            && piece.kind == PieceKind::Knight
        {
            return true;
        }
    }

    // King attacks (one square in any direction)
    for df in -1..=1i8 {
        for dr in -1..=1i8 {
            if df == 0 && dr == 0 {
                continue;
            }
            if let Some(from) = sq.offset(df, dr)
                && let Some(piece) = board.get(from)
                && piece.color == attacker_color
                && piece.kind == PieceKind::King
            {
                return true;
            }
        }
    }

    // Pawn attacks — the attacking pawn sits one rank behind the target
    // from its own point of view.
    let pawn_dir = attacker_color.pawn_direction();
    for df in [-1i8, 1] {
        if let Some(from) = sq.offset(df, -pawn_dir)
            && let Some(piece) = board.get(from)
            && piece.color == attacker_color
            && piece.kind == PieceKind::Pawn
        {
            return true;
        }
    }

    // Bishop/Queen along diagonals
    for &(df, dr) in &BISHOP_DIRS {
        let mut cur = sq;
        while let Some(next) = cur.offset(df, dr) {
            if let Some(piece) = board.get(next) {
                if piece.color == attacker_color
                    && (piece.kind == PieceKind::Bishop || piece.kind == PieceKind::Queen)
                {
                    return true;
                }
                break; // blocked by another piece
            }
            cur = next;
        }
    }

    // Rook/Queen along files and ranks
    for &(df, dr) in &ROOK_DIRS {
        let mut cur = sq;
        while let Some(next) = cur.offset(df, dr) {
            if let Some(piece) = board.get(next) {
                if piece.color == attacker_color
                    && (piece.kind == PieceKind::Rook || piece.kind == PieceKind::Queen)
                {
                    return true;
                }
                break;
            }
            cur = next;
        }
    }

    false
}

/// Returns `true` if the king of the given color is currently in check.
pub fn is_in_check(board: &Board, color: Color) -> bool {
    match board.find_king(color) {
        Some(king_sq) => is_square_attacked(board, king_sq, color.opponent()),
        // No king on the board — not a reachable game state.
        None => false,
    }
}

// ---------------------------------------------------------------------------
// En passant window
// ---------------------------------------------------------------------------

/// Returns the en passant capture square, if the immediately preceding move
/// was a pawn double step. The window lasts exactly one ply: any later move
/// record closes it.
pub fn en_passant_target(history: &[MoveRecord]) -> Option<Square> {
    let last = history.last()?;
    if !last.is_double_pawn_step() {
        return None;
    }
    // The capture square is the one the pawn skipped over.
    let skipped_rank = (last.from.rank + last.to.rank) / 2;
    Some(Square::new(last.from.file, skipped_rank))
}

// ---------------------------------------------------------------------------
// Legal destinations
// ---------------------------------------------------------------------------

/// Computes every square the piece at `from` may legally move to.
///
/// Returns the empty set when `from` is empty. Candidate destinations that
/// would leave the mover's own king in check are excluded by simulating the
/// move on a scratch board and re-running attack detection.
pub fn legal_destinations(
    board: &Board,
    from: Square,
    history: &[MoveRecord],
) -> BTreeSet<Square> {
    let Some(piece) = board.get(from) else {
        return BTreeSet::new();
    };

    let mut candidates = Vec::with_capacity(16);
    match piece.kind {
        PieceKind::King => king_destinations(board, piece, &mut candidates),
        PieceKind::Queen => sliding_destinations(board, piece, &QUEEN_DIRS, &mut candidates),
        PieceKind::Rook => sliding_destinations(board, piece, &ROOK_DIRS, &mut candidates),
        PieceKind::Bishop => sliding_destinations(board, piece, &BISHOP_DIRS, &mut candidates),
        PieceKind::Knight => knight_destinations(board, piece, &mut candidates),
        PieceKind::Pawn => pawn_destinations(board, piece, en_passant_target(history), &mut candidates),
    }

    // Self-check exclusion: the promotion kind cannot affect the mover's own
    // king safety (only occupancy matters), so simulating with the default
    // queen is sufficient for every candidate.
    candidates
        .into_iter()
        .filter(|&to| {
            let (next, _) = apply::apply_to_board(board, from, to, None);
            !is_in_check(&next, piece.color)
        })
        .collect()
}

/// Destinations along rays (rook, bishop, queen): blocked by the first
/// occupied square; capture allowed there only against the opposite color.
fn sliding_destinations(
    board: &Board,
    piece: Piece,
    directions: &[(i8, i8)],
    out: &mut Vec<Square>,
) {
    for &(df, dr) in directions {
        let mut cur = piece.pos;
        while let Some(to) = cur.offset(df, dr) {
            match board.get(to) {
                None => {
                    out.push(to);
                    cur = to;
                }
                Some(target) => {
                    if target.color != piece.color {
                        out.push(to); // capture
                    }
                    break; // blocked
                }
            }
        }
    }
}

/// Knight destinations: fixed offsets, intervening occupancy ignored.
fn knight_destinations(board: &Board, piece: Piece, out: &mut Vec<Square>) {
    for &(df, dr) in &KNIGHT_OFFSETS {
        if let Some(to) = piece.pos.offset(df, dr) {
            match board.get(to) {
                None => out.push(to),
                Some(target) => {
                    if target.color != piece.color {
                        out.push(to);
                    }
                }
            }
        }
    }
}

/// King destinations: one-square steps plus castling.
fn king_destinations(board: &Board, piece: Piece, out: &mut Vec<Square>) {
    for df in -1..=1i8 {
        for dr in -1..=1i8 {
            if df == 0 && dr == 0 {
                continue;
            }
            if let Some(to) = piece.pos.offset(df, dr) {
                match board.get(to) {
                    None => out.push(to),
                    Some(target) => {
                        if target.color != piece.color {
                            out.push(to);
                        }
                    }
                }
            }
        }
    }

    // Castling. Rights are carried by the `has_moved` flags of the king and
    // the relevant rook.
    if piece.has_moved {
        return;
    }
    let rank = piece.color.back_rank();
    if piece.pos != Square::new(4, rank) {
        return;
    }

    // King must not castle out of check.
    if is_square_attacked(board, piece.pos, piece.color.opponent()) {
        return;
    }

    let opponent = piece.color.opponent();

    // Kingside: rook on the h-file, f and g empty, king path f,g safe.
    let unmoved_rook = |file: u8| {
        matches!(
            board.get(Square::new(file, rank)),
            Some(Piece { kind: PieceKind::Rook, color, has_moved: false, .. }) if color == piece.color
        )
    };

    if unmoved_rook(7) {
        let f_sq = Square::new(5, rank);
        let g_sq = Square::new(6, rank);
        let path_clear = board.get(f_sq).is_none() && board.get(g_sq).is_none();
        let safe = !is_square_attacked(board, f_sq, opponent)
            && !is_square_attacked(board, g_sq, opponent);
        if path_clear && safe {
            out.push(g_sq);
        }
    }

    // Queenside: rook on the a-file, b, c and d empty, king path d,c safe
    // (b need not be safe — only the king's own path matters).
    if unmoved_rook(0) {
        let d_sq = Square::new(3, rank);
        let c_sq = Square::new(2, rank);
        let b_sq = Square::new(1, rank);
        let path_clear =
            board.get(d_sq).is_none() && board.get(c_sq).is_none() && board.get(b_sq).is_none();
        let safe = !is_square_attacked(board, d_sq, opponent)
            && !is_square_attacked(board, c_sq, opponent);
        if path_clear && safe {
            out.push(c_sq);
        }
    }
}

/// Pawn destinations: single push, double step from the start rank,
/// diagonal captures, en passant. Promotion squares are ordinary
/// destinations here — the replacement kind is chosen at application time.
fn pawn_destinations(
    board: &Board,
    piece: Piece,
    en_passant: Option<Square>,
    out: &mut Vec<Square>,
) {
    let dir = piece.color.pawn_direction();

    // Forward pushes, blocked by any occupancy.
    if let Some(one_ahead) = piece.pos.offset(0, dir)
        && board.get(one_ahead).is_none()
    {
        out.push(one_ahead);

        if piece.pos.rank == piece.color.pawn_start_rank()
            && let Some(two_ahead) = piece.pos.offset(0, dir * 2)
            && board.get(two_ahead).is_none()
        {
            out.push(two_ahead);
        }
    }

    // Diagonal captures, including en passant.
    for df in [-1i8, 1] {
        if let Some(to) = piece.pos.offset(df, dir) {
            if let Some(target) = board.get(to)
                && target.color != piece.color
            {
                out.push(to);
            }
            if en_passant == Some(to) {
                out.push(to);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Status classification
// ---------------------------------------------------------------------------

/// Returns `true` if any piece of `color` has at least one legal move.
pub fn side_has_legal_move(board: &Board, color: Color, history: &[MoveRecord]) -> bool {
    board
        .pieces()
        .filter(|p| p.color == color)
        .any(|p| !legal_destinations(board, p.pos, history).is_empty())
}

/// Classifies the position for the side to move.
///
/// - `check`: the king is attacked and at least one legal move exists
/// - `checkmate`: the king is attacked and no legal move exists
/// - `draw`: no legal move without check (stalemate), or dead position
/// - `playing`: otherwise
pub fn game_status_for(board: &Board, to_move: Color, history: &[MoveRecord]) -> GameStatus {
    let attacked = is_in_check(board, to_move);
    let has_move = side_has_legal_move(board, to_move, history);

    match (attacked, has_move) {
        (true, false) => GameStatus::Checkmate,
        (false, false) => GameStatus::Draw,
        (true, true) => GameStatus::Check,
        (false, true) => {
            if is_insufficient_material(board) {
                GameStatus::Draw
            } else {
                GameStatus::Playing
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Insufficient material detection (dead position)
// ---------------------------------------------------------------------------

/// Checks if the position has insufficient material for checkmate:
/// K vs K, K+B vs K, K+N vs K, and K+B vs K+B with both bishops on
/// same-colored squares.
pub fn is_insufficient_material(board: &Board) -> bool {
    let white: Vec<Piece> = board
        .pieces()
        .filter(|p| p.color == Color::White && p.kind != PieceKind::King)
        .collect();
    let black: Vec<Piece> = board
        .pieces()
        .filter(|p| p.color == Color::Black && p.kind != PieceKind::King)
        .collect();

    match (white.len(), black.len()) {
        (0, 0) => true,
        (1, 0) => matches!(white[0].kind, PieceKind::Bishop | PieceKind::Knight),
        (0, 1) => matches!(black[0].kind, PieceKind::Bishop | PieceKind::Knight),
        (1, 1) => {
            white[0].kind == PieceKind::Bishop
                && black[0].kind == PieceKind::Bishop
                && (white[0].pos.file + white[0].pos.rank) % 2
                    == (black[0].pos.file + black[0].pos.rank) % 2
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply;

    /// Applies a move and appends its record, mirroring what the reducer
    /// does during play.
    fn play(board: &mut Board, history: &mut Vec<MoveRecord>, from: &str, to: &str) {
        let from = Square::from_algebraic(from).unwrap();
        let to = Square::from_algebraic(to).unwrap();
        let (next, record) = apply::apply_move(board, from, to, None, 0);
        *board = next;
        history.push(record);
    }

    fn put(board: &mut Board, sq: &str, kind: PieceKind, color: Color) {
        let sq = Square::from_algebraic(sq).unwrap();
        board.set(sq, Some(Piece::new(kind, color, sq)));
    }

    fn destinations(board: &Board, from: &str) -> BTreeSet<Square> {
        legal_destinations(board, Square::from_algebraic(from).unwrap(), &[])
    }

    #[test]
    fn test_starting_position_has_20_moves() {
        let board = Board::starting_position();
        let total: usize = board
            .pieces()
            .filter(|p| p.color == Color::White)
            .map(|p| legal_destinations(&board, p.pos, &[]).len())
            .sum();
        assert_eq!(total, 20, "White should have 20 legal moves in the starting position");
    }

    #[test]
    fn test_starting_position_not_in_check() {
        let board = Board::starting_position();
        assert!(!is_in_check(&board, Color::White));
        assert!(!is_in_check(&board, Color::Black));
        assert_eq!(game_status_for(&board, Color::White, &[]), GameStatus::Playing);
    }

    #[test]
    fn test_empty_square_has_no_destinations() {
        let board = Board::starting_position();
        assert!(destinations(&board, "e4").is_empty());
    }

    #[test]
    fn test_fools_mate_is_checkmate() {
        // 1. f3 e5 2. g4 Qh4#
        let mut board = Board::starting_position();
        let mut history = Vec::new();
        play(&mut board, &mut history, "f2", "f3");
        play(&mut board, &mut history, "e7", "e5");
        play(&mut board, &mut history, "g2", "g4");
        play(&mut board, &mut history, "d8", "h4");

        assert!(is_in_check(&board, Color::White));
        assert_eq!(
            game_status_for(&board, Color::White, &history),
            GameStatus::Checkmate
        );
    }

    #[test]
    fn test_check_with_escape_is_not_mate() {
        let mut board = Board::default();
        put(&mut board, "e1", PieceKind::King, Color::White);
        put(&mut board, "e8", PieceKind::King, Color::Black);
        put(&mut board, "e5", PieceKind::Rook, Color::Black);

        assert!(is_in_check(&board, Color::White));
        assert_eq!(game_status_for(&board, Color::White, &[]), GameStatus::Check);
    }

    #[test]
    fn test_self_check_exclusion_for_pinned_piece() {
        // White rook on e2 is pinned against the king by the rook on e7.
        let mut board = Board::default();
        put(&mut board, "e1", PieceKind::King, Color::White);
        put(&mut board, "e2", PieceKind::Rook, Color::White);
        put(&mut board, "e7", PieceKind::Rook, Color::Black);
        put(&mut board, "a8", PieceKind::King, Color::Black);

        let dests = destinations(&board, "e2");
        assert!(!dests.is_empty());
        // Every destination stays on the e-file; leaving it would expose the king.
        assert!(dests.iter().all(|sq| sq.file == 4));
        assert!(dests.contains(&Square::from_algebraic("e7").unwrap()));
    }

    #[test]
    fn test_castling_available_in_clear_position() {
        let mut board = Board::default();
        put(&mut board, "e1", PieceKind::King, Color::White);
        put(&mut board, "a1", PieceKind::Rook, Color::White);
        put(&mut board, "h1", PieceKind::Rook, Color::White);
        put(&mut board, "e8", PieceKind::King, Color::Black);

        let dests = destinations(&board, "e1");
        assert!(dests.contains(&Square::from_algebraic("g1").unwrap()));
        assert!(dests.contains(&Square::from_algebraic("c1").unwrap()));
    }

    #[test]
    fn test_castling_denied_after_rook_moved() {
        let mut board = Board::default();
        put(&mut board, "e1", PieceKind::King, Color::White);
        put(&mut board, "a1", PieceKind::Rook, Color::White);
        put(&mut board, "e8", PieceKind::King, Color::Black);

        let h1 = Square::from_algebraic("h1").unwrap();
        let mut rook = Piece::new(PieceKind::Rook, Color::White, h1);
        rook.has_moved = true;
        board.set(h1, Some(rook));

        let dests = destinations(&board, "e1");
        assert!(
            !dests.contains(&Square::from_algebraic("g1").unwrap()),
            "kingside castling must be gone once the rook has moved"
        );
        assert!(dests.contains(&Square::from_algebraic("c1").unwrap()));
    }

    #[test]
    fn test_castling_denied_after_king_moved() {
        let mut board = Board::default();
        put(&mut board, "h1", PieceKind::Rook, Color::White);
        put(&mut board, "e8", PieceKind::King, Color::Black);

        let e1 = Square::from_algebraic("e1").unwrap();
        let mut king = Piece::new(PieceKind::King, Color::White, e1);
        king.has_moved = true;
        board.set(e1, Some(king));

        let dests = destinations(&board, "e1");
        assert!(!dests.contains(&Square::from_algebraic("g1").unwrap()));
    }

    #[test]
    fn test_castling_denied_through_attacked_square() {
        // Black rook on f8 covers f1 — the king may not pass through it.
        let mut board = Board::default();
        put(&mut board, "e1", PieceKind::King, Color::White);
        put(&mut board, "h1", PieceKind::Rook, Color::White);
        put(&mut board, "f8", PieceKind::Rook, Color::Black);
        put(&mut board, "a8", PieceKind::King, Color::Black);

        let dests = destinations(&board, "e1");
        assert!(!dests.contains(&Square::from_algebraic("g1").unwrap()));
    }

    #[test]
    fn test_en_passant_window_opens_and_closes() {
        // White pawn on e5; black answers d7-d5 — exactly then exd6 is legal.
        let mut board = Board::default();
        put(&mut board, "e1", PieceKind::King, Color::White);
        put(&mut board, "e8", PieceKind::King, Color::Black);
        put(&mut board, "e5", PieceKind::Pawn, Color::White);
        put(&mut board, "d7", PieceKind::Pawn, Color::Black);
        put(&mut board, "h7", PieceKind::Pawn, Color::Black);

        let mut history = Vec::new();
        play(&mut board, &mut history, "d7", "d5");

        let d6 = Square::from_algebraic("d6").unwrap();
        let e5 = Square::from_algebraic("e5").unwrap();
        assert_eq!(en_passant_target(&history), Some(d6));
        assert!(legal_destinations(&board, e5, &history).contains(&d6));

        // One ply later the window is closed.
        play(&mut board, &mut history, "h7", "h6");
        assert_eq!(en_passant_target(&history), None);
        assert!(!legal_destinations(&board, e5, &history).contains(&d6));
    }

    #[test]
    fn test_stalemate_is_draw() {
        // Black king a8, white queen b6: every black king move is covered,
        // but the king is not in check.
        let mut board = Board::default();
        put(&mut board, "a8", PieceKind::King, Color::Black);
        put(&mut board, "b6", PieceKind::Queen, Color::White);
        put(&mut board, "d4", PieceKind::King, Color::White);

        assert!(!is_in_check(&board, Color::Black));
        assert_eq!(game_status_for(&board, Color::Black, &[]), GameStatus::Draw);
    }

    #[test]
    fn test_insufficient_material_k_vs_k() {
        let mut board = Board::default();
        put(&mut board, "e1", PieceKind::King, Color::White);
        put(&mut board, "e8", PieceKind::King, Color::Black);
        assert!(is_insufficient_material(&board));
        assert_eq!(game_status_for(&board, Color::White, &[]), GameStatus::Draw);
    }

    #[test]
    fn test_insufficient_material_kb_vs_k() {
        let mut board = Board::default();
        put(&mut board, "e1", PieceKind::King, Color::White);
        put(&mut board, "c3", PieceKind::Bishop, Color::White);
        put(&mut board, "e8", PieceKind::King, Color::Black);
        assert!(is_insufficient_material(&board));
    }

    #[test]
    fn test_not_insufficient_with_rook() {
        let mut board = Board::default();
        put(&mut board, "e1", PieceKind::King, Color::White);
        put(&mut board, "a1", PieceKind::Rook, Color::White);
        put(&mut board, "e8", PieceKind::King, Color::Black);
        assert!(!is_insufficient_material(&board));
    }

    #[test]
    fn test_pawn_blocked_by_occupancy() {
        let mut board = Board::starting_position();
        // Block e2 with a black piece on e3.
        put(&mut board, "e3", PieceKind::Knight, Color::Black);
        let dests = destinations(&board, "e2");
        assert!(
            !dests.contains(&Square::from_algebraic("e3").unwrap()),
            "pawns do not capture straight ahead"
        );
        assert!(!dests.contains(&Square::from_algebraic("e4").unwrap()));
    }

    #[test]
    fn test_knight_ignores_intervening_occupancy() {
        let board = Board::starting_position();
        let dests = destinations(&board, "g1");
        assert!(dests.contains(&Square::from_algebraic("f3").unwrap()));
        assert!(dests.contains(&Square::from_algebraic("h3").unwrap()));
        assert_eq!(dests.len(), 2);
    }
}
