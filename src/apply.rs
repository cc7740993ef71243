//! Move application for the chessroom engine.
//!
//! Given a board and a *pre-validated* move, this module produces the next
//! board value and the move record: source square emptied, destination
//! holding the moved piece with its position updated and `has_moved` set,
//! captured piece extracted (for en passant, the pawn behind the
//! destination), rook relocation on castling, and promotion substitution
//! for a pawn reaching the far rank.
//!
//! Legality is [`crate::movegen`]'s responsibility; nothing here
//! re-validates, which keeps application a total transformation. The
//! special cases are recognized geometrically: a king moving two files is
//! a castle, a pawn moving diagonally onto an empty square is an en
//! passant capture.

use crate::types::*;
use thiserror::Error;

/// Applies a pre-validated move to a board, returning the next board and
/// the captured piece, if any.
///
/// `promotion` selects the replacement kind for a pawn reaching the far
/// rank (queen if unspecified); it is ignored for every other move.
pub fn apply_to_board(
    board: &Board,
    from: Square,
    to: Square,
    promotion: Option<PieceKind>,
) -> (Board, Option<Piece>) {
    let piece = board.get(from).expect("apply: no piece on source square");
    let mut next = board.clone();

    next.set(from, None);

    // Castling — relocate the rook as well.
    if piece.kind == PieceKind::King && (to.file as i8 - from.file as i8).abs() == 2 {
        let rank = from.rank;
        let (rook_from, rook_to) = if to.file == 6 {
            (Square::new(7, rank), Square::new(5, rank)) // kingside: h -> f
        } else {
            (Square::new(0, rank), Square::new(3, rank)) // queenside: a -> d
        };
        if let Some(mut rook) = next.get(rook_from) {
            next.set(rook_from, None);
            rook.pos = rook_to;
            rook.has_moved = true;
            next.set(rook_to, Some(rook));
        }
    }

    // Capture extraction. A pawn arriving diagonally on an empty square is
    // an en passant capture: the victim sits behind the destination.
    let mut captured = next.get(to);
    if piece.kind == PieceKind::Pawn && from.file != to.file && captured.is_none() {
        let victim_sq = Square::new(to.file, from.rank);
        captured = next.get(victim_sq);
        next.set(victim_sq, None);
    }
    debug_assert!(
        captured.is_none_or(|p| p.kind != PieceKind::King),
        "kings are never captured"
    );

    let mut moved = piece;
    moved.pos = to;
    moved.has_moved = true;
    if piece.kind == PieceKind::Pawn && to.rank == piece.color.promotion_rank() {
        moved.kind = promotion.unwrap_or(PieceKind::Queen);
    }
    next.set(to, Some(moved));

    (next, captured)
}

/// Applies a pre-validated move and builds its [`MoveRecord`].
///
/// The record's `promotion` field is normalized: it is set exactly when the
/// move actually promoted (including the default queen), so replaying the
/// record list reproduces the board regardless of what the caller passed.
pub fn apply_move(
    board: &Board,
    from: Square,
    to: Square,
    promotion: Option<PieceKind>,
    timestamp: u64,
) -> (Board, MoveRecord) {
    let piece = board.get(from).expect("apply: no piece on source square");
    let (next, captured_piece) = apply_to_board(board, from, to, promotion);

    let promoted = if piece.kind == PieceKind::Pawn && to.rank == piece.color.promotion_rank() {
        Some(promotion.unwrap_or(PieceKind::Queen))
    } else {
        None
    };

    let mut notation = format!("{}{}", from.to_algebraic(), to.to_algebraic());
    if let Some(kind) = promoted {
        notation.push('=');
        notation.push(kind.letter());
    }

    let record = MoveRecord {
        from,
        to,
        piece,
        captured_piece,
        promotion: promoted,
        timestamp,
        notation,
    };

    (next, record)
}

// ---------------------------------------------------------------------------
// Replay
// ---------------------------------------------------------------------------

/// A recorded move list failed to replay.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplayError {
    /// A record's source square was empty at its turn in the sequence.
    #[error("move {index} ({notation}): no piece on {square}")]
    EmptySource {
        index: usize,
        square: Square,
        notation: String,
    },
    /// The piece found on the source square does not match the record's
    /// pre-move snapshot.
    #[error("move {index} ({notation}): piece on {square} does not match the recorded snapshot")]
    PieceMismatch {
        index: usize,
        square: Square,
        notation: String,
    },
}

/// Replays a recorded move list from the standard starting position and
/// returns the resulting board.
///
/// Each record's pre-move piece snapshot is checked against the board
/// before it is applied, so a corrupted or reordered list fails loudly
/// instead of silently diverging.
pub fn replay(moves: &[MoveRecord]) -> Result<Board, ReplayError> {
    let mut board = Board::starting_position();

    for (index, record) in moves.iter().enumerate() {
        let found = board.get(record.from).ok_or_else(|| ReplayError::EmptySource {
            index,
            square: record.from,
            notation: record.notation.clone(),
        })?;
        if found != record.piece {
            return Err(ReplayError::PieceMismatch {
                index,
                square: record.from,
                notation: record.notation.clone(),
            });
        }
        let (next, _) = apply_to_board(&board, record.from, record.to, record.promotion);
        board = next;
    }

    Ok(board)
}
