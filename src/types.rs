//! Core types for the chessroom game state engine.
//!
//! This module defines the data model shared by every other component:
//! piece and square representation, the board grid, the game status
//! vocabulary, and the move record format. All presentation surfaces
//! (board renderer, tutorial flows, lobby) consume these types read-only;
//! mutation happens exclusively through the command reducer in [`crate::game`].

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ---------------------------------------------------------------------------
// Color & PieceKind
// ---------------------------------------------------------------------------

/// Represents the color (side) of a chess piece or player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    /// The White side (home rank 0).
    White,
    /// The Black side (home rank 7).
    Black,
}

impl Color {
    /// Returns the opposite color.
    pub fn opponent(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Returns the back rank index (0-based) for this color.
    pub fn back_rank(self) -> u8 {
        match self {
            Color::White => 0,
            Color::Black => 7,
        }
    }

    /// Returns the rank index pawns of this color start on.
    pub fn pawn_start_rank(self) -> u8 {
        match self {
            Color::White => 1,
            Color::Black => 6,
        }
    }

    /// Returns the rank index pawns of this color promote on.
    pub fn promotion_rank(self) -> u8 {
        match self {
            Color::White => 7,
            Color::Black => 0,
        }
    }

    /// Returns the direction pawns move: +1 for White, -1 for Black.
    pub fn pawn_direction(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

/// Represents a chess piece type (without color information).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    King,
    Queen,
    Rook,
    Bishop,
    Knight,
    Pawn,
}

impl PieceKind {
    /// Uppercase letter used in coordinate notation (e.g. "=Q").
    pub fn letter(self) -> char {
        match self {
            PieceKind::King => 'K',
            PieceKind::Queen => 'Q',
            PieceKind::Rook => 'R',
            PieceKind::Bishop => 'B',
            PieceKind::Knight => 'N',
            PieceKind::Pawn => 'P',
        }
    }

    /// Parses an uppercase notation letter. Returns `None` for anything else.
    pub fn from_letter(c: char) -> Option<Self> {
        match c {
            'K' => Some(PieceKind::King),
            'Q' => Some(PieceKind::Queen),
            'R' => Some(PieceKind::Rook),
            'B' => Some(PieceKind::Bishop),
            'N' => Some(PieceKind::Knight),
            'P' => Some(PieceKind::Pawn),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Square
// ---------------------------------------------------------------------------

/// Represents a square on the chessboard using 0-based file and rank indices.
///
/// - `file`: 0 (a) to 7 (h)
/// - `rank`: 0 (White's back rank) to 7 (Black's back rank)
///
/// Serializes as its algebraic name (e.g. `"e4"`), which is the exchange
/// format used by the room/session provider and by persisted archives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square {
    pub file: u8,
    pub rank: u8,
}

impl Square {
    /// Creates a new square from 0-based file and rank.
    pub fn new(file: u8, rank: u8) -> Self {
        debug_assert!(file < 8 && rank < 8, "Square out of bounds");
        Self { file, rank }
    }

    /// Parses an algebraic notation string (e.g. "e4") into a `Square`.
    /// Returns `None` for invalid input.
    pub fn from_algebraic(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return None;
        }
        let file = bytes[0].wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'1');
        if file < 8 && rank < 8 {
            Some(Square { file, rank })
        } else {
            None
        }
    }

    /// Converts the square to its algebraic notation string (e.g. "e4").
    pub fn to_algebraic(self) -> String {
        format!("{}{}", (b'a' + self.file) as char, self.rank + 1)
    }

    /// Returns a new square offset by `(df, dr)`, or `None` if out of bounds.
    pub fn offset(self, df: i8, dr: i8) -> Option<Square> {
        let f = self.file as i8 + df;
        let r = self.rank as i8 + dr;
        if (0..8).contains(&f) && (0..8).contains(&r) {
            Some(Square::new(f as u8, r as u8))
        } else {
            None
        }
    }

    /// Returns a flat index (0..63) for the square.
    pub fn index(self) -> usize {
        (self.rank as usize) * 8 + self.file as usize
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_algebraic())
    }
}

impl Serialize for Square {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_algebraic())
    }
}

impl<'de> Deserialize<'de> for Square {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Square::from_algebraic(&s)
            .ok_or_else(|| D::Error::custom(format!("invalid square: {}", s)))
    }
}

// ---------------------------------------------------------------------------
// Piece
// ---------------------------------------------------------------------------

/// A chess piece with kind, color, current position, and movement flag.
///
/// `pos` must always equal the board index the piece is stored under —
/// the board never holds a piece whose own position diverges from its
/// square. `has_moved` is owned by move application: it is what disallows
/// castling once the king or rook has moved, and it travels with the board
/// value so arbitrary mid-lesson positions keep their rights intact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
    pub pos: Square,
    #[serde(default)]
    pub has_moved: bool,
}

impl Piece {
    /// Creates a new piece that has not moved yet.
    pub fn new(kind: PieceKind, color: Color, pos: Square) -> Self {
        Self {
            kind,
            color,
            pos,
            has_moved: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// Represents the chess board as a flat 64-element array.
///
/// Each element is `Option<Piece>` — `None` means the square is empty.
/// Index mapping: `rank * 8 + file` (both 0-based).
///
/// `Board` is a plain value: snapshots published to subscribers are never
/// mutated in place. [`Board::place`] returns a new board; in-place `set`
/// is only meaningful on a board you own (move application works on its
/// own copy before the result is published).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    pub squares: [Option<Piece>; 64],
}

impl Default for Board {
    /// Returns an empty board.
    fn default() -> Self {
        Self {
            squares: [None; 64],
        }
    }
}

impl Board {
    /// Returns the piece at the given square, if any.
    pub fn get(&self, sq: Square) -> Option<Piece> {
        self.squares[sq.index()]
    }

    /// Sets (or clears) the piece at the given square on this board value.
    pub fn set(&mut self, sq: Square, piece: Option<Piece>) {
        self.squares[sq.index()] = piece;
    }

    /// Returns a new board with exactly one square altered. No legality
    /// checking — this is pure placement.
    pub fn place(&self, sq: Square, piece: Option<Piece>) -> Board {
        let mut next = self.clone();
        next.set(sq, piece);
        next
    }

    /// Creates the standard starting position. Every piece starts with
    /// `has_moved = false`.
    pub fn starting_position() -> Self {
        let mut board = Board::default();

        let mut place = |file: u8, rank: u8, kind: PieceKind, color: Color| {
            let sq = Square::new(file, rank);
            board.set(sq, Some(Piece::new(kind, color, sq)));
        };

        let back_rank = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];

        for (file, kind) in back_rank.iter().enumerate() {
            place(file as u8, 0, *kind, Color::White);
            place(file as u8, 7, *kind, Color::Black);
        }
        for f in 0..8 {
            place(f, 1, PieceKind::Pawn, Color::White);
            place(f, 6, PieceKind::Pawn, Color::Black);
        }

        board
    }

    /// Iterates over all pieces on the board.
    pub fn pieces(&self) -> impl Iterator<Item = Piece> + '_ {
        self.squares.iter().filter_map(|p| *p)
    }

    /// Finds the king square for the given color.
    /// Returns `None` if the king is not on the board. (Never happens in a
    /// reachable game state — kings are not capturable.)
    pub fn find_king(&self, color: Color) -> Option<Square> {
        self.pieces()
            .find(|p| p.kind == PieceKind::King && p.color == color)
            .map(|p| p.pos)
    }
}

// ---------------------------------------------------------------------------
// Move record
// ---------------------------------------------------------------------------

/// A record of a single executed move. Immutable once appended: the move
/// list is an append-only sequence with non-decreasing timestamps, and
/// replaying it from the starting position reproduces the current board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    /// Source square.
    pub from: Square,
    /// Destination square.
    pub to: Square,
    /// Pre-move snapshot of the moved piece.
    pub piece: Piece,
    /// The captured piece, if the move was a capture (for en passant this
    /// is the pawn behind the destination square).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub captured_piece: Option<Piece>,
    /// Promotion kind for a pawn reaching the far rank. Recorded so the
    /// move list stays replayable for under-promotions.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub promotion: Option<PieceKind>,
    /// Milliseconds since the Unix epoch, clamped non-decreasing.
    pub timestamp: u64,
    /// Coordinate notation (e.g. "e2e4", "e7e8=Q").
    pub notation: String,
}

impl MoveRecord {
    /// `true` if this record is a pawn double step — the only move that
    /// opens an en passant window for the immediately following ply.
    pub fn is_double_pawn_step(&self) -> bool {
        self.piece.kind == PieceKind::Pawn
            && (self.to.rank as i8 - self.from.rank as i8).abs() == 2
    }
}

impl fmt::Display for MoveRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.notation)
    }
}

// ---------------------------------------------------------------------------
// Game status
// ---------------------------------------------------------------------------

/// The game status state machine.
///
/// `waiting → playing ⇄ check → {checkmate, draw}`, with `finished`
/// reachable from any state through room-level termination (resignation,
/// disconnect, time expiry — signaled by the session provider).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Waiting,
    Playing,
    Check,
    Checkmate,
    Draw,
    Finished,
}

impl GameStatus {
    /// `true` for terminal statuses: no further moves are accepted and the
    /// only escape is `INIT_BOARD` or `JOIN_ROOM`.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            GameStatus::Checkmate | GameStatus::Draw | GameStatus::Finished
        )
    }

    /// `true` while moves may still be dispatched.
    pub fn admits_play(self) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GameStatus::Waiting => "waiting",
            GameStatus::Playing => "playing",
            GameStatus::Check => "check",
            GameStatus::Checkmate => "checkmate",
            GameStatus::Draw => "draw",
            GameStatus::Finished => "finished",
        };
        write!(f, "{}", s)
    }
}

// ---------------------------------------------------------------------------
// Theme
// ---------------------------------------------------------------------------

/// Board/UI theme. No interaction with board state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_algebraic_roundtrip() {
        for rank in 0..8u8 {
            for file in 0..8u8 {
                let sq = Square::new(file, rank);
                assert_eq!(Square::from_algebraic(&sq.to_algebraic()), Some(sq));
            }
        }
        assert_eq!(Square::from_algebraic("e4"), Some(Square::new(4, 3)));
        assert!(Square::from_algebraic("i1").is_none());
        assert!(Square::from_algebraic("e9").is_none());
        assert!(Square::from_algebraic("e").is_none());
    }

    #[test]
    fn test_square_serde_as_string() {
        let sq = Square::new(4, 3);
        assert_eq!(serde_json::to_string(&sq).unwrap(), "\"e4\"");
        let back: Square = serde_json::from_str("\"e4\"").unwrap();
        assert_eq!(back, sq);
        assert!(serde_json::from_str::<Square>("\"z9\"").is_err());
    }

    #[test]
    fn test_starting_position_piece_counts() {
        let board = Board::starting_position();
        assert_eq!(board.pieces().count(), 32);
        assert_eq!(
            board.pieces().filter(|p| p.color == Color::White).count(),
            16
        );
        assert_eq!(board.find_king(Color::White), Some(Square::new(4, 0)));
        assert_eq!(board.find_king(Color::Black), Some(Square::new(4, 7)));
        assert!(board.pieces().all(|p| !p.has_moved));
    }

    #[test]
    fn test_piece_positions_match_grid() {
        let board = Board::starting_position();
        for rank in 0..8u8 {
            for file in 0..8u8 {
                let sq = Square::new(file, rank);
                if let Some(piece) = board.get(sq) {
                    assert_eq!(piece.pos, sq);
                }
            }
        }
    }

    #[test]
    fn test_place_leaves_original_untouched() {
        let board = Board::starting_position();
        let e4 = Square::new(4, 3);
        let pawn = Piece::new(PieceKind::Pawn, Color::White, e4);

        let next = board.place(e4, Some(pawn));

        assert_eq!(board.get(e4), None);
        assert_eq!(next.get(e4), Some(pawn));
        // Only the one square differs.
        let diffs = (0..64)
            .filter(|&i| board.squares[i] != next.squares[i])
            .count();
        assert_eq!(diffs, 1);
    }

    #[test]
    fn test_double_pawn_step_detection() {
        let e2 = Square::new(4, 1);
        let e4 = Square::new(4, 3);
        let record = MoveRecord {
            from: e2,
            to: e4,
            piece: Piece::new(PieceKind::Pawn, Color::White, e2),
            captured_piece: None,
            promotion: None,
            timestamp: 0,
            notation: "e2e4".to_string(),
        };
        assert!(record.is_double_pawn_step());

        let single = MoveRecord {
            to: Square::new(4, 2),
            notation: "e2e3".to_string(),
            ..record.clone()
        };
        assert!(!single.is_double_pawn_step());
    }

    #[test]
    fn test_status_terminality() {
        assert!(GameStatus::Checkmate.is_terminal());
        assert!(GameStatus::Draw.is_terminal());
        assert!(GameStatus::Finished.is_terminal());
        assert!(GameStatus::Waiting.admits_play());
        assert!(GameStatus::Playing.admits_play());
        assert!(GameStatus::Check.admits_play());
    }
}
