//! Game state machine for the chessroom engine.
//!
//! This module owns the aggregate [`GameState`] and the command reducer
//! that is its only mutation path. External actors — board UI, tutorial
//! flows, a future synchronization layer — describe what they want as a
//! [`Command`]; [`reduce`] validates it against the current snapshot,
//! delegates legality to [`crate::movegen`] and application to
//! [`crate::apply`], and returns the next snapshot. A rejected command
//! returns a typed [`Rejection`] and provably changes nothing.

use crate::apply;
use crate::movegen;
use crate::room::Room;
use crate::storage;
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

// ---------------------------------------------------------------------------
// GameState
// ---------------------------------------------------------------------------

/// The aggregate root: everything a presentation surface can observe.
///
/// Snapshots are immutable once published — the reducer clones, edits the
/// copy, and hands it back; nothing ever mutates a snapshot a subscriber
/// already holds. The tutorial/settings fields form a separate
/// sub-aggregate with a process-wide lifecycle: they survive `INIT_BOARD`
/// and `LEAVE_ROOM` (see [`crate::storage::Profile`]).
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    // Board state
    pub board: Board,
    pub current_player: Color,
    pub game_status: GameStatus,
    pub moves: Vec<MoveRecord>,

    // Room state
    pub current_room: Option<Room>,
    pub player_color: Option<Color>,
    pub player_name: Option<String>,

    // Interface state
    pub selected_square: Option<Square>,
    pub possible_moves: BTreeSet<Square>,
    pub is_in_check: bool,

    // Learning state
    pub tutorial_progress: u8,
    pub completed_lessons: Vec<String>,

    // Settings
    pub show_coordinates: bool,
    pub play_sound: bool,
    pub theme: Theme,
}

impl GameState {
    /// Creates the session-start state: standard starting position,
    /// `waiting` status, empty history, no room.
    pub fn new() -> Self {
        Self {
            board: Board::starting_position(),
            current_player: Color::White,
            game_status: GameStatus::Waiting,
            moves: Vec::new(),
            current_room: None,
            player_color: None,
            player_name: None,
            selected_square: None,
            possible_moves: BTreeSet::new(),
            is_in_check: false,
            tutorial_progress: 0,
            completed_lessons: Vec::new(),
            show_coordinates: true,
            play_sound: true,
            theme: Theme::Light,
        }
    }

    /// Resets the board sub-state in place: fresh starting position,
    /// White to move, cleared history and selection. Room binding and the
    /// tutorial/settings sub-aggregate are deliberately untouched.
    fn reset_board_state(&mut self) {
        self.board = Board::starting_position();
        self.current_player = Color::White;
        self.game_status = GameStatus::Waiting;
        self.moves.clear();
        self.selected_square = None;
        self.possible_moves.clear();
        self.is_in_check = false;
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// A toggleable boolean setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Setting {
    ShowCoordinates,
    PlaySound,
}

/// The closed command set — the engine's single mutation vocabulary.
///
/// Commands serialize with a `type` tag in the platform's historical
/// SCREAMING_SNAKE_CASE action names, so a synchronization layer can carry
/// them verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    /// Reset the board sub-state. Tutorial progress and settings survive.
    InitBoard,
    /// Select a square; recomputes the highlighted destination set.
    SelectSquare { square: Square },
    /// Move a piece. `promotion` picks the replacement kind when a pawn
    /// reaches the far rank (queen if unspecified).
    MovePiece {
        from: Square,
        to: Square,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        promotion: Option<PieceKind>,
    },
    /// Bind this client to a room under the given identity and color.
    #[serde(rename_all = "camelCase")]
    JoinRoom {
        room: Room,
        player_name: String,
        color: Color,
    },
    /// Unbind from the current room and discard the board sub-state.
    LeaveRoom,
    /// Replace the current room descriptor with a provider update.
    UpdateRoom { room: Room },
    /// Advance the tutorial progress bar (0–100, never decreases).
    UpdateTutorialProgress { progress: u8 },
    /// Mark a lesson as completed. Idempotent.
    #[serde(rename_all = "camelCase")]
    CompleteLesson { lesson_id: String },
    /// Flip a boolean setting.
    ToggleSetting { setting: Setting },
    /// Replace the theme.
    SetTheme { theme: Theme },
}

impl Command {
    /// The command's wire/action name, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Command::InitBoard => "INIT_BOARD",
            Command::SelectSquare { .. } => "SELECT_SQUARE",
            Command::MovePiece { .. } => "MOVE_PIECE",
            Command::JoinRoom { .. } => "JOIN_ROOM",
            Command::LeaveRoom => "LEAVE_ROOM",
            Command::UpdateRoom { .. } => "UPDATE_ROOM",
            Command::UpdateTutorialProgress { .. } => "UPDATE_TUTORIAL_PROGRESS",
            Command::CompleteLesson { .. } => "COMPLETE_LESSON",
            Command::ToggleSetting { .. } => "TOGGLE_SETTING",
            Command::SetTheme { .. } => "SET_THEME",
        }
    }
}

// ---------------------------------------------------------------------------
// Rejection
// ---------------------------------------------------------------------------

/// Why a command was refused. The state is untouched in every case; the
/// reason lets callers give feedback instead of silently ignoring input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// `MOVE_PIECE` from a square with no piece on it.
    #[error("no piece on {0}")]
    EmptySquare(Square),

    /// The piece on the source square belongs to the other side.
    #[error("the piece on {square} belongs to {owner}; it is {turn}'s turn")]
    NotYourPiece {
        square: Square,
        owner: Color,
        turn: Color,
    },

    /// The destination is not in the legal set (including moves that
    /// would leave the mover's own king in check).
    #[error("{from} to {to} is not a legal move")]
    IllegalDestination { from: Square, to: Square },

    /// The game is in a terminal status; only `INIT_BOARD` or `JOIN_ROOM`
    /// escape it.
    #[error("no moves are accepted while the game is {0}")]
    GameOver(GameStatus),
}

// ---------------------------------------------------------------------------
// Reducer
// ---------------------------------------------------------------------------

/// Computes the next state for a command.
///
/// Total for structurally valid input: it never panics, and `Err` means
/// the transition was refused with nothing applied — board, turn, and
/// history are exactly as before. Transitions are all-or-nothing.
pub fn reduce(state: &GameState, command: &Command) -> Result<GameState, Rejection> {
    match command {
        Command::InitBoard => {
            let mut next = state.clone();
            next.reset_board_state();
            Ok(next)
        }

        Command::SelectSquare { square } => Ok(select_square(state, *square)),

        Command::MovePiece { from, to, promotion } => {
            move_piece(state, *from, *to, *promotion)
        }

        Command::JoinRoom { room, player_name, color } => {
            let mut next = state.clone();
            next.current_room = Some(room.clone());
            next.player_name = Some(player_name.clone());
            next.player_color = Some(*color);
            // A fresh room always starts unplayed from this client's
            // perspective, whatever the previous status was.
            next.game_status = GameStatus::Waiting;
            Ok(next)
        }

        Command::LeaveRoom => {
            let mut next = state.clone();
            next.current_room = None;
            next.player_name = None;
            next.player_color = None;
            next.reset_board_state();
            Ok(next)
        }

        Command::UpdateRoom { room } => {
            let mut next = state.clone();
            // A room the provider reports as finished (resignation,
            // disconnect, time expiry) terminates the local game from any
            // state. Every other status stays engine-computed.
            if room.status == GameStatus::Finished {
                next.game_status = GameStatus::Finished;
                next.selected_square = None;
                next.possible_moves.clear();
            }
            next.current_room = Some(room.clone());
            Ok(next)
        }

        Command::UpdateTutorialProgress { progress } => {
            let mut next = state.clone();
            next.tutorial_progress = next.tutorial_progress.max((*progress).min(100));
            Ok(next)
        }

        Command::CompleteLesson { lesson_id } => {
            let mut next = state.clone();
            if !next.completed_lessons.iter().any(|l| l == lesson_id) {
                next.completed_lessons.push(lesson_id.clone());
            }
            Ok(next)
        }

        Command::ToggleSetting { setting } => {
            let mut next = state.clone();
            match setting {
                Setting::ShowCoordinates => next.show_coordinates = !next.show_coordinates,
                Setting::PlaySound => next.play_sound = !next.play_sound,
            }
            Ok(next)
        }

        Command::SetTheme { theme } => {
            let mut next = state.clone();
            next.theme = *theme;
            Ok(next)
        }
    }
}

/// Selection: an own piece selects and highlights its legal destinations;
/// anything else (empty square, opponent piece) clears the selection.
/// Destinations are only computed while the status admits play — after
/// the game ends the highlight set is empty, matching what `MOVE_PIECE`
/// would accept.
fn select_square(state: &GameState, square: Square) -> GameState {
    let mut next = state.clone();
    match state.board.get(square) {
        Some(piece) if piece.color == state.current_player => {
            next.selected_square = Some(square);
            next.possible_moves = if state.game_status.admits_play() {
                movegen::legal_destinations(&state.board, square, &state.moves)
            } else {
                BTreeSet::new()
            };
        }
        _ => {
            next.selected_square = None;
            next.possible_moves.clear();
        }
    }
    next
}

fn move_piece(
    state: &GameState,
    from: Square,
    to: Square,
    promotion: Option<PieceKind>,
) -> Result<GameState, Rejection> {
    if state.game_status.is_terminal() {
        return Err(Rejection::GameOver(state.game_status));
    }

    let piece = state.board.get(from).ok_or(Rejection::EmptySquare(from))?;
    if piece.color != state.current_player {
        return Err(Rejection::NotYourPiece {
            square: from,
            owner: piece.color,
            turn: state.current_player,
        });
    }

    if !movegen::legal_destinations(&state.board, from, &state.moves).contains(&to) {
        return Err(Rejection::IllegalDestination { from, to });
    }

    // Clamp the timestamp so the history stays non-decreasing even if the
    // wall clock steps backwards.
    let timestamp = state
        .moves
        .last()
        .map_or(0, |m| m.timestamp)
        .max(storage::now_millis());

    let (board, record) = apply::apply_move(&state.board, from, to, promotion, timestamp);

    let mut next = state.clone();
    next.board = board;
    next.moves.push(record);
    next.current_player = state.current_player.opponent();
    next.game_status = movegen::game_status_for(&next.board, next.current_player, &next.moves);
    next.is_in_check = movegen::is_in_check(&next.board, next.current_player);
    next.selected_square = None;
    next.possible_moves.clear();
    Ok(next)
}
