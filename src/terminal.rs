//! Terminal front-end for the chessroom engine.
//!
//! A thin interactive consumer of [`crate::session::GameSession`]: it
//! drives the engine exclusively through dispatched commands and the read
//! selectors, exactly as the browser board does. Supports:
//!
//! - Colored board display with selection/destination highlighting
//! - Interactive move input (`e2e4`, `e7e8=Q`)
//! - Square selection to preview legal destinations
//! - Room-level resignation
//! - Archiving the finished game to session storage

use colored::Colorize;
use std::collections::BTreeSet;
use std::io::{self, Write};

use crate::game::{Command, GameState};
use crate::room::Room;
use crate::session::GameSession;
use crate::storage::{Profile, SessionStorage};
use crate::types::*;

/// Renders a board to the terminal, highlighting the selected square and
/// its legal destinations.
///
/// The board is displayed from White's perspective (rank 8 at top).
pub fn print_board_grid(
    board: &Board,
    selected: Option<Square>,
    targets: &BTreeSet<Square>,
    show_coordinates: bool,
) {
    println!();
    println!("  +---+---+---+---+---+---+---+---+");

    for rank in (0..8u8).rev() {
        if show_coordinates {
            print!("{} ", rank + 1);
        } else {
            print!("  ");
        }
        for file in 0..8u8 {
            let sq = Square::new(file, rank);
            let is_dark_square = (file + rank) % 2 == 0;

            let cell = match board.get(sq) {
                Some(piece) => {
                    let symbol = piece_letter(piece).to_string();
                    if targets.contains(&sq) {
                        symbol.red().bold().to_string() // capturable
                    } else if selected == Some(sq) {
                        symbol.yellow().bold().to_string()
                    } else if piece.color == Color::White {
                        symbol.white().bold().to_string()
                    } else {
                        symbol.blue().bold().to_string()
                    }
                }
                None => {
                    if targets.contains(&sq) {
                        "•".green().to_string()
                    } else if is_dark_square {
                        "·".dimmed().to_string()
                    } else {
                        " ".to_string()
                    }
                }
            };

            print!("| {} ", cell);
        }
        println!("|");
        println!("  +---+---+---+---+---+---+---+---+");
    }
    if show_coordinates {
        println!("    a   b   c   d   e   f   g   h");
    }
    println!();
}

/// Renders the board of a state snapshot, with its current selection.
pub fn print_board(state: &GameState) {
    print_board_grid(
        &state.board,
        state.selected_square,
        &state.possible_moves,
        state.show_coordinates,
    );
}

/// One-letter piece symbol: uppercase for White, lowercase for Black.
fn piece_letter(piece: Piece) -> char {
    let c = piece.kind.letter();
    match piece.color {
        Color::White => c,
        Color::Black => c.to_ascii_lowercase(),
    }
}

/// Prints the status bar (turn, game status, room).
pub fn print_status(state: &GameState) {
    let turn_str = match state.current_player {
        Color::White => "White".white().bold(),
        Color::Black => "Black".blue().bold(),
    };
    let move_number = state.moves.len() / 2 + 1;

    print!("Move {} — {} to play", move_number, turn_str);
    if state.is_in_check {
        print!("  {}", "CHECK".red().bold());
    }
    print!("  [{}]", state.game_status);
    if let Some(room) = &state.current_room {
        print!("  room: {}", room.name);
    }
    println!();
    println!();
}

/// Prints the final line when a game has reached a terminal status.
pub fn print_game_result(state: &GameState) {
    let headline = match state.game_status {
        GameStatus::Checkmate => {
            // The side that just moved delivered mate.
            format!("Checkmate — {} wins", state.current_player.opponent())
        }
        GameStatus::Draw => "Draw".to_string(),
        GameStatus::Finished => "Game finished".to_string(),
        other => format!("Game over ({})", other),
    };
    println!();
    println!("{}", "═══════════════════════════════════".yellow());
    println!("  {}", headline.yellow().bold());
    println!("{}", "═══════════════════════════════════".yellow());
    println!();
}

/// Prints the move history.
pub fn print_history(state: &GameState) {
    if state.moves.is_empty() {
        println!("No moves yet.");
        return;
    }

    println!("{}", "Move history:".yellow().bold());
    for (i, record) in state.moves.iter().enumerate() {
        println!("  {}. {} {}", i + 1, record.piece.color, record.notation);
    }
    println!();
}

/// Prints available commands.
pub fn print_help() {
    println!("{}", "Commands:".yellow().bold());
    println!("  {}       - make a move (append =Q/R/B/N to promote)", "e2e4".green());
    println!("  {}  - preview legal moves from a square", "select e2".green());
    println!("  {}      - show the board", "board".green());
    println!("  {}    - show the move history", "history".green());
    println!("  {}     - resign the game", "resign".green());
    println!("  {}       - show this help", "help".green());
    println!("  {}       - leave without resigning", "quit".green());
    println!();
}

/// Runs the interactive hotseat game.
///
/// Two players alternate on one terminal. The loop only talks to the
/// engine through `dispatch` and the selectors; at game end the finished
/// game is archived to `data_dir`.
pub fn run_terminal_game(data_dir: &str) {
    println!();
    println!("{}", "╔═══════════════════════════════════════╗".cyan());
    println!("{}", "║        chessroom — hotseat play       ║".cyan());
    println!("{}", "╚═══════════════════════════════════════╝".cyan());
    println!();

    let storage = match SessionStorage::new(data_dir) {
        Ok(storage) => Some(storage),
        Err(e) => {
            log::warn!("Session storage unavailable: {e}; playing without persistence");
            None
        }
    };

    let profile: Profile = storage
        .as_ref()
        .and_then(|s| s.load_profile().ok().flatten())
        .unwrap_or_default();
    let mut session = GameSession::with_profile(&profile);

    // Hotseat play still goes through a room, so resignation and archiving
    // behave exactly as they would in multiplayer.
    let mut room = Room::new("hotseat");
    room.seat_player(Color::White, "White");
    room.seat_player(Color::Black, "Black");
    let _ = session.dispatch(Command::JoinRoom {
        room,
        player_name: "White".to_string(),
        color: Color::White,
    });

    print_help();
    print_board(session.state());
    print_status(session.state());

    loop {
        if session.status().is_terminal() {
            finish_game(&session, storage.as_ref());
            break;
        }

        let prompt = match session.state().current_player {
            Color::White => "White".white().bold(),
            Color::Black => "Black".blue().bold(),
        };
        print!("{} > ", prompt);
        let _ = io::stdout().flush();

        let mut input = String::new();
        if io::stdin().read_line(&mut input).is_err() || input.is_empty() {
            println!("Input closed — leaving.");
            break;
        }
        let input = input.trim().to_lowercase();
        if input.is_empty() {
            continue;
        }

        match input.as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => print_help(),
            "board" | "b" => {
                print_board(session.state());
                print_status(session.state());
            }
            "history" => print_history(session.state()),
            "resign" | "r" => {
                // Resignation is a room-level termination.
                if let Some(mut room) = session.state().current_room.clone() {
                    room.status = GameStatus::Finished;
                    let _ = session.dispatch(Command::UpdateRoom { room });
                }
                finish_game(&session, storage.as_ref());
                break;
            }
            _ => {
                if let Some(rest) = input
                    .strip_prefix("select ")
                    .or_else(|| input.strip_prefix("sel "))
                {
                    handle_select(&mut session, rest.trim());
                } else if let Some((from, to, promotion)) = parse_move_input(&input) {
                    handle_move(&mut session, from, to, promotion);
                } else {
                    println!(
                        "Unknown command '{}' — type {} for the command list.",
                        input,
                        "help".green()
                    );
                }
            }
        }
    }
}

fn handle_select(session: &mut GameSession, square: &str) {
    let Some(square) = Square::from_algebraic(square) else {
        println!("{}: '{}' is not a square", "Error".red().bold(), square);
        return;
    };
    // SelectSquare is total; the highlight set lands in the snapshot.
    let _ = session.dispatch(Command::SelectSquare { square });
    let state = session.state();
    if state.selected_square.is_some() {
        print_board(state);
        println!(
            "{} legal move(s) from {}",
            state.possible_moves.len(),
            square
        );
    } else {
        println!("Nothing to select on {}.", square);
    }
    println!();
}

fn handle_move(
    session: &mut GameSession,
    from: Square,
    to: Square,
    promotion: Option<PieceKind>,
) {
    match session.dispatch(Command::MovePiece { from, to, promotion }) {
        Ok(snapshot) => {
            print_board(&snapshot);
            print_status(&snapshot);
        }
        Err(rejection) => {
            println!("{}: {}", "Illegal move".red().bold(), rejection);
        }
    }
}

fn finish_game(session: &GameSession, storage: Option<&SessionStorage>) {
    print_game_result(session.state());
    print_history(session.state());

    if let Some(storage) = storage {
        if !session.move_history().is_empty() {
            if let Err(e) = storage.archive_game(session.state()) {
                log::error!("Failed to archive game: {e}");
            }
        }
        if let Err(e) = storage.save_profile(&session.profile()) {
            log::error!("Failed to save profile: {e}");
        }
    }
}

/// Parses a move input string like "e2e4", "e2 e4", "e7e8q" or "e7e8=q".
pub fn parse_move_input(input: &str) -> Option<(Square, Square, Option<PieceKind>)> {
    let input = input.replace([' ', '='], "");

    if input.len() < 4 || input.len() > 5 {
        return None;
    }

    let from = Square::from_algebraic(&input[0..2])?;
    let to = Square::from_algebraic(&input[2..4])?;

    let promotion = if input.len() == 5 {
        let kind = PieceKind::from_letter(input.chars().nth(4)?.to_ascii_uppercase())?;
        match kind {
            PieceKind::Queen | PieceKind::Rook | PieceKind::Bishop | PieceKind::Knight => {
                Some(kind)
            }
            _ => return None,
        }
    } else {
        None
    };

    Some((from, to, promotion))
}

/// Replays an archived game and prints its final position and history.
pub fn print_archive_replay(archive: &crate::storage::GameArchive) -> Result<(), String> {
    let board = archive.replay().map_err(|e| e.to_string())?;

    println!(
        "Archive {} — {} move(s), status {}",
        archive.id,
        archive.move_count(),
        archive.status
    );
    print_board_grid(&board, None, &BTreeSet::new(), true);
    for (i, record) in archive.moves.iter().enumerate() {
        println!("  {}. {} {}", i + 1, record.piece.color, record.notation);
    }
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_move_normal() {
        let (from, to, promo) = parse_move_input("e2e4").unwrap();
        assert_eq!(from, Square::from_algebraic("e2").unwrap());
        assert_eq!(to, Square::from_algebraic("e4").unwrap());
        assert_eq!(promo, None);
    }

    #[test]
    fn test_parse_move_promotion() {
        let (_, to, promo) = parse_move_input("e7e8q").unwrap();
        assert_eq!(to, Square::from_algebraic("e8").unwrap());
        assert_eq!(promo, Some(PieceKind::Queen));

        let (_, _, promo) = parse_move_input("e7e8=n").unwrap();
        assert_eq!(promo, Some(PieceKind::Knight));
    }

    #[test]
    fn test_parse_move_with_space() {
        let (from, to, _) = parse_move_input("e2 e4").unwrap();
        assert_eq!(from, Square::from_algebraic("e2").unwrap());
        assert_eq!(to, Square::from_algebraic("e4").unwrap());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse_move_input("abc").is_none());
        assert!(parse_move_input("z9z9").is_none());
        assert!(parse_move_input("e2e4x").is_none());
        assert!(parse_move_input("e7e8k").is_none(), "cannot promote to a king");
    }
}
