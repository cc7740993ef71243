//! # chessroom — game state engine for a chess learning platform
//!
//! chessroom is the authoritative model of a chess match for a
//! browser-based learning and play platform: board representation, full
//! move legality, a command-driven state machine, and room/session
//! binding. Presentation surfaces (board renderer, tutorials, lobby,
//! navigation) read published snapshots and dispatch commands; nothing
//! mutates game state any other way.
//!
//! ## Architecture
//!
//! - [`types`] — board, pieces, squares, move records, status vocabulary.
//! - [`movegen`] — legal destinations under full chess rules (castling,
//!   en passant, promotion, self-check exclusion) and status
//!   classification (check / checkmate / draw).
//! - [`apply`] — pure move application and deterministic replay.
//! - [`game`] — the [`game::GameState`] aggregate, the closed
//!   [`game::Command`] set, and the exhaustive reducer.
//! - [`room`] — room descriptors from the session provider.
//! - [`session`] — the explicit per-game context: dispatch entry point,
//!   snapshot subscriptions, read selectors.
//! - [`storage`] — profile persistence and compressed game archives.
//! - [`terminal`] — a CLI consumer of the engine (hotseat play, replay).
//!
//! ## Example
//!
//! ```
//! use chessroom::game::Command;
//! use chessroom::session::GameSession;
//! use chessroom::types::Square;
//!
//! let mut session = GameSession::new();
//! session.subscribe(|snapshot| {
//!     println!("{} move(s) played", snapshot.moves.len());
//! });
//!
//! let e2 = Square::from_algebraic("e2").unwrap();
//! let e4 = Square::from_algebraic("e4").unwrap();
//! session
//!     .dispatch(Command::MovePiece { from: e2, to: e4, promotion: None })
//!     .expect("opening move is legal");
//! ```

pub mod apply;
pub mod game;
pub mod movegen;
pub mod room;
pub mod session;
pub mod storage;
pub mod terminal;
pub mod types;
