//! Persistent storage for the chessroom engine.
//!
//! # Storage Strategy
//!
//! Two kinds of data survive a session, with different lifecycles:
//!
//! - **Profile** (`profile.json`): the room-independent sub-aggregate —
//!   tutorial progress, completed lessons, settings. Saved uncompressed as
//!   plain JSON so the file stays hand-inspectable; it is tiny and written
//!   often.
//! - **Game archives** (`archive/*.json.zst`): finished games. The archive
//!   stores the complete move record list (order, piece snapshots,
//!   timestamps) plus room metadata, serialized as JSON and compressed with
//!   zstd level 19. The board itself is *not* stored: replaying the move
//!   list from the starting position reconstructs it exactly, and the
//!   replay validates every record's piece snapshot so a corrupt archive
//!   fails loudly instead of silently diverging.
//!
//! Wall-clock helpers live here as well; move timestamps are clamped
//! non-decreasing by the reducer, not by the clock.

use crate::apply::{self, ReplayError};
use crate::game::GameState;
use crate::types::{Board, GameStatus, MoveRecord, Theme};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uuid::Uuid;

/// zstd compression level for archives (19 = near-maximum, the data is small).
const ZSTD_COMPRESSION_LEVEL: i32 = 19;

/// File extension for compressed game archives.
const ARCHIVE_EXT: &str = "json.zst";

/// Storage failure taxonomy.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("storage serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("archive replay failed: {0}")]
    Replay(#[from] ReplayError),
}

// ---------------------------------------------------------------------------
// Clock helpers
// ---------------------------------------------------------------------------

/// Current Unix timestamp in seconds.
pub fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Current Unix timestamp in milliseconds (move-record resolution).
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Profile — the room-independent sub-aggregate
// ---------------------------------------------------------------------------

/// The fields of [`GameState`] that outlive any single board: learning
/// progress and settings. `INIT_BOARD` and `LEAVE_ROOM` never touch them;
/// this is the unit persisted across application runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub tutorial_progress: u8,
    pub completed_lessons: Vec<String>,
    pub show_coordinates: bool,
    pub play_sound: bool,
    pub theme: Theme,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            tutorial_progress: 0,
            completed_lessons: Vec::new(),
            show_coordinates: true,
            play_sound: true,
            theme: Theme::Light,
        }
    }
}

impl Profile {
    /// Extracts the persistent sub-aggregate from a state snapshot.
    pub fn from_state(state: &GameState) -> Self {
        Self {
            tutorial_progress: state.tutorial_progress,
            completed_lessons: state.completed_lessons.clone(),
            show_coordinates: state.show_coordinates,
            play_sound: state.play_sound,
            theme: state.theme,
        }
    }

    /// Writes the sub-aggregate into a state (used when restoring a
    /// session at startup).
    pub fn apply_to(&self, state: &mut GameState) {
        state.tutorial_progress = self.tutorial_progress;
        state.completed_lessons = self.completed_lessons.clone();
        state.show_coordinates = self.show_coordinates;
        state.play_sound = self.play_sound;
        state.theme = self.theme;
    }
}

// ---------------------------------------------------------------------------
// GameArchive — a finished game on disk
// ---------------------------------------------------------------------------

/// A persisted finished game: room metadata plus the full move record
/// list. Lossless with respect to the move history — order, piece
/// snapshots, captures, promotions, and timestamps all round-trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameArchive {
    /// Archive identifier (room id when the game was played in a room).
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub room_name: Option<String>,
    /// Status at archive time.
    pub status: GameStatus,
    /// The complete move list in dispatch order.
    pub moves: Vec<MoveRecord>,
    /// Unix timestamp (seconds) when the archive was written.
    pub saved_at: u64,
}

impl GameArchive {
    /// Builds an archive from a state snapshot.
    pub fn from_state(state: &GameState) -> Self {
        Self {
            id: state
                .current_room
                .as_ref()
                .map(|r| r.id.clone())
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            room_name: state.current_room.as_ref().map(|r| r.name.clone()),
            status: state.game_status,
            moves: state.moves.clone(),
            saved_at: unix_timestamp(),
        }
    }

    /// Number of half-moves in the archived game.
    pub fn move_count(&self) -> usize {
        self.moves.len()
    }

    /// Replays the archived move list from the starting position and
    /// returns the final board. Fails on a corrupt or tampered record.
    pub fn replay(&self) -> Result<Board, ReplayError> {
        apply::replay(&self.moves)
    }
}

// ---------------------------------------------------------------------------
// SessionStorage — file-based persistence manager
// ---------------------------------------------------------------------------

/// Manages persistent session data on disk.
///
/// Directory layout:
/// ```text
/// <base_dir>/
///   profile.json      # tutorial progress + settings
///   archive/          # finished, zstd-compressed games (.json.zst)
/// ```
pub struct SessionStorage {
    base_dir: PathBuf,
    archive_dir: PathBuf,
}

impl SessionStorage {
    /// Creates a `SessionStorage` rooted at the given directory,
    /// creating the directory structure if needed.
    pub fn new(base_dir: impl AsRef<Path>) -> io::Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let archive_dir = base_dir.join("archive");
        fs::create_dir_all(&archive_dir)?;

        log::info!("Session storage initialized at {}", base_dir.display());

        Ok(Self {
            base_dir,
            archive_dir,
        })
    }

    /// Returns the base storage directory path.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn profile_path(&self) -> PathBuf {
        self.base_dir.join("profile.json")
    }

    fn archive_path(&self, id: &str) -> PathBuf {
        self.archive_dir.join(format!("{}.{}", id, ARCHIVE_EXT))
    }

    /// Persists the profile sub-aggregate.
    pub fn save_profile(&self, profile: &Profile) -> Result<(), StorageError> {
        let json = serde_json::to_vec_pretty(profile)?;
        fs::write(self.profile_path(), json)?;
        log::debug!("Profile saved to {}", self.profile_path().display());
        Ok(())
    }

    /// Loads the profile, or `None` if none has been saved yet.
    pub fn load_profile(&self) -> Result<Option<Profile>, StorageError> {
        let path = self.profile_path();
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read(path)?;
        Ok(Some(serde_json::from_slice(&data)?))
    }

    /// Archives a finished game (compressed) and returns the file path.
    pub fn archive_game(&self, state: &GameState) -> Result<PathBuf, StorageError> {
        let archive = GameArchive::from_state(state);
        let json = serde_json::to_vec(&archive)?;
        let compressed = zstd::encode_all(&json[..], ZSTD_COMPRESSION_LEVEL)?;

        let path = self.archive_path(&archive.id);
        fs::write(&path, &compressed)?;
        log::info!(
            "Game archived to {} ({} moves, {} bytes compressed)",
            path.display(),
            archive.move_count(),
            compressed.len()
        );
        Ok(path)
    }

    /// Loads and decompresses a game archive from a path.
    pub fn load_archive(&self, path: impl AsRef<Path>) -> Result<GameArchive, StorageError> {
        let compressed = fs::read(path)?;
        let json = zstd::decode_all(&compressed[..])?;
        Ok(serde_json::from_slice(&json)?)
    }

    /// Lists all archived game files, sorted by file name.
    pub fn list_archives(&self) -> Result<Vec<PathBuf>, StorageError> {
        let mut paths: Vec<PathBuf> = fs::read_dir(&self.archive_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| p.to_string_lossy().ends_with(ARCHIVE_EXT))
            .collect();
        paths.sort();
        Ok(paths)
    }
}
