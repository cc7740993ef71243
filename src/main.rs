//! chessroom command-line interface.
//!
//! The engine's presentation surfaces live in the browser; this binary is
//! the development front-end, driving the same public contract:
//!
//! ```bash
//! # Play a hotseat game in the terminal
//! chessroom play
//!
//! # List archived games
//! chessroom replay --list
//!
//! # Replay an archived game to its final position
//! chessroom replay data/archive/<id>.json.zst
//! ```

use clap::{Parser, Subcommand};

use chessroom::storage::SessionStorage;
use chessroom::terminal;

/// chessroom — chess learning platform engine.
#[derive(Parser, Debug)]
#[command(name = "chessroom")]
#[command(about = "Game state engine for a chess learning and play platform")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Play a hotseat chess game in the terminal.
    Play {
        /// Directory for profile and game archives.
        #[arg(long, default_value = "data")]
        data_dir: String,
    },

    /// Replay or list archived games.
    Replay {
        /// Archive file to replay (.json.zst).
        file: Option<String>,

        /// List all archived games instead of replaying.
        #[arg(short, long)]
        list: bool,

        /// Directory for profile and game archives.
        #[arg(long, default_value = "data")]
        data_dir: String,
    },
}

fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play { data_dir } => {
            terminal::run_terminal_game(&data_dir);
            Ok(())
        }

        Commands::Replay { file, list, data_dir } => {
            let storage = SessionStorage::new(&data_dir)?;

            if list {
                let archives = storage
                    .list_archives()
                    .map_err(|e| std::io::Error::other(e.to_string()))?;
                if archives.is_empty() {
                    println!("No archived games in {}", storage.base_dir().display());
                }
                for path in archives {
                    println!("{}", path.display());
                }
                return Ok(());
            }

            let Some(file) = file else {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "pass an archive file or --list",
                ));
            };

            let archive = storage
                .load_archive(&file)
                .map_err(|e| std::io::Error::other(e.to_string()))?;
            terminal::print_archive_replay(&archive).map_err(std::io::Error::other)
        }
    }
}
