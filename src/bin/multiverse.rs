// Copyright 2023 Tobin Edwards
//
//    Licensed under the Apache License, Version 2.0 (the "License");
//    you may not use this file except in compliance with the License.
//    You may obtain a copy of the License at
//
//        http://www.apache.org/licenses/LICENSE-2.0
//
//    Unless required by applicable law or agreed to in writing, software
//    distributed under the License is distributed on an "AS IS" BASIS,
//    WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//    See the License for the specific language governing permissions and
//    limitations under the License.

//! `multiverse` replays a game file and prints the boards it produced.
//!
//! **Usage:**
//! ```text
//! multiverse replay <game.json> [--json]
//! multiverse moves <game.json> --square e2 [--time 0] [--timeline 0] [--single]
//! ```
//!
//! A game file looks like this; every field is optional:
//! ```text
//! {
//!   "config": { "board_size": 8, "first_turn": "Light" },
//!   "setup": "standard",
//!   "pieces": [ { "piece": "ql", "square": "e4", "time": 0, "timeline": 0 } ],
//!   "moves": [
//!     { "from": { "square": "e2", "time": 0, "timeline": 0 },
//!       "to": { "square": "e4", "time": 0, "timeline": 0 } }
//!   ]
//! }
//! ```
//!
//! Set `RUST_LOG=debug` to trace evolutions and moves on stderr.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;

use multiverse_chess::{Game, Move, Multiverse, MultiverseConfig, Position, TmCoord};

#[derive(Parser)]
#[command(name = "multiverse", about = "Replay and inspect multiverse chess games")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply the moves of a game file and print every board.
    Replay {
        /// Path to the game file.
        game: PathBuf,
        /// Print boards as codec values instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Replay a game file, then list where a piece can move.
    Moves {
        /// Path to the game file.
        game: PathBuf,
        #[arg(long)]
        square: String,
        #[arg(long, default_value_t = 0)]
        time: u32,
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        timeline: i32,
        /// Only look one step in each direction.
        #[arg(long)]
        single: bool,
    },
}

#[derive(Debug, Default, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum Setup {
    #[default]
    Standard,
    Empty,
}

#[derive(Debug, Deserialize)]
struct Placement {
    piece: String,
    #[serde(flatten)]
    position: Position,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GameFile {
    config: MultiverseConfig,
    setup: Setup,
    pieces: Vec<Placement>,
    moves: Vec<Move>,
}

impl GameFile {
    fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    fn play(&self) -> Result<Game> {
        let mut game = match self.setup {
            Setup::Standard => Game::with_config(self.config)?,
            Setup::Empty => {
                let mut game = Game::new(self.config)?;
                game.add_empty_board(TmCoord::ROOT)?;
                game
            }
        };
        for placement in &self.pieces {
            if !game.board_exists(placement.position.tm) {
                game.add_empty_board(placement.position.tm)?;
            }
            game.add_piece(&placement.piece, placement.position, false)
                .with_context(|| format!("placing {} on {}", placement.piece, placement.position))?;
        }
        for (i, mv) in self.moves.iter().enumerate() {
            game.move_piece(mv.from, mv.to, true)
                .with_context(|| format!("move {} ({mv})", i + 1))?;
        }
        info!(boards = game.boards().count(), moves = self.moves.len(), "replayed game");
        Ok(game)
    }
}

#[derive(Serialize)]
struct Snapshot {
    tm: TmCoord,
    origin: Option<TmCoord>,
    values: Vec<Vec<u8>>,
}

fn replay(path: &Path, json: bool) -> Result<()> {
    let game = GameFile::load(path)?.play()?;
    let multiverse: &Multiverse = game.as_ref();
    if json {
        let snapshots: Vec<Snapshot> = multiverse
            .boards()
            .map(|board| Snapshot {
                tm: board.tm(),
                origin: multiverse.origin(board.tm()),
                values: board.values(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&snapshots)?);
    } else {
        for board in multiverse.boards() {
            println!("{board}");
        }
    }
    Ok(())
}

fn moves(path: &Path, square: &str, tm: TmCoord, single: bool) -> Result<()> {
    let game = GameFile::load(path)?.play()?;
    let from = game.position(square, tm.time, tm.timeline)?;
    let hints = game.move_hints(from, single)?;
    for position in hints.positions() {
        println!("{position}");
    }
    info!(%from, count = hints.len(), "listed destinations");
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match Args::parse().command {
        Command::Replay { game, json } => replay(&game, json),
        Command::Moves {
            game,
            square,
            time,
            timeline,
            single,
        } => moves(&game, &square, TmCoord::new(time, timeline), single),
    }
}
