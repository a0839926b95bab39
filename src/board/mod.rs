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

//! Multiverse chess core: chess with time travel
//!
//! A _game_ is a growing set of boards laid out along two extra axes,
//! time and timeline. Pieces move across all four axes; a move that
//! lands in the past never edits history but forks a new timeline.
//! The following features are supported:
//!
//! [x] Boards of any size from 1x1 to 26x26
//! [x] Standard opening position on 8x8 boards
//! [x] Append-only history with continuation and branching
//! [x] Parity-based allocation of new timelines
//! [x] Moves within a board, back in time and across timelines
//! [x] Move generation for twelve piece kinds in four dimensions
//! [x] Move hints as an overlay for display layers
//! [ ] Check, checkmate and turn order
//! [ ] Linked moves that fork both timelines at once
//! [ ] Persistence
//!
//! Some of the key abstractions include:
//!
//! * A `Piece` is a `PieceKind` of a given `Color` (`Light` or `Dark`).
//!   Pieces are written as two-letter acronyms (`kl`, `pd`, ...) and
//!   encode to small integers, 1..=12 for light and 21..=32 for dark.
//!   `Glyph` covers the whole value table, including empty squares and
//!   the hint markers 13 and 33.
//!
//! * A `Square` is a (file, rank) pair on an n-by-n board, named like
//!   `e4`. Conversions that can fall off the board come in two tiers:
//!   strict ones return errors, `try_*` ones return `None`.
//!
//! * A `TmCoord` is a (time, timeline) pair naming one board. A
//!   `Position` is a square on such a board, and a `DrVector` steps a
//!   position through the 4-D lattice.
//!
//! * A `Board` holds the grid for one coordinate. Boards share rows with
//!   the board they evolved from until a square is written.
//!
//! * The `Multiverse` owns every board. `evolve` is the only way a board
//!   is created during play: it copies a board one step forward, either
//!   continuing its timeline or, if that timeline has already moved on,
//!   branching into a new one.
//!
//! * The `MoveGenerator` expands seed vectors into direction families and
//!   casts them from a position, consulting an `Occupancy` oracle for
//!   what stands on each square it reaches. The multiverse is one such
//!   oracle; a closure is another.
//!
//! * `Multiverse::apply_move` executes a `Move`, sorting it into one of
//!   the `MoveKind`s and evolving the boards it touches.
//!
//! * `Game` bundles all of this behind the interface a display layer
//!   needs: read a square, place a piece, move, list destinations.
//!

use anyhow::Result;

mod config;
mod hints;
mod material;
mod moves;
mod multiverse;
mod play;
mod position;
mod slice;
mod square;

pub use config::*;
pub use hints::*;
pub use material::*;
pub use moves::*;
pub use multiverse::*;
pub use play::*;
pub use position::*;
pub use slice::*;
pub use square::*;

/// What a display layer finds at a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Contents {
    NoBoard,
    Vacant,
    Occupied(Piece),
}

impl Contents {
    /// The piece acronym, or `None` when there's no board.
    pub fn acronym(&self) -> Option<String> {
        match self {
            Contents::NoBoard => None,
            Contents::Vacant => Some(String::new()),
            Contents::Occupied(piece) => Some(piece.acronym()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Game {
    multiverse: Multiverse,
}

impl Game {
    /// A game with no boards at all.
    pub fn new(config: MultiverseConfig) -> Result<Self> {
        Ok(Self {
            multiverse: Multiverse::new(config)?,
        })
    }

    /// The standard opening with default settings.
    pub fn standard() -> Result<Self> {
        Self::with_config(MultiverseConfig::default())
    }

    /// The standard opening with the given settings.
    pub fn with_config(config: MultiverseConfig) -> Result<Self> {
        Ok(Self {
            multiverse: Multiverse::standard(config)?,
        })
    }

    /// Reconstruct a game by replaying a sequence of moves on the standard
    /// opening. Captures are allowed.
    pub fn replay(config: MultiverseConfig, moves: &[Move]) -> Result<Self> {
        let mut game = Self::with_config(config)?;
        for mv in moves {
            game.multiverse.apply_move(*mv, true)?;
        }
        Ok(game)
    }

    pub fn config(&self) -> &MultiverseConfig {
        self.multiverse.config()
    }

    /// Parses a square name into a position on this game's boards.
    pub fn position(&self, square: &str, time: u32, timeline: i32) -> Result<Position> {
        let square = Square::parse(square, self.multiverse.board_size())?;
        Ok(Position::new(square, TmCoord::new(time, timeline)))
    }

    /// What stands at `position`. A square off the board is an error, not
    /// an empty square.
    pub fn piece_at(&self, position: &Position) -> Result<Contents> {
        if !self.multiverse.contains(position.tm) {
            position.square.check(self.multiverse.board_size())?;
            return Ok(Contents::NoBoard);
        }
        let contents = match self.multiverse.piece_at(position)? {
            None => Contents::Vacant,
            Some(piece) => Contents::Occupied(piece),
        };
        Ok(contents)
    }

    /// Places a piece given by acronym, e.g. `"ql"`, on the latest board of
    /// a timeline.
    pub fn add_piece(&mut self, acronym: &str, position: Position, allow_capture: bool) -> Result<Option<Piece>> {
        let piece = Piece::from_acronym(acronym)?;
        self.multiverse.add_piece(piece, position, allow_capture)
    }

    pub fn add_empty_board(&mut self, tm: TmCoord) -> Result<BoardId> {
        self.multiverse.add_empty_board(tm)
    }

    pub fn move_piece(&mut self, from: Position, to: Position, allow_capture: bool) -> Result<MoveOutcome> {
        self.multiverse.apply_move(Move::new(from, to), allow_capture)
    }

    pub fn legal_destinations(&self, from: Position, single_step: bool) -> Result<Vec<Position>> {
        self.multiverse.legal_destinations(from, single_step)
    }

    pub fn move_hints(&self, from: Position, single_step: bool) -> Result<MoveHints> {
        self.multiverse.move_hints(from, single_step)
    }

    #[inline]
    pub fn board_exists(&self, tm: TmCoord) -> bool {
        self.multiverse.contains(tm)
    }

    pub fn boards(&self) -> impl Iterator<Item = &Board> {
        self.multiverse.boards()
    }
}

impl AsRef<Multiverse> for Game {
    fn as_ref(&self) -> &Multiverse {
        &self.multiverse
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard() -> Game {
        Game::standard().unwrap()
    }

    #[test]
    fn test_piece_at() {
        let game = standard();
        let e1 = game.position("e1", 0, 0).unwrap();
        assert_eq!(game.piece_at(&e1).unwrap(), Contents::Occupied(Piece::LK));
        assert_eq!(game.piece_at(&e1).unwrap().acronym().as_deref(), Some("kl"));
        let e4 = game.position("e4", 0, 0).unwrap();
        assert_eq!(game.piece_at(&e4).unwrap(), Contents::Vacant);
        let nowhere = game.position("e4", 0, 1).unwrap();
        assert_eq!(game.piece_at(&nowhere).unwrap(), Contents::NoBoard);
        assert_eq!(game.piece_at(&nowhere).unwrap().acronym(), None);
    }

    #[test]
    fn test_off_board_reads_fail() {
        let game = standard();
        for json in [
            r#"{"square":"z20","time":0,"timeline":0}"#,
            r#"{"square":"i1","time":0,"timeline":5}"#,
        ] {
            let far: Position = serde_json::from_str(json).unwrap();
            for err in [
                game.piece_at(&far).unwrap_err(),
                game.legal_destinations(far, false).unwrap_err(),
                game.move_hints(far, false).unwrap_err(),
            ] {
                assert!(matches!(
                    err.downcast_ref::<SquareError>(),
                    Some(SquareError::OutOfRange { size: 8, .. })
                ));
            }
        }
    }

    #[test]
    fn test_position_rejects_bad_squares() {
        let game = standard();
        let err = game.position("i9", 0, 0).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SquareError>(),
            Some(SquareError::OutOfRange { .. })
        ));
        assert!(game.position("44", 0, 0).is_err());
    }

    #[test]
    fn test_add_piece() {
        let mut game = standard();
        let e4 = game.position("e4", 0, 0).unwrap();
        assert_eq!(game.add_piece("ql", e4, false).unwrap(), None);
        assert_eq!(game.piece_at(&e4).unwrap(), Contents::Occupied(Piece::LQ));
        let err = game.add_piece("xx", e4, true).unwrap_err();
        assert!(err.downcast_ref::<CodecError>().is_some());
        let e7 = game.position("e7", 0, 0).unwrap();
        assert_eq!(game.add_piece("ql", e7, true).unwrap(), Some(Piece::DP));
    }

    #[test]
    fn test_add_piece_rejects_history() {
        let mut game = standard();
        let e2 = game.position("e2", 0, 0).unwrap();
        let e4 = game.position("e4", 0, 0).unwrap();
        game.move_piece(e2, e4, false).unwrap();
        let err = game.add_piece("qd", e4, false).unwrap_err();
        assert_eq!(
            err.downcast_ref::<MultiverseError>(),
            Some(&MultiverseError::SupersededBoard(TmCoord::ROOT))
        );
        assert_eq!(game.piece_at(&e4).unwrap(), Contents::Vacant);
        let later = game.position("e4", 1, 0).unwrap();
        assert_eq!(game.piece_at(&later).unwrap(), Contents::Occupied(Piece::LP));
    }

    #[test]
    fn test_scenario() {
        let mut game = standard();
        let e2 = game.position("e2", 0, 0).unwrap();
        let e4 = game.position("e4", 0, 0).unwrap();
        game.move_piece(e2, e4, false).unwrap();
        assert!(game.board_exists(TmCoord::new(1, 0)));

        let e7 = game.position("e7", 1, 0).unwrap();
        let e5 = game.position("e5", 0, 0).unwrap();
        let outcome = game.move_piece(e7, e5, false).unwrap();
        assert_eq!(outcome.destination, TmCoord::new(1, -1));
        assert!(game.board_exists(TmCoord::new(1, -1)));
        assert!(!game.board_exists(TmCoord::new(1, 1)));
        assert_eq!(game.boards().count(), 4);
        assert_eq!(game.piece_at(&e5).unwrap(), Contents::Vacant);
    }

    #[test]
    fn test_legal_destinations() {
        let game = standard();
        let e2 = game.position("e2", 0, 0).unwrap();
        let destinations = game.legal_destinations(e2, false).unwrap();
        assert_eq!(destinations, vec![game.position("e3", 0, 0).unwrap()]);
        let e4 = game.position("e4", 0, 0).unwrap();
        assert!(game.legal_destinations(e4, false).unwrap().is_empty());
        assert_eq!(game.move_hints(e2, false).unwrap().len(), 1);
    }

    #[test]
    fn test_replay() {
        let game = standard();
        let moves = vec![
            Move::new(game.position("e2", 0, 0).unwrap(), game.position("e4", 0, 0).unwrap()),
            Move::new(game.position("e7", 1, 0).unwrap(), game.position("e5", 1, 0).unwrap()),
            Move::new(game.position("d1", 2, 0).unwrap(), game.position("h5", 2, 0).unwrap()),
        ];
        let replayed = Game::replay(MultiverseConfig::default(), &moves).unwrap();
        let multiverse: &Multiverse = replayed.as_ref();
        assert_eq!(multiverse.len(), 4);
        assert_eq!(multiverse.max_time(0), Some(3));
        let h5 = replayed.position("h5", 3, 0).unwrap();
        assert_eq!(replayed.piece_at(&h5).unwrap(), Contents::Occupied(Piece::LQ));
    }

    #[test]
    fn test_replay_stops_on_error() {
        let game = standard();
        let moves = vec![Move::new(
            game.position("e2", 0, 0).unwrap(),
            game.position("e4", 1, 0).unwrap(),
        )];
        assert!(Game::replay(MultiverseConfig::default(), &moves).is_err());
    }
}
