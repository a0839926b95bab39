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

use anyhow::Result;
use std::collections::{BTreeMap, HashMap};
use std::ops::Index;
use thiserror::Error;
use tracing::debug;

use super::config::MultiverseConfig;
use super::material::{Color, Piece};
use super::moves::{MoveGenerator, Occupancy, Probe};
use super::position::{Position, TmCoord};
use super::slice::{Board, BoardId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MultiverseError {
    #[error("No board exists at {0}")]
    UnknownCoordinate(TmCoord),
    #[error("A board already exists at {0}")]
    CoordinateOccupied(TmCoord),
    #[error("Cannot add a {found}x{found} board to a multiverse of {expected}x{expected} boards")]
    SizeMismatch { expected: usize, found: usize },
    #[error("Board at {0} has already been evolved and can't be edited")]
    SupersededBoard(TmCoord),
    #[error("Board at {0} is at the end of time and can't be evolved")]
    TimeOverflow(TmCoord),
}
use MultiverseError::*;

/// Every board ever created, indexed by time-timeline coordinate.
///
/// Boards are only ever appended. Evolving a board copies it to a fresh
/// coordinate, either the next time step on its own timeline or the first
/// board of a newly allocated timeline, and leaves the original untouched.
#[derive(Debug, Clone)]
pub struct Multiverse {
    config: MultiverseConfig,
    boards: Vec<Board>,
    coords: HashMap<TmCoord, BoardId>,
    max_times: BTreeMap<i32, u32>,
    max_positive: i32,
    min_negative: i32,
}

impl Multiverse {
    /// An empty multiverse with no boards.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid.
    pub fn new(config: MultiverseConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            boards: Vec::new(),
            coords: HashMap::new(),
            max_times: BTreeMap::new(),
            max_positive: 0,
            min_negative: 0,
        })
    }

    /// A multiverse holding the standard opening at (0, 0).
    pub fn standard(config: MultiverseConfig) -> Result<Self> {
        let mut multiverse = Self::new(config)?;
        multiverse.default_setup()?;
        Ok(multiverse)
    }

    /// Adds the standard opening position at (0, 0).
    ///
    /// # Errors
    ///
    /// Fails unless boards are 8x8 and (0, 0) is free.
    pub fn default_setup(&mut self) -> Result<BoardId> {
        let mut board = Board::empty(self.config.board_size, TmCoord::ROOT)?;
        board.default_setup()?;
        self.insert_root(board)
    }

    /// Adds a board with no pieces at `tm`.
    pub fn add_empty_board(&mut self, tm: TmCoord) -> Result<BoardId> {
        let board = Board::empty(self.config.board_size, tm)?;
        self.insert_root(board)
    }

    /// Takes ownership of a board that was built outside the multiverse and
    /// indexes it at its own coordinate.
    ///
    /// # Errors
    ///
    /// * `MultiverseError::CoordinateOccupied` if a board already exists there.
    /// * `MultiverseError::SizeMismatch` if the board has the wrong size.
    pub fn insert_root(&mut self, board: Board) -> Result<BoardId> {
        if board.size() != self.config.board_size {
            return Err(SizeMismatch {
                expected: self.config.board_size,
                found: board.size(),
            }
            .into());
        }
        if self.contains(board.tm()) {
            return Err(CoordinateOccupied(board.tm()).into());
        }
        Ok(self.push(board))
    }

    #[inline]
    pub fn config(&self) -> &MultiverseConfig {
        &self.config
    }

    #[inline]
    pub fn board_size(&self) -> usize {
        self.config.board_size
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.boards.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }

    #[inline]
    pub fn lookup(&self, tm: TmCoord) -> Option<BoardId> {
        self.coords.get(&tm).copied()
    }

    #[inline]
    pub fn contains(&self, tm: TmCoord) -> bool {
        self.coords.contains_key(&tm)
    }

    #[inline]
    pub fn get(&self, tm: TmCoord) -> Option<&Board> {
        self.lookup(tm).map(|id| &self.boards[id.value()])
    }

    #[inline]
    pub fn board(&self, id: BoardId) -> Option<&Board> {
        self.boards.get(id.value())
    }

    /// All boards in creation order.
    pub fn boards(&self) -> impl Iterator<Item = &Board> {
        self.boards.iter()
    }

    /// The furthest time reached on `timeline`, if it has any boards.
    #[inline]
    pub fn max_time(&self, timeline: i32) -> Option<u32> {
        self.max_times.get(&timeline).copied()
    }

    /// Timelines holding at least one board, lowest first.
    pub fn timelines(&self) -> impl Iterator<Item = i32> + '_ {
        self.max_times.keys().copied()
    }

    /// The piece at a position, `None` for an empty square.
    ///
    /// # Errors
    ///
    /// * `SquareError::OutOfRange` if the square is off the board.
    /// * `MultiverseError::UnknownCoordinate` if there's no board at its
    ///   coordinate.
    pub fn piece_at(&self, position: &Position) -> Result<Option<Piece>> {
        position.square.check(self.board_size())?;
        let board = self.get(position.tm).ok_or(UnknownCoordinate(position.tm))?;
        Ok(board.read(position.square))
    }

    /// Whether the board at `tm` still heads its timeline and nothing has
    /// evolved from it. Only such boards may be edited in place.
    pub fn is_head(&self, tm: TmCoord) -> bool {
        let Some(id) = self.lookup(tm) else {
            return false;
        };
        self.max_time(tm.timeline) == Some(tm.time) && self.boards.iter().all(|board| board.origin() != Some(id))
    }

    /// Places a piece directly on the head of a timeline, without evolving
    /// it. Meant for building up a position before play starts.
    ///
    /// # Errors
    ///
    /// * `MultiverseError::UnknownCoordinate` if no board exists there.
    /// * `MultiverseError::SupersededBoard` if the board is already history.
    /// * Any placement error of the board.
    pub fn add_piece(&mut self, piece: Piece, position: Position, allow_capture: bool) -> Result<Option<Piece>> {
        if !self.contains(position.tm) {
            return Err(UnknownCoordinate(position.tm).into());
        }
        if !self.is_head(position.tm) {
            return Err(SupersededBoard(position.tm).into());
        }
        self.board_mut(position.tm)?
            .place(piece, position.square, allow_capture)
    }

    /// Copies the board at `tm` one step forward and returns the coordinate
    /// of the copy.
    ///
    /// If `tm` is the latest board of its timeline the copy simply continues
    /// that timeline. Otherwise the move rewrites history and the copy starts
    /// a new timeline: the parity of `time + timeline + first_turn_parity`
    /// puts it on the positive side (odd) or the negative side (even) of the
    /// multiverse, one past the outermost timeline on that side.
    ///
    /// # Errors
    ///
    /// * `MultiverseError::UnknownCoordinate` if there's no board at `tm`.
    /// * `MultiverseError::TimeOverflow` if `tm` has no next time step.
    pub fn evolve(&mut self, tm: TmCoord) -> Result<TmCoord> {
        let id = self.lookup(tm).ok_or(UnknownCoordinate(tm))?;
        let next = tm.next().ok_or(TimeOverflow(tm))?;
        let next = if self.max_time(tm.timeline) == Some(tm.time) {
            debug!(%tm, "continuing timeline");
            next
        } else {
            let timeline = self.allocate_timeline(tm);
            debug!(%tm, timeline, "branching new timeline");
            TmCoord::new(next.time, timeline)
        };
        debug_assert!(!self.contains(next));
        let board = self.boards[id.value()].evolved(next, id);
        self.push(board);
        Ok(next)
    }

    /// Coordinate of the board that `tm` was evolved from, `None` for roots
    /// and unknown coordinates.
    pub fn origin(&self, tm: TmCoord) -> Option<TmCoord> {
        let origin = self.get(tm)?.origin()?;
        Some(self[origin].tm())
    }

    /// Coordinates from `tm` back to the root it descends from, following
    /// the origin of each board.
    ///
    /// # Errors
    ///
    /// Returns `MultiverseError::UnknownCoordinate` if there's no board at
    /// `tm`.
    pub fn history(&self, tm: TmCoord) -> Result<Vec<TmCoord>> {
        let mut id = self.lookup(tm).ok_or(UnknownCoordinate(tm))?;
        let mut result = vec![tm];
        while let Some(origin) = self.boards[id.value()].origin() {
            result.push(self.boards[origin.value()].tm());
            id = origin;
        }
        Ok(result)
    }

    /// Destinations reachable by the piece at `from`; empty if there's no
    /// board or no piece there.
    ///
    /// # Errors
    ///
    /// Fails with `SquareError::OutOfRange` if `from` is off the board.
    pub fn legal_destinations(&self, from: Position, single_step: bool) -> Result<Vec<Position>> {
        from.square.check(self.board_size())?;
        let destinations = match self.get(from.tm).and_then(|board| board.read(from.square)) {
            Some(piece) => MoveGenerator::new(self.board_size()).legal_destinations(self, piece, from, single_step),
            None => Vec::new(),
        };
        Ok(destinations)
    }

    pub(crate) fn board_mut(&mut self, tm: TmCoord) -> Result<&mut Board> {
        let id = self.lookup(tm).ok_or(UnknownCoordinate(tm))?;
        Ok(&mut self.boards[id.value()])
    }

    fn allocate_timeline(&mut self, tm: TmCoord) -> i32 {
        let parity = (i64::from(tm.time) + i64::from(tm.timeline) + self.config.first_turn_parity()).rem_euclid(2);
        if parity == 1 {
            self.max_positive += 1;
            self.max_positive
        } else {
            self.min_negative -= 1;
            self.min_negative
        }
    }

    fn push(&mut self, board: Board) -> BoardId {
        let id = BoardId::new(self.boards.len());
        let tm = board.tm();
        self.coords.insert(tm, id);
        let max_time = self.max_times.entry(tm.timeline).or_insert(tm.time);
        *max_time = (*max_time).max(tm.time);
        self.max_positive = self.max_positive.max(tm.timeline);
        self.min_negative = self.min_negative.min(tm.timeline);
        self.boards.push(board);
        id
    }
}

impl Index<BoardId> for Multiverse {
    type Output = Board;
    fn index(&self, index: BoardId) -> &Self::Output {
        &self.boards[index.value()]
    }
}

impl Occupancy for Multiverse {
    fn probe(&self, position: &Position, color: Color) -> Probe {
        let board = match self.get(position.tm) {
            Some(board) if board.contains(position.square) => board,
            _ => return Probe::Blocked,
        };
        match board.read(position.square) {
            None => Probe::PassThrough,
            Some(piece) if piece.color() == color => Probe::Blocked,
            Some(_) => Probe::Capture,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Square, SquareError};
    use std::collections::HashSet;

    fn sq(name: &str) -> Square {
        Square::parse(name, 8).unwrap()
    }

    fn tm(time: u32, timeline: i32) -> TmCoord {
        TmCoord::new(time, timeline)
    }

    fn standard() -> Multiverse {
        Multiverse::standard(MultiverseConfig::default()).unwrap()
    }

    #[test]
    fn test_standard_root() {
        let multiverse = standard();
        assert_eq!(multiverse.len(), 1);
        assert_eq!(multiverse.lookup(TmCoord::ROOT), Some(BoardId::new(0)));
        assert_eq!(multiverse.lookup(tm(1, 0)), None);
        assert_eq!(multiverse.max_time(0), Some(0));
        assert_eq!(multiverse.max_time(1), None);
    }

    #[test]
    fn test_default_setup_needs_8x8() {
        let mut multiverse = Multiverse::new(MultiverseConfig::new(6, Color::Light)).unwrap();
        assert!(multiverse.default_setup().is_err());
        assert!(multiverse.is_empty());
    }

    #[test]
    fn test_insert_root_twice() {
        let mut multiverse = standard();
        let err = multiverse.add_empty_board(TmCoord::ROOT).unwrap_err();
        assert_eq!(
            err.downcast_ref::<MultiverseError>(),
            Some(&CoordinateOccupied(TmCoord::ROOT))
        );
        assert_eq!(multiverse.len(), 1);
    }

    #[test]
    fn test_insert_root_size_mismatch() {
        let mut multiverse = standard();
        let board = Board::empty(4, tm(0, 1)).unwrap();
        let err = multiverse.insert_root(board).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MultiverseError>(),
            Some(SizeMismatch { expected: 8, found: 4 })
        ));
    }

    #[test]
    fn test_evolve_continuation() {
        let mut multiverse = standard();
        let next = multiverse.evolve(TmCoord::ROOT).unwrap();
        assert_eq!(next, tm(1, 0));
        assert_eq!(multiverse.max_time(0), Some(1));
        let board = multiverse.get(next).unwrap();
        assert_eq!(board.origin(), Some(BoardId::new(0)));
        assert_eq!(board.read(sq("e2")), Some(Piece::LP));
        assert_eq!(multiverse.evolve(next).unwrap(), tm(2, 0));
    }

    #[test]
    fn test_evolve_unknown_coordinate() {
        let mut multiverse = standard();
        let err = multiverse.evolve(tm(3, 0)).unwrap_err();
        assert_eq!(err.downcast_ref::<MultiverseError>(), Some(&UnknownCoordinate(tm(3, 0))));
        assert_eq!(multiverse.len(), 1);
    }

    #[test]
    fn test_branch_parity_light_first() {
        let mut multiverse = standard();
        multiverse.evolve(tm(0, 0)).unwrap();
        multiverse.evolve(tm(1, 0)).unwrap();
        // (0 + 0 + 0) is even: negative side
        assert_eq!(multiverse.evolve(tm(0, 0)).unwrap(), tm(1, -1));
        // (1 + 0 + 0) is odd: positive side
        assert_eq!(multiverse.evolve(tm(1, 0)).unwrap(), tm(2, 1));
        assert_eq!(multiverse.evolve(tm(0, 0)).unwrap(), tm(1, -2));
        assert_eq!(multiverse.evolve(tm(1, 0)).unwrap(), tm(2, 2));
    }

    #[test]
    fn test_branch_parity_dark_first() {
        let mut multiverse = Multiverse::standard(MultiverseConfig::new(8, Color::Dark)).unwrap();
        multiverse.evolve(tm(0, 0)).unwrap();
        assert_eq!(multiverse.evolve(tm(0, 0)).unwrap(), tm(1, 1));
    }

    #[test]
    fn test_branch_parity_negative_timeline() {
        let mut multiverse = standard();
        multiverse.evolve(tm(0, 0)).unwrap();
        let branch = multiverse.evolve(tm(0, 0)).unwrap();
        assert_eq!(branch, tm(1, -1));
        multiverse.evolve(branch).unwrap();
        // (1 - 1 + 0) is even: negative side again
        assert_eq!(multiverse.evolve(branch).unwrap(), tm(2, -2));
    }

    #[test]
    fn test_empty_boards_reserve_timelines() {
        let mut multiverse = standard();
        multiverse.add_empty_board(tm(0, 3)).unwrap();
        multiverse.add_empty_board(tm(0, -2)).unwrap();
        multiverse.evolve(tm(0, 0)).unwrap();
        multiverse.evolve(tm(1, 0)).unwrap();
        assert_eq!(multiverse.evolve(tm(1, 0)).unwrap(), tm(2, 4));
        assert_eq!(multiverse.evolve(tm(0, 0)).unwrap(), tm(1, -3));
        assert_eq!(multiverse.timelines().collect::<Vec<_>>(), vec![-3, -2, 0, 3, 4]);
    }

    #[test]
    fn test_evolve_never_collides() {
        let mut multiverse = standard();
        let mut frontier = vec![TmCoord::ROOT];
        for round in 0..40 {
            let tm = frontier[(round * 7) % frontier.len()];
            let before = multiverse.len();
            let next = multiverse.evolve(tm).unwrap();
            assert_eq!(multiverse.len(), before + 1);
            frontier.push(next);
        }
        let unique: HashSet<TmCoord> = multiverse.boards().map(|b| b.tm()).collect();
        assert_eq!(unique.len(), multiverse.len());
    }

    #[test]
    fn test_evolve_leaves_origin_untouched() {
        let mut multiverse = standard();
        let next = multiverse.evolve(TmCoord::ROOT).unwrap();
        multiverse.board_mut(next).unwrap().move_piece(sq("e2"), sq("e4"), false).unwrap();
        let root = multiverse.get(TmCoord::ROOT).unwrap();
        assert_eq!(root.read(sq("e2")), Some(Piece::LP));
        assert_eq!(root.read(sq("e4")), None);
    }

    #[test]
    fn test_history() {
        let mut multiverse = standard();
        multiverse.evolve(tm(0, 0)).unwrap();
        multiverse.evolve(tm(1, 0)).unwrap();
        let branch = multiverse.evolve(tm(1, 0)).unwrap();
        assert_eq!(multiverse.history(branch).unwrap(), vec![branch, tm(1, 0), tm(0, 0)]);
        assert_eq!(multiverse.origin(branch), Some(tm(1, 0)));
        assert_eq!(multiverse.origin(TmCoord::ROOT), None);
        assert!(multiverse.history(tm(9, 9)).is_err());
    }

    #[test]
    fn test_add_piece_and_piece_at() {
        let mut multiverse = standard();
        let e4 = Position::new(sq("e4"), TmCoord::ROOT);
        assert_eq!(multiverse.piece_at(&e4).unwrap(), None);
        multiverse.add_piece(Piece::DQ, e4, false).unwrap();
        assert_eq!(multiverse.piece_at(&e4).unwrap(), Some(Piece::DQ));
        let nowhere = Position::new(sq("e4"), tm(5, 5));
        let err = multiverse.piece_at(&nowhere).unwrap_err();
        assert_eq!(err.downcast_ref::<MultiverseError>(), Some(&UnknownCoordinate(tm(5, 5))));
        let err = multiverse.add_piece(Piece::DQ, nowhere, false).unwrap_err();
        assert_eq!(err.downcast_ref::<MultiverseError>(), Some(&UnknownCoordinate(tm(5, 5))));
    }

    #[test]
    fn test_add_piece_rejects_history() {
        let mut multiverse = standard();
        multiverse
            .apply_move(
                crate::Move::new(Position::new(sq("e2"), TmCoord::ROOT), Position::new(sq("e4"), TmCoord::ROOT)),
                false,
            )
            .unwrap();
        let e4 = Position::new(sq("e4"), TmCoord::ROOT);
        let err = multiverse.add_piece(Piece::DQ, e4, false).unwrap_err();
        assert_eq!(err.downcast_ref::<MultiverseError>(), Some(&SupersededBoard(TmCoord::ROOT)));
        assert_eq!(multiverse.piece_at(&e4).unwrap(), None);
        assert!(!multiverse.is_head(TmCoord::ROOT));
        assert!(multiverse.is_head(tm(1, 0)));
        multiverse.add_piece(Piece::DQ, Position::new(sq("d5"), tm(1, 0)), false).unwrap();
    }

    #[test]
    fn test_add_piece_rejects_branched_board() {
        let mut multiverse = standard();
        multiverse.add_empty_board(tm(0, 1)).unwrap();
        multiverse.evolve(tm(0, 1)).unwrap();
        multiverse.evolve(tm(0, 1)).unwrap();
        // (0 + 1 + 0) is odd: the branch lands on the positive side
        assert_eq!(multiverse.history(tm(1, 2)).unwrap(), vec![tm(1, 2), tm(0, 1)]);
        let err = multiverse
            .add_piece(Piece::LK, Position::new(sq("a1"), tm(0, 1)), false)
            .unwrap_err();
        assert_eq!(err.downcast_ref::<MultiverseError>(), Some(&SupersededBoard(tm(0, 1))));
    }

    #[test]
    fn test_piece_at_off_board() {
        let multiverse = standard();
        let far: Position = serde_json::from_str(r#"{"square":"z20","time":0,"timeline":0}"#).unwrap();
        let err = multiverse.piece_at(&far).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SquareError>(),
            Some(SquareError::OutOfRange { size: 8, .. })
        ));
        assert!(multiverse.legal_destinations(far, false).is_err());
        assert_eq!(multiverse.probe(&far, Color::Light), Probe::Blocked);
    }

    #[test]
    fn test_evolve_at_end_of_time() {
        let mut multiverse = standard();
        let last = tm(u32::MAX, 2);
        multiverse.add_empty_board(last).unwrap();
        let err = multiverse.evolve(last).unwrap_err();
        assert_eq!(err.downcast_ref::<MultiverseError>(), Some(&TimeOverflow(last)));
        assert_eq!(multiverse.len(), 2);
        assert_eq!(multiverse.timelines().collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(multiverse.max_time(2), Some(u32::MAX));
    }

    #[test]
    fn test_occupancy() {
        let multiverse = standard();
        let at = |name: &str| Position::new(sq(name), TmCoord::ROOT);
        assert_eq!(multiverse.probe(&at("e2"), Color::Light), Probe::Blocked);
        assert_eq!(multiverse.probe(&at("e7"), Color::Light), Probe::Capture);
        assert_eq!(multiverse.probe(&at("e4"), Color::Light), Probe::PassThrough);
        let missing = Position::new(sq("e4"), tm(0, 1));
        assert_eq!(multiverse.probe(&missing, Color::Dark), Probe::Blocked);
    }
}
