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
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use super::material::{Color, Glyph};
use super::multiverse::Multiverse;
use super::position::{Position, TmCoord};
use super::slice::{Board, BoardError};
use super::square::Square;

/// Destinations of one piece, grouped by board. Hints sit beside the
/// boards as an overlay and are never written into them.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct MoveHints {
    color: Color,
    origin: Position,
    marks: BTreeMap<TmCoord, BTreeSet<Square>>,
}

impl MoveHints {
    pub fn new(color: Color, origin: Position, destinations: impl IntoIterator<Item = Position>) -> Self {
        let mut marks: BTreeMap<TmCoord, BTreeSet<Square>> = BTreeMap::new();
        for position in destinations {
            marks.entry(position.tm).or_default().insert(position.square);
        }
        Self { color, origin, marks }
    }

    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }

    #[inline]
    pub fn origin(&self) -> Position {
        self.origin
    }

    pub fn is_marked(&self, position: &Position) -> bool {
        self.marks
            .get(&position.tm)
            .is_some_and(|squares| squares.contains(&position.square))
    }

    /// Marked squares on the board at `tm`.
    pub fn squares(&self, tm: TmCoord) -> impl Iterator<Item = Square> + '_ {
        self.marks.get(&tm).into_iter().flatten().copied()
    }

    /// Boards holding at least one mark.
    pub fn boards(&self) -> impl Iterator<Item = TmCoord> + '_ {
        self.marks.keys().copied()
    }

    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.marks
            .iter()
            .flat_map(|(tm, squares)| squares.iter().map(move |square| Position::new(*square, *tm)))
    }

    pub fn len(&self) -> usize {
        self.marks.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// The marker to draw at `position`, if it's marked.
    pub fn glyph(&self, position: &Position) -> Option<Glyph> {
        self.is_marked(position).then_some(Glyph::Marker(self.color))
    }

    /// Codec values of `board` with every marked square replaced by the
    /// mover's marker, rank 1 first.
    pub fn overlay(&self, board: &Board) -> Vec<Vec<u8>> {
        let mut values = board.values();
        let marker = Glyph::Marker(self.color).value();
        for square in self.squares(board.tm()) {
            let (file, rank) = square.to_index();
            if let Some(cell) = values.get_mut(rank).and_then(|row| row.get_mut(file)) {
                *cell = marker;
            }
        }
        values
    }
}

impl Multiverse {
    /// Hints for the piece at `from`.
    ///
    /// # Errors
    ///
    /// * `SquareError::OutOfRange` if `from` is off the board.
    /// * `MultiverseError::UnknownCoordinate` if there's no board at `from`.
    /// * `BoardError::EmptySquare` if there's no piece there.
    pub fn move_hints(&self, from: Position, single_step: bool) -> Result<MoveHints> {
        let piece = self.piece_at(&from)?.ok_or(BoardError::EmptySquare(from.square))?;
        let destinations = self.legal_destinations(from, single_step)?;
        Ok(MoveHints::new(piece.color(), from, destinations))
    }
}

#[cfg(test)]
mod tests {
    use crate::*;

    fn sq(name: &str) -> Square {
        Square::parse(name, 8).unwrap()
    }

    fn root(name: &str) -> Position {
        Position::new(sq(name), TmCoord::ROOT)
    }

    fn standard() -> Multiverse {
        Multiverse::standard(MultiverseConfig::default()).unwrap()
    }

    #[test]
    fn test_knight_hints() {
        let multiverse = standard();
        let hints = multiverse.move_hints(root("g1"), false).unwrap();
        assert_eq!(hints.color(), Color::Light);
        assert_eq!(hints.len(), 2);
        assert!(hints.is_marked(&root("f3")));
        assert!(hints.is_marked(&root("h3")));
        assert!(!hints.is_marked(&root("e2")));
        assert_eq!(hints.boards().collect::<Vec<_>>(), vec![TmCoord::ROOT]);
        assert_eq!(hints.glyph(&root("f3")), Some(Glyph::Marker(Color::Light)));
        assert_eq!(hints.glyph(&root("g1")), None);
    }

    #[test]
    fn test_hints_leave_board_alone() {
        let multiverse = standard();
        let hints = multiverse.move_hints(root("b8"), false).unwrap();
        let board = multiverse.get(TmCoord::ROOT).unwrap();
        let overlay = hints.overlay(board);
        assert_eq!(overlay[5][0], 33);
        assert_eq!(overlay[5][2], 33);
        assert_eq!(overlay[5][1], 0);
        assert_eq!(board.read(sq("a6")), None);
        assert_eq!(board.values()[5][0], 0);
    }

    #[test]
    fn test_hints_errors() {
        let multiverse = standard();
        let empty = multiverse.move_hints(root("e4"), false).unwrap_err();
        assert_eq!(
            empty.downcast_ref::<BoardError>(),
            Some(&BoardError::EmptySquare(sq("e4")))
        );
        let missing = Position::new(sq("e2"), TmCoord::new(4, 0));
        let err = multiverse.move_hints(missing, false).unwrap_err();
        assert_eq!(
            err.downcast_ref::<MultiverseError>(),
            Some(&MultiverseError::UnknownCoordinate(TmCoord::new(4, 0)))
        );
        let far: Position = serde_json::from_str(r#"{"square":"z20","time":0,"timeline":0}"#).unwrap();
        let err = multiverse.move_hints(far, false).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SquareError>(),
            Some(SquareError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_blocked_piece_has_no_hints() {
        let multiverse = standard();
        let hints = multiverse.move_hints(root("a1"), false).unwrap();
        assert!(hints.is_empty());
        assert_eq!(hints.positions().count(), 0);
    }

    #[test]
    fn test_hints_span_boards() {
        let mut multiverse = standard();
        multiverse.evolve(TmCoord::ROOT).unwrap();
        let hints = multiverse.move_hints(Position::new(sq("e2"), TmCoord::new(1, 0)), false).unwrap();
        let squares: Vec<Square> = hints.squares(TmCoord::new(1, 0)).collect();
        assert_eq!(squares, vec![sq("e3")]);
        assert_eq!(hints.squares(TmCoord::ROOT).count(), 0);
    }
}
