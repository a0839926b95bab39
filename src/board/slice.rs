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
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use super::material::{CodecError, Glyph, Piece, PieceKind};
use super::position::TmCoord;
use super::square::{Square, MAX_BOARD_SIZE};

use PieceKind::*;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("Cannot place {piece} on {square}: occupied by {occupant}")]
    OccupiedSquare {
        piece: Piece,
        square: Square,
        occupant: Piece,
    },
    #[error("{piece} cannot capture {occupant} of its own color on {square}")]
    IllegalCapture {
        piece: Piece,
        square: Square,
        occupant: Piece,
    },
    #[error("There is no piece on {0}")]
    EmptySquare(Square),
    #[error("Board size {0} is not supported here")]
    UnsupportedSize(usize),
    #[error("Expecting {expected} rows of {expected} values, got {found}")]
    Shape { expected: usize, found: usize },
    #[error("Board must be empty before setting up the opening")]
    NotEmpty,
}
use BoardError::*;

/// Position of a board in the multiverse's append-only list.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BoardId(usize);

impl BoardId {
    #[inline]
    pub(crate) const fn new(index: usize) -> Self {
        Self(index)
    }

    #[inline]
    pub const fn value(&self) -> usize {
        self.0
    }
}

impl fmt::Display for BoardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

type Row = Arc<Vec<Option<Piece>>>;

/// One time-timeline slice of the multiverse: an n-by-n grid of pieces
/// tagged with its coordinate and the board it evolved from.
///
/// Rows are shared between a board and the boards evolved from it. Writing
/// to a square copies only the row that holds it, so an evolution costs one
/// pointer per rank no matter how long the history grows.
#[derive(Debug, Clone)]
pub struct Board {
    size: usize,
    tm: TmCoord,
    origin: Option<BoardId>,
    rows: Vec<Row>,
}

impl Board {
    /// # Errors
    ///
    /// Returns `BoardError::UnsupportedSize` unless `1 <= size <= 26`.
    pub fn empty(size: usize, tm: TmCoord) -> Result<Self> {
        if size == 0 || size > MAX_BOARD_SIZE {
            return Err(UnsupportedSize(size).into());
        }
        let row: Row = Arc::new(vec![None; size]);
        Ok(Self {
            size,
            tm,
            origin: None,
            rows: vec![row; size],
        })
    }

    /// The canonical 8x8 opening position at `tm`.
    pub fn standard(tm: TmCoord) -> Result<Self> {
        let mut board = Self::empty(8, tm)?;
        board.default_setup()?;
        Ok(board)
    }

    /// Rebuilds a board from codec values, rank 1 first.
    ///
    /// # Errors
    ///
    /// Fails if the grid isn't square, holds a marker or an unknown value.
    pub fn from_values(tm: TmCoord, values: &[Vec<u8>]) -> Result<Self> {
        let mut board = Self::empty(values.len(), tm)?;
        for (rank, row) in values.iter().enumerate() {
            if row.len() != board.size {
                return Err(Shape {
                    expected: board.size,
                    found: row.len(),
                }
                .into());
            }
            for (file, value) in row.iter().enumerate() {
                match Glyph::from_value(*value)? {
                    Glyph::Empty => {}
                    Glyph::Piece(piece) => board.set(Square::new(file, rank), Some(piece)),
                    Glyph::Marker(_) => return Err(CodecError::InvalidPieceValue(*value).into()),
                }
            }
        }
        Ok(board)
    }

    /// Codec values of every square, rank 1 first.
    pub fn values(&self) -> Vec<Vec<u8>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|cell| Glyph::from(*cell).value()).collect())
            .collect()
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn tm(&self) -> TmCoord {
        self.tm
    }

    /// The board this one evolved from, `None` for roots.
    #[inline]
    pub fn origin(&self) -> Option<BoardId> {
        self.origin
    }

    #[inline]
    pub fn contains(&self, square: Square) -> bool {
        square.is_on_board(self.size)
    }

    /// The piece on `square`, if any. Squares off the board read as empty.
    #[inline]
    pub fn read(&self, square: Square) -> Option<Piece> {
        let (file, rank) = square.to_index();
        self.rows.get(rank).and_then(|row| row.get(file)).copied().flatten()
    }

    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::iter(self.size).filter_map(|square| self.read(square).map(|piece| (square, piece)))
    }

    pub fn is_empty(&self) -> bool {
        self.pieces().next().is_none()
    }

    /// Checks whether `piece` may be put on `square` without changing
    /// anything.
    ///
    /// # Errors
    ///
    /// * `SquareError::OutOfRange` if the square is off the board.
    /// * `BoardError::OccupiedSquare` if the square is taken and captures are
    ///   not allowed.
    /// * `BoardError::IllegalCapture` if the occupant has the same color.
    pub fn check_placement(&self, piece: Piece, square: Square, allow_capture: bool) -> Result<()> {
        square.check(self.size)?;
        if let Some(occupant) = self.read(square) {
            if !allow_capture {
                return Err(OccupiedSquare {
                    piece,
                    square,
                    occupant,
                }
                .into());
            }
            if occupant.color() == piece.color() {
                return Err(IllegalCapture {
                    piece,
                    square,
                    occupant,
                }
                .into());
            }
        }
        Ok(())
    }

    /// Puts `piece` on `square` and returns whatever it captured.
    ///
    /// # Errors
    ///
    /// See `check_placement`; the board is unchanged on error.
    pub fn place(&mut self, piece: Piece, square: Square, allow_capture: bool) -> Result<Option<Piece>> {
        self.check_placement(piece, square, allow_capture)?;
        let captured = self.read(square);
        self.set(square, Some(piece));
        Ok(captured)
    }

    /// Clears `square` and returns what stood there.
    pub fn remove(&mut self, square: Square) -> Result<Option<Piece>> {
        square.check(self.size)?;
        let removed = self.read(square);
        if removed.is_some() {
            self.set(square, None);
        }
        Ok(removed)
    }

    /// Moves the piece on `from` to `to`, returning a captured piece.
    ///
    /// # Errors
    ///
    /// * `BoardError::EmptySquare` if there is nothing on `from`.
    /// * Any error of `check_placement` for the destination.
    pub fn move_piece(&mut self, from: Square, to: Square, allow_capture: bool) -> Result<Option<Piece>> {
        from.check(self.size)?;
        let piece = self.read(from).ok_or(EmptySquare(from))?;
        self.check_placement(piece, to, allow_capture)?;
        self.set(from, None);
        let captured = self.read(to);
        self.set(to, Some(piece));
        Ok(captured)
    }

    /// Places `piece` on every square of a (zero-based) rank.
    pub fn fill_row(&mut self, rank: usize, piece: Piece) -> Result<()> {
        let squares = (0..self.size)
            .map(|file| Square::from_index(file, rank, self.size))
            .collect::<Result<Vec<_>>>()?;
        for square in &squares {
            self.check_placement(piece, *square, false)?;
        }
        for square in squares {
            self.set(square, Some(piece));
        }
        Ok(())
    }

    /// Places `piece` on `square` and on its horizontal mirror image.
    pub fn place_mirrored(&mut self, piece: Piece, square: Square) -> Result<()> {
        let mirror = square.mirror_horizontal(self.size)?;
        self.check_placement(piece, square, false)?;
        self.check_placement(piece, mirror, false)?;
        self.set(square, Some(piece));
        self.set(mirror, Some(piece));
        Ok(())
    }

    /// Sets up the standard opening. Light's back rank and pawns are
    /// placed explicitly; dark's are derived by mirroring every light piece
    /// across the horizontal midline and flipping its color.
    ///
    /// # Errors
    ///
    /// Returns `BoardError::UnsupportedSize` for anything but an 8x8 board,
    /// or `BoardError::NotEmpty` if any piece is already on it.
    pub fn default_setup(&mut self) -> Result<()> {
        if self.size != 8 {
            return Err(UnsupportedSize(self.size).into());
        }
        if !self.is_empty() {
            return Err(NotEmpty.into());
        }
        let square = |name: &str| Square::parse(name, 8);
        self.place_mirrored(Piece::light(Rook), square("a1")?)?;
        self.place_mirrored(Piece::light(Knight), square("b1")?)?;
        self.place_mirrored(Piece::light(Bishop), square("c1")?)?;
        self.place(Piece::light(Queen), square("d1")?, false)?;
        self.place(Piece::light(King), square("e1")?, false)?;
        self.fill_row(1, Piece::light(Pawn))?;
        self.mirror_pieces()
    }

    // Adds the color-flipped vertical mirror of every piece on the board.
    fn mirror_pieces(&mut self) -> Result<()> {
        let pieces: Vec<(Square, Piece)> = self.pieces().collect();
        for (square, piece) in pieces {
            let mirror = square.mirror_vertical(self.size)?;
            self.place(piece.flipped(), mirror, false)?;
        }
        Ok(())
    }

    /// A copy of this board at `tm`, recording `origin` as its predecessor.
    /// Rows stay shared until written.
    pub(crate) fn evolved(&self, tm: TmCoord, origin: BoardId) -> Self {
        Self {
            size: self.size,
            tm,
            origin: Some(origin),
            rows: self.rows.clone(),
        }
    }

    // Callers have already checked the square is on the board.
    fn set(&mut self, square: Square, value: Option<Piece>) {
        let (file, rank) = square.to_index();
        Arc::make_mut(&mut self.rows[rank])[file] = value;
    }

    #[cfg(test)]
    pub(crate) fn shares_row_with(&self, other: &Board, rank: usize) -> bool {
        Arc::ptr_eq(&self.rows[rank], &other.rows[rank])
    }
}

impl PartialEq for Board {
    fn eq(&self, other: &Self) -> bool {
        self.size == other.size && self.tm == other.tm && self.origin == other.origin && self.rows == other.rows
    }
}

impl Eq for Board {}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.tm)?;
        for (rank, row) in self.rows.iter().enumerate().rev() {
            write!(f, "{:>2} ", rank + 1)?;
            for cell in row.iter() {
                match cell {
                    Some(piece) => write!(f, " {}", piece)?,
                    None => write!(f, " ..")?,
                }
            }
            writeln!(f)?;
        }
        write!(f, "   ")?;
        for file in 0..self.size {
            write!(f, "  {}", (b'a' + file as u8) as char)?;
        }
        writeln!(f)
    }
}
