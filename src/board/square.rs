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
use thiserror::Error;

/// Largest supported board: one file per letter of the latin alphabet.
pub const MAX_BOARD_SIZE: usize = 26;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SquareError {
    #[error("Malformed square {0:?} (expecting a file letter followed by a rank number, e.g. e4)")]
    InvalidSquare(String),
    #[error("Square {square} is outside of a {size}x{size} board")]
    OutOfRange { square: String, size: usize },
}
use SquareError::*;

/// A square on an n-by-n board, stored as zero-based (file, rank) indices.
/// File `a` and rank `1` map to index 0. A square does not know the size of
/// the board it sits on, so every conversion that can fall off the board
/// takes the size as an argument.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Square {
    rank: u8,
    file: u8,
}

impl Square {
    /// Callers must guarantee both indices are below `MAX_BOARD_SIZE`.
    #[inline]
    pub(crate) const fn new(file: usize, rank: usize) -> Self {
        debug_assert!(file < MAX_BOARD_SIZE && rank < MAX_BOARD_SIZE);
        Self {
            file: file as u8,
            rank: rank as u8,
        }
    }

    /// Converts (column, row) indices into a square, failing if they fall
    /// outside a `size`-by-`size` board.
    ///
    /// # Errors
    ///
    /// Returns `SquareError::OutOfRange` if either index is not below `size`
    /// (or `size` exceeds `MAX_BOARD_SIZE`).
    pub fn from_index(col: usize, row: usize, size: usize) -> Result<Self> {
        if size > MAX_BOARD_SIZE || col >= size || row >= size {
            return Err(OutOfRange {
                square: format!("[{col}, {row}]"),
                size,
            }
            .into());
        }
        Ok(Self::new(col, row))
    }

    /// Like `from_index` but with signed indices and no error: anything off
    /// the board becomes `None`. Move generation leans on this to stop
    /// rays at the edges.
    #[inline]
    pub fn try_from_index(col: isize, row: isize, size: usize) -> Option<Self> {
        let size = size.min(MAX_BOARD_SIZE) as isize;
        if (0..size).contains(&col) && (0..size).contains(&row) {
            Some(Self::new(col as usize, row as usize))
        } else {
            None
        }
    }

    /// Parses notation such as `e4` (or `z26` on the largest board).
    ///
    /// # Errors
    ///
    /// Returns `SquareError::InvalidSquare` for malformed input and
    /// `SquareError::OutOfRange` for squares that don't fit the board.
    pub fn parse(name: &str, size: usize) -> Result<Self> {
        let (col, row) = Self::split(name).ok_or_else(|| InvalidSquare(name.to_string()))?;
        if size > MAX_BOARD_SIZE || col >= size || row >= size {
            return Err(OutOfRange {
                square: name.to_string(),
                size,
            }
            .into());
        }
        Ok(Self::new(col, row))
    }

    #[inline]
    pub fn try_parse(name: &str, size: usize) -> Option<Self> {
        let (col, row) = Self::split(name)?;
        Self::try_from_index(col as isize, row as isize, size)
    }

    // Splits a name into zero-based indices without checking the board size.
    fn split(name: &str) -> Option<(usize, usize)> {
        let mut chars = name.chars();
        let letter = chars.next()?;
        if !letter.is_ascii_lowercase() {
            return None;
        }
        let digits = chars.as_str();
        if digits.is_empty() || digits.len() > 2 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let number: usize = digits.parse().ok()?;
        if number == 0 || digits.starts_with('0') {
            return None;
        }
        Some(((letter as usize) - ('a' as usize), number - 1))
    }

    /// Zero-based (column, row) pair.
    #[inline]
    pub const fn to_index(&self) -> (usize, usize) {
        (self.file as usize, self.rank as usize)
    }

    #[inline]
    pub const fn file_index(&self) -> usize {
        self.file as usize
    }

    #[inline]
    pub const fn rank_index(&self) -> usize {
        self.rank as usize
    }

    #[inline]
    pub fn is_on_board(&self, size: usize) -> bool {
        self.file_index() < size && self.rank_index() < size
    }

    pub fn file_char(&self) -> char {
        (b'a' + self.file) as char
    }

    pub fn name(&self) -> String {
        self.to_string()
    }

    /// Reflects the square across the horizontal midline (`h8` -> `h1`).
    ///
    /// # Errors
    ///
    /// Returns `SquareError::OutOfRange` if the square is not on the board.
    pub fn mirror_vertical(&self, size: usize) -> Result<Self> {
        self.check(size)?;
        Ok(Self::new(self.file_index(), size - 1 - self.rank_index()))
    }

    /// Reflects the square across the vertical midline (`h8` -> `a8`).
    ///
    /// # Errors
    ///
    /// Returns `SquareError::OutOfRange` if the square is not on the board.
    pub fn mirror_horizontal(&self, size: usize) -> Result<Self> {
        self.check(size)?;
        Ok(Self::new(size - 1 - self.file_index(), self.rank_index()))
    }

    /// Steps by a (file, rank) offset, `None` past the edge.
    #[inline]
    pub fn offset(&self, dfile: i32, drank: i32, size: usize) -> Option<Self> {
        let col = self.file as isize + dfile as isize;
        let row = self.rank as isize + drank as isize;
        Self::try_from_index(col, row, size)
    }

    /// All squares on a `size`-by-`size` board, rank by rank from `a1`.
    pub fn iter(size: usize) -> impl Iterator<Item = Square> {
        let size = size.min(MAX_BOARD_SIZE);
        (0..size).flat_map(move |rank| (0..size).map(move |file| Square::new(file, rank)))
    }

    pub(crate) fn check(&self, size: usize) -> Result<()> {
        if !self.is_on_board(size) {
            return Err(OutOfRange {
                square: self.name(),
                size,
            }
            .into());
        }
        Ok(())
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file_char(), self.rank + 1)
    }
}

impl TryFrom<String> for Square {
    type Error = SquareError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        match Self::split(&value) {
            Some((col, row)) if col < MAX_BOARD_SIZE && row < MAX_BOARD_SIZE => {
                Ok(Self::new(col, row))
            }
            Some(_) => Err(OutOfRange {
                square: value,
                size: MAX_BOARD_SIZE,
            }),
            None => Err(InvalidSquare(value)),
        }
    }
}

impl From<Square> for String {
    fn from(value: Square) -> Self {
        value.name()
    }
}
