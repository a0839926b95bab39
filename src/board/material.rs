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
use std::ops::Not;
use strum_macros::Display;
use strum_macros::EnumIter;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Unknown piece acronym {0:?} (expecting a kind letter followed by 'l' or 'd')")]
    UnknownPiece(String),
    #[error("Value {0} does not encode a piece or a marker")]
    InvalidPieceValue(u8),
}
use CodecError::*;

/// Offset added to a piece code for each color. Codes below the offset are
/// light, codes at or above it are dark.
const COLOR_OFFSET: u8 = 20;

/// Code reserved for movement-hint markers, one past the last piece code.
const MARKER_CODE: u8 = 13;

#[derive(
    Debug, Serialize, Deserialize, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter,
)]
pub enum Color {
    Light,
    Dark,
}
use Color::{Dark, Light};

impl Color {
    pub const fn to_index(&self) -> usize {
        *self as usize
    }

    /// Forward direction along the rank and timeline axes.
    #[inline]
    pub const fn forward(&self) -> i32 {
        match self {
            Light => 1,
            Dark => -1,
        }
    }

    pub const fn to_char(&self) -> char {
        match self {
            Light => 'l',
            Dark => 'd',
        }
    }

    pub const fn try_from_char(c: char) -> Option<Self> {
        match c {
            'l' => Some(Light),
            'd' => Some(Dark),
            _ => None,
        }
    }

    const fn offset(&self) -> u8 {
        match self {
            Light => 0,
            Dark => COLOR_OFFSET,
        }
    }
}

impl Not for Color {
    type Output = Self;

    #[inline]
    fn not(self) -> Self {
        match self {
            Light => Dark,
            Dark => Light,
        }
    }
}

/// The kinds of piece that can stand on a board. Besides the six standard
/// pieces, the multiverse variant adds the unicorn (tri-agonal rider), the
/// dragon (quad-agonal rider), the brawn (a pawn with extra captures), the
/// princess (rook plus bishop) and the non-royal king and queen.
#[derive(
    Debug, Serialize, Deserialize, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter,
)]
pub enum PieceKind {
    King,
    Queen,
    Bishop,
    Knight,
    Rook,
    Pawn,
    Dragon,
    Unicorn,
    Brawn,
    Princess,
    CommonKing,
    RoyalQueen,
}
use PieceKind::*;

impl PieceKind {
    pub const fn from_code(code: u8) -> Option<Self> {
        const KINDS: [PieceKind; 12] = [
            King, Queen, Bishop, Knight, Rook, Pawn, Dragon, Unicorn, Brawn, Princess,
            CommonKing, RoyalQueen,
        ];
        if code == 0 || code as usize > KINDS.len() {
            return None;
        }
        Some(KINDS[code as usize - 1])
    }

    /// Codes start at 1 so that 0 stays free for an empty square.
    pub const fn to_code(&self) -> u8 {
        *self as u8 + 1
    }

    pub const fn to_char(&self) -> char {
        match self {
            King => 'k',
            Queen => 'q',
            Bishop => 'b',
            Knight => 'n',
            Rook => 'r',
            Pawn => 'p',
            Dragon => 'd',
            Unicorn => 'u',
            Brawn => 'B',
            Princess => 'P',
            CommonKing => 'c',
            RoyalQueen => 'R',
        }
    }

    pub const fn try_from_char(c: char) -> Option<Self> {
        match c {
            'k' => Some(King),
            'q' => Some(Queen),
            'b' => Some(Bishop),
            'n' => Some(Knight),
            'r' => Some(Rook),
            'p' => Some(Pawn),
            'd' => Some(Dragon),
            'u' => Some(Unicorn),
            'B' => Some(Brawn),
            'P' => Some(Princess),
            'c' => Some(CommonKing),
            'R' => Some(RoyalQueen),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Piece {
    color: Color,
    kind: PieceKind,
}

impl Piece {
    pub const LK: Self = Self::light(King);
    pub const LQ: Self = Self::light(Queen);
    pub const LR: Self = Self::light(Rook);
    pub const LB: Self = Self::light(Bishop);
    pub const LN: Self = Self::light(Knight);
    pub const LP: Self = Self::light(Pawn);

    pub const DK: Self = Self::dark(King);
    pub const DQ: Self = Self::dark(Queen);
    pub const DR: Self = Self::dark(Rook);
    pub const DB: Self = Self::dark(Bishop);
    pub const DN: Self = Self::dark(Knight);
    pub const DP: Self = Self::dark(Pawn);

    #[inline]
    pub const fn new(color: Color, kind: PieceKind) -> Self {
        Self { color, kind }
    }

    #[inline]
    pub const fn light(kind: PieceKind) -> Self {
        Self::new(Light, kind)
    }

    #[inline]
    pub const fn dark(kind: PieceKind) -> Self {
        Self::new(Dark, kind)
    }

    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }

    #[inline]
    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    /// The same kind of piece in the opposing color.
    #[inline]
    pub fn flipped(&self) -> Self {
        Self::new(!self.color, self.kind)
    }

    /// Parses a two-character acronym such as `"kl"` (light king) or
    /// `"Bd"` (dark brawn).
    ///
    /// # Errors
    ///
    /// Returns `CodecError::UnknownPiece` if the acronym is not in the table.
    pub fn from_acronym(acronym: &str) -> Result<Self> {
        Self::try_from_acronym(acronym).ok_or_else(|| UnknownPiece(acronym.to_string()).into())
    }

    fn try_from_acronym(acronym: &str) -> Option<Self> {
        let mut chars = acronym.chars();
        let kind = PieceKind::try_from_char(chars.next()?)?;
        let color = Color::try_from_char(chars.next()?)?;
        if chars.next().is_some() {
            return None;
        }
        Some(Self::new(color, kind))
    }

    pub fn acronym(&self) -> String {
        self.to_string()
    }

    #[inline]
    pub const fn value(&self) -> u8 {
        self.color.offset() + self.kind.to_code()
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.to_char(), self.color.to_char())
    }
}

impl TryFrom<String> for Piece {
    type Error = CodecError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Self::try_from_acronym(&value).ok_or(UnknownPiece(value))
    }
}

impl From<Piece> for String {
    fn from(value: Piece) -> Self {
        value.acronym()
    }
}

/// Everything a single codec value can stand for. Markers are hints drawn by
/// a display layer over legal destinations; they never live on a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Glyph {
    Empty,
    Piece(Piece),
    Marker(Color),
}

impl Glyph {
    /// Encodes the glyph as a compact value: 0 for empty, 1..=12 for light
    /// pieces, 21..=32 for dark pieces, 13 and 33 for markers.
    pub const fn value(&self) -> u8 {
        match self {
            Glyph::Empty => 0,
            Glyph::Piece(piece) => piece.value(),
            Glyph::Marker(color) => color.offset() + MARKER_CODE,
        }
    }

    /// # Errors
    ///
    /// Returns `CodecError::InvalidPieceValue` for values outside the table.
    pub fn from_value(value: u8) -> Result<Self> {
        if value == 0 {
            return Ok(Glyph::Empty);
        }
        let (color, code) = if value < COLOR_OFFSET {
            (Light, value)
        } else {
            (Dark, value - COLOR_OFFSET)
        };
        if code == MARKER_CODE {
            return Ok(Glyph::Marker(color));
        }
        match PieceKind::from_code(code) {
            Some(kind) => Ok(Glyph::Piece(Piece::new(color, kind))),
            None => Err(InvalidPieceValue(value).into()),
        }
    }

    pub fn piece(&self) -> Option<Piece> {
        match self {
            Glyph::Piece(piece) => Some(*piece),
            _ => None,
        }
    }

    pub fn acronym(&self) -> String {
        match self {
            Glyph::Empty => String::new(),
            Glyph::Piece(piece) => piece.acronym(),
            Glyph::Marker(color) => format!("M{}", color.to_char()),
        }
    }
}

impl From<Option<Piece>> for Glyph {
    fn from(value: Option<Piece>) -> Self {
        value.map_or(Glyph::Empty, Glyph::Piece)
    }
}
