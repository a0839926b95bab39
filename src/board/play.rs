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
use tracing::debug;

use super::material::Piece;
use super::multiverse::{Multiverse, MultiverseError};
use super::position::{Position, TmCoord};
use super::slice::BoardError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    #[error("Cannot move from {from} into the future of the same timeline at {to}")]
    IllegalTemporalMove { from: TmCoord, to: TmCoord },
}
use MoveError::*;

/// How a move touches the multiverse, decided by its two coordinates.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveKind {
    /// Both ends on the same board: one evolution.
    InPlace,
    /// Back in time on the same timeline: two evolutions, the destination
    /// always branches.
    Retroactive,
    /// Onto another timeline: two evolutions.
    CrossTimeline,
}
use MoveKind::*;

impl MoveKind {
    /// # Errors
    ///
    /// Returns `MoveError::IllegalTemporalMove` for a move to a later time on
    /// the same timeline.
    pub fn resolve(from: TmCoord, to: TmCoord) -> Result<Self> {
        if from == to {
            Ok(InPlace)
        } else if from.timeline != to.timeline {
            Ok(CrossTimeline)
        } else if to.time < from.time {
            Ok(Retroactive)
        } else {
            Err(IllegalTemporalMove { from, to }.into())
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Position,
    pub to: Position,
}

impl Move {
    pub fn new(from: Position, to: Position) -> Self {
        Self { from, to }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// Where an applied move left its marks.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    pub kind: MoveKind,
    /// The new board the piece left from.
    pub origin: TmCoord,
    /// The new board the piece arrived on. Same as `origin` for in-place
    /// moves.
    pub destination: TmCoord,
    pub captured: Option<Piece>,
}

impl Multiverse {
    /// Executes a move by evolving the boards it touches and editing only
    /// the fresh copies. Legality against the piece's moveset is not
    /// checked; every other precondition is, before anything is evolved, so
    /// a failed move leaves the multiverse as it was.
    ///
    /// # Errors
    ///
    /// * `MoveError::IllegalTemporalMove` for a move into the future of the
    ///   same timeline.
    /// * `MultiverseError::UnknownCoordinate` if either board is missing.
    /// * `BoardError::EmptySquare` if there's no piece to move.
    /// * `BoardError::OccupiedSquare` or `BoardError::IllegalCapture` if the
    ///   destination can't take the piece.
    pub fn apply_move(&mut self, mv: Move, allow_capture: bool) -> Result<MoveOutcome> {
        let kind = MoveKind::resolve(mv.from.tm, mv.to.tm)?;
        let source = self.get(mv.from.tm).ok_or(MultiverseError::UnknownCoordinate(mv.from.tm))?;
        mv.from.square.check(source.size())?;
        let piece = source
            .read(mv.from.square)
            .ok_or(BoardError::EmptySquare(mv.from.square))?;
        let target = self.get(mv.to.tm).ok_or(MultiverseError::UnknownCoordinate(mv.to.tm))?;
        target.check_placement(piece, mv.to.square, allow_capture)?;

        let outcome = match kind {
            InPlace => {
                let next = self.evolve(mv.from.tm)?;
                let captured = self
                    .board_mut(next)?
                    .move_piece(mv.from.square, mv.to.square, allow_capture)?;
                MoveOutcome {
                    kind,
                    origin: next,
                    destination: next,
                    captured,
                }
            }
            Retroactive | CrossTimeline => {
                let origin = self.evolve(mv.from.tm)?;
                self.board_mut(origin)?.remove(mv.from.square)?;
                let destination = self.evolve(mv.to.tm)?;
                let captured = self
                    .board_mut(destination)?
                    .place(piece, mv.to.square, allow_capture)?;
                MoveOutcome {
                    kind,
                    origin,
                    destination,
                    captured,
                }
            }
        };
        debug!(%mv, ?kind, origin = %outcome.origin, destination = %outcome.destination, "applied move");
        Ok(outcome)
    }
}
