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

use once_cell::sync::Lazy;
use std::collections::{BTreeSet, HashMap};
use strum::IntoEnumIterator;

use super::material::{Color, Piece, PieceKind};
use super::position::{DrVector, Position};

use PieceKind::*;

/// What a moving piece finds at a candidate position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Probe {
    /// Own piece, or no board at that coordinate.
    Blocked,
    /// Enemy piece.
    Capture,
    /// Empty square.
    PassThrough,
}

/// The only view of board state the move generator gets.
pub trait Occupancy {
    fn probe(&self, position: &Position, color: Color) -> Probe;
}

impl<F> Occupancy for F
where
    F: Fn(&Position, Color) -> Probe,
{
    #[inline]
    fn probe(&self, position: &Position, color: Color) -> Probe {
        self(position, color)
    }
}

/// Expands a seed into its direction family: every distinct permutation of
/// the components, each with every combination of signs.
pub fn expand(seed: [i32; 4]) -> Vec<DrVector> {
    let mut family = BTreeSet::new();
    for order in permutations() {
        let permuted = order.map(|axis| seed[axis]);
        for signs in 0..16 {
            let mut components = permuted;
            for (axis, c) in components.iter_mut().enumerate() {
                if signs & (1 << axis) != 0 {
                    *c = -*c;
                }
            }
            family.insert(DrVector::new(components));
        }
    }
    family.into_iter().collect()
}

// The 24 orderings of four axes.
fn permutations() -> impl Iterator<Item = [usize; 4]> {
    (0..4).flat_map(|a| {
        (0..4).flat_map(move |b| {
            (0..4).flat_map(move |c| {
                (0..4)
                    .map(move |d| [a, b, c, d])
                    .filter(|order| order.iter().fold(0, |bits, axis| bits | 1 << axis) == 0b1111)
            })
        })
    })
}

pub static ORTHOGONAL: Lazy<Vec<DrVector>> = Lazy::new(|| expand([1, 0, 0, 0]));
pub static DIAGONAL: Lazy<Vec<DrVector>> = Lazy::new(|| expand([1, 1, 0, 0]));
pub static TRIAGONAL: Lazy<Vec<DrVector>> = Lazy::new(|| expand([1, 1, 1, 0]));
pub static QUADRAGONAL: Lazy<Vec<DrVector>> = Lazy::new(|| expand([1, 1, 1, 1]));
pub static LEAP: Lazy<Vec<DrVector>> = Lazy::new(|| expand([2, 1, 0, 0]));

/// How a piece moves: a family applied once, a family cast as rays, or the
/// split pawn families.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Moveset {
    Steps(Vec<DrVector>),
    Rays(Vec<DrVector>),
    Pawn {
        advances: Vec<DrVector>,
        captures: Vec<DrVector>,
    },
}

impl Moveset {
    pub fn of(piece: Piece) -> &'static Moveset {
        &MOVESETS[&piece]
    }

    fn build(piece: Piece) -> Self {
        match piece.kind() {
            King | CommonKing => Self::Steps(union(&[&ORTHOGONAL, &DIAGONAL, &TRIAGONAL, &QUADRAGONAL])),
            Knight => Self::Steps(LEAP.to_vec()),
            Rook => Self::Rays(ORTHOGONAL.to_vec()),
            Bishop => Self::Rays(DIAGONAL.to_vec()),
            Unicorn => Self::Rays(TRIAGONAL.to_vec()),
            Dragon => Self::Rays(QUADRAGONAL.to_vec()),
            Princess => Self::Rays(union(&[&ORTHOGONAL, &DIAGONAL])),
            Queen | RoyalQueen => Self::Rays(union(&[&ORTHOGONAL, &DIAGONAL, &TRIAGONAL, &QUADRAGONAL])),
            Pawn => Self::Pawn {
                advances: pawn_advances(piece.color()),
                captures: pawn_captures(piece.color()),
            },
            Brawn => Self::Pawn {
                advances: pawn_advances(piece.color()),
                captures: brawn_captures(piece.color()),
            },
        }
    }

    /// Every vector in the set, captures after advances for pawns.
    pub fn vectors(&self) -> Vec<DrVector> {
        match self {
            Self::Steps(vectors) | Self::Rays(vectors) => vectors.clone(),
            Self::Pawn { advances, captures } => [advances.as_slice(), captures.as_slice()].concat(),
        }
    }
}

fn union(families: &[&Lazy<Vec<DrVector>>]) -> Vec<DrVector> {
    families.iter().flat_map(|family| family.iter().copied()).collect()
}

// Pawns advance along rank and timeline. The sideways partner of rank is
// file, the sideways partner of timeline is time.
fn pawn_advances(color: Color) -> Vec<DrVector> {
    let f = color.forward();
    vec![DrVector::new([0, f, 0, 0]), DrVector::new([0, 0, 0, f])]
}

fn pawn_captures(color: Color) -> Vec<DrVector> {
    let f = color.forward();
    [-1, 1]
        .into_iter()
        .flat_map(|s| [DrVector::new([s, f, 0, 0]), DrVector::new([0, 0, s, f])])
        .collect()
}

fn brawn_captures(color: Color) -> Vec<DrVector> {
    let f = color.forward();
    let mut result = pawn_captures(color);
    result.push(DrVector::new([0, f, 0, f]));
    for s in [-1, 1] {
        result.push(DrVector::new([0, f, s, 0]));
        result.push(DrVector::new([s, 0, 0, f]));
    }
    result
}

static MOVESETS: Lazy<HashMap<Piece, Moveset>> = Lazy::new(|| {
    Color::iter()
        .flat_map(|color| PieceKind::iter().map(move |kind| Piece::new(color, kind)))
        .map(|piece| (piece, Moveset::build(piece)))
        .collect()
});

/// Walks the 4-D lattice from a starting position. It knows nothing about
/// which boards exist; everything about occupancy comes from the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveGenerator {
    size: usize,
}

impl MoveGenerator {
    pub fn new(size: usize) -> Self {
        Self { size }
    }

    /// Destinations `piece` can reach from `from`. Rays stop after the
    /// first capture or before the first blocked position; steps off the
    /// board or before time 0 count as blocked. `single_step` limits riders
    /// to their first step.
    pub fn legal_destinations<O>(&self, oracle: &O, piece: Piece, from: Position, single_step: bool) -> Vec<Position>
    where
        O: Occupancy + ?Sized,
    {
        let color = piece.color();
        let mut result = Vec::new();
        match Moveset::of(piece) {
            Moveset::Steps(vectors) => {
                for dr in vectors {
                    self.cast(oracle, color, from, dr, true, &mut result);
                }
            }
            Moveset::Rays(vectors) => {
                for dr in vectors {
                    self.cast(oracle, color, from, dr, single_step, &mut result);
                }
            }
            Moveset::Pawn { advances, captures } => {
                self.keep(oracle, color, from, advances, Probe::PassThrough, &mut result);
                self.keep(oracle, color, from, captures, Probe::Capture, &mut result);
            }
        }
        result
    }

    fn cast<O>(&self, oracle: &O, color: Color, from: Position, dr: &DrVector, single_step: bool, result: &mut Vec<Position>)
    where
        O: Occupancy + ?Sized,
    {
        let mut current = from;
        while let Some(next) = current.step(dr, self.size) {
            match oracle.probe(&next, color) {
                Probe::Blocked => break,
                Probe::Capture => {
                    result.push(next);
                    break;
                }
                Probe::PassThrough => {
                    result.push(next);
                    if single_step {
                        break;
                    }
                    current = next;
                }
            }
        }
    }

    fn keep<O>(&self, oracle: &O, color: Color, from: Position, vectors: &[DrVector], wanted: Probe, result: &mut Vec<Position>)
    where
        O: Occupancy + ?Sized,
    {
        result.extend(
            vectors
                .iter()
                .filter_map(|dr| from.step(dr, self.size))
                .filter(|to| oracle.probe(to, color) == wanted),
        );
    }
}
