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

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Neg;

use super::square::Square;

/// Identifies one board in the multiverse: how far along its timeline it is
/// and which timeline it belongs to. Timeline 0 is the root line; branches
/// spread out to positive and negative ids.
#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
pub struct TmCoord {
    pub time: u32,
    pub timeline: i32,
}

impl TmCoord {
    pub const ROOT: TmCoord = TmCoord::new(0, 0);

    #[inline]
    pub const fn new(time: u32, timeline: i32) -> Self {
        Self { time, timeline }
    }

    /// The coordinate one step later on the same timeline, `None` once
    /// time runs out.
    #[inline]
    pub fn next(self) -> Option<Self> {
        Some(Self::new(self.time.checked_add(1)?, self.timeline))
    }

    /// Steps by a (time, timeline) offset. Returns `None` before time 0.
    #[inline]
    pub fn offset(&self, dtime: i32, dtimeline: i32) -> Option<Self> {
        let time = self.time.checked_add_signed(dtime)?;
        let timeline = self.timeline.checked_add(dtimeline)?;
        Some(Self::new(time, timeline))
    }
}

impl fmt::Display for TmCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(T{}, L{:+})", self.time, self.timeline)
    }
}

/// A point in the combined (file, rank, time, timeline) space: a square on
/// the board found at `tm`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub square: Square,
    #[serde(flatten)]
    pub tm: TmCoord,
}

impl Position {
    #[inline]
    pub const fn new(square: Square, tm: TmCoord) -> Self {
        Self { square, tm }
    }

    #[inline]
    pub fn time(&self) -> u32 {
        self.tm.time
    }

    #[inline]
    pub fn timeline(&self) -> i32 {
        self.tm.timeline
    }

    /// Steps once along `dr`. Falling off the board or before time 0 gives
    /// `None`; whether a board exists at the new coordinate is not checked.
    #[inline]
    pub fn step(&self, dr: &DrVector, size: usize) -> Option<Self> {
        let square = self.square.offset(dr.file(), dr.rank(), size)?;
        let tm = self.tm.offset(dr.time(), dr.timeline())?;
        Some(Self::new(square, tm))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.square, self.tm)
    }
}

/// Axes of a `DrVector`, in component order.
pub const FILE: usize = 0;
pub const RANK: usize = 1;
pub const TIME: usize = 2;
pub const TIMELINE: usize = 3;

/// A step in the 4-D lattice: (Δfile, Δrank, Δtime, Δtimeline).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DrVector([i32; 4]);

impl DrVector {
    #[inline]
    pub const fn new(components: [i32; 4]) -> Self {
        Self(components)
    }

    #[inline]
    pub const fn components(&self) -> [i32; 4] {
        self.0
    }

    #[inline]
    pub const fn file(&self) -> i32 {
        self.0[FILE]
    }

    #[inline]
    pub const fn rank(&self) -> i32 {
        self.0[RANK]
    }

    #[inline]
    pub const fn time(&self) -> i32 {
        self.0[TIME]
    }

    #[inline]
    pub const fn timeline(&self) -> i32 {
        self.0[TIMELINE]
    }

    #[inline]
    pub fn is_spatial(&self) -> bool {
        self.time() == 0 && self.timeline() == 0
    }

    /// Number of axes the vector moves along.
    pub fn arity(&self) -> usize {
        self.0.iter().filter(|c| **c != 0).count()
    }
}

impl Neg for DrVector {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self(self.0.map(|c| -c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(name: &str, time: u32, timeline: i32) -> Position {
        Position::new(Square::parse(name, 8).unwrap(), TmCoord::new(time, timeline))
    }

    #[test]
    fn test_tm_offset() {
        let tm = TmCoord::new(2, -1);
        assert_eq!(tm.offset(-1, 1), Some(TmCoord::new(1, 0)));
        assert_eq!(tm.offset(-3, 0), None);
        assert_eq!(tm.next(), Some(TmCoord::new(3, -1)));
        assert_eq!(TmCoord::new(u32::MAX, 0).next(), None);
    }

    #[test]
    fn test_step_spatial() {
        let from = pos("d4", 0, 0);
        let dr = DrVector::new([1, 1, 0, 0]);
        assert_eq!(from.step(&dr, 8), Some(pos("e5", 0, 0)));
        assert_eq!(pos("h4", 0, 0).step(&dr, 8), None);
    }

    #[test]
    fn test_step_temporal() {
        let from = pos("d4", 1, 0);
        assert_eq!(from.step(&DrVector::new([0, 0, -1, 1]), 8), Some(pos("d4", 0, 1)));
        assert_eq!(from.step(&DrVector::new([0, 0, -2, 0]), 8), None);
        assert_eq!(from.step(&DrVector::new([0, 0, 0, -1]), 8), Some(pos("d4", 1, -1)));
    }

    #[test]
    fn test_vector_arithmetic() {
        let dr = DrVector::new([2, -1, 0, 1]);
        assert_eq!(-dr, DrVector::new([-2, 1, 0, -1]));
        assert_eq!(dr.arity(), 3);
        assert!(!dr.is_spatial());
        assert_eq!(dr.timeline(), 1);
    }

    #[test]
    fn test_display() {
        assert_eq!(TmCoord::new(3, -2).to_string(), "(T3, L-2)");
        assert_eq!(pos("e4", 1, 0).to_string(), "e4(T1, L+0)");
    }

    #[test]
    fn test_position_serde() {
        let json = serde_json::to_string(&pos("e2", 0, 0)).unwrap();
        assert_eq!(json, r#"{"square":"e2","time":0,"timeline":0}"#);
        let parsed: Position = serde_json::from_str(r#"{"square":"b7","time":3,"timeline":-1}"#).unwrap();
        assert_eq!(parsed, pos("b7", 3, -1));
    }
}
