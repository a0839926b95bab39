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

use super::material::Color;
use super::slice::BoardError;

/// Settings fixed for the lifetime of a multiverse.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct MultiverseConfig {
    /// Side length of every board.
    pub board_size: usize,
    /// The color that moves on the root board. It decides which side of the
    /// multiverse each new branch is allocated on.
    pub first_turn: Color,
}

impl Default for MultiverseConfig {
    fn default() -> Self {
        Self {
            board_size: 8,
            first_turn: Color::Light,
        }
    }
}

impl MultiverseConfig {
    pub fn new(board_size: usize, first_turn: Color) -> Self {
        Self {
            board_size,
            first_turn,
        }
    }

    /// 0 when light moves first, 1 when dark does.
    #[inline]
    pub fn first_turn_parity(&self) -> i64 {
        self.first_turn.to_index() as i64
    }

    /// # Errors
    ///
    /// Returns `BoardError::UnsupportedSize` unless `1 <= board_size <= 26`.
    pub fn validate(&self) -> Result<()> {
        if self.board_size == 0 || self.board_size > super::square::MAX_BOARD_SIZE {
            return Err(BoardError::UnsupportedSize(self.board_size).into());
        }
        Ok(())
    }
}
