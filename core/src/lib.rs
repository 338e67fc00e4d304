#![no_std]

extern crate alloc;

use core::ops::Index;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

pub use cell::*;
pub use engine::*;
pub use error::*;
pub use generator::*;
pub use types::*;

mod cell;
mod engine;
mod error;
mod generator;
mod types;

/// Requested board parameters: a square grid of `size` cells per edge and
/// `mines` mines.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub size: Coord,
    pub mines: CellCount,
}

impl GameConfig {
    pub const fn new_unchecked(size: Coord, mines: CellCount) -> Self {
        Self { size, mines }
    }

    /// Clamps to the playable range: at least a 1x1 board, and a mine count
    /// that leaves room for the 3x3 first-click reserve.
    pub fn new(size: Coord, mines: CellCount) -> Self {
        let size = size.max(1);
        let mines = mines.min(Self::new_unchecked(size, 0).mine_capacity());
        Self::new_unchecked(size, mines)
    }

    pub const fn total_cells(&self) -> CellCount {
        square(self.size)
    }

    /// Largest mine count that keeps a mine-free 3x3 block placeable around
    /// any first click.
    pub const fn mine_capacity(&self) -> CellCount {
        self.total_cells().saturating_sub(9)
    }

    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(GameError::InvalidBoardShape);
        }
        if self.mines > self.mine_capacity() {
            return Err(GameError::TooManyMines);
        }
        Ok(())
    }
}

/// Immutable mine placement for one game: a square boolean mask plus the
/// cached mine count.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Minefield {
    mine_mask: Array2<bool>,
    mine_count: CellCount,
}

impl Minefield {
    pub fn from_mine_mask(mine_mask: Array2<bool>) -> Result<Self> {
        let (rows, cols) = mine_mask.dim();
        if rows != cols || rows == 0 || rows > Coord::MAX as usize {
            return Err(GameError::InvalidBoardShape);
        }
        let mine_count = mine_mask
            .iter()
            .filter(|&&is_mine| is_mine)
            .count()
            .try_into()
            .unwrap();
        Ok(Self {
            mine_mask,
            mine_count,
        })
    }

    pub fn from_mine_coords(size: Coord, mine_coords: &[GridPos]) -> Result<Self> {
        let mut mine_mask: Array2<bool> = Array2::default((size, size).nd_index());

        for &pos in mine_coords {
            if pos.0 >= size || pos.1 >= size {
                return Err(GameError::InvalidCoords);
            }
            mine_mask[pos.nd_index()] = true;
        }

        Self::from_mine_mask(mine_mask)
    }

    pub fn game_config(&self) -> GameConfig {
        GameConfig::new_unchecked(self.size(), self.mine_count)
    }

    pub fn validate_pos(&self, pos: GridPos) -> Result<GridPos> {
        let size = self.size();
        if pos.0 < size && pos.1 < size {
            Ok(pos)
        } else {
            Err(GameError::InvalidCoords)
        }
    }

    pub fn size(&self) -> Coord {
        self.mine_mask.dim().0.try_into().unwrap()
    }

    pub fn total_cells(&self) -> CellCount {
        self.mine_mask.len().try_into().unwrap()
    }

    pub fn mine_count(&self) -> CellCount {
        self.mine_count
    }

    pub fn safe_cell_count(&self) -> CellCount {
        self.total_cells() - self.mine_count
    }

    pub fn contains_mine(&self, pos: GridPos) -> bool {
        self[pos]
    }

    /// Mines among the up-to-8 Moore neighbors of `pos`.
    pub fn adjacent_mine_count(&self, pos: GridPos) -> u8 {
        self.mine_mask
            .moore_neighbors(pos)
            .filter(|&p| self[p])
            .count()
            .try_into()
            .unwrap()
    }

    pub fn iter_mines(&self) -> impl Iterator<Item = GridPos> + '_ {
        self.mine_mask
            .indexed_iter()
            .filter(|&(_, &is_mine)| is_mine)
            .map(|((row, col), _)| (row as Coord, col as Coord))
    }

    pub(crate) fn neighbors(&self, pos: GridPos) -> MooreNeighbors {
        self.mine_mask.moore_neighbors(pos)
    }
}

impl Index<GridPos> for Minefield {
    type Output = bool;

    fn index(&self, (row, col): GridPos) -> &Self::Output {
        &self.mine_mask[(row as usize, col as usize)]
    }
}

/// Outcome of a flag toggle; `Flagged`/`Unflagged` is the cell's new state.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum FlagOutcome {
    NoChange,
    Flagged,
    Unflagged,
}

impl FlagOutcome {
    pub const fn has_update(self) -> bool {
        !matches!(self, Self::NoChange)
    }
}

/// Outcome of a reveal request.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum RevealOutcome {
    NoChange,
    Opened,
    Exploded,
    Won,
}

impl RevealOutcome {
    pub const fn has_update(self) -> bool {
        !matches!(self, Self::NoChange)
    }
}

impl Default for RevealOutcome {
    fn default() -> Self {
        Self::NoChange
    }
}
