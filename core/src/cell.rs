use serde::{Deserialize, Serialize};

/// Player-visible state of a single board cell.
///
/// `Exploded`, `Mine` and `Misflagged` only appear once the game is lost,
/// when the board is annotated for the final render.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CellState {
    Hidden,
    Revealed(u8),
    Flagged,
    Exploded,
    Mine,
    Misflagged,
}

impl CellState {
    pub const fn is_unrevealed(self) -> bool {
        matches!(self, Self::Hidden | Self::Flagged | Self::Misflagged)
    }

    pub const fn is_flagged(self) -> bool {
        matches!(self, Self::Flagged | Self::Misflagged)
    }
}

impl Default for CellState {
    fn default() -> Self {
        Self::Hidden
    }
}
