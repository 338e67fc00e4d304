use crate::*;
pub use random::*;

mod random;

/// Strategy for materializing a minefield on the first reveal.
pub trait MinefieldGenerator {
    fn generate(self, config: GameConfig) -> Result<Minefield>;
}

/// True for the anchor cell and its Moore neighborhood, the 3x3 block kept
/// mine-free around the first click.
pub const fn in_safe_zone(pos: GridPos, anchor: GridPos) -> bool {
    pos.0.abs_diff(anchor.0) <= 1 && pos.1.abs_diff(anchor.1) <= 1
}
