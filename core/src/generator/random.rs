use alloc::collections::BTreeSet;
use ndarray::Array2;

use super::*;

/// Uniform placement by rejection sampling, leaving the 3x3 block around the
/// first-clicked cell mine-free.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct UniformRandomGenerator {
    seed: u64,
    anchor: GridPos,
}

impl UniformRandomGenerator {
    pub fn new(seed: u64, anchor: GridPos) -> Self {
        Self { seed, anchor }
    }
}

const fn pos_of(index: CellCount, size: Coord) -> GridPos {
    let size = size as CellCount;
    ((index / size) as Coord, (index % size) as Coord)
}

impl MinefieldGenerator for UniformRandomGenerator {
    fn generate(self, config: GameConfig) -> Result<Minefield> {
        use rand::prelude::*;

        // the 3x3 reserve is what keeps the sampling loop finite
        config.validate()?;

        let size = config.size;
        let total = config.total_cells();
        let mut rng = SmallRng::seed_from_u64(self.seed);
        let mut picked: BTreeSet<CellCount> = BTreeSet::new();

        while picked.len() < config.mines as usize {
            let index = rng.random_range(0..total);
            if in_safe_zone(pos_of(index, size), self.anchor) {
                continue;
            }
            picked.insert(index);
        }

        let mut mine_mask: Array2<bool> = Array2::default((size, size).nd_index());
        for index in picked {
            mine_mask[pos_of(index, size).nd_index()] = true;
        }

        let minefield = Minefield::from_mine_mask(mine_mask)?;
        log::debug!(
            "placed {} mines around anchor {:?}",
            minefield.mine_count(),
            self.anchor
        );
        Ok(minefield)
    }
}
