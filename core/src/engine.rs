use alloc::collections::{BTreeSet, VecDeque};
use core::num::Saturating;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::*;

/// Valid transitions:
/// - NotStarted -> InProgress on the first reveal
/// - InProgress -> Lost when a revealed cell holds a mine
/// - InProgress -> Won when every safe cell is revealed
///
/// Won and Lost are terminal; no further mutation is accepted.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameStatus {
    NotStarted,
    InProgress,
    Won,
    Lost,
}

impl GameStatus {
    pub const fn is_initial(self) -> bool {
        matches!(self, Self::NotStarted)
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

impl Default for GameStatus {
    fn default() -> Self {
        Self::NotStarted
    }
}

/// Game-level transition reported by a successful operation.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Started,
    Won,
    Lost { exploded: GridPos },
}

/// Per-cell render event; the presentation layer repaints exactly the cells
/// listed in a report.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CellChange {
    Revealed { pos: GridPos, adjacent_mines: u8 },
    Flagged { pos: GridPos },
    Unflagged { pos: GridPos },
    MineShown { pos: GridPos, exploded: bool },
    Misflagged { pos: GridPos },
}

impl CellChange {
    pub const fn pos(self) -> GridPos {
        match self {
            Self::Revealed { pos, .. }
            | Self::Flagged { pos }
            | Self::Unflagged { pos }
            | Self::MineShown { pos, .. }
            | Self::Misflagged { pos } => pos,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RevealReport {
    pub outcome: RevealOutcome,
    pub cells: SmallVec<[CellChange; 8]>,
    pub events: SmallVec<[GameEvent; 2]>,
}

impl RevealReport {
    pub fn has_update(&self) -> bool {
        self.outcome.has_update()
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FlagReport {
    pub outcome: FlagOutcome,
    /// `mines - flags`; negative when over-flagged, which is cosmetic only.
    pub mines_left: isize,
}

impl FlagReport {
    pub fn has_update(&self) -> bool {
        self.outcome.has_update()
    }
}

/// Mine-clearing game engine with deferred mine placement.
///
/// The minefield does not exist until the first reveal; it is then generated
/// with the revealed cell as the safe anchor and never changes again.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameEngine {
    config: GameConfig,
    seed: u64,
    minefield: Option<Minefield>,
    board: Array2<CellState>,
    revealed_count: Saturating<CellCount>,
    flagged_count: Saturating<CellCount>,
    status: GameStatus,
    exploded_at: Option<GridPos>,
}

impl GameEngine {
    pub fn new(config: GameConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            seed,
            minefield: None,
            board: Array2::default((config.size, config.size).nd_index()),
            revealed_count: Saturating(0),
            flagged_count: Saturating(0),
            status: GameStatus::default(),
            exploded_at: None,
        })
    }

    /// Builds a game over a fixed minefield, skipping deferred placement.
    pub fn from_minefield(minefield: Minefield) -> Self {
        let size = minefield.size();
        Self {
            config: minefield.game_config(),
            seed: 0,
            minefield: Some(minefield),
            board: Array2::default((size, size).nd_index()),
            revealed_count: Saturating(0),
            flagged_count: Saturating(0),
            status: GameStatus::default(),
            exploded_at: None,
        }
    }

    /// Discards the current game and starts over with `config`.
    pub fn configure(&mut self, config: GameConfig, seed: u64) -> Result<()> {
        *self = Self::new(config, seed)?;
        Ok(())
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_won(&self) -> bool {
        matches!(self.status, GameStatus::Won)
    }

    pub fn is_lost(&self) -> bool {
        matches!(self.status, GameStatus::Lost)
    }

    pub fn size(&self) -> Coord {
        self.config.size
    }

    pub fn game_config(&self) -> GameConfig {
        self.config
    }

    pub fn total_mines(&self) -> CellCount {
        self.config.mines
    }

    pub fn revealed_count(&self) -> CellCount {
        self.revealed_count.0
    }

    /// How many mines have not been flagged yet; negative when over-flagged.
    pub fn mines_left(&self) -> isize {
        (self.config.mines as isize) - (self.flagged_count.0 as isize)
    }

    pub fn cell_at(&self, pos: GridPos) -> CellState {
        self.board[pos.nd_index()]
    }

    pub fn exploded_at(&self) -> Option<GridPos> {
        self.exploded_at
    }

    /// `None` until the first reveal materializes the placement.
    pub fn minefield(&self) -> Option<&Minefield> {
        self.minefield.as_ref()
    }

    pub fn reveal(&mut self, pos: GridPos) -> Result<RevealReport> {
        let pos = self.validate_pos(pos)?;
        self.check_not_ended()?;

        if !matches!(self.board[pos.nd_index()], CellState::Hidden) {
            // flagged and already-revealed cells silently ignore reveals
            return Ok(RevealReport::default());
        }

        // first reveal materializes the minefield around the clicked cell
        let minefield = match self.minefield.take() {
            Some(minefield) => minefield,
            None => UniformRandomGenerator::new(self.seed, pos).generate(self.config)?,
        };

        let mut report = RevealReport::default();

        if self.status.is_initial() {
            self.status = GameStatus::InProgress;
            report.events.push(GameEvent::Started);
            log::debug!("game started at {:?}", pos);
        }

        if minefield.contains_mine(pos) {
            self.explode(pos, &minefield, &mut report);
        } else {
            self.flood_reveal(pos, &minefield, &mut report);
        }

        self.minefield = Some(minefield);
        Ok(report)
    }

    pub fn toggle_flag(&mut self, pos: GridPos) -> Result<FlagReport> {
        let pos = self.validate_pos(pos)?;
        self.check_not_ended()?;

        let outcome = match self.board[pos.nd_index()] {
            CellState::Hidden => {
                self.board[pos.nd_index()] = CellState::Flagged;
                self.flagged_count += 1;
                FlagOutcome::Flagged
            }
            CellState::Flagged => {
                self.board[pos.nd_index()] = CellState::Hidden;
                self.flagged_count -= 1;
                FlagOutcome::Unflagged
            }
            _ => FlagOutcome::NoChange,
        };

        Ok(FlagReport {
            outcome,
            mines_left: self.mines_left(),
        })
    }

    fn explode(&mut self, pos: GridPos, minefield: &Minefield, report: &mut RevealReport) {
        self.board[pos.nd_index()] = CellState::Exploded;
        self.exploded_at = Some(pos);
        self.status = GameStatus::Lost;
        report.outcome = RevealOutcome::Exploded;
        report.cells.push(CellChange::MineShown {
            pos,
            exploded: true,
        });
        log::debug!("mine hit at {:?}", pos);

        // show every other mine; correctly flagged ones keep their flag
        for mine_pos in minefield.iter_mines() {
            if mine_pos == pos {
                continue;
            }
            if matches!(self.board[mine_pos.nd_index()], CellState::Hidden) {
                self.board[mine_pos.nd_index()] = CellState::Mine;
            }
            report.cells.push(CellChange::MineShown {
                pos: mine_pos,
                exploded: false,
            });
        }

        // call out flags that were sitting on safe cells
        let size = minefield.size();
        for row in 0..size {
            for col in 0..size {
                let p = (row, col);
                if matches!(self.board[p.nd_index()], CellState::Flagged)
                    && !minefield.contains_mine(p)
                {
                    self.board[p.nd_index()] = CellState::Misflagged;
                    report.cells.push(CellChange::Misflagged { pos: p });
                }
            }
        }

        report.events.push(GameEvent::Lost { exploded: pos });
    }

    fn flood_reveal(&mut self, start: GridPos, minefield: &Minefield, report: &mut RevealReport) {
        let adjacent_mines = minefield.adjacent_mine_count(start);
        self.board[start.nd_index()] = CellState::Revealed(adjacent_mines);
        self.revealed_count += 1;
        report.cells.push(CellChange::Revealed {
            pos: start,
            adjacent_mines,
        });

        if adjacent_mines == 0 {
            let mut visited = BTreeSet::from([start]);
            let mut to_visit: VecDeque<_> = minefield
                .neighbors(start)
                .filter(|&p| matches!(self.board[p.nd_index()], CellState::Hidden))
                .collect();

            while let Some(visit) = to_visit.pop_front() {
                if !visited.insert(visit) {
                    continue;
                }

                // may have been flagged or opened after being queued
                if !matches!(self.board[visit.nd_index()], CellState::Hidden) {
                    continue;
                }

                let visit_adjacent = minefield.adjacent_mine_count(visit);
                self.board[visit.nd_index()] = CellState::Revealed(visit_adjacent);
                self.revealed_count += 1;
                report.cells.push(CellChange::Revealed {
                    pos: visit,
                    adjacent_mines: visit_adjacent,
                });
                log::trace!("flood opened {:?}, adjacent mines: {}", visit, visit_adjacent);

                if visit_adjacent == 0 {
                    to_visit.extend(
                        minefield
                            .neighbors(visit)
                            .filter(|&p| matches!(self.board[p.nd_index()], CellState::Hidden))
                            .filter(|p| !visited.contains(p)),
                    );
                }
            }
        }

        if self.revealed_count == Saturating(minefield.safe_cell_count()) {
            self.status = GameStatus::Won;
            report.outcome = RevealOutcome::Won;
            report.events.push(GameEvent::Won);
            log::debug!("all safe cells revealed");
        } else {
            report.outcome = RevealOutcome::Opened;
        }
    }

    fn validate_pos(&self, pos: GridPos) -> Result<GridPos> {
        if pos.0 < self.config.size && pos.1 < self.config.size {
            Ok(pos)
        } else {
            Err(GameError::InvalidCoords)
        }
    }

    fn check_not_ended(&self) -> Result<()> {
        if self.status.is_terminal() {
            Err(GameError::AlreadyEnded)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(size: Coord, mines: &[GridPos]) -> Minefield {
        Minefield::from_mine_coords(size, mines).unwrap()
    }

    fn engine(size: Coord, mines: &[GridPos]) -> GameEngine {
        GameEngine::from_minefield(field(size, mines))
    }

    #[test]
    fn new_rejects_overfull_config() {
        assert_eq!(
            GameEngine::new(GameConfig::new_unchecked(3, 5), 0).unwrap_err(),
            GameError::TooManyMines
        );
    }

    #[test]
    fn first_reveal_materializes_the_minefield() {
        let mut engine = GameEngine::new(GameConfig::new_unchecked(5, 6), 7).unwrap();
        assert!(engine.minefield().is_none());
        assert_eq!(engine.status(), GameStatus::NotStarted);

        let report = engine.reveal((2, 2)).unwrap();

        assert!(report.events.contains(&GameEvent::Started));
        assert!(!engine.status().is_initial());
        let minefield = engine.minefield().unwrap();
        assert_eq!(minefield.mine_count(), 6);
        for mine in minefield.iter_mines() {
            assert!(!in_safe_zone(mine, (2, 2)));
        }
    }

    #[test]
    fn deferred_placement_keeps_every_seed_safe() {
        for seed in 0..32 {
            let mut engine = GameEngine::new(GameConfig::new_unchecked(5, 16), seed).unwrap();
            let report = engine.reveal((2, 2)).unwrap();
            // full capacity: the 3x3 reserve is the only open region
            assert_eq!(report.outcome, RevealOutcome::Won);
        }
    }

    #[test]
    fn reveal_mine_loses_and_lists_every_mine() {
        let mut engine = engine(3, &[(0, 0), (2, 2)]);

        let report = engine.reveal((0, 0)).unwrap();

        assert_eq!(report.outcome, RevealOutcome::Exploded);
        assert_eq!(engine.status(), GameStatus::Lost);
        assert!(engine.is_lost());
        assert_eq!(engine.exploded_at(), Some((0, 0)));
        assert_eq!(engine.cell_at((0, 0)), CellState::Exploded);
        assert_eq!(engine.cell_at((2, 2)), CellState::Mine);

        let mut shown: alloc::vec::Vec<_> = report
            .cells
            .iter()
            .filter_map(|change| match change {
                CellChange::MineShown { pos, exploded } => Some((*pos, *exploded)),
                _ => None,
            })
            .collect();
        shown.sort();
        assert_eq!(shown, [((0, 0), true), ((2, 2), false)]);
        assert!(report.events.contains(&GameEvent::Lost { exploded: (0, 0) }));
    }

    #[test]
    fn finished_game_rejects_all_moves() {
        let mut engine = engine(2, &[(0, 0)]);
        engine.reveal((0, 0)).unwrap();

        assert_eq!(engine.reveal((1, 1)).unwrap_err(), GameError::AlreadyEnded);
        assert_eq!(
            engine.toggle_flag((1, 1)).unwrap_err(),
            GameError::AlreadyEnded
        );
        assert_eq!(engine.cell_at((1, 1)), CellState::Hidden);
    }

    #[test]
    fn loss_marks_wrong_flags() {
        let mut engine = engine(3, &[(0, 0)]);
        engine.toggle_flag((1, 1)).unwrap();

        let report = engine.reveal((0, 0)).unwrap();

        assert_eq!(engine.cell_at((1, 1)), CellState::Misflagged);
        assert!(report.cells.contains(&CellChange::Misflagged { pos: (1, 1) }));
    }

    #[test]
    fn flood_fill_opens_the_zero_region() {
        let mut engine = engine(3, &[(2, 2)]);

        let report = engine.reveal((0, 0)).unwrap();

        assert_eq!(report.outcome, RevealOutcome::Won);
        assert_eq!(engine.cell_at((0, 0)), CellState::Revealed(0));
        assert_eq!(engine.cell_at((1, 1)), CellState::Revealed(1));
        assert_eq!(engine.cell_at((2, 2)), CellState::Hidden);
        assert_eq!(engine.revealed_count(), 8);
    }

    #[test]
    fn numbered_cell_stops_the_flood() {
        let mut engine = engine(3, &[(0, 1), (2, 1)]);

        let report = engine.reveal((1, 1)).unwrap();

        assert_eq!(report.outcome, RevealOutcome::Opened);
        assert_eq!(
            report.cells.as_slice(),
            [CellChange::Revealed {
                pos: (1, 1),
                adjacent_mines: 2
            }]
        );
        for pos in [(0, 0), (0, 2), (1, 0), (1, 2), (2, 0), (2, 2)] {
            assert_eq!(engine.cell_at(pos), CellState::Hidden);
        }
    }

    #[test]
    fn flood_reveal_is_idempotent() {
        // a wall of mines keeps the right column shut, so the game stays live
        let wall = [(0, 3), (1, 3), (2, 3), (3, 3), (4, 3)];
        let mut engine = engine(5, &wall);

        let first = engine.reveal((0, 0)).unwrap();
        assert_eq!(first.outcome, RevealOutcome::Opened);
        let opened = engine.revealed_count();
        assert_eq!(opened, 15);

        let second = engine.reveal((0, 0)).unwrap();
        assert_eq!(second.outcome, RevealOutcome::NoChange);
        assert!(second.cells.is_empty());
        assert_eq!(engine.revealed_count(), opened);
    }

    #[test]
    fn reveal_same_cell_twice_is_a_noop() {
        let mut engine = engine(3, &[(0, 1), (2, 1)]);

        engine.reveal((1, 1)).unwrap();
        let report = engine.reveal((1, 1)).unwrap();

        assert_eq!(report.outcome, RevealOutcome::NoChange);
        assert!(report.cells.is_empty());
        assert_eq!(engine.revealed_count(), 1);
    }

    #[test]
    fn flagged_cell_ignores_reveal_requests() {
        let mut engine = engine(3, &[(0, 0)]);
        engine.toggle_flag((2, 2)).unwrap();

        let report = engine.reveal((2, 2)).unwrap();

        assert_eq!(report.outcome, RevealOutcome::NoChange);
        assert_eq!(engine.cell_at((2, 2)), CellState::Flagged);
    }

    #[test]
    fn flood_never_opens_flagged_cells() {
        let mut engine = engine(3, &[(2, 2)]);
        engine.toggle_flag((0, 2)).unwrap();

        let report = engine.reveal((0, 0)).unwrap();

        // the flagged safe cell stays shut, so the board is not yet won
        assert_eq!(report.outcome, RevealOutcome::Opened);
        assert_eq!(engine.cell_at((0, 2)), CellState::Flagged);
        assert_eq!(engine.revealed_count(), 7);

        engine.toggle_flag((0, 2)).unwrap();
        let report = engine.reveal((0, 2)).unwrap();
        assert_eq!(report.outcome, RevealOutcome::Won);
    }

    #[test]
    fn win_is_order_independent() {
        for order in [
            [(0, 1), (1, 0), (1, 1)],
            [(1, 1), (0, 1), (1, 0)],
            [(1, 0), (1, 1), (0, 1)],
        ] {
            let mut engine = engine(2, &[(0, 0)]);
            let mut outcomes = alloc::vec::Vec::new();
            for pos in order {
                outcomes.push(engine.reveal(pos).unwrap().outcome);
            }
            assert_eq!(outcomes[..2], [RevealOutcome::Opened, RevealOutcome::Opened]);
            assert_eq!(outcomes[2], RevealOutcome::Won);
            assert!(engine.is_won());
        }
    }

    #[test]
    fn win_leaves_flags_and_mines_untouched() {
        let mut engine = engine(2, &[(0, 0)]);
        engine.toggle_flag((0, 0)).unwrap();

        for pos in [(0, 1), (1, 0), (1, 1)] {
            engine.reveal(pos).unwrap();
        }

        assert!(engine.is_won());
        assert_eq!(engine.cell_at((0, 0)), CellState::Flagged);
        assert_eq!(engine.mines_left(), 0);
    }

    #[test]
    fn unflagged_mine_stays_hidden_after_win() {
        let mut engine = engine(2, &[(0, 0)]);

        for pos in [(0, 1), (1, 0), (1, 1)] {
            engine.reveal(pos).unwrap();
        }

        assert!(engine.is_won());
        assert_eq!(engine.cell_at((0, 0)), CellState::Hidden);
        assert_eq!(engine.mines_left(), 1);
    }

    #[test]
    fn toggle_flag_twice_restores_the_cell() {
        let mut engine = engine(3, &[(0, 0)]);

        let report = engine.toggle_flag((1, 1)).unwrap();
        assert_eq!(report.outcome, FlagOutcome::Flagged);
        assert_eq!(report.mines_left, 0);

        let report = engine.toggle_flag((1, 1)).unwrap();
        assert_eq!(report.outcome, FlagOutcome::Unflagged);
        assert_eq!(report.mines_left, 1);
        assert_eq!(engine.cell_at((1, 1)), CellState::Hidden);
        assert_eq!(engine.revealed_count(), 0);
    }

    #[test]
    fn over_flagging_goes_negative() {
        let mut engine = engine(3, &[(0, 0)]);

        engine.toggle_flag((1, 1)).unwrap();
        let report = engine.toggle_flag((2, 2)).unwrap();

        assert_eq!(report.mines_left, -1);
        assert_eq!(engine.mines_left(), -1);
    }

    #[test]
    fn flags_are_accepted_before_the_first_reveal() {
        let mut engine = GameEngine::new(GameConfig::new_unchecked(5, 6), 11).unwrap();

        let report = engine.toggle_flag((0, 0)).unwrap();

        assert_eq!(report.outcome, FlagOutcome::Flagged);
        assert_eq!(engine.status(), GameStatus::NotStarted);
        assert!(engine.minefield().is_none());
    }

    #[test]
    fn revealed_cell_ignores_flag_requests() {
        let mut engine = engine(3, &[(0, 1), (2, 1)]);
        engine.reveal((1, 1)).unwrap();

        let report = engine.toggle_flag((1, 1)).unwrap();

        assert_eq!(report.outcome, FlagOutcome::NoChange);
        assert_eq!(engine.cell_at((1, 1)), CellState::Revealed(2));
    }

    #[test]
    fn out_of_bounds_positions_are_rejected() {
        let mut engine = engine(3, &[(0, 0)]);

        assert_eq!(engine.reveal((3, 0)).unwrap_err(), GameError::InvalidCoords);
        assert_eq!(
            engine.toggle_flag((0, 3)).unwrap_err(),
            GameError::InvalidCoords
        );
    }

    #[test]
    fn configure_resets_everything() {
        let mut engine = GameEngine::new(GameConfig::new_unchecked(5, 6), 3).unwrap();
        engine.reveal((2, 2)).unwrap();
        engine.toggle_flag((0, 0)).ok();

        engine.configure(GameConfig::new_unchecked(4, 2), 9).unwrap();

        assert_eq!(engine.status(), GameStatus::NotStarted);
        assert_eq!(engine.size(), 4);
        assert_eq!(engine.revealed_count(), 0);
        assert_eq!(engine.mines_left(), 2);
        assert!(engine.minefield().is_none());
        assert_eq!(engine.cell_at((0, 0)), CellState::Hidden);
    }
}
