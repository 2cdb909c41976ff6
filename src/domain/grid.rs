/// GridState: the R×C bitmask matrix.
///
/// Always rebuilt from the authoritative sets, never patched in place, so a
/// stale bit cannot survive a tick. Clue bits are layered on afterwards by
/// `clue::annotate`.
///
/// `cell_flags` does not bounds-check; every caller validates the position
/// against `Bounds` first. `get` is the checked variant for display code.

use super::cell::CellFlags;
use super::entity::{Bounds, Feature, Position, PositionSet};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    bounds: Bounds,
    cells: Vec<CellFlags>,
}

impl Grid {
    /// An all-clear grid.
    pub fn empty(bounds: Bounds) -> Self {
        Grid {
            bounds,
            cells: vec![CellFlags::empty(); bounds.cell_count()],
        }
    }

    /// Fresh occupancy layer from the current sets. No clue bits.
    pub fn rebuild(
        bounds: Bounds,
        actor: Position,
        adversary: Position,
        items: &PositionSet,
        obstacles: &PositionSet,
        exit: Position,
    ) -> Self {
        let mut grid = Grid::empty(bounds);
        grid.mark(actor, CellFlags::ACTOR);
        grid.mark(adversary, CellFlags::presence(Feature::Adversary));
        grid.mark(exit, CellFlags::presence(Feature::Exit));
        for &p in items {
            grid.mark(p, CellFlags::presence(Feature::Item));
        }
        for &p in obstacles {
            grid.mark(p, CellFlags::presence(Feature::Obstacle));
        }
        grid
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Raw mask at `pos`. `pos` must be in bounds.
    #[inline]
    pub fn cell_flags(&self, pos: Position) -> CellFlags {
        self.cells[self.index(pos)]
    }

    /// Checked lookup.
    pub fn get(&self, pos: Position) -> Option<CellFlags> {
        if self.bounds.contains(pos) {
            Some(self.cell_flags(pos))
        } else {
            None
        }
    }

    /// OR `flags` into the cell at `pos`. Out-of-bounds positions are ignored.
    pub fn mark(&mut self, pos: Position, flags: CellFlags) {
        if self.bounds.contains(pos) {
            let i = self.index(pos);
            self.cells[i] |= flags;
        }
    }

    /// Row-major iteration over `(position, mask)`.
    pub fn iter(&self) -> impl Iterator<Item = (Position, CellFlags)> + '_ {
        let cols = self.bounds.cols;
        self.cells.iter().enumerate().map(move |(i, &flags)| {
            (Position::new((i / cols) as i32, (i % cols) as i32), flags)
        })
    }

    #[inline]
    fn index(&self, pos: Position) -> usize {
        debug_assert!(self.bounds.contains(pos), "grid lookup out of bounds: {pos}");
        pos.row as usize * self.bounds.cols + pos.col as usize
    }
}
