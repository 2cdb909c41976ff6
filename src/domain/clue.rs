/// ClueField: first-ring proximity signals.
///
/// Every feature marks its four orthogonal in-bounds neighbours with its own
/// clue bit. Bits are OR-ed, so processing order never matters and calling
/// `annotate` twice on unchanged sets is a no-op.

use super::cell::CellFlags;
use super::entity::{Feature, Position, PositionSet};
use super::grid::Grid;

/// Desirability of stepping onto a cell, from the clues it carries.
/// Used by the autonomous fallback to rank neighbours.
const ITEM_CLUE_SCORE: i32 = 50;
const EXIT_CLUE_SCORE: i32 = 20;
const ADVERSARY_CLUE_SCORE: i32 = -50;

pub fn annotate(
    grid: &mut Grid,
    items: &PositionSet,
    obstacles: &PositionSet,
    exit: Position,
    adversary: Position,
) {
    for &p in items {
        mark_ring(grid, p, Feature::Item);
    }
    for &p in obstacles {
        mark_ring(grid, p, Feature::Obstacle);
    }
    mark_ring(grid, exit, Feature::Exit);
    mark_ring(grid, adversary, Feature::Adversary);
}

fn mark_ring(grid: &mut Grid, origin: Position, feature: Feature) {
    let bit = CellFlags::clue(feature);
    for (_, n) in origin.neighbors() {
        // Grid::mark drops out-of-bounds neighbours.
        grid.mark(n, bit);
    }
}

/// Score of a cell's clue bits; higher is more attractive.
pub fn clue_score(flags: CellFlags) -> i32 {
    let mut score = 0;
    if flags.senses(Feature::Item) {
        score += ITEM_CLUE_SCORE;
    }
    if flags.senses(Feature::Exit) {
        score += EXIT_CLUE_SCORE;
    }
    if flags.senses(Feature::Adversary) {
        score += ADVERSARY_CLUE_SCORE;
    }
    score
}

/// Flatten the clue layer into `(feature, position)` pairs, row-major.
pub fn clue_list(grid: &Grid) -> Vec<(Feature, Position)> {
    grid.iter()
        .flat_map(|(pos, flags)| flags.sensed_features().map(move |f| (f, pos)))
        .collect()
}
