/// Read-only view of a session for the renderer.
///
/// Owns copies of everything it shows, so rendering can never reach back
/// into the live session.

use crate::domain::collision::Outcome;
use crate::domain::entity::{Bounds, Position, PositionSet};
use crate::domain::grid::Grid;
use crate::sim::world::{Phase, WorldState};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub bounds: Bounds,
    pub actor: Position,
    pub adversary: Position,
    pub exit: Position,
    pub items: PositionSet,
    pub obstacles: PositionSet,
    pub puzzles: PositionSet,
    pub grid: Grid,
    pub phase: Phase,
    pub last_outcome: Option<Outcome>,
    pub collected: usize,
    pub items_total: usize,
    pub auto_mode: bool,
    pub message: String,
    pub seed: u64,
}

pub fn capture(world: &WorldState) -> Snapshot {
    Snapshot {
        bounds: world.bounds,
        actor: world.actor.pos,
        adversary: world.adversary.pos,
        exit: world.exit,
        items: world.items.clone(),
        obstacles: world.obstacles.clone(),
        puzzles: world.puzzles.clone(),
        grid: world.grid.clone(),
        phase: world.phase,
        last_outcome: world.last_outcome,
        collected: world.collected,
        items_total: world.items_total,
        auto_mode: world.auto_mode,
        message: world.message.clone(),
        seed: world.seed,
    }
}
