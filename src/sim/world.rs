/// WorldState: the one session object.
///
/// Owns every authoritative set, both entities, the derived grid, the
/// adversary's random source and the optional oracle. Nothing else holds
/// game state.
///
/// ## Derived grid
///
/// `grid` is occupancy + clue bits recomputed from the sets by
/// `refresh_grid()`. Every step that changes a set or an entity position
/// calls it before returning, so readers never see a stale mask.

use rand_chacha::ChaCha8Rng;

use crate::domain::clue;
use crate::domain::collision::Outcome;
use crate::domain::entity::{Actor, Adversary, Bounds, Position, PositionSet};
use crate::domain::grid::Grid;
use crate::domain::rules::MoveOracle;
use crate::sim::level::Layout;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Playing,
    Won,
    Caught,
}

impl Phase {
    pub fn is_over(self) -> bool {
        self != Phase::Playing
    }
}

pub struct WorldState {
    pub bounds: Bounds,

    // ── Entities ──
    pub actor: Actor,
    pub adversary: Adversary,
    pub exit: Position,

    // ── Authoritative sets (shrink only) ──
    pub items: PositionSet,
    pub obstacles: PositionSet,
    pub puzzles: PositionSet,

    // ── Derived ──
    pub grid: Grid,

    // ── Game tracking ──
    pub phase: Phase,
    pub last_outcome: Option<Outcome>,
    pub collected: usize,
    pub items_total: usize,
    pub auto_mode: bool,
    pub message: String,
    pub tick: u64,

    // ── Randomness ──
    /// Seed that produced this session's layout; logged and shown.
    pub seed: u64,
    /// Drives adversary wandering and the next restart's seed.
    pub rng: ChaCha8Rng,

    // ── Collaborators ──
    pub oracle: Option<Box<dyn MoveOracle>>,
}

impl WorldState {
    pub fn new(bounds: Bounds, layout: Layout, seed: u64, rng: ChaCha8Rng) -> Self {
        let mut world = WorldState {
            bounds,
            actor: Actor::new(layout.actor),
            adversary: Adversary::new(layout.adversary),
            exit: layout.exit,
            items_total: layout.items.len(),
            items: layout.items,
            obstacles: layout.obstacles,
            puzzles: layout.puzzles,
            grid: Grid::empty(bounds),
            phase: Phase::Playing,
            last_outcome: None,
            collected: 0,
            auto_mode: false,
            message: String::new(),
            tick: 0,
            seed,
            rng,
            oracle: None,
        };
        world.refresh_grid();
        world
    }

    pub fn with_oracle(mut self, oracle: Option<Box<dyn MoveOracle>>) -> Self {
        self.oracle = oracle;
        self
    }

    /// Replace the session contents with a fresh layout. The oracle survives.
    pub fn reset(&mut self, layout: Layout, seed: u64, rng: ChaCha8Rng) {
        let oracle = self.oracle.take();
        *self = WorldState::new(self.bounds, layout, seed, rng).with_oracle(oracle);
    }

    /// Recompute occupancy and clue layers from the authoritative sets.
    pub fn refresh_grid(&mut self) {
        let mut grid = Grid::rebuild(
            self.bounds,
            self.actor.pos,
            self.adversary.pos,
            &self.items,
            &self.obstacles,
            self.exit,
        );
        clue::annotate(&mut grid, &self.items, &self.obstacles, self.exit, self.adversary.pos);
        self.grid = grid;
    }

    pub fn oracle(&self) -> Option<&dyn MoveOracle> {
        self.oracle.as_deref()
    }

    /// Record an outcome and its status line.
    pub fn record(&mut self, outcome: Outcome) {
        self.last_outcome = Some(outcome);
        self.message = outcome.message().to_string();
    }
}
