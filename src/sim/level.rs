/// Session spawn: random layouts with construction-time exclusion.
///
/// ## Placement order
///
///   actor     (0, 0)
///   exit      (R-1, C-1)
///   obstacles N uniform draws, never on actor start or exit
///   items     N uniform draws, never on actor start, exit or an obstacle
///   puzzles   N uniform draws, never on any of the above or an item
///   adversary uniform in [1,R)×[1,C), never on an obstacle
///
/// Draws are collected into sets, so duplicates and excluded cells simply
/// vanish: the configured counts are upper bounds. Every layout is a pure
/// function of the seed.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::config::{GameConfig, SpawnConfig};
use crate::domain::entity::{Bounds, Position, PositionSet};
use crate::domain::rules::MoveOracle;
use crate::sim::world::WorldState;

/// Starting positions for one session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    pub actor: Position,
    pub adversary: Position,
    pub exit: Position,
    pub items: PositionSet,
    pub obstacles: PositionSet,
    pub puzzles: PositionSet,
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Build the first session from config. A configured seed is used as is;
/// otherwise one is drawn from the OS.
pub fn new_game(config: &GameConfig, oracle: Option<Box<dyn MoveOracle>>) -> WorldState {
    let seed = config.spawn.seed.unwrap_or_else(rand::random);
    let (layout, rng) = layout_for_seed(config.bounds, &config.spawn, seed);
    let world = WorldState::new(config.bounds, layout, seed, rng).with_oracle(oracle);
    log_session(&world);
    world
}

/// Start over with a fresh layout. The next seed comes from the session's
/// own generator, so a seeded run replays the same sequence of sessions.
pub fn restart(world: &mut WorldState, spawn: &SpawnConfig) {
    let seed = world.rng.gen::<u64>();
    let (layout, rng) = layout_for_seed(world.bounds, spawn, seed);
    world.reset(layout, seed, rng);
    log_session(world);
}

pub fn layout_for_seed(bounds: Bounds, spawn: &SpawnConfig, seed: u64) -> (Layout, ChaCha8Rng) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let layout = generate(bounds, spawn, &mut rng);
    (layout, rng)
}

pub fn generate<R: Rng + ?Sized>(bounds: Bounds, spawn: &SpawnConfig, rng: &mut R) -> Layout {
    let actor = Position::new(0, 0);
    let exit = bounds.last();

    let mut taken: PositionSet = [actor, exit].into_iter().collect();
    let obstacles = scatter(bounds, spawn.obstacles, &taken, rng);
    taken.extend(&obstacles);
    let items = scatter(bounds, spawn.items, &taken, rng);
    taken.extend(&items);
    let puzzles = scatter(bounds, spawn.puzzles, &taken, rng);

    let adversary = place_adversary(bounds, &obstacles, rng);

    Layout { actor, adversary, exit, items, obstacles, puzzles }
}

// ══════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════

/// `draws` uniform cells, minus anything already taken.
fn scatter<R: Rng + ?Sized>(
    bounds: Bounds,
    draws: usize,
    taken: &PositionSet,
    rng: &mut R,
) -> PositionSet {
    (0..draws)
        .map(|_| random_cell(bounds, 0, 0, rng))
        .filter(|p| !taken.contains(p))
        .collect()
}

fn random_cell<R: Rng + ?Sized>(bounds: Bounds, min_row: usize, min_col: usize, rng: &mut R) -> Position {
    let row = rng.gen_range(min_row..bounds.rows);
    let col = rng.gen_range(min_col..bounds.cols);
    Position::new(row as i32, col as i32)
}

/// Uniform over the free cells of the lower-right region. The exit is never
/// an obstacle, so the region always has a free cell.
fn place_adversary<R: Rng + ?Sized>(bounds: Bounds, obstacles: &PositionSet, rng: &mut R) -> Position {
    let free: Vec<Position> = (1..bounds.rows)
        .flat_map(|r| (1..bounds.cols).map(move |c| Position::new(r as i32, c as i32)))
        .filter(|p| !obstacles.contains(p))
        .collect();
    free.choose(rng).copied().unwrap_or_else(|| bounds.last())
}

fn log_session(world: &WorldState) {
    info!(
        seed = world.seed,
        rows = world.bounds.rows,
        cols = world.bounds.cols,
        items = world.items.len(),
        obstacles = world.obstacles.len(),
        puzzles = world.puzzles.len(),
        adversary = %world.adversary.pos,
        oracle = world.oracle.is_some(),
        "session started"
    );
}
