/// Move rules: propose, validate, decide.
///
/// Pure functions over the session's sets; nothing here moves the actor.
///
/// ## Validation Truth Table
///
/// ┌───────────────────────────────┬────────┬──────────────────────┐
/// │ Condition (checked in order)  │ Result │ Notes                │
/// ├───────────────────────────────┼────────┼──────────────────────┤
/// │ candidate outside [0,R)×[0,C) │ DENY   │ OutOfBounds          │
/// │ candidate ∈ obstacles         │ DENY   │ Obstacle, oracle or not │
/// │ no oracle configured          │ ALLOW  │ built-in path        │
/// │ oracle says illegal           │ DENY   │ OracleVeto           │
/// │ oracle unavailable / broken   │ ALLOW  │ logged, built-in wins│
/// │ otherwise                     │ ALLOW  │                      │
/// └───────────────────────────────┴────────┴──────────────────────┘
///
/// ## Greedy target
///
/// nearest item → nearest puzzle → exit (Manhattan distance, ties resolved
/// by set order). Rows are closed before columns.

use tracing::warn;

use super::clue;
use super::entity::{Actor, Bounds, Direction, Feature, Position, PositionSet};
use super::grid::Grid;
use crate::error::{MoveRejection, OracleError};

// ── Oracle seam ──

/// What an external legality source is told about a move.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OracleQuery<'a> {
    pub bounds: Bounds,
    pub current: Position,
    pub candidate: Position,
    pub obstacles: &'a PositionSet,
    pub clues: Vec<(Feature, Position)>,
}

/// An oracle's answer.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Verdict {
    pub legal: bool,
    /// A neighbour of `current` the oracle considers safe, if it has one.
    pub suggestion: Option<Position>,
}

impl Verdict {
    pub fn legal() -> Self {
        Verdict { legal: true, suggestion: None }
    }

    pub fn illegal(suggestion: Option<Position>) -> Self {
        Verdict { legal: false, suggestion }
    }
}

/// Optional external move-legality source. Injected into the session at
/// construction; the engine never requires one.
pub trait MoveOracle {
    fn judge(&self, query: &OracleQuery<'_>) -> Result<Verdict, OracleError>;
}

// ── Propose / validate ──

/// Where `dir` would take the actor. Pure; may leave the grid.
pub fn propose_move(pos: Position, dir: Direction) -> Position {
    pos.step(dir)
}

/// Full check of a candidate move. See truth table above.
pub fn validate(
    current: Position,
    candidate: Position,
    obstacles: &PositionSet,
    grid: &Grid,
    oracle: Option<&dyn MoveOracle>,
) -> Result<(), MoveRejection> {
    if !grid.bounds().contains(candidate) {
        return Err(MoveRejection::OutOfBounds);
    }
    if obstacles.contains(&candidate) {
        return Err(MoveRejection::Obstacle);
    }
    let oracle = match oracle {
        Some(o) => o,
        None => return Ok(()),
    };

    let query = OracleQuery {
        bounds: grid.bounds(),
        current,
        candidate,
        obstacles,
        clues: clue::clue_list(grid),
    };
    match oracle.judge(&query) {
        Ok(v) if v.legal => Ok(()),
        Ok(v) => Err(MoveRejection::OracleVeto { suggestion: v.suggestion }),
        Err(err) => {
            warn!(%err, %current, %candidate, "oracle unavailable, using built-in move check");
            Ok(())
        }
    }
}

/// Boolean form of [`validate`].
pub fn is_valid(
    current: Position,
    candidate: Position,
    obstacles: &PositionSet,
    grid: &Grid,
    oracle: Option<&dyn MoveOracle>,
) -> bool {
    validate(current, candidate, obstacles, grid, oracle).is_ok()
}

// ── Autonomous decision ──

/// Greedy heuristic direction. Read-only.
pub fn decide_autonomous_move(
    actor: Position,
    items: &PositionSet,
    puzzles: &PositionSet,
    exit: Position,
) -> Direction {
    let target = nearest(actor, items)
        .or_else(|| nearest(actor, puzzles))
        .unwrap_or(exit);
    head_toward(actor, target)
}

fn nearest(from: Position, set: &PositionSet) -> Option<Position> {
    // min_by_key keeps the first minimum, i.e. the smallest position on ties.
    set.iter().copied().min_by_key(|p| from.manhattan(*p))
}

/// Row first, then column; standing on the target yields `Up`.
pub fn head_toward(from: Position, target: Position) -> Direction {
    if target.row > from.row {
        Direction::Down
    } else if target.row < from.row {
        Direction::Up
    } else if target.col > from.col {
        Direction::Right
    } else if target.col < from.col {
        Direction::Left
    } else {
        Direction::Up
    }
}

/// Best valid neighbour when the greedy step is refused.
///
/// Ranks valid neighbours by clue score (ties keep `Direction::ALL` order)
/// and skips the cell the actor just left; stepping back is allowed only
/// when it is the sole valid move. `None` means the actor is boxed in.
pub fn fallback_move(
    actor: &Actor,
    obstacles: &PositionSet,
    grid: &Grid,
    oracle: Option<&dyn MoveOracle>,
) -> Option<Direction> {
    let mut best: Option<(Direction, i32)> = None;
    let mut backtrack: Option<Direction> = None;

    for (dir, cand) in actor.pos.neighbors() {
        if !is_valid(actor.pos, cand, obstacles, grid, oracle) {
            continue;
        }
        if cand == actor.last && actor.last != actor.pos {
            backtrack.get_or_insert(dir);
            continue;
        }
        let score = clue::clue_score(grid.cell_flags(cand));
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((dir, score));
        }
    }

    best.map(|(d, _)| d).or(backtrack)
}

/// Direction from `from` to an orthogonal neighbour `to`.
pub fn direction_to(from: Position, to: Position) -> Option<Direction> {
    from.neighbors().find(|(_, p)| *p == to).map(|(d, _)| d)
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
