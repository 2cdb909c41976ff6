/// Step functions: each advances the session by one discrete tick.
///
/// Three independent entry points, driven by the event loop on their own
/// cadences:
///   - `step_actor`      one requested move (key press)
///   - `step_autonomous` one self-driven move (autonomous cadence)
///   - `step_adversary`  one random wander (adversary cadence)
///
/// Actor move order:
///   1. Propose candidate
///   2. Validate (bounds → obstacle → oracle); refusal = Blocked, actor stays
///   3. Relocate actor, remembering the previous cell
///   4. Resolve collision (may shrink items / puzzles, may end the session)
///   5. Rebuild grid + clues
///
/// Every step is a no-op once the session is over. No error escapes a step:
/// rejections and oracle failures become events and log lines.

use tracing::{debug, error, info};

use crate::domain::ai;
use crate::domain::collision::{self, Outcome};
use crate::domain::entity::{Direction, Position};
use crate::domain::rules;
use crate::error::MoveRejection;
use super::event::GameEvent;
use super::world::{Phase, WorldState};

// ══════════════════════════════════════════════════════════════
// Actor
// ══════════════════════════════════════════════════════════════

/// Direction keys are ignored while autonomous mode drives the actor.
pub fn step_actor(world: &mut WorldState, dir: Direction) -> Vec<GameEvent> {
    if world.phase != Phase::Playing || world.auto_mode { return vec![]; }

    let mut events = Vec::new();
    world.tick += 1;

    let from = world.actor.pos;
    let candidate = rules::propose_move(from, dir);
    match rules::validate(from, candidate, &world.obstacles, &world.grid, world.oracle()) {
        Ok(()) => apply_move(world, candidate, &mut events),
        Err(reason) => reject(world, candidate, reason, &mut events),
    }
    events
}

/// One autonomous move: greedy direction, else the oracle's suggestion,
/// else the best-scoring clue neighbour. Boxed in = Blocked.
pub fn step_autonomous(world: &mut WorldState) -> Vec<GameEvent> {
    if world.phase != Phase::Playing || !world.auto_mode { return vec![]; }

    let mut events = Vec::new();
    world.tick += 1;

    let from = world.actor.pos;
    let dir = rules::decide_autonomous_move(from, &world.items, &world.puzzles, world.exit);
    let candidate = rules::propose_move(from, dir);

    let reason = match rules::validate(from, candidate, &world.obstacles, &world.grid, world.oracle()) {
        Ok(()) => {
            apply_move(world, candidate, &mut events);
            return events;
        }
        Err(reason) => reason,
    };
    events.push(GameEvent::MoveRejected { candidate, reason });

    let suggested = match reason {
        MoveRejection::OracleVeto { suggestion: Some(s) } => usable_suggestion(world, s),
        _ => None,
    };
    let next = suggested.or_else(|| {
        rules::fallback_move(&world.actor, &world.obstacles, &world.grid, world.oracle())
            .map(|d| rules::propose_move(from, d))
    });

    match next {
        Some(to) => apply_move(world, to, &mut events),
        None => {
            debug!(at = %from, "autonomous actor boxed in");
            world.record(Outcome::Blocked);
        }
    }
    events
}

/// An oracle suggestion counts only if it is an orthogonal neighbour that
/// passes the full check itself.
fn usable_suggestion(world: &WorldState, s: Position) -> Option<Position> {
    let from = world.actor.pos;
    rules::direction_to(from, s)?;
    rules::is_valid(from, s, &world.obstacles, &world.grid, world.oracle()).then_some(s)
}

fn reject(world: &mut WorldState, candidate: Position, reason: MoveRejection, events: &mut Vec<GameEvent>) {
    debug!(%candidate, %reason, "move rejected");
    world.record(Outcome::Blocked);
    events.push(GameEvent::MoveRejected { candidate, reason });
}

/// Relocate the actor onto an already-validated cell and resolve it.
fn apply_move(world: &mut WorldState, to: Position, events: &mut Vec<GameEvent>) {
    let before = world.actor.clone();
    let from = before.pos;
    world.actor.move_to(to);

    let outcome = collision::resolve(
        world.actor.pos,
        world.adversary.pos,
        &mut world.items,
        &mut world.puzzles,
        &world.obstacles,
        world.exit,
    );

    match outcome {
        Outcome::Blocked => {
            // Validation should make this unreachable; undo the move.
            error!(at = %to, "invariant violation: actor placed on an obstacle");
            world.actor = before;
            events.push(GameEvent::InvariantViolation { at: to });
        }
        Outcome::Caught => {
            world.phase = Phase::Caught;
            info!(at = %to, collected = world.collected, "actor walked into the adversary");
            events.push(GameEvent::ActorMoved { from, to });
            events.push(GameEvent::Caught { at: to });
        }
        Outcome::ItemCollected => {
            world.collected += 1;
            events.push(GameEvent::ActorMoved { from, to });
            events.push(GameEvent::ItemCollected { at: to, remaining: world.items.len() });
        }
        Outcome::PuzzleSolved => {
            events.push(GameEvent::ActorMoved { from, to });
            events.push(GameEvent::PuzzleSolved { at: to });
        }
        Outcome::Won => {
            world.phase = Phase::Won;
            info!(collected = world.collected, ticks = world.tick, "exit reached with every item");
            events.push(GameEvent::ActorMoved { from, to });
            events.push(GameEvent::Won);
        }
        Outcome::ExitBlockedByRemainingItems => {
            events.push(GameEvent::ActorMoved { from, to });
            events.push(GameEvent::ExitLocked { remaining: world.items.len() });
        }
        Outcome::Moved => {
            events.push(GameEvent::ActorMoved { from, to });
        }
    }

    debug!(%from, to = %world.actor.pos, ?outcome, "actor tick");
    if outcome.is_terminal() {
        world.auto_mode = false;
    }
    world.record(outcome);
    world.refresh_grid();
}

// ══════════════════════════════════════════════════════════════
// Adversary
// ══════════════════════════════════════════════════════════════

/// One adversary wander. Landing on the actor ends the session.
pub fn step_adversary(world: &mut WorldState) -> Vec<GameEvent> {
    if world.phase != Phase::Playing { return vec![]; }

    let mut events = Vec::new();
    let from = world.adversary.pos;
    let to = ai::tick(from, world.bounds, &world.obstacles, &mut world.rng);
    world.adversary.pos = to;
    debug!(%from, %to, "adversary tick");

    if to != from {
        events.push(GameEvent::AdversaryMoved { from, to });
    }
    if to == world.actor.pos {
        world.phase = Phase::Caught;
        world.auto_mode = false;
        world.record(Outcome::Caught);
        info!(at = %to, collected = world.collected, "adversary caught the actor");
        events.push(GameEvent::Caught { at: to });
    }

    world.refresh_grid();
    events
}

// ══════════════════════════════════════════════════════════════
// Mode
// ══════════════════════════════════════════════════════════════

pub fn toggle_auto(world: &mut WorldState) -> Vec<GameEvent> {
    if world.phase != Phase::Playing { return vec![]; }

    world.auto_mode = !world.auto_mode;
    world.message = if world.auto_mode {
        "Autonomous mode on.".to_string()
    } else {
        "Autonomous mode off.".to_string()
    };
    info!(enabled = world.auto_mode, "autonomous mode toggled");
    vec![GameEvent::AutoModeChanged { enabled: world.auto_mode }]
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::domain::entity::{Actor, Bounds, PositionSet};
    use crate::domain::rules::{MoveOracle, OracleQuery, Verdict};
    use crate::error::OracleError;
    use crate::sim::level::Layout;

    fn p(r: i32, c: i32) -> Position {
        Position::new(r, c)
    }

    fn set(ps: &[(i32, i32)]) -> PositionSet {
        ps.iter().map(|&(r, c)| p(r, c)).collect()
    }

    fn world(items: &[(i32, i32)], obstacles: &[(i32, i32)], puzzles: &[(i32, i32)], adversary: Position) -> WorldState {
        let layout = Layout {
            actor: p(0, 0),
            adversary,
            exit: p(9, 9),
            items: set(items),
            obstacles: set(obstacles),
            puzzles: set(puzzles),
        };
        WorldState::new(Bounds::new(10, 10), layout, 0, ChaCha8Rng::seed_from_u64(0))
    }

    /// Vetoes one cell, optionally suggesting another; counts calls.
    struct VetoOracle {
        veto: Position,
        suggest: Option<Position>,
        calls: Cell<u32>,
    }

    impl MoveOracle for VetoOracle {
        fn judge(&self, q: &OracleQuery<'_>) -> Result<Verdict, OracleError> {
            self.calls.set(self.calls.get() + 1);
            if q.candidate == self.veto {
                Ok(Verdict::illegal(self.suggest))
            } else {
                Ok(Verdict::legal())
            }
        }
    }

    struct DeadOracle;

    impl MoveOracle for DeadOracle {
        fn judge(&self, _: &OracleQuery<'_>) -> Result<Verdict, OracleError> {
            Err(OracleError::Timeout(std::time::Duration::from_millis(1)))
        }
    }

    #[test]
    fn blocked_by_obstacle_leaves_actor() {
        let mut w = world(&[(5, 5)], &[(0, 1)], &[], p(9, 0));
        let grid_before = w.grid.clone();
        let events = step_actor(&mut w, Direction::Right);
        assert_eq!(w.actor.pos, p(0, 0));
        assert_eq!(w.last_outcome, Some(Outcome::Blocked));
        assert_eq!(
            events,
            vec![GameEvent::MoveRejected { candidate: p(0, 1), reason: MoveRejection::Obstacle }]
        );
        assert_eq!(w.grid, grid_before);
    }

    #[test]
    fn off_grid_is_blocked() {
        let mut w = world(&[(5, 5)], &[], &[], p(9, 0));
        step_actor(&mut w, Direction::Up);
        step_actor(&mut w, Direction::Left);
        assert_eq!(w.actor.pos, p(0, 0));
        assert_eq!(w.last_outcome, Some(Outcome::Blocked));
    }

    #[test]
    fn move_updates_grid_and_last() {
        let mut w = world(&[(5, 5)], &[], &[], p(9, 0));
        let events = step_actor(&mut w, Direction::Down);
        assert_eq!(events, vec![GameEvent::ActorMoved { from: p(0, 0), to: p(1, 0) }]);
        assert_eq!(w.actor.last, p(0, 0));
        assert!(w.grid.cell_flags(p(1, 0)).has_actor());
        assert!(!w.grid.cell_flags(p(0, 0)).has_actor());
    }

    #[test]
    fn collect_then_exit_wins() {
        let mut w = world(&[(9, 8)], &[], &[], p(0, 9));
        w.actor.pos = p(8, 8);
        w.refresh_grid();

        let events = step_actor(&mut w, Direction::Down);
        assert!(events.contains(&GameEvent::ItemCollected { at: p(9, 8), remaining: 0 }));
        assert_eq!(w.collected, 1);
        assert!(!w.grid.cell_flags(p(9, 8)).has_item());

        let events = step_actor(&mut w, Direction::Right);
        assert!(events.contains(&GameEvent::Won));
        assert_eq!(w.phase, Phase::Won);

        // Session over: further steps are ignored.
        assert!(step_actor(&mut w, Direction::Left).is_empty());
        assert!(step_adversary(&mut w).is_empty());
        assert_eq!(w.actor.pos, p(9, 9));
    }

    #[test]
    fn exit_locked_while_items_remain() {
        let mut w = world(&[(0, 5)], &[], &[], p(0, 9));
        w.actor.pos = p(9, 8);
        let events = step_actor(&mut w, Direction::Right);
        assert!(events.contains(&GameEvent::ExitLocked { remaining: 1 }));
        assert_eq!(w.phase, Phase::Playing);
        assert_eq!(w.last_outcome, Some(Outcome::ExitBlockedByRemainingItems));
    }

    #[test]
    fn puzzle_solved_once() {
        let mut w = world(&[(5, 5)], &[], &[(1, 0)], p(9, 0));
        let events = step_actor(&mut w, Direction::Down);
        assert!(events.contains(&GameEvent::PuzzleSolved { at: p(1, 0) }));
        assert!(w.puzzles.is_empty());
        step_actor(&mut w, Direction::Up);
        let events = step_actor(&mut w, Direction::Down);
        assert_eq!(events, vec![GameEvent::ActorMoved { from: p(0, 0), to: p(1, 0) }]);
    }

    #[test]
    fn walking_into_adversary_is_caught() {
        let mut w = world(&[(5, 5)], &[], &[], p(1, 0));
        let events = step_actor(&mut w, Direction::Down);
        assert!(events.contains(&GameEvent::Caught { at: p(1, 0) }));
        assert_eq!(w.phase, Phase::Caught);
    }

    #[test]
    fn adversary_landing_on_actor_is_caught() {
        // Adversary at (1,1) boxed so its only free neighbour is the actor's cell.
        let mut w = world(&[(5, 5)], &[(2, 1), (1, 2), (1, 0)], &[], p(1, 1));
        w.actor.pos = p(0, 1);
        w.refresh_grid();

        let events = step_adversary(&mut w);
        assert_eq!(w.adversary.pos, p(0, 1));
        assert!(events.contains(&GameEvent::Caught { at: p(0, 1) }));
        assert_eq!(w.phase, Phase::Caught);
        assert_eq!(w.last_outcome, Some(Outcome::Caught));
    }

    #[test]
    fn boxed_adversary_emits_nothing() {
        let mut w = world(&[(5, 5)], &[(8, 9), (9, 8)], &[], p(9, 9));
        for _ in 0..10 {
            assert!(step_adversary(&mut w).is_empty());
        }
        assert_eq!(w.adversary.pos, p(9, 9));
    }

    #[test]
    fn oracle_veto_blocks_and_outage_allows() {
        let mut w = world(&[(5, 5)], &[], &[], p(9, 0)).with_oracle(Some(Box::new(VetoOracle {
            veto: p(1, 0),
            suggest: None,
            calls: Cell::new(0),
        })));
        let events = step_actor(&mut w, Direction::Down);
        assert_eq!(
            events,
            vec![GameEvent::MoveRejected {
                candidate: p(1, 0),
                reason: MoveRejection::OracleVeto { suggestion: None },
            }]
        );
        assert_eq!(w.actor.pos, p(0, 0));

        let mut w = world(&[(5, 5)], &[], &[], p(9, 0)).with_oracle(Some(Box::new(DeadOracle)));
        step_actor(&mut w, Direction::Down);
        assert_eq!(w.actor.pos, p(1, 0));
    }

    #[test]
    fn auto_mode_off_does_nothing() {
        let mut w = world(&[(5, 5)], &[], &[], p(9, 0));
        assert!(step_autonomous(&mut w).is_empty());
        assert_eq!(w.actor.pos, p(0, 0));
    }

    #[test]
    fn direction_keys_ignored_in_auto_mode() {
        let mut w = world(&[(5, 5)], &[], &[], p(9, 0));
        toggle_auto(&mut w);
        let tick = w.tick;
        assert!(step_actor(&mut w, Direction::Right).is_empty());
        assert_eq!(w.actor.pos, p(0, 0));
        assert_eq!(w.tick, tick);

        toggle_auto(&mut w);
        step_actor(&mut w, Direction::Right);
        assert_eq!(w.actor.pos, p(0, 1));
    }

    #[test]
    fn autonomous_follows_greedy() {
        let mut w = world(&[(5, 5)], &[(0, 1)], &[], p(9, 0));
        toggle_auto(&mut w);
        assert!(w.auto_mode);
        step_autonomous(&mut w);
        assert_eq!(w.actor.pos, p(1, 0));
    }

    #[test]
    fn autonomous_falls_back_around_obstacle() {
        // Greedy wants Down into (1,0); fallback picks the only other valid cell.
        let mut w = world(&[(5, 0)], &[(1, 0)], &[], p(9, 9));
        toggle_auto(&mut w);
        let events = step_autonomous(&mut w);
        assert_eq!(events[0], GameEvent::MoveRejected { candidate: p(1, 0), reason: MoveRejection::Obstacle });
        assert_eq!(w.actor.pos, p(0, 1));
    }

    #[test]
    fn autonomous_boxed_in_reports_blocked() {
        let mut w = world(&[(5, 5)], &[(0, 1), (1, 0)], &[], p(9, 9));
        toggle_auto(&mut w);
        step_autonomous(&mut w);
        assert_eq!(w.actor.pos, p(0, 0));
        assert_eq!(w.last_outcome, Some(Outcome::Blocked));
        assert_eq!(w.phase, Phase::Playing);
    }

    #[test]
    fn autonomous_prefers_oracle_suggestion() {
        // Greedy Down is vetoed. The suggested cell (4,3) carries an
        // adversary clue, so the scored fallback alone would go Right.
        let run = |suggest: Option<Position>| {
            let mut w = world(&[(9, 4)], &[], &[], p(4, 2)).with_oracle(Some(Box::new(VetoOracle {
                veto: p(5, 4),
                suggest,
                calls: Cell::new(0),
            })));
            w.actor = Actor::new(p(4, 4));
            w.refresh_grid();
            toggle_auto(&mut w);
            step_autonomous(&mut w);
            w.actor.pos
        };
        assert_eq!(run(Some(p(4, 3))), p(4, 3));
        assert_eq!(run(None), p(4, 5));
    }

    #[test]
    fn bad_suggestion_is_ignored() {
        // Suggests a non-neighbour; fallback decides instead.
        let mut w = world(&[(5, 0)], &[(0, 1)], &[], p(9, 9)).with_oracle(Some(Box::new(VetoOracle {
            veto: p(1, 0),
            suggest: Some(p(4, 4)),
            calls: Cell::new(0),
        })));
        toggle_auto(&mut w);
        step_autonomous(&mut w);
        // Down vetoed, Right is an obstacle, Up/Left off grid: boxed in.
        assert_eq!(w.actor.pos, p(0, 0));
        assert_eq!(w.last_outcome, Some(Outcome::Blocked));
    }

    #[test]
    fn autonomous_session_reaches_an_end() {
        // Open board, adversary frozen far away: greedy play must collect
        // everything and win.
        let mut w = world(&[(3, 4), (7, 2)], &[(2, 2)], &[(5, 5)], p(9, 0));
        toggle_auto(&mut w);
        for _ in 0..200 {
            step_autonomous(&mut w);
            if w.phase.is_over() { break; }
        }
        assert_eq!(w.phase, Phase::Won);
        assert_eq!(w.collected, 2);
        assert!(w.puzzles.is_empty());
    }

    #[test]
    fn invariant_violation_is_undone() {
        let mut w = world(&[(5, 5)], &[(0, 1)], &[], p(9, 0));
        let mut events = Vec::new();
        apply_move(&mut w, p(0, 1), &mut events);
        assert_eq!(events, vec![GameEvent::InvariantViolation { at: p(0, 1) }]);
        assert_eq!(w.actor.pos, p(0, 0));
        assert_eq!(w.last_outcome, Some(Outcome::Blocked));
    }

    #[test]
    fn undone_move_keeps_previous_cell() {
        let mut w = world(&[(5, 5)], &[(2, 1)], &[], p(9, 0));
        let mut events = Vec::new();
        apply_move(&mut w, p(1, 0), &mut events);
        apply_move(&mut w, p(1, 1), &mut events);
        assert_eq!(events.last(), Some(&GameEvent::ActorMoved { from: p(1, 0), to: p(1, 1) }));

        events.clear();
        apply_move(&mut w, p(2, 1), &mut events);
        assert_eq!(events, vec![GameEvent::InvariantViolation { at: p(2, 1) }]);
        assert_eq!(w.actor.pos, p(1, 1));
        assert_eq!(w.actor.last, p(1, 0));
        assert!(w.grid.cell_flags(p(1, 1)).has_actor());
    }

    #[test]
    fn toggle_ignored_after_end() {
        let mut w = world(&[(5, 5)], &[], &[], p(9, 0));
        w.phase = Phase::Caught;
        assert!(toggle_auto(&mut w).is_empty());
        assert!(!w.auto_mode);
    }
}
