/// Collision resolution: what happens when the actor lands on a cell.
///
/// ## Resolution Order (first match wins)
///
/// ┌──────────────────────────────┬──────────────────────────────┬────────────┐
/// │ Condition                    │ Outcome                      │ Side effect│
/// ├──────────────────────────────┼──────────────────────────────┼────────────┤
/// │ actor == adversary           │ Caught (terminal)            │            │
/// │ actor ∈ items                │ ItemCollected                │ item removed │
/// │ actor ∈ puzzles              │ PuzzleSolved                 │ puzzle removed │
/// │ actor ∈ obstacles            │ Blocked (should not happen)  │            │
/// │ actor == exit, items empty   │ Won (terminal)               │            │
/// │ actor == exit, items left    │ ExitBlockedByRemainingItems  │            │
/// │ otherwise                    │ Moved                        │            │
/// └──────────────────────────────┴──────────────────────────────┴────────────┘

use super::entity::{Position, PositionSet};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    Caught,
    ItemCollected,
    PuzzleSolved,
    Blocked,
    Won,
    ExitBlockedByRemainingItems,
    Moved,
}

impl Outcome {
    /// Does this outcome end the session?
    pub fn is_terminal(self) -> bool {
        matches!(self, Outcome::Caught | Outcome::Won)
    }

    /// Status line text.
    pub fn message(self) -> &'static str {
        match self {
            Outcome::Caught => "Caught by the adversary! Game over.",
            Outcome::ItemCollected => "Item collected!",
            Outcome::PuzzleSolved => "Puzzle solved!",
            Outcome::Blocked => "Blocked!",
            Outcome::Won => "All items collected and out! You win!",
            Outcome::ExitBlockedByRemainingItems => "Collect every item before exiting!",
            Outcome::Moved => "Moved.",
        }
    }
}

pub fn resolve(
    actor: Position,
    adversary: Position,
    items: &mut PositionSet,
    puzzles: &mut PositionSet,
    obstacles: &PositionSet,
    exit: Position,
) -> Outcome {
    if actor == adversary {
        return Outcome::Caught;
    }
    if items.remove(&actor) {
        return Outcome::ItemCollected;
    }
    if puzzles.remove(&actor) {
        return Outcome::PuzzleSolved;
    }
    if obstacles.contains(&actor) {
        return Outcome::Blocked;
    }
    if actor == exit {
        return if items.is_empty() {
            Outcome::Won
        } else {
            Outcome::ExitBlockedByRemainingItems
        };
    }
    Outcome::Moved
}
