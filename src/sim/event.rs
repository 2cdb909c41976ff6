/// Events emitted during a simulation step.
/// The presentation layer and the log consume these.

use crate::domain::entity::Position;
use crate::error::MoveRejection;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    ActorMoved { from: Position, to: Position },
    MoveRejected { candidate: Position, reason: MoveRejection },
    /// Validation passed but the actor landed on an obstacle anyway.
    InvariantViolation { at: Position },
    ItemCollected { at: Position, remaining: usize },
    PuzzleSolved { at: Position },
    ExitLocked { remaining: usize },
    AdversaryMoved { from: Position, to: Position },
    Caught { at: Position },
    Won,
    AutoModeChanged { enabled: bool },
}
