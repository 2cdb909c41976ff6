/// Entities and coordinates: Position, Direction, Bounds, Actor, Adversary.
///
/// Positions are signed so that a proposed move may step off the grid;
/// `Bounds::contains` is the single place that decides what is on the grid.

use std::collections::BTreeSet;
use std::fmt;

/// Grid coordinate, `(row, col)`, 0-indexed.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    pub const fn new(row: i32, col: i32) -> Self {
        Position { row, col }
    }

    /// Position one step away in `dir`. No bounds check.
    pub fn step(self, dir: Direction) -> Position {
        let (dr, dc) = dir.delta();
        Position::new(self.row + dr, self.col + dc)
    }

    pub fn manhattan(self, other: Position) -> i32 {
        (self.row - other.row).abs() + (self.col - other.col).abs()
    }

    /// The four orthogonal neighbours in `Direction::ALL` order, unfiltered.
    pub fn neighbors(self) -> impl Iterator<Item = (Direction, Position)> {
        Direction::ALL.into_iter().map(move |d| (d, self.step(d)))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Item, obstacle and puzzle sets. Ordered so that iteration (and therefore
/// nearest-target tie-breaking) is deterministic.
pub type PositionSet = BTreeSet<Position>;

/// Discrete move direction (input boundary).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Canonical order; the adversary shuffles its own copy every tick.
    pub const ALL: [Direction; 4] = [Direction::Left, Direction::Right, Direction::Up, Direction::Down];

    /// `(d_row, d_col)`
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }
}

/// Grid dimensions: `rows × cols`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Bounds {
    pub rows: usize,
    pub cols: usize,
}

impl Bounds {
    pub const fn new(rows: usize, cols: usize) -> Self {
        Bounds { rows, cols }
    }

    /// Is `pos` inside `[0, rows) × [0, cols)`?
    pub fn contains(&self, pos: Position) -> bool {
        pos.row >= 0
            && pos.col >= 0
            && (pos.row as usize) < self.rows
            && (pos.col as usize) < self.cols
    }

    pub fn cell_count(&self) -> usize {
        self.rows * self.cols
    }

    /// Bottom-right corner; the exit lives here.
    pub fn last(&self) -> Position {
        Position::new(self.rows as i32 - 1, self.cols as i32 - 1)
    }
}

/// Static or roaming features that emit proximity clues.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Feature {
    Item,
    Obstacle,
    Exit,
    Adversary,
}

impl Feature {
    pub const ALL: [Feature; 4] = [Feature::Item, Feature::Obstacle, Feature::Exit, Feature::Adversary];

    /// Name used in oracle queries and logs.
    pub fn clue_name(self) -> &'static str {
        match self {
            Feature::Item => "item_clue",
            Feature::Obstacle => "obstacle_clue",
            Feature::Exit => "exit_clue",
            Feature::Adversary => "adversary_clue",
        }
    }
}

/// The player-controlled entity.
#[derive(Clone, Debug)]
pub struct Actor {
    pub pos: Position,
    /// Where the actor stood before its last successful move.
    pub last: Position,
}

impl Actor {
    pub fn new(pos: Position) -> Self {
        Actor { pos, last: pos }
    }

    /// Apply a validated move.
    pub fn move_to(&mut self, pos: Position) {
        self.last = self.pos;
        self.pos = pos;
    }
}

/// The randomly wandering hostile entity.
#[derive(Clone, Debug)]
pub struct Adversary {
    pub pos: Position,
}

impl Adversary {
    pub fn new(pos: Position) -> Self {
        Adversary { pos }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_deltas() {
        let p = Position::new(3, 3);
        assert_eq!(p.step(Direction::Up), Position::new(2, 3));
        assert_eq!(p.step(Direction::Down), Position::new(4, 3));
        assert_eq!(p.step(Direction::Left), Position::new(3, 2));
        assert_eq!(p.step(Direction::Right), Position::new(3, 4));
        for (d, n) in p.neighbors() {
            assert_eq!(p.manhattan(n), 1, "{d:?}");
        }
    }

    #[test]
    fn bounds_reject_negative_and_overflow() {
        let b = Bounds::new(10, 8);
        assert!(b.contains(Position::new(0, 0)));
        assert!(b.contains(Position::new(9, 7)));
        assert!(!b.contains(Position::new(-1, 0)));
        assert!(!b.contains(Position::new(0, -1)));
        assert!(!b.contains(Position::new(10, 0)));
        assert!(!b.contains(Position::new(0, 8)));
        assert_eq!(b.last(), Position::new(9, 7));
    }

    #[test]
    fn actor_remembers_previous_cell() {
        let mut a = Actor::new(Position::new(0, 0));
        assert_eq!(a.last, a.pos);
        a.move_to(Position::new(1, 0));
        assert_eq!(a.pos, Position::new(1, 0));
        assert_eq!(a.last, Position::new(0, 0));
    }

    #[test]
    fn manhattan_distance() {
        assert_eq!(Position::new(0, 0).manhattan(Position::new(5, 5)), 10);
        assert_eq!(Position::new(2, 7).manhattan(Position::new(2, 7)), 0);
    }
}
