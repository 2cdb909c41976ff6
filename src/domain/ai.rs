/// Adversary AI: one random orthogonal step per adversary tick.
///
/// The four directions are shuffled on every call so no direction is
/// favoured; the first candidate that is on the grid and not an obstacle
/// wins. A boxed-in adversary stays put.
///
/// No timer lives here. The caller decides when a tick happens.

use rand::seq::SliceRandom;
use rand::Rng;

use super::entity::{Bounds, Direction, Position, PositionSet};

pub fn tick<R: Rng + ?Sized>(
    pos: Position,
    bounds: Bounds,
    obstacles: &PositionSet,
    rng: &mut R,
) -> Position {
    let mut dirs = Direction::ALL;
    dirs.shuffle(rng);

    dirs.iter()
        .map(|&d| pos.step(d))
        .find(|p| bounds.contains(*p) && !obstacles.contains(p))
        .unwrap_or(pos)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn set(ps: &[(i32, i32)]) -> PositionSet {
        ps.iter().map(|&(r, c)| Position::new(r, c)).collect()
    }

    #[test]
    fn boxed_in_corner_stays() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let obstacles = set(&[(8, 9), (9, 8)]);
        for _ in 0..50 {
            let next = tick(Position::new(9, 9), Bounds::new(10, 10), &obstacles, &mut rng);
            assert_eq!(next, Position::new(9, 9));
        }
    }

    #[test]
    fn single_exit_is_always_taken() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        // (1,1) in a 3x3 grid with three of four neighbours blocked.
        let obstacles = set(&[(0, 1), (1, 0), (1, 2)]);
        for _ in 0..50 {
            let next = tick(Position::new(1, 1), Bounds::new(3, 3), &obstacles, &mut rng);
            assert_eq!(next, Position::new(2, 1));
        }
    }

    #[test]
    fn step_is_orthogonal_and_legal() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let b = Bounds::new(6, 6);
        let obstacles = set(&[(2, 3), (4, 4)]);
        let mut pos = Position::new(3, 3);
        for _ in 0..500 {
            let next = tick(pos, b, &obstacles, &mut rng);
            assert_eq!(pos.manhattan(next), 1);
            assert!(b.contains(next));
            assert!(!obstacles.contains(&next));
            pos = next;
        }
    }

    #[test]
    fn open_field_uses_every_direction() {
        let mut rng = ChaCha8Rng::seed_from_u64(2024);
        let origin = Position::new(5, 5);
        let mut seen: HashMap<Position, u32> = HashMap::new();
        for _ in 0..400 {
            *seen.entry(tick(origin, Bounds::new(11, 11), &set(&[]), &mut rng)).or_default() += 1;
        }
        assert_eq!(seen.len(), 4);
        // Uniform shuffle: each direction lands near 100 of 400.
        assert!(seen.values().all(|&n| n > 50), "{seen:?}");
    }

    #[test]
    fn same_seed_same_walk() {
        let b = Bounds::new(8, 8);
        let walk = |seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut pos = Position::new(4, 4);
            (0..20).map(|_| { pos = tick(pos, b, &set(&[]), &mut rng); pos }).collect::<Vec<_>>()
        };
        assert_eq!(walk(5), walk(5));
    }
}
