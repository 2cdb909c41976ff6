/// Cell flags: the per-cell bitmask of the grid.
///
/// Occupancy bits (actor, item, obstacle, exit, adversary) and clue bits
/// live in independent namespaces, so any combination may be set at once.
/// Callers query via methods, never by comparing the raw mask for equality.

use bitflags::bitflags;

use super::entity::Feature;

bitflags! {
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Hash)]
    pub struct CellFlags: u16 {
        const ACTOR          = 1;
        const ITEM           = 2;
        const OBSTACLE       = 4;
        const EXIT           = 8;
        const ADVERSARY      = 16;
        const ITEM_CLUE      = 32;
        const OBSTACLE_CLUE  = 64;
        const EXIT_CLUE      = 128;
        const ADVERSARY_CLUE = 256;
    }
}

impl CellFlags {
    /// Every occupancy bit.
    pub const OCCUPANCY: CellFlags = CellFlags::ACTOR
        .union(CellFlags::ITEM)
        .union(CellFlags::OBSTACLE)
        .union(CellFlags::EXIT)
        .union(CellFlags::ADVERSARY);

    /// Every clue bit.
    pub const CLUES: CellFlags = CellFlags::ITEM_CLUE
        .union(CellFlags::OBSTACLE_CLUE)
        .union(CellFlags::EXIT_CLUE)
        .union(CellFlags::ADVERSARY_CLUE);

    /// Occupancy bit a feature sets on its own cell.
    pub fn presence(feature: Feature) -> CellFlags {
        match feature {
            Feature::Item => CellFlags::ITEM,
            Feature::Obstacle => CellFlags::OBSTACLE,
            Feature::Exit => CellFlags::EXIT,
            Feature::Adversary => CellFlags::ADVERSARY,
        }
    }

    /// Clue bit a feature sets on its four neighbours.
    pub fn clue(feature: Feature) -> CellFlags {
        match feature {
            Feature::Item => CellFlags::ITEM_CLUE,
            Feature::Obstacle => CellFlags::OBSTACLE_CLUE,
            Feature::Exit => CellFlags::EXIT_CLUE,
            Feature::Adversary => CellFlags::ADVERSARY_CLUE,
        }
    }

    pub fn has_actor(self) -> bool {
        self.contains(CellFlags::ACTOR)
    }

    pub fn has_item(self) -> bool {
        self.contains(CellFlags::ITEM)
    }

    pub fn has_obstacle(self) -> bool {
        self.contains(CellFlags::OBSTACLE)
    }

    pub fn is_exit(self) -> bool {
        self.contains(CellFlags::EXIT)
    }

    pub fn has_adversary(self) -> bool {
        self.contains(CellFlags::ADVERSARY)
    }

    /// Does this cell carry the clue bit of `feature`?
    pub fn senses(self, feature: Feature) -> bool {
        self.contains(CellFlags::clue(feature))
    }

    /// Features whose clue bit is present, in `Feature::ALL` order.
    pub fn sensed_features(self) -> impl Iterator<Item = Feature> {
        Feature::ALL.into_iter().filter(move |f| self.senses(*f))
    }

    /// Only the occupancy part of the mask.
    pub fn occupancy(self) -> CellFlags {
        self & CellFlags::OCCUPANCY
    }

    /// Only the clue part of the mask.
    pub fn clues(self) -> CellFlags {
        self & CellFlags::CLUES
    }
}
