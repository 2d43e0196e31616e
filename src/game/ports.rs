//! Collaborator interfaces consumed and driven by the decision core.
//!
//! All decision code depends on these traits, never on a concrete world, so
//! it can be exercised against a fake in tests and against the headless
//! arena in the binary.

use serde::{Deserialize, Serialize};

use crate::game::direction::{Direction, MoveSignal};
use crate::util::vec2::Vec2;

/// Integer cell coordinate - (x, y)
pub type CellCoord = (i32, i32);

/// Kind of marker a spatial query can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarkerKind {
    /// Armed bomb
    Bomb,
    /// Active explosion
    Explosion,
    Perk,
    /// Another player
    Rival,
}

/// Terrain semantics of a single cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellKind {
    Empty,
    Destructible,
    Indestructible,
    Unexplored,
}

/// Result of a short linear terrain probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProbeHit {
    pub is_indestructible: bool,
}

/// Read-only proximity queries over world markers
pub trait SpatialQueryPort {
    /// Positions of all markers of `kind` within `radius` of `position`
    fn query_nearby(&self, position: Vec2, radius: f32, kind: MarkerKind) -> Vec<Vec2>;
}

/// Read-only terrain queries
pub trait TerrainPort {
    /// Probe `length` units from `position` along `direction`
    fn probe(&self, position: Vec2, direction: Direction, length: f32) -> ProbeHit;

    fn cell_kind(&self, cell: CellCoord) -> CellKind;

    fn world_to_cell(&self, position: Vec2) -> CellCoord;
}

/// The bot's own bomb inventory and blast configuration
pub trait BombStock {
    fn bombs_remaining(&self) -> u32;

    fn explosion_radius(&self) -> f32;
}

/// Everything the decision core reads from the world
pub trait BotWorld: SpatialQueryPort + TerrainPort + BombStock {}

impl<T: SpatialQueryPort + TerrainPort + BombStock> BotWorld for T {}

/// Outputs of the decision core
pub trait BotActuator {
    /// Fire-and-forget; the receiver owns bomb-count bookkeeping
    fn request_bomb_placement(&mut self);

    fn set_movement_direction(&mut self, signal: MoveSignal);
}

/// Nearest of `positions` to `origin`, if any
pub fn nearest(origin: Vec2, positions: &[Vec2]) -> Option<Vec2> {
    positions.iter().copied().min_by(|a, b| {
        let dist_a = a.distance_sq_to(origin);
        let dist_b = b.distance_sq_to(origin);
        dist_a.partial_cmp(&dist_b).unwrap_or(std::cmp::Ordering::Equal)
    })
}

#[cfg(test)]
pub(crate) mod fake {
    //! Deterministic in-memory world for decision tests.

    use super::*;
    use hashbrown::HashMap;

    #[derive(Debug, Default)]
    pub struct FakeWorld {
        pub markers: Vec<(MarkerKind, Vec2)>,
        pub cells: HashMap<CellCoord, CellKind>,
        pub bombs: u32,
        pub radius: f32,
    }

    impl FakeWorld {
        /// Open field: every cell is empty unless set otherwise
        pub fn new() -> Self {
            Self {
                bombs: 1,
                radius: 2.0,
                ..Default::default()
            }
        }

        pub fn with_marker(mut self, kind: MarkerKind, position: Vec2) -> Self {
            self.markers.push((kind, position));
            self
        }

        pub fn with_cell(mut self, cell: CellCoord, kind: CellKind) -> Self {
            self.cells.insert(cell, kind);
            self
        }

        /// Surround `cell` with indestructible walls on all four sides
        pub fn walled_in(mut self, cell: CellCoord) -> Self {
            for direction in Direction::ALL {
                let (dx, dy) = direction.cell_offset();
                self.cells
                    .insert((cell.0 + dx, cell.1 + dy), CellKind::Indestructible);
            }
            self
        }
    }

    impl SpatialQueryPort for FakeWorld {
        fn query_nearby(&self, position: Vec2, radius: f32, kind: MarkerKind) -> Vec<Vec2> {
            self.markers
                .iter()
                .filter(|(k, p)| *k == kind && p.distance_to(position) <= radius)
                .map(|(_, p)| *p)
                .collect()
        }
    }

    impl TerrainPort for FakeWorld {
        fn probe(&self, position: Vec2, direction: Direction, length: f32) -> ProbeHit {
            let target = position + direction.to_vec() * length;
            ProbeHit {
                is_indestructible: self.cell_kind(self.world_to_cell(target))
                    == CellKind::Indestructible,
            }
        }

        fn cell_kind(&self, cell: CellCoord) -> CellKind {
            self.cells.get(&cell).copied().unwrap_or(CellKind::Empty)
        }

        fn world_to_cell(&self, position: Vec2) -> CellCoord {
            (position.x.round() as i32, position.y.round() as i32)
        }
    }

    impl BombStock for FakeWorld {
        fn bombs_remaining(&self) -> u32 {
            self.bombs
        }

        fn explosion_radius(&self) -> f32 {
            self.radius
        }
    }

    /// Records everything the core emits
    #[derive(Debug, Default)]
    pub struct RecordingActuator {
        pub signals: Vec<MoveSignal>,
        pub bomb_requests: usize,
    }

    impl BotActuator for RecordingActuator {
        fn request_bomb_placement(&mut self) {
            self.bomb_requests += 1;
        }

        fn set_movement_direction(&mut self, signal: MoveSignal) {
            self.signals.push(signal);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_picks_closest() {
        let positions = [Vec2::new(5.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(-3.0, 0.0)];
        assert_eq!(nearest(Vec2::ZERO, &positions), Some(Vec2::new(1.0, 1.0)));
    }

    #[test]
    fn test_nearest_empty() {
        assert_eq!(nearest(Vec2::ZERO, &[]), None);
    }

    #[test]
    fn test_fake_world_probe() {
        let world = fake::FakeWorld::new().with_cell((1, 0), CellKind::Indestructible);
        assert!(world.probe(Vec2::ZERO, Direction::Right, 1.0).is_indestructible);
        assert!(!world.probe(Vec2::ZERO, Direction::Left, 1.0).is_indestructible);
    }
}
