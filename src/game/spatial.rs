//! Spatial hash grid for arena markers
//!
//! Buckets bombs, explosion cells, perks and bots by coarse grid cell so
//! proximity queries only touch cells overlapping the query circle.

use hashbrown::HashMap;

use crate::game::ports::MarkerKind;
use crate::game::systems::ai::BotId;
use crate::util::vec2::Vec2;

/// Default bucket size in world units (cells)
pub const MARKER_GRID_CELL_SIZE: f32 = 4.0;

/// Initial capacity for the bucket map
const MARKER_GRID_INITIAL_CAPACITY: usize = 64;

/// Initial capacity for markers within one bucket
const MARKER_CELL_INITIAL_CAPACITY: usize = 8;

/// Bucket key - (x, y) bucket coordinates
pub type BucketKey = (i32, i32);

/// Identity of whatever placed a marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerId {
    Bot(BotId),
    Bomb(u64),
    Explosion(u64),
    Perk(u64),
}

/// Marker stored in the grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub id: MarkerId,
    pub kind: MarkerKind,
    pub position: Vec2,
}

/// Spatial hash grid over markers
#[derive(Debug, Clone)]
pub struct MarkerGrid {
    /// Inverse bucket size for fast position-to-bucket conversion
    inv_cell_size: f32,
    cells: HashMap<BucketKey, Vec<Marker>>,
}

impl MarkerGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            inv_cell_size: 1.0 / cell_size,
            cells: HashMap::with_capacity(MARKER_GRID_INITIAL_CAPACITY),
        }
    }

    /// Clear all markers, keeping bucket allocations
    #[inline]
    pub fn clear(&mut self) {
        for cell in self.cells.values_mut() {
            cell.clear();
        }
    }

    #[inline]
    fn position_to_bucket(&self, position: Vec2) -> BucketKey {
        (
            (position.x * self.inv_cell_size).floor() as i32,
            (position.y * self.inv_cell_size).floor() as i32,
        )
    }

    #[inline]
    pub fn insert(&mut self, marker: Marker) {
        let key = self.position_to_bucket(marker.position);
        self.cells
            .entry(key)
            .or_insert_with(|| Vec::with_capacity(MARKER_CELL_INITIAL_CAPACITY))
            .push(marker);
    }

    /// Markers of `kind` within `radius` of `position` (inclusive)
    pub fn query_radius(
        &self,
        position: Vec2,
        radius: f32,
        kind: MarkerKind,
    ) -> impl Iterator<Item = &Marker> + '_ {
        let (cx, cy) = self.position_to_bucket(position);
        let cell_radius = (radius * self.inv_cell_size).ceil() as i32 + 1;
        let radius_sq = radius * radius;

        (-cell_radius..=cell_radius).flat_map(move |dx| {
            (-cell_radius..=cell_radius).flat_map(move |dy| {
                self.cells
                    .get(&(cx + dx, cy + dy))
                    .into_iter()
                    .flat_map(|cell| cell.iter())
                    .filter(move |m| {
                        m.kind == kind && m.position.distance_sq_to(position) <= radius_sq
                    })
            })
        })
    }

    /// Rebuild the grid from a fresh set of markers
    pub fn rebuild(&mut self, markers: impl Iterator<Item = Marker>) {
        self.clear();
        for marker in markers {
            self.insert(marker);
        }
    }

    /// Total markers in the grid
    pub fn len(&self) -> usize {
        self.cells.values().map(|c| c.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MarkerGrid {
    fn default() -> Self {
        Self::new(MARKER_GRID_CELL_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(id: u64, kind: MarkerKind, x: f32, y: f32) -> Marker {
        Marker {
            id: MarkerId::Bomb(id),
            kind,
            position: Vec2::new(x, y),
        }
    }

    #[test]
    fn test_insert_and_query() {
        let mut grid = MarkerGrid::default();
        grid.insert(marker(1, MarkerKind::Bomb, 3.0, 3.0));

        let found: Vec<_> = grid.query_radius(Vec2::new(2.0, 3.0), 1.5, MarkerKind::Bomb).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].position, Vec2::new(3.0, 3.0));
    }

    #[test]
    fn test_query_filters_by_kind() {
        let mut grid = MarkerGrid::default();
        grid.insert(marker(1, MarkerKind::Perk, 1.0, 0.0));
        grid.insert(marker(2, MarkerKind::Explosion, 1.0, 0.0));

        assert_eq!(grid.query_radius(Vec2::ZERO, 2.0, MarkerKind::Perk).count(), 1);
        assert_eq!(grid.query_radius(Vec2::ZERO, 2.0, MarkerKind::Bomb).count(), 0);
    }

    #[test]
    fn test_query_filters_by_true_distance() {
        let mut grid = MarkerGrid::default();
        // Same bucket, outside the circle
        grid.insert(marker(1, MarkerKind::Bomb, 1.9, 1.9));
        assert_eq!(grid.query_radius(Vec2::new(0.5, 0.5), 1.5, MarkerKind::Bomb).count(), 0);
        assert_eq!(grid.query_radius(Vec2::new(0.5, 0.5), 2.0, MarkerKind::Bomb).count(), 1);
    }

    #[test]
    fn test_query_reaches_distant_buckets() {
        let mut grid = MarkerGrid::default();
        grid.insert(marker(1, MarkerKind::Explosion, 11.0, -3.0));
        assert_eq!(grid.query_radius(Vec2::ZERO, 12.0, MarkerKind::Explosion).count(), 1);
        assert_eq!(grid.query_radius(Vec2::ZERO, 10.0, MarkerKind::Explosion).count(), 0);
    }

    #[test]
    fn test_rebuild_replaces_contents() {
        let mut grid = MarkerGrid::default();
        grid.insert(marker(1, MarkerKind::Bomb, 0.0, 0.0));
        grid.rebuild([marker(2, MarkerKind::Perk, 5.0, 5.0), marker(3, MarkerKind::Perk, 6.0, 5.0)].into_iter());

        assert_eq!(grid.len(), 2);
        assert_eq!(grid.query_radius(Vec2::ZERO, 3.0, MarkerKind::Bomb).count(), 0);
    }

    #[test]
    fn test_clear() {
        let mut grid = MarkerGrid::default();
        grid.insert(marker(1, MarkerKind::Bomb, 0.0, 0.0));
        grid.clear();
        assert!(grid.is_empty());
    }
}
