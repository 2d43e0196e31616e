//! Arena tile map
//!
//! Fixed-size grid of cells with an explored mask. Cell `(x, y)` is centred
//! on world position `(x, y)`; anything outside the map is indestructible.

use bitvec::prelude::*;
use rand::Rng;

use crate::game::direction::Direction;
use crate::game::ports::{CellCoord, CellKind, ProbeHit, TerrainPort};
use crate::util::vec2::Vec2;

/// Probe samples per world unit
const PROBE_SAMPLES_PER_UNIT: f32 = 2.0;

#[derive(Debug, Clone)]
pub struct TileMap {
    width: i32,
    height: i32,
    /// Row-major; only Empty, Destructible and Indestructible are stored
    cells: Vec<CellKind>,
    /// Cells any bot has seen
    explored: BitVec,
}

impl TileMap {
    /// Open map: walls on the border, everything else empty
    pub fn new(width: u32, height: u32) -> Self {
        let (w, h) = (width as i32, height as i32);
        let mut cells = vec![CellKind::Empty; (width * height) as usize];
        for y in 0..h {
            for x in 0..w {
                if x == 0 || y == 0 || x == w - 1 || y == h - 1 {
                    cells[(y * w + x) as usize] = CellKind::Indestructible;
                }
            }
        }
        Self {
            width: w,
            height: h,
            cells,
            explored: bitvec![0; (width * height) as usize],
        }
    }

    /// Classic layout: border, pillars on even/even cells, crates at
    /// `crate_density` elsewhere, spawn corners kept clear
    pub fn generate<R: Rng + ?Sized>(width: u32, height: u32, crate_density: f32, rng: &mut R) -> Self {
        let mut map = Self::new(width, height);
        let spawns = map.spawn_points();

        for y in 1..map.height - 1 {
            for x in 1..map.width - 1 {
                let kind = if x % 2 == 0 && y % 2 == 0 {
                    CellKind::Indestructible
                } else if spawns.iter().any(|&s| is_spawn_clearing(s, (x, y)))
                    || rng.gen::<f32>() >= crate_density
                {
                    CellKind::Empty
                } else {
                    CellKind::Destructible
                };
                map.set(x, y, kind);
            }
        }
        map
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Corner spawn cells, one per bot
    pub fn spawn_points(&self) -> [CellCoord; 4] {
        let (r, t) = (self.width - 2, self.height - 2);
        [(1, 1), (r, t), (r, 1), (1, t)]
    }

    #[inline]
    fn index(&self, (x, y): CellCoord) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            None
        } else {
            Some((y * self.width + x) as usize)
        }
    }

    pub fn set(&mut self, x: i32, y: i32, kind: CellKind) {
        if let Some(i) = self.index((x, y)) {
            self.cells[i] = kind;
        }
    }

    /// Stored kind, ignoring exploration
    pub fn base_kind(&self, cell: CellCoord) -> CellKind {
        self.index(cell)
            .map(|i| self.cells[i])
            .unwrap_or(CellKind::Indestructible)
    }

    pub fn is_walkable(&self, cell: CellCoord) -> bool {
        self.base_kind(cell) == CellKind::Empty
    }

    /// Turn a crate into floor; returns false if there was no crate
    pub fn destroy(&mut self, cell: CellCoord) -> bool {
        match self.index(cell) {
            Some(i) if self.cells[i] == CellKind::Destructible => {
                self.cells[i] = CellKind::Empty;
                true
            }
            _ => false,
        }
    }

    /// Mark every cell within `radius` (Chebyshev) of `center` explored
    pub fn mark_explored(&mut self, center: CellCoord, radius: i32) {
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if let Some(i) = self.index((center.0 + dx, center.1 + dy)) {
                    self.explored.set(i, true);
                }
            }
        }
    }

    pub fn is_explored(&self, cell: CellCoord) -> bool {
        self.index(cell).map(|i| self.explored[i]).unwrap_or(false)
    }

    pub fn explored_count(&self) -> usize {
        self.explored.count_ones()
    }

    pub fn crate_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|&&k| k == CellKind::Destructible)
            .count()
    }
}

/// The spawn cell and its two lane neighbours toward the map interior
fn is_spawn_clearing(spawn: CellCoord, cell: CellCoord) -> bool {
    let dx = (cell.0 - spawn.0).abs();
    let dy = (cell.1 - spawn.1).abs();
    (dx == 0 && dy <= 1) || (dy == 0 && dx <= 1)
}

impl TerrainPort for TileMap {
    /// First non-empty cell along the ray decides; crates stop the probe
    fn probe(&self, position: Vec2, direction: Direction, length: f32) -> ProbeHit {
        let origin = self.world_to_cell(position);
        let samples = (length * PROBE_SAMPLES_PER_UNIT).ceil().max(1.0) as i32;

        for i in 1..=samples {
            let t = length * i as f32 / samples as f32;
            let cell = self.world_to_cell(position + direction.to_vec() * t);
            if cell == origin {
                continue;
            }
            match self.base_kind(cell) {
                CellKind::Indestructible => return ProbeHit { is_indestructible: true },
                CellKind::Destructible => return ProbeHit { is_indestructible: false },
                CellKind::Empty | CellKind::Unexplored => {}
            }
        }
        ProbeHit::default()
    }

    fn cell_kind(&self, cell: CellCoord) -> CellKind {
        match self.base_kind(cell) {
            CellKind::Empty if !self.is_explored(cell) => CellKind::Unexplored,
            kind => kind,
        }
    }

    #[inline]
    fn world_to_cell(&self, position: Vec2) -> CellCoord {
        (position.x.round() as i32, position.y.round() as i32)
    }
}
