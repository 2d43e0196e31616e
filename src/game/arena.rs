//! Headless arena
//!
//! In-process stand-ins for the collaborators the decision core talks to:
//! movement, bomb placement and explosions, perks, terrain, and the marker
//! index that answers spatial queries. Enough to drive bots end to end without
//! an engine.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::config::SimConfig;
use crate::game::constants::arena::*;
use crate::game::direction::{Direction, MoveSignal};
use crate::game::ports::{
    BombStock, BotActuator, CellCoord, CellKind, MarkerKind, ProbeHit, SpatialQueryPort, TerrainPort,
};
use crate::game::spatial::{Marker, MarkerGrid, MarkerId};
use crate::game::systems::ai::BotId;
use crate::game::terrain::TileMap;
use crate::util::vec2::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerkKind {
    /// One more bomb in stock
    ExtraBomb,
    /// One more cell of blast per arm
    BlastRadius,
}

#[derive(Debug, Clone)]
pub struct ArenaBot {
    pub id: BotId,
    pub position: Vec2,
    pub signal: MoveSignal,
    pub bombs_remaining: u32,
    pub blast_radius: f32,
    pub alive: bool,
    /// Placement requested since the last step
    wants_bomb: bool,
}

#[derive(Debug, Clone)]
pub struct Bomb {
    pub id: u64,
    pub owner: BotId,
    pub cell: CellCoord,
    pub fuse: f32,
    pub radius: f32,
}

#[derive(Debug, Clone)]
pub struct Explosion {
    pub id: u64,
    pub cells: Vec<CellCoord>,
    pub remaining: f32,
}

#[derive(Debug, Clone)]
pub struct Perk {
    pub id: u64,
    pub cell: CellCoord,
    pub kind: PerkKind,
}

/// What changed during a step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepEvents {
    pub bombs_placed: usize,
    pub detonations: usize,
    pub crates_destroyed: usize,
    pub perks_collected: usize,
    pub eliminated: Vec<BotId>,
}

#[inline]
fn cell_center(cell: CellCoord) -> Vec2 {
    Vec2::new(cell.0 as f32, cell.1 as f32)
}

pub struct Arena {
    tiles: TileMap,
    /// Ordered by id so every pass over bots is reproducible for a seed
    bots: BTreeMap<BotId, ArenaBot>,
    bombs: Vec<Bomb>,
    explosions: Vec<Explosion>,
    perks: Vec<Perk>,
    markers: MarkerGrid,
    next_id: u64,
    rng: StdRng,
}

impl Arena {
    pub fn new(config: &SimConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let tiles = TileMap::generate(config.width, config.height, config.crate_density, &mut rng);
        Self::with_tiles(tiles, rng)
    }

    pub fn with_tiles(tiles: TileMap, rng: StdRng) -> Self {
        Self {
            tiles,
            bots: BTreeMap::new(),
            bombs: Vec::new(),
            explosions: Vec::new(),
            perks: Vec::new(),
            markers: MarkerGrid::default(),
            next_id: 1,
            rng,
        }
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn tiles(&self) -> &TileMap {
        &self.tiles
    }

    pub fn bot(&self, bot_id: BotId) -> Option<&ArenaBot> {
        self.bots.get(&bot_id)
    }

    pub fn bombs(&self) -> &[Bomb] {
        &self.bombs
    }

    pub fn explosions(&self) -> &[Explosion] {
        &self.explosions
    }

    pub fn perks(&self) -> &[Perk] {
        &self.perks
    }

    pub fn alive_count(&self) -> usize {
        self.bots.values().filter(|b| b.alive).count()
    }

    /// Place a bot on the next free spawn corner
    pub fn spawn_bot(&mut self, bot_id: BotId) -> Option<Vec2> {
        let cell = *self.tiles.spawn_points().get(self.bots.len())?;
        self.spawn_bot_at(bot_id, cell)
    }

    /// Place a bot at a specific cell
    pub fn spawn_bot_at(&mut self, bot_id: BotId, cell: CellCoord) -> Option<Vec2> {
        if !self.tiles.is_walkable(cell) {
            return None;
        }
        let position = cell_center(cell);
        self.bots.insert(
            bot_id,
            ArenaBot {
                id: bot_id,
                position,
                signal: MoveSignal::Halt,
                bombs_remaining: STARTING_BOMBS,
                blast_radius: STARTING_BLAST_RADIUS,
                alive: true,
                wants_bomb: false,
            },
        );
        self.tiles.mark_explored(cell, SIGHT_RADIUS);
        self.rebuild_markers();
        info!(%bot_id, ?cell, "bot spawned");
        Some(position)
    }

    /// Drop a perk on a cell
    pub fn add_perk(&mut self, cell: CellCoord, kind: PerkKind) {
        let id = self.next_id();
        self.perks.push(Perk { id, cell, kind });
        self.rebuild_markers();
    }

    /// Arm a bomb directly, bypassing a bot's stock
    pub fn add_bomb(&mut self, owner: BotId, cell: CellCoord, fuse: f32, radius: f32) {
        let id = self.next_id();
        self.bombs.push(Bomb { id, owner, cell, fuse, radius });
        self.rebuild_markers();
    }

    /// World as seen by one living bot, plus its position
    pub fn view(&self, bot_id: BotId) -> Option<(BotView<'_>, Vec2)> {
        let bot = self.bots.get(&bot_id).filter(|b| b.alive)?;
        Some((BotView { arena: self, bot }, bot.position))
    }

    /// Command sink for one living bot
    pub fn actuator(&mut self, bot_id: BotId) -> Option<BotHandle<'_>> {
        let bot = self.bots.get_mut(&bot_id).filter(|b| b.alive)?;
        Some(BotHandle { bot })
    }

    fn bomb_at(&self, cell: CellCoord) -> bool {
        self.bombs.iter().any(|b| b.cell == cell)
    }

    /// Advance the arena by `dt` seconds
    pub fn step(&mut self, dt: f32) -> StepEvents {
        let mut events = StepEvents::default();

        self.place_requested_bombs(&mut events);
        self.move_bots(dt);
        self.tick_bombs(dt, &mut events);
        self.tick_explosions(dt);
        self.collect_perks(&mut events);
        self.eliminate_caught_bots(&mut events);

        for bot in self.bots.values().filter(|b| b.alive) {
            let cell = self.tiles.world_to_cell(bot.position);
            self.tiles.mark_explored(cell, SIGHT_RADIUS);
        }

        self.rebuild_markers();
        events
    }

    fn place_requested_bombs(&mut self, events: &mut StepEvents) {
        let mut placements = Vec::new();
        for bot in self.bots.values_mut() {
            if !std::mem::take(&mut bot.wants_bomb) || !bot.alive || bot.bombs_remaining == 0 {
                continue;
            }
            let cell = (bot.position.x.round() as i32, bot.position.y.round() as i32);
            placements.push((bot.id, cell, bot.blast_radius));
        }

        for (owner, cell, radius) in placements {
            if self.bomb_at(cell) {
                continue;
            }
            if let Some(bot) = self.bots.get_mut(&owner) {
                bot.bombs_remaining -= 1;
            }
            let id = self.next_id();
            self.bombs.push(Bomb { id, owner, cell, fuse: BOMB_FUSE, radius });
            events.bombs_placed += 1;
            debug!(%owner, ?cell, "bomb placed");
        }
    }

    fn move_bots(&mut self, dt: f32) {
        let step = BOT_SPEED * dt;
        let ids: Vec<BotId> = self.bots.keys().copied().collect();

        for id in ids {
            let (position, direction) = match self.bots.get(&id) {
                Some(bot) if bot.alive => match bot.signal.direction() {
                    Some(direction) => (bot.position, direction),
                    None => continue,
                },
                _ => continue,
            };

            let next = self.advance(position, direction, step);
            if let Some(bot) = self.bots.get_mut(&id) {
                bot.position = next;
            }
        }
    }

    /// Lane-locked movement with collision against walls, crates and foreign bombs
    fn advance(&self, position: Vec2, direction: Direction, step: f32) -> Vec2 {
        let current = self.tiles.world_to_cell(position);
        let mut next = position + direction.to_vec() * step;

        // Snap to the lane perpendicular to travel
        match direction {
            Direction::Left | Direction::Right => next.y = current.1 as f32,
            Direction::Up | Direction::Down => next.x = current.0 as f32,
        }

        let leading = self.tiles.world_to_cell(next + direction.to_vec() * 0.5);
        let blocked = leading != current
            && (!self.tiles.is_walkable(leading) || self.bomb_at(leading));

        if blocked {
            // Stop at the centre of the current cell
            let centre = cell_center(current);
            match direction {
                Direction::Left | Direction::Right => Vec2::new(centre.x, next.y),
                Direction::Up | Direction::Down => Vec2::new(next.x, centre.y),
            }
        } else {
            next
        }
    }

    fn tick_bombs(&mut self, dt: f32, events: &mut StepEvents) {
        for bomb in &mut self.bombs {
            bomb.fuse -= dt;
        }

        // Chain reactions can arm more bombs while detonating
        while let Some(index) = self.bombs.iter().position(|b| b.fuse <= 0.0) {
            let bomb = self.bombs.swap_remove(index);
            self.detonate(bomb, events);
        }
    }

    fn detonate(&mut self, bomb: Bomb, events: &mut StepEvents) {
        let reach = bomb.radius.max(0.0) as i32;
        let mut cells = vec![bomb.cell];

        for direction in Direction::ALL {
            let (dx, dy) = direction.cell_offset();
            for r in 1..=reach {
                let cell = (bomb.cell.0 + dx * r, bomb.cell.1 + dy * r);
                match self.tiles.base_kind(cell) {
                    CellKind::Indestructible => break,
                    CellKind::Destructible => {
                        self.tiles.destroy(cell);
                        events.crates_destroyed += 1;
                        cells.push(cell);
                        if self.rng.gen::<f32>() < PERK_DROP_CHANCE {
                            let kind = if self.rng.gen::<bool>() {
                                PerkKind::ExtraBomb
                            } else {
                                PerkKind::BlastRadius
                            };
                            let id = self.next_id();
                            self.perks.push(Perk { id, cell, kind });
                        }
                        break;
                    }
                    CellKind::Empty | CellKind::Unexplored => cells.push(cell),
                }
            }
        }

        for other in &mut self.bombs {
            if cells.contains(&other.cell) {
                other.fuse = 0.0;
            }
        }

        if let Some(owner) = self.bots.get_mut(&bomb.owner) {
            owner.bombs_remaining += 1;
        }

        let id = self.next_id();
        debug!(bomb = bomb.id, cells = cells.len(), "detonation");
        self.explosions.push(Explosion {
            id,
            cells,
            remaining: EXPLOSION_DURATION,
        });
        events.detonations += 1;
    }

    fn tick_explosions(&mut self, dt: f32) {
        for explosion in &mut self.explosions {
            explosion.remaining -= dt;
        }
        self.explosions.retain(|e| e.remaining > 0.0);
    }

    fn collect_perks(&mut self, events: &mut StepEvents) {
        let perks = std::mem::take(&mut self.perks);
        for perk in perks {
            let center = cell_center(perk.cell);
            let collector = self
                .bots
                .values_mut()
                .find(|b| b.alive && b.position.distance_to(center) <= PERK_PICKUP_DISTANCE);

            match collector {
                Some(bot) => {
                    match perk.kind {
                        PerkKind::ExtraBomb => bot.bombs_remaining += 1,
                        PerkKind::BlastRadius => {
                            bot.blast_radius = (bot.blast_radius + 1.0).min(MAX_BLAST_RADIUS)
                        }
                    }
                    events.perks_collected += 1;
                    debug!(bot = %bot.id, kind = ?perk.kind, "perk collected");
                }
                None => self.perks.push(perk),
            }
        }
    }

    fn eliminate_caught_bots(&mut self, events: &mut StepEvents) {
        for bot in self.bots.values_mut().filter(|b| b.alive) {
            let cell = (bot.position.x.round() as i32, bot.position.y.round() as i32);
            if self.explosions.iter().any(|e| e.cells.contains(&cell)) {
                bot.alive = false;
                bot.signal = MoveSignal::Halt;
                events.eliminated.push(bot.id);
                info!(bot = %bot.id, ?cell, "bot eliminated");
            }
        }
        events.eliminated.sort_unstable();
    }

    fn rebuild_markers(&mut self) {
        let bots = self
            .bots
            .values()
            .filter(|b| b.alive)
            .map(|b| Marker {
                id: MarkerId::Bot(b.id),
                kind: MarkerKind::Rival,
                position: b.position,
            });
        let bombs = self.bombs.iter().map(|b| Marker {
            id: MarkerId::Bomb(b.id),
            kind: MarkerKind::Bomb,
            position: cell_center(b.cell),
        });
        let explosions = self.explosions.iter().flat_map(|e| {
            e.cells.iter().map(move |&cell| Marker {
                id: MarkerId::Explosion(e.id),
                kind: MarkerKind::Explosion,
                position: cell_center(cell),
            })
        });
        let perks = self.perks.iter().map(|p| Marker {
            id: MarkerId::Perk(p.id),
            kind: MarkerKind::Perk,
            position: cell_center(p.cell),
        });

        let markers: Vec<Marker> = bots.chain(bombs).chain(explosions).chain(perks).collect();
        self.markers.rebuild(markers.into_iter());
    }
}

/// Read-only world view for one bot
pub struct BotView<'a> {
    arena: &'a Arena,
    bot: &'a ArenaBot,
}

impl SpatialQueryPort for BotView<'_> {
    fn query_nearby(&self, position: Vec2, radius: f32, kind: MarkerKind) -> Vec<Vec2> {
        let own = MarkerId::Bot(self.bot.id);
        self.arena
            .markers
            .query_radius(position, radius, kind)
            .filter(|m| m.id != own)
            .map(|m| m.position)
            .collect()
    }
}

impl TerrainPort for BotView<'_> {
    fn probe(&self, position: Vec2, direction: Direction, length: f32) -> ProbeHit {
        self.arena.tiles.probe(position, direction, length)
    }

    fn cell_kind(&self, cell: CellCoord) -> CellKind {
        self.arena.tiles.cell_kind(cell)
    }

    fn world_to_cell(&self, position: Vec2) -> CellCoord {
        self.arena.tiles.world_to_cell(position)
    }
}

impl BombStock for BotView<'_> {
    fn bombs_remaining(&self) -> u32 {
        self.bot.bombs_remaining
    }

    fn explosion_radius(&self) -> f32 {
        self.bot.blast_radius
    }
}

/// Applies decision-core commands to one bot
pub struct BotHandle<'a> {
    bot: &'a mut ArenaBot,
}

impl BotActuator for BotHandle<'_> {
    fn request_bomb_placement(&mut self) {
        self.bot.wants_bomb = true;
    }

    fn set_movement_direction(&mut self, signal: MoveSignal) {
        self.bot.signal = signal;
    }
}
