//! Bomb placement decision
//!
//! Two-stage gate: a cheap trigger (random draw, adjacent crate, nearby
//! rival) evaluated at decision time, followed by a safety confirmation
//! evaluated when the placement is actually requested. A failed confirmation
//! is dropped, not retried.

use crate::config::BotConfig;
use crate::game::direction::Direction;
use crate::game::ports::{BombStock, CellKind, MarkerKind, SpatialQueryPort, TerrainPort};
use crate::game::systems::escape::has_escape_route;
use crate::game::systems::threat::{detection_radius, is_in_danger};
use crate::util::vec2::Vec2;

/// Why a triggered bomb was not placed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    /// Triggered by the draw alone; nothing worth hitting
    NoTarget,
    /// An explosion is already within detection radius
    InDanger,
    /// Every neighbour is indestructible
    NoEscapeRoute,
}

/// Outcome of one bomb decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BombVerdict {
    /// Bot holds no unplaced bombs; nothing evaluated
    NoBombs,
    NotTriggered,
    /// Trigger fired; confirmation deferred until the commit delay expires
    Triggered,
    Suppressed(SuppressReason),
    Place,
}

impl BombVerdict {
    #[inline]
    pub fn should_place(self) -> bool {
        self == BombVerdict::Place
    }
}

/// Any four-neighbour cell holds a destructible obstacle
pub fn is_adjacent_to_destructible<T: TerrainPort + ?Sized>(terrain: &T, position: Vec2) -> bool {
    Direction::ALL.iter().any(|direction| {
        let cell = terrain.world_to_cell(position + direction.to_vec());
        terrain.cell_kind(cell) == CellKind::Destructible
    })
}

/// A rival is within `radius`
pub fn is_near_rival<P: SpatialQueryPort + ?Sized>(port: &P, position: Vec2, radius: f32) -> bool {
    !port.query_nearby(position, radius, MarkerKind::Rival).is_empty()
}

fn has_target<W>(world: &W, position: Vec2, config: &BotConfig) -> bool
where
    W: SpatialQueryPort + TerrainPort + ?Sized,
{
    is_adjacent_to_destructible(world, position)
        || is_near_rival(world, position, config.player_detection_radius)
}

/// Stage 1: returns `Triggered`, `NotTriggered` or `NoBombs`.
///
/// `draw` is a uniform sample in `[0, 1)`; the caller owns the RNG so the
/// decision itself stays deterministic.
pub fn evaluate_trigger<W>(world: &W, position: Vec2, config: &BotConfig, draw: f32) -> BombVerdict
where
    W: SpatialQueryPort + TerrainPort + BombStock + ?Sized,
{
    if world.bombs_remaining() == 0 {
        return BombVerdict::NoBombs;
    }

    if draw > config.bomb_trigger_threshold || has_target(world, position, config) {
        BombVerdict::Triggered
    } else {
        BombVerdict::NotTriggered
    }
}

/// Stage 2: safety confirmation against the world as it is now
pub fn confirm_placement<W>(world: &W, position: Vec2, config: &BotConfig) -> BombVerdict
where
    W: SpatialQueryPort + TerrainPort + BombStock + ?Sized,
{
    if world.bombs_remaining() == 0 {
        return BombVerdict::NoBombs;
    }

    if !has_target(world, position, config) {
        return BombVerdict::Suppressed(SuppressReason::NoTarget);
    }

    let threat_radius = detection_radius(world.explosion_radius(), config.threat_safety_margin);
    if is_in_danger(world, position, threat_radius) {
        return BombVerdict::Suppressed(SuppressReason::InDanger);
    }

    if !has_escape_route(world, position) {
        return BombVerdict::Suppressed(SuppressReason::NoEscapeRoute);
    }

    BombVerdict::Place
}

/// Both stages back to back, for callers with no commit delay
pub fn should_place_bomb<W>(world: &W, position: Vec2, config: &BotConfig, draw: f32) -> BombVerdict
where
    W: SpatialQueryPort + TerrainPort + BombStock + ?Sized,
{
    match evaluate_trigger(world, position, config, draw) {
        BombVerdict::Triggered => confirm_placement(world, position, config),
        verdict => verdict,
    }
}
