//! Goal selection
//!
//! Picks one direction per decision cycle with a fixed precedence:
//! threat escape, escape linger, rival pursuit, perk pickup, exploration.
//! This is the only writer of the agent's escape memory.

use rand::seq::SliceRandom;
use rand::Rng;
use smallvec::SmallVec;
use tracing::debug;

use crate::config::BotConfig;
use crate::game::direction::Direction;
use crate::game::ports::{nearest, BombStock, CellKind, MarkerKind, SpatialQueryPort, TerrainPort};
use crate::game::systems::ai::AgentState;
use crate::game::systems::escape::{find_safe_direction, is_terrain_legal};
use crate::game::systems::threat::{assess, detection_radius};
use crate::util::vec2::Vec2;

/// Which rule produced a direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Goal {
    /// Threat in range, moving away
    Escape,
    /// Threat just left range, one more cycle of escape bias
    Linger,
    /// Closing on a rival
    Chase,
    /// Heading for a perk
    Collect,
    /// Toward a crate or unexplored cell
    Explore,
    /// Nothing worth exploring, any direction
    Wander,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoalChoice {
    pub goal: Goal,
    pub direction: Direction,
}

impl GoalChoice {
    fn new(goal: Goal, direction: Direction) -> Self {
        Self { goal, direction }
    }
}

/// Escape primary for a bot at `position` fleeing `threat`.
///
/// A bot standing on the threat has no "away"; it starts from the first scan
/// direction and lets the router pick a legal one.
fn away_from(position: Vec2, threat: Vec2) -> Direction {
    Direction::from_vector(position - threat).unwrap_or(Direction::ALL[0])
}

/// Choose this cycle's direction, updating the agent's escape memory
pub fn choose_direction<W, R>(
    world: &W,
    agent: &mut AgentState,
    position: Vec2,
    config: &BotConfig,
    rng: &mut R,
) -> GoalChoice
where
    W: SpatialQueryPort + TerrainPort + BombStock + ?Sized,
    R: Rng + ?Sized,
{
    let threat_radius = detection_radius(world.explosion_radius(), config.threat_safety_margin);
    let threat = assess(world, position, threat_radius);

    // 1: active threat
    if let Some(threat_position) = threat.threat_position {
        agent.last_known_threat_position = threat_position;
        agent.is_escaping_threat = true;

        let primary = away_from(position, threat_position);
        let direction = find_safe_direction(world, position, primary, threat_position);
        debug!(?threat_position, ?primary, ?direction, "escaping threat");
        return GoalChoice::new(Goal::Escape, direction);
    }

    // 2: linger one cycle after the threat leaves range
    if agent.is_escaping_threat {
        let remembered = agent.last_known_threat_position;
        let primary = away_from(position, remembered);
        let direction = find_safe_direction(world, position, primary, remembered);
        agent.is_escaping_threat = false;
        return GoalChoice::new(Goal::Linger, direction);
    }

    // 3: rival
    let rivals = world.query_nearby(position, config.player_detection_radius, MarkerKind::Rival);
    if let Some(direction) = nearest(position, &rivals).and_then(|r| Direction::from_vector(r - position)) {
        return GoalChoice::new(Goal::Chase, direction);
    }

    // 4: perk
    let perks = world.query_nearby(position, config.perk_detection_radius, MarkerKind::Perk);
    if let Some(direction) = nearest(position, &perks).and_then(|p| Direction::from_vector(p - position)) {
        return GoalChoice::new(Goal::Collect, direction);
    }

    // 5: exploration
    explore(world, position, rng)
}

/// Directions worth exploring: legal, and leading to a crate or unexplored cell
pub fn exploration_candidates<T: TerrainPort + ?Sized>(
    terrain: &T,
    position: Vec2,
) -> SmallVec<[Direction; 4]> {
    Direction::ALL
        .iter()
        .copied()
        .filter(|&direction| {
            if !is_terrain_legal(terrain, position, direction) {
                return false;
            }
            let cell = terrain.world_to_cell(position + direction.to_vec());
            matches!(
                terrain.cell_kind(cell),
                CellKind::Destructible | CellKind::Unexplored
            )
        })
        .collect()
}

/// Uniform pick among exploration candidates, else among all four directions
pub fn explore<T, R>(terrain: &T, position: Vec2, rng: &mut R) -> GoalChoice
where
    T: TerrainPort + ?Sized,
    R: Rng + ?Sized,
{
    let candidates = exploration_candidates(terrain, position);
    match candidates.choose(rng) {
        Some(&direction) => GoalChoice::new(Goal::Explore, direction),
        None => {
            let direction = Direction::ALL[rng.gen_range(0..Direction::ALL.len())];
            GoalChoice::new(Goal::Wander, direction)
        }
    }
}
