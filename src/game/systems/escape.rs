//! Escape routing
//!
//! Picks a direction that neither runs into an indestructible wall nor heads
//! back toward the last known threat. Only the four immediate neighbours are
//! considered.

use tracing::trace;

use crate::game::constants::bot::{ESCAPE_BIAS_THRESHOLD, PROBE_LENGTH};
use crate::game::direction::Direction;
use crate::game::ports::TerrainPort;
use crate::util::vec2::Vec2;

/// True if a one-cell probe along `direction` does not hit an indestructible cell
#[inline]
pub fn is_terrain_legal<T: TerrainPort + ?Sized>(terrain: &T, position: Vec2, direction: Direction) -> bool {
    !terrain.probe(position, direction, PROBE_LENGTH).is_indestructible
}

/// True if `direction` points within ~60 degrees of the threat
pub fn is_threat_biased(position: Vec2, direction: Direction, threat_position: Vec2) -> bool {
    let to_threat = (threat_position - position).normalize();
    direction.to_vec().dot(to_threat) > ESCAPE_BIAS_THRESHOLD
}

/// At least one of the four directions is terrain-legal
pub fn has_escape_route<T: TerrainPort + ?Sized>(terrain: &T, position: Vec2) -> bool {
    Direction::ALL
        .iter()
        .any(|&direction| is_terrain_legal(terrain, position, direction))
}

/// Return `primary` if it is safe, otherwise the first safe direction in scan
/// order, otherwise `primary` anyway.
pub fn find_safe_direction<T: TerrainPort + ?Sized>(
    terrain: &T,
    position: Vec2,
    primary: Direction,
    threat_position: Vec2,
) -> Direction {
    let is_safe = |direction: Direction| {
        is_terrain_legal(terrain, position, direction)
            && !is_threat_biased(position, direction, threat_position)
    };

    if is_safe(primary) {
        return primary;
    }

    match Direction::ALL.iter().copied().find(|&d| is_safe(d)) {
        Some(direction) => direction,
        None => {
            trace!(?primary, "no safe direction, keeping primary");
            primary
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::ports::fake::FakeWorld;
    use crate::game::ports::CellKind;

    #[test]
    fn test_legality_checks_neighbour_cell() {
        let world = FakeWorld::new().with_cell((0, 1), CellKind::Indestructible);
        assert!(!is_terrain_legal(&world, Vec2::ZERO, Direction::Up));
        assert!(is_terrain_legal(&world, Vec2::ZERO, Direction::Down));
    }

    #[test]
    fn test_destructible_is_legal() {
        let world = FakeWorld::new().with_cell((1, 0), CellKind::Destructible);
        assert!(is_terrain_legal(&world, Vec2::ZERO, Direction::Right));
    }

    #[test]
    fn test_bias_threshold() {
        let threat = Vec2::new(1.0, 0.0);
        assert!(is_threat_biased(Vec2::ZERO, Direction::Right, threat));
        assert!(!is_threat_biased(Vec2::ZERO, Direction::Up, threat));
        assert!(!is_threat_biased(Vec2::ZERO, Direction::Left, threat));

        // ~63 degrees off is outside the cone, ~27 degrees is inside
        assert!(!is_threat_biased(Vec2::ZERO, Direction::Right, Vec2::new(1.0, 2.0)));
        assert!(is_threat_biased(Vec2::ZERO, Direction::Right, Vec2::new(2.0, 1.0)));
    }

    #[test]
    fn test_primary_kept_when_safe() {
        let world = FakeWorld::new();
        let direction = find_safe_direction(&world, Vec2::ZERO, Direction::Left, Vec2::new(2.0, 0.0));
        assert_eq!(direction, Direction::Left);
    }

    #[test]
    fn test_blocked_primary_falls_back_in_scan_order() {
        let world = FakeWorld::new().with_cell((-1, 0), CellKind::Indestructible);
        let direction = find_safe_direction(&world, Vec2::ZERO, Direction::Left, Vec2::new(2.0, 0.0));
        assert_eq!(direction, Direction::Up);
    }

    #[test]
    fn test_scan_skips_biased_and_blocked() {
        // Threat above; Up biased, Down blocked, Left blocked -> Right
        let world = FakeWorld::new()
            .with_cell((0, -1), CellKind::Indestructible)
            .with_cell((-1, 0), CellKind::Indestructible);
        let direction = find_safe_direction(&world, Vec2::ZERO, Direction::Down, Vec2::new(0.0, 3.0));
        assert_eq!(direction, Direction::Right);
    }

    #[test]
    fn test_no_safe_direction_returns_primary() {
        let world = FakeWorld::new().walled_in((0, 0));
        let direction = find_safe_direction(&world, Vec2::ZERO, Direction::Down, Vec2::new(0.0, 3.0));
        assert_eq!(direction, Direction::Down);
    }

    #[test]
    fn test_escape_route() {
        assert!(has_escape_route(&FakeWorld::new(), Vec2::ZERO));
        assert!(!has_escape_route(&FakeWorld::new().walled_in((0, 0)), Vec2::ZERO));
    }
}
