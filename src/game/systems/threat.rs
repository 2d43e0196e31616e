//! Threat assessment
//!
//! Classifies the bot's position against armed bombs and active explosions.
//! Pure: reads the spatial port, never touches agent state.

use crate::game::constants::bot::THREAT_SAFETY_MARGIN;
use crate::game::ports::{nearest, BombStock, MarkerKind, SpatialQueryPort};
use crate::util::vec2::Vec2;

/// Result of a threat query at one position
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ThreatAssessment {
    /// A bomb or explosion is within detection radius
    pub near_threat: bool,
    /// Representative threat position; bombs win over explosions
    pub threat_position: Option<Vec2>,
    /// An active explosion is within detection radius
    pub in_danger: bool,
}

/// Threat-detection radius for a bot whose own bombs reach `explosion_radius`
#[inline]
pub fn detection_radius(explosion_radius: f32, safety_margin: f32) -> f32 {
    explosion_radius + safety_margin
}

/// Detection radius using the world's blast config and the default margin
pub fn default_detection_radius<W: BombStock + ?Sized>(world: &W) -> f32 {
    detection_radius(world.explosion_radius(), THREAT_SAFETY_MARGIN)
}

/// Assess threats around `position` within `radius`
pub fn assess<P: SpatialQueryPort + ?Sized>(port: &P, position: Vec2, radius: f32) -> ThreatAssessment {
    let bombs = port.query_nearby(position, radius, MarkerKind::Bomb);
    let explosions = port.query_nearby(position, radius, MarkerKind::Explosion);

    let threat_position = nearest(position, &bombs).or_else(|| nearest(position, &explosions));

    ThreatAssessment {
        near_threat: !bombs.is_empty() || !explosions.is_empty(),
        threat_position,
        in_danger: !explosions.is_empty(),
    }
}

/// Explosion-only check used as a bomb-placement precondition
pub fn is_in_danger<P: SpatialQueryPort + ?Sized>(port: &P, position: Vec2, radius: f32) -> bool {
    !port
        .query_nearby(position, radius, MarkerKind::Explosion)
        .is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::ports::fake::FakeWorld;

    const RADIUS: f32 = 12.0;

    #[test]
    fn test_no_threats() {
        let world = FakeWorld::new();
        let assessment = assess(&world, Vec2::ZERO, RADIUS);
        assert_eq!(assessment, ThreatAssessment::default());
    }

    #[test]
    fn test_bomb_is_near_threat_but_not_danger() {
        let world = FakeWorld::new().with_marker(MarkerKind::Bomb, Vec2::new(3.0, 0.0));
        let assessment = assess(&world, Vec2::ZERO, RADIUS);
        assert!(assessment.near_threat);
        assert!(!assessment.in_danger);
        assert_eq!(assessment.threat_position, Some(Vec2::new(3.0, 0.0)));
    }

    #[test]
    fn test_explosion_is_danger() {
        let world = FakeWorld::new().with_marker(MarkerKind::Explosion, Vec2::new(0.0, 4.0));
        let assessment = assess(&world, Vec2::ZERO, RADIUS);
        assert!(assessment.near_threat);
        assert!(assessment.in_danger);
        assert_eq!(assessment.threat_position, Some(Vec2::new(0.0, 4.0)));
        assert!(is_in_danger(&world, Vec2::ZERO, RADIUS));
    }

    #[test]
    fn test_bomb_takes_precedence_over_closer_explosion() {
        let world = FakeWorld::new()
            .with_marker(MarkerKind::Explosion, Vec2::new(1.0, 0.0))
            .with_marker(MarkerKind::Bomb, Vec2::new(-6.0, 0.0));
        let assessment = assess(&world, Vec2::ZERO, RADIUS);
        assert_eq!(assessment.threat_position, Some(Vec2::new(-6.0, 0.0)));
        assert!(assessment.in_danger);
    }

    #[test]
    fn test_nearest_bomb_is_representative() {
        let world = FakeWorld::new()
            .with_marker(MarkerKind::Bomb, Vec2::new(8.0, 0.0))
            .with_marker(MarkerKind::Bomb, Vec2::new(0.0, -2.0));
        let assessment = assess(&world, Vec2::ZERO, RADIUS);
        assert_eq!(assessment.threat_position, Some(Vec2::new(0.0, -2.0)));
    }

    #[test]
    fn test_out_of_range_ignored() {
        let world = FakeWorld::new().with_marker(MarkerKind::Explosion, Vec2::new(20.0, 0.0));
        let assessment = assess(&world, Vec2::ZERO, RADIUS);
        assert!(!assessment.near_threat);
        assert!(!assessment.in_danger);
    }

    #[test]
    fn test_detection_radius_adds_margin() {
        let world = FakeWorld::new();
        assert_eq!(default_detection_radius(&world), 2.0 + THREAT_SAFETY_MARGIN);
    }
}
