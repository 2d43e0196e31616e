//! Cardinal directions and the movement signal handed to the movement collaborator.

use serde::{Deserialize, Serialize};

use crate::util::vec2::Vec2;

/// One of the four cardinal directions a bot can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Fixed scan order used wherever directions are searched
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Axis-aligned unit vector for this direction
    #[inline]
    pub fn to_vec(self) -> Vec2 {
        match self {
            Direction::Up => Vec2::UP,
            Direction::Down => Vec2::DOWN,
            Direction::Left => Vec2::LEFT,
            Direction::Right => Vec2::RIGHT,
        }
    }

    /// Grid offset of the neighbouring cell in this direction
    #[inline]
    pub fn cell_offset(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, 1),
            Direction::Down => (0, -1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Snap an arbitrary vector to its dominant cardinal axis.
    ///
    /// Exact diagonals resolve to the horizontal axis. Returns `None` for a
    /// zero vector, which has no direction.
    pub fn from_vector(v: Vec2) -> Option<Self> {
        if v.x == 0.0 && v.y == 0.0 {
            return None;
        }
        if v.x.abs() >= v.y.abs() {
            Some(if v.x > 0.0 { Direction::Right } else { Direction::Left })
        } else {
            Some(if v.y > 0.0 { Direction::Up } else { Direction::Down })
        }
    }
}

/// Signal sent to the movement collaborator every tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveSignal {
    Move(Direction),
    /// Zero direction, emitted once when a hold period ends
    Halt,
}

impl MoveSignal {
    pub fn to_vec(self) -> Vec2 {
        match self {
            MoveSignal::Move(direction) => direction.to_vec(),
            MoveSignal::Halt => Vec2::ZERO,
        }
    }

    pub fn direction(self) -> Option<Direction> {
        match self {
            MoveSignal::Move(direction) => Some(direction),
            MoveSignal::Halt => None,
        }
    }
}
