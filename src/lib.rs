//! Bomber Bot
//!
//! Threat-aware decision engine for autonomous bomber-arena players, plus a
//! headless arena that drives it end to end.
//!
//! The decision core lives in [`game::systems`] and only talks to the world
//! through the traits in [`game::ports`].

pub mod config;
pub mod util;
pub mod game;
pub mod metrics;
