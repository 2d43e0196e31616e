pub mod constants;
pub mod direction;
pub mod ports;
pub mod spatial;
pub mod terrain;
pub mod arena;
pub mod systems;
