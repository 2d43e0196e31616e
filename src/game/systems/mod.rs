pub mod threat;
pub mod escape;
pub mod goal;
pub mod bomb;
pub mod ai;
