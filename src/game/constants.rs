/// Decision-core constants. These are contract values: behavior is tuned
/// against them and tests assume them unchanged.
pub mod bot {
    /// Seconds a chosen direction is held before the next decision
    pub const MOVE_DURATION: f32 = 0.20;
    /// Added to the bot's own blast radius to get the threat-detection radius
    pub const THREAT_SAFETY_MARGIN: f32 = 10.0;
    /// Radius within which perks are noticed
    pub const PERK_DETECTION_RADIUS: f32 = 1.5;
    /// Radius within which rival players are noticed
    pub const PLAYER_DETECTION_RADIUS: f32 = 2.0;
    /// A uniform draw above this value triggers a bomb attempt on its own
    pub const BOMB_TRIGGER_THRESHOLD: f32 = 0.7;
    /// Pause between committing to a bomb and requesting its placement
    pub const BOMB_COMMIT_DELAY: f32 = 0.5;
    /// Dot product above which a direction counts as heading back at a threat (~60 degrees)
    pub const ESCAPE_BIAS_THRESHOLD: f32 = 0.5;
    /// Length of the terrain probe used for legality checks (one cell)
    pub const PROBE_LENGTH: f32 = 1.0;
}

/// Headless arena constants (collaborator side, not part of the decision contract)
pub mod arena {
    /// Bot movement speed in cells per second
    pub const BOT_SPEED: f32 = 5.0;
    /// Bombs a bot starts with
    pub const STARTING_BOMBS: u32 = 1;
    /// Blast radius (cells per arm) a bot starts with
    pub const STARTING_BLAST_RADIUS: f32 = 2.0;
    /// Upper bound on blast radius from perks
    pub const MAX_BLAST_RADIUS: f32 = 8.0;
    /// Seconds between placement and detonation
    pub const BOMB_FUSE: f32 = 3.0;
    /// Seconds an explosion stays active
    pub const EXPLOSION_DURATION: f32 = 1.0;
    /// Chance a destroyed crate leaves a perk behind
    pub const PERK_DROP_CHANCE: f32 = 0.3;
    /// Distance at which a bot collects a perk
    pub const PERK_PICKUP_DISTANCE: f32 = 0.5;
    /// Cells around a bot (Chebyshev distance) marked explored each step
    pub const SIGHT_RADIUS: i32 = 1;
}

/// Headless simulation defaults
pub mod sim {
    /// Fixed frame step in seconds
    pub const DT: f32 = 1.0 / 60.0;
    /// Default arena width in cells (odd for the pillar layout)
    pub const DEFAULT_WIDTH: u32 = 15;
    /// Default arena height in cells
    pub const DEFAULT_HEIGHT: u32 = 13;
    /// Default number of bots
    pub const DEFAULT_BOTS: usize = 4;
    /// Default simulated seconds
    pub const DEFAULT_SECONDS: f32 = 60.0;
    /// Default fraction of free cells filled with crates
    pub const DEFAULT_CRATE_DENSITY: f32 = 0.6;
}
