//! Bot decision loop
//!
//! Each bot alternates between deciding (bomb trigger, then direction choice)
//! and holding the chosen direction for a fixed duration. A triggered bomb
//! waits out the commit delay and is confirmed against the world at that
//! moment. The loop is driven by an external per-frame tick; nothing here
//! blocks.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, trace};
use uuid::Uuid;

use crate::config::BotConfig;
use crate::game::direction::{Direction, MoveSignal};
use crate::game::ports::{BotActuator, BotWorld};
use crate::game::systems::bomb::{confirm_placement, evaluate_trigger, BombVerdict};
use crate::game::systems::goal::{choose_direction, GoalChoice};
use crate::metrics::DecisionMetrics;
use crate::util::vec2::Vec2;

pub type BotId = Uuid;

/// Per-bot decision state, owned and mutated only by its controller
#[derive(Debug, Clone, PartialEq)]
pub struct AgentState {
    /// Direction currently being held
    pub current_direction: Direction,
    /// Seconds until the next decision, never negative
    pub remaining_move_time: f32,
    /// Most recent threat location seen
    pub last_known_threat_position: Vec2,
    /// Set the cycle a threat is seen, cleared by the next threat-free cycle
    pub is_escaping_threat: bool,
}

impl Default for AgentState {
    fn default() -> Self {
        Self {
            current_direction: Direction::Down,
            remaining_move_time: 0.0,
            last_known_threat_position: Vec2::ZERO,
            is_escaping_threat: false,
        }
    }
}

/// Where the loop is between ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    Deciding,
    /// Holding `AgentState::current_direction`
    Moving,
}

/// A single output of the decision core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    SetDirection(MoveSignal),
    PlaceBomb,
}

/// What happened in a decision cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionRecord {
    pub choice: GoalChoice,
    /// Trigger outcome; `None` while an earlier placement is still pending
    pub bomb: Option<BombVerdict>,
}

/// Commands emitted by one tick, in emission order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutput {
    pub commands: SmallVec<[BotCommand; 4]>,
    pub decision: Option<DecisionRecord>,
    /// Confirmation of a pending bomb whose commit delay ran out this tick
    pub confirmation: Option<BombVerdict>,
}

impl TickOutput {
    #[inline]
    fn push(&mut self, command: BotCommand) {
        self.commands.push(command);
    }

    /// Forward every command to the actuator
    pub fn apply<A: BotActuator + ?Sized>(&self, actuator: &mut A) {
        for command in &self.commands {
            match *command {
                BotCommand::SetDirection(signal) => actuator.set_movement_direction(signal),
                BotCommand::PlaceBomb => actuator.request_bomb_placement(),
            }
        }
    }

    pub fn places_bomb(&self) -> bool {
        self.commands.contains(&BotCommand::PlaceBomb)
    }

    /// Last movement signal of the tick, if any
    pub fn last_signal(&self) -> Option<MoveSignal> {
        self.commands.iter().rev().find_map(|c| match c {
            BotCommand::SetDirection(signal) => Some(*signal),
            BotCommand::PlaceBomb => None,
        })
    }
}

/// Decision loop for one bot
#[derive(Debug, Clone)]
pub struct BotController {
    config: BotConfig,
    state: AgentState,
    phase: LoopPhase,
    /// Seconds until a committed bomb is requested
    pending_bomb: Option<f32>,
    rng: StdRng,
}

impl BotController {
    pub fn new(config: BotConfig, seed: u64) -> Self {
        Self {
            config,
            state: AgentState::default(),
            phase: LoopPhase::Deciding,
            pending_bomb: None,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    pub fn has_pending_bomb(&self) -> bool {
        self.pending_bomb.is_some()
    }

    /// Advance the loop by `dt` seconds for a bot at `position`.
    ///
    /// When the hold expires the tick emits `Halt` and decides again straight
    /// away, so the new direction follows the halt in the same tick. The one
    /// exception is a tick that already decided (`dt` covering a whole hold);
    /// that bot stays halted until the next tick.
    pub fn tick<W: BotWorld + ?Sized>(&mut self, world: &W, position: Vec2, dt: f32) -> TickOutput {
        let mut output = TickOutput::default();

        if let Some(remaining) = self.pending_bomb.as_mut() {
            *remaining -= dt;
            if *remaining <= 0.0 {
                self.pending_bomb = None;
                self.confirm_bomb(world, position, &mut output);
            }
        }

        if self.phase == LoopPhase::Deciding {
            self.decide(world, position, &mut output);
        }

        // Held direction is re-emitted every tick
        let direction = self.state.current_direction;
        output.push(BotCommand::SetDirection(MoveSignal::Move(direction)));
        self.state.remaining_move_time = (self.state.remaining_move_time - dt).max(0.0);
        trace!(?direction, remaining = self.state.remaining_move_time, "holding");

        if self.state.remaining_move_time <= 0.0 {
            output.push(BotCommand::SetDirection(MoveSignal::Halt));
            self.phase = LoopPhase::Deciding;

            if output.decision.is_none() {
                self.decide(world, position, &mut output);
                let direction = self.state.current_direction;
                output.push(BotCommand::SetDirection(MoveSignal::Move(direction)));
            }
        }

        output
    }

    /// Stage 2 for a bomb whose commit delay just ran out. Failures are dropped.
    fn confirm_bomb<W: BotWorld + ?Sized>(&self, world: &W, position: Vec2, output: &mut TickOutput) {
        let verdict = confirm_placement(world, position, &self.config);
        if verdict.should_place() {
            output.push(BotCommand::PlaceBomb);
        } else {
            debug!(?verdict, "pending bomb dropped");
        }
        output.confirmation = Some(verdict);
    }

    /// One decision cycle: bomb trigger, then direction choice
    fn decide<W: BotWorld + ?Sized>(&mut self, world: &W, position: Vec2, output: &mut TickOutput) {
        let bomb = if self.pending_bomb.is_none() {
            let draw: f32 = self.rng.gen();
            let verdict = match evaluate_trigger(world, position, &self.config, draw) {
                BombVerdict::Triggered if self.config.bomb_commit_delay > 0.0 => {
                    self.pending_bomb = Some(self.config.bomb_commit_delay);
                    BombVerdict::Triggered
                }
                BombVerdict::Triggered => {
                    let verdict = confirm_placement(world, position, &self.config);
                    if verdict.should_place() {
                        output.push(BotCommand::PlaceBomb);
                    }
                    verdict
                }
                verdict => verdict,
            };
            Some(verdict)
        } else {
            None
        };

        let choice = choose_direction(world, &mut self.state, position, &self.config, &mut self.rng);

        self.state.current_direction = choice.direction;
        self.state.remaining_move_time = self.config.move_duration;
        self.phase = LoopPhase::Moving;

        debug!(goal = ?choice.goal, direction = ?choice.direction, ?bomb, "decision");
        output.decision = Some(DecisionRecord { choice, bomb });
    }
}

/// Decision loops for every bot in a match
pub struct BotManager {
    config: BotConfig,
    controllers: HashMap<BotId, BotController>,
    metrics: Arc<DecisionMetrics>,
}

impl BotManager {
    pub fn new(config: BotConfig, metrics: Arc<DecisionMetrics>) -> Self {
        Self {
            config,
            controllers: HashMap::new(),
            metrics,
        }
    }

    pub fn register_bot(&mut self, bot_id: BotId, seed: u64) {
        self.controllers
            .insert(bot_id, BotController::new(self.config.clone(), seed));
        info!(%bot_id, "bot registered");
    }

    pub fn unregister_bot(&mut self, bot_id: BotId) {
        if self.controllers.remove(&bot_id).is_some() {
            info!(%bot_id, "bot unregistered");
        }
    }

    pub fn get(&self, bot_id: BotId) -> Option<&BotController> {
        self.controllers.get(&bot_id)
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    pub fn metrics(&self) -> &Arc<DecisionMetrics> {
        &self.metrics
    }

    /// Tick every bot.
    ///
    /// `view` yields the world as seen by one bot and its position, or `None`
    /// if the bot is no longer in the world. Ticks run in parallel; outputs
    /// come back sorted by bot id so callers can apply them deterministically.
    pub fn update<V, F>(&mut self, view: F, dt: f32) -> Vec<(BotId, TickOutput)>
    where
        V: BotWorld,
        F: Fn(BotId) -> Option<(V, Vec2)> + Sync,
    {
        // Compute decisions in parallel
        let mut outputs: Vec<(BotId, TickOutput)> = self
            .controllers
            .par_iter_mut()
            .filter_map(|(&bot_id, controller)| {
                let (world, position) = view(bot_id)?;
                Some((bot_id, controller.tick(&world, position, dt)))
            })
            .collect();

        outputs.sort_unstable_by_key(|(bot_id, _)| *bot_id);

        // Record sequentially
        for (_, output) in &outputs {
            self.metrics.record_tick(output);
        }

        outputs
    }
}
