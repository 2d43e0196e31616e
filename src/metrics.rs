//! Decision counters for bot runs
//!
//! Exposes counters in Prometheus text format and as a serializable snapshot.

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::game::direction::MoveSignal;
use crate::game::systems::ai::{BotCommand, TickOutput};
use crate::game::systems::bomb::BombVerdict;
use crate::game::systems::goal::Goal;

/// Rolling window for frame-time percentiles
const FRAME_HISTORY_LEN: usize = 1000;

/// Counters shared by every bot in a run
#[derive(Debug)]
pub struct DecisionMetrics {
    pub decisions: AtomicU64,

    // Decisions by winning goal
    pub goal_escape: AtomicU64,
    pub goal_linger: AtomicU64,
    pub goal_chase: AtomicU64,
    pub goal_collect: AtomicU64,
    pub goal_explore: AtomicU64,
    pub goal_wander: AtomicU64,

    // Bomb pipeline
    pub bombs_committed: AtomicU64,
    pub bombs_requested: AtomicU64,
    pub bombs_suppressed: AtomicU64,

    pub halts: AtomicU64,
    pub bots_eliminated: AtomicU64,

    // Frame timing (microseconds)
    pub frame_count: AtomicU64,
    pub frame_time_us: AtomicU64,
    pub frame_time_p95_us: AtomicU64,
    pub frame_time_max_us: AtomicU64,

    frame_history: RwLock<VecDeque<u64>>,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub decisions: u64,
    pub goal_escape: u64,
    pub goal_linger: u64,
    pub goal_chase: u64,
    pub goal_collect: u64,
    pub goal_explore: u64,
    pub goal_wander: u64,
    pub bombs_committed: u64,
    pub bombs_requested: u64,
    pub bombs_suppressed: u64,
    pub halts: u64,
    pub bots_eliminated: u64,
    pub frame_count: u64,
    pub frame_time_p95_us: u64,
    pub frame_time_max_us: u64,
}

impl DecisionMetrics {
    pub fn new() -> Self {
        Self {
            decisions: AtomicU64::new(0),
            goal_escape: AtomicU64::new(0),
            goal_linger: AtomicU64::new(0),
            goal_chase: AtomicU64::new(0),
            goal_collect: AtomicU64::new(0),
            goal_explore: AtomicU64::new(0),
            goal_wander: AtomicU64::new(0),
            bombs_committed: AtomicU64::new(0),
            bombs_requested: AtomicU64::new(0),
            bombs_suppressed: AtomicU64::new(0),
            halts: AtomicU64::new(0),
            bots_eliminated: AtomicU64::new(0),
            frame_count: AtomicU64::new(0),
            frame_time_us: AtomicU64::new(0),
            frame_time_p95_us: AtomicU64::new(0),
            frame_time_max_us: AtomicU64::new(0),
            frame_history: RwLock::new(VecDeque::with_capacity(FRAME_HISTORY_LEN)),
        }
    }

    fn goal_counter(&self, goal: Goal) -> &AtomicU64 {
        match goal {
            Goal::Escape => &self.goal_escape,
            Goal::Linger => &self.goal_linger,
            Goal::Chase => &self.goal_chase,
            Goal::Collect => &self.goal_collect,
            Goal::Explore => &self.goal_explore,
            Goal::Wander => &self.goal_wander,
        }
    }

    /// Count everything one bot emitted in a tick
    pub fn record_tick(&self, output: &TickOutput) {
        if let Some(decision) = output.decision {
            self.decisions.fetch_add(1, Ordering::Relaxed);
            self.goal_counter(decision.choice.goal)
                .fetch_add(1, Ordering::Relaxed);

            match decision.bomb {
                Some(BombVerdict::Triggered | BombVerdict::Place) => {
                    self.bombs_committed.fetch_add(1, Ordering::Relaxed);
                }
                Some(BombVerdict::Suppressed(_)) => {
                    self.bombs_suppressed.fetch_add(1, Ordering::Relaxed);
                }
                _ => {}
            }
        }

        if let Some(BombVerdict::Suppressed(_)) = output.confirmation {
            self.bombs_suppressed.fetch_add(1, Ordering::Relaxed);
        }

        for command in &output.commands {
            match command {
                BotCommand::PlaceBomb => {
                    self.bombs_requested.fetch_add(1, Ordering::Relaxed);
                }
                BotCommand::SetDirection(MoveSignal::Halt) => {
                    self.halts.fetch_add(1, Ordering::Relaxed);
                }
                BotCommand::SetDirection(MoveSignal::Move(_)) => {}
            }
        }
    }

    pub fn record_elimination(&self) {
        self.bots_eliminated.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a frame time and update percentiles
    pub fn record_frame_time(&self, duration: Duration) {
        let us = duration.as_micros() as u64;
        self.frame_time_us.store(us, Ordering::Relaxed);
        self.frame_count.fetch_add(1, Ordering::Relaxed);

        let mut history = self.frame_history.write();
        history.push_back(us);
        while history.len() > FRAME_HISTORY_LEN {
            history.pop_front();
        }

        let mut sorted: Vec<u64> = history.iter().copied().collect();
        sorted.sort_unstable();

        let p95_idx = (sorted.len() as f32 * 0.95) as usize;
        self.frame_time_p95_us
            .store(sorted[p95_idx.min(sorted.len() - 1)], Ordering::Relaxed);
        self.frame_time_max_us
            .store(sorted.last().copied().unwrap_or(0), Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            decisions: self.decisions.load(Ordering::Relaxed),
            goal_escape: self.goal_escape.load(Ordering::Relaxed),
            goal_linger: self.goal_linger.load(Ordering::Relaxed),
            goal_chase: self.goal_chase.load(Ordering::Relaxed),
            goal_collect: self.goal_collect.load(Ordering::Relaxed),
            goal_explore: self.goal_explore.load(Ordering::Relaxed),
            goal_wander: self.goal_wander.load(Ordering::Relaxed),
            bombs_committed: self.bombs_committed.load(Ordering::Relaxed),
            bombs_requested: self.bombs_requested.load(Ordering::Relaxed),
            bombs_suppressed: self.bombs_suppressed.load(Ordering::Relaxed),
            halts: self.halts.load(Ordering::Relaxed),
            bots_eliminated: self.bots_eliminated.load(Ordering::Relaxed),
            frame_count: self.frame_count.load(Ordering::Relaxed),
            frame_time_p95_us: self.frame_time_p95_us.load(Ordering::Relaxed),
            frame_time_max_us: self.frame_time_max_us.load(Ordering::Relaxed),
        }
    }

    /// Generate Prometheus-format metrics output
    pub fn to_prometheus(&self) -> String {
        let mut output = String::with_capacity(2048);

        macro_rules! metric {
            ($name:expr, $help:expr, $type:expr, $value:expr) => {
                output.push_str(&format!(
                    "# HELP {} {}\n# TYPE {} {}\n{} {}\n",
                    $name, $help, $name, $type, $name, $value
                ));
            };
        }

        let snap = self.snapshot();

        metric!("bomber_bot_decisions_total", "Decision cycles run", "counter", snap.decisions);

        // One series per goal
        output.push_str("# HELP bomber_bot_goal_total Decisions by winning goal\n# TYPE bomber_bot_goal_total counter\n");
        for (goal, value) in [
            ("escape", snap.goal_escape),
            ("linger", snap.goal_linger),
            ("chase", snap.goal_chase),
            ("collect", snap.goal_collect),
            ("explore", snap.goal_explore),
            ("wander", snap.goal_wander),
        ] {
            output.push_str(&format!("bomber_bot_goal_total{{goal=\"{}\"}} {}\n", goal, value));
        }

        metric!("bomber_bot_bombs_committed_total", "Bomb decisions that passed the trigger", "counter",
            snap.bombs_committed);
        metric!("bomber_bot_bombs_requested_total", "Placement requests emitted after the commit delay", "counter",
            snap.bombs_requested);
        metric!("bomber_bot_bombs_suppressed_total", "Triggered bombs dropped at confirmation", "counter",
            snap.bombs_suppressed);
        metric!("bomber_bot_halts_total", "Halt signals emitted", "counter", snap.halts);
        metric!("bomber_bot_eliminated_total", "Bots removed from the arena", "counter", snap.bots_eliminated);
        metric!("bomber_bot_frames_total", "Frames simulated", "counter", snap.frame_count);
        metric!("bomber_bot_frame_time_p95_microseconds", "95th percentile frame time", "gauge",
            snap.frame_time_p95_us);
        metric!("bomber_bot_frame_time_max_microseconds", "Maximum frame time", "gauge",
            snap.frame_time_max_us);

        output
    }
}

impl Default for DecisionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::direction::Direction;
    use crate::game::systems::ai::DecisionRecord;
    use crate::game::systems::bomb::SuppressReason;
    use crate::game::systems::goal::GoalChoice;
    use smallvec::smallvec;

    fn output(goal: Goal, bomb: Option<BombVerdict>, commands: &[BotCommand]) -> TickOutput {
        TickOutput {
            commands: commands.iter().copied().collect(),
            decision: Some(DecisionRecord {
                choice: GoalChoice {
                    goal,
                    direction: Direction::Up,
                },
                bomb,
            }),
            confirmation: None,
        }
    }

    #[test]
    fn test_record_decision() {
        let metrics = DecisionMetrics::new();
        metrics.record_tick(&output(Goal::Chase, Some(BombVerdict::Place), &[]));
        metrics.record_tick(&output(
            Goal::Escape,
            Some(BombVerdict::Suppressed(SuppressReason::InDanger)),
            &[],
        ));

        let snap = metrics.snapshot();
        assert_eq!(snap.decisions, 2);
        assert_eq!(snap.goal_chase, 1);
        assert_eq!(snap.goal_escape, 1);
        assert_eq!(snap.bombs_committed, 1);
        assert_eq!(snap.bombs_suppressed, 1);
    }

    #[test]
    fn test_record_commands() {
        let metrics = DecisionMetrics::new();
        let tick = TickOutput {
            commands: smallvec![
                BotCommand::PlaceBomb,
                BotCommand::SetDirection(MoveSignal::Move(Direction::Left)),
                BotCommand::SetDirection(MoveSignal::Halt),
            ],
            decision: None,
            confirmation: None,
        };
        metrics.record_tick(&tick);

        let snap = metrics.snapshot();
        assert_eq!(snap.decisions, 0);
        assert_eq!(snap.bombs_requested, 1);
        assert_eq!(snap.halts, 1);
    }

    #[test]
    fn test_record_dropped_confirmation() {
        let metrics = DecisionMetrics::new();
        metrics.record_tick(&output(Goal::Explore, Some(BombVerdict::Triggered), &[]));
        metrics.record_tick(&TickOutput {
            confirmation: Some(BombVerdict::Suppressed(SuppressReason::InDanger)),
            ..Default::default()
        });

        let snap = metrics.snapshot();
        assert_eq!(snap.bombs_committed, 1);
        assert_eq!(snap.bombs_suppressed, 1);
        assert_eq!(snap.bombs_requested, 0);
    }

    #[test]
    fn test_frame_time_percentiles() {
        let metrics = DecisionMetrics::new();
        for us in 1..=100 {
            metrics.record_frame_time(Duration::from_micros(us));
        }
        let snap = metrics.snapshot();
        assert_eq!(snap.frame_count, 100);
        assert_eq!(snap.frame_time_max_us, 100);
        assert!(snap.frame_time_p95_us >= 95);
    }

    #[test]
    fn test_prometheus_output() {
        let metrics = DecisionMetrics::new();
        metrics.record_tick(&output(Goal::Explore, None, &[BotCommand::PlaceBomb]));
        let text = metrics.to_prometheus();

        assert!(text.contains("# TYPE bomber_bot_decisions_total counter"));
        assert!(text.contains("bomber_bot_decisions_total 1\n"));
        assert!(text.contains("bomber_bot_goal_total{goal=\"explore\"} 1\n"));
        assert!(text.contains("bomber_bot_bombs_requested_total 1\n"));
    }
}
