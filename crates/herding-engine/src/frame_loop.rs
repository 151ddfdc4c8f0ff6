//! The real-time frame loop.
//!
//! [`FrameLoop`] owns the [`Round`]. Every frame it drains the player
//! intents queued by the presentation server, advances the round by the
//! measured wall-clock delta, and publishes a snapshot at the configured
//! snapshot rate. Wins and restarts are published immediately so clients
//! never miss the transition.
//!
//! The loop runs until the shutdown future resolves.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use herding_server::AppState;
use herding_sim::{IntentError, Round, TickSummary, tick};
use herding_types::PlayerIntent;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Longest delta a single frame may simulate, in seconds.
///
/// A stall (debugger, suspended laptop) must not teleport everyone across
/// the arena on the next frame.
pub const MAX_FRAME_DELTA: f32 = 0.25;

/// Totals for one run of the frame loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Frames simulated across all rounds.
    pub total_frames: u64,
    /// Rounds won.
    pub rounds_won: u32,
    /// Intents applied successfully.
    pub intents_applied: u64,
    /// Intents the round rejected.
    pub intents_rejected: u64,
}

/// Drives a round in real time.
pub struct FrameLoop {
    round: Round,
    intents: mpsc::Receiver<PlayerIntent>,
    state: Arc<AppState>,
    frame_period: Duration,
    publish_period: f32,
    since_publish: f32,
    stats: LoopStats,
}

impl FrameLoop {
    /// Create a frame loop around a freshly built round.
    ///
    /// Frame and snapshot rates come from the round's configuration. A rate
    /// of zero is treated as one per second.
    pub fn new(
        round: Round,
        intents: mpsc::Receiver<PlayerIntent>,
        state: Arc<AppState>,
    ) -> Self {
        let frame_rate = f64::from(round.config.world.frame_rate.max(1));
        let snapshot_hz = f64::from(round.config.server.snapshot_hz.max(1));
        Self {
            round,
            intents,
            state,
            frame_period: Duration::from_secs_f64(1.0 / frame_rate),
            publish_period: Duration::from_secs_f64(1.0 / snapshot_hz).as_secs_f32(),
            since_publish: 0.0,
            stats: LoopStats::default(),
        }
    }

    /// The round being driven.
    pub const fn round(&self) -> &Round {
        &self.round
    }

    /// Totals so far.
    pub const fn stats(&self) -> &LoopStats {
        &self.stats
    }

    /// Run frames until `shutdown` resolves.
    ///
    /// Publishes the starting snapshot before the first frame so the API
    /// has something to serve immediately.
    pub async fn run<F>(mut self, shutdown: F) -> LoopStats
    where
        F: Future<Output = ()>,
    {
        info!(
            round = self.round.number,
            frame_period_ms = self.frame_period.as_millis(),
            agents = self.round.agents.len(),
            "Frame loop starting"
        );

        self.publish().await;

        let mut interval = tokio::time::interval(self.frame_period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last = Instant::now();

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!("Shutdown requested, frame loop stopping");
                    break;
                }
                now = interval.tick() => {
                    let delta = now.duration_since(last).as_secs_f32().min(MAX_FRAME_DELTA);
                    last = now;
                    self.step(delta).await;
                }
            }
        }

        log_loop_end(&self.stats, &self.round);
        self.stats
    }

    /// Apply queued intents, advance one frame, and publish if due.
    pub async fn step(&mut self, delta: f32) -> TickSummary {
        let round_before = self.round.number;
        self.drain_intents();
        let restarted = self.round.number != round_before;

        let was_won = self.round.won.is_some();
        let summary = tick(&mut self.round, delta);
        self.stats.total_frames = self.stats.total_frames.saturating_add(1);

        if summary.won && !was_won {
            self.stats.rounds_won = self.stats.rounds_won.saturating_add(1);
            info!(
                round = self.round.number,
                frame = summary.frame,
                elapsed_seconds = self.round.elapsed_seconds,
                "Round won"
            );
        }
        if summary.newly_convinced > 0 || summary.dog_delivered {
            debug!(
                frame = summary.frame,
                newly_convinced = summary.newly_convinced,
                dog_delivered = summary.dog_delivered,
                "Frame events"
            );
        }

        self.since_publish += delta;
        if restarted || summary.won || self.since_publish >= self.publish_period {
            self.publish().await;
        }

        summary
    }

    fn drain_intents(&mut self) {
        while let Ok(intent) = self.intents.try_recv() {
            let is_restart = intent == PlayerIntent::Restart;
            match self.round.apply_intent(intent) {
                Ok(()) => {
                    self.stats.intents_applied = self.stats.intents_applied.saturating_add(1);
                    if is_restart {
                        info!(round = self.round.number, "Round restarted");
                    }
                }
                Err(IntentError::Conversation { source }) => {
                    self.stats.intents_rejected = self.stats.intents_rejected.saturating_add(1);
                    debug!(error = %source, "Intent rejected");
                }
                Err(e) => {
                    self.stats.intents_rejected = self.stats.intents_rejected.saturating_add(1);
                    warn!(error = %e, "Intent failed");
                }
            }
        }
    }

    async fn publish(&mut self) {
        self.since_publish = 0.0;
        let receivers = self.state.publish(self.round.snapshot()).await;
        debug!(frame = self.round.frame, receivers, "Snapshot published");
    }
}

/// Log the totals once the loop has stopped.
pub fn log_loop_end(stats: &LoopStats, round: &Round) {
    info!(
        total_frames = stats.total_frames,
        rounds_won = stats.rounds_won,
        intents_applied = stats.intents_applied,
        intents_rejected = stats.intents_rejected,
        final_round = round.number,
        final_round_won = round.won.is_some(),
        "Frame loop ended"
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use herding_sim::{JudgeLink, SimulationConfig};
    use herding_types::{AgentId, Position};

    use super::*;

    fn make_loop() -> (FrameLoop, mpsc::Sender<PlayerIntent>, Arc<AppState>) {
        let (link, _endpoint) = JudgeLink::pair();
        let round = Round::new(SimulationConfig::default(), link).unwrap();
        let (tx, rx) = mpsc::channel(16);
        let state = Arc::new(AppState::new(tx.clone()));
        (FrameLoop::new(round, rx, Arc::clone(&state)), tx, state)
    }

    #[tokio::test]
    async fn restart_intent_starts_next_round_and_publishes() {
        let (mut frames, tx, state) = make_loop();
        frames.step(0.0).await;
        tx.send(PlayerIntent::Restart).await.unwrap();

        frames.step(0.0).await;

        assert_eq!(frames.round().number, 2);
        assert_eq!(state.current().await.unwrap().round, 2);
        assert_eq!(frames.stats().intents_applied, 1);
    }

    #[tokio::test]
    async fn rejected_intents_do_not_stop_the_frame() {
        let (mut frames, tx, _state) = make_loop();
        tx.send(PlayerIntent::SubmitMessage {
            agent_id: AgentId::new(),
            text: "Hello?".to_owned(),
        })
        .await
        .unwrap();
        tx.send(PlayerIntent::MoveTo {
            destination: Position::new(3.0, 3.0),
        })
        .await
        .unwrap();

        let summary = frames.step(1.0 / 60.0).await;

        assert_eq!(summary.frame, 1);
        assert_eq!(frames.stats().intents_rejected, 1);
        assert_eq!(frames.stats().intents_applied, 1);
    }

    #[tokio::test]
    async fn snapshots_follow_the_snapshot_rate() {
        let (mut frames, _tx, state) = make_loop();
        let mut sub = state.subscribe();

        // Default snapshot rate is well below 1000 Hz, so a 1 ms frame
        // does not publish but a full second does.
        frames.step(0.001).await;
        assert!(sub.try_recv().is_err());

        frames.step(1.0).await;
        let snapshot = sub.try_recv().unwrap();
        assert_eq!(snapshot.frame, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn run_publishes_then_stops_on_shutdown() {
        let (frames, _tx, state) = make_loop();
        let stats = frames
            .run(tokio::time::sleep(Duration::from_millis(100)))
            .await;

        assert!(stats.total_frames > 0);
        let snapshot = state.current().await.unwrap();
        assert_eq!(snapshot.round, 1);
    }
}
