//! The simulation context for one round.
//!
//! A [`Round`] owns every mutable piece of the game: the waypoint registry,
//! the agents, the dog, the player, and the seeded RNG. The frame loop holds
//! it exclusively and passes it by `&mut` into [`crate::tick::tick`].
//!
//! The judge boundary is a pair of unbounded channels bundled in a
//! [`JudgeLink`]. The round only ever sends on one and `try_recv`s on the
//! other, so it never awaits.

use herding_types::{
    AgentId, JudgeEvent, JudgeRequest, PlayerIntent, Position, RoundSnapshot, TooFarIndicator,
    WinRecord,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::agent::Agent;
use crate::config::SimulationConfig;
use crate::conversation;
use crate::dog::HerdingDog;
use crate::dwell::uniform;
use crate::error::{IntentError, SimError};
use crate::movement::Arena;
use crate::player::Player;
use crate::waypoint::WaypointRegistry;

/// Distance from the arena edge kept clear when spawning.
const SPAWN_MARGIN: f32 = 1.0;

// ---------------------------------------------------------------------------
// Judge channels
// ---------------------------------------------------------------------------

/// The round's side of the judge boundary.
#[derive(Debug)]
pub struct JudgeLink {
    /// Requests out to the judge dispatcher.
    pub(crate) outbox: mpsc::UnboundedSender<JudgeRequest>,
    /// Events back from the dispatcher.
    pub(crate) inbox: mpsc::UnboundedReceiver<JudgeEvent>,
}

/// The dispatcher's side of the judge boundary.
#[derive(Debug)]
pub struct JudgeEndpoint {
    /// Requests emitted by the round.
    pub requests: mpsc::UnboundedReceiver<JudgeRequest>,
    /// Where to send streamed updates and outcomes.
    pub events: mpsc::UnboundedSender<JudgeEvent>,
}

impl JudgeLink {
    /// Create a connected link and endpoint.
    pub fn pair() -> (Self, JudgeEndpoint) {
        let (req_tx, req_rx) = mpsc::unbounded_channel();
        let (evt_tx, evt_rx) = mpsc::unbounded_channel();
        (
            Self {
                outbox: req_tx,
                inbox: evt_rx,
            },
            JudgeEndpoint {
                requests: req_rx,
                events: evt_tx,
            },
        )
    }
}

// ---------------------------------------------------------------------------
// Round
// ---------------------------------------------------------------------------

/// All mutable game state for the current round.
#[derive(Debug)]
pub struct Round {
    /// Configuration the round was built from.
    pub config: SimulationConfig,
    /// Round counter, starting at 1 and incremented on restart.
    pub number: u32,
    /// Frames simulated this round.
    pub frame: u64,
    /// Simulated seconds since round start; frozen once won.
    pub elapsed_seconds: f32,
    /// Waypoints for this round.
    pub waypoints: WaypointRegistry,
    /// Agents in roster order.
    pub agents: Vec<Agent>,
    /// The herding dog, if enabled.
    pub dog: Option<HerdingDog>,
    /// The player avatar.
    pub player: Player,
    /// Out-of-range click hint.
    pub too_far: Option<TooFarIndicator>,
    /// Set on the first winning frame and never cleared within a round.
    pub won: Option<WinRecord>,
    pub(crate) rng: StdRng,
    pub(crate) judge: JudgeLink,
}

impl Round {
    /// Build round 1 from configuration.
    ///
    /// The RNG is seeded from `world.seed`, so two rounds built from the
    /// same configuration lay out identically.
    ///
    /// # Errors
    ///
    /// Returns a [`SimError`] if the configuration cannot produce a valid
    /// round.
    pub fn new(config: SimulationConfig, judge: JudgeLink) -> Result<Self, SimError> {
        validate(&config)?;
        let mut rng = StdRng::seed_from_u64(config.world.seed);
        let waypoints = WaypointRegistry::generate(
            &config.waypoints,
            config.world.arena_half_extent,
            &mut rng,
        )?;
        let agents = spawn_agents(&config, &mut rng);
        let dog = spawn_dog(&config, &mut rng);
        let player = Player::spawn(&config.player);

        info!(
            seed = config.world.seed,
            agents = agents.len(),
            waypoints = waypoints.all().len(),
            target = %waypoints.target_id(),
            "Round 1 ready"
        );

        Ok(Self {
            number: 1,
            frame: 0,
            elapsed_seconds: 0.0,
            waypoints,
            agents,
            dog,
            player,
            too_far: None,
            won: None,
            rng,
            judge,
            config,
        })
    }

    /// Throw the round away and start the next one.
    ///
    /// Every agent is recreated with a new id, so judge events still in
    /// flight for the old round find no agent and are dropped. The RNG
    /// carries on from where it was, giving a fresh layout.
    ///
    /// # Errors
    ///
    /// Returns a [`SimError`] if waypoint generation fails.
    pub fn restart(&mut self) -> Result<(), SimError> {
        let waypoints = WaypointRegistry::generate(
            &self.config.waypoints,
            self.config.world.arena_half_extent,
            &mut self.rng,
        )?;
        self.waypoints = waypoints;
        self.agents = spawn_agents(&self.config, &mut self.rng);
        self.dog = spawn_dog(&self.config, &mut self.rng);
        self.player = Player::spawn(&self.config.player);
        self.number = self.number.saturating_add(1);
        self.frame = 0;
        self.elapsed_seconds = 0.0;
        self.too_far = None;
        self.won = None;
        info!(
            round = self.number,
            target = %self.waypoints.target_id(),
            "Round restarted"
        );
        Ok(())
    }

    /// Arena bounds and movement scale.
    pub const fn arena(&self) -> Arena {
        Arena {
            half_extent: self.config.world.arena_half_extent,
            reference_frame_rate: self.config.world.reference_frame_rate,
        }
    }

    /// Look up an agent by id.
    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id == id)
    }

    /// Look up an agent by id, mutably.
    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.iter_mut().find(|a| a.id == id)
    }

    /// Apply one player intent.
    ///
    /// # Errors
    ///
    /// Returns [`IntentError::Conversation`] when a conversation request is
    /// rejected, or [`IntentError::Restart`] if a restart fails. A rejected
    /// click on a distant agent still raises the "too far" hint.
    pub fn apply_intent(&mut self, intent: PlayerIntent) -> Result<(), IntentError> {
        match intent {
            PlayerIntent::SetMovement { flags } => {
                self.player.set_movement(flags);
                Ok(())
            }
            PlayerIntent::MoveTo { destination } => {
                self.player.destination = Some(self.clamp(destination));
                Ok(())
            }
            PlayerIntent::ClickAgent { agent_id } => {
                Ok(conversation::open_interaction(self, agent_id)?)
            }
            PlayerIntent::SubmitMessage { agent_id, text } => {
                Ok(conversation::send_message(self, agent_id, &text)?)
            }
            PlayerIntent::CloseDialogue { agent_id } => {
                let closed = conversation::close_interaction(self, agent_id)?;
                if !closed {
                    debug!(agent = %agent_id, "Close ignored while reply is pending or being read");
                }
                Ok(())
            }
            PlayerIntent::ClickGround { destination } => {
                conversation::close_all(self);
                if let Some(dest) = destination {
                    self.player.destination = Some(self.clamp(dest));
                }
                Ok(())
            }
            PlayerIntent::Restart => Ok(self.restart()?),
        }
    }

    /// Read-only projection for the presentation layer.
    pub fn snapshot(&self) -> RoundSnapshot {
        RoundSnapshot {
            round: self.number,
            frame: self.frame,
            elapsed_seconds: self.elapsed_seconds,
            arena_half_extent: self.config.world.arena_half_extent,
            won: self.won.clone(),
            waypoints: self.waypoints.all().to_vec(),
            player: self.player.view(),
            agents: self.agents.iter().map(Agent::view).collect(),
            dog: self.dog.as_ref().map(HerdingDog::view),
            too_far: self.too_far.clone(),
        }
    }

    fn clamp(&self, p: Position) -> Position {
        crate::geometry::clamp_to_arena(p, self.config.world.arena_half_extent)
    }
}

/// Reject configurations that cannot produce a playable round.
fn validate(config: &SimulationConfig) -> Result<(), SimError> {
    if config.agents.roster.is_empty() {
        return Err(SimError::EmptyRoster);
    }
    let half = config.world.arena_half_extent;
    if !half.is_finite() || half <= SPAWN_MARGIN {
        return Err(SimError::InvalidConfig {
            reason: format!("arena_half_extent must exceed {SPAWN_MARGIN}, got {half}"),
        });
    }
    let rate = config.world.reference_frame_rate;
    if !(rate.is_finite() && rate > 0.0) {
        return Err(SimError::InvalidConfig {
            reason: format!("world.reference_frame_rate must be positive, got {rate}"),
        });
    }

    let waypoints = &config.waypoints;
    let agents = &config.agents;
    let timing = &config.timing;
    let player = &config.player;
    let dog = &config.dog;
    // Random ranges and countdowns below panic or never end on NaN/inf.
    [
        ("waypoints.capture_radius", waypoints.capture_radius),
        ("waypoints.min_separation", waypoints.min_separation),
        ("waypoints.arrival_slack", waypoints.arrival_slack),
        ("waypoints.capture_slack", waypoints.capture_slack),
        ("agents.speed_min", agents.speed_min),
        ("agents.speed_max", agents.speed_max),
        ("timing.dwell_min_seconds", timing.dwell_min_seconds),
        ("timing.dwell_max_seconds", timing.dwell_max_seconds),
        ("timing.convinced_duration_seconds", timing.convinced_duration_seconds),
        ("timing.snark_threshold_seconds", timing.snark_threshold_seconds),
        ("timing.read_time_base_seconds", timing.read_time_base_seconds),
        ("timing.read_time_per_word_seconds", timing.read_time_per_word_seconds),
        ("timing.failure_read_time_seconds", timing.failure_read_time_seconds),
        ("timing.too_far_seconds", timing.too_far_seconds),
        ("player.speed", player.speed),
        ("player.influence_radius", player.influence_radius),
        ("dog.speed", dog.speed),
        ("dog.interaction_distance", dog.interaction_distance),
        ("dog.message_seconds", dog.message_seconds),
        ("dog.cooldown_seconds", dog.cooldown_seconds),
        ("dog.abandon_cooldown_seconds", dog.abandon_cooldown_seconds),
    ]
    .into_iter()
    .try_for_each(|(name, value)| non_negative(name, value))
}

fn non_negative(name: &str, value: f32) -> Result<(), SimError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidConfig {
            reason: format!("{name} must be finite and not negative, got {value}"),
        })
    }
}

fn random_position(half_extent: f32, rng: &mut StdRng) -> Position {
    let m = (half_extent - SPAWN_MARGIN).max(0.0);
    Position::new(uniform(-m, m, rng), uniform(-m, m, rng))
}

fn spawn_agents(config: &SimulationConfig, rng: &mut StdRng) -> Vec<Agent> {
    config
        .agents
        .roster
        .iter()
        .map(|profile| {
            let position = random_position(config.world.arena_half_extent, rng);
            let speed = uniform(config.agents.speed_min, config.agents.speed_max, rng);
            Agent::spawn(profile, position, speed)
        })
        .collect()
}

fn spawn_dog(config: &SimulationConfig, rng: &mut StdRng) -> Option<HerdingDog> {
    config.dog.enabled.then(|| {
        HerdingDog::spawn(
            random_position(config.world.arena_half_extent, rng),
            config.dog.speed,
        )
    })
}
