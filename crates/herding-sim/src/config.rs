//! Configuration loading and typed config structures for the Herding game.
//!
//! The canonical configuration lives in `herding-config.yaml` at the project
//! root. Every field has a default, so an empty file (or no file at all)
//! yields a playable round.

use std::path::Path;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An environment override held an unparseable value.
    #[error("invalid environment override {name}={value}: {reason}")]
    EnvOverride {
        /// The variable name.
        name: &'static str,
        /// The rejected value.
        value: String,
        /// Why the value did not parse.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level game configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Seed, arena size, and frame timing.
    #[serde(default)]
    pub world: WorldConfig,

    /// Waypoint generation and arrival tolerances.
    #[serde(default)]
    pub waypoints: WaypointConfig,

    /// Agent roster and movement.
    #[serde(default)]
    pub agents: AgentsConfig,

    /// Dwell, stay, and read-time durations.
    #[serde(default)]
    pub timing: TimingConfig,

    /// Player avatar parameters.
    #[serde(default)]
    pub player: PlayerConfig,

    /// Herding dog parameters.
    #[serde(default)]
    pub dog: DogConfig,

    /// API server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `HERDING_SEED` overrides `world.seed`
    /// - `HERDING_PORT` overrides `server.port`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::EnvOverride`] if an override does not parse.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // serde_yml treats an empty document as unit, not an empty map.
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply `HERDING_*` environment overrides.
    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("HERDING_SEED") {
            self.world.seed = parse_override("HERDING_SEED", &val)?;
        }
        if let Ok(val) = std::env::var("HERDING_PORT") {
            self.server.port = parse_override("HERDING_PORT", &val)?;
        }
        Ok(())
    }
}

fn parse_override<T>(name: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::EnvOverride {
        name,
        value: value.to_owned(),
        reason: e.to_string(),
    })
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorldConfig {
    /// Random seed for reproducible rounds.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Half the side length of the square arena.
    #[serde(default = "default_arena_half_extent")]
    pub arena_half_extent: f32,

    /// Frame rate the frame loop targets.
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,

    /// Frame rate at which `speed` values mean "distance per frame".
    ///
    /// Movement is scaled by `delta * reference_frame_rate` so a speed
    /// of 0.05 covers 0.05 units per 1/60 s regardless of actual frame rate.
    #[serde(default = "default_reference_frame_rate")]
    pub reference_frame_rate: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            arena_half_extent: default_arena_half_extent(),
            frame_rate: default_frame_rate(),
            reference_frame_rate: default_reference_frame_rate(),
        }
    }
}

/// Waypoint generation and arrival tolerances.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WaypointConfig {
    /// Waypoint names; one is picked as the target each round.
    #[serde(default = "default_waypoint_names")]
    pub names: Vec<String>,

    /// Capture radius for every generated waypoint.
    #[serde(default = "default_capture_radius")]
    pub capture_radius: f32,

    /// Minimum distance between generated waypoint centers.
    #[serde(default = "default_min_separation")]
    pub min_separation: f32,

    /// Extra tolerance for arriving at an ordinary waypoint.
    #[serde(default = "default_arrival_slack")]
    pub arrival_slack: f32,

    /// Extra tolerance for every target check: arrival, stay, and win.
    #[serde(default = "default_capture_slack")]
    pub capture_slack: f32,
}

impl Default for WaypointConfig {
    fn default() -> Self {
        Self {
            names: default_waypoint_names(),
            capture_radius: default_capture_radius(),
            min_separation: default_min_separation(),
            arrival_slack: default_arrival_slack(),
            capture_slack: default_capture_slack(),
        }
    }
}

/// One entry in the agent roster.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AgentProfile {
    /// Display name.
    pub name: String,
    /// Free-text personality handed to the persuasion judge.
    pub personality: String,
}

/// Agent roster and movement.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AgentsConfig {
    /// The agents spawned each round.
    #[serde(default = "default_roster")]
    pub roster: Vec<AgentProfile>,

    /// Slowest per-frame agent speed.
    #[serde(default = "default_agent_speed_min")]
    pub speed_min: f32,

    /// Fastest per-frame agent speed.
    #[serde(default = "default_agent_speed_max")]
    pub speed_max: f32,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            roster: default_roster(),
            speed_min: default_agent_speed_min(),
            speed_max: default_agent_speed_max(),
        }
    }
}

/// Timer durations, all in seconds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TimingConfig {
    /// Shortest dwell at an ordinary waypoint.
    #[serde(default = "default_dwell_min")]
    pub dwell_min_seconds: f32,

    /// Longest dwell at an ordinary waypoint.
    #[serde(default = "default_dwell_max")]
    pub dwell_max_seconds: f32,

    /// How long a convinced agent stays at the target.
    #[serde(default = "default_convinced_duration")]
    pub convinced_duration_seconds: f32,

    /// Remaining stay time at which a snarky comment appears.
    #[serde(default = "default_snark_threshold")]
    pub snark_threshold_seconds: f32,

    /// Read-time floor for every reply.
    #[serde(default = "default_read_time_base")]
    pub read_time_base_seconds: f32,

    /// Read time added per word of reply.
    #[serde(default = "default_read_time_per_word")]
    pub read_time_per_word_seconds: f32,

    /// Read time after a failed judge call.
    #[serde(default = "default_failure_read_time")]
    pub failure_read_time_seconds: f32,

    /// How long the "too far" hint stays up.
    #[serde(default = "default_too_far")]
    pub too_far_seconds: f32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            dwell_min_seconds: default_dwell_min(),
            dwell_max_seconds: default_dwell_max(),
            convinced_duration_seconds: default_convinced_duration(),
            snark_threshold_seconds: default_snark_threshold(),
            read_time_base_seconds: default_read_time_base(),
            read_time_per_word_seconds: default_read_time_per_word(),
            failure_read_time_seconds: default_failure_read_time(),
            too_far_seconds: default_too_far(),
        }
    }
}

/// Player avatar parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlayerConfig {
    /// Per-frame player speed.
    #[serde(default = "default_player_speed")]
    pub speed: f32,

    /// Agents within this distance can be talked to.
    #[serde(default = "default_influence_radius")]
    pub influence_radius: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            speed: default_player_speed(),
            influence_radius: default_influence_radius(),
        }
    }
}

/// Herding dog parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DogConfig {
    /// Whether the dog takes part in the round.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Per-frame dog speed.
    #[serde(default = "default_dog_speed")]
    pub speed: f32,

    /// Distance at which the dog delivers its message.
    #[serde(default = "default_dog_interaction_distance")]
    pub interaction_distance: f32,

    /// How long the speech bubble stays up.
    #[serde(default = "default_dog_message_seconds")]
    pub message_seconds: f32,

    /// Rest after delivering a message.
    #[serde(default = "default_dog_cooldown_seconds")]
    pub cooldown_seconds: f32,

    /// Rest after abandoning a target that became ineligible.
    #[serde(default = "default_dog_abandon_cooldown_seconds")]
    pub abandon_cooldown_seconds: f32,
}

impl Default for DogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            speed: default_dog_speed(),
            interaction_distance: default_dog_interaction_distance(),
            message_seconds: default_dog_message_seconds(),
            cooldown_seconds: default_dog_cooldown_seconds(),
            abandon_cooldown_seconds: default_dog_abandon_cooldown_seconds(),
        }
    }
}

/// API server settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Snapshots published per second.
    #[serde(default = "default_snapshot_hz")]
    pub snapshot_hz: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            snapshot_hz: default_snapshot_hz(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_seed() -> u64 {
    42
}

const fn default_arena_half_extent() -> f32 {
    20.0
}

const fn default_frame_rate() -> u32 {
    60
}

const fn default_reference_frame_rate() -> f32 {
    60.0
}

fn default_waypoint_names() -> Vec<String> {
    [
        "Old Well",
        "Barn",
        "Orchard",
        "Windmill",
        "Pond",
        "Haystack",
        "Campfire",
    ]
    .iter()
    .map(|s| (*s).to_owned())
    .collect()
}

const fn default_capture_radius() -> f32 {
    1.5
}

const fn default_min_separation() -> f32 {
    6.0
}

const fn default_arrival_slack() -> f32 {
    0.5
}

const fn default_capture_slack() -> f32 {
    1.0
}

fn default_roster() -> Vec<AgentProfile> {
    vec![
        AgentProfile {
            name: "Mabel".to_owned(),
            personality: "A stubborn retired schoolteacher who distrusts flattery and \
                          respects a well-reasoned argument."
                .to_owned(),
        },
        AgentProfile {
            name: "Otis".to_owned(),
            personality: "A sleepy farmhand who will go anywhere promising food or a nap."
                .to_owned(),
        },
        AgentProfile {
            name: "Priya".to_owned(),
            personality: "A restless botanist, curious about anything rare or unexplained."
                .to_owned(),
        },
        AgentProfile {
            name: "Bram".to_owned(),
            personality: "A suspicious blacksmith who assumes every request is a trick."
                .to_owned(),
        },
    ]
}

const fn default_agent_speed_min() -> f32 {
    0.03
}

const fn default_agent_speed_max() -> f32 {
    0.06
}

const fn default_dwell_min() -> f32 {
    3.0
}

const fn default_dwell_max() -> f32 {
    5.0
}

const fn default_convinced_duration() -> f32 {
    30.0
}

const fn default_snark_threshold() -> f32 {
    5.0
}

const fn default_read_time_base() -> f32 {
    2.0
}

const fn default_read_time_per_word() -> f32 {
    0.25
}

const fn default_failure_read_time() -> f32 {
    3.0
}

const fn default_too_far() -> f32 {
    1.5
}

const fn default_player_speed() -> f32 {
    0.1
}

const fn default_influence_radius() -> f32 {
    5.0
}

const fn default_dog_speed() -> f32 {
    0.08
}

const fn default_dog_interaction_distance() -> f32 {
    1.5
}

const fn default_dog_message_seconds() -> f32 {
    3.0
}

const fn default_dog_cooldown_seconds() -> f32 {
    15.0
}

const fn default_dog_abandon_cooldown_seconds() -> f32 {
    2.0
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    8080
}

const fn default_snapshot_hz() -> u32 {
    20
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_true() -> bool {
    true
}
