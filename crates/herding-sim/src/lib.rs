//! Agent behavior state machine and per-frame simulation for the Herding game.
//!
//! Wandering agents roam between waypoints, avoiding the one target
//! waypoint, until the player talks them into going there. A herding dog
//! nudges them too. This crate owns all of that state and advances it one
//! frame at a time.
//!
//! The core is pure and synchronous. The only concurrency is the judge
//! boundary: the round sends [`herding_types::JudgeRequest`]s on a channel
//! and drains [`herding_types::JudgeEvent`]s at the start of each tick.
//!
//! # Modules
//!
//! - [`geometry`] -- Ground-plane distance, direction, clamping
//! - [`waypoint`] -- Waypoint registry and the wandering selection policy
//! - [`agent`] -- The agent record
//! - [`movement`] -- Per-frame straight-line steps
//! - [`dwell`] -- Arrival and dwelling
//! - [`convinced`] -- The stay at the target and eviction
//! - [`conversation`] -- Dialogue lifecycle and judge event merging
//! - [`dog`] -- The herding dog
//! - [`player`] -- The player avatar
//! - [`win`] -- Win-condition evaluation
//! - [`round`] -- The simulation context, setup, restart, intents, snapshots
//! - [`tick`] -- The per-frame tick
//! - [`lines`] -- Flavor text
//! - [`config`] -- YAML configuration
//! - [`error`] -- Error types

pub mod agent;
pub mod config;
pub mod conversation;
pub mod convinced;
pub mod dog;
pub mod dwell;
pub mod error;
pub mod geometry;
pub mod lines;
pub mod movement;
pub mod player;
pub mod round;
pub mod tick;
pub mod waypoint;
pub mod win;

pub use agent::Agent;
pub use config::{ConfigError, SimulationConfig};
pub use dog::HerdingDog;
pub use error::{ConversationError, IntentError, SimError};
pub use round::{JudgeEndpoint, JudgeLink, Round};
pub use tick::{TickSummary, tick};
pub use waypoint::WaypointRegistry;
