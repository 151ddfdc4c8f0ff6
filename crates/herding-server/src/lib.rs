//! Presentation API server for the Herding simulation.
//!
//! The renderer in the browser is a thin client. It draws whatever the
//! latest [`RoundSnapshot`] says and turns keyboard and mouse input into
//! [`PlayerIntent`]s. This crate is the boundary between the two:
//!
//! - **`WebSocket` endpoint** (`/ws/frames`) streams snapshots via
//!   [`tokio::sync::broadcast`] and accepts intents as text frames
//! - **REST endpoints** for the current round, agents, and waypoints
//! - **Intent endpoint** (`POST /api/intents`) for clients without a socket
//! - **Minimal HTML status page** (`GET /`)
//!
//! # Architecture
//!
//! The frame loop owns the round. It publishes a snapshot into
//! [`AppState`] at a fixed rate and drains the intent queue before each
//! tick. Handlers only ever read the published snapshot or push onto the
//! queue, so no request can block a frame.
//!
//! [`RoundSnapshot`]: herding_types::RoundSnapshot
//! [`PlayerIntent`]: herding_types::PlayerIntent

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::AppState;
