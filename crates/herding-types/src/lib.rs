//! Shared type definitions for the Herding simulation.
//!
//! This crate is the single source of truth for types that cross crate or
//! process boundaries: the simulation core, the persuasion judge, the API
//! server, and the browser renderer (via `ts-rs` TypeScript bindings).
//!
//! # Modules
//!
//! - [`ids`] -- Agent and waypoint identifiers
//! - [`structs`] -- Positions, waypoints, chat turns, movement flags
//! - [`judge`] -- Persuasion judge request/response and stream events
//! - [`intent`] -- Player intents from the presentation layer
//! - [`snapshot`] -- Read-only round snapshots for the presentation layer

pub mod ids;
pub mod intent;
pub mod judge;
pub mod snapshot;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use ids::{AgentId, WaypointId};
pub use intent::PlayerIntent;
pub use judge::{
    JudgeDecision, JudgeEvent, JudgeRequest, JudgeUpdate, PendingResponse, WaypointBrief,
};
pub use snapshot::{AgentView, DogView, PlayerView, RoundSnapshot, TooFarIndicator, WinRecord};
pub use structs::{ChatTurn, MovementFlags, Position, Speaker, Waypoint};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation for the renderer.

    #[test]
    fn export_bindings() {
        // ts-rs writes the `.ts` files to `bindings/` relative to the
        // crate root when `export_all` runs.
        use ts_rs::TS;

        let _ = crate::ids::AgentId::export_all();
        let _ = crate::ids::WaypointId::export_all();

        let _ = crate::structs::Position::export_all();
        let _ = crate::structs::Waypoint::export_all();
        let _ = crate::structs::Speaker::export_all();
        let _ = crate::structs::ChatTurn::export_all();
        let _ = crate::structs::MovementFlags::export_all();

        let _ = crate::judge::WaypointBrief::export_all();
        let _ = crate::judge::JudgeRequest::export_all();
        let _ = crate::judge::JudgeDecision::export_all();
        let _ = crate::judge::PendingResponse::export_all();

        let _ = crate::intent::PlayerIntent::export_all();

        let _ = crate::snapshot::WinRecord::export_all();
        let _ = crate::snapshot::AgentView::export_all();
        let _ = crate::snapshot::DogView::export_all();
        let _ = crate::snapshot::PlayerView::export_all();
        let _ = crate::snapshot::TooFarIndicator::export_all();
        let _ = crate::snapshot::RoundSnapshot::export_all();
    }
}
