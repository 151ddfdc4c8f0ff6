//! Prompt template loading and rendering via `minijinja`.
//!
//! Templates are loaded from the filesystem (default: `templates/`) so the
//! judge's persona and output rules can be tuned without recompiling.

use herding_types::{ChatTurn, JudgeRequest, Speaker, WaypointId};
use minijinja::Environment;
use serde::Serialize;

use crate::error::JudgeError;

/// System template filename.
pub const SYSTEM_TEMPLATE: &str = "judge_system.j2";
/// User template filename.
pub const USER_TEMPLATE: &str = "judge_user.j2";

/// Holds the two judge templates, pre-compiled.
pub struct PromptEngine {
    env: Environment<'static>,
}

/// The complete rendered prompt ready to send to an LLM backend.
#[derive(Debug, Clone)]
pub struct RenderedPrompt {
    /// Persona, rules, and the output format.
    pub system: String,
    /// The map, the conversation so far, and the latest line.
    pub user: String,
}

/// A waypoint as the templates see it.
#[derive(Debug, Serialize)]
struct WaypointContext<'a> {
    id: u32,
    name: &'a str,
    is_target: bool,
}

/// One conversation line with a display label instead of a speaker tag.
#[derive(Debug, Serialize)]
struct TurnContext<'a> {
    speaker: &'a str,
    text: &'a str,
}

/// Everything the templates can reference.
#[derive(Debug, Serialize)]
struct PromptContext<'a> {
    agent_name: &'a str,
    personality: &'a str,
    position_x: f32,
    position_z: f32,
    current_target: Option<WaypointContext<'a>>,
    target: Option<WaypointContext<'a>>,
    waypoints: Vec<WaypointContext<'a>>,
    history: Vec<TurnContext<'a>>,
    latest: Option<TurnContext<'a>>,
}

impl PromptEngine {
    /// Create a prompt engine loading templates from the given directory.
    ///
    /// The directory must contain `judge_system.j2` and `judge_user.j2`.
    pub fn new(templates_dir: &str) -> Result<Self, JudgeError> {
        let system = load_template(templates_dir, SYSTEM_TEMPLATE)?;
        let user = load_template(templates_dir, USER_TEMPLATE)?;
        Self::from_sources(system, user)
    }

    /// Create a prompt engine from template source text.
    pub fn from_sources(system: String, user: String) -> Result<Self, JudgeError> {
        let mut env = Environment::new();
        env.add_template_owned("system", system)
            .map_err(|e| JudgeError::Template(format!("failed to add system template: {e}")))?;
        env.add_template_owned("user", user)
            .map_err(|e| JudgeError::Template(format!("failed to add user template: {e}")))?;
        Ok(Self { env })
    }

    /// Render the prompt for one conversation turn.
    pub fn render(&self, request: &JudgeRequest) -> Result<RenderedPrompt, JudgeError> {
        let context = serde_json::to_value(build_context(request))?;

        let system = self
            .env
            .get_template("system")
            .map_err(|e| JudgeError::Template(format!("missing system template: {e}")))?
            .render(&context)
            .map_err(|e| JudgeError::Template(format!("system render failed: {e}")))?;

        let user = self
            .env
            .get_template("user")
            .map_err(|e| JudgeError::Template(format!("missing user template: {e}")))?
            .render(&context)
            .map_err(|e| JudgeError::Template(format!("user render failed: {e}")))?;

        Ok(RenderedPrompt { system, user })
    }
}

fn build_context(request: &JudgeRequest) -> PromptContext<'_> {
    PromptContext {
        agent_name: &request.agent_name,
        personality: &request.personality,
        position_x: request.position.x,
        position_z: request.position.z,
        current_target: request
            .current_target
            .and_then(|id| waypoint_context(request, id)),
        target: waypoint_context(request, request.target_waypoint_id),
        waypoints: request
            .waypoints
            .iter()
            .map(|w| WaypointContext {
                id: w.id.get(),
                name: &w.name,
                is_target: w.is_target,
            })
            .collect(),
        history: request
            .history
            .iter()
            .map(|t| turn_context(request, t))
            .collect(),
        latest: request.history.last().map(|t| turn_context(request, t)),
    }
}

fn waypoint_context(request: &JudgeRequest, id: WaypointId) -> Option<WaypointContext<'_>> {
    request
        .waypoints
        .iter()
        .find(|w| w.id == id)
        .map(|w| WaypointContext {
            id: w.id.get(),
            name: &w.name,
            is_target: w.is_target,
        })
}

fn turn_context<'a>(request: &'a JudgeRequest, turn: &'a ChatTurn) -> TurnContext<'a> {
    let speaker = match turn.speaker {
        Speaker::Player => "Player",
        Speaker::Agent => request.agent_name.as_str(),
        Speaker::Dog => "Herding dog",
    };
    TurnContext {
        speaker,
        text: &turn.text,
    }
}

/// Read a template file from disk.
fn load_template(dir: &str, filename: &str) -> Result<String, JudgeError> {
    let path = format!("{dir}/{filename}");
    std::fs::read_to_string(&path)
        .map_err(|e| JudgeError::Template(format!("failed to read {path}: {e}")))
}
