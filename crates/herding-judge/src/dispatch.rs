//! The judge dispatcher: requests in, events out.
//!
//! One task per request, bounded by a semaphore. Each task renders the
//! prompt, streams the reply, emits a [`JudgeUpdate::Partial`] every time
//! the readable part of the reply changes, and finishes with exactly one
//! [`JudgeUpdate::Completed`] or [`JudgeUpdate::Failed`]. Every call runs
//! under a deadline; a timeout is reported as a failure like any other.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::{Stream, StreamExt};
use herding_types::{AgentId, JudgeDecision, JudgeEvent, JudgeRequest, JudgeUpdate, PendingResponse};
use tokio::sync::Semaphore;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::JudgeConfig;
use crate::error::JudgeError;
use crate::llm::LlmBackend;
use crate::parse;
use crate::prompt::PromptEngine;

/// Turns judge requests into judge events.
#[derive(Clone)]
pub struct Dispatcher {
    backend: Arc<LlmBackend>,
    prompts: Arc<PromptEngine>,
    permits: Arc<Semaphore>,
    request_timeout: Duration,
}

impl Dispatcher {
    /// Create a dispatcher from a backend, compiled templates, and limits.
    pub fn new(backend: LlmBackend, prompts: PromptEngine, config: &JudgeConfig) -> Self {
        Self {
            backend: Arc::new(backend),
            prompts: Arc::new(prompts),
            permits: Arc::new(Semaphore::new(config.max_concurrent_calls.max(1))),
            request_timeout: config.request_timeout,
        }
    }

    /// Serve requests until the request channel closes.
    ///
    /// Waits for a free call slot before taking the next request, so a burst
    /// of messages queues in the channel rather than in spawned tasks.
    pub async fn run(
        self,
        mut requests: UnboundedReceiver<JudgeRequest>,
        events: UnboundedSender<JudgeEvent>,
    ) {
        info!(
            backend = self.backend.name(),
            max_concurrent = self.permits.available_permits(),
            timeout_ms = self.request_timeout.as_millis(),
            "Judge dispatcher started"
        );

        while let Some(request) = requests.recv().await {
            let Ok(permit) = Arc::clone(&self.permits).acquire_owned().await else {
                break;
            };
            let judge = self.clone();
            let events = events.clone();
            tokio::spawn(async move {
                let _permit = permit;
                judge.handle(&request, &events).await;
            });
        }

        info!("Judge request channel closed, dispatcher stopping");
    }

    /// Judge one request and report the outcome.
    async fn handle(&self, request: &JudgeRequest, events: &UnboundedSender<JudgeEvent>) {
        let agent_id = request.agent_id;
        let started = Instant::now();

        let update = match timeout(self.request_timeout, self.decide(request, events)).await {
            Ok(Ok(decision)) => {
                info!(
                    agent = %agent_id,
                    agent_name = %request.agent_name,
                    new_target = ?decision.new_target,
                    persuaded = decision.new_target == Some(request.target_waypoint_id),
                    latency_ms = started.elapsed().as_millis(),
                    "Judge decided"
                );
                JudgeUpdate::Completed { decision }
            }
            Ok(Err(e)) => {
                warn!(
                    agent = %agent_id,
                    backend = self.backend.name(),
                    error = %e,
                    "Judge call failed, agent will fall back"
                );
                JudgeUpdate::Failed {
                    reason: e.to_string(),
                }
            }
            Err(_) => {
                warn!(
                    agent = %agent_id,
                    timeout_ms = self.request_timeout.as_millis(),
                    "Judge call exceeded deadline, agent will fall back"
                );
                JudgeUpdate::Failed {
                    reason: JudgeError::Timeout.to_string(),
                }
            }
        };

        emit(events, agent_id, update);
    }

    async fn decide(
        &self,
        request: &JudgeRequest,
        events: &UnboundedSender<JudgeEvent>,
    ) -> Result<JudgeDecision, JudgeError> {
        let prompt = self.prompts.render(request)?;
        let stream = self.backend.stream(&prompt).await?;
        drive_stream(request.agent_id, stream, events).await
    }
}

/// Accumulate a reply stream, emitting a partial event whenever the
/// readable part changes, and parse the finished reply.
///
/// Does not emit the final event; the caller reports the returned decision
/// or error.
pub async fn drive_stream<S>(
    agent_id: AgentId,
    mut stream: S,
    events: &UnboundedSender<JudgeEvent>,
) -> Result<JudgeDecision, JudgeError>
where
    S: Stream<Item = Result<String, JudgeError>> + Unpin,
{
    let mut buffer = String::new();
    let mut last = PendingResponse::Empty;

    while let Some(delta) = stream.next().await {
        buffer.push_str(&delta?);

        let pending = parse::parse_partial(&buffer);
        if pending != last && pending != PendingResponse::Empty {
            last = pending.clone();
            emit(events, agent_id, JudgeUpdate::Partial { response: pending });
        }
    }

    parse::parse_final(&buffer).inspect_err(|e| {
        warn!(
            agent = %agent_id,
            error = %e,
            raw_response = %buffer,
            "Failed to parse judge reply"
        );
    })
}

fn emit(events: &UnboundedSender<JudgeEvent>, agent_id: AgentId, update: JudgeUpdate) {
    if events.send(JudgeEvent { agent_id, update }).is_err() {
        debug!(agent = %agent_id, "Simulation is gone, dropping judge event");
    }
}
