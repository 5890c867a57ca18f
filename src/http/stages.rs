//! Request/response stages run by the dispatcher.
//!
//! Stages run in registration order before route lookup. A stage either lets
//! the request continue or answers it directly, in which case later stages and
//! the backend call are skipped.

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;

/// Result of a stage's request hook.
pub enum StageOutcome {
    /// Hand the (possibly modified) request to the next stage.
    Continue,
    /// Answer with this response; nothing after this stage runs.
    Respond(Response),
}

/// A request/response transform invoked by the dispatcher.
pub trait Stage: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    fn on_request(&self, request: &mut Request<Body>) -> StageOutcome;

    /// Called in reverse order for every stage that returned `Continue`.
    fn on_response(&self, _response: &mut Response) {}
}

/// Ordered stage list.
#[derive(Default)]
pub struct Stages {
    stages: Vec<Box<dyn Stage>>,
}

impl Stages {
    pub fn push(&mut self, stage: Box<dyn Stage>) {
        self.stages.push(stage);
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run request hooks in order.
    ///
    /// Returns how many stages continued, and the short-circuit response if
    /// one stage produced it.
    pub fn run_request(&self, request: &mut Request<Body>) -> (usize, Option<Response>) {
        for (index, stage) in self.stages.iter().enumerate() {
            if let StageOutcome::Respond(response) = stage.on_request(request) {
                tracing::debug!(stage = stage.name(), status = %response.status(), "Stage answered request");
                return (index, Some(response));
            }
        }
        (self.stages.len(), None)
    }

    /// Run response hooks of the first `continued` stages, last first.
    pub fn run_response(&self, continued: usize, response: &mut Response) {
        for stage in self.stages[..continued].iter().rev() {
            stage.on_response(response);
        }
    }
}
