//! Per-operation request lifecycle: Idle -> Pending -> Succeeded | Failed.
//!
//! Every user-triggered action owns one [`Operation`] record. Transitions go
//! through the methods here and nowhere else, and every transition out of
//! Pending restores the view's interactive state, so a trigger can never be
//! left disabled after a failed attempt.

use std::future::Future;

use thiserror::Error;
use tracing::{debug, warn};

use crate::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    Idle,
    Pending,
    Succeeded,
    Failed,
}

#[derive(Debug, Error)]
#[error("operation '{name}' already has a request in flight")]
pub struct AlreadyPending {
    pub name: &'static str,
}

/// Rendering capability injected into an operation.
///
/// The core never looks up a rendering surface itself; front ends implement
/// this for their output region (a terminal, an egui panel, a channel to the
/// UI thread). Operations run on worker tasks, so views cross a thread
/// boundary and are taken as `dyn OperationView<R> + Send`.
pub trait OperationView<R> {
    /// Entering busy disables the trigger, shows progress, and replaces any
    /// prior output with a processing placeholder; leaving busy restores the
    /// trigger's default label.
    fn set_busy(&mut self, busy: bool);
    fn render_result(&mut self, result: &R);
    /// Structurally valid but empty outcome; never styled as an error.
    fn render_empty(&mut self, message: &str);
    fn render_error(&mut self, message: &str);
}

#[derive(Debug)]
pub struct Operation {
    name: &'static str,
    state: OperationState,
    last_error: Option<String>,
}

impl Operation {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: OperationState::Idle,
            last_error: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn state(&self) -> OperationState {
        self.state
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_pending(&self) -> bool {
        self.state == OperationState::Pending
    }

    /// Rejects re-entry while a request is in flight; otherwise enters
    /// Pending from any settled state and clears the previous error.
    pub fn begin<R>(
        &mut self,
        view: &mut (dyn OperationView<R> + Send),
    ) -> Result<(), AlreadyPending> {
        if self.is_pending() {
            return Err(AlreadyPending { name: self.name });
        }
        self.state = OperationState::Pending;
        self.last_error = None;
        view.set_busy(true);
        Ok(())
    }

    pub fn complete<R>(&mut self, view: &mut (dyn OperationView<R> + Send), result: &R) {
        self.state = OperationState::Succeeded;
        view.render_result(result);
        view.set_busy(false);
    }

    pub fn complete_empty<R>(&mut self, view: &mut (dyn OperationView<R> + Send), message: &str) {
        self.state = OperationState::Succeeded;
        view.render_empty(message);
        view.set_busy(false);
    }

    pub fn fail<R>(
        &mut self,
        view: &mut (dyn OperationView<R> + Send),
        message: impl Into<String>,
    ) {
        let message = message.into();
        self.state = OperationState::Failed;
        view.render_error(&message);
        self.last_error = Some(message);
        view.set_busy(false);
    }
}

/// What a network exchange produced once the transport succeeded.
pub enum Outcome<R> {
    Data(R),
    /// Valid-but-empty result with the message to show in place of data.
    Empty { message: &'static str },
}

/// Runs one network exchange under the lifecycle contract: after a
/// successful `begin`, exactly one of `complete`, `complete_empty`, or
/// `fail` runs no matter which branch the exchange took.
///
/// Transport detail is logged; the view gets `failure_message` so every
/// failure of one operation reads the same to the user.
pub async fn drive<R, Fut>(
    op: &mut Operation,
    view: &mut (dyn OperationView<R> + Send),
    failure_message: &str,
    work: Fut,
) -> Result<Option<R>, AlreadyPending>
where
    Fut: Future<Output = Result<Outcome<R>, ClientError>>,
{
    op.begin(view)?;
    match work.await {
        Ok(Outcome::Data(result)) => {
            debug!(operation = op.name, "operation succeeded");
            op.complete(view, &result);
            Ok(Some(result))
        }
        Ok(Outcome::Empty { message }) => {
            debug!(operation = op.name, "operation succeeded with no data");
            op.complete_empty(view, message);
            Ok(None)
        }
        Err(err) => {
            warn!(operation = op.name, error = %err, "operation failed");
            op.fail(view, failure_message);
            Ok(None)
        }
    }
}
