use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use tokio::task::{AbortHandle, JoinHandle};

pub const DEFAULT_SUCCESS_RESET: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitStatus {
    Idle,
    Submitting,
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Validation,
    Persistence,
}

#[derive(Debug)]
struct Inner {
    status: SubmitStatus,
    error: Option<ErrorKind>,
    // Bumped on every transition; a revert armed for an older value is stale.
    generation: u64,
}

/// Outcome of the latest submit attempt, with the success state reverting
/// to idle on its own after a fixed delay.
///
/// The revert runs as a tokio task owned by the reporter. Any later
/// transition cancels it, and so does dropping the reporter.
pub struct StatusReporter {
    inner: Arc<Mutex<Inner>>,
    success_reset: Duration,
    pending_reset: Option<JoinHandle<()>>,
}

impl StatusReporter {
    pub fn new(success_reset: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                status: SubmitStatus::Idle,
                error: None,
                generation: 0,
            })),
            success_reset,
            pending_reset: None,
        }
    }

    pub fn status(&self) -> SubmitStatus {
        self.lock().status
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.lock().error
    }

    /// Text for the aggregate banner under the form, if one is showing.
    pub fn banner(&self) -> Option<&'static str> {
        let inner = self.lock();
        match (inner.status, inner.error) {
            (SubmitStatus::Success, _) => {
                Some("Thank you for your submission. We'll contact you shortly.")
            }
            (SubmitStatus::Error, Some(ErrorKind::Validation)) => {
                Some("Please fix the highlighted errors")
            }
            (SubmitStatus::Error, _) => {
                Some("There was an error processing your submission. Please try again.")
            }
            _ => None,
        }
    }

    pub fn begin(&mut self) {
        self.transition(SubmitStatus::Submitting, None);
    }

    /// Must be called from within a tokio runtime.
    pub fn succeed(&mut self) {
        let generation = self.transition(SubmitStatus::Success, None);

        let inner = Arc::clone(&self.inner);
        let delay = self.success_reset;
        self.pending_reset = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut inner = inner.lock().unwrap_or_else(|e| e.into_inner());
            if inner.generation == generation {
                inner.status = SubmitStatus::Idle;
            }
        }));
    }

    /// The armed success revert, if any.
    pub fn pending_reset(&self) -> Option<AbortHandle> {
        self.pending_reset.as_ref().map(JoinHandle::abort_handle)
    }

    pub fn fail(&mut self, kind: ErrorKind) {
        self.transition(SubmitStatus::Error, Some(kind));
    }

    pub fn reset(&mut self) {
        self.transition(SubmitStatus::Idle, None);
    }

    fn transition(&mut self, status: SubmitStatus, error: Option<ErrorKind>) -> u64 {
        if let Some(handle) = self.pending_reset.take() {
            handle.abort();
        }
        let mut inner = self.lock();
        inner.status = status;
        inner.error = error;
        inner.generation += 1;
        inner.generation
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for StatusReporter {
    fn drop(&mut self) {
        if let Some(handle) = self.pending_reset.take() {
            handle.abort();
        }
    }
}
