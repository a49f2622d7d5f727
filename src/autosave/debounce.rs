use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

/// A single replaceable deadline.
///
/// Scheduling replaces any deadline that has not fired yet, so a burst of
/// events collapses into one firing `delay` after the last of them. The
/// debouncer holds no task or closure: whoever fires it reads the state it
/// needs at fire time.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// (Re)arm the deadline at `now + delay`.
    pub fn schedule(&mut self) {
        self.deadline = Some(Instant::now() + self.delay);
    }

    /// Drop the pending deadline. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    /// Consume the deadline if it has passed at `now`.
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// A future that resolves when the current deadline passes.
    ///
    /// The future owns a copy of the deadline, so it can sit in a `select!`
    /// next to branches that reschedule. With nothing pending it never resolves.
    pub fn wait(&self) -> impl Future<Output = ()> + Send + 'static {
        let deadline = self.deadline;
        async move {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        }
    }
}
