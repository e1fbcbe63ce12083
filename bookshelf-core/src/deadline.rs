//! Caller-supplied deadlines for storage operations
//!
//! A [`Deadline`] bounds how long an operation may wait for a pooled
//! connection and for the backend to answer. When it elapses the in-flight
//! future is dropped, which cancels the query, and the operation fails with
//! [`StoreError::Timeout`].

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::{StoreError, StoreResult};

/// Point in time after which an operation gives up
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    /// No deadline: wait as long as the backend takes
    pub fn none() -> Self {
        Self(None)
    }

    pub fn at(instant: Instant) -> Self {
        Self(Some(instant))
    }

    /// Deadline `timeout` from now; unbounded if that instant is unrepresentable
    pub fn after(timeout: Duration) -> Self {
        Self(Instant::now().checked_add(timeout))
    }

    pub fn instant(&self) -> Option<Instant> {
        self.0
    }

    /// Time left before the deadline, `None` when unbounded
    pub fn remaining(&self) -> Option<Duration> {
        self.0
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        self.remaining() == Some(Duration::ZERO)
    }

    /// Run `fut`, failing with [`StoreError::Timeout`] if the deadline passes first.
    ///
    /// An already expired deadline fails without polling `fut` at all.
    pub async fn run<T, F>(self, operation: &'static str, fut: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        if self.is_expired() {
            return Err(StoreError::Timeout { operation });
        }

        match self.0 {
            None => fut.await,
            Some(at) => match tokio::time::timeout_at(at, fut).await {
                Ok(result) => result,
                Err(_) => Err(StoreError::Timeout { operation }),
            },
        }
    }
}

impl From<Duration> for Deadline {
    fn from(timeout: Duration) -> Self {
        Self::after(timeout)
    }
}
