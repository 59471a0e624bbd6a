//! Quota-aware retry around a single AI service call
//!
//! Failures are classified by the markers in their text. Authentication
//! failures stop immediately, quota failures are retried with a backoff
//! until the budget runs out, everything else is passed through untouched.

use crate::config::RetryConfig;
use crate::{MediZenError, Result};
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use rand::Rng;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const AUTH_MARKERS: [&str; 3] = ["API_KEY_MISSING", "403", "key not valid"];
const QUOTA_MARKERS: [&str; 3] = ["429", "quota", "RESOURCE_EXHAUSTED"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Authentication,
    Quota,
    Other,
}

/// Classify a failed call.
///
/// Only errors coming from the AI service or configuration are inspected by
/// text; a full local disk mentions "quota" too but is never an AI quota.
pub fn classify(error: &MediZenError) -> FailureKind {
    match error {
        MediZenError::AuthenticationFailed => FailureKind::Authentication,
        MediZenError::QuotaExceeded => FailureKind::Quota,
        MediZenError::ApiError { .. } | MediZenError::ConfigError(_) => {
            let text = error.to_string();
            if AUTH_MARKERS.iter().any(|m| text.contains(m)) {
                FailureKind::Authentication
            } else if QUOTA_MARKERS.iter().any(|m| text.contains(m)) {
                FailureKind::Quota
            } else {
                FailureKind::Other
            }
        }
        _ => FailureKind::Other,
    }
}

/// Delay policy between quota retries
pub trait Backoff: Send + Sync {
    /// Wait before retry number `attempt` (starting at 1)
    fn wait(&self, attempt: u32) -> BoxFuture<'static, ()>;
}

/// `base * attempt` plus a random amount below `jitter`, on the tokio timer
#[derive(Debug, Clone)]
pub struct JitteredBackoff {
    base: Duration,
    jitter: Duration,
}

impl JitteredBackoff {
    pub fn new(base: Duration, jitter: Duration) -> Self {
        Self { base, jitter }
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        let extra = if jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..jitter_ms)
        };
        self.base * attempt + Duration::from_millis(extra)
    }
}

impl From<&RetryConfig> for JitteredBackoff {
    fn from(config: &RetryConfig) -> Self {
        Self::new(config.base_delay, config.jitter)
    }
}

impl Backoff for JitteredBackoff {
    fn wait(&self, attempt: u32) -> BoxFuture<'static, ()> {
        let delay = self.delay(attempt);
        debug!("Backing off {:?} before retry {}", delay, attempt);
        tokio::time::sleep(delay).boxed()
    }
}

/// Returns immediately and remembers the attempts it was asked to wait for
#[derive(Debug, Clone, Default)]
pub struct RecordingBackoff {
    attempts: Arc<Mutex<Vec<u32>>>,
}

impl RecordingBackoff {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> Vec<u32> {
        self.attempts.lock().clone()
    }
}

impl Backoff for RecordingBackoff {
    fn wait(&self, attempt: u32) -> BoxFuture<'static, ()> {
        self.attempts.lock().push(attempt);
        futures::future::ready(()).boxed()
    }
}

/// Run `call`, retrying quota failures up to `retries` more times
pub async fn with_retry<T, F, Fut>(mut call: F, retries: u32, backoff: &dyn Backoff) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut remaining = retries;
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        let error = match call().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        warn!("AI service call failed (attempt {}): {}", attempt, error);

        match classify(&error) {
            FailureKind::Authentication => return Err(MediZenError::AuthenticationFailed),
            FailureKind::Quota if remaining > 0 => {
                remaining -= 1;
                backoff.wait(attempt).await;
            }
            FailureKind::Quota => return Err(MediZenError::QuotaExceeded),
            FailureKind::Other => return Err(error),
        }
    }
}
