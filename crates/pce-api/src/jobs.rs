// ── Async job polling ──
//
// Long-running collection fetches and traffic queries run as server-side
// jobs. The client submits, then polls the job href until it reports a
// terminal status.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, trace};

use crate::client::PceClient;
use crate::error::Error;
use crate::model::JobStatus;

/// Interval used when the server sends no `Retry-After`.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Upper bound for the backed-off poll interval.
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Tuning for the poll loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollOptions {
    /// First wait before polling. `None` uses the server's `Retry-After`.
    pub interval: Option<Duration>,
    /// Multiplier applied to the interval after every poll.
    pub backoff: f64,
    /// Give up with `Error::PollAttemptsExhausted` after this many polls.
    /// `None` polls until the job finishes.
    pub max_attempts: Option<u32>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: None,
            backoff: 1.5,
            max_attempts: None,
        }
    }
}

impl PollOptions {
    fn first_delay(&self, job: &AsyncJob) -> Duration {
        self.interval
            .or(job.retry_after)
            .unwrap_or(DEFAULT_POLL_INTERVAL)
    }

    fn next_delay(&self, delay: Duration) -> Duration {
        let factor = if self.backoff.is_finite() && self.backoff >= 1.0 {
            self.backoff
        } else {
            1.0
        };
        let next = delay.as_secs_f64() * factor;
        if next >= MAX_POLL_INTERVAL.as_secs_f64() {
            MAX_POLL_INTERVAL
        } else {
            Duration::from_secs_f64(next)
        }
    }
}

/// Lifecycle of an async job as seen by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Submitted,
    Polling,
    /// Finished; holds the href of the result document.
    Done(String),
    /// Failed or killed; holds the server's message.
    Failed(String),
}

/// Body of `GET {job href}`.
#[derive(Debug, Clone, Deserialize)]
pub struct JobReport {
    pub status: JobStatus,
    #[serde(default)]
    pub result: Option<Value>,
}

/// A submitted job and where it stands.
#[derive(Debug, Clone)]
pub struct AsyncJob {
    location: String,
    retry_after: Option<Duration>,
    state: JobState,
    polls: u32,
}

impl AsyncJob {
    pub fn new(location: impl Into<String>, retry_after: Option<Duration>) -> Self {
        Self {
            location: location.into(),
            retry_after,
            state: JobState::Submitted,
            polls: 0,
        }
    }

    /// Href of the job resource.
    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn retry_after(&self) -> Option<Duration> {
        self.retry_after
    }

    pub fn state(&self) -> &JobState {
        &self.state
    }

    /// Number of poll responses observed so far.
    pub fn polls(&self) -> u32 {
        self.polls
    }

    /// Apply one poll response.
    ///
    /// Returns the result href once the job is done, `None` while it is
    /// still running, and `Error::AsyncJobFailed` when it failed.
    pub fn observe(&mut self, report: &JobReport) -> Result<Option<String>, Error> {
        self.polls += 1;

        if report.status.is_failed() {
            let message = report
                .result
                .as_ref()
                .and_then(|r| r.get("message"))
                .and_then(Value::as_str)
                .map_or_else(|| format!("job {}", report.status), str::to_owned);
            self.state = JobState::Failed(message.clone());
            return Err(Error::AsyncJobFailed { message });
        }

        if !report.status.is_finished() {
            self.state = JobState::Polling;
            return Ok(None);
        }

        // `done` nests the href in an object; traffic queries return it bare.
        let href = match report.result.as_ref() {
            Some(Value::String(href)) => Some(href.clone()),
            Some(Value::Object(map)) => map.get("href").and_then(Value::as_str).map(str::to_owned),
            _ => None,
        };
        let Some(href) = href else {
            let message = format!("job {} reported no result href", report.status);
            self.state = JobState::Failed(message.clone());
            return Err(Error::AsyncJobFailed { message });
        };
        self.state = JobState::Done(href.clone());
        Ok(Some(href))
    }
}

impl PceClient {
    /// Poll `job` until it finishes and return the result href.
    pub async fn wait_for_job(
        &self,
        job: &mut AsyncJob,
        options: &PollOptions,
    ) -> Result<String, Error> {
        let mut delay = options.first_delay(job);
        loop {
            if let Some(max) = options.max_attempts {
                if job.polls() >= max {
                    return Err(Error::PollAttemptsExhausted {
                        attempts: job.polls(),
                    });
                }
            }

            trace!(job = job.location(), ?delay, "waiting before next job poll");
            tokio::time::sleep(delay).await;

            let report: JobReport = self.get_path(job.location(), &[]).await?;
            trace!(job = job.location(), status = %report.status, "job polled");
            if let Some(href) = job.observe(&report)? {
                debug!(job = job.location(), polls = job.polls(), "job finished: {href}");
                return Ok(href);
            }
            delay = options.next_delay(delay);
        }
    }
}
