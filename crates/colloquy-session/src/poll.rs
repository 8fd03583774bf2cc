use colloquy_llm::Result;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Shortest wait between two attempts
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Bounded poll loop settings: exponential backoff capped by `max_interval`,
/// with an overall deadline.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub multiplier: f64,
    pub timeout: Duration,
}

impl PollPolicy {
    pub fn new(timeout: Duration) -> Self {
        Self {
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(5),
            multiplier: 2.0,
            timeout,
        }
    }

    /// Default policy for waiting on runs
    pub fn for_runs() -> Self {
        Self::new(Duration::from_secs(60))
    }

    /// Default policy for waiting on file processing
    pub fn for_files() -> Self {
        Self::new(Duration::from_secs(120))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_intervals(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_interval = initial;
        self.max_interval = max.max(initial);
        self
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier.max(1.0);
        self
    }

    /// Interval to wait after `current`. Fields set directly are clamped
    /// here too: a multiplier below 1 (or NaN) holds the interval steady and
    /// no wait is shorter than `MIN_INTERVAL`.
    pub fn next_interval(&self, current: Duration) -> Duration {
        let multiplier = if self.multiplier >= 1.0 { self.multiplier } else { 1.0 };
        Duration::try_from_secs_f64(current.as_secs_f64() * multiplier)
            .unwrap_or(self.max_interval)
            .min(self.max_interval)
            .max(MIN_INTERVAL)
    }

    fn first_interval(&self) -> Duration {
        self.initial_interval.max(MIN_INTERVAL)
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::for_runs()
    }
}

/// Result of one attempt inside a poll loop
#[derive(Debug)]
pub enum Attempt<T> {
    Done(T),
    Pending,
}

/// Run `check` repeatedly until it reports `Done`, an error occurs, or the policy's
/// deadline passes. Returns `Ok(None)` on timeout.
///
/// The check always runs at least once; the final sleep is shortened so the
/// last attempt lands on the deadline.
pub async fn poll_until<T, F, Fut>(policy: &PollPolicy, mut check: F) -> Result<Option<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Attempt<T>>>,
{
    let started = Instant::now();
    let mut interval = policy.first_interval();
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        if let Attempt::Done(value) = check().await? {
            return Ok(Some(value));
        }

        let elapsed = started.elapsed();
        if elapsed >= policy.timeout {
            tracing::debug!(attempt, ?elapsed, "poll deadline reached");
            return Ok(None);
        }

        let wait = interval.min(policy.timeout - elapsed);
        tracing::debug!(attempt, ?wait, "not ready, backing off");
        sleep(wait).await;
        interval = policy.next_interval(interval);
    }
}
