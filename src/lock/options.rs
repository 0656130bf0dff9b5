use rand::Rng;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Delay between polls that did not grant the lock.
#[derive(Debug, Clone, Default)]
pub enum PollStrategy {
    /// Poll again immediately, only yielding to the runtime.
    #[default]
    Busy,
    /// Sleep `base` plus a random amount up to `max_jitter`.
    Jittered { base: Duration, max_jitter: Duration },
}

impl PollStrategy {
    pub fn jittered(base: Duration, max_jitter: Duration) -> Self {
        PollStrategy::Jittered { base, max_jitter }
    }

    pub(crate) fn next_delay(&self) -> Option<Duration> {
        match self {
            PollStrategy::Busy => None,
            PollStrategy::Jittered { base, max_jitter } => {
                let jitter_ms = max_jitter.as_millis() as u64;
                let jitter = if jitter_ms == 0 {
                    Duration::ZERO
                } else {
                    Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
                };
                Some(*base + jitter)
            }
        }
    }
}

/// Bounds on a single `acquire` call. The default waits forever and polls
/// without pausing.
#[derive(Debug, Clone, Default)]
pub struct AcquireOptions {
    pub max_wait: Option<Duration>,
    pub poll: PollStrategy,
    pub cancel: Option<CancellationToken>,
}

impl AcquireOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    pub fn with_poll(mut self, poll: PollStrategy) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_never_delays() {
        assert_eq!(PollStrategy::Busy.next_delay(), None);
    }

    #[test]
    fn test_jitter_stays_in_range() {
        let poll = PollStrategy::jittered(Duration::from_millis(10), Duration::from_millis(50));
        for _ in 0..100 {
            let delay = poll.next_delay().unwrap();
            assert!(delay >= Duration::from_millis(10));
            assert!(delay <= Duration::from_millis(60));
        }
    }
}
