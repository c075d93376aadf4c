use std::time::{Duration, Instant};

/// Gate for noisy log lines: lets one through per `interval` and counts what it swallowed in between.
#[derive(Debug, Clone)]
pub(crate) struct RateLimited {
    interval: Duration,
    last: Option<Instant>,
    suppressed: u64,
}
impl RateLimited {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
            suppressed: 0,
        }
    }
    /// Register an occurrence. `Some(n)` if it should be logged now, `n` being how many were dropped since the last one.
    pub(crate) fn tick(&mut self, now: Instant) -> Option<u64> {
        match self.last {
            Some(last) if now.saturating_duration_since(last) < self.interval => {
                self.suppressed += 1;
                None
            }
            _ => {
                self.last = Some(now);
                Some(std::mem::take(&mut self.suppressed))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_counts_suppressed() {
        let start = Instant::now();
        let mut limit = RateLimited::new(Duration::from_secs(1));
        assert_eq!(limit.tick(start), Some(0));
        assert_eq!(limit.tick(start + Duration::from_millis(10)), None);
        assert_eq!(limit.tick(start + Duration::from_millis(20)), None);
        assert_eq!(limit.tick(start + Duration::from_secs(2)), Some(2));
        assert_eq!(limit.tick(start + Duration::from_millis(2500)), None);
    }
}
