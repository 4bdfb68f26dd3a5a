//! Settle timer for raw scroll activity
//!
//! Every poke pushes the deadline out again; the timer fires once activity
//! has been quiet for the whole delay. Time is always passed in, so callers
//! pick the clock (`tokio::time::Instant` pauses under test).

use std::time::Duration;

use tokio::time::Instant;

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

    /// Record activity at `now`, restarting the quiet period
    pub fn poke(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Consume the pending deadline if it has passed
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_fires_after_quiet_period() {
        let t0 = Instant::now();
        let mut debounce = Debouncer::new(ms(250));
        assert!(!debounce.fire_if_due(t0));

        debounce.poke(t0);
        assert!(!debounce.fire_if_due(t0 + ms(249)));
        assert!(debounce.fire_if_due(t0 + ms(250)));
        // fires once
        assert!(!debounce.fire_if_due(t0 + ms(500)));
    }

    #[test]
    fn test_poke_extends_deadline() {
        let t0 = Instant::now();
        let mut debounce = Debouncer::new(ms(250));
        debounce.poke(t0);
        debounce.poke(t0 + ms(200));
        assert_eq!(debounce.deadline(), Some(t0 + ms(450)));
        assert!(!debounce.fire_if_due(t0 + ms(300)));
        assert!(debounce.fire_if_due(t0 + ms(450)));
    }
}
