//! Trailing-edge debounce timer driven by the frame loop

use std::time::{Duration, Instant};

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

    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    /// Restart the timer
    pub fn touch(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Time left before firing, for scheduling a repaint
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(now))
    }

    /// `true` exactly once after `delay` has passed since the last touch
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Fire immediately if pending
    pub fn flush(&mut self) -> bool {
        self.deadline.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once_after_last_touch() {
        let start = Instant::now();
        let mut d = Debouncer::new(Duration::from_millis(500));
        assert!(!d.fire(start));

        d.touch(start);
        d.touch(start + Duration::from_millis(400));
        assert!(!d.fire(start + Duration::from_millis(600)));
        assert_eq!(
            d.remaining(start + Duration::from_millis(600)),
            Some(Duration::from_millis(300))
        );
        assert!(d.fire(start + Duration::from_millis(900)));
        assert!(!d.fire(start + Duration::from_millis(1000)));
        assert!(!d.is_pending());
    }

    #[test]
    fn test_flush() {
        let mut d = Debouncer::new(Duration::from_secs(10));
        assert!(!d.flush());
        d.touch(Instant::now());
        assert!(d.flush());
        assert!(!d.is_pending());
    }
}
