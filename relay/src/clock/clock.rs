use std::time::{Duration, SystemTime};

#[derive(Clone)]
pub struct SystemClock {}

pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;

    fn duration_since(&self, time: SystemTime) -> Duration {
        return self.now().duration_since(time).unwrap_or(Duration::ZERO);
    }

    fn has_passed(&self, deadline: SystemTime) -> bool {
        return self.now() >= deadline;
    }
}

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        return SystemTime::now();
    }
}

impl SystemClock {
    pub fn new() -> SystemClock {
        return SystemClock {};
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        return SystemClock::new();
    }
}

#[cfg(test)]
mod tests {
    use std::ops::{Add, Sub};
    use std::time::{Duration, SystemTime};

    use crate::clock::clock::{Clock, SystemClock};

    #[test]
    fn duration_since_an_earlier_time() {
        let clock = SystemClock::new();
        let earlier = SystemTime::now().sub(Duration::from_secs(5));

        assert!(clock.duration_since(earlier) >= Duration::from_secs(5));
    }

    #[test]
    fn duration_since_a_future_time_is_zero() {
        let clock = SystemClock::new();
        let later = SystemTime::now().add(Duration::from_secs(60));

        assert_eq!(Duration::ZERO, clock.duration_since(later));
    }

    #[test]
    fn deadline_in_the_past_has_passed() {
        let clock = SystemClock::new();
        let deadline = SystemTime::now().sub(Duration::from_millis(1));

        assert!(clock.has_passed(deadline));
    }

    #[test]
    fn deadline_in_the_future_has_not_passed() {
        let clock = SystemClock::new();
        let deadline = SystemTime::now().add(Duration::from_secs(60));

        assert_eq!(false, clock.has_passed(deadline));
    }
}
