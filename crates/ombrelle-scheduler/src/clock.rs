use chrono::{Local, NaiveDate, NaiveTime, Timelike};

/// Minute-granularity clock consulted once per tick.
///
/// A trait so tests can drive [`SchedulerEngine::tick`](crate::SchedulerEngine::tick)
/// at a fixed instant instead of waiting on wall-clock time.
pub trait Clock: Send + Sync {
    /// Current date and time-of-day with seconds truncated to zero.
    fn now_minute(&self) -> (NaiveDate, NaiveTime);
}

/// Process-local system clock.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_minute(&self) -> (NaiveDate, NaiveTime) {
        let now = Local::now().naive_local();
        let minute = NaiveTime::from_hms_opt(now.hour(), now.minute(), 0).unwrap_or(NaiveTime::MIN);
        (now.date(), minute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_truncates_seconds() {
        let (_, time) = SystemClock.now_minute();
        assert_eq!(time.second(), 0);
    }
}
