use chrono::{DateTime, Duration, Utc};

/// Fires at most once per interval. Stopped schedules never fire.
#[derive(Debug, Clone)]
pub struct AutoSaveSchedule {
    interval: Duration,
    next_due: Option<DateTime<Utc>>,
}

impl AutoSaveSchedule {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.next_due
    }

    /// A start whose first slot would fall past the end of time leaves the
    /// schedule stopped.
    pub fn start(&mut self, now: DateTime<Utc>) {
        self.next_due = now.checked_add_signed(self.interval);
    }

    pub fn stop(&mut self) {
        self.next_due = None;
    }

    /// True when the interval has elapsed; the next slot is counted from `now`.
    pub fn due(&mut self, now: DateTime<Utc>) -> bool {
        match self.next_due {
            Some(at) if now >= at => {
                self.next_due = now.checked_add_signed(self.interval);
                true
            }
            _ => false,
        }
    }
}
