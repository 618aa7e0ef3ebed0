//! Wall-clock deadline enforcement and progress/ETA tracking.
//!
//! Both triggers are monotonic within a run: once the deadline has passed it
//! stays passed, and the progress counter only grows. ETA is advisory; it
//! never gates termination.

use chrono::{DateTime, Local};
use std::time::{Duration, Instant};

pub struct ProgressMeter {
    start: Instant,
    started_at: DateTime<Local>,
    deadline: Duration,
    last_noticed: Instant,
    notice_interval: Duration,
    max_trials: usize,
    completed: usize,
    milestone: usize,
}

impl ProgressMeter {
    /// `divisions` controls the trial-count notification cadence: a notice
    /// fires every `max_trials / divisions` completed units.
    pub fn new(
        deadline: Duration,
        notice_interval: Duration,
        max_trials: usize,
        divisions: usize,
    ) -> Self {
        let start = Instant::now();
        Self {
            start,
            started_at: Local::now(),
            deadline,
            last_noticed: start,
            notice_interval,
            max_trials,
            completed: 0,
            milestone: (max_trials / divisions.max(1)).max(1),
        }
    }

    pub fn expired(&self) -> bool {
        self.start.elapsed() >= self.deadline
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Projected total run time from current throughput. Before any progress
    /// this degenerates to the deadline, which also keeps the projection free
    /// of division by zero when the component under test never completes a
    /// unit of work.
    pub fn estimated_total(&self) -> Duration {
        if self.completed == 0 {
            return self.deadline;
        }
        let avg = self.elapsed().as_secs_f64() / self.completed as f64;
        Duration::from_secs_f64(avg * self.max_trials as f64)
    }

    /// Record `amount` completed units and report whether a progress
    /// notification is due. Firing resets the notification clock.
    pub fn carried_out(&mut self, amount: usize) -> bool {
        let before = self.completed;
        self.completed += amount;

        let due = self.last_noticed.elapsed() >= self.notice_interval
            || self.completed >= self.max_trials
            || (before != 0 && self.completed / self.milestone != before / self.milestone);

        if due {
            self.last_noticed = Instant::now();
        }
        due
    }

    /// Human-readable ETA: the projected end as wall-clock time, plus the
    /// remaining duration. Formatting granularity widens with distance.
    pub fn eta(&self) -> String {
        let estimated_end = self.started_at
            + chrono::Duration::from_std(self.estimated_total())
                .unwrap_or_else(|_| chrono::Duration::zero());
        let now = Local::now();
        let remaining = (estimated_end - now).to_std().unwrap_or(Duration::ZERO);

        let clock = if estimated_end.date_naive() != now.date_naive() {
            estimated_end.format("%m-%d %H:%M")
        } else if remaining >= Duration::from_secs(3600) {
            estimated_end.format("%H:%M")
        } else {
            estimated_end.format("%H:%M:%S")
        };

        let total = remaining.as_secs();
        let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
        let left = if h > 0 {
            format!("{h}h{m:02}m")
        } else if m > 0 {
            format!("{m}m{s:02}s")
        } else {
            format!("{s}s")
        };
        format!("{clock} ({left})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meter(max_trials: usize, divisions: usize) -> ProgressMeter {
        // Long deadline and notice interval so only milestones can fire.
        ProgressMeter::new(
            Duration::from_secs(3600),
            Duration::from_secs(3600),
            max_trials,
            divisions,
        )
    }

    #[test]
    fn test_zero_deadline_expires_immediately() {
        let m = ProgressMeter::new(Duration::ZERO, Duration::from_secs(60), 100, 10);
        assert!(m.expired());
    }

    #[test]
    fn test_long_deadline_not_expired() {
        let m = meter(100, 10);
        assert!(!m.expired());
    }

    #[test]
    fn test_eta_degenerates_to_deadline_before_progress() {
        let m = ProgressMeter::new(Duration::from_secs(120), Duration::from_secs(60), 100, 10);
        assert_eq!(m.estimated_total(), Duration::from_secs(120));
        // No panic or division by zero.
        let _ = m.eta();
    }

    #[test]
    fn test_milestone_notifications() {
        let mut m = meter(100, 10);
        let mut fired = Vec::new();
        for _ in 0..100 {
            if m.carried_out(1) {
                fired.push(m.completed());
            }
        }
        // Milestone is 10; every crossing fires.
        assert_eq!(fired, vec![10, 20, 30, 40, 50, 60, 70, 80, 90, 100]);
    }

    #[test]
    fn test_reaching_max_trials_always_fires() {
        let mut m = meter(3, 1);
        assert!(!m.carried_out(1));
        assert!(!m.carried_out(1));
        assert!(m.carried_out(1));
        assert_eq!(m.completed(), 3);
    }

    #[test]
    fn test_elapsed_interval_fires_and_resets() {
        let mut m = ProgressMeter::new(
            Duration::from_secs(3600),
            Duration::ZERO, // every check is past the interval
            1000,
            10,
        );
        assert!(m.carried_out(1));
        assert!(m.carried_out(1));
    }

    #[test]
    fn test_estimated_total_tracks_progress() {
        let mut m = meter(10, 10);
        std::thread::sleep(Duration::from_millis(20));
        m.carried_out(5);
        // Half the trials done: the projection is about twice the elapsed time.
        let projected = m.estimated_total();
        assert!(projected >= m.elapsed());
        assert!(projected <= m.elapsed() * 3);
    }
}
