//! View rotation and refresh timing
//!
//! Polled from the application loop with the current clock reading. The
//! schedule never sleeps itself; [`RefreshSchedule::until_next`] tells the
//! caller how long it may.

use crate::config::TimingConfig;

/// What the application loop should do now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScheduleAction {
    /// Nothing due
    Wait,
    /// Put this view on screen
    ShowView(usize),
    /// Download every view again
    Refresh,
}

/// Timers for flipping between views and refreshing them
#[derive(Debug, Clone)]
pub struct RefreshSchedule {
    views: usize,
    current: usize,
    flip_ms: u64,
    refresh_ms: u64,
    backoff_ms: u64,
    next_flip: u64,
    next_refresh: u64,
}

impl RefreshSchedule {
    /// Schedule for `views` views; the first refresh is due immediately
    pub fn new(timing: &TimingConfig, views: usize, now_ms: u64) -> Self {
        Self {
            views,
            current: 0,
            flip_ms: timing.flip_ms(),
            refresh_ms: timing.refresh_ms(),
            backoff_ms: timing.retry_backoff_ms(),
            next_flip: now_ms + timing.flip_ms(),
            next_refresh: now_ms,
        }
    }

    /// View currently meant to be on screen
    pub fn current_view(&self) -> usize {
        self.current
    }

    /// Decide the next action
    ///
    /// A due refresh wins over a due flip.
    pub fn poll(&mut self, now_ms: u64) -> ScheduleAction {
        if now_ms >= self.next_refresh {
            return ScheduleAction::Refresh;
        }
        if self.views > 1 && now_ms >= self.next_flip {
            self.current = (self.current + 1) % self.views;
            self.next_flip = now_ms + self.flip_ms;
            return ScheduleAction::ShowView(self.current);
        }
        ScheduleAction::Wait
    }

    /// Record the end of a refresh
    ///
    /// Restarts both timers with the first view on screen. A failed refresh
    /// is retried after the backoff instead of the full period.
    pub fn refresh_finished(&mut self, now_ms: u64, succeeded: bool) {
        let wait = if succeeded {
            self.refresh_ms
        } else {
            self.backoff_ms
        };
        self.next_refresh = now_ms + wait;
        self.next_flip = now_ms + self.flip_ms;
        self.current = 0;
    }

    /// Milliseconds until something is due
    pub fn until_next(&self, now_ms: u64) -> u64 {
        let next = if self.views > 1 {
            self.next_refresh.min(self.next_flip)
        } else {
            self.next_refresh
        };
        next.saturating_sub(now_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing() -> TimingConfig {
        TimingConfig {
            refresh_s: 600,
            flip_s: 10,
            retry_backoff_s: 30,
            download_deadline_s: 90,
        }
    }

    #[test]
    fn test_refresh_due_at_boot() {
        let mut schedule = RefreshSchedule::new(&timing(), 2, 1_000);
        assert_eq!(schedule.poll(1_000), ScheduleAction::Refresh);
        // Still due until reported finished
        assert_eq!(schedule.poll(5_000), ScheduleAction::Refresh);
    }

    #[test]
    fn test_flips_between_views() {
        let mut schedule = RefreshSchedule::new(&timing(), 2, 0);
        schedule.refresh_finished(0, true);

        assert_eq!(schedule.poll(9_999), ScheduleAction::Wait);
        assert_eq!(schedule.poll(10_000), ScheduleAction::ShowView(1));
        assert_eq!(schedule.poll(15_000), ScheduleAction::Wait);
        assert_eq!(schedule.poll(20_000), ScheduleAction::ShowView(0));
        assert_eq!(schedule.current_view(), 0);
    }

    #[test]
    fn test_refresh_period_and_reset() {
        let mut schedule = RefreshSchedule::new(&timing(), 2, 0);
        schedule.refresh_finished(0, true);
        schedule.poll(10_000);
        assert_eq!(schedule.current_view(), 1);

        assert_eq!(schedule.poll(600_000), ScheduleAction::Refresh);
        schedule.refresh_finished(640_000, true);
        assert_eq!(schedule.current_view(), 0);
        assert_eq!(schedule.until_next(640_000), 10_000);
        assert_eq!(schedule.poll(1_239_999), ScheduleAction::ShowView(1));
    }

    #[test]
    fn test_failed_refresh_backs_off() {
        let mut schedule = RefreshSchedule::new(&timing(), 1, 0);
        schedule.refresh_finished(100_000, false);
        assert_eq!(schedule.poll(129_999), ScheduleAction::Wait);
        assert_eq!(schedule.poll(130_000), ScheduleAction::Refresh);
    }

    #[test]
    fn test_single_view_never_flips() {
        let mut schedule = RefreshSchedule::new(&timing(), 1, 0);
        schedule.refresh_finished(0, true);
        assert_eq!(schedule.poll(50_000), ScheduleAction::Wait);
        assert_eq!(schedule.until_next(50_000), 550_000);
    }
}
