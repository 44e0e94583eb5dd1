use log::{debug, info};
use std::time::Duration;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Stopped,
    Running,
}

/// Periodic refresh trigger.
///
/// Stopping only cancels future ticks; cycles already in flight are owned by
/// the dashboard and keep running.
#[derive(Debug)]
pub struct RefreshScheduler {
    period: Duration,
    timer: Option<Interval>,
}

impl RefreshScheduler {
    pub fn new(interval_seconds: u32) -> Self {
        Self {
            period: period_for(interval_seconds),
            timer: None,
        }
    }

    pub fn state(&self) -> SchedulerState {
        if self.timer.is_some() {
            SchedulerState::Running
        } else {
            SchedulerState::Stopped
        }
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Changes the cadence used by the next `start`.
    pub fn set_interval(&mut self, interval_seconds: u32) {
        self.period = period_for(interval_seconds);
    }

    pub fn start(&mut self) {
        if self.timer.is_some() {
            return;
        }
        let mut timer = interval_at(Instant::now() + self.period, self.period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.timer = Some(timer);
        info!("[scheduler] running every {:?}", self.period);
    }

    pub fn stop(&mut self) {
        if self.timer.take().is_some() {
            info!("[scheduler] stopped");
        }
    }

    pub fn restart(&mut self) {
        self.stop();
        self.start();
    }

    /// Flips between running and stopped; returns whether it is now running.
    pub fn toggle(&mut self) -> bool {
        if self.is_running() {
            self.stop();
        } else {
            self.start();
        }
        self.is_running()
    }

    /// Resolves at the next periodic trigger. Never resolves while stopped.
    pub async fn tick(&mut self) {
        match self.timer.as_mut() {
            Some(timer) => {
                timer.tick().await;
                debug!("[scheduler] tick");
            }
            None => std::future::pending::<()>().await,
        }
    }
}

fn period_for(interval_seconds: u32) -> Duration {
    Duration::from_millis(u64::from(interval_seconds.max(1)) * 1000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    #[tokio::test]
    async fn start_and_stop_are_idempotent() {
        let mut scheduler = RefreshScheduler::new(2);
        assert_eq!(scheduler.state(), SchedulerState::Stopped);
        scheduler.stop();
        scheduler.start();
        scheduler.start();
        assert_eq!(scheduler.state(), SchedulerState::Running);
        scheduler.stop();
        scheduler.stop();
        assert_eq!(scheduler.state(), SchedulerState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period() {
        let mut scheduler = RefreshScheduler::new(2);
        scheduler.start();
        let started = Instant::now();
        scheduler.tick().await;
        assert_eq!(started.elapsed(), Duration::from_secs(2));
        scheduler.tick().await;
        assert_eq!(started.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_scheduler_never_ticks() {
        let mut scheduler = RefreshScheduler::new(1);
        assert!(
            timeout(Duration::from_secs(10), scheduler.tick())
                .await
                .is_err()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn restart_applies_new_interval_from_now() {
        let mut scheduler = RefreshScheduler::new(2);
        scheduler.start();
        scheduler.set_interval(5);
        scheduler.tick().await;
        let restarted = Instant::now();
        scheduler.restart();
        scheduler.tick().await;
        assert_eq!(restarted.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn toggle_flips_state() {
        let mut scheduler = RefreshScheduler::new(3);
        assert!(scheduler.toggle());
        assert!(!scheduler.toggle());
        assert_eq!(scheduler.period(), Duration::from_secs(3));
    }
}
