use std::time::Duration;

#[cfg(not(target_arch = "wasm32"))]
pub use std::time::Instant;

#[cfg(target_arch = "wasm32")]
use core::ops::Sub;

#[cfg(target_arch = "wasm32")]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Instant {
    millis: f64,
}

#[cfg(target_arch = "wasm32")]
impl Instant {
    pub fn now() -> Self {
        Self {
            millis: performance_now(),
        }
    }

    pub fn duration_since(&self, earlier: Instant) -> Duration {
        Duration::from_secs_f64((self.millis - earlier.millis).max(0.0) / 1000.0)
    }

    pub fn elapsed(&self) -> Duration {
        Self::now() - *self
    }
}

#[cfg(target_arch = "wasm32")]
impl Sub<Instant> for Instant {
    type Output = Duration;

    fn sub(self, rhs: Instant) -> Duration {
        self.duration_since(rhs)
    }
}

#[cfg(target_arch = "wasm32")]
fn performance_now() -> f64 {
    web_sys::window()
        .and_then(|window| window.performance())
        .map(|perf| perf.now())
        .unwrap_or(0.0)
}

/// Fixed-period timer fed with frame deltas.
///
/// Every full period of accumulated time counts as one firing, so a long
/// frame may fire the timer more than once.
#[derive(Debug, Clone)]
pub struct IntervalTimer {
    period: f64,
    accumulated: f64,
}

impl IntervalTimer {
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.as_secs_f64(),
            accumulated: 0.0,
        }
    }

    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(self.period)
    }

    /// Advances the timer and returns how many periods elapsed.
    pub fn tick(&mut self, dt: f64) -> u32 {
        if self.period <= 0.0 || dt <= 0.0 {
            return 0;
        }

        self.accumulated += dt;
        let mut fired = 0;
        while self.accumulated >= self.period {
            self.accumulated -= self.period;
            fired += 1;
        }
        fired
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Debug)]
struct ScheduledTimer {
    id: TimerId,
    timer: IntervalTimer,
    fired: u32,
}

/// Interval tasks registered against the frame clock.
///
/// Tasks are advanced once per frame by the runtime; behaviours read how
/// often their task fired during the current frame with [`Timers::fired`].
#[derive(Debug, Default)]
pub struct Timers {
    next_id: u64,
    timers: Vec<ScheduledTimer>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_interval(&mut self, period: Duration) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.push(ScheduledTimer {
            id,
            timer: IntervalTimer::new(period),
            fired: 0,
        });
        log::debug!("Registered interval timer {:?} every {:?}", id, period);
        id
    }

    /// Removes a task. Returns false when the id was unknown or already cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|scheduled| scheduled.id != id);
        before != self.timers.len()
    }

    pub fn clear(&mut self) {
        if !self.timers.is_empty() {
            log::debug!("Cancelling {} interval timers", self.timers.len());
        }
        self.timers.clear();
    }

    pub fn is_active(&self, id: TimerId) -> bool {
        self.timers.iter().any(|scheduled| scheduled.id == id)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub(crate) fn advance(&mut self, dt: f64) {
        for scheduled in &mut self.timers {
            scheduled.fired = scheduled.timer.tick(dt);
        }
    }

    /// Number of times the task fired during the last [`advance`](Self::advance).
    pub fn fired(&self, id: TimerId) -> u32 {
        self.timers
            .iter()
            .find(|scheduled| scheduled.id == id)
            .map(|scheduled| scheduled.fired)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_fires_once_per_period() {
        let mut timer = IntervalTimer::new(Duration::from_secs(10));
        assert_eq!(timer.tick(4.0), 0);
        assert_eq!(timer.tick(4.0), 0);
        assert_eq!(timer.tick(4.0), 1);
        assert_eq!(timer.tick(25.0), 2);
    }

    #[test]
    fn zero_period_never_fires() {
        let mut timer = IntervalTimer::new(Duration::ZERO);
        assert_eq!(timer.tick(1.0), 0);
    }

    #[test]
    fn cancelled_timer_stops_reporting() {
        let mut timers = Timers::new();
        let id = timers.add_interval(Duration::from_secs(1));
        timers.advance(1.5);
        assert_eq!(timers.fired(id), 1);

        assert!(timers.cancel(id));
        assert!(!timers.cancel(id));
        timers.advance(5.0);
        assert_eq!(timers.fired(id), 0);
        assert!(timers.is_empty());
    }

    #[test]
    fn fired_count_resets_each_frame() {
        let mut timers = Timers::new();
        let id = timers.add_interval(Duration::from_millis(500));
        timers.advance(0.6);
        assert_eq!(timers.fired(id), 1);
        timers.advance(0.1);
        assert_eq!(timers.fired(id), 0);
    }
}
