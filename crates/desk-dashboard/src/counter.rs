use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use tokio::{
    runtime::Handle,
    sync::watch,
    time::{Instant, interval_at},
};
use tokio_util::sync::CancellationToken;

/// Increment applied every tick so `target` is reached in about `duration`.
pub fn counter_step(target: u64, duration: Duration, tick: Duration) -> u64 {
    let ticks = duration.as_nanos() as f64 / tick.as_nanos() as f64;
    if !ticks.is_finite() || ticks < 1.0 {
        return target.max(1);
    }
    ((target as f64 / ticks).ceil() as u64).max(1)
}

/// Values shown on successive ticks, counting up from zero. The last frame is always
/// `target`; a zero target is a single `0` frame.
pub fn counter_frames(target: u64, duration: Duration, tick: Duration) -> Vec<u64> {
    if target == 0 {
        return vec![0];
    }

    let step = counter_step(target, duration, tick);
    let mut frames = Vec::new();
    let mut value = 0u64;
    loop {
        value = value.saturating_add(step);
        if value >= target {
            frames.push(target);
            return frames;
        }
        frames.push(value);
    }
}

struct TimerGuard(Arc<AtomicUsize>);

impl Drop for TimerGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Counts a displayed number up to a target on a timer.
///
/// A new target cancels the running timer before starting another, and dropping the
/// animation cancels it too, so at most one timer ever writes the value.
pub struct CounterAnimation {
    value: Arc<watch::Sender<u64>>,
    duration: Duration,
    tick: Duration,
    target: u64,
    current: Option<CancellationToken>,
    active: Arc<AtomicUsize>,
}

impl CounterAnimation {
    pub fn new(duration: Duration, tick: Duration) -> Self {
        let (value, _) = watch::channel(0);
        Self {
            value: Arc::new(value),
            duration,
            tick,
            target: 0,
            current: None,
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.value.subscribe()
    }

    pub fn value(&self) -> u64 {
        *self.value.borrow()
    }

    pub const fn target(&self) -> u64 {
        self.target
    }

    /// Timers that have not exited yet.
    pub fn active_timers(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Restarts the count from zero towards a new `target`. The same target again leaves
    /// the running or finished count alone. Outside a tokio runtime the value jumps
    /// straight to `target`.
    pub fn set_target(&mut self, target: u64) {
        if target == self.target {
            return;
        }
        self.cancel();
        self.target = target;
        self.value.send_replace(0);

        if target == 0 {
            return;
        }

        let Ok(handle) = Handle::try_current() else {
            self.value.send_replace(target);
            return;
        };

        let token = CancellationToken::new();
        let frames = counter_frames(target, self.duration, self.tick);
        let value = Arc::clone(&self.value);
        let tick = self.tick;

        self.active.fetch_add(1, Ordering::SeqCst);
        let guard = TimerGuard(Arc::clone(&self.active));
        let cancelled = token.clone();

        handle.spawn(async move {
            let _guard = guard;
            let mut ticker = interval_at(Instant::now() + tick, tick);
            for frame in frames {
                tokio::select! {
                    biased;
                    () = cancelled.cancelled() => return,
                    _ = ticker.tick() => {
                        value.send_replace(frame);
                    }
                }
            }
        });

        self.current = Some(token);
    }

    fn cancel(&mut self) {
        if let Some(token) = self.current.take() {
            token.cancel();
        }
    }
}

impl Drop for CounterAnimation {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(20);

    async fn settle() {
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }

    #[test]
    fn test_counter_step() {
        assert_eq!(counter_step(1300, Duration::from_millis(1300), TICK), 20);
        assert_eq!(counter_step(10, Duration::from_millis(1100), TICK), 1);
        assert_eq!(counter_step(56, Duration::from_millis(1100), TICK), 2);
        assert_eq!(counter_step(7, Duration::ZERO, TICK), 7);
    }

    #[test]
    fn test_counter_frames() {
        assert_eq!(counter_frames(0, Duration::from_millis(1300), TICK), [0]);
        assert_eq!(
            counter_frames(5, Duration::from_millis(100), TICK),
            [1, 2, 3, 4, 5]
        );
        // Step 2, so the last frame is clamped.
        assert_eq!(
            counter_frames(7, Duration::from_millis(80), TICK),
            [2, 4, 6, 7]
        );

        let frames = counter_frames(1234, Duration::from_millis(1300), TICK);
        assert_eq!(frames.len(), 65);
        assert_eq!(frames.last(), Some(&1234));
        assert!(frames.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_animation_reaches_target() {
        let mut counter = CounterAnimation::new(Duration::from_millis(100), TICK);
        counter.set_target(5);
        assert_eq!(counter.active_timers(), 1);
        assert_eq!(counter.value(), 0);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(counter.value(), 2);

        tokio::time::sleep(Duration::from_millis(100)).await;
        settle().await;
        assert_eq!(counter.value(), 5);
        assert_eq!(counter.active_timers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retarget_leaves_exactly_one_timer() {
        let mut counter = CounterAnimation::new(Duration::from_millis(1300), TICK);
        let mut rx = counter.subscribe();
        counter.set_target(1300);
        tokio::time::sleep(Duration::from_millis(210)).await;
        assert!(counter.value() > 0);

        counter.set_target(65);
        settle().await;
        assert_eq!(counter.active_timers(), 1);

        let mut seen = Vec::new();
        rx.borrow_and_update();
        while *rx.borrow() != 65 {
            rx.changed().await.unwrap();
            seen.push(*rx.borrow_and_update());
        }
        // Only the new timer writes: one per tick, never larger than the new target.
        assert_eq!(seen, (1..=65).collect::<Vec<_>>());

        settle().await;
        assert_eq!(counter.active_timers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_target_does_not_restart() {
        let mut counter = CounterAnimation::new(Duration::from_millis(100), TICK);
        counter.set_target(5);
        tokio::time::sleep(Duration::from_millis(150)).await;
        settle().await;
        assert_eq!(counter.value(), 5);

        counter.set_target(5);
        assert_eq!(counter.value(), 5);
        assert_eq!(counter.active_timers(), 0);

        // Mid-count, the running timer keeps going instead of starting over.
        counter.set_target(50);
        tokio::time::sleep(Duration::from_millis(50)).await;
        let before = counter.value();
        assert!(before > 0);
        counter.set_target(50);
        assert_eq!(counter.value(), before);
        assert_eq!(counter.active_timers(), 1);

        tokio::time::sleep(Duration::from_millis(100)).await;
        settle().await;
        assert_eq!(counter.value(), 50);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_target_resets_immediately() {
        let mut counter = CounterAnimation::new(Duration::from_millis(1100), TICK);
        counter.set_target(500);
        tokio::time::sleep(Duration::from_millis(100)).await;

        counter.set_target(0);
        assert_eq!(counter.value(), 0);
        settle().await;
        assert_eq!(counter.active_timers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_timer() {
        let active = {
            let mut counter = CounterAnimation::new(Duration::from_millis(1100), TICK);
            counter.set_target(500);
            Arc::clone(&counter.active)
        };
        settle().await;
        assert_eq!(active.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_without_runtime_jumps_to_target() {
        let mut counter = CounterAnimation::new(Duration::from_millis(1100), TICK);
        counter.set_target(42);
        assert_eq!(counter.value(), 42);
        assert_eq!(counter.active_timers(), 0);
    }
}
