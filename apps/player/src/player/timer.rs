//! Owned, cancelable tick source for the active resource.
//!
//! A `TimerHandle` is the only way a tick task exists: dropping or cancelling
//! it aborts the task, so a view that goes away cannot leave a timer behind.

use std::ops::ControlFlow;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// Receives one call per elapsed tick period. Returning `Break` ends the timer.
#[async_trait]
pub trait TickSink: Send + Sync + 'static {
    async fn on_tick(&self, generation: u64) -> ControlFlow<()>;
}

#[derive(Debug)]
pub struct TimerHandle {
    generation: u64,
    task: JoinHandle<()>,
}

impl TimerHandle {
    /// Starts ticking one `period` from now.
    pub fn spawn<S: TickSink>(generation: u64, period: Duration, sink: S) -> Self {
        let task = tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                if sink.on_tick(generation).await.is_break() {
                    debug!("Timer {generation} stopped by its sink");
                    break;
                }
            }
        });
        Self { generation, task }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    struct Counter {
        ticks: Arc<AtomicU64>,
        stop_after: u64,
    }

    #[async_trait]
    impl TickSink for Counter {
        async fn on_tick(&self, _generation: u64) -> ControlFlow<()> {
            let n = self.ticks.fetch_add(1, Ordering::SeqCst) + 1;
            if n >= self.stop_after {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_once_per_period() {
        let ticks = Arc::new(AtomicU64::new(0));
        let _timer = TimerHandle::spawn(
            1,
            Duration::from_secs(1),
            Counter {
                ticks: ticks.clone(),
                stop_after: u64::MAX,
            },
        );

        tokio::time::sleep(Duration::from_millis(10_500)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_ticking() {
        let ticks = Arc::new(AtomicU64::new(0));
        let timer = TimerHandle::spawn(
            1,
            Duration::from_secs(1),
            Counter {
                ticks: ticks.clone(),
                stop_after: u64::MAX,
            },
        );

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        drop(timer);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sink_can_stop_the_timer() {
        let ticks = Arc::new(AtomicU64::new(0));
        let timer = TimerHandle::spawn(
            7,
            Duration::from_secs(1),
            Counter {
                ticks: ticks.clone(),
                stop_after: 2,
            },
        );

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 2);
        assert_eq!(timer.generation(), 7);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 2);
    }
}
