//! One-second tick sources that drive [`TimerEngine::tick`](super::TimerEngine::tick).

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::{Duration, Interval, MissedTickBehavior};

#[async_trait]
pub trait TickSource: Send {
    /// Wait for the next tick. `None` means the source is exhausted.
    async fn tick(&mut self) -> Option<()>;

    /// Restart the period so the next tick lands one full second from now.
    fn reset(&mut self) {}
}

/// Real-time ticks once per second.
pub struct IntervalTicks {
    interval: Interval,
}

impl IntervalTicks {
    pub fn every_second() -> Self {
        Self::new(Duration::from_secs(1))
    }

    pub fn new(period: Duration) -> Self {
        let start = tokio::time::Instant::now() + period;
        let mut interval = tokio::time::interval_at(start, period);
        // A stalled runtime must not fire a burst of catch-up ticks.
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }
}

#[async_trait]
impl TickSource for IntervalTicks {
    async fn tick(&mut self) -> Option<()> {
        self.interval.tick().await;
        Some(())
    }

    fn reset(&mut self) {
        self.interval.reset();
    }
}

/// Ticks delivered by hand through a channel, for tests and simulations.
pub struct ChannelTicks {
    rx: mpsc::UnboundedReceiver<()>,
}

impl ChannelTicks {
    pub fn new() -> (mpsc::UnboundedSender<()>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx })
    }
}

#[async_trait]
impl TickSource for ChannelTicks {
    async fn tick(&mut self) -> Option<()> {
        self.rx.recv().await
    }
}
