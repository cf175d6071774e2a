mod clock;
mod engine;
mod runner;
mod session;
mod ticks;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{countdown_progress, format_time, TimerEngine, TimerState};
pub use runner::{TimerCommand, TimerHandle, TimerRunner};
pub use session::{SessionType, TimerSettings};
pub use ticks::{ChannelTicks, IntervalTicks, TickSource};
