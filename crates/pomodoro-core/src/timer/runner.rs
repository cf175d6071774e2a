//! Async driver around [`TimerEngine`].
//!
//! The runner owns the engine and multiplexes user commands with ticks. Every
//! engine event is published on the event channel; events that carry a
//! session record also trigger a background save through [`SessionStore`],
//! whose result is published as `SessionSaved` / `SessionSaveFailed`. Saving
//! never blocks the countdown.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use super::engine::{TimerEngine, TimerState};
use super::session::{SessionType, TimerSettings};
use super::ticks::TickSource;
use crate::error::ValidationError;
use crate::events::Event;
use crate::sync::SessionStore;

const COMMAND_BUFFER: usize = 32;

#[derive(Debug, Clone)]
pub enum TimerCommand {
    /// Start, or toggle pause/resume.
    Start,
    Pause,
    Resume,
    Cancel,
    SetCustomTime(i64),
    SetSessionType(SessionType),
    ApplySettings(TimerSettings),
    /// Publish a `StateSnapshot`.
    Snapshot,
    /// Stop the loop once pending saves have finished.
    Shutdown,
}

/// Sends commands to a running [`TimerRunner`].
#[derive(Debug, Clone)]
pub struct TimerHandle {
    tx: mpsc::Sender<TimerCommand>,
}

impl TimerHandle {
    /// Returns `false` if the runner has already stopped.
    pub async fn send(&self, command: TimerCommand) -> bool {
        self.tx.send(command).await.is_ok()
    }
}

pub struct TimerRunner<T: TickSource> {
    engine: TimerEngine,
    store: Arc<SessionStore>,
    owner_id: Option<String>,
    ticks: T,
    commands: mpsc::Receiver<TimerCommand>,
    events: mpsc::UnboundedSender<Event>,
    saves: JoinSet<()>,
}

impl<T: TickSource> TimerRunner<T> {
    pub fn new(
        engine: TimerEngine,
        store: Arc<SessionStore>,
        owner_id: Option<String>,
        ticks: T,
    ) -> (Self, TimerHandle, mpsc::UnboundedReceiver<Event>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let runner = Self {
            engine,
            store,
            owner_id,
            ticks,
            commands: cmd_rx,
            events: event_tx,
            saves: JoinSet::new(),
        };
        (runner, TimerHandle { tx: cmd_tx }, event_rx)
    }

    /// Drive the engine until `Shutdown` or until every handle is dropped.
    /// Returns the engine in its final state.
    pub async fn run(mut self) -> TimerEngine {
        let mut ticks_open = true;
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    None | Some(TimerCommand::Shutdown) => break,
                    Some(command) => self.handle(command),
                },
                tick = self.ticks.tick(), if ticks_open => match tick {
                    Some(()) => {
                        if let Some(event) = self.engine.tick() {
                            self.dispatch(event);
                        }
                    }
                    None => {
                        tracing::debug!("tick source closed");
                        ticks_open = false;
                    }
                },
                Some(joined) = self.saves.join_next(), if !self.saves.is_empty() => {
                    if let Err(e) = joined {
                        tracing::error!(error = %e, "session save task failed");
                    }
                }
            }
        }

        while let Some(joined) = self.saves.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "session save task failed");
            }
        }
        tracing::debug!(state = self.engine.state().as_str(), "timer runner stopped");
        self.engine
    }

    fn handle(&mut self, command: TimerCommand) {
        let was_running = self.engine.state() == TimerState::Running;
        let event = match command {
            TimerCommand::Start => self.engine.start(),
            TimerCommand::Pause => self.engine.pause(),
            TimerCommand::Resume => self.engine.resume(),
            TimerCommand::Cancel => self.engine.cancel(),
            TimerCommand::SetCustomTime(minutes) => reject_invalid(self.engine.set_custom_time(minutes).map(Some)),
            TimerCommand::SetSessionType(t) => reject_invalid(self.engine.set_session_type(t).map(Some)),
            TimerCommand::ApplySettings(settings) => reject_invalid(self.engine.apply_settings(settings)),
            TimerCommand::Snapshot => Some(self.engine.snapshot()),
            TimerCommand::Shutdown => None,
        };
        if !was_running && self.engine.state() == TimerState::Running {
            self.ticks.reset();
        }
        if let Some(event) = event {
            self.dispatch(event);
        }
    }

    fn dispatch(&mut self, event: Event) {
        let record = event.record().cloned();
        // A closed receiver only means nobody is watching.
        let _ = self.events.send(event);

        let Some(record) = record else {
            return;
        };
        let store = Arc::clone(&self.store);
        let owner = self.owner_id.clone();
        let events = self.events.clone();
        self.saves.spawn(async move {
            let id = record.id.clone();
            let event = match store.save(record, owner.as_deref()).await {
                Ok(outcome) => {
                    tracing::info!(id = %outcome.id, remote = ?outcome.remote, "session recorded");
                    Event::SessionSaved { outcome }
                }
                Err(e) => {
                    tracing::error!(id = %id, error = %e, "failed to record session");
                    Event::SessionSaveFailed {
                        id,
                        error: e.to_string(),
                    }
                }
            };
            let _ = events.send(event);
        });
    }
}

fn reject_invalid(result: Result<Option<Event>, ValidationError>) -> Option<Event> {
    result.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "timer command rejected");
        None
    })
}
