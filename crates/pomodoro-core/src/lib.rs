//! # Pomodoro Core Library
//!
//! Core logic for a Pomodoro timer: a tick-driven countdown engine that
//! alternates work and break sessions, and a session history that lives on
//! the device and is mirrored, best-effort, to an owner-scoped remote store.
//!
//! ## Architecture
//!
//! - **Timer**: [`TimerEngine`] is a synchronous state machine advanced one
//!   second per `tick()`. [`TimerRunner`] drives it from a tick source on
//!   tokio and persists every finished or cancelled session.
//! - **Storage**: SQLite key-value store for sessions and settings, TOML for
//!   application configuration.
//! - **Sync**: [`SessionStore`] writes locally first, forwards to a
//!   [`RemoteStore`] when an owner is signed in, queues failed remote writes
//!   and merges both copies on read.
//! - **Stats**: aggregate figures over merged or remote-only history.

pub mod error;
pub mod events;
pub mod stats;
pub mod storage;
pub mod sync;
pub mod timer;

pub use error::{ConfigError, CoreError, RemoteError, StorageError, ValidationError};
pub use events::Event;
pub use stats::{RemoteStats, SessionStats};
pub use storage::{Config, Database, LocalStore, SessionRecord, SettingsStore};
pub use sync::{HttpRemoteStore, MemoryRemoteStore, RemoteStore, RemoteSync, SessionStore};
pub use timer::{SessionType, TimerEngine, TimerRunner, TimerSettings, TimerState};
