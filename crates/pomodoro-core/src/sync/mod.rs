//! Remote storage and the session store that bridges it with local storage.
//!
//! Remote sync is best-effort: local writes always happen first, remote
//! failures are queued in an outbox and retried by later calls.

pub mod http;
pub mod outbox;
pub mod remote;
pub mod session_store;
pub mod types;

pub use http::HttpRemoteStore;
pub use outbox::{Outbox, QueuedOp};
pub use remote::{MemoryRemoteStore, RemoteStore};
pub use session_store::SessionStore;
pub use types::{DeleteOutcome, PendingOp, RemoteSync, SaveOutcome};
