//! Device synchronization.
//!
//! [`SyncState`] is a plain state machine: it decides what happens next and
//! records results, but never touches the network or the clock. The
//! [`DeviceSyncEngine`] task owns one, feeds it timer ticks and host
//! commands, and performs the rendering and device calls it asks for.
//!
//! Render requests are coalesced. While a frame is uploading, later requests
//! replace each other and only the newest generation is rendered next.

mod engine;
mod state;

pub use engine::{Command, DeviceSyncEngine, EngineHandle, Preview, SyncStatus};
pub use state::{Connectivity, Job, PendingRender, Phase, SyncState, Trigger};
