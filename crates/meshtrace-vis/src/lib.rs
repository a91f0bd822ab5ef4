//! Meshtrace Visualization
//!
//! Serving surface for the reconstruction engine: time-travel playback
//! over a parsed simulation log, plus live-state display fed by a
//! WebSocket transport.
//!
//! # Architecture
//!
//! - **Playback**: frame cursor scrubbing a prebuilt snapshot history
//! - **Server**: axum REST + WebSocket exposure of the engine's output
//!   contract (read-only) and the live ingestion endpoint
//!
//! Map rendering and the command-issuing control panel are external
//! collaborators; this crate serves them JSON.
//!
//! # Usage
//!
//! ```ignore
//! let history = SnapshotHistory::build(&log_text);
//! let server = VisServer::new(history);
//! server.serve(3000).await?;
//! ```

mod error;
mod playback;
mod server;

pub use error::{Error, Result};
pub use playback::{Playback, PlaybackSpeed, PlaybackState, PlaybackStatus};
pub use server::VisServer;
