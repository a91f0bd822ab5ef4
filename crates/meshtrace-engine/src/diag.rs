//! Diagnostics: anomalies the fold tolerates and records.
//!
//! None of these abort processing. The network must remain displayable
//! from whatever could be reconstructed, so every anomaly becomes a trail
//! entry instead of an error.

use serde::Serialize;
use thiserror::Error;

/// A recorded anomaly from parsing, decoding, or reducing.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A marker line matched no grammar rule; the tick advanced with the
    /// state unchanged.
    #[error("no rule matched marker line: {line}")]
    ParseMismatch { line: String },

    /// An event named a node absent from the state and was applied as a
    /// no-op.
    #[error("{action} references unknown node {node_id}")]
    UnknownActor { node_id: String, action: String },

    /// A live message failed the wire-schema decode and was dropped whole.
    #[error("malformed live message: {reason}")]
    MalformedMessage { reason: String },

    /// A join overwrote an existing record, discarding its routing table.
    #[error("duplicate join for {node_id} discarded {dropped_routes} routing entries")]
    DuplicateJoin {
        node_id: String,
        dropped_routes: usize,
    },

    /// A route event referenced nodes never explicitly created; stub
    /// records were placed at the origin.
    #[error("created stub records for {}", .ids.join(", "))]
    StubNodes { ids: Vec<String> },
}
