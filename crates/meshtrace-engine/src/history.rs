//! Snapshot history: the replay-mode fold.
//!
//! One build per input log. Each tick's resulting state is captured into
//! an entry that later folding can never alter. The UI holds references
//! to arbitrary past indices while scrubbing, so retroactive mutation of a
//! published snapshot is the one failure this module must rule out. The
//! copy-on-write [`NetworkState`] makes the capture cheap.

use serde::Serialize;

use crate::diag::Diagnostic;
use crate::parser::{parse_log, LogTick};
use crate::reducer::reduce;
use crate::state::NetworkState;

/// One tick of the history: the state after folding every event from the
/// start of the log through this marker line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotEntry {
    pub event_index: usize,
    pub source_line: String,
    pub state: NetworkState,
}

/// Immutable, indexable sequence of network snapshots built from one log.
///
/// Random access is O(1) after the one-time O(n) build. Supplying a new
/// log means building a fresh history; there is no incremental append.
#[derive(Debug, Default)]
pub struct SnapshotHistory {
    entries: Vec<SnapshotEntry>,
    diagnostics: Vec<Diagnostic>,
}

impl SnapshotHistory {
    /// Build the whole history from raw log text.
    ///
    /// One entry per marker line, recognized or not: a tick with no
    /// events carries the previous state forward unchanged, keeping the
    /// history aligned 1:1 with displayed log lines.
    pub fn build(log_text: &str) -> Self {
        Self::from_ticks(parse_log(log_text))
    }

    /// Fold an already-parsed tick sequence, starting from an empty state.
    pub fn from_ticks(ticks: Vec<LogTick>) -> Self {
        let mut entries = Vec::with_capacity(ticks.len());
        let mut diagnostics = Vec::new();
        let mut state = NetworkState::new();

        for (index, tick) in ticks.into_iter().enumerate() {
            if tick.events.is_empty() {
                diagnostics.push(Diagnostic::ParseMismatch {
                    line: tick.source_line.clone(),
                });
            }
            for event in &tick.events {
                let (next, diag) = reduce(state, event);
                state = next;
                diagnostics.extend(diag);
            }
            entries.push(SnapshotEntry {
                event_index: index,
                source_line: tick.source_line,
                state: state.clone(),
            });
        }

        Self {
            entries,
            diagnostics,
        }
    }

    /// Number of ticks (equal to the number of marker lines in the log).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at a tick index, or `None` past the end.
    pub fn at(&self, index: usize) -> Option<&SnapshotEntry> {
        self.entries.get(index)
    }

    /// The final snapshot, if the log had any marker lines.
    pub fn latest(&self) -> Option<&SnapshotEntry> {
        self.entries.last()
    }

    /// Anomalies recorded during the build, in fold order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}
