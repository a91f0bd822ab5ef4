//! Meshtrace Engine
//!
//! Event-sourced reconstruction of a simulated ad-hoc network: nodes,
//! positions, and routing tables, rebuilt at every point in time from an
//! ordered stream of topology events.
//!
//! # Architecture
//!
//! - **Parser**: simulation log lines → canonical events (replay mode)
//! - **Reducer**: pure `(state, event) -> state` transition
//! - **History**: indexable, immutable snapshot sequence for scrubbing
//! - **Live feed**: structured-message adapter keeping only the current state
//!
//! Both ingestion paths produce the same [`TopologyEvent`] type and share
//! the one reducer; they differ only in what they retain. Rendering,
//! control panels, and the live transport's connection lifecycle live
//! elsewhere; this crate consumes events and produces snapshots.
//!
//! # Usage
//!
//! ```
//! use meshtrace_engine::{LiveFeed, SnapshotHistory};
//!
//! // Replay: scrub through a finished simulation run.
//! let history = SnapshotHistory::build("[sim] Created new node ID: A, x: 0, y: 0\n");
//! assert_eq!(history.len(), 1);
//! assert!(history.at(0).unwrap().state.contains("A"));
//!
//! // Live: fold messages as the transport delivers them.
//! let mut feed = LiveFeed::new();
//! feed.ingest(r#"{"type":"NODE_JOINED","node_id":"A","x":0,"y":0}"#);
//! assert_eq!(feed.state().len(), 1);
//! ```

mod diag;
mod event;
mod history;
mod live;
mod parser;
mod reducer;
mod state;

pub use diag::Diagnostic;
pub use event::TopologyEvent;
pub use history::{SnapshotEntry, SnapshotHistory};
pub use live::{LiveFeed, LiveMessage, TrailEntry, WireRouteEntry};
pub use parser::{parse_log, LogTick, ROUTING_MARKER, SIM_MARKER};
pub use reducer::reduce;
pub use state::{InboxMessage, NetworkState, NodeRecord, RouteEntry};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_alignment_holds_for_mixed_logs() {
        let log = "\
starting radio stack
[sim] Created new node ID: A, x: 1, y: 2
[sim] unrecognized chatter
[sim] [routing table] Node A (router) -> direct neighbor: B
plain noise
[sim] Node A: leaving network.
";
        let marker_lines = log.lines().filter(|l| l.contains(SIM_MARKER)).count();
        let history = SnapshotHistory::build(log);
        assert_eq!(history.len(), marker_lines);
    }

    #[test]
    fn replay_and_live_agree_on_route_semantics() {
        // The same topology fed through both paths lands in the same state.
        let history = SnapshotHistory::build(
            "[sim] Created new node ID: A, x: 0, y: 0\n\
             [sim] [routing table] Node A (router) -> updated route to C via B (hop count 3)\n",
        );

        let mut feed = LiveFeed::new();
        feed.ingest(r#"{"type":"NODE_JOINED","node_id":"A","x":0,"y":0}"#);
        feed.ingest(
            r#"{"type":"ADD_ROUTE_ENTRY","node_id":"A","routing_table":{"Destination":"C","NextHop":"B","HopCount":3}}"#,
        );

        assert_eq!(&history.latest().unwrap().state, feed.state());
    }

    #[test]
    fn direct_neighbor_is_its_own_next_hop() {
        let history = SnapshotHistory::build(
            "[sim] [routing table] Node A (router) -> direct neighbor: B\n",
        );
        let entry = &history.latest().unwrap().state.get("A").unwrap().routing_table["B"];
        assert_eq!(entry.hop_count, Some(1));
        assert_eq!(entry.via.as_deref(), Some("B"));
    }

    #[test]
    fn scrubbing_a_rebuilt_log_reflects_only_the_new_log() {
        let first = SnapshotHistory::build("[sim] Created new node ID: A, x: 0, y: 0\n");
        assert_eq!(first.len(), 1);

        // A new log means a fresh build from the empty state; the old
        // history is simply dropped by its owner.
        let second = SnapshotHistory::build(
            "[sim] Created new node ID: X, x: 0, y: 0\n\
             [sim] Created new node ID: Y, x: 1, y: 1\n",
        );
        assert_eq!(second.len(), 2);
        assert!(!second.latest().unwrap().state.contains("A"));
    }
}
