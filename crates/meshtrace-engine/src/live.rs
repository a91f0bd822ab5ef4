//! Live ingestion: structured messages folded into one current state.
//!
//! Unlike replay mode there is no history, only the current state plus an
//! append-only trail of accepted and rejected messages for the UI event
//! log. The feed is transport-free: whatever owns the connection hands raw
//! message text in, one message at a time, in arrival order. Reconnects
//! are invisible here; the state keeps folding whatever arrives.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::diag::Diagnostic;
use crate::event::TopologyEvent;
use crate::reducer::reduce;
use crate::state::NetworkState;

/// Routing-table payload carried by route wire messages.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WireRouteEntry {
    #[serde(rename = "Destination")]
    pub destination: String,
    #[serde(rename = "NextHop")]
    pub next_hop: String,
    #[serde(rename = "HopCount")]
    pub hop_count: u32,
}

/// The closed live wire schema.
///
/// Decoding is the validation boundary: a message missing a required
/// field, typing one wrongly (`x: "NaN"`), or carrying an unknown `type`
/// never reaches the reducer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum LiveMessage {
    #[serde(rename = "NODE_JOINED")]
    NodeJoined {
        node_id: String,
        x: f64,
        y: f64,
        #[serde(default, rename = "virtual")]
        is_virtual: bool,
    },

    #[serde(rename = "NODE_LEFT")]
    NodeLeft { node_id: String },

    #[serde(rename = "ADD_ROUTE_ENTRY")]
    AddRouteEntry {
        node_id: String,
        routing_table: WireRouteEntry,
    },

    #[serde(rename = "REMOVED_ROUTE_ENTRY")]
    RemovedRouteEntry {
        node_id: String,
        routing_table: WireRouteEntry,
    },

    #[serde(rename = "MOVED_NODE")]
    MovedNode { node_id: String, x: f64, y: f64 },

    #[serde(rename = "USER_JOINED")]
    UserJoined { node_id: String, user_id: String },

    #[serde(rename = "USER_LEFT")]
    UserLeft { node_id: String, user_id: String },

    #[serde(rename = "MESSAGE_RECEIVED")]
    MessageReceived {
        node_id: String,
        from: String,
        content: String,
    },
}

impl LiveMessage {
    /// The canonical event this message maps to.
    pub fn into_event(self) -> TopologyEvent {
        match self {
            LiveMessage::NodeJoined {
                node_id,
                x,
                y,
                is_virtual,
            } => TopologyEvent::NodeJoined {
                id: node_id,
                x,
                y,
                is_virtual,
            },
            LiveMessage::NodeLeft { node_id } => TopologyEvent::NodeLeft { id: node_id },
            LiveMessage::AddRouteEntry {
                node_id,
                routing_table,
            } => TopologyEvent::RouteUpserted {
                node_id,
                dest_id: routing_table.destination,
                hop_count: Some(routing_table.hop_count),
                via: Some(routing_table.next_hop),
            },
            LiveMessage::RemovedRouteEntry {
                node_id,
                routing_table,
            } => TopologyEvent::RouteRemoved {
                node_id,
                dest_id: routing_table.destination,
            },
            LiveMessage::MovedNode { node_id, x, y } => {
                TopologyEvent::NodeMoved { node_id, x, y }
            }
            LiveMessage::UserJoined { node_id, user_id } => {
                TopologyEvent::UserConnected { node_id, user_id }
            }
            LiveMessage::UserLeft { node_id, user_id } => {
                TopologyEvent::UserDisconnected { node_id, user_id }
            }
            LiveMessage::MessageReceived {
                node_id,
                from,
                content,
            } => TopologyEvent::MessageDelivered {
                node_id,
                from,
                content,
            },
        }
    }
}

/// One processed live message, as shown in the UI event log.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TrailEntry {
    /// Decoded, converted, and folded into the state.
    Accepted {
        event: TopologyEvent,
        #[serde(skip_serializing_if = "Option::is_none")]
        note: Option<Diagnostic>,
    },
    /// Dropped at the boundary; the state was not touched.
    Rejected { reason: Diagnostic },
}

/// Live-mode ingestion: one retained current state, no history.
#[derive(Debug, Default)]
pub struct LiveFeed {
    state: NetworkState,
    trail: Vec<TrailEntry>,
}

impl LiveFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode, validate, and fold one raw message.
    ///
    /// Returns whether the message was accepted. A rejected message
    /// leaves the state untouched; it is never partially applied.
    pub fn ingest(&mut self, raw: &str) -> bool {
        match serde_json::from_str::<LiveMessage>(raw) {
            Ok(message) => {
                self.apply(message.into_event());
                true
            }
            Err(err) => {
                warn!(%err, "dropping malformed live message");
                self.trail.push(TrailEntry::Rejected {
                    reason: Diagnostic::MalformedMessage {
                        reason: err.to_string(),
                    },
                });
                false
            }
        }
    }

    /// Fold an already-decoded event into the current state.
    pub fn apply(&mut self, event: TopologyEvent) {
        let (next, note) = reduce(std::mem::take(&mut self.state), &event);
        self.state = next;
        self.trail.push(TrailEntry::Accepted { event, note });
    }

    /// The current reconstructed state.
    pub fn state(&self) -> &NetworkState {
        &self.state
    }

    /// Every message processed so far, accepted or rejected, in order.
    pub fn trail(&self) -> &[TrailEntry] {
        &self.trail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_joined_message_creates_the_node() {
        let mut feed = LiveFeed::new();
        assert!(feed.ingest(r#"{"type":"NODE_JOINED","node_id":"A","x":3.5,"y":-1.0,"virtual":true}"#));

        let node = feed.state().get("A").unwrap();
        assert_eq!((node.x, node.y), (3.5, -1.0));
        assert!(node.is_virtual);
        assert_eq!(feed.trail().len(), 1);
    }

    #[test]
    fn virtual_flag_defaults_to_false() {
        let mut feed = LiveFeed::new();
        feed.ingest(r#"{"type":"NODE_JOINED","node_id":"A","x":0,"y":0}"#);
        assert!(!feed.state().get("A").unwrap().is_virtual);
    }

    #[test]
    fn non_numeric_coordinates_are_rejected_whole() {
        let mut feed = LiveFeed::new();
        feed.ingest(r#"{"type":"NODE_JOINED","node_id":"A","x":0,"y":0}"#);

        let before = feed.state().clone();
        let accepted =
            feed.ingest(r#"{"type":"NODE_JOINED","node_id":"B","x":"NaN","y":2.0}"#);

        assert!(!accepted);
        assert_eq!(feed.state(), &before);
        assert!(matches!(
            feed.trail().last().unwrap(),
            TrailEntry::Rejected {
                reason: Diagnostic::MalformedMessage { .. }
            }
        ));
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let mut feed = LiveFeed::new();
        assert!(!feed.ingest(r#"{"type":"NODE_LEFT"}"#));
        assert!(feed.state().is_empty());
    }

    #[test]
    fn unknown_type_is_rejected() {
        let mut feed = LiveFeed::new();
        assert!(!feed.ingest(r#"{"type":"SELF_DESTRUCT","node_id":"A"}"#));
        assert!(!feed.ingest("not json at all"));
        assert_eq!(feed.trail().len(), 2);
    }

    #[test]
    fn add_route_entry_updates_the_table() {
        let mut feed = LiveFeed::new();
        feed.ingest(r#"{"type":"NODE_JOINED","node_id":"A","x":0,"y":0}"#);
        feed.ingest(
            r#"{"type":"ADD_ROUTE_ENTRY","node_id":"A","routing_table":{"Destination":"C","NextHop":"B","HopCount":3}}"#,
        );

        let entry = &feed.state().get("A").unwrap().routing_table["C"];
        assert_eq!(entry.hop_count, Some(3));
        assert_eq!(entry.via.as_deref(), Some("B"));
    }

    #[test]
    fn route_entry_for_unknown_actor_vivifies_like_replay() {
        let mut feed = LiveFeed::new();
        feed.ingest(
            r#"{"type":"ADD_ROUTE_ENTRY","node_id":"A","routing_table":{"Destination":"C","NextHop":"B","HopCount":3}}"#,
        );

        // Same stubs the replay path would create.
        assert_eq!(feed.state().len(), 3);
        assert!(matches!(
            feed.trail().last().unwrap(),
            TrailEntry::Accepted {
                note: Some(Diagnostic::StubNodes { .. }),
                ..
            }
        ));
    }

    #[test]
    fn removed_route_entry_drops_the_route() {
        let mut feed = LiveFeed::new();
        feed.ingest(r#"{"type":"NODE_JOINED","node_id":"A","x":0,"y":0}"#);
        feed.ingest(
            r#"{"type":"ADD_ROUTE_ENTRY","node_id":"A","routing_table":{"Destination":"C","NextHop":"B","HopCount":3}}"#,
        );
        feed.ingest(
            r#"{"type":"REMOVED_ROUTE_ENTRY","node_id":"A","routing_table":{"Destination":"C","NextHop":"B","HopCount":3}}"#,
        );
        assert!(feed.state().get("A").unwrap().routing_table.is_empty());
    }

    #[test]
    fn moved_node_updates_position() {
        let mut feed = LiveFeed::new();
        feed.ingest(r#"{"type":"NODE_JOINED","node_id":"A","x":0,"y":0}"#);
        feed.ingest(r#"{"type":"MOVED_NODE","node_id":"A","x":7.5,"y":8.5}"#);

        let node = feed.state().get("A").unwrap();
        assert_eq!((node.x, node.y), (7.5, 8.5));
    }

    #[test]
    fn users_round_trip_through_the_wire() {
        let mut feed = LiveFeed::new();
        feed.ingest(r#"{"type":"NODE_JOINED","node_id":"A","x":0,"y":0}"#);
        feed.ingest(r#"{"type":"USER_JOINED","node_id":"A","user_id":"u1"}"#);
        assert!(feed.state().get("A").unwrap().connected_users.contains("u1"));

        feed.ingest(r#"{"type":"USER_LEFT","node_id":"A","user_id":"u1"}"#);
        assert!(feed.state().get("A").unwrap().connected_users.is_empty());
    }

    #[test]
    fn messages_are_retained_in_arrival_order() {
        let mut feed = LiveFeed::new();
        feed.ingest(r#"{"type":"NODE_JOINED","node_id":"A","x":0,"y":0}"#);
        feed.ingest(r#"{"type":"MESSAGE_RECEIVED","node_id":"A","from":"B","content":"hi"}"#);
        feed.ingest(r#"{"type":"MESSAGE_RECEIVED","node_id":"A","from":"C","content":"bye"}"#);

        let inbox = &feed.state().get("A").unwrap().received_messages;
        assert_eq!(inbox[0].content, "hi");
        assert_eq!(inbox[1].content, "bye");
    }

    #[test]
    fn trail_records_every_outcome() {
        let mut feed = LiveFeed::new();
        feed.ingest(r#"{"type":"NODE_JOINED","node_id":"A","x":0,"y":0}"#);
        feed.ingest("garbage");
        feed.ingest(r#"{"type":"NODE_LEFT","node_id":"A"}"#);

        assert_eq!(feed.trail().len(), 3);
        assert!(matches!(feed.trail()[0], TrailEntry::Accepted { .. }));
        assert!(matches!(feed.trail()[1], TrailEntry::Rejected { .. }));
        assert!(matches!(feed.trail()[2], TrailEntry::Accepted { .. }));
    }
}
