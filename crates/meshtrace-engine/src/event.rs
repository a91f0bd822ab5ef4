//! Canonical topology events.
//!
//! Both ingestion paths (the log parser and the live message decoder)
//! produce this one event type, and the reducer consumes nothing else.

use serde::{Deserialize, Serialize};

/// Something that happened to the network topology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TopologyEvent {
    /// A node appeared (or re-announced itself) at a position.
    NodeJoined {
        id: String,
        x: f64,
        y: f64,
        is_virtual: bool,
    },

    /// A node left the network.
    NodeLeft { id: String },

    /// A node learned or refreshed a route to a destination.
    RouteUpserted {
        node_id: String,
        dest_id: String,
        hop_count: Option<u32>,
        via: Option<String>,
    },

    /// A node dropped its route to a destination.
    RouteRemoved { node_id: String, dest_id: String },

    /// A node changed position.
    NodeMoved { node_id: String, x: f64, y: f64 },

    /// A user attached to a node (live mode).
    UserConnected { node_id: String, user_id: String },

    /// A user detached from a node (live mode).
    UserDisconnected { node_id: String, user_id: String },

    /// A message reached its destination node (live mode).
    MessageDelivered {
        node_id: String,
        from: String,
        content: String,
    },
}

impl TopologyEvent {
    /// Id of the node the event acts on.
    pub fn actor(&self) -> &str {
        match self {
            TopologyEvent::NodeJoined { id, .. } | TopologyEvent::NodeLeft { id } => id,
            TopologyEvent::RouteUpserted { node_id, .. }
            | TopologyEvent::RouteRemoved { node_id, .. }
            | TopologyEvent::NodeMoved { node_id, .. }
            | TopologyEvent::UserConnected { node_id, .. }
            | TopologyEvent::UserDisconnected { node_id, .. }
            | TopologyEvent::MessageDelivered { node_id, .. } => node_id,
        }
    }
}
