//! The topology transition function.
//!
//! [`reduce`] is the only way state changes: owned state in, owned state
//! out, deterministic, no I/O. Anomalies never fail the fold; they come
//! back as diagnostics and the state absorbs what it can.

use tracing::debug;

use crate::diag::Diagnostic;
use crate::event::TopologyEvent;
use crate::state::{InboxMessage, NetworkState, NodeRecord, RouteEntry};

/// Fold one event into the state.
///
/// Same inputs always yield a structurally equal result. The returned
/// diagnostic, if any, records an anomaly the fold absorbed (unknown
/// actor, duplicate join, stub vivification).
pub fn reduce(
    mut state: NetworkState,
    event: &TopologyEvent,
) -> (NetworkState, Option<Diagnostic>) {
    let diag = apply(&mut state, event);
    if let Some(diag) = &diag {
        debug!(actor = event.actor(), %diag, "fold diagnostic");
    }
    (state, diag)
}

fn apply(state: &mut NetworkState, event: &TopologyEvent) -> Option<Diagnostic> {
    match event {
        TopologyEvent::NodeJoined {
            id,
            x,
            y,
            is_virtual,
        } => {
            // Last-write-wins: a repeated join replaces the record wholesale,
            // routing table included.
            let prior = state.insert(NodeRecord::new(id.clone(), *x, *y, *is_virtual));
            prior.map(|old| Diagnostic::DuplicateJoin {
                node_id: id.clone(),
                dropped_routes: old.routing_table.len(),
            })
        }

        TopologyEvent::NodeLeft { id } => match state.remove(id) {
            // Entries in other nodes that reference the removed id are left
            // dangling; consumers tolerate them.
            Some(_) => None,
            None => Some(unknown(id, "leave")),
        },

        TopologyEvent::RouteUpserted {
            node_id,
            dest_id,
            hop_count,
            via,
        } => {
            let mut stubs = Vec::new();
            for id in [node_id, dest_id].into_iter().chain(via.as_ref()) {
                if !state.contains(id) {
                    state.insert(NodeRecord::stub(id.clone()));
                    stubs.push(id.clone());
                }
            }
            if let Some(node) = state.get_mut(node_id) {
                node.routing_table.insert(
                    dest_id.clone(),
                    RouteEntry {
                        hop_count: *hop_count,
                        via: via.clone(),
                    },
                );
            }
            (!stubs.is_empty()).then(|| Diagnostic::StubNodes { ids: stubs })
        }

        TopologyEvent::RouteRemoved { node_id, dest_id } => match state.get_mut(node_id) {
            Some(node) => {
                node.routing_table.remove(dest_id);
                None
            }
            None => Some(unknown(node_id, "route removal")),
        },

        TopologyEvent::NodeMoved { node_id, x, y } => match state.get_mut(node_id) {
            Some(node) => {
                node.x = *x;
                node.y = *y;
                None
            }
            None => Some(unknown(node_id, "move")),
        },

        TopologyEvent::UserConnected { node_id, user_id } => match state.get_mut(node_id) {
            Some(node) => {
                node.connected_users.insert(user_id.clone());
                None
            }
            None => Some(unknown(node_id, "user attach")),
        },

        TopologyEvent::UserDisconnected { node_id, user_id } => match state.get_mut(node_id) {
            Some(node) => {
                node.connected_users.remove(user_id);
                None
            }
            None => Some(unknown(node_id, "user detach")),
        },

        TopologyEvent::MessageDelivered {
            node_id,
            from,
            content,
        } => match state.get_mut(node_id) {
            Some(node) => {
                node.received_messages.push(InboxMessage {
                    from: from.clone(),
                    content: content.clone(),
                });
                None
            }
            None => Some(unknown(node_id, "message delivery")),
        },
    }
}

fn unknown(node_id: &str, action: &str) -> Diagnostic {
    Diagnostic::UnknownActor {
        node_id: node_id.to_string(),
        action: action.to_string(),
    }
}
