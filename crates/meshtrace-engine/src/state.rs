//! Reconstructed network state: nodes, positions, routing tables.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A single routing-table entry: how a node reaches a destination.
///
/// Either field may be unknown. Absence is a valid state, not an error;
/// downstream display renders a placeholder for missing values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteEntry {
    /// Number of hops to the destination.
    pub hop_count: Option<u32>,
    /// Next-hop node id. May reference a node absent from the state
    /// (a dangling reference, tolerated by design).
    pub via: Option<String>,
}

impl RouteEntry {
    /// Entry with both fields known.
    pub fn new(hop_count: u32, via: impl Into<String>) -> Self {
        Self {
            hop_count: Some(hop_count),
            via: Some(via.into()),
        }
    }
}

/// A message delivered to a node, retained for live display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboxMessage {
    pub from: String,
    pub content: String,
}

/// One node of the reconstructed network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub is_virtual: bool,
    /// Routes keyed by destination id. Keys may name nodes that have
    /// since left the network.
    pub routing_table: BTreeMap<String, RouteEntry>,
    /// Users attached to this node. Populated in live mode only.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub connected_users: BTreeSet<String>,
    /// Messages delivered to this node, in arrival order. Live mode only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub received_messages: Vec<InboxMessage>,
}

impl NodeRecord {
    /// Record with the given position and an empty routing table.
    pub fn new(id: impl Into<String>, x: f64, y: f64, is_virtual: bool) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            is_virtual,
            routing_table: BTreeMap::new(),
            connected_users: BTreeSet::new(),
            received_messages: Vec::new(),
        }
    }

    /// Stub record for a node referenced before its creation was seen.
    ///
    /// Sits at the origin until a join or move event supplies a position.
    pub fn stub(id: impl Into<String>) -> Self {
        Self::new(id, 0.0, 0.0, false)
    }
}

/// The reconstructed network at one point in time.
///
/// Node records are held behind `Arc` so cloning a state shares them.
/// Mutation goes through [`NetworkState::get_mut`], which copies a record
/// only while it is shared with an earlier clone (`Arc::make_mut`). A
/// snapshot captured by cloning can therefore never be altered by later
/// folding, and capturing one costs O(nodes) pointer clones rather than a
/// deep copy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkState {
    nodes: HashMap<String, Arc<NodeRecord>>,
}

impl NetworkState {
    /// Empty network.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a node by id.
    pub fn get(&self, id: &str) -> Option<&NodeRecord> {
        self.nodes.get(id).map(Arc::as_ref)
    }

    /// Mutable access to a node, detaching it from shared snapshots first.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut NodeRecord> {
        self.nodes.get_mut(id).map(Arc::make_mut)
    }

    /// Insert or replace the record under its id.
    /// Returns the previous record, if any.
    pub fn insert(&mut self, record: NodeRecord) -> Option<Arc<NodeRecord>> {
        self.nodes.insert(record.id.clone(), Arc::new(record))
    }

    /// Remove a node. Routing entries in other nodes that reference the
    /// removed id are left in place.
    pub fn remove(&mut self, id: &str) -> Option<Arc<NodeRecord>> {
        self.nodes.remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over all node records, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &NodeRecord> {
        self.nodes.values().map(Arc::as_ref)
    }

    /// Iterate over all node ids, in no particular order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }
}
