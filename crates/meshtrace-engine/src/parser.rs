//! Log grammar: raw simulation log text to per-line event ticks.
//!
//! Classification comes first: a line is a tick if and only if it carries
//! the `[sim]` marker. Rule matching happens second, so an unrecognized
//! marker line still consumes a tick with no event. The scrubber relies on
//! this 1:1 alignment between ticks and displayed log lines.
//!
//! Routing-table lines carry a secondary `[routing table]` marker on top
//! of `[sim]`; both families count as marker lines.

use crate::event::TopologyEvent;

/// Marker carried by every simulation log line the engine considers.
pub const SIM_MARKER: &str = "[sim]";

/// Secondary marker carried by routing-table lines.
pub const ROUTING_MARKER: &str = "[routing table]";

/// One marker line of the log and the events it yielded.
///
/// A line may match several rules; `events` holds all matches in rule
/// order. An unrecognized marker line yields an empty list.
#[derive(Debug, Clone, PartialEq)]
pub struct LogTick {
    pub source_line: String,
    pub events: Vec<TopologyEvent>,
}

/// Parse the full log text into an ordered tick sequence.
///
/// Lines without the `[sim]` marker are skipped entirely and consume no
/// index.
pub fn parse_log(text: &str) -> Vec<LogTick> {
    text.lines()
        .filter(|line| line.contains(SIM_MARKER))
        .map(parse_marker_line)
        .collect()
}

fn parse_marker_line(line: &str) -> LogTick {
    let mut events = Vec::new();

    if let Some(event) = match_node_created(line) {
        events.push(event);
    }
    if let Some(scope) = after(line, ROUTING_MARKER) {
        if let Some(event) = match_direct_neighbor(scope) {
            events.push(event);
        }
        if let Some(event) = match_updated_route(scope) {
            events.push(event);
        }
    }
    if let Some(event) = match_node_leaving(line) {
        events.push(event);
    }

    LogTick {
        source_line: line.to_string(),
        events,
    }
}

/// `[sim] Created new node ID: <id>, x: <x>, y: <y>`
fn match_node_created(line: &str) -> Option<TopologyEvent> {
    let rest = after(line, SIM_MARKER)?
        .trim_start()
        .strip_prefix("Created new node ID:")?;
    let (id, rest) = rest.split_once(',')?;
    let id = id.trim();
    if id.is_empty() {
        return None;
    }
    let rest = rest.trim_start().strip_prefix("x:")?;
    let (x, rest) = rest.split_once(',')?;
    let rest = rest.trim_start().strip_prefix("y:")?;
    let x: f64 = x.trim().parse().ok()?;
    let y: f64 = leading_number(rest)?.parse().ok()?;

    Some(TopologyEvent::NodeJoined {
        id: id.to_string(),
        x,
        y,
        // The log grammar has no virtuality capture; only the live wire
        // reports virtual nodes.
        is_virtual: false,
    })
}

/// `… Node <id> (router) -> direct neighbor: <neighbor>`
fn match_direct_neighbor(scope: &str) -> Option<TopologyEvent> {
    let (id, tail) = router_clause(scope)?;
    let neighbor = tail
        .strip_prefix("direct neighbor:")?
        .split_whitespace()
        .next()?;

    Some(TopologyEvent::RouteUpserted {
        node_id: id.to_string(),
        dest_id: neighbor.to_string(),
        hop_count: Some(1),
        // A direct neighbor is its own next hop.
        via: Some(neighbor.to_string()),
    })
}

/// `… Node <id> (router) -> updated route to <dest> via <via> (hop count <n>)`
fn match_updated_route(scope: &str) -> Option<TopologyEvent> {
    let (id, tail) = router_clause(scope)?;
    let tail = tail.strip_prefix("updated route to")?;

    let mut words = tail.split_whitespace();
    let dest = words.next()?;
    if words.next()? != "via" {
        return None;
    }
    let via = words.next()?;

    let hops = after(tail, "(hop count")?;
    let (hops, _) = hops.split_once(')')?;
    let hop_count: u32 = hops.trim().parse().ok()?;

    Some(TopologyEvent::RouteUpserted {
        node_id: id.to_string(),
        dest_id: dest.to_string(),
        hop_count: Some(hop_count),
        via: Some(via.to_string()),
    })
}

/// `[sim] Node <id>: leaving network.`
fn match_node_leaving(line: &str) -> Option<TopologyEvent> {
    let rest = after(line, SIM_MARKER)?.trim_start().strip_prefix("Node")?;
    let (id, rest) = rest.trim_start().split_once(':')?;
    if id.is_empty() || !id.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
        return None;
    }
    rest.trim_start().strip_prefix("leaving network.")?;

    Some(TopologyEvent::NodeLeft { id: id.to_string() })
}

/// Match `Node <id> (router) ->` and return the id plus the clause tail.
fn router_clause(scope: &str) -> Option<(&str, &str)> {
    let (head, rest) = scope.split_once("(router)")?;
    let mut head_words = head.split_whitespace().rev();
    let id = head_words.next()?;
    if head_words.next()? != "Node" {
        return None;
    }
    let tail = rest.trim_start().strip_prefix("->")?;
    Some((id, tail.trim_start()))
}

/// The remainder of `text` after the first occurrence of `pat`.
fn after<'a>(text: &'a str, pat: &str) -> Option<&'a str> {
    text.find(pat).map(|at| &text[at + pat.len()..])
}

/// Leading signed-decimal run of `text`, after trimming whitespace.
fn leading_number(text: &str) -> Option<&str> {
    let text = text.trim_start();
    let end = text
        .find(|c: char| !c.is_ascii_digit() && c != '.' && c != '-')
        .unwrap_or(text.len());
    if end == 0 {
        None
    } else {
        Some(&text[..end])
    }
}
