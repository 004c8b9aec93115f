use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a node within one graph.
///
/// Ids are caller-visible integers (they end up in saved blobs) and are
/// ordered: the smaller id of a pair is always the canonical link source.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl NodeId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for NodeId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out fresh ids for one graph.
///
/// The counter only moves forward, and `observe` bumps it past ids that
/// arrive from outside (loaded blobs, host data), so a freshly allocated
/// id can never collide with one already in the graph. Once the counter
/// has run past `u64::MAX` allocation falls back to the smallest free id.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    /// `None` once the counter is exhausted.
    next: Option<u64>,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        Self { next: Some(1) }
    }

    /// Allocate an id for which `in_use` is false.
    pub fn allocate(&mut self, in_use: impl Fn(NodeId) -> bool) -> NodeId {
        if let Some(next) = self.next {
            self.next = next.checked_add(1);
            if !in_use(NodeId(next)) {
                return NodeId(next);
            }
        }
        // Far fewer than u64::MAX ids can be live, so this terminates.
        let mut raw = 1;
        while in_use(NodeId(raw)) {
            raw += 1;
        }
        log::debug!("id counter exhausted, reusing free id {raw}");
        NodeId(raw)
    }

    /// Record an externally assigned id so later allocations skip it.
    pub fn observe(&mut self, id: NodeId) {
        if let Some(next) = self.next
            && id.0 >= next
        {
            self.next = id.0.checked_add(1);
        }
    }

    pub fn reset(&mut self) {
        self.next = Some(1);
    }
}
