// ABOUTME: Processed-node registry scoped to one reading-aid activation session.
// ABOUTME: Tracks consumed originals and emitted text nodes so re-activation is a no-op.

use std::collections::HashSet;

use dom_query::NodeId;

/// Text nodes a session has already handled.
///
/// Owned by a single `Segmenter`; nothing here is global, so independent
/// sessions (one per page context, or one per test) never share state.
#[derive(Debug, Default)]
pub struct ProcessedRegistry {
    consumed: HashSet<NodeId>,
    emitted: HashSet<NodeId>,
}

impl ProcessedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if the node was annotated or produced by an annotation.
    pub fn contains(&self, id: &NodeId) -> bool {
        self.consumed.contains(id) || self.emitted.contains(id)
    }

    /// Record an original text node that was processed.
    pub fn record_consumed(&mut self, id: NodeId) {
        self.consumed.insert(id);
    }

    /// Record a plain text node emitted as a suffix, word or separator.
    pub fn record_emitted(&mut self, id: NodeId) {
        self.emitted.insert(id);
    }

    /// Number of original text nodes processed this session.
    pub fn consumed_len(&self) -> usize {
        self.consumed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumed.is_empty() && self.emitted.is_empty()
    }

    pub fn clear(&mut self) {
        self.consumed.clear();
        self.emitted.clear();
    }
}
