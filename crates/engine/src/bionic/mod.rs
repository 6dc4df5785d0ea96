// ABOUTME: Reversible reading-aid annotator: emphasizes the first half of every word in visible text.
// ABOUTME: activate() splits eligible text nodes in place; deactivate() merges them back exactly.

//! Bionic reading transform.
//!
//! `activate` walks the text nodes under a root, skips anything that must not
//! be touched (code, form controls, editable regions, already annotated
//! output) and replaces each remaining node with a sequence of emphasis
//! elements, suffix text nodes and separators. Emphasis elements carry a
//! marker class; that class is only a lookup key. `deactivate` re-queries the
//! live document for it, so it stays correct even when the page changed in
//! between.

pub mod registry;
pub mod split;

use std::collections::HashSet;

use dom_query::{Document, NodeId, NodeRef};
use tracing::{debug, info};

use crate::dom::{
    has_class, is_attached, normalize_text_children, replace_with_sequence, tag_name,
};
use crate::error::{EngineError, Result};
use crate::options::Options;

pub use registry::ProcessedRegistry;
pub use split::{segment, split_word, Piece};

/// Elements whose text, at any depth, is never annotated.
const DISALLOWED_PARENTS: &[&str] = &[
    "script", "style", "noscript", "template", "code", "pre", "kbd", "samp", "textarea", "input",
    "select", "option", "button",
];

/// Why a text node was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    DisallowedParent,
    Editable,
    AlreadyMarked,
    Blank,
    Registered,
}

/// Failure annotating one text node. Never escapes a pass.
#[derive(Debug, thiserror::Error)]
enum NodeError {
    #[error("text node has no parent")]
    Detached,
    #[error("node is not a text node")]
    NotText,
}

/// Counts from one `activate` pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivationSummary {
    pub annotated_nodes: usize,
    pub emphasized_words: usize,
    pub skipped_nodes: usize,
    pub failed_nodes: usize,
}

/// Counts from one `deactivate` pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReversalSummary {
    pub restored: usize,
    /// Markers whose suffix sibling was missing or replaced.
    pub degraded: usize,
}

/// Applies and reverts the reading aid for one page context.
#[derive(Debug)]
pub struct Segmenter {
    marker_class: String,
    emphasis_tag: String,
    registry: ProcessedRegistry,
}

impl Segmenter {
    pub fn new(opts: &Options) -> Self {
        Self {
            marker_class: opts.marker_class.clone(),
            emphasis_tag: opts.emphasis_tag.clone(),
            registry: ProcessedRegistry::new(),
        }
    }

    pub fn marker_class(&self) -> &str {
        &self.marker_class
    }

    pub fn registry(&self) -> &ProcessedRegistry {
        &self.registry
    }

    /// True while a session has processed at least one node.
    pub fn is_active(&self) -> bool {
        !self.registry.is_empty()
    }

    /// Annotate every eligible text node under `root`.
    ///
    /// Fails only when `root` is not attached to a document. Individual nodes
    /// that cannot be processed are skipped and counted.
    pub fn activate(&mut self, root: &NodeRef) -> Result<ActivationSummary> {
        if !is_attached(root) {
            return Err(EngineError::detached("activate"));
        }

        let mut summary = ActivationSummary::default();
        let descendants = root.descendants();
        let text_nodes: Vec<NodeRef> = descendants
            .iter()
            .filter(|n| n.is_text())
            .cloned()
            .collect();

        // Parents holding markers before this pass were annotated by an
        // earlier session, possibly in another process.
        let marked_parents: HashSet<NodeId> = descendants
            .iter()
            .filter(|n| n.is_element() && has_class(n, &self.marker_class))
            .filter_map(|n| n.parent().map(|p| p.id))
            .collect();

        for node in &text_nodes {
            let reason = self.skip_reason(node).or_else(|| {
                node.parent()
                    .filter(|p| marked_parents.contains(&p.id))
                    .map(|_| SkipReason::AlreadyMarked)
            });
            if let Some(reason) = reason {
                if reason != SkipReason::Blank {
                    debug!(?reason, "text node skipped");
                }
                summary.skipped_nodes += 1;
                continue;
            }
            match self.annotate(node) {
                Ok(words) => {
                    summary.annotated_nodes += 1;
                    summary.emphasized_words += words;
                }
                Err(err) => {
                    debug!(error = %err, "text node could not be annotated");
                    summary.failed_nodes += 1;
                }
            }
        }

        info!(
            annotated = summary.annotated_nodes,
            words = summary.emphasized_words,
            skipped = summary.skipped_nodes,
            failed = summary.failed_nodes,
            "reading aid activated"
        );
        Ok(summary)
    }

    /// Decide whether a text node is left untouched.
    pub fn skip_reason(&self, node: &NodeRef) -> Option<SkipReason> {
        if self.registry.contains(&node.id) {
            return Some(SkipReason::Registered);
        }
        if node.text().trim().is_empty() {
            return Some(SkipReason::Blank);
        }
        let parent = node.parent()?;
        if in_disallowed(&parent) {
            return Some(SkipReason::DisallowedParent);
        }
        if has_class(&parent, &self.marker_class) {
            return Some(SkipReason::AlreadyMarked);
        }
        if is_editable(&parent) {
            return Some(SkipReason::Editable);
        }
        None
    }

    fn annotate(&mut self, node: &NodeRef) -> std::result::Result<usize, NodeError> {
        if !node.is_text() {
            return Err(NodeError::NotText);
        }
        if node.parent().is_none() {
            return Err(NodeError::Detached);
        }

        let text = node.text().to_string();
        let pieces = segment(&text);
        let words = pieces
            .iter()
            .filter(|p| matches!(p, Piece::Emphasis { .. }))
            .count();

        // Nothing to emphasize: keep the node, just remember it.
        if words == 0 {
            self.registry.record_consumed(node.id);
            return Ok(0);
        }

        let tree = node.tree;
        let mut replacements: Vec<NodeRef> = Vec::with_capacity(pieces.len() * 2);
        let mut emitted: Vec<NodeId> = Vec::new();
        for piece in &pieces {
            match piece {
                Piece::Emphasis { prefix, suffix } => {
                    let mark = tree.new_element(&self.emphasis_tag);
                    mark.set_attr("class", &self.marker_class);
                    mark.append_child(&tree.new_text(*prefix));
                    let rest = tree.new_text(*suffix);
                    emitted.push(rest.id);
                    replacements.push(mark);
                    replacements.push(rest);
                }
                Piece::Plain(word) => {
                    let plain = tree.new_text(*word);
                    emitted.push(plain.id);
                    replacements.push(plain);
                }
                Piece::Separator => {
                    let space = tree.new_text(" ");
                    emitted.push(space.id);
                    replacements.push(space);
                }
            }
        }

        replace_with_sequence(node, &replacements);

        self.registry.record_consumed(node.id);
        for id in emitted {
            self.registry.record_emitted(id);
        }
        Ok(words)
    }

    /// Undo every annotation currently in `doc` and end the session.
    ///
    /// Markers are looked up fresh. A marker whose next sibling is not a text
    /// node is restored from its own text alone.
    pub fn deactivate(&mut self, doc: &Document) -> ReversalSummary {
        let mut summary = ReversalSummary::default();
        let markers: Vec<NodeRef> = doc
            .root()
            .descendants()
            .into_iter()
            .filter(|n| n.is_element() && has_class(n, &self.marker_class))
            .collect();

        let mut touched: Vec<NodeRef> = Vec::new();
        let mut seen: HashSet<NodeId> = HashSet::new();

        for marker in &markers {
            let Some(parent) = marker.parent() else {
                continue;
            };
            let mut restored = marker.text().to_string();
            match marker.next_sibling() {
                Some(next) if next.is_text() => {
                    restored.push_str(&next.text());
                    next.remove_from_parent();
                }
                _ => {
                    debug!("marker lost its suffix sibling; restoring prefix only");
                    summary.degraded += 1;
                }
            }
            replace_with_sequence(marker, &[marker.tree.new_text(restored)]);
            summary.restored += 1;

            if seen.insert(parent.id) {
                touched.push(parent);
            }
        }

        for parent in &touched {
            normalize_text_children(parent);
        }

        self.registry.clear();
        if summary.restored > 0 {
            info!(
                restored = summary.restored,
                degraded = summary.degraded,
                "reading aid deactivated"
            );
        }
        summary
    }
}

fn in_disallowed(node: &NodeRef) -> bool {
    let mut current = Some(node.clone());
    while let Some(n) = current {
        let disallowed = tag_name(&n)
            .map(|t| DISALLOWED_PARENTS.contains(&t.as_str()))
            .unwrap_or(false);
        if disallowed {
            return true;
        }
        current = n.parent();
    }
    false
}

/// True when the element, or the closest ancestor that says so, is
/// content-editable.
fn is_editable(node: &NodeRef) -> bool {
    let mut current = Some(node.clone());
    while let Some(n) = current {
        if n.is_element() {
            if let Some(value) = n.attr("contenteditable") {
                let value = value.trim().to_ascii_lowercase();
                return value != "false";
            }
        }
        current = n.parent();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn body(doc: &Document) -> NodeRef<'_> {
        doc.select("body").nodes().first().cloned().unwrap()
    }

    #[test]
    fn test_activate_wraps_prefixes() {
        let doc = Document::from("<p>hello big world</p>");
        let mut seg = Segmenter::new(&Options::default());
        let summary = seg.activate(&body(&doc)).unwrap();

        assert_eq!(summary.annotated_nodes, 1);
        assert_eq!(summary.emphasized_words, 3);
        let marks: Vec<String> = doc
            .select("b.nf-bionic")
            .nodes()
            .iter()
            .map(|n| n.text().to_string())
            .collect();
        assert_eq!(marks, vec!["hel", "bi", "wor"]);
        assert_eq!(body(&doc).text().to_string(), "hello big world");
    }

    #[test]
    fn test_short_words_left_plain() {
        let doc = Document::from("<p>a I</p>");
        let mut seg = Segmenter::new(&Options::default());
        let summary = seg.activate(&body(&doc)).unwrap();
        assert_eq!(summary.emphasized_words, 0);
        assert!(doc.select("b.nf-bionic").nodes().is_empty());
        assert_eq!(doc.select("p").inner_html().to_string(), "a I");
    }

    #[test]
    fn test_detached_root_is_rejected() {
        let doc = Document::from("<div id=\"x\"><p>text here</p></div>");
        let div = doc.select("#x").nodes().first().cloned().unwrap();
        div.remove_from_parent();
        let mut seg = Segmenter::new(&Options::default());
        let err = seg.activate(&div).unwrap_err();
        assert!(err.is_detached());
    }

    #[test]
    fn test_contenteditable_false_is_eligible() {
        let doc = Document::from(
            r#"<div contenteditable="true"><span contenteditable="false">locked words</span><span>free words</span></div>"#,
        );
        let mut seg = Segmenter::new(&Options::default());
        seg.activate(&body(&doc)).unwrap();
        let marks = doc.select("b.nf-bionic").nodes().len();
        assert_eq!(marks, 2);
    }

    #[test]
    fn test_deactivate_without_suffix_sibling_degrades() {
        let doc = Document::from("<p>reading</p>");
        let mut seg = Segmenter::new(&Options::default());
        seg.activate(&body(&doc)).unwrap();

        // Another script replaces the suffix with an element.
        let mark = doc.select("b.nf-bionic").nodes().first().cloned().unwrap();
        let suffix = mark.next_sibling().unwrap();
        let intruder = doc.tree.new_element("span");
        suffix.insert_before(&intruder);
        suffix.remove_from_parent();

        let summary = seg.deactivate(&doc);
        assert_eq!(summary.restored, 1);
        assert_eq!(summary.degraded, 1);
        assert_eq!(doc.select("p").text().to_string(), "read");
    }

    #[test]
    fn test_nested_inline_under_code_is_skipped() {
        let doc = Document::from(
            r#"<pre><span class="kw">let</span> value</pre><code><span>foo bar</span></code><button><span>Submit form</span></button><p>plain words</p>"#,
        );
        let mut seg = Segmenter::new(&Options::default());
        let summary = seg.activate(&body(&doc)).unwrap();

        assert_eq!(summary.annotated_nodes, 1);
        assert_eq!(doc.select("pre").inner_html().to_string(), r#"<span class="kw">let</span> value"#);
        assert_eq!(doc.select("code").inner_html().to_string(), "<span>foo bar</span>");
        assert_eq!(doc.select("button").inner_html().to_string(), "<span>Submit form</span>");
        assert_eq!(doc.select("b.nf-bionic").nodes().len(), 2);
    }

    #[test]
    fn test_fresh_session_skips_annotated_snapshot() {
        let first = Document::from("<p>hello world</p><p>a I</p>");
        Segmenter::new(&Options::default()).activate(&body(&first)).unwrap();
        let annotated = first.html().to_string();

        let snapshot = Document::from(annotated.as_str());
        let mut seg = Segmenter::new(&Options::default());
        let summary = seg.activate(&body(&snapshot)).unwrap();

        assert_eq!(summary.emphasized_words, 0);
        assert_eq!(snapshot.html().to_string(), annotated);

        seg.deactivate(&snapshot);
        assert_eq!(snapshot.select("p").nodes()[0].text().to_string(), "hello world");
    }

    #[test]
    fn test_custom_marker_and_tag() {
        let opts = Options {
            marker_class: "hl".to_string(),
            emphasis_tag: "strong".to_string(),
            ..Options::default()
        };
        let doc = Document::from("<p>custom marker</p>");
        let mut seg = Segmenter::new(&opts);
        seg.activate(&body(&doc)).unwrap();
        assert_eq!(doc.select("strong.hl").nodes().len(), 2);
        seg.deactivate(&doc);
        assert_eq!(doc.select("p").inner_html().to_string(), "custom marker");
    }
}
