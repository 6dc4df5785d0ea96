// ABOUTME: DOM traversal and mutation helpers shared by the segmenter, extractor and overlays.
// ABOUTME: Wraps dom_query node handles with tag, visibility, text and sibling-merge utilities.

//! DOM utilities for the live page document.
//!
//! Handles returned by dom_query are cheap views into the document's node
//! arena. Nothing here caches a handle between calls; every helper re-reads
//! the tree so it stays correct after other code has mutated the page.

pub mod cleaners;
pub mod scoring;

use dom_query::NodeRef;
use once_cell::sync::Lazy;
use regex::Regex;

/// Elements whose text is never rendered as page text.
const NON_RENDERED_TAGS: &[&str] = &["script", "style", "noscript", "template", "head"];

static HIDDEN_STYLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(^|;)\s*(display\s*:\s*none|visibility\s*:\s*hidden)\s*(!important)?\s*(;|$)")
        .unwrap()
});

/// Lowercase tag name of an element node, `None` for other node kinds.
pub fn tag_name(node: &NodeRef) -> Option<String> {
    if !node.is_element() {
        return None;
    }
    node.node_name().map(|n| n.to_ascii_lowercase())
}

/// True when the node is an element with the given (lowercase) tag.
pub fn is_tag(node: &NodeRef, tag: &str) -> bool {
    tag_name(node).as_deref() == Some(tag)
}

/// True when following parents from `node` reaches the document node.
pub fn is_attached(node: &NodeRef) -> bool {
    if node.is_document() {
        return true;
    }
    let mut current = node.parent();
    while let Some(n) = current {
        if n.is_document() {
            return true;
        }
        current = n.parent();
    }
    false
}

/// True when the element's class attribute lists `class`.
pub fn has_class(node: &NodeRef, class: &str) -> bool {
    node.attr("class")
        .map(|c| c.split_whitespace().any(|c| c == class))
        .unwrap_or(false)
}

/// Static stand-in for "has a layout box": hidden attributes, inline
/// display/visibility rules and non-rendered containers on the node or any
/// ancestor make it invisible.
pub fn is_visible(node: &NodeRef) -> bool {
    let mut current = Some(node.clone());
    while let Some(n) = current {
        if n.is_element() {
            if hides_itself(&n) {
                return false;
            }
            if let Some(tag) = tag_name(&n) {
                if NON_RENDERED_TAGS.contains(&tag.as_str()) {
                    return false;
                }
            }
        }
        current = n.parent();
    }
    true
}

fn hides_itself(node: &NodeRef) -> bool {
    if node.has_attr("hidden") {
        return true;
    }
    if node
        .attr("aria-hidden")
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
    {
        return true;
    }
    node.attr("style")
        .map(|s| HIDDEN_STYLE_RE.is_match(&s))
        .unwrap_or(false)
}

/// Whitespace-collapsed text of the subtree, skipping script/style and
/// other non-rendered containers.
pub fn rendered_text(node: &NodeRef) -> String {
    let mut out = String::new();
    collect_rendered(node, &mut out);
    normalize_spaces(&out)
}

fn collect_rendered(node: &NodeRef, out: &mut String) {
    for child in node.children() {
        if child.is_text() {
            out.push_str(&child.text());
        } else if child.is_element() {
            let skip = tag_name(&child)
                .map(|t| NON_RENDERED_TAGS.contains(&t.as_str()))
                .unwrap_or(false);
            if !skip {
                // Block boundaries separate words even without whitespace.
                out.push(' ');
                collect_rendered(&child, out);
                out.push(' ');
            }
        }
    }
}

/// Normalize whitespace in text.
pub fn normalize_spaces(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Escape text for use in element content or a double-quoted attribute.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Length of a string in Unicode scalar values.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Insert `replacements` where `target` sits and detach `target`.
///
/// The caller holds the only borrow of the document for the whole call, so
/// no other code observes the tree between the inserts and the detach.
pub fn replace_with_sequence(target: &NodeRef, replacements: &[NodeRef]) {
    for node in replacements {
        target.insert_before(node);
    }
    target.remove_from_parent();
}

/// Merge runs of adjacent text children of `parent` into single text nodes
/// and drop empty ones, like the DOM's `Node.normalize()` for one level.
pub fn normalize_text_children(parent: &NodeRef) {
    let mut run: Vec<NodeRef> = Vec::new();
    for child in parent.children() {
        if child.is_text() {
            run.push(child);
            continue;
        }
        merge_run(&mut run);
    }
    merge_run(&mut run);
}

fn merge_run(run: &mut Vec<NodeRef>) {
    let nodes: Vec<NodeRef> = run.drain(..).collect();
    match nodes.len() {
        0 => {}
        1 => {
            if nodes[0].text().is_empty() {
                nodes[0].remove_from_parent();
            }
        }
        _ => {
            let merged: String = nodes.iter().map(|n| n.text().to_string()).collect();
            if !merged.is_empty() {
                let text = nodes[0].tree.new_text(merged);
                nodes[0].insert_before(&text);
            }
            for n in &nodes {
                n.remove_from_parent();
            }
        }
    }
}
