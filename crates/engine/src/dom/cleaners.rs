// ABOUTME: Reader region cloning and sanitization: blocked tags, noise classes, presentation attributes.
// ABOUTME: Works on a detached fragment so the live page is never touched.

use dom_query::{Document, NodeRef};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::scoring::{detect_main_content, DetectionSource};
use super::{rendered_text, tag_name};
use crate::options::Options;

/// Attribute marking the wrapper that holds a cloned region.
const REGION_ATTR: &str = "data-nf-region";

// Elements removed together with their subtree
const BLOCKED_TAGS: &[&str] = &[
    "script", "style", "form", "button", "nav", "iframe", "svg", "noscript", "header", "footer",
];

// Class substrings marking ads, comments and other page furniture
static NOISE_CLASS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)ad|comment|promo|social|hidden|sidebar|popup|newsletter").unwrap()
});

// Presentation attributes the reader stylesheet owns
const PRESENTATION_ATTRS: &[&str] = &["style", "width", "height"];

/// A detached, sanitized copy of a page region.
pub struct SanitizedRegion {
    doc: Document,
    pub source: DetectionSource,
    pub removed: usize,
}

impl SanitizedRegion {
    fn wrapper(&self) -> Option<NodeRef<'_>> {
        self.doc
            .select(&format!("div[{}]", REGION_ATTR))
            .nodes()
            .first()
            .cloned()
    }

    /// Serialized content, ready to insert into the reader container.
    pub fn html(&self) -> String {
        self.wrapper()
            .map(|w| w.inner_html().to_string())
            .unwrap_or_default()
    }

    /// Rendered text of the region, whitespace-collapsed.
    pub fn text(&self) -> String {
        self.wrapper()
            .map(|w| rendered_text(&w))
            .unwrap_or_default()
    }
}

/// Copy a region into a new fragment document.
///
/// Only the region's children are copied, under a neutral `div` wrapper, so
/// regions whose own tag cannot stand alone in a fragment (`td`, `body`)
/// survive the round trip.
pub fn clone_region(node: &NodeRef) -> Document {
    let tag = tag_name(node).unwrap_or_default();
    let html = format!(
        r#"<div {}="{}">{}</div>"#,
        REGION_ATTR,
        tag,
        node.inner_html()
    );
    Document::fragment(html)
}

/// True when an element must be dropped from the reader copy.
pub fn is_noise(node: &NodeRef) -> bool {
    if let Some(tag) = tag_name(node) {
        if BLOCKED_TAGS.contains(&tag.as_str()) {
            return true;
        }
    }
    node.attr("class")
        .map(|c| NOISE_CLASS_RE.is_match(&c))
        .unwrap_or(false)
}

/// Sanitize a cloned region in place and wrap it.
pub fn sanitize(clone: Document, source: DetectionSource) -> SanitizedRegion {
    let mut removed = 0usize;
    {
        let root = clone
            .select(&format!("div[{}]", REGION_ATTR))
            .nodes()
            .first()
            .cloned()
            .unwrap_or_else(|| clone.root());

        // Collect first; removing while walking would skip siblings.
        let doomed: Vec<NodeRef> = root
            .descendants()
            .into_iter()
            .filter(|n| n.is_element() && is_noise(n))
            .collect();
        for node in doomed.iter().rev() {
            node.remove_from_parent();
            removed += 1;
        }

        for node in root.descendants().iter().filter(|n| n.is_element()) {
            for attr in PRESENTATION_ATTRS {
                node.remove_attr(attr);
            }
        }
    }

    SanitizedRegion {
        doc: clone,
        source,
        removed,
    }
}

/// Detect the main content of `doc`, clone it and sanitize the clone.
pub fn extract_reader_region(doc: &Document, opts: &Options) -> SanitizedRegion {
    let detection = detect_main_content(doc, opts);
    let region = sanitize(clone_region(&detection.node), detection.source);
    debug!(
        removed = region.removed,
        source = ?region.source,
        "reader region sanitized"
    );
    region
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sanitized(html: &str) -> SanitizedRegion {
        let doc = Document::from(html);
        let node = doc.select("#region").nodes().first().cloned().unwrap();
        sanitize(clone_region(&node), DetectionSource::Article)
    }

    #[test]
    fn test_blocked_tags_removed() {
        let region = sanitized(
            r#"<div id="region"><p>keep</p><script>x()</script><nav>menu</nav><footer>f</footer><svg></svg></div>"#,
        );
        let html = region.html();
        assert!(html.contains("<p>keep</p>"));
        assert!(!html.contains("script"));
        assert!(!html.contains("nav"));
        assert!(!html.contains("footer"));
        assert!(!html.contains("svg"));
        assert_eq!(region.removed, 4);
    }

    #[test]
    fn test_noise_classes_case_insensitive() {
        let region = sanitized(
            r#"<div id="region"><div class="Ad-Banner">buy</div><div class="user-COMMENTS">c</div><p class="intro">keep</p></div>"#,
        );
        let html = region.html();
        assert!(!html.contains("buy"));
        assert!(!html.contains("user-COMMENTS"));
        assert!(html.contains("keep"));
    }

    #[test]
    fn test_nested_noise_removed_once_walk_finishes() {
        let region = sanitized(
            r#"<div id="region"><div class="sidebar"><div class="promo">p</div><p>s</p></div><p>body</p></div>"#,
        );
        assert_eq!(region.html(), "<p>body</p>");
    }

    #[test]
    fn test_presentation_attributes_stripped() {
        let region = sanitized(
            r#"<div id="region"><p style="color:red" title="t">para</p><img src="a.png" width="10" height="20"></div>"#,
        );
        let html = region.html();
        assert!(!html.contains("style="));
        assert!(!html.contains("width="));
        assert!(!html.contains("height="));
        assert!(html.contains(r#"title="t""#));
        assert!(html.contains(r#"src="a.png""#));
    }

    #[test]
    fn test_live_page_untouched() {
        let doc = Document::from(
            r#"<div id="region"><p style="color:red">para</p><script>x()</script></div>"#,
        );
        let before = doc.html().to_string();
        let node = doc.select("#region").nodes().first().cloned().unwrap();
        let _ = sanitize(clone_region(&node), DetectionSource::Article);
        assert_eq!(before, doc.html().to_string());
    }

    #[test]
    fn test_table_cell_region_survives_clone() {
        let doc = Document::from(r#"<table><tr><td id="region"><p>cell text</p></td></tr></table>"#);
        let node = doc.select("#region").nodes().first().cloned().unwrap();
        let region = sanitize(clone_region(&node), DetectionSource::Scored(1.0));
        assert_eq!(region.html(), "<p>cell text</p>");
        assert_eq!(region.text(), "cell text");
    }
}
