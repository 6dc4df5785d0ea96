// ABOUTME: Main content detection: article shortcut, candidate scoring and link-density penalty.
// ABOUTME: Scoring only reads the tree; the winner is returned as a live handle into the page.

use dom_query::{Document, NodeRef};
use tracing::debug;

use super::{char_len, is_tag, is_visible, rendered_text, tag_name};
use crate::options::Options;

/// Tags enumerated as main-content candidates.
const CANDIDATE_TAGS: &[&str] = &["div", "section", "main", "td"];

const PARAGRAPH_WEIGHT: f64 = 10.0;
const LENGTH_WEIGHT: f64 = 5.0;
const COMMA_WEIGHT: f64 = 3.0;

/// A scored candidate region. Built fresh on every detection run.
#[derive(Clone)]
pub struct CandidateRegion<'a> {
    pub node: NodeRef<'a>,
    pub paragraph_count: usize,
    pub text_len: usize,
    pub comma_count: usize,
    pub link_count: usize,
    pub score: f64,
}

impl CandidateRegion<'_> {
    /// Text characters per link; infinite when the region has no links.
    pub fn link_density(&self) -> f64 {
        if self.link_count == 0 {
            f64::INFINITY
        } else {
            self.text_len as f64 / self.link_count as f64
        }
    }
}

/// How the main content region was chosen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DetectionSource {
    /// A semantic `<article>` element short-circuited scoring.
    Article,
    /// The highest scoring candidate.
    Scored(f64),
    /// No candidate qualified.
    BodyFallback,
}

/// Result of a detection run.
#[derive(Clone)]
pub struct Detection<'a> {
    pub node: NodeRef<'a>,
    pub source: DetectionSource,
}

/// Count commas in text.
fn score_commas(text: &str) -> usize {
    text.matches(',').count()
}

fn count_descendant_tags(node: &NodeRef, tag: &str) -> usize {
    node.descendants().iter().filter(|d| is_tag(d, tag)).count()
}

/// Score a single element, or `None` when it is invisible or too small to
/// hold main content.
pub fn score_candidate<'a>(node: &NodeRef<'a>, opts: &Options) -> Option<CandidateRegion<'a>> {
    if !is_visible(node) {
        return None;
    }

    let text = rendered_text(node);
    let text_len = char_len(&text);
    if text_len < opts.min_candidate_text {
        return None;
    }

    let paragraph_count = count_descendant_tags(node, "p");
    let link_count = count_descendant_tags(node, "a");
    let comma_count = score_commas(&text);

    let mut score = PARAGRAPH_WEIGHT * paragraph_count as f64
        + LENGTH_WEIGHT * (text_len as f64).ln()
        + COMMA_WEIGHT * comma_count as f64;

    if link_count > 0 && (text_len as f64 / link_count as f64) < opts.link_density_ratio {
        score -= opts.link_density_penalty;
    }

    Some(CandidateRegion {
        node: node.clone(),
        paragraph_count,
        text_len,
        comma_count,
        link_count,
        score,
    })
}

/// Enumerate and score every candidate in document order.
pub fn score_candidates<'a>(doc: &'a Document, opts: &Options) -> Vec<CandidateRegion<'a>> {
    doc.root()
        .descendants()
        .iter()
        .filter(|n| {
            tag_name(n)
                .map(|t| CANDIDATE_TAGS.contains(&t.as_str()))
                .unwrap_or(false)
        })
        .filter_map(|n| score_candidate(n, opts))
        .collect()
}

/// Find the element most likely to hold the page's readable content.
///
/// The first `<article>` wins outright. Otherwise the strictly highest
/// scoring candidate wins, so ties keep the earlier one. With no qualifying
/// candidate the body is returned.
pub fn detect_main_content<'a>(doc: &'a Document, opts: &Options) -> Detection<'a> {
    if let Some(article) = doc.select("article").nodes().first() {
        return Detection {
            node: article.clone(),
            source: DetectionSource::Article,
        };
    }

    let mut best: Option<CandidateRegion<'a>> = None;
    for candidate in score_candidates(doc, opts) {
        let better = match &best {
            Some(current) => candidate.score > current.score,
            None => true,
        };
        if better {
            best = Some(candidate);
        }
    }

    match best {
        Some(winner) => {
            debug!(
                score = winner.score,
                paragraphs = winner.paragraph_count,
                text_len = winner.text_len,
                links = winner.link_count,
                "main content candidate selected"
            );
            Detection {
                node: winner.node,
                source: DetectionSource::Scored(winner.score),
            }
        }
        None => {
            debug!("no content candidate qualified; falling back to body");
            let body = doc
                .select("body")
                .nodes()
                .first()
                .cloned()
                .unwrap_or_else(|| doc.root());
            Detection {
                node: body,
                source: DetectionSource::BodyFallback,
            }
        }
    }
}
