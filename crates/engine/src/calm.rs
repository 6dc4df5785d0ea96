// ABOUTME: Calming interstitial overlay shown when the user asks for a pause.
// ABOUTME: Content comes from an optional suggestion payload; missing fields fall back to defaults.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dom::escape_text;
use crate::page::Page;

pub const CALM_OVERLAY_ID: &str = "nf-calm-overlay";

const DEFAULT_TITLE: &str = "Take a breath";
const DEFAULT_MESSAGE: &str =
    "Breathe in for four seconds, hold for four, and breathe out for six. The page will wait.";
const DEFAULT_STEPS: &[&str] = &[
    "Name five things you can see.",
    "Relax your shoulders and unclench your jaw.",
    "Pick one small next step and ignore the rest for now.",
];

/// Text shown on the interstitial. Every field may be absent in a payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalmingContent {
    pub title: Option<String>,
    pub message: Option<String>,
    pub steps: Vec<String>,
}

impl CalmingContent {
    /// Fill blank fields from the built-in defaults.
    pub fn resolved(&self) -> (String, String, Vec<String>) {
        let pick = |v: &Option<String>, default: &str| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(default)
                .to_string()
        };
        let steps: Vec<String> = self
            .steps
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let steps = if steps.is_empty() {
            DEFAULT_STEPS.iter().map(|s| s.to_string()).collect()
        } else {
            steps
        };
        (
            pick(&self.title, DEFAULT_TITLE),
            pick(&self.message, DEFAULT_MESSAGE),
            steps,
        )
    }
}

/// The single calming overlay of a page context.
#[derive(Debug, Default)]
pub struct CalmOverlay {
    shown: bool,
}

impl CalmOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_shown(&self) -> bool {
        self.shown
    }

    /// Show the overlay, replacing any overlay already in the page.
    pub fn show(&mut self, page: &Page, content: &CalmingContent) {
        remove_existing(page);
        let (title, message, steps) = content.resolved();
        let mut html = format!(
            r#"<div id="{}" class="nf-calm" role="alertdialog" aria-modal="true"><h2 class="nf-calm-title">{}</h2><p class="nf-calm-message">{}</p><ol class="nf-calm-steps">"#,
            CALM_OVERLAY_ID,
            escape_text(&title),
            escape_text(&message)
        );
        for step in &steps {
            html.push_str(&format!("<li>{}</li>", escape_text(step)));
        }
        html.push_str(r#"</ol><button type="button" data-nf-action="dismiss-calm">I'm ready</button></div>"#);
        page.body().append_html(html);
        self.shown = true;
        debug!(steps = steps.len(), "calming overlay shown");
    }

    /// Remove the overlay. Returns false when nothing was shown.
    pub fn dismiss(&mut self, page: &Page) -> bool {
        let removed = remove_existing(page);
        let was_shown = self.shown || removed;
        self.shown = false;
        was_shown
    }
}

fn remove_existing(page: &Page) -> bool {
    let existing: Vec<_> = page
        .document()
        .select(&format!("#{}", CALM_OVERLAY_ID))
        .nodes()
        .to_vec();
    for node in &existing {
        node.remove_from_parent();
    }
    !existing.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_blank_payload() {
        let content: CalmingContent = serde_json::from_str("{}").unwrap();
        let (title, message, steps) = content.resolved();
        assert_eq!(title, DEFAULT_TITLE);
        assert_eq!(message, DEFAULT_MESSAGE);
        assert_eq!(steps.len(), 3);
    }

    #[test]
    fn test_payload_fields_win() {
        let content: CalmingContent = serde_json::from_str(
            r#"{"title": "Pause", "message": "  ", "steps": ["Drink water", ""]}"#,
        )
        .unwrap();
        let (title, message, steps) = content.resolved();
        assert_eq!(title, "Pause");
        assert_eq!(message, DEFAULT_MESSAGE);
        assert_eq!(steps, vec!["Drink water".to_string()]);
    }

    #[test]
    fn test_show_is_single_instance_and_escaped() {
        let page = Page::parse("<body><p>page</p></body>");
        let mut calm = CalmOverlay::new();
        let content = CalmingContent {
            title: Some("<b>Stop</b>".to_string()),
            ..CalmingContent::default()
        };
        calm.show(&page, &content);
        calm.show(&page, &content);

        let doc = page.document();
        assert_eq!(doc.select("#nf-calm-overlay").nodes().len(), 1);
        assert_eq!(doc.select(".nf-calm-title").text().to_string(), "<b>Stop</b>");
        assert!(!doc.select(".nf-calm-title b").exists());

        assert!(calm.dismiss(&page));
        assert!(!doc.select("#nf-calm-overlay").exists());
        assert!(!calm.dismiss(&page));
    }
}
