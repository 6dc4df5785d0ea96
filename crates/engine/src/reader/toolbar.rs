// ABOUTME: Reader view toolbar actions and overlay markup.
// ABOUTME: Each toolbar button carries the wire name of the ReaderAction it triggers.

use std::fmt;

use crate::dom::escape_text;

/// Actions the reader toolbar (or the keyboard) can trigger while open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderAction {
    IncreaseFont,
    DecreaseFont,
    ToggleTheme,
    ToggleWidth,
    ToggleDyslexia,
    Close,
    /// ESC-equivalent; behaves like Close.
    Escape,
}

impl ReaderAction {
    /// Actions that get a toolbar button, in display order.
    pub const TOOLBAR: [ReaderAction; 6] = [
        ReaderAction::DecreaseFont,
        ReaderAction::IncreaseFont,
        ReaderAction::ToggleTheme,
        ReaderAction::ToggleWidth,
        ReaderAction::ToggleDyslexia,
        ReaderAction::Close,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReaderAction::IncreaseFont => "font-increase",
            ReaderAction::DecreaseFont => "font-decrease",
            ReaderAction::ToggleTheme => "theme",
            ReaderAction::ToggleWidth => "width",
            ReaderAction::ToggleDyslexia => "dyslexia",
            ReaderAction::Close => "close",
            ReaderAction::Escape => "escape",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "font-increase" | "font+" => Some(ReaderAction::IncreaseFont),
            "font-decrease" | "font-" => Some(ReaderAction::DecreaseFont),
            "theme" => Some(ReaderAction::ToggleTheme),
            "width" => Some(ReaderAction::ToggleWidth),
            "dyslexia" => Some(ReaderAction::ToggleDyslexia),
            "close" => Some(ReaderAction::Close),
            "escape" | "esc" => Some(ReaderAction::Escape),
            _ => None,
        }
    }

    fn label(&self) -> (&'static str, &'static str) {
        match self {
            ReaderAction::IncreaseFont => ("A+", "Increase font size"),
            ReaderAction::DecreaseFont => ("A-", "Decrease font size"),
            ReaderAction::ToggleTheme => ("Theme", "Toggle dark mode"),
            ReaderAction::ToggleWidth => ("Width", "Toggle wide layout"),
            ReaderAction::ToggleDyslexia => ("Dyslexia", "Toggle dyslexia-friendly font"),
            ReaderAction::Close | ReaderAction::Escape => ("Close", "Close reader view"),
        }
    }
}

impl fmt::Display for ReaderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Markup for the overlay shell around already-sanitized content.
pub(crate) fn overlay_markup(id: &str, classes: &str, content_html: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        r#"<div id="{}" class="{}" role="dialog" aria-modal="true" aria-label="Reader view">"#,
        id, classes
    ));
    out.push_str(r#"<div class="nf-reader-toolbar" role="toolbar">"#);
    for action in ReaderAction::TOOLBAR {
        let (text, aria) = action.label();
        out.push_str(&format!(
            r#"<button type="button" data-nf-action="{}" aria-label="{}">{}</button>"#,
            action.as_str(),
            escape_text(aria),
            escape_text(text)
        ));
    }
    out.push_str("</div>");
    out.push_str(r#"<div class="nf-reader-content">"#);
    out.push_str(content_html);
    out.push_str("</div></div>");
    out
}
