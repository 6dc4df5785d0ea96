// ABOUTME: Reader (focus) view: a single overlay holding the sanitized main content plus a toolbar.
// ABOUTME: Tracks font size, theme, width and dyslexia flags; toggles only touch classes and font-size.

//! Reader view lifecycle.
//!
//! ```text
//! closed --open--> open --close/escape--> closed
//!                   ^                       |
//!                   +--------open-----------+   (overlay reused)
//! ```
//!
//! Opening builds the overlay once: detect, clone, sanitize, insert. Later
//! opens reuse the overlay if it is still in the document. The overlay is
//! always looked up by id, never held across calls. A view that finds an
//! overlay it did not build takes its state from the overlay's classes and
//! font size.

pub mod toolbar;

use dom_query::NodeRef;
use tracing::debug;

use crate::dom::cleaners::extract_reader_region;
use crate::dom::scoring::DetectionSource;
use crate::dom::{has_class, tag_name};
use crate::options::Options;
use crate::page::Page;

pub use toolbar::ReaderAction;

pub const OVERLAY_ID: &str = "nf-reader-overlay";
const CONTENT_CLASS: &str = "nf-reader-content";
const SCROLL_LOCK_CLASS: &str = "nf-scroll-lock";

/// Block-level elements whose font size follows the reader setting.
const FONT_TARGETS: &[&str] = &[
    "p", "li", "blockquote", "h1", "h2", "h3", "h4", "h5", "h6", "dd", "dt", "figcaption", "td",
    "th", "pre",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WidthMode {
    #[default]
    Narrow,
    Wide,
}

/// What an `open` call did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OpenOutcome {
    /// The overlay was built from a fresh extraction.
    Built {
        source: DetectionSource,
        removed: usize,
    },
    /// A hidden overlay was shown again.
    Reused,
    /// The view was already open.
    AlreadyOpen,
}

/// Reader view state for one page context.
#[derive(Debug, Clone)]
pub struct ReaderView {
    opts: Options,
    visible: bool,
    font_size: u32,
    theme: Theme,
    width: WidthMode,
    dyslexia: bool,
}

impl ReaderView {
    pub fn new(opts: &Options) -> Self {
        Self {
            opts: opts.clone(),
            visible: false,
            font_size: opts.font_size,
            theme: Theme::default(),
            width: WidthMode::default(),
            dyslexia: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.visible
    }

    pub fn font_size(&self) -> u32 {
        self.font_size
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn width(&self) -> WidthMode {
        self.width
    }

    pub fn dyslexia(&self) -> bool {
        self.dyslexia
    }

    fn overlay<'a>(&self, page: &'a Page) -> Option<NodeRef<'a>> {
        page.document()
            .select(&format!("#{}", OVERLAY_ID))
            .nodes()
            .first()
            .cloned()
    }

    fn class_list(&self) -> String {
        let mut classes = vec!["nf-reader"];
        classes.push(match self.theme {
            Theme::Light => "nf-theme-light",
            Theme::Dark => "nf-theme-dark",
        });
        classes.push(match self.width {
            WidthMode::Narrow => "nf-width-narrow",
            WidthMode::Wide => "nf-width-wide",
        });
        if self.dyslexia {
            classes.push("nf-dyslexia");
        }
        classes.join(" ")
    }

    /// Take theme, width, dyslexia and font size from an overlay this view
    /// did not build. A visible overlay makes the view open.
    fn adopt(&mut self, overlay: &NodeRef) {
        if self.visible {
            return;
        }
        self.theme = if has_class(overlay, "nf-theme-dark") {
            Theme::Dark
        } else {
            Theme::Light
        };
        self.width = if has_class(overlay, "nf-width-wide") {
            WidthMode::Wide
        } else {
            WidthMode::Narrow
        };
        self.dyslexia = has_class(overlay, "nf-dyslexia");
        if let Some(size) = content_font_size(overlay) {
            self.font_size = size.clamp(self.opts.font_min, self.opts.font_max);
        }
        self.visible = !overlay.has_attr("hidden");
    }

    /// Show the reader view, building it on first use.
    pub fn open(&mut self, page: &Page) -> OpenOutcome {
        if let Some(overlay) = self.overlay(page) {
            self.adopt(&overlay);
            if self.visible && !overlay.has_attr("hidden") {
                return OpenOutcome::AlreadyOpen;
            }
            overlay.remove_attr("hidden");
            self.sync(&overlay);
            set_scroll_lock(page, true);
            self.visible = true;
            debug!("reader view reopened");
            return OpenOutcome::Reused;
        }

        let region = extract_reader_region(page.document(), &self.opts);
        let markup = toolbar::overlay_markup(OVERLAY_ID, &self.class_list(), &region.html());
        page.body().append_html(markup);

        if let Some(overlay) = self.overlay(page) {
            self.sync(&overlay);
        }
        set_scroll_lock(page, true);
        self.visible = true;
        debug!(removed = region.removed, "reader view built");
        OpenOutcome::Built {
            source: region.source,
            removed: region.removed,
        }
    }

    /// Hide the overlay and release the scroll lock. Returns false if the
    /// view was not open.
    ///
    /// A visible overlay left in the page by an earlier session counts as
    /// open, so a snapshot can be closed by a fresh view.
    pub fn close(&mut self, page: &Page) -> bool {
        let overlay = self.overlay(page);
        let shown = overlay
            .as_ref()
            .map(|o| !o.has_attr("hidden"))
            .unwrap_or(false);
        if !self.visible && !shown {
            return false;
        }
        if let Some(overlay) = overlay {
            overlay.set_attr("hidden", "");
        }
        set_scroll_lock(page, false);
        self.visible = false;
        true
    }

    /// Remove the overlay entirely; the next open rebuilds it.
    pub fn destroy(&mut self, page: &Page) {
        if let Some(overlay) = self.overlay(page) {
            overlay.remove_from_parent();
        }
        set_scroll_lock(page, false);
        self.visible = false;
    }

    /// Apply a toolbar action. Returns true when the page changed.
    pub fn apply(&mut self, page: &Page, action: ReaderAction) -> bool {
        if let Some(overlay) = self.overlay(page) {
            self.adopt(&overlay);
        }
        if !self.visible {
            return false;
        }
        match action {
            ReaderAction::Close | ReaderAction::Escape => return self.close(page),
            ReaderAction::IncreaseFont => {
                let next = (self.font_size + self.opts.font_step).min(self.opts.font_max);
                if next == self.font_size {
                    return false;
                }
                self.font_size = next;
            }
            ReaderAction::DecreaseFont => {
                let next = self
                    .font_size
                    .saturating_sub(self.opts.font_step)
                    .max(self.opts.font_min);
                if next == self.font_size {
                    return false;
                }
                self.font_size = next;
            }
            ReaderAction::ToggleTheme => {
                self.theme = match self.theme {
                    Theme::Light => Theme::Dark,
                    Theme::Dark => Theme::Light,
                };
            }
            ReaderAction::ToggleWidth => {
                self.width = match self.width {
                    WidthMode::Narrow => WidthMode::Wide,
                    WidthMode::Wide => WidthMode::Narrow,
                };
            }
            ReaderAction::ToggleDyslexia => self.dyslexia = !self.dyslexia,
        }
        match self.overlay(page) {
            Some(overlay) => {
                self.sync(&overlay);
                true
            }
            None => {
                // Someone removed the overlay underneath us.
                self.visible = false;
                false
            }
        }
    }

    fn sync(&self, overlay: &NodeRef) {
        overlay.set_attr("class", &self.class_list());
        let size = format!("font-size: {}px", self.font_size);
        let content = overlay
            .descendants()
            .into_iter()
            .find(|n| n.is_element() && has_class(n, CONTENT_CLASS));
        if let Some(content) = content {
            for node in content.descendants().iter().filter(|n| n.is_element()) {
                let is_target = tag_name(node)
                    .map(|t| FONT_TARGETS.contains(&t.as_str()))
                    .unwrap_or(false);
                if is_target {
                    node.set_attr("style", &size);
                }
            }
        }
    }
}

fn content_font_size(overlay: &NodeRef) -> Option<u32> {
    let content = overlay
        .descendants()
        .into_iter()
        .find(|n| n.is_element() && has_class(n, CONTENT_CLASS))?;
    let target = content.descendants().into_iter().find(|n| {
        tag_name(n)
            .map(|t| FONT_TARGETS.contains(&t.as_str()))
            .unwrap_or(false)
    })?;
    let style = target.attr("style")?;
    style
        .trim()
        .strip_prefix("font-size:")?
        .trim()
        .strip_suffix("px")?
        .trim()
        .parse()
        .ok()
}

fn set_scroll_lock(page: &Page, locked: bool) {
    let doc = page.document();
    for node in doc.select("html, body").nodes() {
        let mut classes: Vec<String> = node
            .attr("class")
            .map(|c| c.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        classes.retain(|c| c != SCROLL_LOCK_CLASS);
        if locked {
            classes.push(SCROLL_LOCK_CLASS.to_string());
        }
        if classes.is_empty() {
            node.remove_attr("class");
        } else {
            node.set_attr("class", &classes.join(" "));
        }
    }
}
