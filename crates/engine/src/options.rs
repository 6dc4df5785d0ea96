// ABOUTME: Configuration options for the NeuroFlow engine and the EngineBuilder fluent API.
// ABOUTME: Options deserialize from JSON with every field optional so config files can be partial.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dispatch::Dispatcher;
use crate::error::{EngineError, Result};

/// Tunables shared by the segmenter, the extractor and the reader view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Class carried by every emphasis element the segmenter creates.
    pub marker_class: String,
    /// Tag name of the emphasis element.
    pub emphasis_tag: String,
    /// Candidates with less rendered text than this are ignored.
    pub min_candidate_text: usize,
    /// A candidate whose text length per link falls below this is link-dense.
    pub link_density_ratio: f64,
    /// Subtracted from the score of link-dense candidates.
    pub link_density_penalty: f64,
    pub font_size: u32,
    pub font_step: u32,
    pub font_min: u32,
    pub font_max: u32,
    /// Trailing-edge debounce delay for typing assist, in milliseconds.
    pub typing_debounce_ms: u64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            marker_class: "nf-bionic".to_string(),
            emphasis_tag: "b".to_string(),
            min_candidate_text: 200,
            link_density_ratio: 50.0,
            link_density_penalty: 50.0,
            font_size: 18,
            font_step: 2,
            font_min: 12,
            font_max: 32,
            typing_debounce_ms: 500,
        }
    }
}

impl Options {
    /// Parse options from a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let opts: Options = serde_json::from_str(json)
            .map_err(|e| EngineError::config("options", Some(e.into())))?;
        opts.validate()?;
        Ok(opts)
    }

    /// Reject combinations the engine cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.marker_class.trim().is_empty() || self.marker_class.contains(char::is_whitespace) {
            return fail("marker_class must be a single non-empty class name");
        }
        if self.emphasis_tag.is_empty() || !self.emphasis_tag.chars().all(|c| c.is_ascii_alphanumeric()) {
            return fail("emphasis_tag must be a plain tag name");
        }
        if self.font_step == 0 {
            return fail("font_step must be greater than zero");
        }
        if self.font_min > self.font_max {
            return fail("font_min must not exceed font_max");
        }
        if self.font_size < self.font_min || self.font_size > self.font_max {
            return fail("font_size must lie within font_min..=font_max");
        }
        if !(self.link_density_ratio > 0.0) {
            return fail("link_density_ratio must be positive");
        }
        Ok(())
    }

    /// The typing assist debounce delay as a Duration.
    pub fn typing_debounce(&self) -> Duration {
        Duration::from_millis(self.typing_debounce_ms)
    }
}

fn fail(msg: &str) -> Result<()> {
    Err(EngineError::config("options", Some(anyhow::anyhow!(msg.to_string()))))
}

/// Builder for constructing Dispatcher instances with custom configuration.
#[derive(Debug, Clone)]
pub struct EngineBuilder {
    opts: Options,
}

impl EngineBuilder {
    /// Create a new EngineBuilder with default options.
    pub fn new() -> Self {
        Self {
            opts: Options::default(),
        }
    }

    /// Start from an existing set of options.
    pub fn options(mut self, opts: Options) -> Self {
        self.opts = opts;
        self
    }

    /// Set the marker class used to find emphasis elements again.
    pub fn marker_class(mut self, class: impl Into<String>) -> Self {
        self.opts.marker_class = class.into();
        self
    }

    /// Set the emphasis element tag.
    pub fn emphasis_tag(mut self, tag: impl Into<String>) -> Self {
        self.opts.emphasis_tag = tag.into();
        self
    }

    /// Set the minimum rendered text length for content candidates.
    pub fn min_candidate_text(mut self, len: usize) -> Self {
        self.opts.min_candidate_text = len;
        self
    }

    /// Set the reader font size bounds and default.
    pub fn font(mut self, default: u32, step: u32, min: u32, max: u32) -> Self {
        self.opts.font_size = default;
        self.opts.font_step = step;
        self.opts.font_min = min;
        self.opts.font_max = max;
        self
    }

    /// Set the typing assist debounce delay.
    pub fn typing_debounce(mut self, delay: Duration) -> Self {
        self.opts.typing_debounce_ms = delay.as_millis() as u64;
        self
    }

    /// Validate the options and build a Dispatcher for one page context.
    pub fn build(self) -> Result<Dispatcher> {
        self.opts.validate()?;
        Ok(Dispatcher::new(self.opts))
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let opts = Options::from_json(r#"{"font_size": 20, "marker_class": "hl"}"#).unwrap();
        assert_eq!(opts.font_size, 20);
        assert_eq!(opts.marker_class, "hl");
        assert_eq!(opts.min_candidate_text, 200);
        assert_eq!(opts.emphasis_tag, "b");
    }

    #[test]
    fn rejects_font_outside_bounds() {
        let err = Options::from_json(r#"{"font_size": 40}"#).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn rejects_malformed_json() {
        let err = Options::from_json("{not json").unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn builder_validates() {
        assert!(EngineBuilder::new().font(18, 0, 12, 32).build().is_err());
        assert!(EngineBuilder::new().marker_class("two words").build().is_err());
        assert!(EngineBuilder::new().marker_class("hl").build().is_ok());
    }
}
