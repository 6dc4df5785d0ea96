// ABOUTME: Typing assist: trailing-edge debounce of editor input and ghost suggestion handling.
// ABOUTME: Time is passed in explicitly so the coalescing policy is deterministic.

use std::time::{Duration, Instant};

/// Inputs this short are never sent for analysis.
const MIN_ANALYZE_CHARS: usize = 4;

/// Coalesces bursts of input into one analysis request and holds the
/// suggestion shown as ghost text.
#[derive(Debug, Clone)]
pub struct TypingAssist {
    delay: Duration,
    pending: Option<(String, Instant)>,
    ghost: Option<String>,
}

impl TypingAssist {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
            ghost: None,
        }
    }

    /// Record new input. Any shown suggestion is stale and cleared, and the
    /// deadline restarts.
    pub fn on_input(&mut self, text: impl Into<String>, now: Instant) {
        self.ghost = None;
        self.pending = Some((text.into(), now + self.delay));
    }

    /// Emit the text to analyze once the input has been quiet for the delay.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        let due = matches!(&self.pending, Some((_, deadline)) if now >= *deadline);
        if !due {
            return None;
        }
        let (text, _) = self.pending.take()?;
        if text.chars().count() < MIN_ANALYZE_CHARS {
            return None;
        }
        Some(text)
    }

    /// When the next request would fire, if any input is pending.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, d)| *d)
    }

    /// Show a suggestion; empty values are ignored.
    pub fn on_suggestion(&mut self, value: &str) {
        if !value.is_empty() {
            self.ghost = Some(value.to_string());
        }
    }

    pub fn ghost(&self) -> Option<&str> {
        self.ghost.as_deref()
    }

    /// Tab-equivalent: take the suggestion as the new input value.
    pub fn accept(&mut self) -> Option<String> {
        self.ghost.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(500);

    #[test]
    fn test_trailing_edge_coalesces_bursts() {
        let t0 = Instant::now();
        let mut assist = TypingAssist::new(DELAY);
        assist.on_input("hel", t0);
        assist.on_input("hell", t0 + Duration::from_millis(200));
        assist.on_input("hello", t0 + Duration::from_millis(400));

        assert_eq!(assist.poll(t0 + Duration::from_millis(800)), None);
        assert_eq!(
            assist.poll(t0 + Duration::from_millis(900)),
            Some("hello".to_string())
        );
        assert_eq!(assist.poll(t0 + Duration::from_millis(2000)), None);
    }

    #[test]
    fn test_short_input_is_dropped() {
        let t0 = Instant::now();
        let mut assist = TypingAssist::new(DELAY);
        assist.on_input("abc", t0);
        assert_eq!(assist.poll(t0 + DELAY), None);
        assert!(assist.deadline().is_none());
    }

    #[test]
    fn test_ghost_lifecycle() {
        let t0 = Instant::now();
        let mut assist = TypingAssist::new(DELAY);
        assert_eq!(assist.accept(), None);

        assist.on_suggestion("");
        assert_eq!(assist.ghost(), None);

        assist.on_suggestion("their house");
        assert_eq!(assist.ghost(), Some("their house"));

        assist.on_input("thier", t0);
        assert_eq!(assist.ghost(), None);

        assist.on_suggestion("their");
        assert_eq!(assist.accept(), Some("their".to_string()));
        assert_eq!(assist.ghost(), None);
    }
}
