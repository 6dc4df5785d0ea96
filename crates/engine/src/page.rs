// ABOUTME: Page snapshot loading: byte decoding with charset sniffing and dom_query parsing.
// ABOUTME: Page is the in-memory document every engine operation mutates in place.

use std::path::Path;

use dom_query::{Document, NodeRef};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{EngineError, Result};

/// How far into the byte stream a `<meta charset>` declaration is honored.
const META_SNIFF_LIMIT: usize = 1024;

static META_CHARSET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?\s*([a-z0-9_:.\-]+)"#).unwrap()
});

/// A parsed page. The document is the only mutable resource the engine touches.
pub struct Page {
    doc: Document,
}

impl Page {
    /// Parse an HTML string into a page.
    pub fn parse(html: &str) -> Self {
        Self {
            doc: Document::from(html),
        }
    }

    /// Decode raw bytes (see [`decode_page`]) and parse them.
    pub fn from_bytes(bytes: &[u8], charset_hint: Option<&str>) -> Self {
        Self::parse(&decode_page(bytes, charset_hint))
    }

    /// Read and decode a saved page.
    pub fn load(path: impl AsRef<Path>, charset_hint: Option<&str>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref()).map_err(|e| EngineError::io("load page", e))?;
        Ok(Self::from_bytes(&bytes, charset_hint))
    }

    /// The underlying document.
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// The `<body>` element, or the document root for body-less documents.
    pub fn body(&self) -> NodeRef<'_> {
        self.doc
            .select("body")
            .nodes()
            .first()
            .cloned()
            .unwrap_or_else(|| self.doc.root())
    }

    /// Serialize the whole page.
    pub fn html(&self) -> String {
        self.doc.html().to_string()
    }

    /// Text content of the body.
    pub fn text(&self) -> String {
        self.body().text().to_string()
    }
}

/// Decode page bytes to a String.
///
/// Precedence: a UTF-8 BOM, then the explicit hint (either a bare label or a
/// `text/html; charset=...` value), then a `<meta charset>` declaration near
/// the top of the document, then chardetng detection.
pub fn decode_page(bytes: &[u8], charset_hint: Option<&str>) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(rest).into_owned();
    }

    if let Some(hint) = charset_hint {
        let label = extract_charset(hint).unwrap_or_else(|| hint.trim().to_lowercase());
        if let Some(encoding) = encoding_rs::Encoding::for_label(label.as_bytes()) {
            let (decoded, _, _) = encoding.decode(bytes);
            return decoded.into_owned();
        }
    }

    if let Some(label) = sniff_meta_charset(bytes) {
        if let Some(encoding) = encoding_rs::Encoding::for_label(label.as_bytes()) {
            let (decoded, _, _) = encoding.decode(bytes);
            return decoded.into_owned();
        }
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);
    let (decoded, _, _) = encoding.decode(bytes);
    decoded.into_owned()
}

/// Extract charset value from a Content-Type style value.
fn extract_charset(content_type: &str) -> Option<String> {
    let lower = content_type.to_lowercase();
    for part in lower.split(';') {
        let trimmed = part.trim();
        if let Some(charset) = trimmed.strip_prefix("charset=") {
            let charset = charset.trim_matches('"').trim_matches('\'');
            return Some(charset.to_string());
        }
    }
    None
}

fn sniff_meta_charset(bytes: &[u8]) -> Option<String> {
    let head = &bytes[..bytes.len().min(META_SNIFF_LIMIT)];
    let head = String::from_utf8_lossy(head);
    META_CHARSET_RE
        .captures(&head)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_lowercase())
}
