// ABOUTME: Main library entry point for the NeuroFlow in-page transformation engine.
// ABOUTME: Re-exports the public API: Dispatcher, Command, Outcome, Page, Segmenter, ReaderView, Options, EngineError.

//! NeuroFlow engine - accessibility transforms over an HTML page.
//!
//! The engine holds the page as an in-memory document and mutates it in
//! place: a reversible bionic reading aid, a reader (focus) view built from
//! the detected main content, and a calming interstitial.
//!
//! # Example
//!
//! ```
//! use neuroflow_engine::{Command, Dispatcher, Options, Outcome, Page};
//!
//! let page = Page::parse("<body><p>Reading made easier.</p></body>");
//! let mut dispatcher = Dispatcher::new(Options::default());
//! let outcome = dispatcher.dispatch(&page, Command::SetReadingAid(true)).unwrap();
//! assert!(matches!(outcome, Outcome::Annotated(_)));
//! assert!(page.html().contains(r#"<b class="nf-bionic">Read</b>"#));
//! ```

pub mod bionic;
pub mod calm;
pub mod dispatch;
pub mod dom;
pub mod error;
pub mod options;
pub mod page;
pub mod reader;
pub mod settings;
pub mod typing;

pub use crate::bionic::{ActivationSummary, ReversalSummary, Segmenter};
pub use crate::calm::{CalmOverlay, CalmingContent};
pub use crate::dispatch::{Command, Dispatcher, Outcome};
pub use crate::dom::cleaners::{extract_reader_region, SanitizedRegion};
pub use crate::dom::scoring::{detect_main_content, DetectionSource};
pub use crate::error::{EngineError, ErrorCode, Result};
pub use crate::options::{EngineBuilder, Options};
pub use crate::page::{decode_page, Page};
pub use crate::reader::{OpenOutcome, ReaderAction, ReaderView};
pub use crate::settings::Settings;
pub use crate::typing::TypingAssist;
