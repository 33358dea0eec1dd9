//! Converts copy-pasted Slack conversation text into structured Markdown
//! conversation notes. This crate root wires together the ingest pipeline
//! (`parser`), the profile renderers (`render`), and the external-facing
//! driver (`pipeline`).

pub mod config;
pub mod error;
pub mod parser;
pub mod pipeline;
pub mod render;
pub mod types;

pub use config::FormatterSettings;
pub use error::{FormatError, FormatResult};
pub use pipeline::Formatter;
pub use types::{Message, ParseContext, Profile, Reaction, ValidationIssue};
