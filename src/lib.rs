//! Front matter and markdown parsing for blog posts.
//!
//! A post may start with a metadata block fenced by lines of `+`:
//!
//! ```text
//! +++
//! title = "Hello"
//! date = "2024-04-14"
//! tags = ["rust", "blog"]
//! +++
//!
//! # Hello
//! ```
//!
//! [`parse_markdown`] returns the extracted [`Metadata`] together with the body rendered
//! to HTML. [`parse_metadata`] only reads the block.

mod error;
mod metadata;
mod parser;
mod renderer;

pub use error::{Error, RenderError, Result};
pub use metadata::Metadata;
pub use parser::{
    parse_markdown, parse_metadata, Document, Parser, ParserOptions, DEFAULT_MAX_LINE_LENGTH,
};
pub use renderer::{MarkdownOptions, MarkdownRenderer, Render};
