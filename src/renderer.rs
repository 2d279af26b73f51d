use pulldown_cmark::{html, Event, Options, Parser};
use serde::Serialize;

use crate::error::RenderError;

/// Turns the markdown body of a document into HTML.
pub trait Render {
    fn render(&self, markdown: &[u8]) -> Result<String, RenderError>;
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkdownOptions {
    pub strikethrough: bool,
    pub tables: bool,
    /// Render soft line breaks as `<br />`.
    pub hard_breaks: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            strikethrough: true,
            tables: true,
            hard_breaks: false,
        }
    }
}

impl MarkdownOptions {
    fn to_cmark(self) -> Options {
        let mut options = Options::empty();
        if self.strikethrough {
            options.insert(Options::ENABLE_STRIKETHROUGH);
        }
        if self.tables {
            options.insert(Options::ENABLE_TABLES);
        }
        options
    }
}

/// CommonMark renderer backed by pulldown-cmark.
#[derive(Debug, Clone, Default)]
pub struct MarkdownRenderer {
    options: MarkdownOptions,
}

impl MarkdownRenderer {
    pub fn new(options: MarkdownOptions) -> Self {
        Self { options }
    }
}

impl Render for MarkdownRenderer {
    fn render(&self, markdown: &[u8]) -> Result<String, RenderError> {
        let text = String::from_utf8_lossy(markdown);
        let hard_breaks = self.options.hard_breaks;

        let parser = Parser::new_ext(&text, self.options.to_cmark()).map(|event| match event {
            Event::SoftBreak if hard_breaks => Event::HardBreak,
            _ => event,
        });

        let mut body_html = String::with_capacity(text.len() * 3 / 2);
        html::push_html(&mut body_html, parser);
        Ok(body_html)
    }
}
