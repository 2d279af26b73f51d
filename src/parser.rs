use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use log::debug;
use serde::Serialize;

use crate::{
    error::{Error, Result},
    metadata::{FrontMatterScan, Metadata},
    renderer::{MarkdownOptions, MarkdownRenderer, Render},
};

/// Line length accepted by the front matter scanner unless configured otherwise.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 64 * 1024;

const FENCE_BYTE: u8 = b'+';

static DEFAULT_PARSER: LazyLock<Parser> = LazyLock::new(Parser::default);

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Document {
    pub metadata: Metadata,
    pub body: String,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    pub max_line_length: usize,
    pub markdown: MarkdownOptions,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            markdown: MarkdownOptions::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Parser<R = MarkdownRenderer> {
    max_line_length: usize,
    renderer: R,
    clock: fn() -> DateTime<Utc>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new(ParserOptions::default())
    }
}

impl Parser {
    pub fn new(options: ParserOptions) -> Self {
        Self::with_renderer(options, MarkdownRenderer::new(options.markdown))
    }
}

impl<R: Render> Parser<R> {
    /// `options.markdown` is left to the caller's renderer.
    pub fn with_renderer(options: ParserOptions, renderer: R) -> Self {
        Self {
            max_line_length: options.max_line_length,
            renderer,
            clock: Utc::now,
        }
    }

    /// Replaces the source of the fallback date.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Extracts the metadata fields from the leading lines of `content`.
    ///
    /// Never fails: missing or malformed fields keep their defaults, and the date
    /// falls back to the clock.
    pub fn parse_metadata(&self, content: &[u8]) -> Metadata {
        FrontMatterScan::run(content, self.max_line_length).into_metadata(self.clock)
    }

    /// Splits `content` into metadata and body, rendering the body to HTML.
    ///
    /// Only a document starting with `+` is searched for a front matter block. The
    /// body starts at the first byte after the closing fence line's newline; without
    /// a closing fence the whole document is front matter and the body is empty.
    pub fn parse_markdown(&self, content: &[u8]) -> Result<Document> {
        let (metadata, body) = match content.first() {
            Some(&FENCE_BYTE) => {
                let scan = FrontMatterScan::run(content, self.max_line_length);
                if let Some(overflow) = scan.overflow {
                    return Err(Error::ScanFailed {
                        line: overflow.line,
                        length: overflow.length,
                        limit: self.max_line_length,
                    });
                }
                if !scan.closed {
                    debug!("front matter is never closed, treating whole document as metadata");
                }

                let offset = scan.body_offset;
                (scan.into_metadata(self.clock), &content[offset..])
            }
            _ => (Metadata::fallback((self.clock)()), content),
        };

        let body = self.renderer.render(body).map_err(Error::RenderFailed)?;

        Ok(Document { metadata, body })
    }
}

/// [`Parser::parse_metadata`] with default options.
pub fn parse_metadata(content: &[u8]) -> Metadata {
    DEFAULT_PARSER.parse_metadata(content)
}

/// [`Parser::parse_markdown`] with default options.
pub fn parse_markdown(content: &[u8]) -> Result<Document> {
    DEFAULT_PARSER.parse_markdown(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    const MD_WITH_META: &str = r#"+++
title = "markdown"
date = "2024-01-28"
tags = ["tag1","tag2"]
+++

# Hello parser
"#;

    const EXPECTED_HTML: &str = "<h1>Hello parser</h1>";

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(1999, 12, 31, 23, 59, 59).unwrap()
    }

    fn parser() -> Parser {
        Parser::default().with_clock(fixed_now)
    }

    /// Echoes its input so the sliced body can be inspected directly.
    struct Echo;

    impl Render for Echo {
        fn render(&self, markdown: &[u8]) -> std::result::Result<String, RenderError> {
            Ok(String::from_utf8_lossy(markdown).into_owned())
        }
    }

    struct Broken;

    impl Render for Broken {
        fn render(&self, _: &[u8]) -> std::result::Result<String, RenderError> {
            Err(RenderError::Other("engine fault".to_string()))
        }
    }

    fn body_of(content: &str) -> String {
        Parser::with_renderer(ParserOptions::default(), Echo)
            .parse_markdown(content.as_bytes())
            .unwrap()
            .body
    }

    #[test]
    fn markdown_with_metadata() {
        let doc = parser().parse_markdown(MD_WITH_META.as_bytes()).unwrap();
        assert_eq!(doc.body.trim(), EXPECTED_HTML);
        assert_eq!(doc.metadata.title, "markdown");
        assert_eq!(doc.metadata.date, Utc.with_ymd_and_hms(2024, 1, 28, 0, 0, 0).unwrap());
        assert_eq!(doc.metadata.tags, vec!["tag1", "tag2"]);
    }

    #[test]
    fn markdown_without_metadata() {
        let doc = parser().parse_markdown(b"# Hello parser").unwrap();
        assert_eq!(doc.body.trim(), EXPECTED_HTML);
        assert_eq!(doc.metadata, Metadata::fallback(fixed_now()));
    }

    #[test]
    fn empty_markdown() {
        let doc = parser().parse_markdown(b"").unwrap();
        assert_eq!(doc.body, "");
        assert_eq!(doc.metadata, Metadata::fallback(fixed_now()));
    }

    #[test]
    fn body_starts_after_closing_fence_newline() {
        assert_eq!(body_of("+++\ntitle = \"t\"\n+++\n\n# H\n"), "\n# H\n");
        assert_eq!(body_of("+++\ntitle = \"t\"\n+++\n# H"), "# H");
    }

    #[test]
    fn closing_fence_without_newline_leaves_empty_body() {
        assert_eq!(body_of("+++\ntitle = \"t\"\n+++"), "");
    }

    #[test]
    fn single_fence_line_gives_empty_body() {
        let doc = parser().parse_markdown(b"+++\n").unwrap();
        assert_eq!(doc.body, "");
        assert_eq!(doc.metadata, Metadata::fallback(fixed_now()));
    }

    #[test]
    fn unclosed_block_is_all_front_matter() {
        let doc = parser()
            .parse_markdown(b"+++\ntitle = \"open\"\n# Never rendered\n")
            .unwrap();
        assert_eq!(doc.body, "");
        assert_eq!(doc.metadata.title, "open");
    }

    #[test]
    fn metadata_lines_do_not_leak_into_body() {
        let doc = parser().parse_markdown(MD_WITH_META.as_bytes()).unwrap();
        for needle in ["+++", "title", "date", "tags"] {
            assert!(!doc.body.contains(needle), "{needle} leaked into {:?}", doc.body);
        }
    }

    #[test]
    fn fields_without_leading_fence_stay_in_body() {
        let content = "title = \"not meta\"\n\ntext";
        let doc = parser().parse_markdown(content.as_bytes()).unwrap();
        assert_eq!(doc.metadata.title, "");
        assert!(doc.body.contains("not meta"));
    }

    #[test]
    fn leading_plus_that_is_not_a_fence() {
        // a list item: no fence is ever counted, so everything is scanned as front matter
        let doc = parser().parse_markdown(b"+ item\n+ other\n").unwrap();
        assert_eq!(doc.body, "");
    }

    #[test]
    fn crlf_document() {
        let doc = parser()
            .parse_markdown(b"+++\r\ntitle = \"win\"\r\n+++\r\n# Hello parser\r\n")
            .unwrap();
        assert_eq!(doc.metadata.title, "win");
        assert_eq!(doc.body.trim(), EXPECTED_HTML);
    }

    #[test]
    fn invalid_date_falls_back_to_clock() {
        let doc = parser()
            .parse_markdown(b"+++\ndate = \"not-a-date\"\n+++\nbody\n")
            .unwrap();
        assert_eq!(doc.metadata.date, fixed_now());
        assert!(doc.metadata.date_is_fallback);
    }

    #[test]
    fn overlong_front_matter_line_fails_scan() {
        let options = ParserOptions {
            max_line_length: 16,
            ..Default::default()
        };
        let content = format!("+++\ntitle = \"{}\"\n+++\n", "x".repeat(32));
        let err = Parser::new(options).parse_markdown(content.as_bytes()).unwrap_err();

        match err {
            Error::ScanFailed { line, length, limit } => {
                assert_eq!(line, 2);
                assert_eq!(length, 42);
                assert_eq!(limit, 16);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn overlong_body_line_is_fine() {
        let options = ParserOptions {
            max_line_length: 16,
            ..Default::default()
        };
        let content = format!("+++\ntitle = \"t\"\n+++\n{}\n", "y".repeat(64));
        let doc = Parser::new(options).parse_markdown(content.as_bytes()).unwrap();
        assert!(doc.body.contains(&"y".repeat(64)));
    }

    #[test]
    fn renderer_failure_is_propagated() {
        let err = Parser::with_renderer(ParserOptions::default(), Broken)
            .parse_markdown(MD_WITH_META.as_bytes())
            .unwrap_err();
        assert!(matches!(err, Error::RenderFailed(RenderError::Other(_))));
    }

    #[test]
    fn invalid_utf8_body_still_renders() {
        let doc = parser().parse_markdown(b"# caf\xe9\n").unwrap();
        assert_eq!(doc.body.trim(), "<h1>caf\u{FFFD}</h1>");

        let doc = parser()
            .parse_markdown(b"+++\ntitle = \"t\"\n+++\n# caf\xe9\n")
            .unwrap();
        assert_eq!(doc.metadata.title, "t");
        assert_eq!(doc.body.trim(), "<h1>caf\u{FFFD}</h1>");
    }

    #[test]
    fn free_functions_use_defaults() {
        let meta = parse_metadata(MD_WITH_META.as_bytes());
        assert_eq!(meta.title, "markdown");

        let doc = parse_markdown(b"# Hello parser").unwrap();
        assert_eq!(doc.body.trim(), EXPECTED_HTML);
        assert!(doc.metadata.date_is_fallback);
    }
}
