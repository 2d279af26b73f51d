use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use log::debug;
use regex::bytes::Regex;
use serde::Serialize;

static TITLE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)title\s*=\s*"((?-u:[^"])+)""#).unwrap());
static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)date\s*=\s*"((?-u:[^"])+)""#).unwrap());
// key is case-sensitive here, unlike title and date
static TAGS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"tags\s*=\s*\[((?-u:[^\]])*)\]").unwrap());
static FENCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\++$").unwrap());

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Metadata {
    pub title: String,
    pub date: DateTime<Utc>,
    pub tags: Vec<String>,

    /// `date` was taken from the clock because the document had no valid one.
    #[serde(skip_serializing)]
    pub date_is_fallback: bool,
}

impl Metadata {
    pub(crate) fn fallback(now: DateTime<Utc>) -> Self {
        Self {
            title: "".to_string(),
            date: now,
            tags: vec![],
            date_is_fallback: true,
        }
    }
}

/// A line that was too long for the scanner to accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Overflow {
    pub line: usize,
    pub length: usize,
}

/// Single pass over the leading lines of a document: collects the metadata fields
/// and records where the body begins.
#[derive(Debug, Default)]
pub(crate) struct FrontMatterScan {
    title: Option<String>,
    date: Option<DateTime<Utc>>,
    tags: Option<Vec<String>>,

    /// First byte after the closing fence line (and its newline). Equals the input
    /// length when no closing fence was found.
    pub body_offset: usize,
    pub closed: bool,
    pub overflow: Option<Overflow>,
}

impl FrontMatterScan {
    pub(crate) fn run(content: &[u8], max_line_length: usize) -> Self {
        let mut scan = Self::default();
        let mut fences = 0;

        for (idx, raw) in content.split_inclusive(|&b| b == b'\n').enumerate() {
            let without_newline = raw.strip_suffix(b"\n").unwrap_or(raw);
            if without_newline.len() > max_line_length {
                debug!(
                    "line {} is {} bytes long, stopping scan",
                    idx + 1,
                    without_newline.len()
                );
                scan.overflow = Some(Overflow {
                    line: idx + 1,
                    length: without_newline.len(),
                });
                break;
            }

            // raw length, so CRLF and indented lines keep the offset exact
            scan.body_offset += raw.len();

            let line = without_newline.trim_ascii();
            if FENCE_PATTERN.is_match(line) {
                fences += 1;
            }
            if fences > 1 {
                scan.closed = true;
                break;
            }

            scan.extract(line);
        }

        scan
    }

    fn extract(&mut self, line: &[u8]) {
        if let Some(title) = capture(&TITLE_PATTERN, line) {
            self.title = Some(title);
        }

        if let Some(date) = capture(&DATE_PATTERN, line) {
            match parse_date(&date) {
                Some(date) => self.date = Some(date),
                None => debug!("ignoring malformed date {date:?}"),
            }
        }

        if let Some(tags) = capture(&TAGS_PATTERN, line) {
            self.tags = Some(split_tags(&tags));
        }
    }

    pub(crate) fn into_metadata(self, now: impl FnOnce() -> DateTime<Utc>) -> Metadata {
        let (date, date_is_fallback) = match self.date {
            Some(date) => (date, false),
            None => (now(), true),
        };

        Metadata {
            title: self.title.unwrap_or_default(),
            date,
            tags: self.tags.unwrap_or_default(),
            date_is_fallback,
        }
    }
}

fn capture(pattern: &Regex, line: &[u8]) -> Option<String> {
    pattern
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| String::from_utf8_lossy(m.as_bytes()).into_owned())
}

fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
}

fn split_tags(inner: &str) -> Vec<String> {
    if inner.trim().is_empty() {
        return vec![];
    }

    inner
        .split(',')
        .map(|item| item.trim().trim_matches('"').to_string())
        .collect()
}
