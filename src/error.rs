use thiserror::Error;

/// Failure reported by a [`Render`](crate::renderer::Render) implementation.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("{0}")]
    Other(String),
}

#[derive(Error, Debug)]
pub enum Error {
    /// A line inside the scanned front matter region exceeds the configured limit.
    #[error("scan failed: line {line} is {length} bytes long (limit {limit})")]
    ScanFailed {
        line: usize,
        length: usize,
        limit: usize,
    },

    #[error("render failed")]
    RenderFailed(#[source] RenderError),
}

pub type Result<T> = std::result::Result<T, Error>;
