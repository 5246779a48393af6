use thiserror::Error;

/// Why a single container did not produce a highlight.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("expected 3 cells (marker, quote, link), found {found}")]
    CellCount { found: usize },

    #[error("no marker image in color cell")]
    MissingMarker,

    #[error("marker image {src} does not resolve to a known color")]
    UnknownColor { src: String },

    #[error("quote cell has {found} spans, need at least text and date")]
    MissingSpans { found: usize },

    #[error("highlight text is empty")]
    EmptyText,

    #[error("unparseable date {value:?}")]
    BadDate { value: String },

    #[error("link cell has no anchor with href")]
    MissingLink,
}

#[derive(Debug, Error)]
pub enum ColorError {
    #[error("failed to decode marker image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("marker image has no pixels")]
    EmptyImage,
}

#[derive(Debug, Error)]
pub enum SinceError {
    #[error("unrecognized date {input:?} (try 2020-06-01, \"June 1, 2020\" or \"3 weeks ago\")")]
    Unrecognized { input: String },

    #[error("date {input:?} is out of range")]
    OutOfRange { input: String },
}

#[derive(Debug, Error)]
pub enum RoamError {
    #[error("page {title:?} already exists")]
    ObjectExists { title: String },

    #[error("not found: {what}")]
    NotFound { what: String },

    #[error("roam api returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Decode(String),
}
