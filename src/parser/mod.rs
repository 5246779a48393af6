pub mod cells;
pub mod highlight;

use chrono::NaiveDate;
use scraper::Html;
use tracing::{info, warn};

use crate::color::ColorIndex;
use crate::error::ExtractError;
use crate::model::Highlight;

const FRAGMENT_LIMIT: usize = 200;

/// A container that looked like a highlight but failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dropped {
    pub fragment: String,
    pub reason: ExtractError,
}

/// Parse every container in document order. Spacer rows produce nothing; every
/// other container produces a highlight or the reason it was dropped.
///
/// The layout is what Play Books' Google Docs export produces: a one-cell table
/// per entry, wrapping an inner table with marker image, quote and link cells.
pub fn extract(html: &str, book: &str, colors: &ColorIndex) -> Vec<Result<Highlight, Dropped>> {
    let doc = Html::parse_document(html);

    cells::containers(&doc)
        .into_iter()
        .map(|c| {
            highlight::parse_container(&c.cells, book, colors).map_err(|reason| Dropped {
                fragment: truncate(&c.element.html(), FRAGMENT_LIMIT),
                reason,
            })
        })
        .collect()
}

/// Valid highlights dated on or after `since`, in document order. Drops are
/// logged and skipped.
pub fn find_highlights(html: &str, book: &str, colors: &ColorIndex, since: NaiveDate) -> Vec<Highlight> {
    let results = extract(html, book, colors);
    let total = results.len();

    let valid: Vec<Highlight> = results
        .into_iter()
        .filter_map(|r| match r {
            Ok(h) => Some(h),
            Err(d) => {
                warn!("Dropping highlight ({}): {}", d.reason, d.fragment);
                None
            }
        })
        .collect();
    let parsed = valid.len();

    let kept: Vec<Highlight> = valid.into_iter().filter(|h| h.date >= since).collect();
    info!(
        "Extracted {} highlights ({} dropped, {} before {})",
        kept.len(),
        total - parsed,
        parsed - kept.len(),
        since
    );
    kept
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

// ── Tests ──
