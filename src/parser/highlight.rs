use std::sync::LazyLock;

use scraper::{ElementRef, Selector};

use crate::color::{Color, ColorIndex};
use crate::dates::parse_highlight_date;
use crate::error::ExtractError;
use crate::model::Highlight;

static IMG: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").unwrap());
static SPAN: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span").unwrap());
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// Build a highlight from a container's (marker, quote, link) cells.
pub fn parse_container(
    cells: &[ElementRef<'_>],
    book: &str,
    colors: &ColorIndex,
) -> Result<Highlight, ExtractError> {
    let [marker, quote, link] = cells else {
        return Err(ExtractError::CellCount { found: cells.len() });
    };

    let spans: Vec<String> = quote.select(&SPAN).map(text_of).collect();
    let (text, middle, date) = match spans.as_slice() {
        [text, middle @ .., date] => (text, middle, date),
        _ => return Err(ExtractError::MissingSpans { found: spans.len() }),
    };

    let text = text.trim();
    if text.is_empty() {
        return Err(ExtractError::EmptyText);
    }

    let date = parse_highlight_date(date).map_err(|_| ExtractError::BadDate {
        value: date.trim().to_string(),
    })?;

    let anchor = link.select(&ANCHOR).next().ok_or(ExtractError::MissingLink)?;
    let href = anchor.value().attr("href").ok_or(ExtractError::MissingLink)?;

    Ok(Highlight {
        book: book.to_string(),
        text: text.to_string(),
        note: note_of(middle),
        link: href.to_string(),
        page: text_of(anchor).trim().to_string(),
        date,
        color: parse_color(*marker, colors)?,
    })
}

/// The note sits between two separator spans; any other shape means no note.
fn note_of(middle: &[String]) -> String {
    match middle {
        [_, note, _] => note.trim().to_string(),
        _ => String::new(),
    }
}

fn parse_color(marker: ElementRef<'_>, colors: &ColorIndex) -> Result<Color, ExtractError> {
    let src = marker
        .select(&IMG)
        .next()
        .and_then(|img| img.value().attr("src"))
        .ok_or(ExtractError::MissingMarker)?;

    colors.lookup(src).ok_or_else(|| ExtractError::UnknownColor {
        src: src.to_string(),
    })
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect()
}
