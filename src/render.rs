use std::io::Write;

use anyhow::{Context, Result};
use clap::ValueEnum;
use itertools::Itertools;

use crate::model::Highlight;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Roam-style nested bullets
    Md,
    /// Callout blocks (`> [!quote]`)
    Emd,
    /// Anki-friendly rows: text, note, link, date, color
    Csv,
}

pub fn render<W: Write>(format: Format, highlights: &[Highlight], custom_css: bool, out: W) -> Result<()> {
    match format {
        Format::Md => write_markdown(highlights, out),
        Format::Emd => write_enhanced_markdown(highlights, custom_css, out),
        Format::Csv => write_csv(highlights, out),
    }
}

pub fn write_markdown<W: Write>(highlights: &[Highlight], mut out: W) -> Result<()> {
    let body = highlights.iter().map(Highlight::roam_markdown).join("\n");
    if !body.is_empty() {
        writeln!(out, "{}", body).context("Failed to write markdown")?;
    }
    Ok(())
}

pub fn write_enhanced_markdown<W: Write>(highlights: &[Highlight], custom_css: bool, mut out: W) -> Result<()> {
    // each callout already ends in a newline, so joining leaves a blank line between
    let body = highlights.iter().map(|h| h.enhanced_markdown(custom_css)).join("\n");
    out.write_all(body.as_bytes()).context("Failed to write markdown")?;
    Ok(())
}

pub fn write_csv<W: Write>(highlights: &[Highlight], out: W) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(out);
    for h in highlights {
        writer.write_record(&h.csv_row())?;
    }
    writer.flush().context("Failed to write csv")?;
    Ok(())
}
