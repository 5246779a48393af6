use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use super::{Block, GraphClient, Page};
use crate::error::RoamError;
use crate::model::{BlockNode, Highlight};

pub const DEFAULT_HEADER: &str = "#highlights";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    pub page_uid: String,
    pub header_uid: String,
    pub appended: usize,
}

/// Writes a book's highlights under a header block on the book's page.
pub struct RoamSaver<C> {
    client: C,
    header: String,
}

impl<C: GraphClient> RoamSaver<C> {
    pub fn new(client: C, header: impl Into<String>) -> Self {
        RoamSaver {
            client,
            header: header.into(),
        }
    }

    #[cfg(test)]
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Appends stop at the first failure; blocks already written stay.
    pub fn save(&self, book: &str, highlights: &[Highlight]) -> Result<SaveReport> {
        let page = self.create_book_page(book)?;
        let header = self.create_header_block(&page)?;
        info!("Appending {} highlights under {:?} on page {:?}", highlights.len(), header.string, page.title);

        let pb = ProgressBar::new(highlights.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40} {pos}/{len} blocks")?
                .progress_chars("=> "),
        );

        // The API inserts at the top, so push newest first to end up oldest first.
        for (i, h) in highlights.iter().enumerate().rev() {
            self.client
                .create_block(&header.uid, &h.block_hierarchy())
                .with_context(|| format!("Failed to append highlight {} of {}", i + 1, highlights.len()))?;
            pb.inc(1);
        }
        pb.finish_and_clear();

        let report = SaveReport {
            page_uid: page.uid,
            header_uid: header.uid,
            appended: highlights.len(),
        };
        info!(?report, "Saved {} highlights to {:?}", report.appended, book);
        Ok(report)
    }

    fn create_book_page(&self, book: &str) -> Result<Page> {
        match self.client.create_page(book) {
            Ok(page) => Ok(page),
            Err(e @ RoamError::ObjectExists { .. }) => {
                info!("{}, reusing it", e);
                self.client
                    .get_page_by_title(book)
                    .with_context(|| format!("Failed to fetch existing page {:?}", book))
            }
            Err(e) => Err(e).with_context(|| format!("Failed to create page {:?}", book)),
        }
    }

    fn create_header_block(&self, page: &Page) -> Result<Block> {
        let existing = self
            .client
            .get_children_by_string(&page.uid, &self.header)
            .context("Failed to look up header block")?;

        if let Some(block) = existing.into_iter().next() {
            return Ok(block);
        }

        self.client
            .create_block(&page.uid, &BlockNode::leaf(&self.header))
            .context("Failed to create header block")
    }
}
