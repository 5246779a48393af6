pub mod client;
pub mod saver;

pub use client::RoamClient;
pub use saver::RoamSaver;

use crate::error::RoamError;
use crate::model::BlockNode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub uid: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub uid: String,
    pub string: String,
}

/// Operations the sync needs from a notes graph.
pub trait GraphClient {
    /// Fails with [`RoamError::ObjectExists`] when the title is taken.
    fn create_page(&self, title: &str) -> Result<Page, RoamError>;

    fn get_page_by_title(&self, title: &str) -> Result<Page, RoamError>;

    /// Direct children of `parent_uid` whose text equals `string`, in order.
    fn get_children_by_string(&self, parent_uid: &str, string: &str) -> Result<Vec<Block>, RoamError>;

    /// Insert `node` and its descendants as the first child of `parent_uid`.
    fn create_block(&self, parent_uid: &str, node: &BlockNode) -> Result<Block, RoamError>;
}
