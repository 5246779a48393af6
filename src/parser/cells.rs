use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

/// Word-processor exports mark every real table cell with explicit 1x1 spans.
static CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"[rowspan="1"][colspan="1"]"#).unwrap());

/// A candidate highlight entry and the cells nested inside it.
pub struct Container<'a> {
    pub element: ElementRef<'a>,
    pub cells: Vec<ElementRef<'a>>,
}

/// Every signature cell in document order, paired with its nested signature
/// cells. Leaf and spacer cells (no nested cells) are dropped here.
pub fn containers(doc: &Html) -> Vec<Container<'_>> {
    doc.select(&CELL)
        .map(|element| Container {
            element,
            cells: element.select(&CELL).collect(),
        })
        .filter(|c| !c.cells.is_empty())
        .collect()
}
