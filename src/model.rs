use chrono::NaiveDate;
use itertools::Itertools;

use crate::color::Color;
use crate::dates::{markdown_date, roam_date};

/// One highlighted passage. Every view below is derived from the stored fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlight {
    pub book: String,
    pub text: String,
    pub note: String,
    pub link: String,
    pub page: String,
    pub date: NaiveDate,
    pub color: Color,
}

/// A block and its nested children, as pushed to the notes graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockNode {
    pub string: String,
    pub children: Vec<BlockNode>,
}

impl BlockNode {
    pub fn leaf(string: impl Into<String>) -> Self {
        BlockNode {
            string: string.into(),
            children: Vec::new(),
        }
    }
}

impl Highlight {
    pub fn has_note(&self) -> bool {
        !self.note.is_empty()
    }

    pub fn source_label(&self) -> String {
        format!("{}: {}", self.book, self.page)
    }

    pub fn markdown_link(&self) -> String {
        format!("[{}]({})", self.source_label(), self.link)
    }

    pub fn color_attribute(&self) -> String {
        format!("color::#{}", self.color)
    }

    pub fn enhanced_color_attribute(&self) -> String {
        format!("color:: {}", self.color)
    }

    pub fn date_attribute(&self) -> String {
        format!("date::[[{}]]", roam_date(self.date))
    }

    pub fn enhanced_date_attribute(&self) -> String {
        format!("date:: {}", markdown_date(self.date))
    }

    pub fn block_hierarchy(&self) -> BlockNode {
        let mut children = Vec::with_capacity(4);
        if self.has_note() {
            children.push(BlockNode::leaf(&self.note));
        }
        children.push(BlockNode::leaf(self.markdown_link()));
        children.push(BlockNode::leaf(self.date_attribute()));
        children.push(BlockNode::leaf(self.color_attribute()));

        BlockNode {
            string: self.text.clone(),
            children,
        }
    }

    pub fn roam_markdown(&self) -> String {
        [
            Some(format!(" - {}", self.text)),
            self.has_note().then(|| format!("   - {}", self.note)),
            Some(format!("   - {}", self.markdown_link())),
            Some(format!("   - {}", self.date_attribute())),
            Some(format!("   - {}", self.color_attribute())),
        ]
        .into_iter()
        .flatten()
        .join("\n")
    }

    /// Callout block. With `custom_css` the callout type carries the color and
    /// the header line carries the link.
    pub fn enhanced_markdown(&self, custom_css: bool) -> String {
        let first_line = if custom_css {
            format!("> [!{}-highlight] {}", self.color, self.markdown_link())
        } else if self.has_note() {
            "> [!note]".to_string()
        } else {
            "> [!quote]".to_string()
        };

        [
            Some(first_line),
            Some(format!("> text:: {}", self.text)),
            self.has_note().then(|| format!("> - note:: {}", self.note)),
            (!custom_css).then(|| format!("> - {}", self.markdown_link())),
            Some(format!("> - {}", self.enhanced_date_attribute())),
            (!custom_css).then(|| format!("> - {}", self.enhanced_color_attribute())),
            Some(String::new()),
        ]
        .into_iter()
        .flatten()
        .join("\n")
    }

    pub fn link_html(&self) -> String {
        format!(
            "<a href=\"{}\">{}</a>",
            escape_html(&self.link, true),
            escape_html(&self.source_label(), false)
        )
    }

    /// `[text, note, link html, YYYY-MM-DD, color]`
    pub fn csv_row(&self) -> [String; 5] {
        [
            self.text.clone(),
            self.note.clone(),
            self.link_html(),
            self.date.format("%Y-%m-%d").to_string(),
            self.color.name().to_string(),
        ]
    }
}

fn escape_html(s: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}
