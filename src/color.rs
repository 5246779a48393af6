//! Marker-image color classification.
//!
//! Play Books exports encode a highlight's color as a tiny PNG (`images/imageN.png`)
//! in the first cell of each entry. The index `N` is not stable between exports, so
//! the mapping is rebuilt per document by sampling each bundled image.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::error::ColorError;
use crate::source::MarkerImage;

static SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)$").unwrap());

pub type Rgb = [u8; 3];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Color {
    Blue,
    Red,
    Yellow,
    Green,
}

impl Color {
    pub const ALL: [Color; 4] = [Color::Blue, Color::Red, Color::Yellow, Color::Green];

    /// Reference swatch used by Play Books for this highlight color.
    pub fn reference(self) -> Rgb {
        match self {
            Color::Blue => [38, 198, 218],
            Color::Red => [255, 112, 67],
            Color::Yellow => [251, 192, 45],
            Color::Green => [139, 195, 74],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Color::Blue => "blue",
            Color::Red => "red",
            Color::Yellow => "yellow",
            Color::Green => "green",
        }
    }

    /// Case-insensitive inverse of [`Color::name`].
    pub fn from_name(name: &str) -> Option<Color> {
        let name = name.trim();
        Color::ALL.into_iter().find(|c| c.name().eq_ignore_ascii_case(name))
    }

    /// Closest palette entry by squared RGB distance, with that distance.
    pub fn nearest(rgb: Rgb) -> (Color, u32) {
        Color::ALL
            .into_iter()
            .map(|c| (c, squared_distance(c.reference(), rgb)))
            .min_by_key(|&(_, d)| d)
            .expect("palette is non-empty")
    }

    /// Exact palette match only; anti-aliased or foreign swatches are rejected.
    pub fn classify(rgb: Rgb) -> Option<Color> {
        match Color::nearest(rgb) {
            (color, 0) => Some(color),
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn squared_distance(a: Rgb, b: Rgb) -> u32 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = i32::from(x) - i32::from(y);
            (d * d) as u32
        })
        .sum()
}

/// Most frequent pixel of an encoded image. Ties go to the pixel seen first.
pub fn dominant_rgb(bytes: &[u8]) -> Result<Rgb, ColorError> {
    let img = image::load_from_memory(bytes)?.to_rgb8();

    let mut counts: HashMap<Rgb, (usize, usize)> = HashMap::new();
    for (i, px) in img.pixels().enumerate() {
        let entry = counts.entry(px.0).or_insert((0, i));
        entry.0 += 1;
    }

    counts
        .into_iter()
        .max_by_key(|&(_, (count, first))| (count, Reverse(first)))
        .map(|(rgb, _)| rgb)
        .ok_or(ColorError::EmptyImage)
}

/// Numeric suffix of a marker file name: `images/image12.png` -> 12.
pub fn marker_index(name: &str) -> Option<u32> {
    let stem = Path::new(name).file_stem()?.to_str()?;
    SUFFIX_RE.captures(stem)?.get(1)?.as_str().parse().ok()
}

/// Per-document `index -> color` table. Built once, read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorIndex {
    by_index: BTreeMap<u32, Color>,
}

impl ColorIndex {
    pub fn from_images(images: &[MarkerImage]) -> Self {
        let mut by_index = BTreeMap::new();

        for image in images {
            let Some(index) = marker_index(&image.name) else {
                debug!("skipping {}: no numeric suffix", image.name);
                continue;
            };
            let rgb = match dominant_rgb(&image.bytes) {
                Ok(rgb) => rgb,
                Err(e) => {
                    warn!("skipping {}: {}", image.name, e);
                    continue;
                }
            };
            match Color::classify(rgb) {
                Some(color) => {
                    debug!("{} -> {} (index {})", image.name, color, index);
                    by_index.insert(index, color);
                }
                None => debug!("{} dominant color {:?} matches no highlight color", image.name, rgb),
            }
        }

        ColorIndex { by_index }
    }

    pub fn get(&self, index: u32) -> Option<Color> {
        self.by_index.get(&index).copied()
    }

    /// Resolve an `<img src>` attribute through its numeric suffix.
    pub fn lookup(&self, src: &str) -> Option<Color> {
        marker_index(src).and_then(|i| self.get(i))
    }

    pub fn len(&self) -> usize {
        self.by_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_index.is_empty()
    }
}

impl FromIterator<(u32, Color)> for ColorIndex {
    fn from_iter<I: IntoIterator<Item = (u32, Color)>>(iter: I) -> Self {
        ColorIndex {
            by_index: iter.into_iter().collect(),
        }
    }
}
