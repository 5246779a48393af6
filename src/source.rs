use std::fs::{self, File};
use std::io::{self, Read, Seek};
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

/// Bundled image, keyed by its path inside the export.
#[derive(Debug, Clone)]
pub struct MarkerImage {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// The HTML export plus whatever marker images ship next to it.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub html: String,
    pub images: Vec<MarkerImage>,
}

impl SourceDocument {
    /// `-` reads stdin, `*.zip` reads the archive, anything else is an HTML file
    /// with an `images/` directory beside it.
    pub fn load(path: &Path) -> Result<Self> {
        if path.as_os_str() == "-" {
            let mut html = String::new();
            io::stdin().read_to_string(&mut html).context("Failed to read HTML from stdin")?;
            warn!("reading from stdin: no marker images, colors cannot be resolved");
            return Ok(SourceDocument { html, images: Vec::new() });
        }

        let is_zip = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));
        if is_zip {
            let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
            return Self::from_zip_reader(file).with_context(|| format!("Failed to read archive {}", path.display()));
        }

        let html = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let image_dir = path.parent().unwrap_or_else(|| Path::new(".")).join("images");
        let images = read_image_dir(&image_dir)?;
        Ok(SourceDocument { html, images })
    }

    pub fn from_zip_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = zip::ZipArchive::new(reader)?;
        let mut html = None;
        let mut images = Vec::new();

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            let lower = name.to_lowercase();

            if html.is_none() && (lower.ends_with(".html") || lower.ends_with(".htm")) {
                let mut text = String::new();
                entry
                    .read_to_string(&mut text)
                    .with_context(|| format!("Failed to read {}", name))?;
                html = Some(text);
            } else if lower.contains(".png") {
                let mut bytes = Vec::new();
                entry
                    .read_to_end(&mut bytes)
                    .with_context(|| format!("Failed to read {}", name))?;
                images.push(MarkerImage { name, bytes });
            }
        }

        let Some(html) = html else {
            bail!("archive contains no .html document");
        };
        info!("Loaded archive with {} images", images.len());
        Ok(SourceDocument { html, images })
    }
}

fn read_image_dir(dir: &Path) -> Result<Vec<MarkerImage>> {
    if !dir.is_dir() {
        warn!("no images directory at {}, colors cannot be resolved", dir.display());
        return Ok(Vec::new());
    }

    let mut images = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))? {
        let path = entry?.path();
        let is_png = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
        if !is_png {
            continue;
        }
        let bytes = fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        images.push(MarkerImage {
            name: path.to_string_lossy().into_owned(),
            bytes,
        });
    }
    // read_dir order is platform-dependent
    images.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(images)
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use zip::write::FileOptions;

    use super::*;
    use crate::color::tests::png;

    #[test]
    fn loads_html_with_sibling_images() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.html"), "<html></html>").unwrap();
        fs::create_dir(dir.path().join("images")).unwrap();
        fs::write(dir.path().join("images/image2.png"), png([1, 2, 3], [1, 2, 3], 0)).unwrap();
        fs::write(dir.path().join("images/image1.png"), png([1, 2, 3], [1, 2, 3], 0)).unwrap();
        fs::write(dir.path().join("images/readme.txt"), "x").unwrap();

        let doc = SourceDocument::load(&dir.path().join("notes.html")).unwrap();
        assert_eq!(doc.html, "<html></html>");
        assert_eq!(doc.images.len(), 2);
        assert!(doc.images[0].name.ends_with("image1.png"));
    }

    #[test]
    fn missing_images_dir_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.html"), "<p>hi</p>").unwrap();
        let doc = SourceDocument::load(&dir.path().join("notes.html")).unwrap();
        assert!(doc.images.is_empty());
    }

    #[test]
    fn missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SourceDocument::load(&dir.path().join("nope.html")).unwrap_err();
        assert!(err.to_string().contains("nope.html"));
    }

    fn archive(entries: &[(&str, &[u8])]) -> Cursor<Vec<u8>> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, bytes) in entries {
            writer.start_file(*name, FileOptions::default()).unwrap();
            writer.write_all(bytes).unwrap();
        }
        let mut cursor = writer.finish().unwrap();
        cursor.set_position(0);
        cursor
    }

    #[test]
    fn reads_zip_export() {
        let image = png([38, 198, 218], [38, 198, 218], 0);
        let cursor = archive(&[
            ("Notes/Notes.html", b"<table></table>".as_slice()),
            ("Notes/images/image1.png", image.as_slice()),
        ]);

        let doc = SourceDocument::from_zip_reader(cursor).unwrap();
        assert_eq!(doc.html, "<table></table>");
        assert_eq!(doc.images.len(), 1);
        assert_eq!(doc.images[0].name, "Notes/images/image1.png");
    }

    #[test]
    fn zip_without_html_is_error() {
        let cursor = archive(&[("images/image1.png", b"x".as_slice())]);
        assert!(SourceDocument::from_zip_reader(cursor).is_err());
    }
}
