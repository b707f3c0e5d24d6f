//! `.docx` document backend which edits the document package in place.

mod content;
mod fields;
mod numbering;
mod styles;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::core::{EmptyResult, GenericResult};
use crate::dataset::Dataset;
use crate::formats::docx::{self, Document, PartKind};
use crate::formats::docx::xml::{Element, Node};

use super::session::{DocumentBackend, DocumentSession};

use self::content::{PARAGRAPH_PROPERTIES_ORDER, Picture};
use self::numbering::HEADING_LEVELS;

const EMU_PER_PIXEL: u32 = 9525;
const MAX_IMAGE_WIDTH: u32 = 5_760_000; // 16 cm
const MAX_IMAGE_HEIGHT: u32 = 8_640_000; // 24 cm

pub struct DocxBackend;

impl DocumentBackend for DocxBackend {
    fn open(&self, path: &Path) -> GenericResult<Box<dyn DocumentSession>> {
        Ok(Box::new(DocxSession::open(path)?))
    }
}

pub struct DocxSession {
    path: PathBuf,
    document: Option<Document>,
    numbering_id: Option<u32>,
    heading_styles: HashMap<usize, String>,
}

impl DocxSession {
    pub fn open(path: &Path) -> GenericResult<DocxSession> {
        let document = Document::open(path).map_err(|e| format!(
            "Unable to open {path:?} document: {e}"))?;

        debug!("{path:?} has been opened.");

        Ok(DocxSession {
            path: path.to_owned(),
            document: Some(document),
            numbering_id: None,
            heading_styles: HashMap::new(),
        })
    }

    fn document(&mut self) -> GenericResult<&mut Document> {
        Ok(self.document.as_mut().ok_or("The document is already closed")?)
    }

    fn heading_style(&mut self, level: usize) -> GenericResult<String> {
        if let Some(style) = self.heading_styles.get(&level) {
            return Ok(style.clone());
        }

        let styles = self.document()?.related_part(PartKind::Styles)?;
        let style = styles::heading_style(styles, level);

        self.heading_styles.insert(level, style.clone());
        Ok(style)
    }
}

impl DocumentSession for DocxSession {
    fn fill_field(&mut self, title: &str, value: &str) -> GenericResult<bool> {
        let document = self.document()?;
        let mut filled = fields::fill(document.main_part()?, title, value);

        for name in document.header_footer_parts() {
            if let Some(part) = document.part(&name)? {
                filled += fields::fill(part, title, value);
            }
        }

        debug!("{title:?} field: {filled} content controls have been filled.");
        Ok(filled != 0)
    }

    fn configure_heading_numbering(&mut self) -> EmptyResult {
        let heading_styles = (1..=HEADING_LEVELS)
            .map(|level| self.heading_style(level))
            .collect::<GenericResult<Vec<_>>>()?;

        let document = self.document()?;
        let numbering_id = numbering::configure(document.related_part(PartKind::Numbering)?, &heading_styles);

        let styles = document.related_part(PartKind::Styles)?;
        for (level, style) in heading_styles.iter().enumerate() {
            styles::link_numbering(styles, style, numbering_id, level);
        }

        self.numbering_id = Some(numbering_id);
        debug!("Heading numbering has been configured (numbering #{numbering_id}).");

        Ok(())
    }

    fn append_heading(&mut self, level: usize, text: &str) -> EmptyResult {
        if level == 0 || level > HEADING_LEVELS {
            return Err!("Unsupported heading level: {}", level);
        }

        let style = self.heading_style(level)?;
        let numbering = self.numbering_id.map(|id| (id, level - 1));

        self.document()?.append(content::heading(&style, numbering, text))
    }

    fn append_text(&mut self, text: &str) -> EmptyResult {
        self.document()?.append(content::text(text))
    }

    fn append_caption(&mut self, text: &str) -> EmptyResult {
        self.document()?.append(content::caption(text))
    }

    fn append_image(&mut self, path: &Path) -> EmptyResult {
        let data = fs::read(path).map_err(|e| format!("Unable to read {path:?}: {e}"))?;
        let (width, height) = image::image_dimensions(path).map_err(|e| format!(
            "Unable to read {path:?} image: {e}"))?;
        let (width, height) = fit_image(width, height);

        let extension = path.extension().and_then(|extension| extension.to_str()).unwrap_or_default();
        let name = path.file_name().and_then(|name| name.to_str()).unwrap_or_default().to_owned();

        let document = self.document()?;
        let relationship_id = document.add_image(data, extension)?;
        let drawing_id = document.next_drawing_id()?;

        for (prefix, namespace) in [
            ("r", docx::R_NAMESPACE),
            ("wp", docx::WP_NAMESPACE),
            ("a", docx::A_NAMESPACE),
            ("pic", docx::PIC_NAMESPACE),
        ] {
            document.declare_namespace(prefix, namespace)?;
        }

        document.append(content::picture(&Picture {
            relationship_id: &relationship_id,
            drawing_id,
            name: &name,
            width,
            height,
        }))
    }

    fn append_table(&mut self, data: &Dataset) -> EmptyResult {
        let document = self.document()?;
        document.append(content::table(data))?;

        // Keeps consecutive tables apart
        document.append(content::empty_paragraph())
    }

    fn append_page_break(&mut self) -> EmptyResult {
        self.document()?.append(content::page_break())
    }

    fn indent_headings(&mut self, left: u32, right: u32) -> EmptyResult {
        let styles = self.document()?.related_part(PartKind::Styles)?;

        for level in 1..=HEADING_LEVELS {
            match styles::find_heading_style(styles, level) {
                Some(style) => {
                    styles::indent(styles, &style, left, right);
                    debug!("{style:?} style has been indented by {left}pt/{right}pt.");
                },
                None => warn!("Heading {level} style is not found in the document."),
            }
        }

        Ok(())
    }

    fn center_images(&mut self) -> GenericResult<usize> {
        let body = self.document()?.body()?;
        let mut centered = 0;

        body.for_each_mut("w:p", &mut |paragraph| {
            if !paragraph.contains("w:drawing") {
                return;
            }

            if paragraph.child("w:pPr").is_none() {
                paragraph.children.insert(0, Node::Element(Element::new("w:pPr")));
            }
            let Some(properties) = paragraph.child_mut("w:pPr") else {
                return;
            };

            properties.set_child(Element::new("w:ind")
                .with_attr("w:left", "0")
                .with_attr("w:right", "0")
                .with_attr("w:firstLine", "0"), &PARAGRAPH_PROPERTIES_ORDER);
            properties.set_child(Element::new("w:jc").with_attr("w:val", "center"), &PARAGRAPH_PROPERTIES_ORDER);

            centered += 1;
        });

        Ok(centered)
    }

    fn save(&mut self) -> EmptyResult {
        let path = self.path.clone();
        self.document()?.save(&path).map_err(|e| format!("Failed to save {path:?}: {e}"))?;
        debug!("{path:?} has been saved.");
        Ok(())
    }

    fn close(&mut self) {
        if self.document.take().is_some() {
            debug!("{:?} has been closed.", self.path);
        }
    }
}

impl Drop for DocxSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Scales pixel dimensions down to fit the page keeping the aspect ratio. Returns EMUs.
fn fit_image(width: u32, height: u32) -> (u32, u32) {
    let (max_width, max_height) = (u64::from(MAX_IMAGE_WIDTH), u64::from(MAX_IMAGE_HEIGHT));
    let width = u64::from(width.max(1)) * u64::from(EMU_PER_PIXEL);
    let height = u64::from(height.max(1)) * u64::from(EMU_PER_PIXEL);

    let (width, height) = if width <= max_width && height <= max_height {
        (width, height)
    } else if width * max_height >= height * max_width {
        (max_width, height * max_width / width)
    } else {
        (width * max_height / height, max_height)
    };

    (width as u32, height as u32)
}
