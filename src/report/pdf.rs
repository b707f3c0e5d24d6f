use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use pdfium_render::prelude::*;

use crate::core::{EmptyResult, GenericResult};

const RENDER_ZOOM: f32 = 2.0;

/// Renders the first page of a PDF file to a PNG image.
pub trait Rasterizer {
    fn render_first_page(&self, pdf: &Path, png: &Path) -> EmptyResult;
}

pub struct PdfiumRasterizer;

impl Rasterizer for PdfiumRasterizer {
    fn render_first_page(&self, pdf: &Path, png: &Path) -> EmptyResult {
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name())
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| format!("Unable to load PDFium library: {e}"))?;
        let pdfium = Pdfium::new(bindings);

        let data = fs::read(pdf)?;
        let document = pdfium.load_pdf_from_byte_slice(&data, None)
            .map_err(|e| format!("Unable to open the PDF: {e}"))?;

        let page = document.pages().get(0).map_err(|e| format!("Unable to get the first page: {e}"))?;
        let bitmap = page.render_with_config(&PdfRenderConfig::new().scale_page_by_factor(RENDER_ZOOM))
            .map_err(|e| format!("Unable to render the first page: {e}"))?;

        let width = bitmap.width() as u32;
        let height = bitmap.height() as u32;
        let raw = bitmap.as_raw_bytes();

        let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
        for pixel in raw.chunks_exact(4) {
            rgb.extend_from_slice(&[pixel[2], pixel[1], pixel[0]]);
        }

        let image = image::RgbImage::from_raw(width, height, rgb)
            .ok_or("Got an unexpected bitmap size")?;
        image.save(png).map_err(|e| format!("Unable to save {png:?}: {e}"))?;

        Ok(())
    }
}

pub fn rendered_image_path(pdf: &Path) -> PathBuf {
    pdf.with_extension("png")
}

/// Returns the image rendered from the PDF rendering it if it hasn't been rendered yet.
pub fn get_pdf_image(rasterizer: &dyn Rasterizer, pdf: &Path) -> GenericResult<PathBuf> {
    let png = rendered_image_path(pdf);

    if png.exists() {
        debug!("Using already rendered {png:?}.");
    } else {
        rasterizer.render_first_page(pdf, &png)?;
        debug!("{pdf:?} has been rendered to {png:?}.");
    }

    Ok(png)
}
