use std::path::Path;

use crate::core::{EmptyResult, GenericResult};
use crate::dataset::Dataset;

/// An open document which report content is appended to.
///
/// The session owns the in-memory document model until it is closed. Nothing is written to disk
/// until `save()` is called.
pub trait DocumentSession {
    /// Sets text of the content controls with the specified title. Returns `false` if the
    /// document has no such controls.
    fn fill_field(&mut self, title: &str, value: &str) -> GenericResult<bool>;

    /// Binds heading levels 1-3 to `%1`, `%1.%2` and `%1.%2.%3` numbering.
    fn configure_heading_numbering(&mut self) -> EmptyResult;

    fn append_heading(&mut self, level: usize, text: &str) -> EmptyResult;
    fn append_text(&mut self, text: &str) -> EmptyResult;
    fn append_caption(&mut self, text: &str) -> EmptyResult;
    fn append_image(&mut self, path: &Path) -> EmptyResult;
    fn append_table(&mut self, data: &Dataset) -> EmptyResult;
    fn append_page_break(&mut self) -> EmptyResult;

    /// Sets left and right indentation (in points) of heading styles.
    fn indent_headings(&mut self, left: u32, right: u32) -> EmptyResult;

    /// Centers all paragraphs with images. Returns the number of modified paragraphs.
    fn center_images(&mut self) -> GenericResult<usize>;

    fn save(&mut self) -> EmptyResult;
    fn close(&mut self);
}

pub trait DocumentBackend {
    fn open(&self, path: &Path) -> GenericResult<Box<dyn DocumentSession>>;
}
