use std::fs::{self, File};
use std::io::{BufReader, Read, Write};
use std::path::Path;

use zip::{CompressionMethod, ZipArchive, ZipWriter};
use zip::write::SimpleFileOptions;

use crate::core::{EmptyResult, GenericResult};

use super::xml::XmlDocument;

/// Raw parts of an OPC package in their original order.
pub struct Package {
    parts: Vec<(String, Vec<u8>)>,
}

impl Package {
    pub fn new() -> Package {
        Package {parts: Vec::new()}
    }

    pub fn read(path: &Path) -> GenericResult<Package> {
        let file = File::open(path).map_err(|e| format!("Unable to open {path:?}: {e}"))?;
        let mut archive = ZipArchive::new(BufReader::new(file)).map_err(|e| format!(
            "{path:?} is not a valid document package: {e}"))?;

        let mut parts = Vec::with_capacity(archive.len());

        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;
            if entry.is_dir() {
                continue;
            }

            let name = entry.name().to_owned();
            let mut data = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut data).map_err(|e| format!(
                "Unable to read {name:?} from {path:?}: {e}"))?;

            parts.push((name, data));
        }

        Ok(Package {parts})
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts.iter().find(|(part, _)| part == name).map(|(_, data)| data.as_slice())
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|(name, _)| name.as_str())
    }

    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        match self.parts.iter_mut().find(|(part, _)| part == name) {
            Some(part) => part.1 = data,
            None => self.parts.push((name.to_owned(), data)),
        }
    }

    pub fn xml(&self, name: &str) -> GenericResult<Option<XmlDocument>> {
        let Some(data) = self.part(name) else {
            return Ok(None);
        };

        let document = XmlDocument::parse(data).map_err(|e| format!("Unable to parse {name:?}: {e}"))?;
        Ok(Some(document))
    }

    pub fn set_xml(&mut self, name: &str, document: &XmlDocument) {
        self.set_part(name, document.to_bytes());
    }

    /// Writes the package through a temporary file, so a failed write never leaves a truncated
    /// document behind.
    pub fn write(&self, path: &Path) -> EmptyResult {
        let mut temp_path = path.as_os_str().to_owned();
        temp_path.push(".tmp");

        if let Err(err) = self.write_to(Path::new(&temp_path)) {
            let _ = fs::remove_file(&temp_path);
            return Err!("Unable to write {path:?}: {err}");
        }

        fs::rename(&temp_path, path).map_err(|e| format!("Unable to write {path:?}: {e}"))?;
        Ok(())
    }

    fn write_to(&self, path: &Path) -> EmptyResult {
        let mut zip = ZipWriter::new(File::create(path)?);

        for (name, data) in &self.parts {
            let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
            zip.start_file(name.as_str(), options)?;
            zip.write_all(data)?;
        }

        zip.finish()?;
        Ok(())
    }
}
