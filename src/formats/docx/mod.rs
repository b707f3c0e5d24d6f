//! In-place editing of `.docx` packages.
//!
//! Only the parts that are edited get parsed. Everything else (headers, footers, content
//! controls, themes and so on) is written back untouched.

pub mod package;
pub mod xml;

use std::collections::BTreeMap;
use std::path::Path;

use log::debug;

use crate::core::{EmptyResult, GenericError, GenericResult};

use self::package::Package;
use self::xml::{Element, Node, XmlDocument};

pub const W_NAMESPACE: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub const R_NAMESPACE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub const WP_NAMESPACE: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
pub const A_NAMESPACE: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub const PIC_NAMESPACE: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";

const PACKAGE_RELATIONSHIPS_NAMESPACE: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const CONTENT_TYPES_NAMESPACE: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
const RELATIONSHIP_TYPE_PREFIX: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/";

const CONTENT_TYPES: &str = "[Content_Types].xml";
const MAIN_PART: &str = "word/document.xml";
const MAIN_RELATIONSHIPS: &str = "word/_rels/document.xml.rels";
const RELATIONSHIPS_CONTENT_TYPE: &str = "application/vnd.openxmlformats-package.relationships+xml";

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PartKind {
    Styles,
    Numbering,
}

impl PartKind {
    fn name(self) -> &'static str {
        match self {
            PartKind::Styles => "styles",
            PartKind::Numbering => "numbering",
        }
    }

    fn relationship_type(self) -> String {
        format!("{RELATIONSHIP_TYPE_PREFIX}{}", self.name())
    }

    fn content_type(self) -> String {
        format!("application/vnd.openxmlformats-officedocument.wordprocessingml.{}+xml", self.name())
    }

    fn empty(self) -> XmlDocument {
        XmlDocument::new(Element::new(&format!("w:{}", self.name())).with_attr("xmlns:w", W_NAMESPACE))
    }
}

pub struct Document {
    package: Package,
    parts: BTreeMap<String, XmlDocument>,
    last_drawing_id: Option<u32>,
}

impl Document {
    pub fn open(path: &Path) -> GenericResult<Document> {
        let package = Package::read(path)?;
        if package.part(MAIN_PART).is_none() {
            return Err!("{path:?} is not a Word document");
        }

        let mut document = Document {
            package,
            parts: BTreeMap::new(),
            last_drawing_id: None,
        };
        document.body()?;

        Ok(document)
    }

    pub fn save(&mut self, path: &Path) -> EmptyResult {
        for (name, part) in &self.parts {
            self.package.set_xml(name, part);
        }
        self.package.write(path)
    }

    /// Names of the header and footer parts.
    pub fn header_footer_parts(&self) -> Vec<String> {
        self.package.part_names()
            .filter(|name| {
                name.strip_prefix("word/").is_some_and(|name| {
                    !name.contains('/') && name.ends_with(".xml") &&
                        (name.starts_with("header") || name.starts_with("footer"))
                })
            })
            .map(ToOwned::to_owned)
            .collect()
    }

    pub fn main_part(&mut self) -> GenericResult<&mut Element> {
        Ok(&mut self.required_part(MAIN_PART)?.root)
    }

    pub fn part(&mut self, name: &str) -> GenericResult<Option<&mut Element>> {
        if !self.parts.contains_key(name) {
            let Some(part) = self.package.xml(name)? else {
                return Ok(None);
            };
            self.parts.insert(name.to_owned(), part);
        }

        Ok(self.parts.get_mut(name).map(|part| &mut part.root))
    }

    fn required_part(&mut self, name: &str) -> GenericResult<&mut XmlDocument> {
        if self.part(name)?.is_none() {
            return Err!("The document has no {name:?} part");
        }
        self.parts.get_mut(name).ok_or_else(|| GenericError::from("Unexpected missing part"))
    }

    pub fn body(&mut self) -> GenericResult<&mut Element> {
        self.main_part()?.child_mut("w:body").ok_or_else(|| GenericError::from(
            "The document has no body"))
    }

    /// Appends body content keeping the final section properties last.
    pub fn append(&mut self, element: Element) -> EmptyResult {
        let body = self.body()?;

        let index = match body.children.iter().rposition(|node| matches!(node, Node::Element(_))) {
            Some(index) if matches!(&body.children[index], Node::Element(last) if last.name == "w:sectPr") => index,
            _ => body.children.len(),
        };
        body.children.insert(index, Node::Element(element));

        Ok(())
    }

    /// Declares the namespace on the main part root element if it's not declared yet.
    pub fn declare_namespace(&mut self, prefix: &str, namespace: &str) -> EmptyResult {
        let root = self.main_part()?;
        let name = format!("xmlns:{prefix}");
        if root.attr(&name).is_none() {
            root.set_attr(&name, namespace);
        }
        Ok(())
    }

    /// Returns the styles or numbering part creating it if the document doesn't have one.
    pub fn related_part(&mut self, kind: PartKind) -> GenericResult<&mut Element> {
        let name = match self.find_relationship(&kind.relationship_type())? {
            Some(name) => name,
            None => {
                let name = format!("word/{}.xml", kind.name());
                self.add_relationship(&kind.relationship_type(), &format!("{}.xml", kind.name()))?;
                name
            },
        };

        if self.part(&name)?.is_none() {
            debug!("The document has no {} part. Creating {name:?}.", kind.name());
            self.parts.insert(name.clone(), kind.empty());
            self.add_override(&name, &kind.content_type())?;
        }

        Ok(&mut self.required_part(&name)?.root)
    }

    /// Stores the image in the package and returns its relationship ID.
    pub fn add_image(&mut self, data: Vec<u8>, extension: &str) -> GenericResult<String> {
        let extension = extension.to_lowercase();
        let content_type = match extension.as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            _ => return Err!("Unsupported image format: {:?}", extension),
        };

        let mut index = 1;
        let target = loop {
            let target = format!("media/evidence{index}.{extension}");
            if self.package.part(&format!("word/{target}")).is_none() {
                break target;
            }
            index += 1;
        };

        self.add_default(&extension, content_type)?;
        self.package.set_part(&format!("word/{target}"), data);
        self.add_relationship(&format!("{RELATIONSHIP_TYPE_PREFIX}image"), &target)
    }

    /// Returns a drawing object ID which is unique within the document.
    pub fn next_drawing_id(&mut self) -> GenericResult<u32> {
        let last_id = match self.last_drawing_id {
            Some(id) => id,
            None => self.main_part()?.find_all("wp:docPr").iter()
                .filter_map(|properties| properties.attr("id")?.parse::<u32>().ok())
                .max().unwrap_or(0),
        };

        let id = last_id + 1;
        self.last_drawing_id = Some(id);
        Ok(id)
    }

    fn find_relationship(&mut self, relationship_type: &str) -> GenericResult<Option<String>> {
        let Some(relationships) = self.part(MAIN_RELATIONSHIPS)? else {
            return Ok(None);
        };

        Ok(relationships.elements()
            .find(|relationship| relationship.attr("Type").as_deref() == Some(relationship_type))
            .and_then(|relationship| relationship.attr("Target"))
            .map(|target| resolve_target(&target)))
    }

    fn add_relationship(&mut self, relationship_type: &str, target: &str) -> GenericResult<String> {
        if self.part(MAIN_RELATIONSHIPS)?.is_none() {
            self.add_default("rels", RELATIONSHIPS_CONTENT_TYPE)?;
            self.parts.insert(MAIN_RELATIONSHIPS.to_owned(), XmlDocument::new(
                Element::new("Relationships").with_attr("xmlns", PACKAGE_RELATIONSHIPS_NAMESPACE)));
        }

        let relationships = &mut self.required_part(MAIN_RELATIONSHIPS)?.root;

        let last_id = relationships.elements()
            .filter_map(|relationship| relationship.attr("Id")?.strip_prefix("rId")?.parse::<u32>().ok())
            .max().unwrap_or(0);
        let id = format!("rId{}", last_id + 1);

        relationships.children.push(Node::Element(Element::new("Relationship")
            .with_attr("Id", &id)
            .with_attr("Type", relationship_type)
            .with_attr("Target", target)));

        Ok(id)
    }

    fn content_types(&mut self) -> GenericResult<&mut Element> {
        if self.part(CONTENT_TYPES)?.is_none() {
            self.parts.insert(CONTENT_TYPES.to_owned(), XmlDocument::new(
                Element::new("Types").with_attr("xmlns", CONTENT_TYPES_NAMESPACE)));
        }
        Ok(&mut self.required_part(CONTENT_TYPES)?.root)
    }

    fn add_default(&mut self, extension: &str, content_type: &str) -> EmptyResult {
        let types = self.content_types()?;

        let exists = types.elements().any(|default| {
            default.name == "Default" &&
                default.attr("Extension").is_some_and(|other| other.eq_ignore_ascii_case(extension))
        });

        if !exists {
            types.children.push(Node::Element(Element::new("Default")
                .with_attr("Extension", extension)
                .with_attr("ContentType", content_type)));
        }

        Ok(())
    }

    fn add_override(&mut self, name: &str, content_type: &str) -> EmptyResult {
        let part_name = format!("/{name}");
        let types = self.content_types()?;

        let exists = types.elements().any(|element| {
            element.name == "Override" && element.attr("PartName").as_deref() == Some(part_name.as_str())
        });

        if !exists {
            types.children.push(Node::Element(Element::new("Override")
                .with_attr("PartName", &part_name)
                .with_attr("ContentType", content_type)));
        }

        Ok(())
    }
}

fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_owned(),
        None => format!("word/{target}"),
    }
}

#[cfg(test)]
pub mod testing {
    use std::fs::File;
    use std::io::Write;
    use std::path::Path;

    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

    const PACKAGE_RELATIONSHIPS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

    const DOCUMENT_RELATIONSHIPS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"></Relationships>"#;

    /// Writes a minimal Word document with the specified body content.
    pub fn write_document(path: &Path, body: &str) {
        let document = format!(concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#, "\n",
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
            r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
            r#"<w:body>{}<w:sectPr><w:pgSz w:w="11906" w:h="16838"/></w:sectPr></w:body></w:document>"#,
        ), body);

        let mut zip = ZipWriter::new(File::create(path).unwrap());
        for (name, data) in [
            ("[Content_Types].xml", CONTENT_TYPES),
            ("_rels/.rels", PACKAGE_RELATIONSHIPS),
            ("word/document.xml", document.as_str()),
            ("word/_rels/document.xml.rels", DOCUMENT_RELATIONSHIPS),
        ] {
            zip.start_file(name, SimpleFileOptions::default()).unwrap();
            zip.write_all(data.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }
}
