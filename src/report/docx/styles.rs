//! Heading styles lookup and modification.

use log::debug;

use crate::formats::docx::xml::{Element, Node};

use super::content::{self, PARAGRAPH_PROPERTIES_ORDER};

// Localized Word templates use translated style IDs
const HEADING_STYLE_PREFIXES: [&str; 3] = ["Heading", "Ttulo", "Titulo"];

const STYLE_ORDER: [&str; 21] = [
    "w:name", "w:aliases", "w:basedOn", "w:next", "w:link", "w:autoRedefine", "w:hidden",
    "w:uiPriority", "w:semiHidden", "w:unhideWhenUsed", "w:qFormat", "w:locked", "w:personal",
    "w:personalCompose", "w:personalReply", "w:rsid", "w:pPr", "w:rPr", "w:tblPr", "w:trPr",
    "w:tcPr",
];

pub fn find_heading_style(styles: &Element, level: usize) -> Option<String> {
    let ids: Vec<String> = HEADING_STYLE_PREFIXES.iter().map(|prefix| format!("{prefix}{level}")).collect();
    let name = format!("heading {level}");

    styles.elements()
        .filter(|style| style.name == "w:style" && style.attr("w:type").as_deref() == Some("paragraph"))
        .find(|style| {
            style.attr("w:styleId").is_some_and(|id| ids.contains(&id)) ||
                style.child("w:name").and_then(|element| element.attr("w:val"))
                    .is_some_and(|value| value.to_lowercase() == name)
        })
        .and_then(|style| style.attr("w:styleId"))
}

/// Returns ID of the heading style adding the style if the document doesn't have it.
pub fn heading_style(styles: &mut Element, level: usize) -> String {
    if let Some(id) = find_heading_style(styles, level) {
        return id;
    }

    let id = format!("Heading{level}");
    debug!("There is no heading {level} style in the document. Adding {id:?}.");

    let size = match level {
        1 => "32",
        2 => "28",
        _ => "24",
    };

    styles.children.push(Node::Element(Element::new("w:style")
        .with_attr("w:type", "paragraph")
        .with_attr("w:styleId", &id)
        .with_child(Element::new("w:name").with_attr("w:val", &format!("heading {level}")))
        .with_child(Element::new("w:basedOn").with_attr("w:val", "Normal"))
        .with_child(Element::new("w:next").with_attr("w:val", "Normal"))
        .with_child(Element::new("w:qFormat"))
        .with_child(Element::new("w:pPr")
            .with_child(Element::new("w:keepNext"))
            .with_child(Element::new("w:outlineLvl").with_attr("w:val", &(level - 1).to_string())))
        .with_child(Element::new("w:rPr")
            .with_child(Element::new("w:b"))
            .with_child(Element::new("w:sz").with_attr("w:val", size)))));

    id
}

fn paragraph_properties<'a>(styles: &'a mut Element, id: &str) -> Option<&'a mut Element> {
    styles.elements_mut()
        .find(|style| style.name == "w:style" && style.attr("w:styleId").as_deref() == Some(id))
        .map(|style| style.ensure_child("w:pPr", &STYLE_ORDER))
}

/// Makes paragraphs of the style numbered by the numbering level.
pub fn link_numbering(styles: &mut Element, id: &str, numbering_id: u32, level: usize) -> bool {
    let Some(properties) = paragraph_properties(styles, id) else {
        return false;
    };
    properties.set_child(content::numbering_properties(numbering_id, level), &PARAGRAPH_PROPERTIES_ORDER);
    true
}

/// Sets left and right indentation of the style keeping its other indentation attributes.
pub fn indent(styles: &mut Element, id: &str, left: u32, right: u32) -> bool {
    let Some(properties) = paragraph_properties(styles, id) else {
        return false;
    };

    let indentation = properties.ensure_child("w:ind", &PARAGRAPH_PROPERTIES_ORDER);
    indentation.set_attr("w:left", &points_to_twips(left).to_string());
    indentation.set_attr("w:right", &points_to_twips(right).to_string());

    true
}

fn points_to_twips(points: u32) -> u32 {
    points * 20
}
