//! Multilevel heading numbering in the numbering part.

use log::debug;

use crate::formats::docx::xml::{Element, Node};

pub const HEADING_LEVELS: usize = 3;

/// Returns `%1`, `%1.%2`, ... level text for the zero-based level.
pub fn level_text(level: usize) -> String {
    (1..=level + 1).map(|index| format!("%{index}")).collect::<Vec<_>>().join(".")
}

/// Finds or adds heading numbering definition and its instance. Returns the numbering ID.
///
/// An existing `%1`/`%1.%2`/`%1.%2.%3` definition is reused, so all report sessions number
/// headings through the same list.
pub fn configure(numbering: &mut Element, heading_styles: &[String]) -> u32 {
    let abstract_id = match find_heading_definition(numbering) {
        Some(id) => id,
        None => {
            let id = numbering.elements()
                .filter(|element| element.name == "w:abstractNum")
                .filter_map(|element| parse_id(element, "w:abstractNumId"))
                .max().map_or(0, |id| id + 1);

            let index = numbering.children.iter()
                .position(|node| matches!(node, Node::Element(element) if element.name != "w:abstractNum"))
                .unwrap_or(numbering.children.len());

            numbering.children.insert(index, Node::Element(definition(id, heading_styles)));
            debug!("Heading numbering definition #{id} has been added.");

            id
        },
    };

    let existing = numbering.elements().find(|element| {
        element.name == "w:num" && element.child("w:lvlOverride").is_none() &&
            element.child("w:abstractNumId").and_then(|id| id.attr("w:val")) == Some(abstract_id.to_string())
    }).and_then(|element| parse_id(element, "w:numId"));

    if let Some(id) = existing {
        return id;
    }

    let id = numbering.elements()
        .filter(|element| element.name == "w:num")
        .filter_map(|element| parse_id(element, "w:numId"))
        .max().unwrap_or(0) + 1;

    let index = numbering.children.iter()
        .rposition(|node| matches!(node, Node::Element(element) if element.name == "w:num" || element.name == "w:abstractNum"))
        .map_or(numbering.children.len(), |index| index + 1);

    numbering.children.insert(index, Node::Element(Element::new("w:num")
        .with_attr("w:numId", &id.to_string())
        .with_child(Element::new("w:abstractNumId").with_attr("w:val", &abstract_id.to_string()))));
    debug!("Heading numbering #{id} has been added.");

    id
}

/// Returns level texts of the numbering instance.
pub fn level_texts(numbering: &Element, numbering_id: u32) -> Option<Vec<String>> {
    let abstract_id = numbering.elements()
        .find(|element| element.name == "w:num" && parse_id(element, "w:numId") == Some(numbering_id))?
        .child("w:abstractNumId")?.attr("w:val")?;

    let definition = numbering.elements().find(|element| {
        element.name == "w:abstractNum" && element.attr("w:abstractNumId").as_deref() == Some(abstract_id.as_str())
    })?;

    Some(definition.elements()
        .filter(|element| element.name == "w:lvl")
        .filter_map(|level| level.child("w:lvlText")?.attr("w:val"))
        .collect())
}

fn find_heading_definition(numbering: &Element) -> Option<u32> {
    numbering.elements()
        .filter(|element| element.name == "w:abstractNum")
        .find(|definition| (0..HEADING_LEVELS).all(|level| {
            definition.elements()
                .find(|element| element.name == "w:lvl" && element.attr("w:ilvl") == Some(level.to_string()))
                .and_then(|element| element.child("w:lvlText")?.attr("w:val"))
                == Some(level_text(level))
        }))
        .and_then(|definition| parse_id(definition, "w:abstractNumId"))
}

fn definition(id: u32, heading_styles: &[String]) -> Element {
    let mut definition = Element::new("w:abstractNum")
        .with_attr("w:abstractNumId", &id.to_string())
        .with_child(Element::new("w:multiLevelType").with_attr("w:val", "multilevel"));

    for (level, style) in heading_styles.iter().enumerate().take(HEADING_LEVELS) {
        definition = definition.with_child(Element::new("w:lvl")
            .with_attr("w:ilvl", &level.to_string())
            .with_child(Element::new("w:start").with_attr("w:val", "1"))
            .with_child(Element::new("w:numFmt").with_attr("w:val", "decimal"))
            .with_child(Element::new("w:pStyle").with_attr("w:val", style))
            .with_child(Element::new("w:lvlText").with_attr("w:val", &level_text(level)))
            .with_child(Element::new("w:lvlJc").with_attr("w:val", "left")));
    }

    definition
}

fn parse_id(element: &Element, name: &str) -> Option<u32> {
    element.attr(name)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::formats::docx::xml::XmlDocument;

    use super::*;

    fn styles() -> Vec<String> {
        vec![s!("Heading1"), s!("Heading2"), s!("Heading3")]
    }

    #[test]
    fn existing_lists() {
        // Bullet list definition and its instance, as Word writes them
        let mut numbering = XmlDocument::parse(concat!(
            r#"<w:numbering xmlns:w="urn:w">"#,
            r#"<w:abstractNum w:abstractNumId="0"><w:lvl w:ilvl="0"><w:lvlText w:val="•"/></w:lvl></w:abstractNum>"#,
            r#"<w:abstractNum w:abstractNumId="1"><w:lvl w:ilvl="0"><w:lvlText w:val="%1)"/></w:lvl></w:abstractNum>"#,
            r#"<w:num w:numId="1"><w:abstractNumId w:val="0"/></w:num>"#,
            r#"<w:num w:numId="2"><w:abstractNumId w:val="1"/></w:num>"#,
            r#"</w:numbering>"#,
        ).as_bytes()).unwrap().root;

        let id = configure(&mut numbering, &styles());
        assert_eq!(id, 3);
        assert_eq!(level_texts(&numbering, id).unwrap(), vec!["%1", "%1.%2", "%1.%2.%3"]);
        assert_eq!(level_texts(&numbering, 1).unwrap(), vec!["•"]);

        let names: Vec<&str> = numbering.elements().map(|element| element.name.as_str()).collect();
        assert_eq!(names, vec!["w:abstractNum", "w:abstractNum", "w:abstractNum", "w:num", "w:num", "w:num"]);

        assert_eq!(configure(&mut numbering, &styles()), id);
        assert_eq!(numbering.elements().count(), 6);
    }

    #[test]
    fn empty_numbering() {
        let mut numbering = Element::new("w:numbering");

        let id = configure(&mut numbering, &styles());
        assert_eq!(id, 1);
        assert_eq!(level_texts(&numbering, id).unwrap(), vec!["%1", "%1.%2", "%1.%2.%3"]);

        let styles: Vec<String> = numbering.find_all("w:pStyle").iter()
            .filter_map(|style| style.attr("w:val")).collect();
        assert_eq!(styles, vec!["Heading1", "Heading2", "Heading3"]);
    }
}
