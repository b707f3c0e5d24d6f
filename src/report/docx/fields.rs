//! Filling of content controls (structured document tags) identified by their titles.

use crate::formats::docx::xml::{Element, Node};

use super::content;

const PLACEHOLDER_STYLE: &str = "PlaceholderText";

/// Replaces content of all content controls with the specified title. Returns the number of
/// filled controls.
pub fn fill(root: &mut Element, title: &str, value: &str) -> usize {
    let mut filled = 0;

    root.for_each_mut("w:sdt", &mut |control| {
        if control_title(control).as_deref() == Some(title.trim()) {
            fill_control(control, value);
            filled += 1;
        } else {
            filled += fill(control, title, value);
        }
    });

    filled
}

pub fn control_title(control: &Element) -> Option<String> {
    let title = control.child("w:sdtPr")?.child("w:alias")?.attr("w:val")?;
    Some(title.trim().to_owned())
}

fn fill_control(control: &mut Element, value: &str) {
    if let Some(properties) = control.child_mut("w:sdtPr") {
        properties.remove_children("w:showingPlcHdr");
        // Word refreshes data bound controls from the custom XML part on open
        properties.remove_children("w:dataBinding");
        if let Some(run_properties) = properties.child_mut("w:rPr") {
            remove_placeholder_style(run_properties);
        }
    }

    let Some(content) = control.child_mut("w:sdtContent") else {
        return;
    };

    let run_properties = content.find_all("w:r").first()
        .and_then(|run| run.child("w:rPr")).cloned()
        .map(|mut properties| {
            remove_placeholder_style(&mut properties);
            properties
        });
    let run = content::run(value, run_properties);

    let Some(paragraph_index) = content.children.iter().position(|node| {
        matches!(node, Node::Element(element) if element.name == "w:p")
    }) else {
        // Inline control: the content is a sequence of runs
        content.children = vec![Node::Element(run)];
        return;
    };

    let mut index = 0;
    content.children.retain(|node| {
        let keep = index == paragraph_index || !matches!(node, Node::Element(element) if element.name == "w:p");
        index += 1;
        keep
    });

    if let Some(paragraph) = content.child_mut("w:p") {
        paragraph.children.retain(|node| matches!(node, Node::Element(element) if element.name == "w:pPr"));
        paragraph.children.push(Node::Element(run));
    }
}

fn remove_placeholder_style(properties: &mut Element) {
    properties.children.retain(|node| !matches!(node, Node::Element(element)
        if element.name == "w:rStyle" && element.attr("w:val").as_deref() == Some(PLACEHOLDER_STYLE)));
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::formats::docx::xml::XmlDocument;

    use super::*;

    fn parse(body: &str) -> Element {
        XmlDocument::parse(format!(r#"<w:body xmlns:w="urn:w">{body}</w:body>"#).as_bytes()).unwrap().root
    }

    #[test]
    fn inline_control() {
        let mut body = parse(concat!(
            r#"<w:p><w:r><w:t>Rodovia: </w:t></w:r><w:sdt><w:sdtPr>"#,
            r#"<w:rPr><w:rStyle w:val="PlaceholderText"/></w:rPr><w:alias w:val=" Rodovia "/><w:showingPlcHdr/>"#,
            r#"</w:sdtPr><w:sdtContent><w:r><w:rPr><w:rStyle w:val="PlaceholderText"/><w:b/></w:rPr>"#,
            r#"<w:t>Clique aqui</w:t></w:r><w:r><w:t> para inserir</w:t></w:r></w:sdtContent></w:sdt></w:p>"#,
        ));

        assert_eq!(fill(&mut body, "Rodovia", "MS-163"), 1);
        assert_eq!(body.text(), "Rodovia: MS-163");

        let control = body.find_all("w:sdt")[0];
        assert_eq!(control_title(control).unwrap(), "Rodovia");
        assert!(control.find_all("w:showingPlcHdr").is_empty());
        assert!(control.find_all("w:rStyle").is_empty());

        let runs = control.find_all("w:r");
        assert_eq!(runs.len(), 1);
        assert!(runs[0].child("w:rPr").unwrap().child("w:b").is_some());
    }

    #[test]
    fn block_control() {
        let mut body = parse(concat!(
            r#"<w:sdt><w:sdtPr><w:alias w:val="Descrição 0"/></w:sdtPr><w:sdtContent>"#,
            r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:t>Line 1</w:t></w:r></w:p>"#,
            r#"<w:p><w:r><w:t>Line 2</w:t></w:r></w:p>"#,
            r#"</w:sdtContent></w:sdt>"#,
            r#"<w:sdt><w:sdtPr><w:alias w:val="Descrição 0"/></w:sdtPr><w:sdtContent>"#,
            r#"<w:p/></w:sdtContent></w:sdt>"#,
        ));

        assert_eq!(fill(&mut body, "Descrição 0", "Emissão inicial\nRevisada"), 2);
        assert_eq!(fill(&mut body, "Descrição 1", "Other"), 0);

        let controls = body.find_all("w:sdt");
        assert_eq!(controls[0].text(), "Emissão inicialRevisada");
        assert_eq!(controls[1].text(), "Emissão inicialRevisada");

        let paragraphs = controls[0].find_all("w:p");
        assert_eq!(paragraphs.len(), 1);
        assert!(paragraphs[0].child("w:pPr").is_some());
        assert_eq!(paragraphs[0].find_all("w:br").len(), 1);
    }

    #[test]
    fn nested_controls() {
        let mut body = parse(concat!(
            r#"<w:sdt><w:sdtPr><w:alias w:val="Cabeçalho"/></w:sdtPr><w:sdtContent><w:p>"#,
            r#"<w:sdt><w:sdtPr><w:alias w:val="Data"/></w:sdtPr><w:sdtContent><w:r><w:t>Data</w:t></w:r></w:sdtContent></w:sdt>"#,
            r#"</w:p></w:sdtContent></w:sdt>"#,
        ));

        assert_eq!(fill(&mut body, "Data", "05/03/2024"), 1);
        assert_eq!(body.text(), "05/03/2024");
    }
}
