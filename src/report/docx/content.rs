//! Builders of the body content appended to reports.

use crate::dataset::Dataset;
use crate::formats::docx::xml::Element;

const FONT: &str = "Arial";
const TABLE_FONT_SIZE: u32 = 14; // 7pt in half-points
const HEADER_FILL: &str = "000080";
const HEADER_COLOR: &str = "FFFFFF";

pub const PARAGRAPH_PROPERTIES_ORDER: [&str; 36] = [
    "w:pStyle", "w:keepNext", "w:keepLines", "w:pageBreakBefore", "w:framePr", "w:widowControl",
    "w:numPr", "w:suppressLineNumbers", "w:pBdr", "w:shd", "w:tabs", "w:suppressAutoHyphens",
    "w:kinsoku", "w:wordWrap", "w:overflowPunct", "w:topLinePunct", "w:autoSpaceDE",
    "w:autoSpaceDN", "w:bidi", "w:adjustRightInd", "w:snapToGrid", "w:spacing", "w:ind",
    "w:contextualSpacing", "w:mirrorIndents", "w:suppressOverlap", "w:jc", "w:textDirection",
    "w:textAlignment", "w:textboxTightWrap", "w:outlineLvl", "w:divId", "w:cnfStyle", "w:rPr",
    "w:sectPr", "w:pPrChange",
];

#[derive(Default)]
pub struct RunStyle {
    pub bold: bool,
    pub color: Option<&'static str>,
    pub size: Option<u32>,
}

impl RunStyle {
    fn properties(&self) -> Element {
        let mut properties = Element::new("w:rPr").with_child(Element::new("w:rFonts")
            .with_attr("w:ascii", FONT)
            .with_attr("w:hAnsi", FONT)
            .with_attr("w:cs", FONT));

        if self.bold {
            properties = properties.with_child(Element::new("w:b"));
        }

        if let Some(color) = self.color {
            properties = properties.with_child(Element::new("w:color").with_attr("w:val", color));
        }

        if let Some(size) = self.size {
            properties = properties.with_child(Element::new("w:sz").with_attr("w:val", &size.to_string()));
        }

        properties
    }
}

/// Builds a run with the text. Line breaks become `w:br` elements.
pub fn run(text: &str, properties: Option<Element>) -> Element {
    let mut run = Element::new("w:r");

    if let Some(properties) = properties {
        run = run.with_child(properties);
    }

    for (index, line) in text.split('\n').enumerate() {
        if index != 0 {
            run = run.with_child(Element::new("w:br"));
        }
        if !line.is_empty() {
            run = run.with_child(Element::new("w:t").with_attr("xml:space", "preserve").with_text(line));
        }
    }

    run
}

fn styled_run(text: &str, style: &RunStyle) -> Element {
    run(text, Some(style.properties()))
}

fn centered() -> Element {
    Element::new("w:pPr").with_child(Element::new("w:jc").with_attr("w:val", "center"))
}

pub fn heading(style_id: &str, numbering: Option<(u32, usize)>, text: &str) -> Element {
    let mut properties = Element::new("w:pPr")
        .with_child(Element::new("w:pStyle").with_attr("w:val", style_id));

    if let Some((numbering_id, level)) = numbering {
        properties = properties.with_child(numbering_properties(numbering_id, level));
    }

    Element::new("w:p")
        .with_child(properties)
        .with_child(styled_run(text, &RunStyle::default()))
}

pub fn numbering_properties(numbering_id: u32, level: usize) -> Element {
    Element::new("w:numPr")
        .with_child(Element::new("w:ilvl").with_attr("w:val", &level.to_string()))
        .with_child(Element::new("w:numId").with_attr("w:val", &numbering_id.to_string()))
}

pub fn text(text: &str) -> Element {
    Element::new("w:p").with_child(styled_run(text, &RunStyle::default()))
}

pub fn caption(text: &str) -> Element {
    Element::new("w:p")
        .with_child(centered())
        .with_child(styled_run(text, &RunStyle {bold: true, ..Default::default()}))
}

pub fn empty_paragraph() -> Element {
    Element::new("w:p")
}

pub fn page_break() -> Element {
    Element::new("w:p").with_child(Element::new("w:r")
        .with_child(Element::new("w:br").with_attr("w:type", "page")))
}

pub fn table(data: &Dataset) -> Element {
    let mut borders = Element::new("w:tblBorders");
    for side in ["top", "left", "bottom", "right", "insideH", "insideV"] {
        borders = borders.with_child(Element::new(&format!("w:{side}"))
            .with_attr("w:val", "single")
            .with_attr("w:sz", "4")
            .with_attr("w:space", "0")
            .with_attr("w:color", "auto"));
    }

    let properties = Element::new("w:tblPr")
        .with_child(Element::new("w:tblW").with_attr("w:w", "0").with_attr("w:type", "auto"))
        .with_child(Element::new("w:jc").with_attr("w:val", "center"))
        .with_child(borders)
        .with_child(Element::new("w:tblLayout").with_attr("w:type", "autofit"));

    let mut grid = Element::new("w:tblGrid");
    for _ in data.columns() {
        grid = grid.with_child(Element::new("w:gridCol"));
    }

    let header_style = RunStyle {
        bold: true,
        color: Some(HEADER_COLOR),
        size: Some(TABLE_FONT_SIZE),
    };

    let mut header = Element::new("w:tr")
        .with_child(Element::new("w:trPr").with_child(Element::new("w:tblHeader")));
    for column in data.columns() {
        header = header.with_child(table_cell(&column.name, &header_style, Some(HEADER_FILL)));
    }

    let mut table = Element::new("w:tbl")
        .with_child(properties)
        .with_child(grid)
        .with_child(header);

    let value_style = RunStyle {size: Some(TABLE_FONT_SIZE), ..Default::default()};

    for row in data.rows() {
        let mut table_row = Element::new("w:tr");
        for value in row {
            table_row = table_row.with_child(table_cell(&value.to_string(), &value_style, None));
        }
        table = table.with_child(table_row);
    }

    table
}

fn table_cell(text: &str, style: &RunStyle, fill: Option<&str>) -> Element {
    let mut properties = Element::new("w:tcPr");

    if let Some(fill) = fill {
        properties = properties.with_child(Element::new("w:shd")
            .with_attr("w:val", "clear")
            .with_attr("w:color", "auto")
            .with_attr("w:fill", fill));
    }

    Element::new("w:tc")
        .with_child(properties.with_child(Element::new("w:vAlign").with_attr("w:val", "center")))
        .with_child(Element::new("w:p")
            .with_child(centered())
            .with_child(styled_run(text, style)))
}

pub struct Picture<'a> {
    pub relationship_id: &'a str,
    pub drawing_id: u32,
    pub name: &'a str,
    pub width: u32,
    pub height: u32,
}

/// Builds a centered paragraph with an inline picture. Sizes are in EMUs.
pub fn picture(picture: &Picture) -> Element {
    let (width, height) = (picture.width.to_string(), picture.height.to_string());
    let drawing_id = picture.drawing_id.to_string();

    let graphic = Element::new("a:graphic").with_child(Element::new("a:graphicData")
        .with_attr("uri", "http://schemas.openxmlformats.org/drawingml/2006/picture")
        .with_child(Element::new("pic:pic")
            .with_child(Element::new("pic:nvPicPr")
                .with_child(Element::new("pic:cNvPr").with_attr("id", "0").with_attr("name", picture.name))
                .with_child(Element::new("pic:cNvPicPr")))
            .with_child(Element::new("pic:blipFill")
                .with_child(Element::new("a:blip").with_attr("r:embed", picture.relationship_id))
                .with_child(Element::new("a:stretch").with_child(Element::new("a:fillRect"))))
            .with_child(Element::new("pic:spPr")
                .with_child(Element::new("a:xfrm")
                    .with_child(Element::new("a:off").with_attr("x", "0").with_attr("y", "0"))
                    .with_child(Element::new("a:ext").with_attr("cx", &width).with_attr("cy", &height)))
                .with_child(Element::new("a:prstGeom").with_attr("prst", "rect")
                    .with_child(Element::new("a:avLst"))))));

    let inline = Element::new("wp:inline")
        .with_attr("distT", "0").with_attr("distB", "0")
        .with_attr("distL", "0").with_attr("distR", "0")
        .with_child(Element::new("wp:extent").with_attr("cx", &width).with_attr("cy", &height))
        .with_child(Element::new("wp:docPr")
            .with_attr("id", &drawing_id)
            .with_attr("name", &format!("Picture {drawing_id}")))
        .with_child(Element::new("wp:cNvGraphicFramePr").with_child(
            Element::new("a:graphicFrameLocks").with_attr("noChangeAspect", "1")))
        .with_child(graphic);

    Element::new("w:p")
        .with_child(centered())
        .with_child(Element::new("w:r").with_child(Element::new("w:drawing").with_child(inline)))
}
