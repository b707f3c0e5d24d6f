//! A minimal owned XML tree for editing document parts in place.
//!
//! Text and attribute values are kept in their escaped form, so everything the editing code
//! doesn't touch is written back as it was read.

use std::borrow::Cow;
use std::fmt::Write;

use quick_xml::Reader;
use quick_xml::escape::{escape, unescape};
use quick_xml::events::{BytesStart, Event};

use crate::core::GenericResult;

const DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n";

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    Raw(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: &str) -> Element {
        Element {
            name: name.to_owned(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    fn from_start(event: &BytesStart) -> GenericResult<Element> {
        let mut element = Element::new(&String::from_utf8_lossy(event.name().as_ref()));

        for attribute in event.attributes() {
            let attribute = attribute.map_err(|e| format!("Invalid XML attribute: {e}"))?;
            element.attributes.push((
                String::from_utf8_lossy(attribute.key.as_ref()).into_owned(),
                String::from_utf8_lossy(&attribute.value).into_owned(),
            ));
        }

        Ok(element)
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Element {
        self.set_attr(name, value);
        self
    }

    pub fn with_child(mut self, child: Element) -> Element {
        self.children.push(Node::Element(child));
        self
    }

    pub fn with_text(mut self, text: &str) -> Element {
        self.children.push(Node::Text(escape(text).into_owned()));
        self
    }

    pub fn attr(&self, name: &str) -> Option<String> {
        self.attributes.iter().find(|(key, _)| key == name).map(|(_, value)| {
            unescape(value).unwrap_or(Cow::Borrowed(value.as_str())).into_owned()
        })
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        let value = escape(value).into_owned();

        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some(attribute) => attribute.1 = value,
            None => self.attributes.push((name.to_owned(), value)),
        }
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|element| element.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.elements_mut().find(|element| element.name == name)
    }

    /// Returns the child creating it at its schema position if it doesn't exist.
    pub fn ensure_child(&mut self, name: &str, order: &[&str]) -> &mut Element {
        let index = match self.children.iter().position(|node| is_element(node, name)) {
            Some(index) => index,
            None => self.insert_ordered(Element::new(name), order),
        };

        match &mut self.children[index] {
            Node::Element(element) => element,
            _ => unreachable!(),
        }
    }

    /// Replaces the child with the same name or inserts it according to the schema order of the
    /// element's children.
    pub fn set_child(&mut self, child: Element, order: &[&str]) {
        match self.children.iter().position(|node| is_element(node, &child.name)) {
            Some(index) => self.children[index] = Node::Element(child),
            None => {
                self.insert_ordered(child, order);
            },
        }
    }

    fn insert_ordered(&mut self, child: Element, order: &[&str]) -> usize {
        let rank = |name: &str| order.iter().position(|&other| other == name);
        let child_rank = rank(&child.name);

        let index = child_rank.and_then(|child_rank| {
            self.children.iter().position(|node| match node {
                Node::Element(element) => rank(&element.name).is_some_and(|rank| rank > child_rank),
                _ => false,
            })
        }).unwrap_or(self.children.len());

        self.children.insert(index, Node::Element(child));
        index
    }

    pub fn remove_children(&mut self, name: &str) {
        self.children.retain(|node| !is_element(node, name));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.elements().any(|element| element.name == name || element.contains(name))
    }

    /// Calls the function for every descendant element with the specified name. Matched elements
    /// are not descended into.
    pub fn for_each_mut<F: FnMut(&mut Element)>(&mut self, name: &str, f: &mut F) {
        for element in self.elements_mut() {
            if element.name == name {
                f(element);
            } else {
                element.for_each_mut(name, f);
            }
        }
    }

    pub fn find_all(&self, name: &str) -> Vec<&Element> {
        let mut found = Vec::new();

        for element in self.elements() {
            if element.name == name {
                found.push(element);
            }
            found.extend(element.find_all(name));
        }

        found
    }

    /// Unescaped text of all `w:t` descendants.
    pub fn text(&self) -> String {
        let mut text = String::new();

        for node in &self.children {
            match node {
                Node::Element(element) if element.name == "w:t" => {
                    for node in &element.children {
                        if let Node::Text(value) = node {
                            text.push_str(&unescape(value).unwrap_or(Cow::Borrowed(value.as_str())));
                        }
                    }
                },
                Node::Element(element) => text.push_str(&element.text()),
                _ => {},
            }
        }

        text
    }

    fn write(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);

        for (name, value) in &self.attributes {
            let _ = write!(out, " {}=\"{}\"", name, value.replace('"', "&quot;"));
        }

        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }

        out.push('>');
        for node in &self.children {
            match node {
                Node::Element(element) => element.write(out),
                Node::Text(text) | Node::Raw(text) => out.push_str(text),
            }
        }

        let _ = write!(out, "</{}>", self.name);
    }
}

fn is_element(node: &Node, name: &str) -> bool {
    matches!(node, Node::Element(element) if element.name == name)
}

#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    pub root: Element,
}

impl XmlDocument {
    pub fn new(root: Element) -> XmlDocument {
        XmlDocument {root}
    }

    pub fn parse(data: &[u8]) -> GenericResult<XmlDocument> {
        let data = std::str::from_utf8(data).map_err(|e| format!("Invalid XML encoding: {e}"))?;

        let mut reader = Reader::from_str(data);
        let mut stack: Vec<Element> = Vec::new();
        let mut root = None;

        loop {
            let event = reader.read_event().map_err(|e| format!("Invalid XML: {e}"))?;

            let node = match event {
                Event::Start(event) => {
                    stack.push(Element::from_start(&event)?);
                    continue;
                },
                Event::Empty(event) => Node::Element(Element::from_start(&event)?),
                Event::End(_) => Node::Element(stack.pop().ok_or("Invalid XML: unexpected closing tag")?),

                Event::Text(text) => Node::Text(String::from_utf8_lossy(&text).into_owned()),
                Event::GeneralRef(reference) => Node::Text(format!("&{};", String::from_utf8_lossy(&reference))),
                Event::CData(data) => Node::Raw(format!("<![CDATA[{}]]>", String::from_utf8_lossy(&data))),
                Event::Comment(comment) => Node::Raw(format!("<!--{}-->", String::from_utf8_lossy(&comment))),
                Event::PI(instruction) => Node::Raw(format!("<?{}?>", String::from_utf8_lossy(&instruction))),

                Event::Eof => break,
                _ => continue,
            };

            match stack.last_mut() {
                Some(parent) => parent.children.push(node),
                None => if let Node::Element(element) = node {
                    root = Some(element);
                },
            }
        }

        if !stack.is_empty() {
            return Err!("Invalid XML: unclosed {:?} element", stack[stack.len() - 1].name);
        }

        Ok(XmlDocument {
            root: root.ok_or("Invalid XML: there is no root element")?,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = String::from(DECLARATION);
        self.root.write(&mut out);
        out.into_bytes()
    }
}
