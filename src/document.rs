//! Typed element tree for schema documents.
//!
//! Documents are parsed with `quick-xml` into owned [`Element`] values so that
//! reference elements can be cloned out and kept after the document is dropped.

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

use crate::error::{LoadError, LoadResult};

/// A node inside an element's content
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An XML element with its qualified name, attributes in document order and children
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    /// Qualified name as written, e.g. `edmx:Reference`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attribute value by exact (case-sensitive) name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Direct element children
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// This element and all elements below it, in document order
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// Serialize this element and its subtree as indented XML
    pub fn to_pretty_xml(&self) -> LoadResult<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        write_element(&mut writer, self).map_err(|e| LoadError::Parse {
            source_name: self.name.clone(),
            details: e.to_string(),
        })?;

        String::from_utf8(writer.into_inner()).map_err(|e| LoadError::Parse {
            source_name: self.name.clone(),
            details: e.to_string(),
        })
    }
}

/// Depth-first, pre-order iterator over elements
pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let element = self.stack.pop()?;
        // Push in reverse so the first child is visited next.
        for child in element.children.iter().rev() {
            if let Node::Element(child) = child {
                self.stack.push(child);
            }
        }
        Some(element)
    }
}

fn write_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    element: &Element,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for child in &element.children {
        match child {
            Node::Element(child) => write_element(writer, child)?,
            Node::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
        }
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
    Ok(())
}

/// A parsed schema document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    roots: Vec<Element>,
}

impl Document {
    /// Parse XML text into a document.
    ///
    /// Fragments with several top-level elements are accepted; text without any
    /// element is rejected.
    pub fn parse(content: &str, source_name: &str) -> LoadResult<Self> {
        let parse_error = |details: String| LoadError::Parse {
            source_name: source_name.to_string(),
            details,
        };

        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(true);

        let mut roots = Vec::new();
        let mut stack: Vec<Element> = Vec::new();

        loop {
            let event = reader.read_event().map_err(|e| {
                parse_error(format!(
                    "{} at position {}",
                    e,
                    reader.error_position()
                ))
            })?;

            match event {
                Event::Start(start) => {
                    stack.push(element_from_start(&start).map_err(parse_error)?);
                }
                Event::Empty(start) => {
                    let element = element_from_start(&start).map_err(parse_error)?;
                    attach(&mut stack, &mut roots, element);
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| parse_error("unexpected closing tag".to_string()))?;
                    attach(&mut stack, &mut roots, element);
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(|e| parse_error(e.to_string()))?;
                    if text.is_empty() {
                        continue;
                    }
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(Node::Text(text.into_owned()));
                    }
                }
                Event::CData(data) => {
                    let text = String::from_utf8_lossy(&data.into_inner()).into_owned();
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(Node::Text(text));
                    }
                }
                Event::Eof => break,
                Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(parse_error(format!("unclosed element <{}>", open.name)));
        }
        if roots.is_empty() {
            return Err(parse_error("document contains no elements".to_string()));
        }

        Ok(Self { roots })
    }

    /// Top-level elements
    pub fn roots(&self) -> &[Element] {
        &self.roots
    }

    /// Every element in the document, in document order
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.roots.iter().flat_map(Element::descendants)
    }

    /// Elements whose qualified name matches exactly
    pub fn elements_by_name<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.elements().filter(move |element| element.name == name)
    }
}

fn element_from_start(start: &BytesStart<'_>) -> Result<Element, String> {
    let name = std::str::from_utf8(start.name().as_ref())
        .map_err(|e| e.to_string())?
        .to_string();

    let mut element = Element::new(name);
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| e.to_string())?;
        let key = std::str::from_utf8(attribute.key.as_ref())
            .map_err(|e| e.to_string())?
            .to_string();
        let value = attribute
            .unescape_value()
            .map_err(|e| e.to_string())?
            .into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn attach(stack: &mut [Element], roots: &mut Vec<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None => roots.push(element),
    }
}
