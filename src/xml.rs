use crate::error::{Result, VastError};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// An element of a parsed XML document
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlNode {
    tag: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<XmlNode>,
}

/// A parsed XML document that can be queried by tag selectors
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlDocument {
    roots: Vec<XmlNode>,
}

/// Text collected for an element, kept apart so CDATA is never trimmed
enum Piece {
    Text(String),
    CData(String),
}

/// An element whose end tag has not been read yet
struct OpenElement {
    node: XmlNode,
    pieces: Vec<Piece>,
}

impl OpenElement {
    fn finish(mut self) -> XmlNode {
        let has_cdata = self.pieces.iter().any(|piece| matches!(piece, Piece::CData(_)));

        let mut text = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::CData(data) => text.push_str(data),
                // Formatting whitespace around CDATA sections is not content
                Piece::Text(data) if has_cdata && data.trim().is_empty() => {}
                Piece::Text(data) => text.push_str(data),
            }
        }

        self.node.text = if has_cdata { text } else { text.trim().to_string() };
        self.node
    }
}

impl XmlDocument {
    /// Parse XML text into a queryable document
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut buf = Vec::new();
        let mut stack: Vec<OpenElement> = Vec::new();
        let mut roots = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    stack.push(open_element(&reader, e)?);
                }
                Ok(Event::Empty(ref e)) => {
                    let node = open_element(&reader, e)?.finish();
                    attach(&mut stack, &mut roots, node);
                }
                Ok(Event::End(_)) => {
                    if let Some(element) = stack.pop() {
                        attach(&mut stack, &mut roots, element.finish());
                    }
                }
                Ok(Event::Text(e)) => {
                    if let Some(element) = stack.last_mut() {
                        element.pieces.push(Piece::Text(e.unescape()?.into_owned()));
                    }
                }
                Ok(Event::CData(e)) => {
                    if let Some(element) = stack.last_mut() {
                        let data = reader.decoder().decode(&e)?.into_owned();
                        element.pieces.push(Piece::CData(data));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(VastError::XmlParseError(e)),
                _ => (),
            }
            buf.clear();
        }

        // Unclosed elements are kept rather than discarded
        while let Some(element) = stack.pop() {
            attach(&mut stack, &mut roots, element.finish());
        }

        Ok(XmlDocument { roots })
    }

    /// Find every element matching `selector`, in document order
    pub fn find(&self, selector: &str) -> Vec<&XmlNode> {
        let tags = selector_tags(selector);
        let mut found = Vec::new();
        for root in &self.roots {
            collect(root, &tags, &mut found);
        }
        found
    }
}

impl XmlNode {
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The element's text, or `None` when it has element children
    pub fn value(&self) -> Option<&str> {
        if self.children.is_empty() {
            Some(&self.text)
        } else {
            None
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    /// Find descendant elements matching a comma-separated list of tag names
    pub fn find(&self, selector: &str) -> Vec<&XmlNode> {
        let tags = selector_tags(selector);
        let mut found = Vec::new();
        for child in &self.children {
            collect(child, &tags, &mut found);
        }
        found
    }

    /// The first descendant matching `selector`
    pub fn first(&self, selector: &str) -> Option<&XmlNode> {
        self.find(selector).into_iter().next()
    }
}

fn selector_tags(selector: &str) -> Vec<&str> {
    selector
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .collect()
}

fn collect<'a>(node: &'a XmlNode, tags: &[&str], found: &mut Vec<&'a XmlNode>) {
    if tags.contains(&node.tag.as_str()) {
        found.push(node);
    }
    for child in &node.children {
        collect(child, tags, found);
    }
}

fn attach(stack: &mut [OpenElement], roots: &mut Vec<XmlNode>, node: XmlNode) {
    match stack.last_mut() {
        Some(parent) => parent.node.children.push(node),
        None => roots.push(node),
    }
}

/// Read the name and attributes of a start tag
fn open_element(reader: &Reader<&[u8]>, start: &BytesStart) -> Result<OpenElement> {
    let decoder = reader.decoder();
    let tag = decoder.decode(start.name().as_ref())?.into_owned();

    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = decoder.decode(attr.key.as_ref())?.into_owned();
        let value = attr.unescape_value()?.into_owned();
        attributes.push((key, value));
    }

    Ok(OpenElement {
        node: XmlNode {
            tag,
            attributes,
            ..XmlNode::default()
        },
        pieces: Vec::new(),
    })
}
