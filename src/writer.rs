//! Rendering of a generic element tree to indented XML text.

use quick_xml::escape::escape;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Spaces added per level of nesting
const INDENT: usize = 4;

/// A generic element to be written out
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Node {
    pub tag: String,
    pub attributes: Vec<(String, Option<String>)>,
    pub value: Option<String>,
    pub cdata: bool,
    pub children: Vec<Node>,
    /// Keep the element even when trimming finds nothing in it
    pub required: bool,
}

impl Node {
    pub fn new(tag: &str) -> Self {
        Node {
            tag: tag.to_string(),
            ..Node::default()
        }
    }

    pub fn attr<T: ToString>(mut self, name: &str, value: Option<T>) -> Self {
        self.attributes
            .push((name.to_string(), value.map(|value| value.to_string())));
        self
    }

    pub fn value<T: ToString>(mut self, value: Option<T>) -> Self {
        self.value = value.map(|value| value.to_string());
        self
    }

    /// Write the value as one or more CDATA sections
    pub fn cdata(mut self) -> Self {
        self.cdata = true;
        self
    }

    pub fn child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn children<I: IntoIterator<Item = Node>>(mut self, children: I) -> Self {
        self.children.extend(children);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// A node has presence when it holds a value, children or a set attribute
    fn has_presence(&self) -> bool {
        self.value.is_some()
            || !self.children.is_empty()
            || self.attributes.iter().any(|(_, value)| value.is_some())
    }
}

/// Render a node tree to XML text, starting with an XML declaration
///
/// With `trim`, absent attributes are left out and elements without presence
/// are dropped unless marked required.
pub fn write_xml(root: &Node, trim: bool) -> String {
    let mut lines = vec![XML_DECLARATION.to_string()];
    write_node(root, 0, trim, &mut lines);
    lines.join("\n")
}

fn write_node(node: &Node, indentation: usize, trim: bool, lines: &mut Vec<String>) {
    if trim && !node.has_presence() && !node.required {
        return;
    }

    let whitespace = " ".repeat(indentation);
    let mut opening = format!("<{}", node.tag);
    for (name, value) in &node.attributes {
        match value {
            Some(value) => opening.push_str(&format!(" {}=\"{}\"", name, escape(value))),
            None if !trim => opening.push_str(&format!(" {}=\"\"", name)),
            None => {}
        }
    }
    opening.push('>');
    let closing = format!("</{}>", node.tag);

    if node.children.is_empty() {
        lines.push(format!("{}{}{}{}", whitespace, opening, node_value(node), closing));
    } else {
        lines.push(format!("{}{}", whitespace, opening));
        for child in &node.children {
            write_node(child, indentation + INDENT, trim, lines);
        }
        lines.push(format!("{}{}", whitespace, closing));
    }
}

fn node_value(node: &Node) -> String {
    let value = node.value.as_deref().unwrap_or_default();
    if node.cdata {
        make_cdata(value)
    } else {
        escape(value).into_owned()
    }
}

/// Wrap text in CDATA sections, splitting at every `]]>`
///
/// The split falls between `]]` and `>`, so no section ever contains the
/// terminator and the sections concatenate back to the original text.
pub fn make_cdata(text: &str) -> String {
    let mut result = String::new();
    let mut cursor = 0;

    for (index, _) in text.match_indices("]]>") {
        let end = index + 2;
        push_section(&mut result, &text[cursor..end]);
        cursor = end;
    }
    push_section(&mut result, &text[cursor..]);

    result
}

fn push_section(result: &mut String, part: &str) {
    result.push_str("<![CDATA[");
    result.push_str(part);
    result.push_str("]]>");
}
