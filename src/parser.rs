//! Data module parser - turns raw XML text into an ordered node tree

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to read file: {0}")]
    ReadFile(#[from] std::io::Error),
    #[error("Failed to parse XML: {message}")]
    Malformed {
        message: String,
        line: u32,
        column: u32,
    },
}

impl From<roxmltree::Error> for ParseError {
    fn from(err: roxmltree::Error) -> Self {
        let pos = err.pos();
        ParseError::Malformed {
            message: err.to_string(),
            line: pos.row,
            column: pos.col,
        }
    }
}

/// A node of the parsed tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An XML element with its attributes and ordered children
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Local name (namespace prefix stripped)
    pub name: String,
    pub attributes: Attributes,
    /// Children in document order
    pub children: Vec<Node>,
}

/// Attributes in document order; keys are unique
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
    /// Insert an attribute, keeping the first value if the key already exists
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        if self.contains(&key) {
            return false;
        }
        self.0.push((key, value.into()));
        true
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| k == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attributes = Attributes::default();
        for (k, v) in iter {
            attributes.insert(k, v);
        }
        attributes
    }
}

impl Node {
    /// Element name, `None` for text
    pub fn name(&self) -> Option<&str> {
        match self {
            Node::Element(e) => Some(&e.name),
            Node::Text(_) => None,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        }
    }

    /// Concatenated text of this node and all its descendants
    pub fn text_content(&self) -> String {
        match self {
            Node::Text(t) => t.clone(),
            Node::Element(e) => e.text_content(),
        }
    }

    /// Pre-order iterator over this node and everything beneath it
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Get an attribute value
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name)
    }

    /// Check if element has an attribute
    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.contains(name)
    }

    /// Direct element children in document order
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// First direct child element with the given name
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.child_elements().find(|e| e.name == name)
    }

    /// Check if element has a direct child with given name
    pub fn has_child(&self, name: &str) -> bool {
        self.child(name).is_some()
    }

    pub fn text_content(&self) -> String {
        self.children.iter().map(Node::text_content).collect()
    }
}

/// Pre-order traversal, see [`Node::descendants`]
pub struct Descendants<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        if let Node::Element(e) = node {
            self.stack.extend(e.children.iter().rev());
        }
        Some(node)
    }
}

/// Business rules switched off by `<!-- brex-disable ... -->` comments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Suppressions {
    /// A bare `brex-disable` switches off every rule
    pub all: bool,
    pub rules: HashSet<String>,
}

impl Suppressions {
    pub fn is_suppressed(&self, rule_id: &str) -> bool {
        self.all || self.rules.contains(rule_id)
    }

    pub fn is_empty(&self) -> bool {
        !self.all && self.rules.is_empty()
    }
}

static DIRECTIVE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*brex-disable(?:\s+([\w\-.,\s]*))?\s*$").unwrap());

/// A parsed document: the element tree plus directives found in comments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub root: Node,
    pub suppressions: Suppressions,
}

impl Document {
    /// Parse a data module from a file
    pub fn parse_file(path: &Path) -> Result<Self, ParseError> {
        let source = fs::read_to_string(path)?;
        Self::parse_str(&source)
    }

    /// Parse a data module from a string
    pub fn parse_str(source: &str) -> Result<Self, ParseError> {
        let doc = roxmltree::Document::parse(source)?;

        let mut suppressions = Suppressions::default();
        for comment in doc.descendants().filter(|n| n.is_comment()) {
            if let Some(caps) = comment.text().and_then(|t| DIRECTIVE_RE.captures(t)) {
                let ids: Vec<String> = caps
                    .get(1)
                    .map(|m| m.as_str())
                    .unwrap_or("")
                    .split(|c: char| c == ',' || c.is_whitespace())
                    .map(str::to_string)
                    .filter(|s| !s.is_empty())
                    .collect();
                if ids.is_empty() {
                    suppressions.all = true;
                } else {
                    suppressions.rules.extend(ids);
                }
            }
        }

        let root = convert(doc.root_element()).unwrap_or_else(|| Node::Element(Element::default()));

        Ok(Self { root, suppressions })
    }
}

/// Parse XML text into a node tree
///
/// Comments and processing instructions are dropped and CDATA sections are
/// merged into the surrounding text. All other text, whitespace included, is
/// kept as written; values are trimmed where rules read them. The result
/// depends on nothing but `xml`.
pub fn parse(xml: &str) -> Result<Node, ParseError> {
    Document::parse_str(xml).map(|doc| doc.root)
}

fn convert(node: roxmltree::Node) -> Option<Node> {
    if node.is_element() {
        let attributes = node
            .attributes()
            .map(|a| (a.name(), a.value()))
            .collect();
        let children = node.children().filter_map(convert).collect();
        Some(Node::Element(Element {
            name: node.tag_name().name().to_string(),
            attributes,
            children,
        }))
    } else if node.is_text() {
        node.text().map(|t| Node::Text(t.to_string()))
    } else {
        None
    }
}
