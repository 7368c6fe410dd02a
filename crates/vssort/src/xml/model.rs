//! XML data model
//!
//! Text is stored the way ElementTree stores it: `text` is the character data
//! between an element's start tag and its first child, `tail` is the character
//! data following a node up to its next sibling (or the parent's end tag).

use indexmap::IndexMap;

/// XML declaration (`<?xml version="1.0" encoding="utf-8"?>`)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<bool>,
}

impl Default for Declaration {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            encoding: Some("utf-8".to_string()),
            standalone: None,
        }
    }
}

/// XML document
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    /// Source started with a byte order mark
    pub bom: bool,
    pub declaration: Option<Declaration>,
    /// Raw `<!DOCTYPE ...>` markup
    pub doctype: Option<String>,
    /// Comments and processing instructions before the root element
    pub prolog: Vec<Node>,
    pub root: Element,
    /// Comments and processing instructions after the root element
    pub epilog: Vec<Node>,
}

impl Document {
    pub fn new(root: Element) -> Self {
        Self {
            bom: false,
            declaration: None,
            doctype: None,
            prolog: Vec::new(),
            root,
            epilog: Vec::new(),
        }
    }
}

/// XML element
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: IndexMap<String, String>,
    pub text: Option<String>,
    pub tail: Option<String>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_tail(mut self, tail: impl Into<String>) -> Self {
        self.tail = Some(tail.into());
        self
    }

    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Direct children that are elements
    pub fn child_elements(&self) -> impl Iterator<Item = &Self> {
        self.children.iter().filter_map(Node::as_element)
    }
}

/// `<!-- ... -->`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Comment {
    pub content: String,
    pub tail: Option<String>,
}

impl Comment {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tail: None,
        }
    }
}

/// `<?target data?>`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Instruction {
    pub target: String,
    pub data: String,
    pub tail: Option<String>,
}

/// XML content node
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Element(Element),
    Comment(Comment),
    Instruction(Instruction),
}

impl Node {
    pub const fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn tail(&self) -> Option<&str> {
        match self {
            Self::Element(element) => element.tail.as_deref(),
            Self::Comment(comment) => comment.tail.as_deref(),
            Self::Instruction(pi) => pi.tail.as_deref(),
        }
    }

    pub fn set_tail(&mut self, tail: Option<String>) {
        *self.tail_mut() = tail;
    }

    pub fn tail_mut(&mut self) -> &mut Option<String> {
        match self {
            Self::Element(element) => &mut element.tail,
            Self::Comment(comment) => &mut comment.tail,
            Self::Instruction(pi) => &mut pi.tail,
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

impl From<Comment> for Node {
    fn from(comment: Comment) -> Self {
        Self::Comment(comment)
    }
}

impl From<Instruction> for Node {
    fn from(pi: Instruction) -> Self {
        Self::Instruction(pi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_keeps_attribute_order() {
        let element = Element::new("Category")
            .with_attribute("name", "Environment_General")
            .with_attribute("Category", "{1EDA5DD4}")
            .with_attribute("Package", "{DA9FB551}");
        let names: Vec<&str> = element.attributes.keys().map(String::as_str).collect();
        assert_eq!(names, ["name", "Category", "Package"]);
        assert_eq!(element.attribute("Package"), Some("{DA9FB551}"));
        assert_eq!(element.attribute("GUID"), None);
    }

    #[test]
    fn test_child_elements_skips_comments() {
        let element = Element::new("Root")
            .with_child(Comment::new(" note "))
            .with_child(Element::new("A"))
            .with_child(Element::new("B"));
        let names: Vec<&str> = element.child_elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["A", "B"]);
    }

    #[test]
    fn test_node_tail_accessors() {
        let mut node = Node::from(Comment::new("x"));
        assert_eq!(node.tail(), None);
        node.set_tail(Some("\n".to_string()));
        assert_eq!(node.tail(), Some("\n"));
        assert!(node.as_element().is_none());
    }
}
