//! Output layout options and the indentation pass

use std::fmt;
use std::str::FromStr;

use crate::xml::model::{Element, Node};

/// One level of indentation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Indent {
    #[default]
    Tab,
    Spaces(u8),
}

impl Indent {
    /// Indentation string for `level` nesting levels
    pub fn repeat(self, level: usize) -> String {
        match self {
            Self::Tab => "\t".repeat(level),
            Self::Spaces(n) => " ".repeat(usize::from(n).saturating_mul(level)),
        }
    }
}

impl fmt::Display for Indent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tab => write!(f, "tab"),
            Self::Spaces(n) => write!(f, "{n}"),
        }
    }
}

impl FromStr for Indent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("tab") {
            return Ok(Self::Tab);
        }
        s.parse::<u8>()
            .map(Self::Spaces)
            .map_err(|_| format!("expected 'tab' or a number of spaces, got '{s}'"))
    }
}

/// What to do with the `<?xml ...?>` declaration on output
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeclarationPolicy {
    /// Write it only if the input had one
    #[default]
    Preserve,
    Always,
    Omit,
}

/// Configuration options for writing XML
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormatConfig {
    pub indent: Indent,
    pub declaration: DeclarationPolicy,
    /// Write empty elements as `<Tag />` rather than `<Tag/>`
    pub space_before_slash: bool,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            indent: Indent::Tab,
            declaration: DeclarationPolicy::Preserve,
            space_before_slash: true,
        }
    }
}

/// Lay the tree out one element per line.
///
/// Only whitespace-only `text` and `tail` slots are rewritten, so character
/// data inside leaf elements and mixed content survive untouched. Running the
/// pass twice gives the same tree as running it once.
pub fn indent(root: &mut Element, unit: Indent) {
    indent_element(root, 0, unit);
}

fn indent_element(element: &mut Element, level: usize, unit: Indent) {
    let pad = unit.repeat(level);
    if element.children.is_empty() {
        if level > 0 && is_blank(element.tail.as_deref()) {
            element.tail = Some(format!("\n{pad}"));
        }
        return;
    }

    if is_blank(element.text.as_deref()) {
        element.text = Some(format!("\n{pad}{}", unit.repeat(1)));
    }
    if is_blank(element.tail.as_deref()) {
        element.tail = Some(format!("\n{pad}"));
    }
    for child in &mut element.children {
        indent_node(child, level + 1, unit);
    }
    if let Some(last) = element.children.last_mut() {
        if is_blank(last.tail()) {
            last.set_tail(Some(format!("\n{pad}")));
        }
    }
}

fn indent_node(node: &mut Node, level: usize, unit: Indent) {
    match node {
        Node::Element(element) => indent_element(element, level, unit),
        Node::Comment(_) | Node::Instruction(_) => {
            if is_blank(node.tail()) {
                node.set_tail(Some(format!("\n{}", unit.repeat(level))));
            }
        }
    }
}

fn is_blank(slot: Option<&str>) -> bool {
    slot.map_or(true, |s| s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::model::Comment;

    #[test]
    fn test_indent_from_str() {
        assert_eq!("tab".parse::<Indent>(), Ok(Indent::Tab));
        assert_eq!("TAB".parse::<Indent>(), Ok(Indent::Tab));
        assert_eq!("2".parse::<Indent>(), Ok(Indent::Spaces(2)));
        assert!("two".parse::<Indent>().is_err());
    }

    #[test]
    fn test_indent_repeat() {
        assert_eq!(Indent::Tab.repeat(2), "\t\t");
        assert_eq!(Indent::Spaces(4).repeat(2), " ".repeat(8));
        assert_eq!(Indent::Tab.repeat(0), "");
    }

    #[test]
    fn test_indent_nested_tree() {
        let mut root = Element::new("UserSettings").with_child(
            Element::new("Category")
                .with_child(Element::new("PropertyValue").with_text("true"))
                .with_child(Comment::new("c")),
        );
        indent(&mut root, Indent::Tab);

        assert_eq!(root.text.as_deref(), Some("\n\t"));
        assert_eq!(root.tail.as_deref(), Some("\n"));
        let category = root.child_elements().next().cloned().unwrap_or_default();
        assert_eq!(category.text.as_deref(), Some("\n\t\t"));
        assert_eq!(category.tail.as_deref(), Some("\n"));
        let tails: Vec<Option<&str>> = category.children.iter().map(Node::tail).collect();
        assert_eq!(tails, [Some("\n\t\t"), Some("\n\t")]);
        let value = category.child_elements().next().cloned().unwrap_or_default();
        assert_eq!(value.text.as_deref(), Some("true"));
    }

    #[test]
    fn test_indent_keeps_text_content() {
        let mut root = Element::new("r")
            .with_text("lead")
            .with_child(Element::new("a").with_tail(" after "));
        indent(&mut root, Indent::Tab);
        assert_eq!(root.text.as_deref(), Some("lead"));
        let tail = root.children.first().and_then(Node::tail);
        assert_eq!(tail, Some(" after "));
    }

    #[test]
    fn test_indent_leaf_root_untouched() {
        let mut root = Element::new("r");
        indent(&mut root, Indent::Tab);
        assert_eq!(root, Element::new("r"));
    }

    #[test]
    fn test_indent_is_idempotent() {
        let mut root = Element::new("a").with_child(
            Element::new("b")
                .with_child(Element::new("c"))
                .with_child(Element::new("d")),
        );
        indent(&mut root, Indent::Spaces(2));
        let once = root.clone();
        indent(&mut root, Indent::Spaces(2));
        assert_eq!(root, once);
    }
}
