//! XML serializer

use crate::error::{Error, Result};
use crate::xml::format::{DeclarationPolicy, FormatConfig};
use crate::xml::model::{Comment, Declaration, Document, Element, Instruction, Node};

/// Writes a [`Document`] back to text exactly as the tree describes it.
///
/// The writer adds no whitespace of its own inside the root element; run
/// [`indent`](crate::xml::format::indent) first for a pretty layout.
#[derive(Clone, Debug, Default)]
pub struct Writer {
    config: FormatConfig,
}

impl Writer {
    pub const fn new(config: FormatConfig) -> Self {
        Self { config }
    }

    pub fn write(&self, doc: &Document) -> Result<String> {
        let mut output = String::new();
        if doc.bom {
            output.push('\u{feff}');
        }

        let declaration = match self.config.declaration {
            DeclarationPolicy::Preserve => doc.declaration.clone(),
            DeclarationPolicy::Always => Some(doc.declaration.clone().unwrap_or_default()),
            DeclarationPolicy::Omit => None,
        };
        if let Some(declaration) = declaration {
            write_declaration(&declaration, &mut output);
            output.push('\n');
        }

        if let Some(doctype) = &doc.doctype {
            output.push_str(doctype);
            output.push('\n');
        }

        for node in &doc.prolog {
            self.write_node(node, &mut output)?;
            output.push('\n');
        }

        self.write_element(&doc.root, &mut output)?;

        for node in &doc.epilog {
            if !output.ends_with('\n') {
                output.push('\n');
            }
            self.write_node(node, &mut output)?;
        }
        if !doc.epilog.is_empty() && !output.ends_with('\n') {
            output.push('\n');
        }

        Ok(output)
    }

    fn write_node(&self, node: &Node, output: &mut String) -> Result<()> {
        match node {
            Node::Element(element) => self.write_element(element, output),
            Node::Comment(comment) => write_comment(comment, output),
            Node::Instruction(pi) => write_instruction(pi, output),
        }
    }

    fn write_element(&self, element: &Element, output: &mut String) -> Result<()> {
        if !is_valid_name(&element.name) {
            return Err(Error::unsupported(format!(
                "invalid element name '{}'",
                element.name
            )));
        }

        output.push('<');
        output.push_str(&element.name);

        for (key, value) in &element.attributes {
            if !is_valid_name(key) {
                return Err(Error::unsupported(format!(
                    "invalid attribute name '{key}' on <{}>",
                    element.name
                )));
            }
            output.push(' ');
            output.push_str(key);
            output.push_str("=\"");
            output.push_str(&escape_attribute(value));
            output.push('"');
        }

        let text = element.text.as_deref().unwrap_or_default();
        if text.is_empty() && element.children.is_empty() {
            output.push_str(if self.config.space_before_slash {
                " />"
            } else {
                "/>"
            });
        } else {
            output.push('>');
            output.push_str(&escape_text(text));
            for child in &element.children {
                self.write_node(child, output)?;
            }
            output.push_str("</");
            output.push_str(&element.name);
            output.push('>');
        }

        write_tail(element.tail.as_deref(), output);
        Ok(())
    }
}

fn write_declaration(declaration: &Declaration, output: &mut String) {
    output.push_str("<?xml version=\"");
    output.push_str(&declaration.version);
    output.push('"');
    if let Some(encoding) = &declaration.encoding {
        output.push_str(" encoding=\"");
        output.push_str(encoding);
        output.push('"');
    }
    if let Some(standalone) = declaration.standalone {
        output.push_str(if standalone {
            " standalone=\"yes\""
        } else {
            " standalone=\"no\""
        });
    }
    output.push_str("?>");
}

fn write_comment(comment: &Comment, output: &mut String) -> Result<()> {
    if comment.content.contains("--") || comment.content.ends_with('-') {
        return Err(Error::unsupported("comment contains '--'"));
    }
    output.push_str("<!--");
    output.push_str(&comment.content);
    output.push_str("-->");
    write_tail(comment.tail.as_deref(), output);
    Ok(())
}

fn write_instruction(pi: &Instruction, output: &mut String) -> Result<()> {
    if !is_valid_name(&pi.target) || pi.target.eq_ignore_ascii_case("xml") {
        return Err(Error::unsupported(format!(
            "invalid processing instruction target '{}'",
            pi.target
        )));
    }
    if pi.data.contains("?>") {
        return Err(Error::unsupported("processing instruction contains '?>'"));
    }
    output.push_str("<?");
    output.push_str(&pi.target);
    if !pi.data.is_empty() {
        output.push(' ');
        output.push_str(&pi.data);
    }
    output.push_str("?>");
    write_tail(pi.tail.as_deref(), output);
    Ok(())
}

fn write_tail(tail: Option<&str>, output: &mut String) {
    if let Some(tail) = tail {
        output.push_str(&escape_text(tail));
    }
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let forbidden = |c: char| {
        c.is_whitespace() || matches!(c, '<' | '>' | '&' | '"' | '\'' | '/' | '=' | '?' | '!')
    };
    !first.is_ascii_digit()
        && !matches!(first, '-' | '.')
        && !forbidden(first)
        && !chars.any(forbidden)
}

fn escape_text(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            // a literal CR would read back as LF
            '\r' => escaped.push_str("&#13;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn escape_attribute(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\n' => escaped.push_str("&#10;"),
            '\r' => escaped.push_str("&#13;"),
            '\t' => escaped.push_str("&#09;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn write(doc: &Document) -> Result<String> {
        Writer::default().write(doc)
    }

    #[test]
    fn test_write_empty_element_forms() -> Result<()> {
        let doc = Document::new(Element::new("Comment"));
        assert_eq!(write(&doc)?, "<Comment />");

        let compact = Writer::new(FormatConfig {
            space_before_slash: false,
            ..FormatConfig::default()
        });
        assert_eq!(compact.write(&doc)?, "<Comment/>");
        Ok(())
    }

    #[test]
    fn test_write_preserves_attribute_order_and_escapes() -> Result<()> {
        let root = Element::new("PropertyValue")
            .with_attribute("name", "Fonts & \"Colors\"")
            .with_attribute("ArrayType", "8")
            .with_text("a < b");
        assert_eq!(
            write(&Document::new(root))?,
            "<PropertyValue name=\"Fonts &amp; &quot;Colors&quot;\" ArrayType=\"8\">a &lt; b</PropertyValue>"
        );
        Ok(())
    }

    #[test]
    fn test_attribute_whitespace_escapes() -> Result<()> {
        let root = Element::new("a").with_attribute("v", "x\ny\tz\r");
        assert_eq!(
            write(&Document::new(root))?,
            "<a v=\"x&#10;y&#09;z&#13;\" />"
        );
        Ok(())
    }

    #[test]
    fn test_carriage_return_in_text_is_escaped() -> Result<()> {
        let root = Element::new("a")
            .with_child(Element::new("b").with_text("x\ry").with_tail("\r"));
        assert_eq!(
            write(&Document::new(root))?,
            "<a><b>x&#13;y</b>&#13;</a>"
        );
        Ok(())
    }

    #[test]
    fn test_write_text_tail_and_comments() -> Result<()> {
        let root = Element::new("r")
            .with_text("\n\t")
            .with_child(Comment {
                content: " c ".to_string(),
                tail: Some("\n\t".to_string()),
            })
            .with_child(Element::new("a").with_text("1").with_tail("\n"));
        let doc = Document::new(root);
        assert_eq!(write(&doc)?, "<r>\n\t<!-- c -->\n\t<a>1</a>\n</r>");
        Ok(())
    }

    #[test]
    fn test_declaration_policies() -> Result<()> {
        let mut doc = Document::new(Element::new("r"));
        assert_eq!(write(&doc)?, "<r />");

        let always = Writer::new(FormatConfig {
            declaration: DeclarationPolicy::Always,
            ..FormatConfig::default()
        });
        assert_eq!(
            always.write(&doc)?,
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<r />"
        );

        doc.declaration = Some(Declaration {
            version: "1.0".to_string(),
            encoding: None,
            standalone: Some(true),
        });
        assert_eq!(
            write(&doc)?,
            "<?xml version=\"1.0\" standalone=\"yes\"?>\n<r />"
        );

        let omit = Writer::new(FormatConfig {
            declaration: DeclarationPolicy::Omit,
            ..FormatConfig::default()
        });
        assert_eq!(omit.write(&doc)?, "<r />");
        Ok(())
    }

    #[test]
    fn test_bom_prolog_and_epilog() -> Result<()> {
        let mut doc = Document::new(Element::new("r"));
        doc.bom = true;
        doc.prolog.push(Comment::new(" head ").into());
        doc.epilog.push(
            Instruction {
                target: "end".to_string(),
                data: String::new(),
                tail: None,
            }
            .into(),
        );
        assert_eq!(write(&doc)?, "\u{feff}<!-- head -->\n<r />\n<?end?>\n");
        Ok(())
    }

    #[test]
    fn test_unsupported_structures() {
        let cases = [
            Document::new(Element::new("")),
            Document::new(Element::new("bad name")),
            Document::new(Element::new("r").with_attribute("1x", "v")),
            Document::new(Element::new("r").with_child(Comment::new("a--b"))),
            Document::new(Element::new("r").with_child(Instruction {
                target: "pi".to_string(),
                data: "x?>y".to_string(),
                tail: None,
            })),
        ];
        for doc in &cases {
            let kind = write(doc).map_err(|e| e.kind().clone()).err();
            assert!(
                matches!(kind, Some(ErrorKind::UnsupportedStructure { .. })),
                "expected failure for {doc:?}"
            );
        }
    }
}
