//! XML parser implementation

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{Error, ErrorKind, Result, Span};
use crate::xml::cursor::{is_whitespace, Cursor};
use crate::xml::model::{Comment, Declaration, Document, Element, Instruction, Node};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Encodings accepted in the XML declaration. Input bytes are always UTF-8
/// by the time they reach the parser.
const SUPPORTED_ENCODINGS: &[&str] = &[
    "utf-8", "utf8", "us-ascii", "ascii", "utf-16", "utf-16le", "utf-16be",
];

/// Configuration for the XML parser
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Maximum element nesting depth (0 means unlimited)
    pub max_depth: u16,
    /// Maximum input size in bytes (0 means unlimited)
    pub max_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: 256,
            max_size: 64 * 1024 * 1024, // 64 MB default
        }
    }
}

impl Config {
    /// Create a new config with unlimited depth and size
    pub const fn unlimited() -> Self {
        Self {
            max_depth: 0,
            max_size: 0,
        }
    }

    /// Create a new config with specific limits
    pub const fn new(max_depth: u16, max_size: usize) -> Self {
        Self {
            max_depth,
            max_size,
        }
    }
}

/// XML parser
#[derive(Debug)]
pub struct Parser<'a> {
    cursor: Cursor<'a>,
    config: Config,
}

impl<'a> Parser<'a> {
    /// Create a new parser with default configuration
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_config(input, Config::default())
    }

    /// Create a new parser with custom configuration
    pub const fn with_config(input: &'a [u8], config: Config) -> Self {
        Self {
            cursor: Cursor::new(input),
            config,
        }
    }

    /// Parse an XML document
    pub fn parse(&mut self) -> Result<Document> {
        let size = self.cursor.remaining().len();
        if self.config.max_size > 0 && size > self.config.max_size {
            return Err(Error::at(
                ErrorKind::MaxSizeExceeded {
                    max: self.config.max_size,
                },
                self.cursor.position(),
            ));
        }

        let bom = self.cursor.consume_bytes(UTF8_BOM);
        let declaration = if self.at_declaration() {
            Some(self.parse_declaration()?)
        } else {
            None
        };

        let mut doctype = None;
        let mut prolog = Vec::new();
        loop {
            self.cursor.skip_whitespace();
            if self.cursor.is_eof() {
                return Err(self.error_kind_here(ErrorKind::MissingRoot));
            }
            if self.cursor.starts_with(b"<!--") {
                prolog.push(Node::Comment(self.parse_comment()?));
            } else if self.cursor.starts_with(b"<?") {
                prolog.push(Node::Instruction(self.parse_instruction()?));
            } else if self.cursor.starts_with(b"<!DOCTYPE") {
                if doctype.is_some() {
                    return Err(self.error_here("unexpected DOCTYPE"));
                }
                doctype = Some(self.parse_doctype()?);
            } else if self.cursor.current() == Some(b'<') {
                break;
            } else {
                return Err(self.error_here("text outside root element"));
            }
        }

        let root = self.parse_element(1)?;

        let mut epilog = Vec::new();
        loop {
            self.cursor.skip_whitespace();
            if self.cursor.is_eof() {
                break;
            }
            if self.cursor.starts_with(b"<!--") {
                epilog.push(Node::Comment(self.parse_comment()?));
            } else if self.cursor.starts_with(b"<?") {
                epilog.push(Node::Instruction(self.parse_instruction()?));
            } else {
                return Err(self.error_here("content after root element"));
            }
        }

        debug!(root = %root.name, "parsed xml document");
        Ok(Document {
            bom,
            declaration,
            doctype,
            prolog,
            root,
            epilog,
        })
    }

    fn at_declaration(&self) -> bool {
        self.cursor.starts_with(b"<?xml")
            && self
                .cursor
                .peek(5)
                .is_some_and(|b| is_whitespace(b) || b == b'?')
    }

    fn parse_declaration(&mut self) -> Result<Declaration> {
        self.cursor.advance_by(5);

        let mut version = None;
        let mut encoding = None;
        let mut standalone = None;
        loop {
            self.cursor.skip_whitespace();
            if self.cursor.consume_bytes(b"?>") {
                break;
            }
            if self.cursor.is_eof() {
                return Err(self.error_kind_here(ErrorKind::UnexpectedEof));
            }

            let name = self.parse_name()?;
            self.cursor.skip_whitespace();
            self.expect_byte(b'=')?;
            self.cursor.skip_whitespace();
            let value = self.parse_quoted_raw()?;

            match name.as_str() {
                "version" => version = Some(value),
                "encoding" => {
                    if !SUPPORTED_ENCODINGS
                        .iter()
                        .any(|known| known.eq_ignore_ascii_case(&value))
                    {
                        return Err(self.error_kind_here(ErrorKind::UnsupportedEncoding {
                            encoding: value,
                        }));
                    }
                    encoding = Some(value);
                }
                "standalone" => {
                    standalone = match value.as_str() {
                        "yes" => Some(true),
                        "no" => Some(false),
                        _ => return Err(self.error_here("standalone must be 'yes' or 'no'")),
                    };
                }
                _ => return Err(self.error_here("unknown attribute in xml declaration")),
            }
        }

        let Some(version) = version else {
            return Err(self.error_here("xml declaration without version"));
        };
        Ok(Declaration {
            version,
            encoding,
            standalone,
        })
    }

    fn parse_element(&mut self, depth: u16) -> Result<Element> {
        if self.config.max_depth > 0 && depth > self.config.max_depth {
            return Err(self.error_kind_here(ErrorKind::MaxDepthExceeded {
                max: self.config.max_depth,
            }));
        }

        self.expect_byte(b'<')?;
        let name = self.parse_name()?;
        let attributes = self.parse_attributes()?;

        let mut element = Element {
            name,
            attributes,
            ..Element::default()
        };

        if self.cursor.consume_bytes(b"/>") {
            return Ok(element);
        }
        self.expect_byte(b'>')?;

        loop {
            if self.cursor.is_eof() {
                return Err(self.error_with(
                    ErrorKind::UnexpectedEof,
                    format!("unterminated element <{}>", element.name),
                ));
            }

            if self.cursor.consume_bytes(b"</") {
                let close_name = self.parse_name()?;
                if close_name != element.name {
                    return Err(self.error_kind_here(ErrorKind::MismatchedTag {
                        expected: element.name,
                        found: close_name,
                    }));
                }
                self.cursor.skip_whitespace();
                self.expect_byte(b'>')?;
                break;
            }

            if self.cursor.starts_with(b"<!--") {
                let comment = self.parse_comment()?;
                element.children.push(Node::Comment(comment));
            } else if self.cursor.starts_with(b"<![CDATA[") {
                let text = self.parse_cdata()?;
                append_text(&mut element, &text);
            } else if self.cursor.starts_with(b"<?") {
                let pi = self.parse_instruction()?;
                element.children.push(Node::Instruction(pi));
            } else if self.cursor.starts_with(b"<!") {
                return Err(self.error_here("markup declaration inside element"));
            } else if self.cursor.current() == Some(b'<') {
                let child = self.parse_element(depth.saturating_add(1))?;
                element.children.push(Node::Element(child));
            } else {
                let text = self.parse_text()?;
                append_text(&mut element, &text);
            }
        }

        Ok(element)
    }

    fn parse_attributes(&mut self) -> Result<IndexMap<String, String>> {
        let mut attrs = IndexMap::new();

        loop {
            let had_space = self.cursor.current().is_some_and(is_whitespace);
            self.cursor.skip_whitespace();
            match self.cursor.current() {
                Some(b'/' | b'>') => break,
                Some(_) if !had_space => {
                    return Err(self.error_here("expected whitespace before attribute"));
                }
                Some(_) => {}
                None => return Err(self.error_kind_here(ErrorKind::UnexpectedEof)),
            }

            let name = self.parse_name()?;
            self.cursor.skip_whitespace();
            self.expect_byte(b'=')?;
            self.cursor.skip_whitespace();
            let value = self.parse_attribute_value()?;

            if attrs.contains_key(&name) {
                return Err(self.error_kind_here(ErrorKind::DuplicateAttribute { name }));
            }
            attrs.insert(name, value);
        }

        Ok(attrs)
    }

    fn parse_attribute_value(&mut self) -> Result<String> {
        let raw = self.parse_quoted_raw()?;
        if raw.contains('<') {
            return Err(self.error_here("'<' not allowed in attribute value"));
        }
        // attribute-value normalization: literal whitespace becomes a space
        let normalized = normalize_newlines(&raw).replace(['\n', '\t'], " ");
        self.decode_entities(&normalized)
    }

    fn parse_quoted_raw(&mut self) -> Result<String> {
        let quote = match self.cursor.current() {
            Some(q @ (b'"' | b'\'')) => q,
            _ => return Err(self.error_here("expected quoted attribute value")),
        };
        self.cursor.advance();

        let start = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == quote {
                let raw = self.cursor.slice_from(start);
                self.cursor.advance();
                return bytes_to_string(raw);
            }
            self.cursor.advance();
        }

        Err(self.error_with(ErrorKind::UnexpectedEof, "unterminated attribute value"))
    }

    fn parse_text(&mut self) -> Result<String> {
        let start = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == b'<' {
                break;
            }
            self.cursor.advance();
        }

        let raw = bytes_to_string(self.cursor.slice_from(start))?;
        self.decode_entities(&normalize_newlines(&raw))
    }

    fn parse_cdata(&mut self) -> Result<String> {
        self.cursor.advance_by(b"<![CDATA[".len());
        let raw = self.take_until(b"]]>")?;
        Ok(normalize_newlines(&raw))
    }

    fn parse_comment(&mut self) -> Result<Comment> {
        self.cursor.advance_by(b"<!--".len());
        let content = self.take_until(b"-->")?;
        if content.contains("--") || content.ends_with('-') {
            return Err(self.error_here("'--' not allowed in comment"));
        }
        Ok(Comment::new(normalize_newlines(&content)))
    }

    fn parse_instruction(&mut self) -> Result<Instruction> {
        self.cursor.advance_by(b"<?".len());
        let target = self.parse_name()?;
        if target.eq_ignore_ascii_case("xml") {
            return Err(self.error_here("xml declaration not at start of document"));
        }
        self.cursor.skip_whitespace();
        let data = self.take_until(b"?>")?;
        Ok(Instruction {
            target,
            data: normalize_newlines(&data),
            tail: None,
        })
    }

    fn parse_doctype(&mut self) -> Result<String> {
        let start = self.cursor.pos();
        let mut quote = None;
        let mut subset_depth = 0u32;
        while let Some(b) = self.cursor.current() {
            self.cursor.advance();
            match (quote, b) {
                (Some(q), _) if b == q => quote = None,
                (Some(_), _) => {}
                (None, b'"' | b'\'') => quote = Some(b),
                (None, b'[') => subset_depth += 1,
                (None, b']') => subset_depth = subset_depth.saturating_sub(1),
                (None, b'>') if subset_depth == 0 => {
                    return bytes_to_string(self.cursor.slice_from(start));
                }
                _ => {}
            }
        }
        Err(self.error_with(ErrorKind::UnexpectedEof, "unterminated DOCTYPE"))
    }

    fn parse_name(&mut self) -> Result<String> {
        let start = self.cursor.pos();

        let Some(first) = self.cursor.current() else {
            return Err(self.error_with(ErrorKind::UnexpectedEof, "expected name"));
        };
        if !is_name_start(first) {
            return Err(self.error_here("expected name"));
        }

        self.cursor.advance();
        while let Some(b) = self.cursor.current() {
            if is_name_char(b) {
                self.cursor.advance();
            } else {
                break;
            }
        }

        bytes_to_string(self.cursor.slice_from(start))
    }

    /// Consume input up to and including `pattern`, returning what came before it
    fn take_until(&mut self, pattern: &[u8]) -> Result<String> {
        let start = self.cursor.pos();
        while !self.cursor.is_eof() {
            if self.cursor.starts_with(pattern) {
                let raw = self.cursor.slice_from(start);
                self.cursor.advance_by(pattern.len());
                return bytes_to_string(raw);
            }
            self.cursor.advance();
        }
        Err(self.error_with(ErrorKind::UnexpectedEof, "unterminated markup"))
    }

    fn expect_byte(&mut self, expected: u8) -> Result<()> {
        if self.cursor.consume(expected) {
            Ok(())
        } else if self.cursor.is_eof() {
            Err(self.error_kind_here(ErrorKind::UnexpectedEof))
        } else {
            Err(self.error_here(&format!("expected '{}'", char::from(expected))))
        }
    }

    fn decode_entities(&self, input: &str) -> Result<String> {
        decode_entities(input).map_err(|entity| {
            self.error_kind_here(ErrorKind::InvalidEntity { entity })
        })
    }

    fn error_here(&self, message: &str) -> Error {
        self.error_with(ErrorKind::InvalidToken, message)
    }

    fn error_with(&self, kind: ErrorKind, message: impl Into<String>) -> Error {
        Error::with_message(kind, Span::at(self.cursor.position()), message)
    }

    fn error_kind_here(&self, kind: ErrorKind) -> Error {
        Error::at(kind, self.cursor.position())
    }
}

/// Append character data to the slot it belongs to: the element's own text
/// before any child, otherwise the tail of the last child.
fn append_text(element: &mut Element, text: &str) {
    if text.is_empty() {
        return;
    }
    let slot = match element.children.last_mut() {
        Some(node) => node.tail_mut(),
        None => &mut element.text,
    };
    slot.get_or_insert_with(String::new).push_str(text);
}

fn bytes_to_string(bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(ToString::to_string)
        .map_err(|_| Error::new(ErrorKind::InvalidUtf8, Span::empty()))
}

fn normalize_newlines(input: &str) -> String {
    if input.contains('\r') {
        input.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        input.to_string()
    }
}

fn is_name_start(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':') || b >= 0x80
}

fn is_name_char(b: u8) -> bool {
    is_name_start(b) || matches!(b, b'0'..=b'9' | b'-' | b'.')
}

/// Decode predefined and numeric character references. On failure returns
/// the offending entity name.
fn decode_entities(input: &str) -> std::result::Result<String, String> {
    if !input.contains('&') {
        return Ok(input.to_string());
    }

    let mut result = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        let (before, after) = rest.split_at(amp);
        result.push_str(before);
        let after = after.get(1..).unwrap_or_default();

        let Some(end) = after.find(';') else {
            return Err(after.chars().take(16).collect());
        };
        let (entity, remainder) = after.split_at(end);
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => decode_numeric_entity(entity),
        };
        match decoded {
            Some(ch) => result.push(ch),
            None => return Err(entity.to_string()),
        }
        rest = remainder.get(1..).unwrap_or_default();
    }
    result.push_str(rest);

    Ok(result)
}

fn decode_numeric_entity(entity: &str) -> Option<char> {
    if let Some(hex) = entity.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse::<u32>().ok().and_then(char::from_u32)
    } else {
        None
    }
}
