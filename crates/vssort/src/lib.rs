//! vssort - deterministic ordering for Visual Studio `.vssettings` files
//!
//! Exported settings list categories and properties in whatever order the IDE
//! happened to walk them, which makes diffs between two exports useless. This
//! crate sorts `PropertyValue`, `ToolsOptionsCategory`,
//! `ToolsOptionsSubCategory` and `Category` siblings by name and writes the
//! result back with tab indentation.
//!
//! # Quick Start
//!
//! ```
//! use vssort::{normalize_str, Options};
//! # fn main() -> Result<(), vssort::Error> {
//! let input = r#"<Root><PropertyValue name="B">1</PropertyValue><PropertyValue name="A">2</PropertyValue></Root>"#;
//! let output = normalize_str(input, &Options::default())?;
//! assert_eq!(
//!     output,
//!     "<Root>\n\t<PropertyValue name=\"A\">2</PropertyValue>\n\t<PropertyValue name=\"B\">1</PropertyValue>\n</Root>\n"
//! );
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

use tracing::{debug, instrument};

pub mod error;
pub use error::{Error, ErrorKind, Pos, Result, Span};

pub mod input;
pub use input::{Input, SourceEncoding};

pub mod rules;
pub use rules::{SortRule, SortRules, VSSETTINGS_RULES};

pub mod sort;
pub use sort::{sort, sort_document, sort_in_place, SortStats};

pub mod xml;
pub use xml::{
    Config, DeclarationPolicy, Document, Element, FormatConfig, Indent, Node, Parser, Writer,
};

/// Options for the full parse, sort and write pipeline
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Options {
    pub parser: Config,
    pub rules: SortRules,
    pub format: FormatConfig,
}

/// Parse XML from string
pub fn from_xml_str(s: &str) -> Result<Document> {
    from_xml_str_with_config(s, Config::default())
}

/// Parse XML from string with custom configuration
pub fn from_xml_str_with_config(s: &str, config: Config) -> Result<Document> {
    let input = Input::text(s);
    parse_input(&input, config)
}

/// Parse XML from bytes, detecting UTF-8 or UTF-16 from the byte order mark
pub fn from_xml_bytes(bytes: &[u8]) -> Result<Document> {
    from_xml_bytes_with_config(bytes, Config::default())
}

/// Parse XML from bytes with custom configuration
pub fn from_xml_bytes_with_config(bytes: &[u8], config: Config) -> Result<Document> {
    let input = Input::decode(bytes)?;
    parse_input(&input, config)
}

fn parse_input(input: &Input<'_>, config: Config) -> Result<Document> {
    let mut parser = Parser::with_config(input.as_bytes(), config);
    let mut doc = parser.parse()?;
    doc.bom |= input.has_bom();
    // output is always utf-8
    if let Some(declaration) = doc.declaration.as_mut() {
        let declares_utf16 = declaration
            .encoding
            .as_deref()
            .is_some_and(|encoding| encoding.to_ascii_lowercase().starts_with("utf-16"));
        if input.encoding().is_utf16() || declares_utf16 {
            declaration.encoding = Some("utf-8".to_string());
        }
    }
    Ok(doc)
}

/// Write a document as-is, without re-indenting
pub fn to_xml_string(doc: &Document, config: &FormatConfig) -> Result<String> {
    Writer::new(config.clone()).write(doc)
}

/// Sort and re-indent a parsed document, then write it
pub fn normalize_document(mut doc: Document, options: &Options) -> Result<String> {
    sort_document(&mut doc, &options.rules);
    xml::indent(&mut doc.root, options.format.indent);
    to_xml_string(&doc, &options.format)
}

/// Parse, sort, indent and write a settings file held in memory
#[instrument(skip_all, fields(len = bytes.len()))]
pub fn normalize(bytes: &[u8], options: &Options) -> Result<String> {
    let doc = from_xml_bytes_with_config(bytes, options.parser)?;
    debug!(root = %doc.root.name, "normalizing document");
    normalize_document(doc, options)
}

/// [`normalize`] for input already held as a string
pub fn normalize_str(s: &str, options: &Options) -> Result<String> {
    let doc = from_xml_str_with_config(s, options.parser)?;
    normalize_document(doc, options)
}
