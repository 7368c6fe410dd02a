//! Input decoding
//!
//! Settings files exported by Visual Studio are UTF-8 with a BOM, but older
//! exports and hand-edited copies turn up as UTF-16. Everything is decoded to
//! UTF-8 before it reaches the parser.

use std::borrow::Cow;

use crate::error::{Error, ErrorKind, Result, Span};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const UTF16LE_BOM: &[u8] = b"\xFF\xFE";
const UTF16BE_BOM: &[u8] = b"\xFE\xFF";

/// Encoding detected from the byte order mark
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceEncoding {
    Utf8,
    Utf16Le,
    Utf16Be,
}

impl SourceEncoding {
    pub const fn is_utf16(self) -> bool {
        matches!(self, Self::Utf16Le | Self::Utf16Be)
    }
}

/// Decoded source text
#[derive(Clone, Debug)]
pub struct Input<'a> {
    text: Cow<'a, str>,
    encoding: SourceEncoding,
    bom: bool,
}

impl<'a> Input<'a> {
    /// Decode raw bytes, honouring a leading byte order mark
    pub fn decode(source: &'a [u8]) -> Result<Self> {
        if let Some(rest) = source.strip_prefix(UTF16LE_BOM) {
            let text = decode_utf16(rest, u16::from_le_bytes)?;
            return Ok(Self::owned(text, SourceEncoding::Utf16Le));
        }
        if let Some(rest) = source.strip_prefix(UTF16BE_BOM) {
            let text = decode_utf16(rest, u16::from_be_bytes)?;
            return Ok(Self::owned(text, SourceEncoding::Utf16Be));
        }

        let (bom, rest) = match source.strip_prefix(UTF8_BOM) {
            Some(rest) => (true, rest),
            None => (false, source),
        };
        let text = std::str::from_utf8(rest).map_err(|e| {
            Error::with_message(
                ErrorKind::InvalidUtf8,
                Span::empty(),
                format!("invalid utf-8 at byte {}", e.valid_up_to()),
            )
        })?;
        Ok(Self {
            text: Cow::Borrowed(text),
            encoding: SourceEncoding::Utf8,
            bom,
        })
    }

    /// Create from string
    pub fn text(source: &'a str) -> Self {
        let (bom, text) = match source.strip_prefix('\u{feff}') {
            Some(rest) => (true, rest),
            None => (false, source),
        };
        Self {
            text: Cow::Borrowed(text),
            encoding: SourceEncoding::Utf8,
            bom,
        }
    }

    /// UTF-16 is only recognised by its byte order mark
    fn owned(text: String, encoding: SourceEncoding) -> Self {
        Self {
            text: Cow::Owned(text),
            encoding,
            bom: true,
        }
    }

    /// Decoded text without the byte order mark
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    pub const fn encoding(&self) -> SourceEncoding {
        self.encoding
    }

    /// Whether the source started with a byte order mark
    pub const fn has_bom(&self) -> bool {
        self.bom
    }
}

fn decode_utf16(bytes: &[u8], to_unit: fn([u8; 2]) -> u16) -> Result<String> {
    let chunks = bytes.chunks_exact(2);
    if !chunks.remainder().is_empty() {
        return Err(Error::with_message(
            ErrorKind::InvalidUtf8,
            Span::empty(),
            "utf-16 input has an odd number of bytes",
        ));
    }
    let units: Vec<u16> = chunks
        .filter_map(|chunk| match chunk {
            [a, b] => Some(to_unit([*a, *b])),
            _ => None,
        })
        .collect();
    String::from_utf16(&units).map_err(|_| {
        Error::with_message(ErrorKind::InvalidUtf8, Span::empty(), "invalid utf-16")
    })
}
