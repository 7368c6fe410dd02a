//! XML tree, parser and writer

pub mod cursor;
pub mod format;
pub mod model;
pub mod parser;
pub mod writer;

pub use format::{indent, DeclarationPolicy, FormatConfig, Indent};
pub use model::{Comment, Declaration, Document, Element, Instruction, Node};
pub use parser::{Config, Parser};
pub use writer::Writer;
