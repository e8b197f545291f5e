//! A self-contained JSON engine: a precision-preserving parser and printer
//! for an immutable document model, plus a type-directed bidirectional codec
//! between that model and native object graphs.
//!
//! The codec is driven by explicitly registered type schemas. Aggregates,
//! collections, maps, C-like enums, closed variant sets, transparent
//! wrappers and singletons all round-trip; whenever the declared type alone
//! could not reconstruct the runtime type, an injected `"_type"` witness
//! travels with the value.
//!
//! ```
//! use jsonbind::{reflect_struct, Codec, PrintMode};
//!
//! #[derive(Debug, PartialEq)]
//! struct Point {
//!     x: i64,
//!     y: i64,
//! }
//!
//! reflect_struct!(Point { x: i64, y: i64 });
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut codec = Codec::new();
//! codec.register::<Point>();
//!
//! let encoded = codec.encode_as(&Point { x: 1, y: 2 })?;
//! assert_eq!(
//!     jsonbind::print(&encoded, PrintMode::Compact),
//!     r#"{"x":1,"y":2}"#
//! );
//!
//! let parsed = jsonbind::parse(r#"{"x":3,"y":4}"#)?;
//! let point: Point = codec.decode_as(&parsed)?;
//! assert_eq!(point, Point { x: 3, y: 4 });
//! # Ok(())
//! # }
//! ```

mod codec;
mod decode;
mod encode;
mod error;
mod lexer;
mod parser;
mod printer;
mod registry;
mod ty;
mod value;

pub use codec::Codec;
pub use error::{CodecError, ParseError, ParseErrorKind};
pub use printer::PrintMode;
pub use registry::Converter;
pub use ty::{
    AggregateBuilder, DynValue, FieldValues, JsonKey, Reflected, TypeDesc, TypeInfo, UnionBuilder,
};
pub use value::{Decimal, JsObject, JsValue, Number};

use parser::Parser;

/// Parses a complete JSON document. Trailing non-whitespace is an error.
pub fn parse(input: &str) -> Result<JsValue, ParseError> {
    parse_bytes(input.as_bytes())
}

/// Parses a complete JSON document from raw bytes, validating UTF-8 first.
pub fn parse_bytes(input: &[u8]) -> Result<JsValue, ParseError> {
    Parser::new(input)?.parse_document()
}

/// Renders a document value as text. Pretty mode indents by two spaces with
/// `\n` line endings; use [`JsValue::to_pretty_string`] for custom
/// whitespace.
#[must_use]
pub fn print(value: &JsValue, mode: PrintMode) -> String {
    match mode {
        PrintMode::Compact => value.to_compact_string(),
        PrintMode::Pretty => value.to_pretty_string("  ", "\n"),
    }
}
