use thiserror::Error;

use crate::value::JsValue;

/// Failure raised by the lexer or the parser, with the byte offset of the
/// offending input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at byte {offset}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub offset: usize,
}

impl ParseError {
    pub(crate) fn new(kind: ParseErrorKind, offset: usize) -> Self {
        Self { kind, offset }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("unexpected character `{0}`")]
    UnexpectedCharacter(char),
    #[error("unterminated string")]
    UnterminatedString,
    #[error("invalid escape sequence")]
    InvalidEscape,
    #[error("invalid unicode escape")]
    InvalidUnicode,
    #[error("invalid literal")]
    InvalidLiteral,
    #[error("invalid number `{0}`")]
    InvalidNumber(String),
    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
    },
    #[error("trailing characters after the top-level value")]
    TrailingCharacters,
}

/// Typed failure produced by the encode/decode paths.
///
/// A failing conversion never yields a partially constructed value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },
    #[error("number {value} is out of range for `{target}`")]
    Range {
        value: String,
        target: &'static str,
    },
    #[error("missing required field `{field}` for `{container}`")]
    MissingField { field: String, container: String },
    #[error("unknown type witness `{0}`")]
    UnknownType(String),
    #[error("no JSON representation for `{0}`")]
    UnsupportedType(String),
    #[error("`{name}` is not a variant of `{ty}`")]
    UnknownVariant { name: String, ty: String },
}

impl CodecError {
    pub(crate) fn mismatch(expected: impl Into<String>, found: &JsValue) -> Self {
        CodecError::TypeMismatch {
            expected: expected.into(),
            found: found.kind().to_string(),
        }
    }
}
