//! JSON tokenizer.
//!
//! Produces one token per call over a UTF-8 validated byte stream, keeping a
//! running byte offset for error reporting. The lexer is one-shot: after the
//! first failure its state is unspecified.

use std::fmt;

use crate::error::{ParseError, ParseErrorKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Colon,
    Comma,
    Null,
    True,
    False,
    /// Fully unescaped string contents.
    String(String),
    /// Raw number lexeme; validated by the parser, never partially consumed.
    Number(String),
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LeftBrace => f.write_str("`{`"),
            Token::RightBrace => f.write_str("`}`"),
            Token::LeftBracket => f.write_str("`[`"),
            Token::RightBracket => f.write_str("`]`"),
            Token::Colon => f.write_str("`:`"),
            Token::Comma => f.write_str("`,`"),
            Token::Null => f.write_str("`null`"),
            Token::True => f.write_str("`true`"),
            Token::False => f.write_str("`false`"),
            Token::String(_) => f.write_str("a string"),
            Token::Number(_) => f.write_str("a number"),
            Token::Eof => f.write_str("end of input"),
        }
    }
}

#[derive(Debug)]
pub(crate) struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
    token_start: usize,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(input: &'a [u8]) -> Result<Self, ParseError> {
        if let Err(error) = std::str::from_utf8(input) {
            return Err(ParseError::new(
                ParseErrorKind::InvalidUnicode,
                error.valid_up_to(),
            ));
        }
        Ok(Self {
            input,
            pos: 0,
            token_start: 0,
        })
    }

    /// Byte offset at which the most recently produced token starts.
    pub(crate) fn token_start(&self) -> usize {
        self.token_start
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let byte = self.peek();
        if byte.is_some() {
            self.pos += 1;
        }
        byte
    }

    fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.peek() {
            self.pos += 1;
        }
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(kind, self.pos)
    }

    pub(crate) fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_whitespace();
        self.token_start = self.pos;
        match self.peek() {
            None => Ok(Token::Eof),
            Some(b'{') => self.structural(Token::LeftBrace),
            Some(b'}') => self.structural(Token::RightBrace),
            Some(b'[') => self.structural(Token::LeftBracket),
            Some(b']') => self.structural(Token::RightBracket),
            Some(b':') => self.structural(Token::Colon),
            Some(b',') => self.structural(Token::Comma),
            Some(b'"') => self.read_string(),
            Some(b'-' | b'0'..=b'9') => Ok(self.read_number()),
            Some(b'n') => self.read_keyword("null", Token::Null),
            Some(b't') => self.read_keyword("true", Token::True),
            Some(b'f') => self.read_keyword("false", Token::False),
            Some(other) => Err(self.error(ParseErrorKind::UnexpectedCharacter(char::from(other)))),
        }
    }

    fn structural(&mut self, token: Token) -> Result<Token, ParseError> {
        self.pos += 1;
        Ok(token)
    }

    /// Each keyword literal requires an exact multi-character match.
    fn read_keyword(&mut self, keyword: &str, token: Token) -> Result<Token, ParseError> {
        let end = self.pos + keyword.len();
        if self.input.get(self.pos..end) == Some(keyword.as_bytes()) {
            self.pos = end;
            Ok(token)
        } else {
            Err(self.error(ParseErrorKind::InvalidLiteral))
        }
    }

    /// Greedy scan over the number character set. Shape validation happens in
    /// the parser, so a malformed lexeme is never partially consumed.
    fn read_number(&mut self) -> Token {
        let start = self.pos;
        while let Some(b'0'..=b'9' | b'-' | b'+' | b'.' | b'e' | b'E') = self.peek() {
            self.pos += 1;
        }
        let lexeme = std::str::from_utf8(&self.input[start..self.pos])
            .expect("validated UTF-8")
            .to_string();
        Token::Number(lexeme)
    }

    fn read_string(&mut self) -> Result<Token, ParseError> {
        // Opening quote.
        self.pos += 1;
        let mut result = String::new();
        let mut run_start = self.pos;
        loop {
            match self.advance() {
                None => return Err(self.error(ParseErrorKind::UnterminatedString)),
                Some(b'"') => {
                    self.push_run(&mut result, run_start, self.pos - 1);
                    return Ok(Token::String(result));
                }
                Some(b'\\') => {
                    self.push_run(&mut result, run_start, self.pos - 1);
                    let unescaped = self.read_escape()?;
                    result.push(unescaped);
                    run_start = self.pos;
                }
                Some(byte) if byte < 0x20 => {
                    self.pos -= 1;
                    return Err(self.error(ParseErrorKind::UnexpectedCharacter(char::from(byte))));
                }
                Some(_) => {}
            }
        }
    }

    fn push_run(&self, result: &mut String, start: usize, end: usize) {
        if start < end {
            result.push_str(std::str::from_utf8(&self.input[start..end]).expect("validated UTF-8"));
        }
    }

    fn read_escape(&mut self) -> Result<char, ParseError> {
        match self.advance() {
            None => Err(self.error(ParseErrorKind::UnterminatedString)),
            Some(b'"') => Ok('"'),
            Some(b'\'') => Ok('\''),
            Some(b'\\') => Ok('\\'),
            Some(b'/') => Ok('/'),
            Some(b'b') => Ok('\u{8}'),
            Some(b'f') => Ok('\u{c}'),
            Some(b'n') => Ok('\n'),
            Some(b'r') => Ok('\r'),
            Some(b't') => Ok('\t'),
            Some(b'u') => self.read_unicode_escape(),
            Some(_) => {
                self.pos -= 1;
                Err(self.error(ParseErrorKind::InvalidEscape))
            }
        }
    }

    /// `\uXXXX`, assembling surrogate pairs into one codepoint.
    fn read_unicode_escape(&mut self) -> Result<char, ParseError> {
        let unit = self.read_hex4()?;
        if (0xD800..=0xDBFF).contains(&unit) {
            if self.advance() != Some(b'\\') || self.advance() != Some(b'u') {
                return Err(self.error(ParseErrorKind::InvalidUnicode));
            }
            let low = self.read_hex4()?;
            if !(0xDC00..=0xDFFF).contains(&low) {
                return Err(self.error(ParseErrorKind::InvalidUnicode));
            }
            let codepoint = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
            return char::from_u32(codepoint).ok_or_else(|| {
                self.error(ParseErrorKind::InvalidUnicode)
            });
        }
        char::from_u32(unit).ok_or_else(|| self.error(ParseErrorKind::InvalidUnicode))
    }

    fn read_hex4(&mut self) -> Result<u32, ParseError> {
        let mut value = 0u32;
        for _ in 0..4 {
            let digit = match self.advance() {
                Some(byte @ b'0'..=b'9') => u32::from(byte - b'0'),
                Some(byte @ b'a'..=b'f') => u32::from(byte - b'a') + 10,
                Some(byte @ b'A'..=b'F') => u32::from(byte - b'A') + 10,
                _ => return Err(self.error(ParseErrorKind::InvalidUnicode)),
            };
            value = value * 16 + digit;
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn tokens(input: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(input.as_bytes()).expect("valid UTF-8");
        let mut out = Vec::new();
        loop {
            let token = lexer.next_token().expect("lexable input");
            let done = token == Token::Eof;
            out.push(token);
            if done {
                return out;
            }
        }
    }

    #[test]
    fn structural_tokens_and_keywords() {
        assert_eq!(
            tokens(" { } [ ] : , null true false "),
            vec![
                Token::LeftBrace,
                Token::RightBrace,
                Token::LeftBracket,
                Token::RightBracket,
                Token::Colon,
                Token::Comma,
                Token::Null,
                Token::True,
                Token::False,
                Token::Eof,
            ]
        );
    }

    #[test_case(r#""hello""#, "hello"; "plain string")]
    #[test_case(r#""""#, ""; "empty string")]
    #[test_case(r#""a\"b""#, "a\"b"; "escaped quote")]
    #[test_case(r#""a\'b""#, "a'b"; "escaped apostrophe")]
    #[test_case(r#""a\\b""#, "a\\b"; "escaped backslash")]
    #[test_case(r#""a\/b""#, "a/b"; "escaped slash")]
    #[test_case(r#""\b\f\n\r\t""#, "\u{8}\u{c}\n\r\t"; "control escapes")]
    #[test_case(r#""\u0041""#, "A"; "unicode escape")]
    #[test_case(r#""\uD83D\uDE00""#, "😀"; "escaped surrogate pair")]
    #[test_case(r#""é""#, "é"; "raw two byte passthrough")]
    #[test_case(r#""😀""#, "😀"; "raw four byte passthrough")]
    #[test_case("\"caf\u{e9}\"", "café"; "raw multibyte passthrough")]
    fn strings_unescape(input: &str, expected: &str) {
        assert_eq!(tokens(input), vec![Token::String(expected.into()), Token::Eof]);
    }

    #[test_case("42", "42")]
    #[test_case("-1.5e+10", "-1.5e+10")]
    #[test_case("1-2", "1-2"; "greedy scan defers validation")]
    fn numbers_are_raw_lexemes(input: &str, expected: &str) {
        assert_eq!(tokens(input), vec![Token::Number(expected.into()), Token::Eof]);
    }

    #[test_case("nul", 0, ParseErrorKind::InvalidLiteral)]
    #[test_case("truthy", 0, ParseErrorKind::InvalidLiteral)]
    #[test_case("%", 0, ParseErrorKind::UnexpectedCharacter('%'))]
    #[test_case("  %", 2, ParseErrorKind::UnexpectedCharacter('%'))]
    #[test_case("\"abc", 4, ParseErrorKind::UnterminatedString)]
    #[test_case(r#""\q""#, 2, ParseErrorKind::InvalidEscape)]
    #[test_case(r#""\uZZZZ""#, 4, ParseErrorKind::InvalidUnicode)]
    #[test_case(r#""\uD83D""#, 8, ParseErrorKind::InvalidUnicode; "lone high surrogate")]
    #[test_case(r#""\uDE00""#, 7, ParseErrorKind::InvalidUnicode; "lone low surrogate")]
    fn failures_carry_offsets(input: &str, offset: usize, kind: ParseErrorKind) {
        let mut lexer = Lexer::new(input.as_bytes()).expect("valid UTF-8");
        let error = lexer.next_token().expect_err("lex failure");
        assert_eq!(error.kind, kind);
        assert_eq!(error.offset, offset);
    }

    #[test]
    fn rejects_invalid_utf8() {
        let error = Lexer::new(&[0xFF, 0xFE]).expect_err("invalid UTF-8");
        assert_eq!(error.kind, ParseErrorKind::InvalidUnicode);
    }

    #[test]
    fn raw_control_characters_are_rejected() {
        let error = Lexer::new(b"\"a\nb\"")
            .expect("valid UTF-8")
            .next_token()
            .expect_err("control character");
        assert_eq!(error.kind, ParseErrorKind::UnexpectedCharacter('\n'));
        assert_eq!(error.offset, 2);
    }
}
