//! One-token-lookahead recursive descent parser.
//!
//! A parser is a one-shot, non-recoverable pure function from a token stream
//! to a single [`JsValue`], consuming the whole top-level value. Recursion
//! depth equals the nesting depth of the input; bounding it is the caller's
//! responsibility.

use crate::error::{ParseError, ParseErrorKind};
use crate::lexer::{Lexer, Token};
use crate::value::{JsObject, JsValue, Number};

pub(crate) struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    /// Byte offset at which `current` starts.
    offset: usize,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(input: &'a [u8]) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(input)?;
        let current = lexer.next_token()?;
        let offset = lexer.token_start();
        Ok(Self {
            lexer,
            current,
            offset,
        })
    }

    pub(crate) fn parse_document(mut self) -> Result<JsValue, ParseError> {
        let value = self.parse_value()?;
        if self.current != Token::Eof {
            return Err(ParseError::new(
                ParseErrorKind::TrailingCharacters,
                self.offset,
            ));
        }
        Ok(value)
    }

    fn advance(&mut self) -> Result<Token, ParseError> {
        let next = self.lexer.next_token()?;
        self.offset = self.lexer.token_start();
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn expect(&mut self, expected: Token, description: &'static str) -> Result<(), ParseError> {
        if self.current == expected {
            self.advance()?;
            Ok(())
        } else {
            Err(self.unexpected(description))
        }
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        ParseError::new(
            ParseErrorKind::UnexpectedToken {
                expected,
                found: self.current.to_string(),
            },
            self.offset,
        )
    }

    fn parse_value(&mut self) -> Result<JsValue, ParseError> {
        match &self.current {
            Token::Null => {
                self.advance()?;
                Ok(JsValue::Null)
            }
            Token::True => {
                self.advance()?;
                Ok(JsValue::Bool(true))
            }
            Token::False => {
                self.advance()?;
                Ok(JsValue::Bool(false))
            }
            Token::String(_) => {
                let Token::String(text) = self.advance()? else {
                    unreachable!("current token was a string");
                };
                Ok(JsValue::String(text))
            }
            Token::Number(_) => {
                let offset = self.offset;
                let Token::Number(lexeme) = self.advance()? else {
                    unreachable!("current token was a number");
                };
                let number = Number::from_lexeme(&lexeme)
                    .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidNumber(lexeme), offset))?;
                Ok(JsValue::Number(number))
            }
            Token::LeftBracket => self.parse_array(),
            Token::LeftBrace => self.parse_object(),
            _ => Err(self.unexpected("a value")),
        }
    }

    fn parse_array(&mut self) -> Result<JsValue, ParseError> {
        self.advance()?;
        let mut items = Vec::new();
        if self.current == Token::RightBracket {
            self.advance()?;
            return Ok(JsValue::Array(items));
        }
        items.push(self.parse_value()?);
        while self.current == Token::Comma {
            self.advance()?;
            items.push(self.parse_value()?);
        }
        self.expect(Token::RightBracket, "`,` or `]`")?;
        Ok(JsValue::Array(items))
    }

    fn parse_object(&mut self) -> Result<JsValue, ParseError> {
        self.advance()?;
        let mut object = JsObject::new();
        if self.current == Token::RightBrace {
            self.advance()?;
            return Ok(JsValue::Object(object));
        }
        self.parse_member(&mut object)?;
        while self.current == Token::Comma {
            self.advance()?;
            self.parse_member(&mut object)?;
        }
        self.expect(Token::RightBrace, "`,` or `}`")?;
        Ok(JsValue::Object(object))
    }

    fn parse_member(&mut self, object: &mut JsObject) -> Result<(), ParseError> {
        let Token::String(_) = &self.current else {
            return Err(self.unexpected("an object key"));
        };
        let Token::String(key) = self.advance()? else {
            unreachable!("current token was a string");
        };
        self.expect(Token::Colon, "`:`")?;
        let value = self.parse_value()?;
        // Duplicate keys: the last occurrence wins, keeping the position of
        // the first. Policy, not a stability guarantee.
        object.insert(key, value);
        Ok(())
    }
}
