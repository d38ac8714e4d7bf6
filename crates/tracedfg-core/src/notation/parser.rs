//! Recursive descent parser for object notation.
//!
//! ```text
//! value   ::= group | list | string | number
//! group   ::= ident '{' ( member ( ',' member )* ','? )? '}'
//! member  ::= ident ':' value
//! list    ::= '[' ( value ( ',' value )* ','? )? ']'
//! string  ::= '"' ( char | '\' ( '"' | '\' | 'n' | 't' | 'r' ) )* '"'
//! number  ::= '-'? digit+ ( '.' digit+ )? ( ( 'e' | 'E' ) ( '+' | '-' )? digit+ )?
//! ident   ::= ( letter | '_' ) ( letter | digit | '_' )*
//! ```
//!
//! `#` starts a comment that runs to the end of the line. Groups and lists
//! nest at most [`MAX_DEPTH`] levels deep.

use super::{Group, Value};

/// Deepest group and list nesting accepted by [`parse`].
pub const MAX_DEPTH: usize = 128;

/// Malformed object-notation text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    /// A character that cannot start or continue the current production.
    #[error("unexpected character '{ch}' at position {pos} (expected {expected})")]
    UnexpectedChar {
        /// Byte position in the input.
        pos: usize,
        /// The offending character.
        ch: char,
        /// What the parser was looking for.
        expected: &'static str,
    },
    /// Input ended inside a value.
    #[error("unexpected end of input (expected {expected})")]
    UnexpectedEnd {
        /// What the parser was looking for.
        expected: &'static str,
    },
    /// Unknown backslash escape inside a string.
    #[error("invalid escape '\\{ch}' at position {pos}")]
    InvalidEscape {
        /// Byte position of the backslash.
        pos: usize,
        /// Character following the backslash.
        ch: char,
    },
    /// A number literal that does not fit any numeric variant.
    #[error("invalid number '{text}' at position {pos}")]
    InvalidNumber {
        /// Byte position of the literal.
        pos: usize,
        /// The literal text.
        text: String,
    },
    /// Groups and lists nested more than [`MAX_DEPTH`] levels deep.
    #[error("nesting deeper than {max} levels at position {pos}")]
    TooDeep {
        /// Byte position of the opening token.
        pos: usize,
        /// The nesting limit.
        max: usize,
    },
}

struct Parser<'a> {
    text: &'a str,
    input: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            input: text.as_bytes(),
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.text.get(self.pos..).and_then(|rest| rest.chars().next())
    }

    fn advance(&mut self) {
        if let Some(ch) = self.peek() {
            self.pos += ch.len_utf8();
        }
    }

    /// Skips whitespace and `#` comments.
    fn skip_ws(&mut self) {
        while let Some(&b) = self.input.get(self.pos) {
            if b.is_ascii_whitespace() {
                self.pos += 1;
            } else if b == b'#' {
                while self.input.get(self.pos).is_some_and(|&b| b != b'\n') {
                    self.pos += 1;
                }
            } else {
                break;
            }
        }
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        match self.peek() {
            Some(ch) => ParseError::UnexpectedChar {
                pos: self.pos,
                ch,
                expected,
            },
            None => ParseError::UnexpectedEnd { expected },
        }
    }

    fn expect(&mut self, ch: char, expected: &'static str) -> Result<(), ParseError> {
        self.skip_ws();
        if self.peek() == Some(ch) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    /// Entry: one value followed by nothing but whitespace.
    fn parse_document(&mut self) -> Result<Value, ParseError> {
        let value = self.parse_value()?;
        self.skip_ws();
        if self.peek().is_some() {
            return Err(self.unexpected("end of input"));
        }
        Ok(value)
    }

    fn parse_value(&mut self) -> Result<Value, ParseError> {
        self.skip_ws();
        match self.peek() {
            Some('[') => self.nested(Self::parse_list),
            Some('"') => self.parse_string().map(Value::String),
            Some(c) if c == '-' || c.is_ascii_digit() => self.parse_number(),
            Some(c) if c == '_' || c.is_ascii_alphabetic() => self.nested(Self::parse_group),
            _ => Err(self.unexpected("a value")),
        }
    }

    /// Runs `production` one nesting level deeper.
    fn nested(
        &mut self,
        production: fn(&mut Self) -> Result<Value, ParseError>,
    ) -> Result<Value, ParseError> {
        if self.depth >= MAX_DEPTH {
            return Err(ParseError::TooDeep {
                pos: self.pos,
                max: MAX_DEPTH,
            });
        }
        self.depth += 1;
        let value = production(self);
        self.depth -= 1;
        value
    }

    fn parse_ident(&mut self) -> Result<String, ParseError> {
        self.skip_ws();
        let start = self.pos;
        match self.peek() {
            Some(c) if c == '_' || c.is_ascii_alphabetic() => self.advance(),
            _ => return Err(self.unexpected("an identifier")),
        }
        while self
            .peek()
            .is_some_and(|c| c == '_' || c.is_ascii_alphanumeric())
        {
            self.advance();
        }
        Ok(self.text[start..self.pos].to_string())
    }

    /// `group ::= ident '{' ( member ( ',' member )* ','? )? '}'`
    fn parse_group(&mut self) -> Result<Value, ParseError> {
        let mut group = Group::new(self.parse_ident()?);
        self.expect('{', "'{'")?;
        loop {
            self.skip_ws();
            if self.peek() == Some('}') {
                self.advance();
                break;
            }
            let name = self.parse_ident()?;
            self.expect(':', "':'")?;
            let value = self.parse_value()?;
            group.push(name, value);

            self.skip_ws();
            match self.peek() {
                Some(',') => self.advance(),
                Some('}') => {}
                _ => return Err(self.unexpected("',' or '}'")),
            }
        }
        Ok(Value::Group(group))
    }

    /// `list ::= '[' ( value ( ',' value )* ','? )? ']'`
    fn parse_list(&mut self) -> Result<Value, ParseError> {
        self.advance(); // consume '['
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() == Some(']') {
                self.advance();
                break;
            }
            items.push(self.parse_value()?);

            self.skip_ws();
            match self.peek() {
                Some(',') => self.advance(),
                Some(']') => {}
                _ => return Err(self.unexpected("',' or ']'")),
            }
        }
        Ok(Value::List(items))
    }

    fn parse_string(&mut self) -> Result<String, ParseError> {
        self.advance(); // consume '"'
        let mut out = String::new();
        loop {
            let Some(ch) = self.peek() else {
                return Err(ParseError::UnexpectedEnd {
                    expected: "closing '\"'",
                });
            };
            match ch {
                '"' => {
                    self.advance();
                    return Ok(out);
                }
                '\\' => {
                    let escape_pos = self.pos;
                    self.advance();
                    let Some(esc) = self.peek() else {
                        return Err(ParseError::UnexpectedEnd {
                            expected: "escape character",
                        });
                    };
                    out.push(match esc {
                        '"' => '"',
                        '\\' => '\\',
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        other => {
                            return Err(ParseError::InvalidEscape {
                                pos: escape_pos,
                                ch: other,
                            });
                        }
                    });
                    self.advance();
                }
                c => {
                    out.push(c);
                    self.advance();
                }
            }
        }
    }

    fn parse_number(&mut self) -> Result<Value, ParseError> {
        let start = self.pos;
        let mut is_float = false;

        if self.peek() == Some('-') {
            self.advance();
        }
        self.digits();
        if self.peek() == Some('.') {
            is_float = true;
            self.advance();
            self.digits();
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            is_float = true;
            self.advance();
            if matches!(self.peek(), Some('+' | '-')) {
                self.advance();
            }
            self.digits();
        }

        let text = &self.text[start..self.pos];
        let invalid = || ParseError::InvalidNumber {
            pos: start,
            text: text.to_string(),
        };
        if is_float {
            return text.parse().map(Value::Double).map_err(|_| invalid());
        }
        if let Ok(n) = text.parse::<i64>() {
            return Ok(Value::Int(n));
        }
        text.parse::<u64>().map(Value::UInt).map_err(|_| invalid())
    }

    fn digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
    }
}

/// Parses a single object-notation value.
///
/// # Errors
///
/// Returns [`ParseError`] on any syntax error, including trailing input
/// after the value.
pub fn parse(text: &str) -> Result<Value, ParseError> {
    Parser::new(text).parse_document()
}
