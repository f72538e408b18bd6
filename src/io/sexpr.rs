//! Parenthesized record reader and writer
//!
//! Records are lists of symbols, quoted strings, integers and floats, e.g.
//! `(tile (filename "a.png") (length 1234))`. A `;` starts a comment that
//! runs to the end of the line.

use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;
use thiserror::Error;

/// One node of a record
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Parenthesized sequence
    List(Vec<Self>),
    /// Bare word
    Symbol(String),
    /// Quoted string
    Str(String),
    /// Integer literal, wide enough for any signed or unsigned 64-bit field
    Integer(i128),
    /// Float literal
    Float(f64),
}

/// Failure to read a record
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{message} at byte {offset}")]
pub struct ParseError {
    /// Byte offset of the failure
    pub offset: usize,
    /// What was wrong
    pub message: String,
}

impl Value {
    /// List of a head symbol followed by items
    pub fn tagged(tag: &str, items: impl IntoIterator<Item = Self>) -> Self {
        Self::List(
            std::iter::once(Self::Symbol(tag.to_owned()))
                .chain(items)
                .collect(),
        )
    }

    /// Items of a list
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Text of a symbol
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Self::Symbol(symbol) => Some(symbol),
            _ => None,
        }
    }

    /// Text of a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(text) => Some(text),
            _ => None,
        }
    }

    /// Value of an integer
    pub const fn as_integer(&self) -> Option<i128> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Value of an integer converted to a narrower type
    pub fn as_int<T: TryFrom<i128>>(&self) -> Option<T> {
        self.as_integer().and_then(|value| T::try_from(value).ok())
    }

    /// Value of a number, integers widened
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            Self::Integer(value) => Some(*value as f64),
            _ => None,
        }
    }

    /// Head symbol of a list
    pub fn tag(&self) -> Option<&str> {
        self.as_list()?.first()?.as_symbol()
    }

    /// Items after the head symbol of a list
    pub fn fields(&self) -> &[Self] {
        self.as_list()
            .and_then(|items| items.get(1..))
            .unwrap_or_default()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
            Self::Symbol(symbol) => f.write_str(symbol),
            Self::Str(text) => {
                f.write_str("\"")?;
                for c in text.chars() {
                    if matches!(c, '"' | '\\') {
                        f.write_str("\\")?;
                    }
                    write!(f, "{c}")?;
                }
                f.write_str("\"")
            }
            Self::Integer(value) => write!(f, "{value}"),
            // Debug keeps a decimal point so floats read back as floats
            Self::Float(value) => write!(f, "{value:?}"),
        }
    }
}

/// Read every top-level value in `input`
///
/// # Errors
///
/// Returns the position and reason of the first syntax error
pub fn parse_all(input: &str) -> Result<Vec<Value>, ParseError> {
    let mut reader = Reader {
        chars: input.char_indices().peekable(),
        len: input.len(),
    };
    let mut values = Vec::new();
    loop {
        reader.skip_blank();
        if reader.chars.peek().is_none() {
            return Ok(values);
        }
        values.push(reader.value()?);
    }
}

/// Read exactly one value from `input`
///
/// # Errors
///
/// Returns an error on syntax errors or when the input does not hold
/// exactly one value
pub fn parse(input: &str) -> Result<Value, ParseError> {
    let mut values = parse_all(input)?;
    if values.len() != 1 {
        return Err(ParseError {
            offset: 0,
            message: format!("expected one value, found {}", values.len()),
        });
    }
    values.pop().ok_or_else(|| ParseError {
        offset: 0,
        message: "empty input".to_owned(),
    })
}

struct Reader<'a> {
    chars: Peekable<CharIndices<'a>>,
    len: usize,
}

impl Reader<'_> {
    fn offset(&mut self) -> usize {
        self.chars.peek().map_or(self.len, |&(offset, _)| offset)
    }

    fn error(&mut self, message: impl Into<String>) -> ParseError {
        ParseError {
            offset: self.offset(),
            message: message.into(),
        }
    }

    fn skip_blank(&mut self) {
        while let Some(&(_, c)) = self.chars.peek() {
            if c == ';' {
                while self.chars.next_if(|&(_, c)| c != '\n').is_some() {}
            } else if c.is_whitespace() {
                self.chars.next();
            } else {
                break;
            }
        }
    }

    fn value(&mut self) -> Result<Value, ParseError> {
        self.skip_blank();
        match self.chars.peek().map(|&(_, c)| c) {
            None => Err(self.error("unexpected end of input")),
            Some('(') => {
                self.chars.next();
                self.list()
            }
            Some(')') => Err(self.error("unbalanced ')'")),
            Some('"') => {
                self.chars.next();
                self.string()
            }
            Some(_) => self.atom(),
        }
    }

    fn list(&mut self) -> Result<Value, ParseError> {
        let mut items = Vec::new();
        loop {
            self.skip_blank();
            match self.chars.peek().map(|&(_, c)| c) {
                None => return Err(self.error("unterminated list")),
                Some(')') => {
                    self.chars.next();
                    return Ok(Value::List(items));
                }
                Some(_) => items.push(self.value()?),
            }
        }
    }

    fn string(&mut self) -> Result<Value, ParseError> {
        let mut text = String::new();
        loop {
            match self.chars.next() {
                None => return Err(self.error("unterminated string")),
                Some((_, '"')) => return Ok(Value::Str(text)),
                Some((_, '\\')) => match self.chars.next() {
                    Some((_, c)) => text.push(c),
                    None => return Err(self.error("unterminated escape")),
                },
                Some((_, c)) => text.push(c),
            }
        }
    }

    fn atom(&mut self) -> Result<Value, ParseError> {
        let start = self.offset();
        let mut token = String::new();
        while let Some((_, c)) = self
            .chars
            .next_if(|&(_, c)| !c.is_whitespace() && !matches!(c, '(' | ')' | '"' | ';'))
        {
            token.push(c);
        }

        if let Ok(value) = token.parse::<i128>() {
            return Ok(Value::Integer(value));
        }
        let numeric = token
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'))
            && token.chars().any(|c| c.is_ascii_digit());
        if numeric {
            return token.parse::<f64>().map(Value::Float).map_err(|e| ParseError {
                offset: start,
                message: format!("bad number '{token}': {e}"),
            });
        }
        Ok(Value::Symbol(token))
    }
}
