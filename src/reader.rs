//! Token-level access to JSON text.
//!
//! Derived parsers only ever talk to a [`TokenReader`]; [`JsonReader`] is the
//! streaming implementation over any `std::io::Read`.
use std::fmt;
use std::io::{self, Read};

use crate::config::ReaderConfig;
use crate::error::ParseError;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    BeginObject,
    EndObject,
    BeginArray,
    EndArray,
    Colon,
    Comma,
    String,
    Number,
    True,
    False,
    Null,
    End,
}

impl Token {
    pub fn describe(self) -> &'static str {
        match self {
            Token::BeginObject => "'{'",
            Token::EndObject => "'}'",
            Token::BeginArray => "'['",
            Token::EndArray => "']'",
            Token::Colon => "':'",
            Token::Comma => "','",
            Token::String => "string",
            Token::Number => "number",
            Token::True => "true",
            Token::False => "false",
            Token::Null => "null",
            Token::End => "end of input",
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Forward-only cursor over significant JSON tokens.
pub trait TokenReader {
    /// Most recently read token.
    fn current(&self) -> Token;

    /// Move to the next significant token and return it.
    fn advance(&mut self) -> Result<Token, ParseError>;

    /// Decoded text of a string token, or the raw literal of a number token.
    fn text(&self) -> &str;

    /// Absolute byte offset of the current token's first byte.
    fn offset(&self) -> usize;

    /// The current token as an object key.
    fn read_key(&self) -> Result<String, ParseError> {
        match self.current() {
            Token::String => Ok(self.text().to_owned()),
            other => Err(ParseError::structural(
                format!("expected object key, found {other}"),
                self.offset(),
            )),
        }
    }

    /// Advance and require `token`.
    fn expect(&mut self, token: Token) -> Result<(), ParseError> {
        let found = self.advance()?;
        if found == token {
            Ok(())
        } else {
            Err(ParseError::structural(
                format!("expected {token}, found {found}"),
                self.offset(),
            ))
        }
    }
}

/// Streaming tokenizer over any `Read` source.
///
/// Input is pulled in chunks; partial reads and `Interrupted` are handled
/// internally. Until the first `advance`, `current` reports `Token::End`.
pub struct JsonReader<R> {
    inner: R,
    buf: Vec<u8>,
    pos: usize,
    consumed: usize,
    eof: bool,
    config: ReaderConfig,
    current: Token,
    token_offset: usize,
    text: String,
    scratch: Vec<u8>,
    depth: usize,
}

impl<'a> JsonReader<&'a [u8]> {
    pub fn from_slice(input: &'a [u8]) -> Self {
        Self::new(input)
    }
}

impl<R: Read> JsonReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_config(inner, ReaderConfig::default())
    }

    pub fn with_config(inner: R, config: ReaderConfig) -> Self {
        Self {
            inner,
            buf: Vec::with_capacity(INITIAL_BUFFER_CAPACITY),
            pos: 0,
            consumed: 0,
            eof: false,
            config,
            current: Token::End,
            token_offset: 0,
            text: String::new(),
            scratch: Vec::new(),
            depth: 0,
        }
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Current nesting depth of arrays and objects.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn position(&self) -> usize {
        self.consumed + self.pos
    }

    fn error(&self, reason: impl Into<String>) -> ParseError {
        ParseError::structural(reason, self.position())
    }

    /// Refill once the buffer is drained. False at end of input.
    fn fill(&mut self) -> Result<bool, ParseError> {
        if self.eof {
            return Ok(false);
        }
        self.consumed += self.buf.len();
        self.buf.clear();
        self.pos = 0;

        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            match self.inner.read(&mut chunk) {
                Ok(0) => {
                    self.eof = true;
                    return Ok(false);
                }
                Ok(n) => {
                    self.buf.extend_from_slice(&chunk[..n]);
                    return Ok(true);
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(self.error(format!("read failed: {err}"))),
            }
        }
    }

    fn peek(&mut self) -> Result<Option<u8>, ParseError> {
        if self.pos == self.buf.len() && !self.fill()? {
            return Ok(None);
        }
        Ok(Some(self.buf[self.pos]))
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn next_byte(&mut self) -> Result<u8, ParseError> {
        match self.peek()? {
            Some(byte) => {
                self.bump();
                Ok(byte)
            }
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn skip_whitespace(&mut self) -> Result<(), ParseError> {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.peek()? {
            self.bump();
        }
        Ok(())
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        if self.depth == self.config.max_depth {
            return Err(ParseError::structural(
                format!("nesting deeper than {} levels", self.config.max_depth),
                self.token_offset,
            ));
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn push_literal(&mut self, byte: u8) -> Result<(), ParseError> {
        if self.scratch.len() == self.config.max_literal_len {
            return Err(ParseError::structural(
                format!("literal longer than {} bytes", self.config.max_literal_len),
                self.token_offset,
            ));
        }
        self.scratch.push(byte);
        Ok(())
    }

    fn lex_keyword(&mut self, keyword: &'static str) -> Result<(), ParseError> {
        for expected in keyword.bytes() {
            if self.peek()? != Some(expected) {
                return Err(self.error(format!("invalid literal, expected {keyword}")));
            }
            self.bump();
        }
        self.check_delimiter()?;
        self.text.push_str(keyword);
        Ok(())
    }

    /// Literals must be followed by whitespace, punctuation or end of input.
    fn check_delimiter(&mut self) -> Result<(), ParseError> {
        match self.peek()? {
            None | Some(b' ' | b'\t' | b'\n' | b'\r' | b',' | b':' | b']' | b'}') => Ok(()),
            Some(byte) => Err(self.error(format!("unexpected character {:?} after literal", byte as char))),
        }
    }

    fn lex_digits(&mut self) -> Result<usize, ParseError> {
        let mut count = 0;
        while let Some(byte @ b'0'..=b'9') = self.peek()? {
            self.push_literal(byte)?;
            self.bump();
            count += 1;
        }
        Ok(count)
    }

    fn lex_number(&mut self) -> Result<(), ParseError> {
        if self.peek()? == Some(b'-') {
            self.push_literal(b'-')?;
            self.bump();
        }
        match self.peek()? {
            Some(b'0') => {
                self.push_literal(b'0')?;
                self.bump();
            }
            Some(b'1'..=b'9') => {
                self.lex_digits()?;
            }
            _ => return Err(self.error("invalid number: expected digit")),
        }
        if self.peek()? == Some(b'.') {
            self.push_literal(b'.')?;
            self.bump();
            if self.lex_digits()? == 0 {
                return Err(self.error("invalid number: expected digit after '.'"));
            }
        }
        if let Some(marker @ (b'e' | b'E')) = self.peek()? {
            self.push_literal(marker)?;
            self.bump();
            if let Some(sign @ (b'+' | b'-')) = self.peek()? {
                self.push_literal(sign)?;
                self.bump();
            }
            if self.lex_digits()? == 0 {
                return Err(self.error("invalid number: expected exponent digits"));
            }
        }
        self.check_delimiter()?;
        // ASCII only by construction.
        self.text.extend(self.scratch.iter().map(|&b| b as char));
        Ok(())
    }

    fn lex_hex4(&mut self) -> Result<u16, ParseError> {
        let mut code = 0u16;
        for _ in 0..4 {
            let byte = self.next_byte()?;
            let digit = (byte as char)
                .to_digit(16)
                .ok_or_else(|| self.error("invalid \\u escape"))?;
            code = code * 16 + digit as u16;
        }
        Ok(code)
    }

    fn lex_escape(&mut self) -> Result<(), ParseError> {
        let decoded = match self.next_byte()? {
            b'"' => '"',
            b'\\' => '\\',
            b'/' => '/',
            b'b' => '\u{08}',
            b'f' => '\u{0C}',
            b'n' => '\n',
            b'r' => '\r',
            b't' => '\t',
            b'u' => {
                let high = self.lex_hex4()?;
                let code = match high {
                    0xD800..=0xDBFF => {
                        if self.next_byte()? != b'\\' || self.next_byte()? != b'u' {
                            return Err(self.error("unpaired surrogate in string"));
                        }
                        let low = self.lex_hex4()?;
                        if !(0xDC00..=0xDFFF).contains(&low) {
                            return Err(self.error("unpaired surrogate in string"));
                        }
                        0x10000 + ((u32::from(high) - 0xD800) << 10) + (u32::from(low) - 0xDC00)
                    }
                    0xDC00..=0xDFFF => return Err(self.error("unpaired surrogate in string")),
                    other => u32::from(other),
                };
                char::from_u32(code).ok_or_else(|| self.error("invalid \\u escape"))?
            }
            other => return Err(self.error(format!("invalid escape '\\{}'", other as char))),
        };
        let mut utf8 = [0u8; 4];
        for &byte in decoded.encode_utf8(&mut utf8).as_bytes() {
            self.push_literal(byte)?;
        }
        Ok(())
    }

    fn lex_string(&mut self) -> Result<(), ParseError> {
        loop {
            match self.next_byte()? {
                b'"' => break,
                b'\\' => self.lex_escape()?,
                byte if byte < 0x20 => {
                    return Err(ParseError::structural(
                        "control character in string",
                        self.position() - 1,
                    ));
                }
                byte => self.push_literal(byte)?,
            }
        }
        let bytes = std::mem::take(&mut self.scratch);
        match String::from_utf8(bytes) {
            Ok(text) => {
                self.text = text;
                Ok(())
            }
            Err(_) => Err(ParseError::structural("invalid UTF-8 in string", self.token_offset)),
        }
    }
}

impl<R: Read> TokenReader for JsonReader<R> {
    fn current(&self) -> Token {
        self.current
    }

    fn advance(&mut self) -> Result<Token, ParseError> {
        self.skip_whitespace()?;
        self.token_offset = self.position();
        self.text.clear();
        self.scratch.clear();

        let Some(byte) = self.peek()? else {
            self.current = Token::End;
            return Ok(Token::End);
        };
        let token = match byte {
            b'{' => {
                self.bump();
                self.enter()?;
                Token::BeginObject
            }
            b'}' => {
                self.bump();
                self.leave();
                Token::EndObject
            }
            b'[' => {
                self.bump();
                self.enter()?;
                Token::BeginArray
            }
            b']' => {
                self.bump();
                self.leave();
                Token::EndArray
            }
            b':' => {
                self.bump();
                Token::Colon
            }
            b',' => {
                self.bump();
                Token::Comma
            }
            b'"' => {
                self.bump();
                self.lex_string()?;
                Token::String
            }
            b'-' | b'0'..=b'9' => {
                self.lex_number()?;
                Token::Number
            }
            b't' => {
                self.lex_keyword("true")?;
                Token::True
            }
            b'f' => {
                self.lex_keyword("false")?;
                Token::False
            }
            b'n' => {
                self.lex_keyword("null")?;
                Token::Null
            }
            other => return Err(self.error(format!("unexpected character {:?}", other as char))),
        };
        self.current = token;
        Ok(token)
    }

    fn text(&self) -> &str {
        &self.text
    }

    fn offset(&self) -> usize {
        self.token_offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hands out one byte per call, with an `Interrupted` in between.
    struct Trickle<'a> {
        data: &'a [u8],
        interrupt: bool,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
            self.interrupt = !self.interrupt;
            if self.interrupt {
                return Err(io::Error::from(io::ErrorKind::Interrupted));
            }
            match self.data.split_first() {
                Some((&byte, rest)) if !out.is_empty() => {
                    out[0] = byte;
                    self.data = rest;
                    Ok(1)
                }
                _ => Ok(0),
            }
        }
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _out: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("pipe closed"))
        }
    }

    fn tokens<R: Read>(mut reader: JsonReader<R>) -> Result<Vec<(Token, String, usize)>, ParseError> {
        let mut out = Vec::new();
        loop {
            let token = reader.advance()?;
            if token == Token::End {
                return Ok(out);
            }
            out.push((token, reader.text().to_owned(), reader.offset()));
        }
    }

    const DOC: &str = r#"{"a": [1, -2.5e3, true, null], "bé": "x\ny"}"#;

    #[test]
    fn tokenizes_with_offsets() {
        let got = tokens(JsonReader::from_slice(DOC.as_bytes())).unwrap();
        let kinds: Vec<Token> = got.iter().map(|(t, _, _)| *t).collect();
        assert_eq!(
            kinds,
            [
                Token::BeginObject,
                Token::String,
                Token::Colon,
                Token::BeginArray,
                Token::Number,
                Token::Comma,
                Token::Number,
                Token::Comma,
                Token::True,
                Token::Comma,
                Token::Null,
                Token::EndArray,
                Token::Comma,
                Token::String,
                Token::Colon,
                Token::String,
                Token::EndObject,
            ]
        );
        assert_eq!(got[4], (Token::Number, "1".to_owned(), 7));
        assert_eq!(got[6], (Token::Number, "-2.5e3".to_owned(), 10));
        assert_eq!(got[13].1, "bé");
        assert_eq!(got[15].1, "x\ny");
    }

    #[test]
    fn trickled_input_matches_slice_input() {
        let slice = tokens(JsonReader::from_slice(DOC.as_bytes())).unwrap();
        let trickled = tokens(JsonReader::new(Trickle { data: DOC.as_bytes(), interrupt: false })).unwrap();
        assert_eq!(slice, trickled);
    }

    #[test]
    fn surrogate_pairs_decode() {
        let got = tokens(JsonReader::from_slice(br#""\ud83d\ude00""#)).unwrap();
        assert_eq!(got[0].1, "\u{1F600}");
        let err = tokens(JsonReader::from_slice(br#""\ude00""#)).unwrap_err();
        assert!(err.to_string().contains("unpaired surrogate"));
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        for bad in ["01", "1.", "-", "1e", "1x", "+1", ".5"] {
            assert!(tokens(JsonReader::from_slice(bad.as_bytes())).is_err(), "{bad} should fail");
        }
        for good in ["0", "-0", "10.25", "1E+2", "3e-7"] {
            let got = tokens(JsonReader::from_slice(good.as_bytes())).unwrap();
            assert_eq!(got[0].1, good);
        }
    }

    #[test]
    fn string_faults_are_structural() {
        let err = tokens(JsonReader::from_slice(b"[\"ab\ncd\"]")).unwrap_err();
        assert_eq!(err.offset, 4);
        assert!(tokens(JsonReader::from_slice(b"\"open")).is_err());
        assert!(tokens(JsonReader::from_slice(br#""\q""#)).is_err());
        assert!(tokens(JsonReader::from_slice(b"tru")).is_err());
        assert!(tokens(JsonReader::from_slice(b"nullx")).is_err());
    }

    #[test]
    fn depth_limit_is_enforced() {
        let config = ReaderConfig { max_depth: 2, ..ReaderConfig::default() };
        assert!(tokens(JsonReader::with_config(&b"[[1]]"[..], config)).is_ok());
        let err = tokens(JsonReader::with_config(&b"[[[1]]]"[..], config)).unwrap_err();
        assert_eq!(err.offset, 2);
    }

    #[test]
    fn literal_length_limit_is_enforced() {
        let config = ReaderConfig { max_literal_len: 4, ..ReaderConfig::default() };
        assert!(tokens(JsonReader::with_config(&b"\"abcd\""[..], config)).is_ok());
        assert!(tokens(JsonReader::with_config(&b"\"abcde\""[..], config)).is_err());
        assert!(tokens(JsonReader::with_config(&b"123456"[..], config)).is_err());
    }

    #[test]
    fn io_errors_surface_as_structural() {
        let err = JsonReader::new(Broken).advance().unwrap_err();
        assert!(err.to_string().contains("pipe closed"));
    }

    #[test]
    fn expect_and_read_key() {
        let mut reader = JsonReader::from_slice(br#"{"k": 1}"#);
        reader.expect(Token::BeginObject).unwrap();
        reader.advance().unwrap();
        assert_eq!(reader.read_key().unwrap(), "k");
        reader.expect(Token::Colon).unwrap();
        let err = reader.expect(Token::String).unwrap_err();
        assert_eq!(err.to_string(), "expected string, found number at $ (offset 6)");
    }
}
