//! XML parser implementation

use indexmap::IndexMap;

use crate::error::{Error, ErrorKind, Pos, Result, Span};
use crate::lexer::Cursor;
use crate::xml::model::{Content, Document, Element};

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Configuration for the XML parser
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Maximum element nesting depth (0 means unlimited)
    pub max_depth: u16,
    /// Maximum input size in bytes (0 means unlimited)
    pub max_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: 256,
            max_size: 64 * 1024 * 1024, // 64 MB default
        }
    }
}

impl Config {
    /// Create a new config with unlimited depth and size
    pub const fn unlimited() -> Self {
        Self {
            max_depth: 0,
            max_size: 0,
        }
    }

    /// Create a new config with specific limits
    pub const fn new(max_depth: u16, max_size: usize) -> Self {
        Self {
            max_depth,
            max_size,
        }
    }
}

/// XML parser
///
/// Checks well-formedness and builds an [`Element`] tree. Comments,
/// processing instructions and the DOCTYPE are skipped; CDATA sections are
/// kept as text.
#[derive(Debug)]
pub struct Parser<'a> {
    cursor: Cursor<'a>,
    config: Config,
    depth: u16,
}

impl<'a> Parser<'a> {
    /// Create a new XML parser with default configuration
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_config(input, Config::default())
    }

    /// Create a new XML parser with custom configuration
    pub const fn with_config(input: &'a [u8], config: Config) -> Self {
        Self {
            cursor: Cursor::new(input),
            config,
            depth: 0,
        }
    }

    /// Parse an XML document
    pub fn parse(&mut self) -> Result<Document> {
        let size = self.cursor.remaining().len();
        if self.config.max_size > 0 && size > self.config.max_size {
            return Err(Error::at(
                ErrorKind::MaxSizeExceeded {
                    max: self.config.max_size,
                },
                self.cursor.position(),
            ));
        }

        if self.cursor.starts_with(BOM) {
            self.cursor.advance_by(BOM.len());
        }

        self.skip_misc(true)?;
        if self.cursor.is_eof() {
            return Err(Error::at(ErrorKind::MissingRoot, self.cursor.position()));
        }

        let root = self.parse_element()?;
        self.skip_misc(false)?;

        if !self.cursor.is_eof() {
            return Err(Error::at(ErrorKind::TrailingContent, self.cursor.position()));
        }

        Ok(Document { root })
    }

    /// Skip whitespace, comments and processing instructions outside the root.
    /// The DOCTYPE is only legal before it.
    fn skip_misc(&mut self, allow_doctype: bool) -> Result<()> {
        loop {
            self.cursor.skip_whitespace();
            if self.cursor.starts_with(b"<?") {
                self.skip_processing_instruction()?;
            } else if self.cursor.starts_with(b"<!--") {
                self.skip_comment()?;
            } else if allow_doctype && self.cursor.starts_with(b"<!DOCTYPE") {
                self.skip_doctype()?;
            } else {
                return Ok(());
            }
        }
    }

    fn parse_element(&mut self) -> Result<Element> {
        let start = self.cursor.position();
        self.expect_byte(b'<')?;

        self.depth = self.depth.saturating_add(1);
        if self.config.max_depth > 0 && self.depth > self.config.max_depth {
            return Err(Error::at(
                ErrorKind::MaxDepthExceeded {
                    max: self.config.max_depth,
                },
                start,
            ));
        }

        let name = self.parse_name()?;
        let attributes = self.parse_attributes()?;

        let children = if self.cursor.consume(b'/') {
            self.expect_byte(b'>')?;
            Vec::new()
        } else {
            self.expect_byte(b'>')?;
            self.parse_content(&name, start)?
        };

        self.depth = self.depth.saturating_sub(1);
        Ok(Element {
            name,
            attributes,
            children,
        })
    }

    fn parse_content(&mut self, name: &str, start: Pos) -> Result<Vec<Content>> {
        let mut children = Vec::new();
        let mut text = String::new();

        loop {
            match self.cursor.current() {
                None => {
                    return Err(Error::with_message(
                        ErrorKind::UnexpectedEof,
                        Span::new(start, self.cursor.position()),
                        format!("unterminated element <{name}>"),
                    ));
                }
                Some(b'<') => {
                    if self.cursor.starts_with(b"</") {
                        flush_text(&mut text, &mut children);
                        self.cursor.advance_by(2);
                        let close_pos = self.cursor.position();
                        let close_name = self.parse_name()?;
                        if close_name != name {
                            return Err(Error::at(
                                ErrorKind::MismatchedTag {
                                    expected: name.to_string(),
                                    found: close_name,
                                },
                                close_pos,
                            ));
                        }
                        self.cursor.skip_whitespace();
                        self.expect_byte(b'>')?;
                        return Ok(children);
                    } else if self.cursor.starts_with(b"<!--") {
                        self.skip_comment()?;
                    } else if self.cursor.starts_with(b"<![CDATA[") {
                        self.parse_cdata(&mut text)?;
                    } else if self.cursor.starts_with(b"<?") {
                        self.skip_processing_instruction()?;
                    } else if self.cursor.starts_with(b"<!") {
                        return Err(self.expected("element, comment or CDATA section"));
                    } else {
                        flush_text(&mut text, &mut children);
                        let child = self.parse_element()?;
                        children.push(Content::Element(child));
                    }
                }
                Some(_) => self.parse_text(&mut text)?,
            }
        }
    }

    fn parse_attributes(&mut self) -> Result<IndexMap<String, String>> {
        let mut attrs = IndexMap::new();

        loop {
            let before = self.cursor.pos();
            self.cursor.skip_whitespace();
            let separated = self.cursor.pos() > before;

            match self.cursor.current() {
                Some(b'/') | Some(b'>') => break,
                Some(_) if !separated => return Err(self.expected("whitespace")),
                Some(_) => {}
                None => return Err(self.eof()),
            }

            let name_pos = self.cursor.position();
            let name = self.parse_name()?;
            self.cursor.skip_whitespace();
            self.expect_byte(b'=')?;
            self.cursor.skip_whitespace();
            let value = self.parse_attribute_value()?;

            if attrs.contains_key(&name) {
                return Err(Error::at(ErrorKind::DuplicateAttribute { name }, name_pos));
            }
            attrs.insert(name, value);
        }

        Ok(attrs)
    }

    fn parse_attribute_value(&mut self) -> Result<String> {
        let quote = match self.cursor.current() {
            Some(b'"') => b'"',
            Some(b'\'') => b'\'',
            _ => return Err(self.expected("quoted attribute value")),
        };
        self.cursor.advance();

        let mut value = String::new();
        let mut start = self.cursor.pos();
        let mut start_pos = self.cursor.position();
        loop {
            match self.cursor.current() {
                None => return Err(self.eof()),
                Some(b) if b == quote => {
                    value.push_str(utf8(self.cursor.slice_from(start), start_pos)?);
                    self.cursor.advance();
                    return Ok(value);
                }
                Some(b'<') => return Err(self.expected("attribute value without '<'")),
                Some(b'&') => {
                    value.push_str(utf8(self.cursor.slice_from(start), start_pos)?);
                    value.push(self.parse_reference()?);
                    start = self.cursor.pos();
                    start_pos = self.cursor.position();
                }
                Some(b'\t' | b'\n' | b'\r') => {
                    // attribute value normalization
                    value.push_str(utf8(self.cursor.slice_from(start), start_pos)?);
                    value.push(' ');
                    self.cursor.advance();
                    start = self.cursor.pos();
                    start_pos = self.cursor.position();
                }
                Some(_) => self.cursor.advance(),
            }
        }
    }

    fn parse_text(&mut self, out: &mut String) -> Result<()> {
        let mut start = self.cursor.pos();
        let mut start_pos = self.cursor.position();
        while let Some(b) = self.cursor.current() {
            match b {
                b'<' => break,
                b'&' => {
                    out.push_str(utf8(self.cursor.slice_from(start), start_pos)?);
                    out.push(self.parse_reference()?);
                    start = self.cursor.pos();
                    start_pos = self.cursor.position();
                }
                _ => self.cursor.advance(),
            }
        }

        out.push_str(utf8(self.cursor.slice_from(start), start_pos)?);
        Ok(())
    }

    /// Decode `&name;`, `&#NN;` or `&#xHH;` starting at the `&`
    fn parse_reference(&mut self) -> Result<char> {
        let pos = self.cursor.position();
        self.cursor.advance();

        let start = self.cursor.pos();
        loop {
            match self.cursor.current() {
                Some(b';') => break,
                Some(b) if is_name_char(b) || b == b'#' => self.cursor.advance(),
                _ => {
                    let entity = String::from_utf8_lossy(self.cursor.slice_from(start)).into_owned();
                    return Err(Error::at(ErrorKind::InvalidEntity { entity }, pos));
                }
            }
        }

        let entity = utf8(self.cursor.slice_from(start), pos)?;
        self.cursor.advance();

        decode_entity(entity).ok_or_else(|| {
            Error::at(
                ErrorKind::InvalidEntity {
                    entity: entity.to_string(),
                },
                pos,
            )
        })
    }

    fn parse_cdata(&mut self, out: &mut String) -> Result<()> {
        let pos = self.cursor.position();
        self.cursor.advance_by(b"<![CDATA[".len());
        let start = self.cursor.pos();
        while !self.cursor.is_eof() {
            if self.cursor.starts_with(b"]]>") {
                out.push_str(utf8(self.cursor.slice_from(start), pos)?);
                self.cursor.advance_by(3);
                return Ok(());
            }
            self.cursor.advance();
        }
        Err(unterminated("CDATA section", pos, self.cursor.position()))
    }

    fn parse_name(&mut self) -> Result<String> {
        let start_pos = self.cursor.position();
        let start = self.cursor.pos();

        match self.cursor.current() {
            Some(first) if is_name_start(first) => self.cursor.advance(),
            Some(_) => return Err(Error::at(ErrorKind::InvalidName, start_pos)),
            None => return Err(self.eof()),
        }

        while let Some(b) = self.cursor.current() {
            if is_name_char(b) {
                self.cursor.advance();
            } else {
                break;
            }
        }

        utf8(self.cursor.slice_from(start), start_pos).map(str::to_string)
    }

    fn skip_comment(&mut self) -> Result<()> {
        let pos = self.cursor.position();
        self.cursor.advance_by(4);
        self.skip_until(b"-->", "comment", pos)
    }

    fn skip_processing_instruction(&mut self) -> Result<()> {
        let pos = self.cursor.position();
        self.cursor.advance_by(2);
        self.skip_until(b"?>", "processing instruction", pos)
    }

    /// Skip `<!DOCTYPE ...>` including a bracketed internal subset
    fn skip_doctype(&mut self) -> Result<()> {
        let pos = self.cursor.position();
        self.cursor.advance_by(b"<!DOCTYPE".len());

        let mut in_subset = false;
        while let Some(b) = self.cursor.current() {
            match b {
                b'[' => in_subset = true,
                b']' => in_subset = false,
                b'"' | b'\'' => {
                    self.cursor.advance();
                    while let Some(inner) = self.cursor.current() {
                        if inner == b {
                            break;
                        }
                        self.cursor.advance();
                    }
                }
                b'>' if !in_subset => {
                    self.cursor.advance();
                    return Ok(());
                }
                _ => {}
            }
            self.cursor.advance();
        }

        Err(unterminated("DOCTYPE", pos, self.cursor.position()))
    }

    fn skip_until(&mut self, pattern: &[u8], what: &str, start: Pos) -> Result<()> {
        while !self.cursor.is_eof() {
            if self.cursor.peek_bytes(pattern.len()) == Some(pattern) {
                self.cursor.advance_by(pattern.len());
                return Ok(());
            }
            self.cursor.advance();
        }
        Err(unterminated(what, start, self.cursor.position()))
    }

    fn expect_byte(&mut self, expected: u8) -> Result<()> {
        if self.cursor.consume(expected) {
            Ok(())
        } else {
            Err(self.expected(&format!("'{}'", char::from(expected))))
        }
    }

    fn expected(&self, expected: &str) -> Error {
        let found = match self.cursor.current() {
            Some(b) => format!("'{}'", char::from(b)),
            None => "end of input".to_string(),
        };
        Error::at(
            ErrorKind::Expected {
                expected: expected.to_string(),
                found,
            },
            self.cursor.position(),
        )
    }

    fn eof(&self) -> Error {
        Error::at(ErrorKind::UnexpectedEof, self.cursor.position())
    }
}

fn flush_text(text: &mut String, children: &mut Vec<Content>) {
    if text.trim().is_empty() {
        text.clear();
    } else {
        children.push(Content::Text(std::mem::take(text)));
    }
}

fn unterminated(what: &str, start: Pos, end: Pos) -> Error {
    Error::with_message(
        ErrorKind::UnexpectedEof,
        Span::new(start, end),
        format!("unterminated {what}"),
    )
}

fn utf8(bytes: &[u8], pos: Pos) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|_| Error::at(ErrorKind::InvalidUtf8, pos))
}

fn is_name_start(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':') || b >= 0x80
}

fn is_name_char(b: u8) -> bool {
    is_name_start(b) || matches!(b, b'0'..=b'9' | b'-' | b'.')
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => decode_numeric_entity(entity),
    }
}

fn decode_numeric_entity(entity: &str) -> Option<char> {
    if let Some(hex) = entity.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse::<u32>().ok().and_then(char::from_u32)
    } else {
        None
    }
}
