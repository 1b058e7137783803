//! mismo - MISMO XML to JSON conversion
//!
//! Converts XML (MISMO loan documents in particular) into a JSON tree and
//! optionally projects that tree onto six loan-data sections.
//!
//! # Quick Start
//!
//! ```
//! use mismo::{extract, xml_to_value};
//! # fn main() -> Result<(), mismo::Error> {
//! let tree = xml_to_value(r#"<MESSAGE xmlns="http://www.mismo.org/residential/2009/schemas">
//!     <ABOUT_VERSIONS>
//!         <ABOUT_VERSION><DataVersionIdentifier>3.4</DataVersionIdentifier></ABOUT_VERSION>
//!     </ABOUT_VERSIONS>
//! </MESSAGE>"#)?;
//! let sections = extract(&tree);
//! let version = sections
//!     .message_info
//!     .get("DataVersionIdentifier")
//!     .and_then(|v| v.as_string())
//!     .unwrap_or_default();
//! assert_eq!(version, "3.4");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub use error::{Error, ErrorKind, Pos, Result, Span};

pub mod lexer;

pub mod value;
pub use value::{Array, Object, Value};

pub mod xml;
pub use xml::{
    Config as XmlConfig, Content as XmlContent, Document as XmlDocument, Element as XmlElement,
    Parser as XmlParser,
};

pub mod convert;
pub use convert::{convert, ConvertOptions, ATTRIBUTES_KEY, TEXT_KEY};

pub mod extract;
pub use extract::{extract, StructuredDocument, SECTIONS};

pub mod json;

/// Parse XML from string
pub fn from_xml_str(s: &str) -> Result<XmlDocument> {
    from_xml_bytes(s.as_bytes())
}

/// Parse XML from bytes
pub fn from_xml_bytes(bytes: &[u8]) -> Result<XmlDocument> {
    let mut parser = XmlParser::new(bytes);
    parser.parse()
}

/// Parse XML and convert the root element
pub fn xml_to_value(s: &str) -> Result<Value> {
    convert::convert_str(s)
}

/// Parse XML bytes and convert with options
pub fn xml_bytes_to_value(bytes: &[u8], options: &ConvertOptions) -> Result<Value> {
    convert::convert_bytes_with_options(bytes, options)
}

/// Parse XML and render the converted tree as pretty JSON
pub fn xml_to_json(s: &str) -> Result<String> {
    xml_to_value(s).map(|value| json::to_string_pretty(&value))
}
