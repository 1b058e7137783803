//! XML to JSON tree conversion
//!
//! Every element becomes either its text (a leaf with no attributes) or an
//! object with:
//! - `@attributes` holding the element's attributes, when it has any
//! - `#text` holding its trimmed text before the first child, when it also
//!   has attributes or children
//! - one key per child name, folded into an array when the name repeats
//!
//! Namespace prefixes are dropped from tag and attribute names, and `xmlns`
//! declarations are not emitted.

use tracing::{debug, instrument};

use crate::error::Result;
use crate::value::{Object, Value};
use crate::xml::model::{Document, Element};
use crate::xml::parser::{Config as XmlConfig, Parser as XmlParser};
use crate::xml::qname;

/// Key holding an element's attributes
pub const ATTRIBUTES_KEY: &str = "@attributes";
/// Key holding an element's text when it is not a plain leaf
pub const TEXT_KEY: &str = "#text";

/// Conversion options
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Parser limits
    pub xml: XmlConfig,
    /// Wrap the result as `{ rootName: ... }` instead of returning the
    /// root element's contents directly
    pub keep_root: bool,
}

impl ConvertOptions {
    pub const fn with_keep_root(mut self, keep_root: bool) -> Self {
        self.keep_root = keep_root;
        self
    }
}

/// Convert a single element
pub fn convert(element: &Element) -> Value {
    let text = element.text();
    let text = text.trim();

    let mut attributes = element.data_attributes().peekable();
    let has_attributes = attributes.peek().is_some();
    let has_children = element.child_elements().next().is_some();

    if !has_children && !has_attributes {
        return Value::String(text.to_string());
    }

    let mut obj = Object::new();

    if has_attributes {
        let attrs: Object = attributes
            .map(|(name, value)| {
                (
                    qname::local_name(name).to_string(),
                    Value::String(value.clone()),
                )
            })
            .collect();
        obj.insert(ATTRIBUTES_KEY, attrs);
    }

    if !text.is_empty() {
        obj.insert(TEXT_KEY, text);
    }

    for child in element.child_elements() {
        obj.append(child.local_name(), convert(child));
    }

    Value::Object(obj)
}

/// Convert a parsed document, honouring `keep_root`
pub fn document_to_value(doc: &Document, options: &ConvertOptions) -> Value {
    let value = convert(&doc.root);
    if options.keep_root {
        let mut root = Object::new();
        root.insert(doc.root.local_name(), value);
        Value::Object(root)
    } else {
        value
    }
}

/// Parse XML text and convert it
pub fn convert_str(input: &str) -> Result<Value> {
    convert_bytes_with_options(input.as_bytes(), &ConvertOptions::default())
}

/// Parse XML bytes and convert them with options
#[instrument(level = "debug", skip_all, fields(bytes = input.len()))]
pub fn convert_bytes_with_options(input: &[u8], options: &ConvertOptions) -> Result<Value> {
    let mut parser = XmlParser::with_config(input, options.xml);
    let doc = parser.parse()?;
    debug!(root = %doc.root.name, "parsed xml document");
    Ok(document_to_value(&doc, options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Array;

    fn convert_root(input: &str) -> Result<Value> {
        convert_str(input)
    }

    fn obj(pairs: &[(&str, Value)]) -> Value {
        let mut obj = Object::new();
        for (key, value) in pairs {
            obj.insert(*key, value.clone());
        }
        Value::Object(obj)
    }

    #[test]
    fn test_empty_element_is_empty_string() -> Result<()> {
        assert_eq!(convert_root("<empty></empty>")?, Value::from(""));
        assert_eq!(convert_root("<empty/>")?, Value::from(""));
        Ok(())
    }

    #[test]
    fn test_text_only_element() -> Result<()> {
        assert_eq!(
            convert_root("<text>  Some content \n</text>")?,
            Value::from("Some content")
        );
        Ok(())
    }

    #[test]
    fn test_attributes_fold_into_reserved_key() -> Result<()> {
        let expected = obj(&[
            (ATTRIBUTES_KEY, obj(&[("x", Value::from("1"))])),
            ("b", Value::from("")),
        ]);
        assert_eq!(convert_root("<a x=\"1\"><b/></a>")?, expected);
        Ok(())
    }

    #[test]
    fn test_leaf_with_attributes_keeps_text() -> Result<()> {
        let expected = obj(&[
            (ATTRIBUTES_KEY, obj(&[("CurrencyCode", Value::from("USD"))])),
            (TEXT_KEY, Value::from("250000")),
        ]);
        assert_eq!(
            convert_root("<LoanAmount CurrencyCode=\"USD\">250000</LoanAmount>")?,
            expected
        );
        Ok(())
    }

    #[test]
    fn test_mixed_text_and_children() -> Result<()> {
        let expected = obj(&[(TEXT_KEY, Value::from("note")), ("b", Value::from("x"))]);
        assert_eq!(convert_root("<a>note<b>x</b></a>")?, expected);
        Ok(())
    }

    #[test]
    fn test_text_after_a_child_is_not_merged() -> Result<()> {
        let expected = obj(&[(TEXT_KEY, Value::from("1")), ("b", Value::from(""))]);
        assert_eq!(convert_root("<a>1<b/>2</a>")?, expected);

        let trailing_only = obj(&[("b", Value::from("x"))]);
        assert_eq!(convert_root("<a><b>x</b> tail </a>")?, trailing_only);
        Ok(())
    }

    #[test]
    fn test_repeated_children_fold_to_array() -> Result<()> {
        let expected = obj(&[(
            "b",
            Value::Array(Array::from(vec![Value::from("1"), Value::from("2")])),
        )]);
        assert_eq!(convert_root("<a><b>1</b><b>2</b></a>")?, expected);
        Ok(())
    }

    #[test]
    fn test_single_child_is_not_wrapped() -> Result<()> {
        let value = convert_root("<LOANS><LOAN><LoanAmount>1</LoanAmount></LOAN></LOANS>")?;
        assert!(value.get("LOAN").is_some_and(Value::is_object));
        Ok(())
    }

    #[test]
    fn test_interleaved_repeats_keep_document_order() -> Result<()> {
        let value = convert_root("<a><b>1</b><c>x</c><b>2</b><b>3</b></a>")?;
        assert_eq!(
            value.get("b"),
            Some(&Value::from(vec![
                Value::from("1"),
                Value::from("2"),
                Value::from("3"),
            ]))
        );
        Ok(())
    }

    #[test]
    fn test_namespace_prefixes_are_stripped() -> Result<()> {
        let prefixed = convert_root(
            "<ns:a xmlns:ns=\"http://www.mismo.org/residential/2009/schemas\"><ns:b/></ns:a>",
        )?;
        let plain = convert_root("<a><b/></a>")?;
        assert_eq!(prefixed, plain);
        Ok(())
    }

    #[test]
    fn test_prefixed_attributes_are_stripped() -> Result<()> {
        let value = convert_root(
            "<ROLE xmlns:xlink=\"http://www.w3.org/1999/xlink\" xlink:label=\"BORROWER_1\"/>",
        )?;
        assert_eq!(
            value,
            obj(&[(ATTRIBUTES_KEY, obj(&[("label", Value::from("BORROWER_1"))]))])
        );
        Ok(())
    }

    #[test]
    fn test_collisions_after_stripping_fold() -> Result<()> {
        let value = convert_root("<a xmlns:x=\"u1\" xmlns:y=\"u2\"><x:b>1</x:b><y:b>2</y:b></a>")?;
        assert_eq!(
            value.get("b"),
            Some(&Value::from(vec![Value::from("1"), Value::from("2")]))
        );
        Ok(())
    }

    #[test]
    fn test_keep_root_wraps_result() -> Result<()> {
        let options = ConvertOptions::default().with_keep_root(true);
        let value = convert_bytes_with_options(b"<a><b>1</b><b>2</b></a>", &options)?;
        let expected = obj(&[(
            "a",
            obj(&[("b", Value::from(vec![Value::from("1"), Value::from("2")]))]),
        )]);
        assert_eq!(value, expected);
        Ok(())
    }

    #[test]
    fn test_conversion_is_deterministic() -> Result<()> {
        let mut parser = XmlParser::new(b"<a x=\"1\"><b>1</b><b>2</b><c><d/></c></a>");
        let doc = parser.parse()?;
        assert_eq!(convert(&doc.root), convert(&doc.root));
        Ok(())
    }

    #[test]
    fn test_malformed_input_is_an_error() {
        assert!(convert_root("<?xml version=\"1.0\"?><root><unclosed>").is_err());
    }
}
