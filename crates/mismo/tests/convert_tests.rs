use std::fs;

use pretty_assertions::assert_eq;
use serde_json::json;

use mismo::{json as render, xml_to_json, xml_to_value, ErrorKind};

fn fixture(name: &str) -> Result<String, std::io::Error> {
    fs::read_to_string(format!(
        "{}/tests/fixtures/valid/{name}",
        env!("CARGO_MANIFEST_DIR")
    ))
}

fn to_json(input: &str) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    Ok(serde_json::from_str(&xml_to_json(input)?)?)
}

#[test]
fn test_simple_document() -> Result<(), Box<dyn std::error::Error>> {
    let data = to_json(&fixture("simple.xml")?)?;
    assert_eq!(
        data,
        json!({
            "name": "Test Name",
            "value": "123",
            "items": {"item": ["First", "Second", "Third"]}
        })
    );
    Ok(())
}

#[test]
fn test_namespaced_tags_are_stripped() -> Result<(), Box<dyn std::error::Error>> {
    let data = to_json(&fixture("namespaces.xml")?)?;
    assert_eq!(data, json!({"LoanAmount": "250000", "InterestRate": "3.5"}));
    Ok(())
}

#[test]
fn test_attributes_are_folded() -> Result<(), Box<dyn std::error::Error>> {
    let data = to_json(&fixture("attributes.xml")?)?;
    assert_eq!(
        data,
        json!({
            "person": {
                "@attributes": {"id": "1", "type": "borrower"},
                "name": "John Doe",
                "age": "30"
            }
        })
    );
    Ok(())
}

#[test]
fn test_cdata_and_comments() -> Result<(), Box<dyn std::error::Error>> {
    let data = to_json(&fixture("cdata_and_comments.xml")?)?;
    assert_eq!(
        data,
        json!({"Note": "Borrower requested <rate lock> & float-down"})
    );
    Ok(())
}

#[test]
fn test_attribute_example() -> Result<(), Box<dyn std::error::Error>> {
    assert_eq!(
        to_json("<a x=\"1\"><b/></a>")?,
        json!({"@attributes": {"x": "1"}, "b": ""})
    );
    Ok(())
}

#[test]
fn test_duplicate_children_at_root() -> Result<(), Box<dyn std::error::Error>> {
    let xml = "<root>\n<item>First</item>\n<item>Second</item>\n<item>Third</item>\n</root>";
    assert_eq!(to_json(xml)?, json!({"item": ["First", "Second", "Third"]}));
    Ok(())
}

#[test]
fn test_repeated_records_keep_structure() -> Result<(), Box<dyn std::error::Error>> {
    let xml = "<PARTIES>\
               <PARTY><Name>A</Name></PARTY>\
               <PARTY SequenceNumber=\"2\"><Name>B</Name></PARTY>\
               </PARTIES>";
    assert_eq!(
        to_json(xml)?,
        json!({
            "PARTY": [
                {"Name": "A"},
                {"@attributes": {"SequenceNumber": "2"}, "Name": "B"}
            ]
        })
    );
    Ok(())
}

#[test]
fn test_namespace_equivalence() -> Result<(), Box<dyn std::error::Error>> {
    let prefixed = xml_to_value("<ns:a xmlns:ns=\"urn:x\"><ns:b/></ns:a>")?;
    let plain = xml_to_value("<a><b/></a>")?;
    assert_eq!(prefixed, plain);
    Ok(())
}

#[test]
fn test_non_ascii_is_preserved() -> Result<(), Box<dyn std::error::Error>> {
    let value = xml_to_value("<n><City>Zürich</City></n>")?;
    assert!(render::to_string(&value).contains("Zürich"));
    Ok(())
}

#[test]
fn test_malformed_xml_reports_location() {
    let err = xml_to_value("<?xml version=\"1.0\"?>\n<root>\n  <unclosed>\n");
    let err = match err {
        Ok(value) => panic!("expected a parse error, got {value:?}"),
        Err(err) => err,
    };
    assert_eq!(err.kind(), &ErrorKind::UnexpectedEof);
    assert!(err.line() >= 2);
    assert!(err.to_string().contains("line"));
}
