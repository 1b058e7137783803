//! Property-based tests for XML to JSON conversion
//!
//! These tests use proptest to verify:
//! 1. Generated well-formed XML always converts
//! 2. Conversion is deterministic and ignores namespace prefixes
//! 3. Repeated children fold to arrays of the right length
//! 4. Arbitrary input never panics the parser

use std::collections::BTreeMap;

use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

use mismo::{from_xml_bytes, json, xml_to_value, Value, ATTRIBUTES_KEY};

/// Generated element, rendered to XML text by [`render`]
#[derive(Clone, Debug)]
struct Node {
    name: String,
    attrs: BTreeMap<String, String>,
    text: String,
    children: Vec<Node>,
}

fn arb_name() -> impl Strategy<Value = String> {
    "[A-Z][A-Za-z_]{0,6}"
}

fn arb_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 &<>\"']{0,12}"
}

fn arb_node() -> impl Strategy<Value = Node> {
    let leaf = (
        arb_name(),
        prop::collection::btree_map(arb_name(), arb_text(), 0..3),
        arb_text(),
    )
        .prop_map(|(name, attrs, text)| Node {
            name,
            attrs,
            text,
            children: Vec::new(),
        });

    leaf.prop_recursive(4, 64, 6, |inner| {
        (
            arb_name(),
            prop::collection::btree_map(arb_name(), arb_text(), 0..3),
            prop::collection::vec(inner, 0..6),
        )
            .prop_map(|(name, attrs, children)| Node {
                name,
                attrs,
                text: String::new(),
                children,
            })
    })
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Render `node` with an optional namespace prefix on every name
fn render(node: &Node, prefix: Option<&str>, root: bool) -> String {
    let qualify = |name: &str| match prefix {
        Some(prefix) => format!("{prefix}:{name}"),
        None => name.to_string(),
    };

    let mut out = format!("<{}", qualify(&node.name));
    if root {
        if let Some(prefix) = prefix {
            out.push_str(&format!(" xmlns:{prefix}=\"urn:test\""));
        }
    }
    for (key, value) in &node.attrs {
        out.push_str(&format!(" {}=\"{}\"", qualify(key), escape(value)));
    }
    out.push('>');
    out.push_str(&escape(&node.text));
    for child in &node.children {
        out.push_str(&render(child, prefix, false));
    }
    out.push_str(&format!("</{}>", qualify(&node.name)));
    out
}

fn convert_or_fail(xml: &str) -> Result<Value, TestCaseError> {
    xml_to_value(xml).map_err(|err| TestCaseError::fail(format!("convert failed: {err}\n{xml}")))
}

fn ensure_eq<T: PartialEq + std::fmt::Debug>(left: T, right: T) -> Result<(), TestCaseError> {
    if left == right {
        Ok(())
    } else {
        Err(TestCaseError::fail(format!(
            "assertion failed: left={left:?} right={right:?}"
        )))
    }
}

proptest! {
    #[test]
    fn generated_xml_converts(node in arb_node()) {
        let value = convert_or_fail(&render(&node, None, true))?;
        let rendered = json::to_string(&value);
        prop_assert!(serde_json::from_str::<serde_json::Value>(&rendered).is_ok());
    }

    #[test]
    fn conversion_is_deterministic(node in arb_node()) {
        let xml = render(&node, None, true);
        ensure_eq(convert_or_fail(&xml)?, convert_or_fail(&xml)?)?;
    }

    #[test]
    fn namespace_prefixes_do_not_matter(node in arb_node()) {
        let plain = convert_or_fail(&render(&node, None, true))?;
        let prefixed = convert_or_fail(&render(&node, Some("mismo"), true))?;
        ensure_eq(plain, prefixed)?;
    }

    #[test]
    fn leaves_convert_to_trimmed_text(name in arb_name(), text in arb_text()) {
        let node = Node { name, attrs: BTreeMap::new(), text: text.clone(), children: Vec::new() };
        let value = convert_or_fail(&render(&node, None, true))?;
        ensure_eq(value, Value::from(text.trim()))?;
    }

    #[test]
    fn repeated_children_fold_by_count(node in arb_node()) {
        let value = convert_or_fail(&render(&node, None, true))?;

        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for child in &node.children {
            *counts.entry(child.name.as_str()).or_default() += 1;
        }

        for (name, count) in counts {
            let entry = value.get(name);
            prop_assert!(entry.is_some(), "missing key {}", name);
            match entry {
                Some(Value::Array(items)) if count > 1 => ensure_eq(items.len(), count)?,
                Some(Value::Array(_)) => prop_assert!(false, "single {} wrapped in array", name),
                Some(_) => prop_assert!(count == 1, "{} repeated {} times but not folded", name, count),
                None => {}
            }
        }

        if !node.attrs.is_empty() {
            prop_assert!(value.get(ATTRIBUTES_KEY).is_some_and(Value::is_object));
        }
    }

    #[test]
    fn arbitrary_input_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = from_xml_bytes(&bytes);
    }

    #[test]
    fn arbitrary_markup_never_panics(s in "[<>/a-z=\"'&;!?\\[\\] -]{0,64}") {
        let _ = xml_to_value(&s);
    }
}
