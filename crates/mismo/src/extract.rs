//! Structured loan data extraction
//!
//! Projects a converted MISMO `MESSAGE` onto six fixed sections. Each section
//! is looked up independently; a missing or oddly shaped path leaves that
//! section empty rather than failing.

use tracing::{debug, instrument};

use crate::value::{Array, Object, Value};

const MESSAGE: &str = "MESSAGE";
const ABOUT_VERSION_PATH: &[&str] = &["ABOUT_VERSIONS", "ABOUT_VERSION"];
const DEAL_PATH: &[&str] = &["DEAL_SETS", "DEAL_SET", "DEALS", "DEAL"];
const COLLATERAL_PATH: &[&str] = &["COLLATERALS", "COLLATERAL"];
const LOAN_PATH: &[&str] = &["LOANS", "LOAN"];
const PARTY_PATH: &[&str] = &["PARTIES", "PARTY"];
const RELATIONSHIP_PATH: &[&str] = &["RELATIONSHIPS", "RELATIONSHIP"];

/// Section names in output order
pub const SECTIONS: [&str; 6] = [
    "message_info",
    "deal_info",
    "collaterals",
    "loans",
    "parties",
    "relationships",
];

/// Six-section view of a converted MISMO document
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StructuredDocument {
    /// First `ABOUT_VERSION` of the message
    pub message_info: Object,
    /// First `DEAL` of the first `DEAL_SET`
    pub deal_info: Object,
    pub collaterals: Array,
    pub loans: Array,
    pub parties: Array,
    pub relationships: Array,
}

impl StructuredDocument {
    /// True when no section was found
    pub fn is_empty(&self) -> bool {
        self.message_info.is_empty()
            && self.deal_info.is_empty()
            && self.collaterals.is_empty()
            && self.loans.is_empty()
            && self.parties.is_empty()
            && self.relationships.is_empty()
    }

    /// Object with exactly the six section keys, in [`SECTIONS`] order
    pub fn into_value(self) -> Value {
        let [message_info, deal_info, collaterals, loans, parties, relationships] = SECTIONS;
        let mut obj = Object::new();
        obj.insert(message_info, self.message_info);
        obj.insert(deal_info, self.deal_info);
        obj.insert(collaterals, self.collaterals);
        obj.insert(loans, self.loans);
        obj.insert(parties, self.parties);
        obj.insert(relationships, self.relationships);
        Value::Object(obj)
    }
}

impl From<StructuredDocument> for Value {
    fn from(doc: StructuredDocument) -> Self {
        doc.into_value()
    }
}

/// Extract the structured sections from a converted tree.
///
/// `tree` is normally the unwrapped root (`MESSAGE` contents); a tree still
/// wrapped in a `MESSAGE` key is unwrapped first. Never fails.
#[instrument(level = "debug", skip_all)]
pub fn extract(tree: &Value) -> StructuredDocument {
    let root = match tree.get(MESSAGE) {
        Some(message) if message.is_object() => message,
        _ => tree,
    };

    let deal = lookup(root, DEAL_PATH).and_then(first);
    let from_deal = |path: &[&str]| deal.and_then(|deal| lookup(deal, path));

    let relationships = lookup(root, RELATIONSHIP_PATH).or_else(|| from_deal(RELATIONSHIP_PATH));

    let doc = StructuredDocument {
        message_info: record(lookup(root, ABOUT_VERSION_PATH), "message_info"),
        deal_info: record(deal, "deal_info"),
        collaterals: records(from_deal(COLLATERAL_PATH)),
        loans: records(from_deal(LOAN_PATH)),
        parties: records(from_deal(PARTY_PATH)),
        relationships: records(relationships),
    };

    debug!(
        collaterals = doc.collaterals.len(),
        loans = doc.loans.len(),
        parties = doc.parties.len(),
        relationships = doc.relationships.len(),
        "extracted structured loan data"
    );
    doc
}

/// Walk `path` from `value`, taking the first entry wherever an intermediate
/// container repeats
fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(value, |current, key| first(current)?.get(key))
}

/// First element of an array, or the value itself
fn first(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.first(),
        other => Some(other),
    }
}

fn record(value: Option<&Value>, section: &str) -> Object {
    match value.and_then(first) {
        Some(Value::Object(obj)) => obj.clone(),
        Some(_) => {
            debug!(section, "expected an object, leaving section empty");
            Object::new()
        }
        None => Object::new(),
    }
}

fn records(value: Option<&Value>) -> Array {
    match value {
        Some(Value::Array(items)) => items.clone(),
        Some(single) => Array::from(vec![single.clone()]),
        None => Array::new(),
    }
}
