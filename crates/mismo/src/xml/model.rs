//! XML data model

use indexmap::IndexMap;

use crate::xml::qname;

/// XML document
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub root: Element,
}

/// XML element
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    /// Qualified name as written in the source (`mismo:LOAN`)
    pub name: String,
    pub attributes: IndexMap<String, String>,
    pub children: Vec<Content>,
}

/// XML content node
#[derive(Clone, Debug, PartialEq)]
pub enum Content {
    Element(Element),
    Text(String),
}

impl Element {
    /// Create an element with no attributes or children
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Name with any namespace prefix removed
    pub fn local_name(&self) -> &str {
        qname::local_name(&self.name)
    }

    /// Iterate over child elements, skipping text
    pub fn child_elements(&self) -> impl Iterator<Item = &Self> {
        self.children.iter().filter_map(|child| match child {
            Content::Element(element) => Some(element),
            Content::Text(_) => None,
        })
    }

    /// Attributes that carry data, i.e. everything except `xmlns` declarations
    pub fn data_attributes(&self) -> impl Iterator<Item = (&String, &String)> {
        self.attributes
            .iter()
            .filter(|(name, _)| !qname::is_namespace_declaration(name))
    }

    /// Text before the first child element. Text following a child is its
    /// tail and does not belong to this element's value.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .map_while(|child| match child {
                Content::Text(text) => Some(text.as_str()),
                Content::Element(_) => None,
            })
            .collect()
    }
}
