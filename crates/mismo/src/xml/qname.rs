//! Qualified name handling.
//!
//! A qualified name has the form `prefix:localname` or just `localname`.
//! Converted output is keyed by local names only, so the prefix is dropped
//! from every tag and attribute name.

/// Splits a qualified name into its prefix and local name parts.
///
/// Returns `(Some(prefix), localname)` if the name contains a colon,
/// or `(None, localname)` if it does not. Only the first colon splits.
pub fn split_qname(qname: &str) -> (Option<&str>, &str) {
    match qname.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, qname),
    }
}

/// Local part of a qualified name (`mismo:LOAN` -> `LOAN`)
pub fn local_name(qname: &str) -> &str {
    split_qname(qname).1
}

/// True for `xmlns` and `xmlns:prefix` attributes
pub fn is_namespace_declaration(name: &str) -> bool {
    match split_qname(name) {
        (None, local) => local == "xmlns",
        (Some(prefix), _) => prefix == "xmlns",
    }
}
