/*!
Attribute records.

An attribute is an owned record on its element: a qualified name, a value,
and a weak back-reference to the owner. Handles returned from queries are
clones of the record; the back-reference in a clone still names the owning
element, but editing a clone does not write through to the tree. Use
[`Element::create_attr`](crate::Element::create_attr) for that.
*/

use crate::element::Element;
use crate::name::QName;
use crate::node::{NodeKind, WeakRefNode};
use std::fmt::{Display, Formatter, Result as FmtResult};

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

///
/// A single attribute: qualified name, value, and owner back-reference.
///
#[derive(Clone, Debug)]
pub struct Attr {
    pub(crate) name: QName,
    pub(crate) value: String,
    pub(crate) owner: Option<WeakRefNode>,
}

// ------------------------------------------------------------------------------------------------
// Implementations
// ------------------------------------------------------------------------------------------------

impl Display for Attr {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}=\"{}\"", self.name, self.value)
    }
}

// ------------------------------------------------------------------------------------------------

///
/// Equality compares name and value; the owner back-reference is identity
/// bookkeeping and takes no part in it.
///
impl PartialEq for Attr {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.value == other.value
    }
}

impl Eq for Attr {}

// ------------------------------------------------------------------------------------------------

impl Attr {
    ///
    /// A detached attribute record; `key` may be `local` or `prefix:local`.
    ///
    pub fn new<S>(key: &str, value: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            name: QName::from(key),
            value: value.into(),
            owner: None,
        }
    }

    pub fn name(&self) -> &QName {
        &self.name
    }

    ///
    /// The full `prefix:local` key.
    ///
    pub fn key(&self) -> String {
        self.name.full()
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value<S>(&mut self, value: S)
    where
        S: Into<String>,
    {
        self.value = value.into();
    }

    ///
    /// The element this attribute is attached to, or `None` once it has been
    /// removed (or was never attached).
    ///
    pub fn owner(&self) -> Option<Element> {
        let cell = self.owner.as_ref()?.upgrade()?;
        match &cell.borrow().kind {
            NodeKind::Element(_) => (),
            _ => return None,
        }
        Some(Element { cell })
    }

    ///
    /// Sort key used by `sort_attrs`: unprefixed attributes order before
    /// prefixed ones, then by prefix, then by local name, in Unicode
    /// code-point order.
    ///
    pub(crate) fn sort_key(&self) -> (bool, String, String) {
        (
            self.name.prefix().is_some(),
            self.name.prefix().unwrap_or_default().to_string(),
            self.name.local_name().to_string(),
        )
    }
}

// ------------------------------------------------------------------------------------------------
// Unit Tests
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_attr_display() {
        let attr = Attr::new("xmlns:t", "urn:example:thing");
        assert_eq!(attr.key(), "xmlns:t");
        assert_eq!(attr.to_string(), "xmlns:t=\"urn:example:thing\"");
    }

    #[test]
    fn test_detached_attr_has_no_owner() {
        let attr = Attr::new("id", "a1");
        assert!(attr.owner().is_none());
    }

    #[test]
    fn test_sort_key_ordering() {
        let plain = Attr::new("zeta", "1");
        let prefixed = Attr::new("a:alpha", "2");
        assert!(plain.sort_key() < prefixed.sort_key());
    }
}
