/*!
Qualified names: an optional namespace prefix plus a local name.

Unlike a W3C DOM name this type carries no resolved namespace URI; URIs are
recovered on demand by walking the tree for `xmlns` declarations, which stays
correct under mutation (see [`Element::namespace_uri`](crate::Element::namespace_uri)).
*/

use crate::syntax::XML_NS_SEPARATOR;
use std::fmt::{Display, Formatter, Result as FmtResult};

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

///
/// The name of an element or attribute: an optional prefix and a local name.
///
/// `QName::from("t:title")` has prefix `t`; `QName::from("title")` has none.
/// Parsing splits at the first separator only, so `a:b:c` yields prefix `a`
/// and local name `b:c`, mirroring what the token layer reports.
///
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QName {
    prefix: Option<String>,
    local: String,
}

// ------------------------------------------------------------------------------------------------
// Implementations
// ------------------------------------------------------------------------------------------------

impl Display for QName {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &self.prefix {
            Some(prefix) => write!(f, "{}{}{}", prefix, XML_NS_SEPARATOR, self.local),
            None => write!(f, "{}", self.local),
        }
    }
}

// ------------------------------------------------------------------------------------------------

impl From<&str> for QName {
    fn from(value: &str) -> Self {
        match value.find(XML_NS_SEPARATOR) {
            Some(at) if at > 0 => Self {
                prefix: Some(value[..at].to_string()),
                local: value[at + 1..].to_string(),
            },
            _ => Self {
                prefix: None,
                local: value.to_string(),
            },
        }
    }
}

impl From<&String> for QName {
    fn from(value: &String) -> Self {
        Self::from(value.as_str())
    }
}

// ------------------------------------------------------------------------------------------------

impl QName {
    pub fn new<S>(local: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            prefix: None,
            local: local.into(),
        }
    }

    pub fn with_prefix<S1, S2>(prefix: S1, local: S2) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Self {
            prefix: Some(prefix.into()),
            local: local.into(),
        }
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn local_name(&self) -> &str {
        &self.local
    }

    ///
    /// The `prefix:local` form, or just the local name when there is no
    /// prefix.
    ///
    pub fn full(&self) -> String {
        self.to_string()
    }

    ///
    /// Selection matching: a requested name with no prefix matches any
    /// prefix carrying the same local name (`title` matches `t:title`); a
    /// requested prefix must match exactly.
    ///
    pub fn matches(&self, requested: &QName) -> bool {
        if self.local != requested.local {
            return false;
        }
        match &requested.prefix {
            None => true,
            Some(prefix) => self.prefix.as_deref() == Some(prefix.as_str()),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// Unit Tests
// ------------------------------------------------------------------------------------------------
