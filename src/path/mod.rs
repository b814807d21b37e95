/*!
Path expressions: a pragmatic XPath-like subset for selecting elements.

A path is compiled once into an immutable sequence of segments and may be
evaluated any number of times against a context element. The string-form
helpers on [`Element`](crate::Element) and [`Document`](crate::Document)
compile per call and silently return an empty result on a compile error;
use [`Path::compile`] to surface the error and amortize parsing.

```
use xtree_rs::{Document, Path};

let mut doc = Document::new();
doc.read_from_str("<a><b><c id='one'/><c id='two'/></b></a>").unwrap();
let path = Path::compile("//c[@id='two']").unwrap();
assert_eq!(doc.find_element_path(&path).map(|e| e.tag()), Some("c".to_string()));
```
*/

use crate::error::PathError;
use crate::name::QName;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

pub(crate) mod engine;
mod parser;

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

///
/// A compiled path expression.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path {
    pub(crate) source: String,
    pub(crate) segments: Vec<Segment>,
}

// ------------------------------------------------------------------------------------------------
// Private (crate) Types
// ------------------------------------------------------------------------------------------------

///
/// One step of a compiled path: how to move (axis), what to select, and the
/// predicates that filter the selection.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Segment {
    pub(crate) axis: Axis,
    pub(crate) selector: Selector,
    pub(crate) filters: Vec<Filter>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Axis {
    Child,
    DescendantOrSelf,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Selector {
    /// `/` at the start of a path: the topmost element of the tree.
    Root,
    /// `.`
    Current,
    /// `..`
    Parent,
    /// A name test, possibly wildcarded.
    Tag(NameTest),
}

///
/// A name pattern: no prefix matches any prefix, `*` as the local part
/// matches any local name.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct NameTest {
    pub(crate) prefix: Option<String>,
    pub(crate) local: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Filter {
    /// `[n]`, 1-based over one context's candidates.
    Pos(usize),
    /// `[@key]`
    HasAttr(NameTest),
    /// `[@key='value']`
    AttrEq(NameTest, String),
    /// `[tag]`
    HasChild(NameTest),
    /// `[tag='value']`
    ChildEq(NameTest, String),
    /// `[text()]`
    HasText,
    /// `[text()='value']`
    TextEq(String),
    /// `[function()]`
    Func(PathFunction),
    /// `[function()='value']`
    FuncEq(PathFunction, String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PathFunction {
    LocalName,
    Name,
    NamespacePrefix,
    NamespaceUri,
}

// ------------------------------------------------------------------------------------------------
// Implementations
// ------------------------------------------------------------------------------------------------

impl Path {
    ///
    /// Compile `path` into its segment sequence, or report why it is not a
    /// valid path expression.
    ///
    pub fn compile(path: &str) -> Result<Path, PathError> {
        let segments = parser::parse_path(path)?;
        Ok(Path {
            source: path.to_string(),
            segments,
        })
    }

    ///
    /// The expression this path was compiled from.
    ///
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl Display for Path {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.source)
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::compile(value)
    }
}

// ------------------------------------------------------------------------------------------------

impl NameTest {
    pub(crate) fn matches_name(&self, name: &QName) -> bool {
        if self.local != "*" && self.local != name.local_name() {
            return false;
        }
        match &self.prefix {
            None => true,
            Some(prefix) => name.prefix() == Some(prefix.as_str()),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// Unit Tests
// ------------------------------------------------------------------------------------------------
