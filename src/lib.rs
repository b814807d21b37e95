/*!
An editable, in-memory XML document model: read, build, query with path
expressions, and write, with fine control over indentation,
canonicalization, CDATA preservation, and HTML-style permissive parsing.

The tree is a sum of five node kinds (elements, character data covering
plain text and CDATA, comments, processing instructions, directives) held
under a [`Document`] facade. Handles are cheap clones; mutation goes through
[`Element`], which maintains the parent/index invariants throughout.

# Example

```
use xtree_rs::{Document, OrMissing};

let mut doc: Document = "<library><book lang=\"en\"><title>Emma</title></book></library>"
    .parse()
    .unwrap();

let title = doc.find_element("//book[@lang='en']/title").or_missing();
assert_eq!(title.text(), "Emma");

title.set_text("Persuasion");
doc.indent(2);
assert_eq!(
    doc.write_to_string().unwrap(),
    "<library>\n  <book lang=\"en\">\n    <title>Persuasion</title>\n  </book>\n</library>\n"
);
```
*/

#![warn(
    missing_debug_implementations,
    unused_extern_crates,
    rust_2018_idioms
)]

#[macro_use]
extern crate tracing;

#[macro_use]
extern crate lazy_static;

// ------------------------------------------------------------------------------------------------
// Modules
// ------------------------------------------------------------------------------------------------

mod rc_cell;

pub(crate) mod syntax;

mod error;
pub use error::{Error, PathError, Result, SyntaxError};

mod name;
pub use name::QName;

mod attribute;
pub use attribute::Attr;

mod node;
pub use node::Node;

mod element;
pub use element::Element;

mod document;
pub use document::{Document, OrMissing};

mod read;
pub use read::{CharsetReader, ReadSettings, HTML_AUTO_CLOSE};

mod write;
pub use write::{IndentSettings, WriteSettings, NO_INDENT};

mod path;
pub use path::Path;
