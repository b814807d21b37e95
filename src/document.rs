/*!
The document facade: settings holders, the synthetic root container, the
read/write entry points, and navigation helpers.

A document is represented by a synthetic, unnamed container element whose
children are the prolog nodes (XML declaration, comments, a preserved BOM)
plus at most one root element. Building a tree with several top-level
elements programmatically is the caller's responsibility to avoid; writing
does not re-validate.

# Example

```
use xtree_rs::Document;

let mut doc = Document::new();
let root = doc.as_element().create_element("inventory");
let item = root.create_element("item");
item.create_attr("sku", "X-100");
item.set_text("widget");
doc.indent(2);
let xml = doc.write_to_string().unwrap();
assert!(xml.contains("<item sku=\"X-100\">widget</item>"));
```
*/

use crate::element::Element;
use crate::error::{Error, Result};
use crate::path::Path;
use crate::read::{read_document, ReadSettings};
use crate::write::{indent_tree, IndentSettings, WriteSettings, NO_INDENT};
use std::fs::File;
use std::io::{BufWriter, Error as IOError, ErrorKind, Read, Write};
use std::path::Path as FilePath;
use std::result::Result as StdResult;
use std::str::FromStr;

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

///
/// An XML document: read settings, write settings, and the tree under the
/// synthetic root container.
///
#[derive(Debug)]
pub struct Document {
    container: Element,
    /// Settings applied by the `read_from_*` entry points.
    pub read_settings: ReadSettings,
    /// Settings applied by the `write_to*` entry points.
    pub write_settings: WriteSettings,
}

///
/// Turns the absent arm of an element query into a detached sentinel so
/// that call chains on missing nodes have no observable effect on any
/// document.
///
pub trait OrMissing {
    /// The element, or a free-standing sentinel when absent.
    fn or_missing(self) -> Element;
}

// ------------------------------------------------------------------------------------------------
// Implementations
// ------------------------------------------------------------------------------------------------

impl OrMissing for Option<Element> {
    fn or_missing(self) -> Element {
        self.unwrap_or_else(|| Element::new("missing"))
    }
}

// ------------------------------------------------------------------------------------------------

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for Document {
    type Err = Error;

    fn from_str(text: &str) -> StdResult<Self, Self::Err> {
        let mut document = Document::new();
        document.read_from_str(text)?;
        Ok(document)
    }
}

// ------------------------------------------------------------------------------------------------

impl Document {
    ///
    /// An empty document with default settings.
    ///
    pub fn new() -> Self {
        Self {
            container: Element::new_container(),
            read_settings: ReadSettings::default(),
            write_settings: WriteSettings::default(),
        }
    }

    ///
    /// Construct a document by parsing `bytes` with default settings.
    ///
    pub fn from_bytes(bytes: &[u8]) -> Result<Document> {
        let mut document = Document::new();
        document.read_from_bytes(bytes)?;
        Ok(document)
    }

    ///
    /// Construct a document by reading `reader` to its end with default
    /// settings.
    ///
    pub fn from_reader<R>(reader: R) -> Result<Document>
    where
        R: Read,
    {
        let mut document = Document::new();
        let _ = document.read_from_reader(reader)?;
        Ok(document)
    }

    ///
    /// Construct a document from the contents of the file at `path` with
    /// default settings.
    ///
    pub fn from_file<P>(path: P) -> Result<Document>
    where
        P: AsRef<FilePath>,
    {
        let mut document = Document::new();
        let _ = document.read_from_file(path)?;
        Ok(document)
    }

    // --------------------------------------------------------------------------------------------
    // Tree access
    // --------------------------------------------------------------------------------------------

    ///
    /// The synthetic root container holding the prolog and the root
    /// element. Use it to attach document-level comments and processing
    /// instructions, or as the context for path queries.
    ///
    pub fn as_element(&self) -> Element {
        self.container.clone()
    }

    ///
    /// The document's root element, if one exists.
    ///
    pub fn root(&self) -> Option<Element> {
        self.container.child_elements().into_iter().next()
    }

    ///
    /// Replace the root element. The old root is detached (but preserved as
    /// a free-standing tree), the new root is detached from any prior
    /// parent and inserted where the old root was, or at the end of the
    /// prolog when there was none.
    ///
    pub fn set_root(&mut self, root: Element) {
        let at = match self.root() {
            Some(old) => {
                let at = old.index();
                let _ = self.container.remove_child(&old);
                at
            }
            None => self.container.child_count(),
        };
        self.container.insert_child_at(at, &root);
    }

    ///
    /// A deep copy of the document: fresh nodes throughout, settings
    /// cloned; nothing is shared with the original.
    ///
    pub fn copy(&self) -> Document {
        Document {
            container: self.container.duplicate(),
            read_settings: self.read_settings.clone(),
            write_settings: self.write_settings,
        }
    }

    // --------------------------------------------------------------------------------------------
    // Reading
    // --------------------------------------------------------------------------------------------

    ///
    /// Parse `text` into this document, replacing any existing content. On
    /// error the document is left empty; no partial tree is kept.
    ///
    pub fn read_from_str(&mut self, text: &str) -> Result<()> {
        self.read_from_bytes(text.as_bytes())
    }

    ///
    /// Parse `bytes` into this document, replacing any existing content. On
    /// error the document is left empty; no partial tree is kept.
    ///
    pub fn read_from_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.clear();
        let outcome = read_document(&self.container, &self.read_settings, bytes);
        if outcome.is_err() {
            self.clear();
        }
        outcome
    }

    ///
    /// Read `reader` to its end and parse the content; returns the number
    /// of bytes consumed.
    ///
    pub fn read_from_reader<R>(&mut self, mut reader: R) -> Result<usize>
    where
        R: Read,
    {
        let mut bytes = Vec::new();
        let count = reader.read_to_end(&mut bytes)?;
        self.read_from_bytes(&bytes)?;
        Ok(count)
    }

    ///
    /// Open the file at `path` and parse its content; returns the number of
    /// bytes consumed.
    ///
    pub fn read_from_file<P>(&mut self, path: P) -> Result<usize>
    where
        P: AsRef<FilePath>,
    {
        let file = File::open(path)?;
        self.read_from_reader(file)
    }

    fn clear(&mut self) {
        while self.container.child_count() > 0 {
            let _ = self.container.remove_child_at(0);
        }
    }

    // --------------------------------------------------------------------------------------------
    // Writing
    // --------------------------------------------------------------------------------------------

    ///
    /// Serialize the document to `sink` using the document's write
    /// settings.
    ///
    pub fn write_to<W>(&self, sink: &mut W) -> Result<()>
    where
        W: Write,
    {
        for child in self.container.children() {
            child.write_to(sink, &self.write_settings)?;
        }
        Ok(())
    }

    ///
    /// Serialize the document to a byte vector.
    ///
    pub fn write_to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }

    ///
    /// Serialize the document to a string.
    ///
    pub fn write_to_string(&self) -> Result<String> {
        String::from_utf8(self.write_to_bytes()?)
            .map_err(|e| Error::Io(IOError::new(ErrorKind::InvalidData, e)))
    }

    ///
    /// Create (or truncate) the file at `path` and serialize the document
    /// into it, flushing on completion.
    ///
    pub fn write_to_file<P>(&self, path: P) -> Result<()>
    where
        P: AsRef<FilePath>,
    {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    // --------------------------------------------------------------------------------------------
    // Indentation
    // --------------------------------------------------------------------------------------------

    ///
    /// Pretty-print in place with `spaces` spaces per depth level (or
    /// [`NO_INDENT`] to merely strip previous indentation), leaving a
    /// single trailing newline.
    ///
    pub fn indent(&mut self, spaces: isize) {
        let settings = IndentSettings {
            spaces,
            use_crlf: self.write_settings.use_crlf,
            ..IndentSettings::default()
        };
        indent_tree(&self.container, &settings);
    }

    ///
    /// Pretty-print in place with one tab per depth level.
    ///
    pub fn indent_tabs(&mut self) {
        let settings = IndentSettings {
            use_tabs: true,
            use_crlf: self.write_settings.use_crlf,
            ..IndentSettings::default()
        };
        indent_tree(&self.container, &settings);
    }

    ///
    /// Pretty-print in place with full control of the indentation settings.
    /// [`WriteSettings::use_crlf`] on the document forces CRLF line endings
    /// regardless of the passed settings.
    ///
    pub fn indent_with_settings(&mut self, settings: &IndentSettings) {
        let mut settings = *settings;
        if self.write_settings.use_crlf {
            settings.use_crlf = true;
        }
        indent_tree(&self.container, &settings);
    }

    ///
    /// Remove all indentation: strip whitespace-only nodes and leave no
    /// trailing newline.
    ///
    pub fn unindent(&mut self) {
        let settings = IndentSettings {
            spaces: NO_INDENT,
            suppress_trailing_whitespace: true,
            ..IndentSettings::default()
        };
        indent_tree(&self.container, &settings);
    }

    // --------------------------------------------------------------------------------------------
    // Navigation
    // --------------------------------------------------------------------------------------------

    ///
    /// The first top-level element matching `tag` (the root element, when
    /// it matches).
    ///
    pub fn select_element(&self, tag: &str) -> Option<Element> {
        self.container.select_element(tag)
    }

    ///
    /// All top-level elements matching `tag`.
    ///
    pub fn select_elements(&self, tag: &str) -> Vec<Element> {
        self.container.select_elements(tag)
    }

    ///
    /// The first element matching the path expression, evaluated from the
    /// document; `None` on no match or a path that fails to compile.
    ///
    pub fn find_element(&self, path: &str) -> Option<Element> {
        self.container.find_element(path)
    }

    ///
    /// All elements matching the path expression, in document order without
    /// duplicates; empty on a path that fails to compile.
    ///
    pub fn find_elements(&self, path: &str) -> Vec<Element> {
        self.container.find_elements(path)
    }

    ///
    /// The first element matching a precompiled path.
    ///
    pub fn find_element_path(&self, path: &Path) -> Option<Element> {
        self.container.find_element_path(path)
    }

    ///
    /// All elements matching a precompiled path.
    ///
    pub fn find_elements_path(&self, path: &Path) -> Vec<Element> {
        self.container.find_elements_path(path)
    }
}

// ------------------------------------------------------------------------------------------------
// Unit Tests
// ------------------------------------------------------------------------------------------------
