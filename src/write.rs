/*!
The serialization engine: a document-order walk over the tree emitting XML
text with configurable escaping, plus the indentation machinery.

Two independent canonical escaping profiles are supported, one for character
data and one for attribute values; without them the friendly default escapes
the five predefined entities in both contexts. In every mode, characters
outside the XML `Char` production are replaced with `U+FFFD`.

The writer emits bytes directly rather than going through the token layer's
writer: the canonical profiles and the replacement rule are finer-grained
than that writer's escaper allows.
*/

use crate::element::Element;
use crate::error::Result;
use crate::node::{new_char_data_cell, NodeKind, RefNode};
use crate::syntax::{
    is_xml_char, XML_CDATA_END, XML_CDATA_START, XML_COMMENT_END, XML_COMMENT_START,
    XML_DIRECTIVE_END, XML_DIRECTIVE_START, XML_ELEMENT_END_END, XML_ELEMENT_END_START,
    XML_ELEMENT_SELF_CLOSE, XML_ELEMENT_START_END, XML_ELEMENT_START_START, XML_PI_END,
    XML_PI_START,
};
use std::char::REPLACEMENT_CHARACTER;
use std::io::{Result as IoResult, Write};

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

///
/// Switches applied while serializing a tree.
///
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriteSettings {
    /// Emit an explicit `</tag>` even when the element has no children.
    pub canonical_end_tags: bool,
    /// In character data escape only `&`, `<`, `>` and CR (as `&#xD;`),
    /// leaving apostrophe and quote literal.
    pub canonical_text: bool,
    /// In attribute values escape `&`, `<`, the quoting character, and
    /// tab/LF/CR as numeric references, leaving `>` literal.
    pub canonical_attr_val: bool,
    /// Enclose attribute values in single quotes; the escaping rules swap
    /// which quote character is escaped.
    pub attr_single_quote: bool,
    /// Indentation produced by the `indent` family uses `\r\n` line endings.
    pub use_crlf: bool,
}

///
/// The sentinel for [`IndentSettings::spaces`] that disables indentation
/// prefixes entirely while still stripping previously inserted whitespace.
///
pub const NO_INDENT: isize = -1;

///
/// Switches applied while pretty-printing a tree in place.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndentSettings {
    /// Number of spaces per depth level, or [`NO_INDENT`].
    pub spaces: isize,
    /// Indent with one tab per depth level instead of spaces.
    pub use_tabs: bool,
    /// Inserted line endings are `\r\n`.
    pub use_crlf: bool,
    /// Keep the interior of a whitespace-only leaf element verbatim.
    pub preserve_leaf_whitespace: bool,
    /// Remove the trailing newline at the end of the document.
    pub suppress_trailing_whitespace: bool,
}

// ------------------------------------------------------------------------------------------------
// Implementations
// ------------------------------------------------------------------------------------------------

impl Default for IndentSettings {
    fn default() -> Self {
        Self {
            spaces: 4,
            use_tabs: false,
            use_crlf: false,
            preserve_leaf_whitespace: false,
            suppress_trailing_whitespace: false,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// Private (crate) Functions -- Serialization
// ------------------------------------------------------------------------------------------------

pub(crate) fn write_node<W>(sink: &mut W, cell: &RefNode, settings: &WriteSettings) -> Result<()>
where
    W: Write,
{
    let data = cell.borrow();
    match &data.kind {
        NodeKind::Element(ed) => {
            write!(sink, "{}{}", XML_ELEMENT_START_START, ed.name)?;
            let quote = if settings.attr_single_quote { b'\'' } else { b'"' };
            for attr in &ed.attrs {
                write!(sink, " {}=", attr.name)?;
                sink.write_all(&[quote])?;
                escape_attr_value(
                    sink,
                    &attr.value,
                    settings.canonical_attr_val,
                    settings.attr_single_quote,
                )?;
                sink.write_all(&[quote])?;
            }
            if ed.children.is_empty() && !settings.canonical_end_tags {
                sink.write_all(XML_ELEMENT_SELF_CLOSE.as_bytes())?;
            } else {
                sink.write_all(XML_ELEMENT_START_END.as_bytes())?;
                for child in &ed.children {
                    write_node(sink, child, settings)?;
                }
                write!(
                    sink,
                    "{}{}{}",
                    XML_ELEMENT_END_START, ed.name, XML_ELEMENT_END_END
                )?;
            }
        }
        NodeKind::CharData(cd) => {
            if cd.cdata {
                write!(sink, "{}{}{}", XML_CDATA_START, cd.data, XML_CDATA_END)?;
            } else {
                escape_text(sink, &cd.data, settings.canonical_text)?;
            }
        }
        NodeKind::Comment(text) => {
            write!(sink, "{}{}{}", XML_COMMENT_START, text, XML_COMMENT_END)?;
        }
        NodeKind::ProcInst(pi) => {
            if pi.inst.is_empty() {
                write!(sink, "{}{}{}", XML_PI_START, pi.target, XML_PI_END)?;
            } else {
                write!(sink, "{}{} {}{}", XML_PI_START, pi.target, pi.inst, XML_PI_END)?;
            }
        }
        NodeKind::Directive(body) => {
            write!(sink, "{}{}{}", XML_DIRECTIVE_START, body, XML_DIRECTIVE_END)?;
        }
    }
    Ok(())
}

fn escape_text<W>(sink: &mut W, text: &str, canonical: bool) -> IoResult<()>
where
    W: Write,
{
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' if canonical => out.push_str("&#xD;"),
            '\'' if !canonical => out.push_str("&apos;"),
            '"' if !canonical => out.push_str("&quot;"),
            c if !is_xml_char(c) => out.push(REPLACEMENT_CHARACTER),
            c => out.push(c),
        }
    }
    sink.write_all(out.as_bytes())
}

fn escape_attr_value<W>(sink: &mut W, value: &str, canonical: bool, single: bool) -> IoResult<()>
where
    W: Write,
{
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' if !single => out.push_str("&quot;"),
            '"' if !canonical => out.push_str("&quot;"),
            '\'' if single => out.push_str("&apos;"),
            '\'' if !canonical => out.push_str("&apos;"),
            '>' if !canonical => out.push_str("&gt;"),
            '\t' if canonical => out.push_str("&#x9;"),
            '\n' if canonical => out.push_str("&#xA;"),
            '\r' if canonical => out.push_str("&#xD;"),
            c if !is_xml_char(c) => out.push(REPLACEMENT_CHARACTER),
            c => out.push(c),
        }
    }
    sink.write_all(out.as_bytes())
}

// ------------------------------------------------------------------------------------------------
// Private (crate) Functions -- Indentation
// ------------------------------------------------------------------------------------------------

///
/// Pretty-print the tree under `container` in place. `container` is the
/// document's synthetic root, walked at depth zero so that top-level nodes
/// get bare newlines and the close of the walk leaves a single trailing
/// newline.
///
pub(crate) fn indent_tree(container: &Element, settings: &IndentSettings) {
    indent_element(container, 0, settings);
    if settings.suppress_trailing_whitespace {
        strip_trailing_whitespace(container);
    }
}

fn indent_element(element: &Element, depth: isize, settings: &IndentSettings) {
    strip_indent(element, settings);
    let old: Vec<RefNode> = {
        let mut data = element.edata_mut();
        std::mem::take(&mut data.children)
    };
    if old.is_empty() {
        return;
    }
    let mut rebuilt: Vec<RefNode> = Vec::with_capacity(old.len() * 2 + 1);
    let mut last_was_char_data = false;
    let mut first_structured = true;
    for cell in old {
        let is_char_data = matches!(cell.borrow().kind, NodeKind::CharData(_));
        if !is_char_data {
            if !first_structured || depth > 0 {
                let text = indent_text(depth, settings);
                if !text.is_empty() {
                    rebuilt.push(new_char_data_cell(text, false));
                }
            }
            first_structured = false;
        }
        let is_element = matches!(cell.borrow().kind, NodeKind::Element(_));
        rebuilt.push(cell.clone());
        if is_element {
            indent_element(&Element { cell }, depth + 1, settings);
        }
        last_was_char_data = is_char_data;
    }
    if !last_was_char_data && (!first_structured || depth > 0) {
        let text = indent_text(depth - 1, settings);
        if !text.is_empty() {
            rebuilt.push(new_char_data_cell(text, false));
        }
    }
    for (index, cell) in rebuilt.iter().enumerate() {
        let mut data = cell.borrow_mut();
        data.parent = Some(element.cell.downgrade());
        data.index = index;
    }
    element.edata_mut().children = rebuilt;
}

///
/// Remove whitespace-only character data (previously inserted indentation)
/// from an element's child list. A leaf whose single child is whitespace
/// keeps it when `preserve_leaf_whitespace` is set.
///
fn strip_indent(element: &Element, settings: &IndentSettings) {
    let (total, whitespace) = {
        let data = element.edata();
        let whitespace = data
            .children
            .iter()
            .filter(|cell| is_whitespace_char_data(cell))
            .count();
        (data.children.len(), whitespace)
    };
    if whitespace == 0 {
        return;
    }
    if total == 1 && whitespace == 1 && settings.preserve_leaf_whitespace {
        return;
    }
    let (kept, removed): (Vec<RefNode>, Vec<RefNode>) = {
        let data = element.edata();
        data.children
            .iter()
            .cloned()
            .partition(|cell| !is_whitespace_char_data(cell))
    };
    for cell in &removed {
        let mut data = cell.borrow_mut();
        data.parent = None;
        data.index = 0;
    }
    for (index, cell) in kept.iter().enumerate() {
        cell.borrow_mut().index = index;
    }
    element.edata_mut().children = kept;
}

fn strip_trailing_whitespace(container: &Element) {
    let last_is_whitespace = {
        let data = container.edata();
        data.children
            .last()
            .map(is_whitespace_char_data)
            .unwrap_or(false)
    };
    if last_is_whitespace {
        let count = container.child_count();
        let _ = container.remove_child_at(count - 1);
    }
}

fn is_whitespace_char_data(cell: &RefNode) -> bool {
    matches!(&cell.borrow().kind, NodeKind::CharData(cd) if cd.whitespace)
}

///
/// The text inserted before a child at the given depth: a newline plus one
/// indent unit per level. Negative depth yields a bare newline (used before
/// the document-level close of the walk).
///
fn indent_text(depth: isize, settings: &IndentSettings) -> String {
    let newline = if settings.use_crlf { "\r\n" } else { "\n" };
    if depth < 0 {
        return newline.to_string();
    }
    if settings.use_tabs {
        format!("{}{}", newline, "\t".repeat(depth as usize))
    } else if settings.spaces >= 0 {
        format!(
            "{}{}",
            newline,
            " ".repeat(settings.spaces as usize * depth as usize)
        )
    } else {
        String::new()
    }
}

// ------------------------------------------------------------------------------------------------
// Unit Tests
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;
    use pretty_assertions::assert_eq;

    fn render(node: &Node, settings: &WriteSettings) -> String {
        let mut out = Vec::new();
        node.write_to(&mut out, settings).expect("write failed");
        String::from_utf8(out).expect("non-utf8 output")
    }

    #[test]
    fn test_write_element_friendly() {
        let root = Element::new("root");
        let _ = root.create_attr("a", "1 & 2");
        let child = root.create_element("child");
        child.set_text("x < y");
        let _empty = root.create_element("empty");

        assert_eq!(
            render(&root.as_node(), &WriteSettings::default()),
            "<root a=\"1 &amp; 2\"><child>x &lt; y</child><empty/></root>"
        );
    }

    #[test]
    fn test_write_canonical_end_tags() {
        let root = Element::new("root");
        let _ = root.create_element("empty");
        let settings = WriteSettings {
            canonical_end_tags: true,
            ..WriteSettings::default()
        };
        assert_eq!(
            render(&root.as_node(), &settings),
            "<root><empty></empty></root>"
        );
    }

    #[test]
    fn test_write_single_quoted_attrs() {
        let root = Element::new("root");
        let _ = root.create_attr("a", "it's \"quoted\"");
        let settings = WriteSettings {
            attr_single_quote: true,
            ..WriteSettings::default()
        };
        assert_eq!(
            render(&root.as_node(), &settings),
            "<root a='it&apos;s &quot;quoted&quot;'/>"
        );
    }

    #[test]
    fn test_text_escaping_friendly_five() {
        let root = Element::new("r");
        root.set_text("a<b>&'\"");
        assert_eq!(
            render(&root.as_node(), &WriteSettings::default()),
            "<r>a&lt;b&gt;&amp;&apos;&quot;</r>"
        );
    }

    #[test]
    fn test_text_escaping_canonical() {
        let root = Element::new("e");
        root.set_text("\r<'\">&\u{4}\u{5}\u{1f}\u{FFFD}");
        let settings = WriteSettings {
            canonical_end_tags: true,
            canonical_text: true,
            canonical_attr_val: true,
            ..WriteSettings::default()
        };
        assert_eq!(
            render(&root.as_node(), &settings),
            "<e>&#xD;&lt;'\"&gt;&amp;\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}</e>"
        );
    }

    #[test]
    fn test_attr_escaping_canonical() {
        let root = Element::new("r");
        let _ = root.create_attr("a", "\t\n\r\"<>'");
        let settings = WriteSettings {
            canonical_attr_val: true,
            ..WriteSettings::default()
        };
        assert_eq!(
            render(&root.as_node(), &settings),
            "<r a=\"&#x9;&#xA;&#xD;&quot;&lt;>'\"/>"
        );
    }

    #[test]
    fn test_invalid_chars_replaced_in_friendly_mode() {
        let root = Element::new("r");
        root.set_text("ok\u{0}\u{1f}ok");
        assert_eq!(
            render(&root.as_node(), &WriteSettings::default()),
            "<r>ok\u{FFFD}\u{FFFD}ok</r>"
        );
    }

    #[test]
    fn test_write_cdata_verbatim() {
        let root = Element::new("r");
        root.set_cdata("a < b & c");
        assert_eq!(
            render(&root.as_node(), &WriteSettings::default()),
            "<r><![CDATA[a < b & c]]></r>"
        );
    }

    #[test]
    fn test_write_comment_pi_directive() {
        let comment = Node::new_comment(" note ");
        assert_eq!(
            render(&comment, &WriteSettings::default()),
            "<!-- note -->"
        );

        let pi = Node::new_proc_inst("xml-stylesheet", "href=\"a.xsl\"");
        assert_eq!(
            render(&pi, &WriteSettings::default()),
            "<?xml-stylesheet href=\"a.xsl\"?>"
        );

        let bare_pi = Node::new_proc_inst("target", "");
        assert_eq!(render(&bare_pi, &WriteSettings::default()), "<?target?>");

        let directive = Node::new_directive("DOCTYPE html");
        assert_eq!(
            render(&directive, &WriteSettings::default()),
            "<!DOCTYPE html>"
        );
    }

    #[test]
    fn test_indent_text_shapes() {
        let settings = IndentSettings {
            spaces: 2,
            ..IndentSettings::default()
        };
        assert_eq!(indent_text(-1, &settings), "\n");
        assert_eq!(indent_text(0, &settings), "\n");
        assert_eq!(indent_text(2, &settings), "\n    ");

        let tabs = IndentSettings {
            use_tabs: true,
            use_crlf: true,
            ..IndentSettings::default()
        };
        assert_eq!(indent_text(2, &tabs), "\r\n\t\t");

        let none = IndentSettings {
            spaces: NO_INDENT,
            ..IndentSettings::default()
        };
        assert_eq!(indent_text(-1, &none), "\n");
        assert_eq!(indent_text(0, &none), "");
        assert_eq!(indent_text(3, &none), "");
    }
}
