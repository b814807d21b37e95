/*!
The tree node representation.

A node is a tagged sum of five alternatives (character data covers both
plain text and CDATA sections through a flag). Every node carries a weak
back-reference to its parent element and a cached index that always equals
its physical offset in the parent's child list; the mutators in
[`Element`](crate::Element) maintain both.

[`Node`] is a cheap handle: cloning it clones the reference, not the node.
Use [`Node::duplicate`] for a deep copy.
*/

use crate::attribute::Attr;
use crate::element::Element;
use crate::error::Result;
use crate::name::QName;
use crate::rc_cell::{RcRefCell, WeakRefCell};
use crate::syntax::is_whitespace;
use crate::write::{write_node, WriteSettings};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::io::Write;

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

///
/// A handle to any node in a tree: element, character data, comment,
/// processing instruction, or directive.
///
#[derive(Clone)]
pub struct Node {
    pub(crate) cell: RefNode,
}

// ------------------------------------------------------------------------------------------------
// Private (crate) Types
// ------------------------------------------------------------------------------------------------

pub(crate) type RefNode = RcRefCell<NodeData>;

pub(crate) type WeakRefNode = WeakRefCell<NodeData>;

///
/// Shared slots of every node plus the variant payload.
///
#[derive(Debug)]
pub(crate) struct NodeData {
    pub(crate) parent: Option<WeakRefNode>,
    pub(crate) index: usize,
    pub(crate) kind: NodeKind,
}

#[derive(Debug)]
pub(crate) enum NodeKind {
    Element(ElementData),
    CharData(CharDataData),
    Comment(String),
    ProcInst(ProcInstData),
    Directive(String),
}

#[derive(Debug)]
pub(crate) struct ElementData {
    pub(crate) name: QName,
    pub(crate) attrs: Vec<Attr>,
    pub(crate) children: Vec<RefNode>,
}

#[derive(Debug)]
pub(crate) struct CharDataData {
    pub(crate) data: String,
    pub(crate) cdata: bool,
    pub(crate) whitespace: bool,
}

#[derive(Debug)]
pub(crate) struct ProcInstData {
    pub(crate) target: String,
    pub(crate) inst: String,
}

// ------------------------------------------------------------------------------------------------
// Implementations
// ------------------------------------------------------------------------------------------------

impl Debug for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        self.cell.borrow().fmt(f)
    }
}

///
/// Identity comparison: two handles are equal when they name the same node.
///
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.cell.ptr_eq(&other.cell)
    }
}

impl Eq for Node {}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node { cell: element.cell }
    }
}

impl From<&Element> for Node {
    fn from(element: &Element) -> Self {
        Node {
            cell: element.cell.clone(),
        }
    }
}

// ------------------------------------------------------------------------------------------------

impl Node {
    ///
    /// A free-standing character-data node holding `data` verbatim.
    ///
    pub fn new_text<S>(data: S) -> Self
    where
        S: Into<String>,
    {
        Self::from_cell(new_char_data_cell(data.into(), false))
    }

    ///
    /// A free-standing CDATA-section node holding `data` verbatim.
    ///
    pub fn new_cdata<S>(data: S) -> Self
    where
        S: Into<String>,
    {
        Self::from_cell(new_char_data_cell(data.into(), true))
    }

    ///
    /// A free-standing comment node.
    ///
    pub fn new_comment<S>(text: S) -> Self
    where
        S: Into<String>,
    {
        Self::from_cell(RcRefCell::new(NodeData::new(NodeKind::Comment(
            text.into(),
        ))))
    }

    ///
    /// A free-standing processing-instruction node.
    ///
    pub fn new_proc_inst<S1, S2>(target: S1, inst: S2) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Self::from_cell(RcRefCell::new(NodeData::new(NodeKind::ProcInst(
            ProcInstData {
                target: target.into(),
                inst: inst.into(),
            },
        ))))
    }

    ///
    /// A free-standing directive node; `body` is everything between `<!` and
    /// `>`, e.g. `DOCTYPE html`.
    ///
    pub fn new_directive<S>(body: S) -> Self
    where
        S: Into<String>,
    {
        Self::from_cell(RcRefCell::new(NodeData::new(NodeKind::Directive(
            body.into(),
        ))))
    }

    pub(crate) fn from_cell(cell: RefNode) -> Self {
        Self { cell }
    }

    // --------------------------------------------------------------------------------------------

    pub fn is_element(&self) -> bool {
        matches!(self.cell.borrow().kind, NodeKind::Element(_))
    }

    pub fn is_char_data(&self) -> bool {
        matches!(self.cell.borrow().kind, NodeKind::CharData(_))
    }

    ///
    /// `true` for a character-data node parsed from, or created as, a CDATA
    /// section.
    ///
    pub fn is_cdata(&self) -> bool {
        matches!(
            &self.cell.borrow().kind,
            NodeKind::CharData(cd) if cd.cdata
        )
    }

    ///
    /// `true` for a character-data node whose every byte is space, tab, CR,
    /// or LF. `false` for any other node kind.
    ///
    pub fn is_whitespace(&self) -> bool {
        matches!(
            &self.cell.borrow().kind,
            NodeKind::CharData(cd) if cd.whitespace
        )
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.cell.borrow().kind, NodeKind::Comment(_))
    }

    pub fn is_proc_inst(&self) -> bool {
        matches!(self.cell.borrow().kind, NodeKind::ProcInst(_))
    }

    pub fn is_directive(&self) -> bool {
        matches!(self.cell.borrow().kind, NodeKind::Directive(_))
    }

    // --------------------------------------------------------------------------------------------

    ///
    /// This node as an element handle, if it is one.
    ///
    pub fn as_element(&self) -> Option<Element> {
        if self.is_element() {
            Some(Element {
                cell: self.cell.clone(),
            })
        } else {
            None
        }
    }

    ///
    /// The character data held by this node, if it is a text or CDATA node.
    ///
    pub fn char_data(&self) -> Option<String> {
        match &self.cell.borrow().kind {
            NodeKind::CharData(cd) => Some(cd.data.clone()),
            _ => None,
        }
    }

    ///
    /// The comment text, if this is a comment node.
    ///
    pub fn comment(&self) -> Option<String> {
        match &self.cell.borrow().kind {
            NodeKind::Comment(text) => Some(text.clone()),
            _ => None,
        }
    }

    ///
    /// The `(target, instruction)` pair, if this is a processing
    /// instruction.
    ///
    pub fn proc_inst(&self) -> Option<(String, String)> {
        match &self.cell.borrow().kind {
            NodeKind::ProcInst(pi) => Some((pi.target.clone(), pi.inst.clone())),
            _ => None,
        }
    }

    ///
    /// The directive body, if this is a directive node.
    ///
    pub fn directive(&self) -> Option<String> {
        match &self.cell.borrow().kind {
            NodeKind::Directive(body) => Some(body.clone()),
            _ => None,
        }
    }

    // --------------------------------------------------------------------------------------------

    ///
    /// The parent element, or `None` for a detached node or a document's
    /// synthetic root.
    ///
    pub fn parent(&self) -> Option<Element> {
        let weak = self.cell.borrow().parent.clone()?;
        let cell = weak.upgrade()?;
        Some(Element { cell })
    }

    ///
    /// This node's position among its parent's children; `0` for a detached
    /// node.
    ///
    pub fn index(&self) -> usize {
        self.cell.borrow().index
    }

    ///
    /// The nearest following sibling that is an element; non-element
    /// siblings are skipped.
    ///
    pub fn next_sibling(&self) -> Option<Element> {
        self.element_sibling(true)
    }

    ///
    /// The nearest preceding sibling that is an element; non-element
    /// siblings are skipped.
    ///
    pub fn prev_sibling(&self) -> Option<Element> {
        self.element_sibling(false)
    }

    fn element_sibling(&self, forward: bool) -> Option<Element> {
        let parent = self.parent()?;
        let index = self.index();
        let data = parent.cell.borrow();
        let children = match &data.kind {
            NodeKind::Element(ed) => &ed.children,
            _ => return None,
        };
        let pick = |cell: &&RefNode| matches!(cell.borrow().kind, NodeKind::Element(_));
        let found = if forward {
            children.iter().skip(index + 1).find(pick)
        } else {
            children.iter().take(index).rev().find(pick)
        };
        found.map(|cell| Element { cell: cell.clone() })
    }

    // --------------------------------------------------------------------------------------------

    ///
    /// Serialize this node (and, for an element, its subtree) to `sink`
    /// using the given settings.
    ///
    pub fn write_to<W>(&self, sink: &mut W, settings: &WriteSettings) -> Result<()>
    where
        W: Write,
    {
        write_node(sink, &self.cell, settings)
    }

    ///
    /// A deep copy: fresh cells throughout, parent links rebuilt, indices
    /// recomputed, attribute owners re-pointed. The copy is detached.
    ///
    pub fn duplicate(&self) -> Node {
        Node {
            cell: duplicate_cell(&self.cell),
        }
    }

    ///
    /// Remove this node from its parent's child list, if it has one, and
    /// reindex the siblings that followed it. The node keeps its subtree.
    ///
    pub(crate) fn detach(&self) {
        let parent = self.parent();
        if let Some(parent) = parent {
            let removed_at = {
                let mut data = parent.cell.borrow_mut();
                let children = match &mut data.kind {
                    NodeKind::Element(ed) => &mut ed.children,
                    _ => unreachable!("parent back-reference names a non-element"),
                };
                match children.iter().position(|c| c.ptr_eq(&self.cell)) {
                    Some(at) => {
                        let _ = children.remove(at);
                        Some(at)
                    }
                    None => None,
                }
            };
            if let Some(at) = removed_at {
                parent.reindex_children_from(at);
            }
        }
        let mut data = self.cell.borrow_mut();
        data.parent = None;
        data.index = 0;
    }
}

// ------------------------------------------------------------------------------------------------

impl NodeData {
    pub(crate) fn new(kind: NodeKind) -> Self {
        Self {
            parent: None,
            index: 0,
            kind,
        }
    }
}

// ------------------------------------------------------------------------------------------------

impl CharDataData {
    pub(crate) fn new(data: String, cdata: bool) -> Self {
        let whitespace = is_whitespace(&data);
        Self {
            data,
            cdata,
            whitespace,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// Private (crate) Functions
// ------------------------------------------------------------------------------------------------

pub(crate) fn new_char_data_cell(data: String, cdata: bool) -> RefNode {
    RcRefCell::new(NodeData::new(NodeKind::CharData(CharDataData::new(
        data, cdata,
    ))))
}

///
/// Recursive deep copy of a cell; the result has no parent and index `0`.
///
pub(crate) fn duplicate_cell(cell: &RefNode) -> RefNode {
    let source = cell.borrow();
    match &source.kind {
        NodeKind::Element(ed) => {
            let copy = RcRefCell::new(NodeData::new(NodeKind::Element(ElementData {
                name: ed.name.clone(),
                attrs: Vec::with_capacity(ed.attrs.len()),
                children: Vec::with_capacity(ed.children.len()),
            })));
            let mut data = copy.borrow_mut();
            let copied = match &mut data.kind {
                NodeKind::Element(new_ed) => new_ed,
                _ => unreachable!("freshly built element cell"),
            };
            for attr in &ed.attrs {
                copied.attrs.push(Attr {
                    name: attr.name.clone(),
                    value: attr.value.clone(),
                    owner: Some(copy.downgrade()),
                });
            }
            for (index, child) in ed.children.iter().enumerate() {
                let child_copy = duplicate_cell(child);
                {
                    let mut child_data = child_copy.borrow_mut();
                    child_data.parent = Some(copy.downgrade());
                    child_data.index = index;
                }
                copied.children.push(child_copy);
            }
            drop(data);
            copy
        }
        NodeKind::CharData(cd) => RcRefCell::new(NodeData::new(NodeKind::CharData(CharDataData {
            data: cd.data.clone(),
            cdata: cd.cdata,
            whitespace: cd.whitespace,
        }))),
        NodeKind::Comment(text) => {
            RcRefCell::new(NodeData::new(NodeKind::Comment(text.clone())))
        }
        NodeKind::ProcInst(pi) => {
            RcRefCell::new(NodeData::new(NodeKind::ProcInst(ProcInstData {
                target: pi.target.clone(),
                inst: pi.inst.clone(),
            })))
        }
        NodeKind::Directive(body) => {
            RcRefCell::new(NodeData::new(NodeKind::Directive(body.clone())))
        }
    }
}

// ------------------------------------------------------------------------------------------------
// Unit Tests
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_predicates() {
        let text = Node::new_text("hello");
        assert!(text.is_char_data());
        assert!(!text.is_cdata());
        assert!(!text.is_element());
        assert_eq!(text.char_data(), Some("hello".to_string()));

        let cdata = Node::new_cdata("raw");
        assert!(cdata.is_char_data());
        assert!(cdata.is_cdata());

        let ws = Node::new_text(" \t\n");
        assert!(ws.is_whitespace());
        assert!(!text.is_whitespace());

        let pi = Node::new_proc_inst("xml-stylesheet", "href=\"a.xsl\"");
        assert_eq!(
            pi.proc_inst(),
            Some(("xml-stylesheet".to_string(), "href=\"a.xsl\"".to_string()))
        );
    }

    #[test]
    fn test_detached_node_has_no_context() {
        let comment = Node::new_comment("note");
        assert!(comment.parent().is_none());
        assert_eq!(comment.index(), 0);
        assert!(comment.next_sibling().is_none());
        assert!(comment.prev_sibling().is_none());
    }

    #[test]
    fn test_duplicate_is_identity_distinct() {
        let text = Node::new_text("hello");
        let copy = text.duplicate();
        assert_ne!(text, copy);
        assert_eq!(copy.char_data(), Some("hello".to_string()));
    }
}
