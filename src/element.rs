/*!
The element handle and its mutation, selection, and navigation surface.

All mutators preserve the tree invariants: every child's cached index equals
its physical offset, every child's parent reference names the element that
holds it, and an element is attached to at most one parent at a time
(attaching detaches first). Removal detaches and hands the subtree back to
the caller.
*/

use crate::attribute::Attr;
use crate::error::Result;
use crate::name::QName;
use crate::node::{new_char_data_cell, Node, NodeData, NodeKind, RefNode};
use crate::path::{engine, Path};
use crate::rc_cell::RcRefCell;
use crate::syntax::XMLNS_ATTRIBUTE;
use crate::write::WriteSettings;
use std::cell::{Ref, RefMut};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::io::Write;

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

///
/// A handle to an element node. Cloning the handle shares the element;
/// [`Element::duplicate`] performs a deep copy.
///
#[derive(Clone)]
pub struct Element {
    pub(crate) cell: RefNode,
}

// ------------------------------------------------------------------------------------------------
// Implementations
// ------------------------------------------------------------------------------------------------

impl Debug for Element {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        self.cell.borrow().fmt(f)
    }
}

///
/// Identity comparison: two handles are equal when they name the same
/// element.
///
impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.cell.ptr_eq(&other.cell)
    }
}

impl Eq for Element {}

// ------------------------------------------------------------------------------------------------

impl Element {
    ///
    /// A free-standing element; `tag` may be `local` or `prefix:local`.
    ///
    pub fn new(tag: &str) -> Self {
        Self {
            cell: RcRefCell::new(NodeData::new(NodeKind::Element(
                crate::node::ElementData {
                    name: QName::from(tag),
                    attrs: Vec::new(),
                    children: Vec::new(),
                },
            ))),
        }
    }

    ///
    /// The unnamed container element a document uses to hold its prolog and
    /// root.
    ///
    pub(crate) fn new_container() -> Self {
        Self::new("")
    }

    pub(crate) fn edata(&self) -> Ref<'_, crate::node::ElementData> {
        Ref::map(self.cell.borrow(), |data| match &data.kind {
            NodeKind::Element(ed) => ed,
            _ => unreachable!("element handle holds a non-element cell"),
        })
    }

    pub(crate) fn edata_mut(&self) -> RefMut<'_, crate::node::ElementData> {
        RefMut::map(self.cell.borrow_mut(), |data| match &mut data.kind {
            NodeKind::Element(ed) => ed,
            _ => unreachable!("element handle holds a non-element cell"),
        })
    }

    // --------------------------------------------------------------------------------------------
    // Naming
    // --------------------------------------------------------------------------------------------

    pub fn name(&self) -> QName {
        self.edata().name.clone()
    }

    ///
    /// The full `prefix:local` tag; empty for a document's synthetic root.
    ///
    pub fn tag(&self) -> String {
        self.edata().name.full()
    }

    pub fn set_tag(&self, tag: &str) {
        self.edata_mut().name = QName::from(tag);
    }

    ///
    /// The namespace URI in scope for this element's prefix, resolved by
    /// walking toward the root collecting `xmlns` / `xmlns:p` attributes.
    /// Empty when nothing is in scope.
    ///
    pub fn namespace_uri(&self) -> String {
        match self.name().prefix() {
            Some(prefix) => self.lookup_namespace(&format!("{}:{}", XMLNS_ATTRIBUTE, prefix)),
            None => self.lookup_namespace(XMLNS_ATTRIBUTE),
        }
    }

    pub(crate) fn lookup_namespace(&self, declaration: &str) -> String {
        let mut current = Some(self.clone());
        while let Some(element) = current {
            let found = {
                let data = element.edata();
                data.attrs
                    .iter()
                    .find(|a| a.key() == declaration)
                    .map(|a| a.value.clone())
            };
            if let Some(uri) = found {
                return uri;
            }
            current = element.as_node().parent();
        }
        String::new()
    }

    // --------------------------------------------------------------------------------------------
    // Node view
    // --------------------------------------------------------------------------------------------

    pub fn as_node(&self) -> Node {
        Node::from(self)
    }

    pub fn parent(&self) -> Option<Element> {
        self.as_node().parent()
    }

    pub fn index(&self) -> usize {
        self.as_node().index()
    }

    pub fn next_sibling(&self) -> Option<Element> {
        self.as_node().next_sibling()
    }

    pub fn prev_sibling(&self) -> Option<Element> {
        self.as_node().prev_sibling()
    }

    ///
    /// Serialize this element and its subtree to `sink`.
    ///
    pub fn write_to<W>(&self, sink: &mut W, settings: &WriteSettings) -> Result<()>
    where
        W: Write,
    {
        self.as_node().write_to(sink, settings)
    }

    ///
    /// A detached deep copy of this element and its subtree.
    ///
    pub fn duplicate(&self) -> Element {
        Element {
            cell: crate::node::duplicate_cell(&self.cell),
        }
    }

    // --------------------------------------------------------------------------------------------
    // Attributes
    // --------------------------------------------------------------------------------------------

    ///
    /// A snapshot of this element's attributes in source order.
    ///
    pub fn attrs(&self) -> Vec<Attr> {
        self.edata().attrs.to_vec()
    }

    ///
    /// Create or update an attribute. An existing attribute with the same
    /// exact key keeps its position and has its value replaced; otherwise
    /// the new attribute is appended. Returns a record of the result.
    ///
    pub fn create_attr<S>(&self, key: &str, value: S) -> Attr
    where
        S: Into<String>,
    {
        let name = QName::from(key);
        let value = value.into();
        let mut data = self.edata_mut();
        if let Some(existing) = data.attrs.iter_mut().find(|a| a.name == name) {
            existing.value = value;
            existing.clone()
        } else {
            let attr = Attr {
                name,
                value,
                owner: Some(self.cell.downgrade()),
            };
            data.attrs.push(attr.clone());
            attr
        }
    }

    ///
    /// Append an attribute without the replace-on-duplicate rule; used by
    /// the parser when duplicate preservation is requested.
    ///
    pub(crate) fn push_attr(&self, key: &str, value: String) {
        let attr = Attr {
            name: QName::from(key),
            value,
            owner: Some(self.cell.downgrade()),
        };
        self.edata_mut().attrs.push(attr);
    }

    ///
    /// The first attribute matching `key`. A bare local name matches any
    /// prefix; `prefix:local` must match exactly.
    ///
    pub fn select_attr(&self, key: &str) -> Option<Attr> {
        let requested = QName::from(key);
        self.edata()
            .attrs
            .iter()
            .find(|a| a.name.matches(&requested))
            .cloned()
    }

    ///
    /// The value of the first attribute matching `key`, or `default`.
    ///
    pub fn select_attr_value(&self, key: &str, default: &str) -> String {
        match self.select_attr(key) {
            Some(attr) => attr.value,
            None => default.to_string(),
        }
    }

    ///
    /// Remove the first attribute matching `key` and return it with its
    /// owner cleared.
    ///
    pub fn remove_attr(&self, key: &str) -> Option<Attr> {
        let requested = QName::from(key);
        let mut data = self.edata_mut();
        let at = data.attrs.iter().position(|a| a.name.matches(&requested))?;
        let mut attr = data.attrs.remove(at);
        attr.owner = None;
        Some(attr)
    }

    ///
    /// Stable sort of the attributes: unprefixed before prefixed, then by
    /// prefix, then by local name, in Unicode code-point order.
    ///
    pub fn sort_attrs(&self) {
        self.edata_mut().attrs.sort_by_cached_key(Attr::sort_key);
    }

    // --------------------------------------------------------------------------------------------
    // Children
    // --------------------------------------------------------------------------------------------

    ///
    /// A snapshot of all child nodes in document order.
    ///
    pub fn children(&self) -> Vec<Node> {
        self.edata()
            .children
            .iter()
            .map(|cell| Node::from_cell(cell.clone()))
            .collect()
    }

    pub fn child_count(&self) -> usize {
        self.edata().children.len()
    }

    ///
    /// The element children only, in document order.
    ///
    pub fn child_elements(&self) -> Vec<Element> {
        self.edata()
            .children
            .iter()
            .filter(|cell| matches!(cell.borrow().kind, NodeKind::Element(_)))
            .map(|cell| Element { cell: cell.clone() })
            .collect()
    }

    ///
    /// Append a new child element and return it.
    ///
    pub fn create_element(&self, tag: &str) -> Element {
        let child = Element::new(tag);
        self.append_cell(child.cell.clone());
        child
    }

    ///
    /// Append a new character-data child and return it.
    ///
    pub fn create_text<S>(&self, data: S) -> Node
    where
        S: Into<String>,
    {
        let node = Node::from_cell(new_char_data_cell(data.into(), false));
        self.append_cell(node.cell.clone());
        node
    }

    ///
    /// Append a new CDATA-section child and return it.
    ///
    pub fn create_cdata<S>(&self, data: S) -> Node
    where
        S: Into<String>,
    {
        let node = Node::from_cell(new_char_data_cell(data.into(), true));
        self.append_cell(node.cell.clone());
        node
    }

    ///
    /// Append a new comment child and return it.
    ///
    pub fn create_comment<S>(&self, text: S) -> Node
    where
        S: Into<String>,
    {
        let node = Node::new_comment(text);
        self.append_cell(node.cell.clone());
        node
    }

    ///
    /// Append a new processing-instruction child and return it.
    ///
    pub fn create_proc_inst<S1, S2>(&self, target: S1, inst: S2) -> Node
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        let node = Node::new_proc_inst(target, inst);
        self.append_cell(node.cell.clone());
        node
    }

    ///
    /// Append a new directive child and return it.
    ///
    pub fn create_directive<S>(&self, body: S) -> Node
    where
        S: Into<String>,
    {
        let node = Node::new_directive(body);
        self.append_cell(node.cell.clone());
        node
    }

    ///
    /// Detach `child` from any prior parent, then append it here.
    ///
    pub fn add_child<N>(&self, child: N)
    where
        N: Into<Node>,
    {
        let node = child.into();
        node.detach();
        self.append_cell(node.cell);
    }

    ///
    /// Detach `child` from any prior parent, then insert it at `position`
    /// (clamped to `[0, len]`), reindexing the tail. Moving a child forward
    /// within the same element accounts for its own removal.
    ///
    pub fn insert_child_at<N>(&self, position: usize, child: N)
    where
        N: Into<Node>,
    {
        let node = child.into();
        let mut position = position;
        if node.parent().map(|p| p == *self).unwrap_or(false) && node.index() < position {
            position -= 1;
        }
        node.detach();
        let len = self.edata().children.len();
        let at = position.min(len);
        {
            let mut data = node.cell.borrow_mut();
            data.parent = Some(self.cell.downgrade());
            data.index = at;
        }
        self.edata_mut().children.insert(at, node.cell);
        self.reindex_children_from(at + 1);
    }

    ///
    /// Detach and return the child at `position`, if any.
    ///
    pub fn remove_child_at(&self, position: usize) -> Option<Node> {
        let cell = self.edata().children.get(position).cloned()?;
        let node = Node::from_cell(cell);
        node.detach();
        Some(node)
    }

    ///
    /// Detach and return `child` if it is one of this element's children,
    /// located by identity.
    ///
    pub fn remove_child<N>(&self, child: N) -> Option<Node>
    where
        N: Into<Node>,
    {
        let node = child.into();
        if node.parent().map(|p| p == *self).unwrap_or(false) {
            node.detach();
            Some(node)
        } else {
            None
        }
    }

    ///
    /// Rewrite every child's cached index to its physical offset.
    ///
    pub fn reindex_children(&self) {
        self.reindex_children_from(0);
    }

    pub(crate) fn reindex_children_from(&self, start: usize) {
        let tail: Vec<RefNode> = self.edata().children.iter().skip(start).cloned().collect();
        for (offset, cell) in tail.iter().enumerate() {
            cell.borrow_mut().index = start + offset;
        }
    }

    fn append_cell(&self, cell: RefNode) {
        let index = self.edata().children.len();
        {
            let mut data = cell.borrow_mut();
            data.parent = Some(self.cell.downgrade());
            data.index = index;
        }
        self.edata_mut().children.push(cell);
    }

    // --------------------------------------------------------------------------------------------
    // Selection
    // --------------------------------------------------------------------------------------------

    ///
    /// The first child element whose tag matches; a bare local name matches
    /// any prefix, an explicit prefix must match exactly.
    ///
    pub fn select_element(&self, tag: &str) -> Option<Element> {
        let requested = QName::from(tag);
        self.child_elements()
            .into_iter()
            .find(|e| e.name().matches(&requested))
    }

    ///
    /// All child elements whose tag matches, in document order.
    ///
    pub fn select_elements(&self, tag: &str) -> Vec<Element> {
        let requested = QName::from(tag);
        self.child_elements()
            .into_iter()
            .filter(|e| e.name().matches(&requested))
            .collect()
    }

    ///
    /// The first element matching the path expression; `None` on no match
    /// and on a path that fails to compile.
    ///
    pub fn find_element(&self, path: &str) -> Option<Element> {
        match Path::compile(path) {
            Ok(compiled) => self.find_element_path(&compiled),
            Err(_) => None,
        }
    }

    ///
    /// All elements matching the path expression in document order, without
    /// duplicates; empty when the path fails to compile.
    ///
    pub fn find_elements(&self, path: &str) -> Vec<Element> {
        match Path::compile(path) {
            Ok(compiled) => self.find_elements_path(&compiled),
            Err(_) => Vec::new(),
        }
    }

    ///
    /// The first element matching a precompiled path.
    ///
    pub fn find_element_path(&self, path: &Path) -> Option<Element> {
        engine::evaluate(path, self).into_iter().next()
    }

    ///
    /// All elements matching a precompiled path, in document order, without
    /// duplicates.
    ///
    pub fn find_elements_path(&self, path: &Path) -> Vec<Element> {
        engine::evaluate(path, self)
    }

    // --------------------------------------------------------------------------------------------
    // Text runs
    // --------------------------------------------------------------------------------------------

    ///
    /// The leading character data of this element: the concatenation of
    /// CharData/CDATA children up to the first child element. Comments and
    /// processing instructions are skipped over.
    ///
    pub fn text(&self) -> String {
        let data = self.edata();
        let mut out = String::new();
        for child in &data.children {
            match &child.borrow().kind {
                NodeKind::CharData(cd) => out.push_str(&cd.data),
                NodeKind::Element(_) => break,
                _ => continue,
            }
        }
        out
    }

    ///
    /// Replace the leading run of consecutive character-data children with a
    /// single CharData node, or remove it when `text` is empty.
    ///
    pub fn set_text(&self, text: &str) {
        self.replace_leading_run(text, false);
    }

    ///
    /// Replace the leading run of consecutive character-data children with a
    /// single CDATA node, or remove it when `data` is empty.
    ///
    pub fn set_cdata(&self, data: &str) {
        self.replace_leading_run(data, true);
    }

    fn replace_leading_run(&self, text: &str, cdata: bool) {
        let run = self
            .edata()
            .children
            .iter()
            .take_while(|cell| matches!(cell.borrow().kind, NodeKind::CharData(_)))
            .count();
        for _ in 0..run {
            let _ = self.remove_child_at(0);
        }
        if !text.is_empty() {
            self.insert_child_at(0, Node::from_cell(new_char_data_cell(text.to_string(), cdata)));
        }
    }

    ///
    /// The character data immediately following this element among its
    /// siblings, up to the next element.
    ///
    pub fn tail(&self) -> String {
        let parent = match self.parent() {
            Some(parent) => parent,
            None => return String::new(),
        };
        let data = parent.edata();
        let mut out = String::new();
        for child in data.children.iter().skip(self.index() + 1) {
            match &child.borrow().kind {
                NodeKind::CharData(cd) => out.push_str(&cd.data),
                NodeKind::Element(_) => break,
                _ => continue,
            }
        }
        out
    }

    ///
    /// Replace the run of consecutive character-data siblings following this
    /// element with a single CharData node, or remove it when `text` is
    /// empty.
    ///
    pub fn set_tail(&self, text: &str) {
        let parent = match self.parent() {
            Some(parent) => parent,
            None => return,
        };
        let start = self.index() + 1;
        let run = parent
            .edata()
            .children
            .iter()
            .skip(start)
            .take_while(|cell| matches!(cell.borrow().kind, NodeKind::CharData(_)))
            .count();
        for _ in 0..run {
            let _ = parent.remove_child_at(start);
        }
        if !text.is_empty() {
            parent.insert_child_at(start, Node::new_text(text));
        }
    }

    // --------------------------------------------------------------------------------------------
    // Paths
    // --------------------------------------------------------------------------------------------

    ///
    /// The absolute path from the document root to this element, e.g.
    /// `/a/b/c`. The unnamed root yields `/`.
    ///
    pub fn get_path(&self) -> String {
        let mut parts = Vec::new();
        for element in self.ancestors_inclusive() {
            let tag = element.tag();
            if !tag.is_empty() {
                parts.push(tag);
            }
        }
        format!("/{}", parts.join("/"))
    }

    ///
    /// The shortest relative walk from `source` to this element, composed of
    /// `.` / `..` / `name` segments. `.` when both are the same element, the
    /// empty string when the two share no common ancestor.
    ///
    pub fn get_relative_path(&self, source: &Element) -> String {
        let to_chain = self.ancestors_inclusive();
        let from_chain = source.ancestors_inclusive();
        if to_chain.first() != from_chain.first() {
            return String::new();
        }
        let mut common = 0;
        while common < to_chain.len()
            && common < from_chain.len()
            && to_chain[common] == from_chain[common]
        {
            common += 1;
        }
        let ups = from_chain.len() - common;
        let mut parts: Vec<String> = Vec::new();
        if ups == 0 {
            parts.push(".".to_string());
        } else {
            parts.extend(std::iter::repeat("..".to_string()).take(ups));
        }
        parts.extend(to_chain[common..].iter().map(|e| e.tag()));
        parts.join("/")
    }

    ///
    /// Ancestor chain from the tree's topmost element down to this element,
    /// both inclusive.
    ///
    pub(crate) fn ancestors_inclusive(&self) -> Vec<Element> {
        let mut chain = vec![self.clone()];
        let mut current = self.parent();
        while let Some(element) = current {
            current = element.parent();
            chain.push(element);
        }
        chain.reverse();
        chain
    }

    ///
    /// The topmost element of the tree holding this element; for an element
    /// attached to a document that is the synthetic root.
    ///
    pub(crate) fn tree_root(&self) -> Element {
        let mut root = self.clone();
        while let Some(parent) = root.parent() {
            root = parent;
        }
        root
    }

    ///
    /// Pre-order walk of this element and every descendant element, in
    /// document order.
    ///
    pub(crate) fn descendants_or_self(&self) -> Vec<Element> {
        fn walk(element: &Element, out: &mut Vec<Element>) {
            out.push(element.clone());
            for child in element.child_elements() {
                walk(&child, out);
            }
        }
        let mut out = Vec::new();
        walk(self, &mut out);
        out
    }
}

// ------------------------------------------------------------------------------------------------
// Unit Tests
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn assert_indices(element: &Element) {
        for (i, child) in element.children().iter().enumerate() {
            assert_eq!(child.index(), i);
            assert_eq!(child.parent(), Some(element.clone()));
        }
    }

    #[test]
    fn test_create_and_index_children() {
        let root = Element::new("root");
        let a = root.create_element("a");
        let _text = root.create_text("between");
        let b = root.create_element("b");

        assert_eq!(root.child_count(), 3);
        assert_indices(&root);
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 2);
        assert_eq!(a.next_sibling(), Some(b.clone()));
        assert_eq!(b.prev_sibling(), Some(a.clone()));
    }

    #[test]
    fn test_add_child_reparents() {
        let first = Element::new("first");
        let second = Element::new("second");
        let child = first.create_element("child");

        second.add_child(&child);
        assert_eq!(first.child_count(), 0);
        assert_eq!(second.child_count(), 1);
        assert_eq!(child.parent(), Some(second.clone()));
        assert_indices(&second);
    }

    #[test]
    fn test_insert_and_remove_at() {
        let root = Element::new("root");
        let a = root.create_element("a");
        let c = root.create_element("c");
        let b = Element::new("b");

        root.insert_child_at(1, &b);
        assert_eq!(
            root.child_elements(),
            vec![a.clone(), b.clone(), c.clone()]
        );
        assert_indices(&root);

        // clamped past the end
        let d = Element::new("d");
        root.insert_child_at(99, &d);
        assert_eq!(d.index(), 3);

        let removed = root.remove_child_at(1).and_then(|n| n.as_element());
        assert_eq!(removed, Some(b.clone()));
        assert!(b.parent().is_none());
        assert_indices(&root);

        assert!(root.remove_child_at(99).is_none());
    }

    #[test]
    fn test_move_forward_within_same_parent() {
        let root = Element::new("root");
        let a = root.create_element("a");
        let b = root.create_element("b");
        let c = root.create_element("c");

        // move <a> after <b>
        root.insert_child_at(2, &a);
        assert_eq!(root.child_elements(), vec![b.clone(), a.clone(), c.clone()]);
        assert_indices(&root);
    }

    #[test]
    fn test_remove_child_by_identity() {
        let root = Element::new("root");
        let a = root.create_element("x");
        let b = root.create_element("x");

        // same tag, different identity
        let removed = root.remove_child(&b);
        assert_eq!(removed.and_then(|n| n.as_element()), Some(b.clone()));
        assert_eq!(root.child_elements(), vec![a.clone()]);

        let stranger = Element::new("x");
        assert!(root.remove_child(&stranger).is_none());
    }

    #[test]
    fn test_attr_create_replaces_in_place() {
        let element = Element::new("element");
        let _ = element.create_attr("x", "1");
        let _ = element.create_attr("y", "2");
        let _ = element.create_attr("x", "3");

        let attrs = element.attrs();
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0].key(), "x");
        assert_eq!(attrs[0].value(), "3");
        assert_eq!(attrs[1].key(), "y");
        assert_eq!(attrs[0].owner(), Some(element.clone()));
    }

    #[test]
    fn test_attr_select_and_remove() {
        let element = Element::new("element");
        let _ = element.create_attr("t:id", "a1");

        assert_eq!(element.select_attr_value("id", "-"), "a1");
        assert_eq!(element.select_attr_value("t:id", "-"), "a1");
        assert_eq!(element.select_attr_value("s:id", "-"), "-");

        let removed = element.remove_attr("id");
        assert!(removed.is_some());
        let removed = removed.unwrap_or_else(|| Attr::new("", ""));
        assert!(removed.owner().is_none());
        assert!(element.attrs().is_empty());
    }

    #[test]
    fn test_sort_attrs() {
        let element = Element::new("element");
        let _ = element.create_attr("b", "");
        let _ = element.create_attr("z:a", "");
        let _ = element.create_attr("a", "");
        let _ = element.create_attr("a:z", "");
        let _ = element.create_attr("a:a", "");

        element.sort_attrs();
        let keys: Vec<String> = element.attrs().iter().map(Attr::key).collect();
        assert_eq!(keys, vec!["a", "b", "a:a", "a:z", "z:a"]);
    }

    #[test]
    fn test_select_element_prefix_rule() {
        let root = Element::new("root");
        let _plain = root.create_element("title");
        let prefixed = root.create_element("t:title");

        assert_eq!(root.select_elements("title").len(), 2);
        assert_eq!(root.select_elements("t:title"), vec![prefixed.clone()]);
        assert!(root.select_element("s:title").is_none());
    }

    #[test]
    fn test_text_merge() {
        let root = Element::new("root");
        root.set_text("foo");
        root.set_text("bar");
        assert_eq!(root.text(), "bar");
        assert_eq!(root.child_count(), 1);

        let _ = root.create_cdata("cdata");
        assert_eq!(root.text(), "barcdata");

        root.set_text("qux");
        assert_eq!(root.text(), "qux");
        assert_eq!(root.child_count(), 1);
        assert!(!root.children()[0].is_cdata());

        root.set_text("");
        assert_eq!(root.child_count(), 0);
    }

    #[test]
    fn test_set_cdata() {
        let root = Element::new("root");
        root.set_text("plain");
        root.set_cdata("quoted");
        assert_eq!(root.child_count(), 1);
        assert!(root.children()[0].is_cdata());
        assert_eq!(root.text(), "quoted");
    }

    #[test]
    fn test_text_stops_at_first_element() {
        let root = Element::new("root");
        root.set_text("head");
        let _ = root.create_comment("skipped");
        let _ = root.create_text("more");
        let _ = root.create_element("break");
        let _ = root.create_text("after");
        assert_eq!(root.text(), "headmore");
    }

    #[test]
    fn test_tail() {
        let root = Element::new("root");
        let a = root.create_element("a");
        let _ = root.create_text("one");
        let _ = root.create_text("two");
        let _b = root.create_element("b");
        let _ = root.create_text("after-b");

        assert_eq!(a.tail(), "onetwo");

        a.set_tail("replaced");
        assert_eq!(a.tail(), "replaced");
        assert_eq!(root.child_count(), 4);

        a.set_tail("");
        assert_eq!(a.tail(), "");
        assert_eq!(root.child_count(), 3);
    }

    #[test]
    fn test_paths() {
        let a = Element::new("a");
        let b1 = a.create_element("b1");
        let c1 = b1.create_element("c1");
        let d1 = c1.create_element("d1");
        let _d1a = c1.create_element("d1a");
        let b2 = a.create_element("b2");
        let c2 = b2.create_element("c2");
        let d2 = c2.create_element("d2");

        assert_eq!(d2.get_path(), "/a/b2/c2/d2");
        assert_eq!(d2.get_relative_path(&d1), "../../../b2/c2/d2");
        assert_eq!(d1.get_relative_path(&d1), ".");
        assert_eq!(d2.get_relative_path(&a), "./b2/c2/d2");
        assert_eq!(a.get_relative_path(&d2), "../../..");

        let other = Element::new("other");
        assert_eq!(d2.get_relative_path(&other), "");
    }

    #[test]
    fn test_namespace_uri_resolution() {
        let root = Element::new("root");
        let _ = root.create_attr("xmlns", "urn:default");
        let _ = root.create_attr("xmlns:t", "urn:things");
        let child = root.create_element("child");
        let thing = child.create_element("t:thing");

        assert_eq!(child.namespace_uri(), "urn:default");
        assert_eq!(thing.namespace_uri(), "urn:things");

        let orphan = Element::new("s:thing");
        assert_eq!(orphan.namespace_uri(), "");
    }

    #[test]
    fn test_duplicate_shares_nothing() {
        let root = Element::new("root");
        let _ = root.create_attr("id", "r");
        let child = root.create_element("child");
        child.set_text("payload");

        let copy = root.duplicate();
        assert_ne!(copy, root);
        assert!(copy.parent().is_none());
        let copy_child = copy.select_element("child");
        assert!(copy_child.is_some());
        let copy_child = copy_child.unwrap_or_else(|| Element::new(""));
        assert_ne!(copy_child, child);
        assert_eq!(copy_child.text(), "payload");
        assert_eq!(copy.attrs()[0].owner(), Some(copy.clone()));

        // editing the copy leaves the original alone
        copy_child.set_text("changed");
        assert_eq!(child.text(), "payload");
    }
}
