//! Arena-backed XML element tree
//!
//! Every element lives in one `Vec` owned by the [`XmlDocument`] and is
//! addressed by a [`NodeId`]. Removing an element only unlinks it, so an id
//! never dangles and never gets reused while the document is alive.
//!
//! The model is element-only: an element may carry text, but text is not a
//! node of its own. This fits SpreadsheetML, where mixed content does not
//! occur in the parts this crate edits.

mod reader;
mod writer;

use std::fmt;

/// Handle to an element in an [`XmlDocument`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Default)]
struct Node {
    name: String,
    attributes: Vec<(String, String)>,
    text: Option<String>,
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
    prev_sibling: Option<NodeId>,
    next_sibling: Option<NodeId>,
}

/// An XML document as an arena of elements
#[derive(Debug, Clone)]
pub struct XmlDocument {
    nodes: Vec<Node>,
    root: NodeId,
}

impl XmlDocument {
    /// Create a document with a single root element
    pub fn new(root_name: &str) -> Self {
        Self {
            nodes: vec![Node {
                name: root_name.to_string(),
                ..Node::default()
            }],
            root: NodeId(0),
        }
    }

    /// Root element
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of elements ever allocated, detached ones included
    pub fn capacity_used(&self) -> usize {
        self.nodes.len()
    }

    /// Whether `id` was allocated by this document
    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    #[inline]
    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// Qualified element name (e.g. "c" or "x14ac:dyDescent")
    pub fn name(&self, id: NodeId) -> &str {
        &self.node(id).name
    }

    /// Attribute value by qualified name
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.node(id)
            .attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// All attributes in document order
    pub fn attributes(&self, id: NodeId) -> impl Iterator<Item = (&str, &str)> {
        self.node(id)
            .attributes
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Set an attribute, appending it if absent
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        let attributes = &mut self.node_mut(id).attributes;
        match attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => {
                existing.clear();
                existing.push_str(value);
            }
            None => attributes.push((name.to_string(), value.to_string())),
        }
    }

    /// Set an attribute, inserting it first if absent
    pub fn prepend_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        if self.attribute(id, name).is_some() {
            self.set_attribute(id, name, value);
        } else {
            self.node_mut(id)
                .attributes
                .insert(0, (name.to_string(), value.to_string()));
        }
    }

    /// Remove an attribute; returns whether it existed
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> bool {
        let attributes = &mut self.node_mut(id).attributes;
        let before = attributes.len();
        attributes.retain(|(key, _)| key != name);
        attributes.len() != before
    }

    /// Text content of an element
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.node(id).text.as_deref()
    }

    /// Replace the text content of an element
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        let node = self.node_mut(id);
        match &mut node.text {
            Some(existing) => {
                existing.clear();
                existing.push_str(text);
            }
            None => node.text = Some(text.to_string()),
        }
    }

    /// Remove the text content of an element
    pub fn clear_text(&mut self, id: NodeId) {
        self.node_mut(id).text = None;
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).first_child
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).last_child
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).next_sibling
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).prev_sibling
    }

    /// First child element with the given name
    pub fn child(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.children(id).find(|&child| self.name(child) == name)
    }

    /// First child element whose attribute `key` equals `value`
    pub fn child_by_attribute(
        &self,
        id: NodeId,
        name: &str,
        key: &str,
        value: &str,
    ) -> Option<NodeId> {
        self.children(id)
            .find(|&child| self.name(child) == name && self.attribute(child, key) == Some(value))
    }

    /// Direct children in order
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            doc: self,
            next: self.first_child(id),
        }
    }

    /// Direct children with the given name
    pub fn children_named<'a>(
        &'a self,
        id: NodeId,
        name: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.children(id).filter(move |&child| self.name(child) == name)
    }

    /// All elements below `id` in document order (pre-order), `id` excluded
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            top: id,
            next: self.first_child(id),
        }
    }

    fn alloc(&mut self, name: &str) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            name: name.to_string(),
            ..Node::default()
        });
        id
    }

    /// Create an element as the last child of `parent`
    pub fn append_child(&mut self, parent: NodeId, name: &str) -> NodeId {
        let id = self.alloc(name);
        self.link_last(parent, id);
        id
    }

    /// Create an element as the first child of `parent`
    pub fn prepend_child(&mut self, parent: NodeId, name: &str) -> NodeId {
        match self.first_child(parent) {
            Some(first) => self.insert_before(first, name),
            None => self.append_child(parent, name),
        }
    }

    /// Create an element as the previous sibling of `reference`
    pub fn insert_before(&mut self, reference: NodeId, name: &str) -> NodeId {
        let id = self.alloc(name);
        let parent = self.parent(reference);
        let prev = self.prev_sibling(reference);
        {
            let node = self.node_mut(id);
            node.parent = parent;
            node.prev_sibling = prev;
            node.next_sibling = Some(reference);
        }
        self.node_mut(reference).prev_sibling = Some(id);
        match prev {
            Some(prev) => self.node_mut(prev).next_sibling = Some(id),
            None => {
                if let Some(parent) = parent {
                    self.node_mut(parent).first_child = Some(id);
                }
            }
        }
        id
    }

    /// Create an element as the next sibling of `reference`
    pub fn insert_after(&mut self, reference: NodeId, name: &str) -> NodeId {
        let id = self.alloc(name);
        let parent = self.parent(reference);
        let next = self.next_sibling(reference);
        {
            let node = self.node_mut(id);
            node.parent = parent;
            node.prev_sibling = Some(reference);
            node.next_sibling = next;
        }
        self.node_mut(reference).next_sibling = Some(id);
        match next {
            Some(next) => self.node_mut(next).prev_sibling = Some(id),
            None => {
                if let Some(parent) = parent {
                    self.node_mut(parent).last_child = Some(id);
                }
            }
        }
        id
    }

    fn link_last(&mut self, parent: NodeId, id: NodeId) {
        let last = self.last_child(parent);
        {
            let node = self.node_mut(id);
            node.parent = Some(parent);
            node.prev_sibling = last;
            node.next_sibling = None;
        }
        match last {
            Some(last) => self.node_mut(last).next_sibling = Some(id),
            None => self.node_mut(parent).first_child = Some(id),
        }
        self.node_mut(parent).last_child = Some(id);
    }

    /// Unlink an element (and its subtree) from the tree
    ///
    /// The root cannot be detached; the call is ignored for it.
    pub fn detach(&mut self, id: NodeId) {
        if id == self.root {
            return;
        }
        let parent = self.parent(id);
        let prev_sibling = self.prev_sibling(id);
        let next_sibling = self.next_sibling(id);

        match prev_sibling {
            Some(prev) => self.node_mut(prev).next_sibling = next_sibling,
            None => {
                if let Some(parent) = parent {
                    self.node_mut(parent).first_child = next_sibling;
                }
            }
        }
        match next_sibling {
            Some(next) => self.node_mut(next).prev_sibling = prev_sibling,
            None => {
                if let Some(parent) = parent {
                    self.node_mut(parent).last_child = prev_sibling;
                }
            }
        }

        let node = self.node_mut(id);
        node.parent = None;
        node.prev_sibling = None;
        node.next_sibling = None;
    }

    /// Detach the first child named `name`; returns whether one existed
    pub fn remove_child(&mut self, parent: NodeId, name: &str) -> bool {
        match self.child(parent, name) {
            Some(child) => {
                self.detach(child);
                true
            }
            None => false,
        }
    }

    /// Detach every child of `id`
    pub fn clear_children(&mut self, id: NodeId) {
        while let Some(child) = self.first_child(id) {
            self.detach(child);
        }
    }

    /// Copy the subtree at `source` in `other` as the last child of `parent`
    pub fn append_copy(&mut self, parent: NodeId, other: &XmlDocument, source: NodeId) -> NodeId {
        let id = self.append_child(parent, other.name(source));
        {
            let src = other.node(source);
            let node = self.node_mut(id);
            node.attributes = src.attributes.clone();
            node.text = src.text.clone();
        }
        let children: Vec<NodeId> = other.children(source).collect();
        for child in children {
            self.append_copy(id, other, child);
        }
        id
    }
}

/// Iterator over direct children
pub struct Children<'a> {
    doc: &'a XmlDocument,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.next_sibling(current);
        Some(current)
    }
}

/// Pre-order iterator over a subtree
pub struct Descendants<'a> {
    doc: &'a XmlDocument,
    top: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;

        self.next = match self.doc.first_child(current) {
            Some(child) => Some(child),
            None => {
                let mut node = current;
                loop {
                    if node == self.top {
                        break None;
                    }
                    if let Some(sibling) = self.doc.next_sibling(node) {
                        break Some(sibling);
                    }
                    match self.doc.parent(node) {
                        Some(parent) if parent != self.top => node = parent,
                        _ => break None,
                    }
                }
            }
        };

        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(doc: &XmlDocument, ids: impl Iterator<Item = NodeId>) -> Vec<String> {
        ids.map(|id| doc.name(id).to_string()).collect()
    }

    #[test]
    fn test_sibling_insertion_keeps_order() {
        let mut doc = XmlDocument::new("root");
        let root = doc.root();
        let b = doc.append_child(root, "b");
        doc.insert_before(b, "a");
        let d = doc.append_child(root, "d");
        doc.insert_after(b, "c");
        doc.insert_after(d, "e");
        doc.prepend_child(root, "start");

        assert_eq!(names(&doc, doc.children(root)), ["start", "a", "b", "c", "d", "e"]);
        assert_eq!(doc.first_child(root).map(|n| doc.name(n)), Some("start"));
        assert_eq!(doc.last_child(root).map(|n| doc.name(n)), Some("e"));
    }

    #[test]
    fn test_detach_relinks_neighbours() {
        let mut doc = XmlDocument::new("root");
        let root = doc.root();
        let a = doc.append_child(root, "a");
        let b = doc.append_child(root, "b");
        let c = doc.append_child(root, "c");

        doc.detach(b);
        assert_eq!(doc.next_sibling(a), Some(c));
        assert_eq!(doc.prev_sibling(c), Some(a));
        assert_eq!(doc.parent(b), None);

        doc.detach(a);
        doc.detach(c);
        assert_eq!(doc.first_child(root), None);
        assert_eq!(doc.last_child(root), None);

        doc.detach(root);
        assert_eq!(doc.name(doc.root()), "root");
    }

    #[test]
    fn test_attributes() {
        let mut doc = XmlDocument::new("c");
        let c = doc.root();
        doc.set_attribute(c, "r", "A1");
        doc.set_attribute(c, "t", "s");
        doc.set_attribute(c, "t", "b");
        doc.prepend_attribute(c, "s", "1");

        assert_eq!(doc.attribute(c, "t"), Some("b"));
        assert_eq!(
            doc.attributes(c).collect::<Vec<_>>(),
            [("s", "1"), ("r", "A1"), ("t", "b")]
        );
        assert!(doc.remove_attribute(c, "t"));
        assert!(!doc.remove_attribute(c, "t"));
        assert_eq!(doc.attribute(c, "t"), None);
    }

    #[test]
    fn test_descendants_document_order() {
        let mut doc = XmlDocument::new("root");
        let root = doc.root();
        let a = doc.append_child(root, "a");
        doc.append_child(a, "a1");
        let a2 = doc.append_child(a, "a2");
        doc.append_child(a2, "a2x");
        doc.append_child(root, "b");

        assert_eq!(names(&doc, doc.descendants(root)), ["a", "a1", "a2", "a2x", "b"]);
        assert_eq!(names(&doc, doc.descendants(a)), ["a1", "a2", "a2x"]);
    }

    #[test]
    fn test_append_copy() {
        let mut source = XmlDocument::new("row");
        let row = source.root();
        source.set_attribute(row, "r", "1");
        let c = source.append_child(row, "c");
        let v = source.append_child(c, "v");
        source.set_text(v, "42");

        let mut doc = XmlDocument::new("sheetData");
        let root = doc.root();
        let copy = doc.append_copy(root, &source, row);
        assert_eq!(doc.attribute(copy, "r"), Some("1"));
        let v = doc.descendants(copy).find(|&n| doc.name(n) == "v").unwrap();
        assert_eq!(doc.text(v), Some("42"));
    }
}
