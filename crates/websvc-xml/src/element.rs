//! The element tree.
//!
//! Elements live in an arena owned by [`ElementTree`] and are addressed by
//! [`ElementId`] handles. Each node stores the handle of its parent, so the
//! tree can be walked in both directions without reference cycles.
//!
//! Handles stay valid until the element is released with
//! [`ElementTree::remove`]; using a released handle panics.

use std::collections::BTreeMap;

/// Handle to an element inside an [`ElementTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

#[derive(Debug, Clone)]
struct ElementNode {
    name: String,
    namespace: Option<String>,
    qualified: String,
    attributes: BTreeMap<String, String>,
    namespaces: BTreeMap<String, String>,
    children: Vec<ElementId>,
    content: Option<String>,
    literal: Option<String>,
    parent: Option<ElementId>,
}

/// An arena of XML elements with an optional root.
///
/// Cloning the tree clones every node; handles taken from the original
/// address the same positions in the clone, which shares nothing with it.
#[derive(Debug, Clone, Default)]
pub struct ElementTree {
    nodes: Vec<Option<ElementNode>>,
    root: Option<ElementId>,
}

/// The local part of a qualified name.
#[must_use]
pub fn local_name(qualified: &str) -> &str {
    qualified.rsplit_once(':').map_or(qualified, |(_, local)| local)
}

/// The prefix of a qualified name, if any.
#[must_use]
pub fn name_prefix(qualified: &str) -> Option<&str> {
    qualified.split_once(':').map(|(prefix, _)| prefix)
}

impl ElementTree {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached element.
    ///
    /// `name` is the local name, `namespace` the namespace URI the name belongs
    /// to, and `qualified` the name as written in the document (`prefix:name`).
    pub fn create_element(
        &mut self,
        name: &str,
        namespace: Option<&str>,
        qualified: &str,
        attributes: &[(&str, &str)],
    ) -> ElementId {
        let id = ElementId(self.nodes.len());
        self.nodes.push(Some(ElementNode {
            name: name.to_owned(),
            namespace: namespace.map(str::to_owned),
            qualified: qualified.to_owned(),
            attributes: attributes
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
            namespaces: BTreeMap::new(),
            children: Vec::new(),
            content: None,
            literal: None,
            parent: None,
        }));
        id
    }

    /// Create a detached, unqualified element with no namespace.
    pub fn create(&mut self, name: &str) -> ElementId {
        self.create_element(name, None, name, &[])
    }

    /// The root element, if one has been set.
    #[must_use]
    pub fn root(&self) -> Option<ElementId> {
        self.root
    }

    /// Make `id` the root of the tree, detaching it from any parent.
    pub fn set_root(&mut self, id: ElementId) {
        self.detach(id);
        self.root = Some(id);
    }

    /// Number of live elements in the arena.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Returns `true` if the arena holds no live elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if `id` addresses a live element of this tree.
    #[must_use]
    pub fn contains(&self, id: ElementId) -> bool {
        matches!(self.nodes.get(id.0), Some(Some(_)))
    }

    fn node(&self, id: ElementId) -> &ElementNode {
        match self.nodes.get(id.0) {
            Some(Some(node)) => node,
            _ => panic!("element handle {id:?} is not live in this tree"),
        }
    }

    fn node_mut(&mut self, id: ElementId) -> &mut ElementNode {
        match self.nodes.get_mut(id.0) {
            Some(Some(node)) => node,
            _ => panic!("element handle {id:?} is not live in this tree"),
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Local name of the element.
    #[must_use]
    pub fn name(&self, id: ElementId) -> &str {
        &self.node(id).name
    }

    /// Namespace URI of the element.
    #[must_use]
    pub fn namespace(&self, id: ElementId) -> Option<&str> {
        self.node(id).namespace.as_deref()
    }

    /// Fully qualified name of the element.
    #[must_use]
    pub fn qualified(&self, id: ElementId) -> &str {
        &self.node(id).qualified
    }

    /// All attributes of the element.
    #[must_use]
    pub fn attributes(&self, id: ElementId) -> &BTreeMap<String, String> {
        &self.node(id).attributes
    }

    /// Value of one attribute.
    #[must_use]
    pub fn attribute(&self, id: ElementId, key: &str) -> Option<&str> {
        self.node(id).attributes.get(key).map(String::as_str)
    }

    /// Namespace declarations introduced by the element (prefix to URI; the
    /// empty prefix is the default namespace).
    #[must_use]
    pub fn namespaces(&self, id: ElementId) -> &BTreeMap<String, String> {
        &self.node(id).namespaces
    }

    /// Accumulated text content, if any was added.
    #[must_use]
    pub fn content(&self, id: ElementId) -> Option<&str> {
        self.node(id).content.as_deref()
    }

    /// Literal override text, if set.
    #[must_use]
    pub fn literal(&self, id: ElementId) -> Option<&str> {
        self.node(id).literal.as_deref()
    }

    /// Parent of the element; `None` for a root or detached element.
    #[must_use]
    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.node(id).parent
    }

    /// Iterate over the direct children of the element.
    pub fn children(&self, id: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        self.node(id).children.iter().copied()
    }

    /// Number of direct children.
    #[must_use]
    pub fn count_children(&self, id: ElementId) -> usize {
        self.node(id).children.len()
    }

    /// The child at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not a valid child position.
    #[must_use]
    pub fn child_at_index(&self, id: ElementId, index: usize) -> ElementId {
        let children = &self.node(id).children;
        match children.get(index) {
            Some(child) => *child,
            None => panic!(
                "child index {index} out of range for <{}> with {} children",
                self.node(id).qualified,
                children.len()
            ),
        }
    }

    /// The child at `index`, or `None` if out of range.
    #[must_use]
    pub fn get_child(&self, id: ElementId, index: usize) -> Option<ElementId> {
        self.node(id).children.get(index).copied()
    }

    /// First direct child, if any.
    #[must_use]
    pub fn first_child(&self, id: ElementId) -> Option<ElementId> {
        self.node(id).children.first().copied()
    }

    /// The next sibling of the element within its parent.
    #[must_use]
    pub fn sibling(&self, id: ElementId) -> Option<ElementId> {
        let parent = self.node(id).parent?;
        let index = self.index(id)?;
        self.node(parent).children.get(index + 1).copied()
    }

    /// Position of the element among its parent's children; `None` without a
    /// parent.
    #[must_use]
    pub fn index(&self, id: ElementId) -> Option<usize> {
        let parent = self.node(id).parent?;
        self.node(parent).children.iter().position(|c| *c == id)
    }

    /// First direct child with the given local name.
    #[must_use]
    pub fn find_child(&self, id: ElementId, name: &str) -> Option<ElementId> {
        self.children(id).find(|c| self.name(*c) == name)
    }

    /// Resolve a namespace prefix in the scope of `id`, walking up through its
    /// ancestors. The empty prefix resolves the default namespace.
    #[must_use]
    pub fn resolve_prefix(&self, id: ElementId, prefix: &str) -> Option<&str> {
        if prefix == "xml" {
            return Some(crate::XML_NAMESPACE);
        }
        let mut current = Some(id);
        while let Some(el) = current {
            let node = self.node(el);
            if let Some(uri) = node.namespaces.get(prefix) {
                return Some(uri);
            }
            current = node.parent;
        }
        None
    }

    // -----------------------------------------------------------------------
    // Mutators
    // -----------------------------------------------------------------------

    /// Append `child` to the children of `parent`.
    ///
    /// A child attached elsewhere is moved. A root child stops being the root.
    ///
    /// # Panics
    ///
    /// Panics if `child` is `parent` or one of its ancestors.
    pub fn add_child(&mut self, parent: ElementId, child: ElementId) {
        let mut ancestor = Some(parent);
        while let Some(a) = ancestor {
            assert!(a != child, "cannot add an element below itself");
            ancestor = self.node(a).parent;
        }
        self.detach(child);
        if self.root == Some(child) {
            self.root = None;
        }
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.push(child);
    }

    /// Append text to the content of the element.
    pub fn add_content(&mut self, id: ElementId, content: &str) {
        self.node_mut(id)
            .content
            .get_or_insert_with(String::new)
            .push_str(content);
    }

    /// Set an attribute, or remove it when `value` is `None`.
    pub fn set_attribute(&mut self, id: ElementId, key: &str, value: Option<&str>) {
        let attributes = &mut self.node_mut(id).attributes;
        match value {
            Some(v) => {
                attributes.insert(key.to_owned(), v.to_owned());
            }
            None => {
                attributes.remove(key);
            }
        }
    }

    /// Declare `prefix` as bound to `uri` on the element. The empty prefix sets
    /// the default namespace.
    pub fn set_namespace(&mut self, id: ElementId, prefix: &str, uri: &str) {
        self.node_mut(id)
            .namespaces
            .insert(prefix.to_owned(), uri.to_owned());
    }

    /// Set the literal text that represents the element when encoding.
    ///
    /// The text is emitted verbatim in place of the element, its attributes,
    /// content and children. Nothing checks that it is well-formed XML.
    pub fn set_literal_value(&mut self, id: ElementId, xml: &str) {
        self.node_mut(id).literal = Some(xml.to_owned());
    }

    /// Unlink the element from its parent, keeping the subtree alive so it can
    /// be attached again.
    pub fn detach(&mut self, id: ElementId) {
        if let Some(parent) = self.node_mut(id).parent.take() {
            self.node_mut(parent).children.retain(|c| *c != id);
        }
    }

    /// Remove the element from its parent and release its whole subtree.
    ///
    /// Handles into the subtree are no longer valid afterwards.
    pub fn remove(&mut self, id: ElementId) {
        self.detach(id);
        if self.root == Some(id) {
            self.root = None;
        }
        let mut pending = vec![id];
        while let Some(el) = pending.pop() {
            if let Some(node) = self.nodes.get_mut(el.0).and_then(Option::take) {
                pending.extend(node.children);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Copying
    // -----------------------------------------------------------------------

    /// Deep copy of the subtree at `id` into a new tree rooted at the copy.
    #[must_use]
    pub fn deep_copy(&self, id: ElementId) -> ElementTree {
        let mut tree = ElementTree::new();
        let root = tree.import(self, id);
        tree.root = Some(root);
        tree
    }

    /// Copy the subtree at `id` of `source` into this tree, returning the
    /// handle of the detached copy.
    pub fn import(&mut self, source: &ElementTree, id: ElementId) -> ElementId {
        let node = source.node(id);
        let copy = ElementId(self.nodes.len());
        self.nodes.push(Some(ElementNode {
            children: Vec::with_capacity(node.children.len()),
            parent: None,
            ..node.clone()
        }));
        for child in &node.children {
            let child_copy = self.import(source, *child);
            self.node_mut(child_copy).parent = Some(copy);
            self.node_mut(copy).children.push(child_copy);
        }
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (ElementTree, ElementId, ElementId, ElementId) {
        let mut tree = ElementTree::new();
        let root = tree.create("root");
        let a = tree.create("a");
        let b = tree.create("b");
        tree.set_root(root);
        tree.add_child(root, a);
        tree.add_child(root, b);
        (tree, root, a, b)
    }

    #[test]
    fn test_should_link_children_to_parent() {
        let (tree, root, a, b) = sample();
        assert_eq!(tree.parent(a), Some(root));
        assert_eq!(tree.count_children(root), 2);
        assert_eq!(tree.first_child(root), Some(a));
        assert_eq!(tree.sibling(a), Some(b));
        assert_eq!(tree.sibling(b), None);
        assert_eq!(tree.index(b), Some(1));
        assert_eq!(tree.index(root), None);
        assert_eq!(tree.child_at_index(root, 1), b);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_should_panic_on_out_of_range_child() {
        let (tree, root, _, _) = sample();
        let _ = tree.child_at_index(root, 2);
    }

    #[test]
    fn test_should_append_content() {
        let (mut tree, _, a, _) = sample();
        assert_eq!(tree.content(a), None);
        tree.add_content(a, "hello");
        tree.add_content(a, " world");
        assert_eq!(tree.content(a), Some("hello world"));
    }

    #[test]
    fn test_should_remove_attribute_when_value_is_none() {
        let (mut tree, _, a, _) = sample();
        tree.set_attribute(a, "k", Some("v"));
        assert_eq!(tree.attribute(a, "k"), Some("v"));
        tree.set_attribute(a, "k", None);
        assert_eq!(tree.attribute(a, "k"), None);
    }

    #[test]
    fn test_should_release_removed_subtree() {
        let (mut tree, root, a, b) = sample();
        let leaf = tree.create("leaf");
        tree.add_child(a, leaf);
        tree.remove(a);
        assert_eq!(tree.count_children(root), 1);
        assert_eq!(tree.first_child(root), Some(b));
        assert!(!tree.contains(a));
        assert!(!tree.contains(leaf));
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_should_move_child_between_parents() {
        let (mut tree, root, a, b) = sample();
        tree.add_child(a, b);
        assert_eq!(tree.count_children(root), 1);
        assert_eq!(tree.parent(b), Some(a));
    }

    #[test]
    fn test_should_deep_copy_without_aliasing() {
        let (mut tree, root, a, _) = sample();
        tree.add_content(a, "x");
        let mut copy = tree.deep_copy(root);
        let copy_root = copy.root().expect("copy has a root");
        let copy_a = copy.first_child(copy_root).expect("copied child");
        assert_eq!(copy.parent(copy_a), Some(copy_root));
        copy.add_content(copy_a, "y");
        assert_eq!(tree.content(a), Some("x"));
        assert_eq!(copy.content(copy_a), Some("xy"));
    }

    #[test]
    fn test_should_resolve_prefixes_through_ancestors() {
        let (mut tree, root, a, _) = sample();
        tree.set_namespace(root, "m", "urn:m");
        tree.set_namespace(root, "", "urn:default");
        assert_eq!(tree.resolve_prefix(a, "m"), Some("urn:m"));
        assert_eq!(tree.resolve_prefix(a, ""), Some("urn:default"));
        assert_eq!(tree.resolve_prefix(a, "x"), None);
    }

    #[test]
    fn test_should_split_qualified_names() {
        assert_eq!(local_name("soap:Body"), "Body");
        assert_eq!(local_name("Body"), "Body");
        assert_eq!(name_prefix("soap:Body"), Some("soap"));
        assert_eq!(name_prefix("Body"), None);
    }
}
