//! DOM Tree (arena-based allocation)
//!
//! Slots are never reused: `destroy` empties a slot and the id it held
//! resolves to `None` from then on.

use tracing::trace;

use crate::node::{Display, ElementData, Node};
use crate::{DomError, DomResult, Generation, InternedString, NodeId, StringInterner};

/// Arena-based DOM tree
#[derive(Debug)]
pub struct DomTree {
    nodes: Vec<Option<Node>>,
    interner: StringInterner,
    generation: Generation,
}

impl DomTree {
    /// Create a tree holding only the document node
    pub fn new() -> Self {
        Self {
            nodes: vec![Some(Node::document())],
            interner: StringInterner::new(),
            generation: Generation::INITIAL,
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)?.as_ref()
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0 as usize)?.as_mut()
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn interner(&self) -> &StringInterner {
        &self.interner
    }

    pub fn resolve(&self, id: InternedString) -> &str {
        self.interner.get(id)
    }

    /// Current mutation generation
    pub fn generation(&self) -> Generation {
        self.generation
    }

    fn bump(&mut self) {
        self.generation = self.generation.next();
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Some(node));
        id
    }

    // ------------------------------------------------------------------
    // Creation
    // ------------------------------------------------------------------

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let tag = tag.to_ascii_lowercase();
        let display = Display::default_for(&tag);
        let name = self.interner.intern(&tag);
        self.push(Node::element(ElementData::new(name, display)))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(Node::text(text.to_string()))
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push(Node::comment(text.to_string()))
    }

    // ------------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------------

    fn check_insertable(&self, parent: NodeId, child: NodeId) -> DomResult<()> {
        let parent_node = self.get(parent).ok_or(DomError::NotFound(parent))?;
        if self.get(child).is_none() {
            return Err(DomError::NotFound(child));
        }
        if !parent_node.is_container() || child == NodeId::ROOT || self.contains(child, parent) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        Ok(())
    }

    /// Append `child` as the last child of `parent`, moving it if attached
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` before `reference` (or at the end when `None`)
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<()> {
        self.check_insertable(parent, child)?;
        if let Some(reference) = reference {
            match self.get(reference) {
                Some(node) if node.parent == parent => {}
                _ => return Err(DomError::NotFound(reference)),
            }
            if reference == child {
                return Ok(());
            }
        }

        self.unlink(child);

        let (prev, next) = match reference {
            Some(reference) => {
                let prev = self.get(reference).map_or(NodeId::NONE, |n| n.prev_sibling);
                (prev, reference)
            }
            None => {
                let prev = self.get(parent).map_or(NodeId::NONE, |n| n.last_child);
                (prev, NodeId::NONE)
            }
        };

        if let Some(node) = self.get_mut(child) {
            node.parent = parent;
            node.prev_sibling = prev;
            node.next_sibling = next;
        }
        match self.get_mut(prev) {
            Some(prev_node) => prev_node.next_sibling = child,
            None => {
                if let Some(p) = self.get_mut(parent) {
                    p.first_child = child;
                }
            }
        }
        match self.get_mut(next) {
            Some(next_node) => next_node.prev_sibling = child,
            None => {
                if let Some(p) = self.get_mut(parent) {
                    p.last_child = child;
                }
            }
        }

        self.bump();
        Ok(())
    }

    fn unlink(&mut self, id: NodeId) {
        let Some(node) = self.get(id) else { return };
        let (parent, prev, next) = (node.parent, node.prev_sibling, node.next_sibling);
        if !parent.is_valid() {
            return;
        }

        match self.get_mut(prev) {
            Some(p) => p.next_sibling = next,
            None => {
                if let Some(p) = self.get_mut(parent) {
                    p.first_child = next;
                }
            }
        }
        match self.get_mut(next) {
            Some(n) => n.prev_sibling = prev,
            None => {
                if let Some(p) = self.get_mut(parent) {
                    p.last_child = prev;
                }
            }
        }
        if let Some(node) = self.get_mut(id) {
            node.parent = NodeId::NONE;
            node.prev_sibling = NodeId::NONE;
            node.next_sibling = NodeId::NONE;
        }
    }

    /// Remove a node (and its subtree) from its parent, keeping it alive
    pub fn detach(&mut self, id: NodeId) -> DomResult<()> {
        if self.get(id).is_none() {
            return Err(DomError::NotFound(id));
        }
        if id == NodeId::ROOT {
            return Err(DomError::HierarchyRequest { parent: NodeId::NONE, child: id });
        }
        self.unlink(id);
        self.bump();
        trace!(node = %id, "detached");
        Ok(())
    }

    /// Detach a node and free its whole subtree
    pub fn destroy(&mut self, id: NodeId) -> DomResult<()> {
        self.detach(id)?;
        let doomed: Vec<NodeId> = std::iter::once(id).chain(self.descendants(id)).collect();
        for node in &doomed {
            if let Some(slot) = self.nodes.get_mut(node.0 as usize) {
                *slot = None;
            }
        }
        trace!(node = %id, freed = doomed.len(), "destroyed");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    fn element_mut(&mut self, id: NodeId) -> DomResult<&mut ElementData> {
        let node = self.get_mut(id).ok_or(DomError::NotFound(id))?;
        node.as_element_mut().ok_or(DomError::NotAnElement(id))
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> DomResult<()> {
        let name = name.to_ascii_lowercase();
        let key = self.interner.intern(&name);
        let default_display = {
            let node = self.get(id).ok_or(DomError::NotFound(id))?;
            let elem = node.as_element().ok_or(DomError::NotAnElement(id))?;
            Display::default_for(self.interner.get(elem.name))
        };

        let elem = self.element_mut(id)?;
        elem.set_attr(key, value.to_string());
        match name.as_str() {
            "id" => elem.id = Some(value.to_string()),
            "style" => elem.display = Display::from_style(value).unwrap_or(default_display),
            _ => {}
        }
        self.bump();
        Ok(())
    }

    /// Remove an attribute; returns whether it was present
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> DomResult<bool> {
        let name = name.to_ascii_lowercase();
        let Some(key) = self.interner.lookup(&name) else {
            return Ok(false);
        };
        let default_display = {
            let node = self.get(id).ok_or(DomError::NotFound(id))?;
            let elem = node.as_element().ok_or(DomError::NotAnElement(id))?;
            Display::default_for(self.interner.get(elem.name))
        };

        let elem = self.element_mut(id)?;
        let removed = elem.remove_attr(key).is_some();
        if removed {
            match name.as_str() {
                "id" => elem.id = None,
                "style" => elem.display = default_display,
                _ => {}
            }
            self.bump();
        }
        Ok(removed)
    }

    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        let key = self.interner.lookup(&name.to_ascii_lowercase())?;
        self.get(id)?.as_element()?.get_attr(key)
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.get_attribute(id, name).is_some()
    }

    /// Override the computed display of an element
    pub fn set_display(&mut self, id: NodeId, display: Display) -> DomResult<()> {
        self.element_mut(id)?.display = display;
        self.bump();
        Ok(())
    }

    /// Add a class token if absent
    pub fn add_class(&mut self, id: NodeId, class: &str) -> DomResult<()> {
        let current = self.get_attribute(id, "class").unwrap_or_default().to_string();
        if current.split_ascii_whitespace().any(|c| c == class) {
            return Ok(());
        }
        let updated = if current.trim().is_empty() {
            class.to_string()
        } else {
            format!("{} {}", current.trim(), class)
        };
        self.set_attribute(id, "class", &updated)
    }

    /// Remove a class token if present
    pub fn remove_class(&mut self, id: NodeId, class: &str) -> DomResult<()> {
        let Some(current) = self.get_attribute(id, "class") else {
            return Ok(());
        };
        if !current.split_ascii_whitespace().any(|c| c == class) {
            return Ok(());
        }
        let updated = current
            .split_ascii_whitespace()
            .filter(|c| *c != class)
            .collect::<Vec<_>>()
            .join(" ");
        self.set_attribute(id, "class", &updated)
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.get_attribute(id, "class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class))
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn is_element(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(Node::is_element)
    }

    /// Lowercased tag name of an element
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        let elem = self.get(id)?.as_element()?;
        Some(self.interner.get(elem.name))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).map(|n| n.parent).filter(|p| p.is_valid())
    }

    /// Direct children in order
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let first = self.get(id).map_or(NodeId::NONE, |n| n.first_child);
        std::iter::successors(Some(first).filter(|c| c.is_valid()), move |&c| {
            self.get(c).map(|n| n.next_sibling).filter(|s| s.is_valid())
        })
    }

    /// Ancestors of a node, nearest first, excluding the node itself
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&p| self.parent(p))
    }

    /// Whether `node` is `ancestor` or one of its descendants
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        if self.get(node).is_none() {
            return false;
        }
        node == ancestor || self.ancestors(node).any(|a| a == ancestor)
    }

    /// Whether the node is reachable from the document node
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.contains(NodeId::ROOT, id)
    }

    /// Whether the element would generate a layout box: it is connected,
    /// its own display produces a box (`none` and `contents` do not), and
    /// no ancestor is `display: none`. `hidden` counts as `display: none`.
    pub fn has_layout_box(&self, id: NodeId) -> bool {
        let Some(elem) = self.get(id).and_then(Node::as_element) else {
            return false;
        };
        if !elem.display.generates_box() || self.has_attribute(id, "hidden") || !self.is_connected(id) {
            return false;
        }
        self.ancestors(id).all(|n| match self.get(n).and_then(Node::as_element) {
            Some(elem) => elem.display.renders_children() && !self.has_attribute(n, "hidden"),
            None => true,
        })
    }

    /// Pre-order traversal of the subtree below `root` (exclusive)
    pub fn descendants(&self, root: NodeId) -> Descendants<'_> {
        let next = self.get(root).map_or(NodeId::NONE, |n| n.first_child);
        Descendants { tree: self, root, next }
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.get(id).and_then(Node::as_text) {
            return text.to_string();
        }
        self.descendants(id)
            .filter_map(|n| self.get(n).and_then(Node::as_text))
            .collect()
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Document-order iterator over a subtree
pub struct Descendants<'a> {
    tree: &'a DomTree,
    root: NodeId,
    next: NodeId,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next;
        let node = self.tree.get(current)?;

        self.next = if node.first_child.is_valid() {
            node.first_child
        } else {
            let mut cursor = current;
            loop {
                if cursor == self.root {
                    break NodeId::NONE;
                }
                let Some(n) = self.tree.get(cursor) else {
                    break NodeId::NONE;
                };
                if n.next_sibling.is_valid() {
                    break n.next_sibling;
                }
                cursor = n.parent;
                if !cursor.is_valid() {
                    break NodeId::NONE;
                }
            }
        };

        Some(current)
    }
}
