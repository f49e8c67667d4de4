//! Document - High-level document API
//!
//! Owns the tree, the focused element and the keyboard listeners.

use std::fmt;

use tracing::{debug, trace};

use crate::events::{KeyListener, KeyboardEvent, ListenerId};
use crate::{DomTree, NodeId};

struct ListenerSlot {
    id: ListenerId,
    target: NodeId,
    /// Taken out while the listener runs
    callback: Option<KeyListener>,
}

/// HTML Document
pub struct Document {
    pub tree: DomTree,
    url: String,
    html_element: NodeId,
    head_element: NodeId,
    body_element: NodeId,
    focused: Option<NodeId>,
    listeners: Vec<ListenerSlot>,
    next_listener: u64,
}

impl Document {
    /// Create a document with `html`, `head` and `body`
    pub fn new(url: &str) -> Self {
        let mut tree = DomTree::new();
        let html = tree.create_element("html");
        let head = tree.create_element("head");
        let body = tree.create_element("body");

        let root = tree.root();
        // Freshly created nodes under the document node cannot fail
        let _ = tree.append_child(root, html);
        let _ = tree.append_child(html, head);
        let _ = tree.append_child(html, body);

        Self {
            tree,
            url: url.to_string(),
            html_element: html,
            head_element: head,
            body_element: body,
            focused: None,
            listeners: Vec::new(),
            next_listener: 1,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Text of the first `<title>` in `<head>`
    pub fn title(&self) -> String {
        self.tree
            .children(self.head_element)
            .find(|&id| self.tree.tag_name(id) == Some("title"))
            .map(|id| self.tree.text_content(id).trim().to_string())
            .unwrap_or_default()
    }

    pub fn document_element(&self) -> NodeId {
        self.html_element
    }

    pub fn head(&self) -> NodeId {
        self.head_element
    }

    pub fn body(&self) -> NodeId {
        self.body_element
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.tree.descendants(self.tree.root()).find(|&node| {
            self.tree
                .get(node)
                .and_then(|n| n.as_element())
                .is_some_and(|e| e.id.as_deref() == Some(id))
        })
    }

    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }

    // ------------------------------------------------------------------
    // Focus
    // ------------------------------------------------------------------

    /// The focused element, if it is still connected and rendered
    pub fn active_element(&self) -> Option<NodeId> {
        self.focused.filter(|&id| self.tree.has_layout_box(id))
    }

    /// Move focus to an element
    ///
    /// Any connected element with a layout box accepts programmatic
    /// focus. Returns `false` and leaves focus unchanged otherwise.
    pub fn focus(&mut self, id: NodeId) -> bool {
        if !self.tree.has_layout_box(id) {
            debug!(node = %id, "focus refused: no layout box");
            return false;
        }
        if self.focused != Some(id) {
            trace!(from = ?self.focused, to = %id, "focus moved");
            self.focused = Some(id);
        }
        true
    }

    pub fn blur(&mut self) {
        if let Some(prev) = self.focused.take() {
            trace!(from = %prev, "blurred");
        }
    }

    /// Whether the active element is `container` or inside it
    pub fn has_focus_within(&self, container: NodeId) -> bool {
        self.active_element()
            .is_some_and(|id| self.tree.contains(container, id))
    }

    // ------------------------------------------------------------------
    // Keyboard listeners
    // ------------------------------------------------------------------

    pub fn add_key_listener(&mut self, target: NodeId, listener: KeyListener) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push(ListenerSlot { id, target, callback: Some(listener) });
        trace!(listener = id.0, target = %target, "key listener added");
        id
    }

    /// Remove a listener. Safe to call from inside any listener, including
    /// the one being removed; a removed listener never runs again.
    pub fn remove_key_listener(&mut self, id: ListenerId) -> bool {
        match self.listeners.iter().position(|slot| slot.id == id) {
            Some(pos) => {
                self.listeners.remove(pos);
                trace!(listener = id.0, "key listener removed");
                true
            }
            None => false,
        }
    }

    /// Number of registered listeners
    pub fn key_listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Dispatch a keyboard event at the active element (or `<body>`)
    ///
    /// The propagation path is fixed before any listener runs. Listeners on
    /// one node run in registration order, nodes from target to document.
    /// Returns the event so the caller can honour `prevent_default`.
    pub fn dispatch_key(&mut self, mut event: KeyboardEvent) -> KeyboardEvent {
        let target = self
            .active_element()
            .or(Some(self.body_element).filter(|&b| self.tree.is_connected(b)))
            .unwrap_or(NodeId::ROOT);
        event.target = target;

        let path: Vec<NodeId> = std::iter::once(target)
            .chain(self.tree.ancestors(target))
            .collect();

        'path: for node in path {
            let ids: Vec<ListenerId> = self
                .listeners
                .iter()
                .filter(|slot| slot.target == node)
                .map(|slot| slot.id)
                .collect();

            for id in ids {
                if event.is_propagation_stopped() {
                    break 'path;
                }
                let Some(mut callback) = self
                    .listeners
                    .iter_mut()
                    .find(|slot| slot.id == id)
                    .and_then(|slot| slot.callback.take())
                else {
                    continue;
                };

                event.current_target = node;
                callback(self, &mut event);

                if let Some(slot) = self.listeners.iter_mut().find(|slot| slot.id == id) {
                    slot.callback = Some(callback);
                }
            }

            if event.is_propagation_stopped() {
                break;
            }
        }

        event.current_target = NodeId::NONE;
        event
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("about:blank")
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("url", &self.url)
            .field("nodes", &self.tree.len())
            .field("focused", &self.focused)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::Key;

    fn button(doc: &mut Document, parent: NodeId) -> NodeId {
        let b = doc.tree.create_element("button");
        doc.tree.append_child(parent, b).unwrap();
        b
    }

    #[test]
    fn test_document_structure() {
        let doc = Document::new("https://folio.test/");
        assert_eq!(doc.tree.tag_name(doc.document_element()), Some("html"));
        assert_eq!(doc.tree.parent(doc.body()), Some(doc.document_element()));
        assert_eq!(doc.url(), "https://folio.test/");
    }

    #[test]
    fn test_title_and_lookup() {
        let mut doc = Document::default();
        let title = doc.tree.create_element("title");
        let text = doc.tree.create_text(" Library ");
        let head = doc.head();
        doc.tree.append_child(head, title).unwrap();
        doc.tree.append_child(title, text).unwrap();
        assert_eq!(doc.title(), "Library");

        let body = doc.body();
        let b = button(&mut doc, body);
        doc.tree.set_attribute(b, "id", "save").unwrap();
        assert_eq!(doc.get_element_by_id("save"), Some(b));
        assert_eq!(doc.get_element_by_id("missing"), None);
    }

    #[test]
    fn test_focus_requires_layout_box() {
        let mut doc = Document::default();
        let body = doc.body();
        let b = button(&mut doc, body);
        assert!(doc.focus(b));
        assert_eq!(doc.active_element(), Some(b));

        let hidden = button(&mut doc, body);
        doc.tree.set_attribute(hidden, "style", "display:none").unwrap();
        assert!(!doc.focus(hidden));
        assert_eq!(doc.active_element(), Some(b));

        doc.tree.detach(b).unwrap();
        assert_eq!(doc.active_element(), None);
    }

    #[test]
    fn test_dispatch_bubbles_target_first() {
        let mut doc = Document::default();
        let body = doc.body();
        let section = doc.tree.create_element("section");
        doc.tree.append_child(body, section).unwrap();
        let b = button(&mut doc, section);
        doc.focus(b);

        let log = Rc::new(RefCell::new(Vec::new()));
        for (node, name) in [(body, "body"), (section, "section"), (b, "button")] {
            let log = Rc::clone(&log);
            doc.add_key_listener(node, Box::new(move |_: &mut Document, _: &mut KeyboardEvent| {
                log.borrow_mut().push(name)
            }));
        }

        doc.dispatch_key(KeyboardEvent::tab());
        assert_eq!(*log.borrow(), vec!["button", "section", "body"]);
    }

    #[test]
    fn test_stop_propagation_and_prevent_default() {
        let mut doc = Document::default();
        let body = doc.body();
        let b = button(&mut doc, body);
        doc.focus(b);

        let reached_body = Rc::new(RefCell::new(false));
        doc.add_key_listener(b, Box::new(|_: &mut Document, event: &mut KeyboardEvent| {
            event.prevent_default();
            event.stop_propagation();
        }));
        let flag = Rc::clone(&reached_body);
        doc.add_key_listener(body, Box::new(move |_: &mut Document, _: &mut KeyboardEvent| {
            *flag.borrow_mut() = true
        }));

        let event = doc.dispatch_key(KeyboardEvent::new(Key::Enter));
        assert!(event.is_default_prevented());
        assert_eq!(event.target(), b);
        assert!(!*reached_body.borrow());
    }

    #[test]
    fn test_listener_can_remove_itself() {
        let mut doc = Document::default();
        let body = doc.body();
        let calls = Rc::new(RefCell::new(0));
        let own_id = Rc::new(RefCell::new(None));

        let counter = Rc::clone(&calls);
        let id_slot = Rc::clone(&own_id);
        let id = doc.add_key_listener(body, Box::new(move |doc: &mut Document, _: &mut KeyboardEvent| {
            *counter.borrow_mut() += 1;
            if let Some(id) = *id_slot.borrow() {
                doc.remove_key_listener(id);
            }
        }));
        *own_id.borrow_mut() = Some(id);

        doc.dispatch_key(KeyboardEvent::escape());
        doc.dispatch_key(KeyboardEvent::escape());
        assert_eq!(*calls.borrow(), 1);
        assert_eq!(doc.key_listener_count(), 0);
    }

    #[test]
    fn test_unfocused_dispatch_targets_body() {
        let mut doc = Document::default();
        let event = doc.dispatch_key(KeyboardEvent::tab());
        assert_eq!(event.target(), doc.body());
    }
}
