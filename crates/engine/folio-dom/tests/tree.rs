//! Integration tests for folio-dom
//!
//! Tree mutation, weak-id semantics and keyboard dispatch through the
//! public API only.

use std::cell::Cell;
use std::rc::Rc;

use folio_dom::{Display, Document, DomError, KeyboardEvent, NodeId};

fn dialog_with_buttons(doc: &mut Document, count: usize) -> (NodeId, Vec<NodeId>) {
    let dialog = doc.tree.create_element("dialog");
    let body = doc.body();
    doc.tree.append_child(body, dialog).unwrap();
    let buttons = (0..count)
        .map(|i| {
            let b = doc.tree.create_element("button");
            let label = doc.tree.create_text(&format!("Option {i}"));
            doc.tree.append_child(b, label).unwrap();
            doc.tree.append_child(dialog, b).unwrap();
            b
        })
        .collect();
    (dialog, buttons)
}

#[test]
fn test_destroyed_ids_never_resolve_again() {
    let mut doc = Document::default();
    let (dialog, buttons) = dialog_with_buttons(&mut doc, 2);
    doc.tree.destroy(dialog).unwrap();

    let fresh = doc.tree.create_element("button");
    assert_ne!(fresh, buttons[0]);
    assert!(doc.tree.get(buttons[0]).is_none());
    assert!(!doc.tree.is_connected(buttons[0]));
    assert_eq!(doc.tree.destroy(dialog), Err(DomError::NotFound(dialog)));
}

#[test]
fn test_focus_lost_when_subtree_hidden() {
    let mut doc = Document::default();
    let (dialog, buttons) = dialog_with_buttons(&mut doc, 1);
    assert!(doc.focus(buttons[0]));
    assert!(doc.has_focus_within(dialog));

    doc.tree.set_display(dialog, Display::None).unwrap();
    assert_eq!(doc.active_element(), None);
    assert!(!doc.has_focus_within(dialog));
}

#[test]
fn test_removed_listener_not_called_later_in_same_dispatch() {
    let mut doc = Document::default();
    let (dialog, buttons) = dialog_with_buttons(&mut doc, 1);
    doc.focus(buttons[0]);

    let outer_calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&outer_calls);
    let outer = doc.add_key_listener(
        dialog,
        Box::new(move |_: &mut Document, _: &mut KeyboardEvent| counter.set(counter.get() + 1)),
    );

    // Inner listener removes the outer one before the event bubbles to it
    doc.add_key_listener(
        buttons[0],
        Box::new(move |doc: &mut Document, _: &mut KeyboardEvent| {
            doc.remove_key_listener(outer);
        }),
    );

    doc.dispatch_key(KeyboardEvent::tab());
    assert_eq!(outer_calls.get(), 0);
}

#[test]
fn test_text_content_of_dialog() {
    let mut doc = Document::default();
    let (dialog, _) = dialog_with_buttons(&mut doc, 2);
    assert_eq!(doc.tree.text_content(dialog), "Option 0Option 1");
}

#[test]
fn test_display_contents_element_has_no_box_but_children_do() {
    let mut doc = Document::default();
    let body = doc.body();
    let wrapper = doc.tree.create_element("div");
    doc.tree.set_attribute(wrapper, "style", "display: contents").unwrap();
    doc.tree.append_child(body, wrapper).unwrap();
    let inner = doc.tree.create_element("button");
    doc.tree.append_child(wrapper, inner).unwrap();

    assert!(!doc.tree.has_layout_box(wrapper));
    assert!(doc.tree.has_layout_box(inner));
    assert!(!doc.focus(wrapper));
    assert!(doc.focus(inner));

    let flat = doc.tree.create_element("button");
    doc.tree.set_display(flat, Display::Contents).unwrap();
    doc.tree.append_child(body, flat).unwrap();
    assert!(!doc.focus(flat));
    assert_eq!(doc.active_element(), Some(inner));
}
