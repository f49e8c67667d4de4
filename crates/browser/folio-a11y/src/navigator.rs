//! Sequential Focus Navigation
//!
//! The host's default Tab behaviour. Listeners (focus traps among them)
//! see every key first; only when none of them prevents the default does
//! focus move to the next or previous tabbable element of the document.

use folio_dom::{Document, KeyboardEvent, NodeId};
use tracing::trace;

use crate::scanner::{focusable_elements, precedes};

/// Dispatch a key press and run the default action if nobody prevented it
pub fn press_key(doc: &mut Document, event: KeyboardEvent) -> KeyboardEvent {
    let event = doc.dispatch_key(event);
    let plain = !(event.ctrl || event.alt || event.meta);

    if event.is_tab() && plain && !event.is_default_prevented() {
        if event.shift {
            focus_prev(doc);
        } else {
            focus_next(doc);
        }
    }
    event
}

/// Move focus to the next tabbable element, wrapping at the end
pub fn focus_next(doc: &mut Document) -> Option<NodeId> {
    step(doc, true)
}

/// Move focus to the previous tabbable element, wrapping at the start
pub fn focus_prev(doc: &mut Document) -> Option<NodeId> {
    step(doc, false)
}

fn step(doc: &mut Document, forward: bool) -> Option<NodeId> {
    let order = focusable_elements(&doc.tree, doc.tree.root());
    if order.is_empty() {
        return None;
    }

    let current = doc.active_element();
    let next = match current.and_then(|c| order.iter().position(|&n| n == c)) {
        Some(i) if forward => order[(i + 1) % order.len()],
        Some(i) => order[(i + order.len() - 1) % order.len()],
        None => {
            // Focus is on a non-tabbable element (or nowhere): continue from
            // its position in the document
            let candidate = match current {
                Some(c) if forward => order.iter().copied().find(|&n| precedes(&doc.tree, c, n)),
                Some(c) => order.iter().rev().copied().find(|&n| precedes(&doc.tree, n, c)),
                None => None,
            };
            candidate.unwrap_or(if forward { order[0] } else { order[order.len() - 1] })
        }
    };

    trace!(from = ?current, to = %next, forward, "sequential navigation");
    doc.focus(next).then_some(next)
}
