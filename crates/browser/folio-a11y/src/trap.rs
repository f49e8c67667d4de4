//! Focus Trap
//!
//! Keeps keyboard focus inside an overlay (dialog, drawer, sheet) for as
//! long as it is open, and hands focus back to where it was when the
//! overlay closes.
//!
//! A session moves `Pending -> Active -> Released`. Released is terminal:
//! reopening an overlay means creating a new trap.
//!
//! Each active session owns two key listeners:
//! - the trap listener on the container wraps Tab / Shift+Tab at the
//!   boundaries and releases the trap on Escape;
//! - a watchdog on the document node releases the trap once the container
//!   has been removed from the document, and pulls focus back inside when
//!   Tab is pressed while focus sits outside the container.
//!
//! Nested overlays: the innermost container sees a key first. Every key a
//! trap handles has its default prevented, and trap listeners skip events
//! that are already prevented, so only the innermost trap reacts. Active
//! containers carry a `data-focus-trap` activation number; a watchdog
//! leaves focus alone while it sits inside a more recently opened trap.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use folio_dom::{Document, KeyboardEvent, ListenerId, NodeId};
use serde::Deserialize;
use tracing::{debug, trace};

use crate::scanner::{focusable_elements, is_focusable, precedes, Boundaries};
use crate::A11yError;

/// Trap activation options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TrapOptions {
    /// Return focus to the previously focused element on release
    pub restore_focus_on_deactivate: bool,
    /// Focus the first focusable element (or the container) on activation
    pub auto_focus_first: bool,
}

impl Default for TrapOptions {
    fn default() -> Self {
        Self {
            restore_focus_on_deactivate: true,
            auto_focus_first: true,
        }
    }
}

/// Lifecycle phase of a trap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapPhase {
    Pending,
    Active,
    Released,
}

/// Why a trap was released
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseReason {
    /// Escape pressed inside the container
    Escape,
    /// Explicit close or unmount by the owner
    Close,
    /// Container found removed from the document
    Detached,
}

#[derive(Debug)]
struct TrapSession {
    container: NodeId,
    options: TrapOptions,
    previously_focused: Option<NodeId>,
    phase: TrapPhase,
    listeners: Vec<ListenerId>,
    release_reason: Option<ReleaseReason>,
    activation: u64,
}

type SharedSession = Rc<RefCell<TrapSession>>;

/// Attribute marking an active trap container with its activation number
pub const TRAP_ATTRIBUTE: &str = "data-focus-trap";

static NEXT_ACTIVATION: AtomicU64 = AtomicU64::new(1);

/// Focus trap controller over one container
#[derive(Debug, Clone)]
pub struct FocusTrap {
    session: SharedSession,
}

impl FocusTrap {
    pub fn new(container: NodeId, options: TrapOptions) -> Self {
        Self {
            session: Rc::new(RefCell::new(TrapSession {
                container,
                options,
                previously_focused: None,
                phase: TrapPhase::Pending,
                listeners: Vec::new(),
                release_reason: None,
                activation: 0,
            })),
        }
    }

    /// Activate the trap
    ///
    /// Records the focused element, moves focus into the container and
    /// attaches the key listeners. Activating an active trap is a no-op.
    pub fn activate(&self, doc: &mut Document) -> Result<(), A11yError> {
        let (container, options) = {
            let s = self.session.borrow();
            match s.phase {
                TrapPhase::Active => return Ok(()),
                TrapPhase::Released => return Err(A11yError::TrapReleased(s.container)),
                TrapPhase::Pending => (s.container, s.options),
            }
        };

        if !doc.tree.is_element(container) || !doc.tree.is_connected(container) {
            return Err(A11yError::DetachedContainer(container));
        }

        let previously_focused = doc.active_element();
        let activation = NEXT_ACTIVATION.fetch_add(1, Ordering::Relaxed);
        doc.tree.set_attribute(container, TRAP_ATTRIBUTE, &activation.to_string())?;

        if options.auto_focus_first {
            let target = focusable_elements(&doc.tree, container)
                .first()
                .copied()
                .unwrap_or(container);
            if !doc.focus(target) {
                debug!(container = %container, "trap container cannot take focus");
            }
        }

        let trap_session = Rc::clone(&self.session);
        let trap_listener = doc.add_key_listener(
            container,
            Box::new(move |doc: &mut Document, event: &mut KeyboardEvent| {
                on_container_key(&trap_session, doc, event);
            }),
        );

        let watch_session = Rc::clone(&self.session);
        let root = doc.tree.root();
        let watchdog = doc.add_key_listener(
            root,
            Box::new(move |doc: &mut Document, event: &mut KeyboardEvent| {
                on_document_key(&watch_session, doc, event);
            }),
        );

        let mut s = self.session.borrow_mut();
        s.previously_focused = previously_focused;
        s.listeners = vec![trap_listener, watchdog];
        s.activation = activation;
        s.phase = TrapPhase::Active;
        debug!(
            container = %container,
            previously_focused = ?previously_focused,
            focused = ?doc.active_element(),
            "focus trap activated"
        );
        Ok(())
    }

    /// Release the trap (close or unmount)
    ///
    /// Returns `false` when the trap was not active; nothing happens then,
    /// in particular focus is not restored a second time.
    pub fn deactivate(&self, doc: &mut Document) -> bool {
        release(&self.session, doc, ReleaseReason::Close)
    }

    pub fn phase(&self) -> TrapPhase {
        self.session.borrow().phase
    }

    pub fn is_active(&self) -> bool {
        self.phase() == TrapPhase::Active
    }

    pub fn container(&self) -> NodeId {
        self.session.borrow().container
    }

    pub fn previously_focused(&self) -> Option<NodeId> {
        self.session.borrow().previously_focused
    }

    pub fn release_reason(&self) -> Option<ReleaseReason> {
        self.session.borrow().release_reason
    }

    /// Current boundary elements, recomputed from the live tree
    pub fn boundaries(&self, doc: &Document) -> Option<Boundaries> {
        Boundaries::of(&focusable_elements(&doc.tree, self.container()))
    }
}

/// Deactivation callback returned by [`activate_trap`]
#[derive(Debug)]
#[must_use = "an overlay must call `deactivate` when it closes"]
pub struct TrapHandle {
    trap: FocusTrap,
}

impl TrapHandle {
    /// Close the overlay's trap. A no-op if Escape or a detached container
    /// already released it.
    pub fn deactivate(self, doc: &mut Document) {
        self.trap.deactivate(doc);
    }

    pub fn is_active(&self) -> bool {
        self.trap.is_active()
    }

    pub fn trap(&self) -> &FocusTrap {
        &self.trap
    }
}

/// Trap focus inside `container` until the returned handle is deactivated
pub fn activate_trap(
    doc: &mut Document,
    container: NodeId,
    options: TrapOptions,
) -> Result<TrapHandle, A11yError> {
    let trap = FocusTrap::new(container, options);
    trap.activate(doc)?;
    Ok(TrapHandle { trap })
}

fn active_container(session: &SharedSession) -> Option<NodeId> {
    let s = session.borrow();
    (s.phase == TrapPhase::Active).then_some(s.container)
}

fn on_container_key(session: &SharedSession, doc: &mut Document, event: &mut KeyboardEvent) {
    if event.is_default_prevented() {
        return;
    }
    let Some(container) = active_container(session) else {
        return;
    };
    if !doc.tree.is_connected(container) {
        release(session, doc, ReleaseReason::Detached);
        return;
    }

    if event.is_escape() {
        event.prevent_default();
        release(session, doc, ReleaseReason::Escape);
        return;
    }
    if !event.is_tab() || event.ctrl || event.alt || event.meta {
        return;
    }

    let focusables = focusable_elements(&doc.tree, container);
    let Some(bounds) = Boundaries::of(&focusables) else {
        // Nothing to tab to: keep focus where it is
        event.prevent_default();
        return;
    };

    let current = doc.active_element();
    let wrap_to = match current {
        Some(c) if focusables.contains(&c) => {
            if event.shift && c == bounds.first {
                Some(bounds.last)
            } else if !event.shift && c == bounds.last {
                Some(bounds.first)
            } else {
                None
            }
        }
        // Focus on the container itself or a non-tabbable descendant: wrap
        // only if the default move would leave the container
        Some(c) if event.shift => {
            (!focusables.iter().any(|&n| precedes(&doc.tree, n, c))).then_some(bounds.last)
        }
        Some(c) => {
            (!focusables.iter().any(|&n| precedes(&doc.tree, c, n))).then_some(bounds.first)
        }
        None => Some(if event.shift { bounds.last } else { bounds.first }),
    };

    if let Some(target) = wrap_to {
        event.prevent_default();
        doc.focus(target);
        trace!(container = %container, to = %target, shift = event.shift, "focus wrapped");
    }
}

fn on_document_key(session: &SharedSession, doc: &mut Document, event: &mut KeyboardEvent) {
    let Some(container) = active_container(session) else {
        return;
    };
    if !doc.tree.is_connected(container) {
        release(session, doc, ReleaseReason::Detached);
        return;
    }

    // Runs even when an outer trap already prevented the default, so the
    // innermost open trap gets the last word on where focus lands
    let activation = session.borrow().activation;
    if event.is_tab() && !doc.has_focus_within(container) && !focus_in_newer_trap(doc, activation) {
        event.prevent_default();
        let focusables = focusable_elements(&doc.tree, container);
        let target = match Boundaries::of(&focusables) {
            Some(b) if event.shift => b.last,
            Some(b) => b.first,
            None => container,
        };
        doc.focus(target);
        trace!(container = %container, to = %target, "focus pulled back into trap");
    }
}

fn focus_in_newer_trap(doc: &Document, activation: u64) -> bool {
    let Some(focused) = doc.active_element() else {
        return false;
    };
    std::iter::once(focused)
        .chain(doc.tree.ancestors(focused))
        .filter_map(|n| doc.tree.get_attribute(n, TRAP_ATTRIBUTE))
        .filter_map(|v| v.parse::<u64>().ok())
        .any(|n| n > activation)
}

fn release(session: &SharedSession, doc: &mut Document, reason: ReleaseReason) -> bool {
    let (container, listeners, restore_to) = {
        let mut s = session.borrow_mut();
        if s.phase != TrapPhase::Active {
            return false;
        }
        s.phase = TrapPhase::Released;
        s.release_reason = Some(reason);
        let restore_to = if s.options.restore_focus_on_deactivate {
            s.previously_focused
        } else {
            None
        };
        (s.container, std::mem::take(&mut s.listeners), restore_to)
    };

    for id in listeners {
        doc.remove_key_listener(id);
    }
    if doc.tree.is_element(container) {
        let _ = doc.tree.remove_attribute(container, TRAP_ATTRIBUTE);
    }

    match restore_to {
        Some(prev) if is_focusable(&doc.tree, prev) => {
            doc.focus(prev);
        }
        Some(prev) => {
            debug!(node = %prev, "focus restoration target gone; leaving focus in place");
        }
        None => {}
    }

    debug!(container = %container, ?reason, "focus trap released");
    true
}
