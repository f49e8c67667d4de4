//! Folio Accessibility
//!
//! Keyboard and assistive-technology support for the Folio knowledge
//! library, running against the `folio-dom` host document.
//!
//! Features:
//! - Focusable element scanning in document order
//! - Focus traps for dialogs, drawers and popovers, with focus restoration
//! - Sequential (Tab) focus navigation
//! - Screen reader announcements through polite/assertive live regions
//! - User accessibility preferences with persistence and change observers
//! - Document audit with WCAG references and suggested fixes

pub mod audit;
pub mod announcer;
pub mod config;
pub mod navigator;
pub mod preferences;
pub mod scanner;
pub mod trap;

pub use audit::{audit_document, A11yIssue, AuditReport, IssueSeverity, SuggestedFix};
pub use announcer::{Announcer, AnnouncerConfig, Politeness};
pub use config::{A11yConfig, PreferencesConfig};
pub use navigator::{focus_next, focus_prev, press_key};
pub use preferences::{
    apply_to_document, AccessibilityPreferences, ContrastMode, FileStorage, FontSize,
    LineSpacing, MemoryStorage, PreferencesPatch, PreferencesStorage, PreferencesStore,
    SubscriptionId,
};
pub use scanner::{focusable_elements, Boundaries, TabIndex};
pub use trap::{activate_trap, FocusTrap, ReleaseReason, TrapHandle, TrapOptions, TrapPhase};

use folio_dom::{DomError, NodeId};

/// Accessibility error
#[derive(Debug, thiserror::Error)]
pub enum A11yError {
    #[error("trap container {0} is not attached to the document")]
    DetachedContainer(NodeId),

    #[error("focus trap on {0} was already released; open a new trap instead")]
    TrapReleased(NodeId),

    #[error("DOM error: {0}")]
    Dom(#[from] DomError),

    #[error("preferences storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("preferences encoding error: {0}")]
    Json(#[from] serde_json::Error),
}
