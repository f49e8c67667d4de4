//! Accessibility Audit
//!
//! Walks the live document and reports common WCAG failures together with
//! a suggested fix for each.

use std::fmt;

use folio_dom::{Document, DomTree, NodeId};
use tracing::debug;

use crate::scanner::TabIndex;

/// Issue severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IssueSeverity {
    /// Minor issue, suggestion only
    Info,
    /// Should fix for better accessibility
    Warning,
    /// Must fix, fails WCAG AA
    Error,
    /// Major barrier
    Critical,
}

impl IssueSeverity {
    /// Points deducted from the audit score per issue
    pub fn weight(self) -> u32 {
        match self {
            Self::Info => 1,
            Self::Warning => 3,
            Self::Error => 10,
            Self::Critical => 25,
        }
    }
}

/// A single audit finding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum A11yIssue {
    /// Image without an `alt` attribute
    MissingAltText { node: NodeId },
    /// Button or link with no accessible name
    MissingName { node: NodeId, tag: String },
    /// Form control without an associated label
    FormMissingLabel { node: NodeId, control: String },
    /// Heading level jumps by more than one
    HeadingSkip { node: NodeId, expected_level: u8, actual_level: u8 },
    /// `<html>` without `lang`
    MissingLang,
    /// Empty or missing `<title>`
    MissingTitle,
    /// `tabindex` greater than zero
    PositiveTabIndex { node: NodeId, value: i32 },
}

impl A11yIssue {
    pub fn severity(&self) -> IssueSeverity {
        match self {
            Self::MissingAltText { .. } => IssueSeverity::Error,
            Self::MissingName { .. } => IssueSeverity::Error,
            Self::FormMissingLabel { .. } => IssueSeverity::Error,
            Self::HeadingSkip { .. } => IssueSeverity::Warning,
            Self::MissingLang => IssueSeverity::Error,
            Self::MissingTitle => IssueSeverity::Warning,
            Self::PositiveTabIndex { .. } => IssueSeverity::Warning,
        }
    }

    /// WCAG success criterion this issue fails
    pub fn wcag_criterion(&self) -> &'static str {
        match self {
            Self::MissingAltText { .. } => "1.1.1 Non-text Content",
            Self::MissingName { .. } => "4.1.2 Name, Role, Value",
            Self::FormMissingLabel { .. } => "1.3.1 Info and Relationships",
            Self::HeadingSkip { .. } => "1.3.1 Info and Relationships",
            Self::MissingLang => "3.1.1 Language of Page",
            Self::MissingTitle => "2.4.2 Page Titled",
            Self::PositiveTabIndex { .. } => "2.4.3 Focus Order",
        }
    }

    /// Offending element, if the issue is tied to one
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Self::MissingAltText { node }
            | Self::MissingName { node, .. }
            | Self::FormMissingLabel { node, .. }
            | Self::HeadingSkip { node, .. }
            | Self::PositiveTabIndex { node, .. } => Some(*node),
            Self::MissingLang | Self::MissingTitle => None,
        }
    }

    pub fn suggested_fix(&self) -> SuggestedFix {
        match self {
            Self::MissingAltText { node } => SuggestedFix::new("Add an alt attribute describing the image")
                .with_attribute(*node, "alt", "Descriptive text here"),
            Self::MissingName { node, tag } => {
                SuggestedFix::new(&format!("Give the {tag} element visible text or an aria-label"))
                    .with_attribute(*node, "aria-label", "Descriptive label")
            }
            Self::FormMissingLabel { node, control } => {
                SuggestedFix::new(&format!("Associate a <label> with the {control} control"))
                    .with_attribute(*node, "aria-label", "Field label")
            }
            Self::HeadingSkip { expected_level, .. } => {
                SuggestedFix::new(&format!("Use h{expected_level} instead"))
            }
            Self::MissingLang => SuggestedFix::new("Add a lang attribute to the html element"),
            Self::MissingTitle => SuggestedFix::new("Add a descriptive <title> element in <head>"),
            Self::PositiveTabIndex { node, .. } => {
                SuggestedFix::new("Use tabindex=\"0\" and rely on document order")
                    .with_attribute(*node, "tabindex", "0")
            }
        }
    }
}

impl fmt::Display for A11yIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingAltText { node } => write!(f, "image {node} has no alt text"),
            Self::MissingName { node, tag } => write!(f, "{tag} {node} has no accessible name"),
            Self::FormMissingLabel { node, control } => write!(f, "{control} {node} has no label"),
            Self::HeadingSkip { node, expected_level, actual_level } => {
                write!(f, "heading {node} is h{actual_level}, expected at most h{expected_level}")
            }
            Self::MissingLang => f.write_str("html element has no lang attribute"),
            Self::MissingTitle => f.write_str("document has no title"),
            Self::PositiveTabIndex { node, value } => write!(f, "{node} has tabindex={value}"),
        }
    }
}

/// Suggested fix for an issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestedFix {
    pub description: String,
    /// Element to modify
    pub node: Option<NodeId>,
    pub attribute: Option<String>,
    pub value: Option<String>,
}

impl SuggestedFix {
    pub fn new(description: &str) -> Self {
        Self {
            description: description.to_string(),
            node: None,
            attribute: None,
            value: None,
        }
    }

    pub fn with_attribute(mut self, node: NodeId, attr: &str, value: &str) -> Self {
        self.node = Some(node);
        self.attribute = Some(attr.to_string());
        self.value = Some(value.to_string());
        self
    }
}

/// Result of auditing a document
#[derive(Debug, Clone, Default)]
pub struct AuditReport {
    pub issues: Vec<A11yIssue>,
}

impl AuditReport {
    /// 100 minus weighted deductions, floored at 0
    pub fn score(&self) -> u32 {
        let deducted: u32 = self.issues.iter().map(|i| i.severity().weight()).sum();
        100u32.saturating_sub(deducted)
    }

    pub fn count(&self, severity: IssueSeverity) -> usize {
        self.issues.iter().filter(|i| i.severity() == severity).count()
    }

    /// Issues at or above `min_severity`
    pub fn issues_by_severity(&self, min_severity: IssueSeverity) -> Vec<&A11yIssue> {
        self.issues.iter().filter(|i| i.severity() >= min_severity).collect()
    }

    /// No errors or critical issues
    pub fn passes(&self) -> bool {
        !self.issues.iter().any(|i| i.severity() >= IssueSeverity::Error)
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Audit the whole document
pub fn audit_document(doc: &Document) -> AuditReport {
    let tree = &doc.tree;
    let mut issues = Vec::new();

    if tree
        .get_attribute(doc.document_element(), "lang")
        .is_none_or(|lang| lang.trim().is_empty())
    {
        issues.push(A11yIssue::MissingLang);
    }
    if doc.title().is_empty() {
        issues.push(A11yIssue::MissingTitle);
    }

    let mut last_heading = 0u8;
    for node in tree.descendants(tree.root()) {
        let Some(tag) = tree.tag_name(node) else {
            continue;
        };

        match tag {
            "img" if !tree.has_attribute(node, "alt") => {
                issues.push(A11yIssue::MissingAltText { node });
            }
            "button" | "a" if !has_accessible_name(tree, node) => {
                issues.push(A11yIssue::MissingName { node, tag: tag.to_string() });
            }
            "input" | "select" | "textarea" if needs_label(tree, node) && !has_label(doc, node) => {
                issues.push(A11yIssue::FormMissingLabel { node, control: tag.to_string() });
            }
            _ => {}
        }

        if let Some(level) = heading_level(tag) {
            if level > last_heading + 1 {
                issues.push(A11yIssue::HeadingSkip {
                    node,
                    expected_level: last_heading + 1,
                    actual_level: level,
                });
            }
            last_heading = level;
        }

        match tree.get_attribute(node, "tabindex").and_then(TabIndex::parse) {
            Some(TabIndex::Sequential(value)) if value > 0 => {
                issues.push(A11yIssue::PositiveTabIndex { node, value });
            }
            _ => {}
        }
    }

    debug!(issues = issues.len(), "accessibility audit finished");
    AuditReport { issues }
}

fn heading_level(tag: &str) -> Option<u8> {
    match tag {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

fn non_blank(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

fn has_accessible_name(tree: &DomTree, node: NodeId) -> bool {
    !tree.text_content(node).trim().is_empty()
        || ["aria-label", "aria-labelledby", "title"]
            .iter()
            .any(|attr| non_blank(tree.get_attribute(node, attr)))
        || tree
            .descendants(node)
            .any(|d| tree.tag_name(d) == Some("img") && non_blank(tree.get_attribute(d, "alt")))
}

/// Controls that carry their own name do not need a label
fn needs_label(tree: &DomTree, node: NodeId) -> bool {
    !matches!(
        tree.get_attribute(node, "type").map(str::to_ascii_lowercase).as_deref(),
        Some("hidden" | "submit" | "reset" | "button" | "image")
    )
}

fn has_label(doc: &Document, node: NodeId) -> bool {
    let tree = &doc.tree;
    if non_blank(tree.get_attribute(node, "aria-label"))
        || non_blank(tree.get_attribute(node, "aria-labelledby"))
    {
        return true;
    }
    if tree.ancestors(node).any(|a| tree.tag_name(a) == Some("label")) {
        return true;
    }
    let Some(id) = tree.get_attribute(node, "id") else {
        return false;
    };
    tree.descendants(tree.root())
        .any(|d| tree.tag_name(d) == Some("label") && tree.get_attribute(d, "for") == Some(id))
}
