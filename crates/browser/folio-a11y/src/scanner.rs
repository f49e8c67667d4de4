//! Focusable Element Scanner
//!
//! Computes, on demand, the elements inside a container that Tab can
//! reach. Nothing is cached: every call walks the live tree, so the result
//! always reflects the current render.

use folio_dom::{DomTree, NodeId};

/// Parsed `tabindex` attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabIndex {
    /// Negative: focusable by script only, skipped by Tab
    ScriptOnly,
    /// Zero or positive
    Sequential(i32),
}

impl TabIndex {
    /// Parse an attribute value; invalid values behave as if absent
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().parse::<i32>() {
            Ok(n) if n < 0 => Some(Self::ScriptOnly),
            Ok(n) => Some(Self::Sequential(n)),
            Err(_) => None,
        }
    }

    pub fn is_sequential(self) -> bool {
        matches!(self, Self::Sequential(_))
    }
}

/// First and last focusable element of a container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundaries {
    pub first: NodeId,
    pub last: NodeId,
}

impl Boundaries {
    pub fn of(elements: &[NodeId]) -> Option<Self> {
        Some(Self {
            first: *elements.first()?,
            last: *elements.last()?,
        })
    }
}

/// Ordered focusable descendants of `container`, in document order
///
/// An empty result means a trap over this container cannot be enforced;
/// it is not an error.
pub fn focusable_elements(tree: &DomTree, container: NodeId) -> Vec<NodeId> {
    tree.descendants(container)
        .filter(|&node| is_tabbable(tree, node))
        .collect()
}

/// Whether an element takes part in sequential (Tab) navigation
pub fn is_tabbable(tree: &DomTree, node: NodeId) -> bool {
    let Some(tag) = tree.tag_name(node) else {
        return false;
    };

    let tabindex = tree.get_attribute(node, "tabindex").and_then(TabIndex::parse);
    if tabindex == Some(TabIndex::ScriptOnly) {
        return false;
    }

    let candidate = match tag {
        "button" | "select" | "textarea" => true,
        "input" => !tree
            .get_attribute(node, "type")
            .is_some_and(|t| t.eq_ignore_ascii_case("hidden")),
        "a" | "area" => tree.has_attribute(node, "href"),
        _ => false,
    } || tabindex.is_some_and(TabIndex::is_sequential)
        || is_editable(tree, node);

    candidate && !is_disabled(tree, node) && tree.has_layout_box(node)
}

/// Whether an element can take programmatic focus at all
pub fn is_focusable(tree: &DomTree, node: NodeId) -> bool {
    tree.has_layout_box(node) && !is_disabled(tree, node)
}

fn is_disabled(tree: &DomTree, node: NodeId) -> bool {
    matches!(
        tree.tag_name(node),
        Some("button" | "input" | "select" | "textarea" | "option" | "fieldset")
    ) && tree.has_attribute(node, "disabled")
}

fn is_editable(tree: &DomTree, node: NodeId) -> bool {
    tree.get_attribute(node, "contenteditable")
        .is_some_and(|v| !v.trim().eq_ignore_ascii_case("false"))
}

/// Whether `a` comes before `b` in document order
///
/// An ancestor precedes its descendants. Nodes in different trees (one of
/// them detached) are unordered and yield `false`.
pub fn precedes(tree: &DomTree, a: NodeId, b: NodeId) -> bool {
    let chain = |n: NodeId| {
        let mut path: Vec<NodeId> = std::iter::once(n).chain(tree.ancestors(n)).collect();
        path.reverse();
        path
    };
    let (path_a, path_b) = (chain(a), chain(b));

    let common = path_a.iter().zip(&path_b).take_while(|(x, y)| x == y).count();
    if common == 0 {
        return false;
    }
    if common == path_a.len() {
        return path_a.len() < path_b.len();
    }
    if common == path_b.len() {
        return false;
    }

    let (branch_a, branch_b) = (path_a[common], path_b[common]);
    tree.children(path_a[common - 1])
        .find(|&c| c == branch_a || c == branch_b)
        == Some(branch_a)
}

#[cfg(test)]
mod tests {
    use folio_dom::Document;

    use super::*;

    fn el(doc: &mut Document, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let id = doc.tree.create_element(tag);
        for (name, value) in attrs {
            doc.tree.set_attribute(id, name, value).unwrap();
        }
        doc.tree.append_child(parent, id).unwrap();
        id
    }

    #[test]
    fn test_tab_index_parse() {
        assert_eq!(TabIndex::parse("-1"), Some(TabIndex::ScriptOnly));
        assert_eq!(TabIndex::parse(" 0 "), Some(TabIndex::Sequential(0)));
        assert_eq!(TabIndex::parse("3"), Some(TabIndex::Sequential(3)));
        assert_eq!(TabIndex::parse("abc"), None);
    }

    #[test]
    fn test_scan_filters_and_order() {
        let mut doc = Document::default();
        let body = doc.body();
        let panel = el(&mut doc, body, "div", &[]);

        let link = el(&mut doc, panel, "a", &[("href", "/library")]);
        el(&mut doc, panel, "a", &[]); // no href
        let input = el(&mut doc, panel, "input", &[("type", "search")]);
        el(&mut doc, panel, "input", &[("type", "hidden")]);
        el(&mut doc, panel, "button", &[("disabled", "")]);
        el(&mut doc, panel, "button", &[("tabindex", "-1")]);
        let card = el(&mut doc, panel, "div", &[("tabindex", "0")]);
        el(&mut doc, panel, "div", &[("tabindex", "-1")]);
        let editor = el(&mut doc, panel, "div", &[("contenteditable", "true")]);
        el(&mut doc, panel, "div", &[("contenteditable", "false")]);
        let hidden = el(&mut doc, panel, "div", &[("style", "display: none")]);
        el(&mut doc, hidden, "button", &[]);
        let nested = el(&mut doc, panel, "section", &[]);
        let select = el(&mut doc, nested, "select", &[]);

        assert_eq!(
            focusable_elements(&doc.tree, panel),
            vec![link, input, card, editor, select]
        );
    }

    #[test]
    fn test_display_contents_button_not_tabbable() {
        let mut doc = Document::default();
        let body = doc.body();
        let panel = el(&mut doc, body, "div", &[]);
        el(&mut doc, panel, "button", &[("style", "display:contents")]);
        let wrapper = el(&mut doc, panel, "span", &[("style", "display: contents")]);
        let inner = el(&mut doc, wrapper, "button", &[]);

        assert_eq!(focusable_elements(&doc.tree, panel), vec![inner]);
    }

    #[test]
    fn test_scan_excludes_container_and_detached() {
        let mut doc = Document::default();
        let body = doc.body();
        let panel = el(&mut doc, body, "div", &[("tabindex", "0")]);
        let b = el(&mut doc, panel, "button", &[]);
        assert_eq!(focusable_elements(&doc.tree, panel), vec![b]);

        doc.tree.detach(panel).unwrap();
        assert!(focusable_elements(&doc.tree, panel).is_empty());
    }

    #[test]
    fn test_boundaries() {
        assert_eq!(Boundaries::of(&[]), None);
        let ids = [NodeId::ROOT];
        let b = Boundaries::of(&ids).unwrap();
        assert_eq!(b.first, b.last);
    }

    #[test]
    fn test_precedes() {
        let mut doc = Document::default();
        let body = doc.body();
        let a = el(&mut doc, body, "div", &[]);
        let a1 = el(&mut doc, a, "button", &[]);
        let b = el(&mut doc, body, "div", &[]);

        assert!(precedes(&doc.tree, a, a1));
        assert!(precedes(&doc.tree, a1, b));
        assert!(!precedes(&doc.tree, b, a1));
        assert!(!precedes(&doc.tree, a, a));

        let loose = doc.tree.create_element("button");
        assert!(!precedes(&doc.tree, loose, a));
        assert!(!precedes(&doc.tree, a, loose));
    }
}
