//! DOM Node
//!
//! Nodes link to each other by `NodeId` instead of pointers, so the tree
//! can be mutated freely while ids held elsewhere stay cheap to check.

use crate::{InternedString, NodeId};

/// DOM Node
#[derive(Debug)]
pub struct Node {
    pub parent: NodeId,
    pub first_child: NodeId,
    /// Last child (for O(1) append)
    pub last_child: NodeId,
    pub prev_sibling: NodeId,
    pub next_sibling: NodeId,
    pub data: NodeData,
}

impl Node {
    fn with_data(data: NodeData) -> Self {
        Self {
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
            data,
        }
    }

    pub fn document() -> Self {
        Self::with_data(NodeData::Document)
    }

    pub fn element(data: ElementData) -> Self {
        Self::with_data(NodeData::Element(data))
    }

    pub fn text(content: String) -> Self {
        Self::with_data(NodeData::Text(content))
    }

    pub fn comment(content: String) -> Self {
        Self::with_data(NodeData::Comment(content))
    }

    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    #[inline]
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Whether this node may hold children
    pub fn is_container(&self) -> bool {
        matches!(self.data, NodeData::Document | NodeData::Element(_))
    }
}

/// Node-specific data
#[derive(Debug)]
pub enum NodeData {
    Document,
    Element(ElementData),
    Text(String),
    Comment(String),
}

/// Element-specific data
#[derive(Debug)]
pub struct ElementData {
    /// Lowercased tag name
    pub name: InternedString,
    pub attrs: Vec<Attribute>,
    /// Cached `id` attribute
    pub id: Option<String>,
    /// Computed display, from the tag default or the `style` attribute
    pub display: Display,
}

impl ElementData {
    pub fn new(name: InternedString, display: Display) -> Self {
        Self {
            name,
            attrs: Vec::new(),
            id: None,
            display,
        }
    }

    pub fn get_attr(&self, name: InternedString) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Set an attribute, returning the previous value
    pub fn set_attr(&mut self, name: InternedString, value: String) -> Option<String> {
        if let Some(attr) = self.attrs.iter_mut().find(|a| a.name == name) {
            return Some(std::mem::replace(&mut attr.value, value));
        }
        self.attrs.push(Attribute { name, value });
        None
    }

    pub fn remove_attr(&mut self, name: InternedString) -> Option<String> {
        let pos = self.attrs.iter().position(|a| a.name == name)?;
        Some(self.attrs.remove(pos).value)
    }
}

/// Attribute
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: InternedString,
    pub value: String,
}

/// Computed `display` value
///
/// Only the distinction between "generates a box" and `none` matters to
/// focus handling; the other variants keep the value round-trippable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Display {
    Block,
    #[default]
    Inline,
    Contents,
    None,
}

impl Display {
    /// User-agent default for a tag
    pub fn default_for(tag: &str) -> Self {
        match tag {
            "head" | "title" | "meta" | "link" | "script" | "style" | "template" => Self::None,
            "html" | "body" | "div" | "p" | "section" | "article" | "aside" | "nav"
            | "main" | "header" | "footer" | "form" | "dialog" | "details" | "ul" | "ol"
            | "li" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => Self::Block,
            _ => Self::Inline,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" => Some(Self::None),
            "contents" => Some(Self::Contents),
            "inline" | "inline-block" | "inline-flex" | "inline-grid" => Some(Self::Inline),
            "block" | "flex" | "grid" | "table" | "list-item" => Some(Self::Block),
            _ => None,
        }
    }

    /// Extract the `display` declaration from an inline `style` attribute
    pub fn from_style(style: &str) -> Option<Self> {
        style
            .split(';')
            .filter_map(|decl| decl.split_once(':'))
            .filter(|(prop, _)| prop.trim().eq_ignore_ascii_case("display"))
            .filter_map(|(_, value)| Self::parse(value.trim_end_matches("!important")))
            .last()
    }

    /// Whether an element with this value gets a box of its own
    ///
    /// `contents` renders the children but not the element itself.
    #[inline]
    pub fn generates_box(self) -> bool {
        matches!(self, Self::Block | Self::Inline)
    }

    /// Whether descendants can still be rendered under this value
    #[inline]
    pub fn renders_children(self) -> bool {
        self != Self::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_from_style() {
        assert_eq!(Display::from_style("color: red; display: none"), Some(Display::None));
        assert_eq!(Display::from_style("display:flex"), Some(Display::Block));
        assert_eq!(Display::from_style("display: none; display: block"), Some(Display::Block));
        assert_eq!(Display::from_style("display: none !important"), Some(Display::None));
        assert_eq!(Display::from_style("color: red"), None);
    }

    #[test]
    fn test_contents_has_no_box_of_its_own() {
        assert!(!Display::Contents.generates_box());
        assert!(Display::Contents.renders_children());
        assert!(!Display::None.renders_children());
        assert!(Display::Inline.generates_box());
    }

    #[test]
    fn test_tag_defaults() {
        assert_eq!(Display::default_for("script"), Display::None);
        assert_eq!(Display::default_for("div"), Display::Block);
        assert_eq!(Display::default_for("button"), Display::Inline);
    }

    #[test]
    fn test_set_attr_returns_previous() {
        let mut elem = ElementData::new(InternedString(1), Display::Block);
        assert_eq!(elem.set_attr(InternedString(7), "a".into()), None);
        assert_eq!(elem.set_attr(InternedString(7), "b".into()), Some("a".into()));
        assert_eq!(elem.get_attr(InternedString(7)), Some("b"));
        assert_eq!(elem.remove_attr(InternedString(7)), Some("b".into()));
        assert!(elem.attrs.is_empty());
    }
}
