//! String Interner
//!
//! Tag names and attribute names are stored once and referenced by a
//! 4-byte id. Element lookups compare ids instead of strings.

use std::collections::HashMap;

/// Interned string ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct InternedString(pub u32);

impl InternedString {
    /// Empty string
    pub const EMPTY: InternedString = InternedString(0);
}

#[derive(Debug, Clone, Copy)]
struct StringEntry {
    offset: u32,
    len: u32,
}

/// String interner backed by a single contiguous buffer
#[derive(Debug)]
pub struct StringInterner {
    buffer: String,
    map: HashMap<Box<str>, u32>,
    entries: Vec<StringEntry>,
}

impl StringInterner {
    /// Create an interner with the names the accessibility layer queries
    /// most often already present
    pub fn new() -> Self {
        let mut interner = Self {
            buffer: String::with_capacity(1024),
            map: HashMap::with_capacity(128),
            entries: Vec::with_capacity(128),
        };

        interner.intern("");

        const COMMON_TAGS: &[&str] = &[
            "html", "head", "body", "title", "div", "span", "p", "a", "img",
            "button", "input", "select", "textarea", "label", "form",
            "details", "summary", "dialog", "nav", "main", "section",
            "h1", "h2", "h3", "h4", "h5", "h6",
        ];

        const COMMON_ATTRS: &[&str] = &[
            "id", "class", "style", "href", "alt", "title", "type", "for",
            "disabled", "hidden", "tabindex", "contenteditable", "role",
            "aria-label", "aria-labelledby", "aria-live", "aria-atomic", "lang",
        ];

        for s in COMMON_TAGS.iter().chain(COMMON_ATTRS) {
            interner.intern(s);
        }

        interner
    }

    /// Intern a string, returning the existing id if already present
    pub fn intern(&mut self, s: &str) -> InternedString {
        if let Some(&index) = self.map.get(s) {
            return InternedString(index);
        }

        let index = self.entries.len() as u32;
        let offset = self.buffer.len() as u32;
        self.buffer.push_str(s);
        self.entries.push(StringEntry { offset, len: s.len() as u32 });
        self.map.insert(s.into(), index);

        InternedString(index)
    }

    /// Look up a string without interning it
    pub fn lookup(&self, s: &str) -> Option<InternedString> {
        self.map.get(s).map(|&index| InternedString(index))
    }

    /// Resolve an id back to its string
    #[inline]
    pub fn get(&self, id: InternedString) -> &str {
        match self.entries.get(id.0 as usize) {
            Some(entry) => {
                let start = entry.offset as usize;
                &self.buffer[start..start + entry.len as usize]
            }
            None => "",
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_dedup() {
        let mut interner = StringInterner::new();
        let id1 = interner.intern("knowledge-card");
        let id2 = interner.intern("knowledge-card");
        assert_eq!(id1, id2);
        assert_eq!(interner.get(id1), "knowledge-card");
    }

    #[test]
    fn test_lookup_does_not_intern() {
        let interner = StringInterner::new();
        let before = interner.len();
        assert!(interner.lookup("data-never-seen").is_none());
        assert!(interner.lookup("tabindex").is_some());
        assert_eq!(interner.len(), before);
    }
}
