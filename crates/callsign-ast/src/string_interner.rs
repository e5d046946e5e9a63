//! Shared string interner for identifier and literal text.
//!
//! Every tree holds an `Arc<StringInterner>`, so node payloads are compact
//! `StringId` handles and name comparisons are integer comparisons. The
//! interner is append-only; interned strings live for the lifetime of the
//! interner and are handed out as `Arc<str>`.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Handle to an interned string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StringId(u32);

#[derive(Default)]
struct Inner {
    strings: Vec<Arc<str>>,
    ids: FxHashMap<Arc<str>, StringId>,
}

/// Thread-safe, append-only string interner.
pub struct StringInterner {
    inner: RwLock<Inner>,
}

impl StringInterner {
    pub fn new() -> Self {
        StringInterner {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Interns `text`, returning the existing id when it was seen before.
    pub fn get_or_intern(&self, text: &str) -> StringId {
        {
            let inner = self.inner.read();
            if let Some(&id) = inner.ids.get(text) {
                return id;
            }
        }
        let mut inner = self.inner.write();
        if let Some(&id) = inner.ids.get(text) {
            return id;
        }
        let id = StringId(inner.strings.len() as u32);
        let stored: Arc<str> = Arc::from(text);
        inner.strings.push(Arc::clone(&stored));
        inner.ids.insert(stored, id);
        id
    }

    /// Looks up `text` without interning it.
    pub fn get(&self, text: &str) -> Option<StringId> {
        self.inner.read().ids.get(text).copied()
    }

    /// Returns the text behind `id`.
    ///
    /// Ids are only minted by `get_or_intern`, so any id resolved against
    /// the interner that produced it is valid.
    pub fn resolve(&self, id: StringId) -> Arc<str> {
        Arc::clone(&self.inner.read().strings[id.0 as usize])
    }

    pub fn len(&self) -> usize {
        self.inner.read().strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        StringInterner::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_idempotent() {
        let interner = StringInterner::new();
        let a = interner.get_or_intern("arguments");
        let b = interner.get_or_intern("arguments");
        assert_eq!(a, b);
        assert_eq!(interner.len(), 1);
    }

    #[test]
    fn distinct_strings_get_distinct_ids() {
        let interner = StringInterner::new();
        let a = interner.get_or_intern("a");
        let b = interner.get_or_intern("b");
        assert_ne!(a, b);
        assert_eq!(&*interner.resolve(a), "a");
        assert_eq!(&*interner.resolve(b), "b");
    }

    #[test]
    fn get_does_not_intern() {
        let interner = StringInterner::new();
        assert!(interner.get("missing").is_none());
        let id = interner.get_or_intern("present");
        assert_eq!(interner.get("present"), Some(id));
    }
}
