//! Canonical identity: content hashes and the process-wide intern table.
//!
//! Two values with the same content hash are the same value. Algebras and
//! gradings are built through [`intern`], so equal canonical data always
//! yields the same shared allocation, and the caches hung off it are
//! shared too.

use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Content-addressed identity of an algebra or a grading.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl ContentHash {
    /// A builder for incrementally computing content hashes.
    pub fn builder() -> ContentHashBuilder {
        ContentHashBuilder {
            hasher: Sha256::new(),
        }
    }

    /// First twelve hex digits, for logs.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Incremental content hash builder.
///
/// Feeds fields in a stable order to produce a deterministic hash.
pub struct ContentHashBuilder {
    hasher: Sha256,
}

impl ContentHashBuilder {
    /// Feed a string field into the hash.
    pub fn field(mut self, name: &str, value: &str) -> Self {
        self.hasher.update(name.as_bytes());
        self.hasher.update(b":");
        self.hasher.update(value.as_bytes());
        self.hasher.update(b"\n");
        self
    }

    /// Feed a boolean field into the hash.
    pub fn field_bool(self, name: &str, value: bool) -> Self {
        self.field(name, if value { "true" } else { "false" })
    }

    /// Feed a list of displayable items, joined by commas.
    pub fn field_list<T: fmt::Display>(self, name: &str, items: &[T]) -> Self {
        let joined: Vec<String> = items.iter().map(|x| x.to_string()).collect();
        self.field(name, &joined.join(","))
    }

    /// Finalize and produce the content hash.
    pub fn finish(self) -> ContentHash {
        let hash = self.hasher.finalize();
        ContentHash(format!("{hash:x}"))
    }
}

type Registry = BTreeMap<(TypeId, ContentHash), Arc<dyn Any + Send + Sync>>;

static REGISTRY: Mutex<Registry> = Mutex::new(BTreeMap::new());

/// Return the shared value registered under `key`, registering `value` if
/// none exists yet. Entries live for the rest of the process.
pub fn intern<T: Any + Send + Sync>(key: &ContentHash, value: T) -> Arc<T> {
    let slot = (TypeId::of::<T>(), key.clone());
    let mut registry = REGISTRY.lock();
    if let Some(shared) = registry
        .get(&slot)
        .and_then(|existing| Arc::clone(existing).downcast::<T>().ok())
    {
        return shared;
    }
    let shared = Arc::new(value);
    registry.insert(slot, Arc::clone(&shared) as Arc<dyn Any + Send + Sync>);
    shared
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_is_deterministic_and_field_sensitive() {
        let a = ContentHash::builder().field("name", "L3_2").field("dim", "3").finish();
        let b = ContentHash::builder().field("name", "L3_2").field("dim", "3").finish();
        let c = ContentHash::builder().field("name", "L3_2").field("dim", "4").finish();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.0.len(), 64);
    }

    #[test]
    fn interning_returns_the_first_registration() {
        let key = ContentHash::builder().field("test", "interning").finish();
        let first = intern(&key, String::from("first"));
        let second = intern(&key, String::from("second"));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.as_str(), "first");
    }

    #[test]
    fn interning_separates_types() {
        let key = ContentHash::builder().field("test", "types").finish();
        let text = intern(&key, String::from("x"));
        let number = intern(&key, 7u32);
        assert_eq!(text.as_str(), "x");
        assert_eq!(*number, 7);
    }
}
