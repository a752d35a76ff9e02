//! Property capabilities and the default in-memory bag.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::{PropertyKey, PropertyValue};

/// Anything that exposes readable properties.
///
/// `Send + Sync` because property objects (sessions, mostly) are shared
/// across tasks behind an `Arc`.
pub trait PropertyObject: Send + Sync {
    /// Returns the raw stored entry for `key`, if any.
    ///
    /// Most callers want [`PropertyObjectExt::try_get`](crate::PropertyObjectExt::try_get),
    /// which also resolves lazy values and checks the type.
    fn property(&self, key: PropertyKey) -> Option<PropertyValue>;

    /// Runtime capability check for editing.
    ///
    /// Read-only objects keep the default `None`.
    fn as_editable(&self) -> Option<&dyn EditablePropertyObject> {
        None
    }
}

/// The optional write capability.
///
/// Methods take `&self`: implementations use interior mutability, since
/// the owner is usually shared.
pub trait EditablePropertyObject: PropertyObject {
    /// Stores (or replaces) the entry for `key`.
    fn set_property(&self, key: PropertyKey, value: PropertyValue);

    /// Removes the entry for `key`. Returns `true` if one existed.
    fn remove_property(&self, key: PropertyKey) -> bool;
}

/// A thread-safe property map.
///
/// Session implementations usually embed one of these and forward
/// [`PropertyObject`] (and, if they allow editing, [`EditablePropertyObject`])
/// to it.
#[derive(Debug, Default)]
pub struct PropertyBag {
    // Locks are never held across an await or a producer call.
    entries: RwLock<HashMap<PropertyKey, PropertyValue>>,
}

impl PropertyBag {
    /// Creates an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy when constructing a session.
    pub fn with(self, key: PropertyKey, value: PropertyValue) -> Self {
        self.set_property(key, value);
        self
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if the bag holds nothing.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if an entry exists for `key` (of any shape).
    pub fn contains(&self, key: PropertyKey) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&key)
    }
}

impl PropertyObject for PropertyBag {
    fn property(&self, key: PropertyKey) -> Option<PropertyValue> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
    }

    fn as_editable(&self) -> Option<&dyn EditablePropertyObject> {
        Some(self)
    }
}

impl EditablePropertyObject for PropertyBag {
    fn set_property(&self, key: PropertyKey, value: PropertyValue) {
        tracing::trace!(%key, ?value, "property set");
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, value);
    }

    fn remove_property(&self, key: PropertyKey) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key)
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAME: PropertyKey = PropertyKey::from_name("name");

    #[test]
    fn test_set_property_then_property_returns_entry() {
        let bag = PropertyBag::new();
        bag.set_property(NAME, PropertyValue::eager(String::from("x")));
        assert!(bag.property(NAME).is_some());
        assert_eq!(bag.len(), 1);
    }

    #[test]
    fn test_set_property_twice_replaces() {
        let bag = PropertyBag::new()
            .with(NAME, PropertyValue::eager(1u8))
            .with(NAME, PropertyValue::eager(2u8));
        assert_eq!(bag.len(), 1);
    }

    #[test]
    fn test_remove_property_reports_existence() {
        let bag = PropertyBag::new().with(NAME, PropertyValue::eager(1u8));
        assert!(bag.remove_property(NAME));
        assert!(!bag.remove_property(NAME));
        assert!(bag.is_empty());
    }

    #[test]
    fn test_as_editable_is_some_for_bag() {
        let bag = PropertyBag::new();
        assert!(bag.as_editable().is_some());
    }
}
