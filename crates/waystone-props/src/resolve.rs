//! Typed reads over any [`PropertyObject`].
//!
//! Resolution rule for a stored entry:
//!
//! 1. eager values are used as-is
//! 2. producers are invoked
//! 3. async producers are awaited
//!
//! The resolved value is then downcast to the requested `T`. A stored
//! `Option<T>` is accepted too (and flattened), so a producer can say
//! "nothing right now" without the key disappearing.

use std::any::Any;
use std::future::Future;
use std::sync::Arc;

use crate::{AnyValue, PropertyKey, PropertyObject, PropertyValue};

/// Typed read helpers, available on every [`PropertyObject`] (including
/// trait objects like `dyn Session`).
pub trait PropertyObjectExt: PropertyObject {
    /// Resolves `key` and returns it as a `T`.
    ///
    /// `None` if the key is absent, the resolved value has another type,
    /// or it's a stored `Option<T>` that is `None`.
    fn try_get<T>(&self, key: PropertyKey) -> impl Future<Output = Option<T>> + Send
    where
        T: Any + Clone + Send + Sync,
    {
        let entry = self.property(key);
        async move {
            let resolved = entry?.resolve().await;
            downcast::<T>(&resolved)
        }
    }

    /// Like [`try_get`](Self::try_get) but never suspends: async
    /// producers read as `None`.
    fn try_get_now<T>(&self, key: PropertyKey) -> Option<T>
    where
        T: Any + Clone + Send + Sync,
    {
        let resolved = self.property(key)?.resolve_now()?;
        downcast::<T>(&resolved)
    }

    /// Resolves `key` and converts it to a string on a best-effort basis.
    ///
    /// Strings come back unchanged; numbers, booleans and chars are
    /// formatted; anything else is `None`.
    fn get_string(&self, key: PropertyKey) -> impl Future<Output = Option<String>> + Send {
        let entry = self.property(key);
        async move {
            let resolved = entry?.resolve().await;
            display_any(&resolved)
        }
    }

    /// Returns `true` if an entry exists for `key`.
    fn has_property(&self, key: PropertyKey) -> bool {
        self.property(key).is_some()
    }

    /// Writes through the editable capability, if there is one.
    ///
    /// Returns `false` (and writes nothing) on read-only objects.
    fn set_if_editable(&self, key: PropertyKey, value: PropertyValue) -> bool {
        match self.as_editable() {
            Some(editable) => {
                editable.set_property(key, value);
                true
            }
            None => {
                tracing::debug!(%key, "write ignored: object is read-only");
                false
            }
        }
    }
}

impl<P: PropertyObject + ?Sized> PropertyObjectExt for P {}

fn downcast<T: Any + Clone>(value: &AnyValue) -> Option<T> {
    if let Some(direct) = (**value).downcast_ref::<T>() {
        return Some(direct.clone());
    }
    (**value).downcast_ref::<Option<T>>().cloned().flatten()
}

/// Formats a resolved value if it's one of the common scalar types.
pub fn display_any(value: &AnyValue) -> Option<String> {
    let value: &(dyn Any + Send + Sync) = &**value;

    // Macro keeps the long chain of "try this type, then that type" short.
    macro_rules! try_display {
        ($($ty:ty),* $(,)?) => {
            $(
                if let Some(v) = value.downcast_ref::<$ty>() {
                    return Some(v.to_string());
                }
                if let Some(v) = value.downcast_ref::<Option<$ty>>() {
                    return v.as_ref().map(|v| v.to_string());
                }
            )*
        };
    }

    try_display!(
        String, &'static str, Arc<str>, bool, char,
        i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64,
    );
    None
}
