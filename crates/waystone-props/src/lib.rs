//! Extensible property store for Waystone.
//!
//! A property bag maps opaque [`PropertyKey`]s to [`PropertyValue`]s. A
//! value can be stored in one of three shapes:
//!
//! - **eager**: already computed, returned as-is
//! - **producer**: a closure invoked on every read
//! - **async producer**: a closure returning a future, awaited on every read
//!
//! Readers never care which shape was stored: [`PropertyObjectExt`]
//! resolves all three transparently and downcasts to the requested type.
//!
//! # Capabilities
//!
//! ```text
//! PropertyObject           ← read-only: anyone can look up a key
//!     ↑
//! EditablePropertyObject   ← optional: set/remove entries
//! ```
//!
//! Writers must go through [`EditablePropertyObject`]. Objects that don't
//! offer it are read-only, and that's a valid variant, not an error.

mod key;
mod object;
mod resolve;
mod value;

pub use key::PropertyKey;
pub use object::{EditablePropertyObject, PropertyBag, PropertyObject};
pub use resolve::{PropertyObjectExt, display_any};
pub use value::{AnyValue, PropertyValue};
