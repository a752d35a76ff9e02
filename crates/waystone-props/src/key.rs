//! Opaque property keys derived from string names.

use std::fmt;

/// 64-bit FNV-1a offset basis.
const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
/// 64-bit FNV-1a prime.
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// An opaque token identifying one property in a bag.
///
/// Keys are hashed from a string name, so two subsystems that pick
/// different names (or different namespaces) never collide, and nobody
/// has to coordinate a central list of key ids.
///
/// `from_name` is a `const fn`, which lets well-known keys live in
/// `const` items:
///
/// ```rust
/// use waystone_props::PropertyKey;
///
/// const TITLE: PropertyKey = PropertyKey::from_name("title");
/// assert_eq!(TITLE, PropertyKey::from_name("title"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyKey(u64);

impl PropertyKey {
    /// Derives a key from a plain name.
    pub const fn from_name(name: &str) -> Self {
        Self(fnv1a(FNV_OFFSET, name.as_bytes()))
    }

    /// Derives a key from `namespace` and `name`.
    ///
    /// Equivalent to `from_name("{namespace}:{name}")`, without the
    /// intermediate allocation.
    pub const fn namespaced(namespace: &str, name: &str) -> Self {
        let hash = fnv1a(FNV_OFFSET, namespace.as_bytes());
        let hash = fnv1a(hash, b":");
        Self(fnv1a(hash, name.as_bytes()))
    }

    /// Returns the raw token. Only useful for logging.
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "K-{:016x}", self.0)
    }
}

// `while` instead of an iterator because iterators aren't usable in
// `const fn` yet.
const fn fnv1a(mut hash: u64, bytes: &[u8]) -> u64 {
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_same_name_same_key() {
        assert_eq!(PropertyKey::from_name("title"), PropertyKey::from_name("title"));
    }

    #[test]
    fn test_from_name_different_names_differ() {
        assert_ne!(
            PropertyKey::from_name("title"),
            PropertyKey::from_name("short_name")
        );
    }

    #[test]
    fn test_namespaced_matches_joined_name() {
        assert_eq!(
            PropertyKey::namespaced("sessions", "title"),
            PropertyKey::from_name("sessions:title")
        );
    }

    #[test]
    fn test_namespaced_separates_namespaces() {
        assert_ne!(
            PropertyKey::namespaced("audio", "volume"),
            PropertyKey::namespaced("video", "volume")
        );
    }

    #[test]
    fn test_from_name_empty_is_offset_basis() {
        assert_eq!(PropertyKey::from_name("").raw(), FNV_OFFSET);
    }

    #[test]
    fn test_display_is_hex() {
        let key = PropertyKey::from_name("");
        assert_eq!(key.to_string(), "K-cbf29ce484222325");
    }
}
