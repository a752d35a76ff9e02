//! Session factories ("session registers").

use std::fmt;
use std::sync::Arc;

use waystone_session::SessionRef;

/// Free-form constructor parameters, keyed by name.
pub type Options = serde_json::Map<String, serde_json::Value>;

/// Builds sessions of the kinds it recognises.
///
/// Factories let the registry create sessions without knowing their
/// concrete types: a "local" factory and a "remote" factory can both be
/// registered, and the name passed to
/// [`SessionRegistry::try_make`](crate::SessionRegistry::try_make) picks
/// between them.
///
/// Implementations must not touch the registry. Returning the session is
/// enough: the registry adds it.
///
/// # Example
///
/// ```rust,ignore
/// struct LocalFactory;
///
/// impl SessionFactory for LocalFactory {
///     fn name(&self) -> &str {
///         "local"
///     }
///
///     fn try_make_session(&self, name: &str, options: &Options) -> Option<SessionRef> {
///         if name != "local" {
///             return None;
///         }
///         Some(LocalSession::new(options))
///     }
/// }
/// ```
pub trait SessionFactory: Send + Sync + 'static {
    /// Label used in logs and event records.
    fn name(&self) -> &str;

    /// Builds a session for `name`, or returns `None` if this factory
    /// doesn't handle that name.
    fn try_make_session(&self, name: &str, options: &Options) -> Option<SessionRef>;
}

pub type FactoryRef = Arc<dyn SessionFactory>;

impl fmt::Debug for dyn SessionFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionFactory")
            .field("name", &self.name())
            .finish()
    }
}

/// Factories are compared by identity (same allocation), not by name.
pub(crate) fn same_factory(a: &FactoryRef, b: &FactoryRef) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
