//! The three shapes a stored property can take.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;

/// A type-erased, shareable property value.
///
/// `Any` lets us store any `'static` type and check what it is at read
/// time. `Send + Sync` because sessions (and their bags) are shared
/// across tokio tasks.
pub type AnyValue = Arc<dyn Any + Send + Sync>;

type Producer = Arc<dyn Fn() -> AnyValue + Send + Sync>;
type AsyncProducer = Arc<dyn Fn() -> BoxFuture<'static, AnyValue> + Send + Sync>;

/// A property entry, stored eagerly or lazily.
///
/// The producer variants are invoked on **every** read; they don't cache.
/// A producer that wants caching should do it itself.
#[derive(Clone)]
pub enum PropertyValue {
    /// Already computed.
    Eager(AnyValue),
    /// Computed synchronously on read.
    Producer(Producer),
    /// Computed asynchronously on read (thumbnails, remote lookups, ...).
    AsyncProducer(AsyncProducer),
}

impl PropertyValue {
    /// Wraps an already computed value.
    pub fn eager<T: Any + Send + Sync>(value: T) -> Self {
        Self::Eager(Arc::new(value))
    }

    /// Wraps a closure that computes the value on each read.
    pub fn producer<T, F>(produce: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::Producer(Arc::new(move || Arc::new(produce()) as AnyValue))
    }

    /// Wraps a closure returning a future that yields the value.
    pub fn async_producer<T, F, Fut>(produce: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        Self::AsyncProducer(Arc::new(move || {
            let fut = produce();
            async move { Arc::new(fut.await) as AnyValue }.boxed()
        }))
    }

    /// Returns `true` if reading this value requires awaiting.
    pub fn is_async(&self) -> bool {
        matches!(self, Self::AsyncProducer(_))
    }

    /// Resolves the value without suspending.
    ///
    /// Returns `None` for async producers: those can only be resolved
    /// with [`resolve`](Self::resolve).
    pub fn resolve_now(&self) -> Option<AnyValue> {
        match self {
            Self::Eager(value) => Some(Arc::clone(value)),
            Self::Producer(produce) => Some(produce()),
            Self::AsyncProducer(_) => None,
        }
    }

    /// Resolves the value, awaiting async producers.
    pub async fn resolve(&self) -> AnyValue {
        match self {
            Self::Eager(value) => Arc::clone(value),
            Self::Producer(produce) => produce(),
            Self::AsyncProducer(produce) => produce().await,
        }
    }
}

impl fmt::Debug for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eager(_) => f.write_str("PropertyValue::Eager(..)"),
            Self::Producer(_) => f.write_str("PropertyValue::Producer(..)"),
            Self::AsyncProducer(_) => f.write_str("PropertyValue::AsyncProducer(..)"),
        }
    }
}
