//! Well-known session metadata stored in the property bag.
//!
//! Every getter resolves eager, producer and async-producer entries the
//! same way (see [`waystone_props::PropertyObjectExt`]). Every setter goes
//! through the editable capability and quietly does nothing on read-only
//! sessions.

use std::future::Future;

use waystone_props::{PropertyObjectExt, PropertyValue};

use crate::{InstanceId, Session, Thumbnail, WorldId};

/// Keys of the well-known session properties.
pub mod keys {
    use waystone_props::PropertyKey;

    /// `bool`: dispose and remove the session once it stops being current.
    pub const DISPOSE_ON_CHANGE: PropertyKey = PropertyKey::from_name("dispose_change");
    /// `String`: display title.
    pub const TITLE: PropertyKey = PropertyKey::from_name("title");
    /// `String`: compact name for lists.
    pub const SHORT_NAME: PropertyKey = PropertyKey::from_name("short_name");
    /// [`Thumbnail`](crate::Thumbnail), usually an async producer.
    pub const THUMBNAIL: PropertyKey = PropertyKey::from_name("thumbnail");
    /// [`InstanceId`](crate::InstanceId).
    pub const INSTANCE: PropertyKey = PropertyKey::from_name("instance");
    /// [`WorldId`](crate::WorldId).
    pub const WORLD: PropertyKey = PropertyKey::from_name("world");
}

/// Metadata accessors for every [`Session`], trait objects included.
pub trait SessionExt: Session {
    /// `false` when unset.
    fn is_dispose_on_change(&self) -> impl Future<Output = bool> + Send {
        let read = self.try_get::<bool>(keys::DISPOSE_ON_CHANGE);
        async move { read.await.unwrap_or(false) }
    }

    fn set_dispose_on_change(&self, value: bool) -> bool {
        self.set_if_editable(keys::DISPOSE_ON_CHANGE, PropertyValue::eager(value))
    }

    /// Empty string when unset.
    fn title(&self) -> impl Future<Output = String> + Send {
        let read = self.get_string(keys::TITLE);
        async move { read.await.unwrap_or_default() }
    }

    fn set_title(&self, title: impl Into<String>) -> bool {
        self.set_if_editable(keys::TITLE, PropertyValue::eager(title.into()))
    }

    fn short_name(&self) -> impl Future<Output = Option<String>> + Send {
        self.get_string(keys::SHORT_NAME)
    }

    fn set_short_name(&self, short_name: impl Into<String>) -> bool {
        self.set_if_editable(keys::SHORT_NAME, PropertyValue::eager(short_name.into()))
    }

    fn thumbnail(&self) -> impl Future<Output = Option<Thumbnail>> + Send {
        self.try_get::<Thumbnail>(keys::THUMBNAIL)
    }

    fn set_thumbnail(&self, thumbnail: Thumbnail) -> bool {
        self.set_if_editable(keys::THUMBNAIL, PropertyValue::eager(thumbnail))
    }

    fn world(&self) -> impl Future<Output = Option<WorldId>> + Send {
        self.try_get::<WorldId>(keys::WORLD)
    }

    fn set_world(&self, world: WorldId) -> bool {
        self.set_if_editable(keys::WORLD, PropertyValue::eager(world))
    }

    fn instance(&self) -> impl Future<Output = Option<InstanceId>> + Send {
        self.try_get::<InstanceId>(keys::INSTANCE)
    }

    fn set_instance(&self, instance: InstanceId) -> bool {
        self.set_if_editable(keys::INSTANCE, PropertyValue::eager(instance))
    }

    /// `true` if the session's dimensions belong to `world`.
    fn matches_world(&self, world: &WorldId) -> bool {
        self.dimensions()
            .and_then(|dimensions| dimensions.world())
            .is_some_and(|own| own == *world)
    }
}

impl<S: Session + ?Sized> SessionExt for S {}
