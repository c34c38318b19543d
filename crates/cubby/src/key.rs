//! Typed registration keys.
//!
//! A service is identified by its Rust type plus an optional string tag, so
//! the same type can be registered more than once under different tags.

use std::any::TypeId;
use std::fmt;

/// Identity of a registered service: a concrete type plus an optional tag.
///
/// Keys are formed from a compile-time type parameter, never from runtime
/// type inspection. Two keys are equal only when both the type and the tag
/// match; an untagged key is distinct from every tagged one, including the
/// empty-string tag. Keys are immutable once formed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceKey {
    type_id: TypeId,
    type_name: &'static str,
    tag: Option<String>,
}

impl ServiceKey {
    /// Key for an untagged registration of `T`.
    pub fn of<T: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            tag: None,
        }
    }

    /// Key for a registration of `T` under `tag`.
    pub fn tagged<T: 'static>(tag: impl Into<String>) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            tag: Some(tag.into()),
        }
    }

    /// Human-readable name of the keyed type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The tag this key was formed with, if any.
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tag {
            Some(tag) => write!(f, "{} (tag: {})", self.type_name, tag),
            None => write!(f, "{}", self.type_name),
        }
    }
}
