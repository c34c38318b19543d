//! Registry entries: the two producer shapes a container can hold.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::debug;

use crate::container::Resolver;
use crate::error::{ContainerError, ContainerResult};
use crate::key::ServiceKey;

/// Shared handle to a type-erased service value.
pub(crate) type AnyRc = Rc<dyn Any>;

/// Boxed constructor stored by a factory entry.
pub(crate) type BoxedFactory = Box<dyn Fn(&Resolver<'_>) -> ContainerResult<AnyRc>>;

/// Type-erased teardown callback, installed when a registration is marked
/// container-owned.
pub(crate) type BoxedDisposer = Box<dyn Fn(&AnyRc)>;

/// A registered producer: either a value built ahead of time, or a factory
/// that builds and caches one on first resolution.
pub(crate) enum RegistryEntry {
    Instance(InstanceEntry),
    Factory(FactoryEntry),
}

pub(crate) struct InstanceEntry {
    value: AnyRc,
    disposer: RefCell<Option<BoxedDisposer>>,
}

pub(crate) struct FactoryEntry {
    produce: BoxedFactory,
    cached: RefCell<Option<AnyRc>>,
    building: Cell<bool>,
    disposer: RefCell<Option<BoxedDisposer>>,
}

impl RegistryEntry {
    pub(crate) fn instance(value: AnyRc) -> Self {
        RegistryEntry::Instance(InstanceEntry {
            value,
            disposer: RefCell::new(None),
        })
    }

    pub(crate) fn factory(produce: BoxedFactory) -> Self {
        RegistryEntry::Factory(FactoryEntry {
            produce,
            cached: RefCell::new(None),
            building: Cell::new(false),
            disposer: RefCell::new(None),
        })
    }

    /// Short label for log lines.
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            RegistryEntry::Instance(_) => "instance",
            RegistryEntry::Factory(_) => "factory",
        }
    }

    /// Produce the entry's value: stored directly for instances, built and
    /// cached on first use for factories.
    pub(crate) fn resolve(
        &self,
        key: &ServiceKey,
        resolver: &Resolver<'_>,
    ) -> ContainerResult<AnyRc> {
        match self {
            RegistryEntry::Instance(entry) => Ok(Rc::clone(&entry.value)),
            RegistryEntry::Factory(entry) => entry.resolve(key, resolver),
        }
    }

    /// Install the teardown callback that marks this registration as
    /// container-owned.
    pub(crate) fn set_disposer(&self, disposer: BoxedDisposer) {
        let slot = match self {
            RegistryEntry::Instance(entry) => &entry.disposer,
            RegistryEntry::Factory(entry) => &entry.disposer,
        };
        *slot.borrow_mut() = Some(disposer);
    }

    /// Run the disposer against the built value, if both exist. The disposer
    /// is taken out of the entry first, so it runs at most once. Returns
    /// whether a value was released.
    pub(crate) fn release_owned(&self) -> bool {
        let (slot, value) = match self {
            RegistryEntry::Instance(entry) => (&entry.disposer, Some(Rc::clone(&entry.value))),
            RegistryEntry::Factory(entry) => (&entry.disposer, entry.cached.borrow().clone()),
        };
        if let Some(value) = value {
            if let Some(disposer) = slot.borrow_mut().take() {
                disposer(&value);
                return true;
            }
        }
        false
    }
}

/// Clears the in-flight flag when dropped, so a build that errors or
/// unwinds leaves the entry ready to retry.
struct BuildGuard<'e> {
    flag: &'e Cell<bool>,
}

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

impl FactoryEntry {
    fn resolve(&self, key: &ServiceKey, resolver: &Resolver<'_>) -> ContainerResult<AnyRc> {
        if let Some(cached) = self.cached.borrow().as_ref() {
            return Ok(Rc::clone(cached));
        }

        // Re-entering while a build is in flight is a cycle. The per-call
        // trail reports most of these first, at the key level.
        if self.building.replace(true) {
            return Err(ContainerError::CircularDependency(key.clone()));
        }
        let _building = BuildGuard {
            flag: &self.building,
        };

        // A failed build is not cached; the next resolve starts over.
        let value = (self.produce)(resolver)?;
        *self.cached.borrow_mut() = Some(Rc::clone(&value));
        debug!("Built service: {}", key);
        Ok(value)
    }
}
