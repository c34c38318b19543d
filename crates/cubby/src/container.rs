//! The container: registration, hierarchical resolution, teardown.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::entry::{AnyRc, BoxedFactory, RegistryEntry};
use crate::error::{ContainerError, ContainerResult};
use crate::key::ServiceKey;
use crate::lifecycle::Registration;

/// Keys currently being resolved within one top-level resolve call.
///
/// A single trail is created per top-level call and threaded by reference
/// through every nested and parent-delegated lookup that call triggers, so a
/// cycle is caught no matter which containers of the chain it crosses.
#[derive(Default)]
struct ResolutionTrail {
    in_progress: RefCell<HashSet<ServiceKey>>,
}

impl ResolutionTrail {
    /// Record `key` as in progress. Fails if it already is, meaning the
    /// current chain has looped back onto itself.
    fn enter(&self, key: &ServiceKey) -> ContainerResult<TrailGuard<'_>> {
        if !self.in_progress.borrow_mut().insert(key.clone()) {
            return Err(ContainerError::CircularDependency(key.clone()));
        }
        Ok(TrailGuard {
            trail: self,
            key: key.clone(),
        })
    }
}

/// Removes its key from the trail when dropped, so the release happens on
/// success, on error propagation, and on unwind alike.
struct TrailGuard<'t> {
    trail: &'t ResolutionTrail,
    key: ServiceKey,
}

impl Drop for TrailGuard<'_> {
    fn drop(&mut self) {
        self.trail.in_progress.borrow_mut().remove(&self.key);
    }
}

/// Resolution handle passed to factories.
///
/// The handle resolves against the container the factory's entry lives in
/// and shares the calling chain's trail, so dependency lookups made here
/// participate in the same cycle detection as the outer call. The borrow
/// keeps it from outliving the resolve call, and it exposes no registration
/// surface.
pub struct Resolver<'r> {
    container: &'r Container<'r>,
    trail: &'r ResolutionTrail,
}

impl Resolver<'_> {
    /// Resolve an untagged dependency. See [`Container::resolve`].
    pub fn resolve<T: 'static>(&self) -> ContainerResult<Rc<T>> {
        self.container.resolve_key(ServiceKey::of::<T>(), self.trail)
    }

    /// Resolve a tagged dependency. See [`Container::resolve_tagged`].
    pub fn resolve_tagged<T: 'static>(&self, tag: impl Into<String>) -> ContainerResult<Rc<T>> {
        self.container
            .resolve_key(ServiceKey::tagged::<T>(tag), self.trail)
    }
}

/// Hierarchical service container.
///
/// Entries are registered under a `(type, optional tag)` key, as either a
/// ready value or a lazily-invoked factory. Lookups that miss locally fall
/// back to the parent, while the per-call trail spans the whole chain so
/// dependency cycles are detected even across containers. Teardown releases
/// container-owned values in registration order.
///
/// The container is single-threaded (`!Send`, `!Sync`): every operation runs
/// to completion on the calling thread.
pub struct Container<'p> {
    entries: RefCell<IndexMap<ServiceKey, Rc<RegistryEntry>>>,
    parent: Option<&'p Container<'p>>,
    disposed: Cell<bool>,
}

impl Default for Container<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'p> Container<'p> {
    /// Create an empty root container.
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(IndexMap::new()),
            parent: None,
            disposed: Cell::new(false),
        }
    }

    /// Create an empty container that falls back to `parent` for keys it
    /// does not hold. The borrow ties the child to the parent's lifetime, so
    /// a parent cannot be dropped out from under its children.
    pub fn with_parent(parent: &'p Container<'p>) -> Self {
        Self {
            entries: RefCell::new(IndexMap::new()),
            parent: Some(parent),
            disposed: Cell::new(false),
        }
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Register an already-built value under the untagged key for `T`.
    ///
    /// Fails with [`ContainerError::ServiceAlreadyRegistered`] if the key is
    /// taken. The returned [`Registration`] can mark the value as
    /// container-owned for teardown.
    pub fn register_instance<T: 'static>(&self, value: T) -> ContainerResult<Registration<T>> {
        self.insert_entry(ServiceKey::of::<T>(), RegistryEntry::instance(Rc::new(value)))
    }

    /// Register an already-built value under a tagged key for `T`.
    pub fn register_instance_tagged<T: 'static>(
        &self,
        tag: impl Into<String>,
        value: T,
    ) -> ContainerResult<Registration<T>> {
        self.insert_entry(
            ServiceKey::tagged::<T>(tag),
            RegistryEntry::instance(Rc::new(value)),
        )
    }

    /// Register a factory under the untagged key for `T`.
    ///
    /// Nothing runs at registration time. The factory is invoked on the
    /// first resolve of the key, receives a [`Resolver`] for looking up its
    /// own dependencies, and its value is cached for every later resolve.
    ///
    /// # Example
    ///
    /// ```rust
    /// use cubby::{Container, Resolver};
    ///
    /// struct Greeting(String);
    ///
    /// # fn main() -> cubby::ContainerResult<()> {
    /// let container = Container::new();
    /// container.register_instance(String::from("world"))?;
    /// container.register_factory(|resolver: &Resolver| {
    ///     let name = resolver.resolve::<String>()?;
    ///     Ok(Greeting(format!("hello, {}", name)))
    /// })?;
    ///
    /// assert_eq!(container.resolve::<Greeting>()?.0, "hello, world");
    /// # Ok(())
    /// # }
    /// ```
    pub fn register_factory<T, F>(&self, factory: F) -> ContainerResult<Registration<T>>
    where
        T: 'static,
        F: Fn(&Resolver<'_>) -> ContainerResult<T> + 'static,
    {
        self.insert_entry(
            ServiceKey::of::<T>(),
            RegistryEntry::factory(erase_factory(factory)),
        )
    }

    /// Register a factory under a tagged key for `T`.
    pub fn register_factory_tagged<T, F>(
        &self,
        tag: impl Into<String>,
        factory: F,
    ) -> ContainerResult<Registration<T>>
    where
        T: 'static,
        F: Fn(&Resolver<'_>) -> ContainerResult<T> + 'static,
    {
        self.insert_entry(
            ServiceKey::tagged::<T>(tag),
            RegistryEntry::factory(erase_factory(factory)),
        )
    }

    fn insert_entry<T>(
        &self,
        key: ServiceKey,
        entry: RegistryEntry,
    ) -> ContainerResult<Registration<T>> {
        if self.disposed.get() {
            return Err(ContainerError::Disposed);
        }
        let mut entries = self.entries.borrow_mut();
        if entries.contains_key(&key) {
            return Err(ContainerError::ServiceAlreadyRegistered(key));
        }
        let entry = Rc::new(entry);
        debug!("Registered {}: {}", entry.kind(), key);
        entries.insert(key, Rc::clone(&entry));
        Ok(Registration::new(entry))
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    /// Resolve the untagged key for `T`, searching this container first and
    /// then the parent chain.
    ///
    /// Factories triggered along the way run synchronously, depth-first,
    /// before this call returns.
    pub fn resolve<T: 'static>(&self) -> ContainerResult<Rc<T>> {
        let trail = ResolutionTrail::default();
        self.resolve_key(ServiceKey::of::<T>(), &trail)
    }

    /// Resolve a tagged key for `T`. See [`Container::resolve`].
    pub fn resolve_tagged<T: 'static>(&self, tag: impl Into<String>) -> ContainerResult<Rc<T>> {
        let trail = ResolutionTrail::default();
        self.resolve_key(ServiceKey::tagged::<T>(tag), &trail)
    }

    fn resolve_key<T: 'static>(
        &self,
        key: ServiceKey,
        trail: &ResolutionTrail,
    ) -> ContainerResult<Rc<T>> {
        let value = self.resolve_erased(&key, trail)?;
        value
            .downcast::<T>()
            .map_err(|_| ContainerError::TypeMismatch(key))
    }

    /// Start resolving `key`: mark it in flight, then walk the chain. The
    /// mark is held until the walk finishes, factory execution included, so
    /// any nested request for the same key fails as a cycle no matter which
    /// container of the chain makes it. Delegating an unresolved key to the
    /// parent is part of the same walk and does not re-mark it.
    fn resolve_erased(&self, key: &ServiceKey, trail: &ResolutionTrail) -> ContainerResult<AnyRc> {
        let _guard = trail.enter(key)?;
        self.lookup_chain(key, trail)
    }

    /// Look `key` up here, falling back to the parent chain on a local miss.
    fn lookup_chain(&self, key: &ServiceKey, trail: &ResolutionTrail) -> ContainerResult<AnyRc> {
        if self.disposed.get() {
            return Err(ContainerError::Disposed);
        }
        // Clone the entry out so no map borrow is held while a factory runs.
        let entry = self.entries.borrow().get(key).map(Rc::clone);
        match entry {
            Some(entry) => {
                let resolver = Resolver {
                    container: self,
                    trail,
                };
                entry.resolve(key, &resolver)
            }
            None => match self.parent {
                Some(parent) => parent.lookup_chain(key, trail),
                None => Err(ContainerError::ServiceNotRegistered(key.clone())),
            },
        }
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Whether resolving the untagged key for `T` would find an entry, here
    /// or anywhere up the parent chain.
    pub fn is_registered<T: 'static>(&self) -> bool {
        self.chain_has(&ServiceKey::of::<T>())
    }

    /// Tagged variant of [`is_registered`](Container::is_registered).
    pub fn is_registered_tagged<T: 'static>(&self, tag: impl Into<String>) -> bool {
        self.chain_has(&ServiceKey::tagged::<T>(tag))
    }

    /// Number of entries registered in this container alone; the parent
    /// chain is not counted.
    pub fn service_count(&self) -> usize {
        self.entries.borrow().len()
    }

    fn chain_has(&self, key: &ServiceKey) -> bool {
        if self.entries.borrow().contains_key(key) {
            return true;
        }
        self.parent.map_or(false, |parent| parent.chain_has(key))
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    /// Release every container-owned value that was actually built, in
    /// registration order, then refuse further registration and resolution.
    ///
    /// Entries stay in the map for inspection, unresolved factories are
    /// never invoked, and the parent is never touched. A second call is a
    /// no-op. Dropping the container runs this automatically if it has not
    /// run yet.
    pub fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        let entries: Vec<Rc<RegistryEntry>> =
            self.entries.borrow().values().map(Rc::clone).collect();
        let mut released = 0usize;
        for entry in entries {
            if entry.release_owned() {
                released += 1;
            }
        }
        info!("Disposed container: released {} owned values", released);
    }
}

impl Drop for Container<'_> {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn erase_factory<T, F>(factory: F) -> BoxedFactory
where
    T: 'static,
    F: Fn(&Resolver<'_>) -> ContainerResult<T> + 'static,
{
    Box::new(move |resolver: &Resolver<'_>| {
        let value = factory(resolver)?;
        Ok(Rc::new(value) as AnyRc)
    })
}
