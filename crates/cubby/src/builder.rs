//! Chainable construction of pre-populated containers.

use crate::container::{Container, Resolver};
use crate::error::ContainerResult;

/// Builder that collects registrations and hands back the finished
/// [`Container`].
///
/// Each step returns `ContainerResult<Self>` so a conflicting registration
/// stops the chain at the point it happens.
///
/// # Example
///
/// ```rust
/// use cubby::{ContainerBuilder, Resolver};
///
/// # fn main() -> cubby::ContainerResult<()> {
/// let container = ContainerBuilder::new()
///     .with_instance(8080u16)?
///     .with_factory(|resolver: &Resolver| {
///         let port = resolver.resolve::<u16>()?;
///         Ok(format!("127.0.0.1:{}", port))
///     })?
///     .build();
///
/// assert_eq!(*container.resolve::<String>()?, "127.0.0.1:8080");
/// # Ok(())
/// # }
/// ```
pub struct ContainerBuilder<'p> {
    container: Container<'p>,
}

impl<'p> ContainerBuilder<'p> {
    /// Start from an empty root container.
    pub fn new() -> Self {
        Self {
            container: Container::new(),
        }
    }

    /// Start from an empty container that delegates misses to `parent`.
    pub fn with_parent(parent: &'p Container<'p>) -> Self {
        Self {
            container: Container::with_parent(parent),
        }
    }

    /// Add an already-built value under the untagged key for `T`.
    pub fn with_instance<T: 'static>(self, value: T) -> ContainerResult<Self> {
        self.container.register_instance(value)?;
        Ok(self)
    }

    /// Add an already-built value under a tagged key for `T`.
    pub fn with_instance_tagged<T: 'static>(
        self,
        tag: impl Into<String>,
        value: T,
    ) -> ContainerResult<Self> {
        self.container.register_instance_tagged(tag, value)?;
        Ok(self)
    }

    /// Add a lazy factory under the untagged key for `T`.
    pub fn with_factory<T, F>(self, factory: F) -> ContainerResult<Self>
    where
        T: 'static,
        F: Fn(&Resolver<'_>) -> ContainerResult<T> + 'static,
    {
        self.container.register_factory(factory)?;
        Ok(self)
    }

    /// Add a lazy factory under a tagged key for `T`.
    pub fn with_factory_tagged<T, F>(
        self,
        tag: impl Into<String>,
        factory: F,
    ) -> ContainerResult<Self>
    where
        T: 'static,
        F: Fn(&Resolver<'_>) -> ContainerResult<T> + 'static,
    {
        self.container.register_factory_tagged(tag, factory)?;
        Ok(self)
    }

    /// Finish and return the populated container.
    pub fn build(self) -> Container<'p> {
        self.container
    }
}

impl Default for ContainerBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}
