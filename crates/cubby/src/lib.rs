//! Hierarchical service container for wiring an application together.
//!
//! Values are registered against a `(type, optional tag)` key, either as a
//! ready instance or as a lazy factory that builds on first resolve and
//! caches. Containers chain into scopes: a lookup that misses locally falls
//! back to the parent, and dependency cycles are caught per call even when
//! they cross containers. Teardown releases the values a container was
//! marked as owning, in registration order.
//!
//! The container is single-threaded. `Rc` and `RefCell` in the internals
//! make it `!Send` and `!Sync`, so sharing one across threads is a compile
//! error rather than a runtime hazard.
//!
//! # Quick start
//!
//! ```rust
//! use cubby::{Container, Resolver};
//!
//! struct Config {
//!     retries: u32,
//! }
//!
//! struct Client {
//!     retries: u32,
//! }
//!
//! fn main() -> cubby::ContainerResult<()> {
//!     let container = Container::new();
//!     container.register_instance(Config { retries: 3 })?;
//!     container.register_factory(|resolver: &Resolver| {
//!         let config = resolver.resolve::<Config>()?;
//!         Ok(Client {
//!             retries: config.retries,
//!         })
//!     })?;
//!
//!     let client = container.resolve::<Client>()?;
//!     assert_eq!(client.retries, 3);
//!     Ok(())
//! }
//! ```
//!
//! # Scopes
//!
//! ```rust
//! use cubby::{Container, Dispose};
//!
//! struct Session(&'static str);
//!
//! impl Dispose for Session {
//!     fn dispose(&self) {}
//! }
//!
//! # fn main() -> cubby::ContainerResult<()> {
//! let app = Container::new();
//! app.register_instance(String::from("shared config"))?;
//!
//! let request = Container::with_parent(&app);
//! request.register_instance(Session("req-1"))?.owned();
//!
//! // The scope sees its own entries and everything the app registered.
//! assert_eq!(request.resolve::<Session>()?.0, "req-1");
//! assert_eq!(*request.resolve::<String>()?, "shared config");
//!
//! // Tearing down the scope releases only what it owns.
//! request.dispose();
//! assert!(app.resolve::<String>().is_ok());
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod container;
pub mod error;
pub mod key;
pub mod lifecycle;

mod entry;

pub use builder::ContainerBuilder;
pub use container::{Container, Resolver};
pub use error::{ContainerError, ContainerResult};
pub use key::ServiceKey;
pub use lifecycle::{Dispose, Registration};
