//! Container error types.

use thiserror::Error;

use crate::key::ServiceKey;

/// Errors that can occur during container operations.
///
/// Every error surfaces directly to the caller of the public operation that
/// triggered it; the container never retries or falls back internally.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// The key already has an entry in this container; registration is
    /// append-only per key.
    #[error("Service already registered: {0}")]
    ServiceAlreadyRegistered(ServiceKey),

    /// The key was found neither locally nor anywhere up the parent chain.
    #[error("Service not registered: {0}")]
    ServiceNotRegistered(ServiceKey),

    /// The key was requested again while already being resolved somewhere
    /// along the current resolution chain, parent delegation included.
    #[error("Circular dependency detected: {0}")]
    CircularDependency(ServiceKey),

    /// A factory failed while building its value. The entry stays unbuilt,
    /// so the next resolve runs the factory again.
    #[error("Factory failed: {0}")]
    FactoryFailure(#[from] anyhow::Error),

    /// The container was already disposed.
    #[error("Container has been disposed")]
    Disposed,

    /// A resolved value did not downcast to the requested type. Keys embed
    /// the type identity, so this is unreachable through the typed API.
    #[error("Type mismatch for service: {0}")]
    TypeMismatch(ServiceKey),
}

/// Result alias for container operations.
pub type ContainerResult<T> = Result<T, ContainerError>;
