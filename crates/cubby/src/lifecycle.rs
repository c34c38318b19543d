//! Teardown hooks for container-owned values.

use std::marker::PhantomData;
use std::rc::Rc;

use crate::entry::{AnyRc, RegistryEntry};

/// Teardown hook invoked by [`Container::dispose`] for values the container
/// owns.
///
/// Disposal cannot fail at the signature level: implementations deal with
/// their own cleanup errors (typically by logging), so one value's teardown
/// never blocks the remaining entries.
///
/// [`Container::dispose`]: crate::Container::dispose
pub trait Dispose {
    /// Release whatever the value holds.
    fn dispose(&self);
}

/// Handle returned by every registration.
///
/// By default the container only hands a value out; tearing it down remains
/// the caller's business. Calling [`owned`](Registration::owned) transfers
/// teardown responsibility for this one registration to the container.
pub struct Registration<T> {
    entry: Rc<RegistryEntry>,
    _type: PhantomData<fn() -> T>,
}

impl<T> Registration<T> {
    pub(crate) fn new(entry: Rc<RegistryEntry>) -> Self {
        Self {
            entry,
            _type: PhantomData,
        }
    }
}

impl<T: Dispose + 'static> Registration<T> {
    /// Mark the registered value as container-owned: `dispose` on the
    /// container calls [`Dispose::dispose`] on it exactly once, provided it
    /// was ever built.
    pub fn owned(self) -> Self {
        self.entry.set_disposer(Box::new(|value: &AnyRc| {
            if let Ok(value) = Rc::clone(value).downcast::<T>() {
                value.dispose();
            }
        }));
        self
    }
}
