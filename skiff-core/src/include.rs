use crate::{Result, ResultSet, SqlQuery};
use std::{
    fmt::{self, Debug},
    sync::{Arc, OnceLock},
};

/// A result registered on a session and filled when its pending queries run.
///
/// Several includes registered one after the other are read in a single round trip when the
/// driver supports batched queries.
pub struct Include<T> {
    value: Arc<OnceLock<T>>,
}

impl<T> Include<T> {
    pub(crate) fn new() -> Self {
        Self {
            value: Arc::new(OnceLock::new()),
        }
    }

    pub fn has_value(&self) -> bool {
        self.value.get().is_some()
    }

    /// The value, `None` until the pending queries of the session were executed.
    pub fn value(&self) -> Option<&T> {
        self.value.get()
    }

    /// Takes the value out when this is the last handle, clones it otherwise.
    pub fn into_value(self) -> Option<T>
    where
        T: Clone,
    {
        match Arc::try_unwrap(self.value) {
            Ok(lock) => lock.into_inner(),
            Err(shared) => shared.get().cloned(),
        }
    }

    /// The value, when this is the last handle.
    pub(crate) fn take(self) -> Option<T> {
        Arc::try_unwrap(self.value)
            .ok()
            .and_then(OnceLock::into_inner)
    }

    pub(crate) fn sink(&self) -> Arc<OnceLock<T>> {
        self.value.clone()
    }
}

impl<T> Clone for Include<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
        }
    }
}

impl<T: Debug> Debug for Include<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Include")
            .field("value", &self.value.get())
            .finish()
    }
}

/// Turns the result set of a pending query into the value of its include.
pub(crate) type IncludeBuilder = Box<dyn FnOnce(ResultSet) -> Result<()> + Send>;

/// A query waiting for the next flush of the session.
pub(crate) struct PendingInclude {
    pub(crate) query: SqlQuery,
    pub(crate) build: IncludeBuilder,
}
