use std::fmt::{self, Debug};
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::PooledObject;

/// Errors that can occur when building or operating a pool registry.
///
/// Pool keys are captured in their [`Debug`] rendering so that the error type does not depend
/// on the key type of the registry that produced it.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The pool configuration was rejected before any instance was created.
    #[error("invalid pool configuration for key {key}: {problem}")]
    Configuration {
        /// The key the problem was detected on. Empty if the problem is not specific to a key.
        key: String,

        /// A human-readable description of the problem.
        problem: String,
    },

    /// The operation referenced a key that was not present when the registry was built.
    #[error("no pool is registered for key {key}")]
    UnknownKey {
        /// The key that was requested.
        key: String,
    },

    /// A checkout found no parked object for the key.
    #[error("the pool for key {key} has no parked objects left")]
    PoolExhausted {
        /// The key whose pool is exhausted.
        key: String,
    },

    /// An object was checked in under a different key than the one it was created for.
    #[error("object belongs to the pool for key {actual} but was checked in under key {expected}")]
    KeyMismatch {
        /// The key the caller asked to check the object in under.
        expected: String,

        /// The key the object was tagged with when it was created.
        actual: String,
    },

    /// An object was checked in to a registry that did not create it.
    #[error("object for key {key} was created by a different pool registry")]
    ForeignObject {
        /// The key the object was tagged with.
        key: String,
    },

    /// A pool manifest could not be read from the filesystem.
    #[error("failed to read pool manifest {}", path.display())]
    ManifestIo {
        /// The manifest path that was being read.
        path: PathBuf,

        /// The underlying I/O error.
        source: io::Error,
    },
}

impl Error {
    pub(crate) fn configuration(key: &impl Debug, problem: impl Into<String>) -> Self {
        Self::Configuration {
            key: format!("{key:?}"),
            problem: problem.into(),
        }
    }

    pub(crate) fn unknown_key(key: &impl Debug) -> Self {
        Self::UnknownKey {
            key: format!("{key:?}"),
        }
    }

    pub(crate) fn pool_exhausted(key: &impl Debug) -> Self {
        Self::PoolExhausted {
            key: format!("{key:?}"),
        }
    }
}

/// A specialized `Result` type for pool operations, returning the crate's
/// [`Error`] type as the error value.
pub type Result<T> = std::result::Result<T, Error>;

/// The result of checking an object in. On failure, the object is handed back inside the
/// [`CheckInError`].
pub type CheckInResult<K, T> = std::result::Result<(), CheckInError<K, T>>;

/// A failed check-in.
///
/// The rejected object is handed back to the caller so that it is never silently lost. Use
/// [`into_object()`][Self::into_object] to recover it, for example to retry the check-in
/// under the correct key.
#[derive(Error)]
#[error("failed to check in pooled object: {error}")]
pub struct CheckInError<K, T> {
    object: PooledObject<K, T>,

    #[source]
    error: Error,
}

impl<K, T> CheckInError<K, T> {
    pub(crate) fn new(object: PooledObject<K, T>, error: Error) -> Self {
        Self { object, error }
    }

    /// The reason the check-in was rejected.
    #[must_use]
    pub fn error(&self) -> &Error {
        &self.error
    }

    /// The object that was rejected.
    #[must_use]
    pub fn object(&self) -> &PooledObject<K, T> {
        &self.object
    }

    /// Recovers ownership of the rejected object.
    #[must_use]
    pub fn into_object(self) -> PooledObject<K, T> {
        self.object
    }

    /// Discards the rejected object and returns only the reason for the rejection.
    #[must_use]
    pub fn into_error(self) -> Error {
        self.error
    }
}

// Debug implementations have no API contract to test.
#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg_attr(test, mutants::skip)]
impl<K, T> Debug for CheckInError<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckInError")
            .field("object_id", &self.object.id())
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<K, T> From<CheckInError<K, T>> for Error {
    fn from(value: CheckInError<K, T>) -> Self {
        value.into_error()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use static_assertions::assert_impl_all;

    use super::*;
    use crate::{ObjectId, RegistryId};

    assert_impl_all!(Error: Send, Sync, Debug);
    assert_impl_all!(CheckInError<u32, String>: Send, Sync, Debug);

    #[test]
    fn keys_are_rendered_with_debug_formatting() {
        let error = Error::unknown_key(&"bullet");

        assert_eq!(error.to_string(), "no pool is registered for key \"bullet\"");
    }

    #[test]
    fn configuration_error_names_key_and_problem() {
        let error = Error::configuration(&7_u32, "duplicate pool key");

        assert_eq!(
            error.to_string(),
            "invalid pool configuration for key 7: duplicate pool key"
        );
    }

    #[test]
    fn manifest_io_error_exposes_source() {
        let error = Error::ManifestIo {
            path: PathBuf::from("pools.toml"),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        };

        assert!(std::error::Error::source(&error).is_some());
        assert_eq!(error.to_string(), "failed to read pool manifest pools.toml");
    }

    #[test]
    fn check_in_error_exposes_rejection_as_source() {
        let object = PooledObject::new(3_u32, ObjectId::new(0), RegistryId::next(), "ship");
        let rejected = CheckInError::new(object, Error::unknown_key(&3_u32));

        let boxed: Box<dyn std::error::Error> = Box::new(rejected);
        let source = std::error::Error::source(boxed.as_ref()).unwrap();

        assert_eq!(source.to_string(), "no pool is registered for key 3");
    }
}
