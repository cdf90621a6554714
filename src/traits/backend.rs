//! The storage backend contract.

use std::sync::Arc;

use crate::{BackendError, Metadata, ReadHandle, ReadWriteHandle};

/// Storage backend reachable through URIs.
///
/// This is the only seam between the stream/facade layer and the actual
/// storage (local disk, network share, bucket, ...). Every method receives
/// an absolute (`scheme://`) URI and may fail with any backend-specific
/// error; the caller wraps those into [`FsError::Io`](crate::FsError::Io).
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`. Methods take `&self`; backends use
/// interior mutability for their own state.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn Backend`.
///
/// # Example
///
/// ```rust
/// use anyfs_uri::{Backend, BackendError};
///
/// // Generic function that works with any Backend implementation
/// fn names<B: Backend>(backend: &B, dir: &str) -> Result<Vec<String>, BackendError> {
///     backend.enumerate_children(dir)?.collect()
/// }
/// ```
pub trait Backend: Send + Sync {
    /// Metadata of the resource.
    ///
    /// Fails if the resource is missing or unreadable.
    fn stat(&self, uri: &str) -> Result<Metadata, BackendError>;

    /// Whether the resource exists.
    ///
    /// Only fails for unexpected conditions; a missing resource is `Ok(false)`.
    fn exists(&self, uri: &str) -> Result<bool, BackendError>;

    /// Open an existing resource for reading.
    fn open_read(&self, uri: &str) -> Result<Box<dyn ReadHandle>, BackendError>;

    /// Open an existing resource for reading and writing.
    ///
    /// Existing content is kept; the position starts at 0.
    fn open_readwrite(&self, uri: &str) -> Result<Box<dyn ReadWriteHandle>, BackendError>;

    /// Create a new, empty resource and open it for reading and writing.
    fn create_readwrite(&self, uri: &str) -> Result<Box<dyn ReadWriteHandle>, BackendError>;

    /// Open the resource for reading and writing, creating it if absent.
    fn open_or_create_readwrite(
        &self,
        uri: &str,
    ) -> Result<Box<dyn ReadWriteHandle>, BackendError> {
        if self.exists(uri)? {
            self.open_readwrite(uri)
        } else {
            self.create_readwrite(uri)
        }
    }

    /// Names of the direct children of a container, in backend order.
    fn enumerate_children(&self, uri: &str) -> Result<ChildNames, BackendError>;

    /// Move (rename) a resource.
    fn move_to(&self, from: &str, to: &str) -> Result<(), BackendError>;

    /// Delete a resource. Non-empty containers are refused.
    fn delete(&self, uri: &str) -> Result<(), BackendError>;

    /// Copy a resource, optionally preserving its metadata.
    fn copy(&self, from: &str, to: &str, preserve_metadata: bool) -> Result<(), BackendError>;
}

/// Iterator over child names produced by [`Backend::enumerate_children`].
///
/// One-shot: it walks a single enumeration and cannot be restarted.
///
/// - Outer `Result` (from `enumerate_children`) = "can I enumerate this container?"
/// - Inner `Result` (per item) = "can I read this entry?"
pub struct ChildNames(Box<dyn Iterator<Item = Result<String, BackendError>> + Send + 'static>);

impl ChildNames {
    /// Create from any compatible iterator.
    pub fn new<I>(iter: I) -> Self
    where
        I: Iterator<Item = Result<String, BackendError>> + Send + 'static,
    {
        Self(Box::new(iter))
    }

    /// Create from a pre-collected list of names.
    pub fn from_names(names: Vec<String>) -> Self {
        Self(Box::new(names.into_iter().map(Ok)))
    }
}

impl Iterator for ChildNames {
    type Item = Result<String, BackendError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next()
    }
}

macro_rules! forward_backend {
    ($($ty:ty),*) => {$(
        impl<B: Backend + ?Sized> Backend for $ty {
            fn stat(&self, uri: &str) -> Result<Metadata, BackendError> {
                (**self).stat(uri)
            }
            fn exists(&self, uri: &str) -> Result<bool, BackendError> {
                (**self).exists(uri)
            }
            fn open_read(&self, uri: &str) -> Result<Box<dyn ReadHandle>, BackendError> {
                (**self).open_read(uri)
            }
            fn open_readwrite(
                &self,
                uri: &str,
            ) -> Result<Box<dyn ReadWriteHandle>, BackendError> {
                (**self).open_readwrite(uri)
            }
            fn create_readwrite(
                &self,
                uri: &str,
            ) -> Result<Box<dyn ReadWriteHandle>, BackendError> {
                (**self).create_readwrite(uri)
            }
            fn open_or_create_readwrite(
                &self,
                uri: &str,
            ) -> Result<Box<dyn ReadWriteHandle>, BackendError> {
                (**self).open_or_create_readwrite(uri)
            }
            fn enumerate_children(&self, uri: &str) -> Result<ChildNames, BackendError> {
                (**self).enumerate_children(uri)
            }
            fn move_to(&self, from: &str, to: &str) -> Result<(), BackendError> {
                (**self).move_to(from, to)
            }
            fn delete(&self, uri: &str) -> Result<(), BackendError> {
                (**self).delete(uri)
            }
            fn copy(
                &self,
                from: &str,
                to: &str,
                preserve_metadata: bool,
            ) -> Result<(), BackendError> {
                (**self).copy(from, to, preserve_metadata)
            }
        }
    )*};
}

forward_backend!(Box<B>, Arc<B>, &B);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_is_object_safe() {
        fn _check(_: &dyn Backend) {}
    }

    #[test]
    fn child_names_from_names() {
        let names = ChildNames::from_names(vec!["x".into(), "y".into()]);
        let collected: Result<Vec<_>, _> = names.collect();
        assert_eq!(collected.unwrap(), vec!["x".to_owned(), "y".to_owned()]);
    }

    #[test]
    fn child_names_surface_entry_errors() {
        let names = ChildNames::new(
            vec![Ok("a".to_owned()), Err(BackendError::from("unreadable entry"))].into_iter(),
        );
        let collected: Result<Vec<_>, _> = names.collect();
        assert!(collected.is_err());
    }

    #[test]
    fn child_names_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<ChildNames>();
    }
}
