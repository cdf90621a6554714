//! Scheme-based dispatch over several backends.

use std::collections::HashMap;

use crate::uri;
use crate::{Backend, BackendError, ChildNames, Metadata, ReadHandle, ReadWriteHandle};

/// Failures raised by [`SchemeRouter`] before any backend is reached.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RouteError {
    /// The URI has no `scheme://` prefix.
    #[error("no scheme in {0}")]
    NoScheme(String),

    /// No backend is mounted for the scheme.
    #[error("no backend registered for scheme {scheme:?}")]
    UnknownScheme {
        /// The scheme that was looked up.
        scheme: String,
    },

    /// Move or copy between two different backends.
    #[error("cannot transfer {from} to {to}: different backends")]
    CrossBackend {
        /// Source URI.
        from: String,
        /// Target URI.
        to: String,
    },
}

/// Backend that forwards each call to the backend mounted for the URI's
/// scheme.
///
/// # Example
///
/// ```rust
/// use anyfs_uri::{LocalBackend, MemoryBackend, SchemeRouter, UriFs};
///
/// let router = SchemeRouter::new()
///     .mount("file", LocalBackend::new())
///     .mount("mem", MemoryBackend::new());
/// let fs = UriFs::new(router);
/// assert!(!fs.exists("mem://nowhere/x")?);
/// # Ok::<(), anyfs_uri::FsError>(())
/// ```
#[derive(Default)]
pub struct SchemeRouter {
    routes: HashMap<String, Box<dyn Backend>>,
}

impl SchemeRouter {
    /// Create a router with no backends.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount `backend` for `scheme`, builder style.
    pub fn mount(mut self, scheme: impl Into<String>, backend: impl Backend + 'static) -> Self {
        self.insert(scheme, backend);
        self
    }

    /// Mount `backend` for `scheme`, replacing any previous one.
    pub fn insert(&mut self, scheme: impl Into<String>, backend: impl Backend + 'static) {
        self.routes.insert(scheme.into(), Box::new(backend));
    }

    /// Schemes with a mounted backend.
    pub fn schemes(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    fn scheme_of(uri: &str) -> Result<&str, RouteError> {
        uri::scheme(uri).ok_or_else(|| RouteError::NoScheme(uri.to_owned()))
    }

    fn route(&self, uri: &str) -> Result<&dyn Backend, RouteError> {
        let scheme = Self::scheme_of(uri)?;
        self.routes
            .get(scheme)
            .map(|backend| &**backend)
            .ok_or_else(|| RouteError::UnknownScheme {
                scheme: scheme.to_owned(),
            })
    }

    fn route_pair(&self, from: &str, to: &str) -> Result<&dyn Backend, RouteError> {
        if Self::scheme_of(from)? != Self::scheme_of(to)? {
            return Err(RouteError::CrossBackend {
                from: from.to_owned(),
                to: to.to_owned(),
            });
        }
        self.route(from)
    }
}

impl std::fmt::Debug for SchemeRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut schemes: Vec<_> = self.schemes().collect();
        schemes.sort_unstable();
        f.debug_struct("SchemeRouter")
            .field("schemes", &schemes)
            .finish()
    }
}

impl Backend for SchemeRouter {
    fn stat(&self, uri: &str) -> Result<Metadata, BackendError> {
        self.route(uri)?.stat(uri)
    }

    fn exists(&self, uri: &str) -> Result<bool, BackendError> {
        self.route(uri)?.exists(uri)
    }

    fn open_read(&self, uri: &str) -> Result<Box<dyn ReadHandle>, BackendError> {
        self.route(uri)?.open_read(uri)
    }

    fn open_readwrite(&self, uri: &str) -> Result<Box<dyn ReadWriteHandle>, BackendError> {
        self.route(uri)?.open_readwrite(uri)
    }

    fn create_readwrite(&self, uri: &str) -> Result<Box<dyn ReadWriteHandle>, BackendError> {
        self.route(uri)?.create_readwrite(uri)
    }

    fn open_or_create_readwrite(
        &self,
        uri: &str,
    ) -> Result<Box<dyn ReadWriteHandle>, BackendError> {
        self.route(uri)?.open_or_create_readwrite(uri)
    }

    fn enumerate_children(&self, uri: &str) -> Result<ChildNames, BackendError> {
        self.route(uri)?.enumerate_children(uri)
    }

    fn move_to(&self, from: &str, to: &str) -> Result<(), BackendError> {
        self.route_pair(from, to)?.move_to(from, to)
    }

    fn delete(&self, uri: &str) -> Result<(), BackendError> {
        self.route(uri)?.delete(uri)
    }

    fn copy(&self, from: &str, to: &str, preserve_metadata: bool) -> Result<(), BackendError> {
        self.route_pair(from, to)?.copy(from, to, preserve_metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryBackend;

    fn router() -> SchemeRouter {
        let mem = MemoryBackend::new();
        mem.insert_file("mem://b/f", b"x");
        let other = MemoryBackend::new();
        other.insert_file("tmp://b/g", b"y");
        SchemeRouter::new().mount("mem", mem).mount("tmp", other)
    }

    #[test]
    fn dispatches_by_scheme() {
        let router = router();
        assert!(router.exists("mem://b/f").unwrap());
        assert!(!router.exists("mem://b/g").unwrap());
        assert!(router.exists("tmp://b/g").unwrap());
    }

    #[test]
    fn unknown_scheme_fails() {
        let err = router().exists("smb://host/x").unwrap_err();
        assert!(err.to_string().contains("\"smb\""));
    }

    #[test]
    fn bare_path_fails() {
        assert!(router().stat("/no/scheme").is_err());
    }

    #[test]
    fn cross_backend_transfer_refused() {
        let router = router();
        assert!(router.copy("mem://b/f", "tmp://b/f", true).is_err());
        assert!(router.move_to("mem://b/f", "tmp://b/f").is_err());
        router.copy("mem://b/f", "mem://b/f2", true).unwrap();
        assert!(router.exists("mem://b/f2").unwrap());
    }

    #[test]
    fn debug_lists_schemes() {
        assert_eq!(
            format!("{:?}", router()),
            "SchemeRouter { schemes: [\"mem\", \"tmp\"] }"
        );
    }
}
