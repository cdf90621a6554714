//! # Filesystem Facade
//!
//! [`UriFs`] is the public entry point: it resolves caller URIs through the
//! [codec](crate::uri), opens stream adapters, and forwards metadata and
//! directory operations to the [`Backend`], normalizing backend failures
//! into [`FsError::Io`].

use std::time::SystemTime;

use tracing::{Span, debug, info_span, warn};

use crate::uri;
use crate::{
    Access, Backend, BackendError, ByteStream, ChildNames, Content, FileStream, FileType, FsError,
    Metadata, OpenMode, TextStream,
};

/// Backend-agnostic filesystem addressed by URI.
///
/// Bare local paths are accepted wherever a URI is and are turned into
/// `file://` URIs with [`uri::safe`]; absolute URIs are passed to the backend
/// unchanged.
///
/// Diagnostics go to the [`Span`] given at construction. Every operation
/// runs inside it, so callers decide where this filesystem's events end up.
///
/// # Example
///
/// ```rust
/// use anyfs_uri::{MemoryBackend, OpenMode, UriFs};
///
/// let fs = UriFs::new(MemoryBackend::new());
/// let mut out = fs.open("mem://docs/hello.txt", OpenMode::WRITE_TEXT)?.into_text().unwrap();
/// out.write("hello\n")?;
/// out.close()?;
///
/// assert!(fs.exists("mem://docs/hello.txt")?);
/// assert_eq!(fs.size("mem://docs/hello.txt")?, 6);
/// let children: Vec<String> = fs.list_dir("mem://docs")?.collect::<Result<_, _>>()?;
/// assert_eq!(children, ["mem://docs/hello.txt"]);
/// # Ok::<(), anyfs_uri::FsError>(())
/// ```
pub struct UriFs<B> {
    backend: B,
    span: Span,
}

impl<B: Backend> UriFs<B> {
    /// Create a facade over `backend`, logging into an `uri_fs` span.
    pub fn new(backend: B) -> Self {
        Self::with_span(backend, info_span!("uri_fs"))
    }

    /// Create a facade over `backend`, logging into `span`.
    pub fn with_span(backend: B, span: Span) -> Self {
        Self { backend, span }
    }

    /// The wrapped backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The diagnostics span.
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Unwrap into the backend.
    pub fn into_inner(self) -> B {
        self.backend
    }

    /// Open `uri` with `mode`.
    ///
    /// Binary modes return [`FileStream::Binary`]; text modes wrap the byte
    /// stream in a [`TextStream`].
    ///
    /// # Errors
    ///
    /// - [`FsError::Io`] if the resource cannot be stat'ed (read mode),
    ///   opened or created
    pub fn open(&self, uri: &str, mode: OpenMode) -> Result<FileStream, FsError> {
        let _guard = self.span.enter();
        let uri = uri::safe(uri);
        debug!(%uri, %mode, "open");
        let raw = ByteStream::open(&self.backend, &uri, mode)
            .inspect_err(|e| warn!(%uri, error = %e, "open failed"))?;
        Ok(if mode.is_binary() {
            FileStream::Binary(raw)
        } else {
            FileStream::Text(TextStream::new(raw))
        })
    }

    /// Open `uri` as a [`ByteStream`].
    pub fn open_binary(&self, uri: &str, access: Access) -> Result<ByteStream, FsError> {
        let _guard = self.span.enter();
        let uri = uri::safe(uri);
        debug!(%uri, ?access, "open binary");
        ByteStream::open(&self.backend, &uri, OpenMode::new(access, Content::Binary))
            .inspect_err(|e| warn!(%uri, error = %e, "open failed"))
    }

    /// Open `uri` as a [`TextStream`].
    pub fn open_text(&self, uri: &str, access: Access) -> Result<TextStream, FsError> {
        self.open_binary(uri, access).map(TextStream::new)
    }

    /// Whether `uri` exists.
    ///
    /// # Errors
    ///
    /// - [`FsError::Io`] if the backend cannot answer; a failed query is
    ///   never reported as "does not exist"
    pub fn exists(&self, uri: &str) -> Result<bool, FsError> {
        let _guard = self.span.enter();
        let uri = uri::safe(uri);
        debug!(%uri, "exists");
        self.check("exists", &uri, self.backend.exists(&uri))
    }

    /// Lazily list the children of the container `uri`, as child URIs.
    ///
    /// Each call runs a fresh backend enumeration; the returned iterator is
    /// one-shot.
    ///
    /// # Errors
    ///
    /// - [`FsError::Io`] if the enumeration cannot start; per-entry failures
    ///   are yielded as items
    pub fn list_dir(&self, uri: &str) -> Result<ListDir, FsError> {
        let _guard = self.span.enter();
        let parent = uri::safe(uri);
        debug!(uri = %parent, "list_dir");
        let names = self.check(
            "enumerate",
            &parent,
            self.backend.enumerate_children(&parent),
        )?;
        Ok(ListDir { parent, names })
    }

    /// Move `old` to `new`.
    ///
    /// # Panics
    ///
    /// If `old` and `new` resolve to the same URI. Renaming a resource onto
    /// itself is a caller bug, not a runtime condition.
    ///
    /// # Errors
    ///
    /// - [`FsError::Io`] if the backend refuses the move
    pub fn rename(&self, old: &str, new: &str) -> Result<(), FsError> {
        let _guard = self.span.enter();
        let old = uri::safe(old);
        let new = uri::safe(new);
        assert!(old != new, "cannot rename {old} onto itself");
        debug!(%old, %new, "rename");
        self.check("move", &old, self.backend.move_to(&old, &new))
    }

    /// Delete `uri`.
    ///
    /// # Errors
    ///
    /// - [`FsError::Io`] if deletion is refused (missing resource, non-empty
    ///   directory, permissions)
    pub fn unlink(&self, uri: &str) -> Result<(), FsError> {
        let _guard = self.span.enter();
        let uri = uri::safe(uri);
        debug!(%uri, "unlink");
        self.check("delete", &uri, self.backend.delete(&uri))
    }

    /// Metadata of `uri`.
    ///
    /// # Errors
    ///
    /// - [`FsError::Io`] on stat failure
    pub fn metadata(&self, uri: &str) -> Result<Metadata, FsError> {
        let _guard = self.span.enter();
        let uri = uri::safe(uri);
        debug!(%uri, "stat");
        self.check("stat", &uri, self.backend.stat(&uri))
    }

    /// Last modification time of `uri`.
    pub fn mtime(&self, uri: &str) -> Result<SystemTime, FsError> {
        Ok(self.metadata(uri)?.modified)
    }

    /// Size of `uri` in bytes.
    pub fn size(&self, uri: &str) -> Result<u64, FsError> {
        Ok(self.metadata(uri)?.size)
    }

    /// Whether `uri` is a directory.
    ///
    /// # Errors
    ///
    /// - [`FsError::Io`] on stat failure, including a missing resource
    pub fn is_dir(&self, uri: &str) -> Result<bool, FsError> {
        Ok(self.metadata(uri)?.file_type == FileType::Directory)
    }

    /// Whether `uri` is a regular file.
    pub fn is_file(&self, uri: &str) -> Result<bool, FsError> {
        Ok(self.metadata(uri)?.file_type == FileType::File)
    }

    /// Copy `old` to `new`, preserving metadata.
    ///
    /// # Errors
    ///
    /// - [`FsError::Io`] if the backend refuses the copy
    pub fn copy(&self, old: &str, new: &str) -> Result<(), FsError> {
        let _guard = self.span.enter();
        let old = uri::safe(old);
        let new = uri::safe(new);
        debug!(%old, %new, "copy");
        self.check("copy", &old, self.backend.copy(&old, &new, true))
    }

    fn check<T>(
        &self,
        operation: &'static str,
        uri: &str,
        result: Result<T, BackendError>,
    ) -> Result<T, FsError> {
        result.map_err(|e| {
            warn!(operation, uri, error = %e, "backend operation failed");
            FsError::io(operation, uri, e)
        })
    }
}

impl<B> std::fmt::Debug for UriFs<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UriFs").finish_non_exhaustive()
    }
}

/// Child URIs of a container, produced by [`UriFs::list_dir`].
///
/// Backed by a single backend enumeration; it cannot be restarted.
pub struct ListDir {
    parent: String,
    names: ChildNames,
}

impl std::fmt::Debug for ListDir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListDir")
            .field("parent", &self.parent)
            .finish_non_exhaustive()
    }
}

impl Iterator for ListDir {
    type Item = Result<String, FsError>;

    fn next(&mut self) -> Option<Self::Item> {
        let name = self.names.next()?;
        Some(
            name.map(|name| uri::child(&self.parent, &name))
                .map_err(|e| FsError::io("enumerate", &self.parent, e)),
        )
    }
}
