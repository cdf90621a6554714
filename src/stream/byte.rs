//! Raw, seekable, mode-restricted byte stream over backend handles.

use std::io::SeekFrom;

use tracing::{debug, trace, warn};

use crate::{
    Access, Backend, BackendError, FsError, InputStream, OpenMode, ReadHandle, ReadWriteHandle,
    Seekable,
};

/// Backend handles held by an open stream.
///
/// In read mode the input stream is itself the owning handle and is released
/// once. In write and append modes the input and output sides belong to an
/// owning read-write handle, and all three are released.
enum Handles {
    ReadOnly { input: Box<dyn ReadHandle> },
    ReadWrite { owner: Box<dyn ReadWriteHandle> },
}

impl Handles {
    fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>, BackendError> {
        match self {
            Handles::ReadOnly { input } => input.read_bytes(count),
            Handles::ReadWrite { owner } => owner.input().read_bytes(count),
        }
    }

    fn tell(&mut self) -> Result<u64, BackendError> {
        match self {
            Handles::ReadOnly { input } => input.tell(),
            Handles::ReadWrite { owner } => owner.input().tell(),
        }
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64, BackendError> {
        match self {
            Handles::ReadOnly { input } => input.seek(pos),
            Handles::ReadWrite { owner } => owner.seek(pos),
        }
    }

    fn truncate(&mut self, size: u64) -> Result<(), BackendError> {
        match self {
            Handles::ReadOnly { input } => input.truncate(size),
            Handles::ReadWrite { owner } => owner.truncate(size),
        }
    }

    /// Release every handle, attempting all of them before reporting the
    /// first failure.
    fn release(self) -> Result<(), BackendError> {
        match self {
            Handles::ReadOnly { mut input } => input.close(),
            Handles::ReadWrite { mut owner } => {
                let input = owner.input().close();
                let output = owner.output().close();
                let owned = owner.close();
                input.and(output).and(owned)
            }
        }
    }
}

fn live<'a>(handles: &'a mut Option<Handles>, uri: &str) -> Result<&'a mut Handles, FsError> {
    handles.as_mut().ok_or_else(|| FsError::Closed {
        uri: uri.to_owned(),
    })
}

/// A raw byte stream over one backend resource.
///
/// Created by [`UriFs::open`](crate::UriFs::open) (or [`ByteStream::open`]).
/// Handles are released by [`close`](Self::close), or on drop if the stream
/// was never closed. Every operation on a closed stream fails with
/// [`FsError::Closed`].
///
/// # Size tracking
///
/// The stream caches the resource size: fetched at open time in read mode
/// (and in append mode on an existing resource), 0 otherwise. Writes and
/// truncates update the cached value; the backend is never re-queried.
/// [`read_all`](Self::read_all) reads exactly the cached size.
///
/// # Example
///
/// ```rust
/// use anyfs_uri::{Access, MemoryBackend, UriFs};
/// use std::io::SeekFrom;
///
/// let fs = UriFs::new(MemoryBackend::new());
/// let mut stream = fs.open_binary("mem://bucket/data.bin", Access::Write)?;
/// stream.write(b"hello")?;
/// stream.seek(SeekFrom::Start(0))?;
/// assert_eq!(stream.read_all()?, b"hello");
/// stream.close()?;
/// # Ok::<(), anyfs_uri::FsError>(())
/// ```
pub struct ByteStream {
    uri: String,
    mode: OpenMode,
    size: u64,
    handles: Option<Handles>,
}

impl ByteStream {
    /// Open `uri` on `backend` with the access discipline of `mode`.
    ///
    /// - Read: the resource must exist; its size is fetched eagerly.
    /// - Write/append: an existing resource is opened read-write, a missing
    ///   one is created. Append positions the stream at end of data.
    ///
    /// # Errors
    ///
    /// - [`FsError::Io`] if the stat, open or create fails
    pub fn open<B: Backend + ?Sized>(
        backend: &B,
        uri: &str,
        mode: OpenMode,
    ) -> Result<Self, FsError> {
        let (handles, size) = match mode.access {
            Access::Read => {
                let size = backend
                    .stat(uri)
                    .map_err(|e| FsError::io("stat", uri, e))?
                    .size;
                let input = backend
                    .open_read(uri)
                    .map_err(|e| FsError::io("open", uri, e))?;
                (Handles::ReadOnly { input }, size)
            }
            Access::Write => {
                let owner = backend
                    .open_or_create_readwrite(uri)
                    .map_err(|e| FsError::io("open", uri, e))?;
                (Handles::ReadWrite { owner }, 0)
            }
            Access::Append => {
                let existed = backend
                    .exists(uri)
                    .map_err(|e| FsError::io("exists", uri, e))?;
                let size = if existed {
                    backend
                        .stat(uri)
                        .map_err(|e| FsError::io("stat", uri, e))?
                        .size
                } else {
                    0
                };
                let owner = backend
                    .open_or_create_readwrite(uri)
                    .map_err(|e| FsError::io("open", uri, e))?;
                (Handles::ReadWrite { owner }, size)
            }
        };

        let mut stream = Self {
            uri: uri.to_owned(),
            mode,
            size,
            handles: Some(handles),
        };
        if mode.access == Access::Append {
            stream.seek(SeekFrom::End(0))?;
        }
        debug!(uri, %mode, size, "opened byte stream");
        Ok(stream)
    }

    /// URI the stream was opened on.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Mode the stream was opened with.
    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    /// Cached size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Returns `true` once [`close`](Self::close) has run.
    pub fn is_closed(&self) -> bool {
        self.handles.is_none()
    }

    /// Every mode exposes an input side, so streams are always readable.
    pub fn readable(&self) -> bool {
        true
    }

    /// Returns `true` for write and append modes.
    pub fn writable(&self) -> bool {
        self.mode.is_writable()
    }

    /// Streams are always seekable.
    pub fn seekable(&self) -> bool {
        true
    }

    /// Backend streams are never terminals.
    pub fn is_tty(&self) -> bool {
        false
    }

    /// Read up to `n` bytes from the current position.
    ///
    /// # Errors
    ///
    /// - [`FsError::Closed`] if the stream is closed
    /// - [`FsError::NotSupported`] if the stream is not readable
    /// - [`FsError::Io`] if the backend read fails
    pub fn read(&mut self, n: usize) -> Result<Vec<u8>, FsError> {
        if !self.readable() {
            return Err(FsError::NotSupported { operation: "read" });
        }
        let handles = live(&mut self.handles, &self.uri)?;
        let data = handles
            .read_bytes(n)
            .map_err(|e| FsError::io("read", &self.uri, e))?;
        trace!(uri = %self.uri, requested = n, got = data.len(), "read");
        Ok(data)
    }

    /// Read the cached size worth of bytes from the current position.
    ///
    /// This is not "read until end of stream": the size is never re-fetched.
    pub fn read_all(&mut self) -> Result<Vec<u8>, FsError> {
        let size = usize::try_from(self.size).unwrap_or(usize::MAX);
        self.read(size)
    }

    /// Not supported on backend streams.
    ///
    /// Fails with [`FsError::Closed`] instead once the stream is closed.
    pub fn read_into(&mut self, buf: &mut [u8]) -> Result<usize, FsError> {
        let _ = buf;
        self.ensure_open()?;
        Err(FsError::NotSupported {
            operation: "readinto",
        })
    }

    /// Not supported: the backend has no line-indexing primitive.
    pub fn read_line(&mut self) -> Result<Vec<u8>, FsError> {
        self.ensure_open()?;
        Err(FsError::NotSupported {
            operation: "readline",
        })
    }

    /// Read everything and split it on `b'\n'`, re-appending `b'\n'` to every
    /// chunk.
    ///
    /// Content ending in a newline yields a trailing `b"\n"` entry:
    /// `b"a\nb\n"` gives `[b"a\n", b"b\n", b"\n"]`. Callers rely on this.
    pub fn read_lines(&mut self) -> Result<Vec<Vec<u8>>, FsError> {
        let data = self.read_all()?;
        Ok(data
            .split(|&b| b == b'\n')
            .map(|chunk| {
                let mut line = Vec::with_capacity(chunk.len() + 1);
                line.extend_from_slice(chunk);
                line.push(b'\n');
                line
            })
            .collect())
    }

    /// Move the position. Returns the new position.
    ///
    /// # Errors
    ///
    /// - [`FsError::Closed`] if the stream is closed
    /// - [`FsError::Io`] if the backend rejects the position
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64, FsError> {
        let handles = live(&mut self.handles, &self.uri)?;
        handles
            .seek(pos)
            .map_err(|e| FsError::io("seek", &self.uri, e))
    }

    /// Current position of the input side.
    pub fn tell(&mut self) -> Result<u64, FsError> {
        let handles = live(&mut self.handles, &self.uri)?;
        handles
            .tell()
            .map_err(|e| FsError::io("tell", &self.uri, e))
    }

    /// Truncate to `size`, or to the current position when `None`.
    ///
    /// Returns the new size.
    ///
    /// # Errors
    ///
    /// - [`FsError::Closed`] if the stream is closed
    /// - [`FsError::Io`] if the backend cannot truncate (read-only handles
    ///   usually cannot)
    pub fn truncate(&mut self, size: Option<u64>) -> Result<u64, FsError> {
        let size = match size {
            Some(size) => size,
            None => self.tell()?,
        };
        let handles = live(&mut self.handles, &self.uri)?;
        handles
            .truncate(size)
            .map_err(|e| FsError::io("truncate", &self.uri, e))?;
        self.size = size;
        Ok(size)
    }

    /// Write all of `data` in one call. Returns `data.len()`.
    ///
    /// # Errors
    ///
    /// - [`FsError::Closed`] if the stream is closed
    /// - [`FsError::NotWritable`] in read mode
    /// - [`FsError::ShortWrite`] if the backend accepted only part of `data`
    /// - [`FsError::Io`] if the backend write fails
    pub fn write(&mut self, data: &[u8]) -> Result<usize, FsError> {
        let writable = self.writable();
        let handles = live(&mut self.handles, &self.uri)?;
        let owner = match handles {
            Handles::ReadWrite { owner } if writable => owner,
            _ => {
                return Err(FsError::NotWritable {
                    uri: self.uri.clone(),
                });
            }
        };

        let written = owner
            .output()
            .write_all(data)
            .map_err(|e| FsError::io("write", &self.uri, e))?;
        if written != data.len() {
            return Err(FsError::ShortWrite {
                uri: self.uri.clone(),
                written,
                expected: data.len(),
            });
        }

        let end = owner
            .input()
            .tell()
            .map_err(|e| FsError::io("tell", &self.uri, e))?;
        self.size = self.size.max(end);
        trace!(uri = %self.uri, written, "write");
        Ok(written)
    }

    /// Concatenate `lines` and write them as one payload.
    ///
    /// No separators are added.
    pub fn write_lines<I, L>(&mut self, lines: I) -> Result<usize, FsError>
    where
        I: IntoIterator<Item = L>,
        L: AsRef<[u8]>,
    {
        let payload: Vec<u8> = lines
            .into_iter()
            .flat_map(|line| line.as_ref().to_vec())
            .collect();
        self.write(&payload)
    }

    /// No-op: the backend handle owns buffering.
    pub fn flush(&mut self) -> Result<(), FsError> {
        self.ensure_open()
    }

    pub(crate) fn ensure_open(&self) -> Result<(), FsError> {
        match self.handles {
            Some(_) => Ok(()),
            None => Err(FsError::Closed {
                uri: self.uri.clone(),
            }),
        }
    }

    /// Not supported: there is no OS-level descriptor behind the stream.
    pub fn fileno(&self) -> Result<i32, FsError> {
        self.ensure_open()?;
        Err(FsError::NotSupported {
            operation: "fileno",
        })
    }

    /// Release the backend handles.
    ///
    /// Closing an already closed stream does nothing.
    ///
    /// # Errors
    ///
    /// - [`FsError::Io`] if a handle fails to close; the others are still
    ///   released
    pub fn close(&mut self) -> Result<(), FsError> {
        let Some(handles) = self.handles.take() else {
            return Ok(());
        };
        debug!(uri = %self.uri, "closing byte stream");
        handles
            .release()
            .map_err(|e| FsError::io("close", &self.uri, e))
    }
}

impl Drop for ByteStream {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(uri = %self.uri, error = %e, "failed to release stream on drop");
        }
    }
}

impl std::fmt::Debug for ByteStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteStream")
            .field("uri", &self.uri)
            .field("mode", &self.mode)
            .field("size", &self.size)
            .field("closed", &self.is_closed())
            .finish()
    }
}
