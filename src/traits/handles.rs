//! Handle contracts a backend hands out when a resource is opened.
//!
//! Two shapes exist, mirroring the two ways a stream can be opened:
//!
//! - [`ReadHandle`]: a single read-only input stream that is also the owning
//!   handle (read mode).
//! - [`ReadWriteHandle`]: an owning handle exposing separate
//!   [`InputStream`] and [`OutputStream`] sides that share one position
//!   (write and append modes).
//!
//! Positioning ([`Seekable`]) always goes through the owning handle.
//!
//! # Example
//!
//! ```rust
//! use anyfs_uri::{Backend, BackendError, InputStream, Seekable};
//! use std::io::SeekFrom;
//!
//! // Read the last `n` bytes of a resource through a raw handle.
//! fn tail<B: Backend>(backend: &B, uri: &str, n: usize) -> Result<Vec<u8>, BackendError> {
//!     let mut handle = backend.open_read(uri)?;
//!     handle.seek(SeekFrom::End(-(n as i64)))?;
//!     let data = handle.read_bytes(n)?;
//!     handle.close()?;
//!     Ok(data)
//! }
//! ```

use std::io::SeekFrom;

use crate::BackendError;

/// Input side of an open resource.
pub trait InputStream: Send {
    /// Read up to `count` bytes from the current position.
    ///
    /// Returns fewer bytes only at end of data.
    fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>, BackendError>;

    /// Current position, in bytes from the start.
    fn tell(&mut self) -> Result<u64, BackendError>;

    /// Release this input side.
    fn close(&mut self) -> Result<(), BackendError>;
}

/// Output side of an open resource.
pub trait OutputStream: Send {
    /// Write all of `data` at the current position.
    ///
    /// Returns the number of bytes the backend accepted. A value smaller than
    /// `data.len()` reports a partial write.
    fn write_all(&mut self, data: &[u8]) -> Result<usize, BackendError>;

    /// Release this output side.
    fn close(&mut self) -> Result<(), BackendError>;
}

/// Positioning primitives of an owning handle.
pub trait Seekable {
    /// Move the position. Returns the new position.
    ///
    /// No bounds checking beyond what the backend enforces.
    fn seek(&mut self, pos: SeekFrom) -> Result<u64, BackendError>;

    /// Set the resource length to `size` bytes.
    ///
    /// The default implementation reports the operation as unsupported.
    fn truncate(&mut self, size: u64) -> Result<(), BackendError> {
        let _ = size;
        Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "truncate not supported on this handle",
        )
        .into())
    }
}

/// Read-only handle: the input stream is the owning handle.
pub trait ReadHandle: InputStream + Seekable {}

impl<T: InputStream + Seekable> ReadHandle for T {}

/// Read-write handle owning an input side and an output side.
///
/// Both sides share the handle's position.
pub trait ReadWriteHandle: Seekable + Send {
    /// The input side.
    fn input(&mut self) -> &mut dyn InputStream;

    /// The output side.
    fn output(&mut self) -> &mut dyn OutputStream;

    /// Release the owning handle.
    fn close(&mut self) -> Result<(), BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        data: Vec<u8>,
        pos: u64,
    }

    impl InputStream for Fixed {
        fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>, BackendError> {
            let start = (self.pos as usize).min(self.data.len());
            let end = (start + count).min(self.data.len());
            self.pos = end as u64;
            Ok(self.data[start..end].to_vec())
        }

        fn tell(&mut self) -> Result<u64, BackendError> {
            Ok(self.pos)
        }

        fn close(&mut self) -> Result<(), BackendError> {
            Ok(())
        }
    }

    impl Seekable for Fixed {
        fn seek(&mut self, pos: SeekFrom) -> Result<u64, BackendError> {
            self.pos = match pos {
                SeekFrom::Start(n) => n,
                SeekFrom::Current(d) => self.pos.saturating_add_signed(d),
                SeekFrom::End(d) => (self.data.len() as u64).saturating_add_signed(d),
            };
            Ok(self.pos)
        }
    }

    #[test]
    fn input_plus_seekable_is_read_handle() {
        let mut handle: Box<dyn ReadHandle> = Box::new(Fixed {
            data: b"hello world".to_vec(),
            pos: 0,
        });
        handle.seek(SeekFrom::Start(6)).unwrap();
        assert_eq!(handle.read_bytes(5).unwrap(), b"world");
        assert_eq!(handle.tell().unwrap(), 11);
    }

    #[test]
    fn truncate_defaults_to_unsupported() {
        let mut handle = Fixed {
            data: vec![],
            pos: 0,
        };
        let err = handle.truncate(0).unwrap_err();
        assert!(err.to_string().contains("truncate not supported"));
    }

    #[test]
    fn handle_traits_are_object_safe() {
        fn _check(_: &dyn ReadHandle, _: &dyn ReadWriteHandle) {}
    }
}
