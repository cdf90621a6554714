//! # anyfs-uri
//!
//! A **URI-addressed filesystem facade** over pluggable storage backends.
//!
//! Callers open, read, write, seek, truncate, list, rename, delete and stat
//! resources through one API, whether the resource lives on local disk, a
//! network share or anything else a [`Backend`] can reach. Bare local paths
//! and `scheme://` URIs are interchangeable.
//!
//! ---
//!
//! ## Quick Start
//!
//! ```rust
//! use anyfs_uri::{MemoryBackend, OpenMode, UriFs};
//! use std::io::SeekFrom;
//!
//! let fs = UriFs::new(MemoryBackend::new());
//!
//! let mut stream = fs.open("mem://archive/2024/notes.txt", "w".parse()?)?
//!     .into_text()
//!     .unwrap();
//! stream.write_lines(["first", "second"])?;
//! stream.close()?;
//!
//! let mut stream = fs.open("mem://archive/2024/notes.txt", OpenMode::READ_TEXT)?
//!     .into_text()
//!     .unwrap();
//! assert_eq!(stream.read_lines()?.len(), 2);
//! stream.seek(SeekFrom::Start(0))?;
//! assert!(stream.read(5)?.starts_with("first"));
//!
//! for child in fs.list_dir("mem://archive/2024")? {
//!     println!("{}", child?);
//! }
//! # Ok::<(), anyfs_uri::FsError>(())
//! ```
//!
//! ---
//!
//! ## Core Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`UriFs`] | The facade: open streams, list, rename, delete, stat |
//! | [`ByteStream`] | Seekable byte stream over backend handles |
//! | [`TextStream`] | UTF-8 text stream over a `ByteStream` |
//! | [`OpenMode`] | Access discipline (read/write/append) plus binary/text |
//! | [`Backend`] | Contract a storage provider implements |
//! | [`FsError`] | Error type; backend failures become [`FsError::Io`] |
//! | [`uri`] | Codec between local paths and URIs |
//!
//! ---
//!
//! ## Layering
//!
//! ```text
//! caller ─▶ UriFs ─▶ uri::safe ─▶ Backend handles ─▶ ByteStream ─▶ (text mode) TextStream
//!                └──────────────▶ Backend stat / enumerate / move / delete / copy
//! ```
//!
//! ---
//!
//! ## Backends
//!
//! | Backend | Serves |
//! |---------|--------|
//! | [`MemoryBackend`] | Any scheme, in process memory |
//! | [`LocalBackend`] | `file://` URIs via `std::fs` |
//! | [`SchemeRouter`] | Several backends, picked by URI scheme |
//!
//! ---
//!
//! ## Logging
//!
//! Diagnostics are emitted with `tracing` inside the span given to
//! [`UriFs::with_span`] (an `uri_fs` span by default). No subscriber is
//! installed by this crate.
//!
//! ---
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `serde` | Serialization for [`Metadata`], [`FileType`], [`OpenMode`]; JSON helpers on [`UriFs`] |

// Private modules
mod backends;
mod error;
mod ext;
mod fs;
mod stream;
mod traits;
mod types;

pub mod uri;

// Public re-exports - error types
pub use error::{BackendError, FsError};

// Public re-exports - core types
pub use types::{Access, Content, FileType, LINE_SEPARATOR, Metadata, OpenMode};

// Public re-exports - backend contract
pub use traits::{
    Backend, ChildNames, InputStream, OutputStream, ReadHandle, ReadWriteHandle, Seekable,
};

// Public re-exports - streams and facade
pub use fs::{ListDir, UriFs};
pub use stream::{ByteStream, FileStream, TextStream};

// Public re-exports - backends
pub use backends::{LocalBackend, MemoryBackend, MemoryError, RouteError, SchemeRouter};
