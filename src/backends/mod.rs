//! # Backends
//!
//! Ready-made [`Backend`](crate::Backend) implementations.
//!
//! | Backend | Serves |
//! |---------|--------|
//! | [`MemoryBackend`] | Any scheme, stored in process memory |
//! | [`LocalBackend`] | `file://` URIs on the local filesystem |
//! | [`SchemeRouter`] | Dispatches to other backends by scheme |

mod local;
mod memory;
mod router;

pub use local::LocalBackend;
pub use memory::{MemoryBackend, MemoryError};
pub use router::{RouteError, SchemeRouter};
