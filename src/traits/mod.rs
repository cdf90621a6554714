//! # Backend Traits
//!
//! The contract a storage collaborator implements to be driven by
//! [`UriFs`](crate::UriFs).
//!
//! ```text
//! Backend ──open_read──────────────▶ ReadHandle      = InputStream + Seekable
//!         ──open_or_create_readwrite▶ ReadWriteHandle = Seekable + input() + output()
//!         ──enumerate_children─────▶ ChildNames
//!         ──stat / exists / move_to / delete / copy
//! ```
//!
//! | Trait | Role |
//! |-------|------|
//! | [`Backend`] | URI-addressed storage primitives |
//! | [`ReadHandle`] | Read-only handle (input side is the owner) |
//! | [`ReadWriteHandle`] | Owning handle with separate input and output sides |
//! | [`InputStream`] / [`OutputStream`] | The two sides of an open resource |
//! | [`Seekable`] | Positioning and truncation on an owning handle |
//!
//! `ReadHandle` has a blanket implementation for every `InputStream + Seekable`
//! type. `Backend` is forwarded through `Box`, `Arc` and `&`, so a shared or
//! type-erased backend can be handed to the facade directly.

mod backend;
mod handles;

pub use backend::{Backend, ChildNames};
pub use handles::{InputStream, OutputStream, ReadHandle, ReadWriteHandle, Seekable};
