//! # Streams
//!
//! Stream adapters returned by [`UriFs::open`](crate::UriFs::open).
//!
//! | Type | Role |
//! |------|------|
//! | [`ByteStream`] | Raw, seekable, mode-restricted bytes over backend handles |
//! | [`TextStream`] | UTF-8 text over a `ByteStream` |
//! | [`FileStream`] | Either of the two, as chosen by the open mode |

mod byte;
mod text;

pub use byte::ByteStream;
pub use text::TextStream;

use crate::FsError;

/// A stream opened by [`UriFs::open`](crate::UriFs::open).
///
/// Binary modes produce [`FileStream::Binary`], text modes
/// [`FileStream::Text`].
#[derive(Debug)]
pub enum FileStream {
    /// Raw bytes.
    Binary(ByteStream),
    /// UTF-8 text.
    Text(TextStream),
}

impl FileStream {
    /// The byte stream, if this was opened in binary mode.
    pub fn into_binary(self) -> Option<ByteStream> {
        match self {
            FileStream::Binary(s) => Some(s),
            FileStream::Text(_) => None,
        }
    }

    /// The text stream, if this was opened in text mode.
    pub fn into_text(self) -> Option<TextStream> {
        match self {
            FileStream::Text(s) => Some(s),
            FileStream::Binary(_) => None,
        }
    }

    /// The underlying byte stream, whatever the mode.
    pub fn as_bytes_mut(&mut self) -> &mut ByteStream {
        match self {
            FileStream::Binary(s) => s,
            FileStream::Text(s) => s.get_mut(),
        }
    }

    /// URI the stream was opened on.
    pub fn uri(&self) -> &str {
        match self {
            FileStream::Binary(s) => s.uri(),
            FileStream::Text(s) => s.uri(),
        }
    }

    /// Release the backend handles.
    pub fn close(&mut self) -> Result<(), FsError> {
        self.as_bytes_mut().close()
    }
}

impl From<ByteStream> for FileStream {
    fn from(stream: ByteStream) -> Self {
        FileStream::Binary(stream)
    }
}

impl From<TextStream> for FileStream {
    fn from(stream: TextStream) -> Self {
        FileStream::Text(stream)
    }
}
