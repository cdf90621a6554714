//! UTF-8 text stream layered over a [`ByteStream`].

use std::io::SeekFrom;

use crate::{ByteStream, FsError, LINE_SEPARATOR, OpenMode};

/// UTF-8 text view of a [`ByteStream`].
///
/// Reads decode the byte layer's result; writes encode and delegate.
/// Positioning, truncation, flushing and descriptor queries are passed
/// through unchanged, so [`tell`](Self::tell), [`seek`](Self::seek) and
/// [`truncate`](Self::truncate) work in byte offsets, not characters.
pub struct TextStream {
    raw: ByteStream,
}

impl TextStream {
    /// Wrap a byte stream.
    pub fn new(raw: ByteStream) -> Self {
        Self { raw }
    }

    /// The underlying byte stream.
    pub fn get_ref(&self) -> &ByteStream {
        &self.raw
    }

    /// The underlying byte stream, mutably.
    pub fn get_mut(&mut self) -> &mut ByteStream {
        &mut self.raw
    }

    /// Unwrap into the underlying byte stream.
    pub fn into_inner(self) -> ByteStream {
        self.raw
    }

    /// URI the stream was opened on.
    pub fn uri(&self) -> &str {
        self.raw.uri()
    }

    /// Mode the stream was opened with.
    pub fn mode(&self) -> OpenMode {
        self.raw.mode()
    }

    /// See [`ByteStream::readable`].
    pub fn readable(&self) -> bool {
        self.raw.readable()
    }

    /// See [`ByteStream::writable`].
    pub fn writable(&self) -> bool {
        self.raw.writable()
    }

    /// See [`ByteStream::seekable`].
    pub fn seekable(&self) -> bool {
        self.raw.seekable()
    }

    /// See [`ByteStream::is_closed`].
    pub fn is_closed(&self) -> bool {
        self.raw.is_closed()
    }

    /// See [`ByteStream::is_tty`].
    pub fn is_tty(&self) -> bool {
        self.raw.is_tty()
    }

    /// Read up to `n` bytes and decode them.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidData`] if the bytes are not valid UTF-8 (this
    ///   includes a character cut in half by `n`)
    /// - Any error of [`ByteStream::read`]
    pub fn read(&mut self, n: usize) -> Result<String, FsError> {
        let bytes = self.raw.read(n)?;
        self.decode(bytes)
    }

    /// Read the cached size worth of bytes and decode them.
    pub fn read_all(&mut self) -> Result<String, FsError> {
        let bytes = self.raw.read_all()?;
        self.decode(bytes)
    }

    /// Delegates to [`ByteStream::read_into`], which is unsupported.
    pub fn read_into(&mut self, buf: &mut [u8]) -> Result<usize, FsError> {
        self.raw.read_into(buf)
    }

    /// Not supported: the byte layer has no line-indexing primitive.
    pub fn read_line(&mut self) -> Result<String, FsError> {
        self.raw.ensure_open()?;
        Err(FsError::NotSupported {
            operation: "readline",
        })
    }

    /// Read everything, split on [`LINE_SEPARATOR`] and re-append `'\n'` to
    /// every segment.
    ///
    /// Unlike [`ByteStream::read_lines`], a final segment that is only `"\n"`
    /// (content ending in a separator) is dropped: `"a\nb\n"` gives
    /// `["a\n", "b\n"]`.
    pub fn read_lines(&mut self) -> Result<Vec<String>, FsError> {
        let text = self.read_all()?;
        let mut lines: Vec<String> = text
            .split(LINE_SEPARATOR)
            .map(|segment| format!("{segment}\n"))
            .collect();
        if lines.last().is_some_and(|last| last == "\n") {
            lines.pop();
        }
        Ok(lines)
    }

    /// Encode `text` and write it. Returns the number of bytes written.
    pub fn write(&mut self, text: &str) -> Result<usize, FsError> {
        self.raw.write(text.as_bytes())
    }

    /// Append [`LINE_SEPARATOR`] to each line and write them as one payload.
    pub fn write_lines<I, S>(&mut self, lines: I) -> Result<usize, FsError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let payload: String = lines
            .into_iter()
            .map(|line| format!("{}{LINE_SEPARATOR}", line.as_ref()))
            .collect();
        self.raw.write(payload.as_bytes())
    }

    /// See [`ByteStream::seek`]. Offsets are in bytes.
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64, FsError> {
        self.raw.seek(pos)
    }

    /// See [`ByteStream::tell`]. The position is a byte offset.
    pub fn tell(&mut self) -> Result<u64, FsError> {
        self.raw.tell()
    }

    /// See [`ByteStream::truncate`]. The size is a byte count.
    pub fn truncate(&mut self, size: Option<u64>) -> Result<u64, FsError> {
        self.raw.truncate(size)
    }

    /// See [`ByteStream::flush`].
    pub fn flush(&mut self) -> Result<(), FsError> {
        self.raw.flush()
    }

    /// See [`ByteStream::fileno`].
    pub fn fileno(&self) -> Result<i32, FsError> {
        self.raw.fileno()
    }

    /// See [`ByteStream::close`].
    pub fn close(&mut self) -> Result<(), FsError> {
        self.raw.close()
    }

    fn decode(&self, bytes: Vec<u8>) -> Result<String, FsError> {
        String::from_utf8(bytes).map_err(|e| FsError::InvalidData {
            uri: self.raw.uri().to_owned(),
            details: e.to_string(),
        })
    }
}

impl std::fmt::Debug for TextStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("TextStream").field(&self.raw).finish()
    }
}
