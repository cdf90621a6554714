//! # Whole-File Helpers
//!
//! Convenience methods on [`UriFs`] for callers that want a resource's
//! content in one call instead of managing a stream.
//!
//! | Method | Description |
//! |--------|-------------|
//! | [`read_bytes`](UriFs::read_bytes) | Entire content as bytes |
//! | [`read_to_string`](UriFs::read_to_string) | Entire content as UTF-8 text |
//! | [`write_bytes`](UriFs::write_bytes) | Replace content with bytes |
//! | [`write_string`](UriFs::write_string) | Replace content with text |
//!
//! ## JSON Support (Feature-Gated)
//!
//! With the `serde` feature enabled, additional methods are available:
//!
//! | Method | Description |
//! |--------|-------------|
//! | `read_json` | Read and deserialize a JSON resource |
//! | `write_json` | Serialize and write a JSON resource |
//!
//! Enable with:
//! ```toml
//! [dependencies]
//! anyfs-uri = { version = "0.1", features = ["serde"] }
//! ```

use crate::{Access, Backend, FsError, UriFs};

impl<B: Backend> UriFs<B> {
    /// Read the whole resource.
    ///
    /// # Errors
    ///
    /// - [`FsError::Io`] if the resource is missing or unreadable
    pub fn read_bytes(&self, uri: &str) -> Result<Vec<u8>, FsError> {
        let mut stream = self.open_binary(uri, Access::Read)?;
        let data = stream.read_all()?;
        stream.close()?;
        Ok(data)
    }

    /// Read the whole resource as UTF-8.
    ///
    /// # Errors
    ///
    /// - [`FsError::Io`] if the resource is missing or unreadable
    /// - [`FsError::InvalidData`] if the content is not valid UTF-8
    pub fn read_to_string(&self, uri: &str) -> Result<String, FsError> {
        let mut stream = self.open_text(uri, Access::Read)?;
        let text = stream.read_all()?;
        stream.close()?;
        Ok(text)
    }

    /// Replace the content of `uri` with `data`, creating it if absent.
    ///
    /// Unlike a write-mode stream, trailing old content is cut off.
    pub fn write_bytes(&self, uri: &str, data: &[u8]) -> Result<(), FsError> {
        let mut stream = self.open_binary(uri, Access::Write)?;
        stream.write(data)?;
        stream.truncate(None)?;
        stream.close()
    }

    /// Replace the content of `uri` with `text`.
    pub fn write_string(&self, uri: &str, text: &str) -> Result<(), FsError> {
        self.write_bytes(uri, text.as_bytes())
    }
}

#[cfg(feature = "serde")]
mod json {
    use super::*;
    use serde::{Serialize, de::DeserializeOwned};

    impl<B: Backend> UriFs<B> {
        /// Read a resource and deserialize it as JSON.
        ///
        /// # Errors
        ///
        /// - [`FsError::Io`] if the resource is missing or unreadable
        /// - [`FsError::InvalidData`] if it isn't valid UTF-8
        /// - [`FsError::Deserialization`] if JSON parsing failed
        pub fn read_json<T: DeserializeOwned>(&self, uri: &str) -> Result<T, FsError> {
            let data = self.read_to_string(uri)?;
            serde_json::from_str(&data).map_err(|e| FsError::Deserialization(e.to_string()))
        }

        /// Serialize a value and write it as pretty-printed JSON.
        ///
        /// # Errors
        ///
        /// - [`FsError::Serialization`] if serialization failed
        /// - Any error of [`write_bytes`](UriFs::write_bytes)
        pub fn write_json<T: Serialize>(&self, uri: &str, value: &T) -> Result<(), FsError> {
            let json = serde_json::to_string_pretty(value)
                .map_err(|e| FsError::Serialization(e.to_string()))?;
            self.write_bytes(uri, json.as_bytes())
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{FsError, MemoryBackend, UriFs};

    fn fs() -> UriFs<MemoryBackend> {
        UriFs::new(MemoryBackend::new())
    }

    #[test]
    fn write_then_read_bytes() {
        let fs = fs();
        fs.write_bytes("mem://x/blob", &[0, 1, 2, 255]).unwrap();
        assert_eq!(fs.read_bytes("mem://x/blob").unwrap(), [0, 1, 2, 255]);
    }

    #[test]
    fn write_replaces_longer_content() {
        let fs = fs();
        fs.write_string("mem://x/note", "a long first draft").unwrap();
        fs.write_string("mem://x/note", "short").unwrap();
        assert_eq!(fs.read_to_string("mem://x/note").unwrap(), "short");
    }

    #[test]
    fn read_missing_is_io_error() {
        assert!(fs().read_bytes("mem://x/none").unwrap_err().is_io());
    }

    #[test]
    fn read_to_string_rejects_invalid_utf8() {
        let fs = fs();
        fs.write_bytes("mem://x/bin", &[0xc3, 0x28]).unwrap();
        assert!(matches!(
            fs.read_to_string("mem://x/bin"),
            Err(FsError::InvalidData { .. })
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_round_trip() {
        let fs = fs();
        let value = serde_json::json!({ "pages": 3, "labels": ["tax", "2024"] });
        fs.write_json("mem://x/doc.json", &value).unwrap();
        let back: serde_json::Value = fs.read_json("mem://x/doc.json").unwrap();
        assert_eq!(back, value);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn bad_json_is_deserialization_error() {
        let fs = fs();
        fs.write_string("mem://x/doc.json", "{ nope").unwrap();
        let result: Result<serde_json::Value, _> = fs.read_json("mem://x/doc.json");
        assert!(matches!(result, Err(FsError::Deserialization(_))));
    }
}
