//! Core types for the URI filesystem layer.

use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;

use crate::FsError;

/// Platform line separator used by the text layer.
#[cfg(windows)]
pub const LINE_SEPARATOR: &str = "\r\n";

/// Platform line separator used by the text layer.
#[cfg(not(windows))]
pub const LINE_SEPARATOR: &str = "\n";

/// Type of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FileType {
    /// Regular file.
    File,
    /// Directory (container).
    Directory,
    /// Symbolic link.
    Symlink,
    /// Anything else the backend reports (special files, mountables, ...).
    Other,
}

/// Metadata for a resource, as reported by [`Backend::stat`](crate::Backend::stat).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Metadata {
    /// Type of the resource.
    pub file_type: FileType,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time.
    #[cfg_attr(feature = "serde", serde(with = "system_time_serde"))]
    pub modified: SystemTime,
}

impl Metadata {
    /// Returns `true` if this is a regular file.
    #[inline]
    pub fn is_file(&self) -> bool {
        self.file_type == FileType::File
    }

    /// Returns `true` if this is a directory.
    #[inline]
    pub fn is_dir(&self) -> bool {
        self.file_type == FileType::Directory
    }
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            file_type: FileType::File,
            size: 0,
            modified: SystemTime::UNIX_EPOCH,
        }
    }
}

/// Access discipline of an open stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Access {
    /// Read an existing resource.
    Read,
    /// Write from the start, creating the resource if absent.
    Write,
    /// Write from the end of data, creating the resource if absent.
    Append,
}

/// How stream content is presented to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Content {
    /// Raw bytes ([`ByteStream`](crate::ByteStream)).
    Binary,
    /// UTF-8 text ([`TextStream`](crate::TextStream)).
    Text,
}

/// Mode a stream is opened with.
///
/// Built once at the call site, either from the constants or by parsing a
/// mode string such as `"rb"`, `"w"` or `"a"`:
///
/// ```rust
/// use anyfs_uri::{Access, Content, OpenMode};
///
/// let mode: OpenMode = "ab".parse().unwrap();
/// assert_eq!(mode, OpenMode::APPEND_BINARY);
/// assert_eq!(mode.access, Access::Append);
/// assert_eq!("r".parse::<OpenMode>().unwrap().content, Content::Text);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OpenMode {
    /// Access discipline.
    pub access: Access,
    /// Adapter wrapping.
    pub content: Content,
}

impl OpenMode {
    /// Read raw bytes.
    pub const READ_BINARY: Self = Self::new(Access::Read, Content::Binary);
    /// Read UTF-8 text.
    pub const READ_TEXT: Self = Self::new(Access::Read, Content::Text);
    /// Write raw bytes.
    pub const WRITE_BINARY: Self = Self::new(Access::Write, Content::Binary);
    /// Write UTF-8 text.
    pub const WRITE_TEXT: Self = Self::new(Access::Write, Content::Text);
    /// Append raw bytes.
    pub const APPEND_BINARY: Self = Self::new(Access::Append, Content::Binary);
    /// Append UTF-8 text.
    pub const APPEND_TEXT: Self = Self::new(Access::Append, Content::Text);

    /// Combine an access discipline and a content kind.
    #[inline]
    pub const fn new(access: Access, content: Content) -> Self {
        Self { access, content }
    }

    /// Returns `true` if the mode accepts writes. Append counts as writable.
    #[inline]
    pub const fn is_writable(&self) -> bool {
        matches!(self.access, Access::Write | Access::Append)
    }

    /// Returns `true` for binary mode.
    #[inline]
    pub const fn is_binary(&self) -> bool {
        matches!(self.content, Content::Binary)
    }
}

impl Default for OpenMode {
    fn default() -> Self {
        Self::READ_BINARY
    }
}

impl FromStr for OpenMode {
    type Err = FsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || FsError::InvalidMode { mode: s.to_owned() };

        let mut access = None;
        let mut content = None;
        for c in s.chars() {
            match c {
                'r' | 'w' | 'a' if access.is_none() => {
                    access = Some(match c {
                        'r' => Access::Read,
                        'w' => Access::Write,
                        _ => Access::Append,
                    });
                }
                'b' | 't' if content.is_none() => {
                    content = Some(if c == 'b' {
                        Content::Binary
                    } else {
                        Content::Text
                    });
                }
                _ => return Err(invalid()),
            }
        }

        let access = access.ok_or_else(invalid)?;
        Ok(Self::new(access, content.unwrap_or(Content::Text)))
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let access = match self.access {
            Access::Read => 'r',
            Access::Write => 'w',
            Access::Append => 'a',
        };
        let content = match self.content {
            Content::Binary => 'b',
            Content::Text => 't',
        };
        write!(f, "{access}{content}")
    }
}

/// Serde support for SystemTime (when serde feature is enabled).
#[cfg(feature = "serde")]
mod system_time_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    pub fn serialize<S>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let duration = time.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO);
        (duration.as_secs(), duration.subsec_nanos()).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SystemTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (secs, nanos): (u64, u32) = Deserialize::deserialize(deserializer)?;
        Ok(UNIX_EPOCH + Duration::new(secs, nanos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_is_dir() {
        let m = Metadata {
            file_type: FileType::Directory,
            ..Default::default()
        };
        assert!(m.is_dir());
        assert!(!m.is_file());
    }

    #[test]
    fn mode_parse_access_and_content() {
        assert_eq!("rb".parse::<OpenMode>().unwrap(), OpenMode::READ_BINARY);
        assert_eq!("r".parse::<OpenMode>().unwrap(), OpenMode::READ_TEXT);
        assert_eq!("wt".parse::<OpenMode>().unwrap(), OpenMode::WRITE_TEXT);
        assert_eq!("bw".parse::<OpenMode>().unwrap(), OpenMode::WRITE_BINARY);
        assert_eq!("a".parse::<OpenMode>().unwrap(), OpenMode::APPEND_TEXT);
    }

    #[test]
    fn mode_parse_rejects_ambiguous() {
        for bad in ["", "b", "rw", "ra", "rbt", "r+", "x"] {
            let err = bad.parse::<OpenMode>().unwrap_err();
            assert!(matches!(err, FsError::InvalidMode { .. }), "{bad:?}");
        }
    }

    #[test]
    fn append_is_writable() {
        assert!(OpenMode::APPEND_BINARY.is_writable());
        assert!(OpenMode::WRITE_TEXT.is_writable());
        assert!(!OpenMode::READ_BINARY.is_writable());
        assert!(!OpenMode::READ_TEXT.is_writable());
        assert!(OpenMode::READ_BINARY.is_binary());
        assert!(!OpenMode::APPEND_TEXT.is_binary());
    }

    #[test]
    fn mode_display_round_trips() {
        for mode in [
            OpenMode::READ_BINARY,
            OpenMode::WRITE_TEXT,
            OpenMode::APPEND_BINARY,
        ] {
            assert_eq!(mode.to_string().parse::<OpenMode>().unwrap(), mode);
        }
    }

    #[test]
    fn line_separator_ends_with_newline() {
        assert!(LINE_SEPARATOR.ends_with('\n'));
    }

    #[test]
    fn types_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FileType>();
        assert_send_sync::<Metadata>();
        assert_send_sync::<OpenMode>();
    }
}
