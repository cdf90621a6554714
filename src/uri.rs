//! # URI Safety Codec
//!
//! Converts between bare local paths ("unsafe" form) and `scheme://` URIs
//! ("safe" form), and provides the URI arithmetic the facade needs.
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`safe`] | Bare path to `file://` URI; absolute URIs pass through |
//! | [`unsafe_path`] | `file://` URI to bare path; other schemes are rejected |
//! | [`join`] | Join a relative reference onto a base treated as a directory |
//! | [`basename`] | Final path segment, percent-decoded |
//! | [`dirname`] | Everything before the final segment, left encoded |
//! | [`child`] | URI of a named child of a container |
//!
//! ```rust
//! use anyfs_uri::uri;
//! use std::path::Path;
//!
//! let u = uri::safe("/tmp/my notes.txt");
//! assert_eq!(u, "file:///tmp/my%20notes.txt");
//! assert_eq!(uri::unsafe_path(&u).unwrap(), Path::new("/tmp/my notes.txt"));
//! assert_eq!(uri::basename(&u).unwrap(), "my notes.txt");
//! assert_eq!(uri::dirname(&u), "file:///tmp");
//! ```

use std::path::{Component, Path, PathBuf};

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use url::Url;

use crate::FsError;

/// Scheme separator.
const SCHEME_SEPARATOR: &str = "://";

/// Prefix of local-file URIs.
const FILE_PREFIX: &str = "file://";

/// Bytes left unescaped in a path: unreserved characters plus `/`.
const PATH: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Bytes left unescaped in a single segment.
const SEGMENT: &AsciiSet = &PATH.add(b'/');

/// Returns `true` if `uri` carries a `scheme://` prefix.
#[inline]
pub fn has_scheme(uri: &str) -> bool {
    uri.contains(SCHEME_SEPARATOR)
}

/// Scheme of `uri`, if it has one.
pub fn scheme(uri: &str) -> Option<&str> {
    uri.split_once(SCHEME_SEPARATOR).map(|(scheme, _)| scheme)
}

/// Convert a bare local path to a `file://` URI.
///
/// Input that already has a scheme is returned unchanged, so `safe` is
/// idempotent on absolute URIs.
pub fn safe(uri: &str) -> String {
    if has_scheme(uri) {
        return uri.to_owned();
    }
    format!("{FILE_PREFIX}{}", utf8_percent_encode(uri, PATH))
}

/// Convert a `file://` URI back to a bare local path.
///
/// Schemeless input is already a bare path and is returned unchanged.
///
/// # Errors
///
/// - [`FsError::UnsupportedScheme`] for any scheme other than `file`
pub fn unsafe_path(uri: &str) -> Result<PathBuf, FsError> {
    if !has_scheme(uri) {
        return Ok(PathBuf::from(uri));
    }
    let rest = uri
        .strip_prefix(FILE_PREFIX)
        .ok_or_else(|| FsError::UnsupportedScheme {
            uri: uri.to_owned(),
        })?;
    Ok(PathBuf::from(
        percent_decode_str(rest).decode_utf8_lossy().into_owned(),
    ))
}

/// Join `relative` onto `base`, treating `base` as a directory.
///
/// A trailing `/` is added to `base` when missing, so the last base segment
/// is kept. Bare paths are joined lexically, with `.` and `..` segments
/// resolved the way URI references resolve them.
///
/// # Errors
///
/// - [`FsError::InvalidUri`] if `base` cannot be parsed or the join fails
pub fn join(base: &str, relative: &str) -> Result<String, FsError> {
    if !has_scheme(base) {
        if has_scheme(relative) {
            return Ok(relative.to_owned());
        }
        let joined = normalize(&Path::new(base).join(relative));
        return Ok(joined.to_string_lossy().into_owned());
    }

    let mut base = base.to_owned();
    if !base.ends_with('/') {
        base.push('/');
    }
    let parsed = parse(&base)?;
    parsed
        .join(relative)
        .map(String::from)
        .map_err(|e| FsError::InvalidUri {
            uri: relative.to_owned(),
            reason: e.to_string(),
        })
}

/// Lexically drop `.` segments and fold `..` into the preceding segment.
///
/// `..` never climbs above a root; on a relative path with nothing left to
/// pop it is kept.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other),
        }
    }
    out
}

/// Final path segment of `uri`, percent-decoded.
///
/// # Errors
///
/// - [`FsError::InvalidUri`] if `uri` has a scheme but cannot be parsed
pub fn basename(uri: &str) -> Result<String, FsError> {
    let path = if has_scheme(uri) {
        parse(uri)?.path().to_owned()
    } else {
        uri.to_owned()
    };
    let name = path.rsplit('/').next().unwrap_or_default();
    Ok(percent_decode_str(name).decode_utf8_lossy().into_owned())
}

/// Everything before the final segment of `uri`.
///
/// Not percent-decoded: decoding could turn an escaped `%2F` into a literal
/// separator and corrupt the URI. Trailing separators of the result are
/// stripped unless the result consists only of separators.
pub fn dirname(uri: &str) -> String {
    let head = match uri.rfind('/') {
        Some(i) => &uri[..=i],
        None => return String::new(),
    };
    if head.bytes().all(|b| b == b'/') {
        return head.to_owned();
    }
    head.trim_end_matches('/').to_owned()
}

/// URI of the child called `name` inside the container `parent`.
///
/// `name` is a raw (decoded) entry name; it is percent-encoded as a single
/// segment.
pub fn child(parent: &str, name: &str) -> String {
    let encoded = utf8_percent_encode(name, SEGMENT);
    if parent.ends_with('/') {
        format!("{parent}{encoded}")
    } else {
        format!("{parent}/{encoded}")
    }
}

fn parse(uri: &str) -> Result<Url, FsError> {
    Url::parse(uri).map_err(|e| FsError::InvalidUri {
        uri: uri.to_owned(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_encodes_local_paths() {
        assert_eq!(safe("/tmp/a b"), "file:///tmp/a%20b");
        assert_eq!(safe("/tmp/100%.txt"), "file:///tmp/100%25.txt");
        assert_eq!(safe("/tmp/été"), "file:///tmp/%C3%A9t%C3%A9");
        assert_eq!(safe("/tmp/keep-these_.~"), "file:///tmp/keep-these_.~");
    }

    #[test]
    fn safe_is_identity_on_absolute_uris() {
        for u in [
            "file:///tmp/x",
            "smb://host/share/a%20b",
            "mem://bucket/with space",
        ] {
            assert_eq!(safe(u), u);
            assert_eq!(safe(&safe(u)), safe(u));
        }
    }

    #[test]
    fn unsafe_round_trips_escaped_paths() {
        for p in [
            "/tmp/plain",
            "/tmp/a b/c d.pdf",
            "/tmp/percent%20literal",
            "/tmp/q?uery#frag",
            "/tmp/日本語/ファイル.txt",
            "relative/dir name",
        ] {
            assert_eq!(unsafe_path(&safe(p)).unwrap(), PathBuf::from(p));
        }
    }

    #[test]
    fn unsafe_passes_bare_paths_through() {
        assert_eq!(unsafe_path("/a b/c").unwrap(), PathBuf::from("/a b/c"));
    }

    #[test]
    fn unsafe_rejects_remote_schemes() {
        let err = unsafe_path("smb://host/share").unwrap_err();
        assert!(matches!(err, FsError::UnsupportedScheme { .. }));
    }

    #[test]
    fn join_keeps_last_base_segment() {
        assert_eq!(
            join("file:///home/user/docs", "paper.pdf").unwrap(),
            "file:///home/user/docs/paper.pdf"
        );
        assert_eq!(
            join("file:///home/user/docs/", "paper.pdf").unwrap(),
            "file:///home/user/docs/paper.pdf"
        );
    }

    #[test]
    fn join_resolves_dot_segments() {
        assert_eq!(
            join("mem://bucket/a/b", "../c").unwrap(),
            "mem://bucket/a/c"
        );
    }

    #[test]
    fn join_bare_paths() {
        assert_eq!(join("/home/user", "x.txt").unwrap(), "/home/user/x.txt");
        assert_eq!(join("/home/user", "mem://b/x").unwrap(), "mem://b/x");
    }

    #[test]
    fn join_bare_paths_resolves_dot_segments() {
        assert_eq!(join("/home/user", "../x").unwrap(), "/home/x");
        assert_eq!(join("/home/user", "./x").unwrap(), "/home/user/x");
        assert_eq!(join("/home/user/", "a/../../b/./c").unwrap(), "/home/b/c");
        assert_eq!(join("/", "../../x").unwrap(), "/x");
        assert_eq!(join("a", "../../x").unwrap(), "../x");
    }

    #[test]
    fn basename_decodes() {
        assert_eq!(basename("file:///tmp/a%20b.txt").unwrap(), "a b.txt");
        assert_eq!(basename("/tmp/a%20b.txt").unwrap(), "a b.txt");
        assert_eq!(basename("file:///tmp/dir/").unwrap(), "");
    }

    #[test]
    fn dirname_does_not_decode() {
        assert_eq!(dirname("file:///tmp/a%2Fb/c"), "file:///tmp/a%2Fb");
        assert_eq!(dirname("/tmp/x"), "/tmp");
        assert_eq!(dirname("/x"), "/");
        assert_eq!(dirname("x"), "");
    }

    #[test]
    fn child_encodes_single_segment() {
        assert_eq!(child("mem://b/dir", "a b"), "mem://b/dir/a%20b");
        assert_eq!(child("mem://b/dir/", "x/y"), "mem://b/dir/x%2Fy");
    }

    #[test]
    fn scheme_extraction() {
        assert_eq!(scheme("file:///x"), Some("file"));
        assert_eq!(scheme("/x"), None);
    }
}
