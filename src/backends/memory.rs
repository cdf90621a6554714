//! In-memory backend.

use std::collections::{BTreeMap, BTreeSet};
use std::io::SeekFrom;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::SystemTime;

use percent_encoding::percent_decode_str;

use crate::{
    Backend, BackendError, ChildNames, FileType, InputStream, Metadata, OutputStream, ReadHandle,
    ReadWriteHandle, Seekable,
};

/// Failures reported by [`MemoryBackend`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum MemoryError {
    /// Nothing stored under the URI.
    #[error("not found: {0}")]
    NotFound(String),

    /// The target of a create, move or copy is taken.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// A directory was expected.
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// A file was expected.
    #[error("is a directory: {0}")]
    IsADirectory(String),

    /// Directory deletion with children present.
    #[error("directory not empty: {0}")]
    DirectoryNotEmpty(String),

    /// Seek before the start of the data.
    #[error("invalid seek to a negative position")]
    NegativeSeek,

    /// Handle used after release.
    #[error("handle already closed")]
    Closed,

    /// The requested length cannot be held in memory.
    #[error("file too large: {0} bytes")]
    TooLarge(u64),
}

#[derive(Debug)]
struct FileData {
    bytes: Vec<u8>,
    modified: SystemTime,
}

type SharedData = Arc<RwLock<FileData>>;

#[derive(Debug)]
enum Node {
    File(SharedData),
    Directory { modified: SystemTime },
}

/// Backend that keeps every resource in memory, keyed by URI.
///
/// Any scheme is accepted; the URI string (minus trailing slashes) is the
/// key. Directories are implicit: a URI with stored descendants is a
/// directory even if it was never created with
/// [`create_dir`](Self::create_dir).
///
/// Open handles share the stored bytes, so writes are visible to other
/// handles and to metadata queries immediately.
///
/// # Example
///
/// ```rust
/// use anyfs_uri::{MemoryBackend, UriFs};
///
/// let backend = MemoryBackend::new();
/// backend.insert_file("mem://inbox/scan.pdf", b"%PDF-1.7");
/// let fs = UriFs::new(backend);
/// assert!(fs.is_dir("mem://inbox")?);
/// assert_eq!(fs.size("mem://inbox/scan.pdf")?, 8);
/// # Ok::<(), anyfs_uri::FsError>(())
/// ```
#[derive(Debug, Default)]
pub struct MemoryBackend {
    nodes: RwLock<BTreeMap<String, Node>>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `bytes` under `uri`, replacing any previous file.
    pub fn insert_file(&self, uri: &str, bytes: &[u8]) {
        let data = Arc::new(RwLock::new(FileData {
            bytes: bytes.to_vec(),
            modified: SystemTime::now(),
        }));
        self.write_nodes().insert(key(uri), Node::File(data));
    }

    /// Create an explicit (possibly empty) directory at `uri`.
    pub fn create_dir(&self, uri: &str) {
        self.write_nodes().insert(
            key(uri),
            Node::Directory {
                modified: SystemTime::now(),
            },
        );
    }

    fn read_nodes(&self) -> RwLockReadGuard<'_, BTreeMap<String, Node>> {
        self.nodes.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_nodes(&self) -> RwLockWriteGuard<'_, BTreeMap<String, Node>> {
        self.nodes.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn file(&self, uri: &str) -> Result<SharedData, MemoryError> {
        let key = key(uri);
        let nodes = self.read_nodes();
        match nodes.get(&key) {
            Some(Node::File(data)) => Ok(Arc::clone(data)),
            Some(Node::Directory { .. }) => Err(MemoryError::IsADirectory(key)),
            None if has_descendants(&nodes, &key) => Err(MemoryError::IsADirectory(key)),
            None => Err(MemoryError::NotFound(key)),
        }
    }
}

/// Storage key of `uri`: trailing slashes are not significant.
fn key(uri: &str) -> String {
    let trimmed = uri.trim_end_matches('/');
    if trimmed.is_empty() || trimmed.ends_with(':') {
        uri.to_owned()
    } else {
        trimmed.to_owned()
    }
}

fn descendant_prefix(key: &str) -> String {
    if key.ends_with('/') {
        key.to_owned()
    } else {
        format!("{key}/")
    }
}

fn descendants<'a>(
    nodes: &'a BTreeMap<String, Node>,
    key: &str,
) -> impl Iterator<Item = (&'a String, &'a Node)> {
    let prefix = descendant_prefix(key);
    nodes
        .range(prefix.clone()..)
        .take_while(move |(k, _)| k.starts_with(&prefix))
}

fn has_descendants(nodes: &BTreeMap<String, Node>, key: &str) -> bool {
    descendants(nodes, key).next().is_some()
}

fn node_exists(nodes: &BTreeMap<String, Node>, key: &str) -> bool {
    nodes.contains_key(key) || has_descendants(nodes, key)
}

/// Fails if an ancestor of `key` is a regular file.
fn check_ancestors(nodes: &BTreeMap<String, Node>, key: &str) -> Result<(), MemoryError> {
    let start = key.find("://").map_or(0, |i| i + 3);
    for (i, _) in key[start..].match_indices('/') {
        let ancestor = &key[..start + i];
        if let Some(Node::File(_)) = nodes.get(ancestor) {
            return Err(MemoryError::NotADirectory(ancestor.to_owned()));
        }
    }
    Ok(())
}

/// Grow `bytes` with zeros up to `len`, refusing lengths that cannot be
/// allocated.
fn grow(bytes: &mut Vec<u8>, len: u64) -> Result<(), MemoryError> {
    let target = usize::try_from(len).map_err(|_| MemoryError::TooLarge(len))?;
    if let Some(additional) = target.checked_sub(bytes.len()) {
        bytes
            .try_reserve_exact(additional)
            .map_err(|_| MemoryError::TooLarge(len))?;
    }
    bytes.resize(target, 0);
    Ok(())
}

fn read_data(data: &SharedData) -> RwLockReadGuard<'_, FileData> {
    data.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_data(data: &SharedData) -> RwLockWriteGuard<'_, FileData> {
    data.write().unwrap_or_else(PoisonError::into_inner)
}

impl Backend for MemoryBackend {
    fn stat(&self, uri: &str) -> Result<Metadata, BackendError> {
        let key = key(uri);
        let nodes = self.read_nodes();
        let meta = match nodes.get(&key) {
            Some(Node::File(data)) => {
                let data = read_data(data);
                Metadata {
                    file_type: FileType::File,
                    size: data.bytes.len() as u64,
                    modified: data.modified,
                }
            }
            Some(Node::Directory { modified }) => Metadata {
                file_type: FileType::Directory,
                size: 0,
                modified: *modified,
            },
            None if has_descendants(&nodes, &key) => Metadata {
                file_type: FileType::Directory,
                ..Metadata::default()
            },
            None => return Err(MemoryError::NotFound(key).into()),
        };
        Ok(meta)
    }

    fn exists(&self, uri: &str) -> Result<bool, BackendError> {
        Ok(node_exists(&self.read_nodes(), &key(uri)))
    }

    fn open_read(&self, uri: &str) -> Result<Box<dyn ReadHandle>, BackendError> {
        let data = self.file(uri)?;
        Ok(Box::new(Side::new(Cursor::new(data))))
    }

    fn open_readwrite(&self, uri: &str) -> Result<Box<dyn ReadWriteHandle>, BackendError> {
        let data = self.file(uri)?;
        Ok(Box::new(MemoryReadWrite::new(Cursor::new(data))))
    }

    fn create_readwrite(&self, uri: &str) -> Result<Box<dyn ReadWriteHandle>, BackendError> {
        let key = key(uri);
        let mut nodes = self.write_nodes();
        if node_exists(&nodes, &key) {
            return Err(MemoryError::AlreadyExists(key).into());
        }
        check_ancestors(&nodes, &key)?;
        let data = Arc::new(RwLock::new(FileData {
            bytes: Vec::new(),
            modified: SystemTime::now(),
        }));
        nodes.insert(key, Node::File(Arc::clone(&data)));
        Ok(Box::new(MemoryReadWrite::new(Cursor::new(data))))
    }

    fn enumerate_children(&self, uri: &str) -> Result<ChildNames, BackendError> {
        let key = key(uri);
        let nodes = self.read_nodes();
        match nodes.get(&key) {
            Some(Node::File(_)) => return Err(MemoryError::NotADirectory(key).into()),
            Some(Node::Directory { .. }) => {}
            None if has_descendants(&nodes, &key) => {}
            None => return Err(MemoryError::NotFound(key).into()),
        }

        let prefix = descendant_prefix(&key);
        let segments: BTreeSet<&str> = descendants(&nodes, &key)
            .filter_map(|(child, _)| child[prefix.len()..].split('/').next())
            .collect();
        let names = segments
            .into_iter()
            .map(|name| percent_decode_str(name).decode_utf8_lossy().into_owned())
            .collect();
        Ok(ChildNames::from_names(names))
    }

    fn move_to(&self, from: &str, to: &str) -> Result<(), BackendError> {
        let from = key(from);
        let to = key(to);
        let mut nodes = self.write_nodes();
        if !node_exists(&nodes, &from) {
            return Err(MemoryError::NotFound(from).into());
        }
        if node_exists(&nodes, &to) {
            return Err(MemoryError::AlreadyExists(to).into());
        }
        check_ancestors(&nodes, &to)?;

        let prefix = descendant_prefix(&from);
        let moved: Vec<String> = nodes
            .keys()
            .filter(|k| **k == from || k.starts_with(&prefix))
            .cloned()
            .collect();
        for old in moved {
            if let Some(node) = nodes.remove(&old) {
                let new = format!("{to}{}", &old[from.len()..]);
                nodes.insert(new, node);
            }
        }
        Ok(())
    }

    fn delete(&self, uri: &str) -> Result<(), BackendError> {
        let key = key(uri);
        let mut nodes = self.write_nodes();
        if has_descendants(&nodes, &key) {
            return Err(MemoryError::DirectoryNotEmpty(key).into());
        }
        match nodes.remove(&key) {
            Some(_) => Ok(()),
            None => Err(MemoryError::NotFound(key).into()),
        }
    }

    fn copy(&self, from: &str, to: &str, preserve_metadata: bool) -> Result<(), BackendError> {
        let source = self.file(from)?;
        let to = key(to);
        let mut nodes = self.write_nodes();
        if node_exists(&nodes, &to) {
            return Err(MemoryError::AlreadyExists(to).into());
        }
        check_ancestors(&nodes, &to)?;
        let copied = {
            let source = read_data(&source);
            FileData {
                bytes: source.bytes.clone(),
                modified: if preserve_metadata {
                    source.modified
                } else {
                    SystemTime::now()
                },
            }
        };
        nodes.insert(to, Node::File(Arc::new(RwLock::new(copied))));
        Ok(())
    }
}

/// Position over shared file data. Clones share the position.
#[derive(Clone)]
struct Cursor {
    data: SharedData,
    pos: Arc<AtomicU64>,
}

impl Cursor {
    fn new(data: SharedData) -> Self {
        Self {
            data,
            pos: Arc::new(AtomicU64::new(0)),
        }
    }

    fn read(&self, count: usize) -> Vec<u8> {
        let data = read_data(&self.data);
        let len = data.bytes.len();
        let start = usize::try_from(self.pos.load(Ordering::SeqCst))
            .unwrap_or(usize::MAX)
            .min(len);
        let end = start.saturating_add(count).min(len);
        self.pos.store(end as u64, Ordering::SeqCst);
        data.bytes[start..end].to_vec()
    }

    fn write(&self, bytes: &[u8]) -> Result<usize, MemoryError> {
        let pos = self.pos.load(Ordering::SeqCst);
        let end = pos
            .checked_add(bytes.len() as u64)
            .ok_or(MemoryError::TooLarge(u64::MAX))?;
        let mut data = write_data(&self.data);
        if (data.bytes.len() as u64) < end {
            grow(&mut data.bytes, end)?;
        }
        // Both bounds fit in usize once the buffer holds `end` bytes.
        let (start, stop) = (pos as usize, end as usize);
        data.bytes[start..stop].copy_from_slice(bytes);
        data.modified = SystemTime::now();
        self.pos.store(end, Ordering::SeqCst);
        Ok(bytes.len())
    }

    fn seek(&self, pos: SeekFrom) -> Result<u64, MemoryError> {
        let (base, offset) = match pos {
            SeekFrom::Start(n) => (n, 0),
            SeekFrom::Current(d) => (self.pos.load(Ordering::SeqCst), d),
            SeekFrom::End(d) => (read_data(&self.data).bytes.len() as u64, d),
        };
        let target = base
            .checked_add_signed(offset)
            .ok_or(MemoryError::NegativeSeek)?;
        self.pos.store(target, Ordering::SeqCst);
        Ok(target)
    }

    fn truncate(&self, size: u64) -> Result<(), MemoryError> {
        let mut data = write_data(&self.data);
        if (data.bytes.len() as u64) < size {
            grow(&mut data.bytes, size)?;
        } else {
            data.bytes.truncate(size as usize);
        }
        data.modified = SystemTime::now();
        Ok(())
    }
}

/// One side of an open resource. Read mode hands this out as the owning
/// handle; read-write handles own one per direction.
struct Side {
    cursor: Cursor,
    open: bool,
}

impl Side {
    fn new(cursor: Cursor) -> Self {
        Self {
            cursor,
            open: true,
        }
    }

    fn cursor(&self) -> Result<&Cursor, MemoryError> {
        if self.open {
            Ok(&self.cursor)
        } else {
            Err(MemoryError::Closed)
        }
    }

    fn release(&mut self) {
        self.open = false;
    }
}

impl InputStream for Side {
    fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>, BackendError> {
        Ok(self.cursor()?.read(count))
    }

    fn tell(&mut self) -> Result<u64, BackendError> {
        Ok(self.cursor()?.pos.load(Ordering::SeqCst))
    }

    fn close(&mut self) -> Result<(), BackendError> {
        self.release();
        Ok(())
    }
}

impl OutputStream for Side {
    fn write_all(&mut self, data: &[u8]) -> Result<usize, BackendError> {
        Ok(self.cursor()?.write(data)?)
    }

    fn close(&mut self) -> Result<(), BackendError> {
        self.release();
        Ok(())
    }
}

impl Seekable for Side {
    fn seek(&mut self, pos: SeekFrom) -> Result<u64, BackendError> {
        Ok(self.cursor()?.seek(pos)?)
    }
}

struct MemoryReadWrite {
    owner: Side,
    input: Side,
    output: Side,
}

impl MemoryReadWrite {
    fn new(cursor: Cursor) -> Self {
        Self {
            owner: Side::new(cursor.clone()),
            input: Side::new(cursor.clone()),
            output: Side::new(cursor),
        }
    }
}

impl Seekable for MemoryReadWrite {
    fn seek(&mut self, pos: SeekFrom) -> Result<u64, BackendError> {
        Ok(self.owner.cursor()?.seek(pos)?)
    }

    fn truncate(&mut self, size: u64) -> Result<(), BackendError> {
        Ok(self.owner.cursor()?.truncate(size)?)
    }
}

impl ReadWriteHandle for MemoryReadWrite {
    fn input(&mut self) -> &mut dyn InputStream {
        &mut self.input
    }

    fn output(&mut self) -> &mut dyn OutputStream {
        &mut self.output
    }

    fn close(&mut self) -> Result<(), BackendError> {
        self.owner.release();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stat_file_and_implicit_directory() {
        let backend = MemoryBackend::new();
        backend.insert_file("mem://b/dir/f", b"abc");
        let file = backend.stat("mem://b/dir/f").unwrap();
        assert!(file.is_file());
        assert_eq!(file.size, 3);
        assert!(backend.stat("mem://b/dir").unwrap().is_dir());
        assert!(backend.stat("mem://b/dir/").unwrap().is_dir());
        assert!(backend.stat("mem://b/other").is_err());
    }

    #[test]
    fn sibling_prefix_is_not_a_child() {
        let backend = MemoryBackend::new();
        backend.insert_file("mem://b/ab", b"");
        assert!(!backend.exists("mem://b/a").unwrap());
    }

    #[test]
    fn enumerate_lists_direct_children_once() {
        let backend = MemoryBackend::new();
        backend.insert_file("mem://b/x", b"");
        backend.insert_file("mem://b/sub/deep", b"");
        backend.insert_file("mem://b/sub/deeper", b"");
        backend.insert_file("mem://b/a%20b", b"");
        let names: Vec<_> = backend
            .enumerate_children("mem://b")
            .unwrap()
            .map(Result::unwrap)
            .collect();
        assert_eq!(names, ["a b", "sub", "x"]);
    }

    #[test]
    fn enumerate_file_fails() {
        let backend = MemoryBackend::new();
        backend.insert_file("mem://b/x", b"");
        assert!(backend.enumerate_children("mem://b/x").is_err());
        assert!(backend.enumerate_children("mem://b/missing").is_err());
    }

    #[test]
    fn handles_share_position() {
        let backend = MemoryBackend::new();
        backend.insert_file("mem://b/f", b"hello");
        let mut handle = backend.open_readwrite("mem://b/f").unwrap();
        handle.seek(SeekFrom::End(0)).unwrap();
        handle.output().write_all(b" world").unwrap();
        assert_eq!(handle.input().tell().unwrap(), 11);
        handle.seek(SeekFrom::Start(6)).unwrap();
        assert_eq!(handle.input().read_bytes(10).unwrap(), b"world");
    }

    #[test]
    fn writes_are_visible_to_stat() {
        let backend = MemoryBackend::new();
        let mut handle = backend.create_readwrite("mem://b/new").unwrap();
        handle.output().write_all(b"1234").unwrap();
        assert_eq!(backend.stat("mem://b/new").unwrap().size, 4);
        handle.truncate(1).unwrap();
        assert_eq!(backend.stat("mem://b/new").unwrap().size, 1);
    }

    #[test]
    fn create_refuses_existing() {
        let backend = MemoryBackend::new();
        backend.insert_file("mem://b/f", b"");
        assert!(backend.create_readwrite("mem://b/f").is_err());
    }

    #[test]
    fn negative_seek_fails() {
        let backend = MemoryBackend::new();
        backend.insert_file("mem://b/f", b"ab");
        let mut handle = backend.open_read("mem://b/f").unwrap();
        assert!(handle.seek(SeekFrom::Current(-1)).is_err());
        assert_eq!(handle.seek(SeekFrom::End(-1)).unwrap(), 1);
    }

    #[test]
    fn closed_side_refuses_io() {
        let backend = MemoryBackend::new();
        backend.insert_file("mem://b/f", b"ab");
        let mut handle = backend.open_read("mem://b/f").unwrap();
        handle.close().unwrap();
        assert!(handle.read_bytes(1).is_err());
    }

    #[test]
    fn move_directory_carries_descendants() {
        let backend = MemoryBackend::new();
        backend.create_dir("mem://b/old");
        backend.insert_file("mem://b/old/f", b"x");
        backend.move_to("mem://b/old", "mem://b/new").unwrap();
        assert!(!backend.exists("mem://b/old").unwrap());
        assert!(backend.stat("mem://b/new").unwrap().is_dir());
        assert!(backend.stat("mem://b/new/f").unwrap().is_file());
    }

    #[test]
    fn move_and_copy_refuse_existing_target() {
        let backend = MemoryBackend::new();
        backend.insert_file("mem://b/a", b"a");
        backend.insert_file("mem://b/b", b"b");
        assert!(backend.move_to("mem://b/a", "mem://b/b").is_err());
        assert!(backend.copy("mem://b/a", "mem://b/b", true).is_err());
    }

    #[test]
    fn copy_without_preserve_refreshes_mtime() {
        let backend = MemoryBackend::new();
        backend.insert_file("mem://b/a", b"a");
        let before = backend.stat("mem://b/a").unwrap().modified;
        backend.copy("mem://b/a", "mem://b/c", false).unwrap();
        assert!(backend.stat("mem://b/c").unwrap().modified >= before);
    }

    #[test]
    fn copy_directory_fails() {
        let backend = MemoryBackend::new();
        backend.create_dir("mem://b/d");
        assert!(backend.copy("mem://b/d", "mem://b/e", true).is_err());
    }

    #[test]
    fn oversized_truncate_is_refused() {
        let backend = MemoryBackend::new();
        let mut handle = backend.create_readwrite("mem://b/f").unwrap();
        let err = handle.truncate(u64::MAX).unwrap_err();
        assert!(err.to_string().contains("too large"), "{err}");
        assert_eq!(backend.stat("mem://b/f").unwrap().size, 0);
    }

    #[test]
    fn write_past_addressable_end_is_refused() {
        let backend = MemoryBackend::new();
        let mut handle = backend.create_readwrite("mem://b/f").unwrap();
        handle.seek(SeekFrom::Start(u64::MAX - 1)).unwrap();
        assert!(handle.output().write_all(b"abc").is_err());
        handle.seek(SeekFrom::Start(1 << 62)).unwrap();
        assert!(handle.output().write_all(b"abc").is_err());
        assert_eq!(backend.stat("mem://b/f").unwrap().size, 0);
    }

    #[test]
    fn truncate_can_extend_with_zeros() {
        let backend = MemoryBackend::new();
        backend.insert_file("mem://b/f", b"ab");
        let mut handle = backend.open_readwrite("mem://b/f").unwrap();
        handle.truncate(4).unwrap();
        assert_eq!(handle.input().read_bytes(8).unwrap(), b"ab\0\0");
    }

    #[test]
    fn file_cannot_become_a_parent() {
        let backend = MemoryBackend::new();
        backend.insert_file("mem://b/f", b"x");
        backend.insert_file("mem://b/g", b"y");

        let err = backend.create_readwrite("mem://b/f/child").err().unwrap();
        assert!(err.to_string().contains("not a directory: mem://b/f"), "{err}");
        assert!(backend.copy("mem://b/g", "mem://b/f/g", true).is_err());
        assert!(backend.move_to("mem://b/g", "mem://b/f/deep/g").is_err());

        assert!(!backend.exists("mem://b/f/child").unwrap());
        assert!(backend.stat("mem://b/f").unwrap().is_file());
        backend.delete("mem://b/f").unwrap();
    }

    #[test]
    fn nested_creation_under_directories_is_allowed() {
        let backend = MemoryBackend::new();
        backend.create_dir("mem://b/d");
        backend.create_readwrite("mem://b/d/e/f").unwrap();
        assert!(backend.stat("mem://b/d/e").unwrap().is_dir());
    }

    #[test]
    fn open_or_create_creates_then_reopens() {
        let backend = MemoryBackend::new();
        let mut handle = backend.open_or_create_readwrite("mem://b/f").unwrap();
        handle.output().write_all(b"first").unwrap();
        let mut again = backend.open_or_create_readwrite("mem://b/f").unwrap();
        assert_eq!(again.input().read_bytes(16).unwrap(), b"first");
    }
}
