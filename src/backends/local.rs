//! Local-disk backend for `file://` URIs.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use crate::uri;
use crate::{
    Backend, BackendError, ChildNames, FileType, InputStream, Metadata, OutputStream, ReadHandle,
    ReadWriteHandle, Seekable,
};

/// Backend serving `file://` URIs from the local filesystem.
///
/// Other schemes are rejected with
/// [`FsError::UnsupportedScheme`](crate::FsError::UnsupportedScheme) as the
/// source error. Paths are percent-decoded with [`uri::unsafe_path`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalBackend;

impl LocalBackend {
    /// Create a local backend.
    pub fn new() -> Self {
        Self
    }
}

fn path(uri: &str) -> Result<PathBuf, BackendError> {
    Ok(uri::unsafe_path(uri)?)
}

fn already_exists(path: &std::path::Path) -> BackendError {
    io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("{} already exists", path.display()),
    )
    .into()
}

fn metadata_of(meta: &fs::Metadata) -> io::Result<Metadata> {
    let ft = meta.file_type();
    let file_type = if ft.is_file() {
        FileType::File
    } else if ft.is_dir() {
        FileType::Directory
    } else if ft.is_symlink() {
        FileType::Symlink
    } else {
        FileType::Other
    };
    Ok(Metadata {
        file_type,
        size: meta.len(),
        modified: meta.modified()?,
    })
}

impl Backend for LocalBackend {
    fn stat(&self, uri: &str) -> Result<Metadata, BackendError> {
        let meta = fs::metadata(path(uri)?)?;
        Ok(metadata_of(&meta)?)
    }

    fn exists(&self, uri: &str) -> Result<bool, BackendError> {
        Ok(path(uri)?.try_exists()?)
    }

    fn open_read(&self, uri: &str) -> Result<Box<dyn ReadHandle>, BackendError> {
        let file = File::open(path(uri)?)?;
        Ok(Box::new(LocalHandle(Some(file))))
    }

    fn open_readwrite(&self, uri: &str) -> Result<Box<dyn ReadWriteHandle>, BackendError> {
        let file = OpenOptions::new().read(true).write(true).open(path(uri)?)?;
        Ok(Box::new(LocalReadWrite::new(file)?))
    }

    fn create_readwrite(&self, uri: &str) -> Result<Box<dyn ReadWriteHandle>, BackendError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path(uri)?)?;
        Ok(Box::new(LocalReadWrite::new(file)?))
    }

    fn enumerate_children(&self, uri: &str) -> Result<ChildNames, BackendError> {
        let entries = fs::read_dir(path(uri)?)?;
        Ok(ChildNames::new(entries.map(|entry| {
            let name = entry?.file_name();
            name.into_string().map_err(|raw| {
                BackendError::from(format!("entry name is not valid UTF-8: {raw:?}"))
            })
        })))
    }

    fn move_to(&self, from: &str, to: &str) -> Result<(), BackendError> {
        let from = path(from)?;
        let to = path(to)?;
        if to.try_exists()? {
            return Err(already_exists(&to));
        }
        fs::rename(from, to)?;
        Ok(())
    }

    fn delete(&self, uri: &str) -> Result<(), BackendError> {
        let path = path(uri)?;
        if fs::symlink_metadata(&path)?.is_dir() {
            fs::remove_dir(path)?;
        } else {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn copy(&self, from: &str, to: &str, preserve_metadata: bool) -> Result<(), BackendError> {
        let from = path(from)?;
        let to = path(to)?;
        let source = fs::metadata(&from)?;
        if source.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is a directory", from.display()),
            )
            .into());
        }
        if to.try_exists()? {
            return Err(already_exists(&to));
        }
        fs::copy(&from, &to)?;
        if preserve_metadata {
            let target = OpenOptions::new().write(true).open(&to)?;
            target.set_modified(source.modified()?)?;
        }
        Ok(())
    }
}

/// An open file, released by dropping it.
struct LocalHandle(Option<File>);

impl LocalHandle {
    fn file(&mut self) -> Result<&mut File, BackendError> {
        self.0
            .as_mut()
            .ok_or_else(|| io::Error::other("handle already closed").into())
    }

    fn release(&mut self) {
        self.0.take();
    }
}

impl InputStream for LocalHandle {
    fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>, BackendError> {
        let mut buf = Vec::with_capacity(count.min(64 * 1024));
        let file = self.file()?;
        file.take(count as u64).read_to_end(&mut buf)?;
        Ok(buf)
    }

    fn tell(&mut self) -> Result<u64, BackendError> {
        Ok(self.file()?.stream_position()?)
    }

    fn close(&mut self) -> Result<(), BackendError> {
        self.release();
        Ok(())
    }
}

impl OutputStream for LocalHandle {
    fn write_all(&mut self, data: &[u8]) -> Result<usize, BackendError> {
        self.file()?.write_all(data)?;
        Ok(data.len())
    }

    fn close(&mut self) -> Result<(), BackendError> {
        let flushed = match self.0.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        };
        self.release();
        Ok(flushed?)
    }
}

impl Seekable for LocalHandle {
    fn seek(&mut self, pos: SeekFrom) -> Result<u64, BackendError> {
        Ok(self.file()?.seek(pos)?)
    }

    fn truncate(&mut self, size: u64) -> Result<(), BackendError> {
        Ok(self.file()?.set_len(size)?)
    }
}

/// Read-write file with input and output sides on cloned descriptors, which
/// share the file offset.
struct LocalReadWrite {
    owner: LocalHandle,
    input: LocalHandle,
    output: LocalHandle,
}

impl LocalReadWrite {
    fn new(file: File) -> io::Result<Self> {
        Ok(Self {
            input: LocalHandle(Some(file.try_clone()?)),
            output: LocalHandle(Some(file.try_clone()?)),
            owner: LocalHandle(Some(file)),
        })
    }
}

impl Seekable for LocalReadWrite {
    fn seek(&mut self, pos: SeekFrom) -> Result<u64, BackendError> {
        self.owner.seek(pos)
    }

    fn truncate(&mut self, size: u64) -> Result<(), BackendError> {
        self.owner.truncate(size)
    }
}

impl ReadWriteHandle for LocalReadWrite {
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
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn setup() -> (TempDir, LocalBackend) {
        (tempfile::tempdir().unwrap(), LocalBackend::new())
    }

    fn uri_of(dir: &TempDir, name: &str) -> String {
        uri::safe(&dir.path().join(name).to_string_lossy())
    }

    #[test]
    fn stat_reports_type_and_size() {
        let (dir, backend) = setup();
        fs::write(dir.path().join("f"), b"12345").unwrap();
        let meta = backend.stat(&uri_of(&dir, "f")).unwrap();
        assert!(meta.is_file());
        assert_eq!(meta.size, 5);
        let dir_uri = uri::safe(&dir.path().to_string_lossy());
        assert!(backend.stat(&dir_uri).unwrap().is_dir());
    }

    #[test]
    fn non_file_scheme_is_rejected() {
        let backend = LocalBackend::new();
        let err = backend.stat("smb://host/share").unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[test]
    fn read_write_sides_share_offset() {
        let (dir, backend) = setup();
        fs::write(dir.path().join("f"), b"abc").unwrap();
        let mut handle = backend.open_readwrite(&uri_of(&dir, "f")).unwrap();
        handle.seek(SeekFrom::End(0)).unwrap();
        handle.output().write_all(b"def").unwrap();
        assert_eq!(handle.input().tell().unwrap(), 6);
        handle.seek(SeekFrom::Start(1)).unwrap();
        assert_eq!(handle.input().read_bytes(3).unwrap(), b"bcd");
        handle.truncate(2).unwrap();
        handle.output().close().unwrap();
        handle.input().close().unwrap();
        handle.close().unwrap();
        assert_eq!(fs::read(dir.path().join("f")).unwrap(), b"ab");
    }

    #[test]
    fn create_refuses_existing() {
        let (dir, backend) = setup();
        fs::write(dir.path().join("f"), b"").unwrap();
        assert!(backend.create_readwrite(&uri_of(&dir, "f")).is_err());
    }

    #[test]
    fn enumerate_returns_raw_names() {
        let (dir, backend) = setup();
        fs::write(dir.path().join("a b"), b"").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let dir_uri = uri::safe(&dir.path().to_string_lossy());
        let mut names: Vec<_> = backend
            .enumerate_children(&dir_uri)
            .unwrap()
            .map(Result::unwrap)
            .collect();
        names.sort();
        assert_eq!(names, ["a b", "sub"]);
    }

    #[test]
    fn delete_refuses_non_empty_directory() {
        let (dir, backend) = setup();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/f"), b"").unwrap();
        assert!(backend.delete(&uri_of(&dir, "sub")).is_err());
        backend.delete(&uri_of(&dir, "sub/f")).unwrap();
        backend.delete(&uri_of(&dir, "sub")).unwrap();
        assert!(!dir.path().join("sub").exists());
    }

    #[test]
    fn move_refuses_existing_target() {
        let (dir, backend) = setup();
        fs::write(dir.path().join("a"), b"a").unwrap();
        fs::write(dir.path().join("b"), b"b").unwrap();
        assert!(backend.move_to(&uri_of(&dir, "a"), &uri_of(&dir, "b")).is_err());
        backend.move_to(&uri_of(&dir, "a"), &uri_of(&dir, "c")).unwrap();
        assert_eq!(fs::read(dir.path().join("c")).unwrap(), b"a");
    }

    #[test]
    fn copy_preserves_mtime() {
        let (dir, backend) = setup();
        let src = dir.path().join("src");
        fs::write(&src, b"data").unwrap();
        let past = SystemTime::now() - Duration::from_secs(3600);
        File::options()
            .write(true)
            .open(&src)
            .unwrap()
            .set_modified(past)
            .unwrap();

        backend
            .copy(&uri_of(&dir, "src"), &uri_of(&dir, "dst"), true)
            .unwrap();
        let copied = backend.stat(&uri_of(&dir, "dst")).unwrap();
        assert_eq!(copied.modified, fs::metadata(&src).unwrap().modified().unwrap());
        assert_eq!(fs::read(dir.path().join("dst")).unwrap(), b"data");
    }
}
