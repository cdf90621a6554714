//! Basic usage of the URI filesystem facade.
//!
//! This example writes, appends to, reads back and copies a local file,
//! then round-trips a string through an in-memory mount.
//!
//! Run with: `cargo run --example basic_usage`

use anyfs_uri::{Access, LocalBackend, MemoryBackend, OpenMode, SchemeRouter, UriFs, uri};
use std::io::SeekFrom;

fn main() -> Result<(), anyfs_uri::FsError> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let scratch = std::env::temp_dir().join("anyfs-uri-demo");
    std::fs::create_dir_all(&scratch).map_err(|e| anyfs_uri::FsError::Io {
        operation: "create_dir",
        uri: scratch.display().to_string(),
        source: e.into(),
    })?;

    let fs = UriFs::new(
        SchemeRouter::new()
            .mount("file", LocalBackend::new())
            .mount("mem", MemoryBackend::new()),
    );

    // Bare paths are accepted and turned into file:// URIs.
    let notes = scratch.join("notes.txt");
    let notes = uri::safe(&notes.to_string_lossy());
    println!("writing {notes}");

    let mut out = fs.open_text(&notes, Access::Write)?;
    out.write_lines(["first line", "second line"])?;
    out.truncate(None)?;
    out.close()?;

    let mut log = fs.open_text(&notes, Access::Append)?;
    log.write("appended\n")?;
    log.close()?;

    let mut input = fs.open(&notes, OpenMode::READ_TEXT)?.into_text().unwrap();
    for line in input.read_lines()? {
        print!("  | {line}");
    }
    input.seek(SeekFrom::Start(0))?;
    println!("first five bytes: {:?}", input.read(5)?);
    input.close()?;

    println!("size: {} bytes", fs.size(&notes)?);
    println!("modified: {:?}", fs.mtime(&notes)?);

    let backup = uri::join(&uri::dirname(&notes), "notes.bak")?;
    if fs.exists(&backup)? {
        fs.unlink(&backup)?;
    }
    fs.copy(&notes, &backup)?;

    for child in fs.list_dir(&uri::dirname(&notes))? {
        let child = child?;
        println!("{} ({})", uri::basename(&child)?, child);
    }

    fs.write_string("mem://scratch/hello.txt", "in memory")?;
    println!("{}", fs.read_to_string("mem://scratch/hello.txt")?);

    Ok(())
}
