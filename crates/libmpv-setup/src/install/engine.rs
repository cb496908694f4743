//! Embedded archive engine with a 7-Zip style command line.
//!
//! The engine only touches the filesystem through a [`VirtualFs`], so it can
//! reach exactly the directories the caller mounted. Like a CLI `main`, it
//! reports completion through `exit`: a finished extraction ends in
//! `Exit { status: 0 }`, not in a plain return.
//!
//! Supported: `x <archive> -o<dir> [-y]` on zip and 7z archives, detected by
//! signature rather than by extension.

use super::vfs::{VfsError, VirtualFs};
use sevenz_rust::{Password, SevenZReader};
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use thiserror::Error;
use zip::ZipArchive;

pub const EXIT_OK: i32 = 0;
pub const EXIT_WARNING: i32 = 1;
pub const EXIT_FATAL: i32 = 2;
pub const EXIT_USAGE: i32 = 7;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const SEVEN_Z_MAGIC: &[u8] = b"7z\xBC\xAF\x27\x1C";

/// An explicit engine exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exit {
    pub status: i32,
    pub message: String,
}

impl Exit {
    fn new(status: i32, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
enum EngineError {
    #[error(transparent)]
    Vfs(#[from] VfsError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("7z error: {0}")]
    SevenZ(String),

    #[error("cannot open the file as archive: {0}")]
    Unsupported(String),
}

#[derive(Debug, PartialEq, Eq)]
struct Invocation {
    archive: String,
    out_dir: String,
    overwrite: bool,
}

#[derive(Debug, Default)]
struct Summary {
    files: usize,
    dirs: usize,
    skipped: Vec<String>,
}

fn parse_args(args: &[&str]) -> Result<Invocation, Exit> {
    let (cmd, rest) = args
        .split_first()
        .ok_or_else(|| Exit::new(EXIT_USAGE, "missing command"))?;
    if *cmd != "x" {
        return Err(Exit::new(EXIT_USAGE, format!("unsupported command: {cmd}")));
    }

    let mut archive = None;
    let mut out_dir = None;
    let mut overwrite = false;
    for arg in rest {
        if *arg == "-y" {
            overwrite = true;
        } else if let Some(dir) = arg.strip_prefix("-o") {
            if dir.is_empty() {
                return Err(Exit::new(EXIT_USAGE, "empty -o switch"));
            }
            out_dir = Some(dir.to_string());
        } else if arg.starts_with('-') {
            return Err(Exit::new(EXIT_USAGE, format!("unknown switch: {arg}")));
        } else if archive.replace(arg.to_string()).is_some() {
            return Err(Exit::new(EXIT_USAGE, "more than one archive given"));
        }
    }

    Ok(Invocation {
        archive: archive.ok_or_else(|| Exit::new(EXIT_USAGE, "missing archive name"))?,
        out_dir: out_dir.ok_or_else(|| Exit::new(EXIT_USAGE, "missing -o switch"))?,
        overwrite,
    })
}

/// Relative entry path with `/` separators, or None if it would leave the
/// output directory.
fn safe_entry_path(name: &str) -> Option<String> {
    let mut parts = Vec::new();
    for seg in name.split(['/', '\\']) {
        match seg {
            "" | "." => {}
            ".." => return None,
            s if s.contains(':') => return None,
            s => parts.push(s),
        }
    }
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

#[derive(Debug, Default)]
pub struct ArchiveEngine;

impl ArchiveEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn call_main(&self, fs: &VirtualFs, args: &[&str]) -> Result<(), Exit> {
        let inv = parse_args(args)?;

        let summary = self
            .run(fs, &inv)
            .map_err(|e| Exit::new(EXIT_FATAL, e.to_string()))?;

        tracing::debug!(
            archive = %inv.archive,
            files = summary.files,
            dirs = summary.dirs,
            skipped = summary.skipped.len(),
            "engine finished"
        );

        if !summary.skipped.is_empty() {
            return Err(Exit::new(
                EXIT_WARNING,
                format!("skipped entries: {}", summary.skipped.join(", ")),
            ));
        }
        Err(Exit::new(EXIT_OK, "Everything is Ok"))
    }

    fn run(&self, fs: &VirtualFs, inv: &Invocation) -> Result<Summary, EngineError> {
        let mut file = fs.open(&inv.archive)?;
        let len = file.metadata()?.len();

        let mut magic = [0u8; 6];
        let sniffed = file.read(&mut magic)?;
        file.seek(SeekFrom::Start(0))?;

        fs.create_dir_all(&inv.out_dir)?;

        if sniffed >= ZIP_MAGIC.len() && magic.starts_with(ZIP_MAGIC) {
            self.extract_zip(fs, file, inv)
        } else if sniffed == SEVEN_Z_MAGIC.len() && magic[..] == *SEVEN_Z_MAGIC {
            self.extract_7z(fs, file, len, inv)
        } else {
            Err(EngineError::Unsupported(inv.archive.clone()))
        }
    }

    fn extract_zip(
        &self,
        fs: &VirtualFs,
        file: File,
        inv: &Invocation,
    ) -> Result<Summary, EngineError> {
        let mut archive = ZipArchive::new(file)?;
        let mut summary = Summary::default();

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            let name = entry.name().to_string();
            let is_dir = entry.is_dir();
            write_entry(fs, inv, &name, is_dir, &mut entry, &mut summary)?;
        }
        Ok(summary)
    }

    fn extract_7z(
        &self,
        fs: &VirtualFs,
        file: File,
        len: u64,
        inv: &Invocation,
    ) -> Result<Summary, EngineError> {
        let mut reader = SevenZReader::new(file, len, Password::empty())
            .map_err(|e| EngineError::SevenZ(e.to_string()))?;
        let mut summary = Summary::default();
        let mut failure: Option<EngineError> = None;

        reader
            .for_each_entries(|entry, data| {
                match write_entry(fs, inv, entry.name(), entry.is_directory(), data, &mut summary) {
                    Ok(()) => Ok(true),
                    Err(e) => {
                        failure = Some(e);
                        Ok(false)
                    }
                }
            })
            .map_err(|e| EngineError::SevenZ(e.to_string()))?;

        match failure {
            Some(e) => Err(e),
            None => Ok(summary),
        }
    }
}

fn write_entry(
    fs: &VirtualFs,
    inv: &Invocation,
    name: &str,
    is_dir: bool,
    data: &mut dyn Read,
    summary: &mut Summary,
) -> Result<(), EngineError> {
    let Some(rel) = safe_entry_path(name) else {
        if !is_dir || name.contains("..") {
            summary.skipped.push(name.to_string());
        }
        return Ok(());
    };
    let vpath = format!("{}/{}", inv.out_dir.trim_end_matches('/'), rel);

    if is_dir {
        fs.create_dir_all(&vpath)?;
        summary.dirs += 1;
        return Ok(());
    }

    if !inv.overwrite && fs.exists(&vpath) {
        summary.skipped.push(name.to_string());
        return Ok(());
    }

    let mut out = fs.create(&vpath)?;
    io::copy(data, &mut out)?;
    summary.files += 1;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::install::vfs::Access;
    use std::io::Write;
    use std::path::Path;
    use zip::write::FileOptions;
    use zip::{CompressionMethod, ZipWriter};

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let mut zw = ZipWriter::new(File::create(path).unwrap());
        let opts = FileOptions::default().compression_method(CompressionMethod::Stored);
        for (name, data) in entries {
            if name.ends_with('/') {
                zw.add_directory(*name, opts).unwrap();
            } else {
                zw.start_file(*name, opts).unwrap();
                zw.write_all(data).unwrap();
            }
        }
        zw.finish().unwrap();
    }

    fn mounted(src: &Path, dest: &Path) -> VirtualFs {
        let mut fs = VirtualFs::new();
        fs.mkdir("/in").unwrap();
        fs.mkdir("/out").unwrap();
        fs.mount(src, "/in", Access::ReadOnly).unwrap();
        fs.mount(dest, "/out", Access::ReadWrite).unwrap();
        fs
    }

    #[test]
    fn parses_extract_command() {
        let inv = parse_args(&["x", "/in/a.zip", "-o/out", "-y"]).unwrap();
        assert_eq!(
            inv,
            Invocation {
                archive: "/in/a.zip".into(),
                out_dir: "/out".into(),
                overwrite: true
            }
        );
    }

    #[test]
    fn bad_command_lines_are_usage_errors() {
        for args in [
            &[][..],
            &["e", "/in/a.zip", "-o/out"][..],
            &["x", "-o/out"][..],
            &["x", "/in/a.zip"][..],
            &["x", "/in/a.zip", "-o/out", "-bd"][..],
            &["x", "/in/a.zip", "/in/b.zip", "-o/out"][..],
        ] {
            assert_eq!(parse_args(args).unwrap_err().status, EXIT_USAGE, "{args:?}");
        }
    }

    #[test]
    fn entry_paths_cannot_escape() {
        assert_eq!(safe_entry_path("bin/x64/lib.dll").as_deref(), Some("bin/x64/lib.dll"));
        assert_eq!(safe_entry_path("bin\\lib.dll").as_deref(), Some("bin/lib.dll"));
        assert_eq!(safe_entry_path("./a//b").as_deref(), Some("a/b"));
        assert_eq!(safe_entry_path("../evil.dll"), None);
        assert_eq!(safe_entry_path("C:/evil.dll"), None);
        assert_eq!(safe_entry_path("/"), None);
    }

    #[test]
    fn extracts_zip_and_exits_zero() {
        let src = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        write_zip(
            &src.path().join("a.zip"),
            &[("lib/", b""), ("lib/libmpv-wrapper.so", b"ELF"), ("README", b"hi")],
        );
        let fs = mounted(src.path(), dest.path());

        let exit = ArchiveEngine::new()
            .call_main(&fs, &["x", "/in/a.zip", "-o/out", "-y"])
            .unwrap_err();
        assert_eq!(exit.status, EXIT_OK);
        assert_eq!(
            std::fs::read(dest.path().join("lib/libmpv-wrapper.so")).unwrap(),
            b"ELF"
        );
        assert!(dest.path().join("README").is_file());
    }

    #[test]
    fn traversal_entries_are_skipped_with_warning() {
        let src = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        write_zip(
            &src.path().join("a.zip"),
            &[("ok.txt", b"1"), ("../escape.txt", b"2")],
        );
        let fs = mounted(src.path(), dest.path());

        let exit = ArchiveEngine::new()
            .call_main(&fs, &["x", "/in/a.zip", "-o/out", "-y"])
            .unwrap_err();
        assert_eq!(exit.status, EXIT_WARNING);
        assert!(dest.path().join("ok.txt").is_file());
        assert!(!dest.path().parent().unwrap().join("escape.txt").exists());
    }

    #[test]
    fn existing_files_kept_without_overwrite_switch() {
        let src = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        write_zip(&src.path().join("a.zip"), &[("f.txt", b"new")]);
        std::fs::write(dest.path().join("f.txt"), b"old").unwrap();
        let fs = mounted(src.path(), dest.path());

        let engine = ArchiveEngine::new();
        let exit = engine.call_main(&fs, &["x", "/in/a.zip", "-o/out"]).unwrap_err();
        assert_eq!(exit.status, EXIT_WARNING);
        assert_eq!(std::fs::read(dest.path().join("f.txt")).unwrap(), b"old");

        let exit = engine.call_main(&fs, &["x", "/in/a.zip", "-o/out", "-y"]).unwrap_err();
        assert_eq!(exit.status, EXIT_OK);
        assert_eq!(std::fs::read(dest.path().join("f.txt")).unwrap(), b"new");
    }

    #[test]
    fn unknown_format_is_fatal() {
        let src = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        std::fs::write(src.path().join("a.zip"), b"definitely not an archive").unwrap();
        let fs = mounted(src.path(), dest.path());

        let exit = ArchiveEngine::new()
            .call_main(&fs, &["x", "/in/a.zip", "-o/out", "-y"])
            .unwrap_err();
        assert_eq!(exit.status, EXIT_FATAL);
        assert!(exit.message.contains("cannot open the file as archive"));
    }

    #[test]
    fn output_outside_mounts_is_fatal() {
        let src = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        write_zip(&src.path().join("a.zip"), &[("f.txt", b"x")]);
        let fs = mounted(src.path(), dest.path());

        // The source mount is read-only.
        let exit = ArchiveEngine::new()
            .call_main(&fs, &["x", "/in/a.zip", "-o/in/unpacked", "-y"])
            .unwrap_err();
        assert_eq!(exit.status, EXIT_FATAL);
        assert!(!src.path().join("unpacked").exists());
    }

    #[test]
    fn extracts_7z() {
        let staging = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(staging.path().join("mpv")).unwrap();
        std::fs::write(staging.path().join("mpv").join("libmpv-2.dll"), b"MZ").unwrap();

        let src = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        sevenz_rust::compress_to_path(staging.path(), src.path().join("mpv-dev.7z")).unwrap();
        let fs = mounted(src.path(), dest.path());

        let exit = ArchiveEngine::new()
            .call_main(&fs, &["x", "/in/mpv-dev.7z", "-o/out", "-y"])
            .unwrap_err();
        assert_eq!(exit.status, EXIT_OK, "{}", exit.message);

        let found = crate::install::locate::find_file(dest.path(), "libmpv-2.dll").unwrap();
        assert_eq!(std::fs::read(found).unwrap(), b"MZ");
    }
}
