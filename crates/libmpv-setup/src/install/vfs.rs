//! A tiny in-process virtual filesystem.
//!
//! The extraction engine never sees host paths. It works on absolute virtual
//! paths like `/archive_source/foo.zip`, and every access is resolved through
//! the mount table here. Only directories that were explicitly mounted are
//! reachable, and read-only mounts refuse writes.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io;
use std::ops::{Deref, DerefMut};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VfsError {
    #[error("{0}: no such directory")]
    NoMountPoint(String),

    #[error("{0}: already exists")]
    Exists(String),

    #[error("{0}: already mounted")]
    Busy(String),

    #[error("{0}: not mounted")]
    NotMounted(String),

    #[error("{0}: outside of any mount")]
    Unreachable(String),

    #[error("{0}: read-only mount")]
    ReadOnly(String),

    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    ReadOnly,
    ReadWrite,
}

#[derive(Debug)]
struct Mount {
    host_root: PathBuf,
    access: Access,
}

#[derive(Debug, Default)]
pub struct VirtualFs {
    dirs: BTreeSet<String>,
    mounts: BTreeMap<String, Mount>,
}

/// Normalize an absolute virtual path: collapse `.`/empty segments, refuse
/// anything that climbs above `/`.
fn normalize(vpath: &str) -> Option<String> {
    if !vpath.starts_with('/') {
        return None;
    }
    let mut parts: Vec<&str> = Vec::new();
    for seg in vpath.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            s => parts.push(s),
        }
    }
    Some(format!("/{}", parts.join("/")))
}

impl VirtualFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty directory node to mount onto.
    pub fn mkdir(&mut self, vpath: &str) -> Result<(), VfsError> {
        let p = normalize(vpath).ok_or_else(|| VfsError::Unreachable(vpath.into()))?;
        if !self.dirs.insert(p.clone()) {
            return Err(VfsError::Exists(p));
        }
        Ok(())
    }

    /// Bind host directory `host_root` at `vpath`.
    pub fn mount(&mut self, host_root: &Path, vpath: &str, access: Access) -> Result<(), VfsError> {
        let p = normalize(vpath).ok_or_else(|| VfsError::Unreachable(vpath.into()))?;
        if !self.dirs.contains(&p) {
            return Err(VfsError::NoMountPoint(p));
        }
        if self.mounts.contains_key(&p) {
            return Err(VfsError::Busy(p));
        }
        if !host_root.is_dir() {
            return Err(VfsError::Io {
                path: p,
                source: io::Error::new(io::ErrorKind::NotFound, "host root is not a directory"),
            });
        }
        self.mounts.insert(
            p,
            Mount {
                host_root: host_root.to_path_buf(),
                access,
            },
        );
        Ok(())
    }

    pub fn unmount(&mut self, vpath: &str) -> Result<(), VfsError> {
        let p = normalize(vpath).ok_or_else(|| VfsError::Unreachable(vpath.into()))?;
        self.mounts
            .remove(&p)
            .map(|_| ())
            .ok_or(VfsError::NotMounted(p))
    }

    pub fn is_mounted(&self, vpath: &str) -> bool {
        normalize(vpath).is_some_and(|p| self.mounts.contains_key(&p))
    }

    /// Map a virtual path to its host path. Longest mount prefix wins.
    pub fn resolve(&self, vpath: &str, write: bool) -> Result<PathBuf, VfsError> {
        let p = normalize(vpath).ok_or_else(|| VfsError::Unreachable(vpath.into()))?;

        let (point, mount) = self
            .mounts
            .iter()
            .filter(|(point, _)| p == **point || p.starts_with(&format!("{point}/")))
            .max_by_key(|(point, _)| point.len())
            .ok_or_else(|| VfsError::Unreachable(p.clone()))?;

        if write && mount.access == Access::ReadOnly {
            return Err(VfsError::ReadOnly(p));
        }

        let rest = p[point.len()..].trim_start_matches('/');
        let mut host = mount.host_root.clone();
        for c in Path::new(rest).components() {
            match c {
                Component::Normal(seg) => host.push(seg),
                _ => return Err(VfsError::Unreachable(p.clone())),
            }
        }
        Ok(host)
    }

    pub fn open(&self, vpath: &str) -> Result<File, VfsError> {
        let host = self.resolve(vpath, false)?;
        File::open(&host).map_err(|source| VfsError::Io {
            path: vpath.into(),
            source,
        })
    }

    pub fn exists(&self, vpath: &str) -> bool {
        self.resolve(vpath, false).is_ok_and(|p| p.exists())
    }

    pub fn create_dir_all(&self, vpath: &str) -> Result<(), VfsError> {
        let host = self.resolve(vpath, true)?;
        fs::create_dir_all(&host).map_err(|source| VfsError::Io {
            path: vpath.into(),
            source,
        })
    }

    /// Create (truncate) a file, making parent directories as needed.
    pub fn create(&self, vpath: &str) -> Result<File, VfsError> {
        let host = self.resolve(vpath, true)?;
        let io_err = |source: io::Error| VfsError::Io {
            path: vpath.into(),
            source,
        };
        if let Some(parent) = host.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        File::create(&host).map_err(io_err)
    }
}

/// Mount points bound for the lifetime of the guard. Dropping it unmounts all
/// of them; unmount errors are ignored.
pub struct MountGuard<'a> {
    fs: &'a mut VirtualFs,
    points: Vec<String>,
}

impl<'a> MountGuard<'a> {
    pub fn new(fs: &'a mut VirtualFs) -> Self {
        Self {
            fs,
            points: Vec::new(),
        }
    }

    /// mkdir + mount; the point is released when the guard drops.
    pub fn bind(&mut self, host_root: &Path, vpath: &str, access: Access) -> Result<(), VfsError> {
        if let Err(e) = self.fs.mkdir(vpath) {
            if !matches!(e, VfsError::Exists(_)) {
                return Err(e);
            }
        }
        self.fs.mount(host_root, vpath, access)?;
        self.points.push(vpath.to_string());
        Ok(())
    }
}

impl Deref for MountGuard<'_> {
    type Target = VirtualFs;

    fn deref(&self) -> &VirtualFs {
        &*self.fs
    }
}

impl DerefMut for MountGuard<'_> {
    fn deref_mut(&mut self) -> &mut VirtualFs {
        &mut *self.fs
    }
}

impl Drop for MountGuard<'_> {
    fn drop(&mut self) {
        for point in self.points.drain(..).rev() {
            if let Err(e) = self.fs.unmount(&point) {
                tracing::trace!(%point, error = %e, "unmount failed");
            }
        }
    }
}
