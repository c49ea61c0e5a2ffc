use crate::{Error, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[cfg(unix)]
const DEFAULT_PERMISSIONS: Option<u32> = Some(0o644);

#[cfg(not(unix))]
const DEFAULT_PERMISSIONS: Option<u32> = None;

#[derive(Clone, Copy, Debug)]
pub struct AtomicWriteOptions {
    pub permissions: Option<u32>,
    pub sync: bool,
}

impl Default for AtomicWriteOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl AtomicWriteOptions {
    pub fn new() -> Self {
        Self {
            permissions: DEFAULT_PERMISSIONS,
            sync: false,
        }
    }

    /// Unix mode bits for the published file. Ignored elsewhere.
    pub fn permissions(mut self, mode: u32) -> Self {
        self.permissions = Some(mode);
        self
    }

    /// Flush file data and the directory entry before returning.
    pub fn sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Publish `content` at `path` through a sibling temp file and a rename.
///
/// The temp file lives in the destination directory so the rename never
/// crosses filesystems. On any failure the temp file is removed and the
/// previously published content is left untouched.
pub fn atomic_write(
    path: impl AsRef<Path>,
    content: &[u8],
    options: AtomicWriteOptions,
) -> Result<()> {
    let path = path.as_ref();
    let parent = parent_dir(path);
    let write_err = |source| Error::Write {
        path: path.to_path_buf(),
        source,
    };

    let file_name = path.file_name().unwrap_or_default().to_string_lossy();
    let mut tmp = tempfile::Builder::new()
        .prefix(&format!(".{file_name}."))
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(write_err)?;

    tmp.write_all(content).map_err(write_err)?;

    #[cfg(unix)]
    if let Some(mode) = options.permissions {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(mode))
            .map_err(write_err)?;
    }

    if options.sync {
        tmp.as_file().sync_all().map_err(write_err)?;
    }

    // A failed persist hands the temp file back; dropping it unlinks it.
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    #[cfg(unix)]
    if options.sync {
        if let Ok(dir) = fs::File::open(parent) {
            let _ = dir.sync_all();
        }
    }

    Ok(())
}

pub fn atomic_read(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    fs::read(path).map_err(|e| Error::Read {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Create the directory that will hold `path`, if it is missing.
pub fn ensure_dir(path: impl AsRef<Path>) -> Result<PathBuf> {
    let parent = parent_dir(path.as_ref()).to_path_buf();
    fs::create_dir_all(&parent).map_err(|e| Error::CreateDir {
        path: parent.clone(),
        source: e,
    })?;
    Ok(parent)
}
