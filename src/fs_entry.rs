//! Builds [`FileInfo`] records from a live filesystem.
//!
//! Ownership is never resolved here; every record carries unknown uid/gid.

use crate::error::{ExtractError, ExtractResult};
use crate::file_info::{EntryKind, FileInfo};
use crate::hasher;
use std::fs::{self, File, FileType, Metadata};
use std::io;
use std::path::Path;

#[cfg(unix)]
fn is_special(file_type: &FileType) -> bool {
    use std::os::unix::fs::FileTypeExt;
    file_type.is_fifo()
        || file_type.is_socket()
        || file_type.is_char_device()
        || file_type.is_block_device()
}

#[cfg(not(unix))]
fn is_special(_file_type: &FileType) -> bool {
    false
}

#[cfg(unix)]
fn file_mode(metadata: &Metadata, _kind: EntryKind) -> u32 {
    use std::os::unix::fs::MetadataExt;
    metadata.mode()
}

#[cfg(not(unix))]
fn file_mode(metadata: &Metadata, kind: EntryKind) -> u32 {
    let permissions = if metadata.permissions().readonly() {
        0o444
    } else {
        0o644
    };
    kind.mode_type_bits() | permissions
}

impl FileInfo {
    /// Builds the record for `real_path`, known inside the image as `path`.
    ///
    /// `metadata` must not follow symlinks (`symlink_metadata`, or a `walkdir`
    /// entry walked without `follow_links`).
    pub fn from_filesystem(
        real_path: &Path,
        path: &str,
        metadata: &Metadata,
    ) -> ExtractResult<FileInfo> {
        let file_type = metadata.file_type();

        let (kind, link_name, size) = if file_type.is_symlink() {
            let target = fs::read_link(real_path).map_err(|source| {
                ExtractError::SymlinkResolve {
                    path: path.to_string(),
                    source,
                }
            })?;
            (
                EntryKind::Symlink,
                target.to_string_lossy().into_owned(),
                0,
            )
        } else if file_type.is_dir() {
            (EntryKind::Directory, String::new(), 0)
        } else if is_special(&file_type) {
            (EntryKind::Other, String::new(), 0)
        } else {
            let size = i64::try_from(metadata.len()).unwrap_or(i64::MAX);
            (EntryKind::Regular, String::new(), size)
        };

        let hash = match kind {
            EntryKind::Directory => 0,
            EntryKind::Regular | EntryKind::Symlink => hash_target(real_path, path)?,
            // Devices and FIFOs are never opened. Hardlink records only come from
            // archives; this match arm exists for exhaustiveness.
            EntryKind::Other | EntryKind::Hardlink => hash_content(io::empty(), path)?,
        };

        Ok(FileInfo {
            path: path.to_string(),
            kind,
            link_name,
            hash,
            size,
            mode: file_mode(metadata, kind),
            uid: None,
            gid: None,
            is_dir: kind == EntryKind::Directory,
        })
    }
}

/// Fingerprints what `real_path` points to, following a symlink.
///
/// A target that cannot be reached, such as a dangling link, is a file-open
/// failure. Directory and special-file targets have no content of their own.
fn hash_target(real_path: &Path, path: &str) -> ExtractResult<u64> {
    let open_error = |source| ExtractError::FileOpen {
        path: path.to_string(),
        source,
    };

    let target = fs::metadata(real_path).map_err(open_error)?;
    if target.is_dir() || is_special(&target.file_type()) {
        return hash_content(io::empty(), path);
    }

    let file = File::open(real_path).map_err(open_error)?;
    hash_content(file, path)
}

fn hash_content<R: io::Read>(content: R, path: &str) -> ExtractResult<u64> {
    hasher::fingerprint(content, path).map_err(|source| ExtractError::ContentRead {
        path: path.to_string(),
        source,
    })
}
