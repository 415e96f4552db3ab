//! Builds [`FileInfo`] records from layer tarball entries.
//!
//! Tar type markers are translated into [`EntryKind`] here and nowhere else.

use crate::error::{ExtractError, ExtractResult};
use crate::file_info::{EntryKind, FileInfo};
use crate::hasher;
use std::io::Read;
use tar_rs as tar;

const S_IFIFO: u32 = 0o010000;
const S_IFCHR: u32 = 0o020000;
const S_IFBLK: u32 = 0o060000;

fn entry_kind(entry_type: tar::EntryType) -> EntryKind {
    match entry_type {
        tar::EntryType::Regular | tar::EntryType::Continuous | tar::EntryType::GNUSparse => {
            EntryKind::Regular
        }
        tar::EntryType::Directory => EntryKind::Directory,
        tar::EntryType::Symlink => EntryKind::Symlink,
        tar::EntryType::Link => EntryKind::Hardlink,
        _ => EntryKind::Other,
    }
}

fn type_bits(entry_type: tar::EntryType, kind: EntryKind) -> u32 {
    match entry_type {
        tar::EntryType::Fifo => S_IFIFO,
        tar::EntryType::Char => S_IFCHR,
        tar::EntryType::Block => S_IFBLK,
        _ => kind.mode_type_bits(),
    }
}

impl FileInfo {
    /// Builds the record for `entry`, observed at logical `path`.
    ///
    /// Non-directory entries have their content streamed through
    /// [`hasher::fingerprint`] exactly as the archive reader delivers it, which
    /// consumes the entry. Directories are not read and keep a fingerprint of 0.
    pub fn from_tar_entry<R: Read>(
        entry: &mut tar::Entry<'_, R>,
        path: &str,
    ) -> ExtractResult<FileInfo> {
        let header = entry.header();
        let entry_type = header.entry_type();
        let kind = entry_kind(entry_type);

        let permissions = header
            .mode()
            .map_err(|source| ExtractError::Archive { source })?
            & 0o7777;
        // Unparseable or out-of-range ids count as unknown ownership.
        let uid = header.uid().ok().and_then(|id| u32::try_from(id).ok());
        let gid = header.gid().ok().and_then(|id| u32::try_from(id).ok());

        let link_name = if kind == EntryKind::Symlink {
            entry
                .link_name()
                .map_err(|source| ExtractError::Archive { source })?
                .map(|target| target.to_string_lossy().into_owned())
                .unwrap_or_default()
        } else {
            String::new()
        };

        let size = match kind {
            EntryKind::Directory | EntryKind::Symlink => 0,
            _ => i64::try_from(entry.size()).unwrap_or(i64::MAX),
        };

        let hash = if kind == EntryKind::Directory {
            0
        } else {
            hasher::fingerprint(&mut *entry, path).map_err(|source| {
                ExtractError::ContentRead {
                    path: path.to_string(),
                    source,
                }
            })?
        };

        Ok(FileInfo {
            path: path.to_string(),
            kind,
            link_name,
            hash,
            size,
            mode: type_bits(entry_type, kind) | permissions,
            uid,
            gid,
            is_dir: kind == EntryKind::Directory,
        })
    }
}
