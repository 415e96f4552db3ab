//! Walks a layer (tarball or unpacked directory) and records one [`FileInfo`] per path.
//!
//! This is the calling traversal for the extractors: it owns the skip-or-abort
//! decision for paths that cannot be read, and it does all of the logging.
//!
//! - [`LayerScanner::scan_tarball`] — plain or gzip layer tarball, entries in archive order.
//! - [`LayerScanner::scan_directory`] — unpacked rootfs, walked in file-name order.
//! - [`compare_snapshots`] — verdicts for the paths two snapshots have in common.

use crate::diff::{classify, DiffType};
use crate::error::{ExtractError, ExtractResult};
use crate::export::LayerExport;
use crate::file_info::FileInfo;
use crate::hasher::absolute_path;
use crate::notifier::Notifier;
use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Component, Path, PathBuf};
use tar_rs as tar;
use walkdir::WalkDir;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// What to do with a path whose record cannot be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Stop the scan and return the [`ExtractError`].
    #[default]
    Abort,
    /// Log the failure, remember the path in [`LayerSnapshot::skipped`] and carry on.
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPath {
    pub path: String,
    pub reason: String,
}

/// Every record produced for one layer, keyed by absolute path.
#[derive(Debug, Clone, Default)]
pub struct LayerSnapshot {
    pub entries: Vec<(String, FileInfo)>,
    pub skipped: Vec<SkippedPath>,
}

impl LayerSnapshot {
    /// Sum of the recorded entry sizes.
    pub fn total_size(&self) -> u64 {
        self.entries
            .iter()
            .map(|(_, info)| u64::try_from(info.size).unwrap_or(0))
            .sum()
    }

    pub fn into_export(
        self,
        index: usize,
        id: String,
        digest_id: String,
        command: String,
    ) -> LayerExport {
        let size_bytes = self.total_size();
        LayerExport::new(index, id, digest_id, size_bytes, command, self.entries)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathVerdict {
    pub path: String,
    pub verdict: DiffType,
}

/// Classifies every path of `new` that `old` also contains, in `new`'s order.
///
/// Paths present on only one side are left out; when a snapshot lists a path more
/// than once, its last record wins.
pub fn compare_snapshots(old: &LayerSnapshot, new: &LayerSnapshot) -> Vec<PathVerdict> {
    let previous: HashMap<&str, &FileInfo> = old
        .entries
        .iter()
        .map(|(path, info)| (path.as_str(), info))
        .collect();
    let current: HashMap<&str, &FileInfo> = new
        .entries
        .iter()
        .map(|(path, info)| (path.as_str(), info))
        .collect();

    let mut seen = HashSet::new();
    new.entries
        .iter()
        .filter(|(path, _)| seen.insert(path.as_str()))
        .filter_map(|(path, _)| {
            let before = previous.get(path.as_str())?;
            let after = current.get(path.as_str())?;
            Some(PathVerdict {
                path: path.clone(),
                verdict: classify(before, after),
            })
        })
        .collect()
}

/// Lexically normalizes a tar entry path: drops `.` and leading `/`, and resolves
/// `..` without escaping the root.
fn normalize_tar_path(p: &Path) -> PathBuf {
    let mut out = PathBuf::new();

    for comp in p.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(c) => out.push(c),
            Component::RootDir | Component::Prefix(_) => {}
        }
    }

    out
}

/// Joins path components with `/` regardless of platform.
fn logical_path(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

pub struct LayerScanner<'a> {
    policy: ErrorPolicy,
    notifier: &'a Notifier,
}

impl<'a> LayerScanner<'a> {
    pub fn new(policy: ErrorPolicy, notifier: &'a Notifier) -> Self {
        Self { policy, notifier }
    }

    /// Scans a layer tarball, detecting gzip compression from its magic bytes.
    pub fn scan_tarball(&self, tar_path: &Path) -> Result<LayerSnapshot> {
        let file = File::open(tar_path)
            .with_context(|| format!("Failed to open tar file: {}", tar_path.display()))?;
        let mut reader = BufReader::new(file);

        let is_gzip = reader
            .fill_buf()
            .context("Failed to read magic bytes from tar file")?
            .starts_with(&GZIP_MAGIC);

        let stream: Box<dyn Read> = if is_gzip {
            self.notifier
                .debug(&format!("Detected gzip layer: {}", tar_path.display()));
            Box::new(GzDecoder::new(reader))
        } else {
            Box::new(reader)
        };

        self.notifier
            .info(&format!("Scanning layer tarball {}", tar_path.display()));
        self.scan_archive(tar::Archive::new(stream))
            .with_context(|| format!("Failed to scan tar file: {}", tar_path.display()))
    }

    /// Scans an already-opened archive. Each entry's content is consumed exactly once.
    pub fn scan_archive<R: Read>(&self, mut archive: tar::Archive<R>) -> Result<LayerSnapshot> {
        let mut snapshot = LayerSnapshot::default();

        for entry_result in archive.entries().context("Failed to read tar entries")? {
            let mut entry = entry_result.context("Failed to read tar entry")?;
            let rel_path = normalize_tar_path(&entry.path().context("Failed to get entry path")?);
            let logical = logical_path(&rel_path);

            if logical.is_empty() {
                self.notifier.trace("Skipping archive root entry");
                continue;
            }

            let result = FileInfo::from_tar_entry(&mut entry, &logical);
            self.record(&mut snapshot, &logical, result)?;
        }

        self.notifier.debug(&format!(
            "Scanned {} entries ({} skipped)",
            snapshot.entries.len(),
            snapshot.skipped.len()
        ));
        Ok(snapshot)
    }

    /// Scans an unpacked layer. The root directory itself is not recorded and
    /// symlinked directories are not descended into.
    pub fn scan_directory(&self, root: &Path) -> Result<LayerSnapshot> {
        let mut snapshot = LayerSnapshot::default();
        self.notifier
            .info(&format!("Scanning directory {}", root.display()));

        for walked in WalkDir::new(root).min_depth(1).sort_by_file_name() {
            let (logical, result) = match walked {
                Ok(entry) => {
                    let rel_path = entry.path().strip_prefix(root).with_context(|| {
                        format!("Walked outside of {}", root.display())
                    })?;
                    let logical = logical_path(rel_path);
                    let result = entry
                        .metadata()
                        .map_err(|e| ExtractError::Metadata {
                            path: logical.clone(),
                            source: io::Error::from(e),
                        })
                        .and_then(|metadata| {
                            FileInfo::from_filesystem(entry.path(), &logical, &metadata)
                        });
                    (logical, result)
                }
                Err(e) => {
                    let logical = e
                        .path()
                        .and_then(|p| p.strip_prefix(root).ok())
                        .map(logical_path)
                        .unwrap_or_default();
                    let err = ExtractError::Metadata {
                        path: logical.clone(),
                        source: io::Error::from(e),
                    };
                    (logical, Err(err))
                }
            };

            self.record(&mut snapshot, &logical, result)?;
        }

        self.notifier.debug(&format!(
            "Scanned {} paths ({} skipped)",
            snapshot.entries.len(),
            snapshot.skipped.len()
        ));
        Ok(snapshot)
    }

    /// Scans `path` as a directory when it is one, otherwise as a layer tarball.
    pub fn scan_path(&self, path: &Path) -> Result<LayerSnapshot> {
        if path.is_dir() {
            self.scan_directory(path)
        } else {
            self.scan_tarball(path)
        }
    }

    fn record(
        &self,
        snapshot: &mut LayerSnapshot,
        logical: &str,
        result: ExtractResult<FileInfo>,
    ) -> Result<()> {
        match result {
            Ok(info) => {
                snapshot.entries.push((absolute_path(logical), info));
                self.notifier
                    .progress(snapshot.entries.len() as u64, "Entries scanned");
                Ok(())
            }
            Err(err) => match self.policy {
                ErrorPolicy::Abort => Err(err.into()),
                ErrorPolicy::Skip => {
                    self.notifier
                        .warn(&format!("Skipping unreadable path {}: {}", logical, err));
                    snapshot.skipped.push(SkippedPath {
                        path: absolute_path(logical),
                        reason: err.to_string(),
                    });
                    Ok(())
                }
            },
        }
    }
}
