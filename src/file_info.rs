//! Per-path metadata records for layer entries.
//!
//! [`FileInfo`] is produced once per observation of a path, either from a tar entry
//! (see [`crate::tar_entry`]) or from a live filesystem walk (see [`crate::fs_entry`]).
//! Its serialized shape uses the field names external consumers expect:
//! `path`, `typeFlag`, `linkName`, `hash`, `size`, `fileMode`, `uid`, `gid`, `isDir`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// `S_IFMT` type bits as they appear in `st_mode`.
pub const S_IFMT: u32 = 0o170000;
pub const S_IFREG: u32 = 0o100000;
pub const S_IFDIR: u32 = 0o040000;
pub const S_IFLNK: u32 = 0o120000;

/// Structural type of a filesystem object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Regular,
    Directory,
    Symlink,
    Hardlink,
    Other,
}

impl EntryKind {
    /// The single-byte marker used when the record is serialized.
    pub fn type_flag(self) -> u8 {
        match self {
            EntryKind::Regular => b'0',
            EntryKind::Hardlink => b'1',
            EntryKind::Symlink => b'2',
            EntryKind::Directory => b'5',
            EntryKind::Other => b'?',
        }
    }

    pub fn from_type_flag(flag: u8) -> Self {
        match flag {
            b'0' | b'\0' | b'7' => EntryKind::Regular,
            b'1' => EntryKind::Hardlink,
            b'2' => EntryKind::Symlink,
            b'5' => EntryKind::Directory,
            _ => EntryKind::Other,
        }
    }

    /// `S_IFMT` bits implied by this kind, 0 when the kind carries no fixed type.
    pub fn mode_type_bits(self) -> u32 {
        match self {
            EntryKind::Regular | EntryKind::Hardlink => S_IFREG,
            EntryKind::Directory => S_IFDIR,
            EntryKind::Symlink => S_IFLNK,
            EntryKind::Other => 0,
        }
    }
}

impl Serialize for EntryKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.type_flag())
    }
}

impl<'de> Deserialize<'de> for EntryKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u8::deserialize(deserializer).map(EntryKind::from_type_flag)
    }
}

/// Metadata for one path inside an image layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub path: String,
    #[serde(rename = "typeFlag")]
    pub kind: EntryKind,
    /// Symlink target; empty for every other kind.
    #[serde(rename = "linkName")]
    pub link_name: String,
    /// Content+path fingerprint, always 0 for directories.
    pub hash: u64,
    pub size: i64,
    /// Permission bits plus `S_IFMT` type bits.
    #[serde(rename = "fileMode")]
    pub mode: u32,
    /// `None` when the source cannot report ownership; serialized as -1.
    #[serde(with = "ownership")]
    pub uid: Option<u32>,
    #[serde(with = "ownership")]
    pub gid: Option<u32>,
    #[serde(rename = "isDir")]
    pub is_dir: bool,
}

impl FileInfo {
    /// Independent copy of an optional record. An absent record stays absent.
    pub fn snapshot(data: Option<&FileInfo>) -> Option<FileInfo> {
        data.cloned()
    }

    /// Permission bits without the type bits.
    pub fn permissions(&self) -> u32 {
        self.mode & !S_IFMT
    }
}

mod ownership {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    const UNKNOWN: i64 = -1;

    pub fn serialize<S: Serializer>(id: &Option<u32>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(id.map(i64::from).unwrap_or(UNKNOWN))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        if raw < 0 {
            return Ok(None);
        }
        u32::try_from(raw).map(Some).map_err(D::Error::custom)
    }
}
