//! Change classification between two observations of the same path.

use crate::file_info::FileInfo;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Verdict for a pair of records describing the same logical path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiffType {
    Unmodified,
    Modified,
}

impl fmt::Display for DiffType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffType::Unmodified => write!(f, "unmodified"),
            DiffType::Modified => write!(f, "modified"),
        }
    }
}

impl FileInfo {
    /// Compares this record with `other`, which the caller has paired by path.
    ///
    /// Records of different kinds are always modified. Otherwise fingerprint, mode,
    /// uid and gid must all match for the path to count as unmodified. Size and
    /// link target do not take part: the fingerprint already covers content.
    pub fn compare(&self, other: &FileInfo) -> DiffType {
        if self.kind == other.kind
            && self.hash == other.hash
            && self.mode == other.mode
            && self.uid == other.uid
            && self.gid == other.gid
        {
            return DiffType::Unmodified;
        }
        DiffType::Modified
    }
}

/// Classifies `current` against `previous`. Symmetric in its arguments.
pub fn classify(previous: &FileInfo, current: &FileInfo) -> DiffType {
    previous.compare(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_info::{EntryKind, S_IFDIR, S_IFREG};
    use proptest::prelude::*;

    fn record(hash: u64, mode: u32, uid: Option<u32>, gid: Option<u32>) -> FileInfo {
        FileInfo {
            path: "/a/b.txt".to_string(),
            kind: EntryKind::Regular,
            link_name: String::new(),
            hash,
            size: 5,
            mode,
            uid,
            gid,
            is_dir: false,
        }
    }

    fn any_kind() -> impl Strategy<Value = EntryKind> {
        prop_oneof![
            Just(EntryKind::Regular),
            Just(EntryKind::Directory),
            Just(EntryKind::Symlink),
            Just(EntryKind::Hardlink),
            Just(EntryKind::Other),
        ]
    }

    prop_compose! {
        fn any_record()(
            kind in any_kind(),
            hash in 0u64..4,
            mode in prop_oneof![Just(S_IFREG | 0o644), Just(S_IFREG | 0o755)],
            uid in proptest::option::of(0u32..2),
            gid in proptest::option::of(0u32..2),
        ) -> FileInfo {
            FileInfo {
                path: "/p".to_string(),
                kind,
                link_name: String::new(),
                hash,
                size: 0,
                mode,
                uid,
                gid,
                is_dir: kind == EntryKind::Directory,
            }
        }
    }

    #[test]
    fn test_identical_records_are_unmodified() {
        let a = record(1, S_IFREG | 0o644, Some(0), Some(0));
        assert_eq!(classify(&a, &a.clone()), DiffType::Unmodified);
    }

    #[test]
    fn test_single_field_change_is_modified() {
        let base = record(1, S_IFREG | 0o644, Some(0), Some(0));

        let changed = [
            record(2, S_IFREG | 0o644, Some(0), Some(0)),
            record(1, S_IFREG | 0o755, Some(0), Some(0)),
            record(1, S_IFREG | 0o644, Some(1), Some(0)),
            record(1, S_IFREG | 0o644, Some(0), Some(1)),
            record(1, S_IFREG | 0o644, None, Some(0)),
        ];

        for other in &changed {
            assert_eq!(classify(&base, other), DiffType::Modified, "{other:?}");
        }
    }

    #[test]
    fn test_kind_change_is_modified() {
        let file = record(0, S_IFREG | 0o755, Some(0), Some(0));
        let mut dir = file.clone();
        dir.kind = EntryKind::Directory;
        dir.is_dir = true;

        assert_eq!(classify(&file, &dir), DiffType::Modified);
    }

    #[test]
    fn test_size_and_link_target_are_ignored() {
        let a = record(1, S_IFREG | 0o644, Some(0), Some(0));
        let mut b = a.clone();
        b.size = 99;
        b.link_name = "elsewhere".to_string();

        assert_eq!(classify(&a, &b), DiffType::Unmodified);
    }

    #[test]
    fn test_unchanged_directory() {
        let mut dir = record(0, S_IFDIR | 0o755, Some(0), Some(0));
        dir.kind = EntryKind::Directory;
        dir.is_dir = true;
        dir.size = 0;

        assert_eq!(classify(&dir, &dir.clone()), DiffType::Unmodified);
    }

    #[test]
    fn test_display() {
        assert_eq!(DiffType::Modified.to_string(), "modified");
        assert_eq!(DiffType::Unmodified.to_string(), "unmodified");
    }

    proptest! {
        #[test]
        fn prop_classify_is_symmetric(a in any_record(), b in any_record()) {
            prop_assert_eq!(classify(&a, &b), classify(&b, &a));
        }

        #[test]
        fn prop_unmodified_iff_compared_fields_match(a in any_record(), b in any_record()) {
            let same = a.kind == b.kind
                && a.hash == b.hash
                && a.mode == b.mode
                && a.uid == b.uid
                && a.gid == b.gid;
            let expected = if same { DiffType::Unmodified } else { DiffType::Modified };
            prop_assert_eq!(classify(&a, &b), expected);
        }
    }
}
