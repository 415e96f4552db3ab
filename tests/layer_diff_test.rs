use anyhow::Result;
use layerdiff::{
    classify, compare_snapshots, DiffType, EntryKind, ErrorPolicy, FileInfo, LayerScanner,
    Notifier,
};
use std::fs;
use std::io;
use std::path::Path;
use tar_rs as tar;
use tempfile::TempDir;

// (path, content, mode); `None` content marks a directory
type Entry<'a> = (&'a str, Option<&'a [u8]>, u32);

fn write_layer(dir: &Path, name: &str, entries: &[Entry]) -> Result<std::path::PathBuf> {
    let mut builder = tar::Builder::new(Vec::new());

    for (path, content, mode) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_mode(*mode);
        header.set_uid(0);
        header.set_gid(0);
        match content {
            Some(bytes) => {
                header.set_entry_type(tar::EntryType::Regular);
                header.set_size(bytes.len() as u64);
                builder.append_data(&mut header, path, *bytes)?;
            }
            None => {
                header.set_entry_type(tar::EntryType::Directory);
                header.set_size(0);
                builder.append_data(&mut header, path, io::empty())?;
            }
        }
    }

    let tar_path = dir.join(name);
    fs::write(&tar_path, builder.into_inner()?)?;
    Ok(tar_path)
}

fn record_for<'a>(snapshot: &'a layerdiff::LayerSnapshot, path: &str) -> &'a FileInfo {
    snapshot
        .entries
        .iter()
        .find(|(abs, _)| abs == path)
        .map(|(_, info)| info)
        .unwrap_or_else(|| panic!("{path} not scanned"))
}

#[test]
fn test_unchanged_file_across_layers() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let entries: &[Entry] = &[("a/", None, 0o755), ("a/b.txt", Some(&b"hello"[..]), 0o644)];
    let layer1 = write_layer(temp_dir.path(), "layer1.tar", entries)?;
    let layer2 = write_layer(temp_dir.path(), "layer2.tar", entries)?;

    let notifier = Notifier::new(0);
    let scanner = LayerScanner::new(ErrorPolicy::Abort, &notifier);
    let old = scanner.scan_tarball(&layer1)?;
    let new = scanner.scan_tarball(&layer2)?;

    assert_eq!(
        classify(record_for(&old, "/a/b.txt"), record_for(&new, "/a/b.txt")),
        DiffType::Unmodified
    );
    assert_eq!(
        classify(record_for(&old, "/a"), record_for(&new, "/a")),
        DiffType::Unmodified
    );
    Ok(())
}

#[test]
fn test_content_change_is_modified() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let layer1 = write_layer(
        temp_dir.path(),
        "layer1.tar",
        &[("a/", None, 0o755), ("a/b.txt", Some(&b"hello"[..]), 0o644)],
    )?;
    let layer2 = write_layer(
        temp_dir.path(),
        "layer2.tar",
        &[("a/", None, 0o755), ("a/b.txt", Some(&b"hello!"[..]), 0o644)],
    )?;

    let notifier = Notifier::new(0);
    let scanner = LayerScanner::new(ErrorPolicy::Abort, &notifier);
    let verdicts = compare_snapshots(&scanner.scan_tarball(&layer1)?, &scanner.scan_tarball(&layer2)?);

    let file = verdicts.iter().find(|v| v.path == "/a/b.txt").unwrap();
    assert_eq!(file.verdict, DiffType::Modified);
    let dir = verdicts.iter().find(|v| v.path == "/a").unwrap();
    assert_eq!(dir.verdict, DiffType::Unmodified);
    Ok(())
}

#[test]
fn test_mode_change_is_modified() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let layer1 = write_layer(temp_dir.path(), "layer1.tar", &[("a/b.txt", Some(&b"hello"[..]), 0o644)])?;
    let layer2 = write_layer(temp_dir.path(), "layer2.tar", &[("a/b.txt", Some(&b"hello"[..]), 0o755)])?;

    let notifier = Notifier::new(0);
    let scanner = LayerScanner::new(ErrorPolicy::Abort, &notifier);
    let old = scanner.scan_tarball(&layer1)?;
    let new = scanner.scan_tarball(&layer2)?;

    let before = record_for(&old, "/a/b.txt");
    let after = record_for(&new, "/a/b.txt");
    assert_eq!(before.hash, after.hash);
    assert_eq!(classify(before, after), DiffType::Modified);
    assert_eq!(classify(after, before), DiffType::Modified);
    Ok(())
}

#[test]
fn test_directories_have_zero_hash_and_size_from_both_sources() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let layer = write_layer(
        temp_dir.path(),
        "layer.tar",
        &[("a/", None, 0o755), ("a/b.txt", Some(&b"hello"[..]), 0o644)],
    )?;
    let rootfs = temp_dir.path().join("rootfs");
    fs::create_dir_all(rootfs.join("a"))?;
    fs::write(rootfs.join("a/b.txt"), "hello")?;

    let notifier = Notifier::new(0);
    let scanner = LayerScanner::new(ErrorPolicy::Abort, &notifier);

    for snapshot in [scanner.scan_tarball(&layer)?, scanner.scan_directory(&rootfs)?] {
        let dir = record_for(&snapshot, "/a");
        assert_eq!(dir.kind, EntryKind::Directory);
        assert!(dir.is_dir);
        assert_eq!(dir.hash, 0);
        assert_eq!(dir.size, 0);
    }
    Ok(())
}

#[test]
fn test_export_json_shape() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let layer = write_layer(
        temp_dir.path(),
        "layer.tar",
        &[("a/", None, 0o755), ("a/b.txt", Some(&b"hello"[..]), 0o644)],
    )?;

    let notifier = Notifier::new(0);
    let scanner = LayerScanner::new(ErrorPolicy::Abort, &notifier);
    let export = scanner.scan_tarball(&layer)?.into_export(
        1,
        "sha256:abc".to_string(),
        "sha256:abc".to_string(),
        "COPY b.txt /a/".to_string(),
    );

    let mut buf = Vec::new();
    export.write_json(&mut buf, false)?;
    let value: serde_json::Value = serde_json::from_slice(&buf)?;

    assert_eq!(value["index"], 1);
    assert_eq!(value["sizeBytes"], 5);
    assert_eq!(value["fileList"][1]["AbsPath"], "/a/b.txt");
    assert_eq!(value["fileList"][1]["NodeData"]["path"], "a/b.txt");
    assert_eq!(value["fileList"][1]["NodeData"]["uid"], 0);
    assert_eq!(value["fileList"][0]["NodeData"]["hash"], 0);
    Ok(())
}
