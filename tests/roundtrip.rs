use gzix::archive::{ArchiveExtractor, Index, build_archive, lookup, retrieve, verify};
use gzix::{ErrorKind, SectionReader};
use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

/// Source directory `<tmp>/src` with the given files.
fn make_source(root: &Path, files: &[(&str, Vec<u8>)]) -> PathBuf {
    let dir = root.join("src");
    fs::create_dir(&dir).unwrap();
    for (name, data) in files {
        fs::write(dir.join(name), data).unwrap();
    }
    dir
}

fn sample_files() -> Vec<(&'static str, Vec<u8>)> {
    let noise: Vec<u8> = (0..20_000u32)
        .map(|i| (i.wrapping_mul(2_654_435_761) >> 13) as u8)
        .collect();
    vec![
        ("empty.bin", Vec::new()),
        ("hello.txt", b"Hello, world!\n".to_vec()),
        ("zeros.bin", vec![0u8; 100_000]),
        ("pattern.txt", b"abcabcabc".repeat(5_000)),
        ("noise.bin", noise),
        ("a", b"short name".to_vec()),
        ("ab", b"prefix of nothing, extension of a".to_vec()),
    ]
}

#[test]
fn every_file_round_trips() {
    let tmp = tempdir().unwrap();
    let files = sample_files();
    let dir = make_source(tmp.path(), &files);

    let report = build_archive(&dir).unwrap();
    assert_eq!(report.entries.len(), files.len());
    assert!(report.skipped.is_empty());

    let blob = tmp.path().join("src.gz");
    let index = tmp.path().join("src.idx");
    assert!(blob.exists() && index.exists());

    for (name, data) in &files {
        assert_eq!(&retrieve(&index, &blob, name).unwrap(), data, "{name}");
    }
}

#[test]
fn members_tile_the_blob() {
    let tmp = tempdir().unwrap();
    let dir = make_source(tmp.path(), &sample_files());
    let report = build_archive(&dir).unwrap();

    let mut expected = 0;
    for entry in &report.entries {
        assert_eq!(entry.offset, expected, "{}", entry.name);
        expected = entry.end();
    }
    let blob_len = fs::metadata(tmp.path().join("src.gz")).unwrap().len();
    assert_eq!(expected, blob_len);
    assert_eq!(report.blob_len, blob_len);
}

#[test]
fn members_decode_from_their_own_bytes() {
    let tmp = tempdir().unwrap();
    let files = sample_files();
    let dir = make_source(tmp.path(), &files);
    let report = build_archive(&dir).unwrap();
    let blob = fs::read(tmp.path().join("src.gz")).unwrap();
    let originals: HashMap<_, _> = files.into_iter().collect();

    for entry in &report.entries {
        // A copy holding only this member's bytes, nothing before or after.
        let start = entry.offset as usize;
        let isolated = blob[start..start + entry.length as usize].to_vec();
        let mut decoded = Vec::new();
        flate2::read::GzDecoder::new(SectionReader::new(&isolated, 0, entry.length))
            .read_to_end(&mut decoded)
            .unwrap();
        assert_eq!(decoded, originals[entry.name.as_str()], "{}", entry.name);
    }
}

#[test]
fn index_matches_build_order() {
    let tmp = tempdir().unwrap();
    let dir = make_source(tmp.path(), &sample_files());
    let report = build_archive(&dir).unwrap();

    let index = Index::load(&tmp.path().join("src.idx")).unwrap();
    assert_eq!(index.entries(), report.entries.as_slice());
}

#[test]
fn missing_name_is_not_found_without_touching_the_blob() {
    let tmp = tempdir().unwrap();
    let dir = make_source(tmp.path(), &[("present.txt", b"here".to_vec())]);
    build_archive(&dir).unwrap();

    // The blob path does not exist, so any attempt to open it would fail
    // with a different error.
    let index = tmp.path().join("src.idx");
    let err = retrieve(&index, &tmp.path().join("nowhere.gz"), "absent.txt").unwrap_err();
    assert!(matches!(err, gzix::Error::NameNotFound { .. }), "{err}");
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn empty_directory_gives_empty_archive() {
    let tmp = tempdir().unwrap();
    let dir = make_source(tmp.path(), &[]);
    let report = build_archive(&dir).unwrap();

    assert!(report.entries.is_empty());
    assert_eq!(fs::metadata(tmp.path().join("src.gz")).unwrap().len(), 0);
    assert_eq!(fs::read(tmp.path().join("src.idx")).unwrap(), b"");

    let err = lookup(&tmp.path().join("src.idx"), "anything").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn rebuild_replaces_previous_archive() {
    let tmp = tempdir().unwrap();
    let dir = make_source(tmp.path(), &sample_files());

    let first = build_archive(&dir).unwrap();
    // Leftover bytes from an earlier, larger archive must not survive.
    let blob = tmp.path().join("src.gz");
    let mut bigger = fs::read(&blob).unwrap();
    bigger.extend_from_slice(&[0xAA; 4096]);
    fs::write(&blob, &bigger).unwrap();

    let second = build_archive(&dir).unwrap();
    assert_eq!(first.entries.len(), second.entries.len());
    let mut a: Vec<_> = first.entries.iter().map(|e| (&e.name, e.length)).collect();
    let mut b: Vec<_> = second.entries.iter().map(|e| (&e.name, e.length)).collect();
    a.sort();
    b.sort();
    assert_eq!(a, b);
    assert_eq!(fs::metadata(&blob).unwrap().len(), second.blob_len);

    let index = tmp.path().join("src.idx");
    for (name, data) in sample_files() {
        assert_eq!(retrieve(&index, &blob, name).unwrap(), data);
    }
}

#[test]
fn duplicate_names_resolve_to_the_first_record() {
    let tmp = tempdir().unwrap();
    let blob_path = tmp.path().join("dup.gz");
    let index_path = tmp.path().join("dup.idx");

    let mut builder = gzix::ArchiveBuilder::create(&blob_path, &index_path).unwrap();
    builder.append("same".into(), b"first").unwrap();
    builder.append("same".into(), b"second").unwrap();
    builder.finish().unwrap();

    assert_eq!(retrieve(&index_path, &blob_path, "same").unwrap(), b"first");
    let index = Index::load(&index_path).unwrap();
    assert_eq!(index.len(), 2);
    assert_eq!(index.get("same").unwrap().offset, 0);
}

#[test]
fn built_archive_verifies() {
    let tmp = tempdir().unwrap();
    let dir = make_source(tmp.path(), &sample_files());
    build_archive(&dir).unwrap();

    let index = Index::load(&tmp.path().join("src.idx")).unwrap();
    let extractor = ArchiveExtractor::open(&tmp.path().join("src.gz")).unwrap();
    let report = verify(&index, &extractor);
    assert!(report.is_ok(), "{:?}", report.problems);
    assert_eq!(report.members, sample_files().len());

    for entry in index.entries() {
        let info = extractor.inspect(entry).unwrap();
        let original = fs::read(dir.join(&entry.name)).unwrap();
        assert_eq!(info.uncompressed_size as usize, original.len());
    }
}

#[test]
fn damaged_member_is_corrupt() {
    let tmp = tempdir().unwrap();
    let dir = make_source(tmp.path(), &[("text.txt", b"some text ".repeat(200))]);
    build_archive(&dir).unwrap();

    let blob = tmp.path().join("src.gz");
    let mut bytes = fs::read(&blob).unwrap();
    let len = bytes.len();
    // Flip a bit in the stored CRC32.
    bytes[len - 8] ^= 0x01;
    fs::write(&blob, &bytes).unwrap();

    let err = retrieve(&tmp.path().join("src.idx"), &blob, "text.txt").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CorruptStream);
}
