//! Split policy and planning.

use anyhow::Result;
use ironbeam_wholefile::testing::*;
use ironbeam_wholefile::*;

#[test]
fn whole_file_policy_never_splits() {
    let policy = WholeFilePolicy;
    for length in [0, 1, 37, 128 * 1024 * 1024, u64::from(u32::MAX), u64::MAX] {
        assert!(!policy.is_splittable(&InputFile::new("/f", length)));
    }
}

#[test]
fn whole_file_planning_ignores_split_size() {
    let files = vec![
        InputFile::new("/a", 5),
        InputFile::new("/b", 1_000_000),
        InputFile::new("/c", 0),
    ];
    let splits = plan_splits(&WholeFilePolicy, &files, 1024);
    assert_eq!(
        splits,
        vec![
            FileSplit::new("/a", 0, 5),
            FileSplit::new("/b", 0, 1_000_000),
            FileSplit::new("/c", 0, 0),
        ]
    );
}

#[test]
fn default_policy_would_split_the_same_file() {
    let files = vec![InputFile::new("/b", 1_000_000)];
    let splits = plan_splits(&BlockSplitPolicy, &files, 300_000);
    assert_eq!(splits.len(), 4);
    assert_eq!(splits.iter().map(|s| s.length).sum::<u64>(), 1_000_000);
    assert!(splits.iter().all(|s| s.path == "/b"));
    assert_eq!(splits.last().map(|s| s.start), Some(900_000));
}

#[test]
fn formats_report_files_as_unsplittable() {
    let file = InputFile::new("/f", u64::MAX);
    assert!(!WholeFileInputFormat::default().is_splittable(&file));
    assert!(!CombineWholeFileInputFormat::default().is_splittable(&file));
}

#[test]
fn one_split_per_listed_file() -> Result<()> {
    let dir = TempDirPath::new()?;
    write_files(dir.path(), &sample_files())?;
    write_files(dir.path(), &[("ignored.txt".to_string(), b"x".to_vec())])?;

    let config = InputConfig::default().with_split_size(8);
    let format = WholeFileInputFormat::new(config);
    let splits = format.splits(&LocalStorage, &dir.pattern("*.bin"))?;

    assert_eq!(splits.len(), 4);
    for (split, (name, data)) in splits.iter().zip(sample_files()) {
        assert!(split.path.ends_with(&name));
        assert_eq!(split.start, 0);
        assert_eq!(split.length, data.len() as u64);
    }
    Ok(())
}

#[test]
fn directories_are_not_listed() -> Result<()> {
    let dir = TempDirPath::new()?;
    write_files(dir.path(), &[("nested/x.bin".to_string(), vec![1])])?;
    std::fs::create_dir_all(dir.file_path("dir.bin"))?;

    let files = LocalStorage.list(&dir.pattern("**/*.bin"))?;
    assert_eq!(files.len(), 1);
    assert!(files[0].path.ends_with("x.bin"));
    Ok(())
}

#[test]
fn invalid_pattern_is_reported() {
    let err = LocalStorage.list("data/[").expect_err("unclosed bracket");
    assert!(matches!(err, InputError::InvalidPattern { .. }));

    let err = MemoryStorage::new().list("/data/[").expect_err("unclosed bracket");
    assert!(matches!(err, InputError::InvalidPattern { .. }));
}

#[test]
fn memory_listing_does_not_cross_directories() -> Result<()> {
    let storage = MemoryStorage::new();
    storage.put("/data/a.bin", vec![1]);
    storage.put("/data/deep/b.bin", vec![2, 2]);

    let shallow = storage.list("/data/*.bin")?;
    assert_eq!(shallow, vec![InputFile::new("/data/a.bin", 1)]);

    let deep = storage.list("/data/**/*.bin")?;
    assert_eq!(deep.len(), 2);
    Ok(())
}

#[test]
fn splits_serialize_for_shipping_to_workers() -> Result<()> {
    let split = FileSplit::new("/data/sample.bin", 0, 37);
    let json = serde_json::to_string(&split)?;
    let back: FileSplit = serde_json::from_str(&json)?;
    assert_eq!(back, split);
    Ok(())
}

#[cfg(unix)]
#[test]
fn dangling_symlinks_are_skipped() -> Result<()> {
    let dir = TempDirPath::new()?;
    write_files(dir.path(), &[("a.bin".to_string(), patterned_bytes(12))])?;
    std::os::unix::fs::symlink(dir.file_path("missing.bin"), dir.file_path("b.bin"))?;

    let splits = WholeFileInputFormat::default().splits(&LocalStorage, &dir.pattern("*.bin"))?;
    assert_eq!(splits.len(), 1);
    assert!(splits[0].path.ends_with("a.bin"));
    assert_eq!(splits[0].length, 12);
    Ok(())
}

#[test]
fn status_of_a_directory_is_not_retryable() -> Result<()> {
    let dir = TempDirPath::new()?;
    let path = dir.path().display().to_string();

    let err = LocalStorage.status(&path).expect_err("directories are not files");
    assert!(matches!(err, InputError::NotAFile { .. }));
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(!err.is_retryable());
    Ok(())
}
