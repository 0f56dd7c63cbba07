//! Batching whole files into combined splits.

use anyhow::Result;
use ironbeam_wholefile::testing::*;
use ironbeam_wholefile::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};


fn splits(lengths: &[u64]) -> Vec<FileSplit> {
    lengths
        .iter()
        .enumerate()
        .map(|(i, &len)| FileSplit::new(format!("/f{i}"), 0, len))
        .collect()
}

fn batch_paths(batches: &[CombinedSplit]) -> Vec<Vec<String>> {
    batches
        .iter()
        .map(|b| b.splits.iter().map(|s| s.path.clone()).collect())
        .collect()
}

#[test]
fn batches_respect_file_cap_and_order() {
    let batches = combine_splits(splits(&[1, 1, 1, 1, 1]), 2, u64::MAX);
    assert_eq!(
        batch_paths(&batches),
        vec![
            vec!["/f0".to_string(), "/f1".to_string()],
            vec!["/f2".to_string(), "/f3".to_string()],
            vec!["/f4".to_string()],
        ]
    );
}

#[test]
fn batches_respect_byte_cap() {
    let batches = combine_splits(splits(&[4, 4, 4, 10, 1]), 100, 8);
    let sizes: Vec<u64> = batches.iter().map(CombinedSplit::length).collect();
    assert_eq!(sizes, vec![8, 4, 10, 1]);
    assert!(batches.iter().all(|b| !b.is_empty()));
}

#[test]
fn no_batches_for_no_splits() {
    assert!(combine_splits(Vec::new(), 4, 4).is_empty());
}

#[test]
fn combined_reader_yields_each_file_in_order() -> Result<()> {
    let storage = MemoryStorage::new();
    storage.put("/in/a", b"first".to_vec());
    storage.put("/in/b", Vec::new());
    storage.put("/in/c", patterned_bytes(9));
    let shared: Arc<dyn Storage> = Arc::new(storage.clone());

    let format = CombineWholeFileInputFormat::default();
    let batches = format.splits(shared.as_ref(), "/in/*")?;
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 3);

    let mut reader = format.create_reader(&batches[0], Arc::clone(&shared))?;
    let records = drain_reader(reader.as_mut())?;
    let c = patterned_bytes(9);
    let expected: [(&str, &[u8]); 3] = [("/in/a", b"first"), ("/in/b", b""), ("/in/c", &c)];
    assert_records_eq(&records, &expected);
    assert!(reader.next()?.is_none());
    assert_eq!(storage.open_streams(), 0);
    Ok(())
}

#[test]
fn combined_progress_advances_per_file() -> Result<()> {
    let storage = MemoryStorage::new();
    for name in ["/p/1", "/p/2", "/p/3", "/p/4"] {
        storage.put(name, vec![0; 3]);
    }
    let shared: Arc<dyn Storage> = Arc::new(storage);
    let split = CombinedSplit::new(shared.list("/p/*")?.iter().map(FileSplit::whole).collect());

    let mut reader = CombinedRecordReader::new(&split, shared, &InputConfig::default())?;
    assert_eq!(reader.len(), 4);
    assert_progress!(reader.progress(), 0.0);
    reader.next()?;
    assert_progress!(reader.progress(), 0.25);
    reader.next()?;
    reader.next()?;
    assert_progress!(reader.progress(), 0.75);
    reader.next()?;
    assert_progress!(reader.progress(), 1.0);
    assert!(reader.next()?.is_none());
    assert_progress!(reader.progress(), 1.0);
    assert_eq!(reader.position(), 0);
    Ok(())
}

#[test]
fn empty_combined_split_is_complete() -> Result<()> {
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    let mut reader =
        CombinedRecordReader::new(&CombinedSplit::default(), storage, &InputConfig::default())?;
    assert!(reader.is_empty());
    assert_progress!(reader.progress(), 1.0);
    assert!(reader.next()?.is_none());
    Ok(())
}

#[test]
fn oversized_member_fails_construction() {
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    let split = CombinedSplit::new(splits(&[4, 40, 4]));
    let config = InputConfig::default().with_max_record_size(10);
    let err = CombinedRecordReader::new(&split, storage, &config).expect_err("member too large");
    assert!(matches!(err, InputError::FileTooLarge { length: 40, .. }));
}

#[test]
fn failure_in_a_member_surfaces_and_is_not_skipped() -> Result<()> {
    let storage = MemoryStorage::new();
    storage.put("/m/a", vec![1; 4]);
    storage.put("/m/b", vec![2; 4]);
    storage.fail("/m/b", Fault::Open);
    let shared: Arc<dyn Storage> = Arc::new(storage);
    let split = CombinedSplit::new(shared.list("/m/*")?.iter().map(FileSplit::whole).collect());

    let mut reader = CombinedRecordReader::new(&split, shared, &InputConfig::default())?;
    assert!(reader.next()?.is_some());
    assert!(reader.next().is_err());
    assert_progress!(reader.progress(), 0.5);
    reader.close()?;
    Ok(())
}

#[test]
fn format_packs_by_configured_caps() -> Result<()> {
    let dir = TempDirPath::new()?;
    let files: Vec<(String, Vec<u8>)> = (0..7)
        .map(|i| (format!("part-{i}.bin"), patterned_bytes(10)))
        .collect();
    write_files(dir.path(), &files)?;

    let config = InputConfig::default()
        .with_max_files_per_split(3)
        .with_max_split_bytes(1024);
    let format = CombineWholeFileInputFormat::new(config);
    let batches = format.splits(&LocalStorage, &dir.pattern("*.bin"))?;
    let counts: Vec<usize> = batches.iter().map(CombinedSplit::len).collect();
    assert_eq!(counts, vec![3, 3, 1]);
    Ok(())
}

/// Yields one record, counts closes, and optionally fails every close.
struct CountingReader {
    record: Option<Record>,
    fail_close: bool,
    closes: Arc<AtomicUsize>,
}

impl CountingReader {
    fn boxed(key: &str, fail_close: bool, closes: &Arc<AtomicUsize>) -> Box<dyn RecordReader> {
        Box::new(Self {
            record: Some(Record {
                key: key.to_string(),
                value: key.as_bytes().to_vec(),
            }),
            fail_close,
            closes: Arc::clone(closes),
        })
    }
}

impl RecordReader for CountingReader {
    fn next(&mut self) -> ironbeam_wholefile::Result<Option<Record>> {
        Ok(self.record.take())
    }

    fn progress(&self) -> f32 {
        if self.record.is_some() { 0.0 } else { 1.0 }
    }

    fn position(&self) -> u64 {
        0
    }

    fn close(&mut self) -> ironbeam_wholefile::Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            return Err(InputError::io(
                "member",
                std::io::Error::other("release failed"),
            ));
        }
        Ok(())
    }
}

#[test]
fn close_attempts_every_member_and_reports_first_failure() {
    let closes = Arc::new(AtomicUsize::new(0));
    let mut reader = CombinedRecordReader::from_readers(vec![
        CountingReader::boxed("/a", false, &closes),
        CountingReader::boxed("/b", true, &closes),
        CountingReader::boxed("/c", true, &closes),
    ]);

    let err = reader.close().expect_err("two members fail to close");
    assert!(matches!(err, InputError::Io { .. }));
    assert_eq!(closes.load(Ordering::SeqCst), 3);
}

#[test]
fn exhausted_member_close_failure_stops_iteration() -> Result<()> {
    let closes = Arc::new(AtomicUsize::new(0));
    let mut reader = CombinedRecordReader::from_readers(vec![
        CountingReader::boxed("/a", true, &closes),
        CountingReader::boxed("/b", false, &closes),
    ]);

    assert_eq!(reader.next()?.map(|r| r.key), Some("/a".to_string()));
    assert!(reader.next().is_err());
    assert_eq!(closes.load(Ordering::SeqCst), 1);
    Ok(())
}
