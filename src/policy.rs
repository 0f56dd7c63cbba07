//! Split policies and split planning.
//!
//! The host framework's default is to cut large files into size-bounded ranges
//! so several workers can share one file. [`WholeFilePolicy`] opts out of that:
//! every file becomes exactly one split, whatever its size, because consumers
//! need the complete content as one unit.

use crate::split::{FileSplit, InputFile};
use log::debug;

/// Decides whether a file may be divided into more than one split.
pub trait SplitPolicy: Send + Sync {
    fn is_splittable(&self, file: &InputFile) -> bool;
}

/// Never split. Total and pure.
#[derive(Debug, Clone, Copy, Default)]
pub struct WholeFilePolicy;

impl SplitPolicy for WholeFilePolicy {
    fn is_splittable(&self, _file: &InputFile) -> bool {
        false
    }
}

/// The framework default: any file may be cut into `split_size` ranges.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockSplitPolicy;

impl SplitPolicy for BlockSplitPolicy {
    fn is_splittable(&self, _file: &InputFile) -> bool {
        true
    }
}

/// Turn discovered files into splits, honoring `policy`.
///
/// Non-splittable files produce exactly one split each. Splittable files produce
/// contiguous ranges of at most `split_size` bytes; an empty file still yields a
/// single empty split so that it is not silently dropped. Output follows input order.
pub fn plan_splits(
    policy: &dyn SplitPolicy,
    files: &[InputFile],
    split_size: u64,
) -> Vec<FileSplit> {
    let split_size = split_size.max(1);
    let mut splits = Vec::with_capacity(files.len());
    for file in files {
        if !policy.is_splittable(file) || file.length <= split_size {
            splits.push(FileSplit::whole(file));
            continue;
        }
        let mut start = 0;
        while start < file.length {
            let length = split_size.min(file.length - start);
            splits.push(FileSplit::new(file.path.clone(), start, length));
            start += length;
        }
    }
    debug!("planned {} splits over {} files", splits.len(), files.len());
    splits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_policy_cuts_ranges() {
        let files = vec![InputFile::new("/a", 25)];
        let splits = plan_splits(&BlockSplitPolicy, &files, 10);
        let ranges: Vec<_> = splits.iter().map(|s| (s.start, s.length)).collect();
        assert_eq!(ranges, vec![(0, 10), (10, 10), (20, 5)]);
    }

    #[test]
    fn empty_file_still_planned() {
        let files = vec![InputFile::new("/empty", 0)];
        assert_eq!(plan_splits(&BlockSplitPolicy, &files, 10).len(), 1);
        assert_eq!(plan_splits(&WholeFilePolicy, &files, 10).len(), 1);
    }
}
