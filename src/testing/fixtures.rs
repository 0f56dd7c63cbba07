//! Deterministic payloads for whole-file tests.

/// `len` bytes cycling through `0xDE 0xAD 0xBE 0xEF`.
///
/// # Example
///
/// ```
/// use ironbeam_wholefile::testing::patterned_bytes;
///
/// let bytes = patterned_bytes(6);
/// assert_eq!(bytes, vec![0xDE, 0xAD, 0xBE, 0xEF, 0xDE, 0xAD]);
/// ```
#[must_use]
pub fn patterned_bytes(len: usize) -> Vec<u8> {
    const PATTERN: [u8; 4] = [0xDE, 0xAD, 0xBE, 0xEF];
    PATTERN.iter().copied().cycle().take(len).collect()
}

/// A small set of named binary files of different sizes, including an empty one.
#[must_use]
pub fn sample_files() -> Vec<(String, Vec<u8>)> {
    vec![
        ("a.bin".to_string(), patterned_bytes(37)),
        ("b.bin".to_string(), b"\x00\x01\x02\xff not utf-8 \xfe".to_vec()),
        ("c.bin".to_string(), Vec::new()),
        ("d.bin".to_string(), patterned_bytes(4096)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_files_are_sorted_and_distinct() {
        let names: Vec<_> = sample_files().into_iter().map(|(n, _)| n).collect();
        let mut sorted = names.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(names, sorted);
    }
}
