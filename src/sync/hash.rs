//! Content hashing for sync attempts.
//!
//! A fingerprint of the exported cells is logged with every publish so that
//! racing attempts can be told apart in the logs.

use sha2::{Digest, Sha256};

/// Compute a SHA256 hash over a sequence of rows of cells.
///
/// Cells are separated by a unit separator and rows by a record separator,
/// so `["ab", "c"]` and `["a", "bc"]` hash differently.
#[must_use]
pub fn rows_hash<R, C>(rows: R) -> String
where
    R: IntoIterator<Item = C>,
    C: IntoIterator,
    C::Item: AsRef<str>,
{
    let mut hasher = Sha256::new();
    for row in rows {
        for cell in row {
            hasher.update(cell.as_ref().as_bytes());
            hasher.update([0x1f]);
        }
        hasher.update([0x1e]);
    }
    format!("{:x}", hasher.finalize())
}

/// Shorten a fingerprint for log lines.
#[must_use]
pub fn short_hash(hash: &str) -> &str {
    hash.get(..12).unwrap_or(hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_hash_deterministic() {
        let rows = vec![vec!["ID", "Name"], vec!["1", "A"]];
        let hash1 = rows_hash(rows.clone());
        let hash2 = rows_hash(rows);

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64); // SHA256 produces 64 hex chars
    }

    #[test]
    fn test_cell_boundaries_matter() {
        assert_ne!(rows_hash([["ab", "c"]]), rows_hash([["a", "bc"]]));
        assert_ne!(rows_hash(vec![vec!["a", "b"]]), rows_hash(vec![vec!["a"], vec!["b"]]));
    }

    #[test]
    fn test_short_hash() {
        assert_eq!(short_hash("0123456789abcdef"), "0123456789ab");
        assert_eq!(short_hash("abc"), "abc");
    }
}
