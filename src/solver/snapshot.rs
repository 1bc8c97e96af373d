//! Transposition-table snapshots
//!
//! Optional persistence: a JSON file with a versioned header, the catalog
//! hash, and the table entries sorted by fingerprint for byte-stable
//! output. Fingerprints are only meaningful against the catalog they were
//! computed with, so a loader seeing a different catalog hash discards
//! the whole snapshot with `CatalogMismatch`.

use crate::core::catalog_hash;
use crate::solver::tt::{Bound, TTEntry, TranspositionTable};
use crate::{Result, SolverError};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotHeader {
    version: u32,
    catalog_hash: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotEntry {
    fingerprint: u64,
    value: i8,
    bound: Bound,
    depth: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotFile {
    header: SnapshotHeader,
    entries: Vec<SnapshotEntry>,
}

pub fn save<P: AsRef<Path>>(path: P, tt: &TranspositionTable) -> Result<()> {
    let mut entries: Vec<SnapshotEntry> = tt
        .iter()
        .map(|(&fingerprint, entry)| SnapshotEntry {
            fingerprint,
            value: entry.value,
            bound: entry.bound,
            depth: entry.depth,
        })
        .collect();
    entries.sort_by_key(|e| e.fingerprint);

    let file = SnapshotFile {
        header: SnapshotHeader {
            version: SNAPSHOT_VERSION,
            catalog_hash: catalog_hash(),
        },
        entries,
    };
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(writer, &file).map_err(|e| SolverError::Snapshot(e.to_string()))
}

pub fn load<P: AsRef<Path>>(path: P, capacity: usize) -> Result<TranspositionTable> {
    let reader = BufReader::new(File::open(path)?);
    let file: SnapshotFile =
        serde_json::from_reader(reader).map_err(|e| SolverError::Snapshot(e.to_string()))?;

    if file.header.version != SNAPSHOT_VERSION {
        return Err(SolverError::Snapshot(format!(
            "unsupported snapshot version {}",
            file.header.version
        )));
    }
    let expected = catalog_hash();
    if file.header.catalog_hash != expected {
        return Err(SolverError::CatalogMismatch {
            expected,
            found: file.header.catalog_hash,
        });
    }

    let mut tt = TranspositionTable::new(capacity.max(file.entries.len()));
    for entry in file.entries {
        tt.put(
            entry.fingerprint,
            TTEntry {
                value: entry.value,
                bound: entry.bound,
                depth: entry.depth,
            },
        );
    }
    Ok(tt)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tt() -> TranspositionTable {
        let mut tt = TranspositionTable::new(64);
        tt.put(
            11,
            TTEntry {
                value: 1,
                bound: Bound::Exact,
                depth: 3,
            },
        );
        tt.put(
            22,
            TTEntry {
                value: -1,
                bound: Bound::Lower,
                depth: 7,
            },
        );
        tt
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tt.json");
        save(&path, &sample_tt()).unwrap();

        let loaded = load(&path, 64).unwrap();
        assert_eq!(loaded.len(), 2);
        let entry = loaded.get(11).unwrap();
        assert_eq!(entry.value, 1);
        assert_eq!(entry.bound, Bound::Exact);
        let entry = loaded.get(22).unwrap();
        assert_eq!(entry.value, -1);
        assert_eq!(entry.depth, 7);
    }

    #[test]
    fn test_catalog_mismatch_discards() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tt.json");
        save(&path, &sample_tt()).unwrap();

        // Corrupt the stored catalog hash.
        let text = std::fs::read_to_string(&path).unwrap();
        let expected = catalog_hash();
        let tampered = text.replace(&expected.to_string(), "12345");
        std::fs::write(&path, tampered).unwrap();

        match load(&path, 64) {
            Err(SolverError::CatalogMismatch { .. }) => {}
            other => panic!("expected CatalogMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tt.json");
        std::fs::write(&path, "{not json").unwrap();
        match load(&path, 64) {
            Err(SolverError::Snapshot(_)) => {}
            other => panic!("expected Snapshot error, got {other:?}"),
        }
    }
}
