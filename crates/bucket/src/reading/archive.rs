//! Persistence collaborators.
//!
//! A [`Writer`] stores readings and hands back a [`RecordRef`]; a [`Reader`]
//! turns those references back into readings. Two backends are provided:
//! [`MemoryArchive`] for in-process use and [`JsonArchive`], which keeps one
//! JSON file per record in a directory.

use super::{MergeReading, PuppetReading, Reading};
use crate::result::{BucketError, BucketResult};
use std::path::{Path, PathBuf};

/// Handle to a stored record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordRef(pub usize);

/// Stores readings
pub trait Writer {
    /// Store a snapshot of `reading`
    fn write(&mut self, reading: &dyn Reading) -> BucketResult<RecordRef>;
}

/// Loads readings
pub trait Reader {
    /// Reading type produced
    type Record: Reading;

    /// Load one record
    fn read(&self, record: RecordRef) -> BucketResult<Self::Record>;

    /// Load every record, oldest first
    fn read_all(&self) -> BucketResult<Vec<Self::Record>>;

    /// Merge every record into one reading, or `None` when empty
    fn merge_all(&self) -> BucketResult<Option<PuppetReading>> {
        let records = self.read_all()?;
        let Some((master, rest)) = records.split_first() else {
            return Ok(None);
        };
        let others: Vec<&dyn Reading> = rest.iter().map(|r| r as &dyn Reading).collect();
        let merged = MergeReading::new(master, &others)?;
        Ok(Some(PuppetReading::from_reading(&merged)))
    }
}

/// Archive held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    records: Vec<PuppetReading>,
}

impl MemoryArchive {
    /// Empty archive
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing has been stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Writer for MemoryArchive {
    fn write(&mut self, reading: &dyn Reading) -> BucketResult<RecordRef> {
        self.records.push(PuppetReading::from_reading(reading));
        Ok(RecordRef(self.records.len() - 1))
    }
}

impl Reader for MemoryArchive {
    type Record = PuppetReading;

    fn read(&self, record: RecordRef) -> BucketResult<PuppetReading> {
        self.records
            .get(record.0)
            .cloned()
            .ok_or(BucketError::UnknownRecord(record.0))
    }

    fn read_all(&self) -> BucketResult<Vec<PuppetReading>> {
        Ok(self.records.clone())
    }
}

/// Archive of JSON files, `record-000000.json` onwards, in one directory
#[derive(Debug, Clone)]
pub struct JsonArchive {
    dir: PathBuf,
}

impl JsonArchive {
    /// Open (creating if needed) an archive directory
    pub fn open(dir: impl AsRef<Path>) -> BucketResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Archive directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, record: RecordRef) -> PathBuf {
        self.dir.join(format!("record-{:06}.json", record.0))
    }

    fn count(&self) -> usize {
        let mut count = 0;
        while self.path(RecordRef(count)).exists() {
            count += 1;
        }
        count
    }
}

impl Writer for JsonArchive {
    fn write(&mut self, reading: &dyn Reading) -> BucketResult<RecordRef> {
        let record = RecordRef(self.count());
        PuppetReading::from_reading(reading).save(self.path(record))?;
        tracing::debug!(dir = %self.dir.display(), record = record.0, "wrote record");
        Ok(record)
    }
}

impl Reader for JsonArchive {
    type Record = PuppetReading;

    fn read(&self, record: RecordRef) -> BucketResult<PuppetReading> {
        let path = self.path(record);
        if !path.exists() {
            return Err(BucketError::UnknownRecord(record.0));
        }
        PuppetReading::load(path)
    }

    fn read_all(&self) -> BucketResult<Vec<PuppetReading>> {
        (0..self.count()).map(|i| self.read(RecordRef(i))).collect()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::reading::{BucketGoalTuple, BucketHitTuple, GoalTuple, Span};

    fn reading(hits: &[u64]) -> PuppetReading {
        PuppetReading {
            def_sha: Some("def".into()),
            rec_sha: Some("rec".into()),
            goals: vec![GoalTuple {
                start: 0,
                target: 10,
                name: "DEFAULT".into(),
                description: String::new(),
            }],
            bucket_goals: (0..hits.len())
                .map(|start| BucketGoalTuple { start, goal: 0 })
                .collect(),
            bucket_hits: hits
                .iter()
                .enumerate()
                .map(|(start, &hits)| BucketHitTuple { start, hits })
                .collect(),
            ..PuppetReading::new()
        }
    }

    fn hits(reading: &dyn Reading) -> Vec<u64> {
        reading.iter_bucket_hits(Span::all()).map(|b| b.hits).collect()
    }

    #[test]
    fn test_memory_archive() {
        let mut archive = MemoryArchive::new();
        assert!(archive.merge_all().unwrap().is_none());

        let first = archive.write(&reading(&[1, 2])).unwrap();
        let second = archive.write(&reading(&[3, 0])).unwrap();
        assert_eq!((first, second), (RecordRef(0), RecordRef(1)));
        assert_eq!(archive.len(), 2);
        assert_eq!(hits(&archive.read(second).unwrap()), [3, 0]);
        assert!(matches!(
            archive.read(RecordRef(7)),
            Err(BucketError::UnknownRecord(7))
        ));

        let merged = archive.merge_all().unwrap().unwrap();
        assert_eq!(hits(&merged), [4, 2]);
        assert_eq!(merged.def_sha.as_deref(), Some("def"));
    }

    #[test]
    fn test_json_archive() {
        let dir = tempfile::tempdir().unwrap();
        let mut archive = JsonArchive::open(dir.path().join("records")).unwrap();
        archive.write(&reading(&[1, 1])).unwrap();
        archive.write(&reading(&[0, 5])).unwrap();
        assert!(archive.dir().join("record-000001.json").exists());

        let reopened = JsonArchive::open(archive.dir()).unwrap();
        assert_eq!(reopened.read_all().unwrap().len(), 2);
        assert_eq!(hits(&reopened.merge_all().unwrap().unwrap()), [1, 6]);
        assert!(matches!(
            reopened.read(RecordRef(2)),
            Err(BucketError::UnknownRecord(2))
        ));
    }

    #[test]
    fn test_merge_all_rejects_foreign_record() {
        let mut archive = MemoryArchive::new();
        archive.write(&reading(&[1])).unwrap();
        let mut foreign = reading(&[1]);
        foreign.def_sha = Some("elsewhere".into());
        archive.write(&foreign).unwrap();
        assert!(matches!(
            archive.merge_all(),
            Err(BucketError::DefinitionHashMismatch { .. })
        ));
    }
}
