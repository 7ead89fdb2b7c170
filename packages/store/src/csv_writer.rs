//! Append-only ratings CSVs.
//!
//! Every file has the header `rank,player,rating,region`, written once
//! when the file is created (or found empty). Rows are appended in the
//! order given.
//!
//! The writer never appends a row whose `(player, region)` key is already
//! present in the target file. The scrape loop's checkpoint normally keeps
//! committed pages from being fetched twice; the key check additionally
//! covers a crash between a CSV append and the following checkpoint save,
//! and players that shift across a page boundary mid-scrape.

use std::collections::{HashMap, HashSet};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use bh_ladder_models::{LeaderboardEntry, Metric, RatingRecord, Region};

use crate::StoreError;
use crate::paths::{OutputScope, ratings_csv};

/// Column header shared by every ratings CSV.
pub const HEADER: [&str; 4] = ["rank", "player", "rating", "region"];

type RowKey = (String, Region);

/// Appends rating rows to the CSVs of one output directory.
#[derive(Debug)]
pub struct CsvWriter {
    dir: PathBuf,
    seen: HashMap<PathBuf, HashSet<RowKey>>,
}

impl CsvWriter {
    /// Creates a writer for the CSVs inside `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            seen: HashMap::new(),
        }
    }

    /// Returns the CSV path for `metric` in `scope`.
    #[must_use]
    pub fn path_for(&self, scope: OutputScope, metric: Metric) -> PathBuf {
        ratings_csv(&self.dir, scope, metric)
    }

    /// Appends `records` to the `metric` file of `scope`.
    ///
    /// Returns the number of rows actually written; rows whose key is
    /// already in the file are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file cannot be read, opened, or
    /// written.
    pub fn append(
        &mut self,
        scope: OutputScope,
        metric: Metric,
        records: &[RatingRecord],
    ) -> Result<usize, StoreError> {
        let path = self.path_for(scope, metric);

        if !self.seen.contains_key(&path) {
            let keys = read_records(&path)?
                .iter()
                .map(RatingRecord::key)
                .collect();
            self.seen.insert(path.clone(), keys);
        }
        let seen = self.seen.entry(path.clone()).or_default();

        let fresh: Vec<&RatingRecord> = records.iter().filter(|r| seen.insert(r.key())).collect();
        let skipped = records.len() - fresh.len();
        if skipped > 0 {
            log::debug!(
                "Skipped {skipped} duplicate row(s) already in {}",
                path.display()
            );
        }

        if fresh.is_empty() && path.exists() {
            return Ok(0);
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| StoreError::io(&path, e))?;
        let needs_header = file.metadata().map_err(|e| StoreError::io(&path, e))?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if needs_header {
            writer
                .write_record(HEADER)
                .map_err(|e| StoreError::csv(&path, e))?;
        }
        for record in &fresh {
            writer
                .serialize(record)
                .map_err(|e| StoreError::csv(&path, e))?;
        }
        writer.flush().map_err(|e| StoreError::io(&path, e))?;

        Ok(fresh.len())
    }

    /// Appends both metrics of `entries` to their `scope` files.
    ///
    /// Returns the number of rows written to the peak file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if either file cannot be written.
    pub fn append_entries(
        &mut self,
        scope: OutputScope,
        entries: &[LeaderboardEntry],
    ) -> Result<usize, StoreError> {
        let mut written = 0;
        for metric in Metric::ALL {
            let records: Vec<RatingRecord> = entries.iter().map(|e| e.record(*metric)).collect();
            let count = self.append(scope, *metric, &records)?;
            if *metric == Metric::Peak {
                written = count;
            }
        }
        Ok(written)
    }

    /// Forgets cached row keys so the next append re-reads each file.
    ///
    /// Needed after a file has been replaced behind the writer's back.
    pub fn invalidate(&mut self) {
        self.seen.clear();
    }
}

/// Reads every row of a ratings CSV. A missing file yields no rows.
///
/// # Errors
///
/// Returns [`StoreError`] if the file cannot be read or a row does not
/// match the `rank,player,rating,region` layout.
pub fn read_records(path: &Path) -> Result<Vec<RatingRecord>, StoreError> {
    let file = match std::fs::File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StoreError::io(path, e)),
    };

    csv::Reader::from_reader(file)
        .deserialize()
        .collect::<Result<Vec<RatingRecord>, _>>()
        .map_err(|e| StoreError::csv(path, e))
}

/// Replaces `path` with a header followed by `records`.
///
/// # Errors
///
/// Returns [`StoreError`] if serialization or the atomic replace fails.
pub fn write_all(path: &Path, records: &[RatingRecord]) -> Result<(), StoreError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer
        .write_record(HEADER)
        .map_err(|e| StoreError::csv(path, e))?;
    for record in records {
        writer
            .serialize(record)
            .map_err(|e| StoreError::csv(path, e))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| StoreError::io(path, e.into_error()))?;

    crate::replace_file(path, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(rank: u32, player: &str, region: Region) -> LeaderboardEntry {
        LeaderboardEntry {
            rank,
            player: player.to_string(),
            region,
            peak_rating: 2000 - i64::from(rank),
            season_rating: 1900 - i64::from(rank),
        }
    }

    #[test]
    fn writes_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = CsvWriter::new(dir.path());
        let scope = OutputScope::Region(Region::Sea);

        writer
            .append_entries(scope, &[entry(1, "a", Region::Sea)])
            .unwrap();
        writer
            .append_entries(scope, &[entry(2, "b", Region::Sea)])
            .unwrap();

        let peak = std::fs::read_to_string(writer.path_for(scope, Metric::Peak)).unwrap();
        assert_eq!(peak, "rank,player,rating,region\n1,a,1999,sea\n2,b,1998,sea\n");

        let season = read_records(&writer.path_for(scope, Metric::Season)).unwrap();
        assert_eq!(
            season.iter().map(|r| r.rating).collect::<Vec<_>>(),
            vec![1899, 1898]
        );
    }

    #[test]
    fn skips_rows_already_in_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let scope = OutputScope::Region(Region::Eu);

        let mut first = CsvWriter::new(dir.path());
        first
            .append_entries(scope, &[entry(1, "a", Region::Eu), entry(2, "b", Region::Eu)])
            .unwrap();

        // A fresh writer must see the keys already on disk.
        let mut second = CsvWriter::new(dir.path());
        let written = second
            .append_entries(scope, &[entry(2, "b", Region::Eu), entry(3, "c", Region::Eu)])
            .unwrap();

        assert_eq!(written, 1);
        let rows = read_records(&second.path_for(scope, Metric::Peak)).unwrap();
        assert_eq!(
            rows.iter().map(|r| r.player.as_str()).collect::<Vec<_>>(),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn write_all_replaces_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("peak_ratings_global.csv");
        std::fs::write(&path, "stale").unwrap();

        let records = vec![entry(1, "a", Region::Jpn).record(Metric::Peak)];
        write_all(&path, &records).unwrap();

        assert_eq!(read_records(&path).unwrap(), records);
    }

    #[test]
    fn read_records_of_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_records(&dir.path().join("nope.csv")).unwrap().is_empty());
    }
}
