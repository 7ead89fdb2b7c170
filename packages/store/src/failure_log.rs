//! Append-only log of pages that failed to fetch.
//!
//! One `region,page` line per failure. The same page may be recorded more
//! than once across runs; readers deduplicate.

use std::collections::BTreeSet;
use std::fs::OpenOptions;
use std::io::{Read as _, Seek as _, SeekFrom, Write as _};
use std::path::{Path, PathBuf};

use bh_ladder_models::{FailureEntry, PageIndex, Region};

use crate::{StoreError, read_optional, replace_file};

/// File-backed list of [`FailureEntry`] values awaiting retry.
#[derive(Debug, Clone)]
pub struct FailureLog {
    path: PathBuf,
}

impl FailureLog {
    /// Creates a log backed by `path`. A missing file is an empty log.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends a failure for `page` of `region`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file cannot be opened or written.
    pub fn record(&self, region: Region, page: PageIndex) -> Result<(), StoreError> {
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StoreError::io(&self.path, e))?;

        let mut line = String::new();
        if !ends_with_newline(&mut file).map_err(|e| StoreError::io(&self.path, e))? {
            line.push('\n');
        }
        line.push_str(&FailureEntry::new(region, page).to_string());
        line.push('\n');

        file.write_all(line.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|e| StoreError::io(&self.path, e))
    }

    /// Returns every distinct entry, ordered by region then page.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file exists but cannot be read.
    pub fn entries(&self) -> Result<Vec<FailureEntry>, StoreError> {
        let contents = read_optional(&self.path)?;
        let entries: BTreeSet<FailureEntry> = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter_map(|line| match line.parse::<FailureEntry>() {
                Ok(entry) => Some(entry),
                Err(e) => {
                    log::warn!(
                        "Ignoring malformed failure line {line:?} in {}: {e}",
                        self.path.display()
                    );
                    None
                }
            })
            .collect();

        Ok(entries.into_iter().collect())
    }

    /// Returns the distinct failed pages for `region`, ascending.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file exists but cannot be read.
    pub fn list(&self, region: Region) -> Result<Vec<PageIndex>, StoreError> {
        Ok(self
            .entries()?
            .into_iter()
            .filter(|entry| entry.region == region)
            .map(|entry| entry.page)
            .collect())
    }

    /// Returns the distinct regions that have at least one failed page.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file exists but cannot be read.
    pub fn regions(&self) -> Result<Vec<Region>, StoreError> {
        let regions: BTreeSet<Region> = self.entries()?.into_iter().map(|e| e.region).collect();
        Ok(regions.into_iter().collect())
    }

    /// Removes every line for `page` of `region`.
    ///
    /// Returns `true` if anything was removed. Malformed lines are dropped
    /// whenever the file is rewritten.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file cannot be read or replaced.
    pub fn remove(&self, region: Region, page: PageIndex) -> Result<bool, StoreError> {
        let target = FailureEntry::new(region, page);
        let contents = read_optional(&self.path)?;

        let mut removed = false;
        let mut kept = String::new();
        for line in contents.lines() {
            match line.trim().parse::<FailureEntry>() {
                Ok(entry) if entry == target => removed = true,
                Ok(entry) => {
                    kept.push_str(&entry.to_string());
                    kept.push('\n');
                }
                Err(_) => {}
            }
        }

        if removed {
            replace_file(&self.path, kept.as_bytes())?;
        }

        Ok(removed)
    }
}

/// Returns `true` if the file is empty or its last byte is a newline.
///
/// Logs written by other tools may lack a trailing newline; appending
/// blindly would glue two entries together.
fn ends_with_newline(file: &mut std::fs::File) -> std::io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_in(dir: &tempfile::TempDir) -> FailureLog {
        FailureLog::new(dir.path().join("failed_pages.txt"))
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = log_in(&dir);

        assert!(log.entries().unwrap().is_empty());
        assert!(!log.remove(Region::Sea, 1).unwrap());
    }

    #[test]
    fn lists_distinct_pages_ascending() {
        let dir = tempfile::tempdir().unwrap();
        let log = log_in(&dir);

        log.record(Region::Sea, 9).unwrap();
        log.record(Region::Sea, 4).unwrap();
        log.record(Region::Eu, 2).unwrap();
        log.record(Region::Sea, 9).unwrap();

        assert_eq!(log.list(Region::Sea).unwrap(), vec![4, 9]);
        assert_eq!(log.list(Region::Eu).unwrap(), vec![2]);
        assert_eq!(log.regions().unwrap(), vec![Region::Eu, Region::Sea]);
    }

    #[test]
    fn remove_drops_every_duplicate_line() {
        let dir = tempfile::tempdir().unwrap();
        let log = log_in(&dir);

        log.record(Region::Sea, 9).unwrap();
        log.record(Region::Sea, 4).unwrap();
        log.record(Region::Sea, 9).unwrap();

        assert!(log.remove(Region::Sea, 9).unwrap());
        assert_eq!(log.list(Region::Sea).unwrap(), vec![4]);
        assert_eq!(std::fs::read_to_string(log.path()).unwrap(), "sea,4\n");
    }

    #[test]
    fn remove_leaves_other_regions_alone() {
        let dir = tempfile::tempdir().unwrap();
        let log = log_in(&dir);

        log.record(Region::Sea, 3).unwrap();
        log.record(Region::Eu, 3).unwrap();

        assert!(log.remove(Region::Eu, 3).unwrap());
        assert_eq!(log.entries().unwrap(), vec![FailureEntry::new(Region::Sea, 3)]);
    }

    #[test]
    fn appends_after_a_file_without_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let log = log_in(&dir);
        std::fs::write(log.path(), "sea,5").unwrap();

        log.record(Region::Sea, 6).unwrap();

        assert_eq!(log.list(Region::Sea).unwrap(), vec![5, 6]);
    }

    #[test]
    fn skips_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let log = log_in(&dir);
        std::fs::write(log.path(), "sea,5\n17\nmars,2\n\n").unwrap();

        assert_eq!(log.entries().unwrap(), vec![FailureEntry::new(Region::Sea, 5)]);
    }
}
