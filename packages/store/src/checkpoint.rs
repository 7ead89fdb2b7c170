//! Last-committed-page checkpoints.
//!
//! The checkpoint file holds one `region,page` line per region. In
//! [`RunMode::Regional`] a bare integer line is also accepted: single-region
//! scrapers historically wrote just the page number, and such a value
//! applies to every region that has no explicit line. A bare integer in a
//! global checkpoint counted pages of the combined leaderboard, so it is
//! never read as a regional page there. Either way the line is preserved
//! when the file is rewritten.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use bh_ladder_models::{PageIndex, Region, parse_region_page};

use crate::paths::RunMode;
use crate::{StoreError, read_optional, replace_file};

/// Durable `region -> last committed page` mapping.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
    mode: RunMode,
}

#[derive(Debug, Default)]
struct CheckpointFile {
    fallback: Option<PageIndex>,
    pages: BTreeMap<Region, PageIndex>,
}

impl CheckpointStore {
    /// Creates a store backed by `path` for a run in `mode`. The file is
    /// created on first save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, mode: RunMode) -> Self {
        Self {
            path: path.into(),
            mode,
        }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the last committed page for `region`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file exists but cannot be read.
    pub fn load(&self, region: Region) -> Result<Option<PageIndex>, StoreError> {
        let file = self.read()?;
        let fallback = match self.mode {
            RunMode::Regional => file.fallback,
            RunMode::Global => None,
        };
        Ok(file.pages.get(&region).copied().or(fallback))
    }

    /// Records `page` as the last committed page for `region`, overwriting
    /// the previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file cannot be read or replaced.
    pub fn save(&self, region: Region, page: PageIndex) -> Result<(), StoreError> {
        let mut file = self.read()?;
        file.pages.insert(region, page);

        let mut contents = String::new();
        if let Some(fallback) = file.fallback {
            let _ = writeln!(contents, "{fallback}");
        }
        for (region, page) in &file.pages {
            let _ = writeln!(contents, "{},{page}", region.code());
        }

        replace_file(&self.path, contents.as_bytes())
    }

    fn read(&self) -> Result<CheckpointFile, StoreError> {
        let contents = read_optional(&self.path)?;
        let mut file = CheckpointFile::default();

        for line in contents.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if let Ok((region, page)) = parse_region_page(line) {
                file.pages.insert(region, page);
            } else if let Ok(page) = line.parse::<PageIndex>() {
                file.fallback = Some(page);
            } else {
                log::warn!(
                    "Ignoring malformed checkpoint line {line:?} in {}",
                    self.path.display()
                );
            }
        }

        Ok(file)
    }
}
