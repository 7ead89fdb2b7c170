//! Rating-ordered copies of ratings CSVs.
//!
//! A single file is written next to itself as `<stem>_sorted.csv`; a
//! directory of CSVs is written into a sibling `Sorted-<dir>/` folder.
//! With `in_place` the originals are overwritten instead.

use std::path::{Path, PathBuf};

use bh_ladder_store::csv_writer::{read_records, write_all};
use bh_ladder_store::paths::ensure_dir;

use crate::AnalysisError;

/// Direction of the rating sort.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Highest rating first.
    #[default]
    Descending,
    /// Lowest rating first.
    Ascending,
}

/// Sorts the rows of `input` by rating and writes them to `output`.
///
/// The sort is stable: rows with equal ratings keep their file order.
/// Returns `false` without writing anything if `input` has no rows.
///
/// # Errors
///
/// Returns [`AnalysisError::Store`] if either file cannot be read or
/// written.
pub fn sort_file(input: &Path, output: &Path, order: SortOrder) -> Result<bool, AnalysisError> {
    let mut records = read_records(input)?;
    if records.is_empty() {
        log::info!("Skipping {}: empty file", input.display());
        return Ok(false);
    }

    match order {
        SortOrder::Descending => records.sort_by(|a, b| b.rating.cmp(&a.rating)),
        SortOrder::Ascending => records.sort_by_key(|r| r.rating),
    }

    write_all(output, &records)?;
    log::info!("Saved {}", output.display());
    Ok(true)
}

/// Sorts a single `.csv` file or every `.csv` file in a directory.
///
/// Returns the paths written, in file name order.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidPath`] if `path` is neither,
/// [`AnalysisError::NoCsvFiles`] for a directory without CSVs, or
/// [`AnalysisError::Store`] if any file cannot be processed.
pub fn sort_path(
    path: &Path,
    order: SortOrder,
    in_place: bool,
) -> Result<Vec<PathBuf>, AnalysisError> {
    if path.is_file() && is_csv(path) {
        let output = if in_place {
            path.to_path_buf()
        } else {
            sorted_sibling(path)
        };
        let written = sort_file(path, &output, order)?;
        return Ok(if written { vec![output] } else { Vec::new() });
    }

    if !path.is_dir() {
        return Err(AnalysisError::InvalidPath {
            path: path.to_path_buf(),
        });
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(path)
        .map_err(|e| bh_ladder_store::StoreError::Io {
            path: path.to_path_buf(),
            source: e,
        })?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && is_csv(p))
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(AnalysisError::NoCsvFiles {
            path: path.to_path_buf(),
        });
    }

    let out_dir = if in_place {
        path.to_path_buf()
    } else {
        let dir = sorted_dir(path);
        ensure_dir(&dir)?;
        dir
    };

    let mut written = Vec::with_capacity(files.len());
    for file in files {
        let Some(name) = file.file_name() else {
            continue;
        };
        let output = out_dir.join(name);
        if sort_file(&file, &output, order)? {
            written.push(output);
        }
    }

    Ok(written)
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

/// `<dir>/<stem>_sorted.csv` for `<dir>/<stem>.csv`.
fn sorted_sibling(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map_or_else(String::new, |s| s.to_string_lossy().into_owned());
    path.with_file_name(format!("{stem}_sorted.csv"))
}

/// `<parent>/Sorted-<name>` for `<parent>/<name>`.
fn sorted_dir(dir: &Path) -> PathBuf {
    let name = dir
        .file_name()
        .map_or_else(|| "data".to_string(), |n| n.to_string_lossy().into_owned());
    dir.with_file_name(format!("Sorted-{name}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNSORTED: &str =
        "rank,player,rating,region\n1,a,1500,sea\n2,b,2100,sea\n3,c,1500,sea\n4,d,900,sea\n";

    fn players(path: &Path) -> Vec<String> {
        read_records(path)
            .unwrap()
            .into_iter()
            .map(|r| r.player)
            .collect()
    }

    #[test]
    fn single_file_goes_to_sorted_sibling_highest_first() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("peak_ratings_sea.csv");
        std::fs::write(&input, UNSORTED).unwrap();

        let written = sort_path(&input, SortOrder::Descending, false).unwrap();

        let expected = dir.path().join("peak_ratings_sea_sorted.csv");
        assert_eq!(written, vec![expected.clone()]);
        assert_eq!(players(&expected), vec!["b", "a", "c", "d"]);
        assert_eq!(std::fs::read_to_string(&input).unwrap(), UNSORTED);
    }

    #[test]
    fn ascending_in_place_overwrites_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("season_ratings_eu.csv");
        std::fs::write(&input, UNSORTED).unwrap();

        sort_path(&input, SortOrder::Ascending, true).unwrap();

        assert_eq!(players(&input), vec!["d", "a", "c", "b"]);
    }

    #[test]
    fn directory_goes_to_sorted_folder_and_skips_empty_files() {
        let root = tempfile::tempdir().unwrap();
        let data = root.path().join("Data-22Jun");
        std::fs::create_dir(&data).unwrap();
        std::fs::write(data.join("peak_ratings_sea.csv"), UNSORTED).unwrap();
        std::fs::write(data.join("season_ratings_sea.csv"), "rank,player,rating,region\n").unwrap();
        std::fs::write(data.join("last_page.txt"), "sea,4\n").unwrap();

        let written = sort_path(&data, SortOrder::Descending, false).unwrap();

        let out = root.path().join("Sorted-Data-22Jun");
        assert_eq!(written, vec![out.join("peak_ratings_sea.csv")]);
        assert!(!out.join("season_ratings_sea.csv").exists());
        assert!(!out.join("last_page.txt").exists());
    }

    #[test]
    fn rejects_paths_that_are_not_csv_or_directory() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("notes.txt");
        std::fs::write(&txt, "x").unwrap();

        assert!(matches!(
            sort_path(&txt, SortOrder::Descending, false),
            Err(AnalysisError::InvalidPath { .. })
        ));
        assert!(matches!(
            sort_path(dir.path(), SortOrder::Descending, false),
            Err(AnalysisError::NoCsvFiles { .. })
        ));
    }
}
