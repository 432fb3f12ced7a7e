//! Input table reader.

use std::path::Path;

use rustc_hash::FxHashSet;

use faultscan_core::errors::StorageError;
use faultscan_core::RepositoryRef;

pub const URL_COLUMN: &str = "repo_url";

/// Read repository urls from the `repo_url` column. Blank cells are skipped
/// and repeated urls keep their first position.
pub fn read_input(path: &Path) -> Result<Vec<RepositoryRef>, StorageError> {
    let unreadable = |message: String| StorageError::InputUnreadable {
        path: path.to_path_buf(),
        message,
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| unreadable(e.to_string()))?;

    let headers = reader.headers().map_err(|e| unreadable(e.to_string()))?;
    let column = headers
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}') == URL_COLUMN)
        .ok_or_else(|| StorageError::MissingColumn {
            path: path.to_path_buf(),
            column: URL_COLUMN.to_string(),
        })?;

    let mut seen = FxHashSet::default();
    let mut repositories = Vec::new();
    let mut blank = 0usize;
    for record in reader.records() {
        let record = record.map_err(|e| unreadable(e.to_string()))?;
        let url = record.get(column).unwrap_or("");
        if url.is_empty() {
            blank += 1;
            continue;
        }
        if seen.insert(url.to_string()) {
            repositories.push(RepositoryRef::new(url));
        }
    }

    tracing::info!(
        path = %path.display(),
        repositories = repositories.len(),
        blank,
        "input table read"
    );
    Ok(repositories)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_dedupes_and_skips_blanks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.csv");
        std::fs::write(
            &path,
            "name,repo_url\na,https://h/a\nb,\nc, https://h/c \nd,https://h/a\ne\n",
        )
        .unwrap();
        let repos = read_input(&path).unwrap();
        let urls: Vec<_> = repos.iter().map(|r| r.url()).collect();
        assert_eq!(urls, vec!["https://h/a", "https://h/c"]);
    }

    #[test]
    fn missing_column_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.csv");
        std::fs::write(&path, "url\nhttps://h/a\n").unwrap();
        let err = read_input(&path).unwrap_err();
        assert!(matches!(err, StorageError::MissingColumn { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn missing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_input(&dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, StorageError::InputUnreadable { .. }));
    }
}
