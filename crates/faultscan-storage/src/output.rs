//! Append-only output table.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use faultscan_core::errors::StorageError;
use faultscan_core::RepositoryResult;

pub const OUTPUT_HEADER: [&str; 4] = ["repo_url", "Exception Type", "Recommendation", "Languages"];

pub struct OutputTable {
    path: PathBuf,
    writer: csv::Writer<File>,
    rows: usize,
}

impl OutputTable {
    /// Truncate `path` and write the header. Failure here is fatal to the run.
    pub fn create(path: &Path) -> Result<Self, StorageError> {
        let init_error = |message: String| StorageError::OutputInit {
            path: path.to_path_buf(),
            message,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| init_error(e.to_string()))?;
        }
        let file = File::create(path).map_err(|e| init_error(e.to_string()))?;
        let mut writer = csv::Writer::from_writer(file);
        writer
            .write_record(OUTPUT_HEADER)
            .map_err(|e| init_error(e.to_string()))?;
        writer.flush().map_err(|e| init_error(e.to_string()))?;

        Ok(Self {
            path: path.to_path_buf(),
            writer,
            rows: 0,
        })
    }

    /// Append rows and flush so the table can be inspected mid-run.
    pub fn append<'a, I>(&mut self, results: I) -> Result<usize, StorageError>
    where
        I: IntoIterator<Item = &'a RepositoryResult>,
    {
        let mut appended = 0;
        for result in results {
            let languages = result.languages_joined();
            self.writer
                .write_record([
                    result.url(),
                    result.verdict().name(),
                    result.recommendation(),
                    languages.as_str(),
                ])
                .map_err(|e| self.write_error(e.to_string()))?;
            appended += 1;
        }
        self.writer
            .flush()
            .map_err(|e| self.write_error(e.to_string()))?;
        self.rows += appended;
        Ok(appended)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows appended since the header was written.
    pub fn rows(&self) -> usize {
        self.rows
    }

    fn write_error(&self, message: String) -> StorageError {
        StorageError::OutputWrite {
            path: self.path.clone(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faultscan_core::{Language, Verdict};

    #[test]
    fn header_then_appended_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/results.csv");
        let mut table = OutputTable::create(&path).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "repo_url,Exception Type,Recommendation,Languages\n"
        );

        let a = RepositoryResult::new("https://h/a", Verdict::Both, [Language::Python, Language::Go]);
        let b = RepositoryResult::new("https://h/b", Verdict::None, Vec::<Language>::new());
        assert_eq!(table.append([&a]).unwrap(), 1);
        assert_eq!(table.append([&b]).unwrap(), 1);
        assert_eq!(table.rows(), 2);

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            "https://h/a,Both,The codebase has basic and advanced exception handling.,go; python"
        );
        assert!(lines[2].starts_with("https://h/b,None,No exception handling detected."));
        assert!(lines[2].ends_with(','));
    }

    #[test]
    fn create_truncates_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        std::fs::write(&path, "stale\nrows\n").unwrap();
        OutputTable::create(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 1);
    }

    #[test]
    fn uncreatable_output_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let err = OutputTable::create(&blocker.join("results.csv")).err().unwrap();
        assert!(err.is_fatal());
    }
}
