//! File classifier: walk a working tree, dispatch files by language, and
//! fold per-file verdicts into one repository verdict.

pub mod decode;
pub mod walker;

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use faultscan_core::config::ScanConfig;
use faultscan_core::errors::{ClassifyError, ErrorCode};
use faultscan_core::{FileResult, Language, Verdict};

use crate::capabilities::CapabilityRegistry;

pub use decode::SourceEncoding;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifierSettings {
    pub max_file_size: u64,
    pub skip_binary: bool,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self::from(&ScanConfig::default())
    }
}

impl From<&ScanConfig> for ClassifierSettings {
    fn from(config: &ScanConfig) -> Self {
        Self {
            max_file_size: config.effective_max_file_size(),
            skip_binary: config.effective_skip_binary(),
        }
    }
}

/// Per-repository scan statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifyStats {
    pub entries: usize,
    pub files_analyzed: usize,
    pub skipped_undecodable: usize,
    pub skipped_too_large: usize,
    pub skipped_binary: usize,
    pub skipped_unreadable: usize,
    /// Files of a supported language whose capability is missing or not ready.
    pub skipped_no_capability: usize,
    pub diagnostics: usize,
    pub by_language: FxHashMap<Language, usize>,
    pub duration: Duration,
}

impl ClassifyStats {
    pub fn files_skipped(&self) -> usize {
        self.skipped_undecodable
            + self.skipped_too_large
            + self.skipped_binary
            + self.skipped_unreadable
            + self.skipped_no_capability
    }
}

#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub verdict: Verdict,
    /// Files that contributed signal.
    pub exception_files: BTreeSet<PathBuf>,
    /// Languages that contributed signal.
    pub languages: BTreeSet<Language>,
    pub stats: ClassifyStats,
}

impl Classification {
    /// Join one file's verdict into the running result.
    pub fn fold(&mut self, file: FileResult) {
        self.verdict |= file.verdict;
        if file.verdict.is_signal() {
            self.languages.insert(file.language);
            self.exception_files.insert(file.path);
        }
    }
}

/// Why a candidate file was not analyzed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Skip {
    TooLarge,
    Binary,
    Undecodable,
    Unreadable,
}

pub struct FileClassifier {
    registry: Arc<CapabilityRegistry>,
    settings: ClassifierSettings,
}

impl FileClassifier {
    pub fn new(registry: Arc<CapabilityRegistry>, settings: ClassifierSettings) -> Self {
        Self { registry, settings }
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// Classify the tree rooted at `root`.
    ///
    /// An empty tree and a tree with nothing to analyze are errors, so they
    /// can never pass as a `None` verdict.
    pub fn classify(&self, root: &Path) -> Result<Classification, ClassifyError> {
        let start = Instant::now();
        let listing = walker::list_tree(root)?;
        if listing.entries == 0 {
            return Err(ClassifyError::EmptyTree {
                root: root.to_path_buf(),
            });
        }

        let mut classification = Classification::default();
        classification.stats.entries = listing.entries;

        for (path, language) in listing.candidates {
            let Some(capability) = self.registry.get(language) else {
                classification.stats.skipped_no_capability += 1;
                continue;
            };

            let source = match self.read_source(&path) {
                Ok(source) => source,
                Err(skip) => {
                    let stats = &mut classification.stats;
                    match skip {
                        Skip::TooLarge => stats.skipped_too_large += 1,
                        Skip::Binary => stats.skipped_binary += 1,
                        Skip::Undecodable => stats.skipped_undecodable += 1,
                        Skip::Unreadable => stats.skipped_unreadable += 1,
                    }
                    tracing::debug!(path = %path.display(), %language, reason = ?skip, "file skipped");
                    continue;
                }
            };

            let output = capability.analyze(&source);
            if let Some(diagnostic) = &output.diagnostic {
                classification.stats.diagnostics += 1;
                tracing::warn!(
                    path = %path.display(),
                    %language,
                    code = diagnostic.error_code(),
                    "{diagnostic}"
                );
            }

            classification.stats.files_analyzed += 1;
            *classification.stats.by_language.entry(language).or_insert(0) += 1;
            classification.fold(FileResult {
                path,
                language,
                verdict: output.verdict(),
            });
        }

        classification.stats.duration = start.elapsed();
        if classification.stats.files_analyzed == 0 {
            return Err(ClassifyError::NoEligibleFiles {
                root: root.to_path_buf(),
                entries: listing.entries,
            });
        }

        let stats = &classification.stats;
        tracing::debug!(
            root = %root.display(),
            verdict = %classification.verdict,
            analyzed = stats.files_analyzed,
            skipped = stats.files_skipped(),
            diagnostics = stats.diagnostics,
            duration_ms = stats.duration.as_millis() as u64,
            "tree classified"
        );
        Ok(classification)
    }

    fn read_source(&self, path: &Path) -> Result<String, Skip> {
        let size = fs::metadata(path).map_err(|_| Skip::Unreadable)?.len();
        if size > self.settings.max_file_size {
            return Err(Skip::TooLarge);
        }
        let bytes = fs::read(path).map_err(|_| Skip::Unreadable)?;
        if self.settings.skip_binary && decode::looks_binary(&bytes) {
            return Err(Skip::Binary);
        }
        decode::decode(&bytes)
            .map(|(text, _)| text)
            .ok_or(Skip::Undecodable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::PythonCapability;

    fn classifier(settings: ClassifierSettings) -> FileClassifier {
        let registry = CapabilityRegistry::new().with(PythonCapability::new());
        FileClassifier::new(Arc::new(registry), settings)
    }

    #[test]
    fn fold_is_monotone() {
        let mut c = Classification::default();
        c.fold(FileResult {
            path: "a.py".into(),
            language: Language::Python,
            verdict: Verdict::Advanced,
        });
        c.fold(FileResult {
            path: "b.py".into(),
            language: Language::Python,
            verdict: Verdict::None,
        });
        assert_eq!(c.verdict, Verdict::Advanced);
        assert_eq!(c.exception_files.len(), 1);
    }

    #[test]
    fn oversized_and_binary_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("big.py"), "try:\n    pass\nexcept:\n    pass\n").unwrap();
        fs::write(dir.path().join("blob.py"), b"try:\x00\x00").unwrap();
        fs::write(dir.path().join("ok.py"), "x = 1\n").unwrap();

        let settings = ClassifierSettings {
            max_file_size: 10,
            skip_binary: true,
        };
        let result = classifier(settings).classify(dir.path()).unwrap();
        assert_eq!(result.verdict, Verdict::None);
        assert_eq!(result.stats.files_analyzed, 1);
        assert_eq!(result.stats.skipped_too_large, 1);
        assert_eq!(result.stats.skipped_binary, 1);
    }

    #[test]
    fn languages_without_capability_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("main.go"), "package main").unwrap();
        let err = classifier(ClassifierSettings::default())
            .classify(dir.path())
            .unwrap_err();
        assert!(matches!(err, ClassifyError::NoEligibleFiles { entries: 1, .. }));
    }
}
