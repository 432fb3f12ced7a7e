//! Repository identity and the per-file / per-repository result records.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64;

use super::{Language, Verdict};

/// A repository to mine. Identity is the url; the local name is derived
/// from it and used as the working-tree directory name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryRef {
    url: String,
    local_name: String,
}

impl RepositoryRef {
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let local_name = derive_local_name(&url);
        Self { url, local_name }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// `<last segment without .git>-<8 hex digits of xxh3(url)>`.
///
/// The hash suffix keeps `org-a/tool` and `org-b/tool` apart when both land
/// in the same staging directory during one batch.
fn derive_local_name(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    let segment = trimmed
        .rsplit(|c| c == '/' || c == ':')
        .next()
        .unwrap_or_default();
    let segment = segment.strip_suffix(".git").unwrap_or(segment);
    let mut name: String = segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if name.is_empty() || name.chars().all(|c| c == '.') {
        name = "repo".to_string();
    }
    format!("{name}-{:08x}", xxh3_64(url.as_bytes()) as u32)
}

/// Verdict for one analyzed file. Transient: folded into the repository
/// result and never persisted on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileResult {
    pub path: PathBuf,
    pub language: Language,
    pub verdict: Verdict,
}

/// Final, immutable classification of one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryResult {
    url: String,
    verdict: Verdict,
    recommendation: String,
    languages: Vec<Language>,
}

impl RepositoryResult {
    /// Languages are sorted and deduplicated; the recommendation is derived
    /// from the verdict.
    pub fn new(
        url: impl Into<String>,
        verdict: Verdict,
        languages: impl IntoIterator<Item = Language>,
    ) -> Self {
        let languages: BTreeSet<Language> = languages.into_iter().collect();
        Self {
            url: url.into(),
            verdict,
            recommendation: verdict.recommendation().to_string(),
            languages: languages.into_iter().collect(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    pub fn recommendation(&self) -> &str {
        &self.recommendation
    }

    pub fn languages(&self) -> &[Language] {
        &self.languages
    }

    /// Languages as written to the output table: `"go; python"`.
    pub fn languages_joined(&self) -> String {
        self.languages
            .iter()
            .map(Language::tag)
            .collect::<Vec<_>>()
            .join("; ")
    }
}
