//! Language detection from file extension.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Languages the classifier knows how to dispatch.
///
/// Variant order is the alphabetical order of the tags, so a
/// `BTreeSet<Language>` iterates in the order the output table lists them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    CSharp,
    Go,
    Java,
    JavaScript,
    Kotlin,
    Php,
    Python,
    Ruby,
    Swift,
    TypeScript,
}

impl Language {
    pub const ALL: [Language; 10] = [
        Language::CSharp,
        Language::Go,
        Language::Java,
        Language::JavaScript,
        Language::Kotlin,
        Language::Php,
        Language::Python,
        Language::Ruby,
        Language::Swift,
        Language::TypeScript,
    ];

    /// Detect language from a file extension string.
    pub fn from_extension(ext: Option<&str>) -> Option<Language> {
        match ext? {
            "cs" => Some(Language::CSharp),
            "go" => Some(Language::Go),
            "java" => Some(Language::Java),
            "js" | "jsx" | "mjs" | "cjs" => Some(Language::JavaScript),
            "kt" | "kts" => Some(Language::Kotlin),
            "php" => Some(Language::Php),
            "py" | "pyi" => Some(Language::Python),
            "rb" => Some(Language::Ruby),
            "swift" => Some(Language::Swift),
            "ts" | "tsx" | "mts" | "cts" => Some(Language::TypeScript),
            _ => None,
        }
    }

    /// Detect language from a path's suffix. Unknown suffixes yield `None`.
    pub fn from_path(path: &Path) -> Option<Language> {
        Language::from_extension(path.extension().and_then(|e| e.to_str()))
    }

    /// Parse a lowercase tag as used in config keys and the output table.
    pub fn from_tag(tag: &str) -> Option<Language> {
        Language::ALL.into_iter().find(|l| l.tag() == tag)
    }

    /// Returns all file extensions associated with this language.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Language::CSharp => &["cs"],
            Language::Go => &["go"],
            Language::Java => &["java"],
            Language::JavaScript => &["js", "jsx", "mjs", "cjs"],
            Language::Kotlin => &["kt", "kts"],
            Language::Php => &["php"],
            Language::Python => &["py", "pyi"],
            Language::Ruby => &["rb"],
            Language::Swift => &["swift"],
            Language::TypeScript => &["ts", "tsx", "mts", "cts"],
        }
    }

    /// Stable lowercase tag.
    pub fn tag(&self) -> &'static str {
        match self {
            Language::CSharp => "csharp",
            Language::Go => "go",
            Language::Java => "java",
            Language::JavaScript => "javascript",
            Language::Kotlin => "kotlin",
            Language::Php => "php",
            Language::Python => "python",
            Language::Ruby => "ruby",
            Language::Swift => "swift",
            Language::TypeScript => "typescript",
        }
    }

    /// Suffix used for temporary files handed to delegated analyzers.
    pub fn primary_extension(&self) -> &'static str {
        self.extensions()[0]
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_language() {
        assert_eq!(Language::from_path(Path::new("a/b.py")), Some(Language::Python));
        assert_eq!(Language::from_path(Path::new("Main.java")), Some(Language::Java));
        assert_eq!(Language::from_path(Path::new("x.tsx")), Some(Language::TypeScript));
        assert_eq!(Language::from_path(Path::new("lib.rs")), None);
        assert_eq!(Language::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn every_extension_maps_back() {
        for lang in Language::ALL {
            for ext in lang.extensions() {
                assert_eq!(Language::from_extension(Some(ext)), Some(lang));
            }
            assert_eq!(Language::from_tag(lang.tag()), Some(lang));
        }
    }

    #[test]
    fn tags_sort_alphabetically() {
        let mut tags: Vec<_> = Language::ALL.iter().map(|l| l.tag()).collect();
        let declared = tags.clone();
        tags.sort_unstable();
        assert_eq!(tags, declared);
    }

    #[test]
    fn serde_uses_tags() {
        let json = serde_json::to_string(&Language::CSharp).unwrap();
        assert_eq!(json, "\"csharp\"");
    }
}
