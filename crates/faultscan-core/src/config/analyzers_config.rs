//! Delegated analyzer configuration.
//!
//! Each delegated language maps to an external program that receives one
//! source-file path as its final argument and prints two detection flags.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Shape of a delegated analyzer's stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolOutputFormat {
    /// `{"hasBasicHandling": bool, "hasAdvancedHandling": bool}`.
    JsonFlags,
    /// `true,false` on the last non-empty line.
    FlagPair,
    /// SourceKitten `structure` JSON, walked for Swift markers.
    SwiftStructure,
}

/// One delegated analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Artifacts (scripts, jars) that must exist for the tool to be usable.
    #[serde(default)]
    pub requires: Vec<PathBuf>,
    pub output: ToolOutputFormat,
    /// Per-tool override of `analyzers.tool_timeout`, in seconds.
    #[serde(default)]
    pub timeout: Option<u64>,
    /// Set to false to turn a language off without deleting its entry.
    #[serde(default)]
    pub enabled: Option<bool>,
}

impl ToolConfig {
    fn new(program: &str, args: &[&str], requires: &[&str], output: ToolOutputFormat) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            requires: requires.iter().map(PathBuf::from).collect(),
            output,
            timeout: None,
            enabled: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AnalyzersConfig {
    /// Execution timeout for delegated analyzers, in seconds. Default: 30.
    pub tool_timeout: Option<u64>,
    /// Tools keyed by language tag. Entries override the built-in table.
    pub tools: BTreeMap<String, ToolConfig>,
}

impl AnalyzersConfig {
    pub fn effective_tool_timeout(&self) -> u64 {
        self.tool_timeout.unwrap_or(30)
    }

    /// Built-in table overlaid with configured entries.
    pub fn effective_tools(&self) -> BTreeMap<String, ToolConfig> {
        let mut tools = default_tools();
        for (tag, tool) in &self.tools {
            tools.insert(tag.clone(), tool.clone());
        }
        tools
    }
}

/// Tools the miner ships wrappers for.
pub fn default_tools() -> BTreeMap<String, ToolConfig> {
    use ToolOutputFormat::*;

    let mut tools = BTreeMap::new();
    tools.insert(
        "csharp".to_string(),
        ToolConfig::new(
            "dotnet",
            &["CSharpParser/bin/Release/net8.0/CSharpParser.dll"],
            &["CSharpParser/bin/Release/net8.0/CSharpParser.dll"],
            FlagPair,
        ),
    );
    tools.insert(
        "go".to_string(),
        ToolConfig::new("./parse_go_code/parse_go_code", &[], &[], FlagPair),
    );
    tools.insert(
        "java".to_string(),
        ToolConfig::new(
            "java",
            &["-jar", "tools/java-analyzer.jar"],
            &["tools/java-analyzer.jar"],
            JsonFlags,
        ),
    );
    tools.insert(
        "javascript".to_string(),
        ToolConfig::new("node", &["parse_javascript.js"], &["parse_javascript.js"], JsonFlags),
    );
    tools.insert(
        "kotlin".to_string(),
        ToolConfig::new("java", &["-jar", "parse_kotlin.jar"], &["parse_kotlin.jar"], FlagPair),
    );
    tools.insert(
        "php".to_string(),
        ToolConfig::new("node", &["parse_php.js"], &["parse_php.js"], JsonFlags),
    );
    tools.insert(
        "ruby".to_string(),
        ToolConfig::new("ruby", &["parse_ruby.rb"], &["parse_ruby.rb"], FlagPair),
    );
    tools.insert(
        "swift".to_string(),
        ToolConfig::new("sourcekitten", &["structure", "--file"], &[], SwiftStructure),
    );
    tools.insert(
        "typescript".to_string(),
        ToolConfig::new("node", &["parse_typescript.js"], &["parse_typescript.js"], JsonFlags),
    );
    tools
}
