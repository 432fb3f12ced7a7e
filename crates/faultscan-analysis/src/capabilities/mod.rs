//! Analyzer capability set: the per-language contract and its implementations.

pub mod delegated;
pub mod python;
pub mod registry;
pub mod tool_output;
pub mod tree_inspect;

use faultscan_core::errors::AnalyzerError;
use faultscan_core::{Language, Verdict};

pub use delegated::ToolCapability;
pub use python::PythonCapability;
pub use registry::CapabilityRegistry;

/// The two flags every capability reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Detection {
    pub has_basic: bool,
    pub has_advanced: bool,
}

impl Detection {
    pub fn new(has_basic: bool, has_advanced: bool) -> Self {
        Self {
            has_basic,
            has_advanced,
        }
    }

    pub fn verdict(&self) -> Verdict {
        Verdict::from_flags(self.has_basic, self.has_advanced)
    }

    pub fn is_complete(&self) -> bool {
        self.has_basic && self.has_advanced
    }
}

/// What a capability hands back: always a detection, sometimes with a
/// diagnostic explaining why it is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityOutput {
    pub detection: Detection,
    pub diagnostic: Option<AnalyzerError>,
}

impl CapabilityOutput {
    pub fn signal(detection: Detection) -> Self {
        Self {
            detection,
            diagnostic: None,
        }
    }

    /// `(false, false)` plus the reason.
    pub fn no_signal(diagnostic: AnalyzerError) -> Self {
        Self {
            detection: Detection::default(),
            diagnostic: Some(diagnostic),
        }
    }

    pub fn verdict(&self) -> Verdict {
        self.detection.verdict()
    }
}

/// Trait that every language capability must implement.
///
/// `analyze` is total: invalid syntax, tool crashes and timeouts all come
/// back as a no-signal output with a diagnostic, never as a panic or error.
pub trait Capability: Send + Sync {
    /// The language this capability handles.
    fn language(&self) -> Language;

    /// Classify one source text.
    fn analyze(&self, source: &str) -> CapabilityOutput;

    /// Whether this capability can produce signal in the current process.
    fn is_ready(&self) -> bool {
        true
    }
}
