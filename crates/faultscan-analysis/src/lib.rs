//! Analyzer capabilities and the file classifier.
//!
//! A capability turns source text of one language into two detection flags.
//! The classifier walks a working tree, dispatches each file to the
//! capability registered for its language and folds the per-file verdicts
//! into one repository verdict.

pub mod capabilities;
pub mod classifier;

pub use capabilities::{Capability, CapabilityOutput, CapabilityRegistry, Detection};
pub use classifier::{Classification, ClassifierSettings, FileClassifier};
