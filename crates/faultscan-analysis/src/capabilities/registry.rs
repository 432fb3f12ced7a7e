//! Static language → capability table, built once per run.

use std::collections::BTreeMap;
use std::time::Duration;

use faultscan_core::config::AnalyzersConfig;
use faultscan_core::Language;

use super::{Capability, PythonCapability, ToolCapability};

#[derive(Default)]
pub struct CapabilityRegistry {
    capabilities: BTreeMap<Language, Box<dyn Capability>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// In-process Python plus every configured delegated tool.
    pub fn from_config(config: &AnalyzersConfig) -> Self {
        let default_timeout = config.effective_tool_timeout();
        let mut registry = Self::new().with(PythonCapability::new());

        for (tag, tool) in config.effective_tools() {
            let Some(language) = Language::from_tag(&tag) else {
                tracing::warn!(tag = %tag, "ignoring analyzer for unknown language");
                continue;
            };
            let timeout = Duration::from_secs(tool.timeout.unwrap_or(default_timeout));
            registry.register(Box::new(ToolCapability::new(language, tool, timeout)));
        }
        registry
    }

    pub fn with<C: Capability + 'static>(mut self, capability: C) -> Self {
        self.register(Box::new(capability));
        self
    }

    /// A language has one capability; a later registration replaces the earlier one.
    pub fn register(&mut self, capability: Box<dyn Capability>) {
        let language = capability.language();
        if self.capabilities.insert(language, capability).is_some() {
            tracing::debug!(%language, "capability replaced");
        }
    }

    /// The capability for `language`, if one is registered and ready.
    pub fn get(&self, language: Language) -> Option<&dyn Capability> {
        self.capabilities
            .get(&language)
            .map(|c| c.as_ref())
            .filter(|c| c.is_ready())
    }

    pub fn languages(&self) -> impl Iterator<Item = Language> + '_ {
        self.capabilities.keys().copied()
    }

    /// Languages whose capability can produce signal in this process.
    pub fn ready_languages(&self) -> Vec<Language> {
        self.capabilities
            .iter()
            .filter(|(_, c)| c.is_ready())
            .map(|(l, _)| *l)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}

impl std::fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("languages", &self.capabilities.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::{CapabilityOutput, Detection};
    use faultscan_core::config::{ToolConfig, ToolOutputFormat};

    struct Fixed(Language, bool);

    impl Capability for Fixed {
        fn language(&self) -> Language {
            self.0
        }
        fn analyze(&self, _source: &str) -> CapabilityOutput {
            CapabilityOutput::signal(Detection::new(true, false))
        }
        fn is_ready(&self) -> bool {
            self.1
        }
    }

    #[test]
    fn unready_capabilities_are_hidden() {
        let registry = CapabilityRegistry::new()
            .with(Fixed(Language::Go, true))
            .with(Fixed(Language::Ruby, false));
        assert!(registry.get(Language::Go).is_some());
        assert!(registry.get(Language::Ruby).is_none());
        assert!(registry.get(Language::Swift).is_none());
        assert_eq!(registry.ready_languages(), vec![Language::Go]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn later_registration_wins() {
        let registry = CapabilityRegistry::new()
            .with(Fixed(Language::Go, false))
            .with(Fixed(Language::Go, true));
        assert_eq!(registry.len(), 1);
        assert!(registry.get(Language::Go).is_some());
    }

    #[test]
    fn from_config_covers_every_language() {
        let registry = CapabilityRegistry::from_config(&AnalyzersConfig::default());
        let languages: Vec<_> = registry.languages().collect();
        assert_eq!(languages, Language::ALL.to_vec());
        assert!(registry.get(Language::Python).is_some());
    }

    #[test]
    fn unknown_tags_are_ignored() {
        let mut config = AnalyzersConfig::default();
        config.tools.insert(
            "cobol".to_string(),
            ToolConfig {
                program: "cobc".to_string(),
                args: Vec::new(),
                requires: Vec::new(),
                output: ToolOutputFormat::FlagPair,
                timeout: None,
                enabled: None,
            },
        );
        let registry = CapabilityRegistry::from_config(&config);
        assert_eq!(registry.len(), Language::ALL.len());
    }
}
