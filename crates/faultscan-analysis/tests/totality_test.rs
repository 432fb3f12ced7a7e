//! Capabilities and tool-output parsers answer for any input.

use faultscan_analysis::capabilities::tool_output::parse_output;
use faultscan_analysis::capabilities::{Capability, PythonCapability};
use faultscan_core::config::ToolOutputFormat;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn python_capability_is_total(source in "\\PC{0,400}") {
        let out = PythonCapability::new().analyze(&source);
        if out.diagnostic.is_some() {
            prop_assert!(!out.detection.has_basic && !out.detection.has_advanced);
        }
    }

    #[test]
    fn python_capability_handles_keyword_soup(
        words in proptest::collection::vec(
            prop_oneof![
                Just("try:"), Just("except"), Just("retry("), Just("with"),
                Just("timeout"), Just(")"), Just("\n"), Just("    "), Just("pass"),
                Just("x.status_code"), Just(":"), Just("@backoff"),
            ],
            0..40,
        )
    ) {
        let source = words.concat();
        let _ = PythonCapability::new().analyze(&source);
    }

    #[test]
    fn output_parsers_never_panic(stdout in "\\PC{0,200}") {
        for format in [
            ToolOutputFormat::JsonFlags,
            ToolOutputFormat::FlagPair,
            ToolOutputFormat::SwiftStructure,
        ] {
            let _ = parse_output(format, &stdout);
        }
    }
}
