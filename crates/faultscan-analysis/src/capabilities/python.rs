//! In-process Python capability built on tree-sitter.
//!
//! Basic handling is a `try` statement, an `except` clause, or a reference
//! to an HTTP status check (`status_code`, `raise_for_status`). Advanced
//! handling is a call, decorator or `with` item naming one of the resilience
//! patterns below.

use std::cell::RefCell;
use std::ops::ControlFlow;

use tree_sitter::{Node, Parser, Tree};

use faultscan_core::errors::AnalyzerError;
use faultscan_core::Language;

use super::tree_inspect::{count_errors, node_text, walk};
use super::{Capability, CapabilityOutput, Detection};

/// Attribute names that count as an explicit status check.
/// Compared case-insensitively.
const STATUS_CHECK_NAMES: &[&str] = &["status_code", "raise_for_status"];

/// Resilience pattern names, compared case-insensitively.
const RESILIENCE_NAMES: &[&str] = &["timeout", "retry", "circuitbreaker", "backoff"];

thread_local! {
    static PARSER: RefCell<Option<Parser>> = const { RefCell::new(None) };
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PythonCapability;

impl PythonCapability {
    pub fn new() -> Self {
        Self
    }

    fn parse(source: &str) -> Result<Tree, String> {
        PARSER.with(|cell| {
            let mut slot = cell.borrow_mut();
            if slot.is_none() {
                let mut parser = Parser::new();
                parser
                    .set_language(&tree_sitter_python::LANGUAGE.into())
                    .map_err(|e| format!("grammar rejected: {e}"))?;
                *slot = Some(parser);
            }
            let parser = slot
                .as_mut()
                .ok_or_else(|| "parser unavailable".to_string())?;
            parser
                .parse(source, None)
                .ok_or_else(|| "parser produced no tree".to_string())
        })
    }
}

impl Capability for PythonCapability {
    fn language(&self) -> Language {
        Language::Python
    }

    fn analyze(&self, source: &str) -> CapabilityOutput {
        let tree = match Self::parse(source) {
            Ok(tree) => tree,
            Err(message) => {
                return CapabilityOutput::no_signal(AnalyzerError::Syntax {
                    language: Language::Python,
                    message,
                })
            }
        };

        let root = tree.root_node();
        if root.has_error() {
            let (count, first_line) = count_errors(root);
            let message = match first_line {
                Some(line) => format!("{count} syntax error(s), first at line {line}"),
                None => format!("{count} syntax error(s)"),
            };
            return CapabilityOutput::no_signal(AnalyzerError::Syntax {
                language: Language::Python,
                message,
            });
        }

        CapabilityOutput::signal(detect(root, source.as_bytes()))
    }
}

fn detect(root: Node, source: &[u8]) -> Detection {
    let mut detection = Detection::default();
    walk(root, |node| {
        inspect(node, source, &mut detection);
        if detection.is_complete() {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    });
    detection
}

fn inspect(node: Node, source: &[u8], detection: &mut Detection) {
    match node.kind() {
        "try_statement" | "except_clause" | "except_group_clause" => {
            detection.has_basic = true;
        }
        "attribute" => {
            if let Some(name) = node.child_by_field_name("attribute") {
                let name = node_text(name, source);
                if STATUS_CHECK_NAMES.iter().any(|s| s.eq_ignore_ascii_case(name)) {
                    detection.has_basic = true;
                }
            }
        }
        "call" => {
            if let Some(callee) = node.child_by_field_name("function") {
                if names_resilience_pattern(callee, source) {
                    detection.has_advanced = true;
                }
            }
        }
        "decorator" => {
            if let Some(expr) = node.named_child(0) {
                if names_resilience_pattern(expr, source) {
                    detection.has_advanced = true;
                }
            }
        }
        "with_item" => {
            if let Some(value) = node.child_by_field_name("value") {
                let target = if value.kind() == "as_pattern" {
                    value.named_child(0).unwrap_or(value)
                } else {
                    value
                };
                let target = if target.kind() == "call" {
                    target.child_by_field_name("function").unwrap_or(target)
                } else {
                    target
                };
                if names_resilience_pattern(target, source) {
                    detection.has_advanced = true;
                }
            }
        }
        _ => {}
    }
}

/// `retry`, `Retry`, `tenacity.retry` all qualify; the last name segment is
/// what gets compared.
fn names_resilience_pattern(node: Node, source: &[u8]) -> bool {
    let name = match node.kind() {
        "identifier" => node_text(node, source),
        "attribute" => node
            .child_by_field_name("attribute")
            .map(|n| node_text(n, source))
            .unwrap_or(""),
        _ => return false,
    };
    RESILIENCE_NAMES
        .iter()
        .any(|pattern| name.eq_ignore_ascii_case(pattern))
}
