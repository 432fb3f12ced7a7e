//! Parsers for delegated analyzer stdout.

use serde::Deserialize;
use serde_json::Value;

use faultscan_core::config::ToolOutputFormat;

use super::Detection;

const SWIFT_DO_STATEMENT: &str = "source.lang.swift.stmt.do";
const SWIFT_STATUS_CHECK: &str = "statusCode";
const SWIFT_RESILIENCE_NAMES: &[&str] = &["timeout", "retry", "circuitbreaker", "backoff"];

/// Decode `stdout` according to `format`. The error string describes what
/// was wrong with the output.
pub fn parse_output(format: ToolOutputFormat, stdout: &str) -> Result<Detection, String> {
    match format {
        ToolOutputFormat::JsonFlags => parse_json_flags(stdout),
        ToolOutputFormat::FlagPair => parse_flag_pair(stdout),
        ToolOutputFormat::SwiftStructure => parse_swift_structure(stdout),
    }
}

#[derive(Deserialize)]
struct JsonFlags {
    #[serde(rename = "hasBasicHandling", alias = "basicHandling")]
    has_basic: bool,
    #[serde(rename = "hasAdvancedHandling", alias = "advancedHandling")]
    has_advanced: bool,
}

fn parse_json_flags(stdout: &str) -> Result<Detection, String> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Err("empty output".to_string());
    }
    // Some wrappers print progress lines before the JSON object.
    let flags: JsonFlags = match serde_json::from_str(trimmed) {
        Ok(flags) => flags,
        Err(whole) => {
            let last = last_line(trimmed).unwrap_or(trimmed);
            serde_json::from_str(last).map_err(|_| format!("expected flag object: {whole}"))?
        }
    };
    Ok(Detection::new(flags.has_basic, flags.has_advanced))
}

fn parse_flag_pair(stdout: &str) -> Result<Detection, String> {
    let line = last_line(stdout).ok_or_else(|| "empty output".to_string())?;
    let mut parts = line.split(',').map(str::trim);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(basic), Some(advanced), None) => Ok(Detection::new(
            parse_bool(basic).ok_or_else(|| format!("not a boolean: {basic:?}"))?,
            parse_bool(advanced).ok_or_else(|| format!("not a boolean: {advanced:?}"))?,
        )),
        _ => Err(format!("expected `basic,advanced`, got {line:?}")),
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn last_line(text: &str) -> Option<&str> {
    text.lines().rev().map(str::trim).find(|l| !l.is_empty())
}

fn parse_swift_structure(stdout: &str) -> Result<Detection, String> {
    let root: Value = serde_json::from_str(stdout.trim()).map_err(|e| format!("invalid structure JSON: {e}"))?;
    let mut detection = Detection::default();
    let mut stack = vec![&root];
    while let Some(value) = stack.pop() {
        match value {
            Value::Object(map) => {
                if map.get("key.kind").and_then(Value::as_str) == Some(SWIFT_DO_STATEMENT) {
                    detection.has_basic = true;
                }
                if let Some(name) = map.get("key.name").and_then(Value::as_str) {
                    if name == SWIFT_STATUS_CHECK {
                        detection.has_basic = true;
                    }
                    if SWIFT_RESILIENCE_NAMES.iter().any(|p| name.eq_ignore_ascii_case(p)) {
                        detection.has_advanced = true;
                    }
                }
                stack.extend(map.values());
            }
            Value::Array(items) => stack.extend(items.iter()),
            _ => {}
        }
        if detection.is_complete() {
            break;
        }
    }
    Ok(detection)
}
