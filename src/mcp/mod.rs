//! MCP (Model Context Protocol) server for automation hosts.
//!
//! Exposes one tool, `find_coverage_gaps`, over stdio JSON-RPC. The tool
//! body is the pure [`handle`] function: identical requests (plus whatever
//! the resolver/filesystem returns) yield byte-identical responses, so the
//! host can use it for CI gating.

use crate::analyzer::GapEngine;
use crate::coverage::parse_coveragepy_value;
use crate::{GapSuggestion, Priority};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

/// Host-supplied callback that resolves an artifact id to raw bytes.
pub type ArtifactResolver<'a> = dyn Fn(&str) -> anyhow::Result<Vec<u8>> + 'a;

/// MCP JSON-RPC request
#[derive(Debug, Deserialize, Serialize)]
pub struct JsonRpcRequest {
    #[allow(dead_code)]
    pub jsonrpc: Option<String>,
    pub id: Option<Value>,
    pub method: String,
    pub params: Option<Value>,
}

/// MCP JSON-RPC response
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

/// Tool definition for MCP tools/list
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolDef {
    name: String,
    description: String,
    input_schema: InputSchema,
}

#[derive(Debug, Serialize)]
struct InputSchema {
    #[serde(rename = "type")]
    typ: &'static str,
    properties: Value,
    required: Vec<&'static str>,
}

/// Handle one `find_coverage_gaps` tool request.
///
/// The request carries the coverage payload inline (a `files` object) or as
/// an artifact reference, plus optional `repo_root`, `priority_filter`,
/// `fail_on`, `limit`, and `format` fields. Request-shape problems come
/// back as a structured error response with `exit_code` 1, never a panic.
pub fn handle(request: &Value, artifact_resolver: Option<&ArtifactResolver>) -> Value {
    let coverage = match load_coverage_payload(request.get("coverage"), artifact_resolver) {
        Ok(value) => value,
        Err(message) => return error_response(&message),
    };
    let report = match parse_coveragepy_value(&coverage) {
        Ok(report) => report,
        Err(e) => return error_response(&format!("Invalid JSON in coverage data: {e}")),
    };

    let mut engine = GapEngine::new();
    if let Some(root) = request.get("repo_root").and_then(|v| v.as_str()) {
        engine = engine.with_source_root(PathBuf::from(root));
    }
    let (mut suggestions, mut warnings) = engine.run(&report);

    // Keep suggestions at or above the requested severity; unknown names
    // leave the list unfiltered.
    if let Some(filter) = request.get("priority_filter").and_then(|v| v.as_str()) {
        if let Some(minimum) = Priority::parse(filter) {
            suggestions.retain(|s| s.priority <= minimum);
        }
    }

    // Counts and the gating decision are computed on the filtered set
    // BEFORE the limit, so CI sees all matching gaps, not just the top N.
    let total_suggestions = suggestions.len();
    let by_priority = count_by_priority(&suggestions);
    let fail_on = request
        .get("fail_on")
        .and_then(|v| v.as_str())
        .unwrap_or("none");
    let exit_code = compute_exit_code(&suggestions, fail_on);

    if let Some(limit) = request.get("limit").and_then(|v| v.as_u64()) {
        if limit > 0 {
            suggestions.truncate(limit as usize);
        }
    }

    let result = json!({
        "coverage_percent": round2(report.coverage_percent()),
        "files_analyzed": report.files.len(),
        "files_with_gaps": report.files_with_gaps(),
        "total_suggestions": total_suggestions,
        "suggestions": &suggestions,
        "by_priority": by_priority,
    });

    warnings.sort();

    let mut response = json!({
        "exit_code": exit_code,
        "result": result,
        "warnings": warnings,
    });
    if request.get("format").and_then(|v| v.as_str()) == Some("text") {
        let text = format_text_output(&response["result"], &suggestions);
        response["text"] = Value::String(text);
    }
    response
}

/// Load the coverage payload from an inline object or artifact reference.
fn load_coverage_payload(
    coverage: Option<&Value>,
    artifact_resolver: Option<&ArtifactResolver>,
) -> Result<Value, String> {
    let Some(obj) = coverage.and_then(|c| c.as_object()) else {
        return Err("coverage must be an object".to_string());
    };

    if obj.contains_key("artifact_id") {
        let artifact_id = obj
            .get("artifact_id")
            .and_then(|v| v.as_str())
            .unwrap_or_default();

        if let Some(resolver) = artifact_resolver {
            let raw = resolver(artifact_id).map_err(|e| format!("Failed to load coverage: {e}"))?;
            return serde_json::from_slice(&raw)
                .map_err(|e| format!("Invalid JSON in coverage data: {e}"));
        }

        // Fall back to locator as a filesystem path
        let Some(locator) = obj.get("locator").and_then(|v| v.as_str()) else {
            return Err(
                "artifact reference requires either artifact_resolver or locator".to_string(),
            );
        };
        let content = match std::fs::read_to_string(locator) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(format!("Coverage file not found: {locator}"));
            }
            Err(e) => return Err(format!("Failed to load coverage: {e}")),
        };
        return serde_json::from_str(&content)
            .map_err(|e| format!("Invalid JSON in coverage data: {e}"));
    }

    // Inline payload must look like coverage.json
    if !obj.contains_key("files") && !obj.contains_key("meta") {
        return Err("coverage data must contain 'files' key (coverage.json format)".to_string());
    }
    Ok(Value::Object(obj.clone()))
}

fn count_by_priority(suggestions: &[GapSuggestion]) -> Value {
    let mut counts = serde_json::Map::new();
    for priority in Priority::ALL {
        let count = suggestions.iter().filter(|s| s.priority == priority).count();
        counts.insert(priority.to_string(), json!(count));
    }
    Value::Object(counts)
}

/// 0 = pass, 2 = gating threshold met. Severity names other than the
/// defined ones behave like "any" once any suggestion exists.
fn compute_exit_code(suggestions: &[GapSuggestion], fail_on: &str) -> i64 {
    if fail_on == "none" {
        return 0;
    }
    if fail_on == "any" {
        return if suggestions.is_empty() { 0 } else { 2 };
    }
    let threshold = Priority::parse(fail_on).map(|p| p.score()).unwrap_or(0);
    if suggestions.iter().any(|s| s.priority.score() >= threshold) {
        2
    } else {
        0
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Human-readable report block for `format: "text"` requests.
fn format_text_output(result: &Value, suggestions: &[GapSuggestion]) -> String {
    let mut lines = Vec::new();
    lines.push("=".repeat(60));
    lines.push("covgap".to_string());
    lines.push("=".repeat(60));
    lines.push(format!(
        "Coverage: {:.1}% ({} files analyzed)",
        result["coverage_percent"].as_f64().unwrap_or(0.0),
        result["files_analyzed"]
    ));
    lines.push(format!("Files with gaps: {}", result["files_with_gaps"]));
    lines.push(String::new());

    lines.push(format!("Missing tests: {}", result["total_suggestions"]));
    let by_priority = &result["by_priority"];
    for (priority, label) in [
        ("critical", "[!!] CRITICAL"),
        ("high", "[!]  HIGH"),
        ("medium", "[  ] MEDIUM"),
        ("low", "[  ] LOW"),
    ] {
        let count = by_priority[priority].as_u64().unwrap_or(0);
        if count > 0 {
            lines.push(format!("  {label}: {count}"));
        }
    }
    lines.push(String::new());

    if !suggestions.is_empty() {
        lines.push("Top suggestions:".to_string());
        for (i, s) in suggestions.iter().take(10).enumerate() {
            let marker = match s.priority {
                Priority::Critical => "[!!]",
                Priority::High => "[! ]",
                _ => "[  ]",
            };
            lines.push(format!("  {}. {} {}", i + 1, marker, s.test_name));
            lines.push(format!("       {}", s.description));
        }
        if suggestions.len() > 10 {
            lines.push(format!("  ... and {} more", suggestions.len() - 10));
        }
    }

    lines.join("\n")
}

/// Structured failure: exit_code 1, empty result, one warning.
fn error_response(message: &str) -> Value {
    json!({
        "exit_code": 1,
        "result": {
            "coverage_percent": 0,
            "files_analyzed": 0,
            "files_with_gaps": 0,
            "total_suggestions": 0,
            "suggestions": [],
            "by_priority": {"critical": 0, "high": 0, "medium": 0, "low": 0},
        },
        "warnings": [message],
    })
}

/// Handle a single JSON-RPC request and return a response.
/// Extracted from `run_mcp_server` for testability.
pub fn handle_request(req: &JsonRpcRequest) -> JsonRpcResponse {
    let id = req.id.clone();
    let result = match req.method.as_str() {
        "initialize" => Some(json!({
            "protocolVersion": "0.1.0",
            "capabilities": { "tools": {} },
            "serverInfo": { "name": "covgap", "version": env!("CARGO_PKG_VERSION") }
        })),
        "tools/list" => {
            let tools = vec![ToolDef {
                name: "find_coverage_gaps".to_string(),
                description:
                    "Analyze a coverage.py JSON report and suggest the missing tests to write"
                        .to_string(),
                input_schema: InputSchema {
                    typ: "object",
                    properties: json!({
                        "coverage": {
                            "type": "object",
                            "description": "Inline coverage.json data, or {artifact_id, locator} reference"
                        },
                        "repo_root": { "type": "string", "description": "Root for resolving source paths" },
                        "priority_filter": { "type": "string", "description": "Keep suggestions at or above: critical, high, medium, low" },
                        "fail_on": { "type": "string", "description": "Gate threshold: none, critical, high, any" },
                        "limit": { "type": "number", "description": "Max suggestions to return (does not affect gating)" },
                        "format": { "type": "string", "description": "Set to \"text\" for a rendered report" }
                    }),
                    required: vec!["coverage"],
                },
            }];
            Some(json!({ "tools": tools }))
        }
        "tools/call" => {
            let (name, args) = req
                .params
                .as_ref()
                .and_then(|p| p.get("params").or(Some(p)))
                .map(|p| {
                    let name = p.get("name").and_then(|n| n.as_str()).unwrap_or("");
                    let args = p.get("arguments").cloned().unwrap_or(Value::Null);
                    (name, args)
                })
                .unwrap_or(("", Value::Null));

            let outcome = match name {
                "find_coverage_gaps" => Ok(handle(&args, None)),
                _ => Err(format!("Unknown tool: {name}")),
            };

            match outcome {
                Ok(val) => Some(json!({
                    "content": [{ "type": "text", "text": serde_json::to_string(&val).unwrap_or_else(|_| "{}".to_string()) }]
                })),
                Err(message) => Some(json!({
                    "content": [{ "type": "text", "text": format!("Error: {message}") }],
                    "isError": true
                })),
            }
        }
        _ => None,
    };

    JsonRpcResponse {
        jsonrpc: "2.0",
        id,
        result,
        error: None,
    }
}

/// Run the MCP server loop (stdin / stdout).
pub fn run_mcp_server() -> anyhow::Result<()> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let reader = BufReader::new(stdin.lock());

    for line in reader.lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let req: JsonRpcRequest = match serde_json::from_str(&line) {
            Ok(r) => r,
            Err(_) => continue,
        };

        let response = handle_request(&req);
        writeln!(stdout, "{}", serde_json::to_string(&response)?)?;
        stdout.flush()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_request(method: &str, params: Option<Value>) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: Some("2.0".to_string()),
            id: Some(json!(1)),
            method: method.to_string(),
            params,
        }
    }

    #[test]
    fn initialize_returns_protocol_version_and_server_info() {
        let req = make_request("initialize", None);
        let resp = handle_request(&req);

        assert_eq!(resp.jsonrpc, "2.0");
        assert_eq!(resp.id, Some(json!(1)));
        assert!(resp.error.is_none());

        let result = resp.result.unwrap();
        assert_eq!(result["protocolVersion"], "0.1.0");
        assert_eq!(result["serverInfo"]["name"], "covgap");
        assert!(result["serverInfo"]["version"].is_string());
    }

    #[test]
    fn tools_list_exposes_gaps_tool_with_schema() {
        let req = make_request("tools/list", None);
        let resp = handle_request(&req);

        let result = resp.result.unwrap();
        let tools = result["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["name"], "find_coverage_gaps");

        let schema = &tools[0]["inputSchema"];
        assert_eq!(schema["type"], "object");
        assert!(schema["properties"]["coverage"].is_object());
        let required = schema["required"].as_array().unwrap();
        assert!(required.iter().any(|r| r == "coverage"));
    }

    #[test]
    fn tools_call_unknown_tool_returns_error() {
        let req = make_request(
            "tools/call",
            Some(json!({
                "name": "nonexistent_tool",
                "arguments": {}
            })),
        );
        let resp = handle_request(&req);

        let result = resp.result.unwrap();
        assert_eq!(result["isError"], true);
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("Unknown tool"));
    }

    #[test]
    fn tools_call_runs_gaps_tool() {
        let req = make_request(
            "tools/call",
            Some(json!({
                "name": "find_coverage_gaps",
                "arguments": { "coverage": { "files": {} } }
            })),
        );
        let resp = handle_request(&req);

        let result = resp.result.unwrap();
        assert!(result.get("isError").is_none());
        let text = result["content"][0]["text"].as_str().unwrap();
        let parsed: Value = serde_json::from_str(text).unwrap();
        assert_eq!(parsed["exit_code"], 0);
        assert_eq!(parsed["result"]["coverage_percent"], 100.0);
    }

    #[test]
    fn tools_call_with_nested_params() {
        // Some MCP clients wrap params inside a "params" key
        let req = make_request(
            "tools/call",
            Some(json!({
                "params": {
                    "name": "find_coverage_gaps",
                    "arguments": { "coverage": "not an object" }
                }
            })),
        );
        let resp = handle_request(&req);
        let text = resp.result.unwrap()["content"][0]["text"]
            .as_str()
            .unwrap()
            .to_string();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["exit_code"], 1);
    }

    #[test]
    fn unknown_method_returns_null_result() {
        let req = make_request("nonexistent/method", None);
        let resp = handle_request(&req);
        assert!(resp.result.is_none());
        assert!(resp.error.is_none());
    }

    #[test]
    fn jsonrpc_request_parsing() {
        let json = r#"{"jsonrpc":"2.0","id":42,"method":"initialize","params":null}"#;
        let req: JsonRpcRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.method, "initialize");
        assert_eq!(req.id, Some(json!(42)));
    }

    #[test]
    fn jsonrpc_request_without_id() {
        // Notifications have no id
        let json = r#"{"jsonrpc":"2.0","method":"initialize"}"#;
        let req: JsonRpcRequest = serde_json::from_str(json).unwrap();
        assert!(req.id.is_none());
        let resp = handle_request(&req);
        assert!(resp.id.is_none());
    }

    #[test]
    fn exit_code_thresholds() {
        let make = |priority: Priority| GapSuggestion {
            test_name: String::new(),
            test_file: String::new(),
            description: String::new(),
            covers_lines: vec![1],
            priority,
            code_template: String::new(),
            setup_hints: vec![],
            block_type: crate::BlockType::CodeBlock,
        };

        let none: Vec<GapSuggestion> = vec![];
        let low_only = vec![make(Priority::Low)];
        let with_high = vec![make(Priority::Low), make(Priority::High)];
        let with_critical = vec![make(Priority::Critical)];

        assert_eq!(compute_exit_code(&with_critical, "none"), 0);
        assert_eq!(compute_exit_code(&none, "any"), 0);
        assert_eq!(compute_exit_code(&low_only, "any"), 2);
        assert_eq!(compute_exit_code(&low_only, "high"), 0);
        assert_eq!(compute_exit_code(&with_high, "high"), 2);
        assert_eq!(compute_exit_code(&with_high, "critical"), 0);
        assert_eq!(compute_exit_code(&with_critical, "critical"), 2);
    }
}
