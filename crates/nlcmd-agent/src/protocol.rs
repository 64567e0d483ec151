//! The closed response protocol between nlcmd and the planner.
//!
//! Every planning round ends in exactly one [`ResponsePayload`].  Parsing is
//! total: anything that does not match one of the five shapes becomes
//! [`ResponsePayload::Error`] instead of an `Err`, so the negotiator can apply
//! its corrective retry uniformly.

use serde::Serialize;
use serde_json::{Map, Value, json};

// ---------------------------------------------------------------------------
// Payload types
// ---------------------------------------------------------------------------

/// One candidate command offered by a `choose` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChooseOption {
    /// The command to run if this option is selected.  May be empty when the
    /// planner omitted it; selection rejects empty commands.
    pub cmd: String,
    /// Short justification shown next to the command.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// A validated planner intent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ResponsePayload {
    /// Run a single shell command.
    Execute { command: String },
    /// Let the user pick one of several commands.
    Choose { options: Vec<ChooseOption> },
    /// Ask the user for more information.
    Clarify { questions: Vec<String> },
    /// Invoke a skill directly.
    Tool {
        tool: String,
        args: Map<String, Value>,
    },
    /// The planner failed, or its output did not follow the protocol.
    Error { message: String },
}

impl ResponsePayload {
    /// Validate raw planner text into a payload.
    ///
    /// Markdown fences and surrounding prose are tolerated: only the span
    /// from the first `{` to the last `}` is parsed.
    pub fn parse(raw: &str) -> Self {
        let candidate = extract_object(raw);
        let value: Value = match serde_json::from_str(candidate) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(error = %e, "planner output is not valid JSON");
                return Self::error("Invalid JSON returned");
            }
        };

        let Some(obj) = value.as_object() else {
            return Self::error("Expected a JSON object");
        };

        let status = obj
            .get("status")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_lowercase());

        match status.as_deref() {
            Some("execute") => match non_empty_str(obj.get("command")) {
                Some(command) => Self::Execute { command },
                None => Self::error("execute payload is missing a command"),
            },
            Some("choose") => Self::Choose {
                options: parse_options(obj.get("options")),
            },
            Some("clarify") => Self::Clarify {
                questions: parse_questions(obj.get("questions")),
            },
            Some("tool") => match non_empty_str(obj.get("tool")) {
                Some(tool) => Self::Tool {
                    tool,
                    args: obj
                        .get("args")
                        .and_then(Value::as_object)
                        .cloned()
                        .unwrap_or_default(),
                },
                None => Self::error("tool payload is missing a tool name"),
            },
            Some("error") => Self::Error {
                message: non_empty_str(obj.get("message"))
                    .unwrap_or_else(|| "Planner reported an error".to_owned()),
            },
            Some(other) => Self::error(format!("Unrecognized status `{other}`")),
            None => Self::error("Missing status"),
        }
    }

    /// Whether this payload is the `error` variant.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// The wire name of this payload's status.
    pub fn status(&self) -> &'static str {
        match self {
            Self::Execute { .. } => "execute",
            Self::Choose { .. } => "choose",
            Self::Clarify { .. } => "clarify",
            Self::Tool { .. } => "tool",
            Self::Error { .. } => "error",
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

fn parse_options(value: Option<&Value>) -> Vec<ChooseOption> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::Object(opt) => Some(ChooseOption {
                cmd: non_empty_str(opt.get("cmd")).unwrap_or_default(),
                reason: non_empty_str(opt.get("reason")),
            }),
            Value::String(cmd) => Some(ChooseOption {
                cmd: cmd.trim().to_owned(),
                reason: None,
            }),
            _ => None,
        })
        .collect()
}

fn parse_questions(value: Option<&Value>) -> Vec<String> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|q| non_empty_str(Some(q)))
        .collect()
}

/// The substring from the first `{` to the last `}` of `raw`.
///
/// Returns the trimmed input unchanged when it contains no such span.
pub fn extract_object(raw: &str) -> &str {
    let s = raw.trim();
    match (s.find('{'), s.rfind('}')) {
        (Some(start), Some(end)) if end > start => &s[start..=end],
        _ => s,
    }
}

// ---------------------------------------------------------------------------
// Strict schema
// ---------------------------------------------------------------------------

/// The `json_schema` descriptor used by the strict request strategy.
pub fn response_schema() -> Value {
    json!({
        "name": "nlcmd_protocol",
        "schema": {
            "type": "object",
            "oneOf": [
                {
                    "type": "object",
                    "properties": {
                        "status": { "const": "execute" },
                        "command": { "type": "string", "minLength": 1 }
                    },
                    "required": ["status", "command"],
                    "additionalProperties": false
                },
                {
                    "type": "object",
                    "properties": {
                        "status": { "const": "choose" },
                        "options": {
                            "type": "array",
                            "minItems": 1,
                            "items": {
                                "type": "object",
                                "properties": {
                                    "cmd": { "type": "string", "minLength": 1 },
                                    "reason": { "type": "string" }
                                },
                                "required": ["cmd"],
                                "additionalProperties": false
                            }
                        }
                    },
                    "required": ["status", "options"],
                    "additionalProperties": false
                },
                {
                    "type": "object",
                    "properties": {
                        "status": { "const": "clarify" },
                        "questions": {
                            "type": "array",
                            "minItems": 1,
                            "items": { "type": "string", "minLength": 1 }
                        }
                    },
                    "required": ["status", "questions"],
                    "additionalProperties": false
                },
                {
                    "type": "object",
                    "properties": {
                        "status": { "const": "tool" },
                        "tool": { "type": "string", "minLength": 1 },
                        "args": { "type": "object" }
                    },
                    "required": ["status", "tool"],
                    "additionalProperties": false
                },
                {
                    "type": "object",
                    "properties": {
                        "status": { "const": "error" },
                        "message": { "type": "string" }
                    },
                    "required": ["status", "message"],
                    "additionalProperties": false
                }
            ]
        },
        "strict": true
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_execute() {
        let p = ResponsePayload::parse(r#"{"status":"execute","command":"ls -la"}"#);
        assert_eq!(
            p,
            ResponsePayload::Execute {
                command: "ls -la".into()
            }
        );
        assert_eq!(p.status(), "execute");
    }

    #[test]
    fn parse_tolerates_fences_and_prose() {
        let raw = "Sure! Here you go:\n```json\n{\"status\":\"execute\",\"command\":\"pwd\"}\n```\nHope that helps.";
        assert_eq!(
            ResponsePayload::parse(raw),
            ResponsePayload::Execute {
                command: "pwd".into()
            }
        );
    }

    #[test]
    fn status_is_case_insensitive() {
        let p = ResponsePayload::parse(r#"{"status":"Clarify","questions":["Which dir?"]}"#);
        assert_eq!(
            p,
            ResponsePayload::Clarify {
                questions: vec!["Which dir?".into()]
            }
        );
    }

    #[test]
    fn malformed_output_normalizes_to_error() {
        for raw in [
            "",
            "no json here",
            "{not json}",
            r#"["status","execute"]"#,
            r#"{"command":"ls"}"#,
            r#"{"status":"launch","command":"ls"}"#,
            r#"{"status":"execute","command":"   "}"#,
            r#"{"status":"tool","args":{}}"#,
        ] {
            assert!(ResponsePayload::parse(raw).is_error(), "input: {raw:?}");
        }
    }

    #[test]
    fn parse_choose_keeps_incomplete_options() {
        let p = ResponsePayload::parse(
            r#"{"status":"choose","options":[{"cmd":"ls -l","reason":"long"},{"reason":"no cmd"},"ls -a",42]}"#,
        );
        let ResponsePayload::Choose { options } = p else {
            panic!("expected choose");
        };
        assert_eq!(options.len(), 3);
        assert_eq!(options[0].cmd, "ls -l");
        assert_eq!(options[0].reason.as_deref(), Some("long"));
        assert_eq!(options[1].cmd, "");
        assert_eq!(options[2].cmd, "ls -a");
        assert!(options[2].reason.is_none());
    }

    #[test]
    fn empty_lists_keep_their_variant() {
        assert_eq!(
            ResponsePayload::parse(r#"{"status":"choose","options":[]}"#),
            ResponsePayload::Choose { options: vec![] }
        );
        assert_eq!(
            ResponsePayload::parse(r#"{"status":"clarify"}"#),
            ResponsePayload::Clarify { questions: vec![] }
        );
    }

    #[test]
    fn parse_tool_with_and_without_args() {
        let p = ResponsePayload::parse(r#"{"status":"tool","tool":"sysinfo","args":{"mode":"full"}}"#);
        let ResponsePayload::Tool { tool, args } = p else {
            panic!("expected tool");
        };
        assert_eq!(tool, "sysinfo");
        assert_eq!(args["mode"], "full");

        let p = ResponsePayload::parse(r#"{"status":"tool","tool":"sysinfo"}"#);
        assert_eq!(
            p,
            ResponsePayload::Tool {
                tool: "sysinfo".into(),
                args: Map::new()
            }
        );
    }

    #[test]
    fn parse_error_payload() {
        let p = ResponsePayload::parse(r#"{"status":"error","message":"cannot do that"}"#);
        assert_eq!(
            p,
            ResponsePayload::Error {
                message: "cannot do that".into()
            }
        );
    }

    #[test]
    fn serializes_with_status_tag() {
        let v = serde_json::to_value(ResponsePayload::Execute {
            command: "ls".into(),
        })
        .unwrap();
        assert_eq!(v, json!({"status": "execute", "command": "ls"}));
    }

    #[test]
    fn extract_object_span() {
        assert_eq!(extract_object("xx {\"a\":{\"b\":1}} yy"), "{\"a\":{\"b\":1}}");
        assert_eq!(extract_object("  plain  "), "plain");
        assert_eq!(extract_object("} backwards {"), "} backwards {");
    }

    #[test]
    fn schema_covers_five_shapes() {
        let schema = response_schema();
        assert_eq!(schema["name"], "nlcmd_protocol");
        assert_eq!(schema["strict"], true);
        let shapes = schema["schema"]["oneOf"].as_array().unwrap();
        let statuses: Vec<&str> = shapes
            .iter()
            .map(|s| s["properties"]["status"]["const"].as_str().unwrap())
            .collect();
        assert_eq!(statuses, ["execute", "choose", "clarify", "tool", "error"]);
    }
}
