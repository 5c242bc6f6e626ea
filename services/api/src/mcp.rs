//! Model Context Protocol server over stdio.
//!
//! Speaks JSON-RPC 2.0, one message per line on stdin, and answers on stdout.
//! Logging stays on stderr so the channel carries protocol traffic only.

use serde::Deserialize;
use serde_json::{json, Value};
use std::io::{BufRead, Write};
use tracing::{debug, info, warn};
use unslop::config::PromptDefaults;
use unslop::error::AppError;
use unslop::prompt::{PromptError, Vocabulary};

use crate::infra::{analyze_payload, bootstrap, suggest_payload, transform_payload};

const JSONRPC_VERSION: &str = "2.0";
const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

pub(crate) fn run() -> Result<(), AppError> {
    let config = bootstrap()?;
    McpServer::new(config.prompt).serve(std::io::stdin().lock(), std::io::stdout().lock())
}

#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    #[serde(default)]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Option<Value>,
}

#[derive(Debug)]
struct RpcError {
    code: i64,
    message: String,
}

impl RpcError {
    fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

pub(crate) struct McpServer {
    defaults: PromptDefaults,
}

impl McpServer {
    pub(crate) fn new(defaults: PromptDefaults) -> Self {
        Self { defaults }
    }

    /// Answers one line at a time until input closes. Malformed lines get a
    /// parse error reply; only a failing reader or writer ends the loop.
    pub(crate) fn serve<R, W>(&self, mut input: R, mut output: W) -> Result<(), AppError>
    where
        R: BufRead,
        W: Write,
    {
        info!("mcp server started");
        let mut buffer = Vec::new();
        loop {
            buffer.clear();
            if input.read_until(b'\n', &mut buffer)? == 0 {
                break;
            }

            let response = match std::str::from_utf8(&buffer) {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => {
                    debug!(message = %line.trim_end(), "received");
                    self.handle_message(line)
                }
                Err(err) => {
                    warn!(%err, "message is not valid utf-8");
                    Some(error_response(
                        Value::Null,
                        RpcError::new(PARSE_ERROR, format!("parse error: {err}")),
                    ))
                }
            };

            if let Some(response) = response {
                writeln!(output, "{}", serde_json::to_string(&response)?)?;
                output.flush()?;
            }
        }
        info!("mcp input closed");
        Ok(())
    }

    /// Returns `None` for notifications.
    pub(crate) fn handle_message(&self, message: &str) -> Option<Value> {
        let raw: Value = match serde_json::from_str(message) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(%err, "unparseable message");
                return Some(error_response(
                    Value::Null,
                    RpcError::new(PARSE_ERROR, format!("parse error: {err}")),
                ));
            }
        };
        let raw_id = raw.get("id").cloned().unwrap_or(Value::Null);
        let request: JsonRpcRequest = match serde_json::from_value(raw) {
            Ok(request) => request,
            Err(err) => {
                return Some(error_response(
                    raw_id,
                    RpcError::new(INVALID_REQUEST, format!("invalid request: {err}")),
                ));
            }
        };

        let result = match request.method.as_str() {
            "initialize" => Ok(self.initialize()),
            "initialized" | "notifications/initialized" => return None,
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": tool_definitions() })),
            "tools/call" => self.call_tool(request.params.as_ref()),
            "shutdown" => {
                info!("shutdown requested");
                Ok(Value::Null)
            }
            other => Err(RpcError::new(
                METHOD_NOT_FOUND,
                format!("unknown method: {other}"),
            )),
        };

        // Requests without an id are notifications and get no reply.
        let id = request.id?;
        Some(match result {
            Ok(value) => json!({ "jsonrpc": JSONRPC_VERSION, "id": id, "result": value }),
            Err(err) => error_response(id, err),
        })
    }

    fn initialize(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": {} },
            "serverInfo": {
                "name": "unslop",
                "version": env!("CARGO_PKG_VERSION"),
            },
        })
    }

    fn call_tool(&self, params: Option<&Value>) -> Result<Value, RpcError> {
        let params = params.ok_or_else(|| RpcError::new(INVALID_PARAMS, "missing params"))?;
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| RpcError::new(INVALID_PARAMS, "missing tool name"))?;
        let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));

        debug!(tool = name, "calling tool");
        let outcome = match name {
            "analyze_prompt" => analyze_payload(&arguments)
                .map_err(AppError::from)
                .and_then(to_value),
            "transform_prompt" => transform_payload(&arguments, &self.defaults)
                .map_err(AppError::from)
                .and_then(to_value),
            "suggest_modifiers" => suggest_payload(&arguments)
                .map_err(AppError::from)
                .and_then(to_value),
            "list_modifiers" => list_modifiers(&arguments),
            other => {
                return Err(RpcError::new(INVALID_PARAMS, format!("unknown tool: {other}")));
            }
        };

        Ok(match outcome {
            Ok(value) => json!({
                "content": [{ "type": "text", "text": value.to_string() }],
            }),
            Err(err) => {
                let text = json!({ "error": err.to_string() }).to_string();
                json!({
                    "content": [{ "type": "text", "text": text }],
                    "isError": true,
                })
            }
        })
    }
}

fn to_value<T: serde::Serialize>(value: T) -> Result<Value, AppError> {
    Ok(serde_json::to_value(value)?)
}

fn list_modifiers(arguments: &Value) -> Result<Value, AppError> {
    let category = match arguments.get("category") {
        None | Some(Value::Null) => None,
        Some(Value::String(name)) => Some(name.as_str()),
        Some(_) => return Err(PromptError::invalid_input("category must be a string").into()),
    };
    let listing = Vocabulary::standard().listing(category);
    if listing.is_empty() {
        let name = category.unwrap_or_default();
        let reason = format!("unknown modifier category '{name}'");
        return Err(PromptError::invalid_input(reason).into());
    }
    to_value(listing)
}

fn error_response(id: Value, err: RpcError) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id,
        "error": { "code": err.code, "message": err.message },
    })
}

fn prompt_schema(extra: Value) -> Value {
    let mut properties = json!({
        "prompt": { "type": "string", "description": "Image-generation prompt text" },
    });
    if let (Some(base), Value::Object(extra)) = (properties.as_object_mut(), extra) {
        base.extend(extra);
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": ["prompt"],
    })
}

fn tool_definitions() -> Vec<Value> {
    vec![
        json!({
            "name": "analyze_prompt",
            "description":
                "Score a prompt for AI-generated look (0-100) and list the markers found.",
            "inputSchema": prompt_schema(json!({})),
        }),
        json!({
            "name": "transform_prompt",
            "description":
                "Rewrite a prompt to read like a real photograph and report the score change.",
            "inputSchema": prompt_schema(json!({
                "style": { "type": "string", "enum": ["film", "digital", "phone"] },
                "mood": { "type": "string", "enum": ["natural", "moody", "harsh"] },
                "imperfection": { "type": "string", "enum": ["low", "medium", "high"] },
                "preserve_original": { "type": "boolean" },
                "seed": { "type": "integer", "minimum": 0 },
            })),
        }),
        json!({
            "name": "suggest_modifiers",
            "description": "Analyze a prompt and propose modifier phrases without rewriting it.",
            "inputSchema": prompt_schema(json!({})),
        }),
        json!({
            "name": "list_modifiers",
            "description": "List the modifier vocabulary, optionally for one category or group.",
            "inputSchema": {
                "type": "object",
                "properties": { "category": { "type": "string" } },
            },
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> McpServer {
        McpServer::new(PromptDefaults::default())
    }

    fn call(server: &McpServer, message: Value) -> Value {
        server
            .handle_message(&message.to_string())
            .expect("request gets a response")
    }

    fn tool_payload(response: &Value) -> Value {
        let text = response["result"]["content"][0]["text"]
            .as_str()
            .expect("text content");
        serde_json::from_str(text).expect("tool text is json")
    }

    #[test]
    fn initialize_reports_server_info() {
        let response = call(
            &server(),
            json!({ "jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {} }),
        );
        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["serverInfo"]["name"], "unslop");
        assert_eq!(response["result"]["protocolVersion"], PROTOCOL_VERSION);
    }

    #[test]
    fn initialized_notification_gets_no_reply() {
        let server = server();
        for method in ["initialized", "notifications/initialized"] {
            let message = json!({ "jsonrpc": "2.0", "method": method }).to_string();
            assert!(server.handle_message(&message).is_none());
        }
    }

    #[test]
    fn lists_four_tools() {
        let response = call(
            &server(),
            json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/list" }),
        );
        let names: Vec<&str> = response["result"]["tools"]
            .as_array()
            .expect("tool array")
            .iter()
            .filter_map(|tool| tool["name"].as_str())
            .collect();
        assert_eq!(
            names,
            vec!["analyze_prompt", "transform_prompt", "suggest_modifiers", "list_modifiers"]
        );
    }

    #[test]
    fn analyze_tool_returns_scored_analysis() {
        let response = call(
            &server(),
            json!({
                "jsonrpc": "2.0",
                "id": 3,
                "method": "tools/call",
                "params": {
                    "name": "analyze_prompt",
                    "arguments": {
                        "prompt": "a beautiful woman in a coffee shop, 8k, trending on artstation",
                    },
                },
            }),
        );
        let payload = tool_payload(&response);
        assert_eq!(payload["score"], 85);
        assert_eq!(payload["band"], "very_high");
        assert!(response["result"].get("isError").is_none());
    }

    #[test]
    fn transform_tool_honors_seed() {
        let request = json!({
            "jsonrpc": "2.0",
            "id": 4,
            "method": "tools/call",
            "params": {
                "name": "transform_prompt",
                "arguments": { "prompt": "a man in a kitchen, 4k", "seed": 11, "style": "digital" },
            },
        });
        let first = tool_payload(&call(&server(), request.clone()));
        let second = tool_payload(&call(&server(), request));
        assert_eq!(first["transformed"], second["transformed"]);
        assert!(!first["transformed"].as_str().expect("text").contains("4k"));
    }

    #[test]
    fn blank_prompt_is_a_tool_error() {
        let response = call(
            &server(),
            json!({
                "jsonrpc": "2.0",
                "id": 5,
                "method": "tools/call",
                "params": { "name": "suggest_modifiers", "arguments": { "prompt": "" } },
            }),
        );
        assert_eq!(response["result"]["isError"], true);
        let payload = tool_payload(&response);
        assert_eq!(payload["error"], "invalid input: prompt must not be empty");
    }

    #[test]
    fn list_modifiers_filters_by_group() {
        let response = call(
            &server(),
            json!({
                "jsonrpc": "2.0",
                "id": 6,
                "method": "tools/call",
                "params": { "name": "list_modifiers", "arguments": { "category": "lighting" } },
            }),
        );
        let payload = tool_payload(&response);
        let keys: Vec<&String> = payload.as_object().expect("object").keys().collect();
        assert_eq!(
            keys,
            vec!["lighting.artificial", "lighting.moody", "lighting.natural"]
        );
    }

    #[test]
    fn protocol_errors_use_json_rpc_codes() {
        let server = server();

        let parse = server.handle_message("{not json").expect("error reply");
        assert_eq!(parse["error"]["code"], PARSE_ERROR);
        assert_eq!(parse["id"], Value::Null);

        let unknown = call(
            &server,
            json!({ "jsonrpc": "2.0", "id": 7, "method": "resources/list" }),
        );
        assert_eq!(unknown["error"]["code"], METHOD_NOT_FOUND);

        let bad_tool = call(
            &server,
            json!({
                "jsonrpc": "2.0",
                "id": 8,
                "method": "tools/call",
                "params": { "name": "nope" },
            }),
        );
        assert_eq!(bad_tool["error"]["code"], INVALID_PARAMS);
    }

    #[test]
    fn serve_answers_each_line() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"shutdown"}"#,
            "\n",
        );
        let mut output = Vec::new();
        server()
            .serve(input.as_bytes(), &mut output)
            .expect("serve completes");

        let lines: Vec<Value> = String::from_utf8(output)
            .expect("utf8 output")
            .lines()
            .map(|line| serde_json::from_str(line).expect("json line"))
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["id"], 1);
        assert_eq!(lines[1]["result"], Value::Null);
    }

    #[test]
    fn invalid_request_echoes_the_callers_id() {
        let response = call(&server(), json!({ "jsonrpc": "2.0", "id": 9, "params": {} }));
        assert_eq!(response["error"]["code"], INVALID_REQUEST);
        assert_eq!(response["id"], 9);
    }

    #[test]
    fn serve_survives_a_line_that_is_not_utf8() {
        let mut input = Vec::new();
        input.extend_from_slice(br#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#);
        input.extend_from_slice(b"\n\xff\xfe garbage\n");
        input.extend_from_slice(br#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#);
        input.push(b'\n');

        let mut output = Vec::new();
        server()
            .serve(input.as_slice(), &mut output)
            .expect("serve completes");

        let lines: Vec<Value> = String::from_utf8(output)
            .expect("utf8 output")
            .lines()
            .map(|line| serde_json::from_str(line).expect("json line"))
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["id"], 1);
        assert_eq!(lines[1]["error"]["code"], PARSE_ERROR);
        assert_eq!(lines[2]["id"], 2);
    }
}
