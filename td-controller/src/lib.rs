//! # TouchDesigner Controller
//!
//! A Model Context Protocol tool server: JSON-RPC 2.0 messages arrive one
//! per line on stdin, replies leave one per line on stdout. Two tools drive
//! the tuning simulation through [`SimulationControl`].

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, warn};
use tuning_lab_core::osc::SimulationControl;

pub const SERVER_NAME: &str = "TouchDesigner Controller";
pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;

#[derive(Debug, Deserialize)]
struct Request {
    #[serde(default)]
    jsonrpc: Option<String>,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Serialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Serialize)]
struct Response {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcError>,
}

impl Response {
    fn ok(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn err(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Deserialize)]
struct TuningArgs {
    error_level: f32,
    force_intensity: f32,
}

/// Text content of a tool call result.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutcome {
    pub text: String,
    pub is_error: bool,
}

impl ToolOutcome {
    fn into_json(self) -> Value {
        json!({
            "content": [{ "type": "text", "text": self.text }],
            "isError": self.is_error,
        })
    }
}

pub struct ToolServer {
    control: SimulationControl,
}

impl ToolServer {
    pub fn new(control: SimulationControl) -> Self {
        Self { control }
    }

    /// Handles one incoming line. Returns the serialized reply, or `None`
    /// for notifications and blank lines.
    pub fn handle_line(&self, line: &str) -> Option<String> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let raw: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(err) => {
                warn!("unparseable message: {err}");
                return encode(Response::err(Value::Null, PARSE_ERROR, format!("Parse error: {err}")));
            }
        };
        // A missing id marks a notification; a present one must be a string or number.
        let id = match raw.get("id") {
            None => None,
            Some(id @ (Value::String(_) | Value::Number(_))) => Some(id.clone()),
            Some(other) => {
                warn!("request with invalid id {other}");
                return encode(Response::err(
                    Value::Null,
                    INVALID_REQUEST,
                    format!("Invalid request: id must be a string or number (got {other})"),
                ));
            }
        };
        let request: Request = match serde_json::from_value(raw) {
            Ok(request) => request,
            Err(err) => {
                return encode(Response::err(
                    id.unwrap_or(Value::Null),
                    INVALID_REQUEST,
                    format!("Invalid request: {err}"),
                ));
            }
        };
        if request.jsonrpc.as_deref() != Some("2.0") {
            debug!("request without jsonrpc 2.0 marker: {}", request.method);
        }

        let Some(id) = id else {
            debug!("notification {}", request.method);
            return None;
        };

        let response = match self.dispatch(&request.method, request.params) {
            Ok(result) => Response::ok(id, result),
            Err((code, message)) => Response::err(id, code, message),
        };
        encode(response)
    }

    fn dispatch(&self, method: &str, params: Value) -> Result<Value, (i64, String)> {
        match method {
            "initialize" => {
                info!("client initialized");
                Ok(json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": { "tools": {} },
                    "serverInfo": {
                        "name": SERVER_NAME,
                        "version": env!("CARGO_PKG_VERSION"),
                    }
                }))
            }
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": tool_definitions() })),
            "tools/call" => {
                let call: CallParams = serde_json::from_value(params)
                    .map_err(|err| (INVALID_PARAMS, format!("Invalid params: {err}")))?;
                let outcome = self.call_tool(&call.name, call.arguments)?;
                Ok(outcome.into_json())
            }
            other => Err((METHOD_NOT_FOUND, format!("Method not found: {other}"))),
        }
    }

    /// Runs a tool by name. Unknown tools are a protocol error; bad
    /// arguments and send failures come back as error outcomes.
    pub fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolOutcome, (i64, String)> {
        let result = match name {
            "set_tuning_simulation" => match serde_json::from_value::<TuningArgs>(arguments) {
                Ok(args) => self
                    .control
                    .set_tuning_simulation(args.error_level, args.force_intensity)
                    .map_err(|err| err.to_string()),
                Err(err) => Err(format!("Invalid arguments: {err}")),
            },
            "reset_simulation" => self.control.reset_simulation().map_err(|err| err.to_string()),
            other => return Err((INVALID_PARAMS, format!("Unknown tool: {other}"))),
        };

        Ok(match result {
            Ok(text) => {
                info!("{name}: {text}");
                ToolOutcome {
                    text,
                    is_error: false,
                }
            }
            Err(text) => {
                warn!("{name} failed: {text}");
                ToolOutcome {
                    text,
                    is_error: true,
                }
            }
        })
    }
}

fn encode(response: Response) -> Option<String> {
    match serde_json::to_string(&response) {
        Ok(line) => Some(line),
        Err(err) => {
            warn!("failed to serialize response: {err}");
            None
        }
    }
}

fn tool_definitions() -> Value {
    json!([
        {
            "name": "set_tuning_simulation",
            "description": "Update the tuning simulation in TouchDesigner. \
                error_level: 0.0 (perfect) to 1.0 (badly off). \
                force_intensity: strike force, 0.0 to 5.0.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "error_level": { "type": "number", "description": "Tuning error level (0.0 - 1.0)" },
                    "force_intensity": { "type": "number", "description": "Strike force (0.0 - 5.0)" }
                },
                "required": ["error_level", "force_intensity"]
            }
        },
        {
            "name": "reset_simulation",
            "description": "Reset the simulation to its initial state (zero error, zero force).",
            "inputSchema": { "type": "object", "properties": {} }
        }
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::UdpSocket;
    use std::time::Duration;
    use tuning_lab_core::osc::{ERROR_ADDRESS, FORCE_ADDRESS, OscMessage};

    fn server() -> (ToolServer, UdpSocket) {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        socket
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let port = socket.local_addr().unwrap().port();
        let control = SimulationControl::connect("127.0.0.1", port).unwrap();
        (ToolServer::new(control), socket)
    }

    fn reply(server: &ToolServer, line: &str) -> Value {
        serde_json::from_str(&server.handle_line(line).expect("reply")).unwrap()
    }

    fn recv(socket: &UdpSocket) -> OscMessage {
        let mut buf = [0u8; 256];
        let n = socket.recv(&mut buf).unwrap();
        OscMessage::decode(&buf[..n]).unwrap()
    }

    #[test]
    fn initialize_reports_server_info() {
        let (server, _socket) = server();
        let body = reply(&server, r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#);
        assert_eq!(body["id"], 1);
        assert_eq!(body["result"]["serverInfo"]["name"], SERVER_NAME);
        assert!(body["result"]["capabilities"]["tools"].is_object());
    }

    #[test]
    fn notifications_get_no_reply() {
        let (server, _socket) = server();
        assert!(
            server
                .handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
                .is_none()
        );
        assert!(server.handle_line("   ").is_none());
    }

    #[test]
    fn null_id_is_an_invalid_request() {
        let (server, socket) = server();
        let body = reply(
            &server,
            r#"{"jsonrpc":"2.0","id":null,"method":"tools/call","params":{"name":"reset_simulation","arguments":{}}}"#,
        );
        assert_eq!(body["error"]["code"], INVALID_REQUEST);
        assert_eq!(body["id"], Value::Null);

        // Rejected before dispatch, so nothing reaches the socket.
        socket
            .set_read_timeout(Some(Duration::from_millis(100)))
            .unwrap();
        let mut buf = [0u8; 64];
        assert!(socket.recv(&mut buf).is_err());
    }

    #[test]
    fn structured_ids_are_invalid_requests() {
        let (server, _socket) = server();
        let body = reply(&server, r#"{"jsonrpc":"2.0","id":{"n":1},"method":"ping"}"#);
        assert_eq!(body["error"]["code"], INVALID_REQUEST);

        let body = reply(&server, r#"{"jsonrpc":"2.0","id":"x-1","method":"ping"}"#);
        assert_eq!(body["id"], "x-1");
        assert_eq!(body["result"], json!({}));
    }

    #[test]
    fn lists_both_tools() {
        let (server, _socket) = server();
        let body = reply(&server, r#"{"jsonrpc":"2.0","id":"a","method":"tools/list"}"#);
        let names: Vec<&str> = body["result"]["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|tool| tool["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["set_tuning_simulation", "reset_simulation"]);
        assert_eq!(
            body["result"]["tools"][0]["inputSchema"]["properties"]["error_level"]["type"],
            "number"
        );
    }

    #[test]
    fn set_tuning_simulation_forwards_over_osc() {
        let (server, socket) = server();
        let body = reply(
            &server,
            r#"{"jsonrpc":"2.0","id":7,"method":"tools/call","params":{"name":"set_tuning_simulation","arguments":{"error_level":0.25,"force_intensity":1.5}}}"#,
        );
        assert_eq!(body["result"]["isError"], false);
        assert_eq!(
            body["result"]["content"][0]["text"],
            "TouchDesigner update sent: error=0.25, force=1.5"
        );
        assert_eq!(recv(&socket), OscMessage::float(ERROR_ADDRESS, 0.25));
        assert_eq!(recv(&socket), OscMessage::float(FORCE_ADDRESS, 1.5));
    }

    #[test]
    fn reset_sends_zeros() {
        let (server, socket) = server();
        let body = reply(
            &server,
            r#"{"jsonrpc":"2.0","id":8,"method":"tools/call","params":{"name":"reset_simulation"}}"#,
        );
        assert_eq!(body["result"]["content"][0]["text"], "Simulation reset complete.");
        assert_eq!(recv(&socket), OscMessage::float(ERROR_ADDRESS, 0.0));
        assert_eq!(recv(&socket), OscMessage::float(FORCE_ADDRESS, 0.0));
    }

    #[test]
    fn bad_arguments_are_tool_errors() {
        let (server, _socket) = server();
        let body = reply(
            &server,
            r#"{"jsonrpc":"2.0","id":9,"method":"tools/call","params":{"name":"set_tuning_simulation","arguments":{"error_level":"high"}}}"#,
        );
        assert_eq!(body["result"]["isError"], true);
        assert!(body.get("error").is_none());
    }

    #[test]
    fn protocol_errors_use_jsonrpc_codes() {
        let (server, _socket) = server();
        let body = reply(&server, "{not json");
        assert_eq!(body["error"]["code"], PARSE_ERROR);
        assert_eq!(body["id"], Value::Null);

        let body = reply(&server, r#"{"jsonrpc":"2.0","id":2,"method":"resources/list"}"#);
        assert_eq!(body["error"]["code"], METHOD_NOT_FOUND);

        let body = reply(&server, r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{}}"#);
        assert_eq!(body["error"]["code"], INVALID_PARAMS);

        let body = reply(
            &server,
            r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"explode"}}"#,
        );
        assert_eq!(body["error"]["code"], INVALID_PARAMS);
    }

    #[test]
    fn ping_returns_empty_object() {
        let (server, _socket) = server();
        let body = reply(&server, r#"{"jsonrpc":"2.0","id":5,"method":"ping"}"#);
        assert_eq!(body["result"], json!({}));
    }
}
