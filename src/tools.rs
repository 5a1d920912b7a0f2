//! MCP tool definitions and handlers for Pmon manager control.
//!
//! Each tool is defined as a JSON schema (returned by [`tool_definitions`])
//! and handled by an async function dispatched from [`handle_tool_call`].
//!
//! ## Tool categories
//!
//! **Read tools** query the daemon over the control port:
//! - `get-manager-status`, `list-managers`, `get-manager-properties`
//!
//! **Lifecycle tools** act on one manager by index:
//! - `start-manager`, `stop-manager`, `kill-manager`
//!
//! **Configuration tools** edit the daemon's manager table:
//! - `add-manager`, `remove-manager`, `update-manager-properties`
//!
//! The listing tools mark the row whose manager number belongs to the
//! process serving these tools with `"self": true`, so an agent can see
//! when a stop or kill would take down its own tool server.

use serde_json::{json, Value};
use tracing::debug;

use crate::client::{CommandOutcome, PmonClient};
use crate::identity::OwnManagerResolver;
use crate::state::{merge_overview, start_mode_label, state_label};
use crate::types::ManagerProperties;

/// Shared state handed to every tool call: one client per daemon and the
/// process-wide own-manager resolver.
pub struct ToolContext {
    client: PmonClient,
    resolver: OwnManagerResolver,
}

impl ToolContext {
    pub fn new(client: PmonClient) -> Self {
        Self {
            client,
            resolver: OwnManagerResolver::new(),
        }
    }
}

/// Returns the manager tool definitions in MCP shape.
pub fn tool_definitions() -> Vec<Value> {
    vec![
        json!({
            "name": "get-manager-status",
            "description": "Get the runtime status of all managers from the Pmon process monitor: state, PID, start mode, start time, and manager number per row, plus the overall daemon mode (e.g. RUNNING) and the emergency/demo flags. Rows marked \"self\": true belong to the process serving these tools.",
            "inputSchema": {
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }
        }),
        json!({
            "name": "list-managers",
            "description": "List all configured managers with their start configuration (start mode, kill wait, restart count, reset minutes, command-line options), merged with live runtime state where a status row exists for the same index. Rows marked \"self\": true belong to the process serving these tools.",
            "inputSchema": {
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }
        }),
        json!({
            "name": "start-manager",
            "description": "Start the manager at the given index. Indices are row numbers from get-manager-status or list-managers and shift when entries are added or removed, so re-read the list before acting on a stale index.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "index": {
                        "type": "integer",
                        "description": "Manager index from get-manager-status or list-managers."
                    }
                },
                "required": ["index"],
                "additionalProperties": false
            }
        }),
        json!({
            "name": "stop-manager",
            "description": "Stop the manager at the given index gracefully. Pmon escalates to a kill if the manager has not exited after its configured kill wait. Stopping a row marked \"self\" stops the tool server itself.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "index": {
                        "type": "integer",
                        "description": "Manager index from get-manager-status or list-managers."
                    }
                },
                "required": ["index"],
                "additionalProperties": false
            }
        }),
        json!({
            "name": "kill-manager",
            "description": "Kill the manager at the given index immediately, without a graceful shutdown. Killing a row marked \"self\" kills the tool server itself.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "index": {
                        "type": "integer",
                        "description": "Manager index from get-manager-status or list-managers."
                    }
                },
                "required": ["index"],
                "additionalProperties": false
            }
        }),
        json!({
            "name": "add-manager",
            "description": "Append a new manager entry to the Pmon configuration and return the daemon's acknowledgement. The entry is inserted at the given index (1 to 100).",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "index": {
                        "type": "integer",
                        "description": "Slot to insert the entry at (1 to 100)."
                    },
                    "manager": {
                        "type": "string",
                        "description": "Manager executable name, e.g. WCCOActrl."
                    },
                    "start_mode": {
                        "type": "string",
                        "description": "Start mode: manual, once, or always."
                    },
                    "sec_kill": {
                        "type": "integer",
                        "description": "Seconds Pmon waits after a stop before killing the manager."
                    },
                    "restart_count": {
                        "type": "integer",
                        "description": "Restart attempts before Pmon blocks the manager."
                    },
                    "reset_min": {
                        "type": "integer",
                        "description": "Minutes after which the restart counter resets."
                    },
                    "commandline_options": {
                        "type": "string",
                        "description": "Command-line options passed to the manager. Omit for none."
                    }
                },
                "required": ["index", "manager", "start_mode", "sec_kill", "restart_count", "reset_min"],
                "additionalProperties": false
            }
        }),
        json!({
            "name": "remove-manager",
            "description": "Remove the manager entry at the given index from the Pmon configuration. Later entries move up, so indices held from earlier listings go stale.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "index": {
                        "type": "integer",
                        "description": "Manager index from get-manager-status or list-managers."
                    }
                },
                "required": ["index"],
                "additionalProperties": false
            }
        }),
        json!({
            "name": "get-manager-properties",
            "description": "Get the start configuration of one manager: start mode, kill wait seconds, restart count, reset minutes, and command-line options.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "index": {
                        "type": "integer",
                        "description": "Manager index from get-manager-status or list-managers."
                    }
                },
                "required": ["index"],
                "additionalProperties": false
            }
        }),
        json!({
            "name": "update-manager-properties",
            "description": "Replace the start configuration of the manager at the given index. All numeric fields must be supplied; the daemon decides which tuning values it accepts.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "index": {
                        "type": "integer",
                        "description": "Manager index from get-manager-status or list-managers."
                    },
                    "start_mode": {
                        "type": "string",
                        "description": "Start mode: manual, once, or always."
                    },
                    "sec_kill": {
                        "type": "integer",
                        "description": "Seconds Pmon waits after a stop before killing the manager."
                    },
                    "restart_count": {
                        "type": "integer",
                        "description": "Restart attempts before Pmon blocks the manager."
                    },
                    "reset_min": {
                        "type": "integer",
                        "description": "Minutes after which the restart counter resets."
                    },
                    "commandline_options": {
                        "type": "string",
                        "description": "Command-line options passed to the manager. Omit for none."
                    }
                },
                "required": ["index", "start_mode", "sec_kill", "restart_count", "reset_min"],
                "additionalProperties": false
            }
        }),
    ]
}

/// Handle a tool call and return MCP content.
pub async fn handle_tool_call(name: &str, args: &Value, ctx: &ToolContext) -> ToolResult {
    match name {
        "get-manager-status" => handle_manager_status(ctx).await,
        "list-managers" => handle_list_managers(ctx).await,
        "start-manager" => handle_start_manager(args, ctx).await,
        "stop-manager" => handle_stop_manager(args, ctx).await,
        "kill-manager" => handle_kill_manager(args, ctx).await,
        "add-manager" => handle_add_manager(args, ctx).await,
        "remove-manager" => handle_remove_manager(args, ctx).await,
        "get-manager-properties" => handle_manager_properties(args, ctx).await,
        "update-manager-properties" => handle_update_properties(args, ctx).await,
        _ => ToolResult::error(format!("Unknown tool: {name}")),
    }
}

/// Result of an MCP tool call, ready to be serialized into a JSON-RPC response.
pub struct ToolResult {
    /// MCP content blocks (a single `{"type":"text","text":"..."}` entry).
    pub content: Vec<Value>,
    /// Whether the tool call failed (maps to `isError` in the MCP response).
    pub is_error: bool,
}

impl ToolResult {
    fn success(value: Value) -> Self {
        let text = serde_json::to_string_pretty(&value).unwrap_or_default();
        Self {
            content: vec![json!({ "type": "text", "text": text })],
            is_error: false,
        }
    }

    fn error(message: String) -> Self {
        Self {
            content: vec![json!({ "type": "text", "text": message })],
            is_error: true,
        }
    }
}

fn u32_param(args: &Value, name: &str) -> Option<u32> {
    args.get(name)
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
}

fn str_param<'a>(args: &'a Value, name: &str) -> Option<&'a str> {
    args.get(name).and_then(Value::as_str)
}

/// Own manager number, or `None` when the lookup fails; identity is an
/// annotation, never a reason to fail the tool call that asked for it.
async fn resolved_own(ctx: &ToolContext) -> Option<i32> {
    match ctx.resolver.resolve_cached(&ctx.client).await {
        Ok(own) => own,
        Err(e) => {
            debug!("Own-manager resolution unavailable: {e}");
            None
        }
    }
}

async fn handle_manager_status(ctx: &ToolContext) -> ToolResult {
    let status = match ctx.client.manager_status().await {
        Ok(s) => s,
        Err(e) => return ToolResult::error(e.to_string()),
    };
    let own = resolved_own(ctx).await;

    let managers: Vec<Value> = status
        .managers
        .iter()
        .map(|m| {
            let mut row = json!({
                "index": m.index,
                "state": m.state,
                "state_label": state_label(m.state),
                "pid": m.pid,
                "start_mode": m.start_mode,
                "start_mode_label": start_mode_label(m.start_mode),
                "start_time": m.start_time,
                "man_num": m.man_num,
            });
            if own == Some(m.man_num) {
                row["self"] = json!(true);
            }
            row
        })
        .collect();

    ToolResult::success(json!({
        "managers": managers,
        "mode_numeric": status.mode_numeric,
        "mode_string": status.mode_string,
        "emergency_active": status.emergency_active,
        "demo_mode_active": status.demo_mode_active,
    }))
}

async fn handle_list_managers(ctx: &ToolContext) -> ToolResult {
    let list = match ctx.client.manager_list().await {
        Ok(l) => l,
        Err(e) => return ToolResult::error(e.to_string()),
    };
    let status = match ctx.client.manager_status().await {
        Ok(s) => s,
        Err(e) => return ToolResult::error(e.to_string()),
    };
    let own = resolved_own(ctx).await;

    let managers: Vec<Value> = merge_overview(&list, &status)
        .iter()
        .map(|row| {
            let mut value = json!(row);
            if own.is_some() && row.man_num == own {
                value["self"] = json!(true);
            }
            value
        })
        .collect();

    let count = managers.len();
    ToolResult::success(json!({ "managers": managers, "count": count }))
}

async fn handle_manager_properties(args: &Value, ctx: &ToolContext) -> ToolResult {
    let index = match u32_param(args, "index") {
        Some(i) => i,
        None => return ToolResult::error("Missing required parameter: index".into()),
    };
    match ctx.client.manager_properties(index).await {
        Ok(props) => ToolResult::success(json!({ "index": index, "properties": props })),
        Err(e) => ToolResult::error(e.to_string()),
    }
}

async fn handle_start_manager(args: &Value, ctx: &ToolContext) -> ToolResult {
    let index = match u32_param(args, "index") {
        Some(i) => i,
        None => return ToolResult::error("Missing required parameter: index".into()),
    };
    outcome_result(ctx.client.start_manager(index).await)
}

async fn handle_stop_manager(args: &Value, ctx: &ToolContext) -> ToolResult {
    let index = match u32_param(args, "index") {
        Some(i) => i,
        None => return ToolResult::error("Missing required parameter: index".into()),
    };
    outcome_result(ctx.client.stop_manager(index).await)
}

async fn handle_kill_manager(args: &Value, ctx: &ToolContext) -> ToolResult {
    let index = match u32_param(args, "index") {
        Some(i) => i,
        None => return ToolResult::error("Missing required parameter: index".into()),
    };
    outcome_result(ctx.client.kill_manager(index).await)
}

async fn handle_remove_manager(args: &Value, ctx: &ToolContext) -> ToolResult {
    let index = match u32_param(args, "index") {
        Some(i) => i,
        None => return ToolResult::error("Missing required parameter: index".into()),
    };
    outcome_result(ctx.client.remove_manager(index).await)
}

async fn handle_add_manager(args: &Value, ctx: &ToolContext) -> ToolResult {
    let index = match u32_param(args, "index") {
        Some(i) => i,
        None => return ToolResult::error("Missing required parameter: index".into()),
    };
    let manager = match str_param(args, "manager") {
        Some(m) => m,
        None => return ToolResult::error("Missing required parameter: manager".into()),
    };
    let props = match properties_params(args) {
        Ok(p) => p,
        Err(r) => return r,
    };
    outcome_result(ctx.client.add_manager(index, manager, &props).await)
}

async fn handle_update_properties(args: &Value, ctx: &ToolContext) -> ToolResult {
    let index = match u32_param(args, "index") {
        Some(i) => i,
        None => return ToolResult::error("Missing required parameter: index".into()),
    };
    let props = match properties_params(args) {
        Ok(p) => p,
        Err(r) => return r,
    };
    outcome_result(ctx.client.update_manager_properties(index, &props).await)
}

/// Extract the shared property parameters of `add-manager` and
/// `update-manager-properties`.
fn properties_params(args: &Value) -> Result<ManagerProperties, ToolResult> {
    let start_mode = match str_param(args, "start_mode") {
        Some(m) => m,
        None => return Err(ToolResult::error("Missing required parameter: start_mode".into())),
    };
    let sec_kill = match u32_param(args, "sec_kill") {
        Some(v) => v,
        None => return Err(ToolResult::error("Missing required parameter: sec_kill".into())),
    };
    let restart_count = match u32_param(args, "restart_count") {
        Some(v) => v,
        None => {
            return Err(ToolResult::error(
                "Missing required parameter: restart_count".into(),
            ))
        }
    };
    let reset_min = match u32_param(args, "reset_min") {
        Some(v) => v,
        None => return Err(ToolResult::error("Missing required parameter: reset_min".into())),
    };
    Ok(ManagerProperties {
        start_mode: start_mode.to_string(),
        sec_kill,
        restart_count,
        reset_min,
        commandline_options: str_param(args, "commandline_options")
            .unwrap_or_default()
            .to_string(),
    })
}

fn outcome_result(outcome: CommandOutcome) -> ToolResult {
    if outcome.success {
        ToolResult::success(json!(outcome))
    } else {
        ToolResult::error(outcome.error.unwrap_or_else(|| "Command failed".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PmonConfig;

    fn ctx() -> ToolContext {
        ToolContext::new(PmonClient::new(PmonConfig::default()))
    }

    fn text_of(result: &ToolResult) -> &str {
        result.content[0]["text"].as_str().unwrap()
    }

    #[test]
    fn definitions_cover_all_nine_tools() {
        let defs = tool_definitions();
        let names: Vec<&str> = defs
            .iter()
            .map(|d| d["name"].as_str().unwrap())
            .collect();
        assert_eq!(
            names,
            vec![
                "get-manager-status",
                "list-managers",
                "start-manager",
                "stop-manager",
                "kill-manager",
                "add-manager",
                "remove-manager",
                "get-manager-properties",
                "update-manager-properties",
            ]
        );
    }

    #[test]
    fn definitions_declare_their_required_parameters() {
        let defs = tool_definitions();
        let add = defs.iter().find(|d| d["name"] == "add-manager").unwrap();
        let required: Vec<&str> = add["inputSchema"]["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(
            required,
            vec!["index", "manager", "start_mode", "sec_kill", "restart_count", "reset_min"]
        );

        let status = defs
            .iter()
            .find(|d| d["name"] == "get-manager-status")
            .unwrap();
        assert!(status["inputSchema"].get("required").is_none());
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error() {
        let result = handle_tool_call("frobnicate", &json!({}), &ctx()).await;
        assert!(result.is_error);
        assert_eq!(text_of(&result), "Unknown tool: frobnicate");
    }

    #[tokio::test]
    async fn missing_index_is_reported_before_any_io() {
        for tool in [
            "start-manager",
            "stop-manager",
            "kill-manager",
            "remove-manager",
            "get-manager-properties",
            "add-manager",
            "update-manager-properties",
        ] {
            let result = handle_tool_call(tool, &json!({}), &ctx()).await;
            assert!(result.is_error, "{tool} accepted empty arguments");
            assert_eq!(text_of(&result), "Missing required parameter: index");
        }
    }

    #[tokio::test]
    async fn wrong_parameter_type_counts_as_missing() {
        let result = handle_tool_call("start-manager", &json!({ "index": "five" }), &ctx()).await;
        assert!(result.is_error);
        assert_eq!(text_of(&result), "Missing required parameter: index");
    }

    #[tokio::test]
    async fn add_manager_reports_the_first_missing_property() {
        let args = json!({ "index": 3, "manager": "WCCOActrl" });
        let result = handle_tool_call("add-manager", &args, &ctx()).await;
        assert!(result.is_error);
        assert_eq!(text_of(&result), "Missing required parameter: start_mode");
    }
}
