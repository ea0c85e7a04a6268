//! Contracts for the agent's own built-in actions.
//!
//! Some of these declare a tier above what their permissions imply:
//! restarting the agent only needs `process:spawn` but loses in-flight state.

use crate::contract::{SideEffect, ToolContract};
use crate::risk::RiskClass;
use crate::schema::{ParamSpec, ParamType};

const BUILTIN_TAG: &str = "builtin";

pub fn builtin_contracts() -> Vec<ToolContract> {
    let specs = [
        ToolContract::builder("RESTART_AGENT")
            .description("Restart the agent process")
            .permission("process:spawn")
            .risk(RiskClass::Irreversible)
            .param(
                "reason",
                ParamSpec::optional(ParamType::String).describe("Why the restart is needed"),
            )
            .param(
                "delayMs",
                ParamSpec::optional(ParamType::Integer).describe("Delay before restarting"),
            )
            .side_effect(SideEffect::new(
                "Terminates in-flight conversations and unsaved state",
                "agent-process",
                false,
            ))
            .timeout_ms(60_000),
        ToolContract::builder("SEND_MESSAGE")
            .description("Send a message to a user or channel")
            .permission("message:send")
            .param("target", ParamSpec::required(ParamType::String).describe("Recipient id"))
            .param("text", ParamSpec::required(ParamType::String).describe("Message body"))
            .param("channel", ParamSpec::optional(ParamType::String))
            .side_effect(SideEffect::new("Delivers a message", "message-channel", true)),
        ToolContract::builder("SEARCH_MEMORY")
            .description("Search the agent's long-term memory")
            .permission("memory:read")
            .param("query", ParamSpec::required(ParamType::String))
            .param("limit", ParamSpec::optional(ParamType::Integer)),
        ToolContract::builder("WRITE_MEMORY")
            .description("Persist a memory record")
            .permission("memory:write")
            .param("content", ParamSpec::required(ParamType::String))
            .param("tags", ParamSpec::optional(ParamType::Array))
            .side_effect(SideEffect::new("Adds a memory record", "memory-store", true)),
        ToolContract::builder("READ_FILE")
            .description("Read a file from the agent workspace")
            .permission("fs:read")
            .param("path", ParamSpec::required(ParamType::String)),
        ToolContract::builder("WRITE_FILE")
            .description("Write a file anywhere on the host filesystem")
            .permission("fs:write:any")
            .param("path", ParamSpec::required(ParamType::String))
            .param("content", ParamSpec::required(ParamType::String))
            .param(
                "mode",
                ParamSpec::optional(ParamType::String).one_of(["overwrite", "append"]),
            )
            .side_effect(SideEffect::new("Overwrites file contents", "filesystem", false)),
        ToolContract::builder("RUN_SHELL_COMMAND")
            .description("Execute a shell command on the host")
            .permission("process:shell")
            .param("command", ParamSpec::required(ParamType::String))
            .param("cwd", ParamSpec::optional(ParamType::String))
            .side_effect(SideEffect::new("Arbitrary host side effects", "host", false))
            .timeout_ms(120_000),
        ToolContract::builder("SCHEDULE_TASK")
            .description("Schedule a task for later execution")
            .permission("scheduler:write")
            .param("task", ParamSpec::required(ParamType::String))
            .param("at", ParamSpec::required(ParamType::String).describe("RFC 3339 timestamp"))
            .side_effect(SideEffect::new("Adds a scheduled task", "scheduler", true)),
    ];

    specs
        .into_iter()
        .filter_map(|builder| builder.tag(BUILTIN_TAG).build().ok())
        .collect()
}
