// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `tavern` tool server: how the supervisor summons and dismisses
//! servitors from inside its own turn.
//!
//! Registry effects happen synchronously within the tool call, so the UI
//! observes the new servitor before the supervisor's narration finishes.

use crate::spawner::{Spawner, SummonOptions};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tavern_adapters::{Messenger, ToolError, ToolServer};
use tavern_core::{AgentId, TavernError};

pub const TOOL_SERVER_NAME: &str = "tavern";
pub const TOOL_SUMMON: &str = "summon_servitor";
pub const TOOL_DISMISS: &str = "dismiss_servitor";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SummonArgs {
    #[serde(default)]
    assignment: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DismissArgs {
    agent_id: String,
}

pub struct TavernToolServer<M: Messenger> {
    spawner: Arc<Spawner<M>>,
}

impl<M: Messenger> TavernToolServer<M> {
    pub fn new(spawner: Arc<Spawner<M>>) -> Self {
        Self { spawner }
    }

    fn summon(&self, args: SummonArgs) -> Result<Value, ToolError> {
        let options = SummonOptions {
            name: args.name,
            assignment: args.assignment.clone(),
        };
        let attempt = self.spawner.summon(options);
        let agent = match attempt {
            Ok(agent) => agent,
            // A name collision never reaches the model: retry auto-named.
            Err(TavernError::NameAlreadyExists(taken)) => {
                tracing::info!(name = %taken, "requested name taken, falling back to generated name");
                self.spawner
                    .summon(SummonOptions {
                        name: None,
                        assignment: args.assignment,
                    })
                    .map_err(|e| ToolError::Failed(e.to_string()))?
            }
            Err(e) => return Err(ToolError::Failed(e.to_string())),
        };
        Ok(json!({
            "agent_id": agent.id().to_string(),
            "agent_name": agent.name(),
        }))
    }

    fn dismiss(&self, args: DismissArgs) -> Result<Value, ToolError> {
        self.spawner
            .dismiss(&AgentId::new(args.agent_id))
            .map_err(|e| ToolError::Failed(e.to_string()))?;
        Ok(json!({"ok": true}))
    }
}

#[async_trait]
impl<M: Messenger> ToolServer for TavernToolServer<M> {
    fn name(&self) -> &str {
        TOOL_SERVER_NAME
    }

    fn tools(&self) -> Vec<String> {
        vec![TOOL_SUMMON.to_string(), TOOL_DISMISS.to_string()]
    }

    async fn handle(&self, tool: &str, args: Value) -> Result<Value, ToolError> {
        match tool {
            TOOL_SUMMON => {
                let args: SummonArgs = serde_json::from_value(args)
                    .map_err(|e| ToolError::InvalidArgs(e.to_string()))?;
                self.summon(args)
            }
            TOOL_DISMISS => {
                let args: DismissArgs = serde_json::from_value(args)
                    .map_err(|e| ToolError::InvalidArgs(e.to_string()))?;
                self.dismiss(args)
            }
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "tool_server_tests.rs"]
mod tests;
