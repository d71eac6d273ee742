//! Callable tools exposed to the language model.

use crate::error::AgentError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Per-call context handed to a tool.
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub job_id: String,
    pub room: String,
    pub call_id: String,
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    /// JSON Schema describing the tool arguments.
    fn parameters_schema(&self) -> Value;
    async fn execute(&self, ctx: &ToolContext, args: Value) -> Result<Value, AgentError>;
}

/// Tool/function definition advertised to the reasoning model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Result of a tool call, returned to the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub output: Value,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolOutput {
    pub fn success(output: Value) -> Self {
        Self {
            output,
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            output: Value::String(message.into()),
            is_error: true,
        }
    }
}

/// The set of tools an agent exposes.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.tools.iter().map(|t| t.name()))
            .finish()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

    /// Registers a tool, replacing any earlier tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.retain(|t| t.name() != tool.name());
        self.tools.push(tool);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters_schema(),
            })
            .collect()
    }

    /// Runs the named tool. Failures become error outputs so the model can
    /// recover instead of the session ending.
    pub async fn call(&self, ctx: &ToolContext, name: &str, args: Value) -> ToolOutput {
        let Some(tool) = self.get(name) else {
            tracing::warn!(tool = name, call_id = %ctx.call_id, "model called an unknown tool");
            return ToolOutput::error(AgentError::UnknownTool(name.to_string()).to_string());
        };

        match tool.execute(ctx, args).await {
            Ok(output) => ToolOutput::success(output),
            Err(e) => {
                tracing::warn!(tool = name, call_id = %ctx.call_id, "tool call failed: {}", e);
                ToolOutput::error(e.to_string())
            }
        }
    }
}
