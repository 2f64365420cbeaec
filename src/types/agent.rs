//! Agent definitions and the tool definitions attached to them.

use std::collections::HashMap;

use bon::Builder;
use serde::{Deserialize, Serialize};

/// Request body for creating an agent.
#[derive(Debug, Clone, Builder, Serialize, Deserialize, PartialEq)]
pub struct AgentDefinition {
    /// Model deployment the agent runs on.
    #[builder(into)]
    pub model: String,
    #[builder(into)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[builder(into)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[builder(default)]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_resources: Option<ToolResources>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[builder(default)]
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

/// An agent as stored by the service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Agent {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub model: String,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub tools: Vec<ToolDefinition>,
    #[serde(default)]
    pub created_at: i64,
}

/// Tool definition in the service's wire format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolDefinition {
    CodeInterpreter,
    FileSearch,
    BingGrounding { bing_grounding: ConnectionList },
    Function { function: FunctionDefinition },
}

impl ToolDefinition {
    /// Web search grounded through a project connection.
    pub fn bing_grounding(connection_id: impl Into<String>) -> Self {
        Self::BingGrounding {
            bing_grounding: ConnectionList {
                connections: vec![ToolConnection {
                    connection_id: connection_id.into(),
                }],
            },
        }
    }

    /// Wire name of the tool type.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CodeInterpreter => "code_interpreter",
            Self::FileSearch => "file_search",
            Self::BingGrounding { .. } => "bing_grounding",
            Self::Function { .. } => "function",
        }
    }
}

/// Connections a connected tool is allowed to use.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionList {
    pub connections: Vec<ToolConnection>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolConnection {
    pub connection_id: String,
}

/// Function tool schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Data sources bound to an agent's tools.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ToolResources {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_interpreter: Option<CodeInterpreterResource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_search: Option<FileSearchResource>,
}

impl ToolResources {
    pub fn is_empty(&self) -> bool {
        self.code_interpreter.is_none() && self.file_search.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CodeInterpreterResource {
    #[serde(default)]
    pub file_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FileSearchResource {
    #[serde(default)]
    pub vector_store_ids: Vec<String>,
}

/// A project connection to an external service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Connection {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub properties: serde_json::Value,
}
