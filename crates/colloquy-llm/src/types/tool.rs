use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// Tool enabled on an assistant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssistantTool {
    /// Retrieval over files attached to the assistant
    FileSearch,

    CodeInterpreter,

    Function {
        function: FunctionDefinition,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// JSON Schema for parameters
    pub parameters: Value,
}

impl AssistantTool {
    /// Wire name of the tool type
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FileSearch => "file_search",
            Self::CodeInterpreter => "code_interpreter",
            Self::Function { .. } => "function",
        }
    }
}

impl FromStr for AssistantTool {
    type Err = String;

    /// Parses the built-in tool names used in configuration files.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "file_search" | "retrieval" => Ok(Self::FileSearch),
            "code_interpreter" => Ok(Self::CodeInterpreter),
            other => Err(format!("unknown assistant tool '{}'", other)),
        }
    }
}
