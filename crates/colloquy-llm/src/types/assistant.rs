use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::AssistantId;
use super::tool::AssistantTool;

/// Assistant as returned by the remote service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assistant {
    pub id: AssistantId,
    #[serde(default)]
    pub name: Option<String>,
    pub model: String,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub tools: Vec<AssistantTool>,
    pub created_at: i64,
}

impl Assistant {
    pub fn created(&self) -> DateTime<Utc> {
        super::timestamp(self.created_at)
    }
}

/// Payload for `POST /assistants`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantRequest {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<AssistantTool>,
}

impl AssistantRequest {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            name: None,
            instructions: None,
            description: None,
            temperature: None,
            tools: Vec::new(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn tool(mut self, tool: AssistantTool) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn tools(mut self, tools: Vec<AssistantTool>) -> Self {
        self.tools = tools;
        self
    }
}

/// Payload for `POST /assistants/{id}`; only the set fields are sent
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssistantUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<AssistantTool>>,
}

impl AssistantUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_none()
            && self.description.is_none()
            && self.temperature.is_none()
            && self.tools.is_none()
    }
}
