use colloquy_llm::{
    Assistant, AssistantError, AssistantId, AssistantRequest, AssistantUpdate, AssistantsApi,
    Result,
};
use std::ops::RangeInclusive;
use std::sync::Arc;

pub const TEMPERATURE_RANGE: RangeInclusive<f32> = 0.0..=2.0;
pub const LIST_LIMIT_RANGE: RangeInclusive<u8> = 1..=100;

/// Creates, reads and updates assistant configuration
#[derive(Clone)]
pub struct AssistantRegistry {
    api: Arc<dyn AssistantsApi>,
}

impl AssistantRegistry {
    pub fn new(api: Arc<dyn AssistantsApi>) -> Self {
        Self { api }
    }

    pub async fn create(&self, request: &AssistantRequest) -> Result<AssistantId> {
        if let Some(temperature) = request.temperature {
            validate_temperature(temperature)?;
        }

        let assistant = self.api.create_assistant(request).await?;
        if assistant.id.is_empty() {
            return Err(AssistantError::Protocol(
                "create assistant response has an empty id".to_string(),
            ));
        }

        tracing::info!(assistant_id = %assistant.id, model = %assistant.model, "Assistant created");
        Ok(assistant.id)
    }

    pub async fn get(&self, id: &AssistantId) -> Result<Assistant> {
        self.api.get_assistant(id).await
    }

    /// Most recently created assistants first
    pub async fn list(&self, limit: u8) -> Result<Vec<Assistant>> {
        if !LIST_LIMIT_RANGE.contains(&limit) {
            return Err(AssistantError::Validation(format!(
                "list limit must be between {} and {}, got {}",
                LIST_LIMIT_RANGE.start(),
                LIST_LIMIT_RANGE.end(),
                limit
            )));
        }
        self.api.list_assistants(limit).await
    }

    pub async fn set_temperature(&self, id: &AssistantId, value: f32) -> Result<()> {
        validate_temperature(value)?;
        self.update(id, AssistantUpdate::new().temperature(value)).await
    }

    pub async fn set_description(&self, id: &AssistantId, text: &str) -> Result<()> {
        self.update(id, AssistantUpdate::new().description(text)).await
    }

    pub async fn set_instructions(&self, id: &AssistantId, text: &str) -> Result<()> {
        self.update(id, AssistantUpdate::new().instructions(text)).await
    }

    async fn update(&self, id: &AssistantId, update: AssistantUpdate) -> Result<()> {
        if id.is_empty() {
            return Err(AssistantError::Precondition("assistant id is not set".to_string()));
        }
        self.api.update_assistant(id, &update).await?;
        tracing::debug!(assistant_id = %id, "Assistant updated");
        Ok(())
    }
}

fn validate_temperature(value: f32) -> Result<()> {
    // NaN fails the range check too
    if TEMPERATURE_RANGE.contains(&value) {
        Ok(())
    } else {
        Err(AssistantError::Validation(format!(
            "temperature must be between 0 and 2, got {}",
            value
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temperature_bounds() {
        assert!(validate_temperature(0.0).is_ok());
        assert!(validate_temperature(2.0).is_ok());
        assert!(validate_temperature(0.7).is_ok());
        assert!(validate_temperature(-0.1).is_err());
        assert!(validate_temperature(2.5).is_err());
        assert!(validate_temperature(f32::NAN).is_err());
    }
}
