//! Persona tool: lets the assistant talk about itself.

use async_trait::async_trait;
use persanna_config::PersonaConfig;
use persanna_core::error::ToolError;
use persanna_core::tool::Tool;

pub struct PersonaTool {
    description: String,
}

impl PersonaTool {
    pub fn new(persona: &PersonaConfig) -> Self {
        Self {
            description: self_description(persona),
        }
    }
}

/// First-person summary of the persona.
pub fn self_description(p: &PersonaConfig) -> String {
    format!(
        "My Name {}, age {}, I am a {} Built By {}, I use {}. I am Powered by {}. I like {}. {}",
        p.name, p.age, p.role, p.built_by, p.tone, p.powered_by, p.likes, p.temperament
    )
}

#[async_trait]
impl Tool for PersonaTool {
    fn name(&self) -> &str {
        "persona"
    }

    fn description(&self) -> &str {
        "useful for when you need to find something on or summarize info about the AI, or to get \
         the AI to talk about itself or why it likes or does something. user should ask about the \
         AI, or ask the AI to talk about itself."
    }

    async fn invoke(&self, _input: &str) -> Result<String, ToolError> {
        Ok(self.description.clone())
    }
}
