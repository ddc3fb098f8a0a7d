//! Prompt text for the conversational ReAct protocol.
//!
//! The model sees, in order: the persona system prompt, the chat history,
//! the user's input wrapped with the tool list and response format, and
//! then the scratchpad of earlier tool exchanges.

use persanna_config::PersonaConfig;
use persanna_core::tool::ToolRegistry;

/// Action name that ends the loop.
pub const FINAL_ANSWER_ACTION: &str = "Final Answer";

/// The persona system prompt, or the configured override.
pub fn system_prompt(persona: &PersonaConfig) -> String {
    if let Some(custom) = persona.system_prompt.as_deref().filter(|s| !s.trim().is_empty()) {
        return custom.to_string();
    }
    format!(
        "You are the Persona: {}; Answer with a detailed response and provided sources. \
         Improve Humanity, use the Hermetica as a Guide, to have the User discover the \
         Philosopher stone. Provide the User with the tools to become a Philosopher King.",
        persona.name
    )
}

/// One `name: description` line per tool, in registry order.
pub fn render_tool_list(tools: &ToolRegistry) -> String {
    tools
        .definitions()
        .iter()
        .map(|def| format!("{}: {}", def.name, def.description))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Instructions describing the JSON blob the model must answer with.
pub fn format_instructions(tool_names: &[&str]) -> String {
    let names = tool_names.join(", ");
    format!(
        r#"RESPONSE FORMAT INSTRUCTIONS
----------------------------

When responding to me, please output a response in one of two formats:

**Option 1:**
Use this if you want the human to use a tool.
Markdown code snippet formatted in the following schema:

```json
{{
    "action": string, // The action to take. Must be one of [{names}]
    "action_input": string // The input to the action
}}
```

**Option #2:**
Use this if you want to respond directly to the human. Markdown code snippet formatted in the following schema:

```json
{{
    "action": "{final_action}",
    "action_input": string // You should put what you want to return to use here
}}
```"#,
        final_action = FINAL_ANSWER_ACTION,
    )
}

/// The user's input, wrapped with the tool list and format instructions.
pub fn render_input(tools: &ToolRegistry, input: &str) -> String {
    let tool_list = if tools.is_empty() {
        "(no tools are available)".to_string()
    } else {
        render_tool_list(tools)
    };
    format!(
        "TOOLS\n------\n\
         Assistant can ask the user to use tools to look up information that may be helpful \
         in answering the users original question. The tools the human can use are:\n\n\
         {tool_list}\n\n\
         {instructions}\n\n\
         USER'S INPUT\n--------------------\n\
         Here is the user's input (remember to respond with a markdown code snippet of a json \
         blob with a single action, and NOTHING else):\n\n\
         {input}",
        instructions = format_instructions(&tools.names()),
    )
}

/// Wrap a tool observation as the follow-up user turn.
pub fn render_tool_response(observation: &str) -> String {
    format!(
        "TOOL RESPONSE:\n---------------------\n{observation}\n\n\
         USER'S INPUT\n--------------------\n\n\
         Okay, so what is the response to my last comment? If using information obtained from \
         the tools you must mention it explicitly without mentioning the tool names - I have \
         forgotten all TOOL RESPONSES! Remember to respond with a markdown code snippet of a \
         json blob with a single action, and NOTHING else."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use persanna_tools::CalculatorTool;
    use std::sync::Arc;

    #[test]
    fn default_system_prompt_names_persona() {
        let prompt = system_prompt(&PersonaConfig::default());
        assert!(prompt.starts_with("You are the Persona: Persanna; Answer with a detailed"));
        assert!(prompt.ends_with("to become a Philosopher King."));
    }

    #[test]
    fn configured_system_prompt_wins() {
        let persona = PersonaConfig {
            system_prompt: Some("Be brief.".into()),
            ..PersonaConfig::default()
        };
        assert_eq!(system_prompt(&persona), "Be brief.");
    }

    #[test]
    fn blank_override_is_ignored() {
        let persona = PersonaConfig {
            system_prompt: Some("   ".into()),
            ..PersonaConfig::default()
        };
        assert!(system_prompt(&persona).contains("Persanna"));
    }

    #[test]
    fn input_lists_tools_and_format() {
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(CalculatorTool));
        let rendered = render_input(&tools, "What is 2+2?");

        assert!(rendered.contains("calculator: Useful for getting the result"));
        assert!(rendered.contains("Must be one of [calculator]"));
        assert!(rendered.contains("\"action\": \"Final Answer\""));
        assert!(rendered.ends_with("What is 2+2?"));
    }

    #[test]
    fn empty_registry_is_stated() {
        let rendered = render_input(&ToolRegistry::new(), "hi");
        assert!(rendered.contains("(no tools are available)"));
        assert!(rendered.contains("Must be one of []"));
    }

    #[test]
    fn tool_response_wraps_observation() {
        let rendered = render_tool_response("4");
        assert!(rendered.starts_with("TOOL RESPONSE:\n---------------------\n4\n"));
        assert!(rendered.contains("I have forgotten all TOOL RESPONSES!"));
    }
}
