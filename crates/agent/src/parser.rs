//! Output parser: turns a model reply into the loop's next step.
//!
//! Two reply shapes are understood. The conversational protocol puts a
//! ```` ```json ```` blob with `action` / `action_input` in the message text;
//! providers with native function calling return `tool_calls` instead. Only
//! the first native call of a reply is acted on.

use crate::prompt::FINAL_ANSWER_ACTION;
use persanna_core::error::AgentError;
use persanna_core::event::preview;
use persanna_core::message::{Message, MessageToolCall};
use serde_json::Value;
use tracing::debug;

/// The model's decision for one iteration.
#[derive(Debug, Clone)]
pub enum AgentStep {
    ToolCall(ToolInvocation),
    FinalAnswer { text: String },
}

/// A request to run one tool.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    pub tool_name: String,
    pub tool_input: String,
    /// Text the model wrote around its request
    pub thought: String,
    /// The provider's call, when the reply used native tool calling
    pub native_call: Option<MessageToolCall>,
}

/// Parse a model reply. A reply that fits neither shape is fatal.
pub fn parse_reply(message: &Message) -> Result<AgentStep, AgentError> {
    if let Some(call) = message.tool_calls.first() {
        if message.tool_calls.len() > 1 {
            debug!(
                ignored = message.tool_calls.len() - 1,
                "Reply requested several tools; running the first"
            );
        }
        return Ok(AgentStep::ToolCall(ToolInvocation {
            tool_name: call.name.clone(),
            tool_input: native_input(&call.arguments),
            thought: message.content.trim().to_string(),
            native_call: Some(call.clone()),
        }));
    }
    parse_text(&message.content)
}

/// Parse the JSON-blob protocol from reply text.
pub fn parse_text(text: &str) -> Result<AgentStep, AgentError> {
    let (start, blob) = extract_json_blob(text)
        .ok_or_else(|| AgentError::Parse(format!("no JSON action in reply: {}", preview(text, 200))))?;

    let value: Value = serde_json::from_str(blob)
        .map_err(|e| AgentError::Parse(format!("{e}: {}", preview(blob, 200))))?;

    let action = value
        .get("action")
        .and_then(Value::as_str)
        .map(str::trim)
        .ok_or_else(|| AgentError::Parse("reply is missing a string \"action\"".into()))?;

    let input = match value.get("action_input") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };

    if action == FINAL_ANSWER_ACTION {
        return Ok(AgentStep::FinalAnswer { text: input });
    }

    Ok(AgentStep::ToolCall(ToolInvocation {
        tool_name: action.to_string(),
        tool_input: input,
        thought: text[..start].trim().to_string(),
        native_call: None,
    }))
}

/// Locate the JSON object in a reply and return it with the byte offset
/// where it starts.
///
/// Answers may embed their own code fences, so every closing fence after the
/// opening one is tried, last first, followed by the outermost braces. The
/// first candidate that is valid JSON wins; failing that, the earliest fenced
/// body is returned so the parse error points at it.
fn extract_json_blob(text: &str) -> Option<(usize, &str)> {
    let mut fenced = Vec::new();
    if let Some(fence) = text.find("```") {
        let after_fence = fence + 3;
        let body_start = match text[after_fence..].find('\n') {
            Some(nl) => after_fence + nl + 1,
            None => after_fence,
        };
        for (close, _) in text[body_start..].match_indices("```") {
            let body = text[body_start..body_start + close].trim();
            if body.starts_with('{') {
                fenced.push((fence, body));
            }
        }
    }

    let braces = match (text.find('{'), text.rfind('}')) {
        (Some(open), Some(close)) if close > open => Some((open, &text[open..=close])),
        _ => None,
    };

    fenced
        .iter()
        .rev()
        .chain(braces.iter())
        .find(|(_, blob)| serde_json::from_str::<Value>(blob).is_ok())
        .or_else(|| fenced.first().or(braces.as_ref()))
        .copied()
}

/// Native calls carry JSON arguments; tools take a single string.
fn native_input(arguments: &str) -> String {
    match serde_json::from_str::<Value>(arguments) {
        Ok(Value::Object(map)) => {
            if let Some(Value::String(s)) = map.get("input") {
                return s.clone();
            }
            let mut strings = map.values().filter_map(Value::as_str);
            match (strings.next(), strings.next(), map.len()) {
                (Some(only), None, 1) => only.to_string(),
                _ => arguments.to_string(),
            }
        }
        Ok(Value::String(s)) => s,
        _ => arguments.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool_call(reply: AgentStep) -> ToolInvocation {
        match reply {
            AgentStep::ToolCall(call) => call,
            other => panic!("expected a tool call, got {other:?}"),
        }
    }

    #[test]
    fn fenced_tool_request() {
        let text = "I will compute it.\n```json\n{\n  \"action\": \"calculator\",\n  \"action_input\": \"2+2\"\n}\n```";
        let call = tool_call(parse_text(text).unwrap());
        assert_eq!(call.tool_name, "calculator");
        assert_eq!(call.tool_input, "2+2");
        assert_eq!(call.thought, "I will compute it.");
        assert!(call.native_call.is_none());
    }

    #[test]
    fn fenced_final_answer() {
        let text = "```json\n{\"action\": \"Final Answer\", \"action_input\": \"2 + 2 = 4\"}\n```";
        match parse_text(text).unwrap() {
            AgentStep::FinalAnswer { text } => assert_eq!(text, "2 + 2 = 4"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn final_answer_may_contain_a_code_block() {
        let text = concat!(
            "```json\n",
            r#"{"action":"Final Answer","action_input":"Use this:\n```rust\nfn main() {}\n```"}"#,
            "\n```"
        );
        match parse_text(text).unwrap() {
            AgentStep::FinalAnswer { text } => {
                assert_eq!(text, "Use this:\n```rust\nfn main() {}\n```")
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn trailing_prose_with_its_own_fence_is_ignored() {
        let text = "```json\n{\"action\": \"calculator\", \"action_input\": \"3*3\"}\n```\n\
                    For example:\n```\nnot json\n```";
        let call = tool_call(parse_text(text).unwrap());
        assert_eq!(call.tool_name, "calculator");
        assert_eq!(call.tool_input, "3*3");
    }

    #[test]
    fn bare_json_is_accepted() {
        let text = r#"{"action": "date-time", "action_input": ""}"#;
        let call = tool_call(parse_text(text).unwrap());
        assert_eq!(call.tool_name, "date-time");
        assert_eq!(call.tool_input, "");
    }

    #[test]
    fn unlabeled_fence_is_accepted() {
        let text = "```\n{\"action\": \"Final Answer\", \"action_input\": \"hi\"}\n```";
        assert!(matches!(parse_text(text).unwrap(), AgentStep::FinalAnswer { .. }));
    }

    #[test]
    fn object_input_is_stringified() {
        let text = r#"{"action": "web-browser", "action_input": {"url": "https://a.b"}}"#;
        let call = tool_call(parse_text(text).unwrap());
        assert_eq!(call.tool_input, r#"{"url":"https://a.b"}"#);
    }

    #[test]
    fn plain_prose_is_a_parse_error() {
        let err = parse_text("Sure! The answer is four.").unwrap_err();
        assert!(matches!(err, AgentError::Parse(_)));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = parse_text("```json\n{\"action\": \"calculator\",\n```").unwrap_err();
        assert!(matches!(err, AgentError::Parse(_)));
    }

    #[test]
    fn missing_action_is_a_parse_error() {
        let err = parse_text(r#"{"action_input": "2+2"}"#).unwrap_err();
        assert!(err.to_string().contains("action"));
    }

    #[test]
    fn native_call_takes_first_and_extracts_input() {
        let mut reply = Message::assistant("");
        reply.tool_calls = vec![
            MessageToolCall {
                id: "call_1".into(),
                name: "calculator".into(),
                arguments: r#"{"input":"6*7"}"#.into(),
            },
            MessageToolCall {
                id: "call_2".into(),
                name: "date-time".into(),
                arguments: "{}".into(),
            },
        ];
        let call = tool_call(parse_reply(&reply).unwrap());
        assert_eq!(call.tool_name, "calculator");
        assert_eq!(call.tool_input, "6*7");
        assert_eq!(call.native_call.unwrap().id, "call_1");
    }

    #[test]
    fn native_arguments_fallbacks() {
        assert_eq!(native_input(r#"{"expression":"1+1"}"#), "1+1");
        assert_eq!(native_input(r#""raw""#), "raw");
        assert_eq!(native_input("not json"), "not json");
        assert_eq!(native_input(r#"{"a":"1","b":"2"}"#), r#"{"a":"1","b":"2"}"#);
    }

    #[test]
    fn text_reply_without_tool_calls_uses_protocol() {
        let reply = Message::assistant(r#"{"action":"Final Answer","action_input":"done"}"#);
        assert!(matches!(parse_reply(&reply).unwrap(), AgentStep::FinalAnswer { .. }));
    }
}
