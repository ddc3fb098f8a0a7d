//! Transcript: the scratchpad of a single reasoning loop run.
//!
//! Holds two views of the same history: the messages replayed to the model
//! after the user's input, and a Thought/Action/Observation trace kept for
//! logging and for the host. Discarded when the run ends.

use crate::prompt;
use chrono::{DateTime, Utc};
use persanna_core::message::{Message, MessageToolCall};
use serde::{Deserialize, Serialize};

/// A single entry in the reasoning trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    pub kind: TraceKind,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// The kind of reasoning trace entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TraceKind {
    Thought,
    Action,
    Observation,
}

#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
    trace: Vec<TraceEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_thought(&mut self, thought: &str) {
        self.push_trace(TraceKind::Thought, thought);
    }

    pub fn add_action(&mut self, tool_name: &str, tool_input: &str) {
        self.push_trace(TraceKind::Action, &format!("{tool_name}({tool_input})"));
    }

    pub fn add_observation(&mut self, observation: &str) {
        self.push_trace(TraceKind::Observation, observation);
    }

    /// Record a JSON-blob tool request and the observation it produced.
    ///
    /// The model's raw reply is replayed verbatim, followed by the
    /// observation wrapped in the tool response template.
    pub fn record_text_exchange(&mut self, reply: &str, observation: &str) {
        self.messages.push(Message::assistant(reply));
        self.messages
            .push(Message::user(prompt::render_tool_response(observation)));
    }

    /// Record a native tool call and its result.
    pub fn record_native_exchange(
        &mut self,
        reply: &str,
        call: MessageToolCall,
        observation: &str,
    ) {
        let call_id = call.id.clone();
        let mut assistant = Message::assistant(reply);
        assistant.tool_calls = vec![call];
        self.messages.push(assistant);
        self.messages.push(Message::tool_result(call_id, observation));
    }

    /// Messages to append after the user's input on the next model call.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn trace(&self) -> &[TraceEntry] {
        &self.trace
    }

    pub fn into_trace(self) -> Vec<TraceEntry> {
        self.trace
    }

    fn push_trace(&mut self, kind: TraceKind, content: &str) {
        self.trace.push(TraceEntry {
            kind,
            content: content.to_string(),
            timestamp: Utc::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use persanna_core::message::Role;

    #[test]
    fn new_transcript_is_empty() {
        let transcript = Transcript::new();
        assert!(transcript.messages().is_empty());
        assert!(transcript.trace().is_empty());
    }

    #[test]
    fn trace_recording() {
        let mut t = Transcript::new();
        t.add_thought("I should compute this");
        t.add_action("calculator", "2+2");
        t.add_observation("4");

        let kinds: Vec<TraceKind> = t.trace().iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![TraceKind::Thought, TraceKind::Action, TraceKind::Observation]
        );
        assert_eq!(t.trace()[1].content, "calculator(2+2)");
    }

    #[test]
    fn text_exchange_replays_reply_and_wraps_observation() {
        let mut t = Transcript::new();
        t.record_text_exchange("{\"action\":\"calculator\"}", "4");

        let messages = t.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::Assistant);
        assert_eq!(messages[0].content, "{\"action\":\"calculator\"}");
        assert_eq!(messages[1].role, Role::User);
        assert!(messages[1].content.starts_with("TOOL RESPONSE:"));
        assert!(messages[1].content.contains("\n4\n"));
    }

    #[test]
    fn native_exchange_links_result_to_call() {
        let mut t = Transcript::new();
        t.record_native_exchange(
            "",
            MessageToolCall {
                id: "call_7".into(),
                name: "calculator".into(),
                arguments: r#"{"input":"2+2"}"#.into(),
            },
            "4",
        );

        let messages = t.messages();
        assert_eq!(messages[0].tool_calls.len(), 1);
        assert_eq!(messages[1].role, Role::Tool);
        assert_eq!(messages[1].tool_call_id.as_deref(), Some("call_7"));
        assert_eq!(messages[1].content, "4");
    }

    #[test]
    fn trace_serializes() {
        let mut t = Transcript::new();
        t.add_observation("done");
        let json = serde_json::to_string(t.trace()).unwrap();
        assert!(json.contains("\"Observation\""));
    }
}
