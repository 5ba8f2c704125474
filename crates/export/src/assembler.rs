//! Message assembly: one annotated conversation → one training example.
//!
//! Surviving turns are walked in position order. User turns become user
//! messages (with planned context appended), agent turns become weighted
//! assistant messages followed by one tool message per surviving call.

use crate::call_id::CallIdAllocator;
use crate::context;
use crate::weight::WeightPolicy;
use crate::{ExportError, ExportOptions};
use callmill_core::{
    ChatMessage, ChatToolCall, Conversation, Layered, Speaker, SystemPrompt, ToolCatalog,
    ToolDefinition, TrainingExample, Turn,
};
use serde_json::Value;
use std::fmt;
use tracing::{debug, warn};

/// Marker sent in a tool message when no result was recorded.
pub const NULL_RESPONSE: &str = "null";

/// Key wrapping original argument text that is not valid JSON.
pub const RAW_ARGUMENTS_KEY: &str = "raw_arguments";

/// Why a conversation produced no example.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// `tool_calls_only` was set and no tool call survived.
    NoToolCalls,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoToolCalls => write!(f, "no tool calls"),
        }
    }
}

/// Result of assembling one conversation.
#[derive(Debug, Clone, PartialEq)]
pub enum Assembly {
    Example(TrainingExample),
    Skipped(SkipReason),
}

impl Assembly {
    pub fn example(&self) -> Option<&TrainingExample> {
        match self {
            Self::Example(e) => Some(e),
            Self::Skipped(_) => None,
        }
    }

    pub fn into_example(self) -> Option<TrainingExample> {
        match self {
            Self::Example(e) => Some(e),
            Self::Skipped(_) => None,
        }
    }
}

/// Assembles conversations under fixed options.
///
/// Construction checks the request-level preconditions once; assembling a
/// conversation afterwards cannot fail.
#[derive(Debug, Clone)]
pub struct Assembler<'a> {
    options: ExportOptions,
    prompt: Option<&'a SystemPrompt>,
    tools: Option<Vec<ToolDefinition>>,
}

impl<'a> Assembler<'a> {
    pub fn new(
        options: ExportOptions,
        prompt: Option<&'a SystemPrompt>,
        catalog: &ToolCatalog,
    ) -> Result<Self, ExportError> {
        if options.include_system_prompt && prompt.is_none() {
            return Err(ExportError::NoActivePrompt);
        }
        Ok(Self {
            options,
            prompt: prompt.filter(|_| options.include_system_prompt),
            tools: options.include_tools.then(|| catalog.definitions()),
        })
    }

    pub fn options(&self) -> ExportOptions {
        self.options
    }

    /// Build the example for one conversation.
    pub fn assemble(&self, conversation: &Conversation) -> Assembly {
        if self.options.tool_calls_only && !conversation.has_surviving_tool_calls() {
            debug!(conversation = %conversation.id, "Skipping conversation without tool calls");
            return Assembly::Skipped(SkipReason::NoToolCalls);
        }

        let turns = conversation.surviving_turns();
        let weights = WeightPolicy::for_turns(&turns);
        let injections = if self.options.include_context {
            context::plan_injections(&turns)
        } else {
            Default::default()
        };

        let mut ids = CallIdAllocator::new();
        let mut messages = Vec::with_capacity(turns.len() + 1);

        if let Some(prompt) = self.prompt {
            messages.push(ChatMessage::system(prompt.content.trim()));
        }

        for (idx, turn) in turns.iter().enumerate() {
            match turn.role {
                Speaker::User => {
                    warn_ignored_user_data(&conversation.id, turn);
                    let mut content = turn.display_text().trim().to_string();
                    if let Some(blocks) = injections.get(&idx) {
                        if content.is_empty() {
                            debug!(
                                conversation = %conversation.id,
                                position = turn.position,
                                blocks = blocks.len(),
                                "Dropping context for blank user turn"
                            );
                        } else {
                            context::inject(&mut content, blocks);
                        }
                    }
                    messages.push(ChatMessage::user(content));
                }
                Speaker::Agent => {
                    let weight = weights.weight_for(turn);
                    let text = turn.display_text().trim();
                    let mut assistant = ChatMessage::assistant(text, weight.as_u8());

                    let (calls, results): (Vec<ChatToolCall>, Vec<String>) = turn
                        .surviving_tool_calls()
                        .map(|call| {
                            let id = ids.next_id();
                            let args = render_arguments(&call.arguments);
                            (
                                ChatToolCall::function(id, &call.name, args),
                                render_response(call.response.as_ref()),
                            )
                        })
                        .unzip();

                    let tool_messages: Vec<ChatMessage> = calls
                        .iter()
                        .zip(results)
                        .map(|(call, result)| ChatMessage::tool_result(call.id.clone(), result))
                        .collect();

                    if !calls.is_empty() && text.is_empty() {
                        assistant.content = None;
                    }
                    assistant.tool_calls = calls;
                    messages.push(assistant);
                    messages.extend(tool_messages);
                }
            }
        }

        debug!(
            conversation = %conversation.id,
            messages = messages.len(),
            tool_calls = ids.issued(),
            "Conversation assembled"
        );

        Assembly::Example(TrainingExample {
            messages,
            tools: self.tools.clone(),
            parallel_tool_calls: false,
        })
    }
}

/// Assemble a single conversation.
pub fn assemble(
    conversation: &Conversation,
    options: &ExportOptions,
    prompt: Option<&SystemPrompt>,
    catalog: &ToolCatalog,
) -> Result<Assembly, ExportError> {
    Ok(Assembler::new(*options, prompt, catalog)?.assemble(conversation))
}

fn warn_ignored_user_data(conversation: &str, turn: &Turn) {
    if !turn.tool_calls.is_empty() {
        warn!(
            conversation,
            position = turn.position,
            count = turn.tool_calls.len(),
            "Ignoring tool calls on user turn"
        );
    }
    if turn.weight.is_some() {
        warn!(conversation, position = turn.position, "Ignoring weight on user turn");
    }
}

/// Arguments as JSON text.
///
/// Originals are normalized: null or missing becomes `{}`, JSON text is
/// re-serialized compactly, and text that does not parse is wrapped under
/// [`RAW_ARGUMENTS_KEY`]. An annotator's edited text that does not parse is
/// passed through as written, so the validator rejects it.
pub fn render_arguments(arguments: &Layered<Value>) -> String {
    match &arguments.edited {
        Some(Value::String(text)) => match serde_json::from_str::<Value>(text) {
            Ok(parsed) => parsed.to_string(),
            Err(_) => text.clone(),
        },
        Some(value) => value.to_string(),
        None => match &arguments.original {
            Value::Null => "{}".to_string(),
            Value::String(text) if text.trim().is_empty() => "{}".to_string(),
            Value::String(text) => match serde_json::from_str::<Value>(text) {
                Ok(parsed) => parsed.to_string(),
                Err(_) => {
                    let mut wrapped = serde_json::Map::new();
                    wrapped.insert(RAW_ARGUMENTS_KEY.to_string(), Value::String(text.clone()));
                    Value::Object(wrapped).to_string()
                }
            },
            value => value.to_string(),
        },
    }
}

/// Tool message content for a recorded response.
///
/// Strings pass through as-is; other JSON is serialized compactly. No
/// result, a JSON null, or a blank string becomes [`NULL_RESPONSE`].
pub fn render_response(response: Option<&Value>) -> String {
    match response {
        None | Some(Value::Null) => NULL_RESPONSE.to_string(),
        Some(Value::String(s)) if s.trim().is_empty() => NULL_RESPONSE.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(value) => value.to_string(),
    }
}
