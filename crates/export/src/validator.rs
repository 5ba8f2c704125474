//! Structural validation of training examples.
//!
//! Every check runs on every example and all findings are collected, so an
//! annotator sees the full list of problems at once. Errors exclude the
//! example from the export; warnings are reported but do not.

use crate::context::CONTEXT_HEADER;
use callmill_core::{ChatMessage, ChatRole, TrainingExample};
use callmill_estimate::{count_example_tokens, Tokenizer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Limits applied by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Examples estimated above this are rejected
    pub max_example_tokens: usize,

    /// Datasets smaller than this raise a warning
    pub min_dataset_examples: usize,
}

impl ValidatorConfig {
    pub const DEFAULT_MAX_EXAMPLE_TOKENS: usize = 65_536;
    pub const DEFAULT_MIN_DATASET_EXAMPLES: usize = 10;
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_example_tokens: Self::DEFAULT_MAX_EXAMPLE_TOKENS,
            min_dataset_examples: Self::DEFAULT_MIN_DATASET_EXAMPLES,
        }
    }
}

/// One finding. `index` is the message's position in the example.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationIssue {
    #[error("example has no user message")]
    MissingUserMessage,

    #[error("example has no assistant message")]
    MissingAssistantMessage,

    #[error("last message must be from the assistant, got {role}")]
    LastMessageNotAssistant { role: ChatRole },

    #[error("first message must be system or user, got {role}")]
    FirstMessageRole { role: ChatRole },

    #[error("message {index}: system message must be first")]
    SystemNotFirst { index: usize },

    #[error("message {index}: {role} content is empty")]
    EmptyContent { index: usize, role: ChatRole },

    #[error("message {index}: user message has context but no user text")]
    EmptyUserTextBeforeContext { index: usize },

    #[error("message {index}: assistant message has neither content nor tool calls")]
    EmptyAssistantMessage { index: usize },

    #[error("message {index}: assistant message has tool calls but no content")]
    ToolCallsWithoutContent { index: usize },

    #[error("message {index}: weight must be 0 or 1, got {weight}")]
    InvalidWeight { index: usize, weight: u8 },

    #[error("message {index}: weight is only allowed on assistant messages, found on {role}")]
    WeightOnNonAssistant { index: usize, role: ChatRole },

    #[error("message {index}: tool_call {id} has type {kind}, expected function")]
    UnsupportedToolCallType {
        index: usize,
        id: String,
        kind: String,
    },

    #[error("message {index}: tool_call {id} arguments are not valid JSON")]
    InvalidArguments { index: usize, id: String },

    #[error("message {index}: duplicate tool_call id {id}")]
    DuplicateToolCallId { index: usize, id: String },

    #[error("message {index}: tool message has no tool_call_id")]
    MissingToolCallId { index: usize },

    #[error("message {index}: tool response {id} has no preceding tool call")]
    OrphanToolResponse { index: usize, id: String },

    #[error("message {index}: tool response {id} does not match the preceding tool calls")]
    UnknownToolResponse { index: usize, id: String },

    #[error("message {index}: duplicate tool response for {id}")]
    DuplicateToolResponse { index: usize, id: String },

    #[error("message {index}: tool calls without responses: {}", .ids.join(", "))]
    MissingToolResponses { index: usize, ids: Vec<String> },

    #[error("parallel_tool_calls must be false")]
    ParallelToolCalls,

    #[error("example is ~{tokens} tokens, above the limit of {max}")]
    TooManyTokens { tokens: usize, max: usize },

    #[error("example could not be serialized: {0}")]
    Unserializable(String),
}

/// Findings for one example.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,

    /// Estimated tokens of the serialized example
    pub tokens: usize,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Error messages, for exclusion records.
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

/// Ids of the most recent assistant tool_calls block and which of them
/// have been answered.
struct PendingBlock {
    index: usize,
    ids: Vec<String>,
    answered: HashSet<String>,
}

impl PendingBlock {
    fn unanswered(&self) -> Vec<String> {
        self.ids
            .iter()
            .filter(|id| !self.answered.contains(*id))
            .cloned()
            .collect()
    }
}

/// Validates examples against structural rules and a size limit.
pub struct Validator<'t> {
    config: ValidatorConfig,
    tokenizer: &'t dyn Tokenizer,
}

impl<'t> Validator<'t> {
    pub fn new(config: ValidatorConfig, tokenizer: &'t dyn Tokenizer) -> Self {
        Self { config, tokenizer }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Run every check on `example`.
    pub fn validate(&self, example: &TrainingExample) -> ValidationReport {
        let mut report = ValidationReport::default();
        let messages = &example.messages;

        check_roles(messages, &mut report);
        check_contents(messages, &mut report);
        check_tool_pairing(messages, &mut report);

        if example.parallel_tool_calls {
            report.errors.push(ValidationIssue::ParallelToolCalls);
        }

        match count_example_tokens(self.tokenizer, example) {
            Ok(tokens) => {
                report.tokens = tokens;
                if tokens > self.config.max_example_tokens {
                    report.errors.push(ValidationIssue::TooManyTokens {
                        tokens,
                        max: self.config.max_example_tokens,
                    });
                }
            }
            Err(e) => report
                .errors
                .push(ValidationIssue::Unserializable(e.to_string())),
        }

        report
    }

    /// Warnings about the dataset as a whole.
    pub fn dataset_warnings(&self, example_count: usize) -> Vec<String> {
        let mut warnings = Vec::new();
        if example_count < self.config.min_dataset_examples {
            warnings.push(format!(
                "fine-tuning requires at least {} training examples; this export has {}, \
                 so the job will be rejected",
                self.config.min_dataset_examples, example_count
            ));
        }
        warnings
    }
}

fn check_roles(messages: &[ChatMessage], report: &mut ValidationReport) {
    if !messages.iter().any(|m| m.role == ChatRole::User) {
        report.errors.push(ValidationIssue::MissingUserMessage);
    }
    if !messages.iter().any(|m| m.role == ChatRole::Assistant) {
        report.errors.push(ValidationIssue::MissingAssistantMessage);
    }

    if let Some(first) = messages.first() {
        if !matches!(first.role, ChatRole::System | ChatRole::User) {
            report
                .errors
                .push(ValidationIssue::FirstMessageRole { role: first.role });
        }
    }
    if let Some(last) = messages.last() {
        if last.role != ChatRole::Assistant {
            report
                .errors
                .push(ValidationIssue::LastMessageNotAssistant { role: last.role });
        }
    }

    for (index, msg) in messages.iter().enumerate().skip(1) {
        if msg.role == ChatRole::System {
            report.errors.push(ValidationIssue::SystemNotFirst { index });
        }
    }

    for (index, msg) in messages.iter().enumerate() {
        let Some(weight) = msg.weight else { continue };
        if msg.role != ChatRole::Assistant {
            report.errors.push(ValidationIssue::WeightOnNonAssistant {
                index,
                role: msg.role,
            });
        } else if weight > 1 {
            report
                .errors
                .push(ValidationIssue::InvalidWeight { index, weight });
        }
    }
}

fn check_contents(messages: &[ChatMessage], report: &mut ValidationReport) {
    for (index, msg) in messages.iter().enumerate() {
        let blank = msg.text().trim().is_empty();
        match msg.role {
            ChatRole::System | ChatRole::User | ChatRole::Tool if blank => {
                report.errors.push(ValidationIssue::EmptyContent {
                    index,
                    role: msg.role,
                });
            }
            ChatRole::User if has_blank_utterance(msg.text()) => {
                report
                    .errors
                    .push(ValidationIssue::EmptyUserTextBeforeContext { index });
            }
            ChatRole::Assistant if blank && msg.tool_calls.is_empty() => {
                report
                    .errors
                    .push(ValidationIssue::EmptyAssistantMessage { index });
            }
            ChatRole::Assistant if blank => {
                report
                    .warnings
                    .push(ValidationIssue::ToolCallsWithoutContent { index });
            }
            _ => {}
        }
    }
}

/// True when a context block is present but nothing precedes the first header.
fn has_blank_utterance(content: &str) -> bool {
    content
        .split_once(CONTEXT_HEADER)
        .is_some_and(|(utterance, _)| utterance.trim().is_empty())
}

fn check_tool_pairing(messages: &[ChatMessage], report: &mut ValidationReport) {
    let mut seen_ids: HashSet<&str> = HashSet::new();
    let mut pending: Option<PendingBlock> = None;

    for (index, msg) in messages.iter().enumerate() {
        if msg.role != ChatRole::Tool {
            close_block(pending.take(), index, report);
        }

        match msg.role {
            ChatRole::Assistant if !msg.tool_calls.is_empty() => {
                for call in &msg.tool_calls {
                    if !seen_ids.insert(call.id.as_str()) {
                        report.errors.push(ValidationIssue::DuplicateToolCallId {
                            index,
                            id: call.id.clone(),
                        });
                    }
                    if call.kind != "function" {
                        report.errors.push(ValidationIssue::UnsupportedToolCallType {
                            index,
                            id: call.id.clone(),
                            kind: call.kind.clone(),
                        });
                    }
                    if serde_json::from_str::<serde_json::Value>(&call.function.arguments).is_err()
                    {
                        report.errors.push(ValidationIssue::InvalidArguments {
                            index,
                            id: call.id.clone(),
                        });
                    }
                }
                pending = Some(PendingBlock {
                    index,
                    ids: msg.tool_calls.iter().map(|c| c.id.clone()).collect(),
                    answered: HashSet::new(),
                });
            }
            ChatRole::Tool => {
                let Some(id) = msg.tool_call_id.as_deref() else {
                    report
                        .errors
                        .push(ValidationIssue::MissingToolCallId { index });
                    continue;
                };
                let id = id.to_string();
                match pending.as_mut() {
                    None => report
                        .errors
                        .push(ValidationIssue::OrphanToolResponse { index, id }),
                    Some(block) if !block.ids.contains(&id) => report
                        .errors
                        .push(ValidationIssue::UnknownToolResponse { index, id }),
                    Some(block) => {
                        if !block.answered.insert(id.clone()) {
                            report
                                .errors
                                .push(ValidationIssue::DuplicateToolResponse { index, id });
                        }
                    }
                }
            }
            _ => {}
        }
    }

    close_block(pending, messages.len(), report);
}

fn close_block(block: Option<PendingBlock>, index: usize, report: &mut ValidationReport) {
    let Some(block) = block else { return };
    let ids = block.unanswered();
    if !ids.is_empty() {
        tracing::trace!(opened = block.index, closed = index, "Unanswered tool calls");
        report
            .errors
            .push(ValidationIssue::MissingToolResponses { index, ids });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use callmill_core::ChatToolCall;
    use callmill_estimate::HeuristicTokenizer;

    fn validate(messages: Vec<ChatMessage>) -> ValidationReport {
        let tokenizer = HeuristicTokenizer::default();
        Validator::new(ValidatorConfig::default(), &tokenizer)
            .validate(&TrainingExample::new(messages))
    }

    fn with_calls(content: &str, ids: &[&str]) -> ChatMessage {
        let mut m = ChatMessage::assistant(content, 1);
        m.tool_calls = ids
            .iter()
            .map(|id| ChatToolCall::function(*id, "end_call", "{}"))
            .collect();
        m
    }

    fn has(report: &ValidationReport, pred: impl Fn(&ValidationIssue) -> bool) -> bool {
        report.errors.iter().any(pred)
    }

    #[test]
    fn valid_example_passes() {
        let report = validate(vec![
            ChatMessage::system("You take pizza orders."),
            ChatMessage::user("A pizza please"),
            with_calls("Ordering.", &["call_001"]),
            ChatMessage::tool_result("call_001", "ok"),
            ChatMessage::assistant("Done!", 1),
        ]);
        assert!(report.is_valid(), "{:?}", report.errors);
        assert!(report.warnings.is_empty());
        assert!(report.tokens > 0);
    }

    #[test]
    fn empty_example_is_rejected() {
        let report = validate(vec![]);
        assert!(has(&report, |e| *e == ValidationIssue::MissingUserMessage));
        assert!(has(&report, |e| *e == ValidationIssue::MissingAssistantMessage));
    }

    #[test]
    fn role_order_rules() {
        let report = validate(vec![
            ChatMessage::assistant("Hello", 0),
            ChatMessage::system("late system"),
            ChatMessage::user("hi"),
        ]);
        assert!(has(&report, |e| matches!(
            e,
            ValidationIssue::FirstMessageRole { role: ChatRole::Assistant }
        )));
        assert!(has(&report, |e| matches!(e, ValidationIssue::SystemNotFirst { index: 1 })));
        assert!(has(&report, |e| matches!(
            e,
            ValidationIssue::LastMessageNotAssistant { role: ChatRole::User }
        )));
    }

    #[test]
    fn collects_all_errors() {
        let bad_weight = ChatMessage::assistant("ok", 2);
        let mut user_weight = ChatMessage::user("hi");
        user_weight.weight = Some(1);
        let report = validate(vec![user_weight, ChatMessage::user("  "), bad_weight]);
        assert!(has(&report, |e| matches!(e, ValidationIssue::WeightOnNonAssistant { index: 0, .. })));
        assert!(has(&report, |e| matches!(e, ValidationIssue::EmptyContent { index: 1, role: ChatRole::User })));
        assert!(has(&report, |e| matches!(e, ValidationIssue::InvalidWeight { index: 2, weight: 2 })));
        assert_eq!(report.errors.len(), 3);
    }

    #[test]
    fn empty_assistant_without_calls_is_error() {
        let report = validate(vec![ChatMessage::user("hi"), ChatMessage::assistant("", 1)]);
        assert!(has(&report, |e| matches!(e, ValidationIssue::EmptyAssistantMessage { index: 1 })));
    }

    #[test]
    fn empty_assistant_with_calls_is_warning() {
        let mut call_only = with_calls("", &["call_001"]);
        call_only.content = None;
        let report = validate(vec![
            ChatMessage::user("bye"),
            call_only,
            ChatMessage::tool_result("call_001", "null"),
            ChatMessage::assistant("Goodbye", 1),
        ]);
        assert!(report.is_valid(), "{:?}", report.errors);
        assert_eq!(
            report.warnings,
            vec![ValidationIssue::ToolCallsWithoutContent { index: 1 }]
        );
    }

    #[test]
    fn invalid_arguments_rejected() {
        let mut m = ChatMessage::assistant("ok", 1);
        m.tool_calls = vec![ChatToolCall::function("call_001", "create_order", "{broken")];
        let report = validate(vec![
            ChatMessage::user("pizza"),
            m,
            ChatMessage::tool_result("call_001", "ok"),
            ChatMessage::assistant("done", 1),
        ]);
        assert_eq!(
            report.errors,
            vec![ValidationIssue::InvalidArguments {
                index: 1,
                id: "call_001".into()
            }]
        );
    }

    #[test]
    fn orphan_and_forward_responses() {
        let report = validate(vec![
            ChatMessage::user("hi"),
            ChatMessage::tool_result("call_001", "early"),
            with_calls("ok", &["call_001"]),
            ChatMessage::tool_result("call_001", "ok"),
            ChatMessage::assistant("done", 1),
        ]);
        assert_eq!(
            report.errors,
            vec![ValidationIssue::OrphanToolResponse {
                index: 1,
                id: "call_001".into()
            }]
        );
    }

    #[test]
    fn response_after_intervening_message_is_orphan() {
        let report = validate(vec![
            ChatMessage::user("hi"),
            with_calls("ok", &["call_001"]),
            ChatMessage::user("hello?"),
            ChatMessage::tool_result("call_001", "late"),
            ChatMessage::assistant("done", 1),
        ]);
        assert!(has(&report, |e| matches!(e, ValidationIssue::MissingToolResponses { index: 2, .. })));
        assert!(has(&report, |e| matches!(e, ValidationIssue::OrphanToolResponse { index: 3, .. })));
    }

    #[test]
    fn unknown_and_duplicate_responses() {
        let report = validate(vec![
            ChatMessage::user("hi"),
            with_calls("ok", &["call_001"]),
            ChatMessage::tool_result("call_009", "?"),
            ChatMessage::tool_result("call_001", "a"),
            ChatMessage::tool_result("call_001", "b"),
            ChatMessage::assistant("done", 1),
        ]);
        assert!(has(&report, |e| matches!(e, ValidationIssue::UnknownToolResponse { index: 2, .. })));
        assert!(has(&report, |e| matches!(e, ValidationIssue::DuplicateToolResponse { index: 4, .. })));
    }

    #[test]
    fn unanswered_calls_at_end() {
        let report = validate(vec![
            ChatMessage::user("hi"),
            with_calls("ok", &["call_001", "call_002"]),
            ChatMessage::tool_result("call_002", "ok"),
        ]);
        assert!(has(&report, |e| matches!(
            e,
            ValidationIssue::MissingToolResponses { index: 3, ids } if ids == &["call_001".to_string()]
        )));
    }

    #[test]
    fn duplicate_call_ids_rejected() {
        let report = validate(vec![
            ChatMessage::user("hi"),
            with_calls("a", &["call_001"]),
            ChatMessage::tool_result("call_001", "ok"),
            with_calls("b", &["call_001"]),
            ChatMessage::tool_result("call_001", "ok"),
            ChatMessage::assistant("done", 1),
        ]);
        assert!(has(&report, |e| matches!(e, ValidationIssue::DuplicateToolCallId { index: 3, .. })));
    }

    #[test]
    fn empty_tool_content_rejected() {
        let report = validate(vec![
            ChatMessage::user("hi"),
            with_calls("ok", &["call_001"]),
            ChatMessage::tool_result("call_001", ""),
            ChatMessage::assistant("done", 1),
        ]);
        assert!(has(&report, |e| matches!(e, ValidationIssue::EmptyContent { index: 2, role: ChatRole::Tool })));
    }

    #[test]
    fn context_without_user_text_rejected() {
        let report = validate(vec![
            ChatMessage::user("  \n\nContext:\nHours: 11-10"),
            ChatMessage::assistant("We open at 11.", 1),
        ]);
        assert!(has(&report, |e| matches!(e, ValidationIssue::EmptyUserTextBeforeContext { index: 0 })));

        let report = validate(vec![
            ChatMessage::user("hours?\n\nContext:\nHours: 11-10"),
            ChatMessage::assistant("We open at 11.", 1),
        ]);
        assert!(report.is_valid(), "{:?}", report.errors);
    }

    #[test]
    fn parallel_tool_calls_rejected() {
        let tokenizer = HeuristicTokenizer::default();
        let mut example = TrainingExample::new(vec![
            ChatMessage::user("hi"),
            ChatMessage::assistant("hello", 1),
        ]);
        example.parallel_tool_calls = true;
        let report = Validator::new(ValidatorConfig::default(), &tokenizer).validate(&example);
        assert_eq!(report.errors, vec![ValidationIssue::ParallelToolCalls]);
    }

    #[test]
    fn non_function_tool_call_rejected() {
        let mut assistant = with_calls("ok", &["call_001"]);
        assistant.tool_calls[0].kind = "retrieval".into();
        let report = validate(vec![
            ChatMessage::user("hi"),
            assistant,
            ChatMessage::tool_result("call_001", "{}"),
            ChatMessage::assistant("done", 1),
        ]);
        assert!(has(&report, |e| matches!(
            e,
            ValidationIssue::UnsupportedToolCallType { index: 1, kind, .. } if kind == "retrieval"
        )));
    }

    #[test]
    fn oversized_example_rejected() {
        let tokenizer = HeuristicTokenizer::default();
        let config = ValidatorConfig {
            max_example_tokens: 10,
            ..ValidatorConfig::default()
        };
        let report = Validator::new(config, &tokenizer).validate(&TrainingExample::new(vec![
            ChatMessage::user("I would like to order three large pizzas"),
            ChatMessage::assistant("Sure", 1),
        ]));
        assert!(has(&report, |e| matches!(e, ValidationIssue::TooManyTokens { max: 10, .. })));
    }

    #[test]
    fn dataset_warning_below_minimum() {
        let tokenizer = HeuristicTokenizer::default();
        let validator = Validator::new(ValidatorConfig::default(), &tokenizer);
        let warnings = validator.dataset_warnings(9);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("at least 10"));
        assert!(validator.dataset_warnings(10).is_empty());
    }

    #[test]
    fn issue_messages_are_readable() {
        let issue = ValidationIssue::MissingToolResponses {
            index: 4,
            ids: vec!["call_001".into(), "call_002".into()],
        };
        assert_eq!(
            issue.to_string(),
            "message 4: tool calls without responses: call_001, call_002"
        );
    }
}
