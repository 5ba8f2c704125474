//! Batch export over a snapshot.
//!
//! Filters the approved conversations, checks request preconditions once,
//! then assembles and validates every conversation in parallel. Output order
//! follows input order. Invalid examples are excluded individually; the
//! token and cost estimate covers the exported set only.

use crate::assembler::{Assembler, Assembly};
use crate::validator::{Validator, ValidatorConfig};
use crate::{jsonl, ExportError, ExportOptions};
use callmill_core::{Conversation, Snapshot, SystemPrompt, ToolCatalog, TrainingExample};
use callmill_estimate::{
    split_train_validation, CostEstimate, HeuristicTokenizer, PricingTable, Split, Tokenizer,
    DEFAULT_EPOCHS, DEFAULT_MODEL,
};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

/// Which approved conversations to export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl ExportFilter {
    /// Approved conversations matching the filter, in input order.
    pub fn select<'c>(&self, conversations: &'c [Conversation]) -> Vec<&'c Conversation> {
        conversations
            .iter()
            .filter(|c| c.is_approved())
            .filter(|c| self.agent_id.as_deref().is_none_or(|a| c.agent_id == a))
            .filter(|c| self.tag.as_deref().is_none_or(|t| c.has_tag(t)))
            .take(self.limit.unwrap_or(usize::MAX))
            .collect()
    }
}

/// A validated example and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedExample {
    pub conversation_id: String,
    pub example: TrainingExample,
    pub tokens: usize,
}

/// A conversation that produced no example, with every reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exclusion {
    pub conversation_id: String,
    pub reasons: Vec<String>,
}

/// Outcome of one export request.
#[derive(Debug, Clone)]
pub struct ExportReport {
    /// Conversations considered after filtering
    pub conversation_count: usize,

    /// Exported examples, in input order
    pub examples: Vec<ExportedExample>,

    /// Skipped or invalid conversations, in input order
    pub excluded: Vec<Exclusion>,

    /// Example-level and dataset-level warnings
    pub warnings: Vec<String>,

    /// Estimated tokens over the exported examples
    pub total_tokens: usize,

    /// Training cost; None when the model has no known price
    pub estimate: Option<CostEstimate>,
}

impl ExportReport {
    pub fn excluded_count(&self) -> usize {
        self.excluded.len()
    }

    /// The exported examples without provenance.
    pub fn training_examples(&self) -> Vec<TrainingExample> {
        self.examples.iter().map(|e| e.example.clone()).collect()
    }

    pub fn to_jsonl(&self) -> Result<String, ExportError> {
        Ok(jsonl::to_jsonl(&self.training_examples())?)
    }

    /// Shuffle the exported examples into train and validation sets.
    pub fn split(&self, ratio: f64, seed: Option<u64>) -> Result<Split<TrainingExample>, ExportError> {
        Ok(split_train_validation(self.training_examples(), ratio, seed)?)
    }

    /// Audit-log record for this export.
    pub fn summary(&self, options: ExportOptions, filter: &ExportFilter) -> ExportSummary {
        ExportSummary {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            options,
            filter: filter.clone(),
            conversation_count: self.conversation_count,
            example_count: self.examples.len(),
            excluded_count: self.excluded.len(),
            total_tokens: self.total_tokens,
            model: self.estimate.as_ref().map(|e| e.model.clone()),
            estimated_cost_usd: self.estimate.as_ref().map(|e| e.cost_usd),
        }
    }
}

/// What was exported, for the audit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSummary {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub options: ExportOptions,
    pub filter: ExportFilter,
    pub conversation_count: usize,
    pub example_count: usize,
    pub excluded_count: usize,
    pub total_tokens: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_cost_usd: Option<f64>,
}

enum Outcome {
    Exported(ExportedExample, Vec<String>),
    Excluded(Exclusion),
}

/// Configured batch exporter.
pub struct ExportPipeline {
    options: ExportOptions,
    filter: ExportFilter,
    catalog: ToolCatalog,
    validator: ValidatorConfig,
    tokenizer: Box<dyn Tokenizer>,
    pricing: PricingTable,
    model: String,
    epochs: u32,
}

impl ExportPipeline {
    /// A pipeline with the built-in catalog, tokenizer and price table.
    pub fn new(options: ExportOptions) -> Self {
        Self {
            options,
            filter: ExportFilter::default(),
            catalog: callmill_tools::default_catalog(),
            validator: ValidatorConfig::default(),
            tokenizer: Box::new(HeuristicTokenizer::default()),
            pricing: PricingTable::with_defaults(),
            model: DEFAULT_MODEL.to_string(),
            epochs: DEFAULT_EPOCHS,
        }
    }

    pub fn with_filter(mut self, filter: ExportFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_catalog(mut self, catalog: ToolCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_validator_config(mut self, config: ValidatorConfig) -> Self {
        self.validator = config;
        self
    }

    pub fn with_tokenizer(mut self, tokenizer: Box<dyn Tokenizer>) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    pub fn with_pricing(mut self, pricing: PricingTable) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn with_training(mut self, model: impl Into<String>, epochs: u32) -> Self {
        self.model = model.into();
        self.epochs = epochs;
        self
    }

    pub fn options(&self) -> ExportOptions {
        self.options
    }

    pub fn filter(&self) -> &ExportFilter {
        &self.filter
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    pub fn tokenizer(&self) -> &dyn Tokenizer {
        self.tokenizer.as_ref()
    }

    /// A validator sharing this pipeline's tokenizer and limits.
    pub fn validator(&self) -> Validator<'_> {
        Validator::new(self.validator, self.tokenizer.as_ref())
    }

    /// Export a snapshot using its active prompt.
    pub fn run(&self, snapshot: &Snapshot) -> Result<ExportReport, ExportError> {
        let prompts = snapshot.prompt_library();
        self.run_with_prompt(&snapshot.conversations, prompts.active())
    }

    /// Export conversations with an explicitly supplied prompt.
    pub fn run_with_prompt(
        &self,
        conversations: &[Conversation],
        prompt: Option<&SystemPrompt>,
    ) -> Result<ExportReport, ExportError> {
        let selected = self.filter.select(conversations);
        if selected.is_empty() {
            return Err(ExportError::NoEligibleConversations);
        }
        let assembler = Assembler::new(self.options, prompt, &self.catalog)?;
        let validator = self.validator();

        let outcomes: Vec<Outcome> = selected
            .par_iter()
            .map(|conversation| export_one(&assembler, &validator, conversation))
            .collect();

        let mut examples = Vec::new();
        let mut excluded = Vec::new();
        let mut warnings = Vec::new();
        for outcome in outcomes {
            match outcome {
                Outcome::Exported(example, example_warnings) => {
                    warnings.extend(example_warnings);
                    examples.push(example);
                }
                Outcome::Excluded(exclusion) => {
                    warn!(
                        conversation = %exclusion.conversation_id,
                        reasons = %exclusion.reasons.join("; "),
                        "Conversation excluded from export"
                    );
                    excluded.push(exclusion);
                }
            }
        }
        warnings.extend(validator.dataset_warnings(examples.len()));

        let total_tokens = examples.iter().map(|e: &ExportedExample| e.tokens).sum();
        let estimate = match self.pricing.estimate(&self.model, total_tokens, self.epochs) {
            Ok(estimate) => Some(estimate),
            Err(e) => {
                warnings.push(e.to_string());
                None
            }
        };

        info!(
            conversations = selected.len(),
            exported = examples.len(),
            excluded = excluded.len(),
            tokens = total_tokens,
            cost_usd = estimate.as_ref().map(|e| e.cost_usd),
            "Export complete"
        );

        Ok(ExportReport {
            conversation_count: selected.len(),
            examples,
            excluded,
            warnings,
            total_tokens,
            estimate,
        })
    }
}

fn export_one(assembler: &Assembler<'_>, validator: &Validator<'_>, conversation: &Conversation) -> Outcome {
    let example = match assembler.assemble(conversation) {
        Assembly::Example(example) => example,
        Assembly::Skipped(reason) => {
            return Outcome::Excluded(Exclusion {
                conversation_id: conversation.id.clone(),
                reasons: vec![reason.to_string()],
            });
        }
    };

    let report = validator.validate(&example);
    if !report.is_valid() {
        return Outcome::Excluded(Exclusion {
            conversation_id: conversation.id.clone(),
            reasons: report.error_messages(),
        });
    }

    let warnings = report
        .warnings
        .iter()
        .map(|w| format!("{}: {w}", conversation.id))
        .collect();
    Outcome::Exported(
        ExportedExample {
            conversation_id: conversation.id.clone(),
            example,
            tokens: report.tokens,
        },
        warnings,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use callmill_core::{ConversationStatus, ToolCall, Turn};
    use serde_json::json;

    fn approved(id: &str, agent: &str) -> Conversation {
        Conversation::new(id, agent)
            .with_status(ConversationStatus::Approved)
            .with_turn(Turn::user(0, "I'd like a pizza"))
            .with_turn(Turn::agent(1, "What size?"))
    }

    fn no_prompt() -> ExportOptions {
        ExportOptions {
            include_system_prompt: false,
            ..ExportOptions::default()
        }
    }

    #[test]
    fn filter_selects_approved_agent_tag_limit() {
        let convs = vec![
            approved("c1", "a1").with_tag("gold"),
            approved("c2", "a2").with_tag("gold"),
            Conversation::new("c3", "a1").with_status(ConversationStatus::Completed),
            approved("c4", "a1"),
            approved("c5", "a1").with_tag("gold"),
        ];
        let ids = |f: &ExportFilter| -> Vec<String> {
            f.select(&convs).iter().map(|c| c.id.clone()).collect()
        };

        assert_eq!(ids(&ExportFilter::default()), vec!["c1", "c2", "c4", "c5"]);
        let by_agent = ExportFilter {
            agent_id: Some("a1".into()),
            ..Default::default()
        };
        assert_eq!(ids(&by_agent), vec!["c1", "c4", "c5"]);
        let by_tag = ExportFilter {
            agent_id: Some("a1".into()),
            tag: Some("gold".into()),
            limit: Some(1),
        };
        assert_eq!(ids(&by_tag), vec!["c1"]);
    }

    #[test]
    fn no_eligible_conversations_is_an_error() {
        let convs = vec![Conversation::new("c1", "a1")];
        let err = ExportPipeline::new(no_prompt())
            .run_with_prompt(&convs, None)
            .unwrap_err();
        assert!(matches!(err, ExportError::NoEligibleConversations));
    }

    #[test]
    fn missing_prompt_fails_before_any_work() {
        let convs = vec![approved("c1", "a1")];
        let err = ExportPipeline::new(ExportOptions::default())
            .run_with_prompt(&convs, None)
            .unwrap_err();
        assert!(matches!(err, ExportError::NoActivePrompt));
    }

    #[test]
    fn invalid_examples_excluded_with_reasons() {
        let empty_reply = Conversation::new("bad", "a1")
            .with_status(ConversationStatus::Approved)
            .with_turn(Turn::user(0, "hello"))
            .with_turn(Turn::agent(1, ""));
        let convs = vec![approved("c1", "a1"), empty_reply, approved("c2", "a1")];

        let report = ExportPipeline::new(no_prompt())
            .run_with_prompt(&convs, None)
            .unwrap();
        let ids: Vec<&str> = report.examples.iter().map(|e| e.conversation_id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2"]);
        assert_eq!(report.excluded_count(), 1);
        assert_eq!(report.excluded[0].conversation_id, "bad");
        assert!(report.excluded[0].reasons[0].contains("neither content nor tool calls"));
        assert_eq!(report.conversation_count, 3);
    }

    #[test]
    fn blank_user_turn_with_context_is_excluded() {
        use callmill_core::ContextSnippet;

        let mut blanked = approved("blank", "a1").with_turn(
            Turn::agent(2, "We open at 11.").with_context(ContextSnippet::new("Hours: 11-10", 0.1)),
        );
        blanked.turn_mut(0).unwrap().edit_text("   ");
        let convs = vec![blanked, approved("c1", "a1")];
        let opts = ExportOptions {
            include_context: true,
            ..no_prompt()
        };

        let report = ExportPipeline::new(opts).run_with_prompt(&convs, None).unwrap();
        assert_eq!(report.examples.len(), 1);
        assert_eq!(report.excluded[0].conversation_id, "blank");
        assert!(report.excluded[0].reasons[0].contains("user content is empty"));
        let exported = report.training_examples();
        assert!(crate::audit_context(&exported).is_clean());
    }

    #[test]
    fn tool_calls_only_records_skips() {
        let with_call = approved("c1", "a1").with_turn(
            Turn::agent(2, "Ending call").with_tool_call(ToolCall::new("end_call", json!({}))),
        );
        let convs = vec![with_call, approved("c2", "a1")];
        let opts = ExportOptions {
            tool_calls_only: true,
            ..no_prompt()
        };
        let report = ExportPipeline::new(opts).run_with_prompt(&convs, None).unwrap();
        assert_eq!(report.examples.len(), 1);
        assert_eq!(report.excluded[0].reasons, vec!["no tool calls".to_string()]);
    }

    #[test]
    fn tokens_and_cost_cover_exported_only() {
        let convs: Vec<Conversation> = (0..12).map(|i| approved(&format!("c{i}"), "a1")).collect();
        let pipeline = ExportPipeline::new(no_prompt());
        let report = pipeline.run_with_prompt(&convs, None).unwrap();

        let expected: usize = report
            .examples
            .iter()
            .map(|e| callmill_estimate::count_example_tokens(pipeline.tokenizer(), &e.example).unwrap())
            .sum();
        assert_eq!(report.total_tokens, expected);
        let estimate = report.estimate.as_ref().unwrap();
        assert_eq!(estimate.model, "gpt-4o");
        assert_eq!(estimate.epochs, 3);
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    }

    #[test]
    fn small_dataset_and_unknown_model_warn() {
        let convs = vec![approved("c1", "a1")];
        let report = ExportPipeline::new(no_prompt())
            .with_training("mystery-model", 3)
            .run_with_prompt(&convs, None)
            .unwrap();
        assert!(report.estimate.is_none());
        assert_eq!(report.warnings.len(), 2);
        assert!(report.warnings.iter().any(|w| w.contains("at least 10")));
        assert!(report.warnings.iter().any(|w| w.contains("mystery-model")));
    }

    #[test]
    fn run_uses_snapshot_active_prompt() {
        let mut prompt = SystemPrompt::new("p1", "v1", "You take orders.");
        prompt.active = true;
        let snapshot = Snapshot {
            conversations: vec![approved("c1", "a1")],
            prompts: vec![prompt],
        };
        let report = ExportPipeline::new(ExportOptions::default()).run(&snapshot).unwrap();
        let first = &report.examples[0].example.messages[0];
        assert_eq!(first.text(), "You take orders.");
    }

    #[test]
    fn output_is_deterministic() {
        let convs: Vec<Conversation> = (0..20).map(|i| approved(&format!("c{i}"), "a1")).collect();
        let pipeline = ExportPipeline::new(no_prompt());
        let a = pipeline.run_with_prompt(&convs, None).unwrap().to_jsonl().unwrap();
        let b = pipeline.run_with_prompt(&convs, None).unwrap().to_jsonl().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.lines().count(), 20);
    }

    #[test]
    fn split_and_summary() {
        let convs: Vec<Conversation> = (0..10).map(|i| approved(&format!("c{i}"), "a1")).collect();
        let filter = ExportFilter {
            agent_id: Some("a1".into()),
            ..Default::default()
        };
        let pipeline = ExportPipeline::new(no_prompt()).with_filter(filter.clone());
        let report = pipeline.run_with_prompt(&convs, None).unwrap();

        let split = report.split(0.8, Some(9)).unwrap();
        assert_eq!(split.train.len(), 8);
        assert_eq!(split.validation.len(), 2);

        let summary = report.summary(pipeline.options(), pipeline.filter());
        assert_eq!(summary.example_count, 10);
        assert_eq!(summary.excluded_count, 0);
        assert_eq!(summary.filter, filter);
        assert_eq!(summary.model.as_deref(), Some("gpt-4o"));
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json["id"].is_string());
    }
}
