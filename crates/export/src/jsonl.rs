//! JSONL serialization, download bundles, file validation and preview.

use crate::validator::{ValidationIssue, Validator};
use callmill_core::TrainingExample;
use callmill_estimate::Split;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const SINGLE_FILE_NAME: &str = "training_data.jsonl";
pub const TRAIN_FILE_NAME: &str = "train.jsonl";
pub const VALIDATION_FILE_NAME: &str = "validation.jsonl";

/// One compact JSON object per line, each line newline-terminated.
///
/// An empty dataset serializes to an empty string.
pub fn to_jsonl(examples: &[TrainingExample]) -> Result<String, serde_json::Error> {
    let mut out = String::new();
    for example in examples {
        out.push_str(&serde_json::to_string(example)?);
        out.push('\n');
    }
    Ok(out)
}

/// Files offered for download after an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadBundle {
    Single { data: String },
    Split { train: String, validation: String },
}

impl DownloadBundle {
    pub fn single(examples: &[TrainingExample]) -> Result<Self, serde_json::Error> {
        Ok(Self::Single {
            data: to_jsonl(examples)?,
        })
    }

    pub fn split(split: &Split<TrainingExample>) -> Result<Self, serde_json::Error> {
        Ok(Self::Split {
            train: to_jsonl(&split.train)?,
            validation: to_jsonl(&split.validation)?,
        })
    }

    /// `(file name, contents)` pairs.
    pub fn files(&self) -> Vec<(&'static str, &str)> {
        match self {
            Self::Single { data } => vec![(SINGLE_FILE_NAME, data.as_str())],
            Self::Split { train, validation } => vec![
                (TRAIN_FILE_NAME, train.as_str()),
                (VALIDATION_FILE_NAME, validation.as_str()),
            ],
        }
    }

    /// Write every file into `dir`, creating it if needed.
    pub fn write_to(&self, dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;
        let mut written = Vec::new();
        for (name, contents) in self.files() {
            let path = dir.join(name);
            std::fs::write(&path, contents)?;
            tracing::debug!(path = %path.display(), bytes = contents.len(), "Wrote export file");
            written.push(path);
        }
        Ok(written)
    }
}

/// Problems found on one line of a JSONL file (1-based line number).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineIssues {
    pub line: usize,
    pub errors: Vec<String>,
}

/// Result of validating a JSONL file.
#[derive(Debug, Clone, Default)]
pub struct JsonlReport {
    /// Examples that parsed and passed validation
    pub examples: Vec<TrainingExample>,

    /// Lines that failed to parse or validate
    pub invalid: Vec<LineIssues>,

    /// Per-line and dataset warnings
    pub warnings: Vec<String>,

    /// Estimated tokens over the valid examples
    pub total_tokens: usize,
}

impl JsonlReport {
    pub fn line_count(&self) -> usize {
        self.examples.len() + self.invalid.len()
    }

    pub fn is_valid(&self) -> bool {
        self.invalid.is_empty()
    }
}

/// Parse and validate every non-blank line of a JSONL document.
pub fn validate_jsonl(text: &str, validator: &Validator<'_>) -> JsonlReport {
    let mut report = JsonlReport::default();

    for (i, raw) in text.lines().enumerate() {
        let line = i + 1;
        if raw.trim().is_empty() {
            continue;
        }
        let example: TrainingExample = match serde_json::from_str(raw) {
            Ok(example) => example,
            Err(e) => {
                report.invalid.push(LineIssues {
                    line,
                    errors: vec![format!("invalid JSON: {e}")],
                });
                continue;
            }
        };

        let result = validator.validate(&example);
        report.warnings.extend(
            result
                .warnings
                .iter()
                .map(|w: &ValidationIssue| format!("line {line}: {w}")),
        );
        if result.is_valid() {
            report.total_tokens += result.tokens;
            report.examples.push(example);
        } else {
            report.invalid.push(LineIssues {
                line,
                errors: result.error_messages(),
            });
        }
    }

    report
        .warnings
        .extend(validator.dataset_warnings(report.examples.len()));
    report
}

/// Pretty-printed first `count` examples, each cut to `max_chars`.
pub fn preview(
    examples: &[TrainingExample],
    count: usize,
    max_chars: usize,
) -> Result<String, serde_json::Error> {
    let mut out = String::new();
    for (i, example) in examples.iter().take(count).enumerate() {
        let pretty = serde_json::to_string_pretty(example)?;
        out.push_str(&format!("── Example {} ──\n", i + 1));
        out.push_str(&truncate(&pretty, max_chars));
        out.push('\n');
    }
    if examples.len() > count {
        out.push_str(&format!("… {} more\n", examples.len() - count));
    }
    Ok(out)
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}… [truncated]", &text[..cut]),
        None => text.to_string(),
    }
}
