use crate::config::GeneratorConfig;
use crate::error::Error;
use crate::llm::{LlmClient, OpenRouterClient};
use colored::Colorize;
use curricula_core::extract::{extract_structured, Extracted, Shape};
use curricula_core::mock::{generate_mock_curriculum, generate_mock_exam};
use curricula_core::prompt::{build_curriculum_prompt, build_exam_prompt, Prompt};
use curricula_core::render::{render_curriculum, render_exam};
use curricula_core::{
    CurriculumResponse, ExamQuestion, ExamRequest, ExamResponse, GenerationRequest, Generated,
    OutputFormat, Payload, Source, ValidationIssue,
};
use std::fmt;
use std::time::Duration;

pub mod curriculum;
pub mod exam;

/// Kind of content being generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Curriculum,
    Exam,
}

impl Task {
    pub fn max_tokens(&self) -> u32 {
        match self {
            Task::Curriculum => 4000,
            Task::Exam => 3000,
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Task::Curriculum => f.write_str("curriculum"),
            Task::Exam => f.write_str("exam"),
        }
    }
}

/// Error marker attached when the model replied but nothing could be extracted.
pub fn parse_error_message(format: OutputFormat) -> &'static str {
    match format {
        OutputFormat::Structured => "Failed to parse JSON response",
        OutputFormat::FreeText => "Failed to parse response",
    }
}

/// Runs one generation end to end: prompt, model call (or sample data) and reply
/// normalization. Never fails; the worst outcome is the raw reply plus an error
/// marker.
pub struct Orchestrator<C> {
    config: GeneratorConfig,
    client: C,
}

impl Orchestrator<OpenRouterClient> {
    pub fn from_config(config: GeneratorConfig) -> Result<Self, Error> {
        let client = OpenRouterClient::new(&config)?;
        Ok(Self::new(config, client))
    }
}

impl<C: LlmClient> Orchestrator<C> {
    pub fn new(config: GeneratorConfig, client: C) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub async fn generate_curriculum(
        &self,
        request: &GenerationRequest,
        budget: Duration,
    ) -> CurriculumResponse {
        let prompt = build_curriculum_prompt(
            &request.subject,
            &request.grade,
            request.duration_weeks,
            request.output_format,
        );
        let mock =
            || generate_mock_curriculum(&request.subject, &request.grade, request.duration_weeks);

        self.generate(
            Task::Curriculum,
            &prompt,
            request.output_format,
            budget,
            mock,
            render_curriculum,
        )
        .await
        .into()
    }

    pub async fn generate_exam(&self, request: &ExamRequest, budget: Duration) -> ExamResponse {
        let prompt = build_exam_prompt(
            &request.subject,
            &request.grade,
            request.week_number,
            &request.week_title,
            &request.learning_objectives,
            request.output_format,
        );
        let mock = || generate_mock_exam(&request.subject, &request.grade, request.week_number);
        let render = |questions: &[ExamQuestion]| {
            render_exam(
                &request.subject,
                &request.grade,
                request.week_number,
                questions,
            )
        };

        self.generate(
            Task::Exam,
            &prompt,
            request.output_format,
            budget,
            mock,
            render,
        )
        .await
        .into()
    }

    async fn generate<T, M, R>(
        &self,
        task: Task,
        prompt: &Prompt,
        format: OutputFormat,
        budget: Duration,
        mock: M,
        render: R,
    ) -> Generated<T>
    where
        T: Shape + Send,
        M: FnOnce() -> Vec<T> + Send,
        R: FnOnce(&[T]) -> String + Send,
    {
        if self.config.use_mock_data {
            log::info!("Mock mode enabled, serving sample {task}");
            return sample(mock(), Source::Mock, format, render);
        }

        let reply = match self.call(prompt, task.max_tokens(), budget).await {
            Ok(reply) => reply,
            Err(err) if err.is_external_call() => {
                log::warn!("{task} generation failed, serving sample data instead: {err}");
                return sample(mock(), Source::MockFallback, format, render);
            }
            Err(err) => {
                log::error!("{task} generation failed: {err}");
                return Generated {
                    payload: Payload::Text(String::new()),
                    text: None,
                    source: Source::Llm,
                    error: Some(err.to_string()),
                    issues: Vec::new(),
                };
            }
        };
        log::debug!("Model replied with {} characters", reply.len());

        let text = (format == OutputFormat::FreeText).then(|| reply.clone());
        match extract_structured::<T>(&reply) {
            Extracted::Parsed { items, issues } => {
                if !issues.is_empty() {
                    log::warn!(
                        "{task} reply parsed with {} flagged element(s)",
                        issues.len()
                    );
                }
                Generated {
                    payload: Payload::Structured(items),
                    text,
                    source: Source::Llm,
                    error: None,
                    issues,
                }
            }
            Extracted::MarkdownFallback { items, issues } => {
                log::info!(
                    "{task} reply held no JSON, rebuilt {} item(s) from markdown",
                    items.len()
                );
                Generated {
                    payload: Payload::Structured(items),
                    text,
                    source: Source::LlmMarkdown,
                    error: None,
                    issues,
                }
            }
            Extracted::Unparsable(err) => {
                log::warn!("Could not extract {task} from model reply: {err}");
                Generated {
                    payload: Payload::Text(reply),
                    text,
                    source: Source::Llm,
                    error: Some(parse_error_message(format).to_string()),
                    issues: Vec::new(),
                }
            }
        }
    }

    async fn call(&self, prompt: &Prompt, max_tokens: u32, budget: Duration) -> Result<String, Error> {
        tokio::time::timeout(budget, self.client.complete(prompt, max_tokens))
            .await
            .unwrap_or_else(|_| Err(Error::Timeout(budget.as_millis() as u64)))
    }
}

fn sample<T>(
    items: Vec<T>,
    source: Source,
    format: OutputFormat,
    render: impl FnOnce(&[T]) -> String,
) -> Generated<T> {
    let text = (format == OutputFormat::FreeText).then(|| render(&items));
    Generated {
        payload: Payload::Structured(items),
        text,
        source,
        error: None,
        issues: Vec::new(),
    }
}

/// One line describing where a result came from, for terminal output.
pub fn format_status(source: Source, error: Option<&str>) -> String {
    let mut status = match source {
        Source::Llm => "Source: language model".green().to_string(),
        Source::LlmMarkdown => "Source: language model (rebuilt from markdown)"
            .green()
            .to_string(),
        Source::Mock => "Source: sample data (mock mode)".cyan().to_string(),
        Source::MockFallback => "Source: sample data (model unavailable, degraded)"
            .yellow()
            .bold()
            .to_string(),
    };
    if let Some(error) = error {
        status.push_str(&format!("\n{}", format!("Error: {error}").red().bold()));
    }
    status
}

pub fn format_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|issue| {
            let label = match issue.number {
                Some(number) => format!("element {} (#{number})", issue.index),
                None => format!("element {}", issue.index),
            };
            format!("  - {label}: {}", issue.problems.join("; "))
                .yellow()
                .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
