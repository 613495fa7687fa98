use crate::error::RequestError;
use crate::types::OutputFormat;
use serde::Deserialize;
use serde_json::Value;

/// Upper bound on the number of weeks a single curriculum may span.
pub const MAX_WEEKS: u32 = 52;

/// A validated curriculum generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub subject: String,
    pub grade: String,
    pub duration_weeks: u32,
    pub output_format: OutputFormat,
}

impl GenerationRequest {
    pub fn new(
        subject: impl Into<String>,
        grade: impl Into<String>,
        duration_weeks: u32,
        output_format: OutputFormat,
    ) -> Result<Self, RequestError> {
        let subject = required_text("subject", subject.into())?;
        let grade = required_text("grade", grade.into())?;

        if duration_weeks == 0 {
            return Err(RequestError::MissingField("weeks"));
        }
        if duration_weeks > MAX_WEEKS {
            return Err(RequestError::InvalidField {
                field: "weeks",
                reason: format!("must be at most {MAX_WEEKS}"),
            });
        }

        Ok(Self {
            subject,
            grade,
            duration_weeks,
            output_format,
        })
    }
}

/// A validated exam generation request for a single week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamRequest {
    pub subject: String,
    pub grade: String,
    pub week_number: u32,
    pub week_title: String,
    pub learning_objectives: Vec<String>,
    pub output_format: OutputFormat,
}

impl ExamRequest {
    pub fn new(
        subject: impl Into<String>,
        grade: impl Into<String>,
        week_number: u32,
        week_title: impl Into<String>,
        learning_objectives: Vec<String>,
        output_format: OutputFormat,
    ) -> Result<Self, RequestError> {
        let subject = required_text("subject", subject.into())?;
        let grade = required_text("grade", grade.into())?;

        if week_number == 0 {
            return Err(RequestError::InvalidField {
                field: "weekNumber",
                reason: "must be a positive integer".to_string(),
            });
        }

        let learning_objectives: Vec<String> = learning_objectives
            .into_iter()
            .map(|objective| objective.trim().to_string())
            .filter(|objective| !objective.is_empty())
            .collect();
        if learning_objectives.is_empty() {
            return Err(RequestError::MissingField("learningObjectives"));
        }

        let week_title = week_title.into().trim().to_string();
        let week_title = if week_title.is_empty() {
            format!("Week {week_number}")
        } else {
            week_title
        };

        Ok(Self {
            subject,
            grade,
            week_number,
            week_title,
            learning_objectives,
            output_format,
        })
    }
}

fn required_text(field: &'static str, value: String) -> Result<String, RequestError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RequestError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

/// Body of an inbound "generate curriculum" call, before validation.
///
/// `weeks` arrives either as a number or as a numeric string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurriculumInput {
    pub subject: Option<String>,
    pub grade: Option<String>,
    pub weeks: Option<Value>,
    pub format: Option<String>,
    pub timeout_ms: Option<u64>,
}

impl CurriculumInput {
    pub fn validate(&self) -> Result<GenerationRequest, RequestError> {
        let subject = self
            .subject
            .clone()
            .ok_or(RequestError::MissingField("subject"))?;
        let grade = self
            .grade
            .clone()
            .ok_or(RequestError::MissingField("grade"))?;
        let weeks = match &self.weeks {
            None | Some(Value::Null) => return Err(RequestError::MissingField("weeks")),
            Some(value) => {
                as_count(value).ok_or_else(|| RequestError::InvalidField {
                    field: "weeks",
                    reason: format!("expected a positive integer, got {value}"),
                })?
            }
        };

        GenerationRequest::new(subject, grade, weeks, parse_format(self.format.as_deref()))
    }
}

/// Body of an inbound "generate exam" call, before validation.
///
/// `learningObjectives` may be a list or a newline separated string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamInput {
    pub subject: Option<String>,
    pub grade: Option<String>,
    pub week_number: Option<Value>,
    pub learning_objectives: Option<Value>,
    pub title: Option<String>,
    pub format: Option<String>,
    pub timeout_ms: Option<u64>,
}

impl ExamInput {
    pub fn validate(&self) -> Result<ExamRequest, RequestError> {
        let subject = self
            .subject
            .clone()
            .ok_or(RequestError::MissingField("subject"))?;
        let grade = self
            .grade
            .clone()
            .ok_or(RequestError::MissingField("grade"))?;
        let objectives = self
            .learning_objectives
            .as_ref()
            .map(objective_list)
            .unwrap_or_default();
        let week_number = match &self.week_number {
            None | Some(Value::Null) => 1,
            Some(value) => as_count(value).ok_or_else(|| RequestError::InvalidField {
                field: "weekNumber",
                reason: format!("expected a positive integer, got {value}"),
            })?,
        };

        ExamRequest::new(
            subject,
            grade,
            week_number,
            self.title.clone().unwrap_or_default(),
            objectives,
            parse_format(self.format.as_deref()),
        )
    }
}

fn parse_format(format: Option<&str>) -> OutputFormat {
    format.map(OutputFormat::from_wire).unwrap_or_default()
}

fn as_count(value: &Value) -> Option<u32> {
    match value {
        Value::Number(number) => number.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(text) => text.trim().parse::<u32>().ok(),
        _ => None,
    }
}

fn objective_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(text) => Some(text.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Value::String(text) => text
            .lines()
            .map(|line| line.trim().trim_start_matches(['-', '*']).trim().to_string())
            .collect(),
        _ => Vec::new(),
    }
}
