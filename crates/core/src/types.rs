use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Field names a week number may appear under in model output.
pub(crate) const WEEK_NUMBER_KEYS: &[&str] = &["week", "weekNumber", "week_number"];
pub(crate) const TITLE_KEYS: &[&str] = &["title"];
pub(crate) const OBJECTIVE_KEYS: &[&str] =
    &["learning_objectives", "learningObjectives", "objectives"];
pub(crate) const ACTIVITY_KEYS: &[&str] =
    &["classroom_activities", "activities", "classroomActivities"];
pub(crate) const MATERIAL_KEYS: &[&str] =
    &["required_materials", "requiredMaterials", "materials"];
pub(crate) const ASSESSMENT_KEYS: &[&str] =
    &["assessment_strategies", "assessmentStrategies", "assessment"];

pub(crate) const QUESTION_NUMBER_KEYS: &[&str] = &["question_number", "questionNumber", "number"];
pub(crate) const KIND_KEYS: &[&str] = &["type", "kind", "question_type"];
pub(crate) const TEXT_KEYS: &[&str] = &["question_text", "text", "question", "questionText"];
pub(crate) const OPTION_KEYS: &[&str] = &["options", "choices"];
pub(crate) const ANSWER_KEYS: &[&str] = &["correct_answer", "correctAnswer", "answer"];

/// Whether the model is asked for machine-parsable data or prose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Structured,
    FreeText,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Structured => "json",
            OutputFormat::FreeText => "text",
        }
    }

    /// Parse the inbound `format` value.
    ///
    /// Only `json` and `structured` select structured output; every other value
    /// asks for prose.
    pub fn from_wire(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" | "structured" => OutputFormat::Structured,
            _ => OutputFormat::FreeText,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classroom activity inside a week.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Activity {
    #[serde(rename = "activity", alias = "name", alias = "title")]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// One week of curriculum content.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WeekPlan {
    #[serde(rename = "week", alias = "weekNumber", alias = "week_number")]
    pub week_number: u32,
    pub title: String,
    #[serde(default, alias = "learningObjectives", alias = "objectives")]
    pub learning_objectives: Vec<String>,
    #[serde(
        default,
        rename = "classroom_activities",
        alias = "activities",
        alias = "classroomActivities"
    )]
    pub activities: Vec<Activity>,
    #[serde(default, alias = "requiredMaterials", alias = "materials")]
    pub required_materials: Vec<String>,
    #[serde(default, alias = "assessmentStrategies", alias = "assessment")]
    pub assessment_strategies: Vec<String>,
}

impl WeekPlan {
    /// An empty week; the title defaults to "Week N".
    pub fn empty(week_number: u32, title: impl Into<String>) -> Self {
        let title = title.into();
        let title = if title.trim().is_empty() {
            format!("Week {week_number}")
        } else {
            title
        };

        Self {
            week_number,
            title,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuestionKind {
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice => "multiple-choice",
            QuestionKind::TrueFalse => "true/false",
            QuestionKind::ShortAnswer => "short answer",
        }
    }

    /// Guess the kind of a question that did not declare one.
    pub fn infer(options: &[String], correct_answer: &str) -> Self {
        if !options.is_empty() {
            QuestionKind::MultipleChoice
        } else if is_boolean_answer(correct_answer) {
            QuestionKind::TrueFalse
        } else {
            QuestionKind::ShortAnswer
        }
    }
}

pub(crate) fn is_boolean_answer(answer: &str) -> bool {
    matches!(
        answer.trim().trim_end_matches('.').to_ascii_lowercase().as_str(),
        "true" | "false"
    )
}

impl FromStr for QuestionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match normalized.as_str() {
            "multiplechoice" | "multiple" | "choice" | "mcq" | "mc" => {
                Ok(QuestionKind::MultipleChoice)
            }
            "truefalse" | "trueorfalse" | "tf" | "boolean" => Ok(QuestionKind::TrueFalse),
            "shortanswer" | "short" | "open" | "openended" | "freeresponse" => {
                Ok(QuestionKind::ShortAnswer)
            }
            _ => Err(format!("Unknown question type: {s}")),
        }
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for QuestionKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for QuestionKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// One assessment item tied to a week's objectives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamQuestion {
    #[serde(
        rename = "question_number",
        alias = "questionNumber",
        alias = "number"
    )]
    pub question_number: u32,
    #[serde(rename = "type", alias = "kind", alias = "question_type")]
    pub kind: QuestionKind,
    #[serde(
        rename = "question_text",
        alias = "text",
        alias = "question",
        alias = "questionText"
    )]
    pub text: String,
    #[serde(default, alias = "choices", skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(alias = "correctAnswer", alias = "answer")]
    pub correct_answer: String,
}

/// Problems found on a single element of a parsed model reply.
///
/// The element itself is kept in the output; this only records what was wrong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Position of the element in the reply (0-indexed)
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
    pub problems: Vec<String>,
}

/// Where the returned data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Generated by the language model
    Llm,
    /// Generated by the language model, rebuilt from markdown because the reply
    /// held no usable JSON
    LlmMarkdown,
    /// Sample data, because mock mode is enabled
    Mock,
    /// Sample data substituted after the model call failed
    MockFallback,
}

/// Structured data when extraction succeeded, raw model text otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Payload<T> {
    Structured(Vec<T>),
    Text(String),
}

impl<T> Payload<T> {
    pub fn as_structured(&self) -> Option<&[T]> {
        match self {
            Payload::Structured(items) => Some(items),
            Payload::Text(_) => None,
        }
    }
}

/// Result of one generation, before it is given its wire field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated<T> {
    pub payload: Payload<T>,
    /// Prose version of the result, present for free-text requests
    pub text: Option<String>,
    pub source: Source,
    pub error: Option<String>,
    pub issues: Vec<ValidationIssue>,
}

impl<T> Generated<T> {
    pub fn degraded(&self) -> bool {
        self.source == Source::MockFallback
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurriculumResponse {
    pub curriculum: Payload<WeekPlan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub source: Source,
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<ValidationIssue>,
}

impl From<Generated<WeekPlan>> for CurriculumResponse {
    fn from(generated: Generated<WeekPlan>) -> Self {
        Self {
            degraded: generated.degraded(),
            curriculum: generated.payload,
            text: generated.text,
            source: generated.source,
            error: generated.error,
            issues: generated.issues,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExamResponse {
    pub exam: Payload<ExamQuestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub source: Source,
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<ValidationIssue>,
}

impl From<Generated<ExamQuestion>> for ExamResponse {
    fn from(generated: Generated<ExamQuestion>) -> Self {
        Self {
            degraded: generated.degraded(),
            exam: generated.payload,
            text: generated.text,
            source: generated.source,
            error: generated.error,
            issues: generated.issues,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_from_wire() {
        assert_eq!(OutputFormat::from_wire("json"), OutputFormat::Structured);
        assert_eq!(OutputFormat::from_wire(" JSON "), OutputFormat::Structured);
        assert_eq!(OutputFormat::from_wire("structured"), OutputFormat::Structured);
        assert_eq!(OutputFormat::from_wire("text"), OutputFormat::FreeText);
        assert_eq!(OutputFormat::from_wire("markdown"), OutputFormat::FreeText);
    }

    #[test]
    fn test_question_kind_spellings() {
        for raw in ["multiple-choice", "Multiple Choice", "multiple_choice", "MCQ"] {
            assert_eq!(raw.parse::<QuestionKind>(), Ok(QuestionKind::MultipleChoice));
        }
        for raw in ["true/false", "True-False", "true_or_false", "boolean"] {
            assert_eq!(raw.parse::<QuestionKind>(), Ok(QuestionKind::TrueFalse));
        }
        for raw in ["short answer", "short-answer", "open ended"] {
            assert_eq!(raw.parse::<QuestionKind>(), Ok(QuestionKind::ShortAnswer));
        }
        assert!("essay".parse::<QuestionKind>().is_err());
    }

    #[test]
    fn test_question_kind_infer() {
        let options = vec!["a) one".to_string(), "b) two".to_string()];
        assert_eq!(
            QuestionKind::infer(&options, "a) one"),
            QuestionKind::MultipleChoice
        );
        assert_eq!(QuestionKind::infer(&[], "False."), QuestionKind::TrueFalse);
        assert_eq!(
            QuestionKind::infer(&[], "Any relevant skill"),
            QuestionKind::ShortAnswer
        );
    }

    #[test]
    fn test_week_plan_accepts_camel_case_aliases() {
        let json = r#"{
            "weekNumber": 2,
            "title": "Fractions",
            "learningObjectives": ["Add fractions"],
            "activities": [{"name": "Pizza slices", "description": "Split a paper pizza"}],
            "requiredMaterials": ["Paper plates"],
            "assessmentStrategies": ["Exit ticket"]
        }"#;

        let week: WeekPlan = serde_json::from_str(json).unwrap();

        assert_eq!(week.week_number, 2);
        assert_eq!(week.learning_objectives, vec!["Add fractions"]);
        assert_eq!(week.activities[0].name, "Pizza slices");
        assert_eq!(week.required_materials, vec!["Paper plates"]);
        assert_eq!(week.assessment_strategies, vec!["Exit ticket"]);
    }

    #[test]
    fn test_week_plan_serializes_prompt_schema_names() {
        let week = WeekPlan::empty(1, "Intro");
        let json = serde_json::to_string(&week).unwrap();

        assert!(json.contains("\"week\":1"));
        assert!(json.contains("\"classroom_activities\":[]"));
        assert!(json.contains("\"learning_objectives\":[]"));
    }

    #[test]
    fn test_empty_week_title_defaults() {
        assert_eq!(WeekPlan::empty(4, "  ").title, "Week 4");
        assert_eq!(WeekPlan::empty(4, "Poetry").title, "Poetry");
    }

    #[test]
    fn test_payload_serializes_untagged() {
        let text: Payload<WeekPlan> = Payload::Text("raw".to_string());
        assert_eq!(serde_json::to_string(&text).unwrap(), "\"raw\"");

        let structured: Payload<WeekPlan> = Payload::Structured(vec![]);
        assert_eq!(serde_json::to_string(&structured).unwrap(), "[]");
    }

    #[test]
    fn test_response_degraded_follows_source() {
        let generated = Generated::<ExamQuestion> {
            payload: Payload::Structured(vec![]),
            text: None,
            source: Source::MockFallback,
            error: None,
            issues: vec![],
        };

        let response = ExamResponse::from(generated);
        assert!(response.degraded);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["source"], "mock_fallback");
        assert!(json.get("error").is_none());
        assert!(json.get("issues").is_none());
    }

    #[test]
    fn test_markdown_source_is_not_degraded() {
        let generated = Generated::<WeekPlan> {
            payload: Payload::Structured(vec![]),
            text: None,
            source: Source::LlmMarkdown,
            error: None,
            issues: vec![],
        };

        assert!(!generated.degraded());
        assert_eq!(
            serde_json::to_value(generated.source).unwrap(),
            "llm_markdown"
        );
    }
}
