//! Normalization of untrusted model replies into curriculum and exam data.
//!
//! A reply is first searched for a fenced code block; its interior (or the whole
//! reply when there is none) is parsed as JSON. A JSON array is accepted as is, and
//! an object holding the array under the shape's wrapper key is unwrapped exactly one
//! level. Anything that does not parse falls back to [`crate::markdown`].

use crate::error::ExtractionError;
use crate::markdown;
use crate::types::{
    Activity, ExamQuestion, QuestionKind, ValidationIssue, WeekPlan, ACTIVITY_KEYS, ANSWER_KEYS,
    ASSESSMENT_KEYS, KIND_KEYS, MATERIAL_KEYS, OBJECTIVE_KEYS, OPTION_KEYS, QUESTION_NUMBER_KEYS,
    TEXT_KEYS, TITLE_KEYS, WEEK_NUMBER_KEYS,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

const FENCE: &str = "```";

/// A target shape the extractor can produce.
pub trait Shape: DeserializeOwned + Sized {
    /// Object key a model may wrap the array under.
    const WRAPPER_KEY: &'static str;
    /// Unit name used in issue messages.
    const UNIT: &'static str;
    /// Mandatory fields, each listed with every key it may appear under.
    const REQUIRED: &'static [(&'static str, &'static [&'static str])];

    /// Salvage whatever is usable from an element that failed to deserialize.
    fn from_value_lossy(value: &Value, index: usize) -> Self;

    /// Rebuild the shape from a markdown reply.
    fn from_markdown(text: &str) -> Vec<Self>;

    fn number(&self) -> u32;

    /// Restore invariants the wire format cannot express.
    fn normalize(&mut self) {}
}

/// Outcome of [`extract_structured`].
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted<T> {
    /// The reply contained JSON of the expected shape.
    Parsed {
        items: Vec<T>,
        issues: Vec<ValidationIssue>,
    },
    /// No usable JSON; the items were rebuilt from markdown headings.
    MarkdownFallback {
        items: Vec<T>,
        issues: Vec<ValidationIssue>,
    },
    Unparsable(ExtractionError),
}

impl<T> Extracted<T> {
    pub fn into_result(self) -> Result<Vec<T>, ExtractionError> {
        match self {
            Extracted::Parsed { items, .. } | Extracted::MarkdownFallback { items, .. } => Ok(items),
            Extracted::Unparsable(error) => Err(error),
        }
    }
}

/// Normalize a raw model reply into a sequence of `T`.
///
/// Never panics and never drops parsed elements: elements with missing or
/// malformed fields are kept and reported in `issues`.
pub fn extract_structured<T: Shape>(raw: &str) -> Extracted<T> {
    let candidate = find_fenced_block(raw)
        .unwrap_or(raw)
        .trim()
        .trim_start_matches('\u{feff}');

    if let Some(elements) = parse_candidate(candidate, T::WRAPPER_KEY) {
        let (items, issues) = validate_elements::<T>(elements);
        return Extracted::Parsed { items, issues };
    }

    let items = T::from_markdown(raw);
    if items.is_empty() {
        return Extracted::Unparsable(ExtractionError::unparsable(raw));
    }

    let issues = items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let problem = sequence_problem::<T>(index, item.number())?;
            Some(ValidationIssue {
                index,
                number: Some(item.number()),
                problems: vec![problem],
            })
        })
        .collect();
    Extracted::MarkdownFallback { items, issues }
}

pub fn extract_curriculum(raw: &str) -> Extracted<WeekPlan> {
    extract_structured(raw)
}

pub fn extract_exam(raw: &str) -> Extracted<ExamQuestion> {
    extract_structured(raw)
}

/// Interior of the first fenced code block in `text`.
///
/// The opening fence may carry a single-word info string such as `json`. A fence
/// that is never closed does not count as a block.
pub fn find_fenced_block(text: &str) -> Option<&str> {
    let start = text.find(FENCE)?;
    let after = &text[start + FENCE.len()..];

    let body_start = match after.find('\n') {
        Some(newline) if is_info_string(&after[..newline]) => newline + 1,
        _ => 0,
    };
    let body = &after[body_start..];
    let end = body.find(FENCE)?;

    Some(&body[..end])
}

fn is_info_string(text: &str) -> bool {
    text.trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '.'))
}

fn parse_candidate(candidate: &str, wrapper_key: &str) -> Option<Vec<Value>> {
    let value: Value = serde_json::from_str(candidate).ok()?;

    let elements = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove(wrapper_key) {
            Some(Value::Array(items)) => items,
            _ => return None,
        },
        _ => return None,
    };

    // An empty array carries nothing to render; treat it like a failed parse.
    if elements.is_empty() {
        None
    } else {
        Some(elements)
    }
}

fn validate_elements<T: Shape>(elements: Vec<Value>) -> (Vec<T>, Vec<ValidationIssue>) {
    let mut items = Vec::with_capacity(elements.len());
    let mut issues = Vec::new();

    for (index, element) in elements.iter().enumerate() {
        let mut problems = missing_fields(element, T::REQUIRED);

        let mut item = match T::deserialize(element) {
            Ok(item) => item,
            Err(err) => {
                if problems.is_empty() {
                    problems.push(format!("malformed {}: {err}", T::UNIT));
                }
                T::from_value_lossy(element, index)
            }
        };

        item.normalize();

        if let Some(problem) = sequence_problem::<T>(index, item.number()) {
            problems.push(problem);
        }

        if !problems.is_empty() {
            issues.push(ValidationIssue {
                index,
                number: Some(item.number()),
                problems,
            });
        }
        items.push(item);
    }

    (items, issues)
}

fn sequence_problem<T: Shape>(index: usize, number: u32) -> Option<String> {
    let expected = index as u32 + 1;
    (number != expected).then(|| {
        format!(
            "out of sequence: expected {} {expected}, found {number}",
            T::UNIT
        )
    })
}

fn missing_fields(element: &Value, required: &[(&str, &[&str])]) -> Vec<String> {
    let Some(map) = element.as_object() else {
        return vec!["not an object".to_string()];
    };

    required
        .iter()
        .filter(|(_, keys)| lookup(map, keys).is_none())
        .map(|(name, _)| format!("missing {name}"))
        .collect()
}

impl Shape for WeekPlan {
    const WRAPPER_KEY: &'static str = "curriculum";
    const UNIT: &'static str = "week";
    const REQUIRED: &'static [(&'static str, &'static [&'static str])] = &[
        ("week", WEEK_NUMBER_KEYS),
        ("title", TITLE_KEYS),
        ("learning_objectives", OBJECTIVE_KEYS),
    ];

    fn from_value_lossy(value: &Value, index: usize) -> Self {
        let position = index as u32 + 1;

        let map = match value {
            Value::Object(map) => map,
            Value::String(title) => return WeekPlan::empty(position, title.trim()),
            _ => return WeekPlan::empty(position, ""),
        };

        let week_number = lookup(map, WEEK_NUMBER_KEYS)
            .and_then(as_number)
            .unwrap_or(position);
        let title = lookup(map, TITLE_KEYS).map(as_text).unwrap_or_default();

        WeekPlan {
            learning_objectives: list_field(map, OBJECTIVE_KEYS),
            activities: lookup(map, ACTIVITY_KEYS)
                .map(as_activities)
                .unwrap_or_default(),
            required_materials: list_field(map, MATERIAL_KEYS),
            assessment_strategies: list_field(map, ASSESSMENT_KEYS),
            ..WeekPlan::empty(week_number, title)
        }
    }

    fn from_markdown(text: &str) -> Vec<Self> {
        markdown::parse_curriculum(text)
    }

    fn number(&self) -> u32 {
        self.week_number
    }
}

impl Shape for ExamQuestion {
    const WRAPPER_KEY: &'static str = "exam";
    const UNIT: &'static str = "question";
    const REQUIRED: &'static [(&'static str, &'static [&'static str])] = &[
        ("question_number", QUESTION_NUMBER_KEYS),
        ("type", KIND_KEYS),
        ("question_text", TEXT_KEYS),
        ("correct_answer", ANSWER_KEYS),
    ];

    fn from_value_lossy(value: &Value, index: usize) -> Self {
        let position = index as u32 + 1;

        let Value::Object(map) = value else {
            let text = match value {
                Value::String(text) => text.trim().to_string(),
                _ => String::new(),
            };
            return ExamQuestion {
                question_number: position,
                kind: QuestionKind::ShortAnswer,
                text,
                options: Vec::new(),
                correct_answer: String::new(),
            };
        };

        let options = list_field(map, OPTION_KEYS);
        let correct_answer = lookup(map, ANSWER_KEYS).map(as_text).unwrap_or_default();
        let kind = lookup(map, KIND_KEYS)
            .and_then(Value::as_str)
            .and_then(|kind| kind.parse::<QuestionKind>().ok())
            .unwrap_or_else(|| QuestionKind::infer(&options, &correct_answer));

        ExamQuestion {
            question_number: lookup(map, QUESTION_NUMBER_KEYS)
                .and_then(as_number)
                .unwrap_or(position),
            kind,
            text: lookup(map, TEXT_KEYS).map(as_text).unwrap_or_default(),
            options,
            correct_answer,
        }
    }

    fn from_markdown(text: &str) -> Vec<Self> {
        markdown::parse_exam(text)
    }

    fn number(&self) -> u32 {
        self.question_number
    }

    fn normalize(&mut self) {
        if self.kind != QuestionKind::MultipleChoice {
            self.options.clear();
        }
    }
}

fn lookup<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| map.get(*key))
        .find(|value| !value.is_null())
}

fn as_number(value: &Value) -> Option<u32> {
    match value {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64))
            .and_then(|n| u32::try_from(n).ok()),
        Value::String(text) => text
            .trim()
            .trim_start_matches(|c: char| !c.is_ascii_digit())
            .split(|c: char| !c.is_ascii_digit())
            .next()
            .and_then(|digits| digits.parse().ok()),
        _ => None,
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.trim().to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn as_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(as_text)
            .filter(|item| !item.is_empty())
            .collect(),
        Value::String(text) => text
            .lines()
            .map(|line| line.trim().trim_start_matches(['-', '*', '•']).trim())
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        Value::Null => Vec::new(),
        other => vec![as_text(other)],
    }
}

fn list_field(map: &Map<String, Value>, keys: &[&str]) -> Vec<String> {
    lookup(map, keys).map(as_list).unwrap_or_default()
}

fn as_activities(value: &Value) -> Vec<Activity> {
    let items = match value {
        Value::Array(items) => items.as_slice(),
        other => std::slice::from_ref(other),
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(Activity {
                name: lookup(map, &["activity", "name", "title"])
                    .map(as_text)
                    .unwrap_or_default(),
                description: lookup(map, &["description", "details"])
                    .map(as_text)
                    .unwrap_or_default(),
            }),
            Value::String(text) => {
                let text = text.trim();
                Some(match text.split_once(':') {
                    Some((name, description)) => Activity {
                        name: name.trim().to_string(),
                        description: description.trim().to_string(),
                    },
                    None => Activity {
                        name: text.to_string(),
                        description: String::new(),
                    },
                })
            }
            _ => None,
        })
        .collect()
}
