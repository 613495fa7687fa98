//! Best-effort reconstruction of curricula and exams from markdown replies.
//!
//! The text is scanned line by line with a small recursive-descent reader:
//!
//! ```text
//! curriculum := preamble week*
//! week       := WEEK_HEADING (section | stray)*
//! section    := SECTION_HEADER item*
//!
//! exam       := preamble question*
//! question   := QUESTION_HEADING (option | answer | type | text)*
//! ```
//!
//! Unit numbers come from the headings. Missing sections leave the matching
//! field empty; nothing here fails.

use crate::types::{is_boolean_answer, Activity, ExamQuestion, QuestionKind, WeekPlan};
use regex::Regex;
use std::sync::OnceLock;

fn week_heading_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(?:#{1,6}\s*|\*\*)\s*week\s+(\d+)\s*(?:\*\*)?\s*[:.\-–—]?\s*(.*?)\s*(?:\*\*)?$")
            .unwrap()
    })
}

fn question_heading_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^(?:#{1,6}\s*|\*\*)\s*question\s+(\d+)\s*(?:\*\*)?\s*[:.)\-–—]?\s*(.*?)\s*(?:\*\*)?$",
        )
        .unwrap()
    })
}

fn bullet_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:[-*+•]|\d{1,3}[.)])\s+(.*)$").unwrap())
}

fn lettered_option_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-hA-H][).]\s+\S").unwrap())
}

/// Curriculum sub-sections recognized inside a week.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Objectives,
    Activities,
    Materials,
    Assessment,
}

/// Label prefixes, longest first so "learning objectives" wins over "objectives".
const SECTION_LABELS: &[(&str, Section)] = &[
    ("learning objectives", Section::Objectives),
    ("objectives", Section::Objectives),
    ("classroom activities", Section::Activities),
    ("activities", Section::Activities),
    ("required materials", Section::Materials),
    ("materials", Section::Materials),
    ("assessment strategies", Section::Assessment),
    ("assessment", Section::Assessment),
];

/// Forward-only reader over trimmed lines.
struct Cursor<'a> {
    lines: Vec<&'a str>,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().map(str::trim).collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<&'a str> {
        self.lines.get(self.pos).copied()
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn next_line(&mut self) -> Option<&'a str> {
        let line = self.peek()?;
        self.advance();
        Some(line)
    }
}

/// Rebuild curriculum weeks from `## Week N: Title` style markdown.
pub fn parse_curriculum(text: &str) -> Vec<WeekPlan> {
    let mut cursor = Cursor::new(text);
    let mut weeks = Vec::new();

    while let Some(line) = cursor.next_line() {
        if let Some((number, title)) = week_heading(line) {
            weeks.push(parse_week(&mut cursor, number, &title));
        }
    }

    weeks
}

/// Rebuild exam questions from `## Question N` style markdown.
pub fn parse_exam(text: &str) -> Vec<ExamQuestion> {
    let mut cursor = Cursor::new(text);
    let mut questions = Vec::new();

    while let Some(line) = cursor.next_line() {
        if let Some((number, inline)) = question_heading(line) {
            questions.push(parse_question(&mut cursor, number, &inline));
        }
    }

    questions
}

fn parse_week(cursor: &mut Cursor<'_>, number: u32, title: &str) -> WeekPlan {
    let mut week = WeekPlan::empty(number, title);

    while let Some(line) = cursor.peek() {
        if week_heading(line).is_some() {
            break;
        }
        cursor.advance();

        let Some((section, inline)) = section_header(line) else {
            continue;
        };
        match section {
            Section::Objectives => week.learning_objectives = parse_list(cursor, &inline),
            Section::Activities => week.activities = parse_activities(cursor, &inline),
            Section::Materials => week.required_materials = parse_list(cursor, &inline),
            Section::Assessment => week.assessment_strategies = parse_list(cursor, &inline),
        }
    }

    week
}

fn parse_list(cursor: &mut Cursor<'_>, inline: &str) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    if !inline.is_empty() {
        items.push(inline.to_string());
    }

    while let Some(line) = cursor.peek() {
        if ends_section(line) || heading_level(line).is_some() {
            break;
        }
        cursor.advance();

        if line.is_empty() {
            continue;
        }
        match bullet(line) {
            Some(item) => items.push(clean(item)),
            None => match items.last_mut() {
                Some(last) => append(last, &clean(line)),
                None => items.push(clean(line)),
            },
        }
    }

    items.retain(|item| !item.is_empty());
    items
}

fn parse_activities(cursor: &mut Cursor<'_>, inline: &str) -> Vec<Activity> {
    let mut activities: Vec<Activity> = Vec::new();
    // True while the last activity was introduced by a heading, in which case
    // following lines (bulleted or not) describe it.
    let mut under_heading = false;

    if !inline.is_empty() {
        activities.push(activity_from_item(inline));
    }

    while let Some(line) = cursor.peek() {
        if ends_section(line) || matches!(heading_level(line), Some(level) if level < 4) {
            break;
        }
        cursor.advance();

        if line.is_empty() {
            continue;
        }
        // A deeper heading that is not a section label names an activity.
        if heading_level(line).is_some() {
            let name = clean(line.trim_start_matches('#'));
            activities.push(Activity {
                name,
                description: String::new(),
            });
            under_heading = true;
            continue;
        }

        match bullet(line) {
            Some(item) if under_heading => {
                if let Some(last) = activities.last_mut() {
                    append(&mut last.description, &clean(item));
                }
            }
            Some(item) => activities.push(activity_from_item(item)),
            None => match activities.last_mut() {
                Some(last) => append(&mut last.description, &clean(line)),
                None => activities.push(activity_from_item(line)),
            },
        }
    }

    activities
}

fn parse_question(cursor: &mut Cursor<'_>, number: u32, inline: &str) -> ExamQuestion {
    let mut text = clean(inline);
    let mut options = Vec::new();
    let mut answer = String::new();
    let mut declared_kind = None;

    while let Some(line) = cursor.peek() {
        if question_heading(line).is_some() || matches!(heading_level(line), Some(level) if level <= 2)
        {
            break;
        }
        cursor.advance();

        if line.is_empty() || is_rule(line) || heading_level(line).is_some() {
            continue;
        }

        let content = bullet(line).unwrap_or(line);
        let cleaned = clean(content);

        if let Some(value) = labelled(&cleaned, &["correct answer", "answer"]) {
            answer = value.to_string();
        } else if let Some(value) = labelled(&cleaned, &["question type", "type"]) {
            declared_kind = value.parse::<QuestionKind>().ok();
        } else if bullet(line).is_some() || lettered_option_regex().is_match(line) {
            options.push(cleaned);
        } else {
            append(&mut text, &cleaned);
        }
    }

    // Bulleted "True"/"False" choices describe a true/false question, not options.
    if options.len() == 2 && options.iter().all(|option| is_boolean_answer(strip_letter(option))) {
        options.clear();
        declared_kind = declared_kind.or(Some(QuestionKind::TrueFalse));
    }

    let kind = declared_kind.unwrap_or_else(|| QuestionKind::infer(&options, &answer));
    if kind != QuestionKind::MultipleChoice {
        options.clear();
    }

    ExamQuestion {
        question_number: number,
        kind,
        text,
        options,
        correct_answer: answer,
    }
}

fn week_heading(line: &str) -> Option<(u32, String)> {
    unit_heading(week_heading_regex(), line)
}

fn question_heading(line: &str) -> Option<(u32, String)> {
    unit_heading(question_heading_regex(), line)
}

fn unit_heading(regex: &Regex, line: &str) -> Option<(u32, String)> {
    let caps = regex.captures(line)?;
    let number = caps.get(1)?.as_str().parse::<u32>().ok()?;
    let rest = caps.get(2).map(|m| clean(m.as_str())).unwrap_or_default();
    Some((number, rest))
}

/// Recognize a curriculum sub-section header and return any text that follows
/// its label on the same line.
///
/// Headers are headings of any level, bold lines, or lines with a colon, whose
/// text starts with a section label.
fn section_header(line: &str) -> Option<(Section, String)> {
    if bullet(line).is_some() {
        return None;
    }

    let level = heading_level(line);
    let bare = clean(line.trim_start_matches('#'));
    let is_label_line = level.is_some() || line.starts_with("**") || bare.contains(':');
    if !is_label_line {
        return None;
    }

    let lower = bare.to_lowercase();
    let (_, section) = SECTION_LABELS
        .iter()
        .find(|(label, _)| lower.starts_with(label))?;

    let inline = match bare.split_once(':') {
        Some((_, rest)) => rest.trim().to_string(),
        None => String::new(),
    };

    Some((*section, inline))
}

fn ends_section(line: &str) -> bool {
    is_rule(line) || week_heading(line).is_some() || section_header(line).is_some()
}

fn heading_level(line: &str) -> Option<usize> {
    let level = line.chars().take_while(|c| *c == '#').count();
    if (1..=6).contains(&level) {
        Some(level)
    } else {
        None
    }
}

fn is_rule(line: &str) -> bool {
    line.len() >= 3
        && (line.chars().all(|c| c == '-')
            || line.chars().all(|c| c == '*')
            || line.chars().all(|c| c == '_'))
}

fn bullet(line: &str) -> Option<&str> {
    if is_rule(line) {
        return None;
    }
    bullet_regex()
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Value of a `Label: value` line when it starts with one of `labels`.
fn labelled<'a>(line: &'a str, labels: &[&str]) -> Option<&'a str> {
    let (label, value) = line.split_once(':')?;
    let label = label.trim().to_lowercase();
    labels
        .iter()
        .any(|candidate| label == *candidate)
        .then(|| value.trim())
}

fn activity_from_item(item: &str) -> Activity {
    let item = clean(item);

    let split = item
        .split_once(':')
        .or_else(|| item.split_once(" - "))
        .or_else(|| item.split_once(" – "))
        .or_else(|| item.split_once(" — "));

    match split {
        Some((name, description)) => Activity {
            name: name.trim().to_string(),
            description: description.trim().to_string(),
        },
        None => Activity {
            name: item,
            description: String::new(),
        },
    }
}

fn strip_letter(option: &str) -> &str {
    if lettered_option_regex().is_match(option) {
        option[2..].trim()
    } else {
        option
    }
}

fn clean(text: &str) -> String {
    text.replace("**", "").trim().to_string()
}

fn append(target: &mut String, addition: &str) {
    if addition.is_empty() {
        return;
    }
    if !target.is_empty() {
        target.push(' ');
    }
    target.push_str(addition);
}

#[cfg(test)]
mod tests {
    use super::*;

    const CURRICULUM: &str = "\
# Science Curriculum for 5th Grade

Here is your plan.

## Week 1: Living Things

### Learning Objectives:
- Classify organisms
- Describe habitats
  that animals live in

### Classroom Activities:
#### Nature Walk
Students observe plants around the school.

#### Habitat Diorama
- Build a shoebox habitat
- Present it to the class

### Required Materials & Resources:
- Shoeboxes
- Magnifying glasses

### Assessment Strategies:
- Exit ticket

---

## Week 2 - Matter

**Learning Objectives:**
1. Name the states of matter

**Activities:**
- Ice melt race: Compare melting speeds
- Balloon demo - Show gas expansion
";

    #[test]
    fn test_parse_curriculum_weeks_and_titles() {
        let weeks = parse_curriculum(CURRICULUM);

        assert_eq!(weeks.len(), 2);
        assert_eq!(weeks[0].week_number, 1);
        assert_eq!(weeks[0].title, "Living Things");
        assert_eq!(weeks[1].week_number, 2);
        assert_eq!(weeks[1].title, "Matter");
    }

    #[test]
    fn test_parse_curriculum_lists_and_continuations() {
        let weeks = parse_curriculum(CURRICULUM);

        assert_eq!(
            weeks[0].learning_objectives,
            vec!["Classify organisms", "Describe habitats that animals live in"]
        );
        assert_eq!(
            weeks[0].required_materials,
            vec!["Shoeboxes", "Magnifying glasses"]
        );
        assert_eq!(weeks[0].assessment_strategies, vec!["Exit ticket"]);
    }

    #[test]
    fn test_parse_curriculum_heading_activities() {
        let weeks = parse_curriculum(CURRICULUM);

        assert_eq!(
            weeks[0].activities,
            vec![
                Activity {
                    name: "Nature Walk".to_string(),
                    description: "Students observe plants around the school.".to_string(),
                },
                Activity {
                    name: "Habitat Diorama".to_string(),
                    description: "Build a shoebox habitat Present it to the class".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_parse_curriculum_bold_labels_and_bullet_activities() {
        let weeks = parse_curriculum(CURRICULUM);

        assert_eq!(
            weeks[1].learning_objectives,
            vec!["Name the states of matter"]
        );
        assert_eq!(
            weeks[1].activities,
            vec![
                Activity {
                    name: "Ice melt race".to_string(),
                    description: "Compare melting speeds".to_string(),
                },
                Activity {
                    name: "Balloon demo".to_string(),
                    description: "Show gas expansion".to_string(),
                },
            ]
        );
        assert!(weeks[1].required_materials.is_empty());
        assert!(weeks[1].assessment_strategies.is_empty());
    }

    #[test]
    fn test_parse_curriculum_reordered_sections() {
        let text = "## Week 3\n### Assessment Strategies\n- Quiz\n### Learning Objectives\n- Count to 10\n";
        let weeks = parse_curriculum(text);

        assert_eq!(weeks.len(), 1);
        assert_eq!(weeks[0].title, "Week 3");
        assert_eq!(weeks[0].assessment_strategies, vec!["Quiz"]);
        assert_eq!(weeks[0].learning_objectives, vec!["Count to 10"]);
    }

    #[test]
    fn test_parse_curriculum_deep_section_headings() {
        let text = "\
### Week 1: Cells
#### Learning Objectives
- Describe a cell
#### Classroom Activities
##### Onion Skin Lab
Look at cells under a microscope.
#### Required Materials
- Microscope
### Week 2: Organs
#### Assessment Strategies
- Diagram quiz
";
        let weeks = parse_curriculum(text);

        assert_eq!(weeks.len(), 2);
        assert_eq!(weeks[0].learning_objectives, vec!["Describe a cell"]);
        assert_eq!(
            weeks[0].activities,
            vec![Activity {
                name: "Onion Skin Lab".to_string(),
                description: "Look at cells under a microscope.".to_string(),
            }]
        );
        assert_eq!(weeks[0].required_materials, vec!["Microscope"]);
        assert_eq!(weeks[1].title, "Organs");
        assert_eq!(weeks[1].assessment_strategies, vec!["Diagram quiz"]);
    }

    #[test]
    fn test_parse_curriculum_inline_section_content() {
        let text = "### Week 1: Sounds\nMaterials: drums, bells\n";
        let weeks = parse_curriculum(text);

        assert_eq!(weeks[0].required_materials, vec!["drums, bells"]);
    }

    #[test]
    fn test_parse_curriculum_unknown_heading_ends_section() {
        let text = "## Week 1: Poems\n### Learning Objectives\n- Read aloud\n### Homework\n- Write a haiku\n";
        let weeks = parse_curriculum(text);

        assert_eq!(weeks[0].learning_objectives, vec!["Read aloud"]);
    }

    #[test]
    fn test_parse_curriculum_keeps_heading_numbers() {
        let text = "## Week 2: B\n## Week 2: B again\n## Week 5: E\n";
        let numbers: Vec<u32> = parse_curriculum(text)
            .iter()
            .map(|w| w.week_number)
            .collect();

        assert_eq!(numbers, vec![2, 2, 5]);
    }

    #[test]
    fn test_parse_curriculum_without_headings() {
        assert!(parse_curriculum("Just some prose about week 1 of the course.").is_empty());
        assert!(parse_curriculum("").is_empty());
    }

    const EXAM: &str = "\
# Exam for 4th Grade - Science: Week 2

## Question 1

What do plants need to make food?

- a) Sunlight
- b) Sand
- c) Plastic

**Answer:** a) Sunlight

## Question 2: Plants breathe in carbon dioxide.
Type: true/false
Correct Answer: True

### Question 3
Name one part of a flower.
A. Petal
B. Rock
Answer: A. Petal

**Question 4**
The sun is a star.
- True
- False
Answer: True

## Question 5
Explain why leaves are green.
Answer: Chlorophyll
";

    #[test]
    fn test_parse_exam_numbers_and_kinds() {
        let questions = parse_exam(EXAM);
        let summary: Vec<(u32, QuestionKind)> = questions
            .iter()
            .map(|q| (q.question_number, q.kind))
            .collect();

        assert_eq!(
            summary,
            vec![
                (1, QuestionKind::MultipleChoice),
                (2, QuestionKind::TrueFalse),
                (3, QuestionKind::MultipleChoice),
                (4, QuestionKind::TrueFalse),
                (5, QuestionKind::ShortAnswer),
            ]
        );
    }

    #[test]
    fn test_parse_exam_text_options_and_answers() {
        let questions = parse_exam(EXAM);

        assert_eq!(questions[0].text, "What do plants need to make food?");
        assert_eq!(
            questions[0].options,
            vec!["a) Sunlight", "b) Sand", "c) Plastic"]
        );
        assert_eq!(questions[0].correct_answer, "a) Sunlight");

        assert_eq!(questions[1].text, "Plants breathe in carbon dioxide.");
        assert_eq!(questions[1].correct_answer, "True");

        assert_eq!(questions[2].options, vec!["A. Petal", "B. Rock"]);
        assert_eq!(questions[2].correct_answer, "A. Petal");

        assert!(questions[3].options.is_empty());
        assert_eq!(questions[4].text, "Explain why leaves are green.");
        assert_eq!(questions[4].correct_answer, "Chlorophyll");
    }

    #[test]
    fn test_parse_exam_stops_at_top_level_heading() {
        let text = "## Question 1\nWhat is 2 + 2?\nAnswer: 4\n## Answer Key\nSome notes\n";
        let questions = parse_exam(text);

        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].text, "What is 2 + 2?");
    }

    #[test]
    fn test_parse_exam_without_headings() {
        assert!(parse_exam("1. What is 2 + 2?\nAnswer: 4").is_empty());
    }
}
