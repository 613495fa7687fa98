//! Deterministic sample data used when the language model is disabled or unreachable.

use crate::types::{Activity, ExamQuestion, QuestionKind, WeekPlan};

/// Number of questions in every generated exam.
pub const EXAM_QUESTION_COUNT: usize = 10;

/// Build `weeks` sample weeks numbered 1..=weeks.
pub fn generate_mock_curriculum(subject: &str, grade: &str, weeks: u32) -> Vec<WeekPlan> {
    (1..=weeks)
        .map(|week| WeekPlan {
            week_number: week,
            title: format!("{subject} Fundamentals - Week {week}"),
            learning_objectives: vec![
                format!("Understand basic {subject} concepts appropriate for {grade} students"),
                format!("Develop skills in {subject} problem-solving"),
                format!("Apply {subject} knowledge to real-world scenarios"),
            ],
            activities: vec![
                Activity {
                    name: "Interactive Lesson".to_string(),
                    description: format!(
                        "Teacher-led instruction on {subject} concepts for {grade} students"
                    ),
                },
                Activity {
                    name: "Group Work".to_string(),
                    description:
                        "Students collaborate on problem-solving activities in small groups"
                            .to_string(),
                },
                Activity {
                    name: "Hands-on Project".to_string(),
                    description: format!(
                        "Students create a {subject}-related project to demonstrate understanding"
                    ),
                },
            ],
            required_materials: vec![
                format!("{subject} textbook appropriate for {grade} students"),
                "Worksheets and handouts".to_string(),
                "Art supplies for projects".to_string(),
                "Digital resources and educational technology tools".to_string(),
            ],
            assessment_strategies: vec![
                "Formative assessment through classroom observation".to_string(),
                "Quizzes to check understanding".to_string(),
                "Project-based assessment".to_string(),
                "Peer and self-evaluation".to_string(),
            ],
        })
        .collect()
}

/// Build the fixed ten-question sample exam.
///
/// The week number is accepted for symmetry with the live call; the questions do
/// not depend on it.
pub fn generate_mock_exam(subject: &str, grade: &str, _week_number: u32) -> Vec<ExamQuestion> {
    use QuestionKind::*;

    let questions = [
        (
            MultipleChoice,
            format!("Which of these is related to {subject}?"),
            vec![
                format!("a) A {subject}-related term"),
                "b) An unrelated term".to_string(),
                "c) Another unrelated term".to_string(),
            ],
            format!("a) A {subject}-related term"),
        ),
        (
            MultipleChoice,
            format!("What is a key concept in {subject} for {grade} students?"),
            options(&["a) Basic concept", "b) Advanced concept", "c) Unrelated concept"]),
            "a) Basic concept".to_string(),
        ),
        (
            TrueFalse,
            format!("{subject} is an important subject for {grade} students."),
            vec![],
            "True".to_string(),
        ),
        (
            TrueFalse,
            format!("Learning {subject} is not useful for {grade} students."),
            vec![],
            "False".to_string(),
        ),
        (
            ShortAnswer,
            format!("Name one important skill related to {subject}."),
            vec![],
            "Any relevant skill".to_string(),
        ),
        (
            ShortAnswer,
            format!("How can {subject} be applied in real life?"),
            vec![],
            "Any reasonable application".to_string(),
        ),
        (
            MultipleChoice,
            format!("Which of these tools is most commonly used in {subject}?"),
            options(&[
                "a) Subject-specific tool",
                "b) Unrelated tool",
                "c) Another unrelated tool",
            ]),
            "a) Subject-specific tool".to_string(),
        ),
        (
            MultipleChoice,
            format!("What is a common challenge when learning {subject}?"),
            options(&["a) Common challenge", "b) Unrelated issue", "c) Non-issue"]),
            "a) Common challenge".to_string(),
        ),
        (
            TrueFalse,
            format!("Practice is important for mastering {subject}."),
            vec![],
            "True".to_string(),
        ),
        (
            ShortAnswer,
            format!("Describe one way to demonstrate understanding of {subject}."),
            vec![],
            "Any reasonable demonstration method".to_string(),
        ),
    ];

    questions
        .into_iter()
        .enumerate()
        .map(|(index, (kind, text, options, correct_answer))| ExamQuestion {
            question_number: index as u32 + 1,
            kind,
            text,
            options,
            correct_answer,
        })
        .collect()
}

fn options(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}
