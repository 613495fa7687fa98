//! Markdown rendering for curricula and exams.
//!
//! The output uses the same headings [`crate::markdown`] understands, so a
//! rendered document parses back to the data it came from.

use crate::types::{ExamQuestion, WeekPlan};
use std::fmt::Write;

/// Render weeks as `## Week N: Title` sections separated by rules.
pub fn render_curriculum(weeks: &[WeekPlan]) -> String {
    weeks
        .iter()
        .map(render_week)
        .collect::<Vec<_>>()
        .join("---\n\n")
}

fn render_week(week: &WeekPlan) -> String {
    let mut out = format!("## Week {}: {}\n\n", week.week_number, week.title);

    out.push_str("### Learning Objectives:\n");
    push_bullets(&mut out, &week.learning_objectives);

    out.push_str("### Classroom Activities:\n");
    for activity in &week.activities {
        let _ = writeln!(out, "#### {}", activity.name);
        if !activity.description.is_empty() {
            let _ = writeln!(out, "{}", activity.description);
        }
        out.push('\n');
    }
    if week.activities.is_empty() {
        out.push('\n');
    }

    out.push_str("### Required Materials & Resources:\n");
    push_bullets(&mut out, &week.required_materials);

    out.push_str("### Assessment Strategies:\n");
    push_bullets(&mut out, &week.assessment_strategies);

    out
}

/// Render an exam with a title line followed by one `## Question N` section per
/// question.
pub fn render_exam(
    subject: &str,
    grade: &str,
    week_number: u32,
    questions: &[ExamQuestion],
) -> String {
    let mut out = format!("# Exam for {grade} - {subject}: Week {week_number}\n\n");

    for question in questions {
        let _ = write!(
            out,
            "## Question {}\n\n{}\n\n",
            question.question_number, question.text
        );
        for option in &question.options {
            let _ = writeln!(out, "- {option}");
        }
        let _ = write!(
            out,
            "\n**Type:** {}\n**Answer:** {}\n\n",
            question.kind, question.correct_answer
        );
    }

    out
}

fn push_bullets(out: &mut String, items: &[String]) {
    for item in items {
        let _ = writeln!(out, "- {item}");
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::{parse_curriculum, parse_exam};
    use crate::mock::{generate_mock_curriculum, generate_mock_exam};

    #[test]
    fn test_render_curriculum_layout() {
        let weeks = generate_mock_curriculum("Science", "5th Grade", 2);
        let markdown = render_curriculum(&weeks);

        assert!(markdown.starts_with("## Week 1: Science Fundamentals - Week 1\n\n"));
        assert!(markdown.contains("### Learning Objectives:\n- Understand basic Science"));
        assert!(markdown.contains("#### Group Work\nStudents collaborate"));
        assert!(markdown.contains("---\n\n## Week 2: Science Fundamentals - Week 2"));
    }

    #[test]
    fn test_rendered_curriculum_parses_back() {
        let weeks = generate_mock_curriculum("Science", "5th Grade", 3);
        let parsed = parse_curriculum(&render_curriculum(&weeks));

        assert_eq!(parsed, weeks);
    }

    #[test]
    fn test_rendered_exam_parses_back() {
        let exam = generate_mock_exam("History", "7th Grade", 4);
        let markdown = render_exam("History", "7th Grade", 4, &exam);

        assert!(markdown.starts_with("# Exam for 7th Grade - History: Week 4\n\n## Question 1\n\n"));
        assert_eq!(parse_exam(&markdown), exam);
    }

    #[test]
    fn test_render_empty_inputs() {
        assert_eq!(render_curriculum(&[]), "");
        assert_eq!(
            render_exam("Art", "1st Grade", 1, &[]),
            "# Exam for 1st Grade - Art: Week 1\n\n"
        );
    }
}
