use super::{format_issues, format_status, Orchestrator};
use crate::config::GeneratorConfig;
use crate::llm::LlmClient;
use crate::prelude::{eprintln, println, *};
use colored::Colorize;
use curricula_core::render::{render_curriculum, render_exam};
use curricula_core::{
    CurriculumResponse, ExamRequest, ExamResponse, GenerationRequest, OutputFormat, Payload,
};
use futures::future::join_all;
use std::time::Duration;

#[derive(Debug, clap::Args)]
pub struct CurriculumOptions {
    /// Subject to teach, e.g. "Science"
    #[arg(short, long)]
    pub subject: String,

    /// Grade level, e.g. "5th Grade"
    #[arg(short, long)]
    pub grade: String,

    /// Number of weeks the curriculum spans
    #[arg(short, long, default_value = "4")]
    pub weeks: u32,

    /// Reply format requested from the model: json or text
    #[arg(short, long, default_value = "json")]
    pub format: String,

    /// Budget for the model call in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Also generate an exam for every week
    #[arg(long)]
    pub with_exams: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Print a one-row-per-week summary table
    #[arg(long, conflicts_with = "json")]
    pub summary: bool,
}

/// Exam generated for one week of a curriculum.
#[derive(Debug, serde::Serialize)]
pub struct WeekExam {
    pub week: u32,
    #[serde(flatten)]
    pub exam: ExamResponse,
}

pub async fn run(options: CurriculumOptions, global: crate::Global) -> Result<()> {
    let config = GeneratorConfig::from(&global.provider);
    if global.verbose {
        eprintln!("{config:?}");
    }

    let request = GenerationRequest::new(
        options.subject.clone(),
        options.grade.clone(),
        options.weeks,
        OutputFormat::from_wire(&options.format),
    )?;

    let orchestrator = Orchestrator::from_config(config)?;
    let budget = orchestrator.config().budget(options.timeout_ms);

    if global.verbose {
        eprintln!(
            "Generating a {}-week {} curriculum for {} (budget {:?})...",
            request.duration_weeks, request.subject, request.grade, budget
        );
    }

    let response = orchestrator.generate_curriculum(&request, budget).await;
    let exams = if options.with_exams {
        generate_week_exams(&orchestrator, &request, &response, budget).await
    } else {
        Vec::new()
    };

    if options.json {
        output_json(&response, &exams)?;
    } else if options.summary {
        output_summary(&response);
    } else {
        println!("{}", format_curriculum_text(&request, &response, &exams));
    }

    Ok(())
}

/// Generate one exam per structured week, concurrently.
///
/// Weeks without learning objectives are skipped.
pub async fn generate_week_exams<C: LlmClient>(
    orchestrator: &Orchestrator<C>,
    request: &GenerationRequest,
    response: &CurriculumResponse,
    budget: Duration,
) -> Vec<WeekExam> {
    let Some(weeks) = response.curriculum.as_structured() else {
        log::warn!("Curriculum came back as raw text, skipping exams");
        return Vec::new();
    };

    let exam_requests: Vec<ExamRequest> = weeks
        .iter()
        .filter_map(|week| {
            ExamRequest::new(
                request.subject.clone(),
                request.grade.clone(),
                week.week_number,
                week.title.clone(),
                week.learning_objectives.clone(),
                request.output_format,
            )
            .map_err(|err| log::warn!("Skipping exam for week {}: {err}", week.week_number))
            .ok()
        })
        .collect();

    let exam_futures = exam_requests.iter().map(|exam_request| async move {
        WeekExam {
            week: exam_request.week_number,
            exam: orchestrator.generate_exam(exam_request, budget).await,
        }
    });

    join_all(exam_futures).await
}

fn output_json(response: &CurriculumResponse, exams: &[WeekExam]) -> Result<()> {
    let mut value = serde_json::to_value(response)?;
    if !exams.is_empty() {
        value["exams"] = serde_json::to_value(exams)?;
    }
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn output_summary(response: &CurriculumResponse) {
    println!("{}", format_status(response.source, response.error.as_deref()));

    let Some(weeks) = response.curriculum.as_structured() else {
        println!("{}", "No structured weeks to summarize.".yellow());
        return;
    };

    let mut table = new_table();
    table.set_titles(prettytable::row![
        "Week",
        "Title",
        "Objectives",
        "Activities",
        "Materials",
        "Assessments"
    ]);
    for week in weeks {
        table.add_row(prettytable::row![
            week.week_number,
            week.title,
            week.learning_objectives.len(),
            week.activities.len(),
            week.required_materials.len(),
            week.assessment_strategies.len()
        ]);
    }
    table.printstd();
}

/// Convert a curriculum (and any per-week exams) to colored terminal text.
fn format_curriculum_text(
    request: &GenerationRequest,
    response: &CurriculumResponse,
    exams: &[WeekExam],
) -> String {
    let mut result = String::new();

    result.push_str(&format!("\n{}\n", "=".repeat(80).bright_cyan()));
    result.push_str(&format!(
        "{}\n",
        format!(
            "{} CURRICULUM - {} ({} weeks)",
            request.subject.to_uppercase(),
            request.grade,
            request.duration_weeks
        )
        .bright_cyan()
        .bold()
    ));
    result.push_str(&format!("{}\n", "=".repeat(80).bright_cyan()));
    result.push_str(&format!(
        "{}\n\n",
        format_status(response.source, response.error.as_deref())
    ));

    match &response.curriculum {
        Payload::Structured(weeks) => result.push_str(&render_curriculum(weeks)),
        Payload::Text(raw) => result.push_str(raw),
    }

    if !response.issues.is_empty() {
        result.push_str(&format!("\n{}\n", "Flagged weeks:".yellow().bold()));
        result.push_str(&format_issues(&response.issues));
        result.push('\n');
    }

    for week_exam in exams {
        result.push_str(&format!("\n{}\n", "-".repeat(80).bright_black()));
        result.push_str(&format!(
            "{}\n\n",
            format_status(week_exam.exam.source, week_exam.exam.error.as_deref())
        ));
        match &week_exam.exam.exam {
            Payload::Structured(questions) => result.push_str(&render_exam(
                &request.subject,
                &request.grade,
                week_exam.week,
                questions,
            )),
            Payload::Text(raw) => result.push_str(raw),
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::tests::{orchestrator, Script, ScriptedClient};
    use crate::error::Error;
    use curricula_core::Source;

    fn request(weeks: u32) -> GenerationRequest {
        GenerationRequest::new("Science", "5th Grade", weeks, OutputFormat::Structured).unwrap()
    }

    #[tokio::test]
    async fn test_one_exam_per_week() {
        let client = ScriptedClient::reply("unused");
        let orchestrator = orchestrator(&client, true);
        let budget = Duration::from_secs(1);

        let response = orchestrator.generate_curriculum(&request(3), budget).await;
        let exams = generate_week_exams(&orchestrator, &request(3), &response, budget).await;

        let weeks: Vec<u32> = exams.iter().map(|e| e.week).collect();
        assert_eq!(weeks, vec![1, 2, 3]);
        assert!(exams.iter().all(|e| e.exam.source == Source::Mock));
    }

    #[tokio::test]
    async fn test_exams_follow_curriculum_fallback() {
        let client = ScriptedClient::new(Script::Fail(Error::ExternalCall("offline".to_string())));
        let orchestrator = orchestrator(&client, false);
        let budget = Duration::from_secs(1);

        let response = orchestrator.generate_curriculum(&request(2), budget).await;
        let exams = generate_week_exams(&orchestrator, &request(2), &response, budget).await;

        assert_eq!(exams.len(), 2);
        assert!(exams.iter().all(|e| e.exam.degraded));
        assert_eq!(client.calls(), 3);
    }

    #[tokio::test]
    async fn test_raw_text_curriculum_has_no_exams() {
        let client = ScriptedClient::reply("no structure here");
        let orchestrator = orchestrator(&client, false);
        let budget = Duration::from_secs(1);

        let response = orchestrator.generate_curriculum(&request(2), budget).await;
        let exams = generate_week_exams(&orchestrator, &request(2), &response, budget).await;

        assert!(exams.is_empty());
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_weeks_without_objectives_are_skipped() {
        let client = ScriptedClient::reply(
            r#"[{"week": 1, "title": "A", "learning_objectives": ["a"]}, {"week": 2, "title": "B", "learning_objectives": []}]"#,
        );
        let orchestrator = orchestrator(&client, false);
        let budget = Duration::from_secs(1);

        let response = orchestrator.generate_curriculum(&request(2), budget).await;
        let exams = generate_week_exams(&orchestrator, &request(2), &response, budget).await;

        assert_eq!(exams.len(), 1);
        assert_eq!(exams[0].week, 1);
    }

    #[test]
    fn test_format_curriculum_text() {
        let request = request(2);
        let response = CurriculumResponse::from(curricula_core::Generated {
            payload: Payload::Structured(curricula_core::mock::generate_mock_curriculum(
                "Science",
                "5th Grade",
                2,
            )),
            text: None,
            source: Source::Mock,
            error: None,
            issues: Vec::new(),
        });

        let text = format_curriculum_text(&request, &response, &[]);

        assert!(text.contains("SCIENCE CURRICULUM - 5th Grade (2 weeks)"));
        assert!(text.contains("## Week 2: Science Fundamentals - Week 2"));
        assert!(!text.contains("Flagged weeks"));
    }
}
