use super::{format_issues, format_status, Orchestrator};
use crate::config::GeneratorConfig;
use crate::prelude::{eprintln, println, *};
use colored::Colorize;
use curricula_core::render::render_exam;
use curricula_core::{ExamRequest, ExamResponse, OutputFormat, Payload};

#[derive(Debug, clap::Args)]
pub struct ExamOptions {
    /// Subject of the exam, e.g. "Science"
    #[arg(short, long)]
    pub subject: String,

    /// Grade level, e.g. "5th Grade"
    #[arg(short, long)]
    pub grade: String,

    /// Week the exam covers
    #[arg(short, long, default_value = "1")]
    pub week: u32,

    /// Title of the week; defaults to "Week N"
    #[arg(short, long, default_value = "")]
    pub title: String,

    /// Learning objective to test (repeatable)
    #[arg(short = 'o', long = "objective", required = true)]
    pub objectives: Vec<String>,

    /// Reply format requested from the model: json or text
    #[arg(short, long, default_value = "json")]
    pub format: String,

    /// Budget for the model call in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Print a one-row-per-question summary table
    #[arg(long, conflicts_with = "json")]
    pub summary: bool,
}

pub async fn run(options: ExamOptions, global: crate::Global) -> Result<()> {
    let config = GeneratorConfig::from(&global.provider);
    if global.verbose {
        eprintln!("{config:?}");
    }

    let request = ExamRequest::new(
        options.subject.clone(),
        options.grade.clone(),
        options.week,
        options.title.clone(),
        options.objectives.clone(),
        OutputFormat::from_wire(&options.format),
    )?;

    let orchestrator = Orchestrator::from_config(config)?;
    let budget = orchestrator.config().budget(options.timeout_ms);

    if global.verbose {
        eprintln!(
            "Generating exam for week {}: {} (budget {:?})...",
            request.week_number, request.week_title, budget
        );
    }

    let response = orchestrator.generate_exam(&request, budget).await;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else if options.summary {
        output_summary(&response);
    } else {
        println!("{}", format_exam_text(&request, &response));
    }

    Ok(())
}

fn output_summary(response: &ExamResponse) {
    println!("{}", format_status(response.source, response.error.as_deref()));

    let Some(questions) = response.exam.as_structured() else {
        println!("{}", "No structured questions to summarize.".yellow());
        return;
    };

    let mut table = new_table();
    table.set_titles(prettytable::row!["#", "Type", "Question", "Answer"]);
    for question in questions {
        table.add_row(prettytable::row![
            question.question_number,
            question.kind,
            question.text,
            question.correct_answer
        ]);
    }
    table.printstd();
}

fn format_exam_text(request: &ExamRequest, response: &ExamResponse) -> String {
    let mut result = String::new();

    result.push_str(&format!(
        "{}\n\n",
        format_status(response.source, response.error.as_deref())
    ));

    match &response.exam {
        Payload::Structured(questions) => result.push_str(&render_exam(
            &request.subject,
            &request.grade,
            request.week_number,
            questions,
        )),
        Payload::Text(raw) => result.push_str(raw),
    }

    if !response.issues.is_empty() {
        result.push_str(&format!("\n{}\n", "Flagged questions:".yellow().bold()));
        result.push_str(&format_issues(&response.issues));
        result.push('\n');
    }

    result
}
