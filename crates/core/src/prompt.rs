use crate::mock::EXAM_QUESTION_COUNT;
use crate::types::OutputFormat;

const CURRICULUM_PERSONA: &str = "You are an expert curriculum designer for K-12 education. \
You create detailed, age-appropriate curriculum plans that align with educational standards.";

const EXAM_PERSONA: &str = "You are an expert educational assessment designer. \
You create clear, age-appropriate exams that effectively test student understanding of \
specific learning objectives.";

const JSON_ONLY: &str = "You ALWAYS respond with valid, well-structured JSON that can be \
parsed directly by a JSON parser.";

const NO_PROSE: &str = "Do not include any explanatory text outside the JSON structure. \
The response must be directly parseable as JSON.";

const CURRICULUM_SCHEMA: &str = r#"{
  "week": number,
  "title": string,
  "learning_objectives": string[],
  "classroom_activities": [{ "activity": string, "description": string }],
  "required_materials": string[],
  "assessment_strategies": string[]
}"#;

const EXAM_SCHEMA: &str = r#"{
  "question_number": number,
  "type": "multiple-choice" | "true/false" | "short answer",
  "question_text": string,
  "options": string[],
  "correct_answer": string
}"#;

/// A system/user message pair ready to be sent to a chat model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Build the prompt asking for a `weeks`-long curriculum.
pub fn build_curriculum_prompt(
    subject: &str,
    grade: &str,
    weeks: u32,
    format: OutputFormat,
) -> Prompt {
    let mut user = format!(
        "Generate a detailed curriculum for teaching {subject} to {grade} students over {}.\n\n\
For each week, include:\n\
1. A lesson plan with clear learning objectives\n\
2. Detailed classroom activities\n\
3. Required materials and resources\n\
4. Assessment strategies\n\n",
        plural(weeks, "week")
    );

    match format {
        OutputFormat::Structured => {
            user.push_str(
                "IMPORTANT: Format your response as a valid JSON array where each element is a \
week object with the following structure:\n",
            );
            user.push_str(CURRICULUM_SCHEMA);
            user.push_str("\n\n");
            user.push_str(NO_PROSE);
        }
        OutputFormat::FreeText => {
            user.push_str(
                "Format the response as a structured curriculum with clear sections for each \
week. Start every week with a heading of the form \"## Week N: Title\" and use the \
sub-headings \"### Learning Objectives\", \"### Classroom Activities\", \
\"### Required Materials\" and \"### Assessment Strategies\", each followed by a bulleted list.",
            );
        }
    }

    Prompt {
        system: system_message(CURRICULUM_PERSONA, format),
        user,
    }
}

/// Build the prompt asking for an exam covering one week's objectives.
pub fn build_exam_prompt(
    subject: &str,
    grade: &str,
    week_number: u32,
    week_title: &str,
    learning_objectives: &[String],
    format: OutputFormat,
) -> Prompt {
    let objectives = learning_objectives
        .iter()
        .map(|objective| format!("- {objective}"))
        .collect::<Vec<_>>()
        .join("\n");

    let mut user = format!(
        "Generate a {EXAM_QUESTION_COUNT}-question exam for {grade} students studying {subject}, \
specifically for Week {week_number}: {week_title}.\n\n\
The exam should test the following learning objectives:\n\
{objectives}\n\n\
For each question:\n\
1. Create a mix of multiple-choice, true/false, and short answer questions\n\
2. Include the correct answer for each question\n\
3. Ensure questions are age-appropriate for {grade} students\n\
4. Focus specifically on the learning objectives listed above\n\n"
    );

    match format {
        OutputFormat::Structured => {
            user.push_str(
                "IMPORTANT: Format your response as a valid JSON array where each element is a \
question object with the following structure:\n",
            );
            user.push_str(EXAM_SCHEMA);
            user.push_str("\n\nLeave \"options\" empty unless the question is multiple-choice. ");
            user.push_str(NO_PROSE);
        }
        OutputFormat::FreeText => {
            user.push_str(
                "Format the response as a structured exam with clear sections for each question. \
Start every question with a heading of the form \"## Question N\", list any answer options as \
bullets, and finish each question with a line \"Answer: ...\".",
            );
        }
    }

    Prompt {
        system: system_message(EXAM_PERSONA, format),
        user,
    }
}

fn system_message(persona: &str, format: OutputFormat) -> String {
    match format {
        OutputFormat::Structured => format!("{persona} {JSON_ONLY}"),
        OutputFormat::FreeText => persona.to_string(),
    }
}

fn plural(count: u32, noun: &str) -> String {
    if count == 1 {
        format!("1 {noun}")
    } else {
        format!("{count} {noun}s")
    }
}
