//! Core library for curricula
//!
//! This crate implements the **Functional Core** of the curricula application,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! - **`curricula_core`** (this crate): prompt construction, reply normalization,
//!   sample data and markdown rendering, with zero I/O
//! - **`curricula`**: the language model client, the HTTP server and the CLI
//!   (the Imperative Shell)
//!
//! Every function here is deterministic and can be tested with fixture strings; no
//! mocking is required.
//!
//! # Module Organization
//!
//! - [`request`]: Validation of loosely typed inbound requests
//! - [`prompt`]: System and user messages for curriculum and exam generation
//! - [`extract`]: Normalization of model replies into [`WeekPlan`] and [`ExamQuestion`]
//!   sequences, falling back to [`markdown`] when no JSON is found
//! - [`mock`]: Deterministic sample data
//! - [`render`]: Markdown output for curricula and exams
//!
//! # Example Usage
//!
//! ```rust
//! use curricula_core::extract::{extract_curriculum, Extracted};
//!
//! let reply = "```json\n[{\"week\": 1, \"title\": \"Cells\", \"learning_objectives\": [\"Describe a cell\"]}]\n```";
//!
//! match extract_curriculum(reply) {
//!     Extracted::Parsed { items, issues } => {
//!         assert_eq!(items[0].title, "Cells");
//!         assert!(issues.is_empty());
//!     }
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```

pub mod error;
pub mod extract;
pub mod markdown;
pub mod mock;
pub mod prompt;
pub mod render;
pub mod request;
pub mod types;

pub use error::{ExtractionError, RequestError};
pub use request::{ExamRequest, GenerationRequest};
pub use types::{
    Activity, CurriculumResponse, ExamQuestion, ExamResponse, Generated, OutputFormat, Payload,
    QuestionKind, Source, ValidationIssue, WeekPlan,
};
