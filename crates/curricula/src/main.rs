use crate::prelude::*;
use clap::Parser;

mod config;
mod error;
mod generate;
mod llm;
mod prelude;
mod serve;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Generate K-12 curricula and exams with a language model"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    #[clap(flatten)]
    provider: config::ProviderArgs,

    /// Whether to display additional information.
    #[clap(long, env = "CURRICULA_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Generate a multi-week curriculum
    Curriculum(crate::generate::curriculum::CurriculumOptions),

    /// Generate an exam for a single week
    Exam(crate::generate::exam::ExamOptions),

    /// Serve the generation API over HTTP
    Serve(crate::serve::ServeOptions),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Curriculum(options) => {
            crate::generate::curriculum::run(options, app.global).await
        }
        SubCommands::Exam(options) => crate::generate::exam::run(options, app.global).await,
        SubCommands::Serve(options) => crate::serve::run(options, app.global).await,
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
