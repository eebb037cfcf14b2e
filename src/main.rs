use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use codedojo_judge::adapters::AdapterRegistry;
use codedojo_judge::core::OverallStatus;
use codedojo_judge::sink::JsonlSink;
use codedojo_judge::{worker, Intake, Judge, JudgeConfig, SubmissionMeta};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Subcommand,
}

#[derive(Debug, clap::Subcommand)]
enum Subcommand {
    /// Judge one source file against its test folder
    Run(RunArgs),
    /// Consume judge jobs from the Redis queue
    Worker,
}

#[derive(Debug, clap::Args)]
struct RunArgs {
    /// Source file; the extension selects the language
    file: PathBuf,

    #[arg(long)]
    author: Option<String>,

    /// Test folder name (defaults to the file stem)
    #[arg(long)]
    challenge: Option<String>,

    /// Print the JSON report instead of the tree
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("codedojo_judge=info".parse()?)
                .add_directive("judge=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = JudgeConfig::from_env()?;

    match cli.cmd {
        Subcommand::Run(args) => run(&config, args).await,
        Subcommand::Worker => {
            worker::run(&config).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run(config: &JudgeConfig, args: RunArgs) -> Result<ExitCode> {
    let code = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("File not found: {}", args.file.display()))?;

    let toolchains = config.toolchains()?;
    let adapters = AdapterRegistry::from_toolchains(&toolchains, &config.adapter_context());
    let sink = Arc::new(JsonlSink::new(&config.results_path));
    let judge = Judge::new(adapters, config.test_case_source(), sink)
        .with_excerpt_chars(config.excerpt_chars);
    let intake = Intake::new(judge);

    let meta = SubmissionMeta {
        author: args.author,
        challenge: args.challenge,
    };
    let id = intake.submit(code, args.file.to_string_lossy(), meta);
    info!("Submitted {} as submission {}", args.file.display(), id);

    let report = intake.judge(id).await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.render_tree());
    }

    Ok(if report.status == OverallStatus::Passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
