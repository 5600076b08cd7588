mod file_store;
mod presenter;

use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use flow_spec::{AnswerStore, Flow, ValidationResult, validate};
use tracing_subscriber::EnvFilter;
use wfp_app::flows::{registration_flow, report_flow};
use wfp_app::{AppConfig, Inbound, Orchestrator, SessionStore};

use file_store::FileStore;
use presenter::{OutputFormat, SessionPresenter, Verbosity};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "World Feed Program USSD shell",
    long_about = "Drives registration and monthly-report sessions in a terminal, and renders or validates answer files offline"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum FlowName {
    Registration,
    Report,
}

impl FlowName {
    fn build(self) -> CliResult<Flow> {
        let flow = match self {
            FlowName::Registration => registration_flow()?,
            FlowName::Report => report_flow()?,
        };
        Ok(flow)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Run one USSD session in the terminal; type `exit` to hang up.
    Session {
        /// Address of the simulated handset; also the session id.
        #[arg(long, value_name = "ADDR")]
        sender: String,
        /// Directory holding session snapshots and registered contacts.
        #[arg(long, value_name = "DIR", default_value = ".wfp")]
        state_dir: PathBuf,
        /// JSON configuration file (defaults to WFP_* environment variables).
        #[arg(long, value_name = "CONFIG")]
        config: Option<PathBuf>,
        /// Print each screen as JSON instead of handset text.
        #[arg(long)]
        json: bool,
        /// Show state names, progress and the answers on stderr.
        #[arg(long, alias = "debug")]
        verbose: bool,
    },
    /// Print the report message(s) a finished flow would send.
    Render {
        #[arg(long, value_enum)]
        flow: FlowName,
        /// Path to the answers JSON file.
        #[arg(long, value_name = "ANSWERS")]
        answers: PathBuf,
    },
    /// Validate an answers file against a flow.
    Validate {
        #[arg(long, value_enum)]
        flow: FlowName,
        /// Path to the answers JSON file.
        #[arg(long, value_name = "ANSWERS")]
        answers: PathBuf,
    },
}

#[tokio::main]
async fn main() -> CliResult<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Session {
            sender,
            state_dir,
            config,
            json,
            verbose,
        } => {
            let presenter = SessionPresenter::new(
                OutputFormat::from_json_flag(json),
                Verbosity::from_verbose(verbose),
            );
            run_session(&sender, state_dir, config, &presenter).await
        }
        Command::Render { flow, answers } => run_render(flow, &answers),
        Command::Validate { flow, answers } => run_validate(flow, &answers),
    }
}

/// Logs go to stderr so stdout carries only the screens.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> CliResult<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::from_env()?,
    };
    Ok(config)
}

async fn run_session(
    sender: &str,
    state_dir: PathBuf,
    config_path: Option<PathBuf>,
    presenter: &SessionPresenter,
) -> CliResult<()> {
    let config = load_config(config_path.as_deref())?;
    tracing::debug!(
        endpoint = config.endpoint().unwrap_or("<dummy>"),
        sender,
        "starting session"
    );
    let store = Arc::new(FileStore::new(state_dir));
    let orchestrator = Orchestrator::from_config(&config, store.clone(), store.clone())?;

    let mut payload = orchestrator
        .handle(sender, sender, Inbound::SessionStart)
        .await?;
    let mut lines = io::stdin().lock().lines();
    loop {
        presenter.show(&payload);
        if payload.ends_session() {
            break;
        }
        // End of input leaves the session where it is, like a dropped call.
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        if line.trim().eq_ignore_ascii_case("exit") {
            break;
        }
        payload = orchestrator
            .handle(sender, sender, Inbound::Content(line))
            .await?;
    }

    if let Some(session) = store.load(sender).await? {
        presenter.show_answers(&session.answers);
    }
    Ok(())
}

fn read_answers(path: &Path) -> CliResult<AnswerStore> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

fn run_render(flow_name: FlowName, answers_path: &Path) -> CliResult<()> {
    let flow = flow_name.build()?;
    let answers = read_answers(answers_path)?;
    for message in completion_messages(&flow, &answers)? {
        println!("{}", message);
    }
    Ok(())
}

fn completion_messages(flow: &Flow, answers: &AnswerStore) -> CliResult<Vec<String>> {
    let (_, terminal) = flow.terminal().ok_or("flow has no terminal step")?;
    let view = flow.view(answers);
    let mut messages = Vec::new();
    for template in terminal
        .on_complete
        .iter()
        .flat_map(|completion| completion.messages.iter())
    {
        messages.push(template.render(&view)?);
    }
    Ok(messages)
}

fn run_validate(flow_name: FlowName, answers_path: &Path) -> CliResult<()> {
    let flow = flow_name.build()?;
    let answers = read_answers(answers_path)?;

    let result = validate(&flow, &answers);
    println!(
        "Validation result: {}",
        if result.valid { "valid" } else { "invalid" }
    );
    describe_validation(&result);

    if result.valid {
        Ok(())
    } else {
        Err("validation failed".into())
    }
}

fn describe_validation(result: &ValidationResult) {
    if !result.errors.is_empty() {
        println!("Errors:");
        for error in &result.errors {
            println!("  {} - {}", error.step, error.message);
        }
    }
    if !result.missing_required.is_empty() {
        let missing: Vec<&str> = result
            .missing_required
            .iter()
            .map(|name| name.as_str())
            .collect();
        println!("Missing required answers: {}", missing.join(", "));
    }
    if !result.unknown_fields.is_empty() {
        println!(
            "Unknown answer fields: {}",
            result.unknown_fields.join(", ")
        );
    }
}
