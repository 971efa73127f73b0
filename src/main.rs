//! autodiag
//!
//! Command-line interface for the diagnostic rule engine.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use autodiag::{
    DiagConfig, DiagError, DiagnosticSession, LogLevel, OutputFormat, PromptOracle,
    ScriptedOracle, ValueOracle,
};

#[derive(Parser)]
#[command(name = "autodiag")]
#[command(version)]
#[command(about = "Rule-based diagnosis with backward and forward chaining", long_about = None)]
struct Cli {
    /// Rule file, one `a = x ^ b = y : c = z` rule per line
    #[arg(long, value_name = "FILE")]
    rules: Option<PathBuf>,

    /// Variable list, one `name,prompt[,kind]` record per line
    #[arg(long, value_name = "FILE")]
    variables: Option<PathBuf>,

    /// Goal to diagnose (asked interactively when omitted)
    #[arg(short, long, value_name = "NAME")]
    goal: Option<String>,

    /// Answer questions from a TOML `[answers]` table instead of stdin
    #[arg(long, value_name = "FILE")]
    answers: Option<PathBuf>,

    /// Print the knowledge base before diagnosing
    #[arg(long)]
    show_kb: bool,

    /// Variable that seeds forward chaining
    #[arg(long, value_name = "NAME")]
    root: Option<String>,

    /// Report format (`json` also reports errors as JSON on stderr)
    #[arg(short, long, value_enum)]
    format: Option<Format>,

    /// Fail on malformed input lines and on premises naming unknown variables
    #[arg(long)]
    strict: bool,

    /// Maximum goal nesting (0 for unlimited)
    #[arg(long, value_name = "N")]
    max_depth: Option<usize>,

    /// Maximum facts processed by forward chaining (0 for unlimited)
    #[arg(long, value_name = "N")]
    max_facts: Option<usize>,

    /// Configuration file (skips the standard search locations)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print a default configuration file and exit
    #[arg(long)]
    init_config: bool,

    /// More log output (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Human-readable verdict
    Text,
    /// Full report as JSON
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let json_errors = cli.format == Some(Format::Json);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let diag = err.downcast_ref::<DiagError>();
            match diag {
                Some(e) if json_errors => eprintln!("{}", e.to_json()),
                _ => eprintln!("Error: {:#}", err),
            }
            let code = diag.map(|e| e.code.exit_code()).unwrap_or(1);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    if cli.init_config {
        print!("{}", DiagConfig::default_config_content());
        return Ok(());
    }

    let config = load_config(&cli)?;
    init_logging(&cli, config.general.log_level);

    let session = DiagnosticSession::from_config(&config)?;
    if session.rules().is_empty() {
        bail!("no rules loaded from {}", config.session.rules_file.display());
    }

    if config.general.show_kb {
        println!("Knowledge base:");
        print!("{}", session.rules());
        println!();
    }

    let json = config.general.format == OutputFormat::Json;

    let goal = match cli.goal.clone().or_else(|| config.session.default_goal.clone()) {
        Some(goal) => goal,
        None if cli.answers.is_some() => bail!("--goal is required with --answers"),
        None => ask_goal(&session, json)?,
    };

    let oracle: Box<dyn ValueOracle> = match &cli.answers {
        Some(path) => Box::new(ScriptedOracle::load(path)?),
        // keep stdout clean for the JSON report
        None if json => Box::new(PromptOracle::new(io::stdin().lock(), io::stderr())),
        None => Box::new(PromptOracle::stdio()),
    };

    let report = session.diagnose(&goal, oracle)?;

    let rendered = match config.general.format {
        OutputFormat::Text => format!("\n{}", report),
        OutputFormat::Json => report.to_json(),
    };
    writeln!(io::stdout().lock(), "{}", rendered).context("Failed to write report")?;
    Ok(())
}

/// Configuration file and environment, then command-line flags on top
fn load_config(cli: &Cli) -> Result<DiagConfig> {
    let mut config = DiagConfig::load(cli.config.as_deref()).map_err(DiagError::from)?;

    if let Some(rules) = &cli.rules {
        config.session.rules_file = rules.clone();
    }
    if let Some(variables) = &cli.variables {
        config.session.variables_file = variables.clone();
    }
    if let Some(root) = &cli.root {
        config.session.root_variable = root.clone();
    }
    if let Some(format) = cli.format {
        config.general.format = format.into();
    }
    if let Some(depth) = cli.max_depth {
        config.reasoning.max_depth = depth;
    }
    if let Some(facts) = cli.max_facts {
        config.reasoning.max_facts = facts;
    }
    config.general.show_kb |= cli.show_kb;
    config.reasoning.strict |= cli.strict;

    Ok(config)
}

/// Logs go to stderr; `RUST_LOG` wins over the configured level
fn init_logging(cli: &Cli, configured: LogLevel) {
    let level = if cli.quiet {
        LogLevel::Quiet
    } else {
        configured.louder(cli.verbose)
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.filter_directive()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn ask_goal(session: &DiagnosticSession, json: bool) -> Result<String> {
    let prompt = format!(
        "Please enter a conclusion to solve (values can be: {})",
        session.goal_menu().join(", ")
    );
    let answer = if json {
        PromptOracle::new(io::stdin().lock(), io::stderr()).read_answer(&prompt)
    } else {
        PromptOracle::stdio().with_echo(true).read_answer(&prompt)
    };
    Ok(answer.map_err(DiagError::from)?)
}
