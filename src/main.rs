//! jqline entry point.

use clap::{Parser, Subcommand};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing::debug;

use jqline::command::parse_command_args;
use jqline::config::{CompiledConfig, Config};
use jqline::logging::init_tracing;
use jqline::output::{Response, format_failure};
use jqline::playbook;
use jqline::process::{Outcome, run};
use jqline::request::Request;

/// The query ran and failed.
const EXIT_FAILED: u8 = 1;
/// Nothing ran: bad config, request, or input.
const EXIT_ERROR: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "jqline")]
#[command(about = "Run jq queries written inline in text")]
#[command(version)]
struct Cli {
    /// Config file to use instead of the user-level one
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the argv a query assembles to, as a JSON array
    Args {
        /// Flags and filter, e.g. '--arg name value .greeting = $name'
        #[arg(allow_hyphen_values = true)]
        query: String,
    },
    /// Run a single query
    Run {
        /// Read input from a file
        #[arg(long, conflicts_with_all = ["text", "stdin"])]
        file: Option<PathBuf>,
        /// Use this text as input
        #[arg(long, conflicts_with = "stdin")]
        text: Option<String>,
        /// Forward this process's stdin as input
        #[arg(long)]
        stdin: bool,
        /// Override the configured timeout
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Flags and filter
        #[arg(allow_hyphen_values = true)]
        query: String,
    },
    /// Run the queries in a playbook document
    Playbook {
        path: PathBuf,
        /// Only run the query on this line (1-based)
        #[arg(long)]
        line: Option<usize>,
    },
    /// Read a JSON request from stdin and write a JSON response to stdout
    Exec,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let cwd = std::env::current_dir().ok();
    let compiled = match Config::load(cli.config.as_deref(), cwd.as_deref())
        .and_then(Config::compile)
    {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    match cli.command {
        Commands::Args { query } => print_args(&query, &compiled),
        Commands::Run {
            file,
            text,
            stdin,
            timeout_ms,
            query,
        } => {
            let input = match read_input(file.as_deref(), text, stdin).await {
                Ok(v) => v,
                Err(e) => {
                    eprintln!("Input error: {}", e);
                    return ExitCode::from(EXIT_ERROR);
                }
            };
            run_query(&query, input, timeout_ms, &compiled).await
        }
        Commands::Playbook { path, line } => run_playbook(&path, line, &compiled).await,
        Commands::Exec => exec_request(&compiled).await,
    }
}

fn print_args(query: &str, compiled: &CompiledConfig) -> ExitCode {
    let args = parse_command_args(query, &compiled.arity_table);
    match serde_json::to_string(&args) {
        Ok(json) => {
            let line = format!("{}\n", json);
            finish(emit(&mut io::stdout(), line.as_bytes()), ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("Output error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

async fn read_input(
    file: Option<&Path>,
    text: Option<String>,
    stdin: bool,
) -> io::Result<Option<String>> {
    if let Some(path) = file {
        return tokio::fs::read_to_string(path).await.map(Some);
    }
    if text.is_some() {
        return Ok(text);
    }
    if stdin {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        return Ok(Some(buf));
    }
    Ok(None)
}

fn executable(compiled: &CompiledConfig) -> Result<PathBuf, ExitCode> {
    compiled.executable().map_err(|e| {
        eprintln!("Config error: {}", e);
        ExitCode::from(EXIT_ERROR)
    })
}

async fn run_query(
    query: &str,
    input: Option<String>,
    timeout_ms: Option<u64>,
    compiled: &CompiledConfig,
) -> ExitCode {
    let program = match executable(compiled) {
        Ok(p) => p,
        Err(code) => return code,
    };

    let mut options = compiled.spawn_options();
    if let Some(ms) = timeout_ms {
        options.timeout = Duration::from_millis(ms);
    }

    let args = parse_command_args(query, &compiled.arity_table);
    let outcome = run(&program, &args, &options, input.as_deref()).await;
    report(&outcome)
}

/// Stdout bytes on success, stderr bytes on failure, untouched.
fn report(outcome: &Outcome) -> ExitCode {
    match outcome {
        Outcome::Success { stdout } => finish(emit(&mut io::stdout(), stdout), ExitCode::SUCCESS),
        Outcome::Failure { stderr, .. } => {
            finish(emit(&mut io::stderr(), stderr), ExitCode::from(EXIT_FAILED))
        }
    }
}

fn emit(out: &mut impl Write, bytes: &[u8]) -> io::Result<()> {
    out.write_all(bytes)?;
    out.flush()
}

/// `code` if the output was written, `EXIT_ERROR` otherwise.
fn finish(written: io::Result<()>, code: ExitCode) -> ExitCode {
    match written {
        Ok(()) => code,
        Err(e) => {
            // stderr may itself be closed.
            let _ = writeln!(io::stderr(), "Output error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

async fn run_playbook(path: &Path, line: Option<usize>, compiled: &CompiledConfig) -> ExitCode {
    let document = match tokio::fs::read_to_string(path).await {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Playbook error: {}: {}", path.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let blocks = match line {
        Some(n) => match playbook::block_at(&document, n) {
            Ok(block) => vec![block],
            Err(e) => {
                eprintln!("Playbook error: {}", e);
                return ExitCode::from(EXIT_ERROR);
            }
        },
        None => playbook::scan(&document),
    };
    if blocks.is_empty() {
        eprintln!("Playbook error: no jq queries in {}", path.display());
        return ExitCode::from(EXIT_ERROR);
    }

    let program = match executable(compiled) {
        Ok(p) => p,
        Err(code) => return code,
    };
    let base_dir = path.parent().unwrap_or(Path::new("."));
    let options = compiled.spawn_options();
    let mut failed = false;

    for block in &blocks {
        if line.is_none() {
            let header = format!("# line {}: jq {}\n", block.line, block.query);
            if let Err(e) = emit(&mut io::stdout(), header.as_bytes()) {
                return finish(Err(e), ExitCode::from(EXIT_ERROR));
            }
        }

        let input = match block.source.resolve(base_dir).await {
            Ok(v) => v,
            Err(e) => {
                eprintln!("line {}: {}", block.line, e);
                failed = true;
                continue;
            }
        };

        let args = parse_command_args(&block.query, &compiled.arity_table);
        debug!(line = block.line, ?args, "running playbook query");
        let outcome = run(&program, &args, &options, input.as_deref()).await;

        match format_failure(&outcome) {
            Some(msg) => {
                eprintln!("line {}: {}", block.line, msg);
                failed = true;
            }
            None => {
                let mut stdout = outcome.bytes().to_vec();
                if line.is_none() && !stdout.is_empty() && !stdout.ends_with(b"\n") {
                    stdout.push(b'\n');
                }
                if let Err(e) = emit(&mut io::stdout(), &stdout) {
                    return finish(Err(e), ExitCode::from(EXIT_ERROR));
                }
            }
        }
    }

    if failed {
        ExitCode::from(EXIT_FAILED)
    } else {
        ExitCode::SUCCESS
    }
}

async fn exec_request(compiled: &CompiledConfig) -> ExitCode {
    let mut input_str = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut input_str) {
        eprintln!("Request error: {}", e);
        return ExitCode::from(EXIT_ERROR);
    }

    let request = match Request::parse(&input_str) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Request error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let program = match executable(compiled) {
        Ok(p) => p,
        Err(code) => return code,
    };

    let args = request.args(&compiled.arity_table);
    let options = request.spawn_options(compiled.spawn_options());
    let payload = request.stdin_payload();
    let outcome = run(&program, &args, &options, payload.as_deref()).await;

    let code = if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_FAILED)
    };
    let response = format!("{}\n", Response::from_outcome(&outcome).to_json());
    finish(emit(&mut io::stdout(), response.as_bytes()), code)
}
