use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use gce_actions::config::Config;
use gce_actions::gcp::operation::OperationEvent;
use gce_actions::{Action, ActionMethod, Dispatcher, Params};
use serde_json::Value;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Run named Compute Engine actions
#[derive(Parser, Debug)]
#[command(name = "gce-actions", version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Project used when neither the action's PROJECT nor its service account key names one
    #[arg(short, long, global = true)]
    project: Option<String>,

    /// Default zone when the action has no ZONE
    #[arg(short, long, global = true)]
    zone: Option<String>,

    /// Compute Engine API root
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Interval between operation polls, in milliseconds
    #[arg(long, global = true)]
    poll_interval_ms: Option<u64>,

    /// Do not print operation progress to stderr
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Dispatch an action document (JSON or YAML)
    Run {
        /// Action file, or `-` for stdin
        #[arg(short, long, default_value = "-")]
        action: String,
    },
    /// Dispatch an action built from flags
    Call {
        /// Method name, e.g. STOP_INSTANCE
        method: String,
        /// Parameter as KEY=VALUE (repeatable)
        #[arg(short = 'P', long = "param", value_parser = parse_key_value)]
        params: Vec<(String, String)>,
    },
    /// List supported method names
    Methods,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_filter(self) -> Option<&'static str> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some("error"),
            LogLevel::Warn => Some("warn"),
            LogLevel::Info => Some("info"),
            LogLevel::Debug => Some("debug"),
            LogLevel::Trace => Some("trace"),
        }
    }
}

fn parse_key_value(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got `{}`", s)),
    }
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(filter) = level.as_filter() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {:?}", log_path))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    // RUST_LOG wins over --log-level
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("gce-actions started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("gce-actions").join("gce-actions.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".gce-actions").join("gce-actions.log");
    }
    PathBuf::from("gce-actions.log")
}

/// Parse an action document. YAML for .yaml/.yml files, JSON otherwise;
/// stdin accepts either.
fn parse_action(content: &str, path: Option<&Path>) -> Result<Action> {
    let is_yaml = path
        .and_then(|p| p.extension())
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));

    match is_yaml {
        Some(true) => serde_yaml::from_str(content).context("Invalid YAML action"),
        Some(false) => serde_json::from_str(content).context("Invalid JSON action"),
        None => serde_json::from_str(content)
            .or_else(|_| serde_yaml::from_str(content))
            .context("Action on stdin is neither JSON nor YAML"),
    }
}

fn read_action(source: &str) -> Result<Action> {
    if source == "-" {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .context("Failed to read action from stdin")?;
        return parse_action(&content, None);
    }

    let path = Path::new(source);
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", source))?;
    parse_action(&content, Some(path))
}

fn print_progress(event: &OperationEvent) {
    match event {
        OperationEvent::Running {
            name,
            status,
            progress,
            elapsed,
        } => eprintln!(
            "{}: {} ({}%, {:.0}s)",
            name,
            status,
            progress.unwrap_or(0),
            elapsed.as_secs_f64()
        ),
        OperationEvent::Completed { name } => eprintln!("{}: done", name),
        OperationEvent::Failed { name, error } => eprintln!("{}: failed: {}", name, error),
    }
}

/// Bare strings (an external IP) print raw; everything else as pretty JSON
fn render_result(value: &Value) -> Result<String> {
    Ok(match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other)?,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level)?;

    let action = match &args.command {
        Command::Methods => {
            for method in ActionMethod::ALL {
                println!("{}", method);
            }
            return Ok(());
        },
        Command::Run { action } => read_action(action)?,
        Command::Call { method, params } => Action::new(
            method,
            params
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect::<Params>(),
        ),
    };

    // CLI > config file > gcloud defaults
    let mut config = Config::load();
    if let Some(project) = &args.project {
        config.project_id = Some(project.clone());
    }
    if let Some(zone) = &args.zone {
        config.zone = Some(zone.clone());
    }
    if let Some(endpoint) = &args.endpoint {
        config.endpoint = Some(endpoint.clone());
    }
    if let Some(ms) = args.poll_interval_ms {
        config.poll_interval_ms = ms;
    }

    let options = config.dispatch_options()?;
    tracing::info!(
        "Endpoint: {}, poll interval: {:?}",
        options.endpoint,
        options.poll_interval
    );

    let mut dispatcher = Dispatcher::new(options);
    if !args.quiet {
        dispatcher = dispatcher.with_progress(Box::new(print_progress));
    }

    let result = dispatcher
        .dispatch(&action)
        .await
        .with_context(|| format!("{} failed", action.method.name))?;

    println!("{}", render_result(&result)?);
    Ok(())
}
