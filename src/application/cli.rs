#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;

use std::io;
use std::path;

use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::ArgMatches;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use tokio::fs;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use yansi::Paint;

use super::render;
use super::repl::help_text;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::LogEntry;
use crate::domain::models::QueryId;
use crate::domain::services::aggregate;
use crate::domain::services::classify;
use crate::infrastructure::backends::BackendManager;

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(&config_file_path).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

async fn read_input(file: &str) -> Result<String> {
    if file == "-" {
        let mut text = String::new();
        tokio::io::stdin().read_to_string(&mut text).await?;
        return Ok(text);
    }

    return fs::read_to_string(file)
        .await
        .with_context(|| return format!("Failed to read {file}"));
}

/// Parses an execution log. The analysis service keeps it as CSV with
/// `query,exec_time_ms,timestamp` columns; a JSON array of the same records is
/// also accepted.
fn parse_logs(text: &str) -> Result<Vec<LogEntry>> {
    if text.trim_start().starts_with('[') {
        let logs = serde_json::from_str::<Vec<LogEntry>>(text)
            .context("Log is not a JSON array of log records")?;
        return Ok(logs);
    }

    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let logs = reader
        .deserialize::<LogEntry>()
        .collect::<Result<Vec<LogEntry>, csv::Error>>()
        .context("Log is not a CSV file with query, exec_time_ms and timestamp columns")?;

    return Ok(logs);
}

async fn read_logs(file: &str) -> Result<Vec<LogEntry>> {
    let text = read_input(file).await?;
    return parse_logs(&text).with_context(|| return format!("Failed to parse {file}"));
}

fn heading(text: &str) -> String {
    return Paint::new(text).underline().bold().to_string();
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a String> {
    if let Some(val) = matches.get_one::<String>(name) {
        return Ok(val);
    }

    bail!("Missing required argument {name}");
}

async fn run_analyze(matches: &ArgMatches) -> Result<()> {
    let query = required(matches, "query")?;
    let res = BackendManager::get().analyze(query).await?;

    println!("{}", render::sections(&classify(&res.analysis)));
    if !res.updated_logs.is_empty() {
        println!("\n{}\n{}", heading("Performance"), render::report(&aggregate(&res.updated_logs)));
    }

    return Ok(());
}

async fn run_inspect(matches: &ArgMatches) -> Result<()> {
    let query_id = match matches.get_one::<QueryId>("query-id") {
        Some(query_id) => *query_id,
        None => bail!("Missing required argument query-id"),
    };

    let backend = BackendManager::get();
    let report = backend.analyze_query(query_id).await?;

    println!("{} {}", heading("Query"), report.query_id);
    println!("{}\n", report.query_text);
    println!("Execution time: {:.2} ms", report.exec_time_ms);
    if let Some(bottleneck) = &report.bottleneck_operator {
        println!("Bottleneck:     {bottleneck}");
    }
    println!("\n{}", render::sections(&classify(&report.ai_analysis)));

    if report.has_graph {
        let graph_url = report
            .graph_url
            .clone()
            .unwrap_or_else(|| return backend.graph_url(query_id));
        println!("\nGraph: {}", Paint::new(graph_url).underline());
    }

    return Ok(());
}

async fn run_execute(matches: &ArgMatches) -> Result<()> {
    let query = required(matches, "query")?;
    let res = BackendManager::get().execute_query(query).await?;

    println!(
        "({}) {} in {:.2} ms, {} rows",
        res.query_id, res.message, res.exec_time_ms, res.row_count
    );

    return Ok(());
}

async fn run_upload(matches: &ArgMatches) -> Result<()> {
    let dataset = required(matches, "dataset")?;
    let log = required(matches, "log")?;
    let res = BackendManager::get()
        .upload(path::Path::new(dataset), path::Path::new(log))
        .await?;

    println!("{}\n{}", heading("Schema"), render::schema(&res.schema));
    println!("\n{}\n{}", heading("Performance"), render::report(&aggregate(&res.logs)));

    return Ok(());
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn arg_query() -> Arg {
    return Arg::new("query")
        .help("SQL query text.")
        .num_args(1)
        .required(true);
}

fn arg_file(name: &'static str, help: &'static str) -> Arg {
    return Arg::new(name).help(help).num_args(1).required(true);
}

pub fn build() -> Command {
    let commands_text = help_text()
        .split('\n')
        .map(|line| {
            if line.starts_with('-') {
                return format!("  {line}");
            }
            if line.starts_with("COMMANDS:") || line.starts_with("TIPS:") {
                return Paint::new(format!("CHAT {line}"))
                    .underline()
                    .bold()
                    .to_string();
            }
            return line.to_string();
        })
        .collect::<Vec<String>>()
        .join("\n");

    let about = format!(
        "{}\n\nVersion: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
    );

    return Command::new("querylens")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(commands_text)
        .arg_required_else_help(false)
        .subcommand(Command::new("chat").about("Start an interactive chat about your queries."))
        .subcommand(
            Command::new("analyze")
                .about("Run a query on the analysis service and print its performance narrative.")
                .arg(arg_query()),
        )
        .subcommand(
            Command::new("inspect")
                .about("Print the detailed analysis of a previously profiled query.")
                .arg(
                    Arg::new("query-id")
                        .help("Query ID as listed by `querylens queries`.")
                        .num_args(1)
                        .value_parser(value_parser!(i64))
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("run")
                .about("Execute a query and print how long it took.")
                .arg(arg_query()),
        )
        .subcommand(Command::new("queries").about("List profiled queries, slowest first."))
        .subcommand(
            Command::new("upload")
                .about("Upload a dataset and its execution log.")
                .arg(arg_file("dataset", "Path to the database file."))
                .arg(arg_file("log", "Path to the CSV execution log (query, exec_time_ms and timestamp columns).")),
        )
        .subcommand(
            Command::new("stats")
                .about("Aggregate a local execution log, CSV as kept by the analysis service or a JSON array of records.")
                .arg(arg_file("file", "Path to the log file, or - for stdin.")),
        )
        .subcommand(
            Command::new("classify")
                .about("Split a performance narrative into summary, optimizations, warnings and recommendations.")
                .arg(arg_file("file", "Path to the narrative text, or - for stdin.")),
        )
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("QUERYLENS_CONFIG_FILE")
                .num_args(1)
                .help(format!("Path to configuration file [default: {}]", Config::default(ConfigKey::ConfigFile)))
                .global(true)
        )
        .arg(
            Arg::new(ConfigKey::ApiURL.to_string())
                .long(ConfigKey::ApiURL.to_string())
                .env("QUERYLENS_API_URL")
                .num_args(1)
                .help(format!("URL of the query analysis service. [default: {}]", Config::default(ConfigKey::ApiURL)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::BackendHealthCheckTimeout.to_string())
                .long(ConfigKey::BackendHealthCheckTimeout.to_string())
                .env("QUERYLENS_BACKEND_HEALTH_CHECK_TIMEOUT")
                .num_args(1)
                .help(format!("Time to wait in milliseconds before timing out when doing a healthcheck for the analysis service. [default: {}]", Config::default(ConfigKey::BackendHealthCheckTimeout)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::RequestTimeout.to_string())
                .long(ConfigKey::RequestTimeout.to_string())
                .env("QUERYLENS_REQUEST_TIMEOUT")
                .num_args(1)
                .help(format!("Time to wait in milliseconds for the analysis service to answer a request. [default: {}]", Config::default(ConfigKey::RequestTimeout)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::Username.to_string())
                .short('u')
                .long(ConfigKey::Username.to_string())
                .env("QUERYLENS_USERNAME")
                .num_args(1)
                .help("Your name as shown in chat transcripts. Defaults to $USER.")
                .global(true),
        );
}

/// Parses the command line and runs one-shot subcommands. Returns true when
/// the interactive chat should start.
pub async fn parse() -> Result<bool> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("chat", subcmd_matches)) => {
            Config::load(vec![&matches, subcmd_matches]).await?;
        }
        Some(("analyze", subcmd_matches)) => {
            Config::load(vec![&matches, subcmd_matches]).await?;
            run_analyze(subcmd_matches).await?;
            return Ok(false);
        }
        Some(("inspect", subcmd_matches)) => {
            Config::load(vec![&matches, subcmd_matches]).await?;
            run_inspect(subcmd_matches).await?;
            return Ok(false);
        }
        Some(("run", subcmd_matches)) => {
            Config::load(vec![&matches, subcmd_matches]).await?;
            run_execute(subcmd_matches).await?;
            return Ok(false);
        }
        Some(("queries", subcmd_matches)) => {
            Config::load(vec![&matches, subcmd_matches]).await?;
            let queries = BackendManager::get().list_queries().await?;
            println!("{}", render::queries(&queries));
            return Ok(false);
        }
        Some(("upload", subcmd_matches)) => {
            Config::load(vec![&matches, subcmd_matches]).await?;
            run_upload(subcmd_matches).await?;
            return Ok(false);
        }
        Some(("stats", subcmd_matches)) => {
            let logs = read_logs(required(subcmd_matches, "file")?).await?;
            println!("{}", render::report(&aggregate(&logs)));
            return Ok(false);
        }
        Some(("classify", subcmd_matches)) => {
            let narrative = read_input(required(subcmd_matches, "file")?).await?;
            println!("{}", render::sections(&classify(&narrative)));
            return Ok(false);
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
            return Ok(false);
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
                return Ok(false);
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
                return Ok(false);
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
                return Ok(false);
            }
            _ => {
                subcommand_config().print_long_help()?;
                return Ok(false);
            }
        },
        _ => {
            Config::load(vec![&matches]).await?;
        }
    }

    return Ok(true);
}
