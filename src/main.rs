//! FlashQuery - Query Runner for Redis-Compatible Stores
//!
//! This is the command-line entry point. It builds a runner through the
//! registry from command-line flags, runs queries and prints each result as
//! one JSON document on stdout. Logs go to stderr.

use flashquery::query::QueryOutput;
use flashquery::registry::{Registry, REDIS_RUNNER};
use flashquery::runner::QueryRunner;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// What the invocation should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Query,
    Schema,
    Ping,
}

/// Command-line configuration
struct Config {
    host: Option<String>,
    port: Option<u16>,
    db: Option<u32>,
    username: Option<String>,
    password: Option<String>,
    use_tls: bool,
    mode: Mode,
    /// Query words given on the command line
    query: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: None,
            port: None,
            db: None,
            username: None,
            password: None,
            use_tls: false,
            mode: Mode::Query,
            query: Vec::new(),
        }
    }
}

impl Config {
    /// Parse configuration from command-line arguments
    fn from_args() -> Self {
        let mut config = Config::default();
        let args: Vec<String> = std::env::args().collect();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--host" | "-h" => {
                    config.host = Some(value_of(&args, i, "--host").to_string());
                    i += 2;
                }
                "--port" | "-p" => {
                    config.port = Some(value_of(&args, i, "--port").parse().unwrap_or_else(|_| {
                        eprintln!("Error: invalid port number");
                        std::process::exit(1);
                    }));
                    i += 2;
                }
                "--db" | "-n" => {
                    config.db = Some(value_of(&args, i, "--db").parse().unwrap_or_else(|_| {
                        eprintln!("Error: invalid database index");
                        std::process::exit(1);
                    }));
                    i += 2;
                }
                "--user" => {
                    config.username = Some(value_of(&args, i, "--user").to_string());
                    i += 2;
                }
                "--password" | "-a" => {
                    config.password = Some(value_of(&args, i, "--password").to_string());
                    i += 2;
                }
                "--tls" => {
                    config.use_tls = true;
                    i += 1;
                }
                "--schema" => {
                    config.mode = Mode::Schema;
                    i += 1;
                }
                "--ping" => {
                    config.mode = Mode::Ping;
                    i += 1;
                }
                "--help" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("FlashQuery version {}", flashquery::VERSION);
                    std::process::exit(0);
                }
                arg if arg.starts_with('-') => {
                    eprintln!("Unknown argument: {}", arg);
                    print_help();
                    std::process::exit(1);
                }
                word => {
                    config.query.push(word.to_string());
                    i += 1;
                }
            }
        }

        config
    }

    /// The runner configuration object, as a host would store it
    fn runner_config(&self) -> serde_json::Value {
        let mut object = json!({ "useTLS": self.use_tls });
        if let Some(host) = &self.host {
            object["host"] = json!(host);
        }
        if let Some(port) = self.port {
            object["port"] = json!(port);
        }
        if let Some(db) = self.db {
            object["db"] = json!(db);
        }
        if let Some(username) = &self.username {
            object["username"] = json!(username);
        }
        if let Some(password) = &self.password {
            object["password"] = json!(password);
        }
        object
    }
}

/// Returns the argument following the flag at `i`, or exits
fn value_of<'a>(args: &'a [String], i: usize, flag: &str) -> &'a str {
    match args.get(i + 1) {
        Some(value) => value,
        None => {
            eprintln!("Error: {} requires a value", flag);
            std::process::exit(1);
        }
    }
}

fn print_help() {
    println!(
        r#"
FlashQuery - Query Runner for Redis-Compatible Stores

USAGE:
    flashquery [OPTIONS] [QUERY]

OPTIONS:
    -h, --host <HOST>          Store host (default: localhost)
    -p, --port <PORT>          Store port (default: 3306 with a warning; use 6379)
    -n, --db <INDEX>           Database index (default: 0)
        --user <NAME>          Username sent with AUTH
    -a, --password <PASSWORD>  Password sent with AUTH
        --tls                  Request a TLS connection (not supported)
        --schema               List keys and their types
        --ping                 Check that the store answers a key scan
    -v, --version              Print version information
        --help                 Print this help message

QUERIES:
    key <name>                 The string stored under <name>
    zset <name>                Members of a sorted set, lowest score first
    hashkey <name> <field>     One field of a hash
    hash <name>                Every field of a hash

    Without a QUERY, one query per line is read from stdin.

EXAMPLES:
    flashquery -p 6379 key greeting
    flashquery -p 6379 hash user:1
    flashquery -p 6379 --schema
    echo "zset leaderboard" | flashquery -p 6379
"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let config = Config::from_args();

    // Set up logging on stderr so stdout carries only results
    let _subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();

    let registry = Registry::with_defaults();
    let runner = registry.create(REDIS_RUNNER, config.runner_config())?;

    match config.mode {
        Mode::Ping => {
            runner.test_connection().await?;
            println!("{}", json!({ "ok": true }));
        }
        Mode::Schema => {
            let schema = runner.schema().await?;
            println!("{}", serde_json::to_string(&schema)?);
        }
        Mode::Query if !config.query.is_empty() => {
            let output = runner.run_query(&config.query.join(" ")).await?;
            print_output(&output)?;
        }
        Mode::Query => {
            let failed = run_stdin(&*runner).await?;
            if failed > 0 {
                anyhow::bail!("{} queries failed", failed);
            }
        }
    }

    Ok(())
}

/// Runs every non-empty stdin line as a query. Returns the number of
/// queries that failed.
async fn run_stdin(runner: &dyn QueryRunner) -> anyhow::Result<usize> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut failed = 0;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match runner.run_query(line).await {
            Ok(output) => print_output(&output)?,
            Err(e) => {
                error!(query = %line, "Query failed: {}", e);
                failed += 1;
            }
        }
    }

    info!(failed, "Input exhausted");
    Ok(failed)
}

fn print_output(output: &QueryOutput) -> anyhow::Result<()> {
    println!("{}", output.to_json()?);
    Ok(())
}
