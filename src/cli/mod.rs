//! Command-line front end
//!
//! `docbench` with no sub-command opens the interactive menu; the other
//! sub-commands run one trial and exit.

mod menu;

pub use menu::{LineSource, Menu, OperatorHandler};

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::BenchConfig;
use crate::error::BenchResult;
use crate::gateway::{OperationOutcome, ProcedureOutcome, QueryResult, COUNT_UNAVAILABLE};
use crate::harness::Harness;
use crate::metrics::RunResult;

#[derive(Parser, Debug)]
#[command(name = "docbench")]
#[command(about = "Document database load-testing harness", long_about = None)]
pub struct Cli {
    /// Configuration file (default: ./docbench.toml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Account endpoint URL
    #[arg(short, long)]
    pub endpoint: Option<String>,

    /// Base64 master key
    #[arg(short, long)]
    pub key: Option<String>,

    /// Database name
    #[arg(short, long)]
    pub database: Option<String>,

    /// Container name
    #[arg(long)]
    pub container: Option<String>,

    /// Maximum concurrent creates per batch
    #[arg(long)]
    pub concurrency: Option<usize>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Interactive menu
    Menu,

    /// Insert synthetic documents
    Insert {
        /// Number of documents
        count: usize,
    },

    /// Point-read documents by id
    Read {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Run a query and drain every page
    Query { text: String },

    /// Print the container's document count
    Count,

    /// Execute a stored procedure
    Exec {
        /// Stored procedure id
        id: String,

        /// Partition key value the procedure runs under
        #[arg(short, long)]
        partition_key: String,

        /// JSON array of parameters, or a single JSON value
        #[arg(long, default_value = "")]
        params: String,
    },
}

impl Cli {
    /// Load the configuration file and lay the flags over it
    pub fn load_config(&self) -> BenchResult<BenchConfig> {
        let mut config = BenchConfig::load(self.config.as_deref())?;
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    pub fn apply(&self, config: &mut BenchConfig) {
        if let Some(endpoint) = &self.endpoint {
            config.connection.endpoint = endpoint.clone();
        }
        if let Some(key) = &self.key {
            config.connection.master_key = key.clone();
        }
        if let Some(database) = &self.database {
            config.connection.database = database.clone();
        }
        if let Some(container) = &self.container {
            config.connection.container = container.clone();
        }
        if let Some(limit) = self.concurrency {
            config.ingest.concurrency_limit = limit;
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.load_config()?;
    let mut harness = Harness::connect(&config)?;

    match cli.command.unwrap_or(Command::Menu) {
        Command::Menu => {
            harness.sink_mut().set_handler(OperatorHandler);
            harness.engine_mut().set_progress(progress_bar());
            let editor = rustyline::DefaultEditor::new()?;
            Menu::new(harness, editor).run().await;
        }
        Command::Insert { count } => {
            harness.engine_mut().set_progress(progress_bar());
            let run = harness.insert(count).await?;
            print_run(&run);
        }
        Command::Read { ids } => {
            let outcomes = harness.point_reads(&ids).await?;
            print_reads(&ids, &outcomes);
        }
        Command::Query { text } => {
            let result = harness.query(&text).await?;
            print_query(&result);
        }
        Command::Count => {
            print_count(harness.document_count().await);
        }
        Command::Exec {
            id,
            partition_key,
            params,
        } => {
            let outcome = harness
                .execute_procedure(&id, &partition_key, &params)
                .await?;
            print_procedure(&id, &outcome);
        }
    }

    Ok(())
}

fn progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    let template =
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} docs ({eta})";
    if let Ok(style) = ProgressStyle::default_bar().template(template) {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

pub fn format_duration(d: Duration) -> String {
    if d.as_secs() > 0 {
        format!("{:.2}s", d.as_secs_f64())
    } else {
        format!("{}ms", d.as_millis())
    }
}

pub fn format_rate(per_second: f64, unit: &str) -> String {
    if per_second >= 1_000_000.0 {
        format!("{:.2}M {}/s", per_second / 1_000_000.0, unit)
    } else if per_second >= 1_000.0 {
        format!("{:.2}K {}/s", per_second / 1_000.0, unit)
    } else {
        format!("{:.2} {}/s", per_second, unit)
    }
}

pub fn print_count(count: i64) {
    if count == COUNT_UNAVAILABLE {
        println!("  {} {}", "Document Count:".dimmed(), "unavailable".red());
    } else {
        println!("  {} {}", "Document Count:".dimmed(), count.to_string().white());
    }
}

pub fn print_run(run: &RunResult) {
    let status = if run.is_complete() {
        "complete".green()
    } else {
        "short".yellow()
    };
    println!();
    println!(
        "  {:.<30} {} of {} ({})",
        "Inserted ",
        run.successes.to_string().cyan(),
        run.requested,
        status
    );
    println!(
        "  {:.<30} {}",
        "Time ",
        format_duration(Duration::from_millis(run.elapsed_ms))
    );
    println!("  {:.<30} {:.2} RU", "Request charge ", run.request_charge);
    println!("  {:.<30} {}", "Throughput ", format_rate(run.throughput(), "docs"));
    println!("  {:.<30} {}", "Cost rate ", format_rate(run.charge_per_second(), "RU"));
    println!(
        "  {:.<30} {} in {} generations",
        "Batches ",
        run.batches.len(),
        run.generations
    );
    if !run.is_complete() {
        println!(
            "  {} {} documents attempted, {} short",
            "Warning:".yellow().bold(),
            run.attempted(),
            run.shortfall()
        );
    }
}

pub fn print_reads(ids: &[String], outcomes: &[OperationOutcome]) {
    println!();
    for (id, outcome) in ids.iter().zip(outcomes) {
        match &outcome.failure {
            None => println!(
                "  {:<40} {:>8} {:>10.2} RU",
                id.cyan(),
                format_duration(Duration::from_millis(outcome.elapsed_ms)),
                outcome.request_charge
            ),
            Some(failure) => println!("  {:<40} {}", id.cyan(), failure.to_string().red()),
        }
    }
}

pub fn print_query(result: &QueryResult) {
    println!();
    for row in &result.documents {
        println!("  {}", row);
    }
    println!();
    println!(
        "  {} rows, {} pages, {}, {:.2} RU",
        result.documents.len().to_string().cyan(),
        result.pages(),
        format_duration(Duration::from_millis(result.elapsed_ms)),
        result.request_charge
    );
    if let Some(failure) = &result.failure {
        println!("  {} {}", "Error:".red().bold(), failure);
    }
}

pub fn print_procedure(id: &str, outcome: &ProcedureOutcome) {
    println!();
    match &outcome.failure {
        None => {
            println!(
                "  {} {} ({:.2} RU, {})",
                "Executed".green(),
                id.cyan(),
                outcome.request_charge,
                format_duration(Duration::from_millis(outcome.elapsed_ms))
            );
            if let Some(body) = &outcome.body {
                println!("  {}", body);
            }
        }
        Some(failure) => println!("  {} {}", "Error:".red().bold(), failure),
    }
}
