use colored::Colorize;
use rand::Rng;
use rustyline::error::ReadlineError;
use std::io::{self, BufRead};
use tokio::runtime::{Handle, RuntimeFlavor};

use super::{print_count, print_procedure, print_query, print_reads, print_run};
use crate::error::{BenchError, BenchResult};
use crate::gateway::DocumentStore;
use crate::harness::Harness;
use crate::report::{ContentionAction, ContentionHandler};

/// Where menu input comes from
pub trait LineSource {
    /// Next line without its terminator; `None` once input is closed
    fn read_line(&mut self, prompt: &str) -> Option<String>;
}

impl LineSource for rustyline::DefaultEditor {
    fn read_line(&mut self, prompt: &str) -> Option<String> {
        match self.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.add_history_entry(line.as_str());
                }
                Some(line)
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => None,
            Err(err) => {
                println!("{} {:?}", "Error:".red(), err);
                None
            }
        }
    }
}

/// Interactive trial menu. Blank input leaves a sub-menu; anything other
/// than a listed entry at the top level exits.
pub struct Menu<S, R, L> {
    harness: Harness<S, R>,
    input: L,
}

impl<S: DocumentStore, R: Rng, L: LineSource> Menu<S, R, L> {
    pub fn new(harness: Harness<S, R>, input: L) -> Self {
        Self { harness, input }
    }

    pub fn harness(&self) -> &Harness<S, R> {
        &self.harness
    }

    pub async fn run(&mut self) {
        loop {
            println!();
            println!("{}", "MENU".bold());
            print_count(self.harness.document_count().await);
            println!("  {}  Add random documents", "1".cyan());
            println!("  {}  Read documents with point read", "2".cyan());
            println!("  {}  Run SQL query on container", "3".cyan());
            println!("  {}  Execute stored procedure", "4".cyan());

            let Some(entry) = self.input.read_line("Enter: ") else {
                break;
            };

            let result = match entry.trim() {
                "1" => self.insert().await,
                "2" => self.point_reads().await,
                "3" => self.query().await,
                "4" => self.procedure().await,
                _ => break,
            };

            if let Err(e) = result {
                report_error(&e);
            }
        }
        println!("{}", "Terminated".dimmed());
    }

    async fn insert(&mut self) -> BenchResult<()> {
        loop {
            let Some(line) = self.prompt("Amount to add (blank to exit): ") else {
                return Ok(());
            };
            match line.parse::<usize>() {
                Ok(count) => {
                    let run = self.harness.insert(count).await?;
                    print_run(&run);
                    return Ok(());
                }
                Err(_) => println!("  {} '{}' is not a document count", "Error:".red(), line),
            }
        }
    }

    async fn point_reads(&mut self) -> BenchResult<()> {
        let mut ids = Vec::new();
        while let Some(id) = self.prompt("Enter id to read (blank to finish): ") {
            ids.push(id);
        }
        if ids.is_empty() {
            return Ok(());
        }
        let outcomes = self.harness.point_reads(&ids).await?;
        print_reads(&ids, &outcomes);
        Ok(())
    }

    async fn query(&mut self) -> BenchResult<()> {
        let Some(text) = self.prompt("Enter SQL query (blank to exit): ") else {
            return Ok(());
        };
        let result = self.harness.query(&text).await?;
        print_query(&result);
        Ok(())
    }

    async fn procedure(&mut self) -> BenchResult<()> {
        let Some(id) = self.prompt("Stored procedure id (blank to exit): ") else {
            return Ok(());
        };
        let Some(partition_key) = self.prompt("Partition key value (blank to exit): ") else {
            return Ok(());
        };

        loop {
            let params = self
                .input
                .read_line("Parameters in JSON: ")
                .unwrap_or_default();
            println!("{}", "Executing stored procedure".dimmed());
            match self
                .harness
                .execute_procedure(&id, &partition_key, &params)
                .await
            {
                Ok(outcome) => {
                    print_procedure(&id, &outcome);
                    return Ok(());
                }
                Err(BenchError::JsonError(e)) => {
                    println!("  {} parameters are not valid JSON: {}", "Error:".red(), e)
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Trimmed non-blank line, `None` for blank input or closed input
    fn prompt(&mut self, prompt: &str) -> Option<String> {
        let line = self.input.read_line(prompt)?;
        let line = line.trim();
        (!line.is_empty()).then(|| line.to_string())
    }
}

fn report_error(error: &BenchError) {
    println!("  {} {}", "Error:".red().bold(), error);
    if let BenchError::ReportContended { row, .. } = error {
        println!("  {} {}", "Unwritten row:".yellow(), row);
    }
}

/// Asks the operator to release a busy report file
#[derive(Debug, Default, Clone, Copy)]
pub struct OperatorHandler;

impl ContentionHandler for OperatorHandler {
    fn on_contention(&self, destination: &str, error: &io::Error) -> ContentionAction {
        println!(
            "  {} The file {} is in use ({}). Close it and press Enter to try again, or type 'skip'.",
            "Warning:".yellow().bold(),
            destination.cyan(),
            error
        );
        blocking(|| read_answer(&mut io::stdin().lock()))
    }
}

/// Enter retries; `skip`, closed input or a read error gives up
fn read_answer<B: BufRead>(input: &mut B) -> ContentionAction {
    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) | Err(_) => ContentionAction::GiveUp,
        Ok(_) if line.trim().eq_ignore_ascii_case("skip") => ContentionAction::GiveUp,
        Ok(_) => ContentionAction::Retry,
    }
}

/// Run a blocking read without stalling the runtime's other tasks.
/// `block_in_place` panics on a current-thread runtime, so that case runs
/// the read directly.
fn blocking<T>(read: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(read)
        }
        _ => read(),
    }
}
