//! Interactive shell
//!
//! Reads commands from stdin while the sync poller runs in the background.
//! The shell task owns the store: user commands and fetched sync batches are
//! handled one at a time on the same loop, in arrival order.

use std::io::{IsTerminal, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use quotebook_core::sync::{spawn_sync_poller, Reconciler, SyncEvent, SyncHandle};
use quotebook_core::{Config, QuoteStore};

use crate::commands;
use crate::output::Output;

#[derive(Parser)]
#[command(
    name = "",
    no_binary_name = true,
    disable_help_subcommand = true,
    disable_help_flag = true,
    disable_version_flag = true
)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand)]
enum ShellCommand {
    /// Add a quote: add <category> <text>
    Add {
        category: String,
        #[arg(allow_hyphen_values = true)]
        text: String,
    },
    /// List quotes in the selected category
    #[command(alias = "ls")]
    List,
    /// List categories
    Categories,
    /// Show a random quote from the selected category
    Random,
    /// Select a category (or "all"); without an argument show the current one
    Filter { category: Option<String> },
    /// Show the last quote displayed
    Last,
    /// Export quotes to a JSON file
    Export { path: Option<PathBuf> },
    /// Import quotes from a JSON file
    Import { path: PathBuf },
    /// Sync with the remote feed now
    Sync,
    /// Show status
    Status,
    /// Show this help
    Help,
    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

enum Flow {
    Continue,
    Quit,
}

struct Shell<'a> {
    store: QuoteStore,
    reconciler: Reconciler,
    poller: Option<SyncHandle>,
    rng: StdRng,
    config: &'a Config,
    output: &'a Output,
    interactive: bool,
}

/// Run the shell until `quit` or end of input
pub async fn run(store: QuoteStore, config: &Config, output: &Output) -> Result<()> {
    let reconciler = Reconciler::from_config(config)?;

    let poller = if config.sync_enabled {
        debug!("Starting sync poller every {:?}", config.sync_interval());
        Some(spawn_sync_poller(
            reconciler.clone(),
            config.sync_interval(),
        ))
    } else {
        None
    };

    let mut shell = Shell {
        store,
        reconciler,
        poller,
        rng: StdRng::from_entropy(),
        config,
        output,
        interactive: std::io::stdin().is_terminal(),
    };

    if shell.interactive {
        output.message("Quotebook shell. Type 'help' for commands, 'quit' to leave.");
    }
    shell.run().await
}

impl Shell<'_> {
    async fn run(&mut self) -> Result<()> {
        let mut reader = BufReader::new(tokio::io::stdin());
        // Kept across iterations so a read interrupted by a sync event resumes
        let mut buf = Vec::new();
        self.prompt();

        loop {
            tokio::select! {
                read = reader.read_until(b'\n', &mut buf) => {
                    match read {
                        Ok(0) => break,
                        Ok(_) => {}
                        Err(e) => {
                            self.output.error(&format!("Could not read input: {}", e));
                            break;
                        }
                    }
                    let line = String::from_utf8_lossy(&buf).into_owned();
                    buf.clear();
                    if let Flow::Quit = self.handle_line(&line).await {
                        break;
                    }
                    self.prompt();
                }
                Some(event) = next_sync_event(&mut self.poller) => {
                    let SyncEvent::Fetched(fetched) = event;
                    let outcome = self.reconciler.complete(&mut self.store, fetched);
                    commands::sync::print_outcome(&outcome, self.output);
                    self.prompt();
                }
            }
        }

        if let Some(poller) = self.poller.take() {
            poller.shutdown().await;
        }
        Ok(())
    }

    async fn handle_line(&mut self, line: &str) -> Flow {
        let words = shell_words(line);
        if words.is_empty() {
            return Flow::Continue;
        }

        let command = match ShellLine::try_parse_from(words) {
            Ok(parsed) => parsed.command,
            Err(e) => {
                eprintln!("{}", e.to_string().trim_end());
                return Flow::Continue;
            }
        };

        match self.execute(command).await {
            Ok(flow) => flow,
            Err(e) => {
                self.output.report(&e);
                Flow::Continue
            }
        }
    }

    async fn execute(&mut self, command: ShellCommand) -> Result<Flow> {
        let output = self.output;
        match command {
            ShellCommand::Add { category, text } => {
                commands::quote::add(&mut self.store, &text, &category, output)?
            }
            ShellCommand::List => commands::quote::list(&self.store, None, output)?,
            ShellCommand::Categories => commands::quote::categories(&self.store, output)?,
            ShellCommand::Random => {
                commands::quote::random(&mut self.store, None, &mut self.rng, output)?
            }
            ShellCommand::Filter { category } => {
                commands::quote::filter(&mut self.store, category, output)?
            }
            ShellCommand::Last => commands::quote::last(&self.store, output)?,
            ShellCommand::Export { path } => {
                commands::transfer::export(&self.store, path, output)?
            }
            ShellCommand::Import { path } => {
                commands::transfer::import(&mut self.store, &path, output)?
            }
            ShellCommand::Sync => {
                let outcome = self.reconciler.sync_once(&mut self.store).await;
                commands::sync::print_outcome(&outcome, output);
            }
            ShellCommand::Status => commands::status::show(
                &self.store,
                self.config,
                Some(self.reconciler.phase()),
                output,
            )?,
            ShellCommand::Help => {
                println!("{}", ShellLine::command().render_help());
            }
            ShellCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn prompt(&self) {
        if self.interactive && !self.output.is_quiet() && !self.output.is_json() {
            print!("> ");
            let _ = std::io::stdout().flush();
        }
    }
}

/// Split a shell line into arguments
///
/// A word that starts with a quote runs to the matching quote, so categories
/// may contain spaces. After `add <category>` the rest of the line is the
/// quote text as typed, with one pair of enclosing quotes removed.
fn shell_words(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut rest = line;

    while let Some((word, remainder)) = next_word(rest) {
        words.push(word);
        rest = remainder;

        if words.len() == 2 && words[0] == "add" {
            let text = rest.trim();
            if !text.is_empty() {
                words.push(unquote(text));
            }
            break;
        }
    }
    words
}

/// Take one word off the front of `input`, returning it and the remainder
fn next_word(input: &str) -> Option<(String, &str)> {
    let input = input.trim_start();
    let first = input.chars().next()?;

    if first == '"' || first == '\'' {
        let body = &input[1..];
        return Some(match body.find(first) {
            Some(end) => (body[..end].to_string(), &body[end + 1..]),
            // Unterminated quote takes the rest of the line
            None => (body.to_string(), ""),
        });
    }

    let end = input.find(char::is_whitespace).unwrap_or(input.len());
    Some((input[..end].to_string(), &input[end..]))
}

fn unquote(text: &str) -> String {
    match next_word(text) {
        Some((word, rest)) if text.starts_with(['"', '\'']) && rest.trim().is_empty() => word,
        _ => text.to_string(),
    }
}

/// Next fetched batch, or never when sync is disabled
async fn next_sync_event(poller: &mut Option<SyncHandle>) -> Option<SyncEvent> {
    match poller {
        Some(handle) => handle.next_event().await,
        None => std::future::pending().await,
    }
}
