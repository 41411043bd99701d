//! BioREx CLI - Command-line interface
//!
//! Usage:
//!   biorex extract <text> -c Genes -c Drugs
//!   biorex repl
//!   biorex categories

use anyhow::Context;
use biorex_core::config::AppConfig;
use biorex_session::view::ALL_CATEGORIES_LABEL;
use biorex_session::{render_text, EntryView, HistoryView, InteractionController};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "biorex")]
#[command(about = "Biomedical relation extraction CLI")]
#[command(version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract relations from a single passage
    Extract {
        /// Biomedical passage
        text: String,
        /// Entity category to show (repeatable); omit to show all
        #[arg(short, long = "category")]
        categories: Vec<String>,
        /// Print the full record as JSON
        #[arg(long)]
        json: bool,
    },
    /// Interactive session
    Repl {
        /// Initial category selection (repeatable)
        #[arg(short, long = "category")]
        categories: Vec<String>,
    },
    /// List the configured entity categories
    Categories,
}

/// A line typed into the REPL
#[derive(Debug, PartialEq, Eq)]
enum ReplInput {
    Submit(String),
    SetCategories(Vec<String>),
    ClearCategories,
    History,
    Quit,
    Empty,
    Unknown(String),
}

impl ReplInput {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        if !line.starts_with('/') {
            return Self::Submit(line.to_string());
        }

        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        match command {
            "/categories" => Self::SetCategories(
                rest.split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(String::from)
                    .collect(),
            ),
            "/all" => Self::ClearCategories,
            "/history" => Self::History,
            "/quit" | "/exit" => Self::Quit,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// Label shown for the current selection
fn selection_label(categories: &[String]) -> String {
    if categories.is_empty() {
        ALL_CATEGORIES_LABEL.to_string()
    } else {
        categories.join(", ")
    }
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "biorex_cli={level},biorex_session={level},biorex_extractor={level}",
            level = config.logging.level
        )
        .into()
    });
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if config.logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn extract(
    controller: &InteractionController,
    text: &str,
    categories: Vec<String>,
    json: bool,
) -> anyhow::Result<()> {
    let id = controller.submit(text, categories).await?;
    let record = controller.wait_for(id).await?;

    if json {
        let mut value = serde_json::to_value(&record)?;
        value["filtered_triples"] = serde_json::to_value(record.filtered_triples())?;
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print!("{}", EntryView::build(&record).render_text());
    }

    Ok(())
}

async fn repl(controller: &InteractionController, mut categories: Vec<String>) -> anyhow::Result<()> {
    println!("Enter a biomedical passage, or /categories A, B | /all | /history | /quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        match ReplInput::parse(&line) {
            ReplInput::Empty => continue,
            ReplInput::Quit => break,
            ReplInput::SetCategories(selection) => {
                categories = selection;
                println!("Selected: {}", selection_label(&categories));
            }
            ReplInput::ClearCategories => {
                categories.clear();
                println!("Selected: {}", selection_label(&categories));
            }
            ReplInput::History => {
                print!("{}", render_text(&HistoryView::build(&controller.history().await)));
            }
            ReplInput::Unknown(command) => println!("Unknown command: {command}"),
            ReplInput::Submit(text) => {
                let id = match controller.submit(&text, categories.clone()).await {
                    Ok(id) => id,
                    Err(e) => {
                        tracing::warn!(error = %e, "Submission rejected");
                        println!("{e}");
                        continue;
                    }
                };
                println!("Processing...");
                let record = controller.wait_for(id).await?;
                tracing::info!(record = %id, status = record.outcome.as_str(), "Extraction finished");
                print!("{}", render_text(&HistoryView::build(&controller.history().await)));
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config).context("failed to load configuration")?;
    init_tracing(&config);

    match cli.command {
        Commands::Categories => {
            for category in &config.session.entity_categories {
                println!("{category}");
            }
        }
        Commands::Extract {
            text,
            categories,
            json,
        } => {
            let gateway = biorex_extractor::create_gateway(&config)?;
            let controller = InteractionController::new(gateway);
            extract(&controller, &text, categories, json).await?;
        }
        Commands::Repl { categories } => {
            let gateway = biorex_extractor::create_gateway(&config)?;
            let controller =
                InteractionController::with_event_capacity(gateway, config.session.event_capacity);
            repl(&controller, categories).await?;
        }
    }

    Ok(())
}
