//! scout - streaming startup research from the terminal
//!
//! Sends a natural-language query to the research agent and prints each
//! company as soon as its record arrives in the response stream.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Config: $XDG_CONFIG_HOME/scout/config.toml (~/.config/scout/config.toml)
//! - Logs: $XDG_STATE_HOME/scout/ (~/.local/state/scout/)

mod chat;
mod render;

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use scout_core::{CompanyFilter, CompanySearch, Config, FundingRange, SearchReport};

#[derive(Parser)]
#[command(name = "scout")]
#[command(about = "Search for startups with a streaming research agent")]
#[command(version)]
struct Args {
    /// Write debug logs to the state directory
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Agent endpoint URL (overrides agent.endpoint in config.toml)
    #[arg(long, global = true, value_name = "URL")]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one search and print the companies found
    Search {
        /// What to look for, e.g. "seed-stage climate startups in Europe"
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Continue an earlier conversation instead of starting a new one
        #[arg(long, value_name = "RUN_ID")]
        run_id: Option<String>,

        /// Print the matching companies as a JSON array
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Start an interactive research conversation
    Chat {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Show configuration and file locations
    Config,
}

#[derive(clap::Args, Debug, Default)]
struct FilterArgs {
    /// Only show companies whose funding stage contains STAGE (repeatable)
    #[arg(long = "stage", value_name = "STAGE")]
    stages: Vec<String>,

    /// Only show companies in a funding bracket: <1M, 1M-10M, 10M-50M, 50M-100M, 100M+
    #[arg(long = "range", value_name = "RANGE")]
    ranges: Vec<FundingRange>,

    /// Only show companies whose location contains LOCATION (repeatable)
    #[arg(long = "location", value_name = "LOCATION")]
    locations: Vec<String>,
}

impl FilterArgs {
    fn into_filter(self) -> CompanyFilter {
        CompanyFilter {
            stages: self.stages,
            ranges: self.ranges,
            locations: self.locations,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load().context("failed to load configuration")?;
    if let Some(endpoint) = args.endpoint {
        config.agent.endpoint = Some(endpoint);
    }

    // Held for the whole run so buffered log lines are flushed on exit
    let _log_guard = if args.verbose {
        let guard =
            scout_core::logging::init(&config.logging).context("failed to initialize logging")?;
        eprintln!("Logging to {}", guard.log_dir().display());
        Some(guard)
    } else {
        None
    };

    match args.command {
        Command::Search {
            query,
            run_id,
            json,
            filters,
        } => cmd_search(&config, &query.join(" "), run_id, filters.into_filter(), json).await,
        Command::Chat { filters } => chat::run(&config, filters.into_filter()).await,
        Command::Config => cmd_config(&config),
    }
}

fn open_search(config: &Config) -> Result<CompanySearch> {
    let search = CompanySearch::from_config(&config.agent).with_context(|| {
        format!(
            "agent is not configured; set agent.endpoint in {} or pass --endpoint",
            Config::config_path().display()
        )
    })?;
    install_cancel_handler(&search)?;
    Ok(search)
}

/// Ctrl+C cancels a running search; when idle it exits.
fn install_cancel_handler(search: &CompanySearch) -> Result<()> {
    let search = search.clone();
    ctrlc::set_handler(move || {
        if search.is_loading() {
            eprintln!("\nCancelling search...");
            search.cancel();
        } else {
            std::process::exit(130);
        }
    })
    .context("failed to set Ctrl+C handler")
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]") {
        pb.set_style(style);
    }
    pb.set_message("Searching...");
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// Run one query, printing companies that pass `filter` as they stream in.
///
/// With `quiet` nothing is printed per company; the caller renders the
/// accumulated results afterwards.
pub(crate) async fn stream_search(
    search: &CompanySearch,
    query: &str,
    filter: &CompanyFilter,
    quiet: bool,
) -> scout_core::Result<SearchReport> {
    let pb = spinner();
    let mut received = 0usize;
    let mut shown = 0usize;

    let result = search
        .search(query, |batch| {
            received += batch.len();
            for company in batch.iter().filter(|c| filter.matches(c)) {
                shown += 1;
                if !quiet {
                    pb.suspend(|| {
                        println!("{}", render::company_line(shown, company));
                        for line in render::company_details(company) {
                            println!("{line}");
                        }
                    });
                }
            }
            pb.set_message(format!("{received} companies so far..."));
        })
        .await;

    pb.finish_and_clear();
    result
}

async fn cmd_search(
    config: &Config,
    query: &str,
    run_id: Option<String>,
    filter: CompanyFilter,
    json: bool,
) -> Result<()> {
    if query.trim().is_empty() {
        bail!("query must not be empty");
    }

    let search = open_search(config)?;
    if let Some(run_id) = run_id {
        search.resume_conversation(run_id);
    }

    let result = stream_search(&search, query, &filter, json).await;

    let companies = search.companies();
    let visible = filter.apply(&companies);

    if json {
        let out = serde_json::to_string_pretty(&visible).context("failed to serialize results")?;
        println!("{out}");
    } else if !companies.is_empty() {
        println!();
        println!("{}", render::summary_line(&visible, companies.len()));
    }

    match result {
        Ok(report) => {
            if !json {
                if companies.is_empty() {
                    println!("No companies found.");
                }
                println!("Finished in {:.1}s", report.duration.as_secs_f64());
                if let Some(run_id) = &report.run_id {
                    println!("Follow up with: scout search --run-id {run_id} <QUERY>");
                }
            }
            tracing::info!(
                query,
                companies = report.companies_added,
                shown = visible.len(),
                "scout search complete"
            );
            Ok(())
        }
        Err(e) => {
            if !companies.is_empty() && !json {
                eprintln!("Showing {} companies received before the error.", companies.len());
            }
            let message = e.user_message();
            Err(anyhow::Error::new(e).context(message))
        }
    }
}

fn cmd_config(config: &Config) -> Result<()> {
    println!("Scout Configuration");
    println!("===================");
    println!();

    let config_path = Config::config_path();
    println!(
        "Config file:     {} ({})",
        config_path.display(),
        if config_path.exists() {
            "found"
        } else {
            "not found, using defaults"
        }
    );
    println!("Log directory:   {}", Config::state_dir().display());
    println!(
        "Latest log:      {}",
        scout_core::logging::latest_log_file()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "<none>".to_string())
    );
    println!();

    let agent = &config.agent;
    println!(
        "Endpoint:        {}",
        agent.endpoint.as_deref().unwrap_or("<not set>")
    );
    println!(
        "API Key:         {}",
        if agent.api_key.is_some() {
            "<set>"
        } else {
            "<not set>"
        }
    );
    println!("Run ID header:   {}", agent.run_id_header);
    println!("Timeout:         {}s", agent.timeout_secs);
    println!("Connect timeout: {}s", agent.connect_timeout_secs);
    println!("Log level:       {}", config.logging.level);

    if !agent.is_ready() {
        println!();
        println!("No agent endpoint configured. Add one to config.toml:");
        println!();
        println!("  [agent]");
        println!("  endpoint = \"https://agents.example.com/v1/agent-runs/your-agent\"");
        println!("  api_key = \"th_xxxxxxxxxxxx\"");
    } else if let Err(e) = agent.validate() {
        println!();
        println!("Configuration problem: {e}");
    }

    Ok(())
}
