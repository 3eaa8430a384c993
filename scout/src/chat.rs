//! Interactive research conversation
//!
//! Each line is sent to the agent as a follow-up in the same conversation
//! until `/new` starts over. Slash commands manage saved companies and show
//! the session dashboard.

use std::io::Write;

use anyhow::{Context, Result};
use scout_core::{CompanyFilter, Config, Dashboard};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::render;

const HELP: &str = "Commands: /new  /save <name>  /unsave <name>  /saved  /history  /stats  /help  /quit";

#[derive(Debug, PartialEq, Eq)]
enum ChatCommand<'a> {
    Query(&'a str),
    New,
    Save(&'a str),
    Unsave(&'a str),
    Saved,
    History,
    Stats,
    Help,
    Quit,
    Unknown(&'a str),
}

impl<'a> ChatCommand<'a> {
    fn parse(line: &'a str) -> Self {
        let line = line.trim();
        let Some(command) = line.strip_prefix('/') else {
            return ChatCommand::Query(line);
        };

        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (command, ""),
        };

        match (name, arg.is_empty()) {
            ("new", _) => ChatCommand::New,
            ("save", false) => ChatCommand::Save(arg),
            ("unsave", false) => ChatCommand::Unsave(arg),
            ("saved", _) => ChatCommand::Saved,
            ("history", _) => ChatCommand::History,
            ("stats", _) => ChatCommand::Stats,
            ("help", _) => ChatCommand::Help,
            ("quit" | "exit", _) => ChatCommand::Quit,
            _ => ChatCommand::Unknown(line),
        }
    }
}

pub async fn run(config: &Config, filter: CompanyFilter) -> Result<()> {
    let search = crate::open_search(config)?;

    let mut dashboard = Dashboard::new();
    dashboard.subscribe(|stats| {
        tracing::debug!(
            total_searches = stats.total_searches,
            companies_found = stats.companies_found,
            saved = stats.saved_companies,
            "Dashboard updated"
        );
    });

    println!("scout chat: ask about startups; follow-up questions refine the results.");
    if !filter.is_empty() {
        println!("{} filter(s) active.", filter.active_count());
    }
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush().context("failed to write prompt")?;

        let Some(line) = lines.next_line().await.context("failed to read input")? else {
            println!();
            break;
        };

        match ChatCommand::parse(&line) {
            ChatCommand::Query("") => {}
            ChatCommand::Query(query) => {
                match crate::stream_search(&search, query, &filter, false).await {
                    Ok(report) => {
                        let companies = search.companies();
                        let visible = filter.apply(&companies);
                        if companies.is_empty() {
                            println!("No companies found.");
                        } else {
                            println!("{}", render::summary_line(&visible, companies.len()));
                        }
                        dashboard.record_search(query, report.companies_added);
                    }
                    Err(e) => {
                        eprintln!("{}", e.user_message());
                        let retained = search.companies().len();
                        if retained > 0 {
                            eprintln!("Kept {retained} companies received before the error.");
                        }
                    }
                }
            }
            ChatCommand::New => {
                search.new_conversation();
                println!("Started a new conversation.");
            }
            ChatCommand::Save(name) => {
                let companies = search.companies();
                match companies
                    .iter()
                    .find(|c| c.name.eq_ignore_ascii_case(name))
                {
                    Some(company) => {
                        if dashboard.save_company(
                            &company.name,
                            &company.funding_stage,
                            &company.funding_amount,
                        ) {
                            println!("Saved {}.", company.name);
                        } else {
                            println!("{} is already saved.", company.name);
                        }
                    }
                    None => println!("No company named {name:?} in the current results."),
                }
            }
            ChatCommand::Unsave(name) => {
                let saved = dashboard
                    .saved_companies()
                    .into_iter()
                    .find(|c| c.name.eq_ignore_ascii_case(name))
                    .map(|c| c.name.clone());
                match saved {
                    Some(saved) if dashboard.unsave_company(&saved) => {
                        println!("Removed {saved}.")
                    }
                    _ => println!("{name:?} is not saved."),
                }
            }
            ChatCommand::Saved => {
                let saved = dashboard.saved_companies();
                if saved.is_empty() {
                    println!("No saved companies.");
                }
                for company in saved {
                    println!("{}", render::saved_line(company));
                }
            }
            ChatCommand::History => {
                let history = dashboard.search_history();
                if history.is_empty() {
                    println!("No searches yet.");
                }
                for entry in history {
                    println!("{}", render::history_line(entry));
                }
            }
            ChatCommand::Stats => {
                for line in render::stats_lines(dashboard.stats()) {
                    println!("{line}");
                }
            }
            ChatCommand::Help => println!("{HELP}"),
            ChatCommand::Quit => break,
            ChatCommand::Unknown(input) => println!("Unknown command {input:?}. {HELP}"),
        }
    }

    tracing::info!(
        searches = dashboard.stats().total_searches,
        saved = dashboard.stats().saved_companies,
        "scout chat finished"
    );
    Ok(())
}
