//! # scout-core
//!
//! Core library for scout - a streaming client for a startup-research agent.
//!
//! This library provides:
//! - Incremental extraction of JSON objects from a streamed response body
//! - De-duplicating accumulation of company records
//! - The agent HTTP client and the search session built on it
//! - Dashboard statistics, funding summaries and result filters
//! - Configuration management and logging infrastructure
//!
//! ## Architecture
//!
//! A search flows through four stages:
//! - **Transport:** [`AgentClient`] POSTs a new conversation or PUTs a follow-up
//! - **Decode:** [`stream::Utf8Decoder`] turns byte chunks into text
//! - **Extract:** [`stream::ObjectExtractor`] recovers each complete JSON object
//! - **Accumulate:** [`CompanyAccumulator`] keeps the first record per company name
//!
//! ## Example
//!
//! ```rust,no_run
//! use scout_core::{CompanySearch, Config};
//!
//! # async fn run() -> scout_core::Result<()> {
//! let config = Config::load()?;
//! let search = CompanySearch::from_config(&config.agent)?;
//!
//! let report = search
//!     .search("seed-stage climate startups in Europe", |batch| {
//!         for company in batch {
//!             println!("{}", company.name);
//!         }
//!     })
//!     .await?;
//! println!("{} companies", report.companies_added);
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use accumulate::CompanyAccumulator;
pub use agent::{AgentClient, AgentResponse};
pub use config::Config;
pub use dashboard::Dashboard;
pub use error::{Error, Result};
pub use filter::{CompanyFilter, FundingRange};
pub use search::{CompanySearch, SearchReport};
pub use types::*;

// Public modules
pub mod accumulate;
pub mod agent;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod filter;
pub mod format;
pub mod logging;
pub mod search;
pub mod stream;
pub mod types;
