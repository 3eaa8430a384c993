//! Formatting helpers shared across front ends.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::types::Company;

/// Format a timestamp as relative time (e.g., "2m ago").
pub fn format_relative_time(ts: DateTime<Utc>) -> String {
    let now = Utc::now();
    let duration = now.signed_duration_since(ts);

    if duration.num_seconds() < 0 {
        "just now".to_string()
    } else if duration.num_seconds() < 60 {
        format!("{}s ago", duration.num_seconds())
    } else if duration.num_minutes() < 60 {
        format!("{}m ago", duration.num_minutes())
    } else if duration.num_hours() < 24 {
        format!("{}h ago", duration.num_hours())
    } else if duration.num_days() < 7 {
        format!("{}d ago", duration.num_days())
    } else {
        ts.format("%b %d").to_string()
    }
}

static FUNDING_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\$?([\d.]+)\s*(B|M|K)?").expect("funding amount pattern is valid")
});

/// Parse an agent-written funding amount such as "$12.5M" or "800k".
///
/// The first number in the text counts; a B/M/K suffix scales it.
pub fn parse_funding_amount(text: &str) -> Option<f64> {
    let captures = FUNDING_AMOUNT.captures(text.trim())?;
    let value: f64 = captures.get(1)?.as_str().parse().ok()?;
    let multiplier = match captures
        .get(2)
        .map(|unit| unit.as_str().to_ascii_uppercase())
        .as_deref()
    {
        Some("B") => 1_000_000_000.0,
        Some("M") => 1_000_000.0,
        Some("K") => 1_000.0,
        _ => 1.0,
    };
    Some(value * multiplier)
}

/// Render a dollar amount with one decimal and a B/M/K suffix.
pub fn format_funding(value: f64) -> String {
    if value >= 1_000_000_000.0 {
        format!("${:.1}B", value / 1_000_000_000.0)
    } else if value >= 1_000_000.0 {
        format!("${:.1}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("${:.1}K", value / 1_000.0)
    } else {
        format!("${:.0}", value)
    }
}

/// Total and average funding over the companies whose amount parses.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FundingSummary {
    pub total: f64,
    pub average: f64,
    /// Companies with a parseable funding amount
    pub counted: usize,
}

impl FundingSummary {
    pub fn from_companies<'a>(companies: impl IntoIterator<Item = &'a Company>) -> Self {
        let (total, counted) = companies
            .into_iter()
            .filter_map(|c| parse_funding_amount(&c.funding_amount))
            .fold((0.0, 0usize), |(sum, n), amount| (sum + amount, n + 1));

        let average = if counted > 0 {
            total / counted as f64
        } else {
            0.0
        };

        Self {
            total,
            average,
            counted,
        }
    }
}
