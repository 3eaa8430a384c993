//! Plain-text rendering of companies, summaries and dashboard rows.

use scout_core::dashboard::{DashboardStats, SavedCompany, SearchHistoryEntry};
use scout_core::format::{format_funding, format_relative_time, FundingSummary};
use scout_core::Company;

const DESCRIPTION_WIDTH: usize = 100;

/// One-line listing: `  3. Acme | Series A | $12M | Berlin`
pub fn company_line(index: usize, company: &Company) -> String {
    let mut parts = vec![company.name.trim()];
    for field in [
        &company.funding_stage,
        &company.funding_amount,
        &company.location,
    ] {
        let field = field.trim();
        if !field.is_empty() {
            parts.push(field);
        }
    }
    format!("{index:>3}. {}", parts.join(" | "))
}

/// Indented detail lines shown under [`company_line`]; empty fields are skipped.
pub fn company_details(company: &Company) -> Vec<String> {
    let mut lines = Vec::new();

    if !company.description.trim().is_empty() {
        lines.push(truncate(company.description.trim(), DESCRIPTION_WIDTH));
    }

    let mut facts = Vec::new();
    if let Some(team) = company.team_size {
        facts.push(format!("Team: {team}"));
    }
    if !company.founded.trim().is_empty() {
        facts.push(format!("Founded: {}", company.founded.trim()));
    }
    if !company.valuation.trim().is_empty() {
        facts.push(format!("Valuation: {}", company.valuation.trim()));
    }
    if !facts.is_empty() {
        lines.push(facts.join(" | "));
    }

    if !company.investors.is_empty() {
        lines.push(format!("Investors: {}", company.investors.join(", ")));
    }
    if !company.links.website.trim().is_empty() {
        lines.push(company.links.website.trim().to_string());
    }

    lines.into_iter().map(|line| format!("     {line}")).collect()
}

/// Count line with funding totals for the companies on screen.
pub fn summary_line(visible: &[&Company], total: usize) -> String {
    let mut line = if visible.len() == total {
        format!("{total} companies")
    } else {
        format!("{} of {total} companies match filters", visible.len())
    };

    let funding = FundingSummary::from_companies(visible.iter().copied());
    if funding.counted > 0 {
        line.push_str(&format!(
            " | {} total funding | {} average",
            format_funding(funding.total),
            format_funding(funding.average)
        ));
    }
    line
}

pub fn history_line(entry: &SearchHistoryEntry) -> String {
    format!(
        "{:<48} {:>4} results  {}",
        truncate(&entry.query, 48),
        entry.results,
        format_relative_time(entry.timestamp)
    )
}

pub fn saved_line(saved: &SavedCompany) -> String {
    let mut parts = vec![saved.name.as_str()];
    if !saved.stage.is_empty() {
        parts.push(&saved.stage);
    }
    if !saved.amount.is_empty() {
        parts.push(&saved.amount);
    }
    format!(
        "{}  (saved {})",
        parts.join(" | "),
        format_relative_time(saved.saved_at)
    )
}

pub fn stats_lines(stats: &DashboardStats) -> Vec<String> {
    vec![
        format!("Searches:        {}", stats.total_searches),
        format!("Companies found: {}", stats.companies_found),
        format!("Saved:           {}", stats.saved_companies),
        format!("Monthly growth:  {}", stats.monthly_growth),
    ]
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", kept.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn company() -> Company {
        let mut company = Company::named("Acme");
        company.funding_stage = "Series A".into();
        company.funding_amount = "$12M".into();
        company.location = "Berlin".into();
        company
    }

    #[test]
    fn test_company_line_skips_empty_fields() {
        assert_eq!(company_line(3, &company()), "  3. Acme | Series A | $12M | Berlin");

        let bare = Company::named("Zeta");
        assert_eq!(company_line(12, &bare), " 12. Zeta");
    }

    #[test]
    fn test_company_details() {
        let mut acme = company();
        acme.description = "x".repeat(150);
        acme.team_size = Some(40);
        acme.founded = "2021".into();
        acme.investors = vec!["Sequoia".into(), "Index".into()];

        let lines = company_details(&acme);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("..."));
        assert_eq!(lines[0].trim().chars().count(), DESCRIPTION_WIDTH);
        assert_eq!(lines[1], "     Team: 40 | Founded: 2021");
        assert_eq!(lines[2], "     Investors: Sequoia, Index");

        assert!(company_details(&Company::named("Empty")).is_empty());
    }

    #[test]
    fn test_summary_line() {
        let acme = company();
        let mut zeta = Company::named("Zeta");
        zeta.funding_amount = "$8M".into();
        let unknown = Company::named("Unknown");

        assert_eq!(
            summary_line(&[&acme, &zeta], 2),
            "2 companies | $20.0M total funding | $10.0M average"
        );
        assert_eq!(summary_line(&[&unknown], 3), "1 of 3 companies match filters");
    }
}
