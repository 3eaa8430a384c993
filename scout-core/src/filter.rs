//! Client-side filtering of search results

use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::format::parse_funding_amount;
use crate::types::Company;

/// Funding brackets offered as filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FundingRange {
    Under1M,
    From1MTo10M,
    From10MTo50M,
    From50MTo100M,
    Over100M,
}

impl FundingRange {
    pub const ALL: [FundingRange; 5] = [
        FundingRange::Under1M,
        FundingRange::From1MTo10M,
        FundingRange::From10MTo50M,
        FundingRange::From50MTo100M,
        FundingRange::Over100M,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FundingRange::Under1M => "<$1M",
            FundingRange::From1MTo10M => "$1M-$10M",
            FundingRange::From10MTo50M => "$10M-$50M",
            FundingRange::From50MTo100M => "$50M-$100M",
            FundingRange::Over100M => "$100M+",
        }
    }

    /// Lower bound inclusive, upper bound exclusive.
    pub fn contains(&self, amount: f64) -> bool {
        const M: f64 = 1_000_000.0;
        match self {
            FundingRange::Under1M => amount < M,
            FundingRange::From1MTo10M => (M..10.0 * M).contains(&amount),
            FundingRange::From10MTo50M => (10.0 * M..50.0 * M).contains(&amount),
            FundingRange::From50MTo100M => (50.0 * M..100.0 * M).contains(&amount),
            FundingRange::Over100M => amount >= 100.0 * M,
        }
    }
}

impl fmt::Display for FundingRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FundingRange {
    type Err = Error;

    /// Accepts the display label, ignoring case, `$` and spaces ("10m-50m").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalize = |s: &str| {
            s.chars()
                .filter(|c| !c.is_whitespace() && *c != '$')
                .collect::<String>()
                .to_ascii_lowercase()
        };
        let wanted = normalize(s);
        Self::ALL
            .into_iter()
            .find(|range| normalize(range.label()) == wanted)
            .ok_or_else(|| {
                let labels: Vec<_> = Self::ALL.iter().map(FundingRange::label).collect();
                Error::InvalidInput(format!(
                    "unknown funding range {s:?}, expected one of {}",
                    labels.join(", ")
                ))
            })
    }
}

/// Active filters; an empty category matches everything.
#[derive(Debug, Clone, Default)]
pub struct CompanyFilter {
    pub stages: Vec<String>,
    pub ranges: Vec<FundingRange>,
    pub locations: Vec<String>,
}

impl CompanyFilter {
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty() && self.ranges.is_empty() && self.locations.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.stages.len() + self.ranges.len() + self.locations.len()
    }

    pub fn matches(&self, company: &Company) -> bool {
        let stage_ok = self.stages.is_empty()
            || self
                .stages
                .iter()
                .any(|stage| contains_ignore_case(&company.funding_stage, stage));

        let range_ok = self.ranges.is_empty()
            || parse_funding_amount(&company.funding_amount)
                .is_some_and(|amount| self.ranges.iter().any(|r| r.contains(amount)));

        let location_ok = self.locations.is_empty()
            || self
                .locations
                .iter()
                .any(|location| contains_ignore_case(&company.location, location));

        stage_ok && range_ok && location_ok
    }

    pub fn apply<'a>(&self, companies: &'a [Company]) -> Vec<&'a Company> {
        companies.iter().filter(|c| self.matches(c)).collect()
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack
        .to_lowercase()
        .contains(needle.trim().to_lowercase().as_str())
}
