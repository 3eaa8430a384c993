//! Core domain types for scout
//!
//! The research agent describes each startup as a loosely typed JSON record.
//! [`Company`] is the canonical form: `name` is required and is the unique
//! key within one search, every other field falls back to an empty value when
//! the agent omits it or sends `null`.

use serde::{Deserialize, Deserializer, Serialize};

/// One startup as returned by the research agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    /// Company name (unique within a search)
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// Latest funding round or product launch, free text
    #[serde(default, deserialize_with = "null_as_default")]
    pub funding_or_launch_news: String,
    /// Amount as written by the agent, e.g. "$12.5M"
    #[serde(default, deserialize_with = "null_as_default")]
    pub funding_amount: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub funding_stage: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub valuation: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub revenue_range: String,
    /// Headcount; numeric strings such as "120" or "1,200" are accepted
    #[serde(default, deserialize_with = "lenient_count")]
    pub team_size: Option<u64>,
    /// Founding year, free text
    #[serde(default, deserialize_with = "null_as_default")]
    pub founded: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub location: String,
    /// Date-like string of the agent's last update
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_updated: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub investors: Vec<String>,
    /// Logo URL
    #[serde(default, deserialize_with = "null_as_default")]
    pub logo: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub links: CompanyLinks,
}

/// External links for a [`Company`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyLinks {
    #[serde(default, deserialize_with = "null_as_default")]
    pub website: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub linkedin: String,
    #[serde(default)]
    pub news: Option<String>,
}

impl Company {
    /// Create a record with only a name; used by tests and fixtures.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            funding_or_launch_news: String::new(),
            funding_amount: String::new(),
            funding_stage: String::new(),
            valuation: String::new(),
            revenue_range: String::new(),
            team_size: None,
            founded: String::new(),
            location: String::new(),
            last_updated: String::new(),
            investors: Vec::new(),
            logo: String::new(),
            links: CompanyLinks::default(),
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Count {
    Integer(u64),
    Float(f64),
    Text(String),
}

fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let count = match Option::<Count>::deserialize(deserializer)? {
        Some(Count::Integer(n)) => Some(n),
        Some(Count::Float(f)) if f.is_finite() && f >= 0.0 => Some(f.round() as u64),
        Some(Count::Text(text)) => {
            let digits: String = text
                .trim()
                .chars()
                .take_while(|c| c.is_ascii_digit() || *c == ',')
                .filter(|c| *c != ',')
                .collect();
            digits.parse().ok()
        }
        _ => None,
    };
    Ok(count)
}
