//! De-duplicating accumulation of streamed company records
//!
//! Every object recovered from the agent stream is offered to a
//! [`CompanyAccumulator`]. Objects carrying a `companies` array contribute
//! their records; anything else is ignored. A name seen earlier in the same
//! search wins, later duplicates are dropped rather than merged.

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::Value;

use crate::types::Company;

/// Order-preserving, name-unique list of companies for one search.
#[derive(Debug, Default)]
pub struct CompanyAccumulator {
    companies: Vec<Company>,
    seen: HashSet<String>,
}

impl CompanyAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Absorb one streamed object, returning the records it newly added.
    pub fn absorb(&mut self, object: &Value) -> &[Company] {
        let first_new = self.companies.len();

        let Some(records) = object.get("companies").and_then(Value::as_array) else {
            tracing::debug!("Ignoring streamed object without a companies array");
            return &[];
        };

        for record in records {
            let company = match Company::deserialize(record) {
                Ok(company) => company,
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping company record that failed to parse");
                    continue;
                }
            };

            if company.name.trim().is_empty() {
                tracing::debug!("Skipping company record with an empty name");
                continue;
            }

            if self.seen.insert(company.name.clone()) {
                self.companies.push(company);
            } else {
                tracing::trace!(name = %company.name, "Dropping duplicate company");
            }
        }

        &self.companies[first_new..]
    }

    /// All records accumulated so far, in arrival order.
    pub fn companies(&self) -> &[Company] {
        &self.companies
    }

    pub fn len(&self) -> usize {
        self.companies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.companies.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.seen.contains(name)
    }

    /// Drop everything; the next search starts from an empty list.
    pub fn clear(&mut self) {
        self.companies.clear();
        self.seen.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(companies: &[Company]) -> Vec<&str> {
        companies.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_absorb_appends_in_order() {
        let mut acc = CompanyAccumulator::new();
        let added = acc.absorb(&json!({"companies": [{"name": "Acme"}, {"name": "Beta"}]}));
        assert_eq!(names(added), vec!["Acme", "Beta"]);

        let added = acc.absorb(&json!({"companies": [{"name": "Gamma"}]}));
        assert_eq!(names(added), vec!["Gamma"]);
        assert_eq!(names(acc.companies()), vec!["Acme", "Beta", "Gamma"]);
    }

    #[test]
    fn test_first_occurrence_wins() {
        let mut acc = CompanyAccumulator::new();
        acc.absorb(&json!({"companies": [{"name": "Acme", "location": "Berlin"}]}));
        let added = acc.absorb(&json!({"companies": [
            {"name": "Acme", "location": "Paris"},
            {"name": "Zeta"},
            {"name": "Zeta", "location": "Rome"}
        ]}));

        assert_eq!(names(added), vec!["Zeta"]);
        assert_eq!(acc.len(), 2);
        assert_eq!(acc.companies()[0].location, "Berlin");
        assert_eq!(acc.companies()[1].location, "");
    }

    #[test]
    fn test_objects_without_companies_array_are_ignored() {
        let mut acc = CompanyAccumulator::new();
        assert!(acc.absorb(&json!({"status": "thinking"})).is_empty());
        assert!(acc.absorb(&json!({"companies": {"name": "Acme"}})).is_empty());
        assert!(acc.absorb(&json!([{"name": "Acme"}])).is_empty());
        assert!(acc.is_empty());
    }

    #[test]
    fn test_invalid_records_are_skipped() {
        let mut acc = CompanyAccumulator::new();
        let added = acc.absorb(&json!({"companies": [
            {"description": "no name"},
            "not an object",
            {"name": "  "},
            {"name": "Valid"}
        ]}));
        assert_eq!(names(added), vec!["Valid"]);
    }

    #[test]
    fn test_clear_resets_seen_names() {
        let mut acc = CompanyAccumulator::new();
        acc.absorb(&json!({"companies": [{"name": "Acme"}]}));
        acc.clear();
        assert!(!acc.contains("Acme"));

        let added = acc.absorb(&json!({"companies": [{"name": "Acme"}]}));
        assert_eq!(names(added), vec!["Acme"]);
    }
}
