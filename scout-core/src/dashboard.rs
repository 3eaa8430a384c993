//! Dashboard statistics
//!
//! Tracks searches run and companies saved during a session, and notifies
//! subscribed observers whenever the statistics change. A [`Dashboard`] is
//! an ordinary owned value: whoever drives the session holds it and passes
//! it where it is needed.

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

/// Aggregate counters shown on the dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_searches: usize,
    pub companies_found: usize,
    pub saved_companies: usize,
    /// Change in search count versus last month, e.g. "+50%"
    pub monthly_growth: String,
}

impl Default for DashboardStats {
    fn default() -> Self {
        Self {
            total_searches: 0,
            companies_found: 0,
            saved_companies: 0,
            monthly_growth: "0%".to_string(),
        }
    }
}

/// One search in the history
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHistoryEntry {
    pub query: String,
    pub results: usize,
    pub timestamp: DateTime<Utc>,
}

/// A bookmarked company
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedCompany {
    pub name: String,
    pub stage: String,
    pub amount: String,
    pub saved_at: DateTime<Utc>,
}

/// Handle returned by [`Dashboard::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer = Box<dyn Fn(&DashboardStats) + Send>;

/// Search history, saved companies and the counters derived from them.
#[derive(Default)]
pub struct Dashboard {
    stats: DashboardStats,
    history: Vec<SearchHistoryEntry>,
    saved: Vec<SavedCompany>,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: u64,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> &DashboardStats {
        &self.stats
    }

    /// Searches, newest first
    pub fn search_history(&self) -> Vec<&SearchHistoryEntry> {
        let mut history: Vec<_> = self.history.iter().collect();
        history.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        history
    }

    /// Saved companies, newest first
    pub fn saved_companies(&self) -> Vec<&SavedCompany> {
        let mut saved: Vec<_> = self.saved.iter().collect();
        saved.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        saved
    }

    pub fn record_search(&mut self, query: &str, results: usize) {
        self.record_search_at(query, results, Utc::now());
    }

    /// Record a search that happened at `at`; growth is computed relative to it.
    pub fn record_search_at(&mut self, query: &str, results: usize, at: DateTime<Utc>) {
        self.history.push(SearchHistoryEntry {
            query: query.to_string(),
            results,
            timestamp: at,
        });
        self.stats.total_searches += 1;
        self.stats.companies_found += results;
        self.stats.monthly_growth = self.monthly_growth(at);
        self.notify();
    }

    /// Save a company; returns false if one with that name is already saved.
    pub fn save_company(&mut self, name: &str, stage: &str, amount: &str) -> bool {
        self.save_company_at(name, stage, amount, Utc::now())
    }

    pub fn save_company_at(
        &mut self,
        name: &str,
        stage: &str,
        amount: &str,
        at: DateTime<Utc>,
    ) -> bool {
        if self.is_company_saved(name) {
            return false;
        }
        self.saved.push(SavedCompany {
            name: name.to_string(),
            stage: stage.to_string(),
            amount: amount.to_string(),
            saved_at: at,
        });
        self.stats.saved_companies += 1;
        self.notify();
        true
    }

    /// Remove a saved company; returns false if it was not saved.
    pub fn unsave_company(&mut self, name: &str) -> bool {
        let Some(index) = self.saved.iter().position(|c| c.name == name) else {
            return false;
        };
        self.saved.remove(index);
        self.stats.saved_companies -= 1;
        self.notify();
        true
    }

    pub fn is_company_saved(&self, name: &str) -> bool {
        self.saved.iter().any(|c| c.name == name)
    }

    /// Register an observer called with the new stats after every change.
    pub fn subscribe<F>(&mut self, observer: F) -> SubscriptionId
    where
        F: Fn(&DashboardStats) + Send + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Remove an observer; returns false if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(existing, _)| *existing != id);
        self.observers.len() != before
    }

    fn notify(&self) {
        for (_, observer) in &self.observers {
            observer(&self.stats);
        }
    }

    fn monthly_growth(&self, now: DateTime<Utc>) -> String {
        let (year, month) = (now.year(), now.month());
        let (last_year, last_month) = if month == 1 {
            (year - 1, 12)
        } else {
            (year, month - 1)
        };

        let count_in = |year: i32, month: u32| {
            self.history
                .iter()
                .filter(|s| s.timestamp.year() == year && s.timestamp.month() == month)
                .count()
        };
        let this_month = count_in(year, month);
        let previous = count_in(last_year, last_month);

        if previous == 0 {
            let growth = if this_month > 0 { "100%" } else { "0%" };
            return growth.to_string();
        }

        let growth = (this_month as f64 - previous as f64) / previous as f64 * 100.0;
        let sign = if growth > 0.0 { "+" } else { "" };
        format!("{}{}%", sign, growth.round() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_record_search_updates_stats() {
        let mut dashboard = Dashboard::new();
        dashboard.record_search_at("AI startups", 12, at(2024, 5, 1));
        dashboard.record_search_at("fintech", 3, at(2024, 5, 2));

        let stats = dashboard.stats();
        assert_eq!(stats.total_searches, 2);
        assert_eq!(stats.companies_found, 15);
        assert_eq!(stats.monthly_growth, "100%");
        assert_eq!(dashboard.search_history()[0].query, "fintech");
    }

    #[test]
    fn test_monthly_growth_against_previous_month() {
        let mut dashboard = Dashboard::new();
        dashboard.record_search_at("a", 1, at(2024, 4, 10));
        dashboard.record_search_at("b", 1, at(2024, 4, 11));
        dashboard.record_search_at("c", 1, at(2024, 5, 1));
        assert_eq!(dashboard.stats().monthly_growth, "-50%");

        dashboard.record_search_at("d", 1, at(2024, 5, 2));
        dashboard.record_search_at("e", 1, at(2024, 5, 3));
        assert_eq!(dashboard.stats().monthly_growth, "+50%");
    }

    #[test]
    fn test_monthly_growth_wraps_year() {
        let mut dashboard = Dashboard::new();
        dashboard.record_search_at("dec", 1, at(2023, 12, 20));
        dashboard.record_search_at("jan", 1, at(2024, 1, 5));
        assert_eq!(dashboard.stats().monthly_growth, "0%");
    }

    #[test]
    fn test_save_and_unsave() {
        let mut dashboard = Dashboard::new();
        assert!(dashboard.save_company_at("Acme", "Seed", "$2M", at(2024, 1, 1)));
        assert!(!dashboard.save_company("Acme", "Series A", "$10M"));
        assert!(dashboard.save_company_at("Zeta", "Series B", "$40M", at(2024, 2, 1)));

        assert_eq!(dashboard.stats().saved_companies, 2);
        assert_eq!(dashboard.saved_companies()[0].name, "Zeta");
        assert_eq!(dashboard.saved_companies()[1].stage, "Seed");

        assert!(dashboard.unsave_company("Acme"));
        assert!(!dashboard.unsave_company("Acme"));
        assert!(!dashboard.is_company_saved("Acme"));
        assert_eq!(dashboard.stats().saved_companies, 1);
    }

    #[test]
    fn test_observers_notified_until_unsubscribed() {
        let mut dashboard = Dashboard::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&calls);
        let id = dashboard.subscribe(move |stats| {
            assert!(stats.total_searches > 0 || stats.saved_companies > 0);
            counter.fetch_add(1, Ordering::SeqCst);
        });

        dashboard.record_search("ai", 1);
        dashboard.save_company("Acme", "Seed", "$1M");
        dashboard.save_company("Acme", "Seed", "$1M");
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        assert!(dashboard.unsubscribe(id));
        assert!(!dashboard.unsubscribe(id));
        dashboard.record_search("ai", 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
